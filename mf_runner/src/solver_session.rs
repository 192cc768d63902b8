use super::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Whether a player can be alive, and can be dead, at a time point in
/// some model of the scenario.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AliveCheck {
    pub can_be_alive: bool,
    pub can_be_dead: bool,
}

impl AliveCheck {
    /// `Some(alive)` when every model agrees.
    pub fn decided(&self) -> Option<bool> {
        match (self.can_be_alive, self.can_be_dead) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }
}

/// Hands out Mace4 runs, at most one at a time per scenario. A call made
/// while another one for the same scenario is running fails at once.
pub struct SolverSession {
    mace4: Mace4,
    running: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl SolverSession {
    pub fn new(mace4: Mace4) -> Self {
        SolverSession {
            mace4,
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn locate(config: &SolverConfig) -> RunnerResult<Self> {
        Ok(SolverSession::new(Mace4::locate(config)?))
    }

    fn claim(&self, id: Uuid) -> RunnerResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
            running.entry(id).or_default().clone()
        };
        lock.try_lock_owned().map_err(|_| {
            tracing::warn!("solver already running for scenario {id}");
            RunnerError::SolverBusy(id)
        })
    }

    /// A solver whose domain sizes admit `constants` distinct elements.
    fn solver_for(&self, constants: usize) -> Mace4 {
        Mace4 {
            path: self.mace4.path.clone(),
            config: self.mace4.config.fitted(constants),
        }
    }

    fn scenario_solver(&self, scenario: &Scenario) -> Mace4 {
        self.solver_for(scenario.players.len() + scenario.night_count + 1)
    }

    async fn run_with(&self, scenario: &Scenario, text: &str) -> RunnerResult<ParseResult> {
        let output = self.scenario_solver(scenario).run(text).await?;
        Ok(parse_output(&output))
    }

    /// Looks for any model of the scenario.
    pub async fn find_model(&self, scenario: &Scenario) -> RunnerResult<ParseResult> {
        let text = generate(scenario, &Mode::ModelFinding)?;
        let _running = self.claim(scenario.id)?;
        self.run_with(scenario, &text).await
    }

    /// Looks for a model of the scenario in which `atom` holds.
    pub async fn query(&self, scenario: &Scenario, atom: &Atom) -> RunnerResult<ParseResult> {
        let text = generate(scenario, &Mode::ModelFinding)?;
        let _running = self.claim(scenario.id)?;
        let (_, parsed) = self.scenario_solver(scenario).query(&text, atom).await?;
        Ok(parsed)
    }

    /// Whether `atom` holds in every model of the scenario, that is, the
    /// scenario with the negated atom has no model.
    pub async fn entails(&self, scenario: &Scenario, atom: &Atom) -> RunnerResult<bool> {
        let mut theory = build_theory(scenario, &Mode::ModelFinding)?;
        theory.assume(atom.clone().negate());
        let _running = self.claim(scenario.id)?;
        let output = self.scenario_solver(scenario).run(&theory.to_string()).await?;
        match output.exit {
            SolverExit::NoModel => Ok(true),
            SolverExit::ModelFound => Ok(false),
            SolverExit::SearchLimit(code) | SolverExit::Failed(code) => {
                Err(RunnerError::Formal(FormalError::SolverFailed {
                    code,
                    output: output.stdout,
                }))
            }
        }
    }

    pub async fn check_alive(
        &self,
        scenario: &Scenario,
        player: &Player,
        time: usize,
    ) -> RunnerResult<AliveCheck> {
        let text = generate(scenario, &Mode::ModelFinding)?;
        let alive = Atom::new("alive", &[player.as_str(), &time_point(time)]);
        let _running = self.claim(scenario.id)?;
        let as_alive = self
            .run_with(scenario, &insert_assumption(&text, &alive)?)
            .await?;
        let as_dead = self
            .run_with(scenario, &insert_assumption(&text, &alive.negate())?)
            .await?;
        Ok(AliveCheck {
            can_be_alive: as_alive.model().is_some(),
            can_be_dead: as_dead.model().is_some(),
        })
    }

    /// Solver backed win check for the state a scenario is in.
    pub async fn check_win(&self, scenario: &Scenario) -> RunnerResult<WinCheck> {
        self.check_state_win(scenario.id, &GameState::of(scenario)).await
    }

    /// Solver backed win check for a bare game state, locked under `id`.
    pub async fn check_state_win(&self, id: Uuid, state: &GameState) -> RunnerResult<WinCheck> {
        let _running = self.claim(id)?;
        let solver = self.solver_for(state.players.len() + 1);
        Ok(mf_formal::check_win(&solver, state).await?)
    }

    /// Plays the suggested night on a copy of the game and asks whether the
    /// suggestion has its intended effect in every model.
    pub async fn verify(
        &self,
        session: &GameSession,
        player: &Player,
        suggestion: &Suggestion,
    ) -> RunnerResult<bool> {
        let (night, atom) = suggestion.hypothetical(session, player);
        let mut scenario = session.scenario.clone();
        scenario.push_night(night);
        self.entails(&scenario, &atom).await
    }
}
