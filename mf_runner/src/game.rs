use super::*;
use rand::Rng;

/// A game played round by round on top of a `Scenario`. The scenario is
/// the only record of what happened; everything else is recomputed from
/// it. The day after the latest night stays open for votes until the next
/// night is played.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub scenario: Scenario,
}

impl GameSession {
    pub fn new(scenario: Scenario) -> RunnerResult<Self> {
        scenario.check()?;
        Ok(GameSession { scenario })
    }

    /// Deals `counts` (or the default counts) to `players` seats.
    pub fn deal(players: usize, counts: Option<RoleCounts>) -> RunnerResult<Self> {
        let counts = counts.unwrap_or_else(|| RoleCounts::default_for(players));
        GameSession::new(Scenario::from_counts(players, counts)?)
    }

    pub fn deal_shuffled<R: Rng>(
        players: usize,
        counts: Option<RoleCounts>,
        rng: &mut R,
    ) -> RunnerResult<Self> {
        let counts = counts.unwrap_or_else(|| RoleCounts::default_for(players));
        GameSession::new(Scenario::from_counts_shuffled(players, counts, rng)?)
    }

    /// Nights played so far, which is also the index of the next night.
    pub fn nights_played(&self) -> usize {
        self.scenario.night_count
    }

    pub fn timeline(&self) -> Timeline {
        self.scenario.simulate()
    }

    pub fn alive_now(&self) -> Vec<Player> {
        self.timeline().last().to_vec()
    }

    /// Plays the next night. Every target must be alive, and the mafia
    /// member acting tonight cannot be their own target.
    pub fn play_night(&mut self, actions: NightActions) -> RunnerResult<RoundOutcome> {
        let night = self.nights_played();
        let timeline = self.timeline();
        let alive = timeline.last();
        for (role, target) in actions.targets() {
            if !alive.contains(target) {
                return Err(invalid_move(format!(
                    "{role} target '{target}' is not alive at night {night}"
                )));
            }
        }
        if let Some(target) = &actions.kill {
            if timeline.actor(&self.scenario, Role::Mafia, night) == Some(target) {
                return Err(invalid_move(format!("'{target}' cannot kill themselves")));
            }
        }

        let mut next = self.scenario.clone();
        next.push_night(actions);
        next.check()?;
        self.scenario = next;

        let outcome = self
            .timeline()
            .rounds
            .pop()
            .unwrap_or_default();
        tracing::info!(
            "night {}: killed {:?}, saved {:?}",
            night,
            outcome.killed,
            outcome.saved
        );
        Ok(outcome)
    }

    /// Alive during the open day: the state after the latest night, before
    /// that day's vote.
    fn alive_for_day(&self, day: usize) -> Vec<Player> {
        let timeline = self.timeline();
        resolve_night(timeline.at(day), self.scenario.night(day)).0
    }

    /// Records a ballot for the open day. Both voter and target must be
    /// alive at that day.
    pub fn cast_vote(&mut self, voter: &str, target: &str) -> RunnerResult<()> {
        let day = self
            .nights_played()
            .checked_sub(1)
            .ok_or_else(|| invalid_move("no night has been played yet".into()))?;
        let alive = self.alive_for_day(day);
        for p in [voter, target] {
            if !alive.contains(&Player::from(p)) {
                return Err(invalid_move(format!("'{p}' is not alive on day {day}")));
            }
        }
        self.scenario.push_vote(day, Vote::new(voter, target))?;
        Ok(())
    }

    /// Living players who have not voted on the open day yet.
    pub fn pending_voters(&self) -> Vec<Player> {
        let Some(day) = self.nights_played().checked_sub(1) else {
            return vec![];
        };
        let votes = self.scenario.votes(day);
        self.alive_for_day(day)
            .into_iter()
            .filter(|p| !votes.iter().any(|v| &v.voter == p))
            .collect()
    }

    /// The tally of the open day, if anybody voted.
    pub fn tally_day(&self) -> Option<Tally> {
        self.timeline().rounds.pop().and_then(|r| r.tally)
    }

    pub fn verdict(&self) -> Verdict {
        evaluate(&self.alive_now(), &self.scenario.roles)
    }

    pub fn state(&self) -> GameState {
        GameState::of(&self.scenario)
    }

    /// Mafia members found by a living cop's investigations, as
    /// `(cop, suspect)` pairs in night order. A player not listed is not
    /// known to be innocent.
    pub fn recognized(&self) -> Vec<(Player, Player)> {
        let timeline = self.timeline();
        let mut found = vec![];
        for night in 0..self.nights_played() {
            let Some(target) = self.scenario.night(night).and_then(|a| a.investigate.as_ref())
            else {
                continue;
            };
            let Some(cop) = timeline.actor(&self.scenario, Role::Cop, night) else {
                continue;
            };
            let pair = (cop.clone(), target.clone());
            if self.scenario.role_of(target) == Some(Role::Mafia) && !found.contains(&pair) {
                found.push(pair);
            }
        }
        found
    }
}
