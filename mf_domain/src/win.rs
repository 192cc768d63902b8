//! The win rule used without a solver. It compares head counts only and
//! is a stand-in for "the mafia controls the vote", not a proof of it.

use super::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Mafia,
    Villagers,
    Ongoing,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Mafia => write!(f, "Mafia win"),
            Verdict::Villagers => write!(f, "Villagers win"),
            Verdict::Ongoing => write!(f, "No winner yet"),
        }
    }
}

/// No living mafia means the villagers won; otherwise the mafia wins as
/// soon as it is at least as many as everybody else alive. A living
/// player without a role counts as "everybody else".
pub fn evaluate<'a>(
    alive: impl IntoIterator<Item = &'a Player>,
    roles: &BTreeMap<Player, Role>,
) -> Verdict {
    let (mut mafia_alive, mut others_alive) = (0usize, 0usize);
    for p in alive {
        if roles.get(p) == Some(&Role::Mafia) {
            mafia_alive += 1;
        } else {
            others_alive += 1;
        }
    }
    if mafia_alive == 0 {
        Verdict::Villagers
    } else if mafia_alive >= others_alive {
        Verdict::Mafia
    } else {
        Verdict::Ongoing
    }
}

/// A snapshot of a game at one time point, as handed to the win check.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>,
    pub roles: BTreeMap<Player, Role>,
    pub alive: Vec<Player>,
    #[serde(default = "default_time")]
    pub time: String,
}

fn default_time() -> String {
    time_point(1)
}

impl GameState {
    /// The state of a scenario after its last recorded round.
    pub fn of(scenario: &Scenario) -> Self {
        let timeline = scenario.simulate();
        GameState {
            players: scenario.players.clone(),
            roles: scenario.roles.clone(),
            alive: timeline.last().to_vec(),
            time: time_point(scenario.night_count),
        }
    }

    pub fn from_json(json: &str) -> MfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Everything that makes the state unusable, as readable messages.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = vec![];
        let players: FxHashSet<&Player> = self.players.iter().collect();
        if players.len() != self.players.len() {
            problems.push("players contain duplicates".to_owned());
        }
        for p in &self.players {
            if !self.roles.contains_key(p) {
                problems.push(format!("'{p}' has no role"));
            }
        }
        for p in self.roles.keys() {
            if !players.contains(p) {
                problems.push(format!("role assigned to unknown player '{p}'"));
            }
        }
        let mut alive = FxHashSet::default();
        for p in &self.alive {
            if !players.contains(p) {
                problems.push(format!("alive player '{p}' is not a player"));
            }
            if !alive.insert(p) {
                problems.push(format!("'{p}' is listed alive twice"));
            }
        }
        if time_index(&self.time).is_none() {
            problems.push(format!("'{}' is not a time point", self.time));
        }
        problems
    }
}

/// Validates a game state and evaluates the win rule on it.
pub fn check_state(state: &GameState) -> MfResult<Verdict> {
    let problems = state.problems();
    if !problems.is_empty() {
        tracing::warn!("rejecting game state: {}", problems.join("; "));
        return Err(MafiaError::InvalidState(problems.join("; ")));
    }
    Ok(evaluate(&state.alive, &state.roles))
}

#[cfg(test)]
mod test_win {
    use super::*;

    fn players(names: &[&str]) -> Vec<Player> {
        names.iter().map(|n| Player::from(*n)).collect()
    }

    #[test]
    fn boundaries() {
        let roles = roles!(
            "a" => Role::Mafia,
            "b" => Role::Mafia,
            "c" => Role::Doctor,
            "d" => Role::Cop,
            "e" => Role::Villager,
        );
        assert_eq!(evaluate(&players(&["c", "d", "e"]), &roles), Verdict::Villagers);
        assert_eq!(evaluate(&players(&["a", "b", "c", "d"]), &roles), Verdict::Mafia);
        assert_eq!(evaluate(&players(&["a", "c", "d", "e"]), &roles), Verdict::Ongoing);
        assert_eq!(evaluate(&players(&["a", "e"]), &roles), Verdict::Mafia);
    }

    #[test]
    fn nobody_alive_is_a_villager_win() {
        let roles = roles!("a" => Role::Mafia);
        assert_eq!(evaluate(&[], &roles), Verdict::Villagers);
    }

    #[test]
    fn check_state_from_json() {
        let json = r#"{
            "players": ["a","b","c","d"],
            "roles": {"a":"mafia","b":"doctor","c":"cop","d":"villager"},
            "alive": ["a","b","d"],
            "time": "n1"
        }"#;
        let state = GameState::from_json(json).unwrap();
        assert_eq!(check_state(&state).unwrap(), Verdict::Ongoing);

        let mut state = state;
        state.alive = players(&["a", "d"]);
        assert_eq!(check_state(&state).unwrap(), Verdict::Mafia);
    }

    #[test]
    fn invalid_states_are_rejected() {
        let mut state = GameState {
            players: players(&["a", "b"]),
            roles: roles!("a" => Role::Mafia, "b" => Role::Villager),
            alive: players(&["a", "x"]),
            time: "later".into(),
        };
        let err = check_state(&state).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'x' is not a player"));
        assert!(msg.contains("not a time point"));

        state.alive = players(&["a"]);
        state.time = "n2".into();
        state.roles.remove(&Player::from("b"));
        assert!(check_state(&state).is_err());
    }

    #[test]
    fn state_of_scenario() {
        let mut s = Scenario::from_counts(4, RoleCounts::new(1, 1, 0)).unwrap();
        s.push_night(NightActions::kill("c"));
        let state = GameState::of(&s);
        assert_eq!(state.time, "n1");
        assert_eq!(state.alive, players(&["a", "b", "d"]));
        assert_eq!(check_state(&state).unwrap(), Verdict::Ongoing);
    }
}
