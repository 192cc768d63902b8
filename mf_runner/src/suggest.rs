//! Role aware move suggestions for the next night. They are heuristics
//! read off the roles, optionally checked against the solver afterwards
//! (see `SolverSession::verify`).

use super::*;
use serde::Serialize;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub enum Suggestion {
    Protect(Player),
    Kill {
        target: Player,
        role: Role,
        /// Killing the target removes the last living holder of its role.
        last_of_role: bool,
    },
    Investigate {
        target: Player,
        mafia: bool,
    },
    AskForProtection {
        doctor: Player,
    },
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suggestion::Protect(p) => write!(f, "protect {p} tonight"),
            Suggestion::Kill {
                target,
                role: Role::Villager,
                ..
            } => write!(f, "kill {target}"),
            Suggestion::Kill {
                target,
                role,
                last_of_role: true,
            } => write!(f, "kill {target}, the last {role}"),
            Suggestion::Kill { target, role, .. } => write!(f, "kill {target} ({role})"),
            Suggestion::Investigate {
                target,
                mafia: true,
            } => write!(f, "investigate {target}, who will turn out to be mafia"),
            Suggestion::Investigate { target, .. } => write!(f, "investigate {target}"),
            Suggestion::AskForProtection { doctor } => {
                write!(f, "ask {doctor} for protection")
            }
        }
    }
}

impl Suggestion {
    /// The night `player` would play to follow the suggestion, and the
    /// atom that should hold afterwards. For an investigation that is the
    /// cop recognizing the target, which only follows for mafia targets.
    pub fn hypothetical(&self, session: &GameSession, player: &Player) -> (NightActions, Atom) {
        let night = session.nights_played();
        let next = time_point(night + 1);
        match self {
            Suggestion::Protect(t) => (
                NightActions::default().with_protect(t.as_str()),
                Atom::new("alive", &[t.as_str(), &next]),
            ),
            Suggestion::Kill { target, .. } => (
                NightActions::kill(target.as_str()),
                Atom::new("alive", &[target.as_str(), &next]).negate(),
            ),
            Suggestion::Investigate { target, .. } => (
                NightActions::default().with_investigate(target.as_str()),
                Atom::new("recognizes", &[player.as_str(), target.as_str()]),
            ),
            Suggestion::AskForProtection { .. } => (
                NightActions::default().with_protect(player.as_str()),
                Atom::new("alive", &[player.as_str(), &next]),
            ),
        }
    }
}

fn kill_priority(role: Option<Role>) -> u8 {
    match role {
        Some(Role::Cop) => 0,
        Some(Role::Doctor) => 1,
        _ => 2,
    }
}

/// Suggestions for what `player` could do in the coming night.
pub fn suggest(session: &GameSession, player: &str) -> RunnerResult<Vec<Suggestion>> {
    let player = Player::from(player);
    let scenario = &session.scenario;
    let role = scenario
        .role_of(&player)
        .ok_or_else(|| invalid_move(format!("'{player}' is not a player")))?;
    let alive = session.alive_now();
    if !alive.contains(&player) {
        return Err(invalid_move(format!("'{player}' is no longer alive")));
    }
    let others = alive.iter().filter(|p| **p != player);

    let suggestions: Vec<Suggestion> = match role {
        Role::Doctor => alive.iter().cloned().map(Suggestion::Protect).collect(),
        Role::Mafia => {
            let mut targets: Vec<&Player> = others
                .filter(|p| scenario.role_of(p) != Some(Role::Mafia))
                .collect();
            targets.sort_by_key(|p| kill_priority(scenario.role_of(p)));
            targets
                .into_iter()
                .map(|t| {
                    let role = scenario.role_of(t).unwrap_or(Role::Villager);
                    let holders = alive
                        .iter()
                        .filter(|p| scenario.role_of(p) == Some(role))
                        .count();
                    Suggestion::Kill {
                        target: t.clone(),
                        role,
                        last_of_role: role != Role::Villager && holders == 1,
                    }
                })
                .collect()
        }
        Role::Cop => others
            .map(|t| Suggestion::Investigate {
                target: t.clone(),
                mafia: scenario.role_of(t) == Some(Role::Mafia),
            })
            .collect(),
        Role::Villager => alive
            .iter()
            .find(|p| scenario.role_of(p) == Some(Role::Doctor))
            .map(|doctor| Suggestion::AskForProtection {
                doctor: doctor.clone(),
            })
            .into_iter()
            .collect(),
    };
    Ok(suggestions)
}
