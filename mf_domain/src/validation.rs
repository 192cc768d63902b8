use super::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Round {
    Night(usize),
    Day(usize),
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::Night(i) => write!(f, "night {i}"),
            Round::Day(i) => write!(f, "day {i}"),
        }
    }
}

/// One problem found in a scenario.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum Violation {
    DuplicatePlayer(Player),
    InvalidPlayerName(Player),
    UnassignedRole(Player),
    UnknownPlayerInRoles(Player),
    InvalidRoleCount { counts: RoleCounts, players: usize },
    UnknownTarget { round: Round, player: Player },
    SelfVote { day: usize, voter: Player },
    DuplicateVoterInDay { day: usize, voter: Player },
    MissingActor { night: usize, role: Role },
    RoundOutOfRange(Round),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicatePlayer(p) => write!(f, "duplicate player '{p}'"),
            Violation::InvalidPlayerName(p) => write!(
                f,
                "'{p}' cannot be used as a constant (lower case start, no time point names)"
            ),
            Violation::UnassignedRole(p) => write!(f, "'{p}' has no role"),
            Violation::UnknownPlayerInRoles(p) => {
                write!(f, "role assigned to unknown player '{p}'")
            }
            Violation::InvalidRoleCount { counts, players } => write!(
                f,
                "{} mafia, {} doctor, {} cop is not a valid setup for {} players",
                counts.mafia, counts.doctor, counts.cop, players
            ),
            Violation::UnknownTarget { round, player } => {
                write!(f, "unknown player '{player}' in {round}")
            }
            Violation::SelfVote { day, voter } => {
                write!(f, "'{voter}' votes for themselves on day {day}")
            }
            Violation::DuplicateVoterInDay { day, voter } => {
                write!(f, "'{voter}' votes more than once on day {day}")
            }
            Violation::MissingActor { night, role } => {
                write!(f, "night {night} has a {role} action but nobody is {role}")
            }
            Violation::RoundOutOfRange(round) => {
                write!(f, "{round} is outside the scenario's nights")
            }
        }
    }
}

/// Lists every problem with the scenario. An empty list means the
/// scenario can be encoded.
pub fn validate(scenario: &Scenario) -> Vec<Violation> {
    let mut found = vec![];

    let mut seen = FxHashSet::default();
    for p in &scenario.players {
        if !seen.insert(p) {
            found.push(Violation::DuplicatePlayer(p.clone()));
        } else if !p.is_valid_constant() {
            found.push(Violation::InvalidPlayerName(p.clone()));
        }
    }

    let mut unassigned = FxHashSet::default();
    for p in &scenario.players {
        if !scenario.roles.contains_key(p) && unassigned.insert(p) {
            found.push(Violation::UnassignedRole(p.clone()));
        }
    }
    let players: FxHashSet<&Player> = scenario.players.iter().collect();
    for p in scenario.roles.keys() {
        if !players.contains(p) {
            found.push(Violation::UnknownPlayerInRoles(p.clone()));
        }
    }

    let counts = RoleCounts::of(
        scenario
            .roles
            .iter()
            .filter(|(p, _)| players.contains(p))
            .map(|(_, r)| r),
    );
    if !counts.is_valid_for(players.len()) {
        found.push(Violation::InvalidRoleCount {
            counts,
            players: players.len(),
        });
    }

    for (night, actions) in &scenario.night_actions {
        if *night >= scenario.night_count {
            found.push(Violation::RoundOutOfRange(Round::Night(*night)));
        }
        for (role, target) in actions.targets() {
            if !players.contains(target) {
                found.push(Violation::UnknownTarget {
                    round: Round::Night(*night),
                    player: target.clone(),
                });
            }
            if scenario.holders(role).next().is_none() {
                found.push(Violation::MissingActor {
                    night: *night,
                    role,
                });
            }
        }
    }

    for (day, votes) in &scenario.day_votes {
        if *day >= scenario.night_count {
            found.push(Violation::RoundOutOfRange(Round::Day(*day)));
        }
        let mut voters = FxHashSet::default();
        for vote in votes {
            for p in [&vote.voter, &vote.target] {
                if !players.contains(p) {
                    found.push(Violation::UnknownTarget {
                        round: Round::Day(*day),
                        player: p.clone(),
                    });
                }
            }
            if vote.voter == vote.target {
                found.push(Violation::SelfVote {
                    day: *day,
                    voter: vote.voter.clone(),
                });
            }
            if !voters.insert(&vote.voter) {
                found.push(Violation::DuplicateVoterInDay {
                    day: *day,
                    voter: vote.voter.clone(),
                });
            }
        }
    }

    if !found.is_empty() {
        tracing::debug!("scenario {} has {} violations", scenario.id, found.len());
    }
    found
}

impl Scenario {
    pub fn validate(&self) -> Vec<Violation> {
        validate(self)
    }

    /// `Ok` when the scenario may be handed to the generator.
    pub fn check(&self) -> MfResult<()> {
        let found = validate(self);
        if found.is_empty() {
            Ok(())
        } else {
            Err(MafiaError::InvalidScenario(found))
        }
    }
}
