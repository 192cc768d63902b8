//! Replaying a scenario without a solver. This is the reference semantics
//! for the night axioms of the generated theory.

use super::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The counted ballots of one day.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct Tally {
    /// Votes per target, in seat order. Only targets with votes are listed.
    pub counts: Vec<(Player, usize)>,
    /// Ballots cast by or for players who are not alive.
    pub wasted: usize,
    /// The unique top vote getter, if there is one.
    pub eliminated: Option<Player>,
}

#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub night: usize,
    pub killed: Option<Player>,
    pub saved: Option<Player>,
    pub tally: Option<Tally>,
}

/// Alive sets for the time points `n0 ..= n<night_count>`.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub alive: Vec<Vec<Player>>,
    pub rounds: Vec<RoundOutcome>,
}

impl Timeline {
    pub fn at(&self, time: usize) -> &[Player] {
        self.alive.get(time).map(|a| a.as_slice()).unwrap_or(&[])
    }

    pub fn last(&self) -> &[Player] {
        self.alive.last().map(|a| a.as_slice()).unwrap_or(&[])
    }

    pub fn is_alive(&self, player: &Player, time: usize) -> bool {
        self.at(time).contains(player)
    }

    /// Who acts for `role` during `night`: the first holder in seat order
    /// still alive at the start of that night, else the first holder.
    pub fn actor<'a>(&self, scenario: &'a Scenario, role: Role, night: usize) -> Option<&'a Player> {
        scenario
            .holders(role)
            .find(|p| self.is_alive(p, night))
            .or_else(|| scenario.holders(role).next())
    }
}

/// A kill removes its target unless the same target was protected.
pub fn resolve_night(alive: &[Player], actions: Option<&NightActions>) -> (Vec<Player>, RoundOutcome) {
    let mut outcome = RoundOutcome::default();
    let mut next = alive.to_vec();
    if let Some(actions) = actions {
        if let Some(target) = actions.kill.as_ref().filter(|t| alive.contains(t)) {
            if actions.protect.as_ref() == Some(target) {
                outcome.saved = Some(target.clone());
            } else {
                next.retain(|p| p != target);
                outcome.killed = Some(target.clone());
            }
        }
    }
    (next, outcome)
}

/// Counts the ballots of living voters for living targets. A tie at the
/// top eliminates nobody.
pub fn tally(alive: &[Player], votes: &[Vote]) -> Tally {
    let mut per_target: FxHashMap<&Player, usize> = FxHashMap::default();
    let mut wasted = 0;
    for v in votes {
        if alive.contains(&v.voter) && alive.contains(&v.target) {
            *per_target.entry(&v.target).or_insert(0) += 1;
        } else {
            wasted += 1;
        }
    }

    let counts: Vec<(Player, usize)> = alive
        .iter()
        .filter_map(|p| per_target.get(p).map(|c| (p.clone(), *c)))
        .collect();
    let top = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let mut leaders = counts.iter().filter(|(_, c)| *c == top);
    let eliminated = match (leaders.next(), leaders.next()) {
        (Some((p, _)), None) => Some(p.clone()),
        _ => None,
    };

    Tally {
        counts,
        wasted,
        eliminated,
    }
}

/// Replays every night and day of the scenario.
pub fn simulate(scenario: &Scenario) -> Timeline {
    let mut timeline = Timeline {
        alive: vec![scenario.players.clone()],
        rounds: vec![],
    };
    for night in 0..scenario.night_count {
        let (mut alive, mut outcome) = resolve_night(timeline.last(), scenario.night(night));
        outcome.night = night;
        if let Some(votes) = scenario.day_votes.get(&night) {
            let day = tally(&alive, votes);
            if let Some(out) = &day.eliminated {
                alive.retain(|p| p != out);
            }
            outcome.tally = Some(day);
        }
        timeline.alive.push(alive);
        timeline.rounds.push(outcome);
    }
    timeline
}

impl Scenario {
    pub fn simulate(&self) -> Timeline {
        simulate(self)
    }
}
