use super::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// What happened during one night. Every field is a target; the actor is
/// whoever holds the matching role.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
pub struct NightActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigate: Option<Player>,
}

impl NightActions {
    pub fn kill(target: &str) -> Self {
        NightActions {
            kill: Some(target.into()),
            ..NightActions::default()
        }
    }

    pub fn with_protect(mut self, target: &str) -> Self {
        self.protect = Some(target.into());
        self
    }

    pub fn with_investigate(mut self, target: &str) -> Self {
        self.investigate = Some(target.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kill.is_none() && self.protect.is_none() && self.investigate.is_none()
    }

    /// The recorded targets paired with the role that acts on them.
    pub fn targets(&self) -> impl Iterator<Item = (Role, &Player)> {
        [
            (Role::Mafia, self.kill.as_ref()),
            (Role::Doctor, self.protect.as_ref()),
            (Role::Cop, self.investigate.as_ref()),
        ]
        .into_iter()
        .filter_map(|(role, target)| target.map(|t| (role, t)))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Player,
    pub target: Player,
}

impl Vote {
    pub fn new(voter: &str, target: &str) -> Self {
        Vote {
            voter: voter.into(),
            target: target.into(),
        }
    }
}

/// A played (or planned) game: who plays which role and what happened
/// each night and day. Day `i` follows night `i`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub players: Vec<Player>,
    pub roles: BTreeMap<Player, Role>,
    #[serde(rename = "nights", default)]
    pub night_count: usize,
    #[serde(default)]
    pub night_actions: BTreeMap<usize, NightActions>,
    #[serde(default)]
    pub day_votes: BTreeMap<usize, Vec<Vote>>,
}

impl Scenario {
    pub fn new(players: Vec<Player>, roles: BTreeMap<Player, Role>) -> Self {
        Scenario {
            id: Uuid::new_v4(),
            players,
            roles,
            night_count: 0,
            night_actions: BTreeMap::new(),
            day_votes: BTreeMap::new(),
        }
    }

    /// Players `a`, `b`, ... with roles dealt in seat order.
    pub fn from_counts(players: usize, counts: RoleCounts) -> MfResult<Self> {
        Scenario::check_counts(players, counts)?;
        let names: Vec<Player> = (0..players).map(Player::nth).collect();
        let roles = names.iter().cloned().zip(counts.deal(players)).collect();
        Ok(Scenario::new(names, roles))
    }

    /// Like `from_counts` but the roles are shuffled over the seats.
    pub fn from_counts_shuffled<R: Rng>(
        players: usize,
        counts: RoleCounts,
        rng: &mut R,
    ) -> MfResult<Self> {
        Scenario::check_counts(players, counts)?;
        let names: Vec<Player> = (0..players).map(Player::nth).collect();
        let mut dealt = counts.deal(players);
        dealt.shuffle(rng);
        let roles = names.iter().cloned().zip(dealt).collect();
        Ok(Scenario::new(names, roles))
    }

    fn check_counts(players: usize, counts: RoleCounts) -> MfResult<()> {
        if counts.is_valid_for(players) {
            Ok(())
        } else {
            Err(MafiaError::InvalidScenario(vec![Violation::InvalidRoleCount {
                counts,
                players,
            }]))
        }
    }

    pub fn with_nights(mut self, nights: usize) -> Self {
        self.night_count = nights;
        self
    }

    pub fn role_of(&self, player: &Player) -> Option<Role> {
        self.roles.get(player).copied()
    }

    pub fn is_player(&self, player: &Player) -> bool {
        self.players.contains(player)
    }

    /// Seat index of a player, used to order generated facts.
    pub fn seat(&self, player: &Player) -> Option<usize> {
        self.players.iter().position(|p| p == player)
    }

    /// Holders of `role` in seat order.
    pub fn holders(&self, role: Role) -> impl Iterator<Item = &Player> {
        self.players
            .iter()
            .filter(move |p| self.roles.get(*p) == Some(&role))
    }

    pub fn night(&self, night: usize) -> Option<&NightActions> {
        self.night_actions.get(&night)
    }

    pub fn votes(&self, day: usize) -> &[Vote] {
        self.day_votes.get(&day).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Appends the next night and returns its index.
    pub fn push_night(&mut self, actions: NightActions) -> usize {
        let night = self.night_count;
        if !actions.is_empty() {
            self.night_actions.insert(night, actions);
        }
        self.night_count += 1;
        night
    }

    /// Appends a ballot to `day`. Earlier days are closed, and the two
    /// ballot invariants (no self vote, one ballot per voter) are kept.
    pub fn push_vote(&mut self, day: usize, vote: Vote) -> MfResult<()> {
        if day >= self.night_count {
            return Err(MafiaError::InvalidScenario(vec![Violation::RoundOutOfRange(
                Round::Day(day),
            )]));
        }
        if let Some(last) = self.day_votes.keys().next_back() {
            if day < *last {
                return Err(MafiaError::InvalidState(format!(
                    "day {day} is closed, votes are being recorded for day {last}"
                )));
            }
        }
        let mut found = vec![];
        for p in [&vote.voter, &vote.target] {
            if !self.is_player(p) {
                found.push(Violation::UnknownTarget {
                    round: Round::Day(day),
                    player: p.clone(),
                });
            }
        }
        if vote.voter == vote.target {
            found.push(Violation::SelfVote {
                day,
                voter: vote.voter.clone(),
            });
        }
        if self.votes(day).iter().any(|v| v.voter == vote.voter) {
            found.push(Violation::DuplicateVoterInDay {
                day,
                voter: vote.voter.clone(),
            });
        }
        if !found.is_empty() {
            return Err(MafiaError::InvalidScenario(found));
        }
        self.day_votes.entry(day).or_default().push(vote);
        Ok(())
    }

    pub fn from_json(json: &str) -> MfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> MfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
