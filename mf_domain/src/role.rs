use super::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mafia,
    Doctor,
    Cop,
    Villager,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Mafia, Role::Doctor, Role::Cop, Role::Villager];

    /// The unary predicate asserting this role in the theory.
    pub fn predicate(&self) -> &'static str {
        match self {
            Role::Mafia => "isMafia",
            Role::Doctor => "isDoctor",
            Role::Cop => "isCop",
            Role::Villager => "isVillager",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Mafia => "mafia",
            Role::Doctor => "doctor",
            Role::Cop => "cop",
            Role::Villager => "villager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Role {
    type Err = MafiaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .find(|r| r.name() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| MafiaError::UnknownRole(s.to_owned()))
    }
}

/// How many players hold each special role. Everybody else is a villager.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct RoleCounts {
    pub mafia: usize,
    pub doctor: usize,
    pub cop: usize,
}

impl RoleCounts {
    pub fn new(mafia: usize, doctor: usize, cop: usize) -> Self {
        RoleCounts { mafia, doctor, cop }
    }

    /// One mafia per four players (at least one), a doctor from four
    /// players and a cop from five.
    pub fn default_for(players: usize) -> Self {
        RoleCounts {
            mafia: std::cmp::max(1, players / 4),
            doctor: usize::from(players >= 4),
            cop: usize::from(players >= 5),
        }
    }

    pub fn special(&self) -> usize {
        self.mafia + self.doctor + self.cop
    }

    pub fn is_valid_for(&self, players: usize) -> bool {
        self.mafia >= 1 && self.doctor <= 1 && self.cop <= 1 && self.special() <= players
    }

    /// Count the roles present in a role map.
    pub fn of<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Self {
        let mut counts = RoleCounts::new(0, 0, 0);
        for r in roles {
            match r {
                Role::Mafia => counts.mafia += 1,
                Role::Doctor => counts.doctor += 1,
                Role::Cop => counts.cop += 1,
                Role::Villager => {}
            }
        }
        counts
    }

    /// The role sequence handed out in seat order: mafia first, then the
    /// doctor, then the cop, villagers for the rest.
    pub fn deal(&self, players: usize) -> Vec<Role> {
        let mut roles = Vec::with_capacity(players);
        roles.extend(std::iter::repeat(Role::Mafia).take(self.mafia));
        roles.extend(std::iter::repeat(Role::Doctor).take(self.doctor));
        roles.extend(std::iter::repeat(Role::Cop).take(self.cop));
        while roles.len() < players {
            roles.push(Role::Villager);
        }
        roles.truncate(players);
        roles
    }
}

#[cfg(test)]
mod test_roles {
    use super::*;

    #[test]
    fn default_counts() {
        assert_eq!(RoleCounts::default_for(3), RoleCounts::new(1, 0, 0));
        assert_eq!(RoleCounts::default_for(4), RoleCounts::new(1, 1, 0));
        assert_eq!(RoleCounts::default_for(5), RoleCounts::new(1, 1, 1));
        assert_eq!(RoleCounts::default_for(9), RoleCounts::new(2, 1, 1));
    }

    #[test]
    fn validity() {
        assert!(RoleCounts::new(1, 1, 1).is_valid_for(3));
        assert!(!RoleCounts::new(0, 1, 1).is_valid_for(5));
        assert!(!RoleCounts::new(1, 2, 0).is_valid_for(5));
        assert!(!RoleCounts::new(1, 0, 2).is_valid_for(5));
        assert!(!RoleCounts::new(3, 1, 1).is_valid_for(4));
    }

    #[test]
    fn deal_in_seat_order() {
        let dealt = RoleCounts::new(2, 1, 1).deal(6);
        assert_eq!(
            dealt,
            vec![
                Role::Mafia,
                Role::Mafia,
                Role::Doctor,
                Role::Cop,
                Role::Villager,
                Role::Villager
            ]
        );
        assert_eq!(RoleCounts::of(dealt.iter()), RoleCounts::new(2, 1, 1));
    }

    #[test]
    fn parse_role_names() {
        assert_eq!("Mafia".parse::<Role>().unwrap(), Role::Mafia);
        assert_eq!(" cop ".parse::<Role>().unwrap(), Role::Cop);
        assert!("werewolf".parse::<Role>().is_err());
    }
}
