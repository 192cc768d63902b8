//! The Mafia game domain: players, roles, scenarios and the rules that
//! are evaluated without a solver.

pub mod player;
pub use player::*;

pub mod role;
pub use role::*;

pub mod scenario;
pub use scenario::*;

pub mod validation;
pub use validation::*;

pub mod simulation;
pub use simulation::*;

pub mod win;
pub use win::*;

use thiserror::Error;

/// Build a role map from `player => role` pairs.
#[macro_export]
macro_rules! roles {
    ($( $player: expr => $role: expr ),* $(,)?) => {{
         let mut map = ::std::collections::BTreeMap::new();
         $( map.insert($crate::Player::from($player), $role); )*
         map
    }}
}

pub type MfResult<T> = std::result::Result<T, MafiaError>;

#[derive(Debug, Error)]
pub enum MafiaError {
    #[error("invalid scenario: {}", format_violations(.0))]
    InvalidScenario(Vec<Violation>),
    #[error("invalid game state: {0}")]
    InvalidState(String),
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_violations(violations: &[Violation]) -> String {
    let all: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
    all.join("; ")
}
