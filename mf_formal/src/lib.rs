//! Encoding Mafia scenarios as Prover9/Mace4 theories and reading back
//! the models Mace4 finds.

pub mod theory;
pub use theory::*;

pub mod grammar;

pub mod generate;
pub use generate::*;

pub mod parser;
pub use parser::*;

pub mod summary;
pub use summary::*;

pub mod mace4;
pub use mace4::*;

use mf_domain::{MafiaError, Violation};
use std::time::Duration;
use thiserror::Error;

pub type FormalResult<T> = std::result::Result<T, FormalError>;

#[derive(Debug, Error)]
pub enum FormalError {
    #[error("invalid scenario ({} violations): {}", .0.len(), list(.0))]
    InvalidScenario(Vec<Violation>),
    #[error("invalid game state: {0}")]
    InvalidState(String),
    #[error("'{0}' is not a ground atom")]
    BadAtom(String),
    #[error("malformed theory text: {0}")]
    MalformedTheory(String),
    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),
    #[error("solver gave no answer within {0:?}")]
    SolverTimeout(Duration),
    #[error("solver failed with exit code {code}")]
    SolverFailed { code: i32, output: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<MafiaError> for FormalError {
    fn from(e: MafiaError) -> Self {
        match e {
            MafiaError::InvalidScenario(v) => FormalError::InvalidScenario(v),
            MafiaError::InvalidState(s) => FormalError::InvalidState(s),
            MafiaError::Io(e) => FormalError::Io(e),
            other => FormalError::InvalidState(other.to_string()),
        }
    }
}

fn list(violations: &[Violation]) -> String {
    let all: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
    all.join("; ")
}
