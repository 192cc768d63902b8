//! Playing a scenario round by round, and the solver calls made on its
//! behalf.

use mf_domain::*;
use mf_formal::*;

mod config;
pub use config::*;

mod game;
pub use game::*;

mod suggest;
pub use suggest::*;

mod solver_session;
pub use solver_session::*;

use thiserror::Error;
use uuid::Uuid;

pub type RunnerResult<T> = std::result::Result<T, RunnerError>;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Domain(#[from] MafiaError),
    #[error(transparent)]
    Formal(#[from] FormalError),
    #[error("a solver call for scenario {0} is already running")]
    SolverBusy(Uuid),
    #[error("bad configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Errors caused by what the user handed in, as opposed to the
    /// environment (solver, file system).
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            RunnerError::Domain(_)
                | RunnerError::Json(_)
                | RunnerError::Formal(
                    FormalError::InvalidScenario(_)
                        | FormalError::InvalidState(_)
                        | FormalError::BadAtom(_)
                        | FormalError::MalformedTheory(_)
                )
        )
    }
}

fn invalid_move(msg: String) -> RunnerError {
    RunnerError::Domain(MafiaError::InvalidState(msg))
}

#[cfg(test)]
mod tests_runner {
    use super::*;

    #[test]
    fn bad_input_or_environment() {
        assert!(invalid_move("no".into()).is_bad_input());
        assert!(RunnerError::Formal(FormalError::BadAtom("X".into())).is_bad_input());
        assert!(!RunnerError::SolverBusy(Uuid::nil()).is_bad_input());
        assert!(!RunnerError::Formal(FormalError::SolverTimeout(std::time::Duration::from_secs(1)))
            .is_bad_input());
    }
}
