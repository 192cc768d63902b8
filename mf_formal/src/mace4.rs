//! Running Mace4 as a subprocess.

use super::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Name looked up on PATH, or a path.
    pub executable: String,
    pub start_domain: usize,
    pub max_domain: usize,
    /// Passed to Mace4 as its own search limit (`-t`).
    pub max_seconds: u64,
    /// How long we wait for the process before killing it.
    pub timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            executable: "mace4".to_owned(),
            start_domain: 2,
            max_domain: 10,
            max_seconds: 20,
            timeout_secs: 30,
        }
    }
}

impl SolverConfig {
    /// Theories state their constants pairwise distinct, so no model is
    /// smaller than the number of constants.
    pub fn fitted(&self, constants: usize) -> Self {
        SolverConfig {
            start_domain: self.start_domain.max(constants),
            max_domain: self.max_domain.max(constants),
            ..self.clone()
        }
    }
}

/// Mace4's exit status, classified.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum SolverExit {
    ModelFound,
    NoModel,
    SearchLimit(i32),
    Failed(i32),
}

impl SolverExit {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 | 3 => SolverExit::ModelFound,
            2 => SolverExit::NoModel,
            4 | 5 => SolverExit::SearchLimit(code),
            _ => SolverExit::Failed(code),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct SolverOutput {
    pub exit: SolverExit,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct Mace4 {
    pub path: PathBuf,
    pub config: SolverConfig,
}

impl Mace4 {
    pub fn locate(config: &SolverConfig) -> FormalResult<Self> {
        let path = which::which(&config.executable).map_err(|e| {
            FormalError::SolverUnavailable(format!("'{}': {}", config.executable, e))
        })?;
        tracing::debug!("using mace4 at {}", path.display());
        Ok(Mace4 {
            path,
            config: config.clone(),
        })
    }

    pub fn args(&self, file: &Path) -> Vec<String> {
        vec![
            "-n".to_owned(),
            self.config.start_domain.to_string(),
            "-N".to_owned(),
            self.config.max_domain.to_string(),
            "-t".to_owned(),
            self.config.max_seconds.to_string(),
            "-f".to_owned(),
            file.display().to_string(),
        ]
    }

    /// Runs Mace4 on a theory text. A finished search is an `Ok`, model or
    /// not. Running into our timeout or Mace4's own search limit gives no
    /// answer and is a `SolverTimeout`; a crash is a `SolverFailed`.
    pub async fn run(&self, theory: &str) -> FormalResult<SolverOutput> {
        let mut file = tempfile::Builder::new()
            .prefix("mafia_")
            .suffix(".in")
            .tempfile()?;
        file.write_all(theory.as_bytes())?;
        file.flush()?;

        let args = self.args(file.path());
        tracing::info!("running {} {}", self.path.display(), args.join(" "));
        let child = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                FormalError::SolverUnavailable(format!("{}: {}", self.path.display(), e))
            })?;

        let timeout = std::time::Duration::from_secs(self.config.timeout_secs);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                tracing::warn!("mace4 gave no answer within {:?}", timeout);
                return Err(FormalError::SolverTimeout(timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        // killed by a signal when there is no code
        let exit = SolverExit::from_code(output.status.code().unwrap_or(-1));
        tracing::debug!("mace4 finished: {:?}", exit);
        match exit {
            SolverExit::Failed(code) => {
                return Err(FormalError::SolverFailed {
                    code,
                    output: format!("{stdout}{stderr}"),
                })
            }
            SolverExit::SearchLimit(code) => {
                tracing::warn!("mace4 stopped at its search limit (exit {code})");
                return Err(FormalError::SolverTimeout(std::time::Duration::from_secs(
                    self.config.max_seconds,
                )));
            }
            SolverExit::ModelFound | SolverExit::NoModel => {}
        }
        Ok(SolverOutput {
            exit,
            stdout,
            stderr,
        })
    }

    /// Inserts `query` into the assumptions of `theory` and looks for a
    /// model of the result.
    pub async fn query(&self, theory: &str, query: &Atom) -> FormalResult<(SolverOutput, ParseResult)> {
        let text = insert_assumption(theory, query)?;
        let output = self.run(&text).await?;
        let parsed = parse_output(&output);
        Ok((output, parsed))
    }
}

/// What the solver says about the two win predicates at one time point.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct WinCheck {
    pub villagers: bool,
    pub mafia: bool,
}

impl WinCheck {
    pub fn verdict(&self) -> Option<mf_domain::Verdict> {
        match (self.villagers, self.mafia) {
            (true, false) => Some(mf_domain::Verdict::Villagers),
            (false, true) => Some(mf_domain::Verdict::Mafia),
            (false, false) => Some(mf_domain::Verdict::Ongoing),
            // both hold only when nobody is alive
            (true, true) => None,
        }
    }
}

/// A win predicate holds when its negation has no model.
pub async fn check_win(mace4: &Mace4, state: &mf_domain::GameState) -> FormalResult<WinCheck> {
    let theory = win_theory(state)?;
    let mut entailed = [false; 2];
    for (slot, predicate) in entailed.iter_mut().zip(["villagersWin", "mafiaWin"]) {
        let mut negated = theory.clone();
        negated.assume(Atom::new(predicate, &[state.time.as_str()]).negate());
        let output = mace4.run(&negated.to_string()).await?;
        *slot = match output.exit {
            SolverExit::NoModel => true,
            SolverExit::ModelFound => false,
            SolverExit::SearchLimit(code) | SolverExit::Failed(code) => {
                return Err(FormalError::SolverFailed {
                    code,
                    output: output.stdout,
                })
            }
        };
    }
    Ok(WinCheck {
        villagers: entailed[0],
        mafia: entailed[1],
    })
}
