use super::*;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_MACE4: &str = "MAFIA_MACE4";
pub const ENV_MAX_DOMAIN: &str = "MAFIA_MAX_DOMAIN";
pub const ENV_SOLVER_TIMEOUT: &str = "MAFIA_SOLVER_TIMEOUT_SECS";
pub const ENV_OUTPUT_DIR: &str = "MAFIA_OUTPUT_DIR";

/// Settings for the solver and for where generated theories are written.
/// A JSON file is read first, then the `MAFIA_*` environment variables
/// override it; command line flags override both.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub solver: SolverConfig,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            solver: SolverConfig::default(),
            output_dir: PathBuf::from("prover9"),
        }
    }
}

impl RunnerConfig {
    pub fn from_file(path: &Path) -> RunnerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn load(path: Option<&Path>) -> RunnerResult<Self> {
        let mut config = match path {
            Some(p) => RunnerConfig::from_file(p)?,
            None => RunnerConfig::default(),
        };
        config.apply_env()?;
        tracing::debug!("configuration: {:?}", config);
        Ok(config)
    }

    pub fn apply_env(&mut self) -> RunnerResult<()> {
        if let Ok(exe) = std::env::var(ENV_MACE4) {
            self.solver.executable = exe;
        }
        if let Some(n) = env_number(ENV_MAX_DOMAIN)? {
            self.solver.max_domain = n;
        }
        if let Some(secs) = env_number(ENV_SOLVER_TIMEOUT)? {
            self.solver.timeout_secs = secs;
        }
        if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Where the theory of a scenario generated now is written.
    pub fn theory_path(&self, scenario: &Scenario) -> PathBuf {
        self.output_dir
            .join(theory_file_name(&scenario.id, &Local::now()))
    }
}

fn env_number<T: FromStr>(name: &str) -> RunnerResult<Option<T>> {
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| RunnerError::Config(format!("{name}={v} is not a number"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod test_config {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for var in [ENV_MACE4, ENV_MAX_DOMAIN, ENV_SOLVER_TIMEOUT, ENV_OUTPUT_DIR] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_without_file_or_env() {
        clear_env();
        let c = RunnerConfig::load(None).unwrap();
        assert_eq!(c, RunnerConfig::default());
        assert_eq!(c.solver.executable, "mace4");
    }

    #[test]
    #[serial]
    fn env_overrides_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"solver": {{"max_domain": 12, "timeout_secs": 5}}, "output_dir": "out"}}"#
        )
        .unwrap();

        let c = RunnerConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.solver.max_domain, 12);
        assert_eq!(c.solver.timeout_secs, 5);
        assert_eq!(c.output_dir, PathBuf::from("out"));

        std::env::set_var(ENV_MAX_DOMAIN, "7");
        std::env::set_var(ENV_MACE4, "/opt/ladr/bin/mace4");
        let c = RunnerConfig::load(Some(file.path())).unwrap();
        assert_eq!(c.solver.max_domain, 7);
        assert_eq!(c.solver.timeout_secs, 5);
        assert_eq!(c.solver.executable, "/opt/ladr/bin/mace4");
        clear_env();
    }

    #[test]
    #[serial]
    fn bad_numbers_are_reported() {
        clear_env();
        std::env::set_var(ENV_SOLVER_TIMEOUT, "soon");
        let err = RunnerConfig::load(None).unwrap_err();
        assert!(err.to_string().contains("MAFIA_SOLVER_TIMEOUT_SECS=soon"));
        clear_env();
    }

    #[test]
    #[serial]
    fn theory_files_go_to_the_output_dir() {
        clear_env();
        let c = RunnerConfig::default();
        let s = Scenario::from_counts(4, RoleCounts::default_for(4)).unwrap();
        let path = c.theory_path(&s);
        assert!(path.starts_with("prover9"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!("mafia_{}_", s.id.to_simple())));
        assert!(name.ends_with(".in"));
    }
}
