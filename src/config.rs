//! Configuration loading from `passgym.toml`.
//!
//! Every key is optional; missing keys take the defaults below.
//!
//! ## Example
//!
//! ```toml
//! addr = "0.0.0.0:5000"
//! max_episode_steps = 5
//!
//! [datasets]
//! train_dataset = "npb-v0"
//! train_count = 50
//! val_count = 5
//! test_dataset = "chstone-v0"
//!
//! [train]
//! max_episodes = 5
//! seed = 204
//!
//! [evaluation]
//! sequence_a = ["-mem2reg", "-instcombine", "-dce"]
//! sequence_b = ["-simplifycfg", "-gvn", "-adce"]
//! regression_scope = "across-benchmarks"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::env::{EnvError, SplitConfig};
use crate::env::passes::{self, Action};
use crate::eval::{EvalError, RegressionScope, SequencePair};
use crate::runtime::SchedulerConfig;
use crate::train::TrainConfig;

pub const DEFAULT_CONFIG_FILE: &str = "passgym.toml";
pub const ADDR_ENV: &str = "PASSGYM_ADDR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown pass: {0}")]
    UnknownPass(String),

    #[error(transparent)]
    Sequence(#[from] EvalError),

    #[error("invalid dataset split: {0}")]
    Datasets(#[from] EnvError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub sequence_a: Vec<String>,
    pub sequence_b: Option<Vec<String>>,
    pub regression_scope: RegressionScope,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            sequence_a: ["-mem2reg", "-instcombine", "-dce"].map(String::from).to_vec(),
            sequence_b: Some(["-simplifycfg", "-gvn", "-adce"].map(String::from).to_vec()),
            regression_scope: RegressionScope::default(),
        }
    }
}

fn resolve(flags: &[String]) -> Result<Vec<Action>, ConfigError> {
    flags
        .iter()
        .map(|f| passes::action_for(f).ok_or_else(|| ConfigError::UnknownPass(f.clone())))
        .collect()
}

impl EvalConfig {
    /// Resolve pass flags into the candidate action sequences.
    pub fn sequences(&self) -> Result<SequencePair<Action>, ConfigError> {
        let a = resolve(&self.sequence_a)?;
        let b = self.sequence_b.as_deref().map(resolve).transpose()?;
        Ok(SequencePair::new(a, b)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub addr: String,
    pub max_episode_steps: u32,
    pub datasets: SplitConfig,
    pub train: TrainConfig,
    pub evaluation: EvalConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
            max_episode_steps: 5,
            datasets: SplitConfig::default(),
            train: TrainConfig::default(),
            evaluation: EvalConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load configuration.
    ///
    /// Search order:
    /// 1. The explicit path, which must exist
    /// 2. `passgym.toml` in the working directory
    /// 3. Defaults
    ///
    /// `PASSGYM_ADDR` overrides the listen address afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    debug!("no config file, using defaults");
                    Self::default()
                }
            }
        };
        if let Ok(addr) = std::env::var(ADDR_ENV) {
            config.addr = addr;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_default() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.max_episode_steps, 5);
        assert_eq!(config.datasets.train_count, 50);
        assert_eq!(config.train.seed, 0xCC);
        assert_eq!(config.evaluation.regression_scope, RegressionScope::AcrossBenchmarks);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = AppConfig::from_toml(
            r#"
            addr = "0.0.0.0:8080"

            [train]
            max_episodes = 40

            [evaluation]
            sequence_a = ["-gvn"]
            regression_scope = "per-episode"
            "#,
        )
        .unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080");
        assert_eq!(config.train.max_episodes, 40);
        assert_eq!(config.train.seed, 0xCC);
        assert_eq!(config.evaluation.regression_scope, RegressionScope::PerEpisode);
        assert!(config.evaluation.sequence_b.is_some());
    }

    #[test]
    fn test_default_sequences_resolve() {
        let pair = EvalConfig::default().sequences().unwrap();
        assert_eq!(pair.get(crate::eval::Active::A), &[0, 2, 3]);
        assert_eq!(pair.get(crate::eval::Active::B), &[4, 5, 9]);
    }

    #[test]
    fn test_unknown_pass_is_rejected() {
        let cfg = EvalConfig {
            sequence_a: vec!["-vectorize".into()],
            ..EvalConfig::default()
        };
        assert!(matches!(cfg.sequences(), Err(ConfigError::UnknownPass(p)) if p == "-vectorize"));
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let cfg = EvalConfig {
            sequence_a: Vec::new(),
            ..EvalConfig::default()
        };
        assert!(matches!(cfg.sequences(), Err(ConfigError::Sequence(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_episode_steps = 9").unwrap();
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_episode_steps, 9);
    }

    #[test]
    fn test_missing_explicit_file_errors() {
        let missing = Path::new("/nonexistent/passgym.toml");
        assert!(matches!(
            AppConfig::from_file(missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
