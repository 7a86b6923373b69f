//! Run configuration for noise simulations
//!
//! A configuration names the noise spectra to read, the arrays they cover
//! and the shape of the realizations to draw. It is stored as JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::alm::Precision;
use crate::covariance::MIN_LMAX;

/// Errors that can occur while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to assemble covariances and draw noise realizations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Directory holding `mean_{ar1}x{ar2}_{survey}_noise.dat` files
    pub noise_dir: PathBuf,

    /// Survey tag used in noise file names
    pub survey: String,

    /// Detector array names, in tensor index order
    pub arrays: Vec<String>,

    /// Length of the multipole axis (exclusive)
    pub lmax: usize,

    /// Number of data splits
    #[serde(default = "default_nsplits")]
    pub nsplits: usize,

    /// 1 for temperature only, 3 for T, E and B
    #[serde(default = "default_ncomp")]
    pub ncomp: usize,

    /// Directory holding `fg_{f1}x{f2}_TT.dat` files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fg_dir: Option<PathBuf>,

    /// Frequency channels of the foreground model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frequencies: Vec<String>,

    /// Base seed; unseeded runs draw from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default)]
    pub precision: Precision,
}

fn default_nsplits() -> usize {
    1
}

fn default_ncomp() -> usize {
    3
}

impl SimulationConfig {
    /// Create a configuration with default splits, components and precision
    pub fn new(noise_dir: PathBuf, survey: String, arrays: Vec<String>, lmax: usize) -> Self {
        Self {
            noise_dir,
            survey,
            arrays,
            lmax,
            nsplits: default_nsplits(),
            ncomp: default_ncomp(),
            fg_dir: None,
            frequencies: Vec::new(),
            seed: None,
            precision: Precision::default(),
        }
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lmax < MIN_LMAX {
            return Err(ConfigError::Invalid(format!(
                "lmax {} must be at least {MIN_LMAX}",
                self.lmax
            )));
        }
        if self.nsplits == 0 {
            return Err(ConfigError::Invalid("nsplits must be at least 1".into()));
        }
        if self.ncomp != 1 && self.ncomp != 3 {
            return Err(ConfigError::Invalid(format!(
                "ncomp must be 1 or 3, got {}",
                self.ncomp
            )));
        }
        if self.arrays.is_empty() {
            return Err(ConfigError::Invalid("no arrays given".into()));
        }
        check_unique("array", &self.arrays)?;

        if self.fg_dir.is_some() {
            if self.frequencies.is_empty() {
                return Err(ConfigError::Invalid(
                    "fg_dir is set but no frequencies are given".into(),
                ));
            }
            check_unique("frequency", &self.frequencies)?;
        }
        Ok(())
    }
}

fn check_unique(kind: &str, names: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "{kind} '{name}' is listed more than once"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base() -> SimulationConfig {
        SimulationConfig::new(
            PathBuf::from("/data/noise"),
            "dr6".into(),
            vec!["pa5_f090".into(), "pa5_f150".into()],
            100,
        )
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let json = r#"{"noise_dir": "noise", "survey": "dr6", "arrays": ["a"], "lmax": 50}"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.nsplits, 1);
        assert_eq!(config.ncomp, 3);
        assert_eq!(config.precision, Precision::Double);
        assert!(config.seed.is_none());
        assert!(config.fg_dir.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sim.json");
        let mut config = base();
        config.seed = Some(12);
        config.precision = Precision::Single;

        config.save(&path).unwrap();
        let loaded = SimulationConfig::load(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = base();
        config.lmax = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = base();
        config.nsplits = 0;
        assert!(config.validate().is_err());

        let mut config = base();
        config.ncomp = 2;
        assert!(config.validate().is_err());

        let mut config = base();
        config.arrays.push("pa5_f090".into());
        assert!(config.validate().is_err());

        let mut config = base();
        config.fg_dir = Some(PathBuf::from("fg"));
        assert!(config.validate().is_err());
        config.frequencies = vec!["090".into()];
        config.validate().unwrap();
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = SimulationConfig::load(&temp_dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SimulationConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
