use clap::Parser;
use std::path::PathBuf;

use crate::alm::Precision;
use crate::config::{ConfigError, SimulationConfig};

/// Simulation arguments shared by binaries that assemble covariances
///
/// Every value may come from `--config`; arguments given on the command line
/// take precedence over the file.
#[derive(Parser, Debug, Clone, Default)]
pub struct SharedSimulationArgs {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the noise spectra files
    #[arg(long)]
    pub noise_dir: Option<PathBuf>,

    /// Survey tag in the noise file names
    #[arg(long)]
    pub survey: Option<String>,

    /// Detector arrays (format: "ar1,ar2,...")
    #[arg(long, value_delimiter = ',')]
    pub arrays: Option<Vec<String>>,

    /// Length of the multipole axis (exclusive)
    #[arg(long)]
    pub lmax: Option<usize>,

    /// Number of data splits
    #[arg(long)]
    pub nsplits: Option<usize>,

    /// Number of components, 1 (T) or 3 (T, E, B)
    #[arg(long)]
    pub ncomp: Option<usize>,

    /// Directory holding foreground spectra files
    #[arg(long)]
    pub fg_dir: Option<PathBuf>,

    /// Foreground frequency channels (format: "090,150,...")
    #[arg(long, value_delimiter = ',')]
    pub frequencies: Option<Vec<String>>,

    /// Base random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Coefficient precision
    #[arg(long, value_enum)]
    pub precision: Option<Precision>,
}

impl SharedSimulationArgs {
    /// Combine the config file (if any) with command-line overrides and validate
    pub fn resolve(&self) -> Result<SimulationConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&json)?
            }
            None => {
                let missing = |what: &str| {
                    ConfigError::Invalid(format!("--{what} is required without --config"))
                };
                SimulationConfig::new(
                    self.noise_dir.clone().ok_or_else(|| missing("noise-dir"))?,
                    self.survey.clone().ok_or_else(|| missing("survey"))?,
                    self.arrays.clone().ok_or_else(|| missing("arrays"))?,
                    self.lmax.ok_or_else(|| missing("lmax"))?,
                )
            }
        };

        if let Some(noise_dir) = &self.noise_dir {
            config.noise_dir = noise_dir.clone();
        }
        if let Some(survey) = &self.survey {
            config.survey = survey.clone();
        }
        if let Some(arrays) = &self.arrays {
            config.arrays = arrays.clone();
        }
        if let Some(lmax) = self.lmax {
            config.lmax = lmax;
        }
        if let Some(nsplits) = self.nsplits {
            config.nsplits = nsplits;
        }
        if let Some(ncomp) = self.ncomp {
            config.ncomp = ncomp;
        }
        if let Some(fg_dir) = &self.fg_dir {
            config.fg_dir = Some(fg_dir.clone());
        }
        if let Some(frequencies) = &self.frequencies {
            config.frequencies = frequencies.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }

        config.validate()?;
        Ok(config)
    }
}
