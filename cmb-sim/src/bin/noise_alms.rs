//! Noise alm generator
//!
//! Assembles the noise covariance of a set of detector arrays from their
//! measured noise spectra, draws one noise realization per data split, and
//! reports how the empirical power of every realization compares with the
//! covariance it was drawn from. When a foreground directory is configured
//! a correlated temperature foreground realization is drawn as well.
//!
//! Usage:
//! ```
//! cargo run --bin noise_alms -- --config sim.json [OPTIONS]
//! cargo run --bin noise_alms -- --noise-dir spectra --survey dr6 \
//!     --arrays pa5_f090,pa5_f150 --lmax 3000 --nsplits 4 --seed 1
//! ```
//!
//! See --help for detailed options.

use anyhow::{Context, Result};
use clap::Parser;
use cmb_sim::alm::AlmPrecision;
use cmb_sim::shared_args::SharedSimulationArgs;
use cmb_sim::{
    assemble_foreground_matrix, assemble_noise_matrices, generate_noise_alms,
    generate_noise_alms_seeded, rand_alm, summarize_alm, summarize_noise, Alm, AlmLayout,
    NoiseMatrices, NoiseRealizations, Precision, RealizationSummary, SimulationConfig,
};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;

/// Command line arguments for noise alm generation
#[derive(Parser, Debug)]
#[command(
    name = "Noise Alms",
    about = "Draws correlated per-split noise alms from measured noise spectra",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    shared: SharedSimulationArgs,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Save the resolved configuration to this file
    #[arg(long)]
    save_config: Option<PathBuf>,
}

/// Everything written to the JSON summary
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    config: &'a SimulationConfig,
    realizations: usize,
    noise: Vec<RealizationSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    foreground: Vec<RealizationSummary>,
}

fn generate<T: AlmPrecision>(
    config: &SimulationConfig,
    noise: &NoiseMatrices,
) -> Result<NoiseRealizations<T>> {
    let pol = Some(&noise.polarization);
    let realizations = match config.seed {
        Some(seed) => generate_noise_alms_seeded(
            seed,
            &noise.temperature,
            config.lmax,
            config.nsplits,
            config.ncomp,
            pol,
        )?,
        None => generate_noise_alms(
            &mut StdRng::from_entropy(),
            &noise.temperature,
            config.lmax,
            config.nsplits,
            config.ncomp,
            pol,
        )?,
    };
    Ok(realizations)
}

fn foreground_summary<T: AlmPrecision>(
    config: &SimulationConfig,
    layout: &AlmLayout,
) -> Result<Vec<RealizationSummary>> {
    let Some(fg_dir) = &config.fg_dir else {
        return Ok(Vec::new());
    };

    let fg = assemble_foreground_matrix(fg_dir, &config.frequencies, config.lmax)
        .context("Failed to assemble foreground covariance")?;

    // Offset past every split seed so foregrounds never reuse a noise stream
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(config.nsplits as u64)),
        None => StdRng::from_entropy(),
    };
    let alm: Alm<T> = rand_alm(&mut rng, &fg.temperature, config.lmax)?;
    Ok(summarize_alm("fg", &alm, &fg.temperature, layout)?)
}

fn run<'a, T: AlmPrecision>(
    config: &'a SimulationConfig,
    noise: &NoiseMatrices,
) -> Result<RunSummary<'a>> {
    let layout = AlmLayout::new(config.lmax);

    let realizations: NoiseRealizations<T> = generate(config, noise)?;
    let noise_summary = summarize_noise(&realizations, noise, &layout)?;
    let foreground = foreground_summary::<T>(config, &layout)?;

    Ok(RunSummary {
        config,
        realizations: realizations.len(),
        noise: noise_summary,
        foreground,
    })
}

fn log_summaries(kind: &str, summaries: &[RealizationSummary]) {
    for summary in summaries {
        info!(
            "{kind} {} {}: median empirical/expected power {:.3} over {} multipoles",
            summary.key, summary.array, summary.median_power_ratio, summary.multipoles
        );
        if (summary.median_power_ratio - 1.0).abs() > 0.5 {
            warn!(
                "{kind} {} {} power is far from its covariance",
                summary.key, summary.array
            );
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging from environment variables
    env_logger::init();

    let args = Args::parse();
    let config = args
        .shared
        .resolve()
        .context("Failed to resolve simulation configuration")?;

    info!(
        "Simulating {} splits of {} arrays (ncomp {}, lmax {}, {:?} precision)",
        config.nsplits,
        config.arrays.len(),
        config.ncomp,
        config.lmax,
        config.precision
    );

    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
    }

    let noise = assemble_noise_matrices(
        &config.noise_dir,
        &config.survey,
        &config.arrays,
        config.lmax,
        config.nsplits,
    )
    .context("Failed to assemble noise covariance")?;

    let summary = match config.precision {
        Precision::Single => run::<f32>(&config, &noise)?,
        Precision::Double => run::<f64>(&config, &noise)?,
    };

    log_summaries("noise", &summary.noise);
    log_summaries("foreground", &summary.foreground);
    println!(
        "Generated {} noise realizations for {} arrays",
        summary.realizations,
        config.arrays.len()
    );

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("Summary written to {}", path.display());
    }

    Ok(())
}
