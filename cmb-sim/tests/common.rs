//! Common utilities for cmb-sim tests

#![allow(dead_code)]

use std::path::Path;
use tempfile::TempDir;
use test_helpers::{flat_cl_to_dl, write_foreground_spectrum, write_survey_noise};

pub const SURVEY: &str = "dr6";

/// Per-multipole noise (`N_l`, not `l(l+1)N_l/2π`) between arrays of a fixture
#[derive(Debug, Clone, Copy)]
pub struct FlatNoise {
    /// Temperature auto noise of every array
    pub tt_auto: f64,
    /// Temperature noise between different arrays
    pub tt_cross: f64,
    /// EE auto noise
    pub ee_auto: f64,
    /// BB auto noise
    pub bb_auto: f64,
    /// EE and BB noise between different arrays
    pub pol_cross: f64,
}

impl Default for FlatNoise {
    fn default() -> Self {
        Self {
            tt_auto: 4.0,
            tt_cross: 1.0,
            ee_auto: 1.5,
            bb_auto: 2.5,
            pol_cross: 0.4,
        }
    }
}

impl FlatNoise {
    /// `N_l` of spectrum `name` for the pair `(i, j)`
    pub fn cl(&self, i: usize, j: usize, name: &str) -> f64 {
        let auto = i == j;
        match (name, auto) {
            ("TT", true) => self.tt_auto,
            ("TT", false) => self.tt_cross,
            ("EE", true) => self.ee_auto,
            ("BB", true) => self.bb_auto,
            ("EE", false) | ("BB", false) => self.pol_cross,
            _ => 0.0,
        }
    }

    /// Expected polarization covariance entry for the pair `(i, j)`
    pub fn pol(&self, i: usize, j: usize) -> f64 {
        (self.cl(i, j, "EE") + self.cl(i, j, "BB")) / 2.0
    }
}

/// Temporary noise directory with one spectra file per array pair
pub struct NoiseFixture {
    pub dir: TempDir,
    pub arrays: Vec<String>,
    pub noise: FlatNoise,
}

impl NoiseFixture {
    pub fn new(arrays: &[&str], lmax_file: usize, noise: FlatNoise) -> Self {
        let dir = TempDir::new().unwrap();
        write_survey_noise(dir.path(), SURVEY, arrays, lmax_file, |i, j, name, ell| {
            flat_cl_to_dl(noise.cl(i, j, name), ell)
        })
        .unwrap();
        Self {
            dir,
            arrays: arrays.iter().map(|s| s.to_string()).collect(),
            noise,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Write foreground files for every frequency pair, `C_l = value(i, j)`
pub fn write_flat_foregrounds(
    dir: &Path,
    freqs: &[&str],
    lmax_file: usize,
    value: fn(usize, usize) -> f64,
) {
    for (i, f1) in freqs.iter().enumerate() {
        for (j, f2) in freqs.iter().enumerate().skip(i) {
            write_foreground_spectrum(dir, f1, f2, lmax_file, |ell| {
                flat_cl_to_dl(value(i, j), ell)
            })
            .unwrap();
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
