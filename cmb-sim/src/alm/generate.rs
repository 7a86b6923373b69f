//! Noise realizations for every data split
//!
//! Temperature-only runs (`ncomp = 1`) draw one realization per split from
//! the temperature noise covariance. Polarized runs (`ncomp = 3`) draw a
//! temperature realization plus independent E and B realizations from the
//! polarization covariance. All draws are independent of each other.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::{Alm, AlmError, AlmPrecision, HarmonicSampler};
use crate::covariance::CovarianceTensor;

/// Stokes-derived harmonic component of a polarized realization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Component {
    T,
    E,
    B,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::T, Component::E, Component::B];
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Component::T => "T",
            Component::E => "E",
            Component::B => "B",
        };
        f.write_str(label)
    }
}

/// Key of one realization in a [`NoiseRealizations`] set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RealizationKey {
    TemperatureOnly { split: usize },
    Polarized { component: Component, split: usize },
}

impl RealizationKey {
    pub fn split(&self) -> usize {
        match self {
            RealizationKey::TemperatureOnly { split } => *split,
            RealizationKey::Polarized { split, .. } => *split,
        }
    }

    /// `None` for temperature-only realizations
    pub fn component(&self) -> Option<Component> {
        match self {
            RealizationKey::TemperatureOnly { .. } => None,
            RealizationKey::Polarized { component, .. } => Some(*component),
        }
    }
}

impl fmt::Display for RealizationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealizationKey::TemperatureOnly { split } => write!(f, "{split}"),
            RealizationKey::Polarized { component, split } => write!(f, "({component}, {split})"),
        }
    }
}

/// T, E and B realizations of one split
#[derive(Debug, Clone, PartialEq)]
pub struct PolarizedAlms<T: AlmPrecision = f64> {
    pub t: Alm<T>,
    pub e: Alm<T>,
    pub b: Alm<T>,
}

impl<T: AlmPrecision> PolarizedAlms<T> {
    pub fn get(&self, component: Component) -> &Alm<T> {
        match component {
            Component::T => &self.t,
            Component::E => &self.e,
            Component::B => &self.b,
        }
    }
}

/// Noise realizations of every split, shaped by the number of components
///
/// Each realization has shape `[n_arrays, n_alm]`.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseRealizations<T: AlmPrecision = f64> {
    /// One temperature realization per split
    TemperatureOnly(Vec<Alm<T>>),
    /// T, E and B realizations per split
    Polarized(Vec<PolarizedAlms<T>>),
}

impl<T: AlmPrecision> NoiseRealizations<T> {
    pub fn nsplits(&self) -> usize {
        match self {
            NoiseRealizations::TemperatureOnly(splits) => splits.len(),
            NoiseRealizations::Polarized(splits) => splits.len(),
        }
    }

    /// Number of realizations (keys) in the set
    pub fn len(&self) -> usize {
        match self {
            NoiseRealizations::TemperatureOnly(splits) => splits.len(),
            NoiseRealizations::Polarized(splits) => 3 * splits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up one realization
    pub fn get(&self, key: &RealizationKey) -> Option<&Alm<T>> {
        match (self, key) {
            (
                NoiseRealizations::TemperatureOnly(splits),
                RealizationKey::TemperatureOnly { split },
            ) => splits.get(*split),
            (
                NoiseRealizations::Polarized(splits),
                RealizationKey::Polarized { component, split },
            ) => splits.get(*split).map(|teb| teb.get(*component)),
            _ => None,
        }
    }

    /// All `(key, realization)` pairs, split-major
    pub fn entries(&self) -> Vec<(RealizationKey, &Alm<T>)> {
        match self {
            NoiseRealizations::TemperatureOnly(splits) => splits
                .iter()
                .enumerate()
                .map(|(split, alm)| (RealizationKey::TemperatureOnly { split }, alm))
                .collect(),
            NoiseRealizations::Polarized(splits) => splits
                .iter()
                .enumerate()
                .flat_map(|(split, teb)| {
                    Component::ALL.into_iter().map(move |component| {
                        (
                            RealizationKey::Polarized { component, split },
                            teb.get(component),
                        )
                    })
                })
                .collect(),
        }
    }

    pub fn keys(&self) -> Vec<RealizationKey> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }

    /// Flatten into a map keyed by [`RealizationKey`]
    pub fn into_map(self) -> BTreeMap<RealizationKey, Alm<T>> {
        match self {
            NoiseRealizations::TemperatureOnly(splits) => splits
                .into_iter()
                .enumerate()
                .map(|(split, alm)| (RealizationKey::TemperatureOnly { split }, alm))
                .collect(),
            NoiseRealizations::Polarized(splits) => splits
                .into_iter()
                .enumerate()
                .flat_map(|(split, teb)| {
                    [
                        (Component::T, teb.t),
                        (Component::E, teb.e),
                        (Component::B, teb.b),
                    ]
                    .into_iter()
                    .map(move |(component, alm)| {
                        (RealizationKey::Polarized { component, split }, alm)
                    })
                })
                .collect(),
        }
    }
}

/// Prepared samplers for one generation run
enum Samplers {
    Temperature(HarmonicSampler),
    Polarized {
        temperature: HarmonicSampler,
        polarization: HarmonicSampler,
    },
}

impl Samplers {
    /// Check the component contract, then factor the needed tensors
    fn prepare(
        nl_array_t: &CovarianceTensor,
        lmax: usize,
        ncomp: usize,
        nl_array_pol: Option<&CovarianceTensor>,
    ) -> Result<Self, AlmError> {
        match ncomp {
            1 => Ok(Samplers::Temperature(HarmonicSampler::new(nl_array_t, lmax)?)),
            3 => {
                let pol = nl_array_pol.ok_or(AlmError::MissingPolarization)?;
                if pol.n_arrays() != nl_array_t.n_arrays() {
                    return Err(AlmError::ArrayCountMismatch {
                        temperature: nl_array_t.n_arrays(),
                        polarization: pol.n_arrays(),
                    });
                }
                Ok(Samplers::Polarized {
                    temperature: HarmonicSampler::new(nl_array_t, lmax)?,
                    polarization: HarmonicSampler::new(pol, lmax)?,
                })
            }
            other => Err(AlmError::UnsupportedComponents(other)),
        }
    }

    fn draw_temperature<T: AlmPrecision, R: Rng + ?Sized>(
        sampler: &HarmonicSampler,
        rng: &mut R,
    ) -> Alm<T> {
        sampler.draw(rng)
    }

    fn draw_polarized<T: AlmPrecision, R: Rng + ?Sized>(
        temperature: &HarmonicSampler,
        polarization: &HarmonicSampler,
        rng: &mut R,
    ) -> PolarizedAlms<T> {
        // Field order fixes the draw order: T, then E, then B
        PolarizedAlms {
            t: temperature.draw(rng),
            e: polarization.draw(rng),
            b: polarization.draw(rng),
        }
    }
}

/// Generate noise realizations for every split from an explicit generator
///
/// # Arguments
/// * `rng` - Random source; seed it for reproducible output
/// * `nl_array_t` - Temperature noise covariance `[n_arrays, n_arrays, n_ell]`
/// * `lmax` - Largest multipole of the realizations (inclusive)
/// * `nsplits` - Number of data splits
/// * `ncomp` - 1 for temperature only, 3 for T, E and B
/// * `nl_array_pol` - Polarization noise covariance, required when `ncomp == 3`
///   and never read when `ncomp == 1`
///
/// # Returns
/// * `Ok(NoiseRealizations)` - `nsplits` (ncomp 1) or `3 * nsplits` (ncomp 3)
///   realizations
/// * `Err(AlmError)` - If the component contract is violated or a covariance
///   slice cannot be factored
pub fn generate_noise_alms<T, R>(
    rng: &mut R,
    nl_array_t: &CovarianceTensor,
    lmax: usize,
    nsplits: usize,
    ncomp: usize,
    nl_array_pol: Option<&CovarianceTensor>,
) -> Result<NoiseRealizations<T>, AlmError>
where
    T: AlmPrecision,
    R: Rng + ?Sized,
{
    let samplers = Samplers::prepare(nl_array_t, lmax, ncomp, nl_array_pol)?;

    let realizations: NoiseRealizations<T> = match &samplers {
        Samplers::Temperature(sampler) => NoiseRealizations::TemperatureOnly(
            (0..nsplits)
                .map(|_| Samplers::draw_temperature(sampler, rng))
                .collect(),
        ),
        Samplers::Polarized {
            temperature,
            polarization,
        } => NoiseRealizations::Polarized(
            (0..nsplits)
                .map(|_| Samplers::draw_polarized(temperature, polarization, rng))
                .collect(),
        ),
    };

    info!(
        "Generated {} noise realizations ({nsplits} splits, ncomp {ncomp}, lmax {lmax})",
        realizations.len()
    );
    Ok(realizations)
}

/// Generate noise realizations for every split in parallel from a base seed
///
/// Split `k` draws from its own generator seeded with `seed + k`, so the
/// output depends only on `seed`, never on thread scheduling. Contract and
/// errors are those of [`generate_noise_alms`].
pub fn generate_noise_alms_seeded<T>(
    seed: u64,
    nl_array_t: &CovarianceTensor,
    lmax: usize,
    nsplits: usize,
    ncomp: usize,
    nl_array_pol: Option<&CovarianceTensor>,
) -> Result<NoiseRealizations<T>, AlmError>
where
    T: AlmPrecision,
{
    let samplers = Samplers::prepare(nl_array_t, lmax, ncomp, nl_array_pol)?;
    let split_rng = |split: usize| StdRng::seed_from_u64(seed.wrapping_add(split as u64));

    let realizations: NoiseRealizations<T> = match &samplers {
        Samplers::Temperature(sampler) => NoiseRealizations::TemperatureOnly(
            (0..nsplits)
                .into_par_iter()
                .map(|split| Samplers::draw_temperature(sampler, &mut split_rng(split)))
                .collect(),
        ),
        Samplers::Polarized {
            temperature,
            polarization,
        } => NoiseRealizations::Polarized(
            (0..nsplits)
                .into_par_iter()
                .map(|split| {
                    Samplers::draw_polarized(temperature, polarization, &mut split_rng(split))
                })
                .collect(),
        ),
    };

    info!(
        "Generated {} noise realizations from seed {seed} ({nsplits} splits, ncomp {ncomp}, lmax {lmax})",
        realizations.len()
    );
    Ok(realizations)
}
