//! End-to-end noise realization tests: spectra files to alms

mod common;

use cmb_sim::{
    assemble_noise_matrices, generate_noise_alms, generate_noise_alms_seeded, Alm, AlmError,
    AlmLayout, Component, NoiseMatrices, NoiseRealizations, RealizationKey,
};
use common::{init_logging, FlatNoise, NoiseFixture, SURVEY};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use test_helpers::{ks_critical_value, ks_test_normal, pearson_correlation};

const LMAX: usize = 64;

fn assemble(arrays: &[&str], nsplits: usize) -> (NoiseFixture, NoiseMatrices) {
    let fixture = NoiseFixture::new(arrays, LMAX + 10, FlatNoise::default());
    let noise =
        assemble_noise_matrices(fixture.path(), SURVEY, &fixture.arrays, LMAX, nsplits).unwrap();
    (fixture, noise)
}

/// Real and imaginary parts of `m > 0` coefficients of one array, scaled to unit variance
fn standardized(alm: &Alm, array: usize, variance: f64, layout: &AlmLayout) -> Vec<f64> {
    let scale = (variance / 2.0).sqrt();
    layout
        .iter()
        .filter(|&(l, m, _)| (2..LMAX).contains(&l) && m > 0)
        .flat_map(|(_, _, idx)| {
            let a = alm[[array, idx]];
            [a.re / scale, a.im / scale]
        })
        .collect()
}

#[test]
fn test_polarized_run_key_set() {
    init_logging();
    let (_fixture, noise) = assemble(&["ar1", "ar2"], 3);

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let alms: NoiseRealizations = generate_noise_alms(
        &mut rng,
        &noise.temperature,
        LMAX,
        3,
        3,
        Some(&noise.polarization),
    )
    .unwrap();

    let layout = AlmLayout::new(LMAX);
    let map = alms.into_map();
    assert_eq!(map.len(), 9);
    for split in 0..3 {
        for component in Component::ALL {
            let alm = &map[&RealizationKey::Polarized { component, split }];
            assert_eq!(alm.dim(), (2, layout.n_alm()));
        }
    }
}

#[test]
fn test_temperature_only_run_key_set() {
    let (_fixture, noise) = assemble(&["ar1"], 2);

    let alms: NoiseRealizations =
        generate_noise_alms_seeded(3, &noise.temperature, LMAX, 2, 1, None).unwrap();

    assert_eq!(
        alms.keys(),
        vec![
            RealizationKey::TemperatureOnly { split: 0 },
            RealizationKey::TemperatureOnly { split: 1 }
        ]
    );
}

#[test]
fn test_polarized_run_requires_polarization() {
    let (_fixture, noise) = assemble(&["ar1"], 1);
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let result: Result<NoiseRealizations, _> =
        generate_noise_alms(&mut rng, &noise.temperature, LMAX, 1, 3, None);
    assert!(matches!(result, Err(AlmError::MissingPolarization)));
}

#[test]
fn test_coefficients_follow_noise_covariance() {
    let (fixture, noise) = assemble(&["ar1", "ar2"], 1);
    let alms: NoiseRealizations = generate_noise_alms_seeded(
        2024,
        &noise.temperature,
        LMAX,
        1,
        3,
        Some(&noise.polarization),
    )
    .unwrap();
    let layout = AlmLayout::new(LMAX);
    let flat = fixture.noise;

    let key = |component| RealizationKey::Polarized {
        component,
        split: 0,
    };
    let t = alms.get(&key(Component::T)).unwrap();
    let e = alms.get(&key(Component::E)).unwrap();

    // Gaussian with the expected per-array variance
    let t0 = standardized(t, 0, flat.tt_auto, &layout);
    let e1 = standardized(e, 1, flat.pol(1, 1), &layout);
    let critical = ks_critical_value(t0.len(), 0.01);
    assert!(ks_test_normal(&t0) < critical);
    assert!(ks_test_normal(&e1) < critical);

    let variance = t0.iter().map(|x| x * x).sum::<f64>() / t0.len() as f64;
    assert!((variance - 1.0).abs() < 0.1, "variance {variance}");

    // Correlated between arrays as the cross spectrum dictates
    let t1 = standardized(t, 1, flat.tt_auto, &layout);
    let expected = flat.tt_cross / flat.tt_auto;
    let rho = pearson_correlation(&t0, &t1);
    assert!((rho - expected).abs() < 0.08, "rho {rho}, expected {expected}");

    // T and E are drawn independently
    let e0 = standardized(e, 0, flat.pol(0, 0), &layout);
    assert!(pearson_correlation(&t0, &e0).abs() < 0.08);
}

#[test]
fn test_splits_are_independent() {
    let (_fixture, noise) = assemble(&["ar1"], 2);
    let alms: NoiseRealizations =
        generate_noise_alms_seeded(77, &noise.temperature, LMAX, 2, 1, None).unwrap();
    let layout = AlmLayout::new(LMAX);

    let first = alms.get(&RealizationKey::TemperatureOnly { split: 0 }).unwrap();
    let second = alms.get(&RealizationKey::TemperatureOnly { split: 1 }).unwrap();
    let a = standardized(first, 0, 1.0, &layout);
    let b = standardized(second, 0, 1.0, &layout);

    assert!(pearson_correlation(&a, &b).abs() < 0.08);
}

#[test]
fn test_same_generator_state_reproduces() {
    let (_fixture, noise) = assemble(&["ar1", "ar2"], 2);
    let draw = |seed| -> NoiseRealizations<f32> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate_noise_alms(
            &mut rng,
            &noise.temperature,
            LMAX,
            2,
            3,
            Some(&noise.polarization),
        )
        .unwrap()
    };

    assert_eq!(draw(5), draw(5));
    assert_ne!(draw(5), draw(6));
}
