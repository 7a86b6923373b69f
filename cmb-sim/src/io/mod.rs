//! I/O utilities for tabulated power spectra

pub mod spectra;

pub use spectra::{
    foreground_spectrum_path, noise_spectra_path, parse_spectra, read_spectra, SpectraError,
    TabulatedSpectra, FOREGROUND_SPECTRA, NOISE_SPECTRA,
};
