//! Triangular m-major layout of spherical-harmonic coefficients
//!
//! Coefficients `a_lm` with `0 <= m <= l <= lmax` are stored contiguously,
//! grouped by `m`: first all `m = 0` entries for `l = 0..=lmax`, then
//! `m = 1` for `l = 1..=lmax`, and so on. This is the layout used by
//! HEALPix and by most harmonic transform libraries.

/// Index arithmetic for a triangular alm array truncated at `lmax`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlmLayout {
    lmax: usize,
}

impl AlmLayout {
    pub fn new(lmax: usize) -> Self {
        Self { lmax }
    }

    /// Largest multipole stored (inclusive)
    pub fn lmax(&self) -> usize {
        self.lmax
    }

    /// Number of stored coefficients, `(lmax + 1)(lmax + 2) / 2`
    pub fn n_alm(&self) -> usize {
        (self.lmax + 1) * (self.lmax + 2) / 2
    }

    /// Flat index of `a_lm`
    ///
    /// # Panics
    /// If `m > l` or `l > lmax`
    pub fn index(&self, l: usize, m: usize) -> usize {
        assert!(
            m <= l && l <= self.lmax,
            "invalid (l, m) = ({l}, {m}) for lmax {}",
            self.lmax
        );
        m * (2 * self.lmax + 1 - m) / 2 + l
    }

    /// Iterate `(l, m, index)` in storage order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize)> {
        let lmax = self.lmax;
        (0..=lmax)
            .flat_map(move |m| (m..=lmax).map(move |l| (l, m)))
            .enumerate()
            .map(|(idx, (l, m))| (l, m, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_n_alm() {
        assert_eq!(AlmLayout::new(0).n_alm(), 1);
        assert_eq!(AlmLayout::new(2).n_alm(), 6);
        assert_eq!(AlmLayout::new(10).n_alm(), 66);
    }

    #[test]
    fn test_m_zero_block_comes_first() {
        let layout = AlmLayout::new(5);
        for l in 0..=5 {
            assert_eq!(layout.index(l, 0), l);
        }
        assert_eq!(layout.index(1, 1), 6);
        assert_eq!(layout.index(5, 5), layout.n_alm() - 1);
    }

    #[test]
    fn test_iter_matches_index() {
        let layout = AlmLayout::new(7);
        let mut count = 0;
        for (l, m, idx) in layout.iter() {
            assert_eq!(layout.index(l, m), idx);
            count += 1;
        }
        assert_eq!(count, layout.n_alm());
    }

    #[test]
    #[should_panic(expected = "invalid (l, m)")]
    fn test_index_rejects_m_above_l() {
        AlmLayout::new(4).index(2, 3);
    }
}
