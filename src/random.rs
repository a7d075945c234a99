//! Random draws used by problem generation and fruit placement
//!
//! Everything random in a round goes through [`RandomSource`], so a round
//! can be replayed from scripted draws. [`fastrand::Rng`] is the source used
//! by live sessions.

use std::ops::{Range, RangeInclusive};

/// A source of the random draws a round needs
pub trait RandomSource {
    /// Draws an integer uniformly from an inclusive range
    fn integer(&mut self, range: RangeInclusive<i64>) -> i64;

    /// Draws a real uniformly from a half-open range
    fn real(&mut self, range: Range<f64>) -> f64;

    /// Draws an index uniformly from `0..len`
    ///
    /// `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// Shuffles a slice in place
    fn shuffle<T>(&mut self, items: &mut [T]);
}

impl RandomSource for fastrand::Rng {
    fn integer(&mut self, range: RangeInclusive<i64>) -> i64 {
        self.i64(range)
    }

    fn real(&mut self, range: Range<f64>) -> f64 {
        range.start + self.f64() * (range.end - range.start)
    }

    fn index(&mut self, len: usize) -> usize {
        self.usize(..len)
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        fastrand::Rng::shuffle(self, items);
    }
}


#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_fastrand_integer_in_range() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..500 {
            let value = rng.integer(1..=5);
            assert!((1..=5).contains(&value));
        }
    }

    #[test]
    fn test_fastrand_real_in_range() {
        let mut rng = fastrand::Rng::with_seed(12);
        for _ in 0..500 {
            let value = rng.real(0.1..0.9);
            assert!((0.1..0.9).contains(&value));
        }
    }

    #[test]
    fn test_fastrand_shuffle_keeps_items() {
        let mut rng = fastrand::Rng::with_seed(13);
        let mut items = vec![1, 2, 3, 4, 5];
        RandomSource::shuffle(&mut rng, &mut items);
        items.sort_unstable();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scripted_replays_draws() {
        let mut script = testing::Scripted::new(&[2, 3, 1], &[1.5]);
        assert_eq!(script.integer(1..=5), 2);
        assert_eq!(script.integer(1..=5), 3);
        assert_eq!(script.index(10), 1);
        assert!((script.real(1.0..2.0) - 1.5).abs() < f64::EPSILON);
    }
}
