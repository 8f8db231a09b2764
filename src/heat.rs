//! Synthetic "10-minute rise" estimation.
//!
//! Sources only report a total heat value, so the short-interval delta is
//! simulated: a uniformly drawn fraction in `[0.01, 0.08)` of the total.

use rand::{Rng, rng};

/// Lower bound (inclusive) of the rise fraction.
pub const MIN_RISE_FRACTION: f64 = 0.01;
/// Upper bound (exclusive) of the rise fraction.
pub const MAX_RISE_FRACTION: f64 = 0.08;

/// Draw a fresh rise estimate for `total_heat`.
///
/// Every call draws independently; two items with the same heat will
/// usually get different rises.
pub fn estimate_rise(total_heat: u64) -> u64 {
    let fraction = rng().random_range(MIN_RISE_FRACTION..MAX_RISE_FRACTION);
    rise_for_fraction(total_heat, fraction)
}

/// `floor(total_heat * fraction)`.
pub fn rise_for_fraction(total_heat: u64, fraction: f64) -> u64 {
    (total_heat as f64 * fraction).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rise_for_fraction_floors() {
        assert_eq!(rise_for_fraction(1000, 0.01), 10);
        assert_eq!(rise_for_fraction(999, 0.05), 49);
        assert_eq!(rise_for_fraction(0, 0.07), 0);
    }

    #[test]
    fn test_estimate_rise_bounds() {
        for heat in [0u64, 1, 13, 100, 5_000_000, 987_654_321] {
            let upper = (MAX_RISE_FRACTION * heat as f64).ceil() as u64;
            let lower = rise_for_fraction(heat, MIN_RISE_FRACTION);
            for _ in 0..200 {
                let rise = estimate_rise(heat);
                assert!(rise >= lower, "heat={heat} rise={rise}");
                assert!(rise <= upper, "heat={heat} rise={rise}");
                if heat > 0 {
                    assert!(rise < upper.max(1), "heat={heat} rise={rise}");
                }
            }
        }
    }

    #[test]
    fn test_estimate_rise_for_example_heat() {
        for _ in 0..100 {
            let rise = estimate_rise(5_000_000);
            assert!((50_000..400_000).contains(&rise));
        }
    }
}
