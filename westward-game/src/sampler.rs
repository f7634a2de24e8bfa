//! Integer range sampling: uniform, normal and weighted-optional draws.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::numbers::round_f64_to_i32;

/// Closed integer range with an optional normal-distribution mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub normal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

impl IntRange {
    #[must_use]
    pub const fn exact(value: i32) -> Self {
        Self::uniform(value, value)
    }

    #[must_use]
    pub const fn uniform(min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            normal: false,
            mean: None,
            std_dev: None,
        }
    }

    /// Normal mode with no explicit parameters; samples are mapped onto the range.
    #[must_use]
    pub const fn normal(min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            normal: true,
            mean: None,
            std_dev: None,
        }
    }

    /// Normal mode with an explicit mean and standard deviation.
    #[must_use]
    pub const fn gaussian(min: i32, max: i32, mean: f64, std_dev: f64) -> Self {
        Self {
            min,
            max,
            normal: true,
            mean: Some(mean),
            std_dev: Some(std_dev),
        }
    }

    const fn bounds(&self) -> (i32, i32) {
        if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        }
    }

    /// Draw one value from the range.
    ///
    /// A degenerate range (`min == max`) always yields `min`. With an explicit
    /// mean and standard deviation the rounded gaussian sample is returned
    /// as-is and may fall outside `[min, max]`; callers needing a hard bound
    /// clamp it themselves.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.min == self.max {
            return self.min;
        }
        let (lo, hi) = self.bounds();
        if self.normal {
            if let (Some(mean), Some(std_dev)) = (self.mean, self.std_dev) {
                return round_f64_to_i32(gaussian(rng, mean, std_dev));
            }
            let spread = f64::from(hi) - f64::from(lo);
            let mapped = standard_normal(rng).mul_add(spread, f64::from(lo));
            return round_f64_to_i32(mapped).clamp(lo, hi);
        }
        rng.gen_range(lo..=hi)
    }

    /// Draw against `weight` first; only a successful draw produces a sample.
    pub fn sample_weighted<R: Rng + ?Sized>(&self, weight: f32, rng: &mut R) -> Option<i32> {
        if rng.r#gen::<f32>() < weight {
            Some(self.sample(rng))
        } else {
            None
        }
    }
}

/// Standard normal draw via the Box-Muller transform.
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = loop {
        let candidate = rng.r#gen::<f64>();
        if candidate > f64::MIN_POSITIVE {
            break candidate;
        }
    };
    let u2 = rng.r#gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Normal draw with the given mean and standard deviation.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    standard_normal(rng).mul_add(std_dev, mean)
}

/// Rounded gaussian draw, or the rounded mean when the spread is zero.
pub fn gaussian_or_exact<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> i32 {
    if std_dev.abs() < f64::EPSILON {
        round_f64_to_i32(mean)
    } else {
        round_f64_to_i32(gaussian(rng, mean, std_dev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn degenerate_range_short_circuits_every_mode() {
        let mut rng = SmallRng::seed_from_u64(7);
        let ranges = [
            IntRange::exact(4),
            IntRange::normal(4, 4),
            IntRange::gaussian(4, 4, 90.0, 12.0),
        ];
        for range in ranges {
            for _ in 0..50 {
                assert_eq!(range.sample(&mut rng), 4);
            }
        }
    }

    #[test]
    fn uniform_stays_inclusive() {
        let mut rng = SmallRng::seed_from_u64(11);
        let range = IntRange::uniform(1, 3);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let value = range.sample(&mut rng);
            assert!((1..=3).contains(&value));
            seen[usize::try_from(value - 1).unwrap()] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn inverted_bounds_are_tolerated() {
        let mut rng = SmallRng::seed_from_u64(3);
        let value = IntRange::uniform(9, 2).sample(&mut rng);
        assert!((2..=9).contains(&value));
    }

    #[test]
    fn mapped_normal_is_clamped_into_range() {
        let mut rng = SmallRng::seed_from_u64(5);
        let range = IntRange::normal(10, 20);
        for _ in 0..500 {
            assert!((10..=20).contains(&range.sample(&mut rng)));
        }
    }

    #[test]
    fn explicit_gaussian_is_not_reclamped() {
        let mut rng = SmallRng::seed_from_u64(5);
        let range = IntRange::gaussian(0, 10, 100.0, 0.0);
        assert_eq!(range.sample(&mut rng), 100);
    }

    #[test]
    fn weighted_draw_respects_extremes() {
        let mut rng = SmallRng::seed_from_u64(13);
        let range = IntRange::exact(2);
        for _ in 0..200 {
            assert_eq!(range.sample_weighted(0.0, &mut rng), None);
            assert_eq!(range.sample_weighted(1.0, &mut rng), Some(2));
        }
    }

    #[test]
    fn zero_spread_gaussian_returns_mean() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(gaussian_or_exact(&mut rng, 4.6, 0.0), 5);
        let value = gaussian(&mut rng, 15.0, 2.0);
        assert!(value.is_finite());
    }
}
