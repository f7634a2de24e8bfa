//! Saturating numeric conversions shared by the simulation.
//!
//! Game quantities mix `f32` money, `f64` gaussian draws and integer counts;
//! every lossy cast goes through here.
use num_traits::{Bounded, ToPrimitive, cast};

/// Cast a finite `f64` into `T`, saturating at `T`'s bounds. NaN becomes zero.
fn saturate<T>(value: f64) -> T
where
    T: num_traits::NumCast + Bounded + Default,
{
    if value.is_nan() {
        return T::default();
    }
    let lo = T::min_value().to_f64().unwrap_or(f64::MIN);
    let hi = T::max_value().to_f64().unwrap_or(f64::MAX);
    cast(value.clamp(lo, hi)).unwrap_or_default()
}

#[must_use]
pub fn clamp_f64_to_f32(value: f64) -> f32 {
    if value.is_finite() { saturate(value) } else { 0.0 }
}

/// Nearest integer, saturating; NaN yields 0.
#[must_use]
pub fn round_f64_to_i32(value: f64) -> i32 {
    saturate(value.round())
}

#[must_use]
pub fn round_f32_to_i32(value: f32) -> i32 {
    round_f64_to_i32(f64::from(value))
}

/// Negative draws collapse to 0.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    saturate(value.round())
}

/// Used for money comparisons, where any fraction of a dollar counts as a dollar.
#[must_use]
pub fn ceil_f32_to_i32(value: f32) -> i32 {
    if value.is_finite() {
        saturate(f64::from(value).ceil())
    } else {
        0
    }
}

#[must_use]
pub fn usize_to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[must_use]
pub fn u32_to_f32(value: u32) -> f32 {
    value.to_f32().unwrap_or(0.0)
}

#[must_use]
pub fn i32_to_f32(value: i32) -> f32 {
    value.to_f32().unwrap_or(0.0)
}
