//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::error::EconomyError;

/// Slack absorbed before rounding coins up, so `100.0 * 1.1` prices at 110.
const COIN_ROUNDING_SLACK: f64 = 1e-9;

/// Ceil a f64 coin amount and clamp it to the u64 range, returning 0 for
/// non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_coins(value: f64) -> u64 {
    if !value.is_finite() {
        return 0;
    }
    let adjusted = value - COIN_ROUNDING_SLACK;
    if adjusted <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(adjusted.min(max).ceil()).unwrap_or(u64::MAX)
}

/// Convert a coin amount to f64 while allowing precision loss in a single location.
#[must_use]
pub fn coins_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Convert a counter to f64 for use in pricing curves.
#[must_use]
pub fn count_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Accept only finite, non-negative amounts for resource mutators.
///
/// # Errors
///
/// Returns [`EconomyError::InvalidAmount`] for negative, NaN, or infinite input.
pub fn non_negative(field: &'static str, value: f64) -> Result<f64, EconomyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(EconomyError::InvalidAmount { field, value })
    }
}
