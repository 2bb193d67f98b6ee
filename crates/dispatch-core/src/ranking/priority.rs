use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Decimal places kept when a ranking value becomes a [`Priority`].
pub const DEFAULT_PRIORITY_DECIMALS: u32 = 2;

/// Largest supported precision. Ten to this power still leaves headroom in an `i64`
/// for order totals in the trillions.
pub const MAX_PRIORITY_DECIMALS: u32 = 6;

/// A ranking key rounded to a fixed number of decimal places.
///
/// Stored as an integer count of minor units so comparisons are exact: two orders whose
/// totals round to the same value are a genuine tie, never a floating-point coin flip.
/// Priorities are only ever compared within one queue, which uses a single precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority {
    units: i64,
    decimals: u32,
}

impl Priority {
    /// Rounds `value` to `decimals` places.
    ///
    /// Returns `None` when `value` is negative or not finite; callers decide how to
    /// treat such input. Values past the `i64` range saturate.
    pub fn from_value(value: f64, decimals: u32) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let decimals = decimals.min(MAX_PRIORITY_DECIMALS);
        let scale = 10f64.powi(decimals as i32);
        // `as` saturates on overflow
        let units = (value * scale).round() as i64;
        Some(Self { units, decimals })
    }

    pub fn zero(decimals: u32) -> Self {
        Self {
            units: 0,
            decimals: decimals.min(MAX_PRIORITY_DECIMALS),
        }
    }

    /// The raw minor-unit count.
    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// The rounded ranking value.
    pub fn as_f64(&self) -> f64 {
        self.units as f64 / 10f64.powi(self.decimals as i32)
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.*}", self.decimals as usize, self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_collapses_float_noise_into_ties() {
        let a = Priority::from_value(0.1 + 0.2, 2).unwrap();
        let b = Priority::from_value(0.3, 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.units(), 30);
        assert_eq!(a.to_string(), "0.30");
    }

    #[test]
    fn test_rejects_negative_and_non_finite_values() {
        assert!(Priority::from_value(-1.0, 2).is_none());
        assert!(Priority::from_value(f64::NAN, 2).is_none());
        assert!(Priority::from_value(f64::INFINITY, 2).is_none());
    }

    #[test]
    fn test_orders_by_value() {
        let low = Priority::from_value(50_000.0, 2).unwrap();
        let high = Priority::from_value(120_000.0, 2).unwrap();
        assert!(high > low);
        assert_eq!(high.as_f64(), 120_000.0);
    }
}
