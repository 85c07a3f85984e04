//! Fixed-point conversion between caller quantities and integer units.
//!
//! Only the scarce-supply fill runs on integer units. Demands are rounded up
//! and supply is rounded down, so a fill over units never hands out more
//! than the caller's real supply. Totals and the verdict stay on the
//! caller's own values.

/// Largest unit count accepted on input. Keeps every unit count exactly
/// representable as `f64` on the way back out.
pub const MAX_UNITS: u64 = 1 << 53;

/// Largest supported number of decimal places.
pub const MAX_DECIMALS: u32 = 9;

/// Number of decimal places the engine works at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    decimals: u32,
    scale: u64,
}

impl Resolution {
    /// Creates a resolution of `decimals` places.
    ///
    /// # Panics
    ///
    /// Panics if `decimals` exceeds [`MAX_DECIMALS`].
    pub fn new(decimals: u32) -> Self {
        assert!(
            decimals <= MAX_DECIMALS,
            "resolution must be at most {MAX_DECIMALS} decimals"
        );
        Self {
            decimals,
            scale: 10_u64.pow(decimals),
        }
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Size of one unit of least precision.
    pub fn unit(&self) -> f64 {
        1.0 / self.scale as f64
    }

    /// Smallest unit count covering `value`.
    ///
    /// Returns `None` for negative, non-finite, or out-of-range values.
    pub fn ceil_units(&self, value: f64) -> Option<u64> {
        self.scaled(value, f64::ceil)
    }

    /// Largest unit count not exceeding `value`.
    ///
    /// Returns `None` for negative, non-finite, or out-of-range values.
    pub fn floor_units(&self, value: f64) -> Option<u64> {
        self.scaled(value, f64::floor)
    }

    /// Scales `value` to units. A value that sits on a unit boundary up to
    /// float noise maps to that boundary instead of the next unit: `2.007`
    /// scales to `2007.0000000000002` at three decimals and still ceils to
    /// 2007.
    fn scaled(&self, value: f64, round: fn(f64) -> f64) -> Option<u64> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let scaled = value * self.scale as f64;
        let nearest = scaled.round();
        let units = if (scaled - nearest).abs() <= scaled * 4.0 * f64::EPSILON {
            nearest
        } else {
            round(scaled)
        };
        if units > MAX_UNITS as f64 {
            return None;
        }
        Some(units as u64)
    }

    pub fn from_units(&self, units: u64) -> f64 {
        units as f64 / self.scale as f64
    }
}

impl Default for Resolution {
    /// Three decimal places (Wh precision for kWh inputs).
    fn default() -> Self {
        Self::new(3)
    }
}

/// Sum of `values` with Neumaier compensation, so long runs of fractional
/// demands do not drift from their true total.
pub fn compensated_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0_f64;
    let mut carry = 0.0_f64;
    for v in values {
        let t = sum + v;
        if sum.abs() >= v.abs() {
            carry += (sum - t) + v;
        } else {
            carry += (v - t) + sum;
        }
        sum = t;
    }
    sum + carry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_three_decimals() {
        let r = Resolution::default();
        assert_eq!(r.decimals(), 3);
        assert_eq!(r.unit(), 0.001);
    }

    #[test]
    fn demands_round_up_and_supply_rounds_down() {
        let r = Resolution::default();
        assert_eq!(r.ceil_units(1.0004), Some(1_001));
        assert_eq!(r.floor_units(1.0004), Some(1_000));
        assert_eq!(r.ceil_units(0.0006), Some(1));
        assert_eq!(r.floor_units(0.0006), Some(0));
    }

    #[test]
    fn values_on_a_unit_boundary_are_not_bumped() {
        let r = Resolution::default();
        assert_eq!(r.ceil_units(2.007), Some(2_007));
        assert_eq!(r.floor_units(1.001), Some(1_001));
        assert_eq!(r.ceil_units(10.003), Some(10_003));
        assert_eq!(r.floor_units(10.003), Some(10_003));
        assert_eq!(r.ceil_units(33.334), Some(33_334));
        assert_eq!(r.ceil_units(0.0), Some(0));
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        let r = Resolution::default();
        assert_eq!(r.ceil_units(-5.0), None);
        assert_eq!(r.floor_units(-1e-12), None);
        assert_eq!(r.ceil_units(f64::NAN), None);
        assert_eq!(r.floor_units(f64::INFINITY), None);
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(Resolution::default().floor_units(-0.0), Some(0));
    }

    #[test]
    fn rejects_values_beyond_exact_range() {
        let r = Resolution::new(9);
        assert_eq!(r.ceil_units(1.0e8), None);
        assert!(r.ceil_units(1.0e6).is_some());
    }

    #[test]
    fn unit_counts_convert_back_exactly() {
        let r = Resolution::default();
        assert_eq!(r.from_units(33_334), 33.334);
        assert_eq!(r.from_units(50_000), 50.0);
    }

    #[test]
    fn compensated_sum_keeps_small_terms() {
        let values = std::iter::once(1.0e16).chain(std::iter::repeat_n(1.0, 100));
        assert_eq!(compensated_sum(values), 1.0e16 + 100.0);
        assert_eq!(compensated_sum(std::iter::empty()), 0.0);
    }

    #[test]
    #[should_panic]
    fn too_many_decimals_panics() {
        Resolution::new(10);
    }
}
