//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Whole Units?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RUPIAH HAS NO FRACTIONAL UNIT IN THIS DOMAIN                           │
//! │                                                                         │
//! │  Every amount shown on a quotation, order or invoice is a whole        │
//! │  number of rupiah. Any division (percent discount, PPN) is rounded     │
//! │  half-up back to a whole unit AT THE POINT IT IS COMPUTED:             │
//! │                                                                         │
//! │    50.001 × 10%  = 5.000,1  → 5.000                                    │
//! │    95.000 × 11%  = 10.450   → 10.450                                   │
//! │    33.335 × 10%  = 3.333,5  → 3.334  (half-up, not half-even)          │
//! │                                                                         │
//! │  Per-line rounding means the displayed line values always add up to   │
//! │  the displayed document values.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use niaga_core::money::Money;
//!
//! let price = Money::from_units(50_000);
//! let line = price * 2;
//! assert_eq!(line.units(), 100_000);
//! assert_eq!(line.to_string(), "Rp 100.000");
//! ```

use crate::types::Quantity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units (rupiah).
///
/// ## Design Decisions
/// - **i64 (signed)**: raw form input may be negative; the calculators clamp
///   with [`Money::non_negative`] before using it as a base.
/// - **Single field tuple struct**: zero-cost abstraction over i64.
/// - **Transparent serde**: serializes as a plain JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `max(0, self)`.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(-500).non_negative(), Money::zero());
    /// assert_eq!(Money::from_units(500).non_negative().units(), 500);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// `max(0, self - other)`: a stage of the totals pipeline never hands a
    /// negative base to the next stage.
    #[inline]
    pub fn minus_floor_zero(&self, other: Money) -> Self {
        Money(self.0.saturating_sub(other.0)).non_negative()
    }

    /// Clamps into `[min, max]`.
    #[inline]
    pub fn clamp_between(&self, min: Money, max: Money) -> Self {
        if self.0 < min.0 {
            min
        } else if self.0 > max.0 {
            max
        } else {
            *self
        }
    }

    /// Computes `round_half_up(self × numerator / denominator)`.
    ///
    /// Used for percent discounts (`bps / 10000`) and PPN
    /// (`rate / 100` exclusive, `rate / (100 + rate)` inclusive).
    ///
    /// ## Implementation
    /// Integer math in i128 to avoid overflow on large amounts:
    /// `(amount × num + den / 2) / den` for non-negative operands. Negative
    /// amounts round half away from zero so the function stays symmetric.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::money::Money;
    ///
    /// // 95.000 × 11 / 100 = 10.450
    /// assert_eq!(Money::from_units(95_000).mul_ratio_round(11, 100).units(), 10_450);
    /// // 111.000 × 11 / 111 = 11.000
    /// assert_eq!(Money::from_units(111_000).mul_ratio_round(11, 111).units(), 11_000);
    /// // 5 × 1 / 2 = 2.5 → 3
    /// assert_eq!(Money::from_units(5).mul_ratio_round(1, 2).units(), 3);
    /// ```
    pub fn mul_ratio_round(&self, numerator: u64, denominator: u64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let num = self.0 as i128 * numerator as i128;
        let den = denominator as i128;
        let half = den / 2;
        let rounded = if num >= 0 {
            (num + half) / den
        } else {
            -((-num + half) / den)
        };
        Money(rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies by a (possibly fractional) quantity, rounding the result
    /// half away from zero to whole rupiah.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::money::Money;
    /// use niaga_core::types::Quantity;
    ///
    /// let price = Money::from_units(10_000);
    /// assert_eq!(price.multiply_quantity(Quantity::from_milli(1_500)).units(), 15_000);
    /// // 333 × 0.5 = 166.5 → 167
    /// assert_eq!(Money::from_units(333).multiply_quantity(Quantity::from_milli(500)).units(), 167);
    /// ```
    pub fn multiply_quantity(&self, qty: Quantity) -> Self {
        let product = self.mul_ratio_round(qty.milli().unsigned_abs(), Quantity::SCALE as u64);
        if qty.is_negative() {
            Money(0) - product
        } else {
            product
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Indonesian grouping: `Rp 1.234.567`, `-Rp 5.000`.
///
/// ## Note
/// For logs and the CLI. The UI formats with its own locale settings.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(0).to_string(), "Rp 0");
        assert_eq!(Money::from_units(999).to_string(), "Rp 999");
        assert_eq!(Money::from_units(1_000).to_string(), "Rp 1.000");
        assert_eq!(Money::from_units(1_234_567).to_string(), "Rp 1.234.567");
        assert_eq!(Money::from_units(-5_000).to_string(), "-Rp 5.000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(500);

        assert_eq!((a + b).units(), 1500);
        assert_eq!((a - b).units(), 500);
        assert_eq!((a * 3).units(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.units(), 2000);
    }

    #[test]
    fn test_minus_floor_zero() {
        let a = Money::from_units(1000);
        assert_eq!(a.minus_floor_zero(Money::from_units(400)).units(), 600);
        assert_eq!(a.minus_floor_zero(Money::from_units(4000)), Money::zero());
    }

    #[test]
    fn test_mul_ratio_round_half_up() {
        // 33.335 × 10% = 3.333,5 → 3.334
        assert_eq!(Money::from_units(33_335).mul_ratio_round(1000, 10_000).units(), 3_334);
        // 33.334 × 10% = 3.333,4 → 3.333
        assert_eq!(Money::from_units(33_334).mul_ratio_round(1000, 10_000).units(), 3_333);
        assert_eq!(Money::from_units(-5).mul_ratio_round(1, 2).units(), -3);
    }

    #[test]
    fn test_multiply_fractional_quantity() {
        let price = Money::from_units(10_000);
        assert_eq!(price.multiply_quantity(Quantity::from_milli(1_500)).units(), 15_000);
        assert_eq!(
            Money::from_units(250_000).multiply_quantity(Quantity::from_milli(400)).units(),
            100_000
        );
        assert_eq!(price.multiply_quantity(Quantity::whole(3)).units(), 30_000);
        assert_eq!(price.multiply_quantity(Quantity::from_milli(-500)).units(), -5_000);
    }

    #[test]
    fn test_mul_ratio_zero_denominator() {
        assert_eq!(Money::from_units(1000).mul_ratio_round(5, 0), Money::zero());
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        let big = Money::from_units(i64::MAX / 2);
        // i128 intermediate keeps this exact
        assert_eq!(big.mul_ratio_round(2, 2), big);
        assert_eq!((big * 4).units(), i64::MAX);
    }

    #[test]
    fn test_clamp_between() {
        let max = Money::from_units(100);
        assert_eq!(Money::from_units(150).clamp_between(Money::zero(), max), max);
        assert_eq!(Money::from_units(-1).clamp_between(Money::zero(), max), Money::zero());
        assert_eq!(Money::from_units(42).clamp_between(Money::zero(), max).units(), 42);
    }
}
