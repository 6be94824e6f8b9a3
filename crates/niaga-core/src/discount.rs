//! # Discount Specification
//!
//! One rule for every discount in the system: per-line discounts and the
//! document-level "extra discount" both resolve through
//! [`DiscountSpec::resolve`].
//!
//! ## Clamping Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kind = percent  →  value clamped to [0, 100]   (at construction)      │
//! │                     amount = round_half_up(base × value / 100)         │
//! │                                                                         │
//! │  kind = amount   →  value clamped to [0, base]  (at resolution, the    │
//! │                     base is only known then)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! ```json
//! { "kind": "amount",  "value": 5000 }
//! { "kind": "percent", "value": 1000 }   // basis points, 1000 = 10%
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::types::Percent;

/// Whether a discount value is an absolute amount or a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DiscountKind {
    #[default]
    Amount,
    Percent,
}

impl std::str::FromStr for DiscountKind {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amount" | "nominal" | "rp" => Ok(DiscountKind::Amount),
            "percent" | "percentage" | "%" => Ok(DiscountKind::Percent),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "discount_kind".to_string(),
                allowed: vec!["amount".to_string(), "percent".to_string()],
            }),
        }
    }
}

/// A discount attached to a line or to a whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DiscountSpec {
    /// Absolute amount, clamped to `[0, base]` when resolved.
    Amount(Money),
    /// Percentage of the base, already clamped to `[0, 100]`.
    Percent(Percent),
}

impl DiscountSpec {
    /// No discount.
    pub const fn none() -> Self {
        DiscountSpec::Amount(Money::zero())
    }

    /// Absolute discount; a negative value becomes zero.
    pub const fn amount(value: Money) -> Self {
        DiscountSpec::Amount(value.non_negative())
    }

    /// Percentage discount.
    pub const fn percent(value: Percent) -> Self {
        DiscountSpec::Percent(value)
    }

    pub const fn kind(&self) -> DiscountKind {
        match self {
            DiscountSpec::Amount(_) => DiscountKind::Amount,
            DiscountSpec::Percent(_) => DiscountKind::Percent,
        }
    }

    /// True when the discount can never reduce anything.
    pub fn is_none(&self) -> bool {
        match self {
            DiscountSpec::Amount(m) => !m.is_positive(),
            DiscountSpec::Percent(p) => p.is_zero(),
        }
    }

    /// Resolves the discount against `base`.
    ///
    /// The result is always within `[0, max(0, base)]`.
    ///
    /// ## Example
    /// ```rust
    /// use niaga_core::discount::DiscountSpec;
    /// use niaga_core::money::Money;
    /// use niaga_core::types::Percent;
    ///
    /// let base = Money::from_units(100_000);
    /// assert_eq!(DiscountSpec::percent(Percent::whole(10)).resolve(base).units(), 10_000);
    /// assert_eq!(DiscountSpec::amount(Money::from_units(250_000)).resolve(base), base);
    /// ```
    pub fn resolve(&self, base: Money) -> Money {
        let base = base.non_negative();
        match self {
            DiscountSpec::Amount(value) => value.clamp_between(Money::zero(), base),
            DiscountSpec::Percent(pct) => base.mul_ratio_round(pct.bps() as u64, 10_000),
        }
    }
}

impl Default for DiscountSpec {
    fn default() -> Self {
        DiscountSpec::none()
    }
}

impl fmt::Display for DiscountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountSpec::Amount(m) => write!(f, "{}", m),
            DiscountSpec::Percent(p) => write!(f, "{}", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_clamped_to_base() {
        let spec = DiscountSpec::amount(Money::from_units(7_000));
        assert_eq!(spec.resolve(Money::from_units(5_000)).units(), 5_000);
        assert_eq!(spec.resolve(Money::from_units(10_000)).units(), 7_000);
    }

    #[test]
    fn test_negative_amount_becomes_zero() {
        let spec = DiscountSpec::amount(Money::from_units(-300));
        assert!(spec.is_none());
        assert_eq!(spec.resolve(Money::from_units(1_000)), Money::zero());
    }

    #[test]
    fn test_percent_rounds_half_up() {
        // 12.345 × 10% = 1.234,5 → 1.235
        let spec = DiscountSpec::percent(Percent::whole(10));
        assert_eq!(spec.resolve(Money::from_units(12_345)).units(), 1_235);
    }

    #[test]
    fn test_negative_base_resolves_to_zero() {
        let spec = DiscountSpec::percent(Percent::whole(50));
        assert_eq!(spec.resolve(Money::from_units(-1_000)), Money::zero());
    }

    #[test]
    fn test_wire_format() {
        let spec = DiscountSpec::percent(Percent::whole(10));
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"kind":"percent","value":1000}"#);

        let back: DiscountSpec = serde_json::from_str(r#"{"kind":"amount","value":2500}"#).unwrap();
        assert_eq!(back, DiscountSpec::amount(Money::from_units(2_500)));
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("percent".parse::<DiscountKind>().unwrap(), DiscountKind::Percent);
        assert_eq!("Amount".parse::<DiscountKind>().unwrap(), DiscountKind::Amount);
        assert!("bogus".parse::<DiscountKind>().is_err());
    }
}
