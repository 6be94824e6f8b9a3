//! # Tax Policy Resolver
//!
//! Maps a [`TaxMode`] to a PPN rate and an inclusive/exclusive rule.
//!
//! ## Inclusive vs Exclusive
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE MOST ERROR-PRONE RULE IN THE SYSTEM                                │
//! │                                                                         │
//! │  EXCLUSIVE (tax on top)           INCLUSIVE (tax already inside)        │
//! │  ──────────────────────           ──────────────────────────────        │
//! │  base       111.000               base       111.000                    │
//! │  tax  = base × 11/100             tax  = base × 11/111                  │
//! │       =  12.210                        =  11.000                        │
//! │  total = base + tax               total = base   (never added!)         │
//! │        = 123.210                        = 111.000                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `none` and `non_pkp` (seller not registered for VAT) both carry rate 0.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::TaxRate;

/// Closed set of tax modes a document can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TaxMode {
    #[default]
    #[serde(rename = "none")]
    None,
    /// Seller is not a VAT-registered entrepreneur (non-PKP): tax exempt.
    #[serde(rename = "non_pkp")]
    NonPkp,
    #[serde(rename = "ppn_11_inclusive")]
    Ppn11Inclusive,
    #[serde(rename = "ppn_11_exclusive")]
    Ppn11Exclusive,
    #[serde(rename = "ppn_12_inclusive")]
    Ppn12Inclusive,
    #[serde(rename = "ppn_12_exclusive")]
    Ppn12Exclusive,
}

/// Rate plus computation rule for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxPolicy {
    pub rate: TaxRate,
    pub inclusive: bool,
}

impl TaxMode {
    pub const ALL: [TaxMode; 6] = [
        TaxMode::None,
        TaxMode::NonPkp,
        TaxMode::Ppn11Inclusive,
        TaxMode::Ppn11Exclusive,
        TaxMode::Ppn12Inclusive,
        TaxMode::Ppn12Exclusive,
    ];

    /// Wire name, identical to the serde representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TaxMode::None => "none",
            TaxMode::NonPkp => "non_pkp",
            TaxMode::Ppn11Inclusive => "ppn_11_inclusive",
            TaxMode::Ppn11Exclusive => "ppn_11_exclusive",
            TaxMode::Ppn12Inclusive => "ppn_12_inclusive",
            TaxMode::Ppn12Exclusive => "ppn_12_exclusive",
        }
    }

    pub const fn policy(&self) -> TaxPolicy {
        match self {
            TaxMode::None | TaxMode::NonPkp => TaxPolicy {
                rate: TaxRate::zero(),
                inclusive: false,
            },
            TaxMode::Ppn11Inclusive => TaxPolicy {
                rate: TaxRate::from_percent(11),
                inclusive: true,
            },
            TaxMode::Ppn11Exclusive => TaxPolicy {
                rate: TaxRate::from_percent(11),
                inclusive: false,
            },
            TaxMode::Ppn12Inclusive => TaxPolicy {
                rate: TaxRate::from_percent(12),
                inclusive: true,
            },
            TaxMode::Ppn12Exclusive => TaxPolicy {
                rate: TaxRate::from_percent(12),
                inclusive: false,
            },
        }
    }

    #[inline]
    pub const fn rate(&self) -> TaxRate {
        self.policy().rate
    }

    #[inline]
    pub const fn is_inclusive(&self) -> bool {
        self.policy().inclusive
    }

    #[inline]
    pub const fn is_taxable(&self) -> bool {
        !self.policy().rate.is_zero()
    }
}

impl fmt::Display for TaxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TaxMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "tax_mode".to_string(),
                allowed: TaxMode::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            })
    }
}

/// Result of applying a tax mode to an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxResolution {
    pub rate: TaxRate,
    pub inclusive: bool,
    pub tax_amount: Money,
    pub total_after_tax: Money,
}

/// Applies `mode` to `amount_base`.
///
/// ## Example
/// ```rust
/// use niaga_core::money::Money;
/// use niaga_core::tax::{resolve_tax, TaxMode};
///
/// let base = Money::from_units(111_000);
///
/// let excl = resolve_tax(TaxMode::Ppn11Exclusive, base);
/// assert_eq!(excl.tax_amount.units(), 12_210);
/// assert_eq!(excl.total_after_tax.units(), 123_210);
///
/// let incl = resolve_tax(TaxMode::Ppn11Inclusive, base);
/// assert_eq!(incl.tax_amount.units(), 11_000);
/// assert_eq!(incl.total_after_tax.units(), 111_000);
/// ```
pub fn resolve_tax(mode: TaxMode, amount_base: Money) -> TaxResolution {
    let TaxPolicy { rate, inclusive } = mode.policy();
    let bps = rate.bps() as u64;

    if rate.is_zero() {
        return TaxResolution {
            rate,
            inclusive,
            tax_amount: Money::zero(),
            total_after_tax: amount_base,
        };
    }

    if inclusive {
        // tax = base × rate / (100 + rate), extracted from the base
        TaxResolution {
            rate,
            inclusive,
            tax_amount: amount_base.mul_ratio_round(bps, 10_000 + bps),
            total_after_tax: amount_base,
        }
    } else {
        let tax_amount = amount_base.mul_ratio_round(bps, 10_000);
        TaxResolution {
            rate,
            inclusive,
            tax_amount,
            total_after_tax: amount_base + tax_amount,
        }
    }
}
