//! # Domain Types
//!
//! Small value types shared by every document kind.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │    Percent      │   │  DocumentKind   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  bps (u32)      │   │  Quotation      │       │
//! │  │  1100 = 11%     │   │  0..=10000      │   │  SalesOrder     │       │
//! │  └─────────────────┘   └─────────────────┘   │  Invoice        │       │
//! │                                              │  DeliveryNote   │       │
//! │  ┌─────────────────┐                         └─────────────────┘       │
//! │  │    Quantity     │                                                    │
//! │  │  ─────────────  │                                                    │
//! │  │  milli (i64)    │                                                    │
//! │  │  1500 = 1.5     │                                                    │
//! │  └─────────────────┘                                                    │
//! │  ┌─────────────────┐                                                    │
//! │  │ CatalogProduct  │  seeds a LineItem when a product is picked        │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every stored document has:
//! - `id`: assigned by the store on first save (UUID v4), immutable, used for links
//! - Business key: `document_number` (e.g. `SO/2024/05/0007`), the natural
//!   key used as a fallback when resolving links

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1100 bps = 11% (PPN since April 2022), 1200 bps = 12%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage in basis points, always within `[0, 10000]` (0% to 100%).
///
/// The clamp happens here, at construction, so no caller can hold a
/// percent discount above 100%.
///
/// ## Example
/// ```rust
/// use niaga_core::types::Percent;
///
/// assert_eq!(Percent::whole(10).bps(), 1000);
/// assert_eq!(Percent::whole(150), Percent::FULL);
/// assert_eq!(Percent::from_bps(1250).to_string(), "12.5%");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Percent(u32);

impl From<u32> for Percent {
    fn from(bps: u32) -> Self {
        Percent::from_bps(bps)
    }
}

impl From<Percent> for u32 {
    fn from(p: Percent) -> Self {
        p.0
    }
}

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const FULL: Percent = Percent(10_000);

    /// Creates a percent from basis points, clamped to 100%.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > 10_000 {
            Percent(10_000)
        } else {
            Percent(bps)
        }
    }

    /// Creates a percent from a whole number; negatives become 0%, values
    /// above 100 become 100%.
    #[inline]
    pub const fn whole(pct: i64) -> Self {
        if pct <= 0 {
            Percent(0)
        } else if pct >= 100 {
            Percent(10_000)
        } else {
            Percent(pct as u32 * 100)
        }
    }

    /// Returns the percent in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// A line quantity in thousandths, so `1.5` meters or `0.4` kilograms are
/// carried exactly.
///
/// On the wire a quantity is a plain decimal number; it is rounded half
/// away from zero to three decimals when read.
///
/// ## Example
/// ```rust
/// use niaga_core::types::Quantity;
///
/// assert_eq!(Quantity::whole(3).milli(), 3_000);
/// assert_eq!(Quantity::try_from(1.5).unwrap(), Quantity::from_milli(1_500));
/// assert_eq!(Quantity::from_milli(375).to_string(), "0.375");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quantity(i64);

impl Quantity {
    /// Thousandths per unit.
    pub const SCALE: i64 = 1_000;
    pub const ZERO: Quantity = Quantity(0);

    /// Creates a quantity of whole units.
    #[inline]
    pub const fn whole(units: i64) -> Self {
        Quantity(units.saturating_mul(Self::SCALE))
    }

    /// Creates a quantity from thousandths.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Returns the quantity in thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps a negative quantity to zero.
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Quantity(0)
        } else {
            self
        }
    }

    /// Returns the quantity as a float (for display and the wire only).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

impl TryFrom<f64> for Quantity {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let milli = (value * Self::SCALE as f64).round();
        if !milli.is_finite() || milli.abs() >= i64::MAX as f64 {
            return Err(ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        Ok(Quantity(milli as i64))
    }
}

impl From<Quantity> for f64 {
    fn from(q: Quantity) -> Self {
        q.as_f64()
    }
}

/// `2`, `1.5`, `0.375`, `-0.5`: trailing zeros are dropped.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

// =============================================================================
// Document Kind
// =============================================================================

/// The four sales documents managed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DocumentKind {
    Quotation,
    SalesOrder,
    Invoice,
    DeliveryNote,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Quotation,
        DocumentKind::SalesOrder,
        DocumentKind::Invoice,
        DocumentKind::DeliveryNote,
    ];

    /// Stable lowercase name used in logs, config keys and error payloads.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quotation => "quotation",
            DocumentKind::SalesOrder => "sales_order",
            DocumentKind::Invoice => "invoice",
            DocumentKind::DeliveryNote => "delivery_note",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Catalog Product
// =============================================================================

/// What the product catalog returns when a product is picked on a form.
///
/// Used only to seed a line's defaults; the core never re-validates catalog
/// data afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: crate::money::Money,
    pub unit: String,
    pub description: Option<String>,
}

// =============================================================================
// Send Channel
// =============================================================================

/// How a Sales Order was sent to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SendChannel {
    Email,
    WhatsApp,
    Pdf,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percent() {
        let rate = TaxRate::from_percent(11);
        assert_eq!(rate.bps(), 1100);
        assert!((rate.percentage() - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_percent_clamps_on_construction() {
        assert_eq!(Percent::whole(-5), Percent::ZERO);
        assert_eq!(Percent::whole(101), Percent::FULL);
        assert_eq!(Percent::from_bps(20_000), Percent::FULL);
        assert_eq!(Percent::whole(25).bps(), 2500);
    }

    #[test]
    fn test_percent_deserialize_clamps() {
        let p: Percent = serde_json::from_str("25000").unwrap();
        assert_eq!(p, Percent::FULL);
    }

    #[test]
    fn test_percent_display() {
        assert_eq!(Percent::whole(10).to_string(), "10%");
        assert_eq!(Percent::from_bps(1250).to_string(), "12.5%");
        assert_eq!(Percent::from_bps(1205).to_string(), "12.05%");
    }

    #[test]
    fn test_quantity_reads_decimals() {
        let q: Quantity = serde_json::from_str("1.5").unwrap();
        assert_eq!(q.milli(), 1_500);
        let q: Quantity = serde_json::from_str("0.4").unwrap();
        assert_eq!(q.milli(), 400);
        let q: Quantity = serde_json::from_str("3").unwrap();
        assert_eq!(q, Quantity::whole(3));
        // rounded to thousandths
        assert_eq!(Quantity::try_from(1.0004).unwrap().milli(), 1_000);
        assert_eq!(Quantity::try_from(1.0006).unwrap().milli(), 1_001);
        assert!(Quantity::try_from(f64::INFINITY).is_err());
    }

    #[test]
    fn test_quantity_writes_decimals() {
        assert_eq!(serde_json::to_string(&Quantity::from_milli(1_500)).unwrap(), "1.5");
        assert_eq!(Quantity::whole(2).to_string(), "2");
        assert_eq!(Quantity::from_milli(-500).to_string(), "-0.5");
        assert_eq!(Quantity::from_milli(1_050).to_string(), "1.05");
    }

    #[test]
    fn test_document_kind_wire_names() {
        let json = serde_json::to_string(&DocumentKind::SalesOrder).unwrap();
        assert_eq!(json, "\"sales_order\"");
        assert_eq!(DocumentKind::DeliveryNote.to_string(), "delivery_note");
    }

    #[test]
    fn test_send_channel_wire_names() {
        assert_eq!(serde_json::to_string(&SendChannel::WhatsApp).unwrap(), "\"whatsapp\"");
    }
}
