//! # Document Totals Aggregator
//!
//! Folds line items plus document-level adjustments into a [`TotalsBreakdown`].
//!
//! ## Pipeline (order is load-bearing)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► Σ base ─────────────► subtotal                               │
//! │        └─► Σ discountAmount ───► lineDiscountTotal                      │
//! │                                                                         │
//! │  afterLineDiscount  = max(0, subtotal − lineDiscountTotal)              │
//! │  extraDiscount      = extra.resolve(afterLineDiscount)                  │
//! │  afterExtraDiscount = max(0, afterLineDiscount − extraDiscount)         │
//! │  basePlusShipping   = afterExtraDiscount + max(0, shipping)             │
//! │  tax                = resolve_tax(mode, basePlusShipping)               │
//! │  grandTotal         = max(0, totalAfterTax − max(0, downPayment))       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage is clamped before it becomes the next stage's base, so a
//! negative value can never cascade. The breakdown is derived data: it is
//! recomputed on every input change and on every load, never stored.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::DiscountSpec;
use crate::line::{LineAmounts, LineItem};
use crate::money::Money;
use crate::tax::{resolve_tax, TaxMode};
use crate::types::TaxRate;

/// Everything the summary panel renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TotalsBreakdown {
    pub subtotal: Money,
    pub line_discount_total: Money,
    pub after_line_discount: Money,
    pub extra_discount_amount: Money,
    pub after_extra_discount: Money,
    pub shipping_cost: Money,
    pub base_plus_shipping: Money,
    pub tax_mode: TaxMode,
    pub tax_rate: TaxRate,
    pub tax_inclusive: bool,
    pub tax_amount: Money,
    pub total_before_down_payment: Money,
    pub down_payment: Money,
    pub grand_total: Money,
    /// Per-row amounts, in line order.
    pub line_amounts: Vec<LineAmounts>,
}

/// Computes the full breakdown for a document.
///
/// Pure and deterministic: identical inputs give identical output.
///
/// ## Example
/// ```rust
/// use niaga_core::discount::DiscountSpec;
/// use niaga_core::line::LineItem;
/// use niaga_core::money::Money;
/// use niaga_core::tax::TaxMode;
/// use niaga_core::totals::compute_totals;
/// use niaga_core::types::{Percent, Quantity};
///
/// let lines = vec![LineItem::new("Meja", Quantity::whole(2), "unit", Money::from_units(50_000))];
/// let t = compute_totals(
///     &lines,
///     &DiscountSpec::percent(Percent::whole(10)),
///     Money::from_units(5_000),
///     TaxMode::Ppn11Exclusive,
///     Money::zero(),
/// );
/// assert_eq!(t.after_extra_discount.units(), 90_000);
/// assert_eq!(t.tax_amount.units(), 10_450);
/// assert_eq!(t.grand_total.units(), 105_450);
/// ```
pub fn compute_totals(
    lines: &[LineItem],
    extra_discount: &DiscountSpec,
    shipping_cost: Money,
    tax_mode: TaxMode,
    down_payment: Money,
) -> TotalsBreakdown {
    let line_amounts: Vec<LineAmounts> = lines.iter().map(LineItem::amounts).collect();

    let subtotal: Money = line_amounts.iter().map(|a| a.base).sum();
    let line_discount_total: Money = line_amounts.iter().map(|a| a.discount_amount).sum();
    let after_line_discount = subtotal.minus_floor_zero(line_discount_total);

    let extra_discount_amount = extra_discount.resolve(after_line_discount);
    let after_extra_discount = after_line_discount.minus_floor_zero(extra_discount_amount);

    let shipping_cost = shipping_cost.non_negative();
    let base_plus_shipping = after_extra_discount + shipping_cost;

    let tax = resolve_tax(tax_mode, base_plus_shipping);

    let down_payment = down_payment.non_negative();
    let grand_total = tax.total_after_tax.minus_floor_zero(down_payment);

    TotalsBreakdown {
        subtotal,
        line_discount_total,
        after_line_discount,
        extra_discount_amount,
        after_extra_discount,
        shipping_cost,
        base_plus_shipping,
        tax_mode,
        tax_rate: tax.rate,
        tax_inclusive: tax.inclusive,
        tax_amount: tax.tax_amount,
        total_before_down_payment: tax.total_after_tax,
        down_payment,
        grand_total,
        line_amounts,
    }
}
