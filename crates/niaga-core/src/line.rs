//! # Line Item Calculator
//!
//! Computes one row's gross amount, discount and net.
//!
//! ```text
//! base           = max(0, quantity) × max(0, unit_price)   (rounded half up)
//! discountAmount = discount.resolve(base)        (rounded here, per line)
//! net            = base − discountAmount          (≥ 0 by construction)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::DiscountSpec;
use crate::money::Money;
use crate::types::{CatalogProduct, Quantity};

/// The three amounts shown on a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineAmounts {
    pub base: Money,
    pub discount_amount: Money,
    pub net: Money,
}

/// Computes a single line.
///
/// Never fails: negative quantity or price count as zero. Fractional
/// quantities are exact; only the resulting base is rounded to rupiah.
///
/// ## Example
/// ```rust
/// use niaga_core::discount::DiscountSpec;
/// use niaga_core::line::compute_line;
/// use niaga_core::money::Money;
/// use niaga_core::types::{Percent, Quantity};
///
/// let amounts = compute_line(Quantity::whole(3), Money::from_units(12_500), &DiscountSpec::percent(Percent::whole(10)));
/// assert_eq!(amounts.base.units(), 37_500);
/// assert_eq!(amounts.discount_amount.units(), 3_750);
/// assert_eq!(amounts.net.units(), 33_750);
/// ```
pub fn compute_line(quantity: Quantity, unit_price: Money, discount: &DiscountSpec) -> LineAmounts {
    let base = unit_price.non_negative().multiply_quantity(quantity.non_negative());
    let discount_amount = discount.resolve(base);
    LineAmounts {
        base,
        discount_amount,
        net: base - discount_amount,
    }
}

/// One sellable row on a quotation, order or invoice.
///
/// Owned by its document. `quantity` and `unit_price` are signed so a row
/// being edited can hold what the user typed; the calculator treats
/// negatives as zero and submit validation rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product reference, if the row was picked from the catalog.
    pub product_id: Option<String>,
    pub description: String,
    pub quantity: Quantity,
    pub unit: String,
    pub unit_price: Money,
    #[serde(default)]
    pub discount: DiscountSpec,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: Quantity, unit: impl Into<String>, unit_price: Money) -> Self {
        LineItem {
            product_id: None,
            description: description.into(),
            quantity,
            unit: unit.into(),
            unit_price,
            discount: DiscountSpec::none(),
        }
    }

    /// Seeds a row from a catalog pick: reference, description (falls back
    /// to the product name), unit and current price. No discount.
    pub fn from_catalog(product: &CatalogProduct, quantity: Quantity) -> Self {
        let description = product
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(product.name.as_str())
            .to_string();

        LineItem {
            product_id: Some(product.id.clone()),
            description,
            quantity,
            unit: product.unit.clone(),
            unit_price: product.unit_price,
            discount: DiscountSpec::none(),
        }
    }

    pub fn with_discount(mut self, discount: DiscountSpec) -> Self {
        self.discount = discount;
        self
    }

    pub fn amounts(&self) -> LineAmounts {
        compute_line(self.quantity, self.unit_price, &self.discount)
    }

    /// The copy carried into a downstream document: product, description,
    /// quantity, unit and price. Discounts are order-specific and reset.
    pub fn linked_copy(&self) -> Self {
        LineItem {
            discount: DiscountSpec::none(),
            ..self.clone()
        }
    }
}
