//! # Normalization Boundary
//!
//! The only place that coerces loosely-typed API payloads into the strict
//! core model. The core never performs defensive coercion itself.
//!
//! ## Coercion Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  payload value        → number      valid?                              │
//! │  ─────────────────────────────────────────────                          │
//! │  50000                → 50000       yes                                 │
//! │  "50000", " 1.5 "     → 50000, 1.5  yes                                 │
//! │  null / missing       → 0           yes                                 │
//! │  "abc", true, [..]    → 0           NO  (validate rejects)              │
//! │                                                                         │
//! │  Money is rounded half away from zero to whole rupiah; quantities     │
//! │  keep three decimals (1.5 stays 1.5).                                  │
//! │  Percent values become basis points (12.5 → 1250).                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names are accepted in both `snake_case` and the `camelCase` the
//! REST layer uses.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use niaga_core::validation::validate_percent_input;
use niaga_core::{
    compute_totals, CatalogProduct, CommercialDocument, DiscountKind, DiscountSpec, LineItem, Money, Percent,
    Quantity, QuotationSnapshot, StatusMachine, TaxMode, TotalsBreakdown, ValidationError, ValidationResult,
};

// =============================================================================
// Lenient Scalars
// =============================================================================

/// A number that may arrive as a number, a numeric string, null, or junk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LenientNumber {
    value: f64,
    valid: bool,
}

/// A missing field counts as a valid zero.
impl Default for LenientNumber {
    fn default() -> Self {
        LenientNumber::new(0.0)
    }
}

impl LenientNumber {
    pub fn new(value: f64) -> Self {
        LenientNumber { value, valid: true }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// False when the payload held something that is not a number.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    fn from_value(value: &Value) -> Self {
        let parsed = match value {
            Value::Null => Some(0.0),
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.trim().is_empty() => Some(0.0),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed.filter(|v| v.is_finite()) {
            Some(v) => LenientNumber { value: v, valid: true },
            None => LenientNumber { value: 0.0, valid: false },
        }
    }

    /// Whole units, rounded half away from zero.
    pub fn whole(&self) -> i64 {
        self.value.round() as i64
    }

    pub fn money(&self) -> Money {
        Money::from_units(self.whole())
    }

    /// Thousandths of a unit, rounded half away from zero.
    pub fn quantity(&self) -> Quantity {
        Quantity::try_from(self.value).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for LenientNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(LenientNumber::from_value(&raw))
    }
}

/// Ids and references arrive as strings or numbers; blanks become `None`.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn percent_from(value: f64) -> Percent {
    if value <= 0.0 {
        Percent::ZERO
    } else {
        Percent::from_bps((value * 100.0).round().min(u32::MAX as f64) as u32)
    }
}

fn discount_from(kind: Option<&str>, value: LenientNumber) -> DiscountSpec {
    let kind = kind.and_then(|k| k.parse::<DiscountKind>().ok()).unwrap_or_default();
    match kind {
        DiscountKind::Amount => DiscountSpec::amount(value.money()),
        DiscountKind::Percent => DiscountSpec::percent(percent_from(value.value())),
    }
}

/// Rejects junk and negatives in a raw number.
fn check_number(field: String, number: LenientNumber) -> ValidationResult<()> {
    if !number.is_valid() {
        return Err(ValidationError::InvalidFormat {
            field,
            reason: "must be a number".to_string(),
        });
    }
    if number.value() < 0.0 {
        return Err(ValidationError::MustNotBeNegative { field });
    }
    Ok(())
}

/// Rejects an unknown discount kind and a percent above 100.
fn check_discount(
    value_field: String,
    kind_field: String,
    kind: Option<&str>,
    value: LenientNumber,
) -> ValidationResult<()> {
    let kind = match kind {
        Some(k) => k.parse::<DiscountKind>().map_err(|_| ValidationError::NotAllowed {
            field: kind_field,
            allowed: vec!["amount".to_string(), "percent".to_string()],
        })?,
        None => DiscountKind::Amount,
    };
    if kind == DiscountKind::Percent {
        validate_percent_input(&value_field, value.value())?;
    }
    Ok(())
}

fn parse_tax_mode(raw: Option<&str>, fallback: TaxMode) -> ValidationResult<TaxMode> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse(),
        None => Ok(fallback),
    }
}

// =============================================================================
// Catalog Product
// =============================================================================

/// A product as the catalog endpoint returns it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogProductInput {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub sku: Option<String>,
    #[serde(alias = "unitPrice", alias = "price")]
    pub unit_price: LenientNumber,
    #[serde(deserialize_with = "lenient_string")]
    pub unit: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

impl CatalogProductInput {
    pub fn into_product(self) -> ValidationResult<CatalogProduct> {
        let id = self.id.ok_or_else(|| ValidationError::Required {
            field: "product.id".to_string(),
        })?;
        Ok(CatalogProduct {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            sku: self.sku,
            unit_price: self.unit_price.money().non_negative(),
            unit: self.unit.unwrap_or_else(|| "pcs".to_string()),
            description: self.description,
        })
    }
}

// =============================================================================
// Line Input
// =============================================================================

/// One row as typed into a form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LineInput {
    #[serde(alias = "productId", deserialize_with = "lenient_string")]
    pub product_id: Option<String>,
    #[serde(alias = "name", deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(alias = "qty")]
    pub quantity: LenientNumber,
    #[serde(deserialize_with = "lenient_string")]
    pub unit: Option<String>,
    #[serde(alias = "unitPrice", alias = "price")]
    pub unit_price: LenientNumber,
    pub discount: LenientNumber,
    #[serde(alias = "discountKind", alias = "discountType", deserialize_with = "lenient_string")]
    pub discount_kind: Option<String>,
}

impl LineInput {
    /// Rejects raw input before any clamping: junk numbers, negatives,
    /// and percent discounts above 100.
    pub fn validate(&self, index: usize) -> ValidationResult<()> {
        let field = |name: &str| format!("lines[{}].{}", index, name);

        for (name, number) in [
            ("quantity", self.quantity),
            ("unit_price", self.unit_price),
            ("discount", self.discount),
        ] {
            check_number(field(name), number)?;
        }
        check_discount(
            field("discount"),
            field("discount_kind"),
            self.discount_kind.as_deref(),
            self.discount,
        )
    }

    /// Builds the strict line. Never fails; junk becomes zero.
    pub fn into_line(self) -> LineItem {
        LineItem {
            product_id: self.product_id,
            description: self.description.unwrap_or_default(),
            quantity: self.quantity.quantity(),
            unit: self.unit.unwrap_or_default(),
            unit_price: self.unit_price.money(),
            discount: discount_from(self.discount_kind.as_deref(), self.discount),
        }
    }
}

// =============================================================================
// Quotation Snapshot
// =============================================================================

/// A quotation as the fetch endpoint returns it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuotationSnapshotInput {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(
        alias = "quotationNumber",
        alias = "number",
        alias = "documentNumber",
        deserialize_with = "lenient_string"
    )]
    pub quotation_number: Option<String>,
    #[serde(alias = "customerId", alias = "customer", deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    #[serde(alias = "items")]
    pub lines: Vec<LineInput>,
}

impl QuotationSnapshotInput {
    pub fn into_snapshot(self) -> QuotationSnapshot {
        QuotationSnapshot {
            id: self.id,
            quotation_number: self.quotation_number,
            customer_id: self.customer_id.unwrap_or_default(),
            lines: self.lines.into_iter().map(LineInput::into_line).collect(),
        }
    }
}

// =============================================================================
// Document Input
// =============================================================================

/// A whole Quotation / Sales Order / Invoice form payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentInput {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(alias = "documentNumber", alias = "number", deserialize_with = "lenient_string")]
    pub document_number: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(alias = "customerId", alias = "customer", deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(alias = "items")]
    pub lines: Vec<LineInput>,
    #[serde(alias = "extraDiscount")]
    pub extra_discount: LenientNumber,
    #[serde(alias = "extraDiscountKind", alias = "extraDiscountType", deserialize_with = "lenient_string")]
    pub extra_discount_kind: Option<String>,
    #[serde(alias = "shippingCost", alias = "shipping")]
    pub shipping_cost: LenientNumber,
    #[serde(alias = "taxMode", deserialize_with = "lenient_string")]
    pub tax_mode: Option<String>,
    #[serde(alias = "downPayment", alias = "dp")]
    pub down_payment: LenientNumber,
    #[serde(alias = "linkedQuotationId", alias = "quotationId", deserialize_with = "lenient_string")]
    pub linked_quotation_id: Option<String>,
    #[serde(alias = "linkedQuotationNumber", alias = "quotationNumber", deserialize_with = "lenient_string")]
    pub linked_quotation_number: Option<String>,
    #[serde(alias = "linkedOrderId", alias = "orderId", deserialize_with = "lenient_string")]
    pub linked_order_id: Option<String>,
    #[serde(alias = "linkedOrderNumber", alias = "orderNumber", deserialize_with = "lenient_string")]
    pub linked_order_number: Option<String>,
    pub version: LenientNumber,
}

impl DocumentInput {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks every line's raw input.
    pub fn validate_lines(&self) -> ValidationResult<()> {
        self.lines.iter().enumerate().try_for_each(|(i, line)| line.validate(i))
    }

    /// Checks the whole raw payload before anything is clamped: every line,
    /// then the document-level discount, shipping and down payment.
    pub fn validate(&self) -> ValidationResult<()> {
        self.validate_lines()?;
        check_number("extra_discount".to_string(), self.extra_discount)?;
        check_discount(
            "extra_discount".to_string(),
            "extra_discount_kind".to_string(),
            self.extra_discount_kind.as_deref(),
            self.extra_discount,
        )?;
        check_number("shipping_cost".to_string(), self.shipping_cost)?;
        check_number("down_payment".to_string(), self.down_payment)?;
        Ok(())
    }

    fn extra_discount_spec(&self) -> DiscountSpec {
        discount_from(self.extra_discount_kind.as_deref(), self.extra_discount)
    }

    /// Totals straight from the payload, without building a document.
    pub fn totals(&self, default_tax_mode: TaxMode) -> ValidationResult<TotalsBreakdown> {
        let lines: Vec<LineItem> = self.lines.iter().cloned().map(LineInput::into_line).collect();
        Ok(compute_totals(
            &lines,
            &self.extra_discount_spec(),
            self.shipping_cost.money(),
            parse_tax_mode(self.tax_mode.as_deref(), default_tax_mode)?,
            self.down_payment.money(),
        ))
    }

    /// Builds a strict document.
    ///
    /// `fallback_date` is used when the payload has no date; an unparsable
    /// date, status or tax mode is a validation error.
    pub fn into_document<S: StatusMachine>(
        self,
        fallback_date: NaiveDate,
        default_tax_mode: TaxMode,
    ) -> ValidationResult<CommercialDocument<S>> {
        let date = match self.date.as_deref() {
            // accepts "2024-05-14" and "2024-05-14T09:30:00Z"
            Some(raw) => NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").map_err(|_| {
                ValidationError::InvalidFormat {
                    field: "date".to_string(),
                    reason: "expected YYYY-MM-DD".to_string(),
                }
            })?,
            None => fallback_date,
        };

        let status = match self.status.as_deref() {
            Some(raw) => S::parse(raw).map_err(|_| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: S::all().iter().map(|s| s.name().to_string()).collect(),
            })?,
            None => S::initial(),
        };

        let tax_mode = parse_tax_mode(self.tax_mode.as_deref(), default_tax_mode)?;
        let extra_discount = self.extra_discount_spec();

        Ok(CommercialDocument {
            id: self.id,
            document_number: self.document_number,
            date,
            customer_id: self.customer_id.unwrap_or_default(),
            status,
            lines: self.lines.into_iter().map(LineInput::into_line).collect(),
            extra_discount,
            shipping_cost: self.shipping_cost.money(),
            tax_mode,
            down_payment: self.down_payment.money(),
            linked_quotation_id: self.linked_quotation_id,
            linked_quotation_number: self.linked_quotation_number,
            linked_order_id: self.linked_order_id,
            linked_order_number: self.linked_order_number,
            version: self.version.whole().max(0) as u64,
        })
    }
}
