//! # Validation Module
//!
//! Submit-time business rule validation for sales documents.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Normalization boundary (niaga-engine::normalize)             │
//! │  ├── "50000" / 50000 / null → Money                                    │
//! │  └── percent > 100 rejected before clamping                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (on submit)                                      │
//! │  ├── customer required, at least one line                              │
//! │  └── no negative quantity / price / shipping / down payment            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Calculators                                                  │
//! │  └── never fail; clamp whatever they are given                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use niaga_core::types::Quantity;
//! use niaga_core::validation::{validate_customer_id, validate_quantity};
//!
//! validate_customer_id("cust-1").unwrap();
//! assert!(validate_quantity("lines[0].quantity", Quantity::from_milli(-500)).is_err());
//! ```

use crate::discount::DiscountSpec;
use crate::document::{CommercialDocument, DeliveryNote};
use crate::error::{ValidationError, ValidationResult};
use crate::line::LineItem;
use crate::money::Money;
use crate::status::StatusMachine;
use crate::types::Quantity;
use crate::{MAX_DESCRIPTION_LEN, MAX_DOCUMENT_LINES};

// =============================================================================
// String Validators
// =============================================================================

/// Validates the customer reference.
///
/// ## Rules
/// - Must not be empty or whitespace
pub fn validate_customer_id(customer_id: &str) -> ValidationResult<()> {
    if customer_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer_id".to_string(),
        });
    }
    Ok(())
}

/// Validates a line description.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_DESCRIPTION_LEN`] characters
pub fn validate_description(field: &str, description: &str) -> ValidationResult<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

/// Validates an issued document number such as `SO/2024/05/0007`.
///
/// ## Rules
/// - Must not be empty
/// - Printable ASCII without whitespace
pub fn validate_document_number(number: &str) -> ValidationResult<()> {
    if number.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "document_number".to_string(),
        });
    }

    if !number.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ValidationError::InvalidFormat {
            field: "document_number".to_string(),
            reason: "must contain only printable characters without spaces".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must not be negative (zero is allowed while a row is being edited)
pub fn validate_quantity(field: &str, qty: Quantity) -> ValidationResult<()> {
    if qty.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an amount that must not be negative (price, shipping, DP).
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a raw percent as typed by the user, before it is clamped.
///
/// ## Example
/// ```rust
/// use niaga_core::validation::validate_percent_input;
///
/// assert!(validate_percent_input("discount", 12.5).is_ok());
/// assert!(validate_percent_input("discount", 120.0).is_err());
/// ```
pub fn validate_percent_input(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a number".to_string(),
        });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Document Validators
// =============================================================================

/// Validates one line. `index` only names the field.
pub fn validate_line(index: usize, line: &LineItem) -> ValidationResult<()> {
    let field = |name: &str| format!("lines[{}].{}", index, name);

    validate_description(&field("description"), &line.description)?;
    validate_quantity(&field("quantity"), line.quantity)?;
    validate_non_negative(&field("unit_price"), line.unit_price)?;
    if let DiscountSpec::Amount(amount) = line.discount {
        validate_non_negative(&field("discount"), amount)?;
    }
    Ok(())
}

/// Validates the line collection.
///
/// ## Rules
/// - At least one line
/// - At most [`MAX_DOCUMENT_LINES`]
/// - Every line valid
pub fn validate_lines(lines: &[LineItem]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "lines".to_string(),
        });
    }

    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_DOCUMENT_LINES as i64,
        });
    }

    lines
        .iter()
        .enumerate()
        .try_for_each(|(i, line)| validate_line(i, line))
}

/// Everything checked before a Quotation, Sales Order or Invoice is
/// submitted. Stops at the first offending field.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Form: Save                                                             │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_for_submit(doc) ← THIS FUNCTION                              │
/// │       │                                                                 │
/// │       ├── bad number?      → a typed-in number with spaces, rejected   │
/// │       ├── no customer?     → highlight customer, nothing submitted     │
/// │       ├── no lines?        → "add at least one item"                   │
/// │       ├── negative value?  → highlight that cell                       │
/// │       │                                                                 │
/// │       └── OK → persist                                                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_for_submit<S: StatusMachine>(doc: &CommercialDocument<S>) -> ValidationResult<()> {
    if let Some(number) = doc.document_number.as_deref() {
        validate_document_number(number)?;
    }
    validate_customer_id(&doc.customer_id)?;
    validate_lines(&doc.lines)?;
    if let DiscountSpec::Amount(amount) = doc.extra_discount {
        validate_non_negative("extra_discount", amount)?;
    }
    validate_non_negative("shipping_cost", doc.shipping_cost)?;
    validate_non_negative("down_payment", doc.down_payment)?;
    Ok(())
}

/// Delivery notes carry no prices: items must be named with a
/// non-negative quantity.
pub fn validate_delivery_for_submit(note: &DeliveryNote) -> ValidationResult<()> {
    if note.items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    for (i, item) in note.items.iter().enumerate() {
        validate_description(&format!("items[{}].name", i), &item.name)?;
        validate_quantity(&format!("items[{}].qty", i), item.qty)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
