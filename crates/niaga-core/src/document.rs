//! # Commercial Documents
//!
//! The shape shared by Quotation, Sales Order and Invoice, plus the
//! Delivery Note.
//!
//! ## Stored vs Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  STORED (raw inputs)                 DERIVED (never stored)            │
//! │  ─────────────────────────────       ──────────────────────────────    │
//! │  lines, extra_discount,              TotalsBreakdown                   │
//! │  shipping_cost, tax_mode,            (recomputed on every load so a    │
//! │  down_payment                         corrected rule applies to old    │
//! │                                       documents too)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! `id` and `document_number` are `None` until the first save; the number
//! is issued by the server and treated as opaque. `version` is bumped by the
//! repository on every successful update (optimistic concurrency).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::DiscountSpec;
use crate::error::{CoreError, CoreResult, IllegalTransitionError, ValidationError};
use crate::line::LineItem;
use crate::money::Money;
use crate::status::{
    cancel_delivery, delivery_transition, receive_with_proof, request_transition, transition, DeliveryStatus,
    InvoiceStatus, QuotationStatus, SalesOrderStatus, StatusMachine, TransitionOutcome, TransitionResult,
};
use crate::tax::TaxMode;
use crate::totals::{compute_totals, TotalsBreakdown};
use crate::types::{DocumentKind, Quantity};

// =============================================================================
// Commercial Document
// =============================================================================

/// A priced sales document. `S` is its status machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommercialDocument<S> {
    pub id: Option<String>,
    pub document_number: Option<String>,
    pub date: NaiveDate,
    pub customer_id: String,
    pub status: S,
    pub lines: Vec<LineItem>,
    #[serde(default)]
    pub extra_discount: DiscountSpec,
    #[serde(default)]
    pub shipping_cost: Money,
    #[serde(default)]
    pub tax_mode: TaxMode,
    #[serde(default)]
    pub down_payment: Money,
    #[serde(default)]
    pub linked_quotation_id: Option<String>,
    #[serde(default)]
    pub linked_quotation_number: Option<String>,
    #[serde(default)]
    pub linked_order_id: Option<String>,
    #[serde(default)]
    pub linked_order_number: Option<String>,
    #[serde(default)]
    pub version: u64,
}

pub type Quotation = CommercialDocument<QuotationStatus>;
pub type SalesOrder = CommercialDocument<SalesOrderStatus>;
pub type Invoice = CommercialDocument<InvoiceStatus>;

impl<S: StatusMachine> CommercialDocument<S> {
    /// An unsaved draft with neutral adjustments.
    pub fn new(date: NaiveDate, customer_id: impl Into<String>) -> Self {
        CommercialDocument {
            id: None,
            document_number: None,
            date,
            customer_id: customer_id.into(),
            status: S::initial(),
            lines: Vec::new(),
            extra_discount: DiscountSpec::none(),
            shipping_cost: Money::zero(),
            tax_mode: TaxMode::None,
            down_payment: Money::zero(),
            linked_quotation_id: None,
            linked_quotation_number: None,
            linked_order_id: None,
            linked_order_number: None,
            version: 0,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        S::KIND
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// Number if issued, otherwise the id, otherwise `"(unsaved)"`.
    pub fn label(&self) -> String {
        self.document_number
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| "(unsaved)".to_string())
    }

    pub fn totals(&self) -> TotalsBreakdown {
        compute_totals(
            &self.lines,
            &self.extra_discount,
            self.shipping_cost,
            self.tax_mode,
            self.down_payment,
        )
    }

    pub fn linked_refs(&self) -> LinkedDocumentRefs {
        LinkedDocumentRefs {
            quotation_id: self.linked_quotation_id.clone(),
            quotation_number: self.linked_quotation_number.clone(),
            order_id: self.linked_order_id.clone(),
            order_number: self.linked_order_number.clone(),
        }
    }

    /// Detaches the quotation link. Copied lines are untouched.
    pub fn unlink_quotation(&mut self) {
        self.linked_quotation_id = None;
        self.linked_quotation_number = None;
    }

    /// Detaches the order link. Copied lines are untouched.
    pub fn unlink_order(&mut self) {
        self.linked_order_id = None;
        self.linked_order_number = None;
    }

    /// Applies a user-requested status change by name.
    pub fn request_status(&mut self, target: &str) -> Result<TransitionResult<S>, IllegalTransitionError> {
        let result = request_transition(self.status, target)?;
        self.status = result.new_status;
        Ok(result)
    }

    /// Applies a user-requested status change.
    pub fn set_status(&mut self, target: S) -> Result<TransitionResult<S>, IllegalTransitionError> {
        let result = transition(self.status, target)?;
        self.status = result.new_status;
        Ok(result)
    }

    /// "Reload and retry" after a concurrency conflict.
    ///
    /// Keeps this copy's unsaved edits (customer, date, lines and
    /// adjustments) and adopts the stored document's identity, number,
    /// status, links and version.
    pub fn rebase_onto(self, latest: &Self) -> Self {
        CommercialDocument {
            id: latest.id.clone(),
            document_number: latest.document_number.clone(),
            status: latest.status,
            linked_quotation_id: latest.linked_quotation_id.clone(),
            linked_quotation_number: latest.linked_quotation_number.clone(),
            linked_order_id: latest.linked_order_id.clone(),
            linked_order_number: latest.linked_order_number.clone(),
            version: latest.version,
            ..self
        }
    }
}

// =============================================================================
// Linked Document Refs
// =============================================================================

/// Read-only badges shown on a document that was created from another one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LinkedDocumentRefs {
    pub quotation_id: Option<String>,
    pub quotation_number: Option<String>,
    pub order_id: Option<String>,
    pub order_number: Option<String>,
}

impl LinkedDocumentRefs {
    pub fn is_empty(&self) -> bool {
        self.quotation_id.is_none()
            && self.quotation_number.is_none()
            && self.order_id.is_none()
            && self.order_number.is_none()
    }

    pub fn has_quotation(&self) -> bool {
        self.quotation_id.is_some() || self.quotation_number.is_some()
    }

    pub fn has_order(&self) -> bool {
        self.order_id.is_some() || self.order_number.is_some()
    }
}

// =============================================================================
// Delivery Note
// =============================================================================

/// One row on a delivery note (what goes on the truck, no prices).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryItem {
    pub name: String,
    #[ts(type = "number")]
    pub qty: Quantity,
    pub unit: String,
}

/// Surat jalan. References its Invoice by number, not by foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub id: Option<String>,
    pub delivery_number: Option<String>,
    pub date: NaiveDate,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub ref_invoice_number: Option<String>,
    pub items: Vec<DeliveryItem>,
    /// Proof-of-receipt image, as an opaque reference from the upload service.
    #[serde(default)]
    pub attachment_ref: Option<String>,
    #[serde(default)]
    pub version: u64,
}

impl DeliveryNote {
    pub fn new(date: NaiveDate) -> Self {
        DeliveryNote {
            id: None,
            delivery_number: None,
            date,
            status: DeliveryStatus::initial(),
            ref_invoice_number: None,
            items: Vec::new(),
            attachment_ref: None,
            version: 0,
        }
    }

    /// Seeds items and the invoice reference from an Invoice.
    pub fn from_invoice(invoice: &Invoice, date: NaiveDate) -> Self {
        DeliveryNote {
            ref_invoice_number: invoice.document_number.clone(),
            items: invoice
                .lines
                .iter()
                .map(|line| DeliveryItem {
                    name: line.description.clone(),
                    qty: line.quantity,
                    unit: line.unit.clone(),
                })
                .collect(),
            ..DeliveryNote::new(date)
        }
    }

    pub fn has_proof_of_receipt(&self) -> bool {
        self.attachment_ref
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }

    /// Requests a status change. Moving to `Diterima` without a proof of
    /// receipt leaves the status alone and asks for the upload.
    pub fn transition(&mut self, target: DeliveryStatus) -> Result<TransitionOutcome, IllegalTransitionError> {
        let outcome = delivery_transition(self.status, target, self.has_proof_of_receipt())?;
        if let TransitionOutcome::Applied(result) = &outcome {
            self.status = result.new_status;
        }
        Ok(outcome)
    }

    /// Same as [`DeliveryNote::transition`], with the target given by name.
    pub fn request_transition(&mut self, target: &str) -> Result<TransitionOutcome, IllegalTransitionError> {
        self.transition(DeliveryStatus::parse(target)?)
    }

    /// Stores the uploaded proof and completes the move to `Diterima`.
    ///
    /// A blank reference is not a proof: the note is left untouched.
    pub fn receive_with_proof(&mut self, attachment_ref: &str) -> CoreResult<TransitionResult<DeliveryStatus>> {
        let attachment_ref = attachment_ref.trim();
        if attachment_ref.is_empty() {
            return Err(CoreError::Validation(ValidationError::Required {
                field: "attachment_ref".to_string(),
            }));
        }
        let result = receive_with_proof(self.status)?;
        self.attachment_ref = Some(attachment_ref.to_string());
        self.status = result.new_status;
        Ok(result)
    }

    /// Explicit cancel intent, allowed from every status.
    pub fn cancel(&mut self) -> TransitionResult<DeliveryStatus> {
        let result = cancel_delivery(self.status);
        self.status = result.new_status;
        result
    }
}
