//! # Status State Machines
//!
//! Per document type: the allowed statuses, the legal transitions, and the
//! side effects a transition reports back to the caller.
//!
//! ## Sales Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Draft ◄──► Confirmed ◄──► Sent ◄──► Approved ◄──► Declined            │
//! │     (user-driven, any state to any state)                               │
//! │                                                                         │
//! │   generate invoice ──► forced Approved  (before the draft is handed on) │
//! │   send (email / whatsapp / pdf) ──► Sent                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Delivery Note
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Draft / Diterima / Dibatalkan ──► any of the four                     │
//! │   Dikirim ──► Diterima only        (cannot un-ship)                     │
//! │   any ──cancel()──► Dibatalkan     (explicit intent)                    │
//! │                                                                         │
//! │   ──► Diterima without proof of receipt = AwaitingProofOfReceipt        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An unknown target or one not offered from the current status is
//! rejected with [`IllegalTransitionError`] before any side effect runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::IllegalTransitionError;
use crate::types::{DocumentKind, SendChannel};

// =============================================================================
// State Machine Trait
// =============================================================================

/// A closed set of statuses with a transition table.
pub trait StatusMachine: Copy + Eq + fmt::Debug + 'static {
    /// Document type the statuses belong to.
    const KIND: DocumentKind;

    /// Status of a freshly created document.
    fn initial() -> Self;

    /// Every status, in display order.
    fn all() -> &'static [Self];

    /// Display and wire name.
    fn name(&self) -> &'static str;

    /// Targets offered from this status. Unconstrained by default.
    fn allowed_targets(&self) -> Vec<Self> {
        Self::all().to_vec()
    }

    fn can_transition_to(&self, target: Self) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Parses a status by name (case-insensitive). Never coerces.
    fn parse(name: &str) -> Result<Self, IllegalTransitionError> {
        let wanted = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| IllegalTransitionError::UnknownStatus {
                kind: Self::KIND,
                target: name.to_string(),
            })
    }
}

// =============================================================================
// Side Effects & Results
// =============================================================================

/// Something that happened besides the status change itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SideEffect {
    /// The Sales Order was forced to Approved by invoice generation.
    ForcedApproved,
    InvoiceDraftPrepared,
    SentViaEmail,
    SentViaWhatsapp,
    SentViaPdf,
    /// The transition waits for a proof-of-receipt upload.
    ProofOfReceiptRequired,
    ProofOfReceiptAttached,
    DeliveryCancelled,
}

impl SideEffect {
    pub const fn sent_via(channel: SendChannel) -> Self {
        match channel {
            SendChannel::Email => SideEffect::SentViaEmail,
            SendChannel::WhatsApp => SideEffect::SentViaWhatsapp,
            SendChannel::Pdf => SideEffect::SentViaPdf,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            SideEffect::ForcedApproved => "forced_approved",
            SideEffect::InvoiceDraftPrepared => "invoice_draft_prepared",
            SideEffect::SentViaEmail => "sent_via_email",
            SideEffect::SentViaWhatsapp => "sent_via_whatsapp",
            SideEffect::SentViaPdf => "sent_via_pdf",
            SideEffect::ProofOfReceiptRequired => "proof_of_receipt_required",
            SideEffect::ProofOfReceiptAttached => "proof_of_receipt_attached",
            SideEffect::DeliveryCancelled => "delivery_cancelled",
        }
    }
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported to the user as a toast or confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult<S> {
    pub previous: S,
    pub new_status: S,
    /// False for a same-state request.
    pub changed: bool,
    pub side_effects: Vec<SideEffect>,
}

impl<S: StatusMachine> TransitionResult<S> {
    fn unchanged(status: S) -> Self {
        TransitionResult {
            previous: status,
            new_status: status,
            changed: false,
            side_effects: Vec::new(),
        }
    }

    fn moved(previous: S, new_status: S) -> Self {
        TransitionResult {
            previous,
            new_status,
            changed: previous != new_status,
            side_effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: SideEffect) -> Self {
        self.side_effects.push(effect);
        self
    }
}

/// Validates a transition from `current` to `target`.
///
/// Same-state requests are accepted as no-ops.
pub fn transition<S: StatusMachine>(current: S, target: S) -> Result<TransitionResult<S>, IllegalTransitionError> {
    if current == target {
        return Ok(TransitionResult::unchanged(current));
    }
    if !current.can_transition_to(target) {
        return Err(IllegalTransitionError::NotAllowed {
            kind: S::KIND,
            from: current.name().to_string(),
            to: target.name().to_string(),
        });
    }
    Ok(TransitionResult::moved(current, target))
}

/// Parses `target` by name and validates the transition.
///
/// ## Example
/// ```rust
/// use niaga_core::status::{request_transition, DeliveryStatus};
///
/// assert!(request_transition(DeliveryStatus::Dikirim, "Diterima").is_ok());
/// assert!(request_transition(DeliveryStatus::Dikirim, "Draft").is_err());
/// assert!(request_transition(DeliveryStatus::Draft, "Shipped").is_err());
/// ```
pub fn request_transition<S: StatusMachine>(
    current: S,
    target: &str,
) -> Result<TransitionResult<S>, IllegalTransitionError> {
    transition(current, S::parse(target)?)
}

// =============================================================================
// Sales Order
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SalesOrderStatus {
    #[default]
    Draft,
    Confirmed,
    Sent,
    Approved,
    Declined,
}

impl StatusMachine for SalesOrderStatus {
    const KIND: DocumentKind = DocumentKind::SalesOrder;

    fn initial() -> Self {
        SalesOrderStatus::Draft
    }

    fn all() -> &'static [Self] {
        &[
            SalesOrderStatus::Draft,
            SalesOrderStatus::Confirmed,
            SalesOrderStatus::Sent,
            SalesOrderStatus::Approved,
            SalesOrderStatus::Declined,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            SalesOrderStatus::Draft => "Draft",
            SalesOrderStatus::Confirmed => "Confirmed",
            SalesOrderStatus::Sent => "Sent",
            SalesOrderStatus::Approved => "Approved",
            SalesOrderStatus::Declined => "Declined",
        }
    }
}

/// Forced move to `Approved` when an Invoice is generated from the order.
///
/// Always succeeds; reports `forced_approved` only when the status changed.
pub fn force_approved(current: SalesOrderStatus) -> TransitionResult<SalesOrderStatus> {
    let result = TransitionResult::moved(current, SalesOrderStatus::Approved);
    let result = if result.changed {
        result.with_effect(SideEffect::ForcedApproved)
    } else {
        result
    };
    result.with_effect(SideEffect::InvoiceDraftPrepared)
}

/// Move to `Sent` as a side effect of a send action, whatever the channel.
pub fn mark_sent(current: SalesOrderStatus, channel: SendChannel) -> TransitionResult<SalesOrderStatus> {
    TransitionResult::moved(current, SalesOrderStatus::Sent).with_effect(SideEffect::sent_via(channel))
}

// =============================================================================
// Quotation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QuotationStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl StatusMachine for QuotationStatus {
    const KIND: DocumentKind = DocumentKind::Quotation;

    fn initial() -> Self {
        QuotationStatus::Draft
    }

    fn all() -> &'static [Self] {
        &[
            QuotationStatus::Draft,
            QuotationStatus::Sent,
            QuotationStatus::Accepted,
            QuotationStatus::Rejected,
            QuotationStatus::Expired,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "Draft",
            QuotationStatus::Sent => "Sent",
            QuotationStatus::Accepted => "Accepted",
            QuotationStatus::Rejected => "Rejected",
            QuotationStatus::Expired => "Expired",
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl StatusMachine for InvoiceStatus {
    const KIND: DocumentKind = DocumentKind::Invoice;

    fn initial() -> Self {
        InvoiceStatus::Draft
    }

    fn all() -> &'static [Self] {
        &[
            InvoiceStatus::Draft,
            InvoiceStatus::Issued,
            InvoiceStatus::PartiallyPaid,
            InvoiceStatus::Paid,
            InvoiceStatus::Cancelled,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Issued => "Issued",
            InvoiceStatus::PartiallyPaid => "PartiallyPaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

// =============================================================================
// Delivery Note
// =============================================================================

/// Delivery note status (Indonesian labels as shown on the surat jalan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DeliveryStatus {
    #[default]
    Draft,
    /// Shipped.
    Dikirim,
    /// Received.
    Diterima,
    /// Cancelled.
    Dibatalkan,
}

impl StatusMachine for DeliveryStatus {
    const KIND: DocumentKind = DocumentKind::DeliveryNote;

    fn initial() -> Self {
        DeliveryStatus::Draft
    }

    fn all() -> &'static [Self] {
        &[
            DeliveryStatus::Draft,
            DeliveryStatus::Dikirim,
            DeliveryStatus::Diterima,
            DeliveryStatus::Dibatalkan,
        ]
    }

    fn name(&self) -> &'static str {
        match self {
            DeliveryStatus::Draft => "Draft",
            DeliveryStatus::Dikirim => "Dikirim",
            DeliveryStatus::Diterima => "Diterima",
            DeliveryStatus::Dibatalkan => "Dibatalkan",
        }
    }

    fn allowed_targets(&self) -> Vec<Self> {
        match self {
            DeliveryStatus::Dikirim => vec![DeliveryStatus::Dikirim, DeliveryStatus::Diterima],
            _ => Self::all().to_vec(),
        }
    }
}

/// Outcome of a delivery transition that may need a proof-of-receipt upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The status change was applied.
    Applied(TransitionResult<DeliveryStatus>),
    /// Moving to `Diterima` needs an attachment first; status unchanged.
    AwaitingProofOfReceipt { current: DeliveryStatus },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }

    pub fn side_effects(&self) -> Vec<SideEffect> {
        match self {
            TransitionOutcome::Applied(result) => result.side_effects.clone(),
            TransitionOutcome::AwaitingProofOfReceipt { .. } => vec![SideEffect::ProofOfReceiptRequired],
        }
    }
}

/// Validates a delivery transition, holding `Diterima` back until a proof
/// of receipt exists.
pub fn delivery_transition(
    current: DeliveryStatus,
    target: DeliveryStatus,
    has_proof_of_receipt: bool,
) -> Result<TransitionOutcome, IllegalTransitionError> {
    let result = transition(current, target)?;
    if result.changed && target == DeliveryStatus::Diterima && !has_proof_of_receipt {
        return Ok(TransitionOutcome::AwaitingProofOfReceipt { current });
    }
    Ok(TransitionOutcome::Applied(result))
}

/// Completes a move to `Diterima` with the uploaded proof.
pub fn receive_with_proof(current: DeliveryStatus) -> Result<TransitionResult<DeliveryStatus>, IllegalTransitionError> {
    Ok(transition(current, DeliveryStatus::Diterima)?.with_effect(SideEffect::ProofOfReceiptAttached))
}

/// Explicit cancel: allowed from every state, including `Dikirim`.
pub fn cancel_delivery(current: DeliveryStatus) -> TransitionResult<DeliveryStatus> {
    let result = TransitionResult::moved(current, DeliveryStatus::Dibatalkan);
    if result.changed {
        result.with_effect(SideEffect::DeliveryCancelled)
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_cannot_unship() {
        let err = request_transition(DeliveryStatus::Dikirim, "Draft").unwrap_err();
        assert_eq!(
            err,
            IllegalTransitionError::NotAllowed {
                kind: DocumentKind::DeliveryNote,
                from: "Dikirim".to_string(),
                to: "Draft".to_string(),
            }
        );
        assert!(request_transition(DeliveryStatus::Dikirim, "Dibatalkan").is_err());
    }

    #[test]
    fn test_delivery_offers_all_outside_dikirim() {
        for from in [DeliveryStatus::Draft, DeliveryStatus::Diterima, DeliveryStatus::Dibatalkan] {
            assert_eq!(from.allowed_targets().len(), 4);
        }
        assert_eq!(
            DeliveryStatus::Dikirim.allowed_targets(),
            vec![DeliveryStatus::Dikirim, DeliveryStatus::Diterima]
        );
    }

    #[test]
    fn test_unknown_status_is_rejected_not_coerced() {
        let err = request_transition(SalesOrderStatus::Draft, "Shipped").unwrap_err();
        assert!(matches!(err, IllegalTransitionError::UnknownStatus { .. }));
        // a delivery status name is not a sales order status
        assert!(request_transition(SalesOrderStatus::Draft, "Dikirim").is_err());
    }

    #[test]
    fn test_sales_order_unconstrained() {
        for &from in SalesOrderStatus::all() {
            for &to in SalesOrderStatus::all() {
                assert!(transition(from, to).is_ok());
            }
        }
        let r = request_transition(SalesOrderStatus::Approved, "draft").unwrap();
        assert_eq!(r.new_status, SalesOrderStatus::Draft);
        assert!(r.changed);
        assert!(r.side_effects.is_empty());
    }

    #[test]
    fn test_same_state_is_noop() {
        let r = transition(InvoiceStatus::Paid, InvoiceStatus::Paid).unwrap();
        assert!(!r.changed);
        assert!(r.side_effects.is_empty());
    }

    #[test]
    fn test_force_approved() {
        let r = force_approved(SalesOrderStatus::Sent);
        assert_eq!(r.new_status, SalesOrderStatus::Approved);
        assert_eq!(r.side_effects, vec![SideEffect::ForcedApproved, SideEffect::InvoiceDraftPrepared]);

        let r = force_approved(SalesOrderStatus::Approved);
        assert!(!r.changed);
        assert_eq!(r.side_effects, vec![SideEffect::InvoiceDraftPrepared]);
    }

    #[test]
    fn test_send_enters_sent_for_every_channel() {
        for channel in [SendChannel::Email, SendChannel::WhatsApp, SendChannel::Pdf] {
            let r = mark_sent(SalesOrderStatus::Confirmed, channel);
            assert_eq!(r.new_status, SalesOrderStatus::Sent);
            assert_eq!(r.side_effects, vec![SideEffect::sent_via(channel)]);
        }
    }

    #[test]
    fn test_receive_requires_proof() {
        let outcome = delivery_transition(DeliveryStatus::Dikirim, DeliveryStatus::Diterima, false).unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::AwaitingProofOfReceipt {
                current: DeliveryStatus::Dikirim
            }
        );
        assert_eq!(outcome.side_effects(), vec![SideEffect::ProofOfReceiptRequired]);

        let outcome = delivery_transition(DeliveryStatus::Dikirim, DeliveryStatus::Diterima, true).unwrap();
        assert!(outcome.is_applied());

        let r = receive_with_proof(DeliveryStatus::Dikirim).unwrap();
        assert_eq!(r.new_status, DeliveryStatus::Diterima);
        assert_eq!(r.side_effects, vec![SideEffect::ProofOfReceiptAttached]);
    }

    #[test]
    fn test_explicit_cancel_from_dikirim() {
        let r = cancel_delivery(DeliveryStatus::Dikirim);
        assert_eq!(r.new_status, DeliveryStatus::Dibatalkan);
        assert_eq!(r.side_effects, vec![SideEffect::DeliveryCancelled]);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&DeliveryStatus::Dikirim).unwrap(), "\"Dikirim\"");
        assert_eq!(serde_json::to_string(&SideEffect::SentViaWhatsapp).unwrap(), "\"sent_via_whatsapp\"");
        let r = transition(SalesOrderStatus::Draft, SalesOrderStatus::Confirmed).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["newStatus"], "Confirmed");
        assert_eq!(json["sideEffects"], serde_json::json!([]));
    }
}
