//! # Document Link Graph
//!
//! One-way data copies along the chain and soft-reference resolution.
//!
//! ## The Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Quotation ──copy──► Sales Order ──copy──► Invoice ──number──► Surat   │
//! │       │                    │                   │                Jalan   │
//! │       │                    │                   │                        │
//! │       └── id + number ─────┴── carried ────────┘ (read-only badge)      │
//! │                                                                         │
//! │   copy     = customer + lines (product, description, qty, unit, price) │
//! │   NOT copy = discounts, tax mode  (start neutral on the new document)  │
//! │                                                                         │
//! │   Later edits to the source never propagate: the copy is a snapshot.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resolving a Reference
//! Id is primary, the document number is the fallback. If both are given
//! and point at different documents, id wins and the mismatch is reported.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::discount::DiscountSpec;
use crate::document::{Invoice, Quotation, SalesOrder};
use crate::error::LinkResolutionError;
use crate::line::LineItem;
use crate::ports::DocumentLookup;
use crate::tax::TaxMode;
use crate::types::DocumentKind;

// =============================================================================
// Document Reference
// =============================================================================

/// A soft reference: id, natural key, or both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: Option<String>,
    pub number: Option<String>,
}

impl DocumentRef {
    /// Blank strings count as absent.
    pub fn new(id: Option<&str>, number: Option<&str>) -> Self {
        fn present(s: Option<&str>) -> Option<String> {
            s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
        }
        DocumentRef {
            id: present(id),
            number: present(number),
        }
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        DocumentRef {
            id: Some(id.into()),
            number: None,
        }
    }

    pub fn by_number(number: impl Into<String>) -> Self {
        DocumentRef {
            id: None,
            number: Some(number.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.number.is_none()
    }

    /// True when `id` or `number` matches this reference.
    pub fn matches(&self, id: Option<&str>, number: Option<&str>) -> bool {
        let id_hit = matches!((self.id.as_deref(), id), (Some(a), Some(b)) if a == b);
        let number_hit = matches!((self.number.as_deref(), number), (Some(a), Some(b)) if a == b);
        id_hit || number_hit
    }
}

/// Which path found the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedBy {
    Id,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub document: T,
    pub via: ResolvedBy,
    /// Both paths resolved but to different documents; the id result won.
    pub number_mismatch: bool,
}

/// Resolves a reference through `lookup`.
///
/// ## Errors
/// - [`LinkResolutionError::Missing`] when the reference is empty
/// - [`LinkResolutionError::Unresolved`] when neither path finds anything
pub fn resolve_link<T, L>(lookup: &L, kind: DocumentKind, reference: &DocumentRef) -> Result<Resolved<T>, LinkResolutionError>
where
    T: PartialEq,
    L: DocumentLookup<T> + ?Sized,
{
    if reference.is_empty() {
        return Err(LinkResolutionError::Missing { kind });
    }

    let by_id = reference.id.as_deref().and_then(|id| lookup.find_by_id(id));
    let by_number = reference.number.as_deref().and_then(|n| lookup.find_by_number(n));

    match (by_id, by_number) {
        (Some(document), by_number) => {
            let number_mismatch = by_number.is_some_and(|other| other != document);
            Ok(Resolved {
                document,
                via: ResolvedBy::Id,
                number_mismatch,
            })
        }
        (None, Some(document)) => Ok(Resolved {
            document,
            via: ResolvedBy::Number,
            number_mismatch: false,
        }),
        (None, None) => Err(LinkResolutionError::Unresolved {
            kind,
            id: reference.id.clone(),
            number: reference.number.clone(),
        }),
    }
}

// =============================================================================
// Quotation -> Sales Order
// =============================================================================

/// What the link graph needs from a Quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationSnapshot {
    pub id: Option<String>,
    pub quotation_number: Option<String>,
    pub customer_id: String,
    pub lines: Vec<LineItem>,
}

impl From<&Quotation> for QuotationSnapshot {
    fn from(q: &Quotation) -> Self {
        QuotationSnapshot {
            id: q.id.clone(),
            quotation_number: q.document_number.clone(),
            customer_id: q.customer_id.clone(),
            lines: q.lines.clone(),
        }
    }
}

/// Copies a quotation's customer and lines into an order draft.
///
/// Discounts and tax mode start neutral on the order; the order's own
/// date, shipping and down payment are kept. The copy is a snapshot.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use niaga_core::document::SalesOrder;
/// use niaga_core::line::LineItem;
/// use niaga_core::link::{link_quotation_to_order, QuotationSnapshot};
/// use niaga_core::money::Money;
/// use niaga_core::types::Quantity;
///
/// let quotation = QuotationSnapshot {
///     id: Some("q-1".to_string()),
///     quotation_number: Some("QUO/2024/05/0001".to_string()),
///     customer_id: "cust-1".to_string(),
///     lines: vec![LineItem::new("Meja", Quantity::whole(2), "unit", Money::from_units(50_000))],
/// };
/// let date = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
/// let order = link_quotation_to_order(SalesOrder::new(date, ""), &quotation);
/// assert_eq!(order.customer_id, "cust-1");
/// assert_eq!(order.linked_quotation_id.as_deref(), Some("q-1"));
/// ```
pub fn link_quotation_to_order(order_draft: SalesOrder, quotation: &QuotationSnapshot) -> SalesOrder {
    SalesOrder {
        customer_id: quotation.customer_id.clone(),
        lines: quotation.lines.iter().map(LineItem::linked_copy).collect(),
        extra_discount: DiscountSpec::none(),
        tax_mode: TaxMode::None,
        linked_quotation_id: quotation.id.clone(),
        linked_quotation_number: quotation.quotation_number.clone(),
        ..order_draft
    }
}

// =============================================================================
// Sales Order -> Invoice
// =============================================================================

/// Explicit value object that prefills a new Invoice from a Sales Order.
///
/// Serializable so it can travel as a navigation parameter or a
/// short-lived server-side draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftHandoff {
    pub order_id: Option<String>,
    pub order_number: Option<String>,
    pub quotation_id: Option<String>,
    pub quotation_number: Option<String>,
    pub customer_id: String,
    pub lines: Vec<LineItem>,
}

impl DraftHandoff {
    pub fn from_order(order: &SalesOrder) -> Self {
        DraftHandoff {
            order_id: order.id.clone(),
            order_number: order.document_number.clone(),
            quotation_id: order.linked_quotation_id.clone(),
            quotation_number: order.linked_quotation_number.clone(),
            customer_id: order.customer_id.clone(),
            lines: order.lines.iter().map(LineItem::linked_copy).collect(),
        }
    }
}

impl Invoice {
    /// A neutral invoice draft prefilled from a handoff.
    pub fn from_handoff(handoff: DraftHandoff, date: NaiveDate) -> Self {
        Invoice {
            lines: handoff.lines,
            linked_order_id: handoff.order_id,
            linked_order_number: handoff.order_number,
            linked_quotation_id: handoff.quotation_id,
            linked_quotation_number: handoff.quotation_number,
            ..Invoice::new(date, handoff.customer_id)
        }
    }
}

/// Builds an invoice draft from an order, carrying the quotation link.
pub fn link_order_to_invoice_draft(order: &SalesOrder, date: NaiveDate) -> Invoice {
    Invoice::from_handoff(DraftHandoff::from_order(order), date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::status::SalesOrderStatus;
    use crate::types::{Percent, Quantity};
    use std::collections::HashMap;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
    }

    fn quotation() -> Quotation {
        let mut q = Quotation::new(date(), "cust-7");
        q.id = Some("q-1".to_string());
        q.document_number = Some("QUO/2024/05/0001".to_string());
        q.lines = vec![
            LineItem::new("Kursi", Quantity::whole(4), "unit", Money::from_units(350_000))
                .with_discount(DiscountSpec::percent(Percent::whole(5))),
            LineItem::new("Meja rapat", Quantity::whole(1), "unit", Money::from_units(2_100_000)),
        ];
        q.tax_mode = TaxMode::Ppn11Exclusive;
        q.extra_discount = DiscountSpec::amount(Money::from_units(100_000));
        q
    }

    #[derive(Default)]
    struct Snapshots {
        by_id: HashMap<String, QuotationSnapshot>,
        by_number: HashMap<String, QuotationSnapshot>,
    }

    impl Snapshots {
        fn insert(&mut self, snap: QuotationSnapshot) {
            if let Some(id) = &snap.id {
                self.by_id.insert(id.clone(), snap.clone());
            }
            if let Some(n) = &snap.quotation_number {
                self.by_number.insert(n.clone(), snap.clone());
            }
        }
    }

    impl DocumentLookup<QuotationSnapshot> for Snapshots {
        fn find_by_id(&self, id: &str) -> Option<QuotationSnapshot> {
            self.by_id.get(id).cloned()
        }
        fn find_by_number(&self, number: &str) -> Option<QuotationSnapshot> {
            self.by_number.get(number).cloned()
        }
    }

    #[test]
    fn test_order_copies_lines_not_adjustments() {
        let q = quotation();
        let order = link_quotation_to_order(SalesOrder::new(date(), ""), &QuotationSnapshot::from(&q));

        assert_eq!(order.customer_id, "cust-7");
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].unit_price, q.lines[0].unit_price);
        assert!(order.lines.iter().all(|l| l.discount.is_none()));
        assert_eq!(order.tax_mode, TaxMode::None);
        assert!(order.extra_discount.is_none());
        assert_eq!(order.linked_quotation_number.as_deref(), Some("QUO/2024/05/0001"));
        assert_eq!(order.status, SalesOrderStatus::Draft);
    }

    #[test]
    fn test_editing_quotation_does_not_touch_order() {
        let mut q = quotation();
        let order = link_quotation_to_order(SalesOrder::new(date(), ""), &QuotationSnapshot::from(&q));
        let stored_price = order.lines[1].unit_price;

        q.lines[1].unit_price = Money::from_units(9_999_999);
        q.lines.push(LineItem::new("Lemari", Quantity::whole(1), "unit", Money::from_units(1)));

        assert_eq!(order.lines[1].unit_price, stored_price);
        assert_eq!(order.lines.len(), 2);
    }

    #[test]
    fn test_invoice_carries_quotation_link() {
        let q = quotation();
        let mut order = link_quotation_to_order(SalesOrder::new(date(), ""), &QuotationSnapshot::from(&q));
        order.id = Some("o-1".to_string());
        order.document_number = Some("SO/2024/05/0002".to_string());
        order.tax_mode = TaxMode::Ppn12Inclusive;

        let invoice = link_order_to_invoice_draft(&order, date());
        let refs = invoice.linked_refs();
        assert_eq!(refs.order_id.as_deref(), Some("o-1"));
        assert_eq!(refs.quotation_id.as_deref(), Some("q-1"));
        assert_eq!(invoice.customer_id, "cust-7");
        assert_eq!(invoice.tax_mode, TaxMode::None);
        assert!(invoice.id.is_none());
        assert_eq!(invoice.lines.len(), 2);
    }

    #[test]
    fn test_handoff_round_trips_as_navigation_param() {
        let mut order = SalesOrder::new(date(), "cust-1");
        order.lines.push(LineItem::new("Kabel", Quantity::whole(10), "m", Money::from_units(8_000)));
        let handoff = DraftHandoff::from_order(&order);
        let json = serde_json::to_string(&handoff).unwrap();
        assert!(json.contains("\"customerId\""));
        let back: DraftHandoff = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handoff);
    }

    #[test]
    fn test_resolve_by_id_then_number() {
        let mut lookup = Snapshots::default();
        let snap = QuotationSnapshot::from(&quotation());
        lookup.insert(snap.clone());

        let r = resolve_link(&lookup, DocumentKind::Quotation, &DocumentRef::by_id("q-1")).unwrap();
        assert_eq!(r.via, ResolvedBy::Id);

        let r = resolve_link(&lookup, DocumentKind::Quotation, &DocumentRef::new(Some("stale"), Some("QUO/2024/05/0001"))).unwrap();
        assert_eq!(r.via, ResolvedBy::Number);
        assert_eq!(r.document, snap);
    }

    #[test]
    fn test_id_wins_on_disagreement() {
        let mut lookup = Snapshots::default();
        lookup.insert(QuotationSnapshot::from(&quotation()));
        let mut other = quotation();
        other.id = Some("q-2".to_string());
        other.document_number = Some("QUO/2024/05/0002".to_string());
        other.customer_id = "cust-8".to_string();
        lookup.insert(QuotationSnapshot::from(&other));

        let reference = DocumentRef::new(Some("q-1"), Some("QUO/2024/05/0002"));
        let r = resolve_link(&lookup, DocumentKind::Quotation, &reference).unwrap();
        assert_eq!(r.document.customer_id, "cust-7");
        assert!(r.number_mismatch);
    }

    #[test]
    fn test_unresolved_and_missing() {
        let lookup = Snapshots::default();
        let err = resolve_link::<QuotationSnapshot, _>(&lookup, DocumentKind::Quotation, &DocumentRef::by_number("QUO/X"))
            .unwrap_err();
        assert!(matches!(err, LinkResolutionError::Unresolved { .. }));

        let err = resolve_link::<QuotationSnapshot, _>(&lookup, DocumentKind::Quotation, &DocumentRef::new(Some(" "), None))
            .unwrap_err();
        assert_eq!(err, LinkResolutionError::Missing { kind: DocumentKind::Quotation });
    }

    #[test]
    fn test_quotation_fetch_blanket_impl() {
        use crate::ports::QuotationFetch;
        let mut lookup = Snapshots::default();
        lookup.insert(QuotationSnapshot::from(&quotation()));
        let snap = lookup.fetch_quotation(&DocumentRef::by_number("QUO/2024/05/0001")).unwrap();
        assert_eq!(snap.lines.len(), 2);
    }

    #[test]
    fn test_ref_matching() {
        let r = DocumentRef::new(Some("q-1"), None);
        assert!(r.matches(Some("q-1"), Some("QUO/1")));
        assert!(!r.matches(None, Some("QUO/1")));
        assert!(DocumentRef::by_number("QUO/1").matches(Some("zz"), Some("QUO/1")));
    }
}
