//! # Document Service
//!
//! The façade the sales UI calls. Every rule comes from `niaga-core`; this
//! module loads, validates, persists and logs around it.
//!
//! ## Document Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Quotation ──create_order_from_quotation──► Sales Order                 │
//! │  (QUO/..)      copies customer + lines        (SO/..)                   │
//! │                                                  │                      │
//! │                       generate_invoice_from_order│ forces Approved      │
//! │                                                  ▼                      │
//! │                                               Invoice                   │
//! │                                               (INV/..)                  │
//! │                                                  │                      │
//! │               create_delivery_note_from_invoice  │ items + number       │
//! │                                                  ▼                      │
//! │                                             Delivery Note               │
//! │                                               (SJ/..)                   │
//! │                                                                         │
//! │  Links are soft (id and/or number). A link that no longer resolves is  │
//! │  a warning on save, never a failure.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use niaga_core::status::{force_approved, mark_sent, transition};
use niaga_core::validation::{validate_delivery_for_submit, validate_for_submit};
use niaga_core::{
    link_order_to_invoice_draft, link_quotation_to_order, resolve_link, CommercialDocument, CoreError,
    DeliveryNote, DeliveryStatus, DocumentKind, DocumentLookup, DocumentNumberIssuer, DocumentRef, Invoice,
    LineItem, LinkedDocumentRefs, ProductCatalogLookup, Quantity, Quotation, QuotationFetch, QuotationSnapshot,
    SalesOrder, SalesOrderStatus, SendChannel, StatusMachine, TotalsBreakdown, TransitionOutcome,
    TransitionResult, ValidationError,
};

use crate::config::EngineConfig;
use crate::error::{ApiError, EngineError, EngineResult};
use crate::normalize::DocumentInput;
use crate::numbering::SequentialNumberIssuer;
use crate::repository::{InMemoryRepository, Stored};

// =============================================================================
// Results
// =============================================================================

/// A saved document plus any non-blocking warnings (unresolved links).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome<T> {
    pub document: T,
    pub warnings: Vec<ApiError>,
}

/// Returned by [`DocumentService::generate_invoice_from_order`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceGeneration {
    /// Unsaved invoice draft, prefilled from the order.
    pub invoice: Invoice,
    /// The order as persisted after the forced approval.
    pub order: SalesOrder,
    pub transition: TransitionResult<SalesOrderStatus>,
}

/// Link badges plus whether each one still resolves.
///
/// `None` means the document has no such link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStatus {
    pub refs: LinkedDocumentRefs,
    pub quotation_resolved: Option<bool>,
    pub order_resolved: Option<bool>,
}

/// What to do with documents that link to one being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Fail with `StillReferenced`.
    #[default]
    Refuse,
    /// Clear the link on every referencing document, then delete.
    CascadeUnlink,
}

// =============================================================================
// Repository Access
// =============================================================================

/// Gives generic service methods the repository for a document type.
pub trait RepositoryFor<T: Stored> {
    fn repository(&self) -> &InMemoryRepository<T>;
}

// =============================================================================
// Document Service
// =============================================================================

/// Orchestrates the document chain over versioned repositories.
///
/// ## Usage
/// ```rust
/// use chrono::NaiveDate;
/// use niaga_core::{LineItem, Money, Quantity, SalesOrder};
/// use niaga_engine::{DocumentService, EngineConfig};
///
/// let service = DocumentService::in_memory(EngineConfig::default());
/// let date = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
///
/// let mut order: SalesOrder = service.new_document(date, "cust-1");
/// order.lines.push(LineItem::new("Meja", Quantity::whole(2), "unit", Money::from_units(50_000)));
///
/// let saved = service.save_sales_order(order).unwrap().document;
/// assert_eq!(saved.document_number.as_deref(), Some("SO/2024/05/0001"));
/// ```
pub struct DocumentService {
    config: EngineConfig,
    quotations: Arc<InMemoryRepository<Quotation>>,
    orders: Arc<InMemoryRepository<SalesOrder>>,
    invoices: Arc<InMemoryRepository<Invoice>>,
    deliveries: Arc<InMemoryRepository<DeliveryNote>>,
    issuer: Arc<dyn DocumentNumberIssuer + Send + Sync>,
}

impl RepositoryFor<Quotation> for DocumentService {
    fn repository(&self) -> &InMemoryRepository<Quotation> {
        &self.quotations
    }
}

impl RepositoryFor<SalesOrder> for DocumentService {
    fn repository(&self) -> &InMemoryRepository<SalesOrder> {
        &self.orders
    }
}

impl RepositoryFor<Invoice> for DocumentService {
    fn repository(&self) -> &InMemoryRepository<Invoice> {
        &self.invoices
    }
}

impl RepositoryFor<DeliveryNote> for DocumentService {
    fn repository(&self) -> &InMemoryRepository<DeliveryNote> {
        &self.deliveries
    }
}

/// Serves quotation snapshots out of the quotation repository.
struct QuotationSnapshots<'a>(&'a InMemoryRepository<Quotation>);

impl DocumentLookup<QuotationSnapshot> for QuotationSnapshots<'_> {
    fn find_by_id(&self, id: &str) -> Option<QuotationSnapshot> {
        self.0.find_by_id(id).as_ref().map(QuotationSnapshot::from)
    }

    fn find_by_number(&self, number: &str) -> Option<QuotationSnapshot> {
        self.0.find_by_number(number).as_ref().map(QuotationSnapshot::from)
    }
}

impl DocumentService {
    pub fn new(config: EngineConfig, issuer: Arc<dyn DocumentNumberIssuer + Send + Sync>) -> Self {
        DocumentService {
            config,
            quotations: Arc::new(InMemoryRepository::new()),
            orders: Arc::new(InMemoryRepository::new()),
            invoices: Arc::new(InMemoryRepository::new()),
            deliveries: Arc::new(InMemoryRepository::new()),
            issuer,
        }
    }

    /// In-memory repositories and a sequential issuer from the config.
    pub fn in_memory(config: EngineConfig) -> Self {
        let issuer = Arc::new(SequentialNumberIssuer::new(config.numbering.clone()));
        Self::new(config, issuer)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads a stored document by id.
    pub fn get<T: Stored>(&self, id: &str) -> EngineResult<T>
    where
        Self: RepositoryFor<T>,
    {
        RepositoryFor::<T>::repository(self).require(id)
    }

    fn store<S: StatusMachine>(&self) -> &InMemoryRepository<CommercialDocument<S>>
    where
        Self: RepositoryFor<CommercialDocument<S>>,
    {
        RepositoryFor::<CommercialDocument<S>>::repository(self)
    }

    // =========================================================================
    // Drafts & Pricing
    // =========================================================================

    /// A blank draft using the configured default tax mode.
    pub fn new_document<S: StatusMachine>(&self, date: NaiveDate, customer_id: impl Into<String>) -> CommercialDocument<S> {
        CommercialDocument {
            tax_mode: self.config.pricing.default_tax_mode,
            ..CommercialDocument::new(date, customer_id)
        }
    }

    /// Seeds a line from a catalog product.
    pub fn line_from_catalog(
        &self,
        catalog: &impl ProductCatalogLookup,
        product_id: &str,
        quantity: Quantity,
    ) -> EngineResult<LineItem> {
        let product = catalog.product_by_id(product_id).ok_or_else(|| ValidationError::InvalidFormat {
            field: "product_id".to_string(),
            reason: format!("unknown product {}", product_id),
        })?;
        Ok(LineItem::from_catalog(&product, quantity))
    }

    /// Totals for a form that is still being edited.
    pub fn preview_totals<S: StatusMachine>(&self, document: &CommercialDocument<S>) -> TotalsBreakdown {
        document.totals()
    }

    /// Builds a document from a raw form payload. Junk numbers, negatives
    /// and out-of-range discounts are rejected before anything is clamped.
    pub fn document_from_input<S: StatusMachine>(
        &self,
        input: DocumentInput,
        fallback_date: NaiveDate,
    ) -> EngineResult<CommercialDocument<S>> {
        input.validate()?;
        Ok(input.into_document(fallback_date, self.config.pricing.default_tax_mode)?)
    }

    // =========================================================================
    // Saving
    // =========================================================================

    pub fn save_quotation(&self, quotation: Quotation) -> EngineResult<SaveOutcome<Quotation>> {
        self.save_document(quotation)
    }

    pub fn save_sales_order(&self, order: SalesOrder) -> EngineResult<SaveOutcome<SalesOrder>> {
        self.save_document(order)
    }

    pub fn save_invoice(&self, invoice: Invoice) -> EngineResult<SaveOutcome<Invoice>> {
        self.save_document(invoice)
    }

    /// Validates, numbers on first save, and persists with a version check.
    fn save_document<S: StatusMachine>(
        &self,
        mut document: CommercialDocument<S>,
    ) -> EngineResult<SaveOutcome<CommercialDocument<S>>>
    where
        Self: RepositoryFor<CommercialDocument<S>>,
    {
        validate_for_submit(&document)?;
        let warnings = self.link_warnings(&document.linked_refs());

        let saved = if document.is_saved() {
            self.store::<S>().update(document)?
        } else {
            if document.document_number.is_none() {
                document.document_number = Some(self.issuer.issue(S::KIND, document.date));
            }
            self.store::<S>().insert(document)?
        };

        info!(
            kind = %S::KIND,
            number = %saved.label(),
            version = saved.version,
            warnings = warnings.len(),
            "Saved document"
        );
        Ok(SaveOutcome {
            document: saved,
            warnings,
        })
    }

    pub fn save_delivery_note(&self, mut note: DeliveryNote) -> EngineResult<SaveOutcome<DeliveryNote>> {
        validate_delivery_for_submit(&note)?;

        let mut warnings = Vec::new();
        if let Some(number) = note.ref_invoice_number.as_deref() {
            if let Err(err) = self.check_link(self.invoices.as_ref(), &DocumentRef::by_number(number)) {
                warnings.push(err);
            }
        }

        let saved = if note.id.is_some() {
            self.deliveries.update(note)?
        } else {
            if note.delivery_number.is_none() {
                note.delivery_number = Some(self.issuer.issue(DocumentKind::DeliveryNote, note.date));
            }
            self.deliveries.insert(note)?
        };

        info!(
            number = ?saved.delivery_number,
            status = saved.status.name(),
            version = saved.version,
            "Saved delivery note"
        );
        Ok(SaveOutcome {
            document: saved,
            warnings,
        })
    }

    // =========================================================================
    // Link Resolution
    // =========================================================================

    fn check_link<T>(&self, lookup: &InMemoryRepository<T>, reference: &DocumentRef) -> Result<T, ApiError>
    where
        T: Stored + PartialEq,
    {
        match resolve_link(lookup, T::KIND, reference) {
            Ok(resolved) => {
                if resolved.number_mismatch {
                    warn!(
                        kind = %T::KIND,
                        id = ?reference.id,
                        number = ?reference.number,
                        "Link id and number point at different documents, using id"
                    );
                }
                Ok(resolved.document)
            }
            Err(err) => {
                warn!(error = %err, "Unresolved document link");
                Err(EngineError::from(err).into())
            }
        }
    }

    fn link_warnings(&self, refs: &LinkedDocumentRefs) -> Vec<ApiError> {
        let mut warnings = Vec::new();
        let quotation = DocumentRef::new(refs.quotation_id.as_deref(), refs.quotation_number.as_deref());
        if !quotation.is_empty() {
            if let Err(err) = self.check_link(self.quotations.as_ref(), &quotation) {
                warnings.push(err);
            }
        }
        let order = DocumentRef::new(refs.order_id.as_deref(), refs.order_number.as_deref());
        if !order.is_empty() {
            if let Err(err) = self.check_link(self.orders.as_ref(), &order) {
                warnings.push(err);
            }
        }
        warnings
    }

    /// Link badges for a document, each marked resolved or not.
    pub fn linked_refs_status<S: StatusMachine>(&self, document: &CommercialDocument<S>) -> LinkStatus {
        let refs = document.linked_refs();
        let quotation = DocumentRef::new(refs.quotation_id.as_deref(), refs.quotation_number.as_deref());
        let order = DocumentRef::new(refs.order_id.as_deref(), refs.order_number.as_deref());

        LinkStatus {
            quotation_resolved: (!quotation.is_empty())
                .then(|| resolve_link(self.quotations.as_ref(), DocumentKind::Quotation, &quotation).is_ok()),
            order_resolved: (!order.is_empty())
                .then(|| resolve_link(self.orders.as_ref(), DocumentKind::SalesOrder, &order).is_ok()),
            refs,
        }
    }

    // =========================================================================
    // Document Chain
    // =========================================================================

    /// New, unsaved order draft copied from a stored quotation.
    pub fn create_order_from_quotation(&self, reference: &DocumentRef, date: NaiveDate) -> EngineResult<SalesOrder> {
        self.create_order_with(&QuotationSnapshots(self.quotations.as_ref()), reference, date)
    }

    /// Same as [`DocumentService::create_order_from_quotation`], fetching the
    /// quotation through an external source.
    pub fn create_order_with(
        &self,
        source: &impl QuotationFetch,
        reference: &DocumentRef,
        date: NaiveDate,
    ) -> EngineResult<SalesOrder> {
        let snapshot = source.fetch_quotation(reference)?;
        let order = link_quotation_to_order(self.new_document(date, ""), &snapshot);

        debug!(
            quotation = ?snapshot.quotation_number,
            lines = order.lines.len(),
            "Created order draft from quotation"
        );
        Ok(order)
    }

    /// Forces the order to `Approved`, persists it, and returns an invoice
    /// draft. An invalid order is rejected before anything changes.
    pub fn generate_invoice_from_order(&self, order_id: &str, date: NaiveDate) -> EngineResult<InvoiceGeneration> {
        let mut order = self.orders.require(order_id)?;
        validate_for_submit(&order)?;

        let transition = force_approved(order.status);
        order.status = transition.new_status;
        let order = if transition.changed {
            self.orders.update(order)?
        } else {
            order
        };

        let invoice = link_order_to_invoice_draft(&order, date);
        info!(
            order = %order.label(),
            previous = transition.previous.name(),
            lines = invoice.lines.len(),
            "Generated invoice draft from order"
        );
        Ok(InvoiceGeneration {
            invoice,
            order,
            transition,
        })
    }

    /// Records that the order went out, whatever the channel.
    pub fn send_order(&self, order_id: &str, channel: SendChannel) -> EngineResult<TransitionResult<SalesOrderStatus>> {
        let mut order = self.orders.require(order_id)?;
        let result = mark_sent(order.status, channel);
        if result.changed {
            order.status = result.new_status;
            self.orders.update(order)?;
        }
        info!(order_id = %order_id, channel = ?channel, "Order sent");
        Ok(result)
    }

    /// Unsaved delivery note seeded from a stored invoice.
    pub fn create_delivery_note_from_invoice(&self, invoice_id: &str, date: NaiveDate) -> EngineResult<DeliveryNote> {
        let invoice = self.invoices.require(invoice_id)?;
        Ok(DeliveryNote::from_invoice(&invoice, date))
    }

    // =========================================================================
    // Status Transitions
    // =========================================================================

    pub fn transition_order(&self, id: &str, target: &str) -> EngineResult<TransitionResult<SalesOrderStatus>> {
        self.transition_document(id, target)
    }

    pub fn transition_quotation(
        &self,
        id: &str,
        target: &str,
    ) -> EngineResult<TransitionResult<niaga_core::QuotationStatus>> {
        self.transition_document(id, target)
    }

    pub fn transition_invoice(
        &self,
        id: &str,
        target: &str,
    ) -> EngineResult<TransitionResult<niaga_core::InvoiceStatus>> {
        self.transition_document(id, target)
    }

    fn transition_document<S: StatusMachine>(&self, id: &str, target: &str) -> EngineResult<TransitionResult<S>>
    where
        Self: RepositoryFor<CommercialDocument<S>>,
    {
        let mut document = self.store::<S>().require(id)?;
        let result = document.request_status(target)?;
        if result.changed {
            self.store::<S>().update(document)?;
        }
        info!(
            kind = %S::KIND,
            id = %id,
            from = result.previous.name(),
            to = result.new_status.name(),
            "Status transition"
        );
        Ok(result)
    }

    /// Moves a delivery note. With proof of receipt required, moving to
    /// `Diterima` without an attachment returns `AwaitingProofOfReceipt`.
    pub fn transition_delivery(&self, id: &str, target: &str) -> EngineResult<TransitionOutcome> {
        let mut note = self.deliveries.require(id)?;

        let outcome = if self.config.delivery.require_proof_of_receipt {
            note.request_transition(target)?
        } else {
            let result = transition(note.status, DeliveryStatus::parse(target)?)?;
            note.status = result.new_status;
            TransitionOutcome::Applied(result)
        };

        match &outcome {
            TransitionOutcome::Applied(result) if result.changed => {
                self.deliveries.update(note)?;
                info!(id = %id, to = result.new_status.name(), "Delivery status changed");
            }
            TransitionOutcome::Applied(_) => {}
            TransitionOutcome::AwaitingProofOfReceipt { .. } => {
                debug!(id = %id, "Delivery waits for proof of receipt");
            }
        }
        Ok(outcome)
    }

    /// Stores the uploaded proof and completes the move to `Diterima`.
    pub fn attach_proof_of_receipt(
        &self,
        id: &str,
        attachment_ref: &str,
    ) -> EngineResult<TransitionResult<DeliveryStatus>> {
        let mut note = self.deliveries.require(id)?;
        let result = note.receive_with_proof(attachment_ref)?;
        self.deliveries.update(note)?;
        info!(id = %id, "Proof of receipt attached");
        Ok(result)
    }

    /// Explicit cancel, allowed from every status.
    pub fn cancel_delivery(&self, id: &str) -> EngineResult<TransitionResult<DeliveryStatus>> {
        let mut note = self.deliveries.require(id)?;
        let result = note.cancel();
        if result.changed {
            self.deliveries.update(note)?;
            info!(id = %id, from = result.previous.name(), "Delivery cancelled");
        }
        Ok(result)
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    pub fn delete_quotation(&self, id: &str, policy: DeletePolicy) -> EngineResult<()> {
        let quotation = self.quotations.require(id)?;
        let target = DocumentRef::new(quotation.id.as_deref(), quotation.document_number.as_deref());
        let links = |doc_id: Option<&str>, number: Option<&str>| target.matches(doc_id, number);

        let orders = self
            .orders
            .find_all(|o| links(o.linked_quotation_id.as_deref(), o.linked_quotation_number.as_deref()))?;
        let invoices = self
            .invoices
            .find_all(|i| links(i.linked_quotation_id.as_deref(), i.linked_quotation_number.as_deref()))?;

        if !orders.is_empty() || !invoices.is_empty() {
            if policy == DeletePolicy::Refuse {
                let referenced_by = orders.iter().map(|o| o.label()).chain(invoices.iter().map(|i| i.label()));
                return Err(still_referenced(DocumentKind::Quotation, quotation.label(), referenced_by.collect()));
            }
            self.unlink_quotation_from(orders, invoices)?;
        }

        self.quotations.delete(id)?;
        info!(number = %quotation.label(), policy = ?policy, "Deleted quotation");
        Ok(())
    }

    /// Drops the quotation link from every given order and invoice, or from
    /// none of them when any copy is stale.
    fn unlink_quotation_from(&self, orders: Vec<SalesOrder>, invoices: Vec<Invoice>) -> EngineResult<()> {
        let orders: Vec<SalesOrder> = orders
            .into_iter()
            .map(|mut o| {
                o.unlink_quotation();
                o
            })
            .collect();
        let invoices: Vec<Invoice> = invoices
            .into_iter()
            .map(|mut i| {
                i.unlink_quotation();
                i
            })
            .collect();

        // Both stores stay locked until every unlink is written.
        let mut order_batch = self.orders.batch()?;
        let mut invoice_batch = self.invoices.batch()?;
        order_batch.check(&orders)?;
        invoice_batch.check(&invoices)?;
        let unlinked = order_batch.apply(orders).len() + invoice_batch.apply(invoices).len();
        debug!(unlinked, "Unlinked quotation references");
        Ok(())
    }

    pub fn delete_sales_order(&self, id: &str, policy: DeletePolicy) -> EngineResult<()> {
        let order = self.orders.require(id)?;
        let target = DocumentRef::new(order.id.as_deref(), order.document_number.as_deref());
        let invoices = self
            .invoices
            .find_all(|i| target.matches(i.linked_order_id.as_deref(), i.linked_order_number.as_deref()))?;

        if !invoices.is_empty() {
            if policy == DeletePolicy::Refuse {
                let referenced_by = invoices.iter().map(|i| i.label()).collect();
                return Err(still_referenced(DocumentKind::SalesOrder, order.label(), referenced_by));
            }
            let invoices = invoices
                .into_iter()
                .map(|mut i| {
                    i.unlink_order();
                    i
                })
                .collect();
            self.invoices.update_all(invoices)?;
        }

        self.orders.delete(id)?;
        info!(number = %order.label(), policy = ?policy, "Deleted sales order");
        Ok(())
    }

    pub fn delete_invoice(&self, id: &str, policy: DeletePolicy) -> EngineResult<()> {
        let invoice = self.invoices.require(id)?;
        let notes = match invoice.document_number.as_deref() {
            Some(number) => self
                .deliveries
                .find_all(|n| n.ref_invoice_number.as_deref() == Some(number))?,
            None => Vec::new(),
        };

        if !notes.is_empty() {
            if policy == DeletePolicy::Refuse {
                let referenced_by = notes
                    .iter()
                    .map(|n| n.delivery_number.clone().or_else(|| n.id.clone()).unwrap_or_default())
                    .collect();
                return Err(still_referenced(DocumentKind::Invoice, invoice.label(), referenced_by));
            }
            let notes = notes
                .into_iter()
                .map(|mut n| {
                    n.ref_invoice_number = None;
                    n
                })
                .collect();
            self.deliveries.update_all(notes)?;
        }

        self.invoices.delete(id)?;
        info!(number = %invoice.label(), policy = ?policy, "Deleted invoice");
        Ok(())
    }

    // =========================================================================
    // Conflict Recovery
    // =========================================================================

    /// "Reload and retry": reloads the stored document and replays the local
    /// edits on top of it. Saving the result succeeds unless someone else
    /// wrote again in between.
    pub fn rebase_after_conflict<S: StatusMachine>(
        &self,
        local: CommercialDocument<S>,
    ) -> EngineResult<CommercialDocument<S>>
    where
        Self: RepositoryFor<CommercialDocument<S>>,
    {
        let id = local
            .id
            .clone()
            .ok_or_else(|| EngineError::Internal(format!("cannot rebase an unsaved {}", S::KIND)))?;
        let latest = self.store::<S>().require(&id)?;
        info!(
            kind = %S::KIND,
            id = %id,
            from_version = local.version,
            to_version = latest.version,
            "Rebasing local edits after conflict"
        );
        Ok(local.rebase_onto(&latest))
    }
}

fn still_referenced(kind: DocumentKind, number: String, referenced_by: Vec<String>) -> EngineError {
    warn!(kind = %kind, number = %number, referenced_by = ?referenced_by, "Deletion refused");
    CoreError::StillReferenced {
        kind,
        number,
        referenced_by,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use niaga_core::{CatalogProduct, DiscountSpec, InvoiceStatus, Money, Percent, QuotationStatus, SideEffect, TaxMode};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
    }

    fn service() -> DocumentService {
        DocumentService::in_memory(EngineConfig::default())
    }

    fn saved_quotation(service: &DocumentService) -> Quotation {
        let mut quotation: Quotation = service.new_document(date(), "cust-1");
        quotation.lines = vec![
            LineItem::new("Meja", Quantity::whole(2), "unit", Money::from_units(50_000)),
            LineItem::new("Kursi", Quantity::whole(4), "unit", Money::from_units(25_000))
                .with_discount(DiscountSpec::percent(Percent::whole(10))),
        ];
        quotation.extra_discount = DiscountSpec::amount(Money::from_units(5_000));
        quotation.tax_mode = TaxMode::Ppn11Exclusive;
        service.save_quotation(quotation).unwrap().document
    }

    fn saved_order(service: &DocumentService) -> SalesOrder {
        let quotation = saved_quotation(service);
        let order = service
            .create_order_from_quotation(&DocumentRef::by_id(quotation.id.unwrap()), date())
            .unwrap();
        service.save_sales_order(order).unwrap().document
    }

    fn saved_invoice(service: &DocumentService) -> Invoice {
        let order = saved_order(service);
        let generated = service.generate_invoice_from_order(order.id.as_deref().unwrap(), date()).unwrap();
        service.save_invoice(generated.invoice).unwrap().document
    }

    fn saved_delivery(service: &DocumentService) -> DeliveryNote {
        let invoice = saved_invoice(service);
        let note = service
            .create_delivery_note_from_invoice(invoice.id.as_deref().unwrap(), date())
            .unwrap();
        service.save_delivery_note(note).unwrap().document
    }

    struct Catalog(Vec<CatalogProduct>);

    impl ProductCatalogLookup for Catalog {
        fn product_by_id(&self, id: &str) -> Option<CatalogProduct> {
            self.0.iter().find(|p| p.id == id).cloned()
        }

        fn search_products(&self, query: &str) -> Vec<CatalogProduct> {
            self.0.iter().filter(|p| p.name.contains(query)).cloned().collect()
        }
    }

    #[test]
    fn test_first_save_numbers_and_versions() {
        let service = service();
        let quotation = saved_quotation(&service);
        assert_eq!(quotation.document_number.as_deref(), Some("QUO/2024/05/0001"));
        assert_eq!(quotation.version, 1);

        let again = service.save_quotation(quotation).unwrap().document;
        assert_eq!(again.document_number.as_deref(), Some("QUO/2024/05/0001"));
        assert_eq!(again.version, 2);
    }

    #[test]
    fn test_save_rejects_invalid_document() {
        let service = service();
        let order: SalesOrder = service.new_document(date(), "");
        let err = service.save_sales_order(order).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.field(), Some("customer_id"));
        assert_eq!(service.orders.count().unwrap(), 0);
    }

    #[test]
    fn test_new_document_uses_default_tax_mode() {
        let mut config = EngineConfig::default();
        config.pricing.default_tax_mode = TaxMode::Ppn12Exclusive;
        let service = DocumentService::in_memory(config);
        let invoice: Invoice = service.new_document(date(), "cust-1");
        assert_eq!(invoice.tax_mode, TaxMode::Ppn12Exclusive);
    }

    #[test]
    fn test_document_from_input_validates_payload() {
        let service = service();
        let input = DocumentInput::from_json(
            r#"{"customer": "c-1", "items": [{"name": "Kabel", "qty": 1.5, "unitPrice": 10000}],
                "extraDiscount": 150, "extraDiscountKind": "percent"}"#,
        )
        .unwrap();
        let err = service.document_from_input::<SalesOrderStatus>(input, date()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(service.orders.count().unwrap(), 0);

        let input = DocumentInput::from_json(
            r#"{"customer": "c-1", "items": [{"name": "Kabel", "qty": 1.5, "unitPrice": 10000}]}"#,
        )
        .unwrap();
        let order: SalesOrder = service.document_from_input(input, date()).unwrap();
        let saved = service.save_sales_order(order).unwrap().document;
        assert_eq!(saved.totals().subtotal.units(), 15_000);
    }

    #[test]
    fn test_line_from_catalog() {
        let catalog = Catalog(vec![CatalogProduct {
            id: "p-1".to_string(),
            name: "Kertas A4".to_string(),
            sku: Some("KRT-A4".to_string()),
            unit_price: Money::from_units(52_000),
            unit: "rim".to_string(),
            description: None,
        }]);
        let service = service();
        let line = service.line_from_catalog(&catalog, "p-1", Quantity::whole(3)).unwrap();
        assert_eq!(line.description, "Kertas A4");
        assert_eq!(line.amounts().net.units(), 156_000);

        let err = service.line_from_catalog(&catalog, "p-9", Quantity::whole(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_order_copies_quotation_lines_as_snapshot() {
        let service = service();
        let mut quotation = saved_quotation(&service);
        let order = service
            .create_order_from_quotation(&DocumentRef::by_number("QUO/2024/05/0001"), date())
            .unwrap();

        assert_eq!(order.customer_id, "cust-1");
        assert_eq!(order.lines.len(), 2);
        assert!(order.lines.iter().all(|l| l.discount.is_none()));
        assert_eq!(order.extra_discount, DiscountSpec::none());
        assert_eq!(order.tax_mode, TaxMode::None);
        assert_eq!(order.linked_quotation_id, quotation.id);
        assert_eq!(order.status, SalesOrderStatus::Draft);
        let order = service.save_sales_order(order).unwrap().document;

        // Repricing the quotation leaves the order alone
        quotation.lines[0].unit_price = Money::from_units(99_000);
        service.save_quotation(quotation).unwrap();
        let stored: SalesOrder = service.get(order.id.as_deref().unwrap()).unwrap();
        assert_eq!(stored.lines[0].unit_price.units(), 50_000);
    }

    #[test]
    fn test_order_from_unknown_quotation_is_link_error() {
        let service = service();
        let err = service
            .create_order_from_quotation(&DocumentRef::by_id("missing"), date())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::LinkUnresolved);
        assert!(!err.is_blocking());
    }

    #[test]
    fn test_unresolved_link_is_a_warning() {
        let service = service();
        let mut order: SalesOrder = service.new_document(date(), "cust-1");
        order.lines.push(LineItem::new("Meja", Quantity::whole(1), "unit", Money::from_units(50_000)));
        order.linked_quotation_number = Some("QUO/1999/01/0001".to_string());

        let outcome = service.save_sales_order(order).unwrap();
        assert!(outcome.document.is_saved());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code, ErrorCode::LinkUnresolved);

        let status = service.linked_refs_status(&outcome.document);
        assert_eq!(status.quotation_resolved, Some(false));
        assert_eq!(status.order_resolved, None);
    }

    #[test]
    fn test_generate_invoice_forces_approved() {
        let service = service();
        let order = saved_order(&service);
        let generated = service.generate_invoice_from_order(order.id.as_deref().unwrap(), date()).unwrap();

        assert_eq!(generated.order.status, SalesOrderStatus::Approved);
        assert_eq!(
            generated.transition.side_effects,
            vec![SideEffect::ForcedApproved, SideEffect::InvoiceDraftPrepared]
        );
        let stored: SalesOrder = service.get(order.id.as_deref().unwrap()).unwrap();
        assert_eq!(stored.status, SalesOrderStatus::Approved);

        let invoice = generated.invoice;
        assert!(!invoice.is_saved());
        assert_eq!(invoice.linked_order_id, order.id);
        assert_eq!(invoice.linked_quotation_id, order.linked_quotation_id);
        assert_eq!(invoice.lines, order.lines);

        let saved = service.save_invoice(invoice).unwrap();
        assert!(saved.warnings.is_empty());
        let status = service.linked_refs_status(&saved.document);
        assert_eq!(status.quotation_resolved, Some(true));
        assert_eq!(status.order_resolved, Some(true));
    }

    #[test]
    fn test_generate_invoice_from_invalid_order_changes_nothing() {
        let service = service();
        let order = saved_order(&service);
        let mut broken = order.clone();
        broken.lines[0].quantity = Quantity::whole(-1);
        let broken = service.orders.update(broken).unwrap();

        let err = service.generate_invoice_from_order(broken.id.as_deref().unwrap(), date()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        let stored: SalesOrder = service.get(order.id.as_deref().unwrap()).unwrap();
        assert_eq!(stored.status, SalesOrderStatus::Draft);
        assert_eq!(stored.version, broken.version);
    }

    #[test]
    fn test_send_and_user_transitions() {
        let service = service();
        let order = saved_order(&service);
        let id = order.id.as_deref().unwrap();

        let sent = service.send_order(id, SendChannel::WhatsApp).unwrap();
        assert_eq!(sent.new_status, SalesOrderStatus::Sent);
        assert_eq!(sent.side_effects, vec![SideEffect::SentViaWhatsapp]);

        let declined = service.transition_order(id, "declined").unwrap();
        assert_eq!(declined.new_status, SalesOrderStatus::Declined);

        let err = service.transition_order(id, "Shipped").unwrap_err();
        assert_eq!(err.code(), ErrorCode::IllegalTransition);
        let stored: SalesOrder = service.get(id).unwrap();
        assert_eq!(stored.status, SalesOrderStatus::Declined);

        let quotation = service.quotations.list().unwrap().remove(0);
        let accepted = service
            .transition_quotation(quotation.id.as_deref().unwrap(), "Accepted")
            .unwrap();
        assert_eq!(accepted.new_status, QuotationStatus::Accepted);

        let invoice = saved_invoice(&service);
        let paid = service.transition_invoice(invoice.id.as_deref().unwrap(), "Paid").unwrap();
        assert_eq!(paid.new_status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_delivery_note_from_invoice() {
        let service = service();
        let note = saved_delivery(&service);
        assert_eq!(note.delivery_number.as_deref(), Some("SJ/2024/05/0001"));
        assert_eq!(note.ref_invoice_number.as_deref(), Some("INV/2024/05/0001"));
        assert_eq!(note.items.len(), 2);
        assert_eq!(note.items[1].name, "Kursi");
        assert_eq!(note.items[1].qty, Quantity::whole(4));
    }

    #[test]
    fn test_delivery_requires_proof_of_receipt() {
        let service = service();
        let note = saved_delivery(&service);
        let id = note.id.as_deref().unwrap();

        assert!(service.transition_delivery(id, "Dikirim").unwrap().is_applied());

        let err = service.transition_delivery(id, "Draft").unwrap_err();
        assert_eq!(err.code(), ErrorCode::IllegalTransition);

        let outcome = service.transition_delivery(id, "Diterima").unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::AwaitingProofOfReceipt {
                current: DeliveryStatus::Dikirim
            }
        );
        let stored: DeliveryNote = service.get(id).unwrap();
        assert_eq!(stored.status, DeliveryStatus::Dikirim);

        assert!(service.attach_proof_of_receipt(id, "  ").is_err());
        let received = service.attach_proof_of_receipt(id, "uploads/pod-1.jpg").unwrap();
        assert_eq!(received.new_status, DeliveryStatus::Diterima);
        assert_eq!(received.side_effects, vec![SideEffect::ProofOfReceiptAttached]);
        let stored: DeliveryNote = service.get(id).unwrap();
        assert_eq!(stored.attachment_ref.as_deref(), Some("uploads/pod-1.jpg"));
    }

    #[test]
    fn test_delivery_without_proof_requirement() {
        let mut config = EngineConfig::default();
        config.delivery.require_proof_of_receipt = false;
        let service = DocumentService::in_memory(config);
        let note = saved_delivery(&service);
        let id = note.id.as_deref().unwrap();

        service.transition_delivery(id, "Dikirim").unwrap();
        let outcome = service.transition_delivery(id, "Diterima").unwrap();
        assert!(outcome.is_applied());
        let stored: DeliveryNote = service.get(id).unwrap();
        assert_eq!(stored.status, DeliveryStatus::Diterima);
    }

    #[test]
    fn test_cancel_shipped_delivery() {
        let service = service();
        let note = saved_delivery(&service);
        let id = note.id.as_deref().unwrap();
        service.transition_delivery(id, "Dikirim").unwrap();

        let cancelled = service.cancel_delivery(id).unwrap();
        assert_eq!(cancelled.new_status, DeliveryStatus::Dibatalkan);
        assert_eq!(cancelled.side_effects, vec![SideEffect::DeliveryCancelled]);

        let again = service.cancel_delivery(id).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn test_delete_referenced_quotation() {
        let service = service();
        let order = saved_order(&service);
        let quotation_id = order.linked_quotation_id.clone().unwrap();

        let err = service.delete_quotation(&quotation_id, DeletePolicy::Refuse).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StillReferenced);
        assert!(err.to_string().contains("SO/2024/05/0001"));
        assert_eq!(service.quotations.count().unwrap(), 1);

        service.delete_quotation(&quotation_id, DeletePolicy::CascadeUnlink).unwrap();
        assert_eq!(service.quotations.count().unwrap(), 0);
        let stored: SalesOrder = service.get(order.id.as_deref().unwrap()).unwrap();
        assert!(!stored.linked_refs().has_quotation());
        assert_eq!(stored.lines, order.lines);
    }

    #[test]
    fn test_cascade_unlink_is_all_or_nothing() {
        let service = service();
        let invoice = saved_invoice(&service);
        let order: SalesOrder = service.get(invoice.linked_order_id.as_deref().unwrap()).unwrap();
        assert!(invoice.linked_refs().has_quotation());

        // Someone saves the invoice after our copies were loaded
        service.save_invoice(invoice.clone()).unwrap();

        let err = service
            .unlink_quotation_from(vec![order.clone()], vec![invoice.clone()])
            .unwrap_err();
        assert!(err.is_conflict());

        // The order was checked first but nothing was written
        let stored: SalesOrder = service.get(order.id.as_deref().unwrap()).unwrap();
        assert!(stored.linked_refs().has_quotation());
        assert_eq!(stored.version, order.version);

        let quotation_id = order.linked_quotation_id.clone().unwrap();
        service.delete_quotation(&quotation_id, DeletePolicy::CascadeUnlink).unwrap();
        let stored: SalesOrder = service.get(order.id.as_deref().unwrap()).unwrap();
        assert!(!stored.linked_refs().has_quotation());
        let stored: Invoice = service.get(invoice.id.as_deref().unwrap()).unwrap();
        assert!(!stored.linked_refs().has_quotation());
        assert_eq!(stored.version, invoice.version + 2);
    }

    #[test]
    fn test_delete_referenced_order_and_invoice() {
        let service = service();
        let note = saved_delivery(&service);
        let invoice = service.invoices.list().unwrap().remove(0);
        let order_id = invoice.linked_order_id.clone().unwrap();

        assert!(service.delete_sales_order(&order_id, DeletePolicy::Refuse).is_err());
        service.delete_sales_order(&order_id, DeletePolicy::CascadeUnlink).unwrap();
        let stored: Invoice = service.get(invoice.id.as_deref().unwrap()).unwrap();
        assert!(!stored.linked_refs().has_order());
        assert!(stored.linked_refs().has_quotation());

        let invoice_id = invoice.id.as_deref().unwrap();
        let err = service.delete_invoice(invoice_id, DeletePolicy::Refuse).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StillReferenced);
        service.delete_invoice(invoice_id, DeletePolicy::CascadeUnlink).unwrap();
        let stored: DeliveryNote = service.get(note.id.as_deref().unwrap()).unwrap();
        assert_eq!(stored.ref_invoice_number, None);
    }

    #[test]
    fn test_unreferenced_delete() {
        let service = service();
        let quotation = saved_quotation(&service);
        service
            .delete_quotation(quotation.id.as_deref().unwrap(), DeletePolicy::Refuse)
            .unwrap();
        let err = service
            .delete_quotation(quotation.id.as_deref().unwrap(), DeletePolicy::Refuse)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_conflict_then_rebase_keeps_local_edits() {
        let service = service();
        let order = saved_order(&service);
        let id = order.id.clone().unwrap();

        // Someone else confirms the order
        service.transition_order(&id, "Confirmed").unwrap();

        // Our stale copy has line edits
        let mut local = order;
        local.lines[0].quantity = Quantity::whole(7);
        let err = service.save_sales_order(local.clone()).unwrap_err();
        assert!(err.is_conflict());

        let rebased = service.rebase_after_conflict(local).unwrap();
        assert_eq!(rebased.status, SalesOrderStatus::Confirmed);
        let saved = service.save_sales_order(rebased).unwrap().document;
        assert_eq!(saved.lines[0].quantity, Quantity::whole(7));
        assert_eq!(saved.status, SalesOrderStatus::Confirmed);
        assert_eq!(saved.version, 3);
    }

    #[test]
    fn test_preview_totals_matches_document() {
        let service = service();
        let quotation = saved_quotation(&service);
        let totals = service.preview_totals(&quotation);
        // 100000 + (100000 - 10%) = 190000, -5000 extra, +11%
        assert_eq!(totals.subtotal.units(), 200_000);
        assert_eq!(totals.after_extra_discount.units(), 185_000);
        assert_eq!(totals.grand_total.units(), 205_350);
    }
}
