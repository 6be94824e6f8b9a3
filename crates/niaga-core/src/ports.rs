//! # Collaborator Ports
//!
//! The narrow interfaces the core consumes. Implementations live outside
//! the core (REST adapters, the engine's repository, test doubles).
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐   ┌──────────────────────┐
//! │ ProductCatalogLookup │   │  DocumentLookup<T>   │   │ DocumentNumberIssuer │
//! │  id | query → product│   │  id | number → doc   │   │  kind, date → "SO/…" │
//! └──────────────────────┘   └──────────────────────┘   └──────────────────────┘
//!                                       │
//!                                       ▼
//!                               QuotationFetch (blanket)
//! ```
//!
//! All methods are synchronous. Fetching over the network is the caller's
//! job; by the time the core is called the data is already resolved.

use chrono::NaiveDate;

use crate::error::LinkResolutionError;
use crate::link::{resolve_link, DocumentRef, QuotationSnapshot};
use crate::types::{CatalogProduct, DocumentKind};

/// Product picker backend.
pub trait ProductCatalogLookup {
    fn product_by_id(&self, id: &str) -> Option<CatalogProduct>;

    /// Free-text search by name or SKU.
    fn search_products(&self, query: &str) -> Vec<CatalogProduct>;
}

/// Finds a document by its id or by its natural key.
pub trait DocumentLookup<T> {
    fn find_by_id(&self, id: &str) -> Option<T>;
    fn find_by_number(&self, number: &str) -> Option<T>;
}

/// Read-only quotation snapshots for the link graph.
///
/// Implemented for every [`DocumentLookup`] of snapshots: id first, number
/// as the fallback.
pub trait QuotationFetch {
    fn fetch_quotation(&self, reference: &DocumentRef) -> Result<QuotationSnapshot, LinkResolutionError>;
}

impl<L> QuotationFetch for L
where
    L: DocumentLookup<QuotationSnapshot>,
{
    fn fetch_quotation(&self, reference: &DocumentRef) -> Result<QuotationSnapshot, LinkResolutionError> {
        resolve_link(self, DocumentKind::Quotation, reference).map(|r| r.document)
    }
}

/// Supplies the next sequential document number. The core treats the
/// returned string as opaque.
pub trait DocumentNumberIssuer {
    fn issue(&self, kind: DocumentKind, date: NaiveDate) -> String;
}
