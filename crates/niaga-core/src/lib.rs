//! # niaga-core: Pricing and Document Lifecycle for Niaga
//!
//! This crate is the **heart** of Niaga. It turns line items and
//! document-level adjustments into a payable total, and it owns the rules
//! for how Quotations, Sales Orders, Invoices and Delivery Notes link to
//! each other and move between statuses.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Niaga Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Sales UI (forms, pickers, badges)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    niaga-engine                                 │   │
//! │  │   normalize ─► DocumentService ─► repository / numbering       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ niaga-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐         │   │
//! │  │   │   line   │ │  totals  │ │   tax    │ │   link   │         │   │
//! │  │   │ discount │ │          │ │          │ │ document │         │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘         │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐                      │   │
//! │  │   │  status  │ │validation│ │  ports   │                      │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘                      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO LOGGING • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Whole-rupiah `Money` with half-up ratio rounding
//! - [`types`] - `TaxRate`, `Percent`, `DocumentKind`, `CatalogProduct`
//! - [`discount`] - `DiscountSpec`, the single clamping rule
//! - [`line`] - LineItem Calculator
//! - [`tax`] - Tax Policy Resolver
//! - [`totals`] - Document Totals Aggregator
//! - [`document`] - Commercial documents and the Delivery Note
//! - [`link`] - Document Link Graph
//! - [`status`] - Status State Machines
//! - [`ports`] - Collaborator interfaces
//! - [`validation`] - Submit-time rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; safe from concurrent renders
//! 2. **No I/O**: persistence, numbering and fetching sit behind [`ports`]
//! 3. **Integer Money**: whole rupiah, rounded half-up where it is computed
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use niaga_core::{compute_totals, DiscountSpec, LineItem, Money, Percent, Quantity, TaxMode};
//!
//! let lines = vec![LineItem::new("Meja", Quantity::whole(2), "unit", Money::from_units(50_000))];
//! let totals = compute_totals(
//!     &lines,
//!     &DiscountSpec::percent(Percent::whole(10)),
//!     Money::from_units(5_000),
//!     TaxMode::Ppn11Exclusive,
//!     Money::from_units(50_000),
//! );
//! assert_eq!(totals.grand_total.units(), 55_450);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod document;
pub mod error;
pub mod line;
pub mod link;
pub mod money;
pub mod ports;
pub mod status;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{DiscountKind, DiscountSpec};
pub use document::{
    CommercialDocument, DeliveryItem, DeliveryNote, Invoice, LinkedDocumentRefs, Quotation, SalesOrder,
};
pub use error::{
    CoreError, CoreResult, IllegalTransitionError, LinkResolutionError, ValidationError, ValidationResult,
};
pub use line::{compute_line, LineAmounts, LineItem};
pub use link::{
    link_order_to_invoice_draft, link_quotation_to_order, resolve_link, DocumentRef, DraftHandoff,
    QuotationSnapshot, Resolved, ResolvedBy,
};
pub use money::Money;
pub use ports::{DocumentLookup, DocumentNumberIssuer, ProductCatalogLookup, QuotationFetch};
pub use status::{
    DeliveryStatus, InvoiceStatus, QuotationStatus, SalesOrderStatus, SideEffect, StatusMachine,
    TransitionOutcome, TransitionResult,
};
pub use tax::{resolve_tax, TaxMode, TaxResolution};
pub use totals::{compute_totals, TotalsBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines on a single document.
///
/// Catches runaway pastes; real orders stay far below it.
pub const MAX_DOCUMENT_LINES: usize = 500;

/// Maximum characters in a line description or delivery item name.
pub const MAX_DESCRIPTION_LEN: usize = 500;
