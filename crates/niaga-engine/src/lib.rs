//! # niaga-engine: Service Layer for Niaga
//!
//! Wraps the pure rules of `niaga-core` with everything that touches the
//! outside world: payload parsing, configuration, logging, storage and
//! document numbering.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Niaga Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Sales UI (forms, pickers, badges)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON payloads                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ niaga-engine (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   normalize ──► service ──► repository                          │   │
//! │  │                    │    └──► numbering                          │   │
//! │  │   config · logging · error (ApiError)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        niaga-core: pricing, links, status machines              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`normalize`] - Lenient payload types producing the strict core model
//! - [`service`] - [`DocumentService`], the façade the UI calls
//! - [`repository`] - Versioned in-memory document storage
//! - [`numbering`] - Monthly sequential document numbers
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - `tracing` subscriber setup
//! - [`error`] - Engine errors and the serializable [`ApiError`]

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod numbering;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::EngineConfig;
pub use error::{ApiError, EngineError, EngineResult, ErrorCode};
pub use logging::init_tracing;
pub use normalize::{DocumentInput, LineInput};
pub use numbering::SequentialNumberIssuer;
pub use repository::{Batch, InMemoryRepository, Stored};
pub use service::{DeletePolicy, DocumentService, InvoiceGeneration, LinkStatus, SaveOutcome};
