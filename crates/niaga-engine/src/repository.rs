//! # Document Repository
//!
//! In-memory storage for every document kind, with optimistic concurrency.
//!
//! ## Versioning
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Versioned Updates Work                           │
//! │                                                                         │
//! │  insert(doc)            → stored with version = 1                      │
//! │                                                                         │
//! │  User A loads v1 ─┐                                                     │
//! │  User B loads v1 ─┤                                                     │
//! │                   │                                                     │
//! │  A: update(v1)    ├──► matches stored v1 → saved as v2                 │
//! │  B: update(v1)    └──► stored is v2      → ConcurrencyConflict          │
//! │                                            (B reloads, keeps edits,    │
//! │                                             retries on top of v2)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The repository also serves as the [`DocumentLookup`] the link resolver
//! queries by id or by number.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use uuid::Uuid;

use niaga_core::{CommercialDocument, CoreError, DeliveryNote, DocumentKind, DocumentLookup, StatusMachine};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Stored Trait
// =============================================================================

/// A document the repository can key by id, find by number, and version.
pub trait Stored: Clone {
    const KIND: DocumentKind;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
    fn number(&self) -> Option<&str>;
    fn set_number(&mut self, number: String);
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}

impl<S: StatusMachine> Stored for CommercialDocument<S> {
    const KIND: DocumentKind = S::KIND;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    fn set_number(&mut self, number: String) {
        self.document_number = Some(number);
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl Stored for DeliveryNote {
    const KIND: DocumentKind = DocumentKind::DeliveryNote;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn number(&self) -> Option<&str> {
        self.delivery_number.as_deref()
    }

    fn set_number(&mut self, number: String) {
        self.delivery_number = Some(number);
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

// =============================================================================
// In-Memory Repository
// =============================================================================

/// Thread-safe, versioned document storage.
///
/// ## Usage
/// ```rust
/// use chrono::NaiveDate;
/// use niaga_core::SalesOrder;
/// use niaga_engine::repository::InMemoryRepository;
///
/// let repo = InMemoryRepository::<SalesOrder>::new();
/// let date = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
///
/// let saved = repo.insert(SalesOrder::new(date, "cust-1")).unwrap();
/// assert_eq!(saved.version, 1);
///
/// let updated = repo.update(saved).unwrap();
/// assert_eq!(updated.version, 2);
/// ```
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    documents: RwLock<HashMap<String, T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        InMemoryRepository {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Stored> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, HashMap<String, T>>> {
        self.documents
            .read()
            .map_err(|_| EngineError::Internal(format!("{} store lock poisoned", T::KIND)))
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, HashMap<String, T>>> {
        self.documents
            .write()
            .map_err(|_| EngineError::Internal(format!("{} store lock poisoned", T::KIND)))
    }

    /// Gets a document by its id.
    pub fn get_by_id(&self, id: &str) -> EngineResult<Option<T>> {
        Ok(self.read()?.get(id).cloned())
    }

    /// Gets a document by id, failing with `NotFound` if absent.
    pub fn require(&self, id: &str) -> EngineResult<T> {
        self.get_by_id(id)?.ok_or_else(|| EngineError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    /// Gets a document by its human-readable number.
    pub fn get_by_number(&self, number: &str) -> EngineResult<Option<T>> {
        Ok(self.read()?.values().find(|doc| doc.number() == Some(number)).cloned())
    }

    /// Stores a new document at version 1. Assigns an id if it has none.
    pub fn insert(&self, mut document: T) -> EngineResult<T> {
        let id = match document.id() {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                document.set_id(id.clone());
                id
            }
        };

        let mut documents = self.write()?;
        if documents.contains_key(&id) {
            return Err(EngineError::Internal(format!("{} {} already exists", T::KIND, id)));
        }
        document.set_version(1);
        documents.insert(id.clone(), document.clone());

        debug!(kind = %T::KIND, id = %id, "Inserted document");
        Ok(document)
    }

    /// Replaces a stored document if its version still matches.
    ///
    /// ## Errors
    /// - `NotFound` when the id is unknown
    /// - `ConcurrencyConflict` when the stored version moved on
    pub fn update(&self, document: T) -> EngineResult<T> {
        let mut batch = self.batch()?;
        batch.check(std::slice::from_ref(&document))?;
        batch
            .apply(vec![document])
            .pop()
            .ok_or_else(|| EngineError::Internal(format!("{} update wrote nothing", T::KIND)))
    }

    /// Replaces several documents as one write: if any version is stale
    /// nothing is written.
    pub fn update_all(&self, documents: Vec<T>) -> EngineResult<Vec<T>> {
        let mut batch = self.batch()?;
        batch.check(&documents)?;
        Ok(batch.apply(documents))
    }

    /// Holds the store's write lock for a multi-document write.
    pub fn batch(&self) -> EngineResult<Batch<'_, T>> {
        Ok(Batch {
            documents: self.write()?,
        })
    }

    /// Removes a document. Returns false if it was not stored.
    pub fn delete(&self, id: &str) -> EngineResult<bool> {
        let removed = self.write()?.remove(id).is_some();
        if removed {
            debug!(kind = %T::KIND, id = %id, "Deleted document");
        }
        Ok(removed)
    }

    /// All documents, ordered by number (unnumbered last) then id.
    pub fn list(&self) -> EngineResult<Vec<T>> {
        let mut documents: Vec<T> = self.read()?.values().cloned().collect();
        documents.sort_by(|a, b| {
            (a.number().is_none(), a.number(), a.id()).cmp(&(b.number().is_none(), b.number(), b.id()))
        });
        Ok(documents)
    }

    /// Every stored document matching `predicate`.
    pub fn find_all(&self, predicate: impl Fn(&T) -> bool) -> EngineResult<Vec<T>> {
        Ok(self.list()?.into_iter().filter(|doc| predicate(doc)).collect())
    }

    pub fn count(&self) -> EngineResult<usize> {
        Ok(self.read()?.len())
    }
}

// =============================================================================
// Batch Writes
// =============================================================================

/// Exclusive access to one store while several documents are rewritten.
///
/// Callers touching more than one store lock them in document-chain order
/// (quotations, orders, invoices, deliveries), `check` every batch, and only
/// then `apply`.
pub struct Batch<'a, T> {
    documents: RwLockWriteGuard<'a, HashMap<String, T>>,
}

impl<T: Stored> Batch<'_, T> {
    /// Verifies every update against the stored versions without writing.
    ///
    /// ## Errors
    /// - `NotFound` when an id is unknown
    /// - `ConcurrencyConflict` for the first stale version
    pub fn check(&self, updates: &[T]) -> EngineResult<()> {
        for document in updates {
            let id = document
                .id()
                .ok_or_else(|| EngineError::Internal(format!("cannot update an unsaved {}", T::KIND)))?;
            let stored = self.documents.get(id).ok_or_else(|| EngineError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })?;
            if stored.version() != document.version() {
                return Err(CoreError::ConcurrencyConflict {
                    kind: T::KIND,
                    id: id.to_string(),
                    expected: document.version(),
                    actual: stored.version(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Writes checked updates, each at its stored version + 1.
    pub fn apply(&mut self, updates: Vec<T>) -> Vec<T> {
        updates
            .into_iter()
            .filter_map(|mut document| {
                let id = document.id()?.to_string();
                let version = self.documents.get(&id).map_or(0, Stored::version) + 1;
                document.set_version(version);
                self.documents.insert(id.clone(), document.clone());
                debug!(kind = %T::KIND, id = %id, version, "Updated document");
                Some(document)
            })
            .collect()
    }
}

impl<T: Stored> DocumentLookup<T> for InMemoryRepository<T> {
    fn find_by_id(&self, id: &str) -> Option<T> {
        self.get_by_id(id).ok().flatten()
    }

    fn find_by_number(&self, number: &str) -> Option<T> {
        self.get_by_number(number).ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use niaga_core::{DeliveryNote, Quotation, SalesOrder};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
    }

    #[test]
    fn test_insert_assigns_id_and_version() {
        let repo = InMemoryRepository::<Quotation>::new();
        let saved = repo.insert(Quotation::new(date(), "cust-1")).unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.version, 1);
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.get_by_id(saved.id.as_deref().unwrap()).unwrap(), Some(saved));
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let repo = InMemoryRepository::<SalesOrder>::new();
        let mut order = SalesOrder::new(date(), "cust-1");
        order.id = Some("o-1".to_string());
        repo.insert(order.clone()).unwrap();
        assert!(repo.insert(order).is_err());
    }

    #[test]
    fn test_stale_update_is_a_conflict() {
        let repo = InMemoryRepository::<SalesOrder>::new();
        let loaded = repo.insert(SalesOrder::new(date(), "cust-1")).unwrap();

        let mut first = loaded.clone();
        first.customer_id = "cust-2".to_string();
        let first = repo.update(first).unwrap();
        assert_eq!(first.version, 2);

        let err = repo.update(loaded).unwrap_err();
        assert!(err.is_conflict());
        match err {
            EngineError::Core(CoreError::ConcurrencyConflict { expected, actual, .. }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The winning write is untouched
        let stored = repo.require(first.id.as_deref().unwrap()).unwrap();
        assert_eq!(stored.customer_id, "cust-2");
    }

    #[test]
    fn test_update_all_writes_nothing_when_one_is_stale() {
        let repo = InMemoryRepository::<SalesOrder>::new();
        let a = repo.insert(SalesOrder::new(date(), "cust-1")).unwrap();
        let b = repo.insert(SalesOrder::new(date(), "cust-1")).unwrap();

        // b moves on behind our back
        let mut newer = b.clone();
        newer.customer_id = "cust-9".to_string();
        repo.update(newer).unwrap();

        let mut stale_a = a.clone();
        stale_a.customer_id = "cust-2".to_string();
        let mut stale_b = b;
        stale_b.customer_id = "cust-2".to_string();

        let err = repo.update_all(vec![stale_a.clone(), stale_b]).unwrap_err();
        assert!(err.is_conflict());
        let stored_a = repo.require(a.id.as_deref().unwrap()).unwrap();
        assert_eq!(stored_a.customer_id, "cust-1");
        assert_eq!(stored_a.version, 1);

        let written = repo.update_all(vec![stale_a]).unwrap();
        assert_eq!(written[0].version, 2);
        assert_eq!(written[0].customer_id, "cust-2");
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let repo = InMemoryRepository::<DeliveryNote>::new();
        let mut note = DeliveryNote::new(date());
        note.id = Some("missing".to_string());
        assert!(matches!(repo.update(note), Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_lookup_by_number_and_list_order() {
        let repo = InMemoryRepository::<Quotation>::new();
        for number in ["QUO/2024/05/0002", "QUO/2024/05/0001"] {
            let mut q = Quotation::new(date(), "cust-1");
            q.document_number = Some(number.to_string());
            repo.insert(q).unwrap();
        }
        repo.insert(Quotation::new(date(), "cust-1")).unwrap();

        let found = repo.find_by_number("QUO/2024/05/0001").unwrap();
        assert_eq!(found.document_number.as_deref(), Some("QUO/2024/05/0001"));
        assert!(repo.find_by_number("QUO/2024/05/0009").is_none());

        let numbers: Vec<Option<String>> = repo.list().unwrap().into_iter().map(|q| q.document_number).collect();
        assert_eq!(
            numbers,
            vec![
                Some("QUO/2024/05/0001".to_string()),
                Some("QUO/2024/05/0002".to_string()),
                None
            ]
        );
    }

    #[test]
    fn test_delete() {
        let repo = InMemoryRepository::<Quotation>::new();
        let saved = repo.insert(Quotation::new(date(), "cust-1")).unwrap();
        let id = saved.id.unwrap();
        assert!(repo.delete(&id).unwrap());
        assert!(!repo.delete(&id).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
    }
}
