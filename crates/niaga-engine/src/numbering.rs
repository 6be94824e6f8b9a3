//! # Document Numbering
//!
//! Issues human-readable document numbers, one sequence per kind per month.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   QUO / 2024 / 05 / 0007                                                │
//! │    │     │     │     └── sequence, zero-padded to `sequence_width`     │
//! │    │     │     └──────── month of the document date                    │
//! │    │     └────────────── year of the document date                     │
//! │    └──────────────────── prefix for the kind (configurable)            │
//! │                                                                         │
//! │   The sequence restarts at 1 every month.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Datelike, NaiveDate};

use niaga_core::{DocumentKind, DocumentNumberIssuer};

use crate::config::NumberingSettings;

type SequenceKey = (DocumentKind, i32, u32);

/// Monthly sequential numbers, kept in memory.
#[derive(Debug)]
pub struct SequentialNumberIssuer {
    settings: NumberingSettings,
    counters: Mutex<HashMap<SequenceKey, u32>>,
}

impl SequentialNumberIssuer {
    pub fn new(settings: NumberingSettings) -> Self {
        SequentialNumberIssuer {
            settings,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Continues an existing sequence, e.g. after loading stored documents.
    /// The next number issued for that month is `last + 1`.
    pub fn seed(&self, kind: DocumentKind, date: NaiveDate, last: u32) {
        let mut counters = self.counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let counter = counters.entry((kind, date.year(), date.month())).or_insert(0);
        *counter = (*counter).max(last);
    }

    fn format(&self, kind: DocumentKind, date: NaiveDate, sequence: u32) -> String {
        let sep = &self.settings.separator;
        format!(
            "{prefix}{sep}{year}{sep}{month:02}{sep}{sequence:0width$}",
            prefix = self.settings.prefix_for(kind),
            year = date.year(),
            month = date.month(),
            width = self.settings.sequence_width,
        )
    }
}

impl DocumentNumberIssuer for SequentialNumberIssuer {
    fn issue(&self, kind: DocumentKind, date: NaiveDate) -> String {
        let sequence = {
            // A panic elsewhere cannot leave a half-written counter behind
            let mut counters = self.counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let counter = counters.entry((kind, date.year(), date.month())).or_insert(0);
            *counter += 1;
            *counter
        };
        self.format(kind, date, sequence)
    }
}
