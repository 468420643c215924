//! Message types for actor communication
//!
//! Message handlers are implemented in their respective actor modules.

use std::collections::HashMap;

use kameo_macros::Reply;
use serde::Serialize;

use crate::column::Row;

// ============================================================================
// AggregatorActor Messages
// ============================================================================

/// Store a completed host's row
#[derive(Debug)]
pub struct RecordRow {
    /// Host the row belongs to
    pub host: String,
    /// Fully resolved columns
    pub row: Row,
}

/// Move the collected rows out of the aggregator
#[derive(Debug)]
pub struct TakeAggregate;

/// Completed mapping from host to row
///
/// Iteration order is arbitrary; use [`ResultAggregate::rows_in_order`] to
/// follow the configured host list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Reply)]
#[serde(transparent)]
pub struct ResultAggregate {
    rows: HashMap<String, Row>,
}

impl ResultAggregate {
    /// Wrap an existing map
    #[must_use]
    pub fn from_rows(rows: HashMap<String, Row>) -> Self {
        Self { rows }
    }

    /// Row for `host`, if it completed
    #[must_use]
    pub fn get(&self, host: &str) -> Option<&Row> {
        self.rows.get(host)
    }

    /// Whether `host` completed
    #[must_use]
    pub fn contains(&self, host: &str) -> bool {
        self.rows.contains_key(host)
    }

    /// Number of hosts with a row
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no host completed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hosts in arbitrary order
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Rows following `hosts`, skipping hosts without a row
    pub fn rows_in_order<'a>(
        &'a self,
        hosts: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a Row)> + 'a {
        hosts
            .iter()
            .filter_map(|host| self.rows.get(host).map(|row| (host.as_str(), row)))
    }
}
