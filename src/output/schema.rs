//! Schema unification
//!
//! Records collected concurrently carry different field sets and arrive in no
//! particular order. Unification fixes one column order for the whole run and
//! back-fills every record to it.
//!
//! # Column Order
//!
//! 1. `identifier`
//! 2. `title`, if any record has it
//! 3. Every other field name, sorted by byte order
//!
//! The order depends only on the set of names observed, so the same records
//! in any completion order produce the same header.

use crate::extract::{Record, IDENTIFIER_FIELD, TITLE_FIELD};
use std::collections::BTreeSet;

/// A rectangular set of records sharing one schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    schema: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Column names in order
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Rows, each holding exactly the schema's fields in schema order
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Computes the schema of `records` and back-fills missing fields with ""
///
/// The row count always equals the input record count and rows keep their
/// input order.
pub fn unify(records: Vec<Record>) -> Table {
    let schema = build_schema(&records);
    let rows = records
        .into_iter()
        .map(|record| record.conform(&schema))
        .collect();

    Table { schema, rows }
}

/// Builds the ordered column list for a set of records
pub fn build_schema(records: &[Record]) -> Vec<String> {
    let mut has_title = false;
    let mut others = BTreeSet::new();

    for name in records.iter().flat_map(Record::field_names) {
        match name {
            IDENTIFIER_FIELD => {}
            TITLE_FIELD => has_title = true,
            other => {
                others.insert(other);
            }
        }
    }

    let mut schema = vec![IDENTIFIER_FIELD.to_string()];
    if has_title {
        schema.push(TITLE_FIELD.to_string());
    }
    schema.extend(others.into_iter().map(str::to_string));
    schema
}
