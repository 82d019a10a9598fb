//! Output module for turning collected records into a table
//!
//! This module handles:
//! - Unifying records into one rectangular schema
//! - Writing the table as delimited UTF-8 text
//! - Summarising the run for the operator

mod csv_writer;
mod report;
mod schema;

pub use csv_writer::{write_table, write_table_to, WriteError, WriteOptions, WriteResult};
pub use report::{print_report, HarvestReport};
pub use schema::{build_schema, unify, Table};
