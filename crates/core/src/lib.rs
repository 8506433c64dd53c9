//! Domain logic shared by the database and HTTP layers.
//!
//! Nothing in this crate performs I/O. Every filter, sort key and grouping
//! value that reaches a SQL statement is parsed into one of the enums defined
//! here first, so the query builders only ever branch on validated values.

pub mod error;
pub mod ledger;
pub mod pagination;
pub mod settings;
pub mod sorting;
pub mod telemetry;
pub mod text;
pub mod types;
pub mod watchlist;
