//! ToolFields Development Tools
//!
//! Support code for running field migrations outside the app against
//! exported data.
//!
//! - [`json_store`] - `EntryStore` backed by a JSON file of entries
//! - [`report`] - Printable summaries of planned and applied migrations

pub mod json_store;
pub mod report;

pub use json_store::JsonFileStore;
pub use report::{DryRunReport, PlannedEntry};
