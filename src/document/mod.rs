//! Document schema and data structures module
//!
//! This module provides the structural model of a sectioned document and the
//! operations for reading, writing, and querying it.

pub(crate) mod io;
pub mod models;
pub mod query;

// Re-export all models and query functions
pub use io::{read_document, write_document};
pub use models::*;
pub use query::*;
