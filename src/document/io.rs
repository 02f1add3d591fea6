//! File I/O operations and validation
//!
//! This module handles reading and writing documents in their JSON
//! serialization.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::models::Document;

/// Read a document from a JSON file.
pub fn read_document(path: &Path) -> Result<Document> {
    validate_document_file(path)?;

    let file = File::open(path)
        .with_context(|| format!("failed to open input document {}", path.display()))?;
    let document: Document = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse document JSON from {}", path.display()))?;
    Ok(document)
}

/// Write a document to a JSON file, replacing any existing content.
pub fn write_document(document: &Document, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create output document {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), document)
        .with_context(|| format!("failed to serialize document to {}", path.display()))?;
    Ok(())
}

/// Validates that the input path looks like a document JSON file.
pub(crate) fn validate_document_file(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if extension != "json" {
        bail!(
            "Invalid file format. Expected .json document file, got .{}\n\
            Note: docweave reads sectioned documents serialized as JSON.",
            extension
        );
    }

    Ok(())
}
