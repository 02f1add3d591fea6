//! docweave: section-wise linguistic annotation with document-level coreference
//!
//! This library takes a document that is already split into structural
//! sections, runs per-section analysis (sentence splitting, tokenization,
//! tagging, parsing, NER), reassembles the sections into one document-level
//! annotation with globally consistent character and token offsets, runs
//! coreference over the whole, and writes tokenizations, entities, and
//! mentions back into the document's structural model.

pub mod annotation;
pub mod document;
pub mod engine;
pub mod error;
pub mod pipeline;

// Re-export commonly used types
pub use document::{Document, Section, SectionGrouping, SectionKind, TextSpan};
pub use engine::{CorefResolver, RuleEngine, SectionAnalyzer};
pub use error::PipelineError;
pub use pipeline::Pipeline;
