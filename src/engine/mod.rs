//! Analysis engine interfaces
//!
//! The pipeline treats linguistic analysis as an external collaborator
//! behind two traits: [`SectionAnalyzer`] for per-section work (sentence
//! splitting, tokenization, tagging, parsing, NER) and [`CorefResolver`] for
//! document-scope coreference over the completed aggregate. A deterministic
//! rule-based implementation of both lives in [`rules`].

pub mod rules;

use thiserror::Error;

use crate::annotation::{DocumentAggregate, LocalAnnotation, SectionAnnotation};

pub use rules::RuleEngine;

/// Failure raised by an analysis engine. Propagated to the pipeline caller
/// wrapped as an analysis failure; never retried by the core.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine processing failure: {0}")]
    Processing(String),
}

/// Per-section analysis operations.
pub trait SectionAnalyzer {
    /// Split raw section text into sentences and tokens. Returns `Ok(None)`
    /// when the text yields nothing to analyze; that is a zero-contribution
    /// section, not an error.
    fn split_and_tokenize(&self, text: &str) -> Result<Option<LocalAnnotation>, EngineError>;

    /// Enrich a positioned section with POS tags, lemmas, named-entity
    /// labels, and a constituency parse. Offsets must not change.
    fn deep_analyze(&self, section: SectionAnnotation) -> Result<SectionAnnotation, EngineError>;
}

/// Document-scope coreference over the completed aggregate.
pub trait CorefResolver {
    /// Cluster co-referent mentions. Returned indices are relative to the
    /// aggregate's global sentence indexing.
    fn resolve(&self, aggregate: &DocumentAggregate) -> Result<ClusterAssignments, EngineError>;
}

pub type ClusterAssignments = Vec<CorefCluster>;

/// One cluster of mentions believed co-referent. A singleton cluster is
/// valid; that policy is the engine's, not second-guessed by the core.
#[derive(Debug, Clone)]
pub struct CorefCluster {
    pub mentions: Vec<ClusterMention>,
}

/// A mention located by aggregate indices: the global 1-based sentence index
/// and a half-open sentence-local token range.
#[derive(Debug, Clone)]
pub struct ClusterMention {
    pub sentence_index: usize,
    pub token_begin: usize,
    pub token_end: usize,
    pub entity_type: Option<String>,
}
