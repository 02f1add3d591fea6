//! Run-scoped annotation types
//!
//! The pipeline moves a section's analysis through three explicit stages:
//! a [`LocalAnnotation`] fresh from sentence splitting and tokenization (no
//! positions), a [`SectionAnnotation`] snapshot with globally consistent
//! indices assigned by the offset reconciler, and the same snapshot enriched
//! in a second pass with tags, lemmas, named-entity labels, and a parse.
//! Each stage hands ownership to the next instead of aliasing one mutable
//! object across passes.

pub mod aggregate;

pub use aggregate::{AggregateSentence, DocumentAggregate, RunContext};

/// Per-section analysis output before any positions are assigned.
#[derive(Debug, Clone, Default)]
pub struct LocalAnnotation {
    pub sentences: Vec<LocalSentence>,
}

/// One sentence of a local annotation: token texts only.
#[derive(Debug, Clone)]
pub struct LocalSentence {
    pub tokens: Vec<String>,
}

impl LocalAnnotation {
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.iter().all(|s| s.tokens.is_empty())
    }
}

/// A section's sentences after offset reconciliation.
///
/// Indices and character ranges are global to the document run. The
/// deep-analysis fields (`parse`, per-token tags) start out unset and are
/// filled by the engine's second pass; offsets never change after
/// reconciliation.
#[derive(Debug, Clone)]
pub struct SectionAnnotation {
    pub sentences: Vec<SectionSentence>,
}

impl SectionAnnotation {
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.tokens.len()).sum()
    }
}

/// One positioned sentence.
#[derive(Debug, Clone)]
pub struct SectionSentence {
    /// Global sentence index, 1-based and dense across the whole run.
    pub index: usize,
    /// Global token range `[token_begin, token_end)`.
    pub token_begin: usize,
    pub token_end: usize,
    /// Global character range `[char_begin, char_end)`.
    pub char_begin: usize,
    pub char_end: usize,
    pub tokens: Vec<AnnotatedToken>,
    /// Bracketed constituency parse, set by deep analysis.
    pub parse: Option<String>,
}

/// One positioned token with optional deep-analysis annotations.
#[derive(Debug, Clone)]
pub struct AnnotatedToken {
    pub text: String,
    pub char_begin: usize,
    pub char_end: usize,
    pub pos: Option<String>,
    pub lemma: Option<String>,
    pub ner: Option<String>,
}

impl AnnotatedToken {
    pub(crate) fn positioned(text: String, char_begin: usize, char_end: usize) -> Self {
        Self {
            text,
            char_begin,
            char_end,
            pos: None,
            lemma: None,
            ner: None,
        }
    }
}
