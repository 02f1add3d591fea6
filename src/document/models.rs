//! Core data structures for the document schema
//!
//! This module defines all the public types used to represent a sectioned
//! document and the annotation output written back into it: tokenizations,
//! token taggings, entity mentions, and entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Type aliases for convenience
pub type TokenId = usize;

/// A half-open `[start, ending)` byte span into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub ending: usize,
}

impl TextSpan {
    pub fn new(start: usize, ending: usize) -> Self {
        Self { start, ending }
    }

    pub fn len(&self) -> usize {
        self.ending.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.ending <= self.start
    }
}

/// Structural content kind of a section.
///
/// A closed set: which kinds receive full linguistic analysis is decided by
/// the pipeline configuration, not by the kind itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    #[default]
    Passage,
    Headline,
    Title,
    Turn,
    Post,
    Quote,
    Other,
}

/// A structurally delimited span of the document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub uuid: Uuid,
    pub kind: SectionKind,
    pub text_span: TextSpan,
}

impl Section {
    pub fn new(kind: SectionKind, text_span: TextSpan) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            kind,
            text_span,
        }
    }
}

/// An ordered sequence of sections covering (part of) the document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionGrouping {
    pub uuid: Uuid,
    pub sections: Vec<Section>,
}

impl SectionGrouping {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            sections,
        }
    }
}

/// A single token of a tokenization.
///
/// `id` is dense and section-local, starting at 0. `span` carries the global
/// character range assigned during offset reconciliation; inter-token spacing
/// is approximated as a single separator, so spans are consistent but not a
/// byte-exact reconstruction of the source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub text: String,
    pub span: TextSpan,
}

/// One tag attached to one token, keyed by token id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedToken {
    pub token_id: TokenId,
    pub tag: String,
}

/// An auxiliary tagging (POS, lemma, NER) over a tokenization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTagging {
    pub uuid: Uuid,
    pub tags: Vec<TaggedToken>,
}

impl TokenTagging {
    pub fn new(tags: Vec<TaggedToken>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tags,
        }
    }
}

/// The per-section analysis output written into the document: a flat token
/// list plus optional auxiliary taggings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokenization {
    pub uuid: Uuid,
    pub section_uuid: Uuid,
    pub tokens: Vec<Token>,
    pub pos_tags: Option<TokenTagging>,
    pub lemmas: Option<TokenTagging>,
    pub ner_tags: Option<TokenTagging>,
}

/// A resolved reference anchored to a token range inside one tokenization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
    pub uuid: Uuid,
    pub tokenization_uuid: Uuid,
    pub token_ids: Vec<TokenId>,
    pub text: String,
    pub entity_type: Option<String>,
}

/// Document-scope container for the mentions produced by one coreference run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMentionSet {
    pub uuid: Uuid,
    pub mentions: Vec<EntityMention>,
}

/// A set of mentions believed to refer to the same real-world referent.
///
/// A singleton entity (one mention) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub uuid: Uuid,
    pub mention_uuids: Vec<Uuid>,
    pub canonical_name: Option<String>,
}

/// Document-scope container for the entities produced by one coreference run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySet {
    pub uuid: Uuid,
    pub entities: Vec<Entity>,
}

/// A document: immutable raw text, its structural sectioning, and the
/// annotation output containers filled in by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub uuid: Uuid,
    pub text: String,
    pub section_groupings: Vec<SectionGrouping>,
    #[serde(default)]
    pub tokenizations: Vec<Tokenization>,
    #[serde(default)]
    pub entity_mention_sets: Vec<EntityMentionSet>,
    #[serde(default)]
    pub entity_sets: Vec<EntitySet>,
}

impl Document {
    /// Create an unannotated document from raw text and its sectioning.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        groupings: Vec<SectionGrouping>,
    ) -> Self {
        Self {
            id: id.into(),
            uuid: Uuid::new_v4(),
            text: text.into(),
            section_groupings: groupings,
            tokenizations: Vec::new(),
            entity_mention_sets: Vec::new(),
            entity_sets: Vec::new(),
        }
    }
}
