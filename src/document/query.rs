//! Document read accessors
//!
//! This module provides read-only querying operations on annotated documents:
//! locating the tokenization produced for a section, the mentions anchored in
//! a tokenization, and the entity a mention belongs to.

use uuid::Uuid;

use super::models::*;

/// Find the tokenization produced for the given section, if any.
pub fn tokenization_for_section(document: &Document, section_uuid: Uuid) -> Option<&Tokenization> {
    document
        .tokenizations
        .iter()
        .find(|t| t.section_uuid == section_uuid)
}

/// Collect every mention anchored inside the given tokenization, across all
/// mention sets.
pub fn mentions_in_tokenization(document: &Document, tokenization_uuid: Uuid) -> Vec<&EntityMention> {
    document
        .entity_mention_sets
        .iter()
        .flat_map(|set| set.mentions.iter())
        .filter(|m| m.tokenization_uuid == tokenization_uuid)
        .collect()
}

/// Find the entity that owns the given mention, if any.
pub fn entity_for_mention(document: &Document, mention_uuid: Uuid) -> Option<&Entity> {
    document
        .entity_sets
        .iter()
        .flat_map(|set| set.entities.iter())
        .find(|e| e.mention_uuids.contains(&mention_uuid))
}

/// Total number of tokens across all tokenizations in the document.
pub fn token_count(document: &Document) -> usize {
    document.tokenizations.iter().map(|t| t.tokens.len()).sum()
}
