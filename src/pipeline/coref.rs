//! Coreference integration
//!
//! Runs the engine's document-scope coreference over the completed aggregate
//! and maps the returned clusters — indexed by global sentence and
//! sentence-local token positions — back onto the structural tokenizations,
//! producing the entity and mention sets attached to the document.

use tracing::debug;
use uuid::Uuid;

use crate::annotation::DocumentAggregate;
use crate::document::{Entity, EntityMention, EntityMentionSet, EntitySet, Tokenization};
use crate::engine::{ClusterMention, CorefResolver};
use crate::error::PipelineError;

pub(crate) fn resolve_coreference<E: CorefResolver>(
    engine: &E,
    aggregate: &DocumentAggregate,
    tokenizations: &[Tokenization],
) -> Result<(EntityMentionSet, EntitySet), PipelineError> {
    let clusters = engine.resolve(aggregate)?;
    debug!(clusters = clusters.len(), "mapping coreference clusters onto tokenizations");

    let mut mention_set = EntityMentionSet {
        uuid: Uuid::new_v4(),
        mentions: Vec::new(),
    };
    let mut entity_set = EntitySet {
        uuid: Uuid::new_v4(),
        entities: Vec::new(),
    };

    for cluster in clusters {
        let mut mention_uuids = Vec::with_capacity(cluster.mentions.len());
        let mut canonical_name: Option<String> = None;

        for cluster_mention in cluster.mentions {
            let mention = anchor_mention(&cluster_mention, aggregate, tokenizations)?;
            // Longest surface form stands in for the entity
            if canonical_name.as_ref().is_none_or(|c| c.len() < mention.text.len()) {
                canonical_name = Some(mention.text.clone());
            }
            mention_uuids.push(mention.uuid);
            mention_set.mentions.push(mention);
        }

        entity_set.entities.push(Entity {
            uuid: Uuid::new_v4(),
            mention_uuids,
            canonical_name,
        });
    }

    Ok((mention_set, entity_set))
}

/// Resolve a cluster mention's aggregate coordinates to a concrete token
/// range inside one structural tokenization. Coordinates that fall outside
/// the aggregate or its tokenizations signal an offset-reconciliation bug.
fn anchor_mention(
    cluster_mention: &ClusterMention,
    aggregate: &DocumentAggregate,
    tokenizations: &[Tokenization],
) -> Result<EntityMention, PipelineError> {
    let sentence = aggregate
        .sentence(cluster_mention.sentence_index)
        .ok_or_else(|| {
            PipelineError::Inconsistency(format!(
                "coreference mention references sentence {} but the aggregate has {}",
                cluster_mention.sentence_index,
                aggregate.sentence_count()
            ))
        })?;

    let tokenization = tokenizations.get(sentence.tokenization_index).ok_or_else(|| {
        PipelineError::Inconsistency(format!(
            "sentence {} maps to tokenization {} but only {} exist",
            sentence.index,
            sentence.tokenization_index,
            tokenizations.len()
        ))
    })?;

    let token_ids: Vec<usize> = (cluster_mention.token_begin..cluster_mention.token_end)
        .map(|i| sentence.section_token_begin + i)
        .collect();

    let mut texts = Vec::with_capacity(token_ids.len());
    for &id in &token_ids {
        let token = tokenization.tokens.get(id).ok_or_else(|| {
            PipelineError::Inconsistency(format!(
                "mention token id {} is outside tokenization {} ({} tokens)",
                id,
                tokenization.uuid,
                tokenization.tokens.len()
            ))
        })?;
        texts.push(token.text.as_str());
    }

    Ok(EntityMention {
        uuid: Uuid::new_v4(),
        tokenization_uuid: tokenization.uuid,
        token_ids,
        text: texts.join(" "),
        entity_type: cluster_mention.entity_type.clone(),
    })
}
