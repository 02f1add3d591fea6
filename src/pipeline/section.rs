//! Per-section processing
//!
//! For one contentful section: fold its local analysis into the document
//! aggregate (assigning global offsets), run the engine's deep analysis over
//! the positioned snapshot, transfer the results back onto the aggregate by
//! global sentence index, and convert the enriched snapshot into the
//! structural tokenization written to the document.

use tracing::debug;

use crate::annotation::{DocumentAggregate, LocalAnnotation, RunContext, SectionAnnotation};
use crate::document::{Section, TaggedToken, TextSpan, Token, TokenTagging, Tokenization};
use crate::engine::SectionAnalyzer;
use crate::error::PipelineError;
use uuid::Uuid;

pub(crate) fn process_section<E: SectionAnalyzer>(
    engine: &E,
    section: &Section,
    local: LocalAnnotation,
    ctx: &mut RunContext,
    aggregate: &mut DocumentAggregate,
    tokenizations: &mut Vec<Tokenization>,
) -> Result<(), PipelineError> {
    let tokenization_index = tokenizations.len();
    let positioned = ctx.fold_section(local, aggregate, tokenization_index)?;
    if positioned.sentences.is_empty() {
        debug!(section = %section.uuid, "no sentences after reconciliation, nothing to convert");
        return Ok(());
    }

    let enriched = engine.deep_analyze(positioned)?;

    for sentence in &enriched.sentences {
        aggregate.transfer_enrichment(sentence)?;
    }

    tokenizations.push(to_tokenization(section, &enriched));
    Ok(())
}

/// Convert an enriched section annotation into the document's structural
/// tokenization: a flat token list with dense section-local ids plus
/// POS/lemma/NER taggings keyed by those ids.
fn to_tokenization(section: &Section, annotation: &SectionAnnotation) -> Tokenization {
    let mut tokens = Vec::with_capacity(annotation.token_count());
    let mut pos_tags = Vec::new();
    let mut lemmas = Vec::new();
    let mut ner_tags = Vec::new();

    let mut token_id = 0;
    for sentence in &annotation.sentences {
        for annotated in &sentence.tokens {
            if let Some(pos) = &annotated.pos {
                pos_tags.push(TaggedToken {
                    token_id,
                    tag: pos.clone(),
                });
            }
            if let Some(lemma) = &annotated.lemma {
                lemmas.push(TaggedToken {
                    token_id,
                    tag: lemma.clone(),
                });
            }
            if let Some(ner) = &annotated.ner {
                ner_tags.push(TaggedToken {
                    token_id,
                    tag: ner.clone(),
                });
            }
            tokens.push(Token {
                id: token_id,
                text: annotated.text.clone(),
                span: TextSpan::new(annotated.char_begin, annotated.char_end),
            });
            token_id += 1;
        }
    }

    let tagging = |tags: Vec<TaggedToken>| {
        if tags.is_empty() {
            None
        } else {
            Some(TokenTagging::new(tags))
        }
    };

    Tokenization {
        uuid: Uuid::new_v4(),
        section_uuid: section.uuid,
        tokens,
        pos_tags: tagging(pos_tags),
        lemmas: tagging(lemmas),
        ner_tags: tagging(ner_tags),
    }
}
