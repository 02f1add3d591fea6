//! Document orchestration
//!
//! The pipeline walks every section grouping of a document in order. Each
//! section's text slice is always sentence-split and tokenized; sections
//! whose kind is not configured as contentful then only advance the global
//! character offset and are skipped, while contentful sections are folded
//! into the run's aggregate and deeply analyzed. Once a grouping's sections
//! are done, document-scope coreference runs over the aggregate and its
//! entity/mention output is attached to the document.
//!
//! Processing is synchronous and strictly ordered: offset reconciliation is
//! stateful, so sections cannot be reordered or parallelized within a run.
//! Concurrent documents each get their own [`RunContext`] by construction.

pub(crate) mod coref;
pub(crate) mod section;

use std::collections::HashSet;
use tracing::{debug, info};

use crate::annotation::{DocumentAggregate, RunContext};
use crate::document::{Document, SectionKind, TextSpan, Tokenization};
use crate::engine::{CorefResolver, SectionAnalyzer};
use crate::error::PipelineError;

use coref::resolve_coreference;
use section::process_section;

/// End-to-end annotation pipeline over one analysis engine.
pub struct Pipeline<E> {
    engine: E,
    contentful_kinds: HashSet<SectionKind>,
}

impl<E> Pipeline<E>
where
    E: SectionAnalyzer + CorefResolver,
{
    /// Pipeline with the default contentful set: passages only.
    pub fn new(engine: E) -> Self {
        Self::with_contentful_kinds(engine, [SectionKind::Passage])
    }

    /// Pipeline annotating exactly the given section kinds; all other kinds
    /// are skipped but still consume character offset.
    pub fn with_contentful_kinds(
        engine: E,
        kinds: impl IntoIterator<Item = SectionKind>,
    ) -> Self {
        Self {
            engine,
            contentful_kinds: kinds.into_iter().collect(),
        }
    }

    /// Annotate a document, returning an annotated copy. The input is left
    /// untouched; a fatal error aborts the whole run with no partial output.
    pub fn process(&self, document: &Document) -> Result<Document, PipelineError> {
        validate_preconditions(document)?;
        let mut annotated = document.clone();
        self.run(&mut annotated)?;
        Ok(annotated)
    }

    fn run(&self, document: &mut Document) -> Result<(), PipelineError> {
        info!(id = %document.id, "annotating document");
        debug!(uuid = %document.uuid, text_len = document.text.len());

        // One context per run; offsets advance across groupings and reset
        // only at the next run.
        let mut ctx = RunContext::new();
        let groupings = document.section_groupings.clone();

        for grouping in &groupings {
            debug!(grouping = %grouping.uuid, sections = grouping.sections.len(), "annotating section grouping");
            // The grouping's aggregate is fresh, but sentence and token
            // numbering continues from wherever the run already is.
            let mut aggregate =
                DocumentAggregate::starting_at(ctx.next_sentence_index(), ctx.token_offset());
            let mut tokenizations: Vec<Tokenization> = Vec::new();

            for section in &grouping.sections {
                let slice = &document.text[section.text_span.start..section.text_span.ending];
                // Split and tokenize before checking the content kind, so the
                // consumed text is known either way.
                let local = self.engine.split_and_tokenize(slice)?;

                if !self.contentful_kinds.contains(&section.kind) {
                    // Advance the offset first, then skip; reversing this
                    // would misalign every later section.
                    ctx.advance_chars(slice.len());
                    debug!(section = %section.uuid, kind = ?section.kind, "skipping non-contentful section");
                    continue;
                }

                let Some(local) = local else {
                    debug!(section = %section.uuid, "section produced no sentences, skipping");
                    continue;
                };

                debug!(section = %section.uuid, kind = ?section.kind, "processing section");
                process_section(
                    &self.engine,
                    section,
                    local,
                    &mut ctx,
                    &mut aggregate,
                    &mut tokenizations,
                )?;
            }

            debug!(
                sentences = aggregate.sentence_count(),
                tokens = aggregate.token_count(),
                "running coreference over aggregate"
            );
            let (mention_set, entity_set) =
                resolve_coreference(&self.engine, &aggregate, &tokenizations)?;

            document.tokenizations.extend(tokenizations);
            document.entity_mention_sets.push(mention_set);
            document.entity_sets.push(entity_set);
        }

        info!(
            tokenizations = document.tokenizations.len(),
            "finished annotating document"
        );
        Ok(())
    }
}

/// Validate the document before any processing begins. Violations are
/// surfaced as precondition errors, never silently defaulted.
fn validate_preconditions(document: &Document) -> Result<(), PipelineError> {
    if document.text.is_empty() {
        return Err(PipelineError::Precondition(
            "expecting document text, but it was empty".into(),
        ));
    }
    if document.section_groupings.is_empty() {
        return Err(PipelineError::Precondition(
            "expecting section groupings, but there weren't any".into(),
        ));
    }
    for grouping in &document.section_groupings {
        if grouping.sections.is_empty() {
            return Err(PipelineError::Precondition(format!(
                "expecting sections in grouping {}, but there weren't any",
                grouping.uuid
            )));
        }
        let mut previous: Option<TextSpan> = None;
        for section in &grouping.sections {
            let span = section.text_span;
            if span.start > span.ending
                || span.ending > document.text.len()
                || !document.text.is_char_boundary(span.start)
                || !document.text.is_char_boundary(span.ending)
            {
                return Err(PipelineError::Precondition(format!(
                    "section {} span [{}, {}) is outside the document text bounds",
                    section.uuid, span.start, span.ending
                )));
            }
            if let Some(prev) = previous {
                if span.start < prev.ending {
                    return Err(PipelineError::Precondition(format!(
                        "section {} span [{}, {}) overlaps or precedes its predecessor",
                        section.uuid, span.start, span.ending
                    )));
                }
            }
            previous = Some(span);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Section, SectionGrouping};
    use crate::engine::RuleEngine;

    fn doc(text: &str, sections: Vec<Section>) -> Document {
        Document::new("test", text, vec![SectionGrouping::new(sections)])
    }

    #[test]
    fn empty_text_is_a_precondition_error() {
        let document = doc("", vec![Section::new(SectionKind::Passage, TextSpan::new(0, 0))]);
        let err = Pipeline::new(RuleEngine::new())
            .process(&document)
            .expect_err("empty text must not silently succeed");
        assert!(matches!(err, PipelineError::Precondition(_)));
    }

    #[test]
    fn missing_groupings_is_a_precondition_error() {
        let document = Document::new("test", "Some text.", vec![]);
        let err = Pipeline::new(RuleEngine::new()).process(&document).unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }

    #[test]
    fn empty_grouping_is_a_precondition_error() {
        let document = Document::new(
            "test",
            "Some text.",
            vec![SectionGrouping::new(vec![])],
        );
        let err = Pipeline::new(RuleEngine::new()).process(&document).unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }

    #[test]
    fn out_of_bounds_span_is_a_precondition_error() {
        let document = doc(
            "Short.",
            vec![Section::new(SectionKind::Passage, TextSpan::new(0, 99))],
        );
        let err = Pipeline::new(RuleEngine::new()).process(&document).unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }

    #[test]
    fn overlapping_spans_are_a_precondition_error() {
        let document = doc(
            "Dogs bark loudly.",
            vec![
                Section::new(SectionKind::Passage, TextSpan::new(0, 10)),
                Section::new(SectionKind::Passage, TextSpan::new(5, 17)),
            ],
        );
        let err = Pipeline::new(RuleEngine::new()).process(&document).unwrap_err();
        assert!(matches!(err, PipelineError::Precondition(_)));
    }

    #[test]
    fn input_document_is_not_mutated() {
        let document = doc(
            "Dogs bark.",
            vec![Section::new(SectionKind::Passage, TextSpan::new(0, 10))],
        );
        let annotated = Pipeline::new(RuleEngine::new()).process(&document).unwrap();
        assert!(document.tokenizations.is_empty(), "input must stay untouched");
        assert_eq!(annotated.tokenizations.len(), 1);
    }
}
