//! Offset reconciliation and the document-level aggregate
//!
//! [`RunContext`] owns the three pieces of run-scoped state — global
//! character offset, global token offset, next sentence index — and folds
//! each contentful section's locally-indexed sentences into a growing
//! [`DocumentAggregate`] with globally consistent indices. One context is
//! created per document run and never shared across runs.
//!
//! Character offsets assume exactly one separating character between
//! consecutive tokens. This is a deliberate approximation: original spacing
//! is not reconstructed, only a monotonically consistent offset is
//! guaranteed.

use tracing::debug;

use super::{AnnotatedToken, LocalAnnotation, SectionAnnotation, SectionSentence};
use crate::error::PipelineError;

/// Run-scoped offset counters, initialized to `(0, 0, 1)` at the start of
/// each independent document run.
#[derive(Debug)]
pub struct RunContext {
    char_offset: usize,
    token_offset: usize,
    sentence_count: usize,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            char_offset: 0,
            token_offset: 0,
            sentence_count: 1,
        }
    }

    /// Current global character offset.
    pub fn char_offset(&self) -> usize {
        self.char_offset
    }

    /// Current global token offset.
    pub fn token_offset(&self) -> usize {
        self.token_offset
    }

    /// Global 1-based index the next folded sentence will receive.
    pub fn next_sentence_index(&self) -> usize {
        self.sentence_count
    }

    /// Advance the character offset without contributing tokens or
    /// sentences. Used for sections that are excluded from analysis but
    /// whose text still consumes document characters.
    pub fn advance_chars(&mut self, len: usize) {
        self.char_offset += len;
    }

    /// Fold a section's local sentence sequence into the aggregate,
    /// assigning global sentence indices, token ranges, and character
    /// ranges, and return the positioned snapshot for further per-section
    /// analysis.
    ///
    /// `tokenization_index` is the ordinal of the tokenization this section
    /// will produce; the aggregate records it so document-scope coreference
    /// results can be mapped back to the right tokenization.
    pub fn fold_section(
        &mut self,
        local: LocalAnnotation,
        aggregate: &mut DocumentAggregate,
        tokenization_index: usize,
    ) -> Result<SectionAnnotation, PipelineError> {
        debug!(
            token_offset = self.token_offset,
            char_offset = self.char_offset,
            sentences = local.sentences.len(),
            "folding section into aggregate"
        );

        let section_token_origin = self.token_offset;
        let mut sentences = Vec::with_capacity(local.sentences.len());
        let mut max_char_ending: Option<usize> = None;

        for local_sentence in local.sentences {
            if local_sentence.tokens.is_empty() {
                continue;
            }

            let token_begin = self.token_offset;
            let token_end = token_begin + local_sentence.tokens.len();
            let index = self.sentence_count;
            self.sentence_count += 1;
            self.token_offset = token_end;

            let mut tokens = Vec::with_capacity(local_sentence.tokens.len());
            for text in local_sentence.tokens {
                let char_begin = self.char_offset;
                self.char_offset += text.len();
                let char_end = self.char_offset;
                // Skip the assumed single separating character
                self.char_offset += 1;
                tokens.push(AnnotatedToken::positioned(text, char_begin, char_end));
            }

            // Non-empty by the guard above
            let char_begin = tokens[0].char_begin;
            let char_end = tokens[tokens.len() - 1].char_end;
            max_char_ending = Some(max_char_ending.map_or(char_end, |m| m.max(char_end)));

            let sentence = SectionSentence {
                index,
                token_begin,
                token_end,
                char_begin,
                char_end,
                tokens,
                parse: None,
            };
            aggregate.push_sentence(&sentence, tokenization_index, token_begin - section_token_origin);
            sentences.push(sentence);
        }

        if let Some(max) = max_char_ending {
            if let Some(previous) = aggregate.char_ending() {
                if max < previous {
                    return Err(PipelineError::Inconsistency(format!(
                        "max char ending for this section ({max}) is less than the current \
                         document char ending ({previous})"
                    )));
                }
            }
            aggregate.set_char_ending(max);
        }

        Ok(SectionAnnotation { sentences })
    }
}

/// One sentence as recorded on the aggregate, with back-pointers to the
/// structural tokenization it came from.
#[derive(Debug, Clone)]
pub struct AggregateSentence {
    pub index: usize,
    pub token_begin: usize,
    pub token_end: usize,
    pub char_begin: usize,
    pub char_end: usize,
    pub tokens: Vec<AnnotatedToken>,
    pub parse: Option<String>,
    /// Ordinal of the tokenization produced for the owning section, within
    /// the current grouping.
    pub tokenization_index: usize,
    /// Section-local id of this sentence's first token.
    pub section_token_begin: usize,
}

/// The run-scoped accumulator holding one grouping's contentful sentences
/// and tokens under the run's globally consistent indexing. Transient: built
/// during one run, read once by coreference, never persisted.
///
/// Sentence indices and token offsets stay global even when a run spans
/// several groupings, so an aggregate records the run position it began at
/// and translates global coordinates to its own vectors.
#[derive(Debug, Default)]
pub struct DocumentAggregate {
    sentences: Vec<AggregateSentence>,
    tokens: Vec<AnnotatedToken>,
    char_ending: Option<usize>,
    sentence_base: usize,
    token_base: usize,
}

impl DocumentAggregate {
    /// Aggregate starting at the beginning of a run: first sentence index 1,
    /// first token offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate for a grouping whose first sentence will receive the given
    /// global 1-based index and whose first token the given global offset.
    pub fn starting_at(first_sentence_index: usize, first_token_offset: usize) -> Self {
        Self {
            sentence_base: first_sentence_index.saturating_sub(1),
            token_base: first_token_offset,
            ..Self::default()
        }
    }

    pub fn sentences(&self) -> &[AggregateSentence] {
        &self.sentences
    }

    /// Look up a sentence by its global 1-based index. Indices assigned
    /// before this aggregate began belong to an earlier grouping and do not
    /// resolve here.
    pub fn sentence(&self, index: usize) -> Option<&AggregateSentence> {
        index
            .checked_sub(self.sentence_base + 1)
            .and_then(|i| self.sentences.get(i))
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Flat document-level token stream, indexable by global token offset.
    pub fn tokens(&self) -> &[AnnotatedToken] {
        &self.tokens
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Highest character ending recorded so far; non-decreasing across
    /// sections.
    pub fn char_ending(&self) -> Option<usize> {
        self.char_ending
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    fn push_sentence(
        &mut self,
        sentence: &SectionSentence,
        tokenization_index: usize,
        section_token_begin: usize,
    ) {
        self.tokens.extend(sentence.tokens.iter().cloned());
        self.sentences.push(AggregateSentence {
            index: sentence.index,
            token_begin: sentence.token_begin,
            token_end: sentence.token_end,
            char_begin: sentence.char_begin,
            char_end: sentence.char_end,
            tokens: sentence.tokens.clone(),
            parse: None,
            tokenization_index,
            section_token_begin,
        });
    }

    pub(crate) fn set_char_ending(&mut self, ending: usize) {
        self.char_ending = Some(ending);
    }

    /// Copy deep-analysis results (parse plus per-token tags) from an
    /// enriched section sentence onto the matching aggregate sentence,
    /// located by global sentence index.
    ///
    /// An index outside the aggregate's bounds, or a token-count mismatch,
    /// signals an offset-reconciliation bug and fails the run.
    pub(crate) fn transfer_enrichment(
        &mut self,
        sentence: &SectionSentence,
    ) -> Result<(), PipelineError> {
        let count = self.sentences.len();
        let first_index = self.sentence_base + 1;
        let slot = sentence
            .index
            .checked_sub(first_index)
            .and_then(|i| self.sentences.get_mut(i))
            .ok_or_else(|| {
                PipelineError::Inconsistency(format!(
                    "sentence index {} is outside the aggregate's {} sentences starting at {}",
                    sentence.index, count, first_index
                ))
            })?;

        if slot.tokens.len() != sentence.tokens.len() {
            return Err(PipelineError::Inconsistency(format!(
                "sentence {} has {} tokens in the aggregate but {} after analysis",
                sentence.index,
                slot.tokens.len(),
                sentence.tokens.len()
            )));
        }

        slot.parse = sentence.parse.clone();
        for (target, enriched) in slot.tokens.iter_mut().zip(&sentence.tokens) {
            target.pos = enriched.pos.clone();
            target.lemma = enriched.lemma.clone();
            target.ner = enriched.ner.clone();
        }
        // Translate the global token range into this aggregate's flat list
        let token_begin = slot.token_begin - self.token_base;
        let token_end = slot.token_end - self.token_base;
        for (target, enriched) in self.tokens[token_begin..token_end]
            .iter_mut()
            .zip(&sentence.tokens)
        {
            target.pos = enriched.pos.clone();
            target.lemma = enriched.lemma.clone();
            target.ner = enriched.ner.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::LocalSentence;

    fn local(sentences: &[&[&str]]) -> LocalAnnotation {
        LocalAnnotation {
            sentences: sentences
                .iter()
                .map(|tokens| LocalSentence {
                    tokens: tokens.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn assigns_global_token_and_char_ranges() {
        let mut ctx = RunContext::new();
        let mut aggregate = DocumentAggregate::new();

        let section = ctx
            .fold_section(local(&[&["Dogs", "bark."]]), &mut aggregate, 0)
            .expect("fold should succeed");

        let sentence = &section.sentences[0];
        assert_eq!(sentence.index, 1);
        assert_eq!((sentence.token_begin, sentence.token_end), (0, 2));
        assert_eq!((sentence.char_begin, sentence.char_end), (0, 10));
        assert_eq!(
            (sentence.tokens[0].char_begin, sentence.tokens[0].char_end),
            (0, 4)
        );
        assert_eq!(
            (sentence.tokens[1].char_begin, sentence.tokens[1].char_end),
            (5, 10)
        );
        // One separator consumed after the final token as well
        assert_eq!(ctx.char_offset(), 11);
        assert_eq!(ctx.token_offset(), 2);
    }

    #[test]
    fn sentence_indices_are_dense_across_sections() {
        let mut ctx = RunContext::new();
        let mut aggregate = DocumentAggregate::new();

        ctx.fold_section(local(&[&["One."], &["Two."]]), &mut aggregate, 0)
            .unwrap();
        ctx.fold_section(local(&[&["Three."]]), &mut aggregate, 1)
            .unwrap();

        let indices: Vec<usize> = aggregate.sentences().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3], "indices must be dense from 1");
    }

    #[test]
    fn token_ranges_partition_the_global_stream() {
        let mut ctx = RunContext::new();
        let mut aggregate = DocumentAggregate::new();

        ctx.fold_section(local(&[&["a", "b"], &["c"]]), &mut aggregate, 0)
            .unwrap();
        ctx.fold_section(local(&[&["d", "e", "f"]]), &mut aggregate, 1)
            .unwrap();

        let sentences = aggregate.sentences();
        for pair in sentences.windows(2) {
            assert_eq!(
                pair[0].token_end, pair[1].token_begin,
                "successive sentences must leave no token gap or overlap"
            );
        }
        assert_eq!(sentences[0].token_begin, 0);
        assert_eq!(sentences.last().unwrap().token_end, aggregate.token_count());
        assert_eq!(ctx.token_offset(), 6);
    }

    #[test]
    fn skipped_text_advances_char_offset_only() {
        let mut ctx = RunContext::new();
        let mut aggregate = DocumentAggregate::new();

        ctx.fold_section(local(&[&["Dogs", "bark."]]), &mut aggregate, 0)
            .unwrap();
        ctx.advance_chars("Ignored text.".len());

        assert_eq!(ctx.char_offset(), "Dogs bark.".len() + 1 + "Ignored text.".len());
        assert_eq!(ctx.token_offset(), 2, "skipped text contributes no tokens");
        assert_eq!(aggregate.sentence_count(), 1);
    }

    #[test]
    fn char_ending_regression_is_fatal() {
        let mut ctx = RunContext::new();
        let mut aggregate = DocumentAggregate::new();

        ctx.fold_section(local(&[&["Hello."]]), &mut aggregate, 0)
            .unwrap();
        // Simulate a corrupted high-water mark, as a reconciliation bug would
        aggregate.set_char_ending(10_000);

        let err = ctx
            .fold_section(local(&[&["World."]]), &mut aggregate, 1)
            .expect_err("a shrinking aggregate must abort the run");
        assert!(matches!(err, PipelineError::Inconsistency(_)));
    }

    #[test]
    fn empty_local_annotation_contributes_nothing() {
        let mut ctx = RunContext::new();
        let mut aggregate = DocumentAggregate::new();

        let section = ctx
            .fold_section(local(&[]), &mut aggregate, 0)
            .expect("an empty section is not an error");
        assert!(section.sentences.is_empty());
        assert!(aggregate.is_empty());
        assert_eq!(ctx.char_offset(), 0);
    }

    #[test]
    fn later_grouping_aggregate_resolves_global_indices() {
        let mut ctx = RunContext::new();
        let mut first = DocumentAggregate::new();
        ctx.fold_section(local(&[&["Aa", "bb."]]), &mut first, 0)
            .unwrap();

        // A second grouping starts mid-run: its aggregate is fresh but its
        // sentences keep the run-global numbering.
        let mut second =
            DocumentAggregate::starting_at(ctx.next_sentence_index(), ctx.token_offset());
        let section = ctx
            .fold_section(
                local(&[&["Cc", "dd."], &["Ee", "ff."], &["Gg", "hh."]]),
                &mut second,
                0,
            )
            .unwrap();

        assert_eq!(section.sentences[0].index, 2);
        assert_eq!(second.sentence(2).unwrap().token_begin, 2);
        assert!(
            second.sentence(1).is_none(),
            "an earlier grouping's sentence must not resolve here"
        );

        for sentence in &section.sentences {
            second
                .transfer_enrichment(sentence)
                .expect("run-global indices must land in the grouping's aggregate");
        }
    }

    #[test]
    fn transfer_rejects_out_of_bounds_sentence_index() {
        let mut ctx = RunContext::new();
        let mut aggregate = DocumentAggregate::new();

        let mut section = ctx
            .fold_section(local(&[&["Hi."]]), &mut aggregate, 0)
            .unwrap();
        section.sentences[0].index = 42;

        let err = aggregate
            .transfer_enrichment(&section.sentences[0])
            .expect_err("an out-of-bounds index must fail loudly");
        assert!(matches!(err, PipelineError::Inconsistency(_)));
    }
}
