//! Deterministic rule-based analysis engine
//!
//! A heuristic implementation of [`SectionAnalyzer`] and [`CorefResolver`]
//! so the pipeline runs end-to-end without an external NLP service: regex
//! sentence splitting with an abbreviation guard, whitespace tokenization,
//! word-list and suffix POS tagging, capitalized-run named-entity detection,
//! and head-match plus nearest-antecedent pronoun coreference.
//!
//! The goal is predictable, testable behavior, not linguistic accuracy.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

use super::{ClusterAssignments, ClusterMention, CorefCluster, CorefResolver, EngineError, SectionAnalyzer};
use crate::annotation::{
    AggregateSentence, DocumentAggregate, LocalAnnotation, LocalSentence, SectionAnnotation,
};

static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("valid sentence boundary regex"));

static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mr.", "mrs.", "ms.", "dr.", "prof.", "gen.", "rep.", "sen.", "st.", "jr.", "sr.",
        "vs.", "etc.", "e.g.", "i.e.", "u.s.", "u.k.", "inc.", "co.", "corp.", "ltd.", "no.",
        "fig.", "jan.", "feb.", "mar.", "apr.", "aug.", "sept.", "oct.", "nov.", "dec.",
    ]
    .into_iter()
    .collect()
});

static DETERMINERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["a", "an", "the", "this", "that", "these", "those", "each", "every", "some", "any", "no"]
        .into_iter()
        .collect()
});

static PRONOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
        "his", "hers", "its", "ours", "theirs", "mine", "yours", "himself", "herself",
        "itself", "themselves",
    ]
    .into_iter()
    .collect()
});

static PREPOSITIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "in", "on", "at", "by", "for", "with", "from", "to", "of", "about", "into", "over",
        "under", "after", "before", "between", "through", "during", "against",
    ]
    .into_iter()
    .collect()
});

static CONJUNCTIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["and", "or", "but", "nor", "so", "yet"].into_iter().collect());

static MODALS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["can", "could", "may", "might", "must", "shall", "should", "will", "would"]
        .into_iter()
        .collect()
});

static COMMON_VERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "is", "are", "was", "were", "be", "been", "being", "am", "has", "have", "had",
        "do", "does", "did", "go", "went", "gone", "say", "said", "get", "got", "make",
        "made", "see", "saw", "seen", "know", "knew", "take", "took", "come", "came",
        "sat", "slept", "ran", "gave", "found", "told", "left", "put",
    ]
    .into_iter()
    .collect()
});

/// Entity label assigned to detected name runs. Without a gazetteer the
/// engine cannot distinguish persons from places, so everything is MISC.
const NAME_ENTITY_TYPE: &str = "MISC";

/// Rule-based engine implementing both analysis traits.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    /// Maximum sentence distance when linking a pronoun to its antecedent.
    max_pronoun_distance: usize,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            max_pronoun_distance: 3,
        }
    }

    pub fn with_max_pronoun_distance(max_pronoun_distance: usize) -> Self {
        Self {
            max_pronoun_distance,
        }
    }
}

impl SectionAnalyzer for RuleEngine {
    fn split_and_tokenize(&self, text: &str) -> Result<Option<LocalAnnotation>, EngineError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let sentences: Vec<LocalSentence> = split_sentences(text)
            .into_iter()
            .map(|sentence| LocalSentence {
                tokens: sentence.split_whitespace().map(str::to_string).collect(),
            })
            .filter(|s| !s.tokens.is_empty())
            .collect();

        if sentences.is_empty() {
            return Ok(None);
        }
        Ok(Some(LocalAnnotation { sentences }))
    }

    fn deep_analyze(&self, section: SectionAnnotation) -> Result<SectionAnnotation, EngineError> {
        let sentences = section
            .sentences
            .into_iter()
            .map(|mut sentence| {
                let name_like: Vec<bool> = sentence
                    .tokens
                    .iter()
                    .map(|t| is_name_like(&t.text))
                    .collect();

                for (i, token) in sentence.tokens.iter_mut().enumerate() {
                    let pos = tag_pos(&token.text, i == 0);
                    token.lemma = Some(lemmatize(&token.text, pos));
                    token.pos = Some(pos.to_string());
                }

                apply_entity_labels(&mut sentence.tokens, &name_like);

                let constituents: String = sentence
                    .tokens
                    .iter()
                    .map(|t| {
                        format!(" ({} {})", t.pos.as_deref().unwrap_or("NN"), t.text)
                    })
                    .collect();
                sentence.parse = Some(format!("(S{constituents})"));
                sentence
            })
            .collect();

        Ok(SectionAnnotation { sentences })
    }
}

/// Split text into sentence slices at terminal punctuation followed by
/// whitespace, refusing to break after a known abbreviation.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        let candidate = &text[start..boundary.end()];
        if ends_with_abbreviation(candidate) {
            continue;
        }
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed);
        }
        start = boundary.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn ends_with_abbreviation(candidate: &str) -> bool {
    let last_word = candidate
        .trim_end()
        .split_whitespace()
        .next_back()
        .unwrap_or("");
    ABBREVIATIONS.contains(last_word.to_lowercase().as_str())
}

/// Token text without trailing punctuation, for classification purposes.
fn core_word(token: &str) -> &str {
    token.trim_end_matches(|c: char| c.is_ascii_punctuation())
}

fn starts_uppercase(word: &str) -> bool {
    word.graphemes(true)
        .next()
        .and_then(|g| g.chars().next())
        .is_some_and(char::is_uppercase)
}

fn tag_pos(token: &str, sentence_initial: bool) -> &'static str {
    let core = core_word(token);
    if core.is_empty() {
        return ".";
    }
    if core.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return "CD";
    }

    let lower = core.to_lowercase();
    let lower = lower.as_str();
    if PRONOUNS.contains(lower) {
        return "PRP";
    }
    if DETERMINERS.contains(lower) {
        return "DT";
    }
    if PREPOSITIONS.contains(lower) {
        return "IN";
    }
    if CONJUNCTIONS.contains(lower) {
        return "CC";
    }
    if MODALS.contains(lower) {
        return "MD";
    }
    if COMMON_VERBS.contains(lower) {
        return "VBD";
    }
    if lower.ends_with("ly") {
        return "RB";
    }
    if lower.ends_with("ing") && lower.len() > 4 {
        return "VBG";
    }
    if lower.ends_with("ed") && lower.len() > 3 {
        return "VBD";
    }
    if starts_uppercase(core) && !sentence_initial {
        return "NNP";
    }
    if lower.ends_with('s') && lower.len() > 3 {
        return "NNS";
    }
    "NN"
}

fn lemmatize(token: &str, pos: &str) -> String {
    let core = core_word(token);
    let lower = core.to_lowercase();
    let lower = lower.strip_suffix("'s").unwrap_or(&lower);
    if pos == "NNS" {
        if let Some(stem) = lower.strip_suffix('s') {
            if stem.len() > 2 {
                return stem.to_string();
            }
        }
    }
    lower.to_string()
}

/// A token can open or extend a name run if it is capitalized and not a
/// closed-class function word.
fn is_name_like(token: &str) -> bool {
    let core = core_word(token);
    if core.is_empty() || !starts_uppercase(core) {
        return false;
    }
    let lower = core.to_lowercase();
    let lower = lower.as_str();
    !(DETERMINERS.contains(lower)
        || PRONOUNS.contains(lower)
        || PREPOSITIONS.contains(lower)
        || CONJUNCTIONS.contains(lower)
        || MODALS.contains(lower)
        || COMMON_VERBS.contains(lower))
}

/// Label maximal capitalized runs. A lone capitalized token at sentence
/// start is treated as ordinary capitalization, not a name.
fn apply_entity_labels(tokens: &mut [crate::annotation::AnnotatedToken], name_like: &[bool]) {
    let mut i = 0;
    while i < tokens.len() {
        if !name_like[i] {
            i += 1;
            continue;
        }
        let mut end = i + 1;
        while end < tokens.len() && name_like[end] {
            end += 1;
        }
        let sentence_initial_singleton = i == 0 && end - i == 1;
        if !sentence_initial_singleton {
            for token in &mut tokens[i..end] {
                token.ner = Some(NAME_ENTITY_TYPE.to_string());
            }
        }
        i = end;
    }
}

// ---------------------------------------------------------------------------
// Coreference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MentionKind {
    Pronoun,
    Proper,
    Nominal,
}

#[derive(Debug, Clone)]
struct RawMention {
    sentence_index: usize,
    token_begin: usize,
    token_end: usize,
    head: String,
    kind: MentionKind,
    entity_type: Option<String>,
}

impl CorefResolver for RuleEngine {
    fn resolve(&self, aggregate: &DocumentAggregate) -> Result<ClusterAssignments, EngineError> {
        let mentions = collect_mentions(aggregate);
        Ok(cluster_mentions(mentions, self.max_pronoun_distance))
    }
}

fn collect_mentions(aggregate: &DocumentAggregate) -> Vec<RawMention> {
    let mut mentions = Vec::new();
    for sentence in aggregate.sentences() {
        collect_sentence_mentions(sentence, &mut mentions);
    }
    mentions
}

fn collect_sentence_mentions(sentence: &AggregateSentence, mentions: &mut Vec<RawMention>) {
    let tokens = &sentence.tokens;
    let mut claimed = vec![false; tokens.len()];

    // Named-entity runs first; they take precedence over nominal spans
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].ner.as_deref() == Some(NAME_ENTITY_TYPE) {
            let mut end = i + 1;
            while end < tokens.len() && tokens[end].ner.as_deref() == Some(NAME_ENTITY_TYPE) {
                end += 1;
            }
            claimed[i..end].iter_mut().for_each(|c| *c = true);
            mentions.push(RawMention {
                sentence_index: sentence.index,
                token_begin: i,
                token_end: end,
                head: core_word(&tokens[end - 1].text).to_lowercase(),
                kind: MentionKind::Proper,
                entity_type: Some(NAME_ENTITY_TYPE.to_string()),
            });
            i = end;
        } else {
            i += 1;
        }
    }

    for (i, token) in tokens.iter().enumerate() {
        if claimed[i] {
            continue;
        }
        let lower = core_word(&token.text).to_lowercase();
        if token.pos.as_deref() == Some("PRP") && PRONOUNS.contains(lower.as_str()) {
            claimed[i] = true;
            mentions.push(RawMention {
                sentence_index: sentence.index,
                token_begin: i,
                token_end: i + 1,
                head: lower,
                kind: MentionKind::Pronoun,
                entity_type: None,
            });
        }
    }

    // Determiner + head noun, e.g. "a cat", "the company"
    for i in 0..tokens.len().saturating_sub(1) {
        if claimed[i] || claimed[i + 1] {
            continue;
        }
        let head_token = &tokens[i + 1];
        let head_pos = head_token.pos.as_deref().unwrap_or("");
        if tokens[i].pos.as_deref() == Some("DT") && matches!(head_pos, "NN" | "NNS" | "NNP") {
            claimed[i] = true;
            claimed[i + 1] = true;
            mentions.push(RawMention {
                sentence_index: sentence.index,
                token_begin: i,
                token_end: i + 2,
                head: core_word(&head_token.text).to_lowercase(),
                kind: MentionKind::Nominal,
                entity_type: None,
            });
        }
    }

    // Keep document order stable within the sentence
    mentions.sort_by_key(|m| (m.sentence_index, m.token_begin));
}

fn cluster_mentions(mentions: Vec<RawMention>, max_pronoun_distance: usize) -> ClusterAssignments {
    let mut clusters: Vec<Vec<ClusterMention>> = Vec::new();
    let mut head_to_cluster: HashMap<String, usize> = HashMap::new();
    // (sentence index, cluster id) of the most recent non-pronoun mention
    let mut last_antecedent: Option<(usize, usize)> = None;

    for mention in mentions {
        let cluster_id = match mention.kind {
            MentionKind::Pronoun => match last_antecedent {
                Some((sentence, id))
                    if mention.sentence_index.saturating_sub(sentence) <= max_pronoun_distance =>
                {
                    id
                }
                _ => {
                    clusters.push(Vec::new());
                    clusters.len() - 1
                }
            },
            MentionKind::Proper | MentionKind::Nominal => {
                let id = match head_to_cluster.get(&mention.head) {
                    Some(&id) => id,
                    None => {
                        clusters.push(Vec::new());
                        let id = clusters.len() - 1;
                        head_to_cluster.insert(mention.head.clone(), id);
                        id
                    }
                };
                last_antecedent = Some((mention.sentence_index, id));
                id
            }
        };

        clusters[cluster_id].push(ClusterMention {
            sentence_index: mention.sentence_index,
            token_begin: mention.token_begin,
            token_end: mention.token_end,
            entity_type: mention.entity_type,
        });
    }

    clusters
        .into_iter()
        .filter(|mentions| !mentions.is_empty())
        .map(|mentions| CorefCluster { mentions })
        .collect()
}
