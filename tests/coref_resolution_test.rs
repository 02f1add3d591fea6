use docweave::document::{entity_for_mention, mentions_in_tokenization, Section, SectionGrouping};
use docweave::{Document, Pipeline, RuleEngine, SectionKind, TextSpan};

fn build_document(sections: &[(SectionKind, &str)]) -> Document {
    let mut text = String::new();
    let mut section_list = Vec::new();
    for (kind, section_text) in sections {
        let start = text.len();
        text.push_str(section_text);
        section_list.push(Section::new(*kind, TextSpan::new(start, text.len())));
    }
    Document::new("coref-doc", text, vec![SectionGrouping::new(section_list)])
}

#[test]
fn test_pronoun_entity_spans_two_sections() {
    let document = build_document(&[
        (SectionKind::Passage, "A cat sat."),
        (SectionKind::Passage, "It slept."),
    ]);
    let annotated = Pipeline::new(RuleEngine::new()).process(&document).unwrap();

    assert_eq!(annotated.tokenizations.len(), 2);
    assert_eq!(annotated.entity_sets.len(), 1);

    let entity = annotated.entity_sets[0]
        .entities
        .iter()
        .find(|e| e.mention_uuids.len() == 2)
        .expect("the pronoun should corefer with the nominal across sections");

    let mentions: Vec<_> = annotated.entity_mention_sets[0]
        .mentions
        .iter()
        .filter(|m| entity.mention_uuids.contains(&m.uuid))
        .collect();
    assert_eq!(mentions.len(), 2);
    assert_ne!(
        mentions[0].tokenization_uuid, mentions[1].tokenization_uuid,
        "the two mentions must be anchored to two different tokenizations"
    );

    let texts: Vec<&str> = mentions.iter().map(|m| m.text.as_str()).collect();
    assert!(texts.contains(&"A cat"), "got mentions: {texts:?}");
    assert!(texts.contains(&"It"), "got mentions: {texts:?}");
    assert_eq!(entity.canonical_name.as_deref(), Some("A cat"));
}

#[test]
fn test_mentions_resolve_into_existing_tokenizations() {
    let document = build_document(&[
        (SectionKind::Passage, "John Smith visited Mary Jones. He greeted her warmly."),
        (SectionKind::Other, "An ignored aside about Bob Brown."),
        (SectionKind::Passage, "The visitors left. They were tired."),
    ]);
    let annotated = Pipeline::new(RuleEngine::new()).process(&document).unwrap();

    for set in &annotated.entity_mention_sets {
        for mention in &set.mentions {
            let tokenization = annotated
                .tokenizations
                .iter()
                .find(|t| t.uuid == mention.tokenization_uuid)
                .expect("every mention must anchor to a tokenization in the output");
            for &id in &mention.token_ids {
                assert!(
                    id < tokenization.tokens.len(),
                    "mention token id {id} must exist in its tokenization"
                );
            }
            assert!(
                !mention.text.contains("Bob"),
                "no mention may reference the skipped section"
            );
        }
    }
}

#[test]
fn test_mention_text_matches_anchored_tokens() {
    let document = build_document(&[(SectionKind::Passage, "We met John Smith. He waved.")]);
    let annotated = Pipeline::new(RuleEngine::new()).process(&document).unwrap();

    let mention = annotated.entity_mention_sets[0]
        .mentions
        .iter()
        .find(|m| m.text.contains("Smith"))
        .expect("the name run should become a mention");

    let tokenization = annotated
        .tokenizations
        .iter()
        .find(|t| t.uuid == mention.tokenization_uuid)
        .unwrap();
    let reconstructed: Vec<&str> = mention
        .token_ids
        .iter()
        .map(|&id| tokenization.tokens[id].text.as_str())
        .collect();
    assert_eq!(reconstructed.join(" "), mention.text);
    assert_eq!(mention.entity_type.as_deref(), Some("MISC"));
}

#[test]
fn test_every_mention_belongs_to_exactly_one_entity() {
    let document = build_document(&[(
        SectionKind::Passage,
        "A dog barked. The dog ran. It stopped.",
    )]);
    let annotated = Pipeline::new(RuleEngine::new()).process(&document).unwrap();

    for mention in &annotated.entity_mention_sets[0].mentions {
        let owners: Vec<_> = annotated.entity_sets[0]
            .entities
            .iter()
            .filter(|e| e.mention_uuids.contains(&mention.uuid))
            .collect();
        assert_eq!(owners.len(), 1, "mention {} must have one owner", mention.text);
        assert!(entity_for_mention(&annotated, mention.uuid).is_some());
    }
}

#[test]
fn test_query_accessors_see_coref_output() {
    let document = build_document(&[(SectionKind::Passage, "A cat sat. It slept.")]);
    let annotated = Pipeline::new(RuleEngine::new()).process(&document).unwrap();

    let tokenization = &annotated.tokenizations[0];
    let anchored = mentions_in_tokenization(&annotated, tokenization.uuid);
    assert!(
        !anchored.is_empty(),
        "mentions should be discoverable through the tokenization they anchor to"
    );
}
