//! Per-mention context consumed by the evidence accumulator.

use prose_graph::EntityType;

/// Everything the accumulator wants to know about one noun-phrase mention.
///
/// Built by [`crate::collect_mentions`]; the fields mirror what the
/// upstream parse can tell us about the mention's local syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct MentionContext {
    /// Surface text of the full mention span.
    pub text: String,
    /// NER label covering the span, if any ("PERSON", "GPE", ...).
    pub ner_label: Option<String>,
    pub start: usize,
    pub end: usize,
    pub sentence_index: usize,
    pub is_sentence_initial: bool,
    /// Leading determiner, when present ("the", "a").
    pub determiner: Option<String>,
    pub is_verb_subject: bool,
    pub is_verb_object: bool,
    /// Lemma of the governing verb when the mention is its subject/object.
    pub verb_lemma: Option<String>,
    pub has_role_word: bool,
    pub role_word: Option<String>,
    pub has_title: bool,
    pub title: Option<String>,
    pub is_vocative: bool,
    pub is_in_dialogue: bool,
    /// Back-references already known to point at this mention.
    pub coref_links_count: usize,
    pub is_possessive: bool,
}

impl MentionContext {
    /// Minimal context for tests and manual construction.
    pub fn new(text: &str, start: usize, sentence_index: usize) -> Self {
        Self {
            text: text.to_string(),
            ner_label: None,
            start,
            end: start + text.len(),
            sentence_index,
            is_sentence_initial: false,
            determiner: None,
            is_verb_subject: false,
            is_verb_object: false,
            verb_lemma: None,
            has_role_word: false,
            role_word: None,
            has_title: false,
            title: None,
            is_vocative: false,
            is_in_dialogue: false,
            coref_links_count: 0,
            is_possessive: false,
        }
    }

    /// Entity type suggested by the NER label, if any.
    pub fn ner_type(&self) -> Option<EntityType> {
        self.ner_label
            .as_deref()
            .and_then(EntityType::from_ner)
    }
}
