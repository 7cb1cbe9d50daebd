//! The quality filter: lexical sanity and type-specific validation.
//!
//! Rules run in a fixed order; the first hit decides. The filter is
//! purely local and never fails the pipeline - rejected candidates are
//! materialized with `rejected = true` and the triggering rule recorded
//! in their [`QualityDecision`].

use prose_graph::{
    Entity, EntitySpan, EntityType, QualityDecision, QualityVerdict, Tier,
};
use prose_graph_lexicon as lexicon;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::accumulator::{EntityCandidate, PromotionLevel};
use crate::gender::infer_gender;

/// What the filter did with one candidate.
#[derive(Debug)]
pub enum FilterOutcome {
    Keep(Entity, Vec<EntitySpan>),
    /// Retained for auditing, excluded from the working graph.
    Reject(Entity),
    /// Two-first-names candidates become two entities.
    Split(Vec<(Entity, Vec<EntitySpan>)>),
}

/// Configurable lexical sanity filter.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    /// Strict mode adds rule 9 (all-caps non-acronyms, very short words).
    strict: bool,
    /// `ENTITY_FILTER=off` skips the lexical rules but keeps promotion
    /// thresholds and audit records.
    enabled: bool,
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self {
            strict: false,
            enabled: true,
        }
    }
}

impl QualityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Run the rule chain over one promoted candidate.
    pub fn apply(
        &self,
        candidate: &EntityCandidate,
        level: PromotionLevel,
        created_at: u64,
    ) -> FilterOutcome {
        if level == PromotionLevel::Reject {
            return self.reject(candidate, created_at, "below_promotion_threshold", None);
        }

        if self.enabled {
            if let Some(rule) = self.rejection_rule(candidate) {
                return self.reject(candidate, created_at, rule, None);
            }

            if let Some(outcome) = self.try_split(candidate, level, created_at) {
                return outcome;
            }
        }

        let (mut entity, spans) = match candidate.materialize(level, created_at) {
            Some(pair) => pair,
            None => return self.reject(candidate, created_at, "below_promotion_threshold", None),
        };

        // HOUSE candidates stay tier C until corroborated by both a NER
        // signal and a role/title signal.
        if entity.entity_type == EntityType::House
            && entity.tier != Tier::C
            && !(candidate.signals.ner >= 0.3 && candidate.signals.role >= 0.2)
        {
            entity.tier = Tier::C;
            entity.confidence = entity.confidence.min(0.54);
            entity.quality_decision = Some(QualityDecision {
                verdict: QualityVerdict::Demoted,
                rule: "house_needs_corroboration".to_string(),
                signals: candidate.signals.as_map(candidate.mention_count),
                detail: None,
            });
        }

        FilterOutcome::Keep(entity, spans)
    }

    /// First matching rejection rule; the order is part of the contract.
    fn rejection_rule(&self, candidate: &EntityCandidate) -> Option<&'static str> {
        let surface = candidate.surface.trim();
        let ty = candidate.entity_type;
        let graphemes = surface.graphemes(true).count();
        let single_word = !surface.contains(char::is_whitespace);
        let capitalized = surface.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
        let all_caps = surface.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase())
            && surface.chars().any(|c| c.is_alphabetic());

        // (1) pure digit strings, unless it is a date
        if ty != EntityType::Date && !surface.is_empty() && surface.chars().all(|c| c.is_ascii_digit()) {
            return Some("all_digits");
        }
        // (2) length floor; two-char forms must be acronyms
        if graphemes < 2 {
            return Some("too_short");
        }
        if graphemes == 2 && !all_caps {
            return Some("too_short_non_acronym");
        }
        // (3) global stopwords
        if lexicon::is_stopword(surface) {
            return Some("stopword");
        }
        // (4) pronouns and deictics
        if lexicon::is_pronoun(surface) || lexicon::is_deictic(surface) {
            return Some("pronoun");
        }
        // (5) proper-noun capitalization for name-like types
        if ty.requires_proper_noun()
            && !capitalized
            && lexicon::strip_title_prefix(surface).is_none()
        {
            return Some("capitalization");
        }
        // (6) at least 70% letters among non-space chars
        if ty != EntityType::Date {
            let non_space = surface.chars().filter(|c| !c.is_whitespace()).count();
            let letters = surface.chars().filter(|c| c.is_alphabetic()).count();
            if non_space > 0 && (letters as f64) / (non_space as f64) < 0.7 {
                return Some("letter_ratio");
            }
        }
        // (7) type-specific validators
        match ty {
            EntityType::Person => {
                let ner_supported = candidate.signals.ner >= 0.3;
                if lexicon::is_abstract_person_noun(surface)
                    && candidate.sentence_initial_only
                    && !ner_supported
                {
                    return Some("abstract_person");
                }
            }
            EntityType::Race => {
                if single_word && surface.to_lowercase().ends_with("ing") {
                    return Some("race_gerund");
                }
                if !lexicon::has_demonym_suffix(surface) && !lexicon::is_curated_race(surface) {
                    return Some("race_shape");
                }
            }
            EntityType::Item => {
                let has_pronoun_token = surface
                    .split_whitespace()
                    .any(lexicon::is_pronoun);
                let verb_headed = surface
                    .split_whitespace()
                    .last()
                    .map(|w| lexicon::is_strong_agentive_verb(w) || lexicon::is_speech_verb(w))
                    .unwrap_or(false);
                if has_pronoun_token || verb_headed {
                    return Some("item_shape");
                }
            }
            _ => {}
        }
        // (8) too-generic single-word nouns
        if single_word && lexicon::is_too_generic(surface) {
            return Some("generic_noun");
        }
        // (9) strict-mode extras
        if self.strict {
            if all_caps && graphemes > 4 {
                return Some("all_caps_non_acronym");
            }
            if single_word && graphemes < 4 && !all_caps {
                return Some("strict_short");
            }
        }
        // role-based descriptors: an uncapitalized common noun that only
        // ever appeared with a determiner ("the stranger")
        if single_word && !capitalized && candidate.seen_with_determiner {
            return Some("role_descriptor");
        }
        None
    }

    /// PERSON candidates shaped like two first names split into two
    /// entities; a surname-shaped second token keeps them together.
    fn try_split(
        &self,
        candidate: &EntityCandidate,
        level: PromotionLevel,
        created_at: u64,
    ) -> Option<FilterOutcome> {
        if candidate.entity_type != EntityType::Person {
            return None;
        }
        let parts: Vec<&str> = candidate.surface.split_whitespace().collect();
        if parts.len() != 2 {
            return None;
        }
        let both_capitalized = parts
            .iter()
            .all(|p| p.chars().next().map(|c| c.is_uppercase()).unwrap_or(false));
        if !both_capitalized || lexicon::is_title_prefix(parts[0]) {
            return None;
        }
        // A second token from the first-name lists is not surname-shaped.
        if lexicon::name_gender(parts[1]) == prose_graph::Gender::Unknown {
            return None;
        }

        debug!(surface = %candidate.surface, "splitting two-first-names candidate");
        let first_len = parts[0].len();
        let mut out = Vec::new();
        for (idx, part) in parts.iter().enumerate() {
            let mut entity = Entity::new(EntityType::Person, part, 0.0, created_at);
            let tier = level.tier().unwrap_or(Tier::C);
            entity.tier = tier;
            entity.confidence = match tier {
                Tier::A => 0.75,
                Tier::B => 0.55,
                Tier::C => 0.45,
            };
            entity.gender = infer_gender(part, None, None);
            entity.quality_decision = Some(QualityDecision {
                verdict: QualityVerdict::Split,
                rule: "two_first_names_split".to_string(),
                signals: candidate.signals.as_map(candidate.mention_count),
                detail: Some(format!("split from {:?}", candidate.surface)),
            });
            let spans = candidate
                .mentions
                .iter()
                .map(|m| {
                    let (start, end) = if idx == 0 {
                        (m.start, m.start + first_len)
                    } else {
                        (m.start + first_len + 1, m.end)
                    };
                    EntitySpan {
                        entity_id: entity.id.clone(),
                        start,
                        end,
                        surface: (*part).to_string(),
                        sentence_index: m.sentence_index,
                    }
                })
                .collect();
            out.push((entity, spans));
        }
        Some(FilterOutcome::Split(out))
    }

    fn reject(
        &self,
        candidate: &EntityCandidate,
        created_at: u64,
        rule: &str,
        detail: Option<String>,
    ) -> FilterOutcome {
        debug!(surface = %candidate.surface, rule, "rejecting candidate");
        let mut entity = Entity::new(
            candidate.entity_type,
            &candidate.surface,
            candidate.signals.combined(candidate.mention_count).min(0.54),
            created_at,
        );
        entity.tier = Tier::C;
        entity.rejected = true;
        entity.quality_decision = Some(QualityDecision {
            verdict: QualityVerdict::Rejected,
            rule: rule.to_string(),
            signals: candidate.signals.as_map(candidate.mention_count),
            detail,
        });
        FilterOutcome::Reject(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::EvidenceAccumulator;
    use crate::context::MentionContext;

    fn candidate_from(text: &str, ner: Option<&str>) -> EntityCandidate {
        let mut acc = EvidenceAccumulator::new();
        let mut ctx = MentionContext::new(text, 0, 0);
        ctx.ner_label = ner.map(|s| s.to_string());
        acc.observe(&ctx);
        acc.into_candidates().remove(0)
    }

    fn rule_for(candidate: &EntityCandidate) -> Option<&'static str> {
        QualityFilter::new().rejection_rule(candidate)
    }

    #[test]
    fn digits_and_stopwords_are_rejected() {
        assert_eq!(rule_for(&candidate_from("1234", Some("PERSON"))), Some("all_digits"));
        assert_eq!(rule_for(&candidate_from("However", None)), Some("stopword"));
        // pronouns are also stopwords; the earlier rule wins
        assert_eq!(rule_for(&candidate_from("Himself", None)), Some("stopword"));
        // deictics fall through to the pronoun rule
        assert_eq!(rule_for(&candidate_from("Tomorrow", None)), Some("pronoun"));
    }

    #[test]
    fn length_rules() {
        assert_eq!(rule_for(&candidate_from("X", Some("PERSON"))), Some("too_short"));
        assert_eq!(rule_for(&candidate_from("Ab", Some("PERSON"))), Some("too_short_non_acronym"));
        // two-char acronyms survive the length floor
        assert_eq!(rule_for(&candidate_from("UN", Some("ORG"))), None);
    }

    #[test]
    fn person_requires_capitalization() {
        assert_eq!(
            rule_for(&candidate_from("stranger", Some("PERSON"))),
            Some("capitalization")
        );
        assert_eq!(rule_for(&candidate_from("Aragorn", Some("PERSON"))), None);
    }

    #[test]
    fn abstract_person_needs_more_than_sentence_position() {
        let mut acc = EvidenceAccumulator::new();
        let mut ctx = MentionContext::new("Darkness", 0, 0);
        ctx.is_sentence_initial = true;
        acc.observe(&ctx);
        let candidate = acc.into_candidates().remove(0);
        assert_eq!(rule_for(&candidate), Some("abstract_person"));
    }

    #[test]
    fn race_shape_rules() {
        let mut c = candidate_from("Gondorian", Some("NORP"));
        assert_eq!(c.entity_type, EntityType::Race);
        assert_eq!(rule_for(&c), None);
        c = candidate_from("Walking", Some("NORP"));
        assert_eq!(rule_for(&c), Some("race_gerund"));
        c = candidate_from("Blorp", Some("NORP"));
        assert_eq!(rule_for(&c), Some("race_shape"));
    }

    #[test]
    fn two_first_names_split_into_two_people() {
        let candidate = candidate_from("Elimelech Naomi", Some("PERSON"));
        let filter = QualityFilter::new();
        match filter.apply(&candidate, PromotionLevel::Likely, 0) {
            FilterOutcome::Split(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0].0.canonical, "Elimelech");
                assert_eq!(parts[1].0.canonical, "Naomi");
                assert_eq!(parts[0].0.entity_type, EntityType::Person);
                assert_eq!(parts[1].1[0].surface, "Naomi");
            }
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn surname_shaped_second_token_does_not_split() {
        let candidate = candidate_from("Hermione Granger", Some("PERSON"));
        let filter = QualityFilter::new();
        assert!(matches!(
            filter.apply(&candidate, PromotionLevel::Likely, 0),
            FilterOutcome::Keep(..)
        ));
    }

    #[test]
    fn rejected_entities_carry_audit_records() {
        let candidate = candidate_from("thing", None);
        let filter = QualityFilter::new();
        match filter.apply(&candidate, PromotionLevel::Likely, 0) {
            FilterOutcome::Reject(entity) => {
                assert!(entity.rejected);
                let decision = entity.quality_decision.unwrap();
                assert_eq!(decision.verdict, QualityVerdict::Rejected);
                assert!(decision.signals.contains_key("combined"));
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn strict_mode_rejects_short_single_words() {
        let filter = QualityFilter::new().with_strict(true);
        let candidate = candidate_from("Sam", Some("PERSON"));
        assert!(matches!(
            filter.apply(&candidate, PromotionLevel::Likely, 0),
            FilterOutcome::Reject(_)
        ));
        // same candidate passes in default mode
        let filter = QualityFilter::new();
        assert!(matches!(
            filter.apply(&candidate, PromotionLevel::Likely, 0),
            FilterOutcome::Keep(..)
        ));
    }
}
