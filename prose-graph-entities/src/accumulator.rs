//! Per-surface-form evidence accumulation and promotion.
//!
//! Each normalized surface form keeps a signal vector; the combined score
//! and the promotion decision table decide whether the form becomes an
//! entity and at which tier.

use std::collections::BTreeMap;

use prose_graph::{Entity, EntitySpan, EntityType, Gender, Tier};
use prose_graph_lexicon as lexicon;
use tracing::trace;

use crate::context::MentionContext;
use crate::gender::infer_gender;

/// The five aggregated signal scores, each saturating at 1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub ner: f64,
    pub syntax: f64,
    pub role: f64,
    pub coref: f64,
    pub vocative: f64,
}

impl Signals {
    fn bump(value: &mut f64, amount: f64) {
        *value = (*value + amount).min(1.0);
    }

    /// Weighted combination plus repeat-mention bonuses, capped at 1.0.
    pub fn combined(&self, mention_count: usize) -> f64 {
        let base = 0.20 * self.ner
            + 0.35 * self.syntax
            + 0.20 * self.role
            + 0.15 * self.coref
            + 0.10 * self.vocative;
        let bonus = if mention_count >= 3 {
            0.20
        } else if mention_count >= 2 {
            0.10
        } else {
            0.0
        };
        (base + bonus).min(1.0)
    }

    /// Snapshot for audit records.
    pub fn as_map(&self, mention_count: usize) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("ner".to_string(), self.ner);
        map.insert("syntax".to_string(), self.syntax);
        map.insert("role".to_string(), self.role);
        map.insert("coref".to_string(), self.coref);
        map.insert("vocative".to_string(), self.vocative);
        map.insert("mentions".to_string(), mention_count as f64);
        map.insert("combined".to_string(), self.combined(mention_count));
        map
    }
}

/// Promotion decision; first matching row of the table wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionLevel {
    Definite,
    Likely,
    Possible,
    Reject,
}

impl PromotionLevel {
    pub fn decide(signals: &Signals, mention_count: usize) -> PromotionLevel {
        let score = signals.combined(mention_count);
        if score >= 0.50
            || (signals.syntax >= 0.4 && signals.ner >= 0.3)
            || (mention_count >= 3 && signals.ner >= 0.3)
        {
            PromotionLevel::Definite
        } else if score >= 0.30 || mention_count >= 2 || (signals.ner >= 0.3 && signals.role >= 0.2)
        {
            PromotionLevel::Likely
        } else if signals.ner >= 0.2 {
            PromotionLevel::Possible
        } else {
            PromotionLevel::Reject
        }
    }

    pub fn tier(&self) -> Option<Tier> {
        match self {
            PromotionLevel::Definite => Some(Tier::A),
            PromotionLevel::Likely => Some(Tier::B),
            PromotionLevel::Possible => Some(Tier::C),
            PromotionLevel::Reject => None,
        }
    }
}

/// A surface form with its accumulated evidence.
#[derive(Debug, Clone)]
pub struct EntityCandidate {
    /// Normalized (lowercased, trimmed) key.
    pub normalized: String,
    /// Best display surface seen so far (longest).
    pub surface: String,
    pub entity_type: EntityType,
    /// NER label votes, for type arbitration across mentions.
    pub ner_votes: BTreeMap<String, usize>,
    pub signals: Signals,
    pub mention_count: usize,
    pub mentions: Vec<MentionOffset>,
    pub gender: Gender,
    /// True when every mention of this form was sentence-initial - a hint
    /// that capitalization alone promoted it.
    pub sentence_initial_only: bool,
    /// True when any mention carried a leading determiner ("the stranger").
    pub seen_with_determiner: bool,
    /// Surfaces merged into this candidate (alias merging).
    pub merged_surfaces: Vec<String>,
}

/// Compact record of one observed mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MentionOffset {
    pub start: usize,
    pub end: usize,
    pub sentence_index: usize,
}

impl EntityCandidate {
    fn new(normalized: &str, ctx: &MentionContext) -> Self {
        Self {
            normalized: normalized.to_string(),
            surface: ctx.text.clone(),
            entity_type: EntityType::Other,
            ner_votes: BTreeMap::new(),
            signals: Signals::default(),
            mention_count: 0,
            mentions: Vec::new(),
            gender: Gender::Unknown,
            sentence_initial_only: true,
            seen_with_determiner: false,
            merged_surfaces: Vec::new(),
        }
    }

    /// Re-derive the entity type from NER votes and lexical shape.
    fn decide_type(&mut self) {
        // Majority NER vote wins; ties break on lexicographic label so the
        // outcome is deterministic.
        let voted = self
            .ner_votes
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .and_then(|(label, _)| EntityType::from_ner(label));
        if let Some(ty) = voted {
            self.entity_type = ty;
            return;
        }
        // No NER support: capitalized forms default to PERSON (narrative
        // prose skews heavily that way), everything else to ITEM.
        let capitalized = self
            .surface
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);
        self.entity_type = if capitalized {
            EntityType::Person
        } else {
            EntityType::Item
        };
    }

    /// Materialize an [`Entity`] plus its spans at the decided tier.
    ///
    /// Confidence is aligned with the tier band so the tier/confidence
    /// invariant holds regardless of the raw combined score.
    pub fn materialize(&self, level: PromotionLevel, created_at: u64) -> Option<(Entity, Vec<EntitySpan>)> {
        let tier = level.tier()?;
        let score = self.signals.combined(self.mention_count);
        let confidence = match tier {
            Tier::A => score.max(0.75),
            Tier::B => score.clamp(0.55, 0.74),
            Tier::C => score.min(0.54),
        };
        let mut entity = Entity::new(self.entity_type, &self.surface, confidence, created_at);
        entity.tier = tier;
        entity.gender = self.gender;
        for alias in &self.merged_surfaces {
            if !lexicon::is_pronoun(alias) && !lexicon::is_deictic(alias) {
                entity.add_alias(alias);
            }
        }
        let spans = self
            .mentions
            .iter()
            .map(|m| EntitySpan {
                entity_id: entity.id.clone(),
                start: m.start,
                end: m.end,
                surface: self.surface.clone(),
                sentence_index: m.sentence_index,
            })
            .collect();
        Some((entity, spans))
    }
}

/// Aggregates mention signals per normalized surface form.
#[derive(Debug, Default)]
pub struct EvidenceAccumulator {
    candidates: BTreeMap<String, EntityCandidate>,
}

impl EvidenceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one mention into the accumulator.
    pub fn observe(&mut self, ctx: &MentionContext) {
        let normalized = prose_graph::normalize_name(&ctx.text);
        if normalized.is_empty() {
            return;
        }
        let candidate = self
            .candidates
            .entry(normalized.clone())
            .or_insert_with(|| EntityCandidate::new(&normalized, ctx));

        candidate.mention_count += 1;
        candidate.mentions.push(MentionOffset {
            start: ctx.start,
            end: ctx.end,
            sentence_index: ctx.sentence_index,
        });
        if ctx.text.len() > candidate.surface.len() {
            candidate.surface = ctx.text.clone();
        }
        if !ctx.is_sentence_initial {
            candidate.sentence_initial_only = false;
        }
        if ctx.determiner.is_some() {
            candidate.seen_with_determiner = true;
        }

        if let Some(label) = &ctx.ner_label {
            *candidate.ner_votes.entry(label.clone()).or_insert(0) += 1;
            Signals::bump(&mut candidate.signals.ner, 0.3);
        }
        if ctx.is_verb_subject {
            let strong = ctx
                .verb_lemma
                .as_deref()
                .map(lexicon::is_strong_agentive_verb)
                .unwrap_or(false);
            Signals::bump(&mut candidate.signals.syntax, if strong { 0.4 } else { 0.2 });
        } else if ctx.is_verb_object {
            Signals::bump(&mut candidate.signals.syntax, 0.15);
        }
        if ctx.has_role_word {
            Signals::bump(&mut candidate.signals.role, 0.35);
        }
        if ctx.has_title {
            Signals::bump(&mut candidate.signals.role, 0.4);
        }
        if ctx.coref_links_count > 0 {
            Signals::bump(&mut candidate.signals.coref, 0.1 * ctx.coref_links_count as f64);
        }
        if ctx.is_vocative {
            Signals::bump(&mut candidate.signals.vocative, 0.3);
        }

        candidate.decide_type();
        if candidate.gender == Gender::Unknown {
            candidate.gender = infer_gender(
                &candidate.surface,
                ctx.title.as_deref(),
                ctx.role_word.as_deref(),
            );
        }
        trace!(
            form = %candidate.normalized,
            mentions = candidate.mention_count,
            combined = candidate.signals.combined(candidate.mention_count),
            "observed mention"
        );
    }

    /// Drain candidates in deterministic (normalized form) order.
    pub fn into_candidates(self) -> Vec<EntityCandidate> {
        self.candidates.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ner_mention(text: &str, start: usize, sentence: usize) -> MentionContext {
        let mut ctx = MentionContext::new(text, start, sentence);
        ctx.ner_label = Some("PERSON".to_string());
        ctx
    }

    #[test]
    fn single_ner_mention_is_possible() {
        let mut acc = EvidenceAccumulator::new();
        acc.observe(&ner_mention("Gimli", 0, 0));
        let candidates = acc.into_candidates();
        assert_eq!(candidates.len(), 1);
        let level = PromotionLevel::decide(&candidates[0].signals, candidates[0].mention_count);
        assert_eq!(level, PromotionLevel::Possible);
    }

    #[test]
    fn strong_subject_with_ner_is_definite() {
        let mut acc = EvidenceAccumulator::new();
        let mut ctx = ner_mention("Aragorn", 0, 0);
        ctx.is_verb_subject = true;
        ctx.verb_lemma = Some("marry".to_string());
        acc.observe(&ctx);
        let candidates = acc.into_candidates();
        let level = PromotionLevel::decide(&candidates[0].signals, candidates[0].mention_count);
        assert_eq!(level, PromotionLevel::Definite);
    }

    #[test]
    fn repeat_mentions_promote() {
        let mut acc = EvidenceAccumulator::new();
        acc.observe(&MentionContext::new("Shire", 0, 0));
        acc.observe(&MentionContext::new("Shire", 40, 1));
        let candidates = acc.into_candidates();
        assert_eq!(candidates[0].mention_count, 2);
        let level = PromotionLevel::decide(&candidates[0].signals, candidates[0].mention_count);
        assert_eq!(level, PromotionLevel::Likely);
    }

    #[test]
    fn combined_score_caps_at_one() {
        let signals = Signals {
            ner: 1.0,
            syntax: 1.0,
            role: 1.0,
            coref: 1.0,
            vocative: 1.0,
        };
        assert_eq!(signals.combined(5), 1.0);
    }

    #[test]
    fn materialized_confidence_respects_tier_bands() {
        let mut acc = EvidenceAccumulator::new();
        let mut ctx = ner_mention("Aragorn", 0, 0);
        ctx.is_verb_subject = true;
        ctx.verb_lemma = Some("marry".to_string());
        acc.observe(&ctx);
        let candidate = acc.into_candidates().remove(0);
        let (entity, spans) = candidate.materialize(PromotionLevel::Definite, 7).unwrap();
        assert!(entity.confidence >= 0.75);
        assert_eq!(entity.tier, prose_graph::Tier::A);
        assert_eq!(spans.len(), 1);
        assert_eq!(entity.id, "person:aragorn");
    }

    #[test]
    fn type_votes_pick_majority_label() {
        let mut acc = EvidenceAccumulator::new();
        let mut a = MentionContext::new("Hogwarts", 0, 0);
        a.ner_label = Some("ORG".to_string());
        let mut b = MentionContext::new("Hogwarts", 30, 1);
        b.ner_label = Some("ORG".to_string());
        let mut c = MentionContext::new("Hogwarts", 60, 2);
        c.ner_label = Some("GPE".to_string());
        for ctx in [&a, &b, &c] {
            acc.observe(ctx);
        }
        let candidate = acc.into_candidates().remove(0);
        assert_eq!(candidate.entity_type, EntityType::Org);
    }
}
