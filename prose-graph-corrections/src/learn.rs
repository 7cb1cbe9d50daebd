//! Pattern learning: generalize corrections into reusable rules.
//!
//! Extraction is template-driven, never free-form regex synthesis: a
//! correction matches one of a few curated shapes ("Kingdom of *",
//! appositive drops, gerund rejects) or it teaches nothing. Patterns
//! merge by signature; validation feedback nudges confidence up or down
//! and deactivates patterns that sink below 0.3.

use once_cell::sync::Lazy;
use prose_graph::{
    Correction, CorrectionType, EntityType, LearnedPattern, PatternAction, PatternCondition,
    PatternStats, PatternType,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Curated name templates for `entity_type` corrections.
const NAME_TEMPLATES: &[(&str, &str)] = &[
    ("kingdom-of", r"^Kingdom of .+$"),
    ("house-of", r"^House of .+$"),
    ("the-prefixed", r"^The .+$"),
    ("empire-suffixed", r"^.+ Empire$"),
];

static APPOSITIVE_DROP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][\w'-]+), the .+$").unwrap());
static PARENTAGE_DROP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][\w'-]+),? (?:son|daughter) of .+$").unwrap());
static GERUND_SHAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][a-z]+ing$").unwrap());
static LOWERCASE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]+$").unwrap());

/// Mine at most one pattern per category from a single correction.
pub fn extract_patterns(correction: &Correction) -> Vec<LearnedPattern> {
    let mut patterns = Vec::new();
    match correction.correction_type {
        CorrectionType::EntityType => {
            if let Some(pattern) = entity_type_pattern(correction) {
                patterns.push(pattern);
            }
        }
        CorrectionType::CanonicalChange => {
            if let Some(pattern) = canonical_pattern(correction) {
                patterns.push(pattern);
            }
        }
        CorrectionType::EntityReject => {
            if let Some(pattern) = reject_pattern(correction) {
                patterns.push(pattern);
            }
        }
        _ => {}
    }
    patterns
}

fn entity_type_pattern(correction: &Correction) -> Option<LearnedPattern> {
    let canonical = correction
        .after_str("canonical")
        .or_else(|| correction.before_str("canonical"))?;
    let before_type = correction.before_str("type").and_then(EntityType::parse);
    let after_type = correction.after_str("type").and_then(EntityType::parse)?;

    let (slug, template) = NAME_TEMPLATES.iter().find(|(_, template)| {
        Regex::new(template)
            .map(|r| r.is_match(canonical))
            .unwrap_or(false)
    })?;

    Some(build_pattern(
        correction,
        PatternType::EntityType,
        &format!("lp-type-{slug}"),
        template,
        PatternCondition {
            text_pattern: (*template).to_string(),
            entity_type: before_type,
        },
        PatternAction {
            set_type: Some(after_type),
            ..Default::default()
        },
        0.7,
    ))
}

fn canonical_pattern(correction: &Correction) -> Option<LearnedPattern> {
    let before = correction.before_str("canonical")?;
    let after = correction.after_str("canonical")?;

    let (slug, regex, confidence) = if let Some(caps) = PARENTAGE_DROP.captures(before) {
        (caps.get(1)?.as_str() == after).then_some(())?;
        ("parentage-drop", PARENTAGE_DROP.as_str(), 0.8)
    } else if let Some(caps) = APPOSITIVE_DROP.captures(before) {
        (caps.get(1)?.as_str() == after).then_some(())?;
        ("appositive-drop", APPOSITIVE_DROP.as_str(), 0.75)
    } else {
        return None;
    };

    Some(build_pattern(
        correction,
        PatternType::EntityName,
        &format!("lp-name-{slug}"),
        regex,
        PatternCondition {
            text_pattern: regex.to_string(),
            entity_type: None,
        },
        PatternAction {
            rewrite: Some("$1".to_string()),
            ..Default::default()
        },
        confidence,
    ))
}

fn reject_pattern(correction: &Correction) -> Option<LearnedPattern> {
    let canonical = correction.before_str("canonical")?;
    let before_type = correction.before_str("type").and_then(EntityType::parse);

    let (slug, regex, confidence) = if GERUND_SHAPED.is_match(canonical) {
        ("gerund", GERUND_SHAPED.as_str(), 0.6)
    } else if LOWERCASE_WORD.is_match(canonical) {
        ("lowercase", LOWERCASE_WORD.as_str(), 0.7)
    } else {
        return None;
    };

    Some(build_pattern(
        correction,
        PatternType::EntityType,
        &format!("lp-reject-{slug}"),
        regex,
        PatternCondition {
            text_pattern: regex.to_string(),
            entity_type: before_type,
        },
        PatternAction {
            reject: true,
            ..Default::default()
        },
        confidence,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_pattern(
    correction: &Correction,
    pattern_type: PatternType,
    id: &str,
    text_pattern: &str,
    condition: PatternCondition,
    action: PatternAction,
    confidence: f64,
) -> LearnedPattern {
    LearnedPattern {
        id: id.to_string(),
        pattern_type,
        text_pattern: text_pattern.to_string(),
        condition,
        action,
        stats: PatternStats::default(),
        source_corrections: vec![correction.id.clone()],
        active: true,
        confidence,
    }
}

/// What an applied pattern wants changed on a fresh entity candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternApplication {
    pub pattern_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_confidence: Option<f64>,
    #[serde(default)]
    pub reject: bool,
}

/// The accumulating store of learned patterns.
///
/// The single mutable shared resource in the system; callers serialize
/// writes at the store boundary.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternStore {
    patterns: Vec<LearnedPattern>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns(patterns: Vec<LearnedPattern>) -> Self {
        let mut store = Self::new();
        for pattern in patterns {
            store.merge(pattern);
        }
        store
    }

    pub fn patterns(&self) -> &[LearnedPattern] {
        &self.patterns
    }

    /// Merge by signature: an existing pattern absorbs the newcomer's
    /// source corrections and gains a little confidence (cap 0.95).
    pub fn merge(&mut self, pattern: LearnedPattern) {
        let signature = pattern.signature();
        match self
            .patterns
            .iter_mut()
            .find(|p| p.signature() == signature)
        {
            Some(existing) => {
                for source in &pattern.source_corrections {
                    if !existing.source_corrections.contains(source) {
                        existing.source_corrections.push(source.clone());
                    }
                }
                existing.confidence = (existing.confidence + 0.05).min(0.95);
            }
            None => self.patterns.push(pattern),
        }
    }

    /// Mine a correction and merge anything it teaches.
    pub fn learn_from(&mut self, correction: &Correction) -> usize {
        let mined = extract_patterns(correction);
        let count = mined.len();
        for pattern in mined {
            debug!(id = %pattern.id, "learned pattern");
            self.merge(pattern);
        }
        count
    }

    /// Positive validation feedback: +0.05, capped at 0.95.
    pub fn validate(&mut self, pattern_id: &str) {
        if let Some(pattern) = self.patterns.iter_mut().find(|p| p.id == pattern_id) {
            pattern.confidence = (pattern.confidence + 0.05).min(0.95);
            pattern.stats.validated += 1;
        }
    }

    /// Negative feedback: -0.1; below 0.3 the pattern deactivates.
    pub fn reject(&mut self, pattern_id: &str) {
        if let Some(pattern) = self.patterns.iter_mut().find(|p| p.id == pattern_id) {
            pattern.confidence -= 0.1;
            pattern.stats.rejected += 1;
            if pattern.confidence < 0.3 {
                pattern.active = false;
            }
        }
    }

    /// First active pattern (confidence >= 0.5) matching the candidate
    /// wins; returns what it wants changed.
    pub fn apply(&mut self, canonical: &str, entity_type: EntityType, now: u64) -> Option<PatternApplication> {
        for pattern in &mut self.patterns {
            if !pattern.active || pattern.confidence < 0.5 {
                continue;
            }
            if let Some(required) = pattern.condition.entity_type {
                if required != entity_type {
                    continue;
                }
            }
            let Ok(regex) = Regex::new(&pattern.condition.text_pattern) else {
                continue;
            };
            let Some(caps) = regex.captures(canonical) else {
                continue;
            };

            pattern.stats.applied += 1;
            pattern.stats.last_applied = Some(now);

            let new_canonical = pattern.action.rewrite.as_ref().and_then(|template| {
                let mut rewritten = String::new();
                caps.expand(template, &mut rewritten);
                (!rewritten.is_empty() && rewritten != canonical).then_some(rewritten)
            });
            return Some(PatternApplication {
                pattern_id: pattern.id.clone(),
                new_canonical,
                new_type: pattern.action.set_type,
                new_confidence: pattern.action.set_confidence,
                reject: pattern.action.reject,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_correction() -> Correction {
        Correction::new("c1", CorrectionType::EntityType, 1)
            .with_before("canonical", serde_json::json!("Kingdom of Gondor"))
            .with_before("type", serde_json::json!("PLACE"))
            .with_after("type", serde_json::json!("ORG"))
            .with_after("canonical", serde_json::json!("Kingdom of Gondor"))
    }

    #[test]
    fn entity_type_template_learns_a_rule() {
        let patterns = extract_patterns(&type_correction());
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.action.set_type, Some(EntityType::Org));
        assert_eq!(pattern.condition.entity_type, Some(EntityType::Place));
        assert_eq!(pattern.confidence, 0.7);
        assert_eq!(pattern.text_pattern, r"^Kingdom of .+$");
    }

    #[test]
    fn parentage_drop_learns_a_rewrite() {
        let correction = Correction::new("c2", CorrectionType::CanonicalChange, 1)
            .with_before("canonical", serde_json::json!("Aragorn, son of Arathorn"))
            .with_after("canonical", serde_json::json!("Aragorn"));
        let patterns = extract_patterns(&correction);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].action.rewrite.as_deref(), Some("$1"));
        assert_eq!(patterns[0].confidence, 0.8);
    }

    #[test]
    fn unrelated_corrections_teach_nothing() {
        let correction = Correction::new("c3", CorrectionType::CanonicalChange, 1)
            .with_before("canonical", serde_json::json!("Frodo"))
            .with_after("canonical", serde_json::json!("Frodo Baggins"));
        assert!(extract_patterns(&correction).is_empty());
    }

    #[test]
    fn signature_merge_bumps_confidence() {
        let mut store = PatternStore::new();
        store.learn_from(&type_correction());
        let again = Correction::new("c9", CorrectionType::EntityType, 2)
            .with_before("canonical", serde_json::json!("Kingdom of Rohan"))
            .with_before("type", serde_json::json!("PLACE"))
            .with_after("type", serde_json::json!("ORG"))
            .with_after("canonical", serde_json::json!("Kingdom of Rohan"));
        store.learn_from(&again);
        assert_eq!(store.patterns().len(), 1);
        let pattern = &store.patterns()[0];
        assert!((pattern.confidence - 0.75).abs() < 1e-9);
        assert_eq!(pattern.source_corrections, vec!["c1", "c9"]);
    }

    #[test]
    fn feedback_deactivates_sunk_patterns() {
        let mut store = PatternStore::new();
        store.learn_from(&type_correction());
        let id = store.patterns()[0].id.clone();
        store.validate(&id);
        assert!((store.patterns()[0].confidence - 0.75).abs() < 1e-9);
        for _ in 0..5 {
            store.reject(&id);
        }
        assert!(!store.patterns()[0].active);
    }

    #[test]
    fn application_rewrites_and_retypes() {
        let mut store = PatternStore::new();
        store.learn_from(&type_correction());
        let hit = store
            .apply("Kingdom of Rohan", EntityType::Place, 42)
            .unwrap();
        assert_eq!(hit.new_type, Some(EntityType::Org));
        assert!(!hit.reject);
        assert_eq!(store.patterns()[0].stats.applied, 1);
        assert_eq!(store.patterns()[0].stats.last_applied, Some(42));
        // wrong current type: no match
        assert!(store.apply("Kingdom of Rohan", EntityType::Org, 43).is_none());
    }

    #[test]
    fn low_confidence_patterns_do_not_apply() {
        let mut store = PatternStore::new();
        let reject = Correction::new("c4", CorrectionType::EntityReject, 1)
            .with_before("canonical", serde_json::json!("Walking"))
            .with_before("type", serde_json::json!("RACE"));
        store.learn_from(&reject);
        // gerund reject pattern starts at 0.6 and applies
        assert!(store.apply("Singing", EntityType::Race, 1).is_some());
        let id = store.patterns()[0].id.clone();
        store.reject(&id);
        store.reject(&id);
        // now at 0.4: below the 0.5 application floor
        assert!(store.apply("Singing", EntityType::Race, 2).is_none());
    }
}
