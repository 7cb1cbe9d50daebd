//! User corrections and the patterns learned from them.
//!
//! Corrections are append-only with monotonic timestamps; they survive
//! re-extraction and are replayed against every fresh graph. Learned
//! patterns generalize corrections into reusable rules, merged by
//! signature and tuned by validation feedback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;

/// The kind of edit a correction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionType {
    EntityType,
    EntityMerge,
    EntitySplit,
    EntityReject,
    EntityRestore,
    AliasAdd,
    AliasRemove,
    CanonicalChange,
    RelationAdd,
    RelationRemove,
    RelationEdit,
}

impl CorrectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionType::EntityType => "entity_type",
            CorrectionType::EntityMerge => "entity_merge",
            CorrectionType::EntitySplit => "entity_split",
            CorrectionType::EntityReject => "entity_reject",
            CorrectionType::EntityRestore => "entity_restore",
            CorrectionType::AliasAdd => "alias_add",
            CorrectionType::AliasRemove => "alias_remove",
            CorrectionType::CanonicalChange => "canonical_change",
            CorrectionType::RelationAdd => "relation_add",
            CorrectionType::RelationRemove => "relation_remove",
            CorrectionType::RelationEdit => "relation_edit",
        }
    }
}

/// One persisted user edit.
///
/// `before` / `after` hold the edited fields as loose JSON values; which
/// keys are meaningful depends on `correction_type` (e.g. `type` for
/// `entity_type`, `canonical` for `canonical_change`, `alias` for the
/// alias operations, `subj`/`pred`/`obj` for `relation_add`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub id: String,
    #[serde(rename = "type")]
    pub correction_type: CorrectionType,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_id: Option<String>,
    /// Merge/split operations name several entities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub before: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub after: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub learned: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rolled_back: bool,
}

impl Correction {
    pub fn new(id: &str, correction_type: CorrectionType, timestamp: u64) -> Self {
        Self {
            id: id.to_string(),
            correction_type,
            timestamp,
            author: None,
            entity_id: None,
            relation_id: None,
            entity_ids: Vec::new(),
            before: BTreeMap::new(),
            after: BTreeMap::new(),
            reason: None,
            learned: BTreeMap::new(),
            rolled_back: false,
        }
    }

    pub fn with_entity(mut self, entity_id: &str) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn with_before(mut self, key: &str, value: serde_json::Value) -> Self {
        self.before.insert(key.to_string(), value);
        self
    }

    pub fn with_after(mut self, key: &str, value: serde_json::Value) -> Self {
        self.after.insert(key.to_string(), value);
        self
    }

    /// Convenience accessor for string-valued `after` fields.
    pub fn after_str(&self, key: &str) -> Option<&str> {
        self.after.get(key).and_then(|v| v.as_str())
    }

    pub fn before_str(&self, key: &str) -> Option<&str> {
        self.before.get(key).and_then(|v| v.as_str())
    }
}

/// Category of a learned pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    EntityType,
    EntityName,
    Relation,
    Confidence,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::EntityType => "entity_type",
            PatternType::EntityName => "entity_name",
            PatternType::Relation => "relation",
            PatternType::Confidence => "confidence",
        }
    }
}

/// Matching condition for a learned pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternCondition {
    /// Regex over the entity's canonical form.
    pub text_pattern: String,
    /// Restrict to entities currently typed this way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
}

/// What a learned pattern does when it matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reject: bool,
    /// Replacement template for canonical rewrites; `$1` is the first
    /// capture of the condition's `text_pattern`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
}

/// Lifetime usage counters for a learned pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternStats {
    pub applied: u64,
    pub validated: u64,
    pub rejected: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_applied: Option<u64>,
}

/// A rule mined from one or more corrections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedPattern {
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub text_pattern: String,
    pub condition: PatternCondition,
    pub action: PatternAction,
    #[serde(default)]
    pub stats: PatternStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_corrections: Vec<String>,
    pub active: bool,
    pub confidence: f64,
}

impl LearnedPattern {
    /// Dedup signature: same type, text pattern and action collapse into
    /// one pattern regardless of which corrections produced them.
    pub fn signature(&self) -> String {
        let action = serde_json::to_string(&self.action).unwrap_or_default();
        format!(
            "{}||{}||{}",
            self.pattern_type.as_str(),
            self.text_pattern,
            action
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_serializes_camel_case() {
        let c = Correction::new("c1", CorrectionType::EntityType, 42)
            .with_entity("place:gondor")
            .with_before("type", serde_json::json!("PLACE"))
            .with_after("type", serde_json::json!("ORG"));
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"entityId\""));
        assert!(json.contains("\"entity_type\""));
        let back: Correction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn signature_ignores_source_corrections() {
        let mut a = LearnedPattern {
            id: "p1".to_string(),
            pattern_type: PatternType::EntityType,
            text_pattern: "^Kingdom of .+$".to_string(),
            condition: PatternCondition {
                text_pattern: "^Kingdom of .+$".to_string(),
                entity_type: Some(EntityType::Place),
            },
            action: PatternAction {
                set_type: Some(EntityType::Org),
                ..Default::default()
            },
            stats: PatternStats::default(),
            source_corrections: vec!["c1".to_string()],
            active: true,
            confidence: 0.7,
        };
        let sig_a = a.signature();
        a.source_corrections.push("c2".to_string());
        a.id = "p2".to_string();
        assert_eq!(sig_a, a.signature());
    }
}
