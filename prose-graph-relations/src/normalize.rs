//! Relation normalization: canonicalize, guard, deduplicate.
//!
//! Normalization never throws. Unknown predicates and missing endpoints
//! are dropped with a structured [`Violation`]; type-guard mismatches the
//! same. Duplicates collapse by canonical key (canonical subject name,
//! canonical predicate, canonical object name - direction retained), with
//! max confidence, unioned evidence, and extractor priority
//! `dep > regex > others`.

use std::collections::BTreeMap;

use prose_graph::{guard_for, Entity, EntityType, Predicate, Relation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonical::resolve_predicate;
use crate::raw::RawRelation;

/// Why a raw relation was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Subject or object type not allowed by the predicate's guard.
    TypeConstraint,
    /// Predicate missing from the closed predicate set and alias map.
    UnknownPredicate,
    /// Empty predicate, missing entity, or other structural defect.
    Malformed,
}

/// One dropped relation, for the statistics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    pub pred: String,
    pub subj: String,
    pub obj: String,
    pub detail: String,
}

/// Dedup configuration.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Deduplicate at all (the `DEDUPLICATE` switch).
    pub deduplicate: bool,
    /// Key on raw entity ids instead of canonical names (`DEDUP_RAW`).
    pub raw_keys: bool,
    /// Emit per-merge debug events (`DEDUP_DEBUG`).
    pub debug: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            deduplicate: true,
            raw_keys: false,
            debug: false,
        }
    }
}

/// Result of a normalization run.
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub relations: Vec<Relation>,
    pub violations: Vec<Violation>,
    /// Raw relations that merged into an existing representative.
    pub duplicates_merged: usize,
    /// Raw input count, for the dedup ratio.
    pub input_count: usize,
}

impl NormalizeOutcome {
    /// Fraction of input relations that survived dedup.
    pub fn dedup_ratio(&self) -> f64 {
        if self.input_count == 0 {
            1.0
        } else {
            self.relations.len() as f64 / self.input_count as f64
        }
    }
}

/// The relation normalizer. Holds the entity views it needs: id ->
/// (canonical, type).
#[derive(Debug, Default)]
pub struct RelationNormalizer {
    config: NormalizerConfig,
    entity_types: BTreeMap<String, EntityType>,
    canonical_names: BTreeMap<String, String>,
}

impl RelationNormalizer {
    pub fn new<'a>(
        config: NormalizerConfig,
        entities: impl Iterator<Item = &'a Entity>,
    ) -> Self {
        let mut entity_types = BTreeMap::new();
        let mut canonical_names = BTreeMap::new();
        for entity in entities {
            entity_types.insert(entity.id.clone(), entity.entity_type);
            canonical_names.insert(entity.id.clone(), entity.canonical.to_lowercase());
        }
        Self {
            config,
            entity_types,
            canonical_names,
        }
    }

    /// Normalize a batch of raw relations in traversal order.
    pub fn normalize(&self, raw: Vec<RawRelation>) -> NormalizeOutcome {
        let mut outcome = NormalizeOutcome {
            input_count: raw.len(),
            ..Default::default()
        };
        // canonical key -> index into outcome.relations
        let mut by_key: BTreeMap<String, usize> = BTreeMap::new();

        for relation in raw {
            let Some(predicate) = self.check(&relation, &mut outcome.violations) else {
                continue;
            };

            if !self.config.deduplicate {
                outcome.relations.push(self.build(&relation, predicate));
                continue;
            }

            let key = self.canonical_key(&relation, predicate);
            match by_key.get(&key) {
                Some(&index) => {
                    outcome.duplicates_merged += 1;
                    if self.config.debug {
                        debug!(key = %key, "merging duplicate relation");
                    }
                    merge_into(&mut outcome.relations[index], &relation);
                }
                None => {
                    by_key.insert(key, outcome.relations.len());
                    outcome.relations.push(self.build(&relation, predicate));
                }
            }
        }
        outcome
    }

    /// Validate one raw relation; `None` means a violation was recorded.
    fn check(&self, relation: &RawRelation, violations: &mut Vec<Violation>) -> Option<Predicate> {
        if relation.pred.trim().is_empty() {
            violations.push(violation(relation, ViolationKind::Malformed, "empty predicate"));
            return None;
        }
        let Some(predicate) = resolve_predicate(&relation.pred) else {
            violations.push(violation(
                relation,
                ViolationKind::UnknownPredicate,
                "predicate not in guard table",
            ));
            return None;
        };
        let (Some(&subj_type), Some(&obj_type)) = (
            self.entity_types.get(&relation.subj),
            self.entity_types.get(&relation.obj),
        ) else {
            violations.push(violation(relation, ViolationKind::Malformed, "unknown endpoint"));
            return None;
        };
        let guard = guard_for(predicate);
        if !guard.allows(subj_type, obj_type) {
            violations.push(violation(
                relation,
                ViolationKind::TypeConstraint,
                "subject or object type not allowed",
            ));
            return None;
        }
        Some(predicate)
    }

    /// Canonical dedup key; direction is retained.
    fn canonical_key(&self, relation: &RawRelation, predicate: Predicate) -> String {
        if self.config.raw_keys {
            return format!("{}::{}::{}", relation.subj, predicate.as_str(), relation.obj);
        }
        let subj = self
            .canonical_names
            .get(&relation.subj)
            .cloned()
            .unwrap_or_else(|| relation.subj.to_lowercase());
        let obj = self
            .canonical_names
            .get(&relation.obj)
            .cloned()
            .unwrap_or_else(|| relation.obj.to_lowercase());
        format!("{}::{}::{}", subj, predicate.as_str(), obj)
    }

    fn build(&self, raw: &RawRelation, predicate: Predicate) -> Relation {
        let mut relation = Relation::new(
            &raw.subj,
            predicate,
            &raw.obj,
            raw.confidence,
            raw.extractor,
        );
        relation.evidence = raw.evidence.clone();
        relation.subj_surface = raw.subj_surface.clone();
        relation.obj_surface = raw.obj_surface.clone();
        relation
    }
}

fn violation(relation: &RawRelation, kind: ViolationKind, detail: &str) -> Violation {
    Violation {
        kind,
        pred: relation.pred.clone(),
        subj: relation.subj.clone(),
        obj: relation.obj.clone(),
        detail: detail.to_string(),
    }
}

/// Merge a duplicate into its representative: max confidence, evidence
/// union, extractor priority.
fn merge_into(representative: &mut Relation, duplicate: &RawRelation) {
    representative.confidence = representative.confidence.max(duplicate.confidence);
    if duplicate.extractor.priority() > representative.extractor.priority() {
        representative.extractor = duplicate.extractor;
    }
    for evidence in &duplicate.evidence {
        let key = evidence.dedup_key();
        if !representative.evidence.iter().any(|e| e.dedup_key() == key) {
            representative.evidence.push(evidence.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prose_graph::{Evidence, Extractor};

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new(EntityType::Person, "Dumbledore", 0.9, 0),
            Entity::new(EntityType::Org, "Hogwarts", 0.8, 0),
            Entity::new(EntityType::Person, "Harry", 0.9, 0),
        ]
    }

    fn normalizer() -> RelationNormalizer {
        let entities = entities();
        RelationNormalizer::new(NormalizerConfig::default(), entities.iter())
    }

    fn raw(subj: &str, pred: &str, obj: &str, conf: f64, extractor: Extractor, span: (usize, usize)) -> RawRelation {
        RawRelation::new(subj, pred, obj, conf, extractor).with_evidence(Evidence::raw(
            "doc",
            span.0,
            span.1,
            "evidence",
            0,
        ))
    }

    #[test]
    fn predicate_aliases_collapse_to_one_relation() {
        let outcome = normalizer().normalize(vec![
            raw("person:dumbledore", "heads", "org:hogwarts", 0.8, Extractor::Dep, (0, 10)),
            raw("person:dumbledore", "leads", "org:hogwarts", 0.7, Extractor::Regex, (20, 30)),
        ]);
        assert_eq!(outcome.relations.len(), 1);
        let merged = &outcome.relations[0];
        assert_eq!(merged.pred, Predicate::Leads);
        assert_eq!(merged.confidence, 0.8);
        assert_eq!(merged.evidence.len(), 2);
        assert_eq!(merged.extractor, Extractor::Dep);
        assert_eq!(outcome.duplicates_merged, 1);
    }

    #[test]
    fn symmetric_predicates_keep_both_directions() {
        let normalizer = {
            let entities = vec![
                Entity::new(EntityType::Person, "Aragorn", 0.9, 0),
                Entity::new(EntityType::Person, "Arwen", 0.9, 0),
            ];
            RelationNormalizer::new(NormalizerConfig::default(), entities.iter())
        };
        let outcome = normalizer.normalize(vec![
            raw("person:aragorn", "married_to", "person:arwen", 0.8, Extractor::Dep, (0, 10)),
            raw("person:arwen", "married_to", "person:aragorn", 0.8, Extractor::Dep, (0, 10)),
        ]);
        assert_eq!(outcome.relations.len(), 2);
    }

    #[test]
    fn type_guard_violations_are_counted_not_fatal() {
        let outcome = normalizer().normalize(vec![raw(
            "org:hogwarts",
            "married_to",
            "person:harry",
            0.9,
            Extractor::Dep,
            (0, 10),
        )]);
        assert!(outcome.relations.is_empty());
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind, ViolationKind::TypeConstraint);
    }

    #[test]
    fn unknown_predicates_and_endpoints_are_malformed() {
        let outcome = normalizer().normalize(vec![
            raw("person:harry", "frobnicates", "org:hogwarts", 0.9, Extractor::Dep, (0, 10)),
            raw("person:ghost", "works_at", "org:hogwarts", 0.9, Extractor::Dep, (0, 10)),
            raw("person:harry", "", "org:hogwarts", 0.9, Extractor::Dep, (0, 10)),
        ]);
        assert!(outcome.relations.is_empty());
        let kinds: Vec<ViolationKind> = outcome.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::UnknownPredicate,
                ViolationKind::Malformed,
                ViolationKind::Malformed
            ]
        );
    }

    #[test]
    fn dedup_can_be_disabled() {
        let entities = entities();
        let normalizer = RelationNormalizer::new(
            NormalizerConfig {
                deduplicate: false,
                ..Default::default()
            },
            entities.iter(),
        );
        let outcome = normalizer.normalize(vec![
            raw("person:dumbledore", "leads", "org:hogwarts", 0.8, Extractor::Dep, (0, 10)),
            raw("person:dumbledore", "leads", "org:hogwarts", 0.7, Extractor::Dep, (0, 10)),
        ]);
        assert_eq!(outcome.relations.len(), 2);
    }

    #[test]
    fn evidence_union_drops_duplicate_spans() {
        let outcome = normalizer().normalize(vec![
            raw("person:harry", "studies_at", "org:hogwarts", 0.6, Extractor::Dep, (5, 15)),
            raw("person:harry", "studies_at", "org:hogwarts", 0.7, Extractor::Regex, (5, 15)),
        ]);
        assert_eq!(outcome.relations.len(), 1);
        assert_eq!(outcome.relations[0].evidence.len(), 1);
        assert_eq!(outcome.relations[0].confidence, 0.7);
    }
}
