//! Deterministic correction replay.
//!
//! Matching is strict: an affected entity is located by id, then by exact
//! canonical name, then by alias - nothing fuzzier. A correction whose
//! target cannot be found is skipped and reported; replay never fails the
//! pipeline. Applying the same correction list twice converges (id
//! lookups hit the same records, alias and merge operations are
//! set-based, relation-add collisions are detected by key).

use prose_graph::{
    Correction, CorrectionType, EntityType, Extractor, KnowledgeGraph, Predicate, Relation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A correction that could not be applied, with a short diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayConflict {
    pub correction_id: String,
    pub diagnosis: String,
}

/// Aggregate result of one replay run.
#[derive(Debug, Default, PartialEq)]
pub struct ReplayReport {
    pub applied: usize,
    pub skipped: usize,
    pub conflicts: Vec<ReplayConflict>,
}

/// Applies stored corrections to a fresh graph.
#[derive(Debug, Default)]
pub struct OverrideManager;

impl OverrideManager {
    pub fn new() -> Self {
        Self
    }

    /// Replay `corrections` against `graph` in ascending timestamp order.
    pub fn replay(&self, graph: &mut KnowledgeGraph, corrections: &[Correction]) -> ReplayReport {
        let mut report = ReplayReport::default();

        let mut ordered: Vec<&Correction> =
            corrections.iter().filter(|c| !c.rolled_back).collect();
        ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        for correction in ordered {
            match self.apply_one(graph, correction) {
                Applied::Yes => report.applied += 1,
                Applied::Skipped(diagnosis) => {
                    debug!(id = %correction.id, %diagnosis, "correction skipped");
                    report.skipped += 1;
                    report.conflicts.push(ReplayConflict {
                        correction_id: correction.id.clone(),
                        diagnosis,
                    });
                }
            }
        }
        report
    }

    fn apply_one(&self, graph: &mut KnowledgeGraph, correction: &Correction) -> Applied {
        match correction.correction_type {
            CorrectionType::EntityType => self.entity_type(graph, correction),
            CorrectionType::EntityMerge => self.entity_merge(graph, correction),
            CorrectionType::EntitySplit => Applied::Skipped(
                "entity_split is not replayed: split outcomes are unstable under re-extraction"
                    .to_string(),
            ),
            CorrectionType::EntityReject => self.set_rejected(graph, correction, true),
            CorrectionType::EntityRestore => self.set_rejected(graph, correction, false),
            CorrectionType::AliasAdd => self.alias(graph, correction, true),
            CorrectionType::AliasRemove => self.alias(graph, correction, false),
            CorrectionType::CanonicalChange => self.canonical_change(graph, correction),
            CorrectionType::RelationAdd => self.relation_add(graph, correction),
            CorrectionType::RelationRemove => self.relation_remove(graph, correction),
            CorrectionType::RelationEdit => self.relation_edit(graph, correction),
        }
    }

    /// id -> canonical -> alias lookup, per the matching policy.
    fn locate<'a>(
        &self,
        graph: &'a KnowledgeGraph,
        correction: &Correction,
    ) -> Option<&'a str> {
        let name = correction
            .after_str("canonical")
            .or_else(|| correction.before_str("canonical"));
        graph
            .locate_entity(correction.entity_id.as_deref(), name)
            .map(|e| e.id.as_str())
    }

    fn entity_type(&self, graph: &mut KnowledgeGraph, correction: &Correction) -> Applied {
        let Some(id) = self.locate(graph, correction).map(String::from) else {
            return Applied::Skipped("entity not found".to_string());
        };
        let Some(new_type) = correction.after_str("type").and_then(EntityType::parse) else {
            return Applied::Skipped("missing or unknown target type".to_string());
        };
        let Some(entity) = graph.entity_mut(&id) else {
            return Applied::Skipped("entity not found".to_string());
        };
        entity.entity_type = new_type;
        entity.manual_override = true;
        Applied::Yes
    }

    fn entity_merge(&self, graph: &mut KnowledgeGraph, correction: &Correction) -> Applied {
        // resolve all named entities that still exist
        let mut found: Vec<String> = Vec::new();
        for entity_id in &correction.entity_ids {
            if let Some(entity) =
                graph.locate_entity(Some(entity_id.as_str()), Some(entity_id.as_str()))
            {
                if !found.contains(&entity.id) {
                    found.push(entity.id.clone());
                }
            }
        }
        let Some((primary_id, absorbed)) = found.split_first() else {
            return Applied::Skipped("no merge source found".to_string());
        };
        if absorbed.is_empty() {
            // single survivor: nothing left to merge (idempotent re-run)
            if let Some(entity) = graph.entity_mut(primary_id) {
                entity.manual_override = true;
            }
            return Applied::Yes;
        }

        // union aliases and old canonicals into the primary
        let mut absorbed_names: Vec<(String, Vec<String>)> = Vec::new();
        for id in absorbed {
            if let Some(entity) = graph.entity(id) {
                absorbed_names.push((
                    entity.canonical.clone(),
                    entity.aliases.iter().cloned().collect(),
                ));
            }
        }
        {
            let Some(primary) = graph.entity_mut(primary_id) else {
                return Applied::Skipped("merge primary disappeared".to_string());
            };
            for (canonical, aliases) in &absorbed_names {
                primary.add_alias(canonical);
                for alias in aliases {
                    primary.add_alias(alias);
                }
            }
            primary.manual_override = true;
        }

        // rewrite relations to point at the primary
        let primary_id = primary_id.clone();
        for relation in &mut graph.relations {
            let mut changed = false;
            if absorbed.contains(&relation.subj) {
                relation.subj = primary_id.clone();
                changed = true;
            }
            if absorbed.contains(&relation.obj) {
                relation.obj = primary_id.clone();
                changed = true;
            }
            if changed {
                relation.id = Relation::make_id(&relation.subj, relation.pred, &relation.obj);
            }
        }

        // drop the absorbed entities
        graph.entities.retain(|e| !absorbed.contains(&e.id));
        Applied::Yes
    }

    fn set_rejected(
        &self,
        graph: &mut KnowledgeGraph,
        correction: &Correction,
        rejected: bool,
    ) -> Applied {
        let Some(id) = self.locate(graph, correction).map(String::from) else {
            return Applied::Skipped("entity not found".to_string());
        };
        let Some(entity) = graph.entity_mut(&id) else {
            return Applied::Skipped("entity not found".to_string());
        };
        entity.rejected = rejected;
        entity.manual_override = true;
        Applied::Yes
    }

    fn alias(&self, graph: &mut KnowledgeGraph, correction: &Correction, add: bool) -> Applied {
        let Some(alias) = correction.after_str("alias").or_else(|| correction.before_str("alias"))
        else {
            return Applied::Skipped("missing alias value".to_string());
        };
        let alias = alias.to_string();
        let Some(id) = self.locate(graph, correction).map(String::from) else {
            return Applied::Skipped("entity not found".to_string());
        };
        let Some(entity) = graph.entity_mut(&id) else {
            return Applied::Skipped("entity not found".to_string());
        };
        if add {
            entity.add_alias(&alias);
        } else {
            entity.aliases.remove(&alias);
        }
        entity.manual_override = true;
        Applied::Yes
    }

    fn canonical_change(&self, graph: &mut KnowledgeGraph, correction: &Correction) -> Applied {
        let Some(new_canonical) = correction.after_str("canonical").map(String::from) else {
            return Applied::Skipped("missing new canonical".to_string());
        };
        // locate by id first, then by the OLD canonical
        let located = graph
            .locate_entity(
                correction.entity_id.as_deref(),
                correction.before_str("canonical"),
            )
            .map(|e| e.id.clone())
            .or_else(|| {
                // idempotent re-run: the new canonical is already in place
                graph
                    .entity_by_canonical(&new_canonical)
                    .map(|e| e.id.clone())
            });
        let Some(id) = located else {
            return Applied::Skipped("entity not found".to_string());
        };
        let Some(entity) = graph.entity_mut(&id) else {
            return Applied::Skipped("entity not found".to_string());
        };
        if entity.canonical != new_canonical {
            entity.set_canonical(&new_canonical);
        }
        entity.manual_override = true;
        Applied::Yes
    }

    fn relation_add(&self, graph: &mut KnowledgeGraph, correction: &Correction) -> Applied {
        let (Some(subj_name), Some(pred_name), Some(obj_name)) = (
            correction.after_str("subj"),
            correction.after_str("pred"),
            correction.after_str("obj"),
        ) else {
            return Applied::Skipped("relation_add needs subj, pred and obj".to_string());
        };
        let Some(pred) = Predicate::parse(pred_name) else {
            return Applied::Skipped(format!("unknown predicate {pred_name:?}"));
        };
        let Some(subj_id) = graph
            .locate_entity(Some(subj_name), Some(subj_name))
            .map(|e| e.id.clone())
        else {
            return Applied::Skipped(format!("subject {subj_name:?} not in graph"));
        };
        let Some(obj_id) = graph
            .locate_entity(Some(obj_name), Some(obj_name))
            .map(|e| e.id.clone())
        else {
            return Applied::Skipped(format!("object {obj_name:?} not in graph"));
        };
        let id = Relation::make_id(&subj_id, pred, &obj_id);
        if graph.relation(&id).is_some() {
            // collision with an existing fact: idempotent no-op
            return Applied::Yes;
        }
        graph
            .relations
            .push(Relation::new(&subj_id, pred, &obj_id, 1.0, Extractor::Manual));
        Applied::Yes
    }

    fn relation_remove(&self, graph: &mut KnowledgeGraph, correction: &Correction) -> Applied {
        if let Some(relation_id) = &correction.relation_id {
            if graph.relation(relation_id).is_some() {
                graph.relations.retain(|r| &r.id != relation_id);
                return Applied::Yes;
            }
        }
        // fall back to the (subj, pred, obj) triple
        let (Some(subj), Some(pred), Some(obj)) = (
            correction.before_str("subj"),
            correction.before_str("pred"),
            correction.before_str("obj"),
        ) else {
            return Applied::Skipped("relation not found".to_string());
        };
        // removal of an already-absent relation is an idempotent no-op
        graph
            .relations
            .retain(|r| !(r.subj == subj && r.pred.as_str() == pred && r.obj == obj));
        Applied::Yes
    }

    fn relation_edit(&self, graph: &mut KnowledgeGraph, correction: &Correction) -> Applied {
        let Some(relation_id) = &correction.relation_id else {
            return Applied::Skipped("relation_edit needs a relation id".to_string());
        };
        let Some(relation) = graph.relations.iter_mut().find(|r| &r.id == relation_id) else {
            return Applied::Skipped("relation not found".to_string());
        };
        if let Some(confidence) = correction.after.get("confidence").and_then(|v| v.as_f64()) {
            relation.confidence = confidence.clamp(0.0, 1.0);
        }
        if let Some(pred) = correction.after_str("pred").and_then(Predicate::parse) {
            relation.pred = pred;
            relation.id = Relation::make_id(&relation.subj, relation.pred, &relation.obj);
        }
        relation.extractor = Extractor::Manual;
        Applied::Yes
    }
}

enum Applied {
    Yes,
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use prose_graph::Entity;

    fn gondor_graph() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph
            .entities
            .push(Entity::new(EntityType::Place, "Kingdom of Gondor", 0.8, 0));
        graph
    }

    #[test]
    fn entity_type_correction_survives_reextraction() {
        // stored corrections reference the old id; a fresh extraction
        // re-emits the entity with the same canonical
        let mut graph = gondor_graph();
        let corrections = vec![
            Correction::new("c1", CorrectionType::EntityType, 1)
                .with_entity("e1")
                .with_before("canonical", serde_json::json!("Kingdom of Gondor"))
                .with_before("type", serde_json::json!("PLACE"))
                .with_after("canonical", serde_json::json!("Kingdom of Gondor"))
                .with_after("type", serde_json::json!("ORG")),
            Correction::new("c2", CorrectionType::AliasAdd, 2)
                .with_entity("e1")
                .with_before("canonical", serde_json::json!("Kingdom of Gondor"))
                .with_after("canonical", serde_json::json!("Kingdom of Gondor"))
                .with_after("alias", serde_json::json!("Gondor")),
        ];
        let report = OverrideManager::new().replay(&mut graph, &corrections);
        assert_eq!(report.applied, 2);
        assert!(report.conflicts.is_empty());
        let entity = &graph.entities[0];
        assert_eq!(entity.entity_type, EntityType::Org);
        assert!(entity.aliases.contains("Gondor"));
        assert!(entity.manual_override);
    }

    #[test]
    fn replay_is_idempotent() {
        let mut graph = gondor_graph();
        let corrections = vec![Correction::new("c1", CorrectionType::AliasAdd, 1)
            .with_entity("place:kingdom-of-gondor")
            .with_after("alias", serde_json::json!("Gondor"))];
        let manager = OverrideManager::new();
        manager.replay(&mut graph, &corrections);
        let snapshot = graph.clone();
        manager.replay(&mut graph, &corrections);
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn merge_rewrites_relations_and_drops_absorbed() {
        let mut graph = KnowledgeGraph::new();
        graph
            .entities
            .push(Entity::new(EntityType::Person, "Aragorn", 0.9, 0));
        graph
            .entities
            .push(Entity::new(EntityType::Person, "Strider", 0.7, 0));
        graph
            .entities
            .push(Entity::new(EntityType::Person, "Arwen", 0.9, 0));
        graph.relations.push(Relation::new(
            "person:strider",
            Predicate::MarriedTo,
            "person:arwen",
            0.8,
            Extractor::Dep,
        ));

        let mut merge = Correction::new("c1", CorrectionType::EntityMerge, 1);
        merge.entity_ids = vec!["person:aragorn".to_string(), "person:strider".to_string()];
        let report = OverrideManager::new().replay(&mut graph, &[merge]);
        assert_eq!(report.applied, 1);
        assert!(graph.entity("person:strider").is_none());
        let aragorn = graph.entity("person:aragorn").unwrap();
        assert!(aragorn.aliases.contains("Strider"));
        assert_eq!(graph.relations[0].subj, "person:aragorn");
        assert_eq!(
            graph.relations[0].id,
            Relation::make_id("person:aragorn", Predicate::MarriedTo, "person:arwen")
        );
    }

    #[test]
    fn relation_add_requires_endpoints() {
        let mut graph = gondor_graph();
        let correction = Correction::new("c1", CorrectionType::RelationAdd, 1)
            .with_after("subj", serde_json::json!("Kingdom of Gondor"))
            .with_after("pred", serde_json::json!("located_in"))
            .with_after("obj", serde_json::json!("Middle-earth"));
        let report = OverrideManager::new().replay(&mut graph, &[correction]);
        assert_eq!(report.applied, 0);
        assert_eq!(report.conflicts.len(), 1);
        assert!(report.conflicts[0].diagnosis.contains("Middle-earth"));
    }

    #[test]
    fn manual_relations_carry_full_confidence_and_no_evidence() {
        let mut graph = KnowledgeGraph::new();
        graph
            .entities
            .push(Entity::new(EntityType::Person, "Harry", 0.9, 0));
        graph
            .entities
            .push(Entity::new(EntityType::Org, "Hogwarts", 0.8, 0));
        let correction = Correction::new("c1", CorrectionType::RelationAdd, 1)
            .with_after("subj", serde_json::json!("Harry"))
            .with_after("pred", serde_json::json!("studies_at"))
            .with_after("obj", serde_json::json!("Hogwarts"));
        let report = OverrideManager::new().replay(&mut graph, &[correction]);
        assert_eq!(report.applied, 1);
        let relation = &graph.relations[0];
        assert_eq!(relation.confidence, 1.0);
        assert_eq!(relation.extractor, Extractor::Manual);
        assert!(relation.evidence.is_empty());
    }

    #[test]
    fn entity_split_is_recorded_as_conflict() {
        let mut graph = gondor_graph();
        let correction = Correction::new("c1", CorrectionType::EntitySplit, 1);
        let report = OverrideManager::new().replay(&mut graph, &[correction]);
        assert_eq!(report.applied, 0);
        assert_eq!(report.skipped, 1);
        assert!(report.conflicts[0].diagnosis.contains("unstable"));
    }

    #[test]
    fn canonical_change_pushes_old_form_to_aliases() {
        let mut graph = gondor_graph();
        let correction = Correction::new("c1", CorrectionType::CanonicalChange, 1)
            .with_before("canonical", serde_json::json!("Kingdom of Gondor"))
            .with_after("canonical", serde_json::json!("Gondor"));
        let report = OverrideManager::new().replay(&mut graph, &[correction]);
        assert_eq!(report.applied, 1);
        let entity = &graph.entities[0];
        assert_eq!(entity.canonical, "Gondor");
        assert!(entity.aliases.contains("Kingdom of Gondor"));
    }

    #[test]
    fn corrections_apply_in_timestamp_order() {
        let mut graph = gondor_graph();
        // later rename wins regardless of list order
        let corrections = vec![
            Correction::new("c2", CorrectionType::CanonicalChange, 2)
                .with_before("canonical", serde_json::json!("Gondor"))
                .with_after("canonical", serde_json::json!("South Kingdom")),
            Correction::new("c1", CorrectionType::CanonicalChange, 1)
                .with_before("canonical", serde_json::json!("Kingdom of Gondor"))
                .with_after("canonical", serde_json::json!("Gondor")),
        ];
        let report = OverrideManager::new().replay(&mut graph, &corrections);
        assert_eq!(report.applied, 2);
        assert_eq!(graph.entities[0].canonical, "South Kingdom");
    }
}
