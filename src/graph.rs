//! The persisted knowledge graph document.
//!
//! Entities live in a flat arena keyed by stable string ids; relations
//! reference entities by id, never by pointer, so the naturally cyclic
//! entity graph (A `parent_of` B, B `child_of` A) needs no back-pointers.
//! Per-entity relation indexes are derived views, rebuilt on demand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::correction::{Correction, LearnedPattern};
use crate::entity::{normalize_name, Entity};
use crate::relation::Relation;

/// Version of the persisted JSON layout.
pub const SCHEMA_VERSION: u32 = 1;

/// One saved-run stamp appended on every persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionStamp {
    pub version: u32,
    pub created_at: u64,
    /// Aggregate stage counters captured at save time.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stats: BTreeMap<String, u64>,
}

/// The complete extraction output for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraph {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corrections: Vec<Correction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub learned_patterns: Vec<LearnedPattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<VersionStamp>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            ..Default::default()
        }
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Find by exact canonical name (normalized comparison).
    pub fn entity_by_canonical(&self, canonical: &str) -> Option<&Entity> {
        let norm = normalize_name(canonical);
        self.entities
            .iter()
            .find(|e| normalize_name(&e.canonical) == norm)
    }

    /// Find by any alias (normalized comparison).
    pub fn entity_by_alias(&self, alias: &str) -> Option<&Entity> {
        let norm = normalize_name(alias);
        self.entities
            .iter()
            .find(|e| e.aliases.iter().any(|a| normalize_name(a) == norm))
    }

    /// Correction-replay lookup order: id, then canonical, then alias.
    pub fn locate_entity(&self, id: Option<&str>, name: Option<&str>) -> Option<&Entity> {
        if let Some(id) = id {
            if let Some(e) = self.entity(id) {
                return Some(e);
            }
        }
        let name = name?;
        self.entity_by_canonical(name)
            .or_else(|| self.entity_by_alias(name))
    }

    pub fn relation(&self, id: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id == id)
    }

    /// Insert or replace an entity by id.
    pub fn upsert_entity(&mut self, entity: Entity) {
        if let Some(existing) = self.entity_mut(&entity.id) {
            *existing = entity;
        } else {
            self.entities.push(entity);
        }
    }

    /// Map from entity id to its canonical form, used for dedup keys.
    pub fn canonical_map(&self) -> BTreeMap<String, String> {
        self.entities
            .iter()
            .map(|e| (e.id.clone(), e.canonical.clone()))
            .collect()
    }

    /// Outgoing relations of an entity, in insertion order.
    pub fn outgoing(&self, entity_id: &str) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|r| r.subj == entity_id)
            .collect()
    }

    /// Incoming relations of an entity, in insertion order.
    pub fn incoming(&self, entity_id: &str) -> Vec<&Relation> {
        self.relations
            .iter()
            .filter(|r| r.obj == entity_id)
            .collect()
    }

    /// Entities that passed the quality filter.
    pub fn accepted_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| !e.rejected)
    }

    /// Append a version stamp for this save.
    pub fn stamp_version(&mut self, created_at: u64, stats: BTreeMap<String, u64>) {
        let next = self.versions.last().map(|v| v.version + 1).unwrap_or(1);
        self.versions.push(VersionStamp {
            version: next,
            created_at,
            stats,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::relation::{Extractor, Predicate};

    fn graph_with_pair() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        let mut aragorn = Entity::new(EntityType::Person, "Aragorn", 0.9, 0);
        aragorn.add_alias("Strider");
        graph.entities.push(aragorn);
        graph
            .entities
            .push(Entity::new(EntityType::Person, "Arwen", 0.8, 0));
        graph.relations.push(Relation::new(
            "person:aragorn",
            Predicate::MarriedTo,
            "person:arwen",
            0.8,
            Extractor::Dep,
        ));
        graph
    }

    #[test]
    fn locate_entity_falls_back_through_canonical_and_alias() {
        let graph = graph_with_pair();
        assert!(graph.locate_entity(Some("person:aragorn"), None).is_some());
        assert_eq!(
            graph.locate_entity(Some("person:gone"), Some("aragorn")).map(|e| e.id.as_str()),
            Some("person:aragorn")
        );
        assert_eq!(
            graph.locate_entity(None, Some("strider")).map(|e| e.id.as_str()),
            Some("person:aragorn")
        );
        assert!(graph.locate_entity(None, Some("Gimli")).is_none());
    }

    #[test]
    fn derived_indexes_follow_direction() {
        let graph = graph_with_pair();
        assert_eq!(graph.outgoing("person:aragorn").len(), 1);
        assert_eq!(graph.incoming("person:aragorn").len(), 0);
        assert_eq!(graph.incoming("person:arwen").len(), 1);
    }

    #[test]
    fn version_stamps_are_monotonic() {
        let mut graph = graph_with_pair();
        graph.stamp_version(10, BTreeMap::new());
        graph.stamp_version(20, BTreeMap::new());
        assert_eq!(graph.versions[0].version, 1);
        assert_eq!(graph.versions[1].version, 2);
    }

    #[test]
    fn persisted_layout_uses_camel_case_collections() {
        let mut graph = graph_with_pair();
        graph.learned_patterns = Vec::new();
        let json = serde_json::to_string(&graph).unwrap();
        assert!(json.contains("\"entities\""));
        assert!(json.contains("\"schemaVersion\""));
        let back: KnowledgeGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }
}
