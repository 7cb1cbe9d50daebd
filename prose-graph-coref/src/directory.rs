//! Read-only entity lookups shared by the coref and quote passes.

use std::collections::BTreeMap;

use prose_graph::{normalize_name, Entity, EntityType, Gender};

use crate::salience::Number;

/// What the resolver needs to know about one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub canonical: String,
    pub gender: Gender,
    pub entity_type: EntityType,
    pub number: Number,
}

/// Immutable id -> entity facts map for one document run.
#[derive(Debug, Default)]
pub struct EntityDirectory {
    by_id: BTreeMap<String, DirectoryEntry>,
}

impl EntityDirectory {
    /// Build from the accepted entities of a graph.
    pub fn from_entities<'a>(entities: impl Iterator<Item = &'a Entity>) -> Self {
        let mut by_id = BTreeMap::new();
        for entity in entities {
            // Groups read as plural for pronoun agreement; everything else
            // defaults to singular.
            let number = match entity.entity_type {
                EntityType::Org
                | EntityType::House
                | EntityType::Tribe
                | EntityType::Race
                | EntityType::Species => Number::Plural,
                _ => Number::Singular,
            };
            let gender = if entity.entity_type == EntityType::Person {
                entity.gender
            } else {
                Gender::Neutral
            };
            by_id.insert(
                entity.id.clone(),
                DirectoryEntry {
                    canonical: entity.canonical.clone(),
                    gender,
                    entity_type: entity.entity_type,
                    number,
                },
            );
        }
        Self { by_id }
    }

    pub fn get(&self, entity_id: &str) -> Option<&DirectoryEntry> {
        self.by_id.get(entity_id)
    }

    /// Find an entity whose canonical form matches `name` exactly, or
    /// contains/is contained by it (part match), case-insensitively.
    pub fn match_name(&self, name: &str) -> Option<(&String, &DirectoryEntry)> {
        let norm = normalize_name(name);
        if norm.is_empty() {
            return None;
        }
        // exact first
        if let Some(hit) = self
            .by_id
            .iter()
            .find(|(_, e)| normalize_name(&e.canonical) == norm)
        {
            return Some(hit);
        }
        self.by_id.iter().find(|(_, e)| {
            let canon = normalize_name(&e.canonical);
            (norm.len() >= 3 && canon.contains(&norm)) || (canon.len() >= 3 && norm.contains(&canon))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_match_finds_surnames() {
        let mut harry = Entity::new(EntityType::Person, "Harry Potter", 0.8, 0);
        harry.gender = Gender::Male;
        let dir = EntityDirectory::from_entities([harry].iter());
        assert!(dir.match_name("Harry").is_some());
        assert!(dir.match_name("Potter").is_some());
        assert!(dir.match_name("Hermione").is_none());
    }

    #[test]
    fn non_person_entities_read_neutral() {
        let org = Entity::new(EntityType::Org, "Hogwarts", 0.8, 0);
        let dir = EntityDirectory::from_entities([org].iter());
        let (_, entry) = dir.match_name("Hogwarts").unwrap();
        assert_eq!(entry.gender, Gender::Neutral);
        assert_eq!(entry.number, Number::Plural);
    }
}
