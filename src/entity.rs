//! Entities: typed, tiered, alias-bearing graph nodes.
//!
//! An entity id is a pure function of `(type, normalized canonical)` so the
//! same name extracted twice lands on the same node, and correction replay
//! can find its target after re-extraction. Rejected entities are retained
//! with `rejected = true` and their [`QualityDecision`] - never silently
//! deleted.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Closed set of entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "PERSON")]
    Person,
    #[serde(rename = "ORG")]
    Org,
    #[serde(rename = "PLACE")]
    Place,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "TIME")]
    Time,
    #[serde(rename = "WORK")]
    Work,
    #[serde(rename = "ITEM")]
    Item,
    #[serde(rename = "EVENT")]
    Event,
    #[serde(rename = "RACE")]
    Race,
    #[serde(rename = "SPECIES")]
    Species,
    #[serde(rename = "HOUSE")]
    House,
    #[serde(rename = "TRIBE")]
    Tribe,
    #[serde(rename = "TITLE")]
    Title,
    #[serde(rename = "ARTIFACT")]
    Artifact,
    #[serde(rename = "CREATURE")]
    Creature,
    #[serde(rename = "ABILITY")]
    Ability,
    #[serde(rename = "SPELL")]
    Spell,
    #[serde(rename = "LANGUAGE")]
    Language,
    #[serde(rename = "DEITY")]
    Deity,
    #[serde(rename = "VEHICLE")]
    Vehicle,
    #[serde(rename = "FOOD")]
    Food,
    #[serde(rename = "MATERIAL")]
    Material,
    #[serde(rename = "LAW")]
    Law,
    #[serde(rename = "CURRENCY")]
    Currency,
    #[serde(rename = "OTHER")]
    Other,
}

impl EntityType {
    pub const ALL: &'static [EntityType] = &[
        EntityType::Person,
        EntityType::Org,
        EntityType::Place,
        EntityType::Date,
        EntityType::Time,
        EntityType::Work,
        EntityType::Item,
        EntityType::Event,
        EntityType::Race,
        EntityType::Species,
        EntityType::House,
        EntityType::Tribe,
        EntityType::Title,
        EntityType::Artifact,
        EntityType::Creature,
        EntityType::Ability,
        EntityType::Spell,
        EntityType::Language,
        EntityType::Deity,
        EntityType::Vehicle,
        EntityType::Food,
        EntityType::Material,
        EntityType::Law,
        EntityType::Currency,
        EntityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Org => "ORG",
            EntityType::Place => "PLACE",
            EntityType::Date => "DATE",
            EntityType::Time => "TIME",
            EntityType::Work => "WORK",
            EntityType::Item => "ITEM",
            EntityType::Event => "EVENT",
            EntityType::Race => "RACE",
            EntityType::Species => "SPECIES",
            EntityType::House => "HOUSE",
            EntityType::Tribe => "TRIBE",
            EntityType::Title => "TITLE",
            EntityType::Artifact => "ARTIFACT",
            EntityType::Creature => "CREATURE",
            EntityType::Ability => "ABILITY",
            EntityType::Spell => "SPELL",
            EntityType::Language => "LANGUAGE",
            EntityType::Deity => "DEITY",
            EntityType::Vehicle => "VEHICLE",
            EntityType::Food => "FOOD",
            EntityType::Material => "MATERIAL",
            EntityType::Law => "LAW",
            EntityType::Currency => "CURRENCY",
            EntityType::Other => "OTHER",
        }
    }

    pub fn parse(s: &str) -> Option<EntityType> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s.to_ascii_uppercase())
    }

    /// Lowercase form used in entity ids.
    pub fn slug(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    /// Types whose canonical form must look like a proper noun
    /// (capitalized first letter or title prefix).
    pub fn requires_proper_noun(&self) -> bool {
        matches!(
            self,
            EntityType::Person
                | EntityType::Org
                | EntityType::Place
                | EntityType::House
                | EntityType::Tribe
        )
    }

    /// Map a common NER tag to an entity type.
    pub fn from_ner(label: &str) -> Option<EntityType> {
        match label {
            "PERSON" | "PER" => Some(EntityType::Person),
            "ORG" => Some(EntityType::Org),
            "NORP" => Some(EntityType::Race),
            "GPE" | "LOC" | "FAC" | "PLACE" => Some(EntityType::Place),
            "DATE" => Some(EntityType::Date),
            "TIME" => Some(EntityType::Time),
            "WORK_OF_ART" | "WORK" => Some(EntityType::Work),
            "EVENT" => Some(EntityType::Event),
            "PRODUCT" => Some(EntityType::Item),
            "LANGUAGE" => Some(EntityType::Language),
            "LAW" => Some(EntityType::Law),
            "MONEY" => Some(EntityType::Currency),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality class of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
}

impl Tier {
    /// Tier bands: A >= 0.75, B in [0.55, 0.75), C below.
    pub fn for_confidence(confidence: f64) -> Tier {
        if confidence >= 0.75 {
            Tier::A
        } else if confidence >= 0.55 {
            Tier::B
        } else {
            Tier::C
        }
    }
}

/// Grammatical gender as used for pronoun agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Neutral,
    Unknown,
}

impl Gender {
    /// Two genders are compatible unless both are known and different.
    /// `Neutral` only matches itself or `Unknown` for pronoun agreement.
    pub fn compatible_with(&self, other: Gender) -> bool {
        match (self, other) {
            (Gender::Unknown, _) | (_, Gender::Unknown) => true,
            (a, b) => *a == b,
        }
    }
}

/// Normalize a surface form for id derivation and dedup keys:
/// lowercased, trimmed, inner whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce a normalized name to an id-safe slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in normalize_name(name).chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Deterministic entity id: a pure function of `(type, normalized canonical)`.
pub fn entity_id(entity_type: EntityType, canonical: &str) -> String {
    format!("{}:{}", entity_type.slug(), slugify(canonical))
}

/// Why the quality filter accepted, rejected, split or demoted a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityVerdict {
    Accepted,
    Rejected,
    Split,
    Demoted,
}

/// Audit record attached to every filtered entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityDecision {
    pub verdict: QualityVerdict,
    /// The rule that fired, e.g. `stopword`, `two_first_names_split`.
    pub rule: String,
    /// Signal values observed at decision time.
    pub signals: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A typed graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub canonical: String,
    /// Surface variants; never contains the canonical form or a pronoun.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub aliases: BTreeSet<String>,
    pub tier: Tier,
    pub confidence: f64,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, serde_json::Value>,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_decision: Option<QualityDecision>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub manual_override: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rejected: bool,
}

impl Entity {
    pub fn new(entity_type: EntityType, canonical: &str, confidence: f64, created_at: u64) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            id: entity_id(entity_type, canonical),
            entity_type,
            canonical: canonical.to_string(),
            aliases: BTreeSet::new(),
            tier: Tier::for_confidence(confidence),
            confidence,
            gender: Gender::Unknown,
            attrs: BTreeMap::new(),
            created_at,
            quality_decision: None,
            manual_override: false,
            rejected: false,
        }
    }

    /// Insert an alias, preserving the `canonical not in aliases` invariant.
    /// Pronoun exclusion is enforced by callers that hold the lexicon.
    pub fn add_alias(&mut self, alias: &str) {
        let alias = alias.trim();
        if alias.is_empty() || normalize_name(alias) == normalize_name(&self.canonical) {
            return;
        }
        self.aliases.insert(alias.to_string());
    }

    /// Replace the canonical form, demoting the old one to an alias.
    pub fn set_canonical(&mut self, new_canonical: &str) {
        let old = std::mem::replace(&mut self.canonical, new_canonical.trim().to_string());
        self.aliases.remove(&self.canonical);
        if normalize_name(&old) != normalize_name(&self.canonical) {
            self.aliases.insert(old);
        }
    }

    /// Grapheme length of the canonical form (quality rules measure
    /// user-perceived characters, not bytes).
    pub fn canonical_len(&self) -> usize {
        self.canonical.graphemes(true).count()
    }

    /// Does `surface` match this entity's canonical or any alias,
    /// case-insensitively?
    pub fn matches_surface(&self, surface: &str) -> bool {
        let norm = normalize_name(surface);
        normalize_name(&self.canonical) == norm
            || self.aliases.iter().any(|a| normalize_name(a) == norm)
    }
}

/// An occurrence of an entity in the document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySpan {
    pub entity_id: String,
    pub start: usize,
    pub end: usize,
    pub surface: String,
    pub sentence_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_pure_function_of_type_and_canonical() {
        assert_eq!(
            entity_id(EntityType::Person, "Aragorn"),
            entity_id(EntityType::Person, "  aragorn ")
        );
        assert_eq!(entity_id(EntityType::Person, "Aragorn"), "person:aragorn");
        assert_eq!(
            entity_id(EntityType::Org, "Kingdom of Gondor"),
            "org:kingdom-of-gondor"
        );
        assert_ne!(
            entity_id(EntityType::Person, "Gondor"),
            entity_id(EntityType::Place, "Gondor")
        );
    }

    #[test]
    fn tier_bands() {
        assert_eq!(Tier::for_confidence(0.75), Tier::A);
        assert_eq!(Tier::for_confidence(0.74), Tier::B);
        assert_eq!(Tier::for_confidence(0.55), Tier::B);
        assert_eq!(Tier::for_confidence(0.54), Tier::C);
    }

    #[test]
    fn canonical_never_enters_aliases() {
        let mut e = Entity::new(EntityType::Person, "Aragorn", 0.8, 0);
        e.add_alias("Aragorn");
        e.add_alias("aragorn ");
        e.add_alias("Strider");
        assert_eq!(e.aliases.len(), 1);
        assert!(e.aliases.contains("Strider"));
    }

    #[test]
    fn set_canonical_demotes_old_form() {
        let mut e = Entity::new(EntityType::Org, "Kingdom of Gondor", 0.8, 0);
        e.add_alias("Gondor");
        e.set_canonical("Gondor");
        assert_eq!(e.canonical, "Gondor");
        assert!(e.aliases.contains("Kingdom of Gondor"));
        assert!(!e.aliases.contains("Gondor"));
    }

    #[test]
    fn gender_compatibility() {
        assert!(Gender::Unknown.compatible_with(Gender::Female));
        assert!(Gender::Female.compatible_with(Gender::Female));
        assert!(!Gender::Male.compatible_with(Gender::Female));
        assert!(!Gender::Neutral.compatible_with(Gender::Male));
    }

    #[test]
    fn entity_type_round_trips_through_str() {
        for ty in EntityType::ALL {
            assert_eq!(EntityType::parse(ty.as_str()), Some(*ty));
        }
    }
}
