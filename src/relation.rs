//! Relations: typed, evidence-bearing graph edges.
//!
//! Predicates form a closed enum grouped into families; the family decides
//! the default type guard (see [`crate::guards`]). Inverse pairs
//! (`parent_of` / `child_of`) are never merged - both directions are
//! independently valid facts - and symmetric predicates keep both stated
//! directions through dedup.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::span::Evidence;

/// Coarse predicate group sharing a type guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateFamily {
    Kinship,
    Employment,
    Location,
    Creation,
    Ownership,
    Event,
    Communication,
    Comparison,
    Causation,
    PartWhole,
    Identity,
    Ability,
    Negation,
    Emotional,
    Temporal,
}

impl PredicateFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateFamily::Kinship => "kinship",
            PredicateFamily::Employment => "employment",
            PredicateFamily::Location => "location",
            PredicateFamily::Creation => "creation",
            PredicateFamily::Ownership => "ownership",
            PredicateFamily::Event => "event",
            PredicateFamily::Communication => "communication",
            PredicateFamily::Comparison => "comparison",
            PredicateFamily::Causation => "causation",
            PredicateFamily::PartWhole => "part_whole",
            PredicateFamily::Identity => "identity",
            PredicateFamily::Ability => "ability",
            PredicateFamily::Negation => "negation",
            PredicateFamily::Emotional => "emotional",
            PredicateFamily::Temporal => "temporal",
        }
    }

    pub fn parse(s: &str) -> Option<PredicateFamily> {
        match s {
            "kinship" => Some(PredicateFamily::Kinship),
            "employment" => Some(PredicateFamily::Employment),
            "location" => Some(PredicateFamily::Location),
            "creation" => Some(PredicateFamily::Creation),
            "ownership" => Some(PredicateFamily::Ownership),
            "event" => Some(PredicateFamily::Event),
            "communication" => Some(PredicateFamily::Communication),
            "comparison" => Some(PredicateFamily::Comparison),
            "causation" => Some(PredicateFamily::Causation),
            "part_whole" => Some(PredicateFamily::PartWhole),
            "identity" => Some(PredicateFamily::Identity),
            "ability" => Some(PredicateFamily::Ability),
            "negation" => Some(PredicateFamily::Negation),
            "emotional" => Some(PredicateFamily::Emotional),
            "temporal" => Some(PredicateFamily::Temporal),
            _ => None,
        }
    }
}

macro_rules! predicates {
    ($($variant:ident => $text:literal, $family:ident;)+) => {
        /// Closed set of relation predicates.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Predicate {
            $($variant,)+
        }

        impl Predicate {
            pub const ALL: &'static [Predicate] = &[$(Predicate::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Predicate::$variant => $text,)+
                }
            }

            pub fn parse(s: &str) -> Option<Predicate> {
                match s {
                    $($text => Some(Predicate::$variant),)+
                    _ => None,
                }
            }

            pub fn family(&self) -> PredicateFamily {
                match self {
                    $(Predicate::$variant => PredicateFamily::$family,)+
                }
            }
        }
    };
}

predicates! {
    // kinship
    ParentOf => "parent_of", Kinship;
    ChildOf => "child_of", Kinship;
    SiblingOf => "sibling_of", Kinship;
    MarriedTo => "married_to", Kinship;
    DivorcedFrom => "divorced_from", Kinship;
    EngagedTo => "engaged_to", Kinship;
    GrandparentOf => "grandparent_of", Kinship;
    GrandchildOf => "grandchild_of", Kinship;
    CousinOf => "cousin_of", Kinship;
    UncleOf => "uncle_of", Kinship;
    AuntOf => "aunt_of", Kinship;
    NephewOf => "nephew_of", Kinship;
    NieceOf => "niece_of", Kinship;
    AncestorOf => "ancestor_of", Kinship;
    DescendantOf => "descendant_of", Kinship;
    GuardianOf => "guardian_of", Kinship;
    WardOf => "ward_of", Kinship;
    AdoptedBy => "adopted_by", Kinship;
    GodparentOf => "godparent_of", Kinship;
    WidowedFrom => "widowed_from", Kinship;
    // employment & affiliation
    WorksAt => "works_at", Employment;
    WorksFor => "works_for", Employment;
    EmployedBy => "employed_by", Employment;
    Leads => "leads", Employment;
    Manages => "manages", Employment;
    ReportsTo => "reports_to", Employment;
    Founded => "founded", Employment;
    CoFounded => "co_founded", Employment;
    Serves => "serves", Employment;
    ApprenticedTo => "apprenticed_to", Employment;
    MemberOf => "member_of", Employment;
    Rules => "rules", Employment;
    Governs => "governs", Employment;
    Commands => "commands", Employment;
    Advises => "advises", Employment;
    SucceededBy => "succeeded_by", Employment;
    PrecededBy => "preceded_by", Employment;
    StudiesAt => "studies_at", Employment;
    TeachesAt => "teaches_at", Employment;
    GraduatedFrom => "graduated_from", Employment;
    HiredBy => "hired_by", Employment;
    DismissedFrom => "dismissed_from", Employment;
    // location
    LocatedIn => "located_in", Location;
    LivesIn => "lives_in", Location;
    BornIn => "born_in", Location;
    DiedIn => "died_in", Location;
    TraveledTo => "traveled_to", Location;
    MovedTo => "moved_to", Location;
    ReturnedTo => "returned_to", Location;
    FledTo => "fled_to", Location;
    ImprisonedIn => "imprisoned_in", Location;
    BuriedIn => "buried_in", Location;
    NearTo => "near_to", Location;
    CapitalOf => "capital_of", Location;
    ComesFrom => "comes_from", Location;
    Visited => "visited", Location;
    ResidesAt => "resides_at", Location;
    StationedAt => "stationed_at", Location;
    ExiledFrom => "exiled_from", Location;
    Crossed => "crossed", Location;
    // creation
    Created => "created", Creation;
    Wrote => "wrote", Creation;
    Built => "built", Creation;
    Composed => "composed", Creation;
    Painted => "painted", Creation;
    Invented => "invented", Creation;
    Designed => "designed", Creation;
    Forged => "forged", Creation;
    Crafted => "crafted", Creation;
    Discovered => "discovered", Creation;
    Destroyed => "destroyed", Creation;
    Sculpted => "sculpted", Creation;
    // ownership
    Owns => "owns", Ownership;
    Possesses => "possesses", Ownership;
    Acquired => "acquired", Ownership;
    Inherited => "inherited", Ownership;
    StoleFrom => "stole_from", Ownership;
    GaveTo => "gave_to", Ownership;
    ReceivedFrom => "received_from", Ownership;
    SoldTo => "sold_to", Ownership;
    BoughtFrom => "bought_from", Ownership;
    Carries => "carries", Ownership;
    Wields => "wields", Ownership;
    Wears => "wears", Ownership;
    LostItem => "lost", Ownership;
    // event
    ParticipatedIn => "participated_in", Event;
    Attended => "attended", Event;
    Won => "won", Event;
    FoughtIn => "fought_in", Event;
    Organized => "organized", Event;
    Witnessed => "witnessed", Event;
    Survived => "survived", Event;
    Celebrated => "celebrated", Event;
    Killed => "killed", Event;
    Defeated => "defeated", Event;
    Captured => "captured", Event;
    Rescued => "rescued", Event;
    EscapedFrom => "escaped_from", Event;
    Attacked => "attacked", Event;
    Defended => "defended", Event;
    Betrayed => "betrayed", Event;
    Summoned => "summoned", Event;
    Hosted => "hosted", Event;
    // communication
    SaidTo => "said_to", Communication;
    Told => "told", Communication;
    Asked => "asked", Communication;
    SpokeWith => "spoke_with", Communication;
    WroteTo => "wrote_to", Communication;
    Promised => "promised", Communication;
    Warned => "warned", Communication;
    Commanded => "commanded", Communication;
    AnnouncedTo => "announced_to", Communication;
    LiedTo => "lied_to", Communication;
    ConfidedIn => "confided_in", Communication;
    Greeted => "greeted", Communication;
    PleadedWith => "pleaded_with", Communication;
    // comparison
    SimilarTo => "similar_to", Comparison;
    DifferentFrom => "different_from", Comparison;
    Equals => "equals", Comparison;
    Resembles => "resembles", Comparison;
    Rivals => "rivals", Comparison;
    Surpasses => "surpasses", Comparison;
    // causation
    Caused => "caused", Causation;
    LedTo => "led_to", Causation;
    ResultedIn => "resulted_in", Causation;
    Prevented => "prevented", Causation;
    Enabled => "enabled", Causation;
    Triggered => "triggered", Causation;
    // part-whole
    PartOf => "part_of", PartWhole;
    Contains => "contains", PartWhole;
    ComponentOf => "component_of", PartWhole;
    Includes => "includes", PartWhole;
    ComposedOf => "composed_of", PartWhole;
    BelongsTo => "belongs_to", PartWhole;
    DividedInto => "divided_into", PartWhole;
    // identity
    KnownAs => "known_as", Identity;
    AliasOf => "alias_of", Identity;
    IdentifiedAs => "identified_as", Identity;
    DisguisedAs => "disguised_as", Identity;
    FormerlyKnownAs => "formerly_known_as", Identity;
    SameAs => "same_as", Identity;
    IncarnationOf => "incarnation_of", Identity;
    // ability
    CanUse => "can_use", Ability;
    Masters => "masters", Ability;
    SkilledIn => "skilled_in", Ability;
    CapableOf => "capable_of", Ability;
    Learned => "learned", Ability;
    Casts => "casts", Ability;
    ImmuneTo => "immune_to", Ability;
    // negation
    NeverMet => "never_met", Negation;
    NotMarriedTo => "not_married_to", Negation;
    Denies => "denies", Negation;
    Refused => "refused", Negation;
    UnawareOf => "unaware_of", Negation;
    // emotional
    Loves => "loves", Emotional;
    Hates => "hates", Emotional;
    Fears => "fears", Emotional;
    Trusts => "trusts", Emotional;
    Distrusts => "distrusts", Emotional;
    Admires => "admires", Emotional;
    Envies => "envies", Emotional;
    Respects => "respects", Emotional;
    Pities => "pities", Emotional;
    Mourns => "mourns", Emotional;
    Misses => "misses", Emotional;
    Desires => "desires", Emotional;
    Despises => "despises", Emotional;
    FriendsWith => "friends_with", Emotional;
    EnemiesWith => "enemies_with", Emotional;
    LoyalTo => "loyal_to", Emotional;
    JealousOf => "jealous_of", Emotional;
    // temporal
    HappenedOn => "happened_on", Temporal;
    HappenedAt => "happened_at", Temporal;
    BeganOn => "began_on", Temporal;
    EndedOn => "ended_on", Temporal;
    OccurredBefore => "occurred_before", Temporal;
    OccurredAfter => "occurred_after", Temporal;
}

impl Predicate {
    /// Symmetric predicates state a mutual fact; dedup still keeps both
    /// stated directions (`married_to(A,B)` and `married_to(B,A)` are
    /// separately valid).
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            Predicate::MarriedTo
                | Predicate::DivorcedFrom
                | Predicate::EngagedTo
                | Predicate::SiblingOf
                | Predicate::CousinOf
                | Predicate::FriendsWith
                | Predicate::EnemiesWith
                | Predicate::Equals
                | Predicate::SimilarTo
                | Predicate::DifferentFrom
                | Predicate::Resembles
                | Predicate::Rivals
                | Predicate::SpokeWith
                | Predicate::NearTo
                | Predicate::SameAs
                | Predicate::NeverMet
                | Predicate::NotMarriedTo
        )
    }

    /// Inverse pairing, exposed for enrichment only - never drives a merge.
    pub fn inverse(&self) -> Option<Predicate> {
        match self {
            Predicate::ParentOf => Some(Predicate::ChildOf),
            Predicate::ChildOf => Some(Predicate::ParentOf),
            Predicate::GrandparentOf => Some(Predicate::GrandchildOf),
            Predicate::GrandchildOf => Some(Predicate::GrandparentOf),
            Predicate::AncestorOf => Some(Predicate::DescendantOf),
            Predicate::DescendantOf => Some(Predicate::AncestorOf),
            Predicate::GuardianOf => Some(Predicate::WardOf),
            Predicate::WardOf => Some(Predicate::GuardianOf),
            Predicate::Contains => Some(Predicate::PartOf),
            Predicate::PartOf => Some(Predicate::Contains),
            Predicate::SucceededBy => Some(Predicate::PrecededBy),
            Predicate::PrecededBy => Some(Predicate::SucceededBy),
            Predicate::OccurredBefore => Some(Predicate::OccurredAfter),
            Predicate::OccurredAfter => Some(Predicate::OccurredBefore),
            _ => None,
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PredicateVisitor;
        impl Visitor<'_> for PredicateVisitor {
            type Value = Predicate;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a known predicate name")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Predicate, E> {
                Predicate::parse(v)
                    .ok_or_else(|| E::custom(format!("unknown predicate: {v}")))
            }
        }
        deserializer.deserialize_str(PredicateVisitor)
    }
}

/// Which extraction stage produced a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Extractor {
    #[serde(rename = "dep")]
    Dep,
    #[serde(rename = "regex")]
    Regex,
    #[serde(rename = "fiction-dialogue")]
    FictionDialogue,
    #[serde(rename = "fiction-action")]
    FictionAction,
    #[serde(rename = "fiction-family")]
    FictionFamily,
    #[serde(rename = "manual")]
    Manual,
}

impl Extractor {
    /// Priority used when merging duplicate relations: `dep` beats
    /// `regex` beats everything else.
    pub fn priority(&self) -> u8 {
        match self {
            Extractor::Dep => 2,
            Extractor::Regex => 1,
            _ => 0,
        }
    }
}

/// Optional context qualifiers on a relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manner: Option<String>,
}

impl Qualifiers {
    pub fn is_empty(&self) -> bool {
        self.time.is_none() && self.place.is_none() && self.source.is_none() && self.manner.is_none()
    }
}

/// A typed edge between two entities, with evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: String,
    pub subj: String,
    pub pred: Predicate,
    pub obj: String,
    /// Non-empty except for manually added relations.
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    pub confidence: f64,
    pub extractor: Extractor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifiers: Option<Qualifiers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subj_surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_surface: Option<String>,
}

impl Relation {
    pub fn new(
        subj: &str,
        pred: Predicate,
        obj: &str,
        confidence: f64,
        extractor: Extractor,
    ) -> Self {
        Self {
            id: Relation::make_id(subj, pred, obj),
            subj: subj.to_string(),
            pred,
            obj: obj.to_string(),
            evidence: Vec::new(),
            confidence: confidence.clamp(0.0, 1.0),
            extractor,
            qualifiers: None,
            subj_surface: None,
            obj_surface: None,
        }
    }

    /// Deterministic relation id over raw entity ids; direction matters.
    pub fn make_id(subj: &str, pred: Predicate, obj: &str) -> String {
        format!("{}|{}|{}", subj, pred.as_str(), obj)
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_round_trips_through_str() {
        for pred in Predicate::ALL {
            assert_eq!(Predicate::parse(pred.as_str()), Some(*pred));
        }
    }

    #[test]
    fn predicate_families_cover_spec_groups() {
        assert_eq!(Predicate::MarriedTo.family(), PredicateFamily::Kinship);
        assert_eq!(Predicate::Leads.family(), PredicateFamily::Employment);
        assert_eq!(Predicate::TraveledTo.family(), PredicateFamily::Location);
        assert_eq!(Predicate::PartOf.family(), PredicateFamily::PartWhole);
    }

    #[test]
    fn symmetric_predicates_are_marked() {
        assert!(Predicate::MarriedTo.is_symmetric());
        assert!(Predicate::FriendsWith.is_symmetric());
        assert!(!Predicate::ParentOf.is_symmetric());
        assert!(!Predicate::Leads.is_symmetric());
    }

    #[test]
    fn inverse_pairs_are_mutual() {
        for pred in Predicate::ALL {
            if let Some(inv) = pred.inverse() {
                assert_eq!(inv.inverse(), Some(*pred), "{pred} inverse not mutual");
            }
        }
    }

    #[test]
    fn unknown_predicate_fails_deserialization() {
        let err = serde_json::from_str::<Predicate>("\"frobnicates\"");
        assert!(err.is_err());
        let ok: Predicate = serde_json::from_str("\"married_to\"").unwrap();
        assert_eq!(ok, Predicate::MarriedTo);
    }

    #[test]
    fn relation_id_retains_direction() {
        let ab = Relation::make_id("person:a", Predicate::MarriedTo, "person:b");
        let ba = Relation::make_id("person:b", Predicate::MarriedTo, "person:a");
        assert_ne!(ab, ba);
    }
}
