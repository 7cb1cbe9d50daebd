//! The closed personal-pronoun map used by the reference resolver.
//!
//! Only third-person forms resolve to antecedents; first and second person
//! are detected (so the quality filter can exclude them from aliases) but
//! never enter the salience search.

use prose_graph::{EntityType, Gender};

/// Gender/number class of a resolvable pronoun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PronounKind {
    Male,
    Female,
    Plural,
    Neutral,
}

impl PronounKind {
    pub fn gender(&self) -> Gender {
        match self {
            PronounKind::Male => Gender::Male,
            PronounKind::Female => Gender::Female,
            PronounKind::Plural => Gender::Unknown,
            PronounKind::Neutral => Gender::Neutral,
        }
    }

    /// Antecedent types this pronoun may resolve to: neutral pronouns
    /// pick up organizations, places and things; the rest are personal.
    pub fn allowed_types(&self) -> &'static [EntityType] {
        match self {
            PronounKind::Neutral => &[
                EntityType::Org,
                EntityType::Place,
                EntityType::Item,
                EntityType::Work,
                EntityType::Event,
            ],
            _ => &[EntityType::Person],
        }
    }
}

/// Syntactic role of the pronoun form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PronounRole {
    Subject,
    Object,
    Possessive,
    Reflexive,
}

/// Classification of one third-person pronoun form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PronounProfile {
    pub kind: PronounKind,
    pub role: PronounRole,
}

/// Look up a third-person pronoun. Returns `None` for anything outside
/// the closed map - the resolver refuses rather than guesses.
pub fn pronoun_profile(word: &str) -> Option<PronounProfile> {
    use PronounKind::*;
    use PronounRole::*;
    let profile = |kind, role| Some(PronounProfile { kind, role });
    match word.trim().to_lowercase().as_str() {
        "he" => profile(Male, Subject),
        "him" => profile(Male, Object),
        "his" => profile(Male, Possessive),
        "himself" => profile(Male, Reflexive),
        "she" => profile(Female, Subject),
        "her" => profile(Female, Object),
        "hers" => profile(Female, Possessive),
        "herself" => profile(Female, Reflexive),
        "they" => profile(Plural, Subject),
        "them" => profile(Plural, Object),
        "their" | "theirs" => profile(Plural, Possessive),
        "themselves" => profile(Plural, Reflexive),
        "it" => profile(Neutral, Subject),
        "its" => profile(Neutral, Possessive),
        "itself" => profile(Neutral, Reflexive),
        _ => None,
    }
}

const FIRST_SECOND_PERSON: &[&str] = &[
    "i", "me", "my", "mine", "myself", "we", "us", "our", "ours", "ourselves", "you", "your",
    "yours", "yourself", "yourselves",
];

/// Any personal pronoun form, including first and second person.
pub fn is_pronoun(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    pronoun_profile(&lower).is_some() || FIRST_SECOND_PERSON.contains(&lower.as_str())
}

const DEICTICS: &[&str] = &[
    "this", "that", "these", "those", "here", "there", "now", "then", "today", "yesterday",
    "tomorrow",
];

/// Deictic words are banned from alias sets alongside pronouns.
pub fn is_deictic(word: &str) -> bool {
    DEICTICS.contains(&word.trim().to_lowercase().as_str())
}
