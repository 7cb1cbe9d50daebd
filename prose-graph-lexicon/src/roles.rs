//! Role nouns: curated common nouns with known entity types.
//!
//! Two uses: a role word next to a name is a promotion signal ("Doctor
//! Watson", "her father Tom"), and "the <role noun>" is a definite
//! description the resolver may link to the most salient entity of the
//! mapped type.

use prose_graph::{EntityType, Gender};

/// Role words that boost a candidate's role score when adjacent.
pub const ROLE_WORDS: &[&str] = &[
    "father", "mother", "son", "daughter", "brother", "sister", "uncle", "aunt", "cousin",
    "grandfather", "grandmother", "husband", "wife", "widow", "heir", "king", "queen", "prince",
    "princess", "lord", "lady", "duke", "duchess", "baron", "knight", "emperor", "empress",
    "chief", "elder", "doctor", "nurse", "professor", "teacher", "student", "captain",
    "general", "colonel", "sergeant", "soldier", "guard", "priest", "bishop", "monk", "wizard",
    "witch", "sorcerer", "healer", "bard", "merchant", "smith", "farmer", "hunter", "sailor",
    "judge", "senator", "president", "minister", "mayor", "ambassador", "steward", "servant",
    "master", "apprentice", "scribe", "scholar", "poet", "author",
];

/// Case-insensitive role-word membership.
pub fn is_role_word(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    ROLE_WORDS.contains(&lower.as_str())
}

/// Closed whitelist mapping "the <noun>" definite descriptions to the
/// entity type the resolver should search.
pub fn role_noun_type(noun: &str) -> Option<EntityType> {
    let ty = match noun.trim().to_lowercase().as_str() {
        "senator" | "president" | "king" | "queen" | "doctor" | "professor" | "captain"
        | "general" | "wizard" | "witch" | "priest" | "judge" | "mayor" | "minister"
        | "steward" | "prince" | "princess" | "knight" | "lord" | "lady" | "boy" | "girl"
        | "man" | "woman" | "old man" | "old woman" => EntityType::Person,
        "company" | "organization" | "guild" | "order" | "council" | "army" | "school"
        | "academy" | "university" | "church" | "bank" | "firm" => EntityType::Org,
        "kingdom" | "city" | "town" | "village" | "castle" | "fortress" | "country" | "land"
        | "island" | "mountain" | "forest" | "river" | "valley" | "capital" => EntityType::Place,
        "house" | "family" | "clan" => EntityType::House,
        "tribe" => EntityType::Tribe,
        "sword" | "ring" | "crown" | "book" | "letter" | "map" => EntityType::Item,
        "battle" | "war" | "feast" | "wedding" | "funeral" | "tournament" => EntityType::Event,
        "ship" | "carriage" | "wagon" => EntityType::Vehicle,
        _ => return None,
    };
    Some(ty)
}

/// Gender carried by a role word ("his mother" implies female referent).
pub fn role_gender(word: &str) -> Gender {
    match word.trim().to_lowercase().as_str() {
        "father" | "son" | "brother" | "uncle" | "grandfather" | "husband" | "king"
        | "prince" | "lord" | "duke" | "baron" | "emperor" | "widower" => Gender::Male,
        "mother" | "daughter" | "sister" | "aunt" | "grandmother" | "wife" | "queen"
        | "princess" | "lady" | "duchess" | "empress" | "widow" => Gender::Female,
        _ => Gender::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_words_are_case_insensitive() {
        assert!(is_role_word("King"));
        assert!(is_role_word("doctor"));
        assert!(!is_role_word("table"));
    }

    #[test]
    fn definite_description_whitelist_is_closed() {
        assert_eq!(role_noun_type("senator"), Some(EntityType::Person));
        assert_eq!(role_noun_type("company"), Some(EntityType::Org));
        assert_eq!(role_noun_type("kingdom"), Some(EntityType::Place));
        assert_eq!(role_noun_type("breeze"), None);
    }

    #[test]
    fn gendered_roles() {
        assert_eq!(role_gender("mother"), Gender::Female);
        assert_eq!(role_gender("king"), Gender::Male);
        assert_eq!(role_gender("doctor"), Gender::Unknown);
    }
}
