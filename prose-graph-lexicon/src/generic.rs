//! Nouns too generic or too abstract to stand as entities on their own.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Single-word common nouns that never make an entity by themselves.
pub const GENERIC_NOUNS: &[&str] = &[
    "man", "woman", "boy", "girl", "person", "people", "thing", "things", "stuff", "place",
    "time", "way", "day", "night", "year", "part", "world", "hand", "eye", "eyes", "door",
    "room", "side", "word", "words", "voice", "face", "head", "morning", "evening", "moment",
    "end", "beginning", "life", "death", "home", "house", "road", "water", "air", "fire",
    "ground", "sky", "light", "dark", "one", "other", "others", "someone", "something",
];

/// Capitalized abstractions that look like names at sentence start
/// ("Song", "Darkness", "Learning") but are not people.
pub const ABSTRACT_PERSON_NOUNS: &[&str] = &[
    "song", "darkness", "learning", "love", "death", "hope", "fear", "time", "war", "peace",
    "light", "silence", "truth", "beauty", "wisdom", "justice", "freedom", "victory", "glory",
    "fate", "destiny", "fortune", "nature", "history", "memory", "sorrow", "joy", "anger",
    "winter", "spring", "summer", "autumn",
];

static GENERIC_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| GENERIC_NOUNS.iter().copied().collect());
static ABSTRACT_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ABSTRACT_PERSON_NOUNS.iter().copied().collect());

pub fn is_too_generic(word: &str) -> bool {
    GENERIC_SET.contains(word.trim().to_lowercase().as_str())
}

pub fn is_abstract_person_noun(word: &str) -> bool {
    ABSTRACT_SET.contains(word.trim().to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_nouns_hit() {
        assert!(is_too_generic("man"));
        assert!(is_too_generic("Thing"));
        assert!(!is_too_generic("Aragorn"));
    }

    #[test]
    fn abstracts_hit() {
        assert!(is_abstract_person_noun("Darkness"));
        assert!(is_abstract_person_noun("song"));
        assert!(!is_abstract_person_noun("Hermione"));
    }
}
