//! Global stopword list for entity candidate filtering.
//!
//! A closed list: pronouns, determiners, high-frequency verbs, question
//! words, prepositions and discourse markers. A candidate whose normalized
//! form appears here is never promoted to an entity.

use std::collections::HashSet;

use once_cell::sync::Lazy;

pub const GLOBAL_STOPWORDS: &[&str] = &[
    // pronouns
    "i", "me", "my", "mine", "myself", "we", "us", "our", "ours", "ourselves", "you", "your",
    "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
    "herself", "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "one",
    "oneself", "who", "whom", "whose", "which", "that", "this", "these", "those", "someone",
    "anyone", "everyone", "nobody", "somebody", "anybody", "everybody", "nothing", "something",
    "anything", "everything",
    // determiners
    "a", "an", "the", "some", "any", "no", "every", "each", "either", "neither", "both", "all",
    "few", "many", "much", "more", "most", "other", "another", "such",
    // high-frequency verbs
    "be", "is", "am", "are", "was", "were", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "will", "would", "shall", "should", "may", "might", "must",
    "can", "could", "get", "got", "go", "goes", "went", "gone", "make", "made", "take", "took",
    "come", "came", "say", "said", "see", "saw", "know", "knew", "let",
    // question words
    "what", "when", "where", "why", "how",
    // prepositions
    "of", "in", "on", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "out", "off", "over", "under", "again", "further", "near", "without", "within", "among",
    "around", "upon", "toward", "towards",
    // conjunctions and discourse markers
    "and", "but", "or", "nor", "so", "yet", "if", "then", "than", "because", "while", "as",
    "until", "although", "though", "however", "therefore", "moreover", "meanwhile", "indeed",
    "perhaps", "maybe", "also", "just", "only", "even", "still", "too", "very", "now", "here",
    "there", "not", "never", "always", "often", "once", "well", "oh", "yes",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| GLOBAL_STOPWORDS.iter().copied().collect());

/// Case-insensitive stopword membership.
pub fn is_stopword(word: &str) -> bool {
    STOPWORD_SET.contains(word.trim().to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_all_required_classes() {
        for w in ["he", "the", "went", "why", "between", "however"] {
            assert!(is_stopword(w), "{w} should be a stopword");
        }
    }

    #[test]
    fn case_insensitive() {
        assert!(is_stopword("The"));
        assert!(is_stopword("HOWEVER"));
    }

    #[test]
    fn names_are_not_stopwords() {
        assert!(!is_stopword("Aragorn"));
        assert!(!is_stopword("Hogwarts"));
    }
}
