//! Verb lexicons: speech verbs for quote attribution, strong agentive
//! verbs for the syntax promotion signal.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Verbs that introduce or close reported speech.
pub const SPEECH_VERBS: &[&str] = &[
    "said", "says", "say", "replied", "reply", "shouted", "shout", "whispered", "whisper",
    "asked", "ask", "answered", "answer", "murmured", "exclaimed", "cried", "muttered",
    "yelled", "called", "responded", "added", "continued", "began", "snapped", "growled",
    "hissed", "breathed", "observed", "remarked", "declared", "announced", "insisted",
    "warned", "pleaded", "demanded", "wondered", "sighed", "laughed", "agreed", "admitted",
    "protested", "interrupted", "repeated", "echoed", "stammered", "urged",
];

/// Verbs whose subject is very likely a story-relevant agent.
pub const STRONG_AGENTIVE_VERBS: &[&str] = &[
    "said", "told", "asked", "replied", "shouted", "whispered", "went", "traveled", "walked",
    "ran", "rode", "arrived", "returned", "fled", "journeyed", "fought", "killed", "defeated",
    "attacked", "defended", "married", "loved", "hated", "feared", "led", "ruled", "governed",
    "commanded", "founded", "built", "created", "wrote", "forged", "destroyed", "decided",
    "refused", "promised", "swore", "vowed", "took", "gave", "stole", "carried", "wielded",
    "studied", "taught", "learned", "discovered", "betrayed", "rescued", "captured", "escaped",
    "summoned", "cast", "conjured", "froze", "smiled", "laughed", "wept", "died", "lived",
];

static SPEECH_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SPEECH_VERBS.iter().copied().collect());
static STRONG_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| STRONG_AGENTIVE_VERBS.iter().copied().collect());

/// Matches surface or lemma forms, case-insensitively.
pub fn is_speech_verb(verb: &str) -> bool {
    SPEECH_SET.contains(verb.trim().to_lowercase().as_str())
}

pub fn is_strong_agentive_verb(verb: &str) -> bool {
    let lower = verb.trim().to_lowercase();
    STRONG_SET.contains(lower.as_str())
        // lemma forms of the curated past tenses
        || matches!(
            lower.as_str(),
            "say" | "ask" | "reply" | "shout" | "whisper" | "answer"
                | "tell" | "travel" | "walk" | "run" | "ride" | "arrive" | "return" | "flee"
                | "fight" | "kill" | "defeat" | "attack" | "defend" | "marry" | "love"
                | "hate" | "fear" | "lead" | "rule" | "govern" | "command" | "found"
                | "build" | "create" | "write" | "forge" | "destroy" | "decide" | "refuse"
                | "promise" | "swear" | "vow" | "take" | "give" | "steal" | "carry"
                | "wield" | "study" | "teach" | "learn" | "discover" | "betray" | "rescue"
                | "capture" | "escape" | "summon" | "conjure" | "freeze" | "smile"
                | "laugh" | "weep" | "die" | "live" | "go"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speech_verbs_cover_common_dialogue_tags() {
        for v in ["said", "whispered", "shouted", "replied"] {
            assert!(is_speech_verb(v));
        }
        assert!(!is_speech_verb("walked"));
    }

    #[test]
    fn strong_agentive_accepts_lemma_and_past() {
        assert!(is_strong_agentive_verb("married"));
        assert!(is_strong_agentive_verb("marry"));
        assert!(is_strong_agentive_verb("go"));
        assert!(!is_strong_agentive_verb("seemed"));
    }
}
