//! Race and species validation data.
//!
//! A RACE candidate must either carry a demonym suffix or belong to the
//! curated list; gerunds never qualify.

pub const CURATED_RACES: &[&str] = &[
    "elf", "elves", "elven", "dwarf", "dwarves", "dwarven", "hobbit", "hobbits", "orc",
    "orcs", "goblin", "goblins", "troll", "trolls", "ent", "ents", "uruk-hai", "numenorean",
    "numenoreans", "rohirrim", "giant", "giants", "centaur", "centaurs", "merfolk", "veela",
    "vulcan", "vulcans", "klingon", "klingons", "dothraki", "valyrian",
];

/// Demonym suffixes: Gondorian, Chinese, Polish, Israeli, Roman.
pub const DEMONYM_SUFFIXES: &[&str] = &["ian", "an", "ese", "ish", "i"];

pub fn is_curated_race(word: &str) -> bool {
    CURATED_RACES.contains(&word.trim().to_lowercase().as_str())
}

/// Suffix check for demonym-shaped race names ("Gondorian", "Japanese").
/// Very short words are excluded so "ski" does not read as a demonym.
pub fn has_demonym_suffix(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    if lower.len() < 4 {
        return false;
    }
    DEMONYM_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}
