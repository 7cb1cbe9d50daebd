//! Curated gendered first-name lists.
//!
//! Used by gender inference and by the two-first-names split check. The
//! lists skew toward narrative fiction and classic literature, where this
//! pipeline spends most of its time.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use prose_graph::Gender;

pub const MALE_FIRST_NAMES: &[&str] = &[
    "aaron", "abraham", "adam", "albert", "alexander", "alfred", "andrew", "anthony", "aragorn",
    "arathorn", "arthur", "benjamin", "bilbo", "boaz", "boromir", "brian", "caleb", "carl",
    "charles", "christopher", "daniel", "david", "denethor", "dumbledore", "edward", "eli",
    "elimelech", "elrond", "eric", "ethan", "faramir", "francis", "frank", "frodo", "gandalf",
    "george", "gimli", "gregory", "hagrid", "harold", "harry", "henry", "hugh", "isaac",
    "jacob", "james", "jason", "jesse", "john", "jonathan", "joseph", "joshua", "kevin",
    "lawrence", "legolas", "leo", "louis", "luke", "malcolm", "mark", "martin", "matthew",
    "merry", "michael", "moses", "nathan", "neville", "nicholas", "noah", "oliver", "oscar",
    "patrick", "paul", "peter", "philip", "pippin", "richard", "robert", "ron", "ronald", "samuel",
    "samwise", "saul", "sauron", "severus", "simon", "stephen", "theoden", "thomas", "timothy",
    "victor", "walter", "william",
];

pub const FEMALE_FIRST_NAMES: &[&str] = &[
    "abigail", "alice", "amelia", "anna", "anne", "arwen", "beatrice", "bella", "caroline",
    "catherine", "charlotte", "claire", "clara", "daisy", "deborah", "diana", "dinah",
    "dorothy", "edith", "eleanor", "elizabeth", "ella", "emily", "emma", "eowyn", "esther",
    "eve", "fiona", "frances", "galadriel", "ginny", "grace", "hannah", "helen", "hermione",
    "irene", "isabel", "jane", "jessica", "joan", "judith", "julia", "katherine", "laura",
    "leah", "lily", "louise", "lucy", "luna", "lydia", "margaret", "martha", "mary",
    "matilda", "minerva", "miriam", "molly", "naomi", "nancy", "nora", "olivia", "orpah",
    "patricia", "rachel", "rebecca", "rose", "rosie", "ruth", "sarah", "sophia", "susan",
    "sybil", "tauriel", "teresa", "victoria", "violet", "virginia", "winifred",
];

static MALE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| MALE_FIRST_NAMES.iter().copied().collect());
static FEMALE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| FEMALE_FIRST_NAMES.iter().copied().collect());

/// Gender of a first name, if the curated lists know it.
///
/// Pass a single token; multi-word names should be split by the caller
/// and probed on their first token.
pub fn name_gender(first_name: &str) -> Gender {
    let lower = first_name.trim().to_lowercase();
    if MALE_SET.contains(lower.as_str()) {
        Gender::Male
    } else if FEMALE_SET.contains(lower.as_str()) {
        Gender::Female
    } else {
        Gender::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(name_gender("Harry"), Gender::Male);
        assert_eq!(name_gender("hermione"), Gender::Female);
        assert_eq!(name_gender("Naomi"), Gender::Female);
        assert_eq!(name_gender("Elimelech"), Gender::Male);
    }

    #[test]
    fn unknown_names_stay_unknown() {
        assert_eq!(name_gender("Zxcvb"), Gender::Unknown);
    }

    #[test]
    fn lists_do_not_overlap() {
        for name in MALE_FIRST_NAMES {
            assert!(!FEMALE_FIRST_NAMES.contains(name), "{name} in both lists");
        }
    }
}
