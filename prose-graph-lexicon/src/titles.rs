//! Title prefixes: "Mr. Darcy", "Lady Galadriel", "Professor Snape".
//!
//! A title prefix both boosts promotion (role score) and often pins the
//! entity's gender.

use prose_graph::Gender;

pub const TITLE_PREFIXES: &[&str] = &[
    "mr", "mr.", "mister", "mrs", "mrs.", "ms", "ms.", "miss", "dr", "dr.", "doctor", "sir",
    "dame", "lady", "lord", "king", "queen", "prince", "princess", "professor", "captain",
    "general", "colonel", "sergeant", "master", "father", "mother", "saint", "st.", "reverend",
    "rabbi", "judge", "president", "senator", "duke", "duchess", "baron", "baroness",
];

/// Is `word` a recognized title prefix?
pub fn is_title_prefix(word: &str) -> bool {
    TITLE_PREFIXES.contains(&word.trim().to_lowercase().as_str())
}

/// Split a leading title off a surface form: `"Mr. Darcy"` ->
/// `Some(("Mr.", "Darcy"))`.
pub fn strip_title_prefix(surface: &str) -> Option<(&str, &str)> {
    let trimmed = surface.trim();
    let (first, rest) = trimmed.split_once(' ')?;
    if is_title_prefix(first) {
        Some((first, rest.trim()))
    } else {
        None
    }
}

/// Gender implied by a title prefix.
pub fn title_gender(title: &str) -> Gender {
    match title.trim().trim_end_matches('.').to_lowercase().as_str() {
        "mr" | "mister" | "sir" | "lord" | "king" | "prince" | "duke" | "baron" | "father" => {
            Gender::Male
        }
        "mrs" | "ms" | "miss" | "dame" | "lady" | "queen" | "princess" | "duchess"
        | "baroness" | "mother" => Gender::Female,
        _ => Gender::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_titles() {
        assert_eq!(strip_title_prefix("Mr. Darcy"), Some(("Mr.", "Darcy")));
        assert_eq!(
            strip_title_prefix("Lady Galadriel"),
            Some(("Lady", "Galadriel"))
        );
        assert_eq!(strip_title_prefix("Aragorn"), None);
        assert_eq!(strip_title_prefix("Swift River"), None);
    }

    #[test]
    fn title_implies_gender() {
        assert_eq!(title_gender("Mrs."), Gender::Female);
        assert_eq!(title_gender("Sir"), Gender::Male);
        assert_eq!(title_gender("Dr."), Gender::Unknown);
    }
}
