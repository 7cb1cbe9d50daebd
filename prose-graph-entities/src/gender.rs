//! Gender inference for PERSON candidates.
//!
//! Sources, strongest first: title prefix ("Mrs. Bennet"), curated name
//! lists (first token), gendered role words from the immediate context
//! ("their son, X" / "X, his brother"). Non-PERSON entities default to
//! neutral at materialization time.

use prose_graph::Gender;
use prose_graph_lexicon as lexicon;

/// Infer a gender for a surface form with optional context hints.
pub fn infer_gender(surface: &str, title: Option<&str>, role_word: Option<&str>) -> Gender {
    if let Some(title) = title {
        let g = lexicon::title_gender(title);
        if g != Gender::Unknown {
            return g;
        }
    }

    // "Mr. Darcy" inside the surface itself.
    let mut name = surface.trim();
    if let Some((prefix, rest)) = lexicon::strip_title_prefix(name) {
        let g = lexicon::title_gender(prefix);
        if g != Gender::Unknown {
            return g;
        }
        name = rest;
    }

    if let Some(first) = name.split_whitespace().next() {
        let g = lexicon::name_gender(first);
        if g != Gender::Unknown {
            return g;
        }
    }

    if let Some(role) = role_word {
        let g = lexicon::role_gender(role);
        if g != Gender::Unknown {
            return g;
        }
    }

    Gender::Unknown
}
