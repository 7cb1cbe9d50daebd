//! Predicate canonicalization.
//!
//! A closed alias map rewrites synonym predicates, preserving direction:
//! `heads(X, Y)` becomes `leads(X, Y)`, never `led_by(Y, X)`. Inverse
//! pairs (`child_of` / `parent_of`) are NOT aliases - both directions are
//! independently valid facts and stay separate.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use prose_graph::Predicate;

/// Synonym -> canonical predicate name. Direction-preserving by
/// construction: an alias maps to a predicate with the same argument
/// order.
static PREDICATE_ALIASES: Lazy<HashMap<&'static str, Predicate>> = Lazy::new(|| {
    use Predicate::*;
    let mut map = HashMap::new();
    // employment / leadership
    map.insert("heads", Leads);
    map.insert("runs", Leads);
    map.insert("directs", Leads);
    map.insert("chairs", Leads);
    map.insert("employed_at", WorksAt);
    map.insert("works_in", WorksAt);
    map.insert("hired_at", HiredBy);
    map.insert("established", Founded);
    map.insert("co_established", CoFounded);
    // kinship
    map.insert("wed_to", MarriedTo);
    map.insert("weds", MarriedTo);
    map.insert("spouse_of", MarriedTo);
    map.insert("husband_of", MarriedTo);
    map.insert("wife_of", MarriedTo);
    map.insert("brother_of", SiblingOf);
    map.insert("sister_of", SiblingOf);
    map.insert("father_of", ParentOf);
    map.insert("mother_of", ParentOf);
    map.insert("son_of", ChildOf);
    map.insert("daughter_of", ChildOf);
    // location
    map.insert("went_to", TraveledTo);
    map.insert("journeyed_to", TraveledTo);
    map.insert("goes_to", TraveledTo);
    map.insert("located_at", LocatedIn);
    map.insert("situated_in", LocatedIn);
    map.insert("dwells_in", LivesIn);
    map.insert("resides_in", LivesIn);
    map.insert("dwelt_in", LivesIn);
    // education
    map.insert("attends", StudiesAt);
    map.insert("enrolled_at", StudiesAt);
    map.insert("studied_at", StudiesAt);
    // creation
    map.insert("authored", Wrote);
    map.insert("penned", Wrote);
    map.insert("constructed", Built);
    map.insert("made", Created);
    // ownership
    map.insert("possessed_by", BelongsTo);
    map.insert("holds", Possesses);
    // event
    map.insert("slew", Killed);
    map.insert("vanquished", Defeated);
    // emotional
    map.insert("adores", Loves);
    map.insert("loathes", Hates);
    map.insert("dreads", Fears);
    map
});

/// Resolve a raw predicate string to the closed enum: alias map first,
/// then the canonical names themselves.
pub fn resolve_predicate(name: &str) -> Option<Predicate> {
    let trimmed = name.trim().to_lowercase();
    PREDICATE_ALIASES
        .get(trimmed.as_str())
        .copied()
        .or_else(|| Predicate::parse(&trimmed))
}

/// Canonical name for a raw predicate string, if known.
pub fn canonical_predicate_name(name: &str) -> Option<&'static str> {
    resolve_predicate(name).map(|p| p.as_str())
}
