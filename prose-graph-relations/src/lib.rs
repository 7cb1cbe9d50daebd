//! Relation extraction and normalization.
//!
//! Upstream extractors (dependency shapes, surface regexes, fiction
//! heuristics) produce [`RawRelation`]s whose predicate is still a string.
//! The [`RelationNormalizer`] canonicalizes predicates through a
//! direction-preserving alias map, enforces per-predicate type guards,
//! and deduplicates by canonical key, merging evidence. Malformed input
//! never throws; it is dropped and counted.

mod anchors;
mod canonical;
mod extract;
mod library;
mod normalize;
mod raw;

pub use anchors::{AnchorIndex, LinkAnchor};
pub use canonical::{canonical_predicate_name, resolve_predicate};
pub use extract::{
    extract_dep_relations, extract_dialogue_relations, extract_family_relations,
    extract_place_anaphora, extract_surface_relations,
};
pub use library::{
    CompiledDep, CompiledSurface, DepPattern, DepShape, ObjPath, PatternLibrary, PatternsMode,
    SurfacePattern, DEFAULT_FAMILIES,
};
pub use normalize::{
    NormalizeOutcome, NormalizerConfig, RelationNormalizer, Violation, ViolationKind,
};
pub use raw::RawRelation;
