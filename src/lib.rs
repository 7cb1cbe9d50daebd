//! Core data model for deterministic knowledge-graph extraction from prose.
//!
//! This crate defines the shared vocabulary of the pipeline:
//!
//! - [`Token`], [`Sentence`], [`ParseResponse`] - dependency-annotated input
//!   produced by an upstream parser
//! - [`Entity`], [`EntityType`], [`Tier`] - typed, quality-tiered entities
//! - [`Relation`], [`Predicate`], [`TypeGuard`] - typed relations with
//!   evidence spans and per-predicate type guards
//! - [`QuoteMatch`], [`SpeakerCandidate`] - quoted spans and their speakers
//! - [`Correction`], [`LearnedPattern`] - persisted user edits and the rules
//!   mined from them
//! - [`KnowledgeGraph`] - the persisted output document
//!
//! Identifiers are opaque, stable strings: an entity id is a pure function
//! of `(type, normalized canonical)`, so re-extraction of the same document
//! produces the same ids and user corrections can be replayed against a
//! fresh graph.
//!
//! The extraction stages live in the companion crates
//! (`prose-graph-entities`, `prose-graph-coref`, `prose-graph-relations`,
//! `prose-graph-corrections`) and are orchestrated by
//! `prose-graph-pipeline`.

mod correction;
mod entity;
mod error;
mod graph;
mod guards;
mod quote;
mod relation;
mod scored;
mod span;
mod token;

pub use correction::{
    Correction, CorrectionType, LearnedPattern, PatternAction, PatternCondition, PatternStats,
    PatternType,
};
pub use entity::{
    entity_id, normalize_name, slugify, Entity, EntitySpan, EntityType, Gender, QualityDecision,
    QualityVerdict, Tier,
};
pub use error::{ExtractError, ExtractResult};
pub use graph::{KnowledgeGraph, VersionStamp, SCHEMA_VERSION};
pub use guards::{guard_for, TypeGuard};
pub use quote::{AttributedQuote, AttributionMethod, QuoteMatch, QuoteStyle, SpeakerCandidate};
pub use relation::{Extractor, Predicate, PredicateFamily, Qualifiers, Relation};
pub use scored::{ScoreSource, Scored};
pub use span::{Evidence, EvidenceSource, EvidenceSpan, TextSpan};
pub use token::{ParseResponse, Sentence, Token};
