//! Entity promotion: from noun-phrase mentions to tiered entities.
//!
//! The stage runs in three passes:
//!
//! 1. [`collect_mentions`] walks the parsed sentences and produces one
//!    [`MentionContext`] per noun-phrase head, with its syntactic and
//!    lexical signals.
//! 2. The [`EvidenceAccumulator`] aggregates signals per normalized
//!    surface form, merges aliases, and decides a promotion level.
//! 3. The [`QualityFilter`] applies lexical sanity rules and type-specific
//!    validators; it can keep, reject, demote or split a candidate, and
//!    every decision leaves an audit record on the entity.
//!
//! Nothing in this crate fails the pipeline: rejected candidates are
//! retained with `rejected = true` and their [`prose_graph::QualityDecision`].

mod accumulator;
mod alias;
mod collect;
mod context;
mod gender;
mod quality;

pub use accumulator::{
    EntityCandidate, EvidenceAccumulator, MentionOffset, PromotionLevel, Signals,
};
pub use alias::{merge_candidates, within_edit_distance_one};
pub use collect::collect_mentions;
pub use context::MentionContext;
pub use gender::infer_gender;
pub use quality::{FilterOutcome, QualityFilter};
