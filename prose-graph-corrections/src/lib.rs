//! Correction replay and pattern learning.
//!
//! Stored user corrections survive re-extraction: the [`OverrideManager`]
//! deterministically reapplies them to a freshly extracted graph in
//! timestamp order, reporting skips and semantic clashes as structured
//! conflicts instead of failing. The [`PatternStore`] mines corrections
//! into reusable patterns through closed template matchers and applies
//! them to future extractions.

mod learn;
mod replay;

pub use learn::{extract_patterns, PatternApplication, PatternStore};
pub use replay::{OverrideManager, ReplayConflict, ReplayReport};
