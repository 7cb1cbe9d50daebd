//! Salience-based coreference resolution and quote attribution.
//!
//! The resolver keeps a decaying salience stack of recently mentioned
//! entities and resolves personal pronouns and definite descriptions
//! against it. It refuses under ambiguity: a tie between candidates is an
//! `unresolved` outcome, never a guess.
//!
//! The quote attributor runs alongside, assigning speakers to quoted
//! spans with adjacency rules and a turn-taking second pass, using the
//! resolver for pronoun speakers.

mod directory;
mod engine;
mod quotes;
mod resolver;
mod salience;

pub use directory::{DirectoryEntry, EntityDirectory};
pub use engine::{CorefEngine, CorefLink, CorefOutcome, CorefRefusal};
pub use quotes::{attribute_quotes, detect_quotes, AttributionOutcome};
pub use resolver::{
    PriorMention, ReferenceResolver, Resolution, ResolutionMethod, ResolverConfig,
    UnresolvedReason,
};
pub use salience::{GrammaticalRole, Number, SalienceConfig, SalienceEntry, SalienceStack};
