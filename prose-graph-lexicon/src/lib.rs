//! Read-only lexicons shared by the extraction pipeline.
//!
//! Everything in this crate is immutable init data: word lists are `const`
//! slices with lazily built lookup sets. They are loaded once per process
//! and shared freely across document workers.

mod generic;
mod names;
mod pronouns;
mod races;
mod roles;
mod stopwords;
mod titles;
mod verbs;

pub use generic::{is_abstract_person_noun, is_too_generic, ABSTRACT_PERSON_NOUNS, GENERIC_NOUNS};
pub use names::{name_gender, FEMALE_FIRST_NAMES, MALE_FIRST_NAMES};
pub use pronouns::{
    is_deictic, is_pronoun, pronoun_profile, PronounKind, PronounProfile, PronounRole,
};
pub use races::{is_curated_race, has_demonym_suffix, CURATED_RACES, DEMONYM_SUFFIXES};
pub use roles::{role_gender, role_noun_type, is_role_word, ROLE_WORDS};
pub use stopwords::{is_stopword, GLOBAL_STOPWORDS};
pub use titles::{title_gender, is_title_prefix, strip_title_prefix, TITLE_PREFIXES};
pub use verbs::{is_speech_verb, is_strong_agentive_verb, SPEECH_VERBS, STRONG_AGENTIVE_VERBS};
