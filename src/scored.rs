//! `Scored<T>` infrastructure for confidence-carrying values.
//!
//! Extraction output is graded, never binary: a promoted entity, a resolved
//! pronoun or an attributed quote all carry a confidence in `[0, 1]` plus
//! the source that produced the score. `confidence = 1.0` is reserved for
//! manually reviewed values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A value with an associated confidence score and provenance.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<T> {
    /// The actual value
    pub value: T,
    /// Confidence score from 0.0 to 1.0
    pub confidence: f64,
    /// Where this score came from
    pub source: ScoreSource,
}

/// The source of a confidence score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSource {
    /// Produced by a named extraction rule (promotion table, quality rule,
    /// pattern id).
    Rule { rule_name: String },
    /// Produced by the reference resolver; `method` is the resolution
    /// method tag (`gender-unique`, `salience`, ...).
    Resolver { method: String },
    /// Set during manual review or correction replay.
    Manual { author: String },
    /// Derived by combining other scores.
    Derived,
}

impl<T> Scored<T> {
    /// Create a scored value; confidence is clamped into `[0, 1]`.
    pub fn new(value: T, confidence: f64, source: ScoreSource) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn rule(value: T, confidence: f64, rule_name: &str) -> Self {
        Self::new(
            value,
            confidence,
            ScoreSource::Rule {
                rule_name: rule_name.to_string(),
            },
        )
    }

    pub fn resolver(value: T, confidence: f64, method: &str) -> Self {
        Self::new(
            value,
            confidence,
            ScoreSource::Resolver {
                method: method.to_string(),
            },
        )
    }

    /// A manually reviewed value (confidence pinned to 1.0).
    pub fn manual(value: T, author: &str) -> Self {
        Self::new(
            value,
            1.0,
            ScoreSource::Manual {
                author: author.to_string(),
            },
        )
    }

    pub fn is_verified(&self) -> bool {
        self.confidence >= 1.0
    }

    /// Map the inner value, keeping confidence and source.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Scored<U> {
        Scored {
            value: f(self.value),
            confidence: self.confidence,
            source: self.source,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Scored<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scored({:?}, {:.2}, {:?})",
            self.value, self.confidence, self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped() {
        let s = Scored::rule("x", 1.7, "promotion");
        assert_eq!(s.confidence, 1.0);
        let s = Scored::rule("x", -0.2, "promotion");
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn manual_is_verified() {
        assert!(Scored::manual("x", "reviewer").is_verified());
        assert!(!Scored::rule("x", 0.9, "r").is_verified());
    }

    #[test]
    fn debug_format() {
        let s = Scored::resolver("Hermione", 0.85, "gender-unique");
        insta::assert_snapshot!(
            format!("{:?}", s),
            @r###"Scored("Hermione", 0.85, Resolver { method: "gender-unique" })"###
        );
    }
}
