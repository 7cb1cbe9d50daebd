//! Character spans and evidence records.
//!
//! Evidence spans are carried through the pipeline without normalization:
//! the `text` field is the exact slice of the source document that
//! justified a mention or relation.

use serde::{Deserialize, Serialize};

/// A half-open character range `[start, end)` into the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if this span overlaps `other` at all.
    pub fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains(&self, other: &TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Where a piece of evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceSource {
    /// Directly observed in the raw text.
    #[serde(rename = "RAW")]
    Raw,
    /// Produced by a rule (pattern library, learned pattern, replay).
    #[serde(rename = "RULE")]
    Rule,
    /// Supplied by a language-model hint. The pipeline never produces
    /// these itself; the tag exists so external hints survive a round trip.
    #[serde(rename = "LLM_HINT")]
    LlmHint,
}

/// A textual justification for a relation or entity mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub doc_id: String,
    pub span: EvidenceSpan,
    pub sentence_index: usize,
    pub source: EvidenceSource,
}

/// The located text slice inside an [`Evidence`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Evidence {
    pub fn raw(doc_id: &str, start: usize, end: usize, text: &str, sentence_index: usize) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            span: EvidenceSpan {
                start,
                end,
                text: text.to_string(),
            },
            sentence_index,
            source: EvidenceSource::Raw,
        }
    }

    /// Key used when unioning evidence lists during relation dedup.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}-{}", self.doc_id, self.span.start, self.span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_and_containment() {
        let a = TextSpan::new(0, 10);
        let b = TextSpan::new(5, 15);
        let c = TextSpan::new(10, 12);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(&TextSpan::new(2, 8)));
        assert!(!a.contains(&b));
    }

    #[test]
    fn evidence_dedup_key_is_doc_and_offsets() {
        let ev = Evidence::raw("doc-1", 4, 9, "Arwen", 0);
        assert_eq!(ev.dedup_key(), "doc-1:4-9");
    }

    #[test]
    fn evidence_source_serializes_upper_case() {
        let ev = Evidence::raw("d", 0, 1, "a", 0);
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"RAW\""));
    }
}
