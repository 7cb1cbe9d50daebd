//! Raw relations as produced by the extractors, before normalization.

use prose_graph::{Evidence, Extractor};
use serde::{Deserialize, Serialize};

/// An un-normalized relation: predicate still a string, endpoints already
/// resolved to entity ids (surfaces kept for auditability).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRelation {
    pub subj: String,
    pub pred: String,
    pub obj: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subj_surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_surface: Option<String>,
    pub evidence: Vec<Evidence>,
    pub confidence: f64,
    pub extractor: Extractor,
}

impl RawRelation {
    pub fn new(subj: &str, pred: &str, obj: &str, confidence: f64, extractor: Extractor) -> Self {
        Self {
            subj: subj.to_string(),
            pred: pred.to_string(),
            obj: obj.to_string(),
            subj_surface: None,
            obj_surface: None,
            evidence: Vec::new(),
            confidence,
            extractor,
        }
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    pub fn with_surfaces(mut self, subj: &str, obj: &str) -> Self {
        self.subj_surface = Some(subj.to_string());
        self.obj_surface = Some(obj.to_string());
        self
    }
}
