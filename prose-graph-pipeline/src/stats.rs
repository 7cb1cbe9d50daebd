//! Per-run statistics.
//!
//! Counters per stage, rejection reasons, refusal reasons, violation
//! kinds and the dedup ratio. Flattened to a string map for version
//! stamps on the persisted graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The statistics block returned alongside the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub sentences: u64,
    pub mentions_collected: u64,
    pub candidates: u64,
    pub entities_accepted: u64,
    pub entities_rejected: u64,
    pub entities_split: u64,
    pub rejections_by_rule: BTreeMap<String, u64>,
    pub coref_links: u64,
    pub coref_refusals_by_reason: BTreeMap<String, u64>,
    pub quotes_detected: u64,
    pub quotes_pattern: u64,
    pub quotes_pronoun: u64,
    pub quotes_turn_taking: u64,
    pub quotes_unattributed: u64,
    pub raw_relations: u64,
    pub relations_emitted: u64,
    pub violations_by_kind: BTreeMap<String, u64>,
    pub duplicates_merged: u64,
    pub dedup_ratio: f64,
    pub patterns_applied: u64,
    pub corrections_applied: u64,
    pub corrections_skipped: u64,
    pub patterns_dropped_at_load: u64,
}

impl PipelineStats {
    pub fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
        *map.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Flatten the counters for a persisted version stamp.
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        let mut map = BTreeMap::new();
        map.insert("sentences".to_string(), self.sentences);
        map.insert("mentions".to_string(), self.mentions_collected);
        map.insert("entitiesAccepted".to_string(), self.entities_accepted);
        map.insert("entitiesRejected".to_string(), self.entities_rejected);
        map.insert("entitiesSplit".to_string(), self.entities_split);
        map.insert("corefLinks".to_string(), self.coref_links);
        map.insert("quotesDetected".to_string(), self.quotes_detected);
        map.insert("relationsEmitted".to_string(), self.relations_emitted);
        map.insert("duplicatesMerged".to_string(), self.duplicates_merged);
        map.insert("correctionsApplied".to_string(), self.corrections_applied);
        map.insert("correctionsSkipped".to_string(), self.corrections_skipped);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_accumulates() {
        let mut stats = PipelineStats::default();
        PipelineStats::bump(&mut stats.rejections_by_rule, "stopword");
        PipelineStats::bump(&mut stats.rejections_by_rule, "stopword");
        assert_eq!(stats.rejections_by_rule["stopword"], 2);
    }
}
