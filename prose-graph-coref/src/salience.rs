//! The decaying salience stack.
//!
//! Salience estimates how "in focus" an entity is at a text position.
//! Mentions add a role-weighted increment; sentence and paragraph
//! boundaries decay every entry; entries that fade below the prune
//! threshold drop off the stack. Ordering is fully deterministic:
//! salience descending, then last mention position descending, then
//! entity id.

use prose_graph::{EntityType, Gender};
use serde::{Deserialize, Serialize};

/// Grammatical role of a mention, for salience weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrammaticalRole {
    Subject,
    Object,
    Other,
}

/// Grammatical number, for pronoun agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Number {
    Singular,
    Plural,
    Unknown,
}

/// One entity on the salience stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalienceEntry {
    pub entity_id: String,
    pub name: String,
    pub gender: Gender,
    pub number: Number,
    pub last_mention_pos: usize,
    pub last_mention_sentence: usize,
    pub salience: f64,
    pub grammatical_role: GrammaticalRole,
    pub entity_type: EntityType,
}

/// Tunables for the salience model.
#[derive(Debug, Clone)]
pub struct SalienceConfig {
    pub subject_weight: f64,
    pub object_weight: f64,
    pub other_weight: f64,
    pub sentence_decay: f64,
    pub paragraph_decay: f64,
    /// When set, a paragraph boundary clears the stack instead of decaying.
    pub paragraph_reset: bool,
    pub prune_threshold: f64,
}

impl Default for SalienceConfig {
    fn default() -> Self {
        Self {
            subject_weight: 3.0,
            object_weight: 2.0,
            other_weight: 1.0,
            sentence_decay: 0.8,
            paragraph_decay: 0.4,
            paragraph_reset: false,
            prune_threshold: 0.3,
        }
    }
}

impl SalienceConfig {
    fn weight(&self, role: GrammaticalRole) -> f64 {
        match role {
            GrammaticalRole::Subject => self.subject_weight,
            GrammaticalRole::Object => self.object_weight,
            GrammaticalRole::Other => self.other_weight,
        }
    }
}

/// Per-document salience state. Discarded after the run.
#[derive(Debug, Default)]
pub struct SalienceStack {
    config: SalienceConfig,
    entries: Vec<SalienceEntry>,
}

impl SalienceStack {
    pub fn new(config: SalienceConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
        }
    }

    /// Register a mention: update the existing entry or push a new one,
    /// then re-sort.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        entity_id: &str,
        name: &str,
        gender: Gender,
        number: Number,
        entity_type: EntityType,
        position: usize,
        sentence_index: usize,
        role: GrammaticalRole,
    ) {
        let increment = self.config.weight(role);
        match self.entries.iter_mut().find(|e| e.entity_id == entity_id) {
            Some(entry) => {
                entry.last_mention_pos = position;
                entry.last_mention_sentence = sentence_index;
                entry.grammatical_role = role;
                entry.salience += increment;
            }
            None => self.entries.push(SalienceEntry {
                entity_id: entity_id.to_string(),
                name: name.to_string(),
                gender,
                number,
                last_mention_pos: position,
                last_mention_sentence: sentence_index,
                salience: increment,
                grammatical_role: role,
                entity_type,
            }),
        }
        self.resort();
    }

    /// Sentence boundary: decay everything, prune the faded.
    pub fn sentence_boundary(&mut self) {
        self.scale(self.config.sentence_decay);
    }

    /// Paragraph boundary: heavier decay, or a full reset when configured.
    pub fn paragraph_boundary(&mut self) {
        if self.config.paragraph_reset {
            self.entries.clear();
        } else {
            self.scale(self.config.paragraph_decay);
        }
    }

    /// Apply an arbitrary decay factor (the quote pass uses 0.9 between
    /// quotes), then prune and re-sort.
    pub fn scale(&mut self, factor: f64) {
        for entry in &mut self.entries {
            entry.salience *= factor;
        }
        let threshold = self.config.prune_threshold;
        self.entries.retain(|e| e.salience >= threshold);
        self.resort();
    }

    fn resort(&mut self) {
        self.entries.sort_by(|a, b| {
            b.salience
                .partial_cmp(&a.salience)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.last_mention_pos.cmp(&a.last_mention_pos))
                .then(a.entity_id.cmp(&b.entity_id))
        });
    }

    /// Entries in descending salience order.
    pub fn entries(&self) -> &[SalienceEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, entity_id: &str) -> Option<&SalienceEntry> {
        self.entries.iter().find(|e| e.entity_id == entity_id)
    }
}
