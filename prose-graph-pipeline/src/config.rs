//! Pipeline configuration from environment variables.
//!
//! Recognized variables: `DYNAMIC_PATTERNS`, `PATTERNS_MODE`,
//! `PATTERNS_DIR`, `DEDUPLICATE`, `DEDUP_RAW`, `ENTITY_FILTER`,
//! `PRECISION_MODE`, `COREF_DEBUG`, `DEDUP_DEBUG`. Tests construct
//! configs directly; `from_env` is the production entry point.

use std::env;
use std::path::PathBuf;

use prose_graph_coref::{ResolverConfig, SalienceConfig};
use prose_graph_relations::PatternsMode;

/// Everything the document pipeline can be told from outside.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Load JSON pattern libraries at startup (`DYNAMIC_PATTERNS=on|1`).
    pub dynamic_patterns: bool,
    /// Which library variant to load (`PATTERNS_MODE`).
    pub patterns_mode: PatternsMode,
    /// Directory holding the JSON pattern libraries.
    pub patterns_dir: Option<PathBuf>,
    /// Relation dedup (`DEDUPLICATE`, default on).
    pub deduplicate: bool,
    /// Dedup by raw ids instead of canonical names (`DEDUP_RAW=1`).
    pub dedup_raw: bool,
    /// Entity quality filter (`ENTITY_FILTER`, default on).
    pub entity_filter: bool,
    /// Strict precision mode (`PRECISION_MODE=strict`).
    pub strict: bool,
    /// Verbose coref audit events (`COREF_DEBUG=1`).
    pub coref_debug: bool,
    /// Verbose dedup audit events (`DEDUP_DEBUG=1`).
    pub dedup_debug: bool,
    pub resolver: ResolverConfig,
    pub salience: SalienceConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dynamic_patterns: false,
            patterns_mode: PatternsMode::Baseline,
            patterns_dir: None,
            deduplicate: true,
            dedup_raw: false,
            entity_filter: true,
            strict: false,
            coref_debug: false,
            dedup_debug: false,
            resolver: ResolverConfig::default(),
            salience: SalienceConfig::default(),
        }
    }
}

fn flag_on(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "on" | "1" | "true")
}

fn flag_off(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "off" | "0" | "false")
}

impl PipelineConfig {
    /// Read the recognized environment variables over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = env::var("DYNAMIC_PATTERNS") {
            config.dynamic_patterns = flag_on(&value);
        }
        if let Ok(value) = env::var("PATTERNS_MODE") {
            config.patterns_mode = PatternsMode::parse(&value);
        }
        if let Ok(value) = env::var("PATTERNS_DIR") {
            config.patterns_dir = Some(PathBuf::from(value));
        }
        if let Ok(value) = env::var("DEDUPLICATE") {
            if flag_off(&value) {
                config.deduplicate = false;
            }
        }
        if let Ok(value) = env::var("DEDUP_RAW") {
            config.dedup_raw = flag_on(&value);
        }
        if let Ok(value) = env::var("ENTITY_FILTER") {
            if flag_off(&value) {
                config.entity_filter = false;
            }
        }
        if let Ok(value) = env::var("PRECISION_MODE") {
            config.strict = value.trim().eq_ignore_ascii_case("strict");
        }
        if let Ok(value) = env::var("COREF_DEBUG") {
            config.coref_debug = flag_on(&value);
        }
        if let Ok(value) = env::var("DEDUP_DEBUG") {
            config.dedup_debug = flag_on(&value);
        }
        config
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_dedup(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    pub fn with_entity_filter(mut self, entity_filter: bool) -> Self {
        self.entity_filter = entity_filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = PipelineConfig::default();
        assert!(config.deduplicate);
        assert!(config.entity_filter);
        assert!(!config.strict);
        assert!(!config.dynamic_patterns);
        assert_eq!(config.patterns_mode, PatternsMode::Baseline);
    }

    #[test]
    fn flag_parsing() {
        assert!(flag_on("on"));
        assert!(flag_on("1"));
        assert!(!flag_on("off"));
        assert!(flag_off("0"));
        assert!(flag_off("off"));
        assert!(!flag_off("1"));
    }
}
