//! Pattern libraries: dependency shapes and surface regexes.
//!
//! Libraries are data. A built-in set covers the default family whitelist
//! (location, part_whole, employment, creation, ownership, temporal,
//! event); `DYNAMIC_PATTERNS` additionally loads JSON files from a
//! patterns directory. A pattern that fails to compile - bad regex,
//! unparsable shape, predicate missing from the guard table - is dropped
//! with a warning and the run continues.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::canonical::resolve_predicate;

/// Which library variant to load from the patterns directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternsMode {
    #[default]
    Baseline,
    Expanded,
    Hybrid,
}

impl PatternsMode {
    pub fn parse(s: &str) -> PatternsMode {
        match s.trim().to_lowercase().as_str() {
            "expanded" => PatternsMode::Expanded,
            "hybrid" => PatternsMode::Hybrid,
            _ => PatternsMode::Baseline,
        }
    }
}

/// Default family whitelist for library loading.
pub const DEFAULT_FAMILIES: &[&str] = &[
    "location",
    "part_whole",
    "employment",
    "creation",
    "ownership",
    "temporal",
    "event",
];

/// A dependency pattern as stored in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepPattern {
    pub id: String,
    /// `"<subj dep>:<verb lemma>:<obj path>"`, e.g. `nsubj:go:prep_to`
    /// or `nsubj:lead:dobj`.
    pub dep_shape: String,
    pub predicate: String,
    pub family: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// A surface pattern as stored in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfacePattern {
    pub id: String,
    pub regex: String,
    pub predicate: String,
    pub family: String,
    #[serde(default)]
    pub lemma_form: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Parsed form of a `dep_shape` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepShape {
    pub subj_dep: String,
    pub verb_lemma: String,
    pub obj_path: ObjPath,
}

/// How the object hangs off the verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjPath {
    /// Direct object (`dobj` / `obj`).
    Direct,
    /// Object of a preposition under the verb: `prep_<word>`.
    Prep(String),
}

impl DepShape {
    pub fn parse(shape: &str) -> Option<DepShape> {
        let mut parts = shape.split(':');
        let subj_dep = parts.next()?.to_string();
        let verb_lemma = parts.next()?.to_string();
        let obj = parts.next()?;
        if parts.next().is_some() || subj_dep.is_empty() || verb_lemma.is_empty() {
            return None;
        }
        let obj_path = if obj == "dobj" || obj == "obj" {
            ObjPath::Direct
        } else if let Some(prep) = obj.strip_prefix("prep_") {
            if prep.is_empty() {
                return None;
            }
            ObjPath::Prep(prep.to_string())
        } else {
            return None;
        };
        Some(DepShape {
            subj_dep,
            verb_lemma,
            obj_path,
        })
    }
}

/// A dependency pattern ready to match.
#[derive(Debug, Clone)]
pub struct CompiledDep {
    pub id: String,
    pub shape: DepShape,
    pub predicate: String,
}

/// A surface pattern ready to match.
#[derive(Debug, Clone)]
pub struct CompiledSurface {
    pub id: String,
    pub regex: Regex,
    pub predicate: String,
}

/// The loaded, compiled pattern set.
#[derive(Debug, Default)]
pub struct PatternLibrary {
    pub dep: Vec<CompiledDep>,
    pub surface: Vec<CompiledSurface>,
    /// Patterns dropped during load (bad regex, shape, or predicate).
    pub dropped: usize,
}

impl PatternLibrary {
    /// The compiled-in default patterns for the whitelisted families.
    pub fn builtin() -> Self {
        let mut library = PatternLibrary::default();
        for (id, shape, predicate, family) in BUILTIN_DEP {
            library.add_dep(&DepPattern {
                id: (*id).to_string(),
                dep_shape: (*shape).to_string(),
                predicate: (*predicate).to_string(),
                family: (*family).to_string(),
                examples: Vec::new(),
            });
        }
        for (id, regex, predicate, family) in BUILTIN_SURFACE {
            library.add_surface(&SurfacePattern {
                id: (*id).to_string(),
                regex: (*regex).to_string(),
                predicate: (*predicate).to_string(),
                family: (*family).to_string(),
                lemma_form: None,
                examples: Vec::new(),
            });
        }
        library
    }

    /// Load JSON libraries from `dir`, filtered to `families`, on top of
    /// the builtin set.
    pub fn load_dir(dir: &Path, mode: PatternsMode, families: &[&str]) -> Self {
        let mut library = PatternLibrary::builtin();
        let variants: &[&str] = match mode {
            PatternsMode::Baseline => &[""],
            PatternsMode::Expanded => &["_expanded"],
            PatternsMode::Hybrid => &["", "_expanded"],
        };
        for variant in variants {
            let dep_path = dir.join(format!("dependency_patterns{variant}.json"));
            if let Some(patterns) = read_json::<Vec<DepPattern>>(&dep_path) {
                for pattern in &patterns {
                    if families.contains(&pattern.family.as_str()) {
                        library.add_dep(pattern);
                    }
                }
            }
            let surface_path = dir.join(format!("surface_patterns{variant}.json"));
            if let Some(patterns) = read_json::<Vec<SurfacePattern>>(&surface_path) {
                for pattern in &patterns {
                    if families.contains(&pattern.family.as_str()) {
                        library.add_surface(pattern);
                    }
                }
            }
        }
        library
    }

    fn add_dep(&mut self, pattern: &DepPattern) {
        if resolve_predicate(&pattern.predicate).is_none() {
            warn!(id = %pattern.id, predicate = %pattern.predicate, "unknown predicate, pattern dropped");
            self.dropped += 1;
            return;
        }
        match DepShape::parse(&pattern.dep_shape) {
            Some(shape) => self.dep.push(CompiledDep {
                id: pattern.id.clone(),
                shape,
                predicate: pattern.predicate.clone(),
            }),
            None => {
                warn!(id = %pattern.id, shape = %pattern.dep_shape, "unparsable dep shape, pattern dropped");
                self.dropped += 1;
            }
        }
    }

    fn add_surface(&mut self, pattern: &SurfacePattern) {
        if resolve_predicate(&pattern.predicate).is_none() {
            warn!(id = %pattern.id, predicate = %pattern.predicate, "unknown predicate, pattern dropped");
            self.dropped += 1;
            return;
        }
        match Regex::new(&pattern.regex) {
            Ok(regex) => self.surface.push(CompiledSurface {
                id: pattern.id.clone(),
                regex,
                predicate: pattern.predicate.clone(),
            }),
            Err(err) => {
                warn!(id = %pattern.id, %err, "regex failed to compile, pattern dropped");
                self.dropped += 1;
            }
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), %err, "pattern file unreadable, skipped");
            None
        }
    }
}

const BUILTIN_DEP: &[(&str, &str, &str, &str)] = &[
    // location
    ("dep-go-to", "nsubj:go:prep_to", "traveled_to", "location"),
    ("dep-travel-to", "nsubj:travel:prep_to", "traveled_to", "location"),
    ("dep-journey-to", "nsubj:journey:prep_to", "traveled_to", "location"),
    ("dep-move-to", "nsubj:move:prep_to", "moved_to", "location"),
    ("dep-return-to", "nsubj:return:prep_to", "returned_to", "location"),
    ("dep-flee-to", "nsubj:flee:prep_to", "fled_to", "location"),
    ("dep-live-in", "nsubj:live:prep_in", "lives_in", "location"),
    ("dep-dwell-in", "nsubj:dwell:prep_in", "lives_in", "location"),
    ("dep-visit", "nsubj:visit:dobj", "visited", "location"),
    // employment
    ("dep-lead", "nsubj:lead:dobj", "leads", "employment"),
    ("dep-head", "nsubj:head:dobj", "heads", "employment"),
    ("dep-run", "nsubj:run:dobj", "runs", "employment"),
    ("dep-manage", "nsubj:manage:dobj", "manages", "employment"),
    ("dep-work-at", "nsubj:work:prep_at", "works_at", "employment"),
    ("dep-work-for", "nsubj:work:prep_for", "works_for", "employment"),
    ("dep-serve", "nsubj:serve:dobj", "serves", "employment"),
    ("dep-study-at", "nsubj:study:prep_at", "studies_at", "employment"),
    ("dep-teach-at", "nsubj:teach:prep_at", "teaches_at", "employment"),
    ("dep-rule", "nsubj:rule:dobj", "rules", "employment"),
    ("dep-command", "nsubj:command:dobj", "commands", "employment"),
    ("dep-found", "nsubj:found:dobj", "founded", "employment"),
    // creation
    ("dep-create", "nsubj:create:dobj", "created", "creation"),
    ("dep-write", "nsubj:write:dobj", "wrote", "creation"),
    ("dep-build", "nsubj:build:dobj", "built", "creation"),
    ("dep-forge", "nsubj:forge:dobj", "forged", "creation"),
    ("dep-compose", "nsubj:compose:dobj", "composed", "creation"),
    ("dep-destroy", "nsubj:destroy:dobj", "destroyed", "creation"),
    // ownership
    ("dep-own", "nsubj:own:dobj", "owns", "ownership"),
    ("dep-possess", "nsubj:possess:dobj", "possesses", "ownership"),
    ("dep-carry", "nsubj:carry:dobj", "carries", "ownership"),
    ("dep-wield", "nsubj:wield:dobj", "wields", "ownership"),
    ("dep-inherit", "nsubj:inherit:dobj", "inherited", "ownership"),
    ("dep-wear", "nsubj:wear:dobj", "wears", "ownership"),
    // event
    ("dep-kill", "nsubj:kill:dobj", "killed", "event"),
    ("dep-defeat", "nsubj:defeat:dobj", "defeated", "event"),
    ("dep-attack", "nsubj:attack:dobj", "attacked", "event"),
    ("dep-rescue", "nsubj:rescue:dobj", "rescued", "event"),
    ("dep-capture", "nsubj:capture:dobj", "captured", "event"),
    ("dep-betray", "nsubj:betray:dobj", "betrayed", "event"),
    ("dep-attend", "nsubj:attend:dobj", "attended", "event"),
    ("dep-win", "nsubj:win:dobj", "won", "event"),
    ("dep-fight-in", "nsubj:fight:prep_in", "fought_in", "event"),
    // part-whole
    ("dep-contain", "nsubj:contain:dobj", "contains", "part_whole"),
    ("dep-include", "nsubj:include:dobj", "includes", "part_whole"),
];

const BUILTIN_SURFACE: &[(&str, &str, &str, &str)] = &[
    (
        "surf-located-in",
        r"([A-Z][\w'-]+(?: [A-Z][\w'-]+)*) (?:is|was|lies|stands) (?:located )?in ([A-Z][\w'-]+(?: [A-Z][\w'-]+)*)",
        "located_in",
        "location",
    ),
    (
        "surf-capital-of",
        r"([A-Z][\w'-]+(?: [A-Z][\w'-]+)*), the capital of ([A-Z][\w'-]+(?: [A-Z][\w'-]+)*)",
        "capital_of",
        "location",
    ),
    (
        "surf-works-at",
        r"([A-Z][\w'-]+(?: [A-Z][\w'-]+)*) works (?:at|for) ([A-Z][\w'-]+(?: [A-Z][\w'-]+)*)",
        "works_at",
        "employment",
    ),
    (
        "surf-part-of",
        r"([A-Z][\w'-]+(?: [A-Z][\w'-]+)*) (?:is|was) part of ([A-Z][\w'-]+(?: [A-Z][\w'-]+)*)",
        "part_of",
        "part_whole",
    ),
    (
        "surf-owns",
        r"([A-Z][\w'-]+(?: [A-Z][\w'-]+)*) owns ([A-Z][\w'-]+(?: [A-Z][\w'-]+)*)",
        "owns",
        "ownership",
    ),
    (
        "surf-founded",
        r"([A-Z][\w'-]+(?: [A-Z][\w'-]+)*) founded ([A-Z][\w'-]+(?: [A-Z][\w'-]+)*)",
        "founded",
        "employment",
    ),
];
