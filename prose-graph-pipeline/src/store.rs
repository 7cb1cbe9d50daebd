//! JSON graph persistence.
//!
//! One JSON document per extraction: `{entities, relations, corrections,
//! learnedPatterns, versions}`. Loading a document written by an
//! incompatible schema version is a typed error, not a crash or a silent
//! migration.

use std::fs;
use std::path::{Path, PathBuf};

use prose_graph::{ExtractError, ExtractResult, KnowledgeGraph, SCHEMA_VERSION};
use tracing::debug;

/// Load/store interface over a directory of graph documents.
#[derive(Debug, Clone)]
pub struct GraphStore {
    root: PathBuf,
}

impl GraphStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, doc_id: &str) -> PathBuf {
        // doc ids may contain path-hostile characters; slug them away
        let safe: String = doc_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{safe}.json"))
    }

    /// Load a persisted graph, `None` when the document has never been
    /// saved.
    pub fn load(&self, doc_id: &str) -> ExtractResult<Option<KnowledgeGraph>> {
        let path = self.path_for(doc_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(ExtractError::Store {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })
            }
        };
        let graph: KnowledgeGraph =
            serde_json::from_str(&raw).map_err(|err| ExtractError::Store {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
        if graph.schema_version != SCHEMA_VERSION {
            return Err(ExtractError::SchemaVersion {
                found: graph.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(Some(graph))
    }

    /// Persist a graph, creating the store directory on first use.
    pub fn save(&self, doc_id: &str, graph: &KnowledgeGraph) -> ExtractResult<()> {
        let path = self.path_for(doc_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| ExtractError::Store {
                path: parent.display().to_string(),
                message: err.to_string(),
            })?;
        }
        let json = serde_json::to_string_pretty(graph).map_err(|err| ExtractError::Store {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        fs::write(&path, json).map_err(|err| ExtractError::Store {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        debug!(doc_id, path = %path.display(), "graph saved");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prose_graph::{Entity, EntityType};

    #[test]
    fn round_trip_and_missing_doc() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        assert!(store.load("doc-1").unwrap().is_none());

        let mut graph = KnowledgeGraph::new();
        graph
            .entities
            .push(Entity::new(EntityType::Person, "Frodo", 0.8, 0));
        store.save("doc-1", &graph).unwrap();

        let loaded = store.load("doc-1").unwrap().unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn schema_version_mismatch_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        let mut graph = KnowledgeGraph::new();
        graph.schema_version = 99;
        store.save("doc-1", &graph).unwrap();
        match store.load("doc-1") {
            Err(ExtractError::SchemaVersion { found, expected }) => {
                assert_eq!(found, 99);
                assert_eq!(expected, SCHEMA_VERSION);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn hostile_doc_ids_are_slugged() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path());
        store.save("../evil/doc", &KnowledgeGraph::new()).unwrap();
        assert!(store.load("../evil/doc").unwrap().is_some());
        assert!(dir.path().join("___evil_doc.json").exists());
    }
}
