//! Offset -> entity anchoring for the extractors.
//!
//! Extractors work in character offsets; this index maps an offset to the
//! entity mentioned there, through entity spans and resolved coreference
//! links, and maps surface names back to entity ids.

use prose_graph::{normalize_name, EntitySpan, EntityType};

/// A resolved pronoun occurrence usable as an anchor.
#[derive(Debug, Clone)]
pub struct LinkAnchor {
    pub start: usize,
    pub end: usize,
    pub entity_id: String,
}

/// Lookup structure over one document's entity mentions.
#[derive(Debug, Default)]
pub struct AnchorIndex {
    spans: Vec<EntitySpan>,
    links: Vec<LinkAnchor>,
    /// (normalized canonical or alias, entity id, entity type)
    names: Vec<(String, String, EntityType)>,
}

impl AnchorIndex {
    pub fn new(
        mut spans: Vec<EntitySpan>,
        links: Vec<LinkAnchor>,
        names: Vec<(String, String, EntityType)>,
    ) -> Self {
        spans.sort_by_key(|s| s.start);
        Self { spans, links, names }
    }

    /// Entity covering `offset`, via a mention span or a resolved link.
    pub fn entity_at(&self, offset: usize) -> Option<&str> {
        if let Some(span) = self
            .spans
            .iter()
            .find(|s| s.start <= offset && offset < s.end)
        {
            return Some(&span.entity_id);
        }
        self.links
            .iter()
            .find(|l| l.start <= offset && offset < l.end)
            .map(|l| l.entity_id.as_str())
    }

    /// Entity whose canonical or alias equals `name` (normalized).
    pub fn entity_by_name(&self, name: &str) -> Option<&str> {
        let norm = normalize_name(name);
        self.names
            .iter()
            .find(|(n, _, _)| *n == norm)
            .map(|(_, id, _)| id.as_str())
    }

    /// Most recent mention before `offset` of an entity with one of the
    /// given types; used for place anaphora ("there").
    pub fn latest_of_types_before(&self, offset: usize, types: &[EntityType]) -> Option<&str> {
        self.spans
            .iter()
            .rev()
            .filter(|s| s.end <= offset)
            .find(|s| {
                self.names
                    .iter()
                    .any(|(_, id, ty)| *id == s.entity_id && types.contains(ty))
            })
            .map(|s| s.entity_id.as_str())
    }

    pub fn spans(&self) -> &[EntitySpan] {
        &self.spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> AnchorIndex {
        AnchorIndex::new(
            vec![
                EntitySpan {
                    entity_id: "person:harry".into(),
                    start: 0,
                    end: 5,
                    surface: "Harry".into(),
                    sentence_index: 0,
                },
                EntitySpan {
                    entity_id: "org:hogwarts".into(),
                    start: 14,
                    end: 22,
                    surface: "Hogwarts".into(),
                    sentence_index: 0,
                },
            ],
            vec![LinkAnchor {
                start: 24,
                end: 26,
                entity_id: "person:harry".into(),
            }],
            vec![
                ("harry".into(), "person:harry".into(), EntityType::Person),
                ("hogwarts".into(), "org:hogwarts".into(), EntityType::Org),
            ],
        )
    }

    #[test]
    fn anchors_resolve_spans_and_links() {
        let idx = index();
        assert_eq!(idx.entity_at(2), Some("person:harry"));
        assert_eq!(idx.entity_at(25), Some("person:harry"));
        assert_eq!(idx.entity_at(40), None);
    }

    #[test]
    fn latest_place_before_offset() {
        let idx = index();
        assert_eq!(
            idx.latest_of_types_before(40, &[EntityType::Org, EntityType::Place]),
            Some("org:hogwarts")
        );
        assert_eq!(idx.latest_of_types_before(10, &[EntityType::Org]), None);
    }
}
