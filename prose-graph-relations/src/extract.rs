//! Raw relation extractors.
//!
//! Four sources feed the normalizer: dependency shapes from the pattern
//! library, surface regexes, fiction heuristics (appositive parentage,
//! narrative action with place anaphora), and dialogue turns. Every
//! extractor anchors endpoints to entity ids through the
//! [`AnchorIndex`] and attaches a raw evidence span; anything it cannot
//! anchor, it skips.

use once_cell::sync::Lazy;
use prose_graph::{AttributedQuote, EntityType, Evidence, Extractor, Sentence, Token};
use regex::Regex;
use tracing::trace;

use crate::anchors::AnchorIndex;
use crate::library::{ObjPath, PatternLibrary};
use crate::raw::RawRelation;

/// Dependency extraction: verb-centered subject/object shapes.
pub fn extract_dep_relations(
    text: &str,
    sentences: &[Sentence],
    anchors: &AnchorIndex,
    library: &PatternLibrary,
    doc_id: &str,
) -> Vec<RawRelation> {
    let mut relations = Vec::new();
    for sentence in sentences {
        for verb in sentence.tokens.iter().filter(|t| t.is_verb()) {
            for pattern in library.dep.iter().filter(|p| p.shape.verb_lemma == verb.lemma) {
                let Some(subj_token) = child_with_dep(sentence, verb, &pattern.shape.subj_dep)
                else {
                    continue;
                };
                let obj_token = match &pattern.shape.obj_path {
                    ObjPath::Direct => child_with_dep(sentence, verb, "dobj")
                        .or_else(|| child_with_dep(sentence, verb, "obj")),
                    ObjPath::Prep(prep) => sentence
                        .children_of(verb.i)
                        .find(|t| t.dep == "prep" && t.text.eq_ignore_ascii_case(prep))
                        .and_then(|p| child_with_dep(sentence, p, "pobj")),
                };
                let Some(obj_token) = obj_token else { continue };

                let Some(subj_id) = anchors.entity_at(subj_token.start) else {
                    continue;
                };
                let Some(obj_id) = anchors.entity_at(obj_token.start) else {
                    continue;
                };
                let span_start = subj_token.start.min(verb.start);
                let span_end = obj_token.end.max(verb.end);
                trace!(pattern = %pattern.id, subj = subj_id, obj = obj_id, "dep pattern matched");
                relations.push(
                    RawRelation::new(subj_id, &pattern.predicate, obj_id, 0.75, Extractor::Dep)
                        .with_surfaces(&subj_token.text, &obj_token.text)
                        .with_evidence(Evidence::raw(
                            doc_id,
                            span_start,
                            span_end,
                            &text[span_start..span_end],
                            sentence.sentence_index,
                        )),
                );
            }
        }
    }
    relations
}

fn child_with_dep<'a>(sentence: &'a Sentence, head: &Token, dep: &str) -> Option<&'a Token> {
    sentence.children_of(head.i).find(|t| t.dep == dep)
}

/// Surface extraction: compiled regexes over the raw text.
pub fn extract_surface_relations(
    text: &str,
    anchors: &AnchorIndex,
    library: &PatternLibrary,
    doc_id: &str,
    sentence_bounds: &[(usize, usize)],
) -> Vec<RawRelation> {
    let mut relations = Vec::new();
    for pattern in &library.surface {
        for caps in pattern.regex.captures_iter(text) {
            let (Some(subj_m), Some(obj_m)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let Some(subj_id) = anchors.entity_by_name(subj_m.as_str()) else {
                continue;
            };
            let Some(obj_id) = anchors.entity_by_name(obj_m.as_str()) else {
                continue;
            };
            let Some(full) = caps.get(0) else { continue };
            relations.push(
                RawRelation::new(subj_id, &pattern.predicate, obj_id, 0.7, Extractor::Regex)
                    .with_surfaces(subj_m.as_str(), obj_m.as_str())
                    .with_evidence(Evidence::raw(
                        doc_id,
                        full.start(),
                        full.end(),
                        full.as_str(),
                        sentence_index_at(sentence_bounds, full.start()),
                    )),
            );
        }
    }
    relations
}

static PARENTAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][\w'-]+), (?:the )?(son|daughter) of ([A-Z][\w'-]+)").unwrap()
});
static MARRIAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][\w'-]+)(?:,[^,.]*,)? (?:married|wed) ([A-Z][\w'-]+)").unwrap()
});
static SIBLINGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][\w'-]+) and ([A-Z][\w'-]+) (?:were|are) (?:brothers|sisters|siblings)")
        .unwrap()
});

/// Fiction family heuristics: appositive parentage and marriage verbs.
///
/// Kinship is deliberately outside the pattern-library whitelist; these
/// shapes are stable enough in narrative prose to hard-code.
pub fn extract_family_relations(
    text: &str,
    anchors: &AnchorIndex,
    doc_id: &str,
    sentence_bounds: &[(usize, usize)],
) -> Vec<RawRelation> {
    let mut relations = Vec::new();

    for caps in PARENTAGE.captures_iter(text) {
        let (Some(child), Some(parent)) = (caps.get(1), caps.get(3)) else {
            continue;
        };
        let (Some(child_id), Some(parent_id)) = (
            anchors.entity_by_name(child.as_str()),
            anchors.entity_by_name(parent.as_str()),
        ) else {
            continue;
        };
        let Some(full) = caps.get(0) else { continue };
        relations.push(
            RawRelation::new(parent_id, "parent_of", child_id, 0.85, Extractor::FictionFamily)
                .with_surfaces(parent.as_str(), child.as_str())
                .with_evidence(Evidence::raw(
                    doc_id,
                    full.start(),
                    full.end(),
                    full.as_str(),
                    sentence_index_at(sentence_bounds, full.start()),
                )),
        );
    }

    for caps in MARRIAGE.captures_iter(text) {
        let (Some(a), Some(b)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let (Some(a_id), Some(b_id)) =
            (anchors.entity_by_name(a.as_str()), anchors.entity_by_name(b.as_str()))
        else {
            continue;
        };
        let Some(full) = caps.get(0) else { continue };
        relations.push(
            RawRelation::new(a_id, "married_to", b_id, 0.8, Extractor::FictionFamily)
                .with_surfaces(a.as_str(), b.as_str())
                .with_evidence(Evidence::raw(
                    doc_id,
                    full.start(),
                    full.end(),
                    full.as_str(),
                    sentence_index_at(sentence_bounds, full.start()),
                )),
        );
    }

    for caps in SIBLINGS.captures_iter(text) {
        let (Some(a), Some(b)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let (Some(a_id), Some(b_id)) =
            (anchors.entity_by_name(a.as_str()), anchors.entity_by_name(b.as_str()))
        else {
            continue;
        };
        let Some(full) = caps.get(0) else { continue };
        relations.push(
            RawRelation::new(a_id, "sibling_of", b_id, 0.8, Extractor::FictionFamily)
                .with_surfaces(a.as_str(), b.as_str())
                .with_evidence(Evidence::raw(
                    doc_id,
                    full.start(),
                    full.end(),
                    full.as_str(),
                    sentence_index_at(sentence_bounds, full.start()),
                )),
        );
    }

    relations
}

/// Verbs that pair with "there" to form a located action.
fn anaphoric_predicate(lemma: &str) -> Option<&'static str> {
    match lemma {
        "study" | "train" => Some("studies_at"),
        "live" | "dwell" | "settle" => Some("lives_in"),
        "stay" | "remain" | "lodge" => Some("resides_at"),
        "work" => Some("works_at"),
        "teach" => Some("teaches_at"),
        _ => None,
    }
}

/// Fiction action: "He studied magic there" - the place adverb resolves
/// to the most recently mentioned PLACE/ORG entity.
pub fn extract_place_anaphora(
    text: &str,
    sentences: &[Sentence],
    anchors: &AnchorIndex,
    doc_id: &str,
) -> Vec<RawRelation> {
    let mut relations = Vec::new();
    for sentence in sentences {
        let Some(there) = sentence
            .tokens
            .iter()
            .find(|t| t.text.eq_ignore_ascii_case("there") && t.pos == "ADV")
        else {
            continue;
        };
        for verb in sentence.tokens.iter().filter(|t| t.is_verb()) {
            let Some(predicate) = anaphoric_predicate(&verb.lemma) else {
                continue;
            };
            let Some(subj_token) = child_with_dep(sentence, verb, "nsubj") else {
                continue;
            };
            let Some(subj_id) = anchors.entity_at(subj_token.start) else {
                continue;
            };
            let Some(place_id) = anchors.latest_of_types_before(
                sentence.start,
                &[EntityType::Place, EntityType::Org],
            ) else {
                continue;
            };
            relations.push(
                RawRelation::new(subj_id, predicate, place_id, 0.65, Extractor::FictionAction)
                    .with_surfaces(&subj_token.text, "there")
                    .with_evidence(Evidence::raw(
                        doc_id,
                        subj_token.start,
                        there.end,
                        &text[subj_token.start..there.end],
                        sentence.sentence_index,
                    )),
            );
        }
    }
    relations
}

/// Dialogue relations: consecutive quotes by two different speakers put
/// them in conversation.
pub fn extract_dialogue_relations(
    quotes: &[AttributedQuote],
    doc_id: &str,
    text: &str,
    sentence_bounds: &[(usize, usize)],
) -> Vec<RawRelation> {
    let mut relations = Vec::new();
    for pair in quotes.windows(2) {
        let (Some(a), Some(b)) = (&pair[0].speaker, &pair[1].speaker) else {
            continue;
        };
        let (Some(a_id), Some(b_id)) = (&a.entity_id, &b.entity_id) else {
            continue;
        };
        if a_id == b_id {
            continue;
        }
        let span = pair[0].quote.full_span;
        relations.push(
            RawRelation::new(a_id, "said_to", b_id, 0.6, Extractor::FictionDialogue)
                .with_surfaces(&a.name, &b.name)
                .with_evidence(Evidence::raw(
                    doc_id,
                    span.start,
                    span.end,
                    &text[span.start..span.end],
                    sentence_index_at(sentence_bounds, span.start),
                )),
        );
    }
    relations
}

fn sentence_index_at(bounds: &[(usize, usize)], position: usize) -> usize {
    bounds
        .iter()
        .position(|(start, end)| position >= *start && position <= *end)
        .unwrap_or_else(|| bounds.len().saturating_sub(1))
}
