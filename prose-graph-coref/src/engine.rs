//! Document-order coreference pass.
//!
//! Sentences are processed in document order, tokens in ascending start
//! position. Within one sentence, entity mentions register on the
//! salience stack strictly before pronouns resolve, so a pronoun can
//! reach a cataphoric mention in its own sentence. The stack decays at
//! every sentence boundary and more heavily at paragraph boundaries
//! (blank line between sentences).

use prose_graph::{EntitySpan, Sentence};
use prose_graph_lexicon::{pronoun_profile, role_noun_type};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::EntityDirectory;
use crate::resolver::{
    PriorMention, ReferenceResolver, Resolution, ResolutionMethod, UnresolvedReason,
};
use crate::salience::{GrammaticalRole, SalienceConfig, SalienceStack};

/// A resolved reference: pronoun or definite description -> entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorefLink {
    pub surface: String,
    pub start: usize,
    pub end: usize,
    pub sentence_index: usize,
    pub entity_id: String,
    pub method: ResolutionMethod,
    pub confidence: f64,
}

/// A refused reference, kept for the statistics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorefRefusal {
    pub surface: String,
    pub start: usize,
    pub sentence_index: usize,
    pub reason: UnresolvedReason,
}

/// Everything the coref pass produced, plus the final stack so the quote
/// attributor can continue from the same state.
#[derive(Debug)]
pub struct CorefOutcome {
    pub links: Vec<CorefLink>,
    pub refusals: Vec<CorefRefusal>,
    pub stack: SalienceStack,
}

/// The coreference engine: salience bookkeeping plus resolution.
#[derive(Debug, Default)]
pub struct CorefEngine {
    resolver: ReferenceResolver,
    salience_config: SalienceConfig,
}

impl CorefEngine {
    pub fn new(resolver: ReferenceResolver, salience_config: SalienceConfig) -> Self {
        Self {
            resolver,
            salience_config,
        }
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Run the pass over a parsed document.
    pub fn run(
        &self,
        text: &str,
        sentences: &[Sentence],
        entity_spans: &[EntitySpan],
        directory: &EntityDirectory,
    ) -> CorefOutcome {
        let mut stack = SalienceStack::new(self.salience_config.clone());
        let mut links = Vec::new();
        let mut refusals = Vec::new();
        let mut previous_mentions: Vec<PriorMention> = Vec::new();
        let mut previous_end: Option<usize> = None;

        for sentence in sentences {
            let crosses_paragraph = match previous_end {
                Some(end) if end <= sentence.start => {
                    paragraph_gap(&text[end..sentence.start])
                }
                _ => false,
            };
            if previous_end.is_some() {
                if crosses_paragraph {
                    stack.paragraph_boundary();
                } else {
                    stack.sentence_boundary();
                }
            }

            // 1) register this sentence's entity mentions, in start order
            let mut sentence_mentions: Vec<&EntitySpan> = entity_spans
                .iter()
                .filter(|s| s.sentence_index == sentence.sentence_index)
                .collect();
            sentence_mentions.sort_by_key(|s| s.start);

            let mut current_mentions = Vec::new();
            for span in &sentence_mentions {
                let Some(entry) = directory.get(&span.entity_id) else {
                    continue;
                };
                let role = mention_role(sentence, span);
                stack.register(
                    &span.entity_id,
                    &entry.canonical,
                    entry.gender,
                    entry.number,
                    entry.entity_type,
                    span.start,
                    sentence.sentence_index,
                    role,
                );
                current_mentions.push(PriorMention {
                    entity_id: span.entity_id.clone(),
                    name: entry.canonical.clone(),
                    gender: entry.gender,
                    entity_type: entry.entity_type,
                    start: span.start,
                });
            }

            // 2) resolve pronouns and definite descriptions, in start order
            for (t_idx, token) in sentence.tokens.iter().enumerate() {
                if pronoun_profile(&token.text).is_some() {
                    let resolution = self.resolve_token(
                        &stack,
                        sentence,
                        t_idx,
                        &previous_mentions,
                        crosses_paragraph,
                    );
                    self.record(
                        resolution,
                        &token.text,
                        token.start,
                        token.end,
                        sentence.sentence_index,
                        directory,
                        &mut stack,
                        &mut links,
                        &mut refusals,
                        mention_role_of_token(&token.dep),
                    );
                } else if token.text.eq_ignore_ascii_case("the") {
                    // definite description: "the <role noun>"
                    let Some(noun) = sentence.tokens.get(t_idx + 1) else {
                        continue;
                    };
                    if noun.pos != "NOUN" || role_noun_type(&noun.text).is_none() {
                        continue;
                    }
                    let resolution =
                        self.resolver
                            .resolve_definite(&stack, &noun.text, noun.start);
                    let surface = format!("the {}", noun.text);
                    self.record(
                        resolution,
                        &surface,
                        token.start,
                        noun.end,
                        sentence.sentence_index,
                        directory,
                        &mut stack,
                        &mut links,
                        &mut refusals,
                        mention_role_of_token(&noun.dep),
                    );
                }
            }

            previous_mentions = current_mentions;
            previous_end = Some(sentence.end);
        }

        CorefOutcome {
            links,
            refusals,
            stack,
        }
    }

    fn resolve_token(
        &self,
        stack: &SalienceStack,
        sentence: &Sentence,
        token_index: usize,
        previous_mentions: &[PriorMention],
        crosses_paragraph: bool,
    ) -> Resolution {
        let token = &sentence.tokens[token_index];
        if token_index == 0 && !previous_mentions.is_empty() {
            if let Some(resolution) = self.resolver.resolve_sentence_start(
                &token.text,
                previous_mentions,
                crosses_paragraph,
            ) {
                return resolution;
            }
        }
        self.resolver.resolve_pronoun(stack, &token.text, token.start)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        resolution: Resolution,
        surface: &str,
        start: usize,
        end: usize,
        sentence_index: usize,
        directory: &EntityDirectory,
        stack: &mut SalienceStack,
        links: &mut Vec<CorefLink>,
        refusals: &mut Vec<CorefRefusal>,
        role: GrammaticalRole,
    ) {
        match resolution {
            Resolution::Resolved {
                entity_id,
                method,
                confidence,
                ..
            } => {
                // a resolved reference is itself a mention
                if let Some(entry) = directory.get(&entity_id) {
                    stack.register(
                        &entity_id,
                        &entry.canonical,
                        entry.gender,
                        entry.number,
                        entry.entity_type,
                        start,
                        sentence_index,
                        role,
                    );
                }
                links.push(CorefLink {
                    surface: surface.to_string(),
                    start,
                    end,
                    sentence_index,
                    entity_id,
                    method,
                    confidence,
                });
            }
            Resolution::Unresolved { reason } => {
                debug!(surface, start, ?reason, "reference refused");
                refusals.push(CorefRefusal {
                    surface: surface.to_string(),
                    start,
                    sentence_index,
                    reason,
                });
            }
        }
    }
}

/// Paragraph boundary: a blank line between sentences.
fn paragraph_gap(gap: &str) -> bool {
    gap.matches('\n').count() >= 2
}

/// Grammatical role of an entity mention, from its tokens' dependency
/// labels.
fn mention_role(sentence: &Sentence, span: &EntitySpan) -> GrammaticalRole {
    for token in &sentence.tokens {
        if token.start >= span.start && token.end <= span.end {
            match token.dep.as_str() {
                "nsubj" | "nsubjpass" => return GrammaticalRole::Subject,
                "dobj" | "obj" | "iobj" => return GrammaticalRole::Object,
                _ => {}
            }
        }
    }
    GrammaticalRole::Other
}

fn mention_role_of_token(dep: &str) -> GrammaticalRole {
    match dep {
        "nsubj" | "nsubjpass" => GrammaticalRole::Subject,
        "dobj" | "obj" | "iobj" => GrammaticalRole::Object,
        _ => GrammaticalRole::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prose_graph::{Entity, EntityType, Gender, Token};

    fn token(i: usize, text: &str, pos: &str, dep: &str, head: usize, start: usize) -> Token {
        Token {
            i,
            text: text.to_string(),
            lemma: text.to_lowercase(),
            pos: pos.to_string(),
            tag: String::new(),
            dep: dep.to_string(),
            head,
            ent: "O".to_string(),
            start,
            end: start + text.len(),
        }
    }

    /// "Harry went to Hogwarts. He studied magic there."
    fn fixture() -> (String, Vec<Sentence>, Vec<EntitySpan>, EntityDirectory) {
        let text = "Harry went to Hogwarts. He studied magic there.".to_string();
        let s0 = Sentence {
            sentence_index: 0,
            start: 0,
            end: 23,
            tokens: vec![
                token(0, "Harry", "PROPN", "nsubj", 1, 0),
                token(1, "went", "VERB", "ROOT", 1, 6),
                token(2, "to", "ADP", "prep", 1, 11),
                token(3, "Hogwarts", "PROPN", "pobj", 2, 14),
                token(4, ".", "PUNCT", "punct", 1, 22),
            ],
        };
        let s1 = Sentence {
            sentence_index: 1,
            start: 24,
            end: 47,
            tokens: vec![
                token(0, "He", "PRON", "nsubj", 1, 24),
                token(1, "studied", "VERB", "ROOT", 1, 27),
                token(2, "magic", "NOUN", "dobj", 1, 35),
                token(3, "there", "ADV", "advmod", 1, 41),
                token(4, ".", "PUNCT", "punct", 1, 46),
            ],
        };
        let mut harry = Entity::new(EntityType::Person, "Harry", 0.9, 0);
        harry.gender = Gender::Male;
        let hogwarts = Entity::new(EntityType::Org, "Hogwarts", 0.6, 0);
        let directory = EntityDirectory::from_entities([harry, hogwarts].iter());
        let spans = vec![
            EntitySpan {
                entity_id: "person:harry".to_string(),
                start: 0,
                end: 5,
                surface: "Harry".to_string(),
                sentence_index: 0,
            },
            EntitySpan {
                entity_id: "org:hogwarts".to_string(),
                start: 14,
                end: 22,
                surface: "Hogwarts".to_string(),
                sentence_index: 0,
            },
        ];
        (text, vec![s0, s1], spans, directory)
    }

    #[test]
    fn sentence_start_pronoun_resolves_to_previous_subject() {
        let (text, sentences, spans, directory) = fixture();
        let engine = CorefEngine::default();
        let outcome = engine.run(&text, &sentences, &spans, &directory);
        assert_eq!(outcome.links.len(), 1);
        let link = &outcome.links[0];
        assert_eq!(link.surface, "He");
        assert_eq!(link.entity_id, "person:harry");
        assert_eq!(link.method, ResolutionMethod::SentenceStart);
        assert!(outcome.refusals.is_empty());
    }

    #[test]
    fn sentence_start_variant_beats_salience_ambiguity() {
        let text = "Merry sang. Pippin danced. He laughed.".to_string();
        let s0 = Sentence {
            sentence_index: 0,
            start: 0,
            end: 11,
            tokens: vec![
                token(0, "Merry", "PROPN", "nsubj", 1, 0),
                token(1, "sang", "VERB", "ROOT", 1, 6),
            ],
        };
        let s1 = Sentence {
            sentence_index: 1,
            start: 12,
            end: 26,
            tokens: vec![
                token(0, "Pippin", "PROPN", "nsubj", 1, 12),
                token(1, "danced", "VERB", "ROOT", 1, 19),
            ],
        };
        let s2 = Sentence {
            sentence_index: 2,
            start: 27,
            end: 38,
            tokens: vec![
                token(0, "He", "PRON", "nsubj", 1, 27),
                token(1, "laughed", "VERB", "ROOT", 1, 30),
            ],
        };
        let mut merry = Entity::new(EntityType::Person, "Merry", 0.9, 0);
        merry.gender = Gender::Male;
        let mut pippin = Entity::new(EntityType::Person, "Pippin", 0.9, 0);
        pippin.gender = Gender::Male;
        let directory = EntityDirectory::from_entities([merry, pippin].iter());
        let spans = vec![
            EntitySpan {
                entity_id: "person:merry".to_string(),
                start: 0,
                end: 5,
                surface: "Merry".to_string(),
                sentence_index: 0,
            },
            EntitySpan {
                entity_id: "person:pippin".to_string(),
                start: 12,
                end: 18,
                surface: "Pippin".to_string(),
                sentence_index: 1,
            },
        ];
        let engine = CorefEngine::default();
        let outcome = engine.run(&text, &[s0, s1, s2], &spans, &directory);
        // sentence-start fallback hits Pippin (subject of previous
        // sentence); the link records the sentence-start method
        assert_eq!(outcome.links.len(), 1);
        assert_eq!(outcome.links[0].entity_id, "person:pippin");
        assert_eq!(outcome.links[0].method, ResolutionMethod::SentenceStart);
    }

    #[test]
    fn runs_are_deterministic() {
        let (text, sentences, spans, directory) = fixture();
        let engine = CorefEngine::default();
        let a = engine.run(&text, &sentences, &spans, &directory);
        let b = engine.run(&text, &sentences, &spans, &directory);
        assert_eq!(a.links, b.links);
        assert_eq!(a.refusals, b.refusals);
    }
}
