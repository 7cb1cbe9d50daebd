//! Pronoun and definite-description resolution over the salience stack.
//!
//! The algorithm refuses rather than guesses: unknown pronoun forms,
//! empty candidate sets, and salience ties all produce an
//! [`Resolution::Unresolved`] with a reason, which downstream consumers
//! treat as "no antecedent", not an error.

use prose_graph::Gender;
use prose_graph_lexicon::{pronoun_profile, role_noun_type, PronounKind, PronounRole};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::salience::{SalienceEntry, SalienceStack};

/// How a successful resolution was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionMethod {
    /// Only one gender/type-compatible candidate in the window.
    #[serde(rename = "gender-unique")]
    GenderUnique,
    /// Top candidate dominates on salience.
    #[serde(rename = "salience")]
    Salience,
    /// Sentence-initial pronoun matched against the previous sentence.
    #[serde(rename = "sentence-start")]
    SentenceStart,
    /// "the <role noun>" matched the most salient entity of the type.
    #[serde(rename = "definite-description")]
    DefiniteDescription,
}

/// Why a resolution was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    NoCandidates,
    TooFar,
    GenderMismatch,
    Ambiguous,
}

/// Outcome of a resolution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    Resolved {
        entity_id: String,
        name: String,
        method: ResolutionMethod,
        confidence: f64,
    },
    Unresolved {
        reason: UnresolvedReason,
    },
}

impl Resolution {
    pub fn unresolved(reason: UnresolvedReason) -> Self {
        Resolution::Unresolved { reason }
    }

    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { entity_id, .. } => Some(entity_id),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Resolver tunables.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Max character distance from pronoun to candidate's last mention.
    pub recency_window: usize,
    /// Top salience must exceed the runner-up by this factor.
    pub ambiguity_factor: f64,
    /// Dominance margin for definite descriptions (>10%).
    pub definite_dominance: f64,
    /// Confidence penalty for sentence-start matches across a paragraph.
    pub cross_paragraph_penalty: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            recency_window: 500,
            ambiguity_factor: 1.5,
            definite_dominance: 1.10,
            cross_paragraph_penalty: 0.1,
        }
    }
}

/// A mention of an entity in the previous sentence, for the
/// sentence-start variant.
#[derive(Debug, Clone)]
pub struct PriorMention {
    pub entity_id: String,
    pub name: String,
    pub gender: Gender,
    pub entity_type: prose_graph::EntityType,
    pub start: usize,
}

/// The salience-based reference resolver.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    config: ResolverConfig,
}

impl ReferenceResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a personal pronoun at `position`.
    pub fn resolve_pronoun(
        &self,
        stack: &SalienceStack,
        pronoun: &str,
        position: usize,
    ) -> Resolution {
        // Step 1: the pronoun map is closed.
        let profile = match pronoun_profile(pronoun) {
            Some(p) => p,
            None => return Resolution::unresolved(UnresolvedReason::NoCandidates),
        };

        // Steps 2-3: filter by recency, gender and allowed types.
        let allowed_types = profile.kind.allowed_types();
        let pronoun_gender = profile.kind.gender();

        let mut any_entry = false;
        let mut any_in_window = false;
        let mut candidates: Vec<&SalienceEntry> = Vec::new();
        for entry in stack.entries() {
            any_entry = true;
            let distance = position.saturating_sub(entry.last_mention_pos);
            if distance > self.config.recency_window {
                continue;
            }
            any_in_window = true;
            if !gender_admits(profile.kind, pronoun_gender, entry.gender) {
                continue;
            }
            if !allowed_types.contains(&entry.entity_type) {
                continue;
            }
            candidates.push(entry);
        }

        // Step 4: empty candidate sets name their reason.
        if candidates.is_empty() {
            let reason = if any_entry && !any_in_window {
                UnresolvedReason::TooFar
            } else if any_in_window {
                UnresolvedReason::GenderMismatch
            } else {
                UnresolvedReason::NoCandidates
            };
            debug!(pronoun, position, ?reason, "pronoun unresolved");
            return Resolution::unresolved(reason);
        }

        // Step 5: a unique compatible candidate is accepted outright.
        if candidates.len() == 1 {
            return Resolution::Resolved {
                entity_id: candidates[0].entity_id.clone(),
                name: candidates[0].name.clone(),
                method: ResolutionMethod::GenderUnique,
                confidence: 0.85,
            };
        }

        // Step 6: salience dominance, otherwise refuse. The stack is
        // already in deterministic order.
        let top = candidates[0];
        let second = candidates[1];
        if top.salience >= second.salience * self.config.ambiguity_factor {
            Resolution::Resolved {
                entity_id: top.entity_id.clone(),
                name: top.name.clone(),
                method: ResolutionMethod::Salience,
                confidence: 0.75,
            }
        } else {
            debug!(pronoun, position, "salience tie, refusing");
            Resolution::unresolved(UnresolvedReason::Ambiguous)
        }
    }

    /// Sentence-start variant: a pronoun opening its sentence prefers the
    /// first entity of the previous sentence (subject pronouns) or the
    /// last (possessives). Returns `None` on miss so the caller can fall
    /// back to the general algorithm.
    pub fn resolve_sentence_start(
        &self,
        pronoun: &str,
        previous_sentence: &[PriorMention],
        crosses_paragraph: bool,
    ) -> Option<Resolution> {
        let profile = pronoun_profile(pronoun)?;
        let candidate = match profile.role {
            PronounRole::Subject => previous_sentence.first(),
            PronounRole::Possessive => previous_sentence.last(),
            _ => None,
        }?;

        if !gender_admits(profile.kind, profile.kind.gender(), candidate.gender) {
            return None;
        }
        if !profile.kind.allowed_types().contains(&candidate.entity_type) {
            return None;
        }

        let mut confidence = 0.8;
        if crosses_paragraph {
            confidence -= self.config.cross_paragraph_penalty;
        }
        Some(Resolution::Resolved {
            entity_id: candidate.entity_id.clone(),
            name: candidate.name.clone(),
            method: ResolutionMethod::SentenceStart,
            confidence,
        })
    }

    /// Resolve "the <phrase>" against the role-noun whitelist.
    pub fn resolve_definite(
        &self,
        stack: &SalienceStack,
        phrase: &str,
        position: usize,
    ) -> Resolution {
        let target_type = match role_noun_type(phrase) {
            Some(ty) => ty,
            None => return Resolution::unresolved(UnresolvedReason::NoCandidates),
        };

        let candidates: Vec<&SalienceEntry> = stack
            .entries()
            .iter()
            .filter(|e| e.entity_type == target_type)
            .filter(|e| position.saturating_sub(e.last_mention_pos) <= self.config.recency_window)
            .collect();

        match candidates.as_slice() {
            [] => Resolution::unresolved(UnresolvedReason::NoCandidates),
            [only] => Resolution::Resolved {
                entity_id: only.entity_id.clone(),
                name: only.name.clone(),
                method: ResolutionMethod::DefiniteDescription,
                confidence: 0.7,
            },
            [top, second, ..] => {
                if top.salience > second.salience * self.config.definite_dominance {
                    Resolution::Resolved {
                        entity_id: top.entity_id.clone(),
                        name: top.name.clone(),
                        method: ResolutionMethod::DefiniteDescription,
                        confidence: 0.7,
                    }
                } else {
                    Resolution::unresolved(UnresolvedReason::Ambiguous)
                }
            }
        }
    }
}

/// Gender admission per the pronoun class: male/female pronouns exclude
/// the opposite known gender, plural accepts anything, neutral accepts
/// neutral and unknown.
fn gender_admits(kind: PronounKind, pronoun_gender: Gender, entry_gender: Gender) -> bool {
    match kind {
        PronounKind::Plural => true,
        PronounKind::Neutral => matches!(entry_gender, Gender::Neutral | Gender::Unknown),
        PronounKind::Male | PronounKind::Female => match entry_gender {
            Gender::Unknown => true,
            g => g == pronoun_gender,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salience::{GrammaticalRole, Number, SalienceConfig};
    use prose_graph::EntityType;

    fn stack_with(entries: &[(&str, &str, Gender, EntityType, usize, GrammaticalRole)]) -> SalienceStack {
        let mut stack = SalienceStack::new(SalienceConfig::default());
        for (id, name, gender, ty, pos, role) in entries {
            stack.register(id, name, *gender, Number::Singular, *ty, *pos, 0, *role);
        }
        stack
    }

    #[test]
    fn unknown_pronoun_refuses() {
        let stack = stack_with(&[]);
        let resolver = ReferenceResolver::default();
        assert_eq!(
            resolver.resolve_pronoun(&stack, "whoever", 10),
            Resolution::unresolved(UnresolvedReason::NoCandidates)
        );
    }

    #[test]
    fn gender_unique_candidate_resolves_at_085() {
        let stack = stack_with(&[
            (
                "person:hermione",
                "Hermione",
                Gender::Female,
                EntityType::Person,
                0,
                GrammaticalRole::Subject,
            ),
            (
                "person:harry",
                "Harry",
                Gender::Male,
                EntityType::Person,
                10,
                GrammaticalRole::Subject,
            ),
        ]);
        let resolver = ReferenceResolver::default();
        match resolver.resolve_pronoun(&stack, "she", 50) {
            Resolution::Resolved {
                entity_id,
                method,
                confidence,
                ..
            } => {
                assert_eq!(entity_id, "person:hermione");
                assert_eq!(method, ResolutionMethod::GenderUnique);
                assert_eq!(confidence, 0.85);
            }
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn salience_tie_is_ambiguous() {
        let stack = stack_with(&[
            (
                "person:merry",
                "Merry",
                Gender::Male,
                EntityType::Person,
                0,
                GrammaticalRole::Subject,
            ),
            (
                "person:pippin",
                "Pippin",
                Gender::Male,
                EntityType::Person,
                10,
                GrammaticalRole::Subject,
            ),
        ]);
        let resolver = ReferenceResolver::default();
        assert_eq!(
            resolver.resolve_pronoun(&stack, "he", 50),
            Resolution::unresolved(UnresolvedReason::Ambiguous)
        );
    }

    #[test]
    fn dominant_salience_resolves_at_075() {
        let mut stack = stack_with(&[(
            "person:pippin",
            "Pippin",
            Gender::Male,
            EntityType::Person,
            10,
            GrammaticalRole::Other,
        )]);
        // Merry mentioned twice as subject: salience 6.0 vs 1.0
        for pos in [20, 40] {
            stack.register(
                "person:merry",
                "Merry",
                Gender::Male,
                Number::Singular,
                EntityType::Person,
                pos,
                0,
                GrammaticalRole::Subject,
            );
        }
        let resolver = ReferenceResolver::default();
        match resolver.resolve_pronoun(&stack, "he", 60) {
            Resolution::Resolved {
                entity_id,
                method,
                confidence,
                ..
            } => {
                assert_eq!(entity_id, "person:merry");
                assert_eq!(method, ResolutionMethod::Salience);
                assert_eq!(confidence, 0.75);
            }
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn recency_window_excludes_distant_mentions() {
        let stack = stack_with(&[(
            "person:harry",
            "Harry",
            Gender::Male,
            EntityType::Person,
            0,
            GrammaticalRole::Subject,
        )]);
        let resolver = ReferenceResolver::default();
        assert_eq!(
            resolver.resolve_pronoun(&stack, "he", 1000),
            Resolution::unresolved(UnresolvedReason::TooFar)
        );
    }

    #[test]
    fn neutral_pronoun_never_returns_a_person() {
        let stack = stack_with(&[
            (
                "person:harry",
                "Harry",
                Gender::Male,
                EntityType::Person,
                0,
                GrammaticalRole::Subject,
            ),
            (
                "org:hogwarts",
                "Hogwarts",
                Gender::Neutral,
                EntityType::Org,
                10,
                GrammaticalRole::Other,
            ),
        ]);
        let resolver = ReferenceResolver::default();
        match resolver.resolve_pronoun(&stack, "it", 50) {
            Resolution::Resolved { entity_id, .. } => assert_eq!(entity_id, "org:hogwarts"),
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn gender_mismatch_reason_when_window_has_entries() {
        let stack = stack_with(&[(
            "person:harry",
            "Harry",
            Gender::Male,
            EntityType::Person,
            0,
            GrammaticalRole::Subject,
        )]);
        let resolver = ReferenceResolver::default();
        assert_eq!(
            resolver.resolve_pronoun(&stack, "she", 50),
            Resolution::unresolved(UnresolvedReason::GenderMismatch)
        );
    }

    #[test]
    fn sentence_start_prefers_first_for_subject_last_for_possessive() {
        let resolver = ReferenceResolver::default();
        let previous = vec![
            PriorMention {
                entity_id: "person:harry".to_string(),
                name: "Harry".to_string(),
                gender: Gender::Male,
                entity_type: EntityType::Person,
                start: 0,
            },
            PriorMention {
                entity_id: "person:ron".to_string(),
                name: "Ron".to_string(),
                gender: Gender::Male,
                entity_type: EntityType::Person,
                start: 20,
            },
        ];
        let subj = resolver.resolve_sentence_start("he", &previous, false).unwrap();
        assert_eq!(subj.entity_id(), Some("person:harry"));
        let poss = resolver.resolve_sentence_start("his", &previous, false).unwrap();
        assert_eq!(poss.entity_id(), Some("person:ron"));
    }

    #[test]
    fn cross_paragraph_penalty_applies() {
        let resolver = ReferenceResolver::default();
        let previous = vec![PriorMention {
            entity_id: "person:harry".to_string(),
            name: "Harry".to_string(),
            gender: Gender::Male,
            entity_type: EntityType::Person,
            start: 0,
        }];
        match resolver.resolve_sentence_start("he", &previous, true).unwrap() {
            Resolution::Resolved { confidence, .. } => {
                assert!((confidence - 0.7).abs() < 1e-9);
            }
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[test]
    fn definite_description_requires_dominance() {
        let mut stack = stack_with(&[(
            "org:hogwarts",
            "Hogwarts",
            Gender::Neutral,
            EntityType::Org,
            0,
            GrammaticalRole::Subject,
        )]);
        let resolver = ReferenceResolver::default();
        match resolver.resolve_definite(&stack, "school", 50) {
            Resolution::Resolved { entity_id, method, .. } => {
                assert_eq!(entity_id, "org:hogwarts");
                assert_eq!(method, ResolutionMethod::DefiniteDescription);
            }
            other => panic!("expected resolution, got {other:?}"),
        }
        // add a rival of equal salience: refusal
        stack.register(
            "org:beauxbatons",
            "Beauxbatons",
            Gender::Neutral,
            Number::Plural,
            EntityType::Org,
            10,
            0,
            GrammaticalRole::Subject,
        );
        assert_eq!(
            resolver.resolve_definite(&stack, "school", 50),
            Resolution::unresolved(UnresolvedReason::Ambiguous)
        );
        assert_eq!(
            resolver.resolve_definite(&stack, "breeze", 50),
            Resolution::unresolved(UnresolvedReason::NoCandidates)
        );
    }
}
