//! Per-predicate type guards.
//!
//! Each predicate declares which entity types may appear as its subject
//! and object. Emission refuses mismatches (the relation is dropped with a
//! structured violation, never an error). Guards are family-level defaults
//! with per-predicate overrides where a family is too broad.

use crate::entity::EntityType;
use crate::relation::{Predicate, PredicateFamily};

/// Allowed subject/object types for one predicate.
#[derive(Debug, Clone, Copy)]
pub struct TypeGuard {
    pub subj: &'static [EntityType],
    pub obj: &'static [EntityType],
}

impl TypeGuard {
    pub fn allows(&self, subj: EntityType, obj: EntityType) -> bool {
        self.subj.contains(&subj) && self.obj.contains(&obj)
    }
}

/// Agentive types: things that can act, speak, marry, own.
const AGENTS: &[EntityType] = &[
    EntityType::Person,
    EntityType::Creature,
    EntityType::Deity,
];

const AGENTS_AND_GROUPS: &[EntityType] = &[
    EntityType::Person,
    EntityType::Creature,
    EntityType::Deity,
    EntityType::Org,
    EntityType::House,
    EntityType::Tribe,
    EntityType::Race,
];

const PLACES: &[EntityType] = &[EntityType::Place, EntityType::Org];

const THINGS: &[EntityType] = &[
    EntityType::Item,
    EntityType::Artifact,
    EntityType::Work,
    EntityType::Spell,
    EntityType::Vehicle,
    EntityType::Material,
    EntityType::Food,
    EntityType::Currency,
];

const CREATABLE: &[EntityType] = &[
    EntityType::Work,
    EntityType::Item,
    EntityType::Artifact,
    EntityType::Org,
    EntityType::Place,
    EntityType::Spell,
    EntityType::Vehicle,
    EntityType::House,
];

const ABILITIES: &[EntityType] = &[
    EntityType::Ability,
    EntityType::Spell,
    EntityType::Language,
    EntityType::Item,
    EntityType::Artifact,
    EntityType::Work,
];

const EVENTISH: &[EntityType] = &[
    EntityType::Event,
    EntityType::Person,
    EntityType::Creature,
    EntityType::Org,
    EntityType::House,
    EntityType::Tribe,
    EntityType::Place,
    EntityType::Item,
    EntityType::Artifact,
    EntityType::Title,
];

const TIMES: &[EntityType] = &[EntityType::Date, EntityType::Time, EntityType::Event];

const ANY: &[EntityType] = EntityType::ALL;

/// Look up the guard for a predicate.
pub fn guard_for(pred: Predicate) -> TypeGuard {
    // Per-predicate overrides first.
    match pred {
        Predicate::CapitalOf => {
            return TypeGuard {
                subj: &[EntityType::Place],
                obj: &[
                    EntityType::Place,
                    EntityType::Org,
                    EntityType::House,
                    EntityType::Tribe,
                ],
            }
        }
        Predicate::StudiesAt | Predicate::TeachesAt | Predicate::GraduatedFrom => {
            return TypeGuard {
                subj: AGENTS,
                obj: PLACES,
            }
        }
        Predicate::Rules | Predicate::Governs => {
            return TypeGuard {
                subj: AGENTS_AND_GROUPS,
                obj: &[
                    EntityType::Place,
                    EntityType::Org,
                    EntityType::House,
                    EntityType::Tribe,
                ],
            }
        }
        Predicate::Wields | Predicate::Carries | Predicate::Wears => {
            return TypeGuard {
                subj: AGENTS,
                obj: THINGS,
            }
        }
        Predicate::Casts => {
            return TypeGuard {
                subj: AGENTS,
                obj: &[EntityType::Spell, EntityType::Ability],
            }
        }
        _ => {}
    }

    match pred.family() {
        PredicateFamily::Kinship => TypeGuard {
            subj: AGENTS,
            obj: AGENTS,
        },
        PredicateFamily::Employment => TypeGuard {
            subj: AGENTS_AND_GROUPS,
            obj: &[
                EntityType::Org,
                EntityType::House,
                EntityType::Tribe,
                EntityType::Place,
                EntityType::Person,
                EntityType::Event,
            ],
        },
        PredicateFamily::Location => TypeGuard {
            subj: ANY,
            obj: PLACES,
        },
        PredicateFamily::Creation => TypeGuard {
            subj: AGENTS_AND_GROUPS,
            obj: CREATABLE,
        },
        PredicateFamily::Ownership => TypeGuard {
            subj: AGENTS_AND_GROUPS,
            obj: &[
                EntityType::Item,
                EntityType::Artifact,
                EntityType::Work,
                EntityType::Place,
                EntityType::Creature,
                EntityType::Org,
                EntityType::Vehicle,
                EntityType::Material,
                EntityType::Currency,
            ],
        },
        PredicateFamily::Event => TypeGuard {
            subj: AGENTS_AND_GROUPS,
            obj: EVENTISH,
        },
        PredicateFamily::Communication => TypeGuard {
            subj: AGENTS,
            obj: AGENTS_AND_GROUPS,
        },
        PredicateFamily::Comparison => TypeGuard { subj: ANY, obj: ANY },
        PredicateFamily::Causation => TypeGuard { subj: ANY, obj: ANY },
        PredicateFamily::PartWhole => TypeGuard {
            subj: ANY,
            obj: &[
                EntityType::Org,
                EntityType::Place,
                EntityType::House,
                EntityType::Tribe,
                EntityType::Event,
                EntityType::Work,
                EntityType::Item,
                EntityType::Artifact,
                EntityType::Race,
                EntityType::Species,
            ],
        },
        PredicateFamily::Identity => TypeGuard { subj: ANY, obj: ANY },
        PredicateFamily::Ability => TypeGuard {
            subj: AGENTS,
            obj: ABILITIES,
        },
        PredicateFamily::Negation => TypeGuard {
            subj: AGENTS,
            obj: ANY,
        },
        PredicateFamily::Emotional => TypeGuard {
            subj: AGENTS,
            obj: ANY,
        },
        PredicateFamily::Temporal => TypeGuard {
            subj: &[
                EntityType::Event,
                EntityType::Person,
                EntityType::Org,
                EntityType::Work,
            ],
            obj: TIMES,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinship_requires_agents_on_both_sides() {
        let guard = guard_for(Predicate::MarriedTo);
        assert!(guard.allows(EntityType::Person, EntityType::Person));
        assert!(!guard.allows(EntityType::Person, EntityType::Place));
        assert!(!guard.allows(EntityType::Org, EntityType::Person));
    }

    #[test]
    fn leads_allows_person_over_org() {
        let guard = guard_for(Predicate::Leads);
        assert!(guard.allows(EntityType::Person, EntityType::Org));
        assert!(!guard.allows(EntityType::Person, EntityType::Item));
    }

    #[test]
    fn studies_at_allows_org_or_place_object() {
        let guard = guard_for(Predicate::StudiesAt);
        assert!(guard.allows(EntityType::Person, EntityType::Org));
        assert!(guard.allows(EntityType::Person, EntityType::Place));
        assert!(!guard.allows(EntityType::Person, EntityType::Person));
    }

    #[test]
    fn every_predicate_has_a_nonempty_guard() {
        for pred in Predicate::ALL {
            let guard = guard_for(*pred);
            assert!(!guard.subj.is_empty(), "{pred} has empty subject guard");
            assert!(!guard.obj.is_empty(), "{pred} has empty object guard");
        }
    }
}
