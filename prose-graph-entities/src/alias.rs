//! Alias merging inside the accumulator output.
//!
//! Two surface forms merge iff they share an entity type and either one is
//! a substring of the other or their edit distance is at most 1. The
//! longer surface becomes canonical, signal scores take the component-wise
//! max, and mention lists concatenate.

use prose_graph::normalize_name;

use crate::accumulator::EntityCandidate;

/// Bounded edit-distance check: true when `a` and `b` are within one
/// insertion, deletion or substitution of each other.
pub fn within_edit_distance_one(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    match long.len() - short.len() {
        0 => {
            let mismatches = short.iter().zip(long.iter()).filter(|(x, y)| x != y).count();
            mismatches <= 1
        }
        1 => {
            // one insertion in the longer string
            let mut s = 0;
            let mut l = 0;
            let mut skipped = false;
            while s < short.len() && l < long.len() {
                if short[s] == long[l] {
                    s += 1;
                    l += 1;
                } else if skipped {
                    return false;
                } else {
                    skipped = true;
                    l += 1;
                }
            }
            true
        }
        _ => false,
    }
}

fn should_merge(a: &EntityCandidate, b: &EntityCandidate) -> bool {
    if a.entity_type != b.entity_type {
        return false;
    }
    let na = normalize_name(&a.surface);
    let nb = normalize_name(&b.surface);
    if na == nb {
        return true;
    }
    // substring merging is for multi-word variants ("Aragorn" inside
    // "Aragorn son of Arathorn"), not single characters
    let substring = (na.len() >= 3 && nb.contains(&na)) || (nb.len() >= 3 && na.contains(&nb));
    substring || within_edit_distance_one(&na, &nb)
}

/// Merge compatible candidates; the survivor keeps the longer surface.
///
/// Traversal order is deterministic (candidates arrive sorted by
/// normalized form); the first seen of a merge group is the
/// representative slot, even when a later surface becomes canonical.
pub fn merge_candidates(candidates: Vec<EntityCandidate>) -> Vec<EntityCandidate> {
    let mut merged: Vec<EntityCandidate> = Vec::new();
    for candidate in candidates {
        let target = merged.iter_mut().find(|m| should_merge(m, &candidate));
        match target {
            Some(existing) => absorb(existing, candidate),
            None => merged.push(candidate),
        }
    }
    merged
}

fn absorb(keep: &mut EntityCandidate, other: EntityCandidate) {
    if other.surface.len() > keep.surface.len() {
        keep.merged_surfaces.push(std::mem::replace(
            &mut keep.surface,
            other.surface.clone(),
        ));
        keep.normalized = normalize_name(&keep.surface);
    } else if normalize_name(&other.surface) != keep.normalized {
        keep.merged_surfaces.push(other.surface.clone());
    }

    keep.signals.ner = keep.signals.ner.max(other.signals.ner);
    keep.signals.syntax = keep.signals.syntax.max(other.signals.syntax);
    keep.signals.role = keep.signals.role.max(other.signals.role);
    keep.signals.coref = keep.signals.coref.max(other.signals.coref);
    keep.signals.vocative = keep.signals.vocative.max(other.signals.vocative);

    keep.mention_count += other.mention_count;
    keep.mentions.extend(other.mentions);
    keep.mentions.sort_by_key(|m| m.start);
    for (label, votes) in other.ner_votes {
        *keep.ner_votes.entry(label).or_insert(0) += votes;
    }
    if keep.gender == prose_graph::Gender::Unknown {
        keep.gender = other.gender;
    }
    keep.sentence_initial_only &= other.sentence_initial_only;
    keep.seen_with_determiner |= other.seen_with_determiner;
}
