//! Quote detection and rule-based speaker attribution.
//!
//! Detection recognizes three styles (ASCII double, typographic smart,
//! long single-quoted spans); matches never overlap, first pattern wins.
//! Attribution probes a window around each quote with three ordered
//! rules, resolves pronoun speakers through the salience stack, and runs
//! a turn-taking fixup as a second straight traversal.

use once_cell::sync::Lazy;
use prose_graph::{
    AttributedQuote, AttributionMethod, EntitySpan, QuoteMatch, QuoteStyle, SpeakerCandidate,
    TextSpan,
};
use prose_graph_lexicon::{is_pronoun, is_speech_verb};
use regex::Regex;
use tracing::debug;

use crate::directory::EntityDirectory;
use crate::engine::CorefLink;
use crate::resolver::{ReferenceResolver, Resolution};
use crate::salience::{GrammaticalRole, SalienceStack};

/// How far before and after a quote the attribution rules look.
const PROBE_WINDOW: usize = 100;
/// Minimum inner length for single-quoted spans (filters apostrophes).
const SINGLE_QUOTE_MIN_INNER: usize = 10;

/// Detect quotes of all three styles, sorted by start offset.
pub fn detect_quotes(text: &str) -> Vec<QuoteMatch> {
    let mut quotes: Vec<QuoteMatch> = Vec::new();

    // Pattern order decides collisions: double, then smart, then single.
    scan_delimited(text, '"', '"', QuoteStyle::Double, &mut quotes);
    scan_delimited(text, '\u{201C}', '\u{201D}', QuoteStyle::Smart, &mut quotes);
    scan_single(text, &mut quotes);

    quotes.sort_by_key(|q| q.full_span.start);
    quotes
}

fn overlaps_any(quotes: &[QuoteMatch], span: &TextSpan) -> bool {
    quotes.iter().any(|q| q.full_span.overlaps(span))
}

fn scan_delimited(
    text: &str,
    open: char,
    close: char,
    style: QuoteStyle,
    out: &mut Vec<QuoteMatch>,
) {
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch != open {
            continue;
        }
        // find the closing mark, honoring backslash escapes
        let mut prev_was_escape = false;
        let mut closing = None;
        for (j, cj) in text[idx + open.len_utf8()..].char_indices() {
            let j = idx + open.len_utf8() + j;
            if cj == '\\' && !prev_was_escape {
                prev_was_escape = true;
                continue;
            }
            if cj == close && !prev_was_escape {
                closing = Some(j);
                break;
            }
            prev_was_escape = false;
        }
        let Some(close_idx) = closing else { continue };
        let full = TextSpan::new(idx, close_idx + close.len_utf8());
        let inner_start = idx + open.len_utf8();
        if !overlaps_any(out, &full) {
            out.push(QuoteMatch {
                full_span: full,
                inner_text: text[inner_start..close_idx].to_string(),
                start: inner_start,
                end: close_idx,
                style,
            });
        }
        // resume after the closing mark
        while let Some((k, _)) = chars.peek() {
            if *k < close_idx + close.len_utf8() {
                chars.next();
            } else {
                break;
            }
        }
    }
}

fn scan_single(text: &str, out: &mut Vec<QuoteMatch>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\'' {
            i += 1;
            continue;
        }
        // an opening single quote is not glued to a word ("Frodo's")
        let preceded_by_word = i > 0 && text[..i].chars().last().map(|c| c.is_alphanumeric()).unwrap_or(false);
        if preceded_by_word {
            i += 1;
            continue;
        }
        // find a closing quote not followed by a letter
        let mut close = None;
        let mut j = i + 1;
        while j < bytes.len() {
            if bytes[j] == b'\''
                && text[j + 1..].chars().next().map(|c| !c.is_alphanumeric()).unwrap_or(true)
            {
                close = Some(j);
                break;
            }
            j += 1;
        }
        let Some(close_idx) = close else {
            i += 1;
            continue;
        };
        let inner = &text[i + 1..close_idx];
        let full = TextSpan::new(i, close_idx + 1);
        if inner.chars().count() >= SINGLE_QUOTE_MIN_INNER && !overlaps_any(out, &full) {
            out.push(QuoteMatch {
                full_span: full,
                inner_text: inner.to_string(),
                start: i + 1,
                end: close_idx,
                style: QuoteStyle::Single,
            });
        }
        i = close_idx + 1;
    }
}

static TRAILING_NAME_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s,]*([A-Za-z][A-Za-z'’.-]*(?:\s+[A-Z][A-Za-z'’.-]*)*)\s+([a-z]+)").unwrap()
});
static TRAILING_VERB_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s,]*([a-z]+)\s+([A-Z][A-Za-z'’.-]*(?:\s+[A-Z][A-Za-z'’.-]*)*)").unwrap()
});
static LEADING_NAME_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z'’.-]*(?:\s+[A-Z][A-Za-z'’.-]*)*)\s+([a-z]+)[\s,:]*$").unwrap()
});

/// Result of the attribution pass, with per-method counters for stats.
#[derive(Debug, Default)]
pub struct AttributionOutcome {
    pub quotes: Vec<AttributedQuote>,
    pub pattern_hits: usize,
    pub pronoun_hits: usize,
    pub turn_taking_hits: usize,
    pub unattributed: usize,
}

/// Assign speakers to detected quotes.
///
/// The salience stack is shared with the main coref pass: resolved
/// speakers are registered as subject-role mentions at the quote end, and
/// the stack decays by 0.9 between quotes.
#[allow(clippy::too_many_arguments)]
pub fn attribute_quotes(
    text: &str,
    quotes: &[QuoteMatch],
    entity_spans: &[EntitySpan],
    links: &[CorefLink],
    directory: &EntityDirectory,
    resolver: &ReferenceResolver,
    stack: &mut SalienceStack,
    sentence_bounds: &[(usize, usize)],
) -> AttributionOutcome {
    let mut outcome = AttributionOutcome::default();

    // First pass: adjacency rules per quote.
    for quote in quotes {
        let speaker = attribute_one(text, quote, entity_spans, links, directory, resolver, stack);
        if let Some(candidate) = &speaker {
            match candidate.method {
                AttributionMethod::Pattern | AttributionMethod::Adjacent => {
                    outcome.pattern_hits += 1
                }
                AttributionMethod::Pronoun => outcome.pronoun_hits += 1,
                AttributionMethod::TurnTaking => {}
            }
            if let Some(entity_id) = &candidate.entity_id {
                if let Some(entry) = directory.get(entity_id) {
                    let sentence_index = sentence_index_at(sentence_bounds, quote.full_span.end);
                    stack.register(
                        entity_id,
                        &entry.canonical,
                        entry.gender,
                        entry.number,
                        entry.entity_type,
                        quote.full_span.end,
                        sentence_index,
                        GrammaticalRole::Subject,
                    );
                }
            }
        }
        stack.scale(0.9);
        outcome.quotes.push(AttributedQuote {
            quote: quote.clone(),
            speaker,
        });
    }

    // Second pass: turn-taking. Two alternating speakers fill gaps.
    turn_taking_pass(&mut outcome);

    outcome.unattributed = outcome
        .quotes
        .iter()
        .filter(|q| q.speaker.is_none())
        .count();
    outcome
}

#[allow(clippy::too_many_arguments)]
fn attribute_one(
    text: &str,
    quote: &QuoteMatch,
    entity_spans: &[EntitySpan],
    links: &[CorefLink],
    directory: &EntityDirectory,
    resolver: &ReferenceResolver,
    stack: &SalienceStack,
) -> Option<SpeakerCandidate> {
    let after_from = quote.full_span.end;
    let after = window_after(text, after_from);
    let before_start = window_before_start(text, quote.full_span.start);
    let before = &text[before_start..quote.full_span.start];

    // Rule 1: `"..." <name|pronoun> <speech verb>`
    if let Some(caps) = TRAILING_NAME_VERB.captures(after) {
        let (name, verb) = (&caps[1], &caps[2]);
        if is_speech_verb(verb) {
            if is_pronoun(name) {
                let offset = after_from + caps.get(1).map(|m| m.start()).unwrap_or(0);
                return resolve_pronoun_speaker(
                    name, offset, quote, links, entity_spans, resolver, stack,
                );
            }
            if let Some(candidate) = match_speaker_name(name, quote, entity_spans, directory) {
                return Some(candidate);
            }
        }
    }

    // Rule 2: `"..." <speech verb> <Name>`
    if let Some(caps) = TRAILING_VERB_NAME.captures(after) {
        let (verb, name) = (&caps[1], &caps[2]);
        if is_speech_verb(verb) && !is_pronoun(name) {
            if let Some(candidate) = match_speaker_name(name, quote, entity_spans, directory) {
                return Some(candidate);
            }
        }
    }

    // Rule 3: `<Name> <speech verb>, "..."`
    if let Some(caps) = LEADING_NAME_VERB.captures(before) {
        let (name, verb) = (&caps[1], &caps[2]);
        if is_speech_verb(verb) {
            if is_pronoun(name) {
                let offset = before_start + caps.get(1).map(|m| m.start()).unwrap_or(0);
                return resolve_pronoun_speaker(
                    name, offset, quote, links, entity_spans, resolver, stack,
                );
            }
            if let Some(candidate) = match_speaker_name(name, quote, entity_spans, directory) {
                return Some(candidate);
            }
        }
    }

    None
}

/// Resolve a pronoun speaker.
///
/// A coreference link already covering the pronoun is reused verbatim.
/// Otherwise the salience stack is consulted at the quote-start
/// position, and the answer only stands if that entity was actually
/// mentioned before the quote - the shared stack reflects the whole
/// document, and a speaker must not be borrowed from later text.
#[allow(clippy::too_many_arguments)]
fn resolve_pronoun_speaker(
    pronoun: &str,
    pronoun_offset: usize,
    quote: &QuoteMatch,
    links: &[CorefLink],
    entity_spans: &[EntitySpan],
    resolver: &ReferenceResolver,
    stack: &SalienceStack,
) -> Option<SpeakerCandidate> {
    let speaker = |entity_id: String, name: String| SpeakerCandidate {
        entity_id: Some(entity_id),
        name,
        start: quote.full_span.start,
        end: quote.full_span.end,
        method: AttributionMethod::Pronoun,
        confidence: 0.7,
    };

    if let Some(link) = links
        .iter()
        .find(|l| l.start <= pronoun_offset && pronoun_offset < l.end)
    {
        return Some(speaker(link.entity_id.clone(), link.surface.clone()));
    }

    match resolver.resolve_pronoun(stack, pronoun, quote.full_span.start) {
        Resolution::Resolved {
            entity_id, name, ..
        } => {
            let mentioned_before = entity_spans
                .iter()
                .any(|s| s.entity_id == entity_id && s.start < quote.full_span.start)
                || links
                    .iter()
                    .any(|l| l.entity_id == entity_id && l.start < quote.full_span.start);
            if mentioned_before {
                Some(speaker(entity_id, name))
            } else {
                debug!(pronoun, "stack candidate only mentioned after the quote");
                None
            }
        }
        Resolution::Unresolved { reason } => {
            debug!(pronoun, ?reason, "pronoun speaker unresolved");
            None
        }
    }
}

fn match_speaker_name(
    name: &str,
    quote: &QuoteMatch,
    entity_spans: &[EntitySpan],
    directory: &EntityDirectory,
) -> Option<SpeakerCandidate> {
    // exact or part match against the known entities
    if let Some((entity_id, _)) = directory.match_name(name) {
        return Some(SpeakerCandidate {
            entity_id: Some(entity_id.clone()),
            name: name.to_string(),
            start: quote.full_span.start,
            end: quote.full_span.end,
            method: AttributionMethod::Pattern,
            confidence: 0.9,
        });
    }
    // fall back to a surface match on nearby entity spans
    let nearby = entity_spans.iter().find(|span| {
        span.surface.eq_ignore_ascii_case(name)
            && span.start.abs_diff(quote.full_span.start) <= PROBE_WINDOW * 2
    });
    nearby.map(|span| SpeakerCandidate {
        entity_id: Some(span.entity_id.clone()),
        name: name.to_string(),
        start: quote.full_span.start,
        end: quote.full_span.end,
        method: AttributionMethod::Adjacent,
        confidence: 0.75,
    })
}

/// Fill unattributed quotes between two alternating speakers.
fn turn_taking_pass(outcome: &mut AttributionOutcome) {
    for i in 0..outcome.quotes.len() {
        if outcome.quotes[i].speaker.is_some() {
            continue;
        }
        let Some(previous_speaker) = i
            .checked_sub(1)
            .and_then(|p| outcome.quotes[p].speaker.as_ref())
            .and_then(|s| s.entity_id.clone().map(|id| (id, s.name.clone())))
        else {
            continue;
        };

        // active speakers: the previous three quotes plus this one
        let window_start = i.saturating_sub(3);
        let mut active: Vec<(String, String)> = Vec::new();
        for quote in &outcome.quotes[window_start..=i] {
            if let Some(speaker) = &quote.speaker {
                if let Some(id) = &speaker.entity_id {
                    if !active.iter().any(|(a, _)| a == id) {
                        active.push((id.clone(), speaker.name.clone()));
                    }
                }
            }
        }
        if active.len() != 2 {
            continue;
        }
        let other = active
            .iter()
            .find(|(id, _)| *id != previous_speaker.0)
            .cloned();
        if let Some((entity_id, name)) = other {
            let quote = &mut outcome.quotes[i];
            quote.speaker = Some(SpeakerCandidate {
                entity_id: Some(entity_id),
                name,
                start: quote.quote.full_span.start,
                end: quote.quote.full_span.end,
                method: AttributionMethod::TurnTaking,
                confidence: 0.6,
            });
            outcome.turn_taking_hits += 1;
        }
    }
}

fn window_after(text: &str, from: usize) -> &str {
    let mut end = (from + PROBE_WINDOW).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    &text[from..end]
}

fn window_before_start(text: &str, to: usize) -> usize {
    let mut start = to.saturating_sub(PROBE_WINDOW);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    start
}

fn sentence_index_at(bounds: &[(usize, usize)], position: usize) -> usize {
    bounds
        .iter()
        .position(|(start, end)| position >= *start && position <= *end)
        .unwrap_or_else(|| bounds.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_double_and_smart_quotes_in_order() {
        let text = "\"Stop!\" she shouted. \u{201C}Why?\u{201D} he asked.";
        let quotes = detect_quotes(text);
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].inner_text, "Stop!");
        assert_eq!(quotes[0].style, QuoteStyle::Double);
        assert_eq!(quotes[1].inner_text, "Why?");
        assert_eq!(quotes[1].style, QuoteStyle::Smart);
    }

    #[test]
    fn short_single_quotes_are_apostrophes() {
        let text = "Frodo's ring. 'Tis nothing.";
        assert!(detect_quotes(text).is_empty());
    }

    #[test]
    fn long_single_quotes_are_accepted() {
        let text = "He muttered 'this is a very long aside' and left.";
        let quotes = detect_quotes(text);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].style, QuoteStyle::Single);
        assert_eq!(quotes[0].inner_text, "this is a very long aside");
    }

    #[test]
    fn inner_span_excludes_the_marks() {
        let text = "\"Run.\"";
        let quotes = detect_quotes(text);
        assert_eq!(quotes[0].full_span, TextSpan::new(0, 6));
        assert_eq!(quotes[0].start, 1);
        assert_eq!(quotes[0].end, 5);
        assert_eq!(&text[quotes[0].start..quotes[0].end], "Run.");
    }

    #[test]
    fn escaped_double_quote_does_not_close() {
        let text = "\"a \\\" b\" rest";
        let quotes = detect_quotes(text);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].inner_text, "a \\\" b");
    }
}
