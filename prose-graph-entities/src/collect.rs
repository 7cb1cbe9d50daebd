//! Mention collection: noun-phrase heads with their local context.
//!
//! Mentions are found three ways, longest span first so the passes do not
//! overlap: NER spans (maximal runs of one label), proper-noun runs the
//! NER missed, and standalone common nouns. Ordering is strict reading
//! order (sentence index, then start offset).

use prose_graph::{Sentence, TextSpan, Token};
use prose_graph_lexicon as lexicon;

use crate::context::MentionContext;

/// Collect every noun-phrase mention in the document, in reading order.
///
/// `dialogue_ranges` are the inner spans of detected quotes; mentions
/// inside them are flagged `is_in_dialogue` and may be vocatives.
pub fn collect_mentions(sentences: &[Sentence], dialogue_ranges: &[TextSpan]) -> Vec<MentionContext> {
    let mut mentions = Vec::new();
    for sentence in sentences {
        collect_in_sentence(sentence, dialogue_ranges, &mut mentions);
    }
    mentions.sort_by_key(|m| (m.sentence_index, m.start));
    mentions
}

fn collect_in_sentence(
    sentence: &Sentence,
    dialogue_ranges: &[TextSpan],
    out: &mut Vec<MentionContext>,
) {
    let tokens = &sentence.tokens;
    let mut covered = vec![false; tokens.len()];

    // Pass 1: maximal NER runs.
    let mut idx = 0;
    while idx < tokens.len() {
        if let Some(label) = tokens[idx].ner() {
            let mut end = idx;
            while end + 1 < tokens.len() && tokens[end + 1].ner() == Some(label) {
                end += 1;
            }
            let label = label.to_string();
            out.push(build_context(sentence, idx, end, Some(label), dialogue_ranges));
            for c in covered.iter_mut().take(end + 1).skip(idx) {
                *c = true;
            }
            idx = end + 1;
        } else {
            idx += 1;
        }
    }

    // Pass 2: proper-noun runs outside NER spans.
    let mut idx = 0;
    while idx < tokens.len() {
        if !covered[idx] && tokens[idx].is_proper_noun() {
            let mut end = idx;
            while end + 1 < tokens.len() && !covered[end + 1] && tokens[end + 1].is_proper_noun() {
                end += 1;
            }
            out.push(build_context(sentence, idx, end, None, dialogue_ranges));
            for c in covered.iter_mut().take(end + 1).skip(idx) {
                *c = true;
            }
            idx = end + 1;
        } else {
            idx += 1;
        }
    }

    // Pass 3: standalone common nouns. Most are filtered later; they are
    // collected so role descriptors leave an audit trail.
    for (t_idx, token) in tokens.iter().enumerate() {
        if !covered[t_idx] && token.pos == "NOUN" && !lexicon::is_stopword(&token.text) {
            out.push(build_context(sentence, t_idx, t_idx, None, dialogue_ranges));
        }
    }
}

fn build_context(
    sentence: &Sentence,
    first: usize,
    last: usize,
    ner_label: Option<String>,
    dialogue_ranges: &[TextSpan],
) -> MentionContext {
    let tokens = &sentence.tokens;
    let first_token = &tokens[first];
    let last_token = &tokens[last];

    // The span head is the token whose dependency arc leaves the span;
    // it carries the grammatical role of the whole phrase.
    let head = tokens[first..=last]
        .iter()
        .find(|t| t.head == t.i || t.head < tokens[first].i || t.head > tokens[last].i)
        .unwrap_or(last_token);
    let governor = sentence.token(head.head);

    let is_verb_subject = matches!(head.dep.as_str(), "nsubj" | "nsubjpass")
        && governor.map(|g| g.is_verb()).unwrap_or(false);
    let is_verb_object = matches!(head.dep.as_str(), "dobj" | "obj" | "iobj" | "pobj" | "attr")
        && governor.is_some();
    let verb_lemma = if is_verb_subject || is_verb_object {
        verb_governing(sentence, head).map(|v| v.lemma.clone())
    } else {
        None
    };

    let previous = first.checked_sub(1).map(|i| &tokens[i]);
    let determiner = previous
        .filter(|t| t.dep == "det" || matches!(t.text.to_lowercase().as_str(), "the" | "a" | "an"))
        .map(|t| t.text.clone());

    // Title: either the span starts with one ("Mr. Darcy") or the token
    // just before the span is one.
    let title_in_span = (first < last && lexicon::is_title_prefix(&first_token.text)).then(|| first_token.text.clone());
    let title_before = previous
        .filter(|t| lexicon::is_title_prefix(&t.text))
        .map(|t| t.text.clone());
    let title = title_in_span.or(title_before);

    let role_word = previous
        .filter(|t| lexicon::is_role_word(&t.text))
        .map(|t| t.text.clone())
        .or_else(|| {
            // appositive role: "the king, Aragorn" / "Aragorn the king"
            tokens
                .get(last + 2)
                .filter(|_| tokens.get(last + 1).map(|c| c.text == ",").unwrap_or(false))
                .filter(|t| lexicon::is_role_word(&t.text))
                .map(|t| t.text.clone())
        });

    let span = TextSpan::new(first_token.start, last_token.end);
    let is_in_dialogue = dialogue_ranges.iter().any(|d| d.contains(&span));

    // Vocative: a name inside dialogue set off by a comma on either side.
    let next = tokens.get(last + 1);
    let is_vocative = is_in_dialogue
        && (previous.map(|t| t.text == ",").unwrap_or(false)
            || next.map(|t| t.text == "," || t.text == "!").unwrap_or(false));

    let is_possessive = next.map(|t| t.tag == "POS").unwrap_or(false) || head.dep == "poss";

    let text: String = sentence_slice(sentence, first, last);

    MentionContext {
        text,
        ner_label,
        start: first_token.start,
        end: last_token.end,
        sentence_index: sentence.sentence_index,
        is_sentence_initial: first == 0,
        determiner,
        is_verb_subject,
        is_verb_object,
        verb_lemma,
        has_role_word: role_word.is_some(),
        role_word,
        has_title: title.is_some(),
        title,
        is_vocative,
        is_in_dialogue,
        coref_links_count: 0,
        is_possessive,
    }
}

/// Walk up from a token to the nearest verb governing it.
fn verb_governing<'a>(sentence: &'a Sentence, token: &'a Token) -> Option<&'a Token> {
    let mut current = sentence.token(token.head)?;
    let mut hops = 0;
    while !current.is_verb() {
        // bounded walk; a malformed parse must not loop forever
        if hops > 8 || current.head == current.i {
            return None;
        }
        current = sentence.token(current.head)?;
        hops += 1;
    }
    Some(current)
}

/// Join token texts for a span, using the original spacing when offsets
/// are contiguous.
fn sentence_slice(sentence: &Sentence, first: usize, last: usize) -> String {
    let tokens = &sentence.tokens[first..=last];
    let mut text = String::new();
    let mut prev_end = None;
    for token in tokens {
        if let Some(end) = prev_end {
            if token.start > end {
                text.push(' ');
            }
        }
        text.push_str(&token.text);
        prev_end = Some(token.end);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(i: usize, text: &str, pos: &str, dep: &str, head: usize, ent: &str, start: usize) -> Token {
        Token {
            i,
            text: text.to_string(),
            lemma: text.to_lowercase(),
            pos: pos.to_string(),
            tag: if pos == "NOUN" { "NN" } else { "NNP" }.to_string(),
            dep: dep.to_string(),
            head,
            ent: ent.to_string(),
            start,
            end: start + text.len(),
        }
    }

    fn verb(i: usize, text: &str, lemma: &str, head: usize, start: usize) -> Token {
        Token {
            i,
            text: text.to_string(),
            lemma: lemma.to_string(),
            pos: "VERB".to_string(),
            tag: "VBD".to_string(),
            dep: "ROOT".to_string(),
            head,
            ent: "O".to_string(),
            start,
            end: start + text.len(),
        }
    }

    #[test]
    fn ner_runs_merge_into_one_mention() {
        // "Kingdom of Gondor fell"
        let sentence = Sentence {
            sentence_index: 0,
            start: 0,
            end: 22,
            tokens: vec![
                tok(0, "Kingdom", "PROPN", "nsubj", 3, "GPE", 0),
                tok(1, "of", "ADP", "prep", 0, "GPE", 8),
                tok(2, "Gondor", "PROPN", "pobj", 1, "GPE", 11),
                verb(3, "fell", "fall", 3, 18),
            ],
        };
        let mentions = collect_mentions(&[sentence], &[]);
        assert_eq!(mentions[0].text, "Kingdom of Gondor");
        assert_eq!(mentions[0].ner_label.as_deref(), Some("GPE"));
    }

    #[test]
    fn subject_context_carries_verb_lemma() {
        // "Aragorn married Arwen"
        let sentence = Sentence {
            sentence_index: 0,
            start: 0,
            end: 21,
            tokens: vec![
                tok(0, "Aragorn", "PROPN", "nsubj", 1, "PERSON", 0),
                verb(1, "married", "marry", 1, 8),
                tok(2, "Arwen", "PROPN", "dobj", 1, "PERSON", 16),
            ],
        };
        let mentions = collect_mentions(&[sentence], &[]);
        let aragorn = mentions.iter().find(|m| m.text == "Aragorn").unwrap();
        assert!(aragorn.is_verb_subject);
        assert_eq!(aragorn.verb_lemma.as_deref(), Some("marry"));
        let arwen = mentions.iter().find(|m| m.text == "Arwen").unwrap();
        assert!(arwen.is_verb_object);
    }

    #[test]
    fn mentions_come_out_in_reading_order() {
        let s0 = Sentence {
            sentence_index: 0,
            start: 0,
            end: 12,
            tokens: vec![
                tok(0, "Harry", "PROPN", "nsubj", 1, "PERSON", 0),
                verb(1, "froze", "freeze", 1, 6),
            ],
        };
        let s1 = Sentence {
            sentence_index: 1,
            start: 13,
            end: 30,
            tokens: vec![
                tok(0, "Hermione", "PROPN", "nsubj", 1, "PERSON", 13),
                verb(1, "smiled", "smile", 1, 22),
            ],
        };
        let mentions = collect_mentions(&[s0, s1], &[]);
        assert_eq!(
            mentions.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(),
            vec!["Harry", "Hermione"]
        );
    }
}
