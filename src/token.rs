//! Parser input: dependency-annotated sentences.
//!
//! Tokenization and parsing happen upstream; the pipeline consumes a
//! [`ParseResponse`] whose character offsets index into the original
//! document text. Validation here is the only fatal input check in the
//! core - everything downstream recovers locally.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, ExtractResult};

/// One token with its parser annotations.
///
/// `head` is the index (into the owning sentence's `tokens`) of this
/// token's dependency head; a root token points at itself. `ent` is the
/// NER label, `"O"` when the token is outside any named-entity span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub i: usize,
    pub text: String,
    pub lemma: String,
    pub pos: String,
    pub tag: String,
    pub dep: String,
    pub head: usize,
    pub ent: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_proper_noun(&self) -> bool {
        self.pos == "PROPN"
    }

    pub fn is_noun(&self) -> bool {
        self.pos == "NOUN" || self.pos == "PROPN"
    }

    pub fn is_verb(&self) -> bool {
        self.pos == "VERB" || self.pos == "AUX"
    }

    /// NER label, or `None` for tokens outside named-entity spans.
    pub fn ner(&self) -> Option<&str> {
        if self.ent == "O" || self.ent.is_empty() {
            None
        } else {
            Some(&self.ent)
        }
    }

    pub fn is_sentence_initial(&self, sentence: &Sentence) -> bool {
        sentence.tokens.first().map(|t| t.i) == Some(self.i)
    }
}

/// A parsed sentence with its document-level character range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentence {
    pub sentence_index: usize,
    pub start: usize,
    pub end: usize,
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// The token whose head is itself, if the parse has one.
    pub fn root(&self) -> Option<&Token> {
        self.tokens.iter().find(|t| t.head == t.i)
    }

    /// Children of `head_index` in dependency order.
    pub fn children_of(&self, head_index: usize) -> impl Iterator<Item = &Token> {
        self.tokens
            .iter()
            .filter(move |t| t.head == head_index && t.i != head_index)
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.iter().find(|t| t.i == index)
    }
}

/// The full parser output for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub sentences: Vec<Sentence>,
}

impl ParseResponse {
    /// Validate token offsets, head indices and sentence ordering against
    /// the original document text.
    ///
    /// Errors here are fatal for the document (error kind 1): the rest of
    /// the pipeline assumes offsets can be sliced without bounds checks on
    /// every access.
    pub fn validate(&self, text: &str) -> ExtractResult<()> {
        let doc_len = text.len();
        let mut previous_end = 0usize;

        for sentence in &self.sentences {
            if sentence.start > sentence.end || sentence.end > doc_len {
                return Err(ExtractError::MalformedInput {
                    message: format!(
                        "sentence {} range {}..{} exceeds document length {}",
                        sentence.sentence_index, sentence.start, sentence.end, doc_len
                    ),
                });
            }
            if sentence.start < previous_end {
                return Err(ExtractError::MalformedInput {
                    message: format!(
                        "sentence {} starts at {} before previous sentence end {}",
                        sentence.sentence_index, sentence.start, previous_end
                    ),
                });
            }
            previous_end = sentence.end;

            for token in &sentence.tokens {
                if token.start > token.end || token.end > doc_len {
                    return Err(ExtractError::MalformedInput {
                        message: format!(
                            "token {:?} span {}..{} out of bounds",
                            token.text, token.start, token.end
                        ),
                    });
                }
                if sentence.token(token.head).is_none() {
                    return Err(ExtractError::MalformedInput {
                        message: format!(
                            "token {:?} head index {} not present in sentence {}",
                            token.text, token.head, sentence.sentence_index
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(i: usize, text: &str, head: usize, start: usize) -> Token {
        Token {
            i,
            text: text.to_string(),
            lemma: text.to_lowercase(),
            pos: "NOUN".to_string(),
            tag: "NN".to_string(),
            dep: "dep".to_string(),
            head,
            ent: "O".to_string(),
            start,
            end: start + text.len(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_input() {
        let text = "Frodo walked.";
        let parse = ParseResponse {
            sentences: vec![Sentence {
                sentence_index: 0,
                start: 0,
                end: text.len(),
                tokens: vec![token(0, "Frodo", 1, 0), token(1, "walked", 1, 6)],
            }],
        };
        assert!(parse.validate(text).is_ok());
    }

    #[test]
    fn validate_rejects_bad_head_index() {
        let text = "Frodo walked.";
        let parse = ParseResponse {
            sentences: vec![Sentence {
                sentence_index: 0,
                start: 0,
                end: text.len(),
                tokens: vec![token(0, "Frodo", 9, 0)],
            }],
        };
        assert!(matches!(
            parse.validate(text),
            Err(ExtractError::MalformedInput { .. })
        ));
    }

    #[test]
    fn validate_rejects_non_monotonic_sentences() {
        let text = "One. Two.";
        let parse = ParseResponse {
            sentences: vec![
                Sentence {
                    sentence_index: 0,
                    start: 5,
                    end: 9,
                    tokens: vec![],
                },
                Sentence {
                    sentence_index: 1,
                    start: 0,
                    end: 4,
                    tokens: vec![],
                },
            ],
        };
        assert!(parse.validate(text).is_err());
    }

    #[test]
    fn validate_rejects_out_of_bounds_token() {
        let text = "Hi.";
        let parse = ParseResponse {
            sentences: vec![Sentence {
                sentence_index: 0,
                start: 0,
                end: 3,
                tokens: vec![token(0, "Hello", 0, 0)],
            }],
        };
        assert!(parse.validate(text).is_err());
    }
}
