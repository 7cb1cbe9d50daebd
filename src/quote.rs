//! Quoted spans and speaker attribution records.

use serde::{Deserialize, Serialize};

use crate::span::TextSpan;

/// Which quoting convention matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// ASCII `"..."` with escape handling.
    Double,
    /// Typographic `“...”`.
    Smart,
    /// `'...'`, only accepted when the inner text is long enough to rule
    /// out apostrophes.
    Single,
}

/// A detected quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteMatch {
    /// Full span including the quote marks.
    pub full_span: TextSpan,
    /// The quoted text without the marks.
    pub inner_text: String,
    /// Start of the inner text in document offsets.
    pub start: usize,
    /// End of the inner text in document offsets.
    pub end: usize,
    pub style: QuoteStyle,
}

/// How a speaker was assigned to a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributionMethod {
    /// Name + speech verb adjacent to the quote.
    #[serde(rename = "pattern")]
    Pattern,
    /// A pronoun next to the quote, resolved through the salience stack.
    #[serde(rename = "pronoun")]
    Pronoun,
    /// Nearest entity span in the probe window.
    #[serde(rename = "adjacent")]
    Adjacent,
    /// Inferred from alternating dialogue turns.
    #[serde(rename = "turn-taking")]
    TurnTaking,
}

/// A candidate speaker for one quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerCandidate {
    /// Resolved entity id; `None` when only a surface name was found.
    pub entity_id: Option<String>,
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub method: AttributionMethod,
    pub confidence: f64,
}

/// A quote paired with its (possibly absent) speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedQuote {
    pub quote: QuoteMatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<SpeakerCandidate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribution_method_wire_names() {
        let json = serde_json::to_string(&AttributionMethod::TurnTaking).unwrap();
        assert_eq!(json, "\"turn-taking\"");
        let back: AttributionMethod = serde_json::from_str("\"pattern\"").unwrap();
        assert_eq!(back, AttributionMethod::Pattern);
    }
}
