use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {id}: prompt cannot be empty")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id}: needs at least two options, got {count}")]
    TooFewOptions { id: QuestionId, count: usize },

    #[error("question {id}: more than {max} options", max = OptionToken::MAX_OPTIONS)]
    TooManyOptions { id: QuestionId },

    #[error("question {id}: option {index} is blank")]
    BlankOption { id: QuestionId, index: usize },

    #[error("question {id}: correct token '{token}' is outside its {count} options")]
    CorrectTokenOutOfRange {
        id: QuestionId,
        token: OptionToken,
        count: usize,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid option token: {raw:?}")]
pub struct ParseTokenError {
    raw: String,
}

//
// ─── OPTION TOKEN ──────────────────────────────────────────────────────────────
//

/// Stable answer key for an option: `a` for the first option, `b` for the second, ...
///
/// Grading compares tokens, never option text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OptionToken(u8);

impl OptionToken {
    pub const MAX_OPTIONS: usize = 26;

    /// Token for the option at `index` (zero-based).
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .filter(|i| usize::from(*i) < Self::MAX_OPTIONS)
            .map(|i| Self(b'a' + i))
    }

    /// Token for a letter; case-insensitive.
    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        let lower = letter.to_ascii_lowercase();
        lower
            .is_ascii_lowercase()
            .then(|| Self(lower as u8))
    }

    /// Zero-based position of the option this token selects.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0 - b'a')
    }

    #[must_use]
    pub fn as_char(self) -> char {
        char::from(self.0)
    }
}

impl fmt::Debug for OptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionToken({})", self.as_char())
    }
}

impl fmt::Display for OptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for OptionToken {
    type Err = ParseTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_letter(c),
            _ => None,
        }
        .ok_or_else(|| ParseTokenError { raw: s.to_owned() })
    }
}

impl TryFrom<String> for OptionToken {
    type Error = ParseTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OptionToken> for String {
    fn from(token: OptionToken) -> Self {
        token.as_char().to_string()
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct: OptionToken,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is empty, there are fewer than two
    /// (or more than 26) options, an option is blank, or `correct` does not
    /// point at one of the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: OptionToken,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions {
                id,
                count: options.len(),
            });
        }
        if options.len() > OptionToken::MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions { id });
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::BlankOption { id, index });
        }
        if correct.index() >= options.len() {
            return Err(QuestionError::CorrectTokenOutOfRange {
                id,
                token: correct,
                count: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_token(&self) -> OptionToken {
        self.correct
    }

    /// Options paired with their tokens, in display order.
    pub fn tokens(&self) -> impl Iterator<Item = (OptionToken, &str)> {
        self.options
            .iter()
            .enumerate()
            .filter_map(|(i, text)| OptionToken::from_index(i).map(|t| (t, text.as_str())))
    }

    #[must_use]
    pub fn has_option(&self, token: OptionToken) -> bool {
        token.index() < self.options.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    fn token(c: char) -> OptionToken {
        OptionToken::from_letter(c).unwrap()
    }

    #[test]
    fn tokens_follow_option_positions() {
        assert_eq!(OptionToken::from_index(0), Some(token('a')));
        assert_eq!(OptionToken::from_index(3), Some(token('d')));
        assert_eq!(OptionToken::from_index(26), None);
        assert_eq!(token('c').index(), 2);
    }

    #[test]
    fn token_parse_normalizes_case() {
        let parsed: OptionToken = " B ".parse().unwrap();
        assert_eq!(parsed, token('b'));
        assert_eq!(parsed.to_string(), "b");
        assert!("ab".parse::<OptionToken>().is_err());
        assert!("1".parse::<OptionToken>().is_err());
        assert!("".parse::<OptionToken>().is_err());
    }

    #[test]
    fn token_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&token('a')).unwrap(), "\"a\"");
        let back: OptionToken = serde_json::from_str("\"d\"").unwrap();
        assert_eq!(back, token('d'));
        assert!(serde_json::from_str::<OptionToken>("\"??\"").is_err());
    }

    #[test]
    fn question_lists_tokens_in_order() {
        let q = Question::new(
            QuestionId::new(1),
            "She ___ to school.",
            opts(&["go", "goes", "going"]),
            token('b'),
        )
        .unwrap();

        let listed: Vec<_> = q.tokens().map(|(t, text)| (t.as_char(), text)).collect();
        assert_eq!(listed, vec![('a', "go"), ('b', "goes"), ('c', "going")]);
        assert!(q.has_option(token('c')));
        assert!(!q.has_option(token('d')));
    }

    #[test]
    fn question_rejects_out_of_range_correct_token() {
        let err = Question::new(QuestionId::new(1), "Q", opts(&["x", "y"]), token('c'))
            .unwrap_err();
        assert!(matches!(err, QuestionError::CorrectTokenOutOfRange { count: 2, .. }));
    }

    #[test]
    fn question_rejects_bad_shapes() {
        assert!(matches!(
            Question::new(QuestionId::new(1), "  ", opts(&["x", "y"]), token('a')),
            Err(QuestionError::EmptyPrompt { .. })
        ));
        assert!(matches!(
            Question::new(QuestionId::new(1), "Q", opts(&["x"]), token('a')),
            Err(QuestionError::TooFewOptions { count: 1, .. })
        ));
        assert!(matches!(
            Question::new(QuestionId::new(1), "Q", opts(&["x", " "]), token('a')),
            Err(QuestionError::BlankOption { index: 1, .. })
        ));
    }
}
