use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::QuestionId;
use crate::model::question::OptionToken;

/// The user's selections, keyed by question id.
///
/// Holds at most one token per question and never an entry for an unanswered
/// question. Edits produce a new map; the previous one is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<QuestionId, OptionToken>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this map with `id` set to `token` (last write wins).
    #[must_use]
    pub fn with_answer(&self, id: QuestionId, token: OptionToken) -> Self {
        let mut next = self.0.clone();
        next.insert(id, token);
        Self(next)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<OptionToken> {
        self.0.get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, OptionToken)> + '_ {
        self.0.iter().map(|(id, token)| (*id, *token))
    }
}

impl FromIterator<(QuestionId, OptionToken)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (QuestionId, OptionToken)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(c: char) -> OptionToken {
        OptionToken::from_letter(c).unwrap()
    }

    #[test]
    fn with_answer_leaves_original_untouched() {
        let empty = AnswerMap::new();
        let one = empty.with_answer(QuestionId::new(1), t('a'));

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(QuestionId::new(1)), Some(t('a')));
    }

    #[test]
    fn last_write_wins() {
        let map = AnswerMap::new()
            .with_answer(QuestionId::new(1), t('a'))
            .with_answer(QuestionId::new(2), t('c'))
            .with_answer(QuestionId::new(1), t('b'));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(QuestionId::new(1)), Some(t('b')));
    }

    #[test]
    fn serializes_as_object_of_letters() {
        let map: AnswerMap = [(QuestionId::new(2), t('d')), (QuestionId::new(1), t('a'))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"1":"a","2":"d"}"#);

        let back: AnswerMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
