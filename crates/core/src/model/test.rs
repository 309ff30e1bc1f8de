use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("test '{category}' has no questions")]
    NoQuestions { category: TestCategory },

    #[error("section {index} of test '{category}' has an empty title")]
    EmptySectionTitle { category: TestCategory, index: usize },

    #[error("question id {id} appears more than once in test '{category}'")]
    DuplicateQuestionId {
        category: TestCategory,
        id: QuestionId,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown test category: {raw:?} (expected \"kids\" or \"adults\")")]
pub struct ParseCategoryError {
    raw: String,
}

/// Audience a test is written for; also the key used to pick it from the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestCategory {
    Kids,
    Adults,
}

impl TestCategory {
    pub const ALL: [TestCategory; 2] = [TestCategory::Kids, TestCategory::Adults];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestCategory::Kids => "kids",
            TestCategory::Adults => "adults",
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kids" => Ok(TestCategory::Kids),
            "adults" => Ok(TestCategory::Adults),
            _ => Err(ParseCategoryError { raw: s.to_owned() }),
        }
    }
}

/// Ordered group of questions shown under one heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    title: String,
    questions: Vec<Question>,
}

impl Section {
    #[must_use]
    pub fn new(title: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            title: title.into(),
            questions,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }
}

/// An immutable catalog entry: one full assessment for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    category: TestCategory,
    title: String,
    description: String,
    sections: Vec<Section>,
}

impl Test {
    /// Build a test and check its structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the title is empty, a section title is empty, the
    /// test holds no questions at all, or a question id is reused.
    pub fn new(
        category: TestCategory,
        title: impl Into<String>,
        description: impl Into<String>,
        sections: Vec<Section>,
    ) -> Result<Self, TestError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TestError::EmptyTitle);
        }
        if let Some(index) = sections.iter().position(|s| s.title.trim().is_empty()) {
            return Err(TestError::EmptySectionTitle { category, index });
        }

        let mut seen = HashSet::new();
        for question in sections.iter().flat_map(|s| s.questions.iter()) {
            if !seen.insert(question.id()) {
                return Err(TestError::DuplicateQuestionId {
                    category,
                    id: question.id(),
                });
            }
        }
        if seen.is_empty() {
            return Err(TestError::NoQuestions { category });
        }

        Ok(Self {
            category,
            title,
            description: description.into(),
            sections,
        })
    }

    #[must_use]
    pub fn category(&self) -> TestCategory {
        self.category
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Every question across all sections, in catalog order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions().find(|q| q.id() == id)
    }

    /// Always at least 1 for a constructed `Test`.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::OptionToken;

    fn q(id: u32) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["yes".into(), "no".into()],
            OptionToken::from_index(0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in TestCategory::ALL {
            assert_eq!(category.as_str().parse::<TestCategory>().unwrap(), category);
        }
        assert_eq!("ADULTS".parse::<TestCategory>().unwrap(), TestCategory::Adults);
        assert!("teens".parse::<TestCategory>().is_err());
    }

    #[test]
    fn questions_flatten_in_catalog_order() {
        let test = Test::new(
            TestCategory::Kids,
            "T",
            "",
            vec![
                Section::new("One", vec![q(3), q(1)]),
                Section::new("Two", vec![q(2)]),
            ],
        )
        .unwrap();

        let ids: Vec<u32> = test.questions().map(|q| q.id().value()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(test.question_count(), 3);
        assert!(test.question(QuestionId::new(2)).is_some());
        assert!(test.question(QuestionId::new(9)).is_none());
    }

    #[test]
    fn empty_test_is_rejected() {
        let err = Test::new(TestCategory::Adults, "T", "", vec![Section::new("S", vec![])])
            .unwrap_err();
        assert_eq!(
            err,
            TestError::NoQuestions {
                category: TestCategory::Adults
            }
        );
    }

    #[test]
    fn duplicate_ids_across_sections_are_rejected() {
        let err = Test::new(
            TestCategory::Kids,
            "T",
            "",
            vec![Section::new("A", vec![q(1)]), Section::new("B", vec![q(1)])],
        )
        .unwrap_err();
        assert!(matches!(err, TestError::DuplicateQuestionId { .. }));
    }
}
