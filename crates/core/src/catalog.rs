//! The built-in question bank.
//!
//! Catalog text lives in static tables below and is turned into validated
//! `Test` values once, by `QuestionBank::builtin`. A malformed entry is a data
//! error and surfaces as `CatalogError` at startup, never while scoring.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{
    OptionToken, Question, QuestionError, QuestionId, Section, Test, TestCategory, TestError,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Test(#[from] TestError),

    #[error("question {id}: correct token {raw:?} is not a letter")]
    BadCorrectToken { id: QuestionId, raw: char },

    #[error("more than one test registered for category '{0}'")]
    DuplicateCategory(TestCategory),

    #[error("no test registered for category '{0}'")]
    MissingCategory(TestCategory),
}

struct QuestionSpec {
    id: u32,
    prompt: &'static str,
    options: &'static [&'static str],
    correct: char,
}

struct SectionSpec {
    title: &'static str,
    questions: &'static [QuestionSpec],
}

struct TestSpec {
    category: TestCategory,
    title: &'static str,
    description: &'static str,
    sections: &'static [SectionSpec],
}

const KIDS: TestSpec = TestSpec {
    category: TestCategory::Kids,
    title: "Kids Grammar Test",
    description: "A short check of everyday grammar for young learners.",
    sections: &[
        SectionSpec {
            title: "Nouns and Verbs",
            questions: &[
                QuestionSpec {
                    id: 1,
                    prompt: "She ___ to school every day.",
                    options: &["go", "goes", "going", "gone"],
                    correct: 'b',
                },
                QuestionSpec {
                    id: 2,
                    prompt: "Which word is a noun?",
                    options: &["run", "happy", "apple", "quickly"],
                    correct: 'c',
                },
                QuestionSpec {
                    id: 3,
                    prompt: "The plural of \"child\" is ___.",
                    options: &["childs", "children", "childes", "childrens"],
                    correct: 'b',
                },
            ],
        },
        SectionSpec {
            title: "Articles",
            questions: &[
                QuestionSpec {
                    id: 4,
                    prompt: "I saw ___ elephant at the zoo.",
                    options: &["a", "an", "the", "no article"],
                    correct: 'b',
                },
                QuestionSpec {
                    id: 5,
                    prompt: "___ sun is very hot today.",
                    options: &["A", "An", "The", "No article"],
                    correct: 'c',
                },
            ],
        },
    ],
};

const ADULTS: TestSpec = TestSpec {
    category: TestCategory::Adults,
    title: "Advanced Grammar Test",
    description: "Tenses, conditionals and prepositions for adult learners.",
    sections: &[
        SectionSpec {
            title: "Tenses",
            questions: &[
                QuestionSpec {
                    id: 1,
                    prompt: "By the time we arrived, the film ___.",
                    options: &[
                        "already started",
                        "has already started",
                        "had already started",
                        "is starting",
                    ],
                    correct: 'c',
                },
                QuestionSpec {
                    id: 2,
                    prompt: "I ___ here since 2015.",
                    options: &["live", "am living", "have lived", "lived"],
                    correct: 'c',
                },
                QuestionSpec {
                    id: 3,
                    prompt: "This time next week we ___ on the beach.",
                    options: &["will lie", "will be lying", "are lying", "lie"],
                    correct: 'b',
                },
                QuestionSpec {
                    id: 4,
                    prompt: "She ___ the report when her computer crashed.",
                    options: &["wrote", "was writing", "has written", "writes"],
                    correct: 'b',
                },
            ],
        },
        SectionSpec {
            title: "Conditionals",
            questions: &[
                QuestionSpec {
                    id: 5,
                    prompt: "If I ___ you, I would accept the offer.",
                    options: &["am", "was being", "were", "had been"],
                    correct: 'c',
                },
                QuestionSpec {
                    id: 6,
                    prompt: "If they had left earlier, they ___ the train.",
                    options: &["would catch", "would have caught", "will catch", "caught"],
                    correct: 'b',
                },
                QuestionSpec {
                    id: 7,
                    prompt: "Unless you ___, you will miss the deadline.",
                    options: &["hurry", "will hurry", "hurried", "don't hurry"],
                    correct: 'a',
                },
            ],
        },
        SectionSpec {
            title: "Prepositions and Articles",
            questions: &[
                QuestionSpec {
                    id: 8,
                    prompt: "She is very good ___ solving problems.",
                    options: &["in", "at", "on", "for"],
                    correct: 'b',
                },
                QuestionSpec {
                    id: 9,
                    prompt: "We have been waiting ___ two hours.",
                    options: &["since", "during", "for", "from"],
                    correct: 'c',
                },
                QuestionSpec {
                    id: 10,
                    prompt: "He is ___ honest man.",
                    options: &["a", "an", "the", "no article"],
                    correct: 'b',
                },
            ],
        },
    ],
};

const BUILTIN: &[TestSpec] = &[KIDS, ADULTS];

/// Read-only catalog of tests, one per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    tests: BTreeMap<TestCategory, Test>,
}

impl QuestionBank {
    /// Build the catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if any built-in entry is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        let tests = BUILTIN
            .iter()
            .map(build_test)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_tests(tests)
    }

    /// Build a catalog from already-validated tests.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateCategory` if two tests share a category,
    /// or `CatalogError::MissingCategory` if a category has no test.
    pub fn from_tests(tests: Vec<Test>) -> Result<Self, CatalogError> {
        let mut by_category = BTreeMap::new();
        for test in tests {
            let category = test.category();
            if by_category.insert(category, test).is_some() {
                return Err(CatalogError::DuplicateCategory(category));
            }
        }
        if let Some(missing) = TestCategory::ALL
            .into_iter()
            .find(|c| !by_category.contains_key(c))
        {
            return Err(CatalogError::MissingCategory(missing));
        }
        Ok(Self { tests: by_category })
    }

    /// The test for `category`. Every category is present by construction.
    #[must_use]
    pub fn test(&self, category: TestCategory) -> Option<&Test> {
        self.tests.get(&category)
    }

    pub fn tests(&self) -> impl Iterator<Item = &Test> {
        self.tests.values()
    }
}

fn build_test(spec: &TestSpec) -> Result<Test, CatalogError> {
    let mut sections = Vec::with_capacity(spec.sections.len());
    for section in spec.sections {
        let questions = section
            .questions
            .iter()
            .map(build_question)
            .collect::<Result<Vec<_>, _>>()?;
        sections.push(Section::new(section.title, questions));
    }
    Ok(Test::new(
        spec.category,
        spec.title,
        spec.description,
        sections,
    )?)
}

fn build_question(spec: &QuestionSpec) -> Result<Question, CatalogError> {
    let id = QuestionId::new(spec.id);
    let correct = OptionToken::from_letter(spec.correct).ok_or(CatalogError::BadCorrectToken {
        id,
        raw: spec.correct,
    })?;
    let options = spec.options.iter().map(|o| (*o).to_owned()).collect();
    Ok(Question::new(id, spec.prompt, options, correct)?)
}
