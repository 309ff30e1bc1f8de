mod answer;
mod ids;
mod question;
mod result;
mod test;

pub use answer::AnswerMap;
pub use ids::{ParseIdError, QuestionId, ResultId, UserId};
pub use question::{OptionToken, ParseTokenError, Question, QuestionError};
pub use result::{NewTestResult, ResultError, TestResult};
pub use test::{ParseCategoryError, Section, Test, TestCategory, TestError};
