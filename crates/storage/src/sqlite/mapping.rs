use assess_core::model::{AnswerMap, ResultId, TestCategory, TestResult, UserId};
use sqlx::Row;

use crate::repository::{AccountRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn parse_category(s: &str) -> Result<TestCategory, StorageError> {
    s.parse::<TestCategory>().map_err(ser)
}

/// Answers are stored as a JSON object of question id to option letter.
pub(crate) fn answers_to_json(answers: &AnswerMap) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn answers_from_json(raw: &str) -> Result<AnswerMap, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<TestResult, StorageError> {
    let category: String = row.try_get("category").map_err(ser)?;
    let answers: String = row.try_get("answers").map_err(ser)?;

    TestResult::from_persisted(
        ResultId::new(row.try_get::<i64, _>("id").map_err(ser)?),
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        parse_category(&category)?,
        u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
        u32_from_i64(
            "percentage",
            row.try_get::<i64, _>("percentage").map_err(ser)?,
        )?,
        answers_from_json(&answers)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_account_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<AccountRecord, StorageError> {
    Ok(AccountRecord {
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        email: row.try_get("email").map_err(ser)?,
        password_hash: row.try_get("password_hash").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::{OptionToken, QuestionId};

    #[test]
    fn answers_json_round_trip() {
        let answers = AnswerMap::new()
            .with_answer(QuestionId::new(3), OptionToken::from_index(2).unwrap())
            .with_answer(QuestionId::new(1), OptionToken::from_index(0).unwrap());
        let raw = answers_to_json(&answers).unwrap();
        assert_eq!(raw, r#"{"1":"a","3":"c"}"#);
        assert_eq!(answers_from_json(&raw).unwrap(), answers);
    }

    #[test]
    fn bad_category_is_a_serialization_error() {
        assert!(matches!(
            parse_category("teens"),
            Err(StorageError::Serialization(_))
        ));
    }
}
