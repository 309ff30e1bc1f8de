use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use assess_core::QuestionBank;
use assess_core::model::{OptionToken, TestCategory, UserId};
use services::{AppServices, Credentials, SessionEngine, SessionError, SubmitOutcome};

/// Print every test in the bank, or just one category.
pub fn catalog(
    bank: &QuestionBank,
    category: Option<TestCategory>,
    out: &mut impl Write,
) -> Result<()> {
    for test in bank.tests() {
        if category.is_some_and(|c| c != test.category()) {
            continue;
        }
        writeln!(out, "[{}] {}", test.category(), test.title())?;
        writeln!(out, "    {}", test.description())?;
        for section in test.sections() {
            writeln!(
                out,
                "    - {} ({} questions)",
                section.title(),
                section.questions().len()
            )?;
        }
        writeln!(out, "    total: {} questions", test.question_count())?;
    }
    Ok(())
}

pub struct TakeArgs {
    pub email: String,
    pub password: Option<String>,
    pub register: bool,
    pub category: TestCategory,
}

/// Run one attempt on the terminal: authenticate, answer, submit.
pub async fn take(
    services: &AppServices,
    args: TakeArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let engine = services.engine();
    engine.enter().await;
    engine.set_register_mode(args.register);

    let password = match args.password {
        Some(password) => password,
        None => prompt(input, out, "password: ")?,
    };
    let user = engine
        .authenticate(Credentials::new(args.email, password))
        .await
        .context("authentication failed")?;
    writeln!(out, "signed in as {} ({})", user.email, user.id)?;

    engine.select_test(args.category)?;
    answer_questions(&engine, input, out)?;
    submit_with_retry(&engine, input, out).await
}

fn answer_questions(
    engine: &SessionEngine,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let Some(session) = engine.session() else {
        bail!("no test in progress");
    };
    let test = session.test();
    writeln!(out, "{}", test.title())?;

    for section in test.sections() {
        writeln!(out, "\n== {} ==", section.title())?;
        for question in section.questions() {
            writeln!(out, "\n{}. {}", question.id(), question.prompt())?;
            for (token, text) in question.tokens() {
                writeln!(out, "   {token}) {text}")?;
            }
            loop {
                let line = prompt(input, out, "answer (blank to skip): ")?;
                if line.is_empty() {
                    break;
                }
                let recorded = match line.parse::<OptionToken>() {
                    Ok(token) => engine
                        .answer(question.id(), token)
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                match recorded {
                    Ok(()) => break,
                    Err(message) => writeln!(out, "   {message}")?,
                }
            }
        }
    }

    if let Some(progress) = engine.progress() {
        writeln!(out, "\nanswered {} of {}", progress.answered, progress.total)?;
    }
    Ok(())
}

async fn submit_with_retry(
    engine: &SessionEngine,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    loop {
        match engine.submit().await {
            Ok(SubmitOutcome::Submitted { result_id, score }) => {
                writeln!(
                    out,
                    "Score: {}/{} ({}%)  result #{result_id}",
                    score.correct, score.total, score.percentage
                )?;
                return Ok(());
            }
            Ok(SubmitOutcome::AlreadySubmitted | SubmitOutcome::InFlight) => return Ok(()),
            Err(SessionError::Persistence(err)) => {
                writeln!(out, "could not save your result: {err}")?;
                let again = prompt(input, out, "retry? [y/N] ")?;
                if !again.eq_ignore_ascii_case("y") {
                    bail!("result was not saved");
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Print the newest results for one user.
pub async fn results(
    services: &AppServices,
    user_id: UserId,
    limit: u32,
    out: &mut impl Write,
) -> Result<()> {
    let rows = services
        .results()
        .list_results_for_user(&user_id, limit)
        .await
        .context("listing results")?;
    if rows.is_empty() {
        writeln!(out, "no results for {user_id}")?;
        return Ok(());
    }
    for row in rows {
        let score = row.score();
        writeln!(
            out,
            "#{}  {}  {:<6}  {}/{} ({}%)",
            row.id(),
            row.created_at().format("%Y-%m-%d %H:%M"),
            row.category(),
            score.correct,
            score.total,
            score.percentage
        )?;
    }
    Ok(())
}

/// Read one trimmed line; end of input is an error.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<String> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("unexpected end of input");
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn catalog_lists_both_tests() {
        let bank = QuestionBank::builtin().unwrap();
        let mut out = Vec::new();
        catalog(&bank, None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[kids] Kids Grammar Test"));
        assert!(text.contains("[adults] Advanced Grammar Test"));
        assert!(text.contains("total: 5 questions"));
        assert!(text.contains("total: 10 questions"));
    }

    #[test]
    fn catalog_filters_by_category() {
        let bank = QuestionBank::builtin().unwrap();
        let mut out = Vec::new();
        catalog(&bank, Some(TestCategory::Adults), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Kids"));
        assert!(text.contains("Advanced Grammar Test"));
    }

    #[tokio::test]
    async fn take_records_answers_and_saves_once() {
        let services = AppServices::in_memory().unwrap();
        let kids = services.bank().test(TestCategory::Kids).unwrap();
        let mut script = String::from("secret-pw\n");
        for question in kids.questions() {
            // One bad entry first, then the right letter in upper case.
            script.push_str("?\n");
            script.push(question.correct_token().as_char().to_ascii_uppercase());
            script.push('\n');
        }

        let mut input = Cursor::new(script);
        let mut out = Vec::new();
        take(
            &services,
            TakeArgs {
                email: "cli@example.com".into(),
                password: None,
                register: true,
                category: TestCategory::Kids,
            },
            &mut input,
            &mut out,
        )
        .await
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("answered 5 of 5"));
        assert!(text.contains("Score: 5/5 (100%)"));
    }

    #[tokio::test]
    async fn take_fails_on_bad_credentials() {
        let services = AppServices::in_memory().unwrap();
        let mut input = Cursor::new(String::new());
        let mut out = Vec::new();
        let err = take(
            &services,
            TakeArgs {
                email: "nobody@example.com".into(),
                password: Some("secret-pw".into()),
                register: false,
                category: TestCategory::Kids,
            },
            &mut input,
            &mut out,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("authentication failed"));
    }

    #[tokio::test]
    async fn results_reports_empty_history() {
        let services = AppServices::in_memory().unwrap();
        let mut out = Vec::new();
        results(&services, UserId::new("nobody"), 5, &mut out)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no results for nobody\n");
    }
}
