use assess_core::Score;
use assess_core::model::{AnswerMap, NewTestResult, OptionToken, QuestionId, TestCategory, UserId};
use assess_core::time::{fixed_clock, fixed_now};
use chrono::Duration;
use storage::repository::{AccountRepository, NewAccount, ResultRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn token(c: char) -> OptionToken {
    OptionToken::from_letter(c).unwrap()
}

fn sample_result(user: &str, correct: u32) -> NewTestResult {
    let answers = AnswerMap::new()
        .with_answer(QuestionId::new(1), token('b'))
        .with_answer(QuestionId::new(4), token('a'));
    NewTestResult::new(
        UserId::new(user),
        TestCategory::Kids,
        Score::from_counts(correct, 5),
        answers,
    )
}

#[tokio::test]
async fn sqlite_round_trips_results() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_results?mode=memory&cache=shared")
        .await
        .expect("connect")
        .with_clock(fixed_clock());
    repo.migrate().await.expect("migrate");

    let written = sample_result("user-1", 4);
    let id = repo.write_result(&written).await.expect("write");

    let stored = repo.get_result(id).await.expect("fetch");
    assert_eq!(stored.id(), id);
    assert_eq!(stored.user_id(), &UserId::new("user-1"));
    assert_eq!(stored.category(), TestCategory::Kids);
    assert_eq!(
        stored.score(),
        Score {
            correct: 4,
            total: 5,
            percentage: 80
        }
    );
    assert_eq!(stored.answers(), &written.answers);
    assert_eq!(stored.created_at(), fixed_now());
}

#[tokio::test]
async fn sqlite_never_merges_repeated_writes() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_append?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let result = sample_result("user-2", 2);
    let first = repo.write_result(&result).await.unwrap();
    let second = repo.write_result(&result).await.unwrap();
    assert_ne!(first, second);

    let rows = repo
        .list_results_for_user(&UserId::new("user-2"), 10)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn sqlite_lists_newest_first_per_user() {
    let mut clock = fixed_clock();
    let base = SqliteRepository::connect("sqlite:file:memdb_listing?mode=memory&cache=shared")
        .await
        .expect("connect");
    base.migrate().await.expect("migrate");

    let older = base
        .clone()
        .with_clock(clock)
        .write_result(&sample_result("user-3", 1))
        .await
        .unwrap();
    clock.advance(Duration::minutes(10));
    let newer = base
        .clone()
        .with_clock(clock)
        .write_result(&sample_result("user-3", 5))
        .await
        .unwrap();
    base.clone()
        .with_clock(clock)
        .write_result(&sample_result("someone-else", 3))
        .await
        .unwrap();

    let rows = base
        .list_results_for_user(&UserId::new("user-3"), 10)
        .await
        .unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![newer, older]);
    assert!(rows[0].score().is_perfect());
}

#[tokio::test]
async fn sqlite_missing_result_is_not_found() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_missing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let err = repo
        .get_result(assess_core::model::ResultId::new(404))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_accounts_enforce_unique_email() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_accounts?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Migrations are idempotent.
    repo.migrate().await.expect("migrate twice");

    let account = NewAccount {
        user_id: UserId::new("uid-a"),
        email: "learner@example.com".into(),
        password_hash: "$argon2id$stub".into(),
    };
    repo.insert_account(&account).await.unwrap();

    let dup = NewAccount {
        user_id: UserId::new("uid-b"),
        ..account.clone()
    };
    assert!(matches!(
        repo.insert_account(&dup).await,
        Err(StorageError::Conflict)
    ));

    let found = repo
        .find_account_by_email("learner@example.com")
        .await
        .unwrap()
        .expect("account exists");
    assert_eq!(found.user_id, account.user_id);
    assert!(
        repo.find_account_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none()
    );
}
