//! Integration tests for the Postgres karma store.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use forge_karma::{
    apply_karma_delta, DatabasePool, KarmaDelta, KarmaEngine, KarmaReason, KarmaTransaction,
    UserKarmaState,
};
use sqlx::PgPool;
use tokio::sync::OnceCell;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Get a pool with the karma schema bootstrapped, or skip if no test DB is available.
async fn test_db() -> Option<DatabasePool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    let db = DatabasePool::from_pool(pool);

    // Concurrent CREATE TABLE IF NOT EXISTS can collide, so bootstrap once per run
    SCHEMA
        .get_or_try_init(|| async { db.init_schema().await })
        .await
        .ok()?;

    Some(db)
}

/// Unique user id per test; tests run in parallel against one database
fn user(name: &str) -> String {
    format!("{}_{}", name, uuid::Uuid::new_v4().simple())
}

async fn karma_score(db: &DatabasePool, user_id: &str) -> i64 {
    db.karma()
        .get_state(user_id)
        .await
        .unwrap()
        .map(|s| s.karma_score)
        .unwrap()
}

#[tokio::test]
async fn apply_writes_ledger_and_aggregate_on_commit() {
    let Some(db) = test_db().await else {
        return;
    };
    let user_id = user("author");
    db.karma().ensure_user(&user_id).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    apply_karma_delta(
        &mut tx,
        KarmaDelta::new(&user_id, 6, KarmaReason::ForumPostVote).in_squad("squad_a"),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(karma_score(&db, &user_id).await, 6);
    let ledger = db.karma().get_ledger(&user_id, 10).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].reason, KarmaReason::ForumPostVote);
    assert_eq!(ledger[0].squad_id.as_deref(), Some("squad_a"));
}

#[tokio::test]
async fn zero_delta_performs_no_writes() {
    let Some(db) = test_db().await else {
        return;
    };
    let user_id = user("author");
    db.karma().ensure_user(&user_id).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    apply_karma_delta(&mut tx, KarmaDelta::new(&user_id, 0, KarmaReason::ForumPostVote))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(karma_score(&db, &user_id).await, 0);
    assert!(db.karma().get_ledger(&user_id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn rollback_discards_both_writes() {
    let Some(db) = test_db().await else {
        return;
    };
    let user_id = user("author");
    db.karma().ensure_user(&user_id).await.unwrap();

    let mut tx = db.begin().await.unwrap();
    apply_karma_delta(&mut tx, KarmaDelta::new(&user_id, 9, KarmaReason::RoadmapVote))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(karma_score(&db, &user_id).await, 0);
    assert!(db.karma().get_ledger(&user_id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_user_increment_fails() {
    let Some(db) = test_db().await else {
        return;
    };

    let mut tx = db.begin().await.unwrap();
    let result = tx.increment_karma_score("no_such_user", 3).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn unknown_user_delta_propagates_database_error() {
    let Some(db) = test_db().await else {
        return;
    };

    let mut tx = db.begin().await.unwrap();
    let err = apply_karma_delta(&mut tx, KarmaDelta::new("no_such_user", 3, KarmaReason::RoadmapVote))
        .await
        .unwrap_err();

    // Ledger foreign key rejects the insert; the sqlx error is passed through untouched
    assert!(err.downcast_ref::<sqlx::Error>().is_some());
}

#[tokio::test]
async fn concurrent_deltas_for_same_user_are_not_lost() {
    let Some(db) = test_db().await else {
        return;
    };
    let user_id = user("author");
    db.karma().ensure_user(&user_id).await.unwrap();
    let db = std::sync::Arc::new(db);

    let handles: Vec<_> = [5i64, -2]
        .into_iter()
        .map(|points| {
            let db = db.clone();
            let user_id = user_id.clone();
            tokio::spawn(async move {
                let mut tx = db.begin().await?;
                apply_karma_delta(
                    &mut tx,
                    KarmaDelta::new(user_id, points, KarmaReason::ForumPostVote),
                )
                .await?;
                tx.commit().await?;
                anyhow::Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(karma_score(&db, &user_id).await, 3);
    let ledger = db.karma().get_ledger(&user_id, 10).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(UserKarmaState::fold(&user_id, &ledger).karma_score, 3);
}

#[tokio::test]
async fn roadmap_reward_through_engine() {
    let Some(db) = test_db().await else {
        return;
    };
    let user_id = user("member");
    db.karma().ensure_user(&user_id).await.unwrap();
    let engine = KarmaEngine::default();

    let mut tx = db.begin().await.unwrap();
    let points = engine
        .reward_roadmap_vote(&mut tx, &user_id, "squad_a")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(points, 10);
    assert_eq!(karma_score(&db, &user_id).await, 10);
}
