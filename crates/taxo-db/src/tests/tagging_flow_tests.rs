//! Repository-level tests for the tagging data flow: idempotent tag
//! creation, pairwise cooccurrence edges, and merge-time edge folding.

use chrono::Utc;
use uuid::Uuid;

use crate::test_fixtures::TestDatabase;
use crate::{CooccurrenceRepository, Error, SynonymRepository, TagRepository};

/// Unique tag name per run to avoid collisions between test invocations.
fn unique_name(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix,
        Uuid::new_v4().to_string().split('-').next().unwrap()
    )
}

/// Load .env (DATABASE_URL) and connect to the test database.
async fn test_db() -> TestDatabase {
    dotenvy::dotenv().ok();
    TestDatabase::new().await
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_create_or_get_is_idempotent() {
    let test_db = test_db().await;
    let tags = &test_db.db.tags;

    let name = unique_name("rust");
    let (first, created_first) = tags.create_or_get(&name, Some("tester")).await.unwrap();
    assert!(created_first);

    // Same name, different case: same row, no second insert.
    let (second, created_second) = tags
        .create_or_get(&name.to_uppercase(), None)
        .await
        .unwrap();
    assert!(!created_second);
    assert_eq!(first.id, second.id);

    let metadata = tags.metadata(first.id).await.unwrap().unwrap();
    assert_eq!(metadata.usage_count, 0);
    assert_eq!(metadata.created_by.as_deref(), Some("tester"));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_document_tag_sets_produce_pairwise_edges() {
    let test_db = test_db().await;
    let db = &test_db.db;

    let (python, _) = db.tags.create_or_get(&unique_name("python"), None).await.unwrap();
    let (django, _) = db.tags.create_or_get(&unique_name("django"), None).await.unwrap();
    let (flask, _) = db.tags.create_or_get(&unique_name("flask"), None).await.unwrap();

    // Two documents: {python, django} then {python, flask}.
    for pair in [[python.id, django.id], [python.id, flask.id]] {
        let mut tx = db.pool.begin().await.unwrap();
        let now = Utc::now();
        for id in pair {
            db.tags.increment_usage_tx(&mut tx, id, now).await.unwrap();
        }
        db.cooccurrence
            .update_from_document_tags_tx(&mut tx, &pair)
            .await
            .unwrap();
        tx.commit().await.unwrap();
    }

    let (count, strength) = db.cooccurrence.edge(python.id, django.id).await.unwrap().unwrap();
    assert_eq!(count, 1);
    assert!((0.0..=1.0).contains(&strength));

    let (count, _) = db.cooccurrence.edge(python.id, flask.id).await.unwrap().unwrap();
    assert_eq!(count, 1);

    assert!(db.cooccurrence.edge(django.id, flask.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_fold_into_leaves_no_source_edges() {
    let test_db = test_db().await;
    let db = &test_db.db;

    let (a, _) = db.tags.create_or_get(&unique_name("a"), None).await.unwrap();
    let (b, _) = db.tags.create_or_get(&unique_name("b"), None).await.unwrap();
    let (c, _) = db.tags.create_or_get(&unique_name("c"), None).await.unwrap();

    let mut tx = db.pool.begin().await.unwrap();
    db.cooccurrence
        .update_from_document_tags_tx(&mut tx, &[a.id, b.id, c.id])
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.pool.begin().await.unwrap();
    db.cooccurrence.fold_into_tx(&mut tx, a.id, b.id).await.unwrap();
    db.cooccurrence.recompute_for_tag_tx(&mut tx, b.id).await.unwrap();
    tx.commit().await.unwrap();

    // The (a, c) edge folded onto (b, c); nothing references a anymore.
    assert!(db.cooccurrence.edge(a.id, b.id).await.unwrap().is_none());
    assert!(db.cooccurrence.edge(a.id, c.id).await.unwrap().is_none());
    let (count, _) = db.cooccurrence.edge(b.id, c.id).await.unwrap().unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_synonym_create_and_resolve() {
    let test_db = test_db().await;
    let db = &test_db.db;

    let (main, _) = db.tags.create_or_get(&unique_name("javascript"), None).await.unwrap();
    let alias = unique_name("js");

    let mut tx = db.pool.begin().await.unwrap();
    db.synonyms
        .create_tx(&mut tx, main.id, &main.name, &alias, Some("admin"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let resolved = db.synonyms.resolve(&alias).await.unwrap().unwrap();
    assert_eq!(resolved.id, main.id);

    // A synonym equal to the main tag's own name is rejected before write.
    let mut tx = db.pool.begin().await.unwrap();
    let err = db
        .synonyms
        .create_tx(&mut tx, main.id, &main.name, &main.name, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    tx.rollback().await.unwrap();
}
