//! End-to-end manager tests against a live PostgreSQL instance.
//!
//! `#[ignore]`d by default; run with `cargo test -- --ignored` against a
//! migrated test database (see `taxo_db::test_fixtures`).

use uuid::Uuid;

use taxo_core::{
    CooccurrenceRepository, Error, SynonymRepository, TagRepository, UsageHistoryRepository,
};
use taxo_db::test_fixtures::TestDatabase;
use taxo_engine::TagManager;

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
async fn test_create_or_get_roundtrip() {
    let test_db = test_db().await;
    let manager = TagManager::new(test_db.db.clone());

    let raw = format!("  {} ", unique_name("Programación").to_uppercase());
    let (first, created) = manager.create_or_get(&raw, Some("ana")).await.unwrap();
    assert!(created);

    let (second, created_again) = manager.create_or_get(&raw, Some("ana")).await.unwrap();
    assert!(!created_again);
    assert_eq!(first.id, second.id);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_usage_count_matches_history_rows() {
    let test_db = test_db().await;
    let db = test_db.db.clone();
    let manager = TagManager::new(db.clone());

    let shared = unique_name("python");
    let first_only = unique_name("django");
    let second_only = unique_name("flask");

    let tags_a = manager
        .process_document_tags(
            Uuid::new_v4(),
            &[shared.clone(), first_only.clone()],
            Some("ana"),
        )
        .await
        .unwrap();
    let tags_b = manager
        .process_document_tags(
            Uuid::new_v4(),
            &[shared.clone(), second_only.clone()],
            Some("bob"),
        )
        .await
        .unwrap();

    for tag in tags_a.iter().chain(tags_b.iter()) {
        let metadata = db.tags.metadata(tag.id).await.unwrap().unwrap();
        let history_rows = db.history.count_for_tag(tag.id).await.unwrap();
        assert_eq!(
            metadata.usage_count, history_rows,
            "counter diverged from history for {}",
            tag.name
        );
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_document_sets_produce_pairwise_edges_only() {
    let test_db = test_db().await;
    let db = test_db.db.clone();
    let manager = TagManager::new(db.clone());

    let python = unique_name("python");
    let django = unique_name("django");
    let flask = unique_name("flask");

    manager
        .process_document_tags(Uuid::new_v4(), &[python.clone(), django.clone()], None)
        .await
        .unwrap();
    manager
        .process_document_tags(Uuid::new_v4(), &[python.clone(), flask.clone()], None)
        .await
        .unwrap();

    let python_tag = db.tags.get_by_name(&python).await.unwrap().unwrap();
    let django_tag = db.tags.get_by_name(&django).await.unwrap().unwrap();
    let flask_tag = db.tags.get_by_name(&flask).await.unwrap().unwrap();

    let (count, strength) = db
        .cooccurrence
        .edge(python_tag.id, django_tag.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);
    assert!((0.0..=1.0).contains(&strength));

    let (count, _) = db
        .cooccurrence
        .edge(python_tag.id, flask_tag.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);

    assert!(db
        .cooccurrence
        .edge(django_tag.id, flask_tag.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_merge_transfers_everything_and_leaves_synonym() {
    let test_db = test_db().await;
    let db = test_db.db.clone();
    let manager = TagManager::new(db.clone());

    let source_name = unique_name("js");
    let target_name = unique_name("javascript");
    let bystander = unique_name("react");

    manager
        .process_document_tags(Uuid::new_v4(), &[source_name.clone(), bystander.clone()], None)
        .await
        .unwrap();
    manager
        .process_document_tags(Uuid::new_v4(), &[target_name.clone()], None)
        .await
        .unwrap();

    let source = db.tags.get_by_name(&source_name).await.unwrap().unwrap();
    let target = db.tags.get_by_name(&target_name).await.unwrap().unwrap();
    let bystander_tag = db.tags.get_by_name(&bystander).await.unwrap().unwrap();

    let source_usage = db.tags.metadata(source.id).await.unwrap().unwrap().usage_count;
    let target_usage = db.tags.metadata(target.id).await.unwrap().unwrap().usage_count;

    manager.merge(source.id, target.id, Some("admin")).await.unwrap();

    // The source tag is gone and nothing references it.
    assert!(db.tags.get(source.id).await.unwrap().is_none());
    assert!(db
        .cooccurrence
        .edge(source.id, bystander_tag.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(db.history.count_for_tag(source.id).await.unwrap(), 0);

    // Usage was summed, the edge moved, and the old name redirects.
    let merged = db.tags.metadata(target.id).await.unwrap().unwrap();
    assert_eq!(merged.usage_count, source_usage + target_usage);
    assert!(db
        .cooccurrence
        .edge(target.id, bystander_tag.id)
        .await
        .unwrap()
        .is_some());
    let resolved = db.synonyms.resolve(&source_name).await.unwrap().unwrap();
    assert_eq!(resolved.id, target.id);
    assert_eq!(manager.canonical_form(&source_name).await.unwrap(), target.name);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_merge_into_itself_is_rejected() {
    let test_db = test_db().await;
    let manager = TagManager::new(test_db.db.clone());

    let (tag, _) = manager.create_or_get(&unique_name("rust"), None).await.unwrap();
    let err = manager.merge(tag.id, tag.id, None).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_validate_tag_list_collects_item_errors() {
    let test_db = test_db().await;
    let manager = TagManager::new(test_db.db.clone());

    let valid = unique_name("rust");
    let result = manager
        .validate_tag_list(
            &[
                valid.clone(),
                valid.to_uppercase(),
                "el".to_string(),
                "123".to_string(),
            ],
            10,
        )
        .await
        .unwrap();

    assert_eq!(result.valid, vec![valid]);
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors.iter().any(|e| e.message.contains("duplicate")));
    assert!(result.errors.iter().any(|e| e.input == "el"));
    assert!(result.errors.iter().any(|e| e.input == "123"));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_validate_tag_list_enforces_max_count() {
    let test_db = test_db().await;
    let manager = TagManager::new(test_db.db.clone());

    let raw: Vec<String> = (0..4).map(|i| format!("{}-{}", unique_name("tag"), i)).collect();
    let result = manager.validate_tag_list(&raw, 2).await.unwrap();

    assert_eq!(result.valid.len(), 2);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors.iter().all(|e| e.message.contains("limit")));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_suggest_finds_prefix_match() {
    let test_db = test_db().await;
    let db = test_db.db.clone();
    let manager = TagManager::new(db.clone());

    // Ensure a used "python"-named tag exists, then query a prefix of it.
    let python = unique_name("python");
    manager
        .process_document_tags(Uuid::new_v4(), &[python.clone()], None)
        .await
        .unwrap();

    let prefix: String = python.chars().take(5).collect();
    let suggestions = manager.suggest(&prefix, 5).await.unwrap();
    assert!(suggestions.iter().any(|s| s.name == python));
    assert!(suggestions.iter().all(|s| s.score > 0.0));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL test database"]
async fn test_related_ranks_by_strength() {
    let test_db = test_db().await;
    let db = test_db.db.clone();
    let manager = TagManager::new(db.clone());

    let django = unique_name("django");
    let rest = unique_name("rest-framework");
    let testing = unique_name("testing");

    manager
        .process_document_tags(Uuid::new_v4(), &[django.clone(), rest.clone()], None)
        .await
        .unwrap();
    manager
        .process_document_tags(Uuid::new_v4(), &[django.clone(), testing.clone()], None)
        .await
        .unwrap();

    // Pin the strengths so ranking depends on them alone.
    let django_tag = db.tags.get_by_name(&django).await.unwrap().unwrap();
    let rest_tag = db.tags.get_by_name(&rest).await.unwrap().unwrap();
    let testing_tag = db.tags.get_by_name(&testing).await.unwrap().unwrap();
    for (other, strength) in [(rest_tag.id, 0.9_f64), (testing_tag.id, 0.2_f64)] {
        let (a, b) = if django_tag.id < other {
            (django_tag.id, other)
        } else {
            (other, django_tag.id)
        };
        sqlx::query("UPDATE tag_cooccurrence SET strength = $3 WHERE tag1_id = $1 AND tag2_id = $2")
            .bind(a)
            .bind(b)
            .bind(strength)
            .execute(&db.pool)
            .await
            .unwrap();
    }

    let related = manager.related(&[django.clone()], 5).await.unwrap();
    let rest_pos = related.iter().position(|r| r.tag == rest).unwrap();
    let testing_pos = related.iter().position(|r| r.tag == testing).unwrap();
    assert!(rest_pos < testing_pos);
}
