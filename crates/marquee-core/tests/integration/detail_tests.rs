//! Integration tests for the credits and movies detail stages.

use crate::integration::common::{
    CREDITS, MOVIES, MockCatalogClient, MockDocumentStore, RecordingReporter, credential,
    test_config,
};
use marquee_core::{
    AppError, DetailKind, DetailStage, FailurePolicy, SilentReporter, StageStats, UniqueIds,
};
use serde_json::json;

/// Only ids missing from the collection are fetched; the collection is
/// saved with the new record appended.
#[tokio::test]
async fn test_only_missing_ids_are_fetched() {
    let store = MockDocumentStore::new();
    store.insert(MOVIES, json!([{"id": 7}]));
    let client = MockCatalogClient::new();
    let ids = UniqueIds::from_backlog(&[7, 8, 7]);

    let stage = DetailStage::new(DetailKind::Movies, &test_config(1));
    let stats = stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(client.detail_calls(), vec![8]);
    assert_eq!(store.record_ids(MOVIES), vec![Some(7), Some(8)]);
    assert_eq!(
        stats,
        StageStats {
            already_stored: 1,
            fetched: 1,
            failed: 0,
            placeholders: 0,
        }
    );
}

/// Running the stage again with nothing new fetches nothing.
#[tokio::test]
async fn test_stage_is_idempotent() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    let ids = UniqueIds::from_backlog(&[1, 2, 3]);
    let stage = DetailStage::new(DetailKind::Movies, &test_config(1));

    stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();
    let second = stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(client.detail_calls(), vec![1, 2, 3]);
    assert_eq!(second.already_stored, 3);
    assert_eq!(second.fetched, 0);
    assert_eq!(store.records(MOVIES).len(), 3);
}

/// Under the placeholder policy a failed id gets `{"id": id}` and is never
/// requested again.
#[tokio::test]
async fn test_placeholder_policy_marks_failed_id_handled() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    client.fail_detail(8);
    let ids = UniqueIds::from_backlog(&[7, 8]);
    let config = test_config(1).with_failure_policy(FailurePolicy::Placeholder);
    let stage = DetailStage::new(DetailKind::Movies, &config);
    let reporter = RecordingReporter::new();

    let stats = stage
        .run(&store, &client, &credential(), &ids, &reporter)
        .await
        .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(stats.placeholders, 1);
    assert_eq!(reporter.count("record_failed:movies:8"), 1);
    assert_eq!(store.records(MOVIES)[1], json!({"id": 8}));

    client.heal(8);
    let stats = stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(stats.already_stored, 2);
    assert_eq!(client.detail_calls(), vec![7, 8]);
}

/// Under the retry policy nothing is appended for a failed id and the next
/// run requests it again.
#[tokio::test]
async fn test_retry_policy_refetches_failed_id() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    client.fail_detail(8);
    let ids = UniqueIds::from_backlog(&[7, 8]);
    let stage = DetailStage::new(DetailKind::Movies, &test_config(1));

    let stats = stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(store.record_ids(MOVIES), vec![Some(7)]);

    client.heal(8);
    let stats = stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(client.detail_calls(), vec![7, 8, 8]);
    assert_eq!(store.record_ids(MOVIES), vec![Some(7), Some(8)]);
}

/// The credits stage uses the related-set operation and its own collection.
#[tokio::test]
async fn test_credits_stage_fills_credits_collection() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    let ids = UniqueIds::from_backlog(&[3, 4]);

    DetailStage::new(DetailKind::Credits, &test_config(1))
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(client.credits_calls(), vec![3, 4]);
    assert!(client.detail_calls().is_empty());
    assert_eq!(store.record_ids(CREDITS), vec![Some(3), Some(4)]);
    assert!(store.get(MOVIES).is_none());
}

/// Documents served without an `id` are stamped so dedup holds next time.
#[tokio::test]
async fn test_documents_without_id_are_stamped() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    client.omit_ids();
    let ids = UniqueIds::from_backlog(&[5]);
    let stage = DetailStage::new(DetailKind::Credits, &test_config(1));

    stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();
    stage
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(client.credits_calls(), vec![5]);
    assert_eq!(
        store.records(CREDITS),
        vec![json!({"id": 5, "cast": [], "crew": []})]
    );
}

/// Stored records without an id never count as handling any id.
#[tokio::test]
async fn test_unkeyed_records_do_not_mark_ids_seen() {
    let store = MockDocumentStore::new();
    store.insert(MOVIES, json!([{}]));
    let client = MockCatalogClient::new();
    let ids = UniqueIds::from_backlog(&[8]);

    let stats = DetailStage::new(DetailKind::Movies, &test_config(1))
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(stats.fetched, 1);
    assert_eq!(store.record_ids(MOVIES), vec![None, Some(8)]);
}

/// With `flush_every = 2` and five new records the collection is saved after
/// records 2 and 4 and once more at the end.
#[tokio::test]
async fn test_periodic_flush() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    let ids = UniqueIds::from_backlog(&[1, 2, 3, 4, 5]);
    let config = test_config(1).with_flush_every(Some(2));
    let reporter = RecordingReporter::new();

    DetailStage::new(DetailKind::Movies, &config)
        .run(&store, &client, &credential(), &ids, &reporter)
        .await
        .unwrap();

    assert_eq!(store.save_count(MOVIES), 3);
    assert_eq!(reporter.count("stage_flushed:movies:2"), 1);
    assert_eq!(reporter.count("stage_flushed:movies:4"), 1);
    assert_eq!(store.records(MOVIES).len(), 5);
}

/// Without a flush interval the collection is saved exactly once.
#[tokio::test]
async fn test_single_save_without_flush_interval() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    let ids = UniqueIds::from_backlog(&[1, 2, 3, 4, 5]);
    let config = test_config(1).with_flush_every(None);
    let reporter = RecordingReporter::new();

    DetailStage::new(DetailKind::Movies, &config)
        .run(&store, &client, &credential(), &ids, &reporter)
        .await
        .unwrap();

    assert_eq!(store.save_count(MOVIES), 1);
    assert_eq!(reporter.count("stage_flushed"), 0);
}

/// Failed fetches under the retry policy don't count toward a flush.
#[tokio::test]
async fn test_failed_fetches_do_not_trigger_flush() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    client.fail_detail(1);
    client.fail_detail(2);
    let ids = UniqueIds::from_backlog(&[1, 2, 3]);
    let config = test_config(1).with_flush_every(Some(2));

    DetailStage::new(DetailKind::Movies, &config)
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(store.save_count(MOVIES), 1);
    assert_eq!(store.record_ids(MOVIES), vec![Some(3)]);
}

/// An undecodable collection aborts the stage before any fetch.
#[tokio::test]
async fn test_corrupt_collection_aborts_stage() {
    let store = MockDocumentStore::new();
    store.insert(MOVIES, json!({"not": "a list"}));
    let client = MockCatalogClient::new();
    let ids = UniqueIds::from_backlog(&[1]);

    let err = DetailStage::new(DetailKind::Movies, &test_config(1))
        .run(&store, &client, &credential(), &ids, &SilentReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CorruptDocument { .. }));
    assert!(client.calls().is_empty());
    assert_eq!(store.save_count(MOVIES), 0);
}

/// A document served under a different id is stored under the requested
/// one, so repeated runs neither refetch it nor duplicate ids.
#[tokio::test]
async fn test_mismatched_upstream_id_is_stored_once() {
    let store = MockDocumentStore::new();
    let client = MockCatalogClient::new();
    client.redirect(10, 11);
    let ids = UniqueIds::from_backlog(&[10, 11]);
    let stage = DetailStage::new(DetailKind::Movies, &test_config(1));

    for _ in 0..3 {
        stage
            .run(&store, &client, &credential(), &ids, &SilentReporter)
            .await
            .unwrap();
    }

    assert_eq!(client.detail_calls(), vec![10, 11]);
    assert_eq!(store.record_ids(MOVIES), vec![Some(10), Some(11)]);
    let records = store.records(MOVIES);
    assert_eq!(records[0]["upstream_id"], json!(11));
    assert_eq!(records[0]["title"], json!("Movie 11"));
}
