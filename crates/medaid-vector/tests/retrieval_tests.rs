//! End-to-end tests for the retrieval layer: ingest, replace, filter, rank.
//!
//! Each test builds its own store with a deterministic embedder.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use medaid_core::config::MedaidConfig;
use medaid_core::types::{Metadata, NewDocument};
use medaid_vector::{
    embedder_from_config, seed_first_aid, CollectionStore, FirstAidRetriever, HashEmbedding,
    MetadataFilter, RandomEmbedding, VectorError,
};

// =============================================================================
// Helpers
// =============================================================================

fn meta(value: serde_json::Value) -> Metadata {
    value.as_object().cloned().unwrap()
}

fn store() -> CollectionStore {
    CollectionStore::new(HashEmbedding::new(96))
}

/// Every stored id, in ranking order.
async fn stored_ids(store: &CollectionStore, name: &str) -> Vec<String> {
    let count = store.document_count(name).unwrap();
    let hits = store
        .query_collection(name, "order probe", count, &MetadataFilter::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), count);
    hits.into_iter().map(|h| h.document.id).collect()
}

// =============================================================================
// Ingestion
// =============================================================================

#[tokio::test]
async fn every_batch_id_appears_exactly_once() {
    let store = store();
    store.create_collection("c", Metadata::new()).unwrap();

    store
        .add_documents(
            "c",
            (0..6)
                .map(|i| NewDocument::new(format!("doc-{}", i), format!("original {}", i)))
                .collect(),
        )
        .await
        .unwrap();

    let batch: Vec<NewDocument> = vec![
        NewDocument::new("doc-1", "updated 1"),
        NewDocument::new("doc-9", "new 9"),
        NewDocument::new("doc-4", "updated 4"),
        NewDocument::new("doc-9", "newer 9"),
    ];
    store.add_documents("c", batch).await.unwrap();

    let ids = stored_ids(&store, "c").await;
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    for id in ["doc-0", "doc-1", "doc-2", "doc-3", "doc-4", "doc-5", "doc-9"] {
        assert!(ids.iter().any(|i| i == id), "missing {}", id);
    }
    assert_eq!(store.document_count("c"), Some(7));
    assert_eq!(store.get_document("c", "doc-9").unwrap().text, "newer 9");
    assert_eq!(store.get_document("c", "doc-4").unwrap().text, "updated 4");
}

#[tokio::test]
async fn untouched_documents_keep_relative_order() {
    let store = store();
    store.create_collection("c", Metadata::new()).unwrap();

    let same = "identical guidance text";
    store
        .add_documents(
            "c",
            ["a", "b", "c", "d"]
                .iter()
                .map(|id| NewDocument::new(*id, same))
                .collect(),
        )
        .await
        .unwrap();
    store
        .add_documents("c", vec![NewDocument::new("b", same), NewDocument::new("e", same)])
        .await
        .unwrap();

    // All documents share one embedding, so every distance ties and the
    // ranking exposes stored order.
    let hits = store
        .query_collection("c", same, 10, &MetadataFilter::new())
        .await
        .unwrap();
    let order: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
    assert_eq!(order, vec!["a", "c", "d", "b", "e"]);
}

#[tokio::test]
async fn ingest_into_missing_collection_is_not_found() {
    let store = store();
    let err = store
        .add_documents("ghost", vec![NewDocument::new("1", "text")])
        .await
        .unwrap_err();
    assert!(matches!(err, VectorError::CollectionNotFound(ref n) if n == "ghost"));
    assert!(store.get_collection("ghost").is_none());
}

#[tokio::test]
async fn blank_document_does_not_abort_batch() {
    let store = store();
    store.create_collection("c", Metadata::new()).unwrap();

    let report = store
        .add_documents(
            "c",
            vec![NewDocument::new("a", "ok"), NewDocument::new("b", "")],
        )
        .await
        .unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(store.get_document("c", "a").unwrap().text, "ok");
    assert_eq!(store.get_document("c", "b").unwrap().text, "");
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn query_results_bounded_and_sorted() {
    let store = store();
    seed_first_aid(&store, "first_aid").await.unwrap();

    for limit in [1, 3, 5, 50] {
        let hits = store
            .query_collection("first_aid", "my hand got burned", limit, &MetadataFilter::new())
            .await
            .unwrap();
        assert!(hits.len() <= limit);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}

#[tokio::test]
async fn query_missing_collection_does_not_panic() {
    let store = store();
    let result = store
        .query_collection("ghost", "anything", 5, &MetadataFilter::new())
        .await;
    assert!(matches!(result, Err(ref e) if e.is_not_found()));

    let retriever = FirstAidRetriever::new(Arc::new(store), "ghost");
    let hits = retriever
        .relevant_guides("anything", None, &MetadataFilter::new())
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn filter_returns_only_matching_type() {
    let store = store();
    store.create_collection("c", Metadata::new()).unwrap();
    store
        .add_documents(
            "c",
            vec![
                NewDocument::new("1", "hold under cool water")
                    .with_metadata(meta(json!({"type": "burn"}))),
                NewDocument::new("2", "press firmly to stop bleeding")
                    .with_metadata(meta(json!({"type": "cut"}))),
            ],
        )
        .await
        .unwrap();

    let filter: MetadataFilter = serde_json::from_value(json!({"type": "burn"})).unwrap();
    let hits = store
        .query_collection("c", "press firmly to stop bleeding", 5, &filter)
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.id, "1");
}

#[tokio::test]
async fn documents_without_metadata_fail_non_empty_filters() {
    let store = store();
    store.create_collection("c", Metadata::new()).unwrap();
    store
        .add_documents("c", vec![NewDocument::new("bare", "no metadata here")])
        .await
        .unwrap();

    let hits = store
        .query_collection(
            "c",
            "no metadata here",
            5,
            &MetadataFilter::new().require("type", "burn"),
        )
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn random_embeddings_still_return_ranked_results() {
    let store = CollectionStore::new(RandomEmbedding::seeded(32, 11));
    seed_first_aid(&store, "first_aid").await.unwrap();

    let hits = store
        .query_collection("first_aid", "choking", 4, &MetadataFilter::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), 4);
    assert!(hits.iter().all(|h| h.distance.is_finite()));
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn store_built_from_config_round_trip() {
    let config = MedaidConfig::default();
    let embedder = embedder_from_config(&config.embedding).unwrap();
    let store = Arc::new(CollectionStore::new_dyn(embedder));
    assert_eq!(store.dimensions(), config.embedding.dimensions);

    seed_first_aid(&store, &config.retrieval.first_aid_collection)
        .await
        .unwrap();
    let retriever = FirstAidRetriever::from_config(Arc::clone(&store), &config.retrieval);
    let context = retriever.context_for("bee sting swelling").await.unwrap();
    assert!(!context.is_empty());

    drop(retriever);
    let store = Arc::try_unwrap(store).expect("retriever dropped");
    assert_eq!(store.shutdown(), medaid_vector::first_aid_guides().len());
}
