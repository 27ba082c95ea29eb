mod helpers;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use rasterq::application::ports::{CollectionConfig, VectorStore};
use rasterq::application::services::{SemanticIndexCache, SemanticIndexError};
use rasterq::domain::FragmentMetadata;
use rasterq::infrastructure::embeddings::HashingEmbedder;
use rasterq::infrastructure::persistence::InMemoryVectorStore;
use rasterq::infrastructure::text_processing::RecursiveCharacterSplitter;

use helpers::{CountingEmbedder, FlakyEmbedder};

fn splitter() -> Arc<RecursiveCharacterSplitter> {
    Arc::new(RecursiveCharacterSplitter::new(500, 100))
}

#[tokio::test]
async fn given_concurrent_first_callers_when_getting_index_then_embedder_is_probed_once() {
    let embedder = Arc::new(CountingEmbedder::new(8).with_delay(Duration::from_millis(50)));
    let cache = Arc::new(SemanticIndexCache::new(
        Arc::clone(&embedder) as _,
        Arc::new(InMemoryVectorStore::new()),
        splitter(),
    ));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_create().await.unwrap() })
        })
        .collect();

    let mut indexes = Vec::new();
    for handle in handles {
        indexes.push(handle.await.unwrap());
    }

    assert_eq!(embedder.calls(), 1);
    assert!(indexes.iter().all(|index| Arc::ptr_eq(index, &indexes[0])));
    assert_eq!(indexes[0].dimensions(), 8);
}

#[tokio::test]
async fn given_constructed_index_when_requested_again_then_no_further_probe() {
    let embedder = Arc::new(CountingEmbedder::new(4));
    let cache = SemanticIndexCache::new(
        Arc::clone(&embedder) as _,
        Arc::new(InMemoryVectorStore::new()),
        splitter(),
    );

    assert!(!cache.is_constructed());
    cache.get_or_create().await.unwrap();
    cache.get_or_create().await.unwrap();

    assert!(cache.is_constructed());
    assert_eq!(embedder.calls(), 1);
}

#[tokio::test]
async fn given_failing_backend_when_constructing_then_error_is_not_cached() {
    let embedder = Arc::new(FlakyEmbedder::new(4, 1));
    let cache = SemanticIndexCache::new(
        Arc::clone(&embedder) as _,
        Arc::new(InMemoryVectorStore::new()),
        splitter(),
    );

    let first = cache.get_or_create().await;
    let second = cache.get_or_create().await;

    assert!(matches!(first, Err(SemanticIndexError::Embedding(_))));
    assert!(second.is_ok());
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test]
async fn given_existing_collection_of_other_size_when_constructing_then_reports_mismatch() {
    let store = Arc::new(InMemoryVectorStore::new());
    store
        .create_collection(&CollectionConfig::new(16))
        .await
        .unwrap();
    let cache = SemanticIndexCache::new(Arc::new(CountingEmbedder::new(8)), store, splitter());

    let result = cache.get_or_create().await;

    assert!(matches!(
        result,
        Err(SemanticIndexError::DimensionMismatch {
            existing: 16,
            probed: 8
        })
    ));
}

#[tokio::test]
async fn given_long_document_when_added_then_it_is_chunked_and_searchable() {
    let cache = SemanticIndexCache::new(
        Arc::new(HashingEmbedder::new(128).unwrap()),
        Arc::new(InMemoryVectorStore::new()),
        splitter(),
    );
    let index = cache.get_or_create().await.unwrap();

    let text = "grayscale conversion of uploaded photos. ".repeat(30);
    let mut metadata = FragmentMetadata::new();
    metadata.insert("source".to_string(), json!("manual"));

    let ids = index.add_document(&text, metadata).await.unwrap();
    index
        .add("weather report for tomorrow", FragmentMetadata::new())
        .await
        .unwrap();

    assert_eq!(ids.len(), 3);
    let hits = index.search("grayscale photos", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.fragment.metadata["source"] == "manual"));
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn given_zero_top_k_when_searching_then_returns_nothing() {
    let cache = SemanticIndexCache::new(
        Arc::new(HashingEmbedder::new(16).unwrap()),
        Arc::new(InMemoryVectorStore::new()),
        splitter(),
    );
    let index = cache.get_or_create().await.unwrap();
    index.add("something", FragmentMetadata::new()).await.unwrap();

    assert!(index.search("something", 0).await.unwrap().is_empty());
}
