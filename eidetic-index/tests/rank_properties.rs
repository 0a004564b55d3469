//! Property tests for similarity ranking.

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;

use eidetic_catalog::DirectoryCatalog;
use eidetic_index::{
    EMBEDDING_DIM, Embedder, Embedding, IndexConfig, Result, SearchEngine,
};

struct MockEmbedder;

fn mock_embedding(text: &str) -> Embedding {
    let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
    let mut components: Vec<f32> =
        (0..EMBEDDING_DIM).map(|i| ((hash.wrapping_add(i as u64)) as f32).sin()).collect();
    let norm = components.iter().map(|c| c * c).sum::<f32>().sqrt();
    for component in &mut components {
        *component /= norm;
    }
    Embedding::new(components)
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(mock_embedding(text))
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Build, load, and rank a corpus, then recompute each ranked entry's
/// similarity score from its file contents.
async fn ranked_scores(contents: &[String], query: &str) -> Vec<f32> {
    let temp = tempfile::tempdir().unwrap();
    let data_dir = temp.path().join("data");
    let notes_dir = temp.path().join("notes");
    std::fs::create_dir_all(&notes_dir).unwrap();
    for (i, text) in contents.iter().enumerate() {
        std::fs::write(notes_dir.join(format!("doc_{i}.md")), text).unwrap();
    }

    let catalog = Arc::new(DirectoryCatalog::open(&data_dir).await.unwrap());
    catalog.add_directory(&notes_dir).await.unwrap();
    let config = IndexConfig::builder().data_dir(&data_dir).build().unwrap();
    let engine = SearchEngine::builder()
        .config(config)
        .catalog(catalog)
        .embedder(Arc::new(MockEmbedder))
        .build()
        .unwrap();
    engine.refresh_corpus().await.unwrap();

    let outcome = engine.build_all().await.unwrap();
    assert!(outcome.is_complete());
    engine.load().await.unwrap();

    let query_embedding = mock_embedding(query);
    engine
        .rank(query)
        .await
        .unwrap()
        .iter()
        .map(|entry| {
            let text = std::fs::read_to_string(&entry.filepath).unwrap();
            query_embedding.cosine(&mock_embedding(&text)).unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn rank_returns_every_record_in_non_increasing_score_order(
        contents in proptest::collection::vec("[a-z ]{1,40}", 1..8),
        query in "[a-z ]{1,40}",
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let scores = rt.block_on(ranked_scores(&contents, &query));

        prop_assert_eq!(scores.len(), contents.len());
        for window in scores.windows(2) {
            prop_assert!(
                window[0] >= window[1],
                "scores not in descending order: {} < {}",
                window[0],
                window[1],
            );
        }
    }
}
