//! Similarity ranking over the loaded records.

use tracing::{debug, error};

use eidetic_catalog::CatalogEntry;

use crate::error::Result;
use crate::store::EmbeddingStore;

/// Rank every loaded record by similarity to `query`, best first.
///
/// The whole call fails on a service failure, a malformed query vector,
/// an unreadable or unparsable record, or a dimension mismatch; the
/// caller never sees a silently partial ranking. Equal scores keep the
/// loaded-list order.
pub(crate) async fn rank_loaded(store: &EmbeddingStore, query: &str) -> Result<Vec<CatalogEntry>> {
    let query_embedding = store.embedder().embed(query).await?;
    // Checked before touching the loaded list so an unusable query
    // fails even when nothing is loaded.
    query_embedding.ensure_well_formed()?;
    let loaded = store.loaded().await;
    debug!(records = loaded.len(), "ranking loaded records");

    let mut scored = Vec::with_capacity(loaded.len());
    for path in &loaded {
        let record = match store.read_record(path).await {
            Ok(record) => record,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read embedding record");
                return Err(e);
            }
        };
        let score = query_embedding.cosine(&record.embedding)?;
        scored.push((score, record.source_path));
    }

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    Ok(scored.into_iter().map(|(_, path)| CatalogEntry::from_path(path)).collect())
}
