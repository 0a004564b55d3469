//! Stateless substring search over the corpus.
//!
//! [`ScanIndex`] keeps no derived structure: every lookup re-reads file
//! contents through the catalog, so results always reflect what is on
//! disk. Matching is case-insensitive and each hit carries a bounded
//! context window around the first occurrence in its file.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use eidetic_catalog::{Catalog, CatalogEntry};

use crate::error::Result;

/// Number of bytes of context kept on each side of a match.
const CONTEXT_MARGIN: usize = 25;

/// A substring match inside one corpus file.
///
/// `context` is a slice of the lowercased file contents;
/// `keyword_index` and `keyword_length` are byte offsets locating the
/// match within `context`, not within the whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Path of the matching file.
    pub filepath: PathBuf,
    /// Base name of the matching file.
    pub filename: String,
    /// Lowercased text surrounding the match.
    pub context: String,
    /// Byte offset of the match within `context`.
    pub keyword_index: usize,
    /// Byte length of the matched query within `context`.
    pub keyword_length: usize,
}

/// Case-insensitive substring search over a fixed corpus snapshot.
pub struct ScanIndex {
    catalog: Arc<dyn Catalog>,
    corpus: Vec<CatalogEntry>,
}

impl ScanIndex {
    /// Create an index over a corpus snapshot.
    pub fn new(catalog: Arc<dyn Catalog>, corpus: Vec<CatalogEntry>) -> Self {
        Self { catalog, corpus }
    }

    /// The corpus this index scans.
    pub fn corpus(&self) -> &[CatalogEntry] {
        &self.corpus
    }

    /// Find `query` in every corpus file, returning at most one hit per
    /// file, in corpus order.
    ///
    /// An empty query matches every readable file at offset zero. A file
    /// that cannot be read is treated as unavailable and skipped with a
    /// warning; it never matches as if it were empty text.
    pub async fn lookup(&self, query: &str) -> Result<Vec<SearchHit>> {
        let needle = query.to_lowercase();
        let mut hits = Vec::new();

        for entry in &self.corpus {
            let contents = match self.catalog.read_file(&entry.filepath).await {
                Ok(contents) => contents,
                Err(e) => {
                    warn!(
                        path = %entry.filepath.display(),
                        error = %e,
                        "skipping unreadable file"
                    );
                    continue;
                }
            };
            if let Some(hit) = scan_file(entry, &contents, &needle) {
                hits.push(hit);
            }
        }

        debug!(query_len = query.len(), hits = hits.len(), "lookup finished");
        Ok(hits)
    }
}

/// Scan one file for the lowered query, producing a hit with a bounded
/// context window around the first occurrence.
fn scan_file(entry: &CatalogEntry, contents: &str, needle: &str) -> Option<SearchHit> {
    let haystack = contents.to_lowercase();
    let match_start = haystack.find(needle)?;

    let left = floor_char_boundary(&haystack, match_start.saturating_sub(CONTEXT_MARGIN));
    let right = ceil_char_boundary(
        &haystack,
        (match_start + needle.len() + CONTEXT_MARGIN).min(haystack.len()),
    );
    let context = haystack[left..right].to_string();

    // The window was cut around the first occurrence, so re-finding the
    // needle inside it lands on that same occurrence.
    let keyword_index = context.find(needle)?;

    Some(SearchHit {
        filepath: entry.filepath.clone(),
        filename: entry.filename.clone(),
        context,
        keyword_index,
        keyword_length: needle.len(),
    })
}

/// Snap `index` down to the nearest char boundary of `text`.
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Snap `index` up to the nearest char boundary of `text`.
fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    use async_trait::async_trait;
    use eidetic_catalog::CatalogError;

    /// In-memory catalog with optional unreadable paths.
    struct StaticCatalog {
        contents: HashMap<PathBuf, String>,
        unreadable: Vec<PathBuf>,
    }

    impl StaticCatalog {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                contents: files
                    .iter()
                    .map(|(path, text)| (PathBuf::from(path), (*text).to_string()))
                    .collect(),
                unreadable: Vec::new(),
            }
        }

        fn entries(&self) -> Vec<CatalogEntry> {
            let mut entries: Vec<CatalogEntry> =
                self.contents.keys().map(CatalogEntry::from_path).collect();
            entries.extend(self.unreadable.iter().map(CatalogEntry::from_path));
            entries.sort_by(|a, b| a.filepath.cmp(&b.filepath));
            entries
        }
    }

    #[async_trait]
    impl Catalog for StaticCatalog {
        async fn all_files(&self) -> eidetic_catalog::Result<Vec<CatalogEntry>> {
            Ok(self.entries())
        }

        async fn read_file(&self, path: &Path) -> eidetic_catalog::Result<String> {
            self.contents.get(path).cloned().ok_or_else(|| CatalogError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn index_over(files: &[(&str, &str)]) -> ScanIndex {
        let catalog = StaticCatalog::new(files);
        let corpus = catalog.entries();
        ScanIndex::new(Arc::new(catalog), corpus)
    }

    #[tokio::test]
    async fn finds_first_occurrence_with_context_window() {
        let index = index_over(&[("/notes/a.md", "Hello world testing one")]);

        let hits = index.lookup("testing").await.unwrap();
        assert_eq!(hits.len(), 1);

        let hit = &hits[0];
        assert_eq!(hit.filename, "a.md");
        assert_eq!(hit.keyword_length, 7);
        assert_eq!(hit.context, "hello world testing one");
        assert_eq!(&hit.context[hit.keyword_index..hit.keyword_index + hit.keyword_length], "testing");
    }

    #[tokio::test]
    async fn returns_one_hit_per_matching_file_in_corpus_order() {
        let index = index_over(&[
            ("/notes/a.md", "Hello world testing one"),
            ("/notes/b.md", "Another testing case two"),
            ("/notes/c.md", "no match here"),
        ]);

        let hits = index.lookup("testing").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].filename, "a.md");
        assert_eq!(hits[1].filename, "b.md");

        // Hit order follows the corpus.
        let positions: Vec<usize> = hits
            .iter()
            .map(|hit| {
                index.corpus().iter().position(|entry| entry.filepath == hit.filepath).unwrap()
            })
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        for hit in &hits {
            assert_eq!(hit.keyword_length, 7);
            assert!(hit.context.contains("testing"));
            assert!(hit.context.len() <= "testing".len() + 2 * CONTEXT_MARGIN);
        }
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let index = index_over(&[("/notes/a.md", "The QUICK Brown Fox")]);

        let hits = index.lookup("quick brown").await.unwrap();
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(
            &hit.context[hit.keyword_index..hit.keyword_index + hit.keyword_length],
            "quick brown"
        );
    }

    #[tokio::test]
    async fn window_is_bounded_in_long_content() {
        let content = format!("{}needle{}", "x".repeat(200), "y".repeat(200));
        let index = index_over(&[("/notes/a.md", content.as_str())]);

        let hits = index.lookup("needle").await.unwrap();
        let hit = &hits[0];
        assert_eq!(hit.context.len(), "needle".len() + 2 * CONTEXT_MARGIN);
        assert_eq!(hit.keyword_index, CONTEXT_MARGIN);
        assert_eq!(&hit.context[hit.keyword_index..hit.keyword_index + hit.keyword_length], "needle");
    }

    #[tokio::test]
    async fn no_match_yields_no_hits() {
        let index = index_over(&[("/notes/a.md", "nothing to see")]);
        assert!(index.lookup("absent").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_query_matches_every_file_at_offset_zero() {
        let index = index_over(&[("/notes/a.md", "alpha"), ("/notes/b.md", "beta")]);

        let hits = index.lookup("").await.unwrap();
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert_eq!(hit.keyword_index, 0);
            assert_eq!(hit.keyword_length, 0);
        }
    }

    #[tokio::test]
    async fn window_bounds_snap_to_char_boundaries() {
        // 15 two-byte characters put the margin edges inside characters.
        let content = format!("{} testing {}", "α".repeat(15), "α".repeat(15));
        let index = index_over(&[("/notes/a.md", content.as_str())]);

        let hits = index.lookup("testing").await.unwrap();
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(&hit.context[hit.keyword_index..hit.keyword_index + hit.keyword_length], "testing");
    }

    #[tokio::test]
    async fn unreadable_file_is_skipped_not_empty() {
        let mut catalog = StaticCatalog::new(&[("/notes/b.md", "readable testing text")]);
        catalog.unreadable.push(PathBuf::from("/notes/a.md"));
        let corpus = catalog.entries();
        let index = ScanIndex::new(Arc::new(catalog), corpus);

        let hits = index.lookup("testing").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "b.md");

        // An empty query must not resurrect the unreadable file either.
        let hits = index.lookup("").await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
