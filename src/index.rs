//! Vector index abstraction.
//!
//! [`VectorIndex`] is the seam between the search pipeline and the external
//! vector store. [`PineconeIndex`](crate::pinecone::PineconeIndex) is the
//! production implementation; tests substitute scripted in-memory mocks.
//!
//! Two query shapes are deliberately distinct:
//!
//! | Operation | Ranking | Values returned |
//! |-----------|---------|-----------------|
//! | [`similarity_search`](VectorIndex::similarity_search) | by similarity to the query vector | no |
//! | [`fetch_by_filter`](VectorIndex::fetch_by_filter) | index-defined | yes |
//!
//! Recovering a video's own stored vectors is a metadata lookup, not a
//! similarity question, so it gets its own operation here even when the
//! backing store can only express it as a degenerate similarity query.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::models::{IndexStats, VectorMatch};

/// Equality filter over vector metadata.
///
/// Builds the `{"field": {"$eq": value}}` clause map understood by the
/// index. All clauses are ANDed together.
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    clauses: Map<String, Value>,
}

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.insert(field.into(), json!({ "$eq": value.into() }));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The filter as the JSON object sent to the index.
    pub fn to_value(&self) -> Value {
        Value::Object(self.clauses.clone())
    }
}

/// Abstract vector index supporting similarity and filter-only lookups.
///
/// Implementations must be `Send + Sync`; one instance is shared across
/// concurrent requests behind an `Arc`.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest-neighbor query: the top `top_k` entries passing `filter`,
    /// ranked by similarity of their vectors to `vector`. Results carry
    /// metadata but not vector values.
    async fn similarity_search(
        &self,
        vector: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>>;

    /// Metadata-only lookup: up to `top_k` entries passing `filter`, in
    /// index-defined order. Results carry both vector values and metadata.
    async fn fetch_by_filter(
        &self,
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>>;

    /// Index statistics: dimension, vector counts, fullness.
    async fn stats(&self) -> Result<IndexStats>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builds_eq_clauses() {
        let filter = MetadataFilter::new()
            .eq("video_id", "abc")
            .eq("scope", "clip");

        let value = filter.to_value();
        assert_eq!(value["video_id"]["$eq"], "abc");
        assert_eq!(value["scope"]["$eq"], "clip");
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_empty_filter_serializes_to_empty_object() {
        let filter = MetadataFilter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.to_value(), json!({}));
    }
}
