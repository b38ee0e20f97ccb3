//! Core data models for ad similarity search.
//!
//! These types represent the vectors, matches, and ranked placements that
//! flow between the vector index and the reconciliation pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Granularity of a stored embedding vector.
///
/// Every vector in the index is tagged with the scope it was computed at:
/// `Clip` vectors cover one detected segment of a video, `Video` vectors
/// summarize the whole file. Queries never mix scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Clip,
    Video,
}

impl Scope {
    /// The metadata value used for this scope on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Clip => "clip",
            Scope::Video => "video",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to an indexed vector.
///
/// The ingestion pipeline writes `video_id`, `scope`, and `video_type` for
/// every vector it stores. Anything else it attached (clip time bounds,
/// titles) lands in `extra` and passes through to responses unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// The video that owns the matched vector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// Granularity the vector was computed at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Content category; `"ad"` marks advertisements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_type: Option<String>,
    /// Any other keys the ingestion pipeline attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single match returned by the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Index-assigned vector id.
    pub id: String,
    /// Similarity score; higher is more similar. Score semantics (cosine,
    /// dot product) are owned by the index.
    #[serde(default)]
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MatchMetadata>,
    /// Raw vector values; present only when the query asked for them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
}

/// A reconciled search result: one advertisement video proposed as similar
/// to the source footage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPlacement {
    /// Target advertisement video id (the deduplication key).
    pub video_id: String,
    /// Retained score: the maximum across all matches for this video.
    pub score: f32,
    /// Which scope's query produced the retained match.
    pub provenance: Scope,
    /// Pass-through metadata of the retained match.
    pub metadata: MatchMetadata,
}

/// Vector index statistics, as reported by the index itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Vector dimensionality the index is provisioned for.
    pub dimension: usize,
    /// Total vectors across all namespaces.
    pub total_vectors: u64,
    /// Fraction of index capacity in use, in `[0.0, 1.0]`.
    pub index_fullness: f32,
    /// Per-namespace vector counts. The default namespace is keyed `""`.
    pub namespaces: Vec<NamespaceStats>,
}

/// One namespace's share of the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub name: String,
    pub vector_count: u64,
}
