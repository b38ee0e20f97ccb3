//! Pinecone-backed vector index client.
//!
//! Implements [`VectorIndex`] over Pinecone's HTTP API:
//!
//! - Data plane: `POST {host}/query` for similarity searches and filter-only
//!   lookups, `POST {host}/describe_index_stats` for statistics.
//! - Control plane: `GET https://api.pinecone.io/indexes/{name}`, called once
//!   at connect time to resolve the data-plane host when `index.host` is not
//!   pinned in config.
//!
//! The data plane has no pure metadata lookup; every query requires a vector.
//! [`fetch_by_filter`](VectorIndex::fetch_by_filter) therefore sends an
//! all-zero placeholder of the configured dimension and lets the metadata
//! filter alone select the result set.
//!
//! Each index call is made exactly once. Failures are not retried here; a
//! failed call fails the enclosing search cycle.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::IndexConfig;
use crate::index::{MetadataFilter, VectorIndex};
use crate::models::{IndexStats, NamespaceStats, VectorMatch};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2025-04";

/// HTTP client bound to one Pinecone index.
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    api_key: String,
    namespace: Option<String>,
    dimension: usize,
}

impl PineconeIndex {
    /// Connects to the configured index.
    ///
    /// The API key is read from the `PINECONE_API_KEY` environment variable.
    /// When `index.host` is absent the data-plane host is resolved through
    /// the control plane; with a pinned host no network call happens here.
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let api_key = std::env::var("PINECONE_API_KEY")
            .map_err(|_| anyhow::anyhow!("PINECONE_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let host = match &config.host {
            Some(host) => normalize_host(host),
            None => resolve_host(&client, &api_key, &config.name).await?,
        };

        Ok(Self {
            client,
            host,
            api_key,
            namespace: config.namespace.clone(),
            dimension: config.dimension,
        })
    }

    async fn query(&self, request: &QueryRequest<'_>) -> Result<Vec<VectorMatch>> {
        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Api-Version", API_VERSION)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Pinecone query to {} failed", self.host))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Pinecone query failed with {}: {}", status, body);
        }

        let body: QueryResponse = response
            .json()
            .await
            .context("Invalid Pinecone query response")?;

        Ok(body.matches)
    }
}

/// Resolves the data-plane host for `index_name` through the control plane.
async fn resolve_host(
    client: &reqwest::Client,
    api_key: &str,
    index_name: &str,
) -> Result<String> {
    let response = client
        .get(format!("{}/indexes/{}", CONTROL_PLANE_URL, index_name))
        .header("Api-Key", api_key)
        .header("X-Pinecone-Api-Version", API_VERSION)
        .send()
        .await
        .context("Pinecone control plane request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!(
            "Failed to describe Pinecone index '{}': {} {}",
            index_name,
            status,
            body
        );
    }

    let described: DescribeIndexResponse = response
        .json()
        .await
        .context("Invalid Pinecone index description")?;

    Ok(normalize_host(&described.host))
}

/// The control plane reports hosts without a scheme; requests need one.
fn normalize_host(host: &str) -> String {
    let trimmed = host.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn similarity_search(
        &self,
        vector: &[f32],
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        self.query(&QueryRequest {
            vector,
            filter: (!filter.is_empty()).then(|| filter.to_value()),
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        })
        .await
    }

    async fn fetch_by_filter(
        &self,
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        // The filter alone selects the result set; the zero vector only
        // satisfies the API's mandatory vector slot.
        let placeholder = vec![0.0; self.dimension];
        self.query(&QueryRequest {
            vector: &placeholder,
            filter: (!filter.is_empty()).then(|| filter.to_value()),
            top_k,
            include_metadata: true,
            include_values: true,
            namespace: self.namespace.as_deref(),
        })
        .await
    }

    async fn stats(&self) -> Result<IndexStats> {
        let response = self
            .client
            .post(format!("{}/describe_index_stats", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Api-Version", API_VERSION)
            .json(&serde_json::json!({}))
            .send()
            .await
            .with_context(|| format!("Pinecone stats request to {} failed", self.host))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "Pinecone describe_index_stats failed with {}: {}",
                status,
                body
            );
        }

        let body: IndexStatsResponse = response
            .json()
            .await
            .context("Invalid Pinecone stats response")?;

        Ok(IndexStats {
            dimension: body.dimension,
            total_vectors: body.total_vector_count,
            index_fullness: body.index_fullness,
            namespaces: body
                .namespaces
                .into_iter()
                .map(|(name, ns)| NamespaceStats {
                    name,
                    vector_count: ns.vector_count,
                })
                .collect(),
        })
    }
}

// ============ Wire types ============

/// Body of `POST {host}/query`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

/// Control-plane index description. Only the host is used.
#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStatsResponse {
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceSummary>,
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    index_fullness: f32,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(
            normalize_host("ads-abc123.svc.us-east-1.pinecone.io"),
            "https://ads-abc123.svc.us-east-1.pinecone.io"
        );
        assert_eq!(
            normalize_host("https://ads-abc123.svc.us-east-1.pinecone.io"),
            "https://ads-abc123.svc.us-east-1.pinecone.io"
        );
        assert_eq!(normalize_host("http://127.0.0.1:5080/"), "http://127.0.0.1:5080");
    }

    #[test]
    fn test_query_request_wire_shape() {
        let filter = MetadataFilter::new().eq("scope", "clip");
        let request = QueryRequest {
            vector: &[0.0, 1.0],
            filter: Some(filter.to_value()),
            top_k: 5,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["topK"], 5);
        assert_eq!(value["includeMetadata"], true);
        assert_eq!(value["includeValues"], false);
        assert_eq!(value["filter"]["scope"]["$eq"], "clip");
        assert!(value.get("namespace").is_none());
    }

    #[test]
    fn test_stats_response_parses_pinecone_shape() {
        let raw = r#"{
            "namespaces": {"": {"vectorCount": 42}, "staging": {"vectorCount": 7}},
            "dimension": 1024,
            "indexFullness": 0.01,
            "totalVectorCount": 49
        }"#;

        let parsed: IndexStatsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.dimension, 1024);
        assert_eq!(parsed.total_vector_count, 49);
        assert_eq!(parsed.namespaces[""].vector_count, 42);
        assert_eq!(parsed.namespaces["staging"].vector_count, 7);
    }
}
