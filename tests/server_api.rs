//! Integration tests for the HTTP search server.
//!
//! Each test spawns the real Axum server on a free port with a scripted
//! index behind it, then drives it over HTTP with reqwest.

use adscout::config::Config;
use adscout::index::{MetadataFilter, VectorIndex};
use adscout::models::{IndexStats, MatchMetadata, NamespaceStats, Scope, VectorMatch};
use adscout::server::run_server_with_index;
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

const DIMENSION: usize = 1024;

// ─── Scripted index ─────────────────────────────────────────────────

/// A minimal scripted [`VectorIndex`]: one whole-video reference vector and
/// a fixed set of similar ads, with an optional injected failure.
struct ScriptedIndex {
    fail: bool,
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    async fn similarity_search(
        &self,
        _vector: &[f32],
        filter: &MetadataFilter,
        _top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        if self.fail {
            bail!("index unavailable: simulated failure");
        }

        let filter = filter.to_value();
        if filter["scope"]["$eq"] == "video" {
            Ok(vec![ad_match("ad-1", 0.92), ad_match("ad-2", 0.61)])
        } else {
            Ok(Vec::new())
        }
    }

    async fn fetch_by_filter(
        &self,
        filter: &MetadataFilter,
        _top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        if self.fail {
            bail!("index unavailable: simulated failure");
        }

        let filter = filter.to_value();
        if filter["scope"]["$eq"] == "video" {
            Ok(vec![VectorMatch {
                id: "src-video".to_string(),
                score: 0.0,
                values: Some(vec![0.3; DIMENSION]),
                metadata: Some(MatchMetadata {
                    video_id: filter["video_id"]["$eq"].as_str().map(str::to_string),
                    scope: Some(Scope::Video),
                    video_type: None,
                    extra: serde_json::Map::new(),
                }),
            }])
        } else {
            // This footage has no clip vectors.
            Ok(Vec::new())
        }
    }

    async fn stats(&self) -> Result<IndexStats> {
        if self.fail {
            bail!("index unavailable: simulated failure");
        }

        Ok(IndexStats {
            dimension: DIMENSION,
            total_vectors: 128,
            index_fullness: 0.01,
            namespaces: vec![NamespaceStats {
                name: String::new(),
                vector_count: 128,
            }],
        })
    }
}

fn ad_match(target: &str, score: f32) -> VectorMatch {
    VectorMatch {
        id: format!("{}-video", target),
        score,
        values: None,
        metadata: Some(MatchMetadata {
            video_id: Some(target.to_string()),
            scope: Some(Scope::Video),
            video_type: Some("ad".to_string()),
            extra: serde_json::Map::new(),
        }),
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn test_config(port: u16) -> Config {
    let config_content = format!(
        r#"
[index]
name = "ads-test"
host = "http://127.0.0.1:1"
dimension = {}

[server]
bind = "127.0.0.1:{}"
"#,
        DIMENSION, port
    );
    toml::from_str(&config_content).unwrap()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn spawn_server(fail: bool) -> (u16, tokio::task::JoinHandle<()>) {
    let port = find_free_port();
    let cfg = test_config(port);
    let index: Arc<dyn VectorIndex> = Arc::new(ScriptedIndex { fail });

    let handle = tokio::spawn(async move {
        run_server_with_index(&cfg, index).await.ok();
    });

    wait_for_server(port).await;
    (port, handle)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_returns_ranked_placements() {
    let (port, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://127.0.0.1:{}/search", port))
        .json(&json!({"video_id": "footage-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["video_id"], "ad-1");
    assert_eq!(results[0]["provenance"], "video");
    assert_eq!(results[1]["video_id"], "ad-2");
    assert!(results[0]["score"].as_f64().unwrap() >= results[1]["score"].as_f64().unwrap());

    handle.abort();
}

#[tokio::test]
async fn test_search_rejects_blank_video_id() {
    let (port, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://127.0.0.1:{}/search", port))
        .json(&json!({"video_id": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("must not be empty"));

    // A missing field behaves like a blank one.
    let resp = client
        .post(format!("http://127.0.0.1:{}/search", port))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    handle.abort();
}

#[tokio::test]
async fn test_search_maps_index_failure_to_bad_gateway() {
    let (port, handle) = spawn_server(true).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://127.0.0.1:{}/search", port))
        .json(&json!({"video_id": "footage-1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "index_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("index unavailable"));

    handle.abort();
}

#[tokio::test]
async fn test_health_reports_version() {
    let (port, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    handle.abort();
}

#[tokio::test]
async fn test_stats_exposes_index_statistics() {
    let (port, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://127.0.0.1:{}/stats", port))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["dimension"], 1024);
    assert_eq!(body["total_vectors"], 128);
    assert_eq!(body["namespaces"][0]["name"], "");
    assert_eq!(body["namespaces"][0]["vector_count"], 128);

    handle.abort();
}
