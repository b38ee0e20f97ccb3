//! Similar-ad search: recover, query, reconcile.
//!
//! The pipeline for one source video runs in three stages:
//!
//! 1. **Recover** the video's own stored embeddings, once per [`Scope`]
//!    (clip and whole-video), via filter-only lookups. A scope with no
//!    stored vector is skipped, not an error.
//! 2. **Search** for advertisement videos near each recovered vector, with
//!    the query restricted to the advertisement category and the same scope.
//! 3. **Reconcile**: tag every match with the scope that produced it, drop
//!    matches with no resolvable target video, keep only the highest-scoring
//!    match per target, and sort descending by score.
//!
//! The two recoveries run concurrently, then the two searches. A transport
//! failure in either scope fails the whole cycle; only genuine absence
//! degrades gracefully.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::config::Config;
use crate::index::{MetadataFilter, VectorIndex};
use crate::models::{RankedPlacement, Scope, VectorMatch};
use crate::pinecone::PineconeIndex;

/// Tuning parameters for one search cycle, decoupled from the application
/// config so the pipeline can be driven directly in tests.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Expected vector dimensionality. Recovered vectors must match.
    pub dimension: usize,
    /// Metadata category that marks advertisement videos.
    pub ad_category: String,
    /// Top-K for clip-scope recovery (a video may have many clip vectors).
    pub clip_candidates: usize,
    /// Top-K for each similarity search.
    pub similar_top_k: usize,
}

impl SearchParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dimension: config.index.dimension,
            ad_category: config.search.ad_category.clone(),
            clip_candidates: config.search.clip_candidates,
            similar_top_k: config.search.similar_top_k,
        }
    }
}

/// A source video's stored embedding, recovered from the index.
#[derive(Debug, Clone)]
pub struct ReferenceVector {
    pub scope: Scope,
    pub values: Vec<f32>,
}

/// Recovers the source video's stored embedding for one scope.
///
/// Returns `Ok(None)` when the index holds no vector for this video at this
/// scope, a valid state meaning the scope is skipped downstream. A match
/// that comes back without values, or with the wrong dimensionality, is a
/// protocol violation and fails the cycle.
pub async fn reference_vector(
    index: &dyn VectorIndex,
    video_id: &str,
    scope: Scope,
    params: &SearchParams,
) -> Result<Option<ReferenceVector>> {
    let top_k = match scope {
        Scope::Clip => params.clip_candidates,
        // Exactly one whole-video vector exists per asset.
        Scope::Video => 1,
    };

    let filter = MetadataFilter::new()
        .eq("video_id", video_id)
        .eq("scope", scope.as_str());

    let matches = index.fetch_by_filter(&filter, top_k).await?;

    let Some(top) = matches.into_iter().next() else {
        return Ok(None);
    };

    let Some(values) = top.values else {
        bail!(
            "index returned match {} without vector values for scope {}",
            top.id,
            scope
        );
    };
    if values.len() != params.dimension {
        bail!(
            "index returned a {}-dimensional vector for match {} (expected {})",
            values.len(),
            top.id,
            params.dimension
        );
    }

    Ok(Some(ReferenceVector { scope, values }))
}

/// Finds advertisement videos near a recovered reference vector.
///
/// The query is restricted to the advertisement category at the same scope
/// the reference was recovered at. Results come back ranked by the index.
pub async fn similar_ads(
    index: &dyn VectorIndex,
    reference: &ReferenceVector,
    params: &SearchParams,
) -> Result<Vec<VectorMatch>> {
    let filter = MetadataFilter::new()
        .eq("video_type", params.ad_category.as_str())
        .eq("scope", reference.scope.as_str());

    index
        .similarity_search(&reference.values, &filter, params.similar_top_k)
        .await
}

/// Merges per-scope match lists into one ranked, deduplicated placement list.
///
/// Clip matches fold before video matches. Per target video, a later match
/// replaces the retained one only with a strictly greater score, so the
/// first-encountered match wins equal-score ties. The final sort is stable
/// and descending, preserving fold order among equal scores.
pub fn reconcile(
    clip_matches: Vec<VectorMatch>,
    video_matches: Vec<VectorMatch>,
) -> Vec<RankedPlacement> {
    let tagged = clip_matches
        .into_iter()
        .map(|m| (Scope::Clip, m))
        .chain(video_matches.into_iter().map(|m| (Scope::Video, m)));

    let mut by_target: HashMap<String, usize> = HashMap::new();
    let mut placements: Vec<RankedPlacement> = Vec::new();

    for (provenance, m) in tagged {
        // A match that cannot be attributed to a target video is dropped.
        let Some(metadata) = m.metadata else {
            continue;
        };
        let Some(target) = metadata.video_id.clone() else {
            continue;
        };

        match by_target.get(&target) {
            Some(&slot) => {
                if m.score > placements[slot].score {
                    placements[slot] = RankedPlacement {
                        video_id: target,
                        score: m.score,
                        provenance,
                        metadata,
                    };
                }
            }
            None => {
                by_target.insert(target.clone(), placements.len());
                placements.push(RankedPlacement {
                    video_id: target,
                    score: m.score,
                    provenance,
                    metadata,
                });
            }
        }
    }

    placements.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    placements
}

/// Runs the full search cycle for one source video.
///
/// Both recoveries run concurrently, then both similarity searches. A hard
/// index failure in either scope aborts the entire cycle; no partial list
/// is ever returned.
pub async fn find_similar_ads(
    index: &dyn VectorIndex,
    params: &SearchParams,
    video_id: &str,
) -> Result<Vec<RankedPlacement>> {
    if video_id.trim().is_empty() {
        bail!("video id must not be empty");
    }

    let (clip_ref, video_ref) = tokio::try_join!(
        reference_vector(index, video_id, Scope::Clip, params),
        reference_vector(index, video_id, Scope::Video, params),
    )?;

    let (clip_matches, video_matches) = tokio::try_join!(
        scope_matches(index, clip_ref, params),
        scope_matches(index, video_ref, params),
    )?;

    Ok(reconcile(clip_matches, video_matches))
}

/// One scope's similarity results, or an empty list when the scope has no
/// reference vector.
async fn scope_matches(
    index: &dyn VectorIndex,
    reference: Option<ReferenceVector>,
    params: &SearchParams,
) -> Result<Vec<VectorMatch>> {
    match reference {
        Some(reference) => similar_ads(index, &reference, params).await,
        None => Ok(Vec::new()),
    }
}

pub async fn run_search(config: &Config, video_id: &str) -> Result<()> {
    let index = PineconeIndex::connect(&config.index).await?;
    let params = SearchParams::from_config(config);

    let placements = find_similar_ads(&index, &params, video_id).await?;

    if placements.is_empty() {
        println!("No similar ads found.");
        return Ok(());
    }

    for (i, placement) in placements.iter().enumerate() {
        println!("{}. [{:.4}] {}", i + 1, placement.score, placement.video_id);
        println!("    scope: {}", placement.provenance);
        if let Some(ref video_type) = placement.metadata.video_type {
            println!("    category: {}", video_type);
        }
        if !placement.metadata.extra.is_empty() {
            println!(
                "    metadata: {}",
                serde_json::Value::Object(placement.metadata.extra.clone())
            );
        }
        println!();
    }

    Ok(())
}
