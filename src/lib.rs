//! # Ad Scout
//!
//! Find advertisement videos whose content resembles a given source video,
//! using precomputed embedding vectors stored in a Pinecone index.
//!
//! Given a source video identifier, Ad Scout recovers that video's stored
//! embeddings at two granularities (per-clip and whole-video), runs a
//! nearest-neighbor query against advertisement vectors at each granularity,
//! and reconciles both result sets into one deduplicated, score-ranked list.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Recover    │──▶│   Search     │──▶│  Reconcile  │
//! │ clip+video  │   │ ads per scope│   │ dedup+rank  │
//! └──────┬──────┘   └──────┬───────┘   └──────┬──────┘
//!        │                 │                  │
//!        ▼                 ▼                  ▼
//!   ┌──────────────────────────┐      ┌──────────────┐
//!   │      Pinecone index      │      │  CLI / HTTP  │
//!   └──────────────────────────┘      └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export PINECONE_API_KEY=...
//! ads status                            # verify index connectivity
//! ads search 66fcc28b523f827c6044493d   # find similar ads
//! ads serve                             # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`index`] | Vector index abstraction |
//! | [`pinecone`] | Pinecone HTTP client |
//! | [`search`] | Recovery, scoped search, and reconciliation |
//! | [`server`] | HTTP search server |
//! | [`status`] | Index status overview |

pub mod config;
pub mod index;
pub mod models;
pub mod pinecone;
pub mod search;
pub mod server;
pub mod status;
