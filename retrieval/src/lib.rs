//! # Retrieval Engine
//!
//! Semantic retrieval over the product catalog:
//!
//! - **VectorIndex**: flat inner-product index with on-disk snapshots and
//!   lazy rebuild
//! - **RecommendationEngine**: threshold- and budget-filtered product hits
//!   for text and image queries
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Recommendation Engine                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   text query ──────────────┐      image query                   │
//! │                            │           │                        │
//! │                            │     vision completion              │
//! │                            ▼           │                        │
//! │                      ┌──────────┐◄─────┘                        │
//! │                      │  Vector  │                               │
//! │                      │  Index   │──► snapshot (disk)            │
//! │                      └──────────┘                               │
//! │                            │                                    │
//! │                            ▼                                    │
//! │                      ProductStore ──► ranked ProductHits        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod index;

pub use config::{EmbeddingBackend, QueryDefaults, RetrievalConfig};
pub use engine::{ProductHit, RecommendationEngine};
pub use error::{Result, RetrievalError};
pub use index::VectorIndex;
