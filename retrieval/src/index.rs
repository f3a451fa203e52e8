//! Flat vector index with snapshot persistence.
//!
//! The index is exhaustive inner-product search over normalized embeddings
//! of catalog text. The catalog is small, so the interesting part is not
//! approximate search but the persistence contract: a build always writes a
//! full snapshot (binary vector blob plus a JSON sidecar `{ids, dim}`), a
//! load treats anything unreadable as absent, and a query lazily rebuilds
//! when no snapshot is loadable.
//!
//! Position `i` of the vector matrix always corresponds to entry `i` of the
//! id list. Builds regenerate both together and publish them as one
//! atomically swapped snapshot, so concurrent queries observe either the
//! fully-old or fully-new index.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use shopmate_catalog::{ProductId, ProductStore};
use shopmate_embeddings::{CachedEmbedder, Embedding, find_top_k, normalize};

use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};

/// Sidecar metadata persisted next to the binary vector blob.
#[derive(Debug, Serialize, Deserialize)]
struct SidecarMeta {
    /// Item ids, ordered to match the vector rows.
    ids: Vec<ProductId>,

    /// Vector width.
    dim: usize,
}

/// An immutable, fully-built index snapshot.
#[derive(Debug)]
pub struct IndexSnapshot {
    rows: Vec<Embedding>,
    ids: Vec<ProductId>,
    dim: usize,
}

impl IndexSnapshot {
    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ordered item ids, aligned with the vector rows.
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    /// Vector width.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Flat similarity index over the product catalog.
pub struct VectorIndex {
    /// Embedding pipeline (provider + cache).
    embedder: Arc<CachedEmbedder>,

    /// Product source for rebuilds.
    store: Arc<dyn ProductStore>,

    /// Path of the binary vector blob.
    index_path: PathBuf,

    /// Path of the JSON sidecar.
    sidecar_path: PathBuf,

    /// Current snapshot. Swapped wholesale; never mutated in place.
    state: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl VectorIndex {
    /// Create an index over the given store.
    pub fn new(
        embedder: Arc<CachedEmbedder>,
        store: Arc<dyn ProductStore>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            index_path: config.index_path(),
            sidecar_path: config.sidecar_path(),
            state: RwLock::new(None),
        }
    }

    /// Rebuild the index from the product store and persist a fresh
    /// snapshot, replacing any prior one.
    ///
    /// Items whose embedding fails are skipped; a build in which nothing
    /// embeds fails with [`RetrievalError::EmptyCorpus`] and leaves the
    /// previous snapshot untouched.
    pub async fn build(&self) -> Result<usize> {
        let products = self.store.list_all().await?;

        let mut ids: Vec<ProductId> = Vec::with_capacity(products.len());
        let mut rows: Vec<Embedding> = Vec::with_capacity(products.len());

        for product in &products {
            match self.embedder.embed(&product.embedding_text()).await {
                Ok(mut embedding) => {
                    normalize(&mut embedding);
                    rows.push(embedding);
                    ids.push(product.id);
                }
                Err(e) => {
                    warn!("Skipping product {} in index build: {e}", product.id);
                }
            }
        }

        if rows.is_empty() {
            return Err(RetrievalError::EmptyCorpus);
        }

        let dim = rows[0].len();
        let snapshot = Arc::new(IndexSnapshot { rows, ids, dim });

        self.persist(&snapshot).await?;

        let count = snapshot.len();
        *self.state.write().await = Some(snapshot);

        info!("Vector index built: {count} items, dim={dim}");
        Ok(count)
    }

    /// Load the persisted snapshot, if both artifacts are present and
    /// readable. Corrupt files are logged and treated as absent.
    pub async fn load(&self) -> Result<Option<Arc<IndexSnapshot>>> {
        let snapshot = match self.read_persisted().await {
            Ok(Some(snapshot)) => Arc::new(snapshot),
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("Failed to load index snapshot, treating as absent: {e}");
                return Ok(None);
            }
        };

        info!("Loaded index snapshot: {} items, dim={}", snapshot.len(), snapshot.dim);
        *self.state.write().await = Some(snapshot.clone());
        Ok(Some(snapshot))
    }

    /// Query the index, lazily rebuilding if no snapshot is loadable.
    ///
    /// Returns up to `top_k` `(id, score)` pairs in descending score order.
    /// Ties keep corpus order; positions without a valid id are skipped.
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<(ProductId, f32)>> {
        let snapshot = self.snapshot_or_init().await?;

        let mut query = self.embedder.embed(text).await?;
        normalize(&mut query);

        let ranked = find_top_k(&query, &snapshot.rows, top_k)?;

        Ok(ranked
            .into_iter()
            .filter_map(|scored| {
                snapshot
                    .ids
                    .get(scored.row)
                    .map(|id| (*id, scored.score))
            })
            .collect())
    }

    /// The current in-memory snapshot, if any.
    pub async fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.state.read().await.clone()
    }

    /// Resolve a snapshot: in-memory, then disk, then a full rebuild.
    async fn snapshot_or_init(&self) -> Result<Arc<IndexSnapshot>> {
        if let Some(snapshot) = self.state.read().await.clone() {
            return Ok(snapshot);
        }

        if let Some(snapshot) = self.load().await? {
            return Ok(snapshot);
        }

        debug!("No loadable snapshot, rebuilding index from product store");
        self.build().await?;

        self.state
            .read()
            .await
            .clone()
            .ok_or(RetrievalError::EmptyCorpus)
    }

    /// Write both snapshot artifacts, replacing any prior snapshot.
    async fn persist(&self, snapshot: &IndexSnapshot) -> Result<()> {
        if let Some(parent) = self.index_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut blob = Vec::with_capacity(snapshot.rows.len() * snapshot.dim * 4);
        for row in &snapshot.rows {
            for value in row {
                blob.extend_from_slice(&value.to_le_bytes());
            }
        }
        fs::write(&self.index_path, blob).await?;

        let meta = SidecarMeta {
            ids: snapshot.ids.clone(),
            dim: snapshot.dim,
        };
        fs::write(&self.sidecar_path, serde_json::to_string(&meta)?).await?;

        debug!("Persisted index snapshot to {:?}", self.index_path);
        Ok(())
    }

    /// Read and validate the persisted snapshot.
    async fn read_persisted(&self) -> Result<Option<IndexSnapshot>> {
        if !self.index_path.exists() || !self.sidecar_path.exists() {
            return Ok(None);
        }

        let meta: SidecarMeta = serde_json::from_str(&fs::read_to_string(&self.sidecar_path).await?)?;
        let blob = fs::read(&self.index_path).await?;

        if meta.dim == 0 || blob.len() != meta.ids.len() * meta.dim * 4 {
            return Err(RetrievalError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "index blob does not match sidecar metadata",
            )));
        }

        let mut values = Vec::with_capacity(blob.len() / 4);
        for chunk in blob.chunks_exact(4) {
            values.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }

        let rows: Vec<Embedding> = values
            .chunks_exact(meta.dim)
            .map(<[f32]>::to_vec)
            .collect();

        Ok(Some(IndexSnapshot {
            rows,
            ids: meta.ids,
            dim: meta.dim,
        }))
    }
}
