//! Embeddings module - Generate semantic embeddings for question text
//!
//! Provides trait-based abstraction for embedding generation with a
//! remote inference backend. Model and dimension are pinned per
//! deployment via configuration.

mod remote;
pub mod similarity;

pub use remote::RemoteEmbedder;
pub use similarity::{cosine_similarity, cosine_similarity_matrix, stack_embeddings};

use anyhow::Result;

use crate::cancel::CancelToken;
use crate::config::Config;

/// Trait for embedding generation engines
pub trait EmbeddingEngine {
    /// Generate embedding for a single text
    ///
    /// Default implementation delegates to embed_batch().
    fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut rows = self.embed_batch(&[text.to_string()])?;
        rows.pop()
            .ok_or_else(|| anyhow::anyhow!("embedding backend returned no rows"))
    }

    /// Generate embeddings for multiple texts (single backend call)
    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension (e.g., 1024 for bge-large-en-v1.5)
    fn dimension(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Factory function to create embedder from configuration
///
/// Reads provider endpoint, model and dimension from config and wires
/// in the shared retry policy and cancellation token.
pub fn create_embedder(config: &Config, cancel: &CancelToken) -> Result<Box<dyn EmbeddingEngine>> {
    let api_key = config.providers.api_key()?;
    Ok(Box::new(RemoteEmbedder::new(
        config.providers.embeddings_url.clone(),
        api_key,
        config.providers.embeddings_model.clone(),
        config.providers.embeddings_dimension,
        config.retry.policy(),
        cancel.clone(),
    )?))
}
