//! Remote embedding backend over a blocking inference endpoint

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::EmbeddingEngine;
use crate::cancel::CancelToken;
use crate::retry::RetryPolicy;

/// Request body for the inference endpoint
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a [String],
}

/// Response body: one embedding row per input, in request order
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding engine backed by a remote inference deployment
///
/// The deployment pins both model and dimension; a response row with a
/// different dimension means the endpoint is misconfigured and is a
/// hard error, not something to paper over.
pub struct RemoteEmbedder {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    model: String,
    dimension: usize,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl RemoteEmbedder {
    pub fn new(
        url: String,
        api_key: String,
        model: String,
        dimension: usize,
        retry: RetryPolicy,
        cancel: CancelToken,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key,
            model,
            dimension,
            retry,
            cancel,
        })
    }

    fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { inputs: texts })
            .send()
            .context("Failed to reach embedding endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Embedding endpoint returned {status}: {body}");
        }

        let parsed: EmbeddingResponse = response
            .json()
            .context("Failed to decode embedding response")?;

        if parsed.embeddings.len() != texts.len() {
            bail!(
                "Embedding endpoint returned {} rows for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            );
        }
        if let Some(row) = parsed.embeddings.iter().find(|r| r.len() != self.dimension) {
            bail!(
                "Embedding endpoint returned dimension {} (expected {})",
                row.len(),
                self.dimension
            );
        }

        Ok(parsed.embeddings)
    }
}

impl EmbeddingEngine for RemoteEmbedder {
    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.retry
            .run(&self.cancel, "embedding request", || {
                self.request_batch(texts)
            })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
