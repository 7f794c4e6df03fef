use anyhow::Result;
use async_trait::async_trait;

use ai_client::Embeddings;

#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Voyage AI embeddings via the OpenAI-compatible API. 1024-dim vectors.
pub struct Embedder {
    client: Embeddings,
}

impl Embedder {
    pub fn new(voyage_api_key: &str) -> Self {
        let client = Embeddings::new(voyage_api_key, "voyage-3-large")
            .with_base_url("https://api.voyageai.com/v1");
        Self { client }
    }
}

#[async_trait]
impl TextEmbedder for Embedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text.to_string()).await
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.client.embed_batch(texts).await
    }
}
