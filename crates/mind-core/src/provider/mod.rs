//! Generative provider seam: chat completion, token streaming, embeddings.

mod local;
mod openai;

pub use local::LocalProvider;
pub use openai::OpenAiProvider;

use crate::shared::{BoxError, MindConfig};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Environment variable whose presence selects the live provider.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// One backing model stack. Selected once at boot; every consumer shares the
/// same instance.
#[async_trait::async_trait]
pub trait TextProvider: Send + Sync {
    /// True when backed by a networked model. Gates recall context assembly
    /// and observation re-prompts in the cognition loop.
    fn is_live(&self) -> bool;

    /// One-shot completion.
    async fn complete(&self, system: &str, user: &str) -> Result<String, BoxError>;

    /// Streaming completion: tokens arrive on the returned channel as they
    /// are generated; the channel closes when the model finishes.
    async fn stream_complete(
        &self,
        system: &str,
        user: &str,
    ) -> Result<mpsc::Receiver<String>, BoxError>;

    /// Embedding vector for `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BoxError>;
}

/// Boot-time provider selection: live when the API credential is present and
/// the HTTP client can be built, local otherwise.
pub fn select_provider(config: &MindConfig) -> Arc<dyn TextProvider> {
    match std::env::var(ENV_API_KEY) {
        Ok(key) if !key.trim().is_empty() => match OpenAiProvider::new(key, config) {
            Ok(provider) => {
                tracing::info!(
                    target: "mind::provider",
                    model = %config.model,
                    embed_model = %config.embed_model,
                    "generative provider: live"
                );
                Arc::new(provider)
            }
            Err(e) => {
                tracing::warn!(target: "mind::provider", error = %e, "live provider unavailable, using local fallback");
                Arc::new(LocalProvider)
            }
        },
        _ => {
            tracing::info!(target: "mind::provider", "generative provider: local fallback (no API key)");
            Arc::new(LocalProvider)
        }
    }
}
