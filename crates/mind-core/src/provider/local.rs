//! Offline provider: deterministic reflection text and histogram embeddings.
//! Keeps the whole loop alive with zero network access.

use super::TextProvider;
use crate::memory::fallback_embedding;
use crate::shared::{BoxError, FALLBACK_REFLECTION};
use tokio::sync::mpsc;

pub struct LocalProvider;

#[async_trait::async_trait]
impl TextProvider for LocalProvider {
    fn is_live(&self) -> bool {
        false
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String, BoxError> {
        Ok(FALLBACK_REFLECTION.to_string())
    }

    async fn stream_complete(
        &self,
        _system: &str,
        _user: &str,
    ) -> Result<mpsc::Receiver<String>, BoxError> {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(FALLBACK_REFLECTION.to_string()).await;
        Ok(rx)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, BoxError> {
        Ok(fallback_embedding(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completion_is_the_fixed_reflection() {
        let text = LocalProvider.complete("sys", "user").await.unwrap();
        assert_eq!(text, FALLBACK_REFLECTION);
    }

    #[tokio::test]
    async fn stream_yields_reflection_then_closes() {
        let mut rx = LocalProvider.stream_complete("sys", "user").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), FALLBACK_REFLECTION);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn embed_matches_fallback_helper() {
        let v = LocalProvider.embed("hello").await.unwrap();
        assert_eq!(v, fallback_embedding("hello"));
    }
}
