//! Embedding helpers: cosine similarity and the deterministic offline fallback.

/// Dimensionality of the fallback embedding.
pub const FALLBACK_DIMS: usize = 256;

/// Maximum number of characters of input fed into an embedding.
pub const EMBED_INPUT_MAX: usize = 4_000;

/// Deterministic character-histogram embedding used when no embedding model
/// is reachable. Same text always yields the same unit-normalized vector.
pub fn fallback_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; FALLBACK_DIMS];
    for (i, ch) in text.chars().take(EMBED_INPUT_MAX).enumerate() {
        vector[i % FALLBACK_DIMS] += (ch as u32 % 13) as f32 / 13.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
    vector
}

/// Cosine similarity over the overlapping prefix of the two vectors.
/// Zero-norm inputs score 0 instead of dividing by zero. Length mismatch is
/// tolerated (comparison truncates to the shorter vector) so memories written
/// under an older embedding model still participate in recall.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..len {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    let norm_a = if norm_a > 0.0 { norm_a.sqrt() } else { 1.0 };
    let norm_b = if norm_b > 0.0 { norm_b.sqrt() } else { 1.0 };
    dot / (norm_a * norm_b)
}
