//! Render state: the mind's externally visible posture, and the whitelisted
//! merge that is the only way it changes.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Longest caption the heuristic proposer will emit.
pub const CAPTION_MAX: usize = 240;

/// The committed visual/behavioral snapshot. Field names are camelCase on the
/// wire to match the canvas client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub hue_shift: f64,
    pub ring_density: f64,
    pub glyph_entropy: f64,
    pub pulse: f64,
    pub caption: String,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            hue_shift: 0.0,
            ring_density: 36.0,
            glyph_entropy: 0.35,
            pulse: 0.5,
            caption: "initializing…".to_string(),
        }
    }
}

impl RenderState {
    /// Pure whitelist merge: only the five known fields are copied from
    /// `delta`, and only when the value carries the right type. Unknown keys,
    /// wrong types, and non-object deltas are ignored. No clamping happens
    /// here; proposers are responsible for staying in range.
    pub fn propose(&self, delta: &serde_json::Value) -> RenderState {
        let mut next = self.clone();
        let Some(obj) = delta.as_object() else {
            return next;
        };
        if let Some(v) = obj.get("hueShift").and_then(|v| v.as_f64()) {
            next.hue_shift = v;
        }
        if let Some(v) = obj.get("ringDensity").and_then(|v| v.as_f64()) {
            next.ring_density = v;
        }
        if let Some(v) = obj.get("glyphEntropy").and_then(|v| v.as_f64()) {
            next.glyph_entropy = v;
        }
        if let Some(v) = obj.get("pulse").and_then(|v| v.as_f64()) {
            next.pulse = v;
        }
        if let Some(v) = obj.get("caption").and_then(|v| v.as_str()) {
            next.caption = v.to_string();
        }
        next
    }
}

/// Single-writer cell holding the committed render state. Readers always see
/// a complete snapshot; partial merges are never visible.
pub struct StateCell {
    inner: RwLock<RenderState>,
}

impl StateCell {
    pub fn new(initial: RenderState) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    pub fn snapshot(&self) -> RenderState {
        self.inner
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn publish(&self, next: RenderState) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = next;
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new(RenderState::default())
    }
}
