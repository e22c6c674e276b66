//! Self-modification: replace the persona or system-prompt text in place.
//! The loop re-reads the system prompt every cycle, so an edit takes effect
//! on the next thought.

use std::path::PathBuf;

/// Longest text accepted for either resource.
const EDIT_MAX: usize = 4_000;

/// Characters of old/new text echoed back in the outcome.
const SNIPPET: usize = 400;

const PERSONA_FILE: &str = "personas/seed.md";
const SYSTEM_FILE: &str = "prompts/system.txt";

pub struct SelfEdit {
    base: PathBuf,
}

impl SelfEdit {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Overwrites the named resource with `text` (truncated to [`EDIT_MAX`]).
    /// The outcome echoes the tail of the previous text and the head of the
    /// new text so the edit is visible in the ledger.
    pub fn edit(&self, kind: &str, text: &str) -> serde_json::Value {
        let file = match kind {
            "persona" => PERSONA_FILE,
            "system" => SYSTEM_FILE,
            _ => return serde_json::json!({ "ok": false, "error": "unsupported edit kind" }),
        };
        let path = self.base.join(file);
        let prev = std::fs::read_to_string(&path).unwrap_or_default();
        let next: String = text.chars().take(EDIT_MAX).collect();

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&path, &next) {
            tracing::warn!(target: "mind::edit", file, error = %e, "self edit failed");
            return serde_json::json!({ "ok": false, "error": e.to_string() });
        }
        tracing::info!(target: "mind::edit", file, chars = next.len(), "self edit applied");

        let prev_chars = prev.chars().count();
        let prev_tail: String = prev.chars().skip(prev_chars.saturating_sub(SNIPPET)).collect();
        let next_head: String = next.chars().take(SNIPPET).collect();
        serde_json::json!({ "ok": true, "file": file, "prev": prev_tail, "next": next_head })
    }
}
