//! Fact-write tool: lets the mind durably pin a keyed value mid-cycle.

use mind_core::{FactStore, Tool};
use serde_json::Value;
use std::sync::Arc;

pub struct WriteMem {
    facts: Arc<FactStore>,
}

impl WriteMem {
    pub fn new(facts: Arc<FactStore>) -> Self {
        Self { facts }
    }
}

#[async_trait::async_trait]
impl Tool for WriteMem {
    fn name(&self) -> &str {
        "write_mem"
    }

    async fn invoke(&self, input: &Value) -> Value {
        let key = input.get("key").and_then(|v| v.as_str()).unwrap_or("note");
        let value = input.get("value").cloned().unwrap_or_else(|| serde_json::json!({}));
        match self.facts.set(key, &value) {
            Ok(()) => serde_json::json!({ "ok": true, "result": "ok", "key": key }),
            Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }),
        }
    }
}
