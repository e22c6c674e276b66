//! Direct render-proposal tool: applies a whitelisted delta immediately
//! instead of waiting for the end-of-cycle heuristic walk.

use mind_core::{StateCell, Tool};
use serde_json::Value;
use std::sync::Arc;

pub struct RenderDelta {
    state: Arc<StateCell>,
}

impl RenderDelta {
    pub fn new(state: Arc<StateCell>) -> Self {
        Self { state }
    }
}

#[async_trait::async_trait]
impl Tool for RenderDelta {
    fn name(&self) -> &str {
        "render"
    }

    async fn invoke(&self, input: &Value) -> Value {
        let next = self.state.snapshot().propose(input);
        self.state.publish(next.clone());
        serde_json::json!({ "ok": true, "renderState": next })
    }
}
