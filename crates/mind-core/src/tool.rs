//! Tool seam: bounded-effect actions the mind may invoke mid-cycle.

use serde_json::Value;
use std::sync::Arc;

/// One invocable tool. Implementations never return an error: every outcome,
/// including failure, is a structured JSON value with an `ok` flag so the
/// result can be fed back into the loop and the ledger verbatim.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    async fn invoke(&self, input: &Value) -> Value;
}

/// Dispatches actions to registered tools by name.
pub struct ToolRouter {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRouter {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        tracing::debug!(target: "mind::tools", name = tool.name(), "tool registered");
        self.tools.push(tool);
    }

    /// Runs the named tool. Unknown names produce a structured failure
    /// rather than an error so a hallucinated tool name cannot break a cycle.
    pub async fn invoke(&self, name: &str, input: &Value) -> Value {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.invoke(input).await,
            None => {
                tracing::debug!(target: "mind::tools", name, "unknown tool requested");
                serde_json::json!({ "ok": false, "error": "unknown tool" })
            }
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}
