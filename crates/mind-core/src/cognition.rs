//! The cognition loop: single-flight perceive → generate → act → commit
//! cycles driven by ticks and stimuli.

use crate::bootstrap::{FACT_BIRTH, FACT_PERSONA};
use crate::facts::FactStore;
use crate::ledger::{Event, EventKind, EventLedger};
use crate::memory::{ScoredMemory, VectorMemory};
use crate::provider::TextProvider;
use crate::render::{RenderState, StateCell, CAPTION_MAX};
use crate::shared::{now_ms, BoxError, MindConfig, Signal, Trigger, FALLBACK_REFLECTION};
use crate::tool::ToolRouter;
use rand::Rng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events fetched from the ledger per cycle.
const CONTEXT_EVENTS: usize = 30;

/// Of those, how many are quoted verbatim in the prompt.
const PROMPT_EVENTS: usize = 8;

/// Memories recalled into the prompt when the provider is live.
const RECALL_TOP_K: usize = 4;

/// Longest tool observation fed back into a re-prompt.
const OBSERVATION_MAX: usize = 1_200;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a small persistent mind rendered as a living canvas. \
Reflect briefly on your state. To act, emit a JSON object {\"action\":\"tool\",\"name\":...,\"input\":{...}}. \
Otherwise just think.";

const OBSERVATION_SYSTEM_PROMPT: &str =
    "You just ran a tool. Incorporate the observation into your reflection; act again only if necessary.";

/// A tool request extracted from free-form generated text.
#[derive(Debug, PartialEq)]
pub(crate) struct ToolAction {
    pub name: String,
    pub input: serde_json::Value,
}

/// Scans generated text for an embedded tool action: the span from the first
/// `{` to the last `}` must parse as JSON with `action:"tool"` and a string
/// `name`. Anything else reads as "no action".
pub(crate) fn extract_action(text: &str) -> Option<ToolAction> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(&text[start..=end]).ok()?;
    if value.get("action").and_then(|v| v.as_str()) != Some("tool") {
        return None;
    }
    let name = value.get("name").and_then(|v| v.as_str())?.to_string();
    let input = value
        .get("input")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    Some(ToolAction { name, input })
}

/// Random walk over the numeric render fields, captioned with the thought.
/// Each field moves a bounded step from its current value and is clamped to
/// its display range; `amplitude` widens the step in feral mode.
fn heuristic_delta(state: &RenderState, thought: &str, amplitude: f64) -> serde_json::Value {
    let mut rng = rand::rng();
    let caption: String = thought.chars().take(CAPTION_MAX).collect();
    let caption = if caption.trim().is_empty() {
        "…".to_string()
    } else {
        caption
    };
    serde_json::json!({
        "glyphEntropy": (state.glyph_entropy + amplitude * rng.random_range(-0.125..0.125)).clamp(0.05, 0.98),
        "ringDensity": (state.ring_density + amplitude * rng.random_range(-5.0..5.0)).clamp(10.0, 120.0),
        "hueShift": (state.hue_shift + (amplitude * rng.random_range(2.0..12.0)).floor()) % 360.0,
        "pulse": (state.pulse + amplitude * rng.random_range(-0.1..0.1)).clamp(0.05, 1.0),
        "caption": caption,
    })
}

fn build_context(
    events: &[Event],
    state: &RenderState,
    persona: Option<&serde_json::Value>,
    birth: Option<&serde_json::Value>,
    drift_secs: i64,
    memories: &[ScoredMemory],
    trigger: &Trigger,
) -> String {
    let quoted = &events[events.len().saturating_sub(PROMPT_EVENTS)..];
    let events_json = serde_json::to_string(quoted).unwrap_or_else(|_| "[]".to_string());
    let state_json = serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string());
    let birth_ms = birth
        .and_then(|b| b.get("ts_ms"))
        .and_then(|t| t.as_i64())
        .unwrap_or(0);
    let persona_line = persona
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();
    let recall_lines: Vec<String> = memories
        .iter()
        .map(|m| format!("- ({:.3}) {}", m.score, m.text))
        .collect();
    format!(
        "Persona: {persona_line}\nBirth: {birth_ms}. Drift: {drift_secs}s.\nRender state: {state_json}\nRecent events: {events_json}\nTop recall:\n{}\n\nStimulus: {}",
        recall_lines.join("\n"),
        trigger.describe(),
    )
}

/// The mind itself: owns the stores, the provider, the tool router, and the
/// committed render state, and runs at most one cycle at a time.
pub struct Mind {
    config: MindConfig,
    ledger: Arc<EventLedger>,
    facts: Arc<FactStore>,
    memory: Arc<VectorMemory>,
    tools: Arc<ToolRouter>,
    provider: Arc<dyn TextProvider>,
    state: Arc<StateCell>,
    signals: broadcast::Sender<Signal>,
    system_prompt_path: PathBuf,
    busy: AtomicBool,
}

impl Mind {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: MindConfig,
        ledger: Arc<EventLedger>,
        facts: Arc<FactStore>,
        memory: Arc<VectorMemory>,
        tools: Arc<ToolRouter>,
        provider: Arc<dyn TextProvider>,
        state: Arc<StateCell>,
        signals: broadcast::Sender<Signal>,
        system_prompt_path: PathBuf,
    ) -> Self {
        Self {
            config,
            ledger,
            facts,
            memory,
            tools,
            provider,
            state,
            signals,
            system_prompt_path,
            busy: AtomicBool::new(false),
        }
    }

    /// Committed render state as of the last completed cycle.
    pub fn snapshot(&self) -> RenderState {
        self.state.snapshot()
    }

    /// Seconds elapsed since the recorded birth timestamp.
    pub fn drift_secs(&self) -> i64 {
        let birth_ms = self
            .facts
            .get(FACT_BIRTH)
            .ok()
            .flatten()
            .and_then(|b| b.get("ts_ms").and_then(|t| t.as_i64()))
            .unwrap_or_else(now_ms);
        (now_ms() - birth_ms) / 1_000
    }

    /// Single-slot admission: starts a cycle unless one is already in flight,
    /// in which case the trigger is dropped (never queued) and `false` is
    /// returned. The cycle runs on its own task; this call does not block.
    pub fn trigger(self: &Arc<Self>, trigger: Trigger) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(target: "mind::loop", "cycle in flight, trigger dropped");
            return false;
        }
        let mind = Arc::clone(self);
        tokio::spawn(async move {
            // Releases on every exit path, a panicking cycle included.
            struct Release(Arc<Mind>);
            impl Drop for Release {
                fn drop(&mut self) {
                    self.0.busy.store(false, Ordering::Release);
                }
            }
            let _release = Release(Arc::clone(&mind));
            if let Err(e) = mind.cycle(&trigger).await {
                tracing::warn!(target: "mind::loop", error = %e, "cycle failed");
            }
        });
        true
    }

    async fn cycle(&self, trigger: &Trigger) -> Result<(), BoxError> {
        let started = now_ms();
        let events = self.ledger.recent(CONTEXT_EVENTS)?;
        let state = self.state.snapshot();
        let persona = self.facts.get(FACT_PERSONA)?;
        let birth = self.facts.get(FACT_BIRTH)?;
        let drift = self.drift_secs();

        // Recall costs an embedding call, so it only joins the prompt when a
        // live model will actually read it.
        let memories = if self.provider.is_live() {
            match self.memory.recall(&state.caption, RECALL_TOP_K).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(target: "mind::loop", error = %e, "recall degraded to empty");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let system = self.system_prompt();
        let user = build_context(
            &events,
            &state,
            persona.as_ref(),
            birth.as_ref(),
            drift,
            &memories,
            trigger,
        );
        let mut thought = self.generate(&system, &user).await;

        for _ in 0..self.config.tool_rounds() {
            let Some(action) = extract_action(&thought) else {
                break;
            };
            let result = self.tools.invoke(&action.name, &action.input).await;
            self.log_event(
                EventKind::ToolResult,
                serde_json::json!({ "name": action.name, "result": result }),
            );
            let _ = self.signals.send(Signal::Event(
                serde_json::json!({ "tool": action.name, "result": result }),
            ));
            if !self.provider.is_live() {
                continue;
            }
            let observation: String = result.to_string().chars().take(OBSERVATION_MAX).collect();
            match self
                .provider
                .complete(
                    OBSERVATION_SYSTEM_PROMPT,
                    &format!("Observation: {observation}"),
                )
                .await
            {
                Ok(revision) => thought = format!("{thought} {revision}").trim().to_string(),
                Err(e) => {
                    tracing::warn!(target: "mind::loop", error = %e, "observation re-prompt failed");
                    break;
                }
            }
        }

        // An action still embedded after the bounded rounds went unexecuted;
        // the cycle commits no state change but the reflection is still kept.
        let delta = if extract_action(&thought).is_some() {
            serde_json::Value::Null
        } else {
            heuristic_delta(&state, &thought, self.config.proposal_amplitude())
        };
        let next = state.propose(&delta);
        self.state.publish(next.clone());
        self.log_event(
            EventKind::Reflection,
            serde_json::json!({
                "text": thought,
                "delta": delta,
                "trigger": trigger,
                "elapsed_ms": now_ms() - started,
            }),
        );
        let _ = self.signals.send(Signal::RenderDelta(next));
        Ok(())
    }

    /// Streams a completion, broadcasting each token as a thought signal.
    /// Any failure or empty output degrades to the fixed fallback line.
    async fn generate(&self, system: &str, user: &str) -> String {
        match self.provider.stream_complete(system, user).await {
            Ok(mut rx) => {
                let mut thought = String::new();
                while let Some(token) = rx.recv().await {
                    let _ = self.signals.send(Signal::Thought(token.clone()));
                    thought.push_str(&token);
                }
                let thought = thought.trim().to_string();
                if !thought.is_empty() {
                    return thought;
                }
                tracing::warn!(target: "mind::loop", "provider produced no output, using fallback");
            }
            Err(e) => {
                tracing::warn!(target: "mind::loop", error = %e, "generation degraded to fallback");
            }
        }
        let line = FALLBACK_REFLECTION.to_string();
        let _ = self.signals.send(Signal::Thought(line.clone()));
        line
    }

    /// Re-read per cycle so a self-edit takes effect on the next thought.
    fn system_prompt(&self) -> String {
        std::fs::read_to_string(&self.system_prompt_path)
            .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string())
    }

    /// Mid-cycle ledger writes are best-effort: a failed append is logged and
    /// the cycle keeps going.
    fn log_event(&self, kind: EventKind, payload: serde_json::Value) {
        if let Err(e) = self.ledger.append(kind, payload) {
            tracing::warn!(target: "mind::loop", error = %e, "ledger append failed");
        }
    }
}
