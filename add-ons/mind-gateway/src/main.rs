//! Axum gateway: the mind's only outer surface. HTTP API for state, memory,
//! stimuli and self-edits, a WebSocket stream of live signals, and the idle
//! tick driver.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Json, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use mind_core::{
    ingest_origin_seeds, seed_birth, seed_persona, select_provider, EventKind, EventLedger,
    FactStore, Mind, MindConfig, Signal, StateCell, ToolRouter, Trigger, VectorMemory,
    FACT_BIRTH, FACT_PERSONA,
};
use mind_tools::{MathEval, RenderDelta, SelfEdit, WriteMem};
use std::path::Path as StdPath;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[mind-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(MindConfig::load().expect("load MindConfig"));
    let storage = StdPath::new(&config.storage_path);
    let db = sled::open(storage.join("mind_vault")).expect("open mind_vault");

    let provider = select_provider(&config);
    let ledger = Arc::new(EventLedger::open(&db).expect("open event ledger"));
    let facts = Arc::new(FactStore::open(&db).expect("open fact store"));
    let memory = Arc::new(VectorMemory::open(&db, Arc::clone(&provider)).expect("open vector memory"));

    match seed_birth(&facts) {
        Ok(true) => tracing::info!("first boot: birth recorded"),
        Ok(false) => tracing::debug!("birth already recorded"),
        Err(e) => tracing::warn!("failed to record birth: {}", e),
    }
    match seed_persona(&facts, StdPath::new("personas/seed.md")) {
        Ok(true) => tracing::info!("first boot: persona installed"),
        Ok(false) => tracing::debug!("persona already installed"),
        Err(e) => tracing::warn!("failed to install persona: {}", e),
    }
    match ingest_origin_seeds(&facts, &memory, &ledger, StdPath::new("seeds/origin.txt")).await {
        Ok(true) => tracing::info!("first boot: origin seeds ingested"),
        Ok(false) => tracing::debug!("origin seeds already ingested (or no seed file)"),
        Err(e) => tracing::warn!("failed to ingest origin seeds: {}", e),
    }

    let state_cell = Arc::new(StateCell::default());
    let mut tools = ToolRouter::new();
    tools.register(Arc::new(MathEval));
    tools.register(Arc::new(WriteMem::new(Arc::clone(&facts))));
    tools.register(Arc::new(RenderDelta::new(Arc::clone(&state_cell))));

    let (signals, _) = broadcast::channel(256);
    let mind = Arc::new(Mind::new(
        (*config).clone(),
        Arc::clone(&ledger),
        Arc::clone(&facts),
        Arc::clone(&memory),
        Arc::new(tools),
        Arc::clone(&provider),
        Arc::clone(&state_cell),
        signals.clone(),
        "prompts/system.txt".into(),
    ));

    if let Err(e) = ledger.append(
        EventKind::System,
        serde_json::json!({ "boot": true, "feral": config.feral, "app_name": config.app_name }),
    ) {
        tracing::warn!("failed to log boot event: {}", e);
    }

    tokio::spawn(tick_loop(Arc::clone(&mind), config.effective_tick()));

    let app = build_app(AppState {
        config: Arc::clone(&config),
        mind,
        ledger,
        facts,
        memory,
        self_edit: Arc::new(SelfEdit::new(".")),
        signals,
    });

    let port = config.port;
    let app_name = config.app_name.clone();
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("{} listening on {}", app_name, addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

/// Fires idle ticks at the configured interval. Each tick is an admission
/// attempt; while a cycle is in flight the tick is simply dropped.
async fn tick_loop(mind: Arc<Mind>, tick: std::time::Duration) {
    tracing::info!(
        target: "mind::daemon",
        tick_ms = tick.as_millis() as u64,
        "tick loop started"
    );
    let mut interval = tokio::time::interval(tick);
    interval.tick().await;
    loop {
        interval.tick().await;
        let drift = mind.drift_secs();
        mind.trigger(Trigger::Tick { drift_secs: drift });
    }
}

fn build_app(state: AppState) -> Router {
    let frontend_enabled = state.config.frontend_enabled;

    let mut app = Router::new()
        .route("/api/state", get(get_state))
        .route("/api/memory", get(get_memory))
        .route("/api/ingest", post(ingest))
        .route("/api/recall", post(recall))
        .route("/api/stimulus", post(stimulus))
        .route("/api/edit", post(edit))
        .route("/ws", get(ws_stream))
        .with_state(state);

    if frontend_enabled {
        app = app.fallback_service(ServeDir::new("public"));
    }

    app
}

#[derive(Clone)]
struct AppState {
    config: Arc<MindConfig>,
    mind: Arc<Mind>,
    ledger: Arc<EventLedger>,
    facts: Arc<FactStore>,
    memory: Arc<VectorMemory>,
    self_edit: Arc<SelfEdit>,
    signals: broadcast::Sender<Signal>,
}

/// GET /api/state – committed render state plus identity facts.
async fn get_state(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "feral": state.config.feral,
        "renderState": state.mind.snapshot(),
        "birth": state.facts.get(FACT_BIRTH).ok().flatten(),
        "drift": state.mind.drift_secs(),
    }))
}

/// GET /api/memory – persona and store sizes.
async fn get_memory(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "persona": state.facts.get(FACT_PERSONA).ok().flatten(),
        "memories": state.memory.len(),
        "events": state.ledger.len(),
    }))
}

#[derive(serde::Deserialize)]
struct IngestRequest {
    text: String,
    #[serde(default)]
    meta: Option<serde_json::Value>,
}

/// POST /api/ingest – embed and persist one memory.
async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<axum::Json<serde_json::Value>, (StatusCode, axum::Json<serde_json::Value>)> {
    let meta = req.meta.clone().unwrap_or_else(|| serde_json::json!({}));
    match state.memory.ingest(&req.text, meta).await {
        Ok(id) => {
            if let Err(e) = state.ledger.append(
                EventKind::Ingest,
                serde_json::json!({ "id": id, "chars": req.text.len() }),
            ) {
                tracing::warn!(target: "mind::gateway", error = %e, "ingest event not logged");
            }
            Ok(axum::Json(serde_json::json!({ "ok": true, "id": id })))
        }
        Err(e) => {
            tracing::error!(target: "mind::gateway", error = %e, "ingest failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
            ))
        }
    }
}

#[derive(serde::Deserialize)]
struct RecallRequest {
    query: String,
    #[serde(default)]
    k: Option<usize>,
}

/// POST /api/recall – top-k memories by similarity to the query.
async fn recall(
    State(state): State<AppState>,
    Json(req): Json<RecallRequest>,
) -> Result<axum::Json<serde_json::Value>, (StatusCode, axum::Json<serde_json::Value>)> {
    let k = req.k.unwrap_or(5);
    match state.memory.recall(&req.query, k).await {
        Ok(results) => Ok(axum::Json(serde_json::json!({ "ok": true, "results": results }))),
        Err(e) => {
            tracing::error!(target: "mind::gateway", error = %e, "recall failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "ok": false, "error": e.to_string() })),
            ))
        }
    }
}

#[derive(serde::Deserialize)]
struct StimulusRequest {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// POST /api/stimulus – record a perception and wake the loop. Returns
/// immediately; `accepted` reports whether a cycle was actually admitted.
async fn stimulus(
    State(state): State<AppState>,
    Json(req): Json<StimulusRequest>,
) -> axum::Json<serde_json::Value> {
    let payload = serde_json::json!({ "type": req.kind, "data": req.data });
    if let Err(e) = state.ledger.append(EventKind::Perception, payload.clone()) {
        tracing::warn!(target: "mind::gateway", error = %e, "perception not logged");
    }
    let accepted = state.mind.trigger(Trigger::Stimulus { data: payload });
    axum::Json(serde_json::json!({ "ok": true, "accepted": accepted }))
}

#[derive(serde::Deserialize)]
struct EditRequest {
    kind: String,
    text: String,
}

/// POST /api/edit – overwrite the persona or system prompt.
async fn edit(
    State(state): State<AppState>,
    Json(req): Json<EditRequest>,
) -> axum::Json<serde_json::Value> {
    let outcome = state.self_edit.edit(&req.kind, &req.text);
    if let Err(e) = state.ledger.append(
        EventKind::System,
        serde_json::json!({ "self_edit": req.kind, "outcome": outcome }),
    ) {
        tracing::warn!(target: "mind::gateway", error = %e, "edit event not logged");
    }
    axum::Json(outcome)
}

/// GET /ws – live signal stream. Every connected observer gets every frame;
/// a slow reader that lags the broadcast buffer just skips ahead.
async fn ws_stream(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let rx = state.signals.subscribe();
    ws.on_upgrade(move |socket| forward_signals(socket, rx))
}

async fn forward_signals(mut socket: WebSocket, mut rx: broadcast::Receiver<Signal>) {
    loop {
        match rx.recv().await {
            Ok(signal) => {
                let Ok(text) = serde_json::to_string(&signal) else {
                    continue;
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::debug!(target: "mind::gateway", dropped = n, "observer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
