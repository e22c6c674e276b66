//! mind-core: the cognition core. Event ledger, fact store, vector memory,
//! render state, provider seam, tool seam, and the single-flight mind loop.

mod bootstrap;
mod cognition;
mod facts;
mod ledger;
mod memory;
mod provider;
mod render;
mod shared;
mod tool;

pub use bootstrap::{
    ingest_origin_seeds, seed_birth, seed_persona, FACT_BIRTH, FACT_PERSONA, FACT_SEED_INGESTED,
};
pub use cognition::Mind;
pub use facts::FactStore;
pub use ledger::{Event, EventKind, EventLedger};
pub use memory::{cosine, fallback_embedding, MemoryRecord, ScoredMemory, VectorMemory};
pub use provider::{select_provider, LocalProvider, OpenAiProvider, TextProvider, ENV_API_KEY};
pub use render::{RenderState, StateCell, CAPTION_MAX};
pub use shared::{now_ms, BoxError, MindConfig, Signal, Trigger, FALLBACK_REFLECTION};
pub use tool::{Tool, ToolRouter};
