//! mind-tools: concrete tools registered with the mind loop's router, plus
//! the self-edit surface exposed through the gateway.

mod math;
mod render_delta;
mod self_edit;
mod write_mem;

pub use math::{math_eval, MathEval};
pub use render_delta::RenderDelta;
pub use self_edit::SelfEdit;
pub use write_mem::WriteMem;
