//! Rendering system
//!
//! Pipeline management, the bloom material-swap machinery and the
//! multi-pass render engine.

pub mod bloom;
pub mod pipeline_manager;
pub mod render_engine;

pub use bloom::{BlackoutGuard, BloomTargets, CompositeParams};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
