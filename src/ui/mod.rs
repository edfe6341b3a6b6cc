//! # User Interface Module
//!
//! Dear ImGui overlay: the [`UiManager`] handles platform integration and
//! rendering, [`panel`] holds the scene's settings window.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{settings_panel, SceneSettings, Telemetry};
