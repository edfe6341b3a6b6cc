// src/lib.rs
//! Moonfall
//!
//! An animated rocket-landing scene rendered with wgpu: a scripted
//! descent onto a landing platform, selective bloom on the thruster
//! flame, shadow mapping and an orbit camera that tracks the rocket.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod rocket;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::MoonfallApp;
pub use config::{AssetPaths, VisualTuning};
pub use error::AssetLoadError;

/// Creates the application with default tuning and asset paths
pub fn default() -> anyhow::Result<MoonfallApp> {
    MoonfallApp::new()
}
