// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles materials, textures, buffers, and bind groups for rendering.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig};
pub use material::{Material, MaterialId, MaterialManager, BLACKOUT_MATERIAL};
pub use texture_resource::TextureResource;
