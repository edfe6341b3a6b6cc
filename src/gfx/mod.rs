//! Graphics layer: camera, geometry, rendering, resources and scene graph.

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
