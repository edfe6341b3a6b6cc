//! # Scene Management Module
//!
//! Owns the retained scene graph: the node list, vertex data structures and
//! the OBJ model loader. Nodes carry the transform, material reference and
//! glow-set membership the renderer consumes each frame.

pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use node::{DrawNode, Mesh, NodeId, SceneNode};
pub use scene::{load_obj_model, LoadedModel, Scene};
pub use vertex::Vertex3D;
