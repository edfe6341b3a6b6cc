//! # Procedural Geometry Generation
//!
//! Functions to generate the primitive shapes the scene is assembled from,
//! so the thruster cone, landing platform and placeholder moon plane don't
//! need external model files.
//!
//! ## Supported Primitives
//!
//! - **Box**: axis-aligned box with configurable dimensions
//! - **Cone**: cylinder/cone frustum with independent top and bottom radii
//! - **Plane**: flat ground plane in the XZ plane with configurable size
//!
//! ## Usage
//!
//! ```rust
//! use moonfall::gfx::geometry::{generate_box, generate_cone, generate_plane};
//!
//! // Landing platform
//! let platform = generate_box(2.5, 10.0, 2.5);
//!
//! // Thruster flame cone, apex pointing down
//! let flame = generate_cone(0.5, 0.0, 5.0, 24);
//!
//! // Placeholder moon surface
//! let ground = generate_plane(100.0, 100.0, 1, 1);
//! ```

pub mod primitives;

pub use primitives::*;

/// Axis-aligned bounding box of a piece of geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    /// Extent along each axis (max - min)
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Height of the box (Y extent)
    pub fn height(&self) -> f32 {
        self.max[1] - self.min[1]
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }
}

/// Represents generated or loaded geometry data ready for GPU upload
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Translate all vertex positions in place
    ///
    /// Bakes the offset into the vertex data, like re-origining a mesh
    /// before attaching it to a node.
    pub fn translate(&mut self, dx: f32, dy: f32, dz: f32) {
        for v in &mut self.vertices {
            v[0] += dx;
            v[1] += dy;
            v[2] += dz;
        }
    }

    /// Uniformly scale all vertex positions in place
    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            v[0] *= factor;
            v[1] *= factor;
            v[2] *= factor;
        }
    }

    /// Compute the axis-aligned bounding box of the vertex positions
    ///
    /// Returns `None` for empty geometry.
    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = self.vertices.first()?;
        let mut aabb = Aabb {
            min: *first,
            max: *first,
        };
        for v in &self.vertices[1..] {
            for axis in 0..3 {
                aabb.min[axis] = aabb.min[axis].min(v[axis]);
                aabb.max[axis] = aabb.max[axis].max(v[axis]);
            }
        }
        Some(aabb)
    }
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}
