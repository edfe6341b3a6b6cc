//! Scene container and OBJ model loading
//!
//! The scene owns the flat list of [`SceneNode`]s, the camera and the
//! material library. Nodes are looked up by the stable [`NodeId`] handed
//! out at insertion, which is also the key used by the bloom pass when it
//! temporarily swaps materials.

use cgmath::Vector3;
use wgpu::Device;

use crate::error::AssetLoadError;
use crate::gfx::{
    camera::CameraManager,
    geometry::GeometryData,
    resources::material::{Material, MaterialManager},
};

use super::node::{Mesh, NodeId, SceneNode};

/// Main scene containing nodes, materials, camera and background color
pub struct Scene {
    pub camera_manager: CameraManager,
    pub nodes: Vec<SceneNode>,
    pub material_manager: MaterialManager,
    /// Clear color used when rendering the scene; the bloom pass swaps this
    /// to black for the duration of the glow render
    pub background: wgpu::Color,
    next_node_id: NodeId,
}

impl Scene {
    /// Creates a new scene with the given camera manager
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            nodes: Vec::new(),
            material_manager: MaterialManager::new(),
            background: wgpu::Color {
                r: 0.13,
                g: 0.13,
                b: 0.2,
                a: 1.0,
            },
            next_node_id: 1,
        }
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
    }

    /// Inserts a node and returns its stable identity
    pub fn add_node(&mut self, mut node: SceneNode) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        node.id = id;
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Loads a 3D model from an OBJ file and adds it as a single node
    ///
    /// Materials from the accompanying MTL file are registered in the
    /// material manager; the node references the first model's material.
    pub fn add_object(&mut self, path: &str) -> Result<NodeId, AssetLoadError> {
        let model = load_obj_model(path)?;

        for material in model.materials {
            if self.material_manager.get_material(&material.name).is_none() {
                self.material_manager.add_material(material);
            }
        }

        let meshes = model
            .geometries
            .iter()
            .map(Mesh::from_geometry)
            .collect::<Vec<_>>();

        let name = if model.name.is_empty() {
            path.to_string()
        } else {
            model.name
        };
        let mut node = SceneNode::new(&name, meshes);
        if let Some(material_name) = model.material_of_first_model {
            node.set_material(&material_name);
        }

        log::info!(
            "loaded model '{}' ({} meshes)",
            node.name,
            node.meshes.len()
        );
        Ok(self.add_node(node))
    }

    /// Creates a new material and adds it to the material manager
    pub fn add_material(
        &mut self,
        name: &str,
        base_color: [f32; 4],
        metallic: f32,
        roughness: f32,
    ) -> &mut Material {
        let material = Material::new(name, base_color, metallic, roughness);
        self.material_manager.add_material(material);
        self.material_manager.get_material_mut(name).unwrap()
    }

    /// Initializes GPU resources for all nodes and materials
    ///
    /// Must be called after the GPU context is available and before rendering.
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for node in self.nodes.iter_mut() {
            if node.gpu_resources.is_none() {
                node.init_gpu_resources(device);
            }
        }

        self.material_manager.update_all_gpu_resources(device, queue);
    }

    /// Updates all node transforms and syncs them to the GPU
    pub fn update_all_transforms(&mut self, queue: &wgpu::Queue) {
        for node in &mut self.nodes {
            if node.gpu_resources.is_some() {
                node.update_transform(queue);
            }
        }
    }

    /// Gets the material for rendering a node, falling back to the default
    pub fn get_material_for_node(&self, node: &SceneNode) -> &Material {
        self.material_manager
            .get_material_for_node(node.material.as_ref())
    }

    /// Gets the total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// A model loaded from an OBJ file, before it becomes a scene node
pub struct LoadedModel {
    pub name: String,
    pub geometries: Vec<GeometryData>,
    pub materials: Vec<Material>,
    pub material_of_first_model: Option<String>,
}

impl LoadedModel {
    /// Bakes a uniform scale into every geometry
    pub fn scale(&mut self, factor: f32) {
        for geometry in &mut self.geometries {
            geometry.scale(factor);
        }
    }

    /// Bounding box over all geometries, `None` if the model is empty
    pub fn bounding_box(&self) -> Option<crate::gfx::geometry::Aabb> {
        let mut boxes = self.geometries.iter().filter_map(GeometryData::bounding_box);
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| acc.union(&b)))
    }
}

/// Loads an OBJ file with automatic material extraction
///
/// Missing normals are reconstructed from face geometry. A missing MTL file
/// is tolerated; a missing or malformed OBJ file is not.
pub fn load_obj_model(path: &str) -> Result<LoadedModel, AssetLoadError> {
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|source| AssetLoadError::Model {
        path: path.to_string(),
        source,
    })?;

    let materials = materials.unwrap_or_else(|_| {
        log::warn!("no MTL file found for '{}', using default materials", path);
        Vec::new()
    });

    let mut loaded_materials = Vec::new();
    for (i, mtl) in materials.iter().enumerate() {
        let material_name = if mtl.name.is_empty() {
            format!("material_{}", i)
        } else {
            mtl.name.clone()
        };

        let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
        loaded_materials.push(Material::new(
            &material_name,
            [
                diffuse[0],
                diffuse[1],
                diffuse[2],
                mtl.dissolve.unwrap_or(1.0),
            ],
            0.0, // MTL has no direct metallic value
            1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
        ));
    }

    let mut geometries = Vec::new();
    for m in models.iter() {
        let mesh = &m.mesh;

        let mut geometry = GeometryData::new();
        geometry.vertices = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        geometry.indices = mesh.indices.clone();

        if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            geometry.normals = mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect();
        } else {
            geometry.normals = calculate_vertex_normals(&geometry.vertices, &geometry.indices);
        }

        geometries.push(geometry);
    }

    if geometries.is_empty() {
        return Err(AssetLoadError::EmptyModel {
            path: path.to_string(),
        });
    }

    let first_model = &models[0];
    let material_of_first_model = first_model.mesh.material_id.and_then(|material_id| {
        materials.get(material_id).map(|mtl| {
            if mtl.name.is_empty() {
                format!("material_{}", material_id)
            } else {
                mtl.name.clone()
            }
        })
    });

    Ok(LoadedModel {
        name: first_model.name.clone(),
        geometries,
        materials: loaded_materials,
        material_of_first_model,
    })
}

/// Averages face normals per vertex for OBJ files that ship without normals
fn calculate_vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![[0.0f32; 3]; positions.len()];

    for triangle in indices.chunks(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];

        let v0 = Vector3::from(positions[i0]);
        let v1 = Vector3::from(positions[i1]);
        let v2 = Vector3::from(positions[i2]);

        let face_normal = (v1 - v0).cross(v2 - v0);

        for &idx in &[i0, i1, i2] {
            normals[idx][0] += face_normal.x;
            normals[idx][1] += face_normal.y;
            normals[idx][2] += face_normal.z;
        }
    }

    for n in &mut normals {
        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if length > 0.0 {
            n[0] /= length;
            n[1] /= length;
            n[2] /= length;
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{camera_controller::CameraController, orbit_camera::OrbitCamera};
    use crate::gfx::geometry::generate_box;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(50.0, 0.0, 0.0, Vector3::new(0.0, 50.0, 0.0), 1.0);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    #[test]
    fn node_ids_are_stable_and_unique() {
        let mut scene = test_scene();
        let a = scene.add_node(SceneNode::from_geometry("a", &generate_box(1.0, 1.0, 1.0)));
        let b = scene.add_node(SceneNode::from_geometry("b", &generate_box(1.0, 1.0, 1.0)));
        assert_ne!(a, b);
        assert_eq!(scene.node(a).unwrap().name, "a");
        assert_eq!(scene.node(b).unwrap().name, "b");
    }

    #[test]
    fn glow_tag_is_per_node_and_idempotent() {
        let mut scene = test_scene();
        let plain = scene.add_node(SceneNode::from_geometry("hull", &generate_box(1.0, 1.0, 1.0)));
        let tagged = scene.add_node(
            SceneNode::from_geometry("flame", &generate_box(1.0, 1.0, 1.0)).with_glow(),
        );

        assert!(!scene.node(plain).unwrap().is_glow());
        assert!(scene.node(tagged).unwrap().is_glow());

        // Re-tagging changes nothing
        scene.node_mut(tagged).unwrap().mark_glow();
        assert!(scene.node(tagged).unwrap().is_glow());
        assert!(!scene.node(plain).unwrap().is_glow());
    }

    #[test]
    fn normals_are_reconstructed_when_missing() {
        // A single upward-facing triangle
        let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]];
        let normals = calculate_vertex_normals(&positions, &[0, 1, 2]);
        for n in normals {
            assert!((n[1] - 1.0).abs() < 1e-6);
        }
    }
}
