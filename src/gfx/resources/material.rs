//! Material system for PBR rendering
//!
//! Materials are stored centrally in [`MaterialManager`] and nodes reference
//! them by ID, which is what makes the bloom pass's temporary material swap
//! cheap: only the ID on the node changes, GPU resources stay put.
//!
//! The manager always carries two built-ins: `"default"` (neutral grey) and
//! [`BLACKOUT_MATERIAL`], the flat black material the bloom pass substitutes
//! on every non-glow node.

use std::collections::HashMap;
use wgpu::Device;

use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// ID of the flat black material swapped onto non-glow nodes during the
/// bloom pass. Emits nothing and reads as pure black in the glow buffer.
pub const BLACKOUT_MATERIAL: &str = "blackout";

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive_strength: f32,
    /// 1.0 for unlit materials; the lit shader returns flat color for these
    pub unlit: f32,
    pub emissive: [f32; 3],
    _padding: f32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Material bind group management
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Material Bind Group");

        MaterialBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &Device, ubo: &MaterialUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Material Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

/// Material definition with PBR properties
///
/// Contains material properties and GPU resources. Materials are stored
/// centrally in MaterialManager and shared between nodes.
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Emissive color, added unlit on top of the shaded result
    pub emissive: [f32; 3],
    pub emissive_strength: f32,
    /// Unlit materials skip lighting entirely (thruster flame, blackout)
    pub unlit: bool,

    // GPU resources - shared by all nodes using this material
    material_ubo: Option<MaterialUBO>,
    material_bindings: Option<MaterialBindings>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0, 0.0, 0.0],
            emissive_strength: 0.0,
            unlit: false,
            material_ubo: None,
            material_bindings: None,
        }
    }
}

impl Material {
    /// Creates a new material with basic PBR properties
    ///
    /// # Arguments
    /// * `name` - Unique name for this material
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            emissive: [0.0, 0.0, 0.0],
            emissive_strength: 0.0,
            unlit: false,
            material_ubo: None,
            material_bindings: None,
        }
    }

    /// Builder pattern: Set emissive color
    pub fn with_emission(mut self, r: f32, g: f32, b: f32, strength: f32) -> Self {
        self.emissive = [r, g, b];
        self.emissive_strength = strength;
        self
    }

    /// Builder pattern: Render without lighting
    pub fn with_unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    /// GPU-layout view of this material's properties
    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            metallic: self.metallic,
            roughness: self.roughness,
            emissive_strength: self.emissive_strength,
            unlit: if self.unlit { 1.0 } else { 0.0 },
            emissive: self.emissive,
            _padding: 0.0,
        }
    }

    /// Updates GPU resources for this material
    ///
    /// Must be called after material properties change to sync with GPU.
    pub fn update_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        if self.material_ubo.is_none() {
            self.material_ubo = Some(MaterialUBO::new(device));
        }

        if self.material_bindings.is_none() {
            let mut bindings = MaterialBindings::new(device);
            bindings.create_bind_group(device, self.material_ubo.as_ref().unwrap());
            self.material_bindings = Some(bindings);
        }

        let uniform_data = self.to_uniform();

        if let Some(ubo) = &mut self.material_ubo {
            ubo.update_content(queue, uniform_data);
        }
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.material_bindings.as_ref().map(|b| b.bind_groups())
    }

    /// Gets the bind group layout for pipeline creation
    pub fn get_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.material_bindings
            .as_ref()
            .map(|b| b.bind_group_layouts())
    }
}

/// Manages all materials in the engine
///
/// Centralized storage for all materials. Nodes reference materials by ID
/// rather than storing material data directly, enabling efficient sharing
/// of GPU resources between nodes.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
}

impl MaterialManager {
    /// Creates a new material manager with the built-in materials
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            default_material_id: "default".to_string(),
        };

        manager.materials.insert("default".to_string(), Material::default());

        // Flat black stand-in used by the bloom pass
        manager.materials.insert(
            BLACKOUT_MATERIAL.to_string(),
            Material::new(BLACKOUT_MATERIAL, [0.0, 0.0, 0.0, 1.0], 0.0, 1.0).with_unlit(),
        );

        manager
    }

    /// Adds a material to the library
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    /// Gets a material by ID
    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Gets a mutable material by ID
    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Gets the default material
    pub fn get_default_material(&self) -> &Material {
        self.materials.get(&self.default_material_id).unwrap()
    }

    /// Gets material for a node with fallback to default
    ///
    /// This is the main method used during rendering to get the appropriate
    /// material for a node, handling cases where the node has no material
    /// assigned or the assigned material doesn't exist.
    pub fn get_material_for_node(&self, material_id: Option<&MaterialId>) -> &Material {
        match material_id {
            Some(id) => self
                .get_material(id)
                .unwrap_or_else(|| self.get_default_material()),
            None => self.get_default_material(),
        }
    }

    /// Lists all material IDs
    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    /// Updates GPU resources for all materials
    ///
    /// Should be called when the GPU context is available or when
    /// materials have been modified.
    pub fn update_all_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue);
        }
    }

    /// Gets material bind group layout for pipeline creation
    ///
    /// Uses the default material's layout as all materials share the same layout.
    pub fn get_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.get_default_material().get_bind_group_layout()
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blackout_material_is_built_in_and_black() {
        let manager = MaterialManager::new();
        let blackout = manager.get_material(BLACKOUT_MATERIAL).unwrap();
        assert_eq!(blackout.base_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(blackout.emissive, [0.0, 0.0, 0.0]);
        assert!(blackout.unlit);
    }

    #[test]
    fn unlit_flag_reaches_the_uniform() {
        let flame = Material::new("flame", [0.0, 0.0, 0.0, 1.0], 0.0, 1.0)
            .with_emission(0.9, 0.4, 0.1, 1.0)
            .with_unlit();
        let uniform = flame.to_uniform();
        assert_eq!(uniform.unlit, 1.0);
        assert_eq!(uniform.emissive, [0.9, 0.4, 0.1]);

        let hull = Material::new("hull", [0.7, 0.7, 0.7, 1.0], 0.3, 0.6);
        assert_eq!(hull.to_uniform().unlit, 0.0);
    }

    #[test]
    fn missing_material_falls_back_to_default() {
        let manager = MaterialManager::new();
        let id = "no_such_material".to_string();
        let material = manager.get_material_for_node(Some(&id));
        assert_eq!(material.name, "default");
    }
}
