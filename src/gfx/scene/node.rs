//! Scene nodes and mesh data
//!
//! A [`SceneNode`] is a renderable entry in the scene: one or more meshes,
//! a transform, a swappable material reference and the glow-set membership
//! flag used by the selective bloom pass.

use std::ops::Range;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::Device;

use crate::gfx::geometry::{Aabb, GeometryData};
use crate::gfx::resources::material::MaterialId;

use super::vertex::Vertex3D;

/// Stable node identity, assigned by the scene at insertion and never reused.
///
/// Used as the key of the bloom pass material-override map.
pub type NodeId = usize;

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    /// Builds a mesh from generated or loaded geometry
    pub fn from_geometry(geometry: &GeometryData) -> Self {
        let vertices = (0..geometry.vertices.len())
            .map(|i| Vertex3D {
                position: geometry.vertices[i],
                normal: geometry.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect();
        Self::new(vertices, geometry.indices.clone())
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Local-space bounding box, `None` for empty meshes
    pub fn bounding_box(&self) -> Option<Aabb> {
        let first = self.vertices.first()?;
        let mut aabb = Aabb {
            min: first.position,
            max: first.position,
        };
        for v in &self.vertices[1..] {
            for axis in 0..3 {
                aabb.min[axis] = aabb.min[axis].min(v.position[axis]);
                aabb.max[axis] = aabb.max[axis].max(v.position[axis]);
            }
        }
        Some(aabb)
    }
}

/// GPU resources backing a node's transform uniform
pub struct NodeGpuResources {
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

/// A renderable node in the scene graph
pub struct SceneNode {
    pub name: String,
    /// Assigned by [`Scene::add_node`](super::scene::Scene::add_node); 0 until then
    pub(crate) id: NodeId,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    /// Current material reference; swapped in place by the bloom pass
    pub material: Option<MaterialId>,
    pub visible: bool,
    glow: bool,
    pub gpu_resources: Option<NodeGpuResources>,
}

impl SceneNode {
    /// Create a new node with identity transformation and no glow tag
    pub fn new(name: &str, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.to_string(),
            id: 0,
            meshes,
            transform: Matrix4::identity(),
            material: None,
            visible: true,
            glow: false,
            gpu_resources: None,
        }
    }

    /// Convenience constructor from generated geometry
    pub fn from_geometry(name: &str, geometry: &GeometryData) -> Self {
        Self::new(name, vec![Mesh::from_geometry(geometry)])
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Builder pattern: assign a material
    pub fn with_material(mut self, material: &str) -> Self {
        self.material = Some(material.to_string());
        self
    }

    pub fn set_material(&mut self, material: &str) {
        self.material = Some(material.to_string());
    }

    /// Adds this node to the glow set rendered by the bloom pass.
    ///
    /// Membership is a property of this node only; it is never inherited
    /// from or propagated to other nodes. Idempotent, and there is no
    /// un-tagging operation: nodes are tagged once at creation.
    pub fn mark_glow(&mut self) {
        self.glow = true;
    }

    /// Builder form of [`mark_glow`](Self::mark_glow)
    pub fn with_glow(mut self) -> Self {
        self.glow = true;
        self
    }

    /// Tests glow-set membership
    pub fn is_glow(&self) -> bool {
        self.glow
    }

    /// Set translation
    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform = Matrix4::from_translation(translation);
    }

    /// Replace the full transform matrix
    pub fn set_transform(&mut self, transform: Matrix4<f32>) {
        self.transform = transform;
    }

    /// Translation component of the current transform
    pub fn translation(&self) -> Vector3<f32> {
        Vector3::new(self.transform.w.x, self.transform.w.y, self.transform.w.z)
    }

    /// Local-space bounding box over all meshes
    pub fn bounding_box(&self) -> Option<Aabb> {
        let mut boxes = self.meshes.iter().filter_map(Mesh::bounding_box);
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, b| acc.union(&b)))
    }

    /// Update the transformation matrix and sync to GPU if resources exist
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        if let Some(gpu_resources) = &self.gpu_resources {
            // cgmath matrices are column-major, which is what the GPU expects
            let transform_data: &[f32; 16] = self.transform.as_ref();

            queue.write_buffer(
                &gpu_resources.transform_buffer,
                0,
                bytemuck::cast_slice(transform_data),
            );
        }
    }

    /// Get the transform bind group for rendering
    pub fn transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }

    /// Creates vertex/index buffers and the transform uniform for this node
    pub fn init_gpu_resources(&mut self, device: &Device) {
        for mesh in self.meshes.iter_mut() {
            let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Vertex Buffer"),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            );

            let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Index Buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            );

            mesh.vertex_buffer = Some(vertex_buffer);
            mesh.index_buffer = Some(index_buffer);
        }

        // cgmath matrices are already column-major for the GPU
        let transform_data: &[f32; 16] = self.transform.as_ref();

        let transform_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Transform Uniform Buffer"),
                contents: bytemuck::cast_slice(transform_data),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let transform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Transform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let transform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout: &transform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(NodeGpuResources {
            transform_buffer,
            transform_bind_group,
        });
    }
}

pub trait DrawNode<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_node(&mut self, node: &'a SceneNode);
}

impl<'a, 'b> DrawNode<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let vertex_buffer = match &mesh.vertex_buffer {
            Some(buffer) => buffer,
            None => return, // Skip drawing if not uploaded
        };
        let index_buffer = match &mesh.index_buffer {
            Some(buffer) => buffer,
            None => return,
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn draw_node(&mut self, node: &'b SceneNode) {
        for mesh in &node.meshes {
            self.draw_mesh_instanced(mesh, 0..1);
        }
    }
}
