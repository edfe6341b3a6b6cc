//! Global uniform bindings for camera and scene data
//!
//! Manages GPU uniform buffers and bind groups for global rendering state
//! shared across all nodes in a scene: camera matrices and the directional
//! light used for shadow mapping.

use crate::{
    gfx::camera::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],

    light_direction: [f32; 3],
    _padding1: f32,
    light_color: [f32; 3],
    light_intensity: f32,
    light_view_proj: [[f32; 4]; 4],
    ambient: [f32; 3],
    _padding2: f32,
}

/// Directional light configuration for shading and shadow mapping
#[derive(Copy, Clone, Debug)]
pub struct LightConfig {
    /// World-space position the light shines from, toward the origin
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient: [f32; 3],
    /// Half-extent of the orthographic shadow frustum
    pub shadow_extent: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: [20.0, 40.0, 100.0],
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            ambient: [0.08, 0.08, 0.08],
            shadow_extent: 50.0,
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Updates the global uniform buffer with camera and light data
///
/// Should be called each frame so shading and the shadow frustum stay in
/// sync with the moving camera.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    light: LightConfig,
) {
    let light_pos = cgmath::Point3::new(light.position[0], light.position[1], light.position[2]);
    let light_view = cgmath::Matrix4::look_at_rh(
        light_pos,
        cgmath::Point3::new(0.0, 0.0, 0.0),
        cgmath::Vector3::unit_y(),
    );

    let e = light.shadow_extent;
    // cgmath targets the OpenGL depth range; remap to wgpu's 0..1 like the
    // camera projection does.
    let light_proj = crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX
        * cgmath::ortho(-e, e, -e, e, 1.0, 200.0);
    let light_view_proj = light_proj * light_view;

    let direction = cgmath::InnerSpace::normalize(cgmath::Vector3::new(
        -light.position[0],
        -light.position[1],
        -light.position[2],
    ));

    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,

        light_direction: direction.into(),
        _padding1: 0.0,
        light_color: light.color,
        light_intensity: light.intensity,
        light_view_proj: light_view_proj.into(),
        ambient: light.ambient,
        _padding2: 0.0,
    };

    ubo.update_content(queue, content);
}

/// Manages bind group layouts and bind groups for global uniforms
///
/// Bound to slot 0 in all scene render pipelines.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    /// Creates a new global bindings manager
    ///
    /// Sets up the bind group layout for global uniforms but doesn't
    /// create the actual bind group until `create_bind_group()` is called.
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Creates the bind group with the provided uniform buffer
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    /// Returns the bind group layout for pipeline creation
    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Returns the bind group for rendering
    ///
    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet
    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}
