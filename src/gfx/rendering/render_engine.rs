//! WGPU-based rendering engine
//!
//! Drives the four passes that make up a frame: shadow map, glow render
//! (with non-glow nodes blacked out), base scene render, and the final
//! composite to the surface with an optional UI overlay on top.

use std::sync::Arc;
use wgpu::{Device, TextureFormat};

use crate::gfx::{
    camera::CameraUniform,
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO, LightConfig},
        texture_resource::TextureResource,
    },
    scene::{DrawNode, Scene},
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

use super::bloom::{BlackoutGuard, BloomTargets, CompositeParams, CompositeUBO};
use super::pipeline_manager::{PipelineConfig, PipelineManager};

const SHADOW_MAP_SIZE: u32 = 2048;

/// What to do when the surface refuses to hand out a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceErrorAction {
    /// Reconfigure the surface and skip this frame
    Reconfigure,
    /// Skip this frame and try again on the next redraw
    Skip,
    /// Unrecoverable
    Fatal,
}

fn surface_error_action(error: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match error {
        // Raised routinely while resizing or minimizing
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            SurfaceErrorAction::Reconfigure
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        _ => SurfaceErrorAction::Skip,
    }
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    shadow_depth_texture: TextureResource,
    shadow_bind_group: wgpu::BindGroup,

    bloom_targets: BloomTargets,
    composite_layout: BindGroupLayoutWithDesc,
    composite_bind_group: wgpu::BindGroup,
    composite_ubo: CompositeUBO,

    light_config: LightConfig,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu, creates the depth buffer, shadow map and bloom
    /// targets, and registers all render pipelines.
    ///
    /// # Panics
    /// Panics if unable to create a wgpu adapter or device.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        base_strength: f32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = {
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("WGPU Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: 4096,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                    trace: wgpu::Trace::Off,
                })
                .await
                .expect("Failed to request a device!")
        };

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, width, height, "depth_texture");

        let shadow_depth_texture = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Layout");

        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .texture(&shadow_depth_texture.view)
            .sampler(&shadow_depth_texture.sampler)
            .create(&device, "Shadow Bind Group");

        let light_config = LightConfig::default();
        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

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

        // Borrow the material layout shape from a throwaway binding set
        let temp_material_bindings =
            crate::gfx::resources::material::MaterialBindings::new(&device);
        let material_bind_group_layout = temp_material_bindings.bind_group_layouts().clone();

        let bloom_targets = BloomTargets::new(&device, width, height);

        let composite_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .next_binding_fragment(binding_types::uniform())
            .create(&device, "Composite Layout");

        let composite_ubo =
            CompositeUBO::new_with_data(&device, &CompositeParams::new(base_strength));

        let composite_bind_group = Self::build_composite_bind_group(
            &device,
            &composite_layout,
            &bloom_targets,
            &composite_ubo,
        );

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("pbr.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shadow_pass.wgsl"));
        pipeline_manager.load_shader("unlit", include_str!("unlit.wgsl"));
        pipeline_manager.load_shader("composite", include_str!("composite.wgsl"));

        // Shadow depth pass. No culling, so thin geometry can't leak light.
        pipeline_manager.register_pipeline(
            "Shadow",
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_depth_stencil(shadow_depth_texture.texture.clone())
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_bind_group_layout.clone(),
                ])
                .with_color_targets(vec![]),
        );

        // Glow pass: unlit flat color into the glow target. Blacked-out
        // nodes still write depth, so they occlude glow geometry correctly.
        pipeline_manager.register_pipeline(
            "Glow",
            PipelineConfig::default()
                .with_label("GLOW")
                .with_shader("unlit")
                .with_depth_stencil(depth_texture.texture.clone())
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_bind_group_layout.clone(),
                    material_bind_group_layout.clone(),
                ])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: TextureResource::COLOR_TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );

        // Main lit pass into the base target.
        pipeline_manager.register_pipeline(
            "Scene",
            PipelineConfig::default()
                .with_label("SCENE")
                .with_shader("scene")
                .with_depth_stencil(depth_texture.texture.clone())
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_bind_group_layout,
                    material_bind_group_layout,
                    shadow_layout.layout.clone(),
                ])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format: TextureResource::COLOR_TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
        );

        // Fullscreen composite straight to the surface.
        pipeline_manager.register_pipeline(
            "Composite",
            PipelineConfig::default()
                .with_label("COMPOSITE")
                .with_shader("composite")
                .with_bind_group_layouts(vec![composite_layout.layout.clone()])
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_cull_mode(None)
                .with_no_vertex_buffers(),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in &errors {
                log::error!("{}", error);
            }
            panic!("Failed to create render pipelines");
        }

        RenderEngine {
            device: device_handle,
            config,
            format,
            surface,
            queue: queue_handle,
            depth_texture,
            pipeline_manager,
            global_bindings,
            global_ubo,
            shadow_depth_texture,
            shadow_bind_group,
            bloom_targets,
            composite_layout,
            composite_bind_group,
            composite_ubo,
            light_config,
        }
    }

    fn build_composite_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        targets: &BloomTargets,
        ubo: &CompositeUBO,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .texture(&targets.base.view)
            .texture(&targets.glow.view)
            .sampler(&targets.base.sampler)
            .resource(ubo.binding_resource())
            .create(device, "Composite Bind Group")
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// Pass order: shadow map, glow render with every non-glow node
    /// temporarily swapped to the blackout material, base scene render,
    /// then the fullscreen composite of both targets to the surface.
    ///
    /// The scene is borrowed mutably only for the duration of the material
    /// swap; its state is bit-for-bit identical afterwards.
    pub fn render_frame<F>(&mut self, scene: &mut Scene, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(error) => match surface_error_action(&error) {
                SurfaceErrorAction::Reconfigure => {
                    log::warn!("surface acquire failed ({}), reconfiguring", error);
                    self.surface.configure(&self.device, &self.config);
                    return;
                }
                SurfaceErrorAction::Skip => {
                    log::warn!("surface acquire failed ({}), skipping frame", error);
                    return;
                }
                SurfaceErrorAction::Fatal => {
                    panic!("out of GPU memory acquiring the surface: {}", error)
                }
            },
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: Shadow map. The rocket moves every frame, so the map is
        // regenerated every frame rather than cached.
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);

            if let Some(shadow_pipeline) = self.pipeline_manager.get_pipeline("Shadow") {
                shadow_pass.set_pipeline(shadow_pipeline);

                for node in scene.nodes.iter() {
                    if node.visible {
                        if let Some(transform_bind_group) = node.transform_bind_group() {
                            shadow_pass.set_bind_group(1, transform_bind_group, &[]);
                            shadow_pass.draw_node(node);
                        }
                    }
                }
            }
        }

        // PASS 2: Glow render. The guard swaps every non-glow node to the
        // blackout material and restores the scene when it drops, even if
        // this pass panics.
        {
            let guard = BlackoutGuard::darken_non_glow(scene);

            let mut glow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Glow Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.bloom_targets.glow.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            glow_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Glow") {
                glow_pass.set_pipeline(pipeline);

                for node in guard.scene().nodes.iter() {
                    if node.visible {
                        let material = guard.scene().get_material_for_node(node);
                        if let (Some(material_bind_group), Some(transform_bind_group)) =
                            (material.get_bind_group(), node.transform_bind_group())
                        {
                            glow_pass.set_bind_group(1, transform_bind_group, &[]);
                            glow_pass.set_bind_group(2, material_bind_group, &[]);
                            glow_pass.draw_node(node);
                        }
                    }
                }
            }

            drop(glow_pass);
            drop(guard);
        }

        // PASS 3: Base scene with lighting and shadows.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Base Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.bloom_targets.base.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);
            render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Scene") {
                render_pass.set_pipeline(pipeline);

                for node in scene.nodes.iter() {
                    if node.visible {
                        let material = scene.get_material_for_node(node);

                        if let (Some(material_bind_group), Some(transform_bind_group)) =
                            (material.get_bind_group(), node.transform_bind_group())
                        {
                            render_pass.set_bind_group(1, transform_bind_group, &[]);
                            render_pass.set_bind_group(2, material_bind_group, &[]);
                            render_pass.draw_node(node);
                        } else {
                            log::debug!(
                                "skipping '{}', material '{}' has no GPU resources",
                                node.name,
                                material.name
                            );
                        }
                    }
                }
            }
        }

        // PASS 4: Composite both targets to the surface.
        {
            let mut composite_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Composite Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Composite") {
                composite_pass.set_pipeline(pipeline);
                composite_pass.set_bind_group(0, &self.composite_bind_group, &[]);
                composite_pass.draw(0..3, 0..1);
            }
        }

        // PASS 5: UI overlay.
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Updates camera and light uniform buffers
    ///
    /// Should be called each frame before `render_frame`.
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            camera_uniform,
            self.light_config,
        );
    }

    /// Sets the base color multiplier used by the composite pass
    pub fn set_base_strength(&mut self, base_strength: f32) {
        self.composite_ubo
            .update_content(&self.queue, CompositeParams::new(base_strength));
    }

    pub fn set_light(&mut self, light_config: LightConfig) {
        self.light_config = light_config;
    }

    pub fn get_light(&self) -> LightConfig {
        self.light_config
    }

    /// Resizes the surface and recreates all size-dependent targets
    ///
    /// The shadow map keeps its fixed resolution; the depth buffer and
    /// both bloom targets are rebuilt, along with the composite bind group
    /// that samples them.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
        self.bloom_targets = BloomTargets::new(&self.device, width, height);
        self.composite_bind_group = Self::build_composite_bind_group(
            &self.device,
            &self.composite_layout,
            &self.bloom_targets,
            &self.composite_ubo,
        );
    }

    /// Returns current surface dimensions
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Surface texture format, needed by the UI renderer
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_or_outdated_surface_reconfigures_and_skips() {
        assert_eq!(
            surface_error_action(&wgpu::SurfaceError::Lost),
            SurfaceErrorAction::Reconfigure
        );
        assert_eq!(
            surface_error_action(&wgpu::SurfaceError::Outdated),
            SurfaceErrorAction::Reconfigure
        );
    }

    #[test]
    fn timeout_only_skips_the_frame() {
        assert_eq!(
            surface_error_action(&wgpu::SurfaceError::Timeout),
            SurfaceErrorAction::Skip
        );
    }

    #[test]
    fn out_of_memory_is_fatal() {
        assert_eq!(
            surface_error_action(&wgpu::SurfaceError::OutOfMemory),
            SurfaceErrorAction::Fatal
        );
    }
}
