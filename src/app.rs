//! Application shell and frame driver
//!
//! Owns the winit event loop, the scene, the rocket and the UI. Assets
//! load before the event loop starts, so a missing model fails fast with
//! an error instead of a black window.

use cgmath::{Euler, Rad, Vector3};
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::config::{AssetPaths, VisualTuning};
use crate::gfx::{
    camera::{CameraController, CameraManager, OrbitCamera},
    rendering::RenderEngine,
    scene::{load_obj_model, Mesh, NodeId, Scene, SceneNode},
};
use crate::rocket::{descent_altitude, Rocket, RocketUpdate};
use crate::ui::{settings_panel, SceneSettings, Telemetry, UiManager};

/// Background color behind the flat placeholder moon
const FAST_BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.133,
    g: 0.133,
    b: 0.2,
    a: 1.0,
};

/// Deeper space color shown with the detailed moon model
const SPACE_BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.04,
    a: 1.0,
};

const MOON_MODEL_SCALE: f32 = 100.0;

pub struct MoonfallApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    rocket: Rocket,
    tuning: VisualTuning,
    settings: SceneSettings,
    /// Unbounded spin applied to the rocket, incremented every frame
    spin: Euler<Rad<f32>>,
    start_time: Option<Instant>,
    moon_flat: NodeId,
    moon_detailed: Option<NodeId>,
}

impl MoonfallApp {
    /// Creates the application and loads all assets
    ///
    /// The rocket model is required; the detailed moon model is optional
    /// and the scene falls back to the flat placeholder without it.
    pub fn new() -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;

        let tuning = VisualTuning::default();
        let paths = AssetPaths::default();

        let camera = OrbitCamera::new(50.0, 0.0, 0.0, Vector3::new(0.0, 50.0, 0.0), 1.0);
        let controller = CameraController::new(0.005, 0.1);
        let camera_manager = CameraManager::new(camera, controller);
        let mut scene = Scene::new(camera_manager);
        scene.background = FAST_BACKGROUND;

        let mut rocket = Rocket::new(Vector3::new(0.0, 10.0, 0.0));
        rocket.init(&mut scene, &tuning, &paths.rocket)?;

        let moon_flat = add_flat_moon(&mut scene);

        let moon_detailed = match add_detailed_moon(&mut scene, &paths.moon) {
            Ok(id) => Some(id),
            Err(error) => {
                log::warn!("detailed moon unavailable: {}", error);
                None
            }
        };

        let settings = SceneSettings::from_tuning(&tuning);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                scene,
                rocket,
                tuning,
                settings,
                spin: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
                start_time: None,
                moon_flat,
                moon_detailed,
            },
        })
    }

    /// Runs the event loop; returns only when the window closes
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;
        Ok(())
    }
}

/// Flat 100x100 plane standing in for the moon surface
fn add_flat_moon(scene: &mut Scene) -> NodeId {
    scene.add_material("moon_flat", [0.6, 0.533, 0.533, 1.0], 0.0, 0.9);
    let ground = crate::gfx::geometry::generate_plane(100.0, 100.0, 1, 1);
    let node = SceneNode::from_geometry("moon_flat", &ground).with_material("moon_flat");
    scene.add_node(node)
}

/// Detailed moon model, scaled up and hidden until toggled on
fn add_detailed_moon(scene: &mut Scene, path: &str) -> Result<NodeId, crate::error::AssetLoadError> {
    let mut model = load_obj_model(path)?;
    model.scale(MOON_MODEL_SCALE);

    for material in model.materials {
        if scene.material_manager.get_material(&material.name).is_none() {
            scene.material_manager.add_material(material);
        }
    }

    let meshes: Vec<Mesh> = model.geometries.iter().map(Mesh::from_geometry).collect();
    let mut node = SceneNode::new("moon_detailed", meshes);
    let material = model
        .material_of_first_model
        .unwrap_or_else(|| "moon_flat".to_string());
    node.set_material(&material);
    node.visible = false;

    Ok(scene.add_node(node))
}

impl AppState {
    /// Swaps between the flat placeholder and the detailed moon
    ///
    /// Visibility flips only; both nodes stay resident so the toggle never
    /// reallocates GPU resources mid-flight.
    fn apply_moon_setting(&mut self) {
        let fast = self.settings.fast_moon || self.moon_detailed.is_none();

        if let Some(node) = self.scene.node_mut(self.moon_flat) {
            node.visible = fast;
        }
        if let Some(node) = self.moon_detailed.and_then(|id| self.scene.node_mut(id)) {
            node.visible = !fast;
        }
        self.scene.background = if fast {
            FAST_BACKGROUND
        } else {
            SPACE_BACKGROUND
        };
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title("Moonfall")
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();

            let window_clone = window_handle.clone();
            let base_strength = self.settings.base_strength;
            let renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height, base_strength).await
            });

            self.scene
                .init_gpu_resources(renderer.device(), renderer.queue());

            let mut ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window_handle,
            );
            ui_manager.update_display_size(width, height);

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(renderer);
            self.start_time = Some(Instant::now());
            self.apply_moon_setting();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        let Some(window) = self.window.as_ref() else {
            return;
        };

        // UI gets first refusal on input
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if matches!(
                    key_event.physical_key,
                    winit::keyboard::PhysicalKey::Code(winit::keyboard::KeyCode::Escape)
                ) {
                    event_loop.exit();
                    return;
                }
                self.scene.camera_manager.process_keyboard_event(&key_event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                render_engine.resize(width, height);
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let elapsed = self
                    .start_time
                    .map(|t| t.elapsed().as_secs_f32())
                    .unwrap_or(0.0);

                let telemetry = {
                    let spin = &mut self.spin;
                    spin.x += Rad(self.tuning.spin_rates[0]);
                    spin.y += Rad(self.tuning.spin_rates[1]);
                    spin.z += Rad(self.tuning.spin_rates[2]);

                    let altitude = descent_altitude(elapsed, self.rocket.target.y, &self.tuning);
                    let thrust = altitude * self.tuning.thrust_factor;

                    self.rocket.update(
                        RocketUpdate {
                            position: Some(Vector3::new(0.0, altitude, 0.0)),
                            rotation: Some(*spin),
                            thrust_power: Some(thrust),
                            ..Default::default()
                        },
                        &self.tuning,
                    );
                    self.rocket.sync_to_scene(&mut self.scene);

                    // The camera follows the descending rocket
                    self.scene
                        .camera_manager
                        .camera
                        .set_target(self.rocket.position());
                    self.scene.update();

                    Telemetry {
                        elapsed,
                        altitude,
                        thrust,
                    }
                };

                render_engine.update(self.scene.camera_manager.camera.uniform);
                render_engine.set_base_strength(self.settings.base_strength);
                self.scene.update_all_transforms(render_engine.queue());

                let mut moon_toggled = false;
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    {
                        let settings = &mut self.settings;
                        let toggled = &mut moon_toggled;
                        ui_manager.update_logic(window, |ui| {
                            *toggled = settings_panel(ui, settings, &telemetry);
                        });
                    }

                    render_engine.render_frame(
                        &mut self.scene,
                        Some(|device: &wgpu::Device,
                              queue: &wgpu::Queue,
                              encoder: &mut wgpu::CommandEncoder,
                              view: &wgpu::TextureView| {
                            ui_manager.render_display_only(device, queue, encoder, view);
                        }),
                    );
                } else {
                    render_engine.render_frame(
                        &mut self.scene,
                        None::<
                            fn(
                                &wgpu::Device,
                                &wgpu::Queue,
                                &mut wgpu::CommandEncoder,
                                &wgpu::TextureView,
                            ),
                        >,
                    );
                }

                if moon_toggled {
                    self.apply_moon_setting();
                }
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_ref() {
            let io = ui_manager.context.io();
            if io.want_capture_mouse || io.want_capture_keyboard {
                return;
            }
        }

        self.scene.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
