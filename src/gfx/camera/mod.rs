//! Orbit camera and input handling
//!
//! [`OrbitCamera`] derives its eye position from pitch, yaw and distance
//! around a target; [`CameraController`] feeds it mouse input; the
//! [`CameraManager`] pairs the two for the application shell.

pub mod camera_controller;
pub mod orbit_camera;

pub use camera_controller::CameraController;
pub use orbit_camera::{CameraUniform, OrbitCamera, OrbitCameraBounds};

use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

/// The camera together with the controller driving it
pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Routes raw device events (mouse motion, wheel, buttons) to the camera
    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        self.controller
            .process_events(event, window, &mut self.camera);
    }

    /// Routes keyboard events (modifier tracking) to the controller
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller
            .process_keyed_events(event, &mut self.camera);
    }
}
