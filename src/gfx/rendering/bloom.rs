//! Selective bloom support
//!
//! The glow pass renders the whole scene with every non-glow node swapped
//! to the built-in blackout material and the background forced to black,
//! so only tagged nodes contribute color. [`BlackoutGuard`] performs the
//! swap and restores the scene on drop, which keeps the darkening
//! invisible outside the pass even if rendering bails early.

use std::collections::HashMap;

use crate::gfx::{
    resources::material::{MaterialId, BLACKOUT_MATERIAL},
    resources::texture_resource::TextureResource,
    scene::{NodeId, Scene},
};
use crate::wgpu_utils::uniform_buffer::UniformBuffer;

/// Offscreen color targets consumed by the composite pass
///
/// `base` receives the normally lit scene, `glow` the blacked-out glow
/// render. Both match the surface size and are recreated on resize.
pub struct BloomTargets {
    pub base: TextureResource,
    pub glow: TextureResource,
}

impl BloomTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            base: TextureResource::create_color_target(device, width, height, "Base Scene Target"),
            glow: TextureResource::create_color_target(device, width, height, "Glow Target"),
        }
    }
}

/// Uniform data for the composite pass
///
/// MUST match the `Params` struct in composite.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeParams {
    /// Multiplier applied to the base scene color before the glow is added
    pub base_strength: f32,
    _padding: [f32; 3],
}

impl CompositeParams {
    pub fn new(base_strength: f32) -> Self {
        Self {
            base_strength,
            _padding: [0.0; 3],
        }
    }
}

pub type CompositeUBO = UniformBuffer<CompositeParams>;

/// Temporarily swaps every non-glow node to the blackout material
///
/// Holds the scene mutably for its lifetime; the glow pass reads it
/// through [`scene()`](Self::scene). Dropping the guard restores each
/// node's previous material reference (including "no material") and the
/// original background color.
pub struct BlackoutGuard<'s> {
    scene: &'s mut Scene,
    overrides: HashMap<NodeId, Option<MaterialId>>,
    saved_background: wgpu::Color,
}

impl<'s> BlackoutGuard<'s> {
    pub fn darken_non_glow(scene: &'s mut Scene) -> Self {
        let saved_background = scene.background;
        scene.background = wgpu::Color::BLACK;

        let mut overrides = HashMap::new();
        for node in scene.nodes.iter_mut() {
            if !node.is_glow() {
                overrides.insert(node.id(), node.material.take());
                node.material = Some(BLACKOUT_MATERIAL.to_string());
            }
        }

        Self {
            scene,
            overrides,
            saved_background,
        }
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }
}

impl Drop for BlackoutGuard<'_> {
    fn drop(&mut self) {
        for node in self.scene.nodes.iter_mut() {
            if let Some(previous) = self.overrides.remove(&node.id()) {
                node.material = previous;
            }
        }
        self.scene.background = self.saved_background;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use crate::gfx::geometry::generate_box;
    use crate::gfx::scene::SceneNode;
    use cgmath::Vector3;

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(50.0, 0.0, 0.0, Vector3::new(0.0, 50.0, 0.0), 1.0);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    #[test]
    fn guard_darkens_only_non_glow_nodes() {
        let mut scene = test_scene();
        let hull = scene.add_node(
            SceneNode::from_geometry("hull", &generate_box(1.0, 1.0, 1.0))
                .with_material("hull_grey"),
        );
        let flame = scene.add_node(
            SceneNode::from_geometry("flame", &generate_box(1.0, 1.0, 1.0))
                .with_material("flame_orange")
                .with_glow(),
        );

        let guard = BlackoutGuard::darken_non_glow(&mut scene);
        assert_eq!(
            guard.scene().node(hull).unwrap().material.as_deref(),
            Some(BLACKOUT_MATERIAL)
        );
        assert_eq!(
            guard.scene().node(flame).unwrap().material.as_deref(),
            Some("flame_orange")
        );
        drop(guard);

        assert_eq!(
            scene.node(hull).unwrap().material.as_deref(),
            Some("hull_grey")
        );
        assert_eq!(
            scene.node(flame).unwrap().material.as_deref(),
            Some("flame_orange")
        );
    }

    #[test]
    fn guard_restores_nodes_without_material() {
        let mut scene = test_scene();
        let bare = scene.add_node(SceneNode::from_geometry(
            "bare",
            &generate_box(1.0, 1.0, 1.0),
        ));

        {
            let guard = BlackoutGuard::darken_non_glow(&mut scene);
            assert_eq!(
                guard.scene().node(bare).unwrap().material.as_deref(),
                Some(BLACKOUT_MATERIAL)
            );
        }

        assert!(scene.node(bare).unwrap().material.is_none());
    }

    #[test]
    fn guard_restores_background_color() {
        let mut scene = test_scene();
        let original = scene.background;

        {
            let guard = BlackoutGuard::darken_non_glow(&mut scene);
            let bg = guard.scene().background;
            assert_eq!(bg.r, 0.0);
            assert_eq!(bg.g, 0.0);
            assert_eq!(bg.b, 0.0);
        }

        assert_eq!(scene.background.r, original.r);
        assert_eq!(scene.background.g, original.g);
        assert_eq!(scene.background.b, original.b);
    }

    #[test]
    fn guard_on_empty_scene_is_a_no_op() {
        let mut scene = test_scene();
        {
            let _guard = BlackoutGuard::darken_non_glow(&mut scene);
        }
        assert_eq!(scene.node_count(), 0);
    }
}
