//! The rocket and its landing hardware
//!
//! A [`Rocket`] owns three scene nodes: the hull loaded from a model file,
//! a cone-shaped thruster flame tagged for the bloom pass, and the static
//! landing platform. State updates are partial: fields absent from a
//! [`RocketUpdate`] keep their previous value, so callers animate only
//! what they care about.

use cgmath::{Euler, Matrix4, Rad, Vector3, Zero};
use rand::Rng;

use crate::config::VisualTuning;
use crate::error::AssetLoadError;
use crate::gfx::geometry::{generate_box, generate_cone, GeometryData};
use crate::gfx::resources::material::Material;
use crate::gfx::scene::{load_obj_model, Mesh, NodeId, Scene, SceneNode};

const THRUSTER_RADIUS: f32 = 0.5;
const THRUSTER_HEIGHT: f32 = 5.0;
const THRUSTER_SEGMENTS: u32 = 32;
const PLATFORM_SIDE: f32 = 2.5;

/// Full animation state of the rocket
#[derive(Debug, Clone, Copy)]
pub struct RocketState {
    pub position: Vector3<f32>,
    pub rotation: Euler<Rad<f32>>,
    /// Thruster orientation relative to the hull
    pub thruster_rotation: Euler<Rad<f32>>,
    /// Drives the flame length; 100 units of thrust equal one cone height
    pub thrust_power: f32,
}

impl Default for RocketState {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            thruster_rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            thrust_power: 0.0,
        }
    }
}

/// Partial state update; `None` fields keep their current value
#[derive(Debug, Clone, Copy, Default)]
pub struct RocketUpdate {
    pub position: Option<Vector3<f32>>,
    pub rotation: Option<Euler<Rad<f32>>>,
    pub thruster_rotation: Option<Euler<Rad<f32>>>,
    pub thrust_power: Option<f32>,
}

/// Altitude of the scripted descent at `elapsed` seconds
///
/// Linear drop from the start altitude, clamped at the landing target's
/// height so the rocket settles instead of sinking through the platform.
pub fn descent_altitude(elapsed: f32, target_y: f32, tuning: &VisualTuning) -> f32 {
    (tuning.descent_start_altitude - elapsed * tuning.descent_rate).max(target_y)
}

/// Vertical flame scale for a given thrust and flicker jitter
///
/// Thrust maps linearly onto scale with a hard ceiling of 2 cone heights,
/// then the jitter multiplies the result. Negative thrust collapses the
/// flame to nothing.
pub fn thruster_scale(thrust_power: f32, jitter: f32) -> f32 {
    (thrust_power / 100.0).clamp(0.0, 2.0) * jitter
}

pub struct Rocket {
    /// Landing position; the platform reaches from the ground up to it
    pub target: Vector3<f32>,
    state: RocketState,
    rocket_height: f32,
    thruster_scale_y: f32,
    body: Option<NodeId>,
    thruster: Option<NodeId>,
    platform: Option<NodeId>,
}

impl Rocket {
    pub fn new(target: Vector3<f32>) -> Self {
        Self {
            target,
            state: RocketState::default(),
            rocket_height: 0.0,
            thruster_scale_y: 0.0,
            body: None,
            thruster: None,
            platform: None,
        }
    }

    pub fn state(&self) -> &RocketState {
        &self.state
    }

    pub fn position(&self) -> Vector3<f32> {
        self.state.position
    }

    pub fn body_id(&self) -> Option<NodeId> {
        self.body
    }

    pub fn thruster_id(&self) -> Option<NodeId> {
        self.thruster
    }

    pub fn platform_id(&self) -> Option<NodeId> {
        self.platform
    }

    /// Loads the hull model and builds all three nodes
    ///
    /// The model is scaled down at load time and its height measured from
    /// the scaled bounding box; hull and thruster offsets derive from it.
    pub fn init(
        &mut self,
        scene: &mut Scene,
        tuning: &VisualTuning,
        rocket_path: &str,
    ) -> Result<(), AssetLoadError> {
        let mut model = load_obj_model(rocket_path)?;
        model.scale(tuning.rocket_scale);

        let height = model
            .bounding_box()
            .ok_or_else(|| AssetLoadError::EmptyModel {
                path: rocket_path.to_string(),
            })?
            .height();

        for material in model.materials {
            if scene.material_manager.get_material(&material.name).is_none() {
                scene.material_manager.add_material(material);
            }
        }

        let meshes: Vec<Mesh> = model.geometries.iter().map(Mesh::from_geometry).collect();
        let mut body = SceneNode::new("rocket_body", meshes);
        let material = model
            .material_of_first_model
            .unwrap_or_else(|| "rocket_hull".to_string());
        body.set_material(&material);

        self.build_nodes(scene, body, height);
        Ok(())
    }

    /// Builds the rocket from pre-made hull geometry instead of a file
    pub fn init_with_geometry(&mut self, scene: &mut Scene, hull: GeometryData) {
        let height = hull.bounding_box().map(|b| b.height()).unwrap_or(0.0);
        let body = SceneNode::from_geometry("rocket_body", &hull).with_material("rocket_hull");
        self.build_nodes(scene, body, height);
    }

    fn build_nodes(&mut self, scene: &mut Scene, body: SceneNode, rocket_height: f32) {
        self.rocket_height = rocket_height;

        scene.material_manager.add_material(Material::new(
            "rocket_hull",
            [0.75, 0.75, 0.78, 1.0],
            0.3,
            0.6,
        ));

        // Dim orange flame; the composite pass supplies the brightness.
        let flame_lightness = rand::rng().random_range(0.2..0.6);
        let flame = hsl_to_rgb(0.05, 0.7, flame_lightness);
        scene.material_manager.add_material(
            Material::new("thruster_flame", [0.0, 0.0, 0.0, 1.0], 0.0, 1.0)
                .with_emission(flame[0], flame[1], flame[2], 1.0)
                .with_unlit(),
        );

        scene.material_manager.add_material(Material::new(
            "platform",
            [0.933, 0.133, 0.267, 1.0],
            0.0,
            0.7,
        ));

        self.body = Some(scene.add_node(body));

        // Cone hangs below its own origin so scaling stretches it downward.
        let mut thruster_geometry =
            generate_cone(THRUSTER_RADIUS, 0.0, THRUSTER_HEIGHT, THRUSTER_SEGMENTS);
        thruster_geometry.translate(0.0, -THRUSTER_HEIGHT / 2.0, 0.0);
        let thruster = SceneNode::from_geometry("thruster", &thruster_geometry)
            .with_material("thruster_flame")
            .with_glow();
        self.thruster = Some(scene.add_node(thruster));

        let mut platform_geometry = generate_box(PLATFORM_SIDE, self.target.y, PLATFORM_SIDE);
        platform_geometry.translate(self.target.x, 0.0, self.target.z);
        let platform =
            SceneNode::from_geometry("platform", &platform_geometry).with_material("platform");
        self.platform = Some(scene.add_node(platform));
    }

    /// Applies a partial state update with a fresh random flame jitter
    ///
    /// The jitter is drawn uniformly from the tuning's flicker range.
    pub fn update(&mut self, update: RocketUpdate, tuning: &VisualTuning) {
        let jitter = rand::rng().random_range(tuning.jitter_min..tuning.jitter_max);
        self.update_with_jitter(update, jitter);
    }

    /// Applies a partial state update with an explicit flame jitter
    pub fn update_with_jitter(&mut self, update: RocketUpdate, jitter: f32) {
        if let Some(position) = update.position {
            self.state.position = position;
        }
        if let Some(rotation) = update.rotation {
            self.state.rotation = rotation;
        }
        if let Some(thruster_rotation) = update.thruster_rotation {
            self.state.thruster_rotation = thruster_rotation;
        }
        if let Some(thrust_power) = update.thrust_power {
            self.state.thrust_power = thrust_power;
        }

        self.thruster_scale_y = thruster_scale(self.state.thrust_power, jitter);
    }

    /// Writes the current state into the scene node transforms
    ///
    /// The hull sits half its height above the rocket origin and the
    /// thruster the same distance below, both inheriting the shared
    /// position and spin. The platform never moves.
    pub fn sync_to_scene(&self, scene: &mut Scene) {
        let group = Matrix4::from_translation(self.state.position) * euler_matrix(self.state.rotation);

        if let Some(body) = self.body.and_then(|id| scene.node_mut(id)) {
            body.set_transform(
                group * Matrix4::from_translation(Vector3::new(0.0, self.rocket_height / 2.0, 0.0)),
            );
        }

        if let Some(thruster) = self.thruster.and_then(|id| scene.node_mut(id)) {
            thruster.set_transform(
                group
                    * Matrix4::from_translation(Vector3::new(0.0, -self.rocket_height / 2.0, 0.0))
                    * euler_matrix(self.state.thruster_rotation)
                    * Matrix4::from_nonuniform_scale(1.0, self.thruster_scale_y, 1.0),
            );
        }
    }
}

/// Rotation matrix for intrinsic x-y-z euler angles
fn euler_matrix(e: Euler<Rad<f32>>) -> Matrix4<f32> {
    Matrix4::from_angle_x(e.x) * Matrix4::from_angle_y(e.y) * Matrix4::from_angle_z(e.z)
}

/// Standard HSL to RGB conversion, all channels in [0, 1]
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h6 = (h.rem_euclid(1.0)) * 6.0;
    let x = c * (1.0 - (h6 % 2.0 - 1.0).abs());
    let (r, g, b) = match h6 as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(50.0, 0.0, 0.0, Vector3::new(0.0, 50.0, 0.0), 1.0);
        let controller = CameraController::new(0.005, 0.1);
        Scene::new(CameraManager::new(camera, controller))
    }

    fn no_rotation() -> Euler<Rad<f32>> {
        Euler::new(Rad(0.0), Rad(0.0), Rad(0.0))
    }

    #[test]
    fn descent_drops_linearly_then_holds_at_target() {
        let tuning = VisualTuning::default();
        assert_eq!(descent_altitude(0.0, 10.0, &tuning), 50.0);
        assert_eq!(descent_altitude(5.0, 10.0, &tuning), 30.0);
        assert_eq!(descent_altitude(10.0, 10.0, &tuning), 10.0);
        // Past touchdown the altitude stays pinned to the target
        assert_eq!(descent_altitude(100.0, 10.0, &tuning), 10.0);
    }

    #[test]
    fn thrust_at_touchdown_altitude() {
        let tuning = VisualTuning::default();
        let y = descent_altitude(20.0, 10.0, &tuning);
        assert_eq!(y * tuning.thrust_factor, 17.5);
    }

    #[test]
    fn random_jitter_stays_inside_the_tuning_range() {
        let tuning = VisualTuning {
            jitter_min: 0.5,
            jitter_max: 0.6,
            ..Default::default()
        };
        let mut rocket = Rocket::new(Vector3::new(0.0, 10.0, 0.0));

        for _ in 0..32 {
            rocket.update(
                RocketUpdate {
                    thrust_power: Some(100.0),
                    ..Default::default()
                },
                &tuning,
            );
            // Scale factor is 1.0 at thrust 100, so the jitter shows directly
            assert!(rocket.thruster_scale_y >= 0.5 && rocket.thruster_scale_y < 0.6);
        }
    }

    #[test]
    fn thruster_scale_clamps_before_jitter() {
        assert_eq!(thruster_scale(1000.0, 1.25), 2.5);
        assert_eq!(thruster_scale(-50.0, 1.25), 0.0);
        assert_eq!(thruster_scale(100.0, 1.0), 1.0);
        assert_eq!(thruster_scale(50.0, 0.75), 0.375);
    }

    #[test]
    fn partial_update_keeps_unmentioned_fields() {
        let mut rocket = Rocket::new(Vector3::new(0.0, 10.0, 0.0));
        rocket.update_with_jitter(
            RocketUpdate {
                position: Some(Vector3::new(0.0, 42.0, 0.0)),
                rotation: Some(Euler::new(Rad(0.1), Rad(0.2), Rad(0.3))),
                thrust_power: Some(80.0),
                ..Default::default()
            },
            1.0,
        );

        // Only the position moves; everything else must stick.
        rocket.update_with_jitter(
            RocketUpdate {
                position: Some(Vector3::new(0.0, 40.0, 0.0)),
                ..Default::default()
            },
            1.0,
        );

        assert_eq!(rocket.state().position.y, 40.0);
        assert_eq!(rocket.state().rotation.y, Rad(0.2));
        assert_eq!(rocket.state().thrust_power, 80.0);
        assert_eq!(rocket.thruster_scale_y, 0.8);
    }

    #[test]
    fn nodes_are_placed_around_the_rocket_origin() {
        let mut scene = test_scene();
        let mut rocket = Rocket::new(Vector3::new(0.0, 10.0, 0.0));
        rocket.init_with_geometry(&mut scene, generate_box(1.0, 8.0, 1.0));

        rocket.update_with_jitter(
            RocketUpdate {
                position: Some(Vector3::new(0.0, 50.0, 0.0)),
                rotation: Some(no_rotation()),
                thruster_rotation: Some(no_rotation()),
                thrust_power: Some(87.5),
            },
            1.0,
        );
        rocket.sync_to_scene(&mut scene);

        let body = scene.node(rocket.body_id().unwrap()).unwrap();
        assert_eq!(body.translation(), Vector3::new(0.0, 54.0, 0.0));

        let thruster = scene.node(rocket.thruster_id().unwrap()).unwrap();
        assert_eq!(thruster.translation(), Vector3::new(0.0, 46.0, 0.0));
        assert!(thruster.is_glow());

        // The platform reaches up toward the landing target and never moves
        let platform = scene.node(rocket.platform_id().unwrap()).unwrap();
        assert_eq!(platform.translation(), Vector3::new(0.0, 0.0, 0.0));
        let bounds = platform.bounding_box().unwrap();
        assert_eq!(bounds.height(), 10.0);
    }

    #[test]
    fn flame_color_is_warm_orange() {
        let [r, g, b] = hsl_to_rgb(0.05, 0.7, 0.4);
        assert!(r > g && g > b);
        assert!(r <= 1.0 && b >= 0.0);
    }
}
