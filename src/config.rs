//! Tunable parameters for the landing scene
//!
//! Everything that shapes the look of the descent lives here, so the
//! animation code stays free of magic numbers.

/// Visual tuning knobs with the scene's canonical defaults
#[derive(Debug, Clone, Copy)]
pub struct VisualTuning {
    /// Multiplier applied to the base scene color in the composite pass
    pub base_strength: f32,
    /// Thruster flame flicker range, sampled uniformly each frame
    pub jitter_min: f32,
    pub jitter_max: f32,
    /// Altitude the descent starts from
    pub descent_start_altitude: f32,
    /// Descent speed in units per second
    pub descent_rate: f32,
    /// Thrust produced per unit of altitude
    pub thrust_factor: f32,
    /// Uniform scale baked into the rocket model at load time
    pub rocket_scale: f32,
    /// Per-frame spin increments around x, y and z
    pub spin_rates: [f32; 3],
}

impl Default for VisualTuning {
    fn default() -> Self {
        Self {
            base_strength: 3.0,
            jitter_min: 0.75,
            jitter_max: 1.25,
            descent_start_altitude: 50.0,
            descent_rate: 4.0,
            thrust_factor: 1.75,
            rocket_scale: 0.001,
            spin_rates: [0.01, 0.02, 0.03],
        }
    }
}

/// Locations of the models loaded at startup
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub rocket: String,
    pub moon: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            rocket: "assets/rocket.obj".to_string(),
            moon: "assets/moon.obj".to_string(),
        }
    }
}
