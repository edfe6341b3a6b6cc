// src/ui/panel.rs
//! Settings panel for the landing scene
//!
//! One small window: the fast/detailed moon toggle, the composite
//! strength slider and a live telemetry readout.

use crate::config::VisualTuning;

/// UI-controlled scene settings
#[derive(Debug, Clone, Copy)]
pub struct SceneSettings {
    /// Render the flat placeholder moon instead of the detailed model
    pub fast_moon: bool,
    /// Base color multiplier for the composite pass
    pub base_strength: f32,
}

impl SceneSettings {
    /// Seeds the adjustable settings from the scene tuning
    pub fn from_tuning(tuning: &VisualTuning) -> Self {
        Self {
            fast_moon: true,
            base_strength: tuning.base_strength,
        }
    }
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self::from_tuning(&VisualTuning::default())
    }
}

/// Live values shown in the telemetry readout
#[derive(Debug, Clone, Copy, Default)]
pub struct Telemetry {
    pub elapsed: f32,
    pub altitude: f32,
    pub thrust: f32,
}

/// Draws the settings window
///
/// Returns true when the moon toggle changed this frame, so the caller
/// can swap node visibility.
pub fn settings_panel(ui: &imgui::Ui, settings: &mut SceneSettings, telemetry: &Telemetry) -> bool {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return false;
    }

    let mut moon_changed = false;

    ui.window("Settings")
        .size([280.0, 200.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .resizable(true)
        .collapsible(true)
        .build(|| {
            moon_changed = ui.checkbox("Fast moon", &mut settings.fast_moon);

            ui.slider("Base strength", 0.0, 6.0, &mut settings.base_strength);

            ui.separator();
            ui.text("Telemetry");
            ui.text(format!("Elapsed:  {:>7.1} s", telemetry.elapsed));
            ui.text(format!("Altitude: {:>7.1}", telemetry.altitude));
            ui.text(format!("Thrust:   {:>7.1}", telemetry.thrust));
        });

    moon_changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_mirror_the_tuning_defaults() {
        let tuning = VisualTuning::default();
        let settings = SceneSettings::default();
        assert_eq!(settings.base_strength, tuning.base_strength);
        assert!(settings.fast_moon);
    }

    #[test]
    fn settings_pick_up_a_custom_composite_strength() {
        let tuning = VisualTuning {
            base_strength: 1.5,
            ..Default::default()
        };
        assert_eq!(SceneSettings::from_tuning(&tuning).base_strength, 1.5);
    }
}
