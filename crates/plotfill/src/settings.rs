//! Fill job settings.
//!
//! Defaults match the values the engine was tuned with on real hardware:
//! pen spacing in document units, a join threshold a little over three pen
//! widths, and a two-unit frame budget that keeps a UI responsive while a
//! large document fills.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which fill strategy runs, and how its strokes are finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// Scan-line fill; join segments exactly as generated.
    Zigzag,
    /// Scan-line fill; flip segments end-for-end when that shortens the
    /// connecting diagonal.
    Zigstraight,
    /// Like zigstraight, plus simplify and re-flatten each stroke as it
    /// closes.
    Zigsmooth,
    /// Trace a guide curve (spiral by default) clipped to the shape.
    Overlay,
}

impl FillMode {
    /// Canonical mode name.
    pub fn name(self) -> &'static str {
        match self {
            FillMode::Zigzag => "zigzag",
            FillMode::Zigstraight => "zigstraight",
            FillMode::Zigsmooth => "zigsmooth",
            FillMode::Overlay => "overlay",
        }
    }

    /// Parse a mode name. `spiral` is accepted as an alias for overlay,
    /// since the default guide is a spiral.
    pub fn from_name(name: &str) -> Option<FillMode> {
        match name {
            "zigzag" => Some(FillMode::Zigzag),
            "zigstraight" => Some(FillMode::Zigstraight),
            "zigsmooth" => Some(FillMode::Zigsmooth),
            "overlay" | "spiral" => Some(FillMode::Overlay),
            _ => None,
        }
    }

    #[inline]
    pub fn is_overlay(self) -> bool {
        self == FillMode::Overlay
    }

    /// Scan-line modes that flip segments before joining.
    #[inline]
    pub fn reverses_before_join(self) -> bool {
        matches!(self, FillMode::Zigstraight | FillMode::Zigsmooth)
    }

    /// Scan-line modes that smooth each stroke when it closes.
    #[inline]
    pub fn smooths_on_close(self) -> bool {
        self == FillMode::Zigsmooth
    }
}

impl Serialize for FillMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FillMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        FillMode::from_name(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown fill mode: {name}")))
    }
}

/// Everything a fill job needs to know besides the shapes themselves.
///
/// Settings are immutable for the lifetime of the job; a change means
/// stop, edit, start again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillSettings {
    /// Work units performed per `step()` call.
    #[serde(default = "default_step_budget")]
    pub step_budget: u32,

    /// Pen stroke width, recorded on output strokes.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,

    /// Sampling distance along the guide curve, and the re-flatten
    /// density for smoothed strokes.
    #[serde(default = "default_flatten_resolution")]
    pub flatten_resolution: f64,

    /// Fill strategy.
    #[serde(default = "default_mode")]
    pub mode: FillMode,

    /// Fill just the named shape, discarding the rest.
    #[serde(default)]
    pub target: Option<String>,

    /// Custom guide curve for overlay mode. `None` means spiral.
    #[serde(skip)]
    pub guide: Option<Vec<crate::geometry::Point>>,

    /// Center the guide on each shape rather than on the view.
    #[serde(default = "default_true")]
    pub align_guide_to_shape: bool,

    /// Scan line direction in degrees; 0 is horizontal.
    #[serde(default = "default_angle")]
    pub angle: f64,

    /// Pick a fresh random angle for every shape.
    #[serde(default)]
    pub randomize_angle: bool,

    /// Seed for the randomized angles. Zero is a valid seed.
    #[serde(default)]
    pub random_seed: u64,

    /// After the pass completes, run a second pass rotated 90 degrees.
    #[serde(default)]
    pub hatch: bool,

    /// Distance between adjacent scan lines, and between spiral arms.
    #[serde(default = "default_spacing")]
    pub spacing: f64,

    /// Subtract overlapping shapes that sit in front before filling.
    #[serde(default = "default_true")]
    pub check_occlusion: bool,

    /// Maximum distance between segment starts that still share a group.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_step_budget() -> u32 {
    2
}

fn default_stroke_width() -> f64 {
    10.0
}

fn default_flatten_resolution() -> f64 {
    15.0
}

fn default_mode() -> FillMode {
    FillMode::Zigzag
}

fn default_true() -> bool {
    true
}

fn default_angle() -> f64 {
    28.0
}

fn default_spacing() -> f64 {
    13.0
}

fn default_threshold() -> f64 {
    40.0
}

impl Default for FillSettings {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            stroke_width: default_stroke_width(),
            flatten_resolution: default_flatten_resolution(),
            mode: default_mode(),
            target: None,
            guide: None,
            align_guide_to_shape: true,
            angle: default_angle(),
            randomize_angle: false,
            random_seed: 0,
            hatch: false,
            spacing: default_spacing(),
            check_occlusion: true,
            threshold: default_threshold(),
        }
    }
}

impl FillSettings {
    /// Clamp out-of-range values and apply mode-dependent adjustments.
    ///
    /// Overlay tracing does noticeably less work per unit than a scan
    /// iteration, so its budget is doubled; it also never hatches, since
    /// a rotated second pass of a spiral is the same spiral.
    pub fn normalized(mut self) -> Self {
        self.angle = self.angle.rem_euclid(360.0);
        if !(self.spacing > 0.0) {
            self.spacing = default_spacing();
        }
        if !(self.flatten_resolution > 0.0) {
            self.flatten_resolution = default_flatten_resolution();
        }
        if !(self.threshold >= 0.0) {
            self.threshold = 0.0;
        }
        if self.step_budget == 0 {
            self.step_budget = 1;
        }
        if self.mode.is_overlay() {
            self.hatch = false;
            self.step_budget *= 2;
        }
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip() {
        for mode in [
            FillMode::Zigzag,
            FillMode::Zigstraight,
            FillMode::Zigsmooth,
            FillMode::Overlay,
        ] {
            assert_eq!(FillMode::from_name(mode.name()), Some(mode));
        }
    }

    #[test]
    fn spiral_is_an_overlay_alias() {
        assert_eq!(FillMode::from_name("spiral"), Some(FillMode::Overlay));
        assert_eq!(FillMode::from_name("wiggle"), None);
    }

    #[test]
    fn defaults_are_sane() {
        let s = FillSettings::default();
        assert_eq!(s.step_budget, 2);
        assert_eq!(s.mode, FillMode::Zigzag);
        assert!(s.check_occlusion);
        assert!(s.align_guide_to_shape);
        assert!(!s.hatch);
        assert_eq!(s.spacing, 13.0);
        assert_eq!(s.threshold, 40.0);
    }

    #[test]
    fn normalize_wraps_angle_and_fixes_bad_values() {
        let s = FillSettings {
            angle: 390.0,
            spacing: 0.0,
            threshold: -3.0,
            step_budget: 0,
            ..FillSettings::default()
        }
        .normalized();
        assert_eq!(s.angle, 30.0);
        assert_eq!(s.spacing, 13.0);
        assert_eq!(s.threshold, 0.0);
        assert_eq!(s.step_budget, 1);
    }

    #[test]
    fn normalize_negative_angle_wraps_positive() {
        let s = FillSettings {
            angle: -90.0,
            ..FillSettings::default()
        }
        .normalized();
        assert_eq!(s.angle, 270.0);
    }

    #[test]
    fn overlay_doubles_budget_and_disables_hatch() {
        let s = FillSettings {
            mode: FillMode::Overlay,
            hatch: true,
            ..FillSettings::default()
        }
        .normalized();
        assert!(!s.hatch);
        assert_eq!(s.step_budget, 4);
    }

    #[test]
    fn settings_parse_from_yaml_fragment() {
        let yaml = "mode: spiral\nspacing: 9\nhatch: true\n";
        let s: FillSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.mode, FillMode::Overlay);
        assert_eq!(s.spacing, 9.0);
        assert!(s.hatch);
        // Untouched fields take defaults
        assert_eq!(s.threshold, 40.0);
    }
}
