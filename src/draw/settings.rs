use crate::draw::document::{Tolerances, DEFAULT_ERASER_RADIUS, DEFAULT_HIT_TOLERANCE};
use crate::draw::geometry::{DEFAULT_INTERSECTION_TOLERANCE_FACTOR, MAX_SMOOTHING_LEVEL};
use crate::draw::model::Color;
use crate::draw::render::DEFAULT_ACTIVE_CACHE_THRESHOLD;
use serde::{Deserialize, Serialize};

pub const MAX_PRESET_COLORS: usize = 5;
pub const MIN_STROKE_WIDTH: f32 = 0.5;
pub const MAX_STROKE_WIDTH: f32 = 100.0;
pub const MIN_TEXT_SIZE: f32 = 6.0;
pub const MAX_TEXT_SIZE: f32 = 200.0;

/// Tool configuration pushed in by the control panel. Changes only affect
/// strokes and text created afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InkSettings {
    #[serde(default = "default_stroke_color")]
    pub stroke_color: Color,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    #[serde(default = "default_text_size")]
    pub text_size: f32,
    #[serde(default = "default_preset_colors")]
    pub preset_colors: Vec<Color>,
    #[serde(default)]
    pub smoothing_level: usize,
    #[serde(default)]
    pub enable_pressure: bool,
    #[serde(default = "default_eraser_radius")]
    pub eraser_radius: f32,
    #[serde(default = "default_hit_tolerance")]
    pub hit_tolerance: f32,
    #[serde(default = "default_intersection_tolerance_factor")]
    pub intersection_tolerance_factor: f32,
    #[serde(default = "default_active_cache_threshold")]
    pub active_cache_threshold: usize,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for InkSettings {
    fn default() -> Self {
        Self {
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            text_size: default_text_size(),
            preset_colors: default_preset_colors(),
            smoothing_level: 0,
            enable_pressure: false,
            eraser_radius: default_eraser_radius(),
            hit_tolerance: default_hit_tolerance(),
            intersection_tolerance_factor: default_intersection_tolerance_factor(),
            active_cache_threshold: default_active_cache_threshold(),
            debug_logging: false,
        }
    }
}

impl InkSettings {
    /// Pulls every field back into its valid range.
    pub fn sanitize(&mut self) {
        self.stroke_width = sanitize_range(
            self.stroke_width,
            MIN_STROKE_WIDTH,
            MAX_STROKE_WIDTH,
            default_stroke_width(),
        );
        self.text_size = sanitize_range(
            self.text_size,
            MIN_TEXT_SIZE,
            MAX_TEXT_SIZE,
            default_text_size(),
        );
        self.preset_colors.truncate(MAX_PRESET_COLORS);
        self.smoothing_level = self.smoothing_level.min(MAX_SMOOTHING_LEVEL);
        if !(self.eraser_radius.is_finite() && self.eraser_radius >= 0.0) {
            self.eraser_radius = default_eraser_radius();
        }
        if !(self.hit_tolerance.is_finite() && self.hit_tolerance >= 0.0) {
            self.hit_tolerance = default_hit_tolerance();
        }
        if !(self.intersection_tolerance_factor.is_finite()
            && self.intersection_tolerance_factor > 0.0)
        {
            self.intersection_tolerance_factor = default_intersection_tolerance_factor();
        }
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            eraser_radius: self.eraser_radius,
            hit_tolerance: self.hit_tolerance,
            intersection_factor: self.intersection_tolerance_factor,
        }
    }

    pub fn preset_color(&self, slot: usize) -> Option<Color> {
        self.preset_colors.get(slot).copied()
    }

    /// Stores `color` in preset `slot`, growing the list up to the preset limit.
    pub fn set_preset_color(&mut self, slot: usize, color: Color) -> bool {
        if slot >= MAX_PRESET_COLORS {
            return false;
        }
        if slot >= self.preset_colors.len() {
            self.preset_colors.resize(slot + 1, default_stroke_color());
        }
        self.preset_colors[slot] = color;
        true
    }
}

fn sanitize_range(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

fn default_stroke_color() -> Color {
    Color::RED
}

fn default_stroke_width() -> f32 {
    3.0
}

fn default_text_size() -> f32 {
    24.0
}

fn default_preset_colors() -> Vec<Color> {
    vec![Color::RED, Color::BLUE, Color::GREEN]
}

fn default_eraser_radius() -> f32 {
    DEFAULT_ERASER_RADIUS
}

fn default_hit_tolerance() -> f32 {
    DEFAULT_HIT_TOLERANCE
}

fn default_intersection_tolerance_factor() -> f32 {
    DEFAULT_INTERSECTION_TOLERANCE_FACTOR
}

fn default_active_cache_threshold() -> usize {
    DEFAULT_ACTIVE_CACHE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: InkSettings =
            serde_json::from_str(r#"{"stroke_width": 7.5, "smoothing_level": 2}"#).unwrap();
        assert_eq!(settings.stroke_width, 7.5);
        assert_eq!(settings.smoothing_level, 2);
        assert_eq!(settings.text_size, default_text_size());
        assert_eq!(settings.preset_colors, default_preset_colors());
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut settings = InkSettings {
            stroke_width: -4.0,
            text_size: f32::NAN,
            preset_colors: vec![Color::RED; 8],
            smoothing_level: 99,
            intersection_tolerance_factor: 0.0,
            ..InkSettings::default()
        };
        settings.sanitize();
        assert_eq!(settings.stroke_width, MIN_STROKE_WIDTH);
        assert_eq!(settings.text_size, default_text_size());
        assert_eq!(settings.preset_colors.len(), MAX_PRESET_COLORS);
        assert_eq!(settings.smoothing_level, MAX_SMOOTHING_LEVEL);
        assert_eq!(
            settings.intersection_tolerance_factor,
            DEFAULT_INTERSECTION_TOLERANCE_FACTOR
        );
    }

    #[test]
    fn preset_slots_are_bounded() {
        let mut settings = InkSettings::default();
        assert!(settings.set_preset_color(4, Color::YELLOW));
        assert_eq!(settings.preset_colors.len(), 5);
        assert_eq!(settings.preset_color(4), Some(Color::YELLOW));
        assert!(!settings.set_preset_color(5, Color::BLACK));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut settings = InkSettings {
            stroke_width: 40.0,
            smoothing_level: 3,
            ..InkSettings::default()
        };
        settings.reset_to_defaults();
        assert_eq!(settings, InkSettings::default());
    }
}
