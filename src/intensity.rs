//! Audio-driven stroke styling for trail segments.
//!
//! Maps the reactive state to per-tick stroke width, green brightness and
//! alpha, plus the full-canvas fade that erodes old trails. All values are
//! on the 0-255 color scale the renderer divides down.

use crate::features::ReactiveState;
use crate::math::map_range;

/// Stroke styling shared by every particle segment in one tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Line thickness in pixels
    pub stroke_width: f32,

    /// Green channel, nominal range [60, 255] (red and blue stay 0)
    pub green: f32,

    /// Segment alpha, nominal range [30, 80] on the 0-255 scale
    pub alpha: f32,
}

/// Maps reactive state to stroke styling and background fade.
///
/// The nominal intensity input range is [0, 1.5]; inputs above it
/// extrapolate past the stated output ranges. That extrapolation is part
/// of the look — do not clamp here.
#[derive(Debug, Clone)]
pub struct RenderIntensityMapper {
    intensity_range: (f32, f32),
    stroke_range: (f32, f32),
    green_range: (f32, f32),
    alpha_range: (f32, f32),
    fade_range: (f32, f32),
}

impl Default for RenderIntensityMapper {
    fn default() -> Self {
        Self {
            intensity_range: (0.0, 1.5),
            stroke_range: (2.0, 6.0),
            green_range: (60.0, 255.0),
            alpha_range: (30.0, 80.0),
            fade_range: (50.0, 5.0),
        }
    }
}

impl RenderIntensityMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Combined intensity: loudness plus half of the stronger hold
    fn intensity(state: &ReactiveState) -> f32 {
        state.overall + state.kick_hold.max(state.snare_hold) * 0.5
    }

    /// Stroke styling for this tick's segments
    pub fn style(&self, state: &ReactiveState) -> StrokeStyle {
        let intensity = Self::intensity(state);
        let (lo, hi) = self.intensity_range;
        StrokeStyle {
            stroke_width: map_range(intensity, lo, hi, self.stroke_range.0, self.stroke_range.1),
            green: map_range(intensity, lo, hi, self.green_range.0, self.green_range.1),
            alpha: map_range(intensity, lo, hi, self.alpha_range.0, self.alpha_range.1),
        }
    }

    /// Alpha of the full-canvas black fade quad, 0-255 scale.
    ///
    /// Quiet passages fade old trails fast (alpha 50), loud ones barely
    /// touch them (alpha 5), so trails grow long when the music is busy.
    pub fn fade_alpha(&self, state: &ReactiveState) -> f32 {
        map_range(
            state.overall,
            0.0,
            1.0,
            self.fade_range.0,
            self.fade_range.1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(overall: f32, kick: f32, snare: f32) -> ReactiveState {
        ReactiveState {
            overall,
            kick_hold: kick,
            snare_hold: snare,
        }
    }

    #[test]
    fn test_style_at_zero_intensity() {
        let mapper = RenderIntensityMapper::new();
        let style = mapper.style(&state(0.0, 0.0, 0.0));
        assert!((style.stroke_width - 2.0).abs() < 1e-6);
        assert!((style.green - 60.0).abs() < 1e-6);
        assert!((style.alpha - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_style_at_full_intensity() {
        // overall 1.0 + max(1.0, 0.0) * 0.5 = 1.5, the top of the range
        let mapper = RenderIntensityMapper::new();
        let style = mapper.style(&state(1.0, 1.0, 0.0));
        assert!((style.stroke_width - 6.0).abs() < 1e-4);
        assert!((style.green - 255.0).abs() < 1e-3);
        assert!((style.alpha - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_stronger_hold_wins() {
        let mapper = RenderIntensityMapper::new();
        let kick_heavy = mapper.style(&state(0.2, 0.8, 0.1));
        let snare_heavy = mapper.style(&state(0.2, 0.1, 0.8));
        assert_eq!(kick_heavy, snare_heavy);
    }

    #[test]
    fn test_no_clamp_above_nominal_range() {
        // An over-range input keeps extrapolating past the stated outputs;
        // pinned so a future clamp shows up as a deliberate visual change.
        let mapper = RenderIntensityMapper::new();
        let hot = mapper.style(&state(1.4, 1.0, 0.0)); // intensity 1.9
        assert!(hot.stroke_width > 6.0);
        assert!(hot.green > 255.0);
        assert!(hot.alpha > 80.0);
    }

    #[test]
    fn test_fade_alpha_inverts_loudness() {
        let mapper = RenderIntensityMapper::new();
        assert!((mapper.fade_alpha(&state(0.0, 0.0, 0.0)) - 50.0).abs() < 1e-6);
        assert!((mapper.fade_alpha(&state(1.0, 0.0, 0.0)) - 5.0).abs() < 1e-6);
    }
}
