//! Audio feature tracking: overall loudness plus percussive hold signals.
//!
//! Raw peak detections are single-frame booleans; the tracker stretches them
//! into exponentially-decaying "hold" values so a kick or snare keeps
//! bending the visuals for a perceptible tail after the transient itself.

use crate::audio::SpectralFrame;

/// Per-tick decay factor for the kick/snare hold signals
pub const HOLD_DECAY: f32 = 0.9;

/// Smoothly-varying control signals derived from one spectral frame
#[derive(Clone, Copy, Debug, Default)]
pub struct ReactiveState {
    /// Mean of the three band energies, in [0, 1]
    pub overall: f32,

    /// Kick hold: re-armed to 1.0 on detection, decays by 0.9 per tick
    pub kick_hold: f32,

    /// Snare hold: same rule as the kick hold
    pub snare_hold: f32,
}

/// Tracks hold state across ticks; the only mutable state is the two holds.
#[derive(Debug, Default)]
pub struct AudioFeatureTracker {
    state: ReactiveState,
}

impl AudioFeatureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one spectral frame and return the updated reactive state.
    ///
    /// A detection re-arms the hold to 1.0 *before* the decay is applied,
    /// so the value observed on a detection tick is exactly 0.9. This
    /// evaluation order is part of the visual contract; a compatibility
    /// test below pins it.
    pub fn update(&mut self, frame: &SpectralFrame) -> ReactiveState {
        if frame.kick_detected {
            self.state.kick_hold = 1.0;
        }
        if frame.snare_detected {
            self.state.snare_hold = 1.0;
        }
        self.state.kick_hold *= HOLD_DECAY;
        self.state.snare_hold *= HOLD_DECAY;

        self.state.overall = (frame.bass + frame.mid + frame.treble) / 3.0;

        self.state
    }

    /// Current reactive state (last value returned by `update`)
    pub fn state(&self) -> ReactiveState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_frame() -> SpectralFrame {
        SpectralFrame::default()
    }

    fn kick_frame() -> SpectralFrame {
        SpectralFrame {
            kick_detected: true,
            ..SpectralFrame::default()
        }
    }

    #[test]
    fn test_overall_is_band_mean() {
        let mut tracker = AudioFeatureTracker::new();
        let state = tracker.update(&SpectralFrame {
            bass: 0.9,
            mid: 0.6,
            treble: 0.3,
            ..SpectralFrame::default()
        });
        assert!((state.overall - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_hold_is_decayed_same_tick_as_detection() {
        // Compatibility: re-arm to 1.0 happens before the decay, so the
        // observable value on the detection tick is 0.9, not 1.0.
        let mut tracker = AudioFeatureTracker::new();
        let state = tracker.update(&kick_frame());
        assert!((state.kick_hold - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_hold_decays_geometrically_after_detection() {
        let mut tracker = AudioFeatureTracker::new();
        tracker.update(&kick_frame());

        let expected = [0.81, 0.729, 0.6561];
        for &e in &expected {
            let state = tracker.update(&silent_frame());
            assert!((state.kick_hold - e).abs() < 1e-5);
        }
    }

    #[test]
    fn test_holds_stay_in_unit_interval() {
        let mut tracker = AudioFeatureTracker::new();
        for i in 0..200 {
            let frame = SpectralFrame {
                kick_detected: i % 3 == 0,
                snare_detected: i % 7 == 0,
                ..SpectralFrame::default()
            };
            let state = tracker.update(&frame);
            assert!(state.kick_hold >= 0.0 && state.kick_hold <= 1.0);
            assert!(state.snare_hold >= 0.0 && state.snare_hold <= 1.0);
        }
    }

    #[test]
    fn test_snare_hold_independent_of_kick() {
        let mut tracker = AudioFeatureTracker::new();
        let state = tracker.update(&SpectralFrame {
            snare_detected: true,
            ..SpectralFrame::default()
        });
        assert!((state.snare_hold - 0.9).abs() < 1e-6);
        assert_eq!(state.kick_hold, 0.0);
    }

    #[test]
    fn test_hold_near_zero_after_sustained_silence() {
        let mut tracker = AudioFeatureTracker::new();
        tracker.update(&kick_frame());
        for _ in 0..60 {
            tracker.update(&silent_frame());
        }
        // 0.9^61 ≈ 0.0016
        assert!(tracker.state().kick_hold < 0.01);
    }
}
