//! Parameter definitions with documented ranges and semantics.
//!
//! All fixed constants live here as parameter structs with `Default` impls:
//! canvas geometry, FFT analysis setup, peak-detection tuning, and the
//! recording configuration.

use std::ops::Range;

/// Simulation constants (canvas geometry, population, noise stepping)
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Canvas width in pixels
    pub canvas_width: f32,

    /// Canvas height in pixels
    pub canvas_height: f32,

    /// Flow-field cell size in pixels (canvas is divided into cells)
    pub cell_size: f32,

    /// Number of particles (created once, never destroyed)
    pub particle_count: usize,

    /// Noise-coordinate step between adjacent field cells
    pub noise_step: f64,

    /// Base particle speed limit, scaled per-tick by the wind factor
    pub max_speed: f32,

    /// Perlin noise seed (deterministic within a run)
    pub noise_seed: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600.0,
            canvas_height: 600.0,
            cell_size: 20.0,
            particle_count: 250,
            noise_step: 0.01,
            max_speed: 1.0,
            noise_seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Field rows: floor(canvas width / cell size)
    pub fn rows(&self) -> usize {
        (self.canvas_width / self.cell_size).floor() as usize
    }

    /// Field columns: floor(canvas height / cell size)
    pub fn cols(&self) -> usize {
        (self.canvas_height / self.cell_size).floor() as usize
    }
}

/// FFT analysis configuration with frequency band mappings
#[derive(Debug, Clone)]
pub struct FFTConfig {
    /// Audio sample rate (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// FFT update interval (milliseconds)
    pub update_interval_ms: u64,

    /// Exponential smoothing applied to band energies between updates
    /// (0 = no smoothing, 0.9 = heavy smoothing)
    pub smoothing: f32,

    /// Bass frequency range (Hz)
    pub bass_range_hz: (f32, f32),

    /// Mid frequency range (Hz)
    pub mid_range_hz: (f32, f32),

    /// Treble frequency range (Hz)
    pub treble_range_hz: (f32, f32),
}

impl Default for FFTConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 1024,
            update_interval_ms: 50,
            smoothing: 0.9,
            bass_range_hz: (20.0, 140.0),
            mid_range_hz: (400.0, 2600.0),
            treble_range_hz: (5200.0, 14000.0),
        }
    }
}

impl FFTConfig {
    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Get the FFT bin range covering a frequency band (Hz)
    pub fn bins(&self, range_hz: (f32, f32)) -> Range<usize> {
        self.hz_to_bin(range_hz.0)..self.hz_to_bin(range_hz.1)
    }

    /// Get FFT bin range for bass frequencies
    pub fn bass_bins(&self) -> Range<usize> {
        self.bins(self.bass_range_hz)
    }

    /// Get FFT bin range for mid frequencies
    pub fn mid_bins(&self) -> Range<usize> {
        self.bins(self.mid_range_hz)
    }

    /// Get FFT bin range for treble frequencies
    pub fn treble_bins(&self) -> Range<usize> {
        self.bins(self.treble_range_hz)
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        Ok(())
    }
}

/// Transient (peak) detector tuning for one frequency band
#[derive(Debug, Clone)]
pub struct PeakDetectConfig {
    /// Band to watch (Hz)
    pub freq_range_hz: (f32, f32),

    /// Minimum normalized band energy for a peak to fire
    pub threshold: f32,

    /// Refractory window (analysis frames) before the cutoff starts decaying
    pub frames_per_peak: u32,

    /// Cutoff decay factor applied per frame once past the refractory window
    pub decay_rate: f32,

    /// Ratchet multiplier applied to the cutoff when a peak fires
    pub cutoff_mult: f32,
}

impl PeakDetectConfig {
    /// Kick drum band: low-end thump at 20-80 Hz
    pub fn kick() -> Self {
        Self {
            freq_range_hz: (20.0, 80.0),
            threshold: 0.15,
            frames_per_peak: 20,
            decay_rate: 0.95,
            cutoff_mult: 1.5,
        }
    }

    /// Snare band: broadband crack at 200-2000 Hz
    pub fn snare() -> Self {
        Self {
            freq_range_hz: (200.0, 2000.0),
            threshold: 0.15,
            frames_per_peak: 20,
            decay_rate: 0.95,
            cutoff_mult: 1.5,
        }
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 600,
            window_height: 600,
        }
    }
}

/// Audio constants (compile-time, match Glicol engine setup)
pub mod audio_constants {
    /// Audio block size (samples per buffer)
    pub const BLOCK_SIZE: usize = 128;
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}
