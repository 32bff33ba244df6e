//! Audio synthesis, FFT analysis and transient detection.
//!
//! Combines Glicol procedural synthesis with real-time FFT analysis to
//! produce one `SpectralFrame` per analysis update: normalized band
//! energies plus kick/snare transient flags for the simulation to consume.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glicol::Engine;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::params::{audio_constants::BLOCK_SIZE, FFTConfig, PeakDetectConfig, RecordingConfig};

/// Glicol composition (procedural music code): four-on-the-floor-ish kick,
/// offbeat noise snare, low saw pad
const GLICOL_COMPOSITION: &str = r#"
~beat: speed 2.0 >> seq 60 _ _60 60
~kamp: ~beat >> envperc 0.001 0.12
~kick: sin 52.0 >> mul ~kamp
~back: speed 2.0 >> seq _ 60 _ 60
~samp: ~back >> envperc 0.001 0.07
~snare: noiz 42 >> hpf 1900.0 1.0 >> mul ~samp >> mul 0.5
~pad: saw 110.0 >> lpf 600.0 1.0 >> mul 0.05
o: ~kick >> add ~snare >> add ~pad >> plate 0.08
"#;

/// Spectral summary of the current audio, normalized per band to [0, 1].
/// The detection flags are latched until the frame is taken.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpectralFrame {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub kick_detected: bool,
    pub snare_detected: bool,
}

/// Threshold-and-ratchet transient detector over one band's energy.
///
/// A peak fires when the energy rises above both a fixed threshold and a
/// moving cutoff; the cutoff then ratchets above the peak and decays back
/// toward the threshold after a refractory window, so one hit cannot
/// retrigger on its own tail.
pub struct PeakDetector {
    threshold: f32,
    cutoff: f32,
    cutoff_mult: f32,
    decay_rate: f32,
    frames_per_peak: u32,
    frames_since_peak: u32,
    prev_energy: f32,
}

impl PeakDetector {
    pub fn new(config: &PeakDetectConfig) -> Self {
        Self {
            threshold: config.threshold,
            cutoff: 0.0,
            cutoff_mult: config.cutoff_mult,
            decay_rate: config.decay_rate,
            frames_per_peak: config.frames_per_peak,
            frames_since_peak: 0,
            prev_energy: 0.0,
        }
    }

    /// Feed one analysis frame's band energy; true when a transient fires
    pub fn update(&mut self, energy: f32) -> bool {
        let detected =
            energy > self.cutoff && energy > self.threshold && energy > self.prev_energy;

        if detected {
            self.cutoff = energy * self.cutoff_mult;
            self.frames_since_peak = 0;
        } else if self.frames_since_peak <= self.frames_per_peak {
            self.frames_since_peak += 1;
        } else {
            self.cutoff = (self.cutoff * self.decay_rate).max(self.threshold);
        }

        self.prev_energy = energy;
        detected
    }
}

/// Audio system managing synthesis, FFT analysis and peak detection
pub struct AudioSystem {
    /// Latest spectral frame (thread-safe, peak flags latched)
    frame: Arc<Mutex<SpectralFrame>>,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    /// FFT analysis thread handle (optional, for cleanup)
    _fft_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Create and start audio system with specified configuration
    pub fn new(
        fft_config: FFTConfig,
        recording_config: Option<RecordingConfig>,
    ) -> Result<Self, String> {
        // Validate FFT configuration
        fft_config
            .validate()
            .map_err(|e| format!("Invalid FFT config: {}", e))?;

        // Create WAV writer if recording
        let wav_writer: Option<Arc<Mutex<hound::WavWriter<std::io::BufWriter<std::fs::File>>>>> =
            recording_config.as_ref().map(|config| {
                let spec = hound::WavSpec {
                    channels: 2,
                    sample_rate: fft_config.sample_rate_hz as u32,
                    bits_per_sample: 32,
                    sample_format: hound::SampleFormat::Float,
                };
                let writer = hound::WavWriter::create(config.audio_path(), spec)
                    .expect("Failed to create WAV writer");
                Arc::new(Mutex::new(writer))
            });

        let wav_writer_clone = wav_writer.clone();

        // Create Glicol engine
        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(fft_config.sample_rate_hz);
        engine.update_with_code(GLICOL_COMPOSITION);
        engine
            .update()
            .map_err(|e| format!("Glicol engine init failed: {:?}", e))?;

        // Shared state between audio callback and FFT thread
        let engine = Arc::new(Mutex::new(engine));
        let engine_clone = Arc::clone(&engine);

        let fft_buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let fft_buffer_clone = Arc::clone(&fft_buffer);

        let frame = Arc::new(Mutex::new(SpectralFrame::default()));
        let frame_fft = Arc::clone(&frame);

        // Setup audio output device
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("No audio output device found")?;

        let config = device
            .default_output_config()
            .map_err(|e| format!("Failed to get audio config: {}", e))?;

        println!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate().0
        );

        // Build audio output stream
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut engine = engine_clone.lock().unwrap();
                    let mut fft_buf = fft_buffer_clone.lock().unwrap();

                    let frames_needed = data.len() / 2; // Stereo frames
                    let mut frame_idx = 0;

                    // Generate multiple blocks if needed to fill the buffer
                    while frame_idx < frames_needed {
                        let (buffers, _) = engine.next_block(vec![]);

                        let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                        for i in 0..samples_to_copy {
                            // Safety limiter: hard clip to ±0.5
                            let left = buffers[0][i].clamp(-0.5, 0.5);
                            let right = buffers[1][i].clamp(-0.5, 0.5);

                            let out_idx = (frame_idx + i) * 2;
                            data[out_idx] = left;
                            data[out_idx + 1] = right;

                            fft_buf.push(left); // Accumulate for FFT analysis

                            // Record to WAV if recording
                            if let Some(ref writer) = wav_writer_clone {
                                if let Ok(mut w) = writer.lock() {
                                    let _ = w.write_sample(left);
                                    let _ = w.write_sample(right);
                                }
                            }
                        }

                        frame_idx += samples_to_copy;
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        // Start FFT analysis thread
        let fft_thread = spawn_fft_thread(fft_config, fft_buffer, frame_fft);

        Ok(Self {
            frame,
            _stream: stream,
            _fft_thread: Some(fft_thread),
        })
    }

    /// Take the current spectral frame, clearing the latched peak flags.
    ///
    /// Analysis runs slower than rendering; latching means a detection that
    /// lands between two render frames re-arms the holds exactly once.
    pub fn take_frame(&self) -> SpectralFrame {
        let mut shared = self.frame.lock().unwrap();
        let frame = *shared;
        shared.kick_detected = false;
        shared.snare_detected = false;
        frame
    }
}

/// Average normalized amplitude over a bin range of the spectrum
fn band_energy(spectrum: &[Complex<f32>], bins: Range<usize>, fft_size: usize) -> f32 {
    let len = bins.len().max(1) as f32;
    let sum: f32 = spectrum[bins]
        .iter()
        .map(|c| c.norm() * 2.0 / fft_size as f32)
        .sum();
    (sum / len).clamp(0.0, 1.0)
}

/// Spawn FFT analysis thread
fn spawn_fft_thread(
    config: FFTConfig,
    fft_buffer: Arc<Mutex<Vec<f32>>>,
    frame: Arc<Mutex<SpectralFrame>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let mut fft_input = vec![Complex::new(0.0, 0.0); config.fft_size];
        let mut fft_output = vec![Complex::new(0.0, 0.0); config.fft_size];

        let mut kick_detector = PeakDetector::new(&PeakDetectConfig::kick());
        let mut snare_detector = PeakDetector::new(&PeakDetectConfig::snare());
        let kick_bins = config.bins(PeakDetectConfig::kick().freq_range_hz);
        let snare_bins = config.bins(PeakDetectConfig::snare().freq_range_hz);

        // Smoothed band energies: bass, mid, treble, kick band, snare band
        let mut smoothed = [0.0f32; 5];

        loop {
            thread::sleep(Duration::from_millis(config.update_interval_ms));

            let mut fft_buf = fft_buffer.lock().unwrap();

            if fft_buf.len() >= config.fft_size {
                // Apply Hann window
                for i in 0..config.fft_size {
                    let window = hann_window(i, config.fft_size);
                    fft_input[i] = Complex::new(fft_buf[i] * window, 0.0);
                }

                // Perform FFT
                fft_output.copy_from_slice(&fft_input);
                fft.process(&mut fft_output);

                // Band energies with exponential smoothing
                let raw = [
                    band_energy(&fft_output, config.bass_bins(), config.fft_size),
                    band_energy(&fft_output, config.mid_bins(), config.fft_size),
                    band_energy(&fft_output, config.treble_bins(), config.fft_size),
                    band_energy(&fft_output, kick_bins.clone(), config.fft_size),
                    band_energy(&fft_output, snare_bins.clone(), config.fft_size),
                ];
                for (s, r) in smoothed.iter_mut().zip(raw) {
                    *s = *s * config.smoothing + r * (1.0 - config.smoothing);
                }

                let kick = kick_detector.update(smoothed[3]);
                let snare = snare_detector.update(smoothed[4]);

                // Update shared frame; peak flags stay latched until taken
                let mut shared = frame.lock().unwrap();
                shared.bass = smoothed[0];
                shared.mid = smoothed[1];
                shared.treble = smoothed[2];
                shared.kick_detected |= kick;
                shared.snare_detected |= snare;
                drop(shared);

                // 50% overlap (drain half the buffer)
                fft_buf.drain(0..config.fft_size / 2);
            }
        }
    })
}

/// Hann window function for FFT analysis
fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}
