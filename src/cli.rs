//! Command-line argument parsing.

use clap::Parser;

use crate::params::RecordingConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Verdant")]
#[command(about = "Audio-reactive flow-field particle visualizer", long_about = None)]
pub struct Args {
    /// Record the run to PNG frames + WAV audio (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Perlin noise seed for the flow field
    #[arg(long, value_name = "SEED", default_value = "42")]
    pub seed: u32,
}

impl Args {
    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| {
            let config = RecordingConfig::new(duration);

            // Create output directories
            std::fs::create_dir_all(config.frames_dir())
                .expect("Failed to create frames directory");
            std::fs::create_dir_all(&config.output_dir).expect("Failed to create output directory");

            config
        })
    }
}
