//! Verdant library - audio-reactive flow-field particle simulation

pub mod audio;
pub mod cli;
pub mod features;
pub mod field;
pub mod intensity;
pub mod math;
pub mod params;
pub mod particles;
pub mod rendering;
pub mod simulation;
