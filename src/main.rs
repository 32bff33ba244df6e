//! Verdant - a thick, green, calmer-when-quiet, hyper-reactive flow field.
//!
//! Percussive hits re-arm decaying hold signals that bend a Perlin flow
//! field; 250 particles ride the field and leave green trails synced to
//! the music.

use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use verdant::audio::AudioSystem;
use verdant::cli::Args;
use verdant::params::{FFTConfig, RecordingConfig, RenderConfig, SimulationConfig};
use verdant::rendering::RenderSystem;
use verdant::simulation::Simulation;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation and audio
    simulation: Simulation,
    audio: Option<AudioSystem>,

    // Configuration
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,

    // Frame counter (drives the recording budget)
    frame_num: usize,
}

impl App {
    fn new(seed: u32, recording_config: Option<RecordingConfig>) -> Self {
        let simulation_config = SimulationConfig {
            noise_seed: seed,
            ..SimulationConfig::default()
        };

        Self {
            window: None,
            render_system: None,
            simulation: Simulation::new(simulation_config),
            audio: None,
            render_config: RenderConfig::default(),
            recording_config,
            frame_num: 0,
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Verdant - Audio-Reactive Flow Field")
            .with_resizable(false)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.simulation.config().particle_count,
            self.recording_config.clone(),
        ))
        .unwrap();

        // Initialize audio system
        let audio = AudioSystem::new(FFTConfig::default(), self.recording_config.clone()).unwrap();

        println!("\nVerdant is running!");
        println!("Press ESC to quit\n");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.audio = Some(audio);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    /// Run one simulation tick and render the result
    fn render_frame(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        let Some(render_system) = self.render_system.as_mut() else {
            return;
        };
        let Some(ref audio) = self.audio else {
            return;
        };

        // Latest spectral frame (taking it clears the latched peak flags)
        let frame = audio.take_frame();

        // Advance the simulation by one tick
        let output = self.simulation.tick(&frame);

        // Upload this tick's fade quad and trail segments
        render_system.upload_frame(output.fade_alpha, &output.segments);

        if let Err(e) = render_system.render(self.frame_num) {
            eprintln!("Render error: {:?}", e);
        }
        self.frame_num += 1;

        // Stop once the recording frame budget is spent
        if let Some(ref config) = self.recording_config {
            if self.frame_num >= config.total_frames() {
                println!("Recording complete: {} frames", self.frame_num);
                event_loop.exit();
            }
        }
    }
}

fn main() {
    println!("Verdant - audio-reactive flow-field particle visualizer");
    println!("Initializing systems...\n");

    let args = Args::parse();
    let recording_config = args.create_recording_config();

    let mut app = App::new(args.seed, recording_config);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);
}
