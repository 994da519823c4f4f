// UI module for the emotion mirror application

use crate::camera::CameraFeed;
use crate::capture::{CaptureLoop, TICK_INTERVAL};
use crate::detector::EmotionDetector;
use crate::models::EmotionReading;
use std::time::Instant;
use tracing::{error, info};

/// Main application: the capture-display loop wired to egui widgets
pub struct EmotionMirrorApp {
    capture: CaptureLoop<CameraFeed>,
    detector: EmotionDetector,
    video_texture: Option<egui::TextureHandle>,
    reading: Option<EmotionReading>,
}

impl EmotionMirrorApp {
    /// Creates a new app around a loaded detection pipeline, idle until the
    /// user starts the camera
    pub fn new(detector: EmotionDetector) -> Self {
        Self {
            capture: CaptureLoop::new(TICK_INTERVAL),
            detector,
            video_texture: None,
            reading: None,
        }
    }

    /// Start/stop button handler. Opening the camera can fail; the app then
    /// stays idle and the failure is only logged.
    fn toggle_camera(&mut self) {
        if self.capture.is_running() {
            drop(self.capture.stop());
            self.video_texture = None;
            info!("Camera stopped");
        } else {
            match CameraFeed::open() {
                Ok(feed) => {
                    let (width, height) = feed.resolution();
                    info!("Camera started at {}x{}", width, height);
                    self.capture.start(feed, Instant::now());
                }
                Err(e) => {
                    error!("Failed to start camera: {}", e);
                }
            }
        }
    }

    /// Runs one capture tick if due: read, mirror, detect, update widgets.
    /// With no face in view the previous reading stays on screen.
    fn run_tick(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.capture.poll(Instant::now()) else {
            return;
        };

        match self.detector.detect(&frame) {
            Ok(faces) => {
                self.reading = EmotionReading::updated(self.reading, &faces);
            }
            Err(e) => {
                error!("Emotion detection failed: {}", e);
            }
        }

        let color_image = egui::ColorImage::from_rgb(
            [frame.width as usize, frame.height as usize],
            &frame.data,
        );
        self.video_texture =
            Some(ctx.load_texture("camera", color_image, egui::TextureOptions::LINEAR));
    }

    /// Renders the emotion label and the start/stop control
    fn render_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                let emotion_text = match &self.reading {
                    Some(reading) => format!("Emotion: {reading}"),
                    None => "Emotion: Detecting...".to_string(),
                };
                ui.label(
                    egui::RichText::new(emotion_text)
                        .size(20.0)
                        .color(egui::Color32::LIGHT_BLUE),
                );

                let button_text = if self.capture.is_running() {
                    "Stop Camera"
                } else {
                    "Start Camera"
                };
                if ui.button(button_text).clicked() {
                    self.toggle_camera();
                }
            });
        });
    }

    /// Renders the mirrored camera view, aspect-fit and centered
    fn render_video(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let available_size = ui.available_size();

            if let Some(texture) = &self.video_texture {
                let texture_size = texture.size_vec2();
                let aspect_ratio = texture_size.x / texture_size.y;

                let mut display_width = available_size.x;
                let mut display_height = display_width / aspect_ratio;

                if display_height > available_size.y {
                    display_height = available_size.y;
                    display_width = display_height * aspect_ratio;
                }

                let x_offset = (available_size.x - display_width) / 2.0;
                let y_offset = (available_size.y - display_height) / 2.0;

                ui.put(
                    egui::Rect::from_min_size(
                        egui::pos2(x_offset, y_offset),
                        egui::vec2(display_width, display_height),
                    ),
                    egui::Image::new(texture)
                        .fit_to_exact_size(egui::vec2(display_width, display_height)),
                );
            } else {
                ui.centered_and_justified(|ui| {
                    ui.label("Camera is off");
                });
            }
        });
    }
}

impl eframe::App for EmotionMirrorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.run_tick(ctx);

        self.render_controls(ctx);
        self.render_video(ctx);

        // Keep the event loop ticking while the camera runs; when idle the
        // next repaint comes from user input
        if self.capture.is_running() {
            ctx.request_repaint_after(self.capture.time_until_tick(Instant::now()));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Release the camera regardless of running state
        if self.capture.stop().is_some() {
            info!("Camera released on exit");
        }
    }
}
