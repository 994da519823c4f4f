use emotion_mirror::detector::{EmotionDetector, EMOTION_MODEL_PATH, FACE_CASCADE_PATH};
use emotion_mirror::error::{EmotionMirrorError, Result};
use emotion_mirror::ui::EmotionMirrorApp;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the logging system (file only, no console output)
fn init_logging() -> Result<()> {
    let log_file =
        std::fs::File::create("emotion_mirror.log").map_err(EmotionMirrorError::Io)?;

    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false);

    tracing_subscriber::registry().with(file_layer).init();

    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let detector = EmotionDetector::new(FACE_CASCADE_PATH, EMOTION_MODEL_PATH)?;

    let result = eframe::run_native(
        "Emotion Mirror",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([800.0, 600.0])
                .with_title("Emotion Mirror"),
            ..Default::default()
        },
        Box::new(move |_cc| Ok(Box::new(EmotionMirrorApp::new(detector)))),
    );

    if let Err(e) = result {
        error!("Application error: {}", e);
    }

    Ok(())
}
