// Error types for the emotion mirror application

use thiserror::Error;

/// Main error type for the emotion mirror application
#[derive(Debug, Error)]
pub enum EmotionMirrorError {
    #[error("Camera initialization failed: {0}")]
    CameraInit(String),

    #[error("Frame capture failed: {0}")]
    FrameCapture(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Face detection failed: {0}")]
    FaceDetection(String),

    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(String),

    #[error("OpenCV error: {0}")]
    OpenCv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for emotion mirror operations
pub type Result<T> = std::result::Result<T, EmotionMirrorError>;

// Conversion from nokhwa errors
impl From<nokhwa::NokhwaError> for EmotionMirrorError {
    fn from(err: nokhwa::NokhwaError) -> Self {
        match err {
            nokhwa::NokhwaError::StructureError { structure, error } => {
                EmotionMirrorError::CameraInit(format!("{structure}: {error}"))
            }
            nokhwa::NokhwaError::OpenDeviceError(device, error) => {
                EmotionMirrorError::CameraInit(format!("Device {device}: {error}"))
            }
            nokhwa::NokhwaError::GetPropertyError { property, error } => {
                EmotionMirrorError::CameraInit(format!("Property {property}: {error}"))
            }
            _ => EmotionMirrorError::CameraInit(err.to_string()),
        }
    }
}

// Conversion from OpenCV errors
impl From<opencv::Error> for EmotionMirrorError {
    fn from(err: opencv::Error) -> Self {
        EmotionMirrorError::OpenCv(err.to_string())
    }
}

// Conversion from ONNX Runtime errors
impl From<ort::Error> for EmotionMirrorError {
    fn from(err: ort::Error) -> Self {
        EmotionMirrorError::OnnxRuntime(err.to_string())
    }
}
