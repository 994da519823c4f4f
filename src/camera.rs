// Camera module for webcam capture

use crate::error::{EmotionMirrorError, Result};
use crate::models::Frame;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{error, info};

/// Requested capture format: 640x480 at 30 FPS, closest match wins
const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;
const CAPTURE_FPS: u32 = 30;

/// Anything the capture loop can pull frames from.
/// The one production implementation is [`CameraFeed`]; tests substitute
/// their own source to run the loop without hardware.
pub trait FrameSource {
    /// Reads the most recent frame, blocking for at most one frame interval
    fn read_frame(&mut self) -> Result<Frame>;
}

/// An open webcam stream. Holding a CameraFeed means the device is open;
/// dropping it releases the device.
pub struct CameraFeed {
    camera: Camera,
}

impl CameraFeed {
    /// Opens the default camera device and starts its stream.
    /// Tries index 0 first, then 1 (some systems enumerate from 1).
    pub fn open() -> Result<Self> {
        let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            nokhwa::utils::CameraFormat::new(
                nokhwa::utils::Resolution::new(CAPTURE_WIDTH, CAPTURE_HEIGHT),
                nokhwa::utils::FrameFormat::YUYV,
                CAPTURE_FPS,
            ),
        ));

        let mut camera = Self::try_open_camera(0, requested_format)
            .or_else(|_| Self::try_open_camera(1, requested_format))
            .map_err(|e| {
                error!(
                    "Failed to initialize camera after trying multiple indices: {}",
                    e
                );
                EmotionMirrorError::CameraInit(format!(
                    "Could not open camera. Make sure:\n\
                    1. A camera is connected\n\
                    2. No other app is using it\n\
                    3. Camera permissions are granted\n\
                    Error: {e}"
                ))
            })?;

        camera.open_stream().map_err(|e| {
            error!("Failed to open camera stream: {}", e);
            EmotionMirrorError::CameraInit(e.to_string())
        })?;

        // Give the device a moment to warm up, then verify it delivers frames
        std::thread::sleep(std::time::Duration::from_millis(200));
        camera.frame().map_err(|e| {
            error!("Camera stream not working: {}", e);
            EmotionMirrorError::CameraInit(format!(
                "Camera stream not working: {e}. Make sure camera permissions are granted."
            ))
        })?;

        info!(
            "Camera opened: {} at {}x{}",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height()
        );

        Ok(Self { camera })
    }

    /// Helper to try opening a camera at a specific index
    fn try_open_camera(index: u32, requested_format: RequestedFormat) -> Result<Camera> {
        Camera::new(CameraIndex::Index(index), requested_format)
            .map_err(|e| EmotionMirrorError::CameraInit(e.to_string()))
    }

    /// Returns the current camera resolution
    pub fn resolution(&self) -> (u32, u32) {
        let res = self.camera.resolution();
        (res.width(), res.height())
    }
}

impl FrameSource for CameraFeed {
    fn read_frame(&mut self) -> Result<Frame> {
        let frame_data = self.camera.frame().map_err(|e| {
            EmotionMirrorError::FrameCapture(format!("Failed to capture frame: {e}"))
        })?;

        let buffer = frame_data.decode_image::<RgbFormat>().map_err(|e| {
            EmotionMirrorError::FrameCapture(format!("Failed to decode frame: {e}"))
        })?;

        let (width, height) = (buffer.width(), buffer.height());
        Ok(Frame::new(buffer.into_raw(), width, height))
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            error!("Error stopping camera stream: {}", e);
        }
    }
}
