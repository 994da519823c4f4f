// Face localization and emotion classification pipeline

use crate::error::{EmotionMirrorError, Result};
use crate::models::{Emotion, EmotionScores, FaceBox, FaceEmotions, Frame};
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use ort::session::Session;
use ort::value::Value;
use tracing::{error, warn};

/// Haar cascade for frontal face localization
pub const FACE_CASCADE_PATH: &str = "assets/models/haarcascade_frontalface_default.xml";
/// HSEmotion ONNX classifier
pub const EMOTION_MODEL_PATH: &str = "assets/models/emotion.onnx";

/// HSEmotion input resolution
const MODEL_INPUT_SIZE: i32 = 260;

/// A face cropped out of the frame, ready for classification
struct FaceCrop {
    bounds: FaceBox,
    gray: Vec<u8>,
    height: u32,
}

/// Face detector using OpenCV Haar Cascade
pub struct FaceDetector {
    classifier: CascadeClassifier,
}

impl FaceDetector {
    /// Creates a new FaceDetector by loading the Haar Cascade classifier
    pub fn new(cascade_path: &str) -> Result<Self> {
        let classifier = CascadeClassifier::new(cascade_path).map_err(|e| {
            error!("Failed to load Haar Cascade: {}", e);
            EmotionMirrorError::ModelLoad(format!("Haar Cascade load failed: {e}"))
        })?;

        if classifier.empty()? {
            return Err(EmotionMirrorError::ModelLoad(
                "Haar Cascade classifier is empty".to_string(),
            ));
        }

        Ok(Self { classifier })
    }

    /// Detects faces in the given frame, in cascade order
    fn detect_faces(&mut self, frame: &Frame) -> Result<Vec<FaceCrop>> {
        let mat = Mat::from_slice(&frame.data).map_err(|e| {
            EmotionMirrorError::FaceDetection(format!("Failed to create Mat: {e}"))
        })?;

        let mat = mat.reshape(3, frame.height as i32).map_err(|e| {
            EmotionMirrorError::FaceDetection(format!("Failed to reshape Mat: {e}"))
        })?;

        // Cascade runs on grayscale
        let mut gray = Mat::default();
        imgproc::cvt_color(
            &mat,
            &mut gray,
            imgproc::COLOR_RGB2GRAY,
            0,
            opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| {
            EmotionMirrorError::FaceDetection(format!("Failed to convert to grayscale: {e}"))
        })?;

        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &gray,
                &mut faces,
                1.1,               // scale factor (lower = more accurate)
                5,                 // min neighbors (lower = more detections)
                0,                 // flags
                Size::new(40, 40), // min size (smaller = more detections)
                Size::new(0, 0),   // max size (0,0 means no limit)
            )
            .map_err(|e| {
                EmotionMirrorError::FaceDetection(format!("Face detection failed: {e}"))
            })?;

        let mut crops = Vec::new();
        for face_rect in faces.iter() {
            match Self::extract_face_region(&gray, face_rect) {
                Ok(crop) => crops.push(crop),
                Err(e) => {
                    warn!("Failed to extract face region: {}", e);
                    continue;
                }
            }
        }

        Ok(crops)
    }

    /// Extracts and crops a face region from the grayscale image
    fn extract_face_region(gray: &Mat, rect: Rect) -> Result<FaceCrop> {
        let face_roi = Mat::roi(gray, rect).map_err(|e| {
            EmotionMirrorError::FaceDetection(format!("Failed to crop face region: {e}"))
        })?;

        // Clone the ROI to ensure the Mat is continuous in memory
        let face_continuous = face_roi.try_clone().map_err(|e| {
            EmotionMirrorError::FaceDetection(format!("Failed to clone face ROI: {e}"))
        })?;

        let face_data = face_continuous.data_bytes().map_err(|e| {
            EmotionMirrorError::FaceDetection(format!("Failed to get face data: {e}"))
        })?;

        Ok(FaceCrop {
            bounds: FaceBox {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            },
            gray: face_data.to_vec(),
            height: rect.height as u32,
        })
    }
}

/// Preprocesses a cropped face for model input: grayscale crop to RGB,
/// resized to the model resolution and normalized to [0, 1], HWC order
fn preprocess_face(face_data: &[u8], face_height: u32) -> Result<Vec<f32>> {
    let face_mat = Mat::from_slice(face_data).map_err(|e| {
        EmotionMirrorError::FrameCapture(format!("Failed to create face Mat: {e}"))
    })?;

    let face_mat = face_mat.reshape(1, face_height as i32).map_err(|e| {
        EmotionMirrorError::FrameCapture(format!("Failed to reshape face Mat: {e}"))
    })?;

    // HSEmotion expects RGB
    let mut rgb_mat = Mat::default();
    imgproc::cvt_color_def(&face_mat, &mut rgb_mat, imgproc::COLOR_GRAY2RGB).map_err(|e| {
        EmotionMirrorError::FrameCapture(format!("Failed to convert to RGB: {e}"))
    })?;

    let mut resized = Mat::default();
    imgproc::resize(
        &rgb_mat,
        &mut resized,
        Size::new(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )
    .map_err(|e| EmotionMirrorError::FrameCapture(format!("Failed to resize face: {e}")))?;

    let data = resized.data_bytes().map_err(|e| {
        EmotionMirrorError::FrameCapture(format!("Failed to get resized data: {e}"))
    })?;

    Ok(data.iter().map(|&pixel| pixel as f32 / 255.0).collect())
}

/// Reorders an interleaved HWC buffer into planar CHW
fn hwc_to_chw(hwc: &[f32], height: usize, width: usize, channels: usize) -> Vec<f32> {
    let mut chw = vec![0.0f32; channels * height * width];
    for h in 0..height {
        for w in 0..width {
            for c in 0..channels {
                let hwc_idx = (h * width + w) * channels + c;
                let chw_idx = c * (height * width) + h * width + w;
                chw[chw_idx] = hwc[hwc_idx];
            }
        }
    }
    chw
}

/// Converts logits to probabilities
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Maps a model output index to its emotion label.
/// HSEmotion classes: 0=Angry, 1=Disgust, 2=Fear, 3=Happy, 4=Sad,
/// 5=Surprise, 6=Neutral, 7=Contempt (folded into Disgusted)
fn emotion_for_index(index: usize) -> Emotion {
    match index {
        0 => Emotion::Angry,
        1 => Emotion::Disgusted,
        2 => Emotion::Scared,
        3 => Emotion::Happy,
        4 => Emotion::Sad,
        5 => Emotion::Surprised,
        6 => Emotion::Neutral,
        7 => Emotion::Disgusted,
        _ => {
            warn!("Unknown emotion index: {}, defaulting to Neutral", index);
            Emotion::Neutral
        }
    }
}

/// Emotion classifier using ONNX Runtime
pub struct EmotionClassifier {
    session: Session,
}

impl EmotionClassifier {
    /// Creates a new EmotionClassifier by loading the ONNX model
    pub fn new(model_path: &str) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| {
                EmotionMirrorError::ModelLoad(format!("Failed to create session builder: {e}"))
            })?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load ONNX model: {}", e);
                EmotionMirrorError::ModelLoad(format!("ONNX model load failed: {e}"))
            })?;

        Ok(Self { session })
    }

    /// Classifies a preprocessed face, returning the full label-to-score map
    pub fn classify(&mut self, preprocessed_face: &[f32]) -> Result<EmotionScores> {
        let side = MODEL_INPUT_SIZE as usize;
        let chw_data = hwc_to_chw(preprocessed_face, side, side, 3);

        let input_array = ndarray::Array4::from_shape_vec((1, 3, side, side), chw_data)
            .map_err(|e| {
                error!("Failed to create input array: {}", e);
                EmotionMirrorError::OnnxRuntime(format!("Failed to create input array: {e}"))
            })?;

        let input_tensor = Value::from_array(input_array).map_err(|e| {
            EmotionMirrorError::OnnxRuntime(format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![input_tensor];
        let outputs = self.session.run(inputs).map_err(|e| {
            error!("ONNX inference failed: {}", e);
            EmotionMirrorError::OnnxRuntime(format!("Inference failed: {e}"))
        })?;

        let (_, output_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| EmotionMirrorError::OnnxRuntime("No output from model".to_string()))?;

        let tensor = output_value.try_extract_tensor::<f32>().map_err(|e| {
            EmotionMirrorError::OnnxRuntime(format!("Failed to extract output tensor: {e}"))
        })?;

        let logits = tensor.1;
        if logits.is_empty() {
            return Err(EmotionMirrorError::OnnxRuntime(
                "Empty model output".to_string(),
            ));
        }

        let mut scores = EmotionScores::new();
        for (index, probability) in softmax(logits).into_iter().enumerate() {
            scores.add(emotion_for_index(index), probability);
        }

        Ok(scores)
    }
}

/// The full detection pipeline: face localization plus per-face classification
pub struct EmotionDetector {
    face_detector: FaceDetector,
    classifier: EmotionClassifier,
}

impl EmotionDetector {
    /// Creates a new EmotionDetector from the cascade and model files
    pub fn new(cascade_path: &str, model_path: &str) -> Result<Self> {
        let face_detector = FaceDetector::new(cascade_path)?;
        let classifier = EmotionClassifier::new(model_path)?;

        Ok(Self {
            face_detector,
            classifier,
        })
    }

    /// Detects faces in the frame and scores each for emotion.
    /// Zero faces is an empty vec, not an error; a face that fails
    /// classification is skipped.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceEmotions>> {
        let crops = self.face_detector.detect_faces(frame)?;

        let mut results = Vec::with_capacity(crops.len());
        for crop in crops {
            let preprocessed = match preprocess_face(&crop.gray, crop.height) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Face preprocessing failed: {}", e);
                    continue;
                }
            };

            match self.classifier.classify(&preprocessed) {
                Ok(scores) => results.push(FaceEmotions {
                    bounds: crop.bounds,
                    scores,
                }),
                Err(e) => {
                    warn!("Emotion classification failed: {}", e);
                    continue;
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_normalizes_and_orders() {
        let probabilities = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probabilities[2] > probabilities[1]);
        assert!(probabilities[1] > probabilities[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probabilities = softmax(&[1000.0, 1000.0]);
        assert!((probabilities[0] - 0.5).abs() < 1e-6);
        assert!((probabilities[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hwc_to_chw_reorders_planes() {
        // 2x2 image, 2 channels: [(a0,b0), (a1,b1), (a2,b2), (a3,b3)]
        let hwc = [0.0, 10.0, 1.0, 11.0, 2.0, 12.0, 3.0, 13.0];
        let chw = hwc_to_chw(&hwc, 2, 2, 2);
        assert_eq!(chw, vec![0.0, 1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn contempt_folds_into_disgusted() {
        assert_eq!(emotion_for_index(1), Emotion::Disgusted);
        assert_eq!(emotion_for_index(7), Emotion::Disgusted);
    }

    #[test]
    fn class_probabilities_accumulate_into_scores() {
        let mut scores = EmotionScores::new();
        let probabilities = [0.1, 0.05, 0.05, 0.4, 0.1, 0.1, 0.1, 0.1];
        for (index, &p) in probabilities.iter().enumerate() {
            scores.add(emotion_for_index(index), p);
        }

        let (emotion, confidence) = scores.dominant();
        assert_eq!(emotion, Emotion::Happy);
        assert!((confidence - 0.4).abs() < 1e-6);
        // Disgust and Contempt share a slot
        assert!((scores.get(Emotion::Disgusted) - 0.15).abs() < 1e-6);
    }
}
