// Core data types for the emotion mirror application

/// A single video frame: RGB pixel data in row-major HWC layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Raw RGB pixel data (width * height * 3 bytes)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Frame {
    /// Creates a new Frame with the given parameters
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns this frame reflected about its vertical axis (mirror view).
    /// Applied to every captured frame before detection and display.
    pub fn mirrored(&self) -> Frame {
        let row_bytes = self.width as usize * 3;
        let mut data = Vec::with_capacity(self.data.len());

        for row in self.data.chunks_exact(row_bytes) {
            for pixel in row.chunks_exact(3).rev() {
                data.extend_from_slice(pixel);
            }
        }

        Frame {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

/// The closed set of emotion labels the classifier can produce
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Scared,
    Disgusted,
    Neutral,
}

impl Emotion {
    /// All labels, in the iteration order used for score lookups
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Scared,
        Emotion::Disgusted,
        Emotion::Neutral,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|e| *e == self).unwrap_or(0)
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Emotion::Happy => write!(f, "Happy"),
            Emotion::Sad => write!(f, "Sad"),
            Emotion::Angry => write!(f, "Angry"),
            Emotion::Surprised => write!(f, "Surprised"),
            Emotion::Scared => write!(f, "Scared"),
            Emotion::Disgusted => write!(f, "Disgusted"),
            Emotion::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Per-face mapping from emotion label to confidence score in [0, 1]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmotionScores {
    scores: [f32; Emotion::ALL.len()],
}

impl EmotionScores {
    /// Creates an empty score map (all labels at 0.0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to the score of a label. Model classes that fold into the same
    /// label accumulate here.
    pub fn add(&mut self, emotion: Emotion, score: f32) {
        self.scores[emotion.index()] += score;
    }

    /// Returns the score of a label
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.scores[emotion.index()]
    }

    /// Returns the label with the maximum score and that score.
    /// Equal maxima resolve by iteration order; callers must not rely on
    /// which of the tied labels wins.
    pub fn dominant(&self) -> (Emotion, f32) {
        Emotion::ALL
            .iter()
            .map(|&emotion| (emotion, self.get(emotion)))
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((Emotion::Neutral, 0.0))
    }
}

/// Pixel bounding box of a detected face within a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One detected face: where it is and how it scored per label
#[derive(Clone, Debug)]
pub struct FaceEmotions {
    pub bounds: FaceBox,
    pub scores: EmotionScores,
}

/// The reading shown on the emotion label surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmotionReading {
    /// The dominant emotion label
    pub emotion: Emotion,
    /// Confidence level (0.0 to 1.0)
    pub confidence: f32,
}

impl EmotionReading {
    /// Creates a new EmotionReading
    pub fn new(emotion: Emotion, confidence: f32) -> Self {
        Self {
            emotion,
            confidence,
        }
    }

    /// Returns the confidence as a percentage (0-100)
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence * 100.0).round() as u8
    }

    /// The reading to display after a detector pass: the first face's
    /// dominant label when one is present, otherwise the previous reading
    pub fn updated(previous: Option<Self>, faces: &[FaceEmotions]) -> Option<Self> {
        match faces.first() {
            Some(face) => {
                let (emotion, confidence) = face.scores.dominant();
                Some(Self::new(emotion, confidence))
            }
            None => previous,
        }
    }
}

impl std::fmt::Display for EmotionReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}%)", self.emotion, self.confidence_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_reflects_about_vertical_axis() {
        // 3x2 frame, pixels labelled by their first channel
        #[rustfmt::skip]
        let frame = Frame::new(
            vec![
                1, 1, 1,  2, 2, 2,  3, 3, 3,
                4, 4, 4,  5, 5, 5,  6, 6, 6,
            ],
            3,
            2,
        );

        #[rustfmt::skip]
        let expected = Frame::new(
            vec![
                3, 3, 3,  2, 2, 2,  1, 1, 1,
                6, 6, 6,  5, 5, 5,  4, 4, 4,
            ],
            3,
            2,
        );

        assert_eq!(frame.mirrored(), expected);
    }

    #[test]
    fn mirroring_twice_restores_the_frame() {
        let frame = Frame::new((0..24).collect(), 4, 2);
        assert_eq!(frame.mirrored().mirrored(), frame);
    }

    #[test]
    fn dominant_picks_highest_score() {
        let mut scores = EmotionScores::new();
        scores.add(Emotion::Happy, 0.8);
        scores.add(Emotion::Sad, 0.1);
        scores.add(Emotion::Neutral, 0.1);

        let (emotion, confidence) = scores.dominant();
        assert_eq!(emotion, Emotion::Happy);
        assert!((confidence - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn scores_accumulate_per_label() {
        let mut scores = EmotionScores::new();
        scores.add(Emotion::Disgusted, 0.3);
        scores.add(Emotion::Disgusted, 0.2);
        assert!((scores.get(Emotion::Disgusted) - 0.5).abs() < f32::EPSILON);
    }

    fn face(scores: EmotionScores) -> FaceEmotions {
        FaceEmotions {
            bounds: FaceBox {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            },
            scores,
        }
    }

    #[test]
    fn updated_reading_uses_the_first_face() {
        let mut first = EmotionScores::new();
        first.add(Emotion::Angry, 0.9);
        let mut second = EmotionScores::new();
        second.add(Emotion::Happy, 0.9);

        let reading = EmotionReading::updated(None, &[face(first), face(second)]).unwrap();
        assert_eq!(reading.emotion, Emotion::Angry);
    }

    #[test]
    fn no_faces_keeps_the_previous_reading() {
        let previous = Some(EmotionReading::new(Emotion::Sad, 0.7));
        assert_eq!(EmotionReading::updated(previous, &[]), previous);
    }

    #[test]
    fn no_faces_and_no_previous_reading_stays_empty() {
        assert_eq!(EmotionReading::updated(None, &[]), None);
    }

    #[test]
    fn reading_formats_label_and_percentage() {
        let reading = EmotionReading::new(Emotion::Surprised, 0.824);
        assert_eq!(reading.confidence_percent(), 82);
        assert_eq!(reading.to_string(), "Surprised (82%)");
    }
}
