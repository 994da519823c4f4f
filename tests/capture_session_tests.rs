// Capture session behavior driven through the public API with a scripted
// frame source standing in for the webcam

use emotion_mirror::camera::FrameSource;
use emotion_mirror::capture::{CaptureLoop, TICK_INTERVAL};
use emotion_mirror::error::{EmotionMirrorError, Result};
use emotion_mirror::models::{Emotion, EmotionReading, EmotionScores, FaceBox, FaceEmotions, Frame};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Yields a fixed script of reads: Some(frame) succeeds, None fails.
/// Counts releases through Drop.
struct ScriptedSource {
    script: Vec<Option<Frame>>,
    cursor: usize,
    releases: Rc<Cell<u32>>,
}

impl ScriptedSource {
    fn new(script: Vec<Option<Frame>>) -> (Self, Rc<Cell<u32>>) {
        let releases = Rc::new(Cell::new(0));
        (
            Self {
                script,
                cursor: 0,
                releases: releases.clone(),
            },
            releases,
        )
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<Frame> {
        let slot = self.script.get(self.cursor).cloned().flatten();
        self.cursor += 1;
        slot.ok_or_else(|| EmotionMirrorError::FrameCapture("end of stream".to_string()))
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

fn frame(tag: u8) -> Frame {
    Frame::new(vec![tag, tag, tag, tag + 1, tag + 1, tag + 1], 2, 1)
}

fn face_with(emotion: Emotion, score: f32) -> FaceEmotions {
    let mut scores = EmotionScores::new();
    scores.add(emotion, score);
    FaceEmotions {
        bounds: FaceBox {
            x: 5,
            y: 5,
            width: 40,
            height: 40,
        },
        scores,
    }
}

#[test]
fn session_streams_skips_failures_and_releases_once() {
    let (source, releases) = ScriptedSource::new(vec![
        Some(frame(10)),
        None, // device hiccup, tick skipped
        Some(frame(20)),
    ]);
    let mut capture = CaptureLoop::new(TICK_INTERVAL);
    let start = Instant::now();

    capture.start(source, start);
    assert!(capture.is_running());

    let first = capture.poll(start).expect("first tick delivers a frame");
    assert_eq!(first, frame(10).mirrored());

    // The failed read skips a tick without stopping the session
    assert!(capture.poll(start + TICK_INTERVAL).is_none());
    assert!(capture.is_running());

    let third = capture.poll(start + 2 * TICK_INTERVAL).expect("stream resumes");
    assert_eq!(third, frame(20).mirrored());

    drop(capture.stop());
    assert!(!capture.is_running());
    assert_eq!(releases.get(), 1);

    // A second stop touches nothing
    assert!(capture.stop().is_none());
    assert_eq!(releases.get(), 1);
}

#[test]
fn teardown_while_running_releases_exactly_once() {
    let (source, releases) = ScriptedSource::new(vec![Some(frame(1))]);
    let mut capture = CaptureLoop::new(TICK_INTERVAL);
    capture.start(source, Instant::now());

    // Window close path: explicit release, then the loop itself is dropped
    drop(capture.stop());
    drop(capture);
    assert_eq!(releases.get(), 1);
}

#[test]
fn label_follows_faces_and_survives_empty_frames() {
    let mut reading: Option<EmotionReading> = None;

    reading = EmotionReading::updated(reading, &[face_with(Emotion::Happy, 0.8)]);
    assert_eq!(reading.unwrap().emotion, Emotion::Happy);

    // Face leaves the frame: the label holds
    reading = EmotionReading::updated(reading, &[]);
    assert_eq!(reading.unwrap().emotion, Emotion::Happy);

    reading = EmotionReading::updated(reading, &[face_with(Emotion::Surprised, 0.6)]);
    assert_eq!(reading.unwrap().emotion, Emotion::Surprised);
}
