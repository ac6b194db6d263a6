//! Conversions between wall-clock seconds and timeline frames
//!
//! Both helpers are total; an fps of zero is the caller's problem.

/// Converts seconds to the nearest whole frame at `fps`
pub fn seconds_to_frames(seconds: f64, fps: u32) -> i64 {
    (seconds * fps as f64).round() as i64
}

/// Converts a frame count to seconds at `fps`
pub fn frames_to_seconds(frames: i64, fps: u32) -> f64 {
    frames as f64 / fps as f64
}
