//! Time-bounded clip effects and their per-frame evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the fades appended by a crossfade merge
pub const MERGE_FADE_FRAMES: i64 = 15;

/// Default length of fades added through the editing helpers
pub const DEFAULT_FADE_FRAMES: i64 = 30;

/// Pixel distance a slide-in travels
pub const SLIDE_DISTANCE_PX: f64 = 100.0;

/// Effect kind as carried in the interchange format.
///
/// Unrecognised strings are kept verbatim so a round trip never loses them;
/// the validator reports them as warnings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectKind {
    FadeIn,
    FadeOut,
    SlideIn,
    Other(String),
}

impl EffectKind {
    pub fn as_str(&self) -> &str {
        match self {
            EffectKind::FadeIn => "fade-in",
            EffectKind::FadeOut => "fade-out",
            EffectKind::SlideIn => "slide-in",
            EffectKind::Other(name) => name,
        }
    }

    /// Returns true for the kinds this crate knows how to evaluate
    pub fn is_known(&self) -> bool {
        !matches!(self, EffectKind::Other(_))
    }

    /// Returns true when the kind string is empty
    pub fn is_blank(&self) -> bool {
        matches!(self, EffectKind::Other(name) if name.trim().is_empty())
    }
}

impl From<String> for EffectKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "fade-in" => EffectKind::FadeIn,
            "fade-out" => EffectKind::FadeOut,
            "slide-in" => EffectKind::SlideIn,
            _ => EffectKind::Other(value),
        }
    }
}

impl From<EffectKind> for String {
    fn from(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge a slide-in enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlideDirection {
    FromBottom,
    FromTop,
    FromLeft,
    FromRight,
}

impl SlideDirection {
    /// Offset `(dx, dy)` in pixels for a slide at `progress`
    pub fn offset(self, progress: f64, distance: f64) -> (f64, f64) {
        let remaining = (1.0 - progress) * distance;
        match self {
            SlideDirection::FromBottom => (0.0, remaining),
            SlideDirection::FromTop => (0.0, -remaining),
            SlideDirection::FromLeft => (-remaining, 0.0),
            SlideDirection::FromRight => (remaining, 0.0),
        }
    }
}

/// An animation modifier attached to a clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(rename = "type", default)]
    pub kind: Option<EffectKind>,
    #[serde(default)]
    pub duration_in_frames: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SlideDirection>,
}

/// Whether an effect applies at a frame, and how far along it is
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectState {
    pub active: bool,
    /// Always within `[0, 1]`
    pub progress: f64,
}

impl EffectState {
    const INACTIVE: EffectState = EffectState {
        active: false,
        progress: 1.0,
    };
}

impl Effect {
    pub fn new(kind: EffectKind, duration_in_frames: i64) -> Self {
        Self {
            kind: Some(kind),
            duration_in_frames,
            direction: None,
        }
    }

    pub fn fade_in(duration_in_frames: i64) -> Self {
        Self::new(EffectKind::FadeIn, duration_in_frames)
    }

    pub fn fade_out(duration_in_frames: i64) -> Self {
        Self::new(EffectKind::FadeOut, duration_in_frames)
    }

    pub fn slide_in(duration_in_frames: i64, direction: SlideDirection) -> Self {
        Self {
            direction: Some(direction),
            ..Self::new(EffectKind::SlideIn, duration_in_frames)
        }
    }

    /// Evaluates the effect at `local_frame` (frames since the clip started)
    /// for a clip lasting `clip_duration` frames.
    ///
    /// Unknown kinds, missing kinds and non-positive windows are never
    /// active and report full progress.
    pub fn evaluate(&self, local_frame: i64, clip_duration: i64) -> EffectState {
        let window = self.duration_in_frames;
        if window <= 0 {
            return EffectState::INACTIVE;
        }
        let window_f = window as f64;

        match &self.kind {
            Some(EffectKind::FadeIn) | Some(EffectKind::SlideIn) => {
                let progress = if local_frame >= window {
                    1.0
                } else {
                    local_frame as f64 / window_f
                };
                EffectState {
                    active: local_frame < window,
                    progress: progress.clamp(0.0, 1.0),
                }
            }
            Some(EffectKind::FadeOut) => {
                let fade_start = clip_duration.saturating_sub(window);
                let progress = if local_frame < fade_start {
                    0.0
                } else {
                    local_frame.saturating_sub(fade_start) as f64 / window_f
                };
                EffectState {
                    active: local_frame >= fade_start,
                    progress: progress.clamp(0.0, 1.0),
                }
            }
            Some(EffectKind::Other(_)) | None => EffectState::INACTIVE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_in_window() {
        let effect = Effect::fade_in(30);
        assert_eq!(effect.evaluate(0, 300), EffectState { active: true, progress: 0.0 });
        assert_eq!(effect.evaluate(15, 300), EffectState { active: true, progress: 0.5 });
        let last = effect.evaluate(29, 300);
        assert!(last.active);
        assert!(last.progress < 1.0 && last.progress > 0.95);
        assert_eq!(effect.evaluate(30, 300), EffectState { active: false, progress: 1.0 });
        assert_eq!(effect.evaluate(200, 300), EffectState { active: false, progress: 1.0 });
    }

    #[test]
    fn test_fade_out_window() {
        let effect = Effect::fade_out(30);
        assert_eq!(effect.evaluate(0, 300), EffectState { active: false, progress: 0.0 });
        assert_eq!(effect.evaluate(269, 300), EffectState { active: false, progress: 0.0 });
        assert_eq!(effect.evaluate(270, 300), EffectState { active: true, progress: 0.0 });
        assert_eq!(effect.evaluate(285, 300), EffectState { active: true, progress: 0.5 });
        assert!(effect.evaluate(299, 300).progress < 1.0);
    }

    #[test]
    fn test_fade_out_with_extreme_frames() {
        let effect = Effect::fade_out(i64::MAX);
        let state = effect.evaluate(i64::MAX, i64::MIN);
        assert!(state.active);
        assert!((0.0..=1.0).contains(&state.progress));
        assert!(!Effect::fade_out(10).evaluate(i64::MIN, i64::MAX).active);
    }

    #[test]
    fn test_slide_in_matches_fade_in() {
        let slide = Effect::slide_in(20, SlideDirection::FromLeft);
        let fade = Effect::fade_in(20);
        for frame in 0..40 {
            assert_eq!(slide.evaluate(frame, 100), fade.evaluate(frame, 100));
        }
    }

    #[test]
    fn test_unknown_and_degenerate_effects_are_inactive() {
        let unknown = Effect::new(EffectKind::from("zoom-in".to_string()), 10);
        assert!(!unknown.evaluate(0, 100).active);

        let missing = Effect {
            kind: None,
            duration_in_frames: 10,
            direction: None,
        };
        assert!(!missing.evaluate(0, 100).active);

        let empty = Effect::fade_in(0);
        assert_eq!(empty.evaluate(0, 100), EffectState { active: false, progress: 1.0 });
    }

    #[test]
    fn test_slide_offsets() {
        assert_eq!(SlideDirection::FromBottom.offset(0.0, 100.0), (0.0, 100.0));
        assert_eq!(SlideDirection::FromTop.offset(0.5, 100.0), (0.0, -50.0));
        assert_eq!(SlideDirection::FromLeft.offset(0.0, 100.0), (-100.0, 0.0));
        assert_eq!(SlideDirection::FromRight.offset(1.0, 100.0), (0.0, 0.0));
    }

    #[test]
    fn test_kind_round_trips_unknown_names() {
        let effect: Effect =
            serde_json::from_str(r#"{"type":"spin","durationInFrames":12}"#).unwrap();
        assert_eq!(effect.kind, Some(EffectKind::Other("spin".into())));
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["type"], "spin");

        let slide: Effect = serde_json::from_str(
            r#"{"type":"slide-in","durationInFrames":12,"direction":"from-right"}"#,
        )
        .unwrap();
        assert_eq!(slide.kind, Some(EffectKind::SlideIn));
        assert_eq!(slide.direction, Some(SlideDirection::FromRight));
    }
}
