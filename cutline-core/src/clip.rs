//! Clip data structures

use crate::effect::{Effect, EffectKind};
use crate::id::generate_id;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of content a clip (or the track holding it) carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Video,
    Audio,
    Image,
    Text,
}

impl ClipKind {
    pub const ALL: [ClipKind; 4] = [ClipKind::Video, ClipKind::Audio, ClipKind::Image, ClipKind::Text];

    pub fn as_str(self) -> &'static str {
        match self {
            ClipKind::Video => "video",
            ClipKind::Audio => "audio",
            ClipKind::Image => "image",
            ClipKind::Text => "text",
        }
    }

    /// Returns true for kinds backed by an external asset
    pub fn is_media(self) -> bool {
        !matches!(self, ClipKind::Text)
    }

    /// Returns true for foreground kinds where two clips on one track
    /// cannot be shown at the same time
    pub fn is_exclusive(self) -> bool {
        matches!(self, ClipKind::Video | ClipKind::Image)
    }
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionUnit {
    #[serde(rename = "px")]
    Px,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "vw")]
    Vw,
    #[serde(rename = "vh")]
    Vh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Placement of a clip inside the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<PositionUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTransform {
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

/// Font settings of a text clip. Every field is optional on the wire so that
/// incomplete styles can be reported rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_shadow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<TextTransform>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: Some("Arial, sans-serif".to_string()),
            font_size: Some(64.0),
            font_weight: Some("bold".to_string()),
            color: Some("#FFFFFF".to_string()),
            text_shadow: None,
            letter_spacing: None,
            text_transform: None,
        }
    }
}

impl TextStyle {
    /// Names of the required style fields that are absent or blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.font_family) {
            missing.push("fontFamily");
        }
        if self.font_size.is_none() {
            missing.push("fontSize");
        }
        if blank(&self.font_weight) {
            missing.push("fontWeight");
        }
        if blank(&self.color) {
            missing.push("color");
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordWrap {
    Normal,
    BreakWord,
    Nowrap,
}

/// Text layout box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width_unit: Option<PositionUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<WordWrap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
}

/// A single timed element on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ClipKind,
    /// Position on the timeline
    pub start_in_frames: i64,
    pub duration_in_frames: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    /// First source frame played
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_in: Option<i64>,
    /// Source frame the clip stops at (exclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_out: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

impl Clip {
    /// Creates a bare clip of `kind` with a freshly generated id
    pub fn new(kind: ClipKind, start_in_frames: i64, duration_in_frames: i64) -> Self {
        Self {
            id: generate_id(kind.as_str()),
            kind,
            start_in_frames,
            duration_in_frames,
            asset_id: None,
            asset_url: None,
            source_in: None,
            source_out: None,
            volume: None,
            muted: None,
            text: None,
            style: None,
            layout: None,
            scale: None,
            rotation: None,
            opacity: None,
            position: None,
            effects: Vec::new(),
        }
    }

    /// Creates a text clip using the default text style
    pub fn text(text: impl Into<String>, start_in_frames: i64, duration_in_frames: i64) -> Self {
        Self {
            text: Some(text.into()),
            style: Some(TextStyle::default()),
            ..Self::new(ClipKind::Text, start_in_frames, duration_in_frames)
        }
    }

    /// Creates a media clip of `kind` pointing at `asset_url`
    pub fn media(
        kind: ClipKind,
        asset_url: impl Into<String>,
        start_in_frames: i64,
        duration_in_frames: i64,
    ) -> Self {
        Self {
            asset_url: Some(asset_url.into()),
            ..Self::new(kind, start_in_frames, duration_in_frames)
        }
    }

    /// Creates a video clip pointing at `asset_url`
    pub fn video(asset_url: impl Into<String>, start_in_frames: i64, duration_in_frames: i64) -> Self {
        Self::media(ClipKind::Video, asset_url, start_in_frames, duration_in_frames)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_source(mut self, source_in: i64, source_out: i64) -> Self {
        self.source_in = Some(source_in);
        self.source_out = Some(source_out);
        self
    }

    /// First frame after the clip, saturating at the `i64` bounds
    pub fn end(&self) -> i64 {
        self.start_in_frames.saturating_add(self.duration_in_frames)
    }

    /// First frame after the clip, or `None` when it is not representable
    pub fn checked_end(&self) -> Option<i64> {
        self.start_in_frames.checked_add(self.duration_in_frames)
    }

    /// Checks if this clip covers the given global frame
    pub fn is_active_at(&self, frame: i64) -> bool {
        frame >= self.start_in_frames && frame < self.end()
    }

    /// Checks if the two clips share at least one frame
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.start_in_frames < other.end() && other.start_in_frames < self.end()
    }

    /// Frame relative to the clip start
    pub fn local_frame(&self, global_frame: i64) -> i64 {
        global_frame.saturating_sub(self.start_in_frames)
    }

    /// Returns the non-blank text content
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Returns the asset url, falling back to the asset id
    pub fn asset_ref(&self) -> Option<&str> {
        self.asset_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.asset_id.as_deref().filter(|id| !id.trim().is_empty()))
    }

    pub fn has_effect(&self, kind: &EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind.as_ref() == Some(kind))
    }

    /// Returns true when this clip's kind belongs on a track of `track_kind`:
    /// text on text tracks, media on media tracks
    pub fn fits_track(&self, track_kind: ClipKind) -> bool {
        self.kind.is_media() == track_kind.is_media()
    }

    /// Checks whether this clip may live on a track of `track_kind`:
    /// text tracks need text clips with content, every other track needs
    /// media clips with an asset reference.
    pub fn compatibility_with(&self, track_kind: ClipKind) -> Result<(), String> {
        if !self.fits_track(track_kind) {
            return Err(format!("{} clip on a {} track", self.kind, track_kind));
        }
        if track_kind == ClipKind::Text {
            if self.text_content().is_none() {
                return Err("text clip has no text".to_string());
            }
        } else {
            if self.asset_ref().is_none() {
                return Err("media clip has no asset reference".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_bounds() {
        let clip = Clip::video("a.mp4", 30, 60);
        assert_eq!(clip.end(), 90);
        assert!(!clip.is_active_at(29));
        assert!(clip.is_active_at(30));
        assert!(clip.is_active_at(89));
        assert!(!clip.is_active_at(90));
        assert_eq!(clip.local_frame(45), 15);
    }

    #[test]
    fn test_end_saturates_on_huge_frames() {
        let mut clip = Clip::video("a.mp4", i64::MAX, 10);
        assert_eq!(clip.end(), i64::MAX);
        assert_eq!(clip.checked_end(), None);
        assert!(!clip.is_active_at(0));
        assert_eq!(clip.local_frame(i64::MIN), i64::MIN);

        clip.start_in_frames = 5;
        assert_eq!(clip.checked_end(), Some(15));
    }

    #[test]
    fn test_overlap_is_exclusive_of_touching_edges() {
        let a = Clip::video("a.mp4", 0, 100);
        let b = Clip::video("b.mp4", 100, 50);
        let c = Clip::video("c.mp4", 99, 10);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_constructors_mint_kind_prefixed_ids() {
        let text = Clip::text("Hello", 0, 90);
        assert!(text.id.starts_with("text-"));
        assert_eq!(text.style, Some(TextStyle::default()));

        let video = Clip::video("a.mp4", 0, 300);
        assert!(video.id.starts_with("video-"));
        assert_ne!(text.id, video.id);
    }

    #[test]
    fn test_asset_ref_falls_back_to_asset_id() {
        let mut clip = Clip::new(ClipKind::Image, 0, 10);
        assert_eq!(clip.asset_ref(), None);
        clip.asset_id = Some("asset-1".into());
        assert_eq!(clip.asset_ref(), Some("asset-1"));
        clip.asset_url = Some("  ".into());
        assert_eq!(clip.asset_ref(), Some("asset-1"));
        clip.asset_url = Some("logo.png".into());
        assert_eq!(clip.asset_ref(), Some("logo.png"));
    }

    #[test]
    fn test_compatibility_with_track_kind() {
        assert!(Clip::text("Hi", 0, 10).compatibility_with(ClipKind::Text).is_ok());
        assert!(Clip::text(" ", 0, 10).compatibility_with(ClipKind::Text).is_err());
        assert!(Clip::text("Hi", 0, 10).compatibility_with(ClipKind::Video).is_err());
        assert!(Clip::video("a.mp4", 0, 10).compatibility_with(ClipKind::Video).is_ok());
        assert!(Clip::new(ClipKind::Video, 0, 10).compatibility_with(ClipKind::Video).is_err());
        assert!(Clip::video("a.mp4", 0, 10).fits_track(ClipKind::Audio));
        assert!(!Clip::text("Hi", 0, 10).fits_track(ClipKind::Image));
    }

    #[test]
    fn test_style_missing_fields() {
        assert!(TextStyle::default().missing_fields().is_empty());
        let partial = TextStyle {
            font_family: Some("Inter".into()),
            font_size: None,
            font_weight: Some("".into()),
            color: Some("#000".into()),
            text_shadow: None,
            letter_spacing: None,
            text_transform: None,
        };
        assert_eq!(partial.missing_fields(), vec!["fontSize", "fontWeight"]);
    }

    #[test]
    fn test_clip_json_uses_canonical_keys() {
        let clip = Clip::video("a.mp4", 0, 300).with_id("v1").with_source(10, 310);
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(json["id"], "v1");
        assert_eq!(json["type"], "video");
        assert_eq!(json["startInFrames"], 0);
        assert_eq!(json["durationInFrames"], 300);
        assert_eq!(json["assetUrl"], "a.mp4");
        assert_eq!(json["sourceIn"], 10);
        assert!(json.get("text").is_none());
        assert!(json.get("effects").is_none());
    }
}
