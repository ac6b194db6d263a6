//! Media asset references
//!
//! Assets are owned by an external catalog. Clips only carry an asset id or
//! url; nothing in this crate opens or probes the media itself.

use crate::clip::{Clip, ClipKind};
use crate::time::seconds_to_frames;
use serde::{Deserialize, Serialize};

/// Represents a media file known to the asset catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Unique identifier for this asset
    pub id: String,
    /// Location of the media
    pub url: String,
    /// Kind of media (never `Text`)
    #[serde(rename = "type")]
    pub kind: ClipKind,
    /// Intrinsic duration in seconds
    pub duration: f64,
    /// Width of the media in pixels, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height of the media in pixels, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl MediaAsset {
    /// Creates a new asset
    pub fn new(id: impl Into<String>, url: impl Into<String>, kind: ClipKind, duration: f64) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            kind,
            duration,
            width: None,
            height: None,
        }
    }

    /// Sets the intrinsic dimensions
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Returns the intrinsic duration in frames at `fps`
    pub fn duration_in_frames(&self, fps: u32) -> i64 {
        seconds_to_frames(self.duration, fps)
    }

    /// Creates a clip playing the whole asset from `start_in_frames`
    pub fn to_clip(&self, start_in_frames: i64, fps: u32) -> Clip {
        let duration = self.duration_in_frames(fps);
        Clip {
            asset_id: Some(self.id.clone()),
            source_in: Some(0),
            source_out: Some(duration),
            ..Clip::media(self.kind, self.url.clone(), start_in_frames, duration)
        }
    }
}
