//! Track data structures

use crate::clip::{Clip, ClipKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An ordered lane of clips.
///
/// Clips are stored behind `Arc` so timeline snapshots can share the clips
/// an edit did not touch. Clip order is insertion order, not time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::document::TrackRepr")]
pub struct Track {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ClipKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub muted: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
    #[serde(default)]
    pub clips: Vec<Arc<Clip>>,
}

impl Track {
    /// Creates an empty track
    pub fn new(id: impl Into<String>, kind: ClipKind) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind,
            muted: false,
            locked: false,
            clips: Vec::new(),
        }
    }

    /// Sets the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a clip at the end of the track
    pub fn push_clip(&mut self, clip: Clip) {
        self.clips.push(Arc::new(clip));
    }

    /// Builder form of [`Track::push_clip`]
    pub fn with_clip(mut self, clip: Clip) -> Self {
        self.push_clip(clip);
        self
    }

    /// Index of the clip with `clip_id`
    pub fn position_of(&self, clip_id: &str) -> Option<usize> {
        self.clips.iter().position(|c| c.id == clip_id)
    }

    /// Finds a clip on this track by id
    pub fn get_clip(&self, clip_id: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id).map(|c| c.as_ref())
    }

    /// Clips sorted by start frame; ties keep insertion order
    pub fn clips_by_start(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.iter().map(|c| c.as_ref()).collect();
        clips.sort_by_key(|c| c.start_in_frames);
        clips
    }

    /// First frame after the last clip on this track
    pub fn end(&self) -> i64 {
        self.clips.iter().map(|c| c.end()).max().unwrap_or(0)
    }
}
