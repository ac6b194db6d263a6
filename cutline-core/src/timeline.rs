//! Timeline snapshots and read-only queries

use crate::clip::Clip;
use crate::id::generate_unique_id;
use crate::project::ProjectSettings;
use crate::time::frames_to_seconds;
use crate::track::Track;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A project's settings plus its tracks.
///
/// Tracks are shared between snapshots; editing operations clone only the
/// track they change. Track order is compositing order: later tracks are
/// drawn above earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// `None` only for timelines read from untrusted input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSettings>,
    #[serde(rename = "timeline", default)]
    pub tracks: Vec<Arc<Track>>,
}

/// A clip found in a timeline, together with its owning track
#[derive(Debug, Clone, Copy)]
pub struct ClipRef<'a> {
    pub track_index: usize,
    pub clip_index: usize,
    pub track: &'a Track,
    pub clip: &'a Clip,
}

impl Timeline {
    /// Creates an empty timeline
    pub fn new(project: ProjectSettings) -> Self {
        Self {
            project: Some(project),
            tracks: Vec::new(),
        }
    }

    /// Appends a track above the existing ones
    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(Arc::new(track));
        self
    }

    /// Project settings, falling back to the defaults when absent
    pub fn settings(&self) -> ProjectSettings {
        self.project.unwrap_or_default()
    }

    /// Frame rate of the project
    pub fn fps(&self) -> u32 {
        self.settings().fps
    }

    /// Number of clips over all tracks
    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// Iterates over every clip with its owning track, in track order
    pub fn clips(&self) -> impl Iterator<Item = ClipRef<'_>> {
        self.tracks.iter().enumerate().flat_map(|(track_index, track)| {
            track
                .clips
                .iter()
                .enumerate()
                .map(move |(clip_index, clip)| ClipRef {
                    track_index,
                    clip_index,
                    track: track.as_ref(),
                    clip: clip.as_ref(),
                })
        })
    }

    /// Finds a clip by id, scanning every track
    pub fn find_clip(&self, clip_id: &str) -> Option<ClipRef<'_>> {
        self.clips().find(|r| r.clip.id == clip_id)
    }

    /// Same as [`Timeline::find_clip`] but fails with `ClipNotFound`
    pub fn require_clip(&self, clip_id: &str) -> Result<ClipRef<'_>> {
        self.find_clip(clip_id)
            .ok_or_else(|| Error::ClipNotFound(clip_id.to_string()))
    }

    /// Finds a track by id
    pub fn find_track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id).map(|t| t.as_ref())
    }

    /// Position of a track, failing with `TrackNotFound`
    pub fn track_index(&self, track_id: &str) -> Result<usize> {
        self.tracks
            .iter()
            .position(|t| t.id == track_id)
            .ok_or_else(|| Error::TrackNotFound(track_id.to_string()))
    }

    /// Total extent: the end frame of the last clip, or 0 when empty
    pub fn total_duration_frames(&self) -> i64 {
        self.tracks.iter().map(|t| t.end()).max().unwrap_or(0)
    }

    /// Total extent in seconds at the project frame rate
    pub fn total_duration_seconds(&self) -> f64 {
        frames_to_seconds(self.total_duration_frames(), self.fps())
    }

    /// All clips covering `frame`, in compositing order
    pub fn active_clips_at(&self, frame: i64) -> Vec<ClipRef<'_>> {
        self.clips().filter(|r| r.clip.is_active_at(frame)).collect()
    }

    /// All clips sharing at least one frame with `[start, end)`
    pub fn clips_in_range(&self, start: i64, end: i64) -> Vec<ClipRef<'_>> {
        self.clips()
            .filter(|r| r.clip.end() > start && r.clip.start_in_frames < end)
            .collect()
    }

    /// Generates a clip id that no clip in this timeline uses
    pub fn fresh_clip_id(&self, prefix: &str) -> String {
        generate_unique_id(prefix, |candidate| self.find_clip(candidate).is_some())
    }

    /// Next `track-N` id, one above the highest numbered track
    pub fn next_track_id(&self) -> String {
        let highest = self
            .tracks
            .iter()
            .filter_map(|t| t.id.strip_prefix("track-"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("track-{}", highest.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipKind;

    fn sample() -> Timeline {
        Timeline::new(ProjectSettings::default())
            .with_track(
                Track::new("track-1", ClipKind::Video)
                    .with_clip(Clip::video("a.mp4", 0, 300).with_id("v1"))
                    .with_clip(Clip::video("b.mp4", 300, 150).with_id("v2")),
            )
            .with_track(
                Track::new("track-3", ClipKind::Text).with_clip(Clip::text("Hello", 60, 90).with_id("t1")),
            )
    }

    #[test]
    fn test_total_duration() {
        let timeline = sample();
        assert_eq!(timeline.total_duration_frames(), 450);
        assert_eq!(timeline.total_duration_seconds(), 15.0);
        assert_eq!(Timeline::default().total_duration_frames(), 0);
    }

    #[test]
    fn test_find_clip_reports_owner() {
        let timeline = sample();
        let found = timeline.find_clip("t1").unwrap();
        assert_eq!(found.track.id, "track-3");
        assert_eq!(found.track_index, 1);
        assert_eq!(found.clip_index, 0);
        assert!(matches!(timeline.require_clip("nope"), Err(Error::ClipNotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_active_clips_at() {
        let timeline = sample();
        let ids = |frame| -> Vec<String> {
            timeline
                .active_clips_at(frame)
                .iter()
                .map(|r| r.clip.id.clone())
                .collect()
        };
        assert_eq!(ids(0), vec!["v1"]);
        assert_eq!(ids(100), vec!["v1", "t1"]);
        assert_eq!(ids(300), vec!["v2"]);
        assert!(ids(450).is_empty());
    }

    #[test]
    fn test_clips_in_range() {
        let timeline = sample();
        assert_eq!(timeline.clips_in_range(250, 320).len(), 2);
        assert_eq!(timeline.clips_in_range(450, 500).len(), 0);
    }

    #[test]
    fn test_next_track_id() {
        assert_eq!(sample().next_track_id(), "track-4");
        assert_eq!(Timeline::default().next_track_id(), "track-1");
    }
}
