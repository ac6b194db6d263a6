//! Clip editing algebra
//!
//! Every operation borrows the current snapshot and returns a new one; the
//! input is never modified. Only the tracks an operation touches are cloned,
//! everything else is shared with the previous snapshot.
//!
//! Clip ids are looked up across all tracks. Whenever several clips have to
//! be ordered they are sorted by start frame, keeping discovery order for
//! ties. Operations that produce new clips (split, remove-segment, join,
//! merge, concatenate, duplicate) always mint fresh ids.

use crate::clip::{Clip, ClipKind};
use crate::effect::{Effect, MERGE_FADE_FRAMES};
use crate::id::generate_unique_id;
use crate::timeline::{ClipRef, Timeline};
use crate::track::Track;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Smallest number of clips join, merge and concatenate accept
const MIN_GROUP_SIZE: usize = 2;

/// Length of a text overlay added by [`Timeline::add_text_overlay`]
pub const OVERLAY_DURATION_FRAMES: i64 = 90;

/// Fade-in applied to new text overlays
pub const OVERLAY_FADE_FRAMES: i64 = 15;

/// Where [`Timeline::add_text_overlay`] places a new overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPlacement {
    Beginning,
    Middle,
    End,
}

impl OverlayPlacement {
    /// Timeline frame the overlay starts at
    pub fn start_frame(self) -> i64 {
        match self {
            OverlayPlacement::Beginning => 0,
            OverlayPlacement::Middle => 150,
            OverlayPlacement::End => 300,
        }
    }
}

fn incompatible(clip: &Clip, reason: impl Into<String>) -> Error {
    Error::IncompatibleClip {
        clip_id: clip.id.clone(),
        reason: reason.into(),
    }
}

/// Copy of `clip` starting at `new_start`, keeping its end
fn trimmed_start(clip: &Clip, new_start: i64) -> Result<Clip> {
    if new_start < 0 {
        return Err(Error::NegativeStart(new_start));
    }
    if new_start >= clip.end() {
        return Err(Error::WouldEliminateClip {
            clip_id: clip.id.clone(),
            frame: new_start,
        });
    }
    let delta = new_start.saturating_sub(clip.start_in_frames);
    let mut trimmed = clip.clone();
    trimmed.start_in_frames = new_start;
    trimmed.duration_in_frames = clip.end().saturating_sub(new_start);
    trimmed.source_in = clip.source_in.map(|source_in| source_in.saturating_add(delta));
    Ok(trimmed)
}

/// Copy of `clip` ending at `new_end`, keeping its start
fn trimmed_end(clip: &Clip, new_end: i64) -> Result<Clip> {
    if new_end <= clip.start_in_frames {
        return Err(Error::WouldEliminateClip {
            clip_id: clip.id.clone(),
            frame: new_end,
        });
    }
    let delta = new_end.saturating_sub(clip.end());
    let mut trimmed = clip.clone();
    trimmed.duration_in_frames = new_end.saturating_sub(clip.start_in_frames);
    trimmed.source_out = clip.source_out.map(|source_out| source_out.saturating_add(delta));
    Ok(trimmed)
}

/// Non-blank texts of `refs`, joined by a single space
fn joined_text(refs: &[ClipRef<'_>]) -> String {
    refs.iter()
        .filter_map(|r| r.clip.text_content())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Index of the one track every clip in `refs` sits on
fn single_track(refs: &[ClipRef<'_>]) -> Result<usize> {
    let track_index = refs[0].track_index;
    if refs.iter().all(|r| r.track_index == track_index) {
        Ok(track_index)
    } else {
        Err(Error::ClipsOnDifferentTracks(
            refs.iter().map(|r| r.clip.id.clone()).collect(),
        ))
    }
}

impl Timeline {
    /// New snapshot with `update` applied to one track
    fn update_track(&self, track_index: usize, update: impl FnOnce(&mut Track)) -> Timeline {
        let mut next = self.clone();
        update(Arc::make_mut(&mut next.tracks[track_index]));
        next
    }

    /// New snapshot with one clip swapped out
    fn replace_clip(&self, track_index: usize, clip_index: usize, clip: Clip) -> Timeline {
        self.update_track(track_index, |track| track.clips[clip_index] = Arc::new(clip))
    }

    /// Removes the clips at `removed` from one track and inserts
    /// `replacement` where the first of them was
    fn replace_clips(&self, track_index: usize, removed: &BTreeSet<usize>, replacement: Vec<Clip>) -> Timeline {
        let insert_at = removed.first().copied();
        self.update_track(track_index, |track| {
            let mut replacement = Some(replacement);
            for (index, clip) in std::mem::take(&mut track.clips).into_iter().enumerate() {
                if Some(index) == insert_at {
                    if let Some(new_clips) = replacement.take() {
                        track.clips.extend(new_clips.into_iter().map(Arc::new));
                    }
                }
                if !removed.contains(&index) {
                    track.clips.push(clip);
                }
            }
        })
    }

    /// `count` distinct ids unused in this timeline
    fn mint_clip_ids(&self, prefix: &str, count: usize) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(count);
        for _ in 0..count {
            let id = generate_unique_id(prefix, |candidate| {
                self.find_clip(candidate).is_some() || ids.iter().any(|id| id == candidate)
            });
            ids.push(id);
        }
        ids
    }

    /// Looks up a group of at least two distinct clips, sorted by start
    fn resolve_group<S: AsRef<str>>(&self, clip_ids: &[S]) -> Result<Vec<ClipRef<'_>>> {
        if clip_ids.len() < MIN_GROUP_SIZE {
            return Err(Error::NotEnoughClips {
                required: MIN_GROUP_SIZE,
                found: clip_ids.len(),
            });
        }

        let mut refs: Vec<ClipRef<'_>> = Vec::with_capacity(clip_ids.len());
        for clip_id in clip_ids {
            let found = self.require_clip(clip_id.as_ref())?;
            let seen = refs
                .iter()
                .any(|r| r.track_index == found.track_index && r.clip_index == found.clip_index);
            if !seen {
                refs.push(found);
            }
        }
        if refs.len() < MIN_GROUP_SIZE {
            return Err(Error::NotEnoughClips {
                required: MIN_GROUP_SIZE,
                found: refs.len(),
            });
        }

        refs.sort_by_key(|r| r.clip.start_in_frames);
        Ok(refs)
    }

    /// Cuts a clip in two at `at_frame`.
    ///
    /// Requires `start < at_frame < end`. The halves cover `[start, at)` and
    /// `[at, end)`, get fresh ids and take the original's place on its track.
    pub fn split_at(&self, clip_id: &str, at_frame: i64) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        let clip = found.clip;
        if at_frame <= clip.start_in_frames || at_frame >= clip.end() {
            return Err(Error::CutOutsideClip {
                clip_id: clip_id.to_string(),
                frame: at_frame,
                start: clip.start_in_frames,
                end: clip.end(),
            });
        }

        let mut ids = self.mint_clip_ids(clip.kind.as_str(), 2).into_iter();
        let mut left = trimmed_end(clip, at_frame)?;
        let mut right = trimmed_start(clip, at_frame)?;
        left.id = ids.next().unwrap_or_default();
        right.id = ids.next().unwrap_or_default();

        log::debug!("split {} at frame {} into {} and {}", clip_id, at_frame, left.id, right.id);
        Ok(self.replace_clips(found.track_index, &BTreeSet::from([found.clip_index]), vec![left, right]))
    }

    /// Moves a clip's start to `new_start`, keeping its end
    pub fn trim_start(&self, clip_id: &str, new_start: i64) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        let trimmed = trimmed_start(found.clip, new_start)?;
        log::debug!("trim start of {} to frame {}", clip_id, new_start);
        Ok(self.replace_clip(found.track_index, found.clip_index, trimmed))
    }

    /// Moves a clip's end to `new_end`, keeping its start
    pub fn trim_end(&self, clip_id: &str, new_end: i64) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        let trimmed = trimmed_end(found.clip, new_end)?;
        log::debug!("trim end of {} to frame {}", clip_id, new_end);
        Ok(self.replace_clip(found.track_index, found.clip_index, trimmed))
    }

    /// Keeps only `[range_start, range_end)` of a clip
    pub fn extract_range(&self, clip_id: &str, range_start: i64, range_end: i64) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        let clip = found.clip;
        if range_start < clip.start_in_frames || range_end > clip.end() || range_start >= range_end {
            return Err(Error::InvalidRange {
                clip_id: clip_id.to_string(),
                start: range_start,
                end: range_end,
            });
        }

        let extracted = trimmed_end(&trimmed_start(clip, range_start)?, range_end)?;
        log::debug!("extract {}..{} from {}", range_start, range_end, clip_id);
        Ok(self.replace_clip(found.track_index, found.clip_index, extracted))
    }

    /// Cuts `[remove_start, remove_end)` out of a clip.
    ///
    /// A segment touching the clip start is a start trim, one touching the
    /// end is an end trim; anything else leaves two fresh clips around the
    /// hole.
    pub fn remove_segment(&self, clip_id: &str, remove_start: i64, remove_end: i64) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        let clip = found.clip;
        if remove_start < clip.start_in_frames || remove_end > clip.end() || remove_start >= remove_end {
            return Err(Error::InvalidRange {
                clip_id: clip_id.to_string(),
                start: remove_start,
                end: remove_end,
            });
        }

        if remove_start == clip.start_in_frames {
            return self.trim_start(clip_id, remove_end);
        }
        if remove_end == clip.end() {
            return self.trim_end(clip_id, remove_start);
        }

        let mut ids = self.mint_clip_ids(clip.kind.as_str(), 2).into_iter();
        let mut before = trimmed_end(clip, remove_start)?;
        let mut after = trimmed_start(clip, remove_end)?;
        before.id = ids.next().unwrap_or_default();
        after.id = ids.next().unwrap_or_default();

        log::debug!("remove {}..{} from {}", remove_start, remove_end, clip_id);
        Ok(self.replace_clips(found.track_index, &BTreeSet::from([found.clip_index]), vec![before, after]))
    }

    /// Joins clips on one track into a single clip.
    ///
    /// The result spans from the earliest start to the latest end; gaps
    /// between the inputs become part of the joined clip. Text clips have
    /// their texts joined with a space. All other attributes come from the
    /// earliest clip.
    pub fn join<S: AsRef<str>>(&self, clip_ids: &[S]) -> Result<Timeline> {
        let refs = self.resolve_group(clip_ids)?;
        let track_index = single_track(&refs)?;
        let track_kind = refs[0].track.kind;
        for r in &refs {
            r.clip
                .compatibility_with(track_kind)
                .map_err(|reason| incompatible(r.clip, reason))?;
        }

        let first = refs[0].clip;
        let end = refs.iter().map(|r| r.clip.end()).max().unwrap_or_else(|| first.end());
        let mut joined = first.clone();
        joined.id = self.fresh_clip_id(first.kind.as_str());
        joined.duration_in_frames = end.saturating_sub(first.start_in_frames);
        if track_kind == ClipKind::Text {
            joined.text = Some(joined_text(&refs));
        }

        log::debug!("join {} clips into {}", refs.len(), joined.id);
        let removed: BTreeSet<usize> = refs.iter().map(|r| r.clip_index).collect();
        Ok(self.replace_clips(track_index, &removed, vec![joined]))
    }

    /// Merges media clips from video tracks into one clip with a fade at
    /// each end.
    ///
    /// The merged duration is `(latest end - earliest start) - (n - 1) *
    /// crossfade_frames`. The subtraction assumes each neighbouring pair
    /// overlaps by the crossfade; actual positions are not checked.
    pub fn merge_with_crossfade<S: AsRef<str>>(&self, clip_ids: &[S], crossfade_frames: i64) -> Result<Timeline> {
        if crossfade_frames < 0 {
            return Err(Error::InvalidCrossfade(crossfade_frames));
        }
        let refs = self.resolve_group(clip_ids)?;
        for r in &refs {
            if r.track.kind != ClipKind::Video {
                return Err(incompatible(
                    r.clip,
                    format!("track {} is a {} track, merge needs video", r.track.id, r.track.kind),
                ));
            }
            r.clip
                .compatibility_with(r.track.kind)
                .map_err(|reason| incompatible(r.clip, reason))?;
        }

        let first = refs[0];
        let earliest = first.clip.start_in_frames;
        let latest_end = refs.iter().map(|r| r.clip.end()).max().unwrap_or(earliest);
        let overlap = i64::try_from(refs.len() - 1)
            .ok()
            .and_then(|pairs| pairs.checked_mul(crossfade_frames))
            .ok_or(Error::InvalidCrossfade(crossfade_frames))?;
        let duration = match latest_end.checked_sub(earliest).and_then(|span| span.checked_sub(overlap)) {
            Some(duration) if duration > 0 => duration,
            _ => {
                return Err(Error::InvalidRange {
                    clip_id: first.clip.id.clone(),
                    start: earliest,
                    end: latest_end,
                })
            }
        };

        let mut merged = first.clip.clone();
        merged.id = self.fresh_clip_id(merged.kind.as_str());
        merged.duration_in_frames = duration;
        merged.effects.push(Effect::fade_in(MERGE_FADE_FRAMES));
        merged.effects.push(Effect::fade_out(MERGE_FADE_FRAMES));
        log::debug!("merge {} clips into {} ({} frames)", refs.len(), merged.id, duration);

        let mut removals: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        for r in &refs {
            removals.entry(r.track_index).or_default().insert(r.clip_index);
        }

        let mut next = self.clone();
        let mut merged = Some(merged);
        for (track_index, removed) in removals {
            let track = Arc::make_mut(&mut next.tracks[track_index]);
            for (index, clip) in std::mem::take(&mut track.clips).into_iter().enumerate() {
                if track_index == first.track_index && index == first.clip_index {
                    if let Some(merged) = merged.take() {
                        track.clips.push(Arc::new(merged));
                    }
                } else if !removed.contains(&index) {
                    track.clips.push(clip);
                }
            }
        }
        Ok(next)
    }

    /// Repositions clips on one track back to back, starting at the
    /// earliest clip's start. Ids and track order are kept.
    pub fn pack_sequential<S: AsRef<str>>(&self, clip_ids: &[S]) -> Result<Timeline> {
        let refs = self.resolve_group(clip_ids)?;
        let track_index = single_track(&refs)?;

        let mut cursor = refs[0].clip.start_in_frames;
        let moves: Vec<(usize, Clip)> = refs
            .iter()
            .map(|r| {
                let mut moved = r.clip.clone();
                moved.start_in_frames = cursor;
                cursor = cursor.saturating_add(moved.duration_in_frames);
                (r.clip_index, moved)
            })
            .collect();

        Ok(self.update_track(track_index, |track| {
            for (clip_index, clip) in moves {
                track.clips[clip_index] = Arc::new(clip);
            }
        }))
    }

    /// Packs clips on one track back to back and replaces them with a single
    /// clip spanning their summed duration
    pub fn concatenate<S: AsRef<str>>(&self, clip_ids: &[S]) -> Result<Timeline> {
        let refs = self.resolve_group(clip_ids)?;
        let track_index = single_track(&refs)?;
        let track_kind = refs[0].track.kind;

        let first = refs[0].clip;
        let mut combined = first.clone();
        combined.id = self.fresh_clip_id(first.kind.as_str());
        combined.duration_in_frames = refs
            .iter()
            .fold(0i64, |total, r| total.saturating_add(r.clip.duration_in_frames));
        if track_kind == ClipKind::Text {
            combined.text = Some(joined_text(&refs));
        }

        log::debug!("concatenate {} clips into {}", refs.len(), combined.id);
        let removed: BTreeSet<usize> = refs.iter().map(|r| r.clip_index).collect();
        Ok(self.replace_clips(track_index, &removed, vec![combined]))
    }

    /// Moves a clip to `new_start`, optionally onto another track.
    ///
    /// The clip is appended to the target track. Overlaps are allowed here
    /// and left for the validator to report.
    pub fn move_to(&self, clip_id: &str, new_start: i64, target_track: Option<&str>) -> Result<Timeline> {
        if new_start < 0 {
            return Err(Error::NegativeStart(new_start));
        }
        let found = self.require_clip(clip_id)?;
        let target_index = match target_track {
            Some(track_id) => self.track_index(track_id)?,
            None => found.track_index,
        };

        let mut moved = found.clip.clone();
        moved.start_in_frames = new_start;
        log::debug!("move {} to frame {} on {}", clip_id, new_start, self.tracks[target_index].id);

        let mut next = self.clone();
        Arc::make_mut(&mut next.tracks[found.track_index])
            .clips
            .remove(found.clip_index);
        Arc::make_mut(&mut next.tracks[target_index]).push_clip(moved);
        Ok(next)
    }

    /// Copies a clip under a fresh id onto the same track at `new_start`
    pub fn duplicate_at(&self, clip_id: &str, new_start: i64) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        let mut copy = found.clip.clone();
        copy.id = self.fresh_clip_id(copy.kind.as_str());
        copy.start_in_frames = new_start;
        log::debug!("duplicate {} as {} at frame {}", clip_id, copy.id, new_start);
        Ok(self.update_track(found.track_index, |track| track.push_clip(copy)))
    }

    /// Appends a track; its id must not be in use
    pub fn add_track(&self, track: Track) -> Result<Timeline> {
        if self.find_track(&track.id).is_some() {
            return Err(Error::DuplicateId(track.id));
        }
        Ok(self.clone().with_track(track))
    }

    /// Drops a track together with its clips
    pub fn remove_track(&self, track_id: &str) -> Result<Timeline> {
        let track_index = self.track_index(track_id)?;
        let mut next = self.clone();
        next.tracks.remove(track_index);
        Ok(next)
    }

    /// Appends a clip to a track; its id must be unused on that track
    pub fn add_clip(&self, track_id: &str, clip: Clip) -> Result<Timeline> {
        let track_index = self.track_index(track_id)?;
        if self.tracks[track_index].get_clip(&clip.id).is_some() {
            return Err(Error::DuplicateId(clip.id));
        }
        Ok(self.update_track(track_index, |track| track.push_clip(clip)))
    }

    /// Drops a clip from whichever track holds it
    pub fn remove_clip(&self, clip_id: &str) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        let clip_index = found.clip_index;
        Ok(self.update_track(found.track_index, |track| {
            track.clips.remove(clip_index);
        }))
    }

    /// Attaches `effect` unless the clip already has one of the same kind
    pub fn add_effect(&self, clip_id: &str, effect: Effect) -> Result<Timeline> {
        let found = self.require_clip(clip_id)?;
        if let Some(kind) = &effect.kind {
            if found.clip.has_effect(kind) {
                return Ok(self.clone());
            }
        }
        let mut clip = found.clip.clone();
        clip.effects.push(effect);
        Ok(self.replace_clip(found.track_index, found.clip_index, clip))
    }

    /// Adds a fade-in of `duration_in_frames` unless one is present
    pub fn add_fade_in(&self, clip_id: &str, duration_in_frames: i64) -> Result<Timeline> {
        self.add_effect(clip_id, Effect::fade_in(duration_in_frames))
    }

    /// Adds a fade-out of `duration_in_frames` unless one is present
    pub fn add_fade_out(&self, clip_id: &str, duration_in_frames: i64) -> Result<Timeline> {
        self.add_effect(clip_id, Effect::fade_out(duration_in_frames))
    }

    /// Rewrites every clip on a text track for which `update` returns true
    fn update_text_clips(&self, mut update: impl FnMut(&Clip) -> Option<Clip>) -> Timeline {
        let mut next = self.clone();
        for track in next.tracks.iter_mut().filter(|t| t.kind == ClipKind::Text) {
            let changes: Vec<(usize, Clip)> = track
                .clips
                .iter()
                .enumerate()
                .filter_map(|(index, clip)| update(clip).map(|changed| (index, changed)))
                .collect();
            if changes.is_empty() {
                continue;
            }
            let track = Arc::make_mut(track);
            for (index, clip) in changes {
                track.clips[index] = Arc::new(clip);
            }
        }
        next
    }

    /// Replaces the text of every text clip containing `old_text`
    /// (case-insensitive) with `new_text`
    pub fn change_text(&self, old_text: &str, new_text: &str) -> Timeline {
        let needle = old_text.to_lowercase();
        self.update_text_clips(|clip| {
            let matches = clip
                .text
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(&needle));
            matches.then(|| Clip {
                text: Some(new_text.to_string()),
                ..clip.clone()
            })
        })
    }

    /// Sets the color of every styled text clip
    pub fn change_text_color(&self, color: &str) -> Timeline {
        self.update_text_clips(|clip| {
            let mut style = clip.style.clone()?;
            style.color = Some(color.to_string());
            Some(Clip {
                style: Some(style),
                ..clip.clone()
            })
        })
    }

    /// Adds a default-styled text clip with a short fade-in to the first text
    /// track, creating one when the timeline has none
    pub fn add_text_overlay(&self, text: &str, placement: OverlayPlacement) -> Timeline {
        let overlay = Clip::text(text, placement.start_frame(), OVERLAY_DURATION_FRAMES)
            .with_id(self.fresh_clip_id(ClipKind::Text.as_str()))
            .with_effect(Effect::fade_in(OVERLAY_FADE_FRAMES));

        let mut next = self.clone();
        let track_index = match next.tracks.iter().position(|t| t.kind == ClipKind::Text) {
            Some(index) => index,
            None => {
                next.tracks
                    .push(Arc::new(Track::new(self.next_track_id(), ClipKind::Text)));
                next.tracks.len() - 1
            }
        };
        Arc::make_mut(&mut next.tracks[track_index]).push_clip(overlay);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectKind;
    use crate::project::ProjectSettings;

    fn video_timeline(clips: Vec<Clip>) -> Timeline {
        let mut track = Track::new("track-1", ClipKind::Video);
        for clip in clips {
            track.push_clip(clip);
        }
        Timeline::new(ProjectSettings::default()).with_track(track)
    }

    fn spans(timeline: &Timeline, track_index: usize) -> Vec<(i64, i64)> {
        timeline.tracks[track_index]
            .clips
            .iter()
            .map(|c| (c.start_in_frames, c.end()))
            .collect()
    }

    #[test]
    fn test_split_at_scenario() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 300).with_id("v1")]);
        let split = timeline.split_at("v1", 90).unwrap();
        assert_eq!(spans(&split, 0), vec![(0, 90), (90, 300)]);
        let clips = &split.tracks[0].clips;
        assert_ne!(clips[0].id, "v1");
        assert_ne!(clips[1].id, "v1");
        assert_ne!(clips[0].id, clips[1].id);
        assert_eq!(clips[0].asset_url, clips[1].asset_url);
        // input is untouched
        assert_eq!(spans(&timeline, 0), vec![(0, 300)]);
    }

    #[test]
    fn test_split_keeps_track_position_and_source_bounds() {
        let timeline = video_timeline(vec![
            Clip::video("a.mp4", 0, 100).with_id("a"),
            Clip::video("b.mp4", 100, 200).with_id("b").with_source(50, 250),
            Clip::video("c.mp4", 300, 100).with_id("c"),
        ]);
        let split = timeline.split_at("b", 160).unwrap();
        let clips = &split.tracks[0].clips;
        assert_eq!(clips.len(), 4);
        assert_eq!(clips[0].id, "a");
        assert_eq!((clips[1].source_in, clips[1].source_out), (Some(50), Some(110)));
        assert_eq!((clips[2].source_in, clips[2].source_out), (Some(110), Some(250)));
        assert_eq!(clips[3].id, "c");
    }

    #[test]
    fn test_split_outside_clip_fails() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 10, 100).with_id("v1")]);
        for frame in [0, 10, 110, 500] {
            assert!(matches!(
                timeline.split_at("v1", frame),
                Err(Error::CutOutsideClip { .. })
            ));
        }
        assert!(matches!(timeline.split_at("v9", 50), Err(Error::ClipNotFound(_))));
    }

    #[test]
    fn test_trims() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 100, 200).with_id("v1").with_source(0, 200)]);

        let trimmed = timeline.trim_start("v1", 150).unwrap();
        let clip = trimmed.find_clip("v1").unwrap().clip;
        assert_eq!((clip.start_in_frames, clip.duration_in_frames), (150, 150));
        assert_eq!(clip.source_in, Some(50));

        let trimmed = timeline.trim_end("v1", 250).unwrap();
        let clip = trimmed.find_clip("v1").unwrap().clip;
        assert_eq!((clip.start_in_frames, clip.duration_in_frames), (100, 150));
        assert_eq!(clip.source_out, Some(150));

        assert!(matches!(timeline.trim_start("v1", 300), Err(Error::WouldEliminateClip { .. })));
        assert!(matches!(timeline.trim_start("v1", -5), Err(Error::NegativeStart(-5))));
        assert!(matches!(timeline.trim_end("v1", 100), Err(Error::WouldEliminateClip { .. })));
    }

    #[test]
    fn test_extract_range() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 300).with_id("v1").with_source(100, 400)]);
        let extracted = timeline.extract_range("v1", 30, 120).unwrap();
        assert_eq!(spans(&extracted, 0), vec![(30, 120)]);
        let clip = extracted.find_clip("v1").unwrap().clip;
        assert_eq!((clip.source_in, clip.source_out), (Some(130), Some(220)));

        for (start, end) in [(-1, 100), (0, 301), (100, 100), (200, 100)] {
            let err = timeline.extract_range("v1", start, end).unwrap_err();
            assert!(matches!(err, Error::InvalidRange { .. }), "{start}..{end}");
        }
    }

    #[test]
    fn test_remove_segment_scenarios() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 900).with_id("v1")]);

        let middle = timeline.remove_segment("v1", 450, 600).unwrap();
        assert_eq!(spans(&middle, 0), vec![(0, 450), (600, 900)]);
        assert!(middle.find_clip("v1").is_none());

        let head = timeline.remove_segment("v1", 0, 100).unwrap();
        assert_eq!(spans(&head, 0), vec![(100, 900)]);
        assert!(head.find_clip("v1").is_some());

        let tail = timeline.remove_segment("v1", 800, 900).unwrap();
        assert_eq!(spans(&tail, 0), vec![(0, 800)]);

        assert!(matches!(
            timeline.remove_segment("v1", 0, 900),
            Err(Error::WouldEliminateClip { .. })
        ));
        assert!(matches!(
            timeline.remove_segment("v1", 800, 1000),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_join_text_clips() {
        let timeline = Timeline::new(ProjectSettings::default()).with_track(
            Track::new("track-1", ClipKind::Text)
                .with_clip(Clip::text("World", 100, 50).with_id("t2"))
                .with_clip(Clip::text("Hello", 0, 50).with_id("t1")),
        );
        let joined = timeline.join(&["t2", "t1"]).unwrap();
        let clips = &joined.tracks[0].clips;
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].text.as_deref(), Some("Hello World"));
        // gap between 50 and 100 is absorbed
        assert_eq!((clips[0].start_in_frames, clips[0].duration_in_frames), (0, 150));
    }

    #[test]
    fn test_join_preconditions() {
        let timeline = Timeline::new(ProjectSettings::default())
            .with_track(
                Track::new("track-1", ClipKind::Video)
                    .with_clip(Clip::video("a.mp4", 0, 50).with_id("a"))
                    .with_clip(Clip::new(ClipKind::Video, 50, 50).with_id("no-asset")),
            )
            .with_track(Track::new("track-2", ClipKind::Video).with_clip(Clip::video("b.mp4", 0, 50).with_id("b")));

        assert!(matches!(timeline.join(&["a"]), Err(Error::NotEnoughClips { found: 1, .. })));
        assert!(matches!(timeline.join(&["a", "a"]), Err(Error::NotEnoughClips { found: 1, .. })));
        assert!(matches!(timeline.join(&["a", "zzz"]), Err(Error::ClipNotFound(_))));
        assert!(matches!(timeline.join(&["a", "b"]), Err(Error::ClipsOnDifferentTracks(_))));
        assert!(matches!(
            timeline.join(&["a", "no-asset"]),
            Err(Error::IncompatibleClip { clip_id, .. }) if clip_id == "no-asset"
        ));
    }

    #[test]
    fn test_merge_with_crossfade_scenario() {
        let timeline = video_timeline(vec![
            Clip::video("a.mp4", 0, 150).with_id("v1"),
            Clip::video("b.mp4", 150, 150).with_id("v2"),
        ]);
        let merged = timeline.merge_with_crossfade(&["v1", "v2"], 30).unwrap();
        let clips = &merged.tracks[0].clips;
        assert_eq!(clips.len(), 1);
        assert_eq!((clips[0].start_in_frames, clips[0].end()), (0, 270));
        assert_eq!(clips[0].asset_url.as_deref(), Some("a.mp4"));
        let kinds: Vec<_> = clips[0].effects.iter().map(|e| (e.kind.clone(), e.duration_in_frames)).collect();
        assert_eq!(
            kinds,
            vec![(Some(EffectKind::FadeIn), 15), (Some(EffectKind::FadeOut), 15)]
        );
    }

    #[test]
    fn test_merge_across_video_tracks() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 100).with_id("v1")])
            .with_track(Track::new("track-2", ClipKind::Video).with_clip(Clip::video("b.mp4", 90, 100).with_id("v2")))
            .with_track(Track::new("track-3", ClipKind::Text).with_clip(Clip::text("Hi", 0, 10).with_id("t1")));

        let merged = timeline.merge_with_crossfade(&["v2", "v1"], 10).unwrap();
        assert_eq!(spans(&merged, 0), vec![(0, 180)]);
        assert!(merged.tracks[1].clips.is_empty());

        assert!(matches!(
            timeline.merge_with_crossfade(&["v1", "t1"], 10),
            Err(Error::IncompatibleClip { .. })
        ));
        assert!(matches!(
            timeline.merge_with_crossfade(&["v1", "v2"], -1),
            Err(Error::InvalidCrossfade(-1))
        ));
        assert!(matches!(
            timeline.merge_with_crossfade(&["v1", "v2"], 190),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_pack_and_concatenate() {
        let timeline = video_timeline(vec![
            Clip::video("b.mp4", 500, 60).with_id("b"),
            Clip::video("a.mp4", 100, 90).with_id("a"),
        ]);

        let packed = timeline.pack_sequential(&["a", "b"]).unwrap();
        let a = packed.find_clip("a").unwrap().clip;
        let b = packed.find_clip("b").unwrap().clip;
        assert_eq!(b.start_in_frames, a.start_in_frames + a.duration_in_frames);

        let combined = timeline.concatenate(&["b", "a"]).unwrap();
        assert_eq!(spans(&combined, 0), vec![(100, 250)]);
        assert_eq!(combined.tracks[0].clips[0].asset_url.as_deref(), Some("a.mp4"));
    }

    #[test]
    fn test_pack_and_concatenate_preconditions() {
        let timeline = video_timeline(vec![
            Clip::video("a.mp4", 0, 90).with_id("a"),
            Clip::video("b.mp4", 200, 60).with_id("b"),
        ])
        .with_track(Track::new("track-2", ClipKind::Video).with_clip(Clip::video("c.mp4", 0, 30).with_id("c")));

        assert!(matches!(
            timeline.concatenate(&["a"]),
            Err(Error::NotEnoughClips { required: 2, found: 1 })
        ));
        assert!(matches!(
            timeline.pack_sequential(&["b", "b"]),
            Err(Error::NotEnoughClips { found: 1, .. })
        ));
        assert!(matches!(timeline.concatenate(&["a", "c"]), Err(Error::ClipsOnDifferentTracks(_))));
        assert!(matches!(timeline.pack_sequential(&["c", "b"]), Err(Error::ClipsOnDifferentTracks(_))));
        assert!(matches!(timeline.concatenate(&["a", "zzz"]), Err(Error::ClipNotFound(_))));
        assert!(matches!(timeline.pack_sequential(&["zzz", "b"]), Err(Error::ClipNotFound(_))));
        let empty: [&str; 0] = [];
        assert!(matches!(timeline.pack_sequential(&empty), Err(Error::NotEnoughClips { found: 0, .. })));
    }

    #[test]
    fn test_merge_rejects_overflowing_crossfade() {
        let timeline = video_timeline(vec![
            Clip::video("a.mp4", 0, 100).with_id("v1"),
            Clip::video("b.mp4", 100, 100).with_id("v2"),
            Clip::video("c.mp4", 200, 100).with_id("v3"),
        ]);
        assert!(matches!(
            timeline.merge_with_crossfade(&["v1", "v2", "v3"], i64::MAX),
            Err(Error::InvalidCrossfade(i64::MAX))
        ));

        let far = video_timeline(vec![
            Clip::video("a.mp4", i64::MIN, 10).with_id("v1"),
            Clip::video("b.mp4", i64::MAX - 10, 10).with_id("v2"),
        ]);
        assert!(matches!(
            far.merge_with_crossfade(&["v1", "v2"], 0),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_concatenate_text() {
        let timeline = Timeline::new(ProjectSettings::default()).with_track(
            Track::new("track-1", ClipKind::Text)
                .with_clip(Clip::text("one", 0, 30).with_id("t1"))
                .with_clip(Clip::text("two", 90, 30).with_id("t2")),
        );
        let combined = timeline.concatenate(&["t1", "t2"]).unwrap();
        let clip = &combined.tracks[0].clips[0];
        assert_eq!(clip.text.as_deref(), Some("one two"));
        assert_eq!(clip.duration_in_frames, 60);
    }

    #[test]
    fn test_move_to_other_track() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 100).with_id("v1")])
            .with_track(Track::new("track-2", ClipKind::Video));

        let moved = timeline.move_to("v1", 40, Some("track-2")).unwrap();
        assert!(moved.tracks[0].clips.is_empty());
        assert_eq!(spans(&moved, 1), vec![(40, 140)]);
        assert_eq!(moved.find_clip("v1").unwrap().track.id, "track-2");

        assert!(matches!(timeline.move_to("v1", -1, None), Err(Error::NegativeStart(-1))));
        assert!(matches!(timeline.move_to("v1", 0, Some("nope")), Err(Error::TrackNotFound(_))));
    }

    #[test]
    fn test_move_allows_overlap() {
        let timeline = video_timeline(vec![
            Clip::video("a.mp4", 0, 100).with_id("a"),
            Clip::video("b.mp4", 200, 100).with_id("b"),
        ]);
        let moved = timeline.move_to("b", 50, None).unwrap();
        let ids: Vec<_> = moved.tracks[0].clips.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(spans(&moved, 0), vec![(0, 100), (50, 150)]);
    }

    #[test]
    fn test_duplicate_at() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 100).with_id("v1")]);
        let duplicated = timeline.duplicate_at("v1", 300).unwrap();
        let clips = &duplicated.tracks[0].clips;
        assert_eq!(clips.len(), 2);
        assert_ne!(clips[1].id, "v1");
        assert_eq!(clips[1].start_in_frames, 300);
        assert_eq!(clips[1].asset_url, clips[0].asset_url);
    }

    #[test]
    fn test_untouched_tracks_are_shared() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 100).with_id("v1")])
            .with_track(Track::new("track-2", ClipKind::Text).with_clip(Clip::text("Hi", 0, 10).with_id("t1")));
        let edited = timeline.trim_end("v1", 50).unwrap();
        assert!(Arc::ptr_eq(&timeline.tracks[1], &edited.tracks[1]));
        assert!(!Arc::ptr_eq(&timeline.tracks[0], &edited.tracks[0]));
    }

    #[test]
    fn test_track_and_clip_management() {
        let timeline = video_timeline(vec![]);
        assert!(matches!(
            timeline.add_track(Track::new("track-1", ClipKind::Text)),
            Err(Error::DuplicateId(_))
        ));
        let timeline = timeline.add_track(Track::new("track-2", ClipKind::Text)).unwrap();
        let timeline = timeline.add_clip("track-2", Clip::text("Hi", 0, 30).with_id("t1")).unwrap();
        assert!(matches!(
            timeline.add_clip("track-2", Clip::text("Again", 0, 30).with_id("t1")),
            Err(Error::DuplicateId(_))
        ));
        let without_clip = timeline.remove_clip("t1").unwrap();
        assert_eq!(without_clip.clip_count(), 0);
        let without_track = timeline.remove_track("track-2").unwrap();
        assert_eq!(without_track.tracks.len(), 1);
        assert!(matches!(timeline.remove_track("track-9"), Err(Error::TrackNotFound(_))));
    }

    #[test]
    fn test_fades_are_added_once() {
        let timeline = video_timeline(vec![Clip::video("a.mp4", 0, 100).with_id("v1")]);
        let faded = timeline.add_fade_in("v1", 30).unwrap().add_fade_in("v1", 10).unwrap();
        let faded = faded.add_fade_out("v1", 20).unwrap();
        let effects = &faded.find_clip("v1").unwrap().clip.effects;
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0], Effect::fade_in(30));
        assert_eq!(effects[1], Effect::fade_out(20));
    }

    #[test]
    fn test_text_helpers() {
        let timeline = Timeline::new(ProjectSettings::default())
            .with_track(Track::new("track-1", ClipKind::Video).with_clip(Clip::video("a.mp4", 0, 300).with_id("v1")));

        let with_overlay = timeline.add_text_overlay("Welcome to the beach", OverlayPlacement::Middle);
        assert_eq!(with_overlay.tracks.len(), 2);
        let overlay_track = &with_overlay.tracks[1];
        assert_eq!(overlay_track.id, "track-2");
        assert_eq!(overlay_track.kind, ClipKind::Text);
        let overlay = &overlay_track.clips[0];
        assert_eq!((overlay.start_in_frames, overlay.duration_in_frames), (150, 90));
        assert_eq!(overlay.effects, vec![Effect::fade_in(15)]);

        let renamed = with_overlay.change_text("BEACH", "Goodbye");
        assert_eq!(renamed.tracks[1].clips[0].text.as_deref(), Some("Goodbye"));
        assert!(Arc::ptr_eq(&renamed.tracks[0], &with_overlay.tracks[0]));

        let recolored = renamed.change_text_color("#FF0000");
        let style = recolored.tracks[1].clips[0].style.as_ref().unwrap();
        assert_eq!(style.color.as_deref(), Some("#FF0000"));
    }
}
