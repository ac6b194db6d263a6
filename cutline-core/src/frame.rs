//! Per-frame effect state for rendering drivers

use crate::clip::{Clip, ClipKind};
use crate::effect::{EffectKind, EffectState, SLIDE_DISTANCE_PX};
use crate::timeline::Timeline;
use serde::Serialize;

/// Visual state of one clip at one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipFrameState {
    /// Most restrictive opacity of the active fades, 1 without any
    pub opacity: f64,
    /// Pixel offset added to the clip's base transform by slide-ins
    pub offset_x: f64,
    pub offset_y: f64,
    /// State of each effect, in the clip's effect order
    pub effects: Vec<EffectState>,
}

impl Clip {
    /// Evaluates every effect of this clip at `global_frame`
    pub fn frame_state(&self, global_frame: i64) -> ClipFrameState {
        let local_frame = self.local_frame(global_frame);
        let mut state = ClipFrameState {
            opacity: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            effects: Vec::with_capacity(self.effects.len()),
        };

        for effect in &self.effects {
            let evaluated = effect.evaluate(local_frame, self.duration_in_frames);
            if evaluated.active {
                match &effect.kind {
                    Some(EffectKind::FadeIn) => state.opacity = state.opacity.min(evaluated.progress),
                    Some(EffectKind::FadeOut) => state.opacity = state.opacity.min(1.0 - evaluated.progress),
                    Some(EffectKind::SlideIn) => {
                        if let Some(direction) = effect.direction {
                            let (dx, dy) = direction.offset(evaluated.progress, SLIDE_DISTANCE_PX);
                            state.offset_x += dx;
                            state.offset_y += dy;
                        }
                    }
                    Some(EffectKind::Other(_)) | None => {}
                }
            }
            state.effects.push(evaluated);
        }

        state
    }
}

/// One visible clip in a composed frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerState {
    pub track_id: String,
    pub clip_id: String,
    pub kind: ClipKind,
    pub local_frame: i64,
    pub state: ClipFrameState,
}

/// Lists the clips visible at `frame`, bottom layer first.
///
/// Layers follow track order; clips on the same track are ordered by start.
pub fn compose_frame(timeline: &Timeline, frame: i64) -> Vec<LayerState> {
    let mut active = timeline.active_clips_at(frame);
    active.sort_by_key(|r| (r.track_index, r.clip.start_in_frames));

    log::debug!("frame {}: {} active clip(s)", frame, active.len());
    active
        .into_iter()
        .map(|r| LayerState {
            track_id: r.track.id.clone(),
            clip_id: r.clip.id.clone(),
            kind: r.clip.kind,
            local_frame: r.clip.local_frame(frame),
            state: r.clip.frame_state(frame),
        })
        .collect()
}
