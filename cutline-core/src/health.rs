//! Timeline health summary built on top of the validator

use crate::clip::ClipKind;
use crate::timeline::Timeline;
use crate::validate::{validate_with, CheckConfig, IssueCode, ValidationReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate numbers describing a timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStats {
    pub track_count: usize,
    pub clip_count: usize,
    pub clips_by_kind: BTreeMap<ClipKind, usize>,
    pub total_duration_frames: i64,
    pub total_duration_seconds: f64,
    /// 0 for a timeline without clips
    pub mean_clip_duration_frames: f64,
}

impl TimelineStats {
    /// Gathers stats over every clip in `timeline`
    pub fn collect(timeline: &Timeline) -> Self {
        let mut clips_by_kind = BTreeMap::new();
        let mut duration_sum = 0i64;
        for r in timeline.clips() {
            *clips_by_kind.entry(r.clip.kind).or_insert(0) += 1;
            duration_sum = duration_sum.saturating_add(r.clip.duration_in_frames);
        }

        let clip_count = timeline.clip_count();
        let mean_clip_duration_frames = if clip_count == 0 {
            0.0
        } else {
            duration_sum as f64 / clip_count as f64
        };

        Self {
            track_count: timeline.tracks.len(),
            clip_count,
            clips_by_kind,
            total_duration_frames: timeline.total_duration_frames(),
            total_duration_seconds: timeline.total_duration_seconds(),
            mean_clip_duration_frames,
        }
    }

    /// Number of clips of `kind`
    pub fn count_of(&self, kind: ClipKind) -> usize {
        self.clips_by_kind.get(&kind).copied().unwrap_or(0)
    }
}

/// Validation result plus stats and advice
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// True when validation found no errors
    pub is_healthy: bool,
    pub validation: ValidationReport,
    pub stats: TimelineStats,
    pub recommendations: Vec<String>,
}

/// Runs the health check with the default thresholds
pub fn health_check(timeline: &Timeline) -> HealthReport {
    health_check_with(timeline, &CheckConfig::default())
}

pub fn health_check_with(timeline: &Timeline, config: &CheckConfig) -> HealthReport {
    HealthReport::from_validation(timeline, validate_with(timeline, config), config)
}

impl HealthReport {
    /// Builds the report around a validation that already ran
    pub fn from_validation(timeline: &Timeline, validation: ValidationReport, config: &CheckConfig) -> Self {
        let stats = TimelineStats::collect(timeline);
        let recommendations = recommend(&stats, &validation, config);

        HealthReport {
            is_healthy: validation.is_valid(),
            validation,
            stats,
            recommendations,
        }
    }
}

fn recommend(stats: &TimelineStats, validation: &ValidationReport, config: &CheckConfig) -> Vec<String> {
    let mut advice = Vec::new();

    if !validation.is_valid() {
        advice.push(format!(
            "Fix the {} validation error(s) before rendering",
            validation.errors.len()
        ));
    }

    if stats.clip_count == 0 {
        advice.push("The timeline is empty; add some media to get started".to_string());
        return advice;
    }

    let text_clips = stats.count_of(ClipKind::Text);
    if text_clips == stats.clip_count {
        advice.push("Only text clips found; consider adding background video or images".to_string());
    }
    if stats.mean_clip_duration_frames < config.min_mean_clip_frames {
        advice.push(format!(
            "Clips average {:.0} frames; consider longer clips (at least {:.0} frames)",
            stats.mean_clip_duration_frames, config.min_mean_clip_frames
        ));
    }
    if validation.has_warning(IssueCode::OverlappingClips) {
        advice.push("Some clips overlap on the same track; move them to separate tracks".to_string());
    }
    if validation.has_warning(IssueCode::LargeGap) {
        advice.push("There are long gaps between clips; close them or add filler media".to_string());
    }

    advice
}
