//! Structural validation of timelines
//!
//! Errors make a timeline unfit to be committed. Warnings are advisory and
//! never block anything.

use crate::clip::{Clip, ClipKind};
use crate::timeline::Timeline;
use crate::track::Track;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Thresholds used by the validator and the health check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckConfig {
    /// Frame rates above this are reported as unusual
    pub max_fps: u32,
    /// Longest silent stretch between two clips on a track
    pub max_gap_frames: i64,
    /// Media clips longer than this are reported
    pub max_media_clip_frames: i64,
    pub min_font_size: f64,
    /// Mean clip duration below which the health check suggests longer clips
    pub min_mean_clip_frames: f64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_fps: 120,
            max_gap_frames: 90,
            max_media_clip_frames: 54_000,
            min_font_size: 12.0,
            min_mean_clip_frames: 60.0,
        }
    }
}

/// Machine-readable identifier of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    // errors
    MissingProject,
    InvalidDimensions,
    InvalidFps,
    MissingTrackId,
    DuplicateTrackId,
    MissingClipId,
    DuplicateClipId,
    NonPositiveDuration,
    NegativeStart,
    MissingText,
    MissingAsset,
    MissingEffectKind,
    NonPositiveEffectDuration,
    FrameOverflow,
    MalformedTrack,
    MalformedClip,
    MissingTrackKind,
    InvalidClipKind,
    InvalidStart,
    InvalidDuration,
    InvalidSourceRange,
    // warnings
    UnusualFps,
    IncompleteTextStyle,
    SmallFontSize,
    OverlappingClips,
    LargeGap,
    UnknownEffectKind,
    EffectLongerThanClip,
    LongMediaClip,
    ClipIdReusedAcrossTracks,
    ClipKindMismatch,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::MissingProject => "missing-project",
            IssueCode::InvalidDimensions => "invalid-dimensions",
            IssueCode::InvalidFps => "invalid-fps",
            IssueCode::MissingTrackId => "missing-track-id",
            IssueCode::DuplicateTrackId => "duplicate-track-id",
            IssueCode::MissingClipId => "missing-clip-id",
            IssueCode::DuplicateClipId => "duplicate-clip-id",
            IssueCode::NonPositiveDuration => "non-positive-duration",
            IssueCode::NegativeStart => "negative-start",
            IssueCode::MissingText => "missing-text",
            IssueCode::MissingAsset => "missing-asset",
            IssueCode::MissingEffectKind => "missing-effect-kind",
            IssueCode::NonPositiveEffectDuration => "non-positive-effect-duration",
            IssueCode::FrameOverflow => "frame-overflow",
            IssueCode::MalformedTrack => "malformed-track",
            IssueCode::MalformedClip => "malformed-clip",
            IssueCode::MissingTrackKind => "missing-track-kind",
            IssueCode::InvalidClipKind => "invalid-clip-kind",
            IssueCode::InvalidStart => "invalid-start",
            IssueCode::InvalidDuration => "invalid-duration",
            IssueCode::InvalidSourceRange => "invalid-source-range",
            IssueCode::UnusualFps => "unusual-fps",
            IssueCode::IncompleteTextStyle => "incomplete-text-style",
            IssueCode::SmallFontSize => "small-font-size",
            IssueCode::OverlappingClips => "overlapping-clips",
            IssueCode::LargeGap => "large-gap",
            IssueCode::UnknownEffectKind => "unknown-effect-kind",
            IssueCode::EffectLongerThanClip => "effect-longer-than-clip",
            IssueCode::LongMediaClip => "long-media-clip",
            IssueCode::ClipIdReusedAcrossTracks => "clip-id-reused-across-tracks",
            IssueCode::ClipKindMismatch => "clip-kind-mismatch",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<String>,
}

impl Issue {
    pub(crate) fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            track_id: None,
            clip_id: None,
        }
    }

    fn on_track(mut self, track: &Track) -> Self {
        self.track_id = Some(track.id.clone());
        self
    }

    fn on_clip(mut self, track: &Track, clip: &Clip) -> Self {
        self.track_id = Some(track.id.clone());
        self.clip_id = Some(clip.id.clone());
        self
    }

    /// Attaches ids taken from a raw document, where either may be absent
    pub(crate) fn located(mut self, track_id: Option<&str>, clip_id: Option<&str>) -> Self {
        self.track_id = track_id.map(str::to_string);
        self.clip_id = clip_id.map(str::to_string);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        match (&self.track_id, &self.clip_id) {
            (Some(track), Some(clip)) => write!(f, " (track {}, clip {})", track, clip),
            (Some(track), None) => write!(f, " (track {})", track),
            _ => Ok(()),
        }
    }
}

/// Outcome of [`validate`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    /// Returns true when no errors were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    fn error(&mut self, issue: Issue) {
        self.errors.push(issue);
    }

    fn warn(&mut self, issue: Issue) {
        self.warnings.push(issue);
    }
}

/// Validates `timeline` with the default thresholds
pub fn validate(timeline: &Timeline) -> ValidationReport {
    validate_with(timeline, &CheckConfig::default())
}

/// Validates `timeline` with custom thresholds
pub fn validate_with(timeline: &Timeline, config: &CheckConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_project(timeline, config, &mut report);

    let mut track_ids: HashSet<&str> = HashSet::new();
    let mut clip_owners: HashMap<&str, &str> = HashMap::new();
    for track in &timeline.tracks {
        if track.id.trim().is_empty() {
            report.error(Issue::new(IssueCode::MissingTrackId, "track has no id"));
        } else if !track_ids.insert(track.id.as_str()) {
            report.error(Issue::new(IssueCode::DuplicateTrackId, format!("track id {} is used twice", track.id)).on_track(track));
        }

        let mut seen_on_track: HashSet<&str> = HashSet::new();
        for clip in &track.clips {
            if clip.id.trim().is_empty() {
                report.error(Issue::new(IssueCode::MissingClipId, "clip has no id").on_track(track));
            } else if !seen_on_track.insert(clip.id.as_str()) {
                report.error(
                    Issue::new(IssueCode::DuplicateClipId, format!("clip id {} is used twice on one track", clip.id))
                        .on_clip(track, clip),
                );
            } else if let Some(owner) = clip_owners.insert(clip.id.as_str(), track.id.as_str()) {
                report.warn(
                    Issue::new(
                        IssueCode::ClipIdReusedAcrossTracks,
                        format!("clip id {} is also used on track {}", clip.id, owner),
                    )
                    .on_clip(track, clip),
                );
            }
            check_clip(track, clip, config, &mut report);
        }

        check_spacing(track, config, &mut report);
    }

    log::debug!(
        "validated {} tracks: {} errors, {} warnings",
        timeline.tracks.len(),
        report.errors.len(),
        report.warnings.len()
    );
    report
}

fn check_project(timeline: &Timeline, config: &CheckConfig, report: &mut ValidationReport) {
    let Some(project) = timeline.project else {
        report.error(Issue::new(IssueCode::MissingProject, "project settings are missing"));
        return;
    };

    if project.width == 0 || project.height == 0 {
        report.error(Issue::new(
            IssueCode::InvalidDimensions,
            format!("invalid project dimensions {}x{}", project.width, project.height),
        ));
    }
    if project.fps == 0 {
        report.error(Issue::new(IssueCode::InvalidFps, "project fps must be positive"));
    } else if project.fps > config.max_fps {
        report.warn(Issue::new(
            IssueCode::UnusualFps,
            format!("unusual frame rate {} (above {})", project.fps, config.max_fps),
        ));
    }
}

fn check_clip(track: &Track, clip: &Clip, config: &CheckConfig, report: &mut ValidationReport) {
    let issue = |code, message: String| Issue::new(code, message).on_clip(track, clip);

    if clip.duration_in_frames <= 0 {
        report.error(issue(
            IssueCode::NonPositiveDuration,
            format!("duration must be positive, got {}", clip.duration_in_frames),
        ));
    }
    if clip.start_in_frames < 0 {
        report.error(issue(
            IssueCode::NegativeStart,
            format!("start must not be negative, got {}", clip.start_in_frames),
        ));
    }
    if clip.checked_end().is_none() {
        report.error(issue(
            IssueCode::FrameOverflow,
            format!(
                "end frame of start {} plus duration {} is out of range",
                clip.start_in_frames, clip.duration_in_frames
            ),
        ));
    }
    if !clip.fits_track(track.kind) {
        report.warn(issue(
            IssueCode::ClipKindMismatch,
            format!("{} clip sits on a {} track", clip.kind, track.kind),
        ));
    }

    match clip.kind {
        ClipKind::Text => {
            if clip.text_content().is_none() {
                report.error(issue(IssueCode::MissingText, "text clip has no text".to_string()));
            }
            check_text_style(clip, config, report, &issue);
        }
        ClipKind::Video | ClipKind::Audio | ClipKind::Image => {
            if clip.asset_ref().is_none() {
                report.error(issue(
                    IssueCode::MissingAsset,
                    format!("{} clip has no asset reference", clip.kind),
                ));
            }
            if clip.duration_in_frames > config.max_media_clip_frames {
                report.warn(issue(
                    IssueCode::LongMediaClip,
                    format!(
                        "{} clip lasts {} frames (more than {})",
                        clip.kind, clip.duration_in_frames, config.max_media_clip_frames
                    ),
                ));
            }
        }
    }

    for effect in &clip.effects {
        match &effect.kind {
            None => report.error(issue(IssueCode::MissingEffectKind, "effect has no type".to_string())),
            Some(kind) if kind.is_blank() => {
                report.error(issue(IssueCode::MissingEffectKind, "effect has no type".to_string()))
            }
            Some(kind) if !kind.is_known() => report.warn(issue(
                IssueCode::UnknownEffectKind,
                format!("unknown effect type {:?}", kind.as_str()),
            )),
            Some(_) => {}
        }

        if effect.duration_in_frames <= 0 {
            report.error(issue(
                IssueCode::NonPositiveEffectDuration,
                format!("effect duration must be positive, got {}", effect.duration_in_frames),
            ));
        } else if clip.duration_in_frames > 0 && effect.duration_in_frames > clip.duration_in_frames {
            report.warn(issue(
                IssueCode::EffectLongerThanClip,
                format!(
                    "effect lasts {} frames but the clip only {}",
                    effect.duration_in_frames, clip.duration_in_frames
                ),
            ));
        }
    }
}

fn check_text_style(
    clip: &Clip,
    config: &CheckConfig,
    report: &mut ValidationReport,
    issue: &impl Fn(IssueCode, String) -> Issue,
) {
    let Some(style) = &clip.style else {
        report.warn(issue(IssueCode::IncompleteTextStyle, "text clip has no style".to_string()));
        return;
    };

    let missing = style.missing_fields();
    if !missing.is_empty() {
        report.warn(issue(
            IssueCode::IncompleteTextStyle,
            format!("text style is missing {}", missing.join(", ")),
        ));
    }
    if let Some(size) = style.font_size {
        if size < config.min_font_size {
            report.warn(issue(
                IssueCode::SmallFontSize,
                format!("font size {} is below {}", size, config.min_font_size),
            ));
        }
    }
}

/// Overlaps on exclusive tracks and gaps between sequential clips
fn check_spacing(track: &Track, config: &CheckConfig, report: &mut ValidationReport) {
    let clips = track.clips_by_start();
    let Some((first, rest)) = clips.split_first() else {
        return;
    };

    let mut reach = first.end();
    let mut reaching = *first;
    for clip in rest {
        if clip.start_in_frames < reach {
            if track.kind.is_exclusive() {
                report.warn(
                    Issue::new(
                        IssueCode::OverlappingClips,
                        format!("clips {} and {} overlap", reaching.id, clip.id),
                    )
                    .on_clip(track, clip),
                );
            }
        } else {
            let gap = clip.start_in_frames.saturating_sub(reach);
            if gap > config.max_gap_frames {
                report.warn(
                    Issue::new(
                        IssueCode::LargeGap,
                        format!("{} frame gap between {} and {}", gap, reaching.id, clip.id),
                    )
                    .on_clip(track, clip),
                );
            }
        }
        if clip.end() > reach {
            reach = clip.end();
            reaching = *clip;
        }
    }
}
