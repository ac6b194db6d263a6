//! Cutline Core Library
//!
//! This library provides the frame-accurate timeline model used by the
//! cutline editor: tracks and clips, the clip editing algebra, the
//! validator/health check, and the per-frame effect evaluator.
//!
//! Every editing operation takes a snapshot by reference and returns a new
//! snapshot, so callers can keep old timelines around for undo.
//!
//! ```
//! use cutline_core::{Clip, ClipKind, ProjectSettings, Timeline, Track};
//!
//! let mut track = Track::new("track-1", ClipKind::Video);
//! track.push_clip(Clip::video("intro.mp4", 0, 300).with_id("v1"));
//! let timeline = Timeline::new(ProjectSettings::default()).with_track(track);
//!
//! let edited = timeline.split_at("v1", 90).unwrap();
//! assert_eq!(edited.clip_count(), 2);
//! assert_eq!(timeline.clip_count(), 1);
//! ```

pub mod asset;
pub mod clip;
pub mod commit;
pub mod document;
pub mod edit;
pub mod effect;
pub mod frame;
pub mod health;
pub mod id;
pub mod project;
pub mod time;
pub mod timeline;
pub mod track;
pub mod validate;

pub use asset::MediaAsset;
pub use clip::{Anchor, Clip, ClipKind, Layout, Position, PositionUnit, TextStyle};
pub use commit::{CommittedTimeline, UntrustedTimeline};
pub use edit::OverlayPlacement;
pub use effect::{Effect, EffectKind, EffectState, SlideDirection};
pub use frame::{compose_frame, ClipFrameState, LayerState};
pub use health::{health_check, health_check_with, HealthReport, TimelineStats};
pub use project::ProjectSettings;
pub use time::{frames_to_seconds, seconds_to_frames};
pub use timeline::{ClipRef, Timeline};
pub use track::Track;
pub use validate::{validate, validate_with, CheckConfig, Issue, IssueCode, ValidationReport};

/// Result type for cutline-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A referenced clip or track does not exist
    NotFound,
    /// A frame parameter lies outside the clip it targets
    Range,
    /// The operands cannot be combined
    Compatibility,
    /// The timeline failed structural validation
    Validation,
    /// Reading or writing the interchange format failed
    Io,
}

/// Error types for cutline-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clip not found: {0}")]
    ClipNotFound(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("Cut position {frame} outside clip {clip_id} ({start}..{end})")]
    CutOutsideClip {
        clip_id: String,
        frame: i64,
        start: i64,
        end: i64,
    },

    #[error("Trimming clip {clip_id} to {frame} would eliminate it")]
    WouldEliminateClip { clip_id: String, frame: i64 },

    #[error("Invalid range {start}..{end} for clip {clip_id}")]
    InvalidRange {
        clip_id: String,
        start: i64,
        end: i64,
    },

    #[error("Start frame must not be negative, got {0}")]
    NegativeStart(i64),

    #[error("Crossfade must not be negative, got {0}")]
    InvalidCrossfade(i64),

    #[error("At least {required} clips are required, got {found}")]
    NotEnoughClips { required: usize, found: usize },

    #[error("Clips must be on the same track: {0:?}")]
    ClipsOnDifferentTracks(Vec<String>),

    #[error("Clip {clip_id} is incompatible: {reason}")]
    IncompatibleClip { clip_id: String, reason: String },

    #[error("Id already in use: {0}")]
    DuplicateId(String),

    #[error("Timeline rejected with {} error(s)", .0.errors.len())]
    Rejected(ValidationReport),
}

impl Error {
    /// Returns the broad category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
            Error::ClipNotFound(_) | Error::TrackNotFound(_) => ErrorCategory::NotFound,
            Error::CutOutsideClip { .. }
            | Error::WouldEliminateClip { .. }
            | Error::InvalidRange { .. }
            | Error::NegativeStart(_)
            | Error::InvalidCrossfade(_) => ErrorCategory::Range,
            Error::NotEnoughClips { .. }
            | Error::ClipsOnDifferentTracks(_)
            | Error::IncompatibleClip { .. }
            | Error::DuplicateId(_) => ErrorCategory::Compatibility,
            Error::Rejected(_) => ErrorCategory::Validation,
        }
    }
}
