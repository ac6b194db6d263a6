//! Canonical JSON interchange format
//!
//! ```text
//! { "project": { "width", "height", "fps" },
//!   "timeline": [ { "id", "type", "clips": [ { "id", "startInFrames", ... } ] } ] }
//! ```
//!
//! Clips written by other tools often omit their `type`; such clips take the
//! kind of the track they sit on.
//!
//! [`Timeline::read`] is strict. Untrusted documents first go through
//! [`repair_document`], which replaces fields the typed model cannot hold
//! with placeholders and records one error for each.

use crate::clip::{Clip, ClipKind};
use crate::project::ProjectSettings;
use crate::timeline::Timeline;
use crate::track::Track;
use crate::validate::{Issue, IssueCode};
use crate::Result;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::{Read, Write};
use std::sync::Arc;

/// Wire form of a track, before clip kinds are resolved
#[derive(Deserialize)]
pub(crate) struct TrackRepr {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: ClipKind,
    #[serde(default)]
    muted: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    clips: Vec<Value>,
}

impl TryFrom<TrackRepr> for Track {
    type Error = serde_json::Error;

    fn try_from(repr: TrackRepr) -> std::result::Result<Self, Self::Error> {
        let clips = repr
            .clips
            .into_iter()
            .map(|mut value| {
                if let Value::Object(fields) = &mut value {
                    fields
                        .entry("type")
                        .or_insert_with(|| Value::String(repr.kind.as_str().to_string()));
                }
                serde_json::from_value::<Clip>(value).map(Arc::new)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Track {
            id: repr.id,
            name: repr.name,
            kind: repr.kind,
            muted: repr.muted,
            locked: repr.locked,
            clips,
        })
    }
}

impl Timeline {
    /// Reads a timeline document from a reader
    pub fn read<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Writes the timeline document as pretty-printed JSON
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Start placeholder for a clip whose start could not be read
const PLACEHOLDER_START: i64 = 0;
/// Duration placeholder; positive so the validator does not report it twice
const PLACEHOLDER_DURATION: i64 = 1;

/// Makes a raw document readable by the typed model.
///
/// Frame fields must be whole numbers; integral floats such as `30.0` are
/// accepted as is. Anything else is replaced and reported.
pub(crate) fn repair_document(document: &mut Value) -> Vec<Issue> {
    let mut issues = Vec::new();
    let Value::Object(root) = document else {
        return issues;
    };

    match root.get_mut("project") {
        Some(Value::Object(project)) => repair_project(project, &mut issues),
        // the validator reports the missing project
        Some(project) if !project.is_null() => *project = Value::Null,
        _ => {}
    }

    match root.get_mut("timeline") {
        Some(Value::Array(tracks)) => repair_tracks(tracks, &mut issues),
        Some(other) => {
            issues.push(Issue::new(IssueCode::MalformedTrack, "timeline is not a list of tracks"));
            *other = Value::Array(Vec::new());
        }
        None => {}
    }

    issues
}

fn repair_project(project: &mut Map<String, Value>, issues: &mut Vec<Issue>) {
    let defaults = ProjectSettings::default();
    let fields = [
        ("width", defaults.width, IssueCode::InvalidDimensions),
        ("height", defaults.height, IssueCode::InvalidDimensions),
        ("fps", defaults.fps, IssueCode::InvalidFps),
    ];
    for (name, fallback, code) in fields {
        let Some(value) = project.get_mut(name) else {
            continue;
        };
        if value.as_u64().and_then(|v| u32::try_from(v).ok()).is_none() {
            issues.push(Issue::new(
                code,
                format!("project {} must be a non-negative integer, got {}", name, value),
            ));
            *value = Value::from(fallback);
        }
    }
}

fn repair_tracks(tracks: &mut Vec<Value>, issues: &mut Vec<Issue>) {
    let mut position = 0;
    tracks.retain(|track| {
        position += 1;
        if !track.is_object() {
            issues.push(Issue::new(
                IssueCode::MalformedTrack,
                format!("track {} is not an object", position),
            ));
        }
        track.is_object()
    });

    for track in tracks.iter_mut().filter_map(Value::as_object_mut) {
        repair_track(track, issues);
    }
}

fn repair_track(track: &mut Map<String, Value>, issues: &mut Vec<Issue>) {
    drop_unless(track, "id", Value::is_string);
    drop_unless(track, "name", Value::is_string);
    drop_unless(track, "muted", Value::is_boolean);
    drop_unless(track, "locked", Value::is_boolean);
    let track_id = track.get("id").and_then(Value::as_str).map(str::to_string);
    let located = |issue: Issue| issue.located(track_id.as_deref(), None);

    let clips = match track.get_mut("clips") {
        Some(Value::Array(clips)) => std::mem::take(clips),
        Some(_) => {
            issues.push(located(Issue::new(IssueCode::MalformedClip, "clips is not a list")));
            Vec::new()
        }
        None => Vec::new(),
    };
    let mut clips: Vec<Value> = clips
        .into_iter()
        .enumerate()
        .filter_map(|(index, clip)| {
            if !clip.is_object() {
                issues.push(located(Issue::new(
                    IssueCode::MalformedClip,
                    format!("clip {} is not an object", index + 1),
                )));
            }
            clip.is_object().then_some(clip)
        })
        .collect();

    if track.get("type").and_then(clip_kind).is_none() {
        let inferred = clips
            .iter()
            .find_map(|clip| clip.get("type").and_then(clip_kind))
            .unwrap_or(ClipKind::Video);
        let message = match track.get("type") {
            Some(kind) => format!("track type {} is not recognised, assuming {}", kind, inferred),
            None => format!("track has no type, assuming {}", inferred),
        };
        issues.push(located(Issue::new(IssueCode::MissingTrackKind, message)));
        track.insert("type".to_string(), Value::from(inferred.as_str()));
    }

    for clip in clips.iter_mut().filter_map(Value::as_object_mut) {
        repair_clip(clip, track_id.as_deref(), issues);
    }
    track.insert("clips".to_string(), Value::Array(clips));
}

fn repair_clip(clip: &mut Map<String, Value>, track_id: Option<&str>, issues: &mut Vec<Issue>) {
    drop_unless(clip, "id", Value::is_string);
    let clip_id = clip.get("id").and_then(Value::as_str).map(str::to_string);
    let mut report = |code, message: String| {
        issues.push(Issue::new(code, message).located(track_id, clip_id.as_deref()));
    };

    if let Some(kind) = clip.get("type") {
        if clip_kind(kind).is_none() {
            report(
                IssueCode::InvalidClipKind,
                format!("clip type {} is not recognised, using the track type", kind),
            );
            clip.remove("type");
        }
    }

    let required = [
        ("startInFrames", PLACEHOLDER_START, IssueCode::InvalidStart),
        ("durationInFrames", PLACEHOLDER_DURATION, IssueCode::InvalidDuration),
    ];
    for (name, placeholder, code) in required {
        let frames = match clip.get(name) {
            None => {
                report(code, format!("{} is missing", name));
                placeholder
            }
            Some(value) => frame_value(value).unwrap_or_else(|| {
                report(code, format!("{} must be a whole number of frames, got {}", name, value));
                placeholder
            }),
        };
        clip.insert(name.to_string(), Value::from(frames));
    }

    for name in ["sourceIn", "sourceOut"] {
        let Some(value) = clip.get(name).filter(|value| !value.is_null()) else {
            continue;
        };
        match frame_value(value) {
            Some(frames) => {
                clip.insert(name.to_string(), Value::from(frames));
            }
            None => {
                report(
                    IssueCode::InvalidSourceRange,
                    format!("{} must be a whole number of frames, got {}", name, value),
                );
                clip.remove(name);
            }
        }
    }

    match clip.get_mut("effects") {
        Some(Value::Array(effects)) => {
            let mut position = 0;
            effects.retain(|effect| {
                position += 1;
                if !effect.is_object() {
                    report(IssueCode::MalformedClip, format!("effect {} is not an object", position));
                }
                effect.is_object()
            });
            for effect in effects.iter_mut().filter_map(Value::as_object_mut) {
                // the validator reports the missing kind
                drop_unless(effect, "type", Value::is_string);
                if let Some(value) = effect.get("durationInFrames") {
                    let frames = frame_value(value).unwrap_or_else(|| {
                        report(
                            IssueCode::InvalidDuration,
                            format!("effect durationInFrames must be a whole number of frames, got {}", value),
                        );
                        PLACEHOLDER_DURATION
                    });
                    effect.insert("durationInFrames".to_string(), Value::from(frames));
                }
            }
        }
        Some(other) if !other.is_null() => {
            report(IssueCode::MalformedClip, "effects is not a list".to_string());
            clip.remove("effects");
        }
        _ => {}
    }
}

fn clip_kind(value: &Value) -> Option<ClipKind> {
    let name = value.as_str()?;
    ClipKind::ALL.into_iter().find(|kind| kind.as_str() == name)
}

/// Whole frame count of a JSON number, accepting integral floats
fn frame_value(value: &Value) -> Option<i64> {
    if let Some(frames) = value.as_i64() {
        return Some(frames);
    }
    let frames = value.as_f64()?;
    let in_range = frames >= i64::MIN as f64 && frames < i64::MAX as f64;
    (frames.fract() == 0.0 && in_range).then_some(frames as i64)
}

fn drop_unless(fields: &mut Map<String, Value>, key: &str, keep: impl Fn(&Value) -> bool) {
    if fields.get(key).is_some_and(|value| !keep(value)) {
        fields.remove(key);
    }
}
