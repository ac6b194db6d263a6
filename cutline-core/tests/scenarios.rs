//! End-to-end scenarios: read a document, edit it, validate it, write it.

use cutline_core::{
    compose_frame, health_check, validate, ClipKind, EffectKind, Error, ErrorCategory, IssueCode, OverlayPlacement,
    Timeline, UntrustedTimeline,
};

const DOCUMENT: &str = r##"{
    "project": { "width": 1920, "height": 1080, "fps": 30 },
    "timeline": [
        { "id": "track-1", "type": "video", "clips": [
            { "id": "v1", "assetUrl": "beach.mp4", "startInFrames": 0, "durationInFrames": 150 },
            { "id": "v2", "assetUrl": "sunset.mp4", "startInFrames": 150, "durationInFrames": 150 },
            { "id": "v3", "assetUrl": "waves.mp4", "startInFrames": 300, "durationInFrames": 900 }
        ] },
        { "id": "track-2", "type": "text", "clips": [
            { "id": "t1", "text": "Hello", "startInFrames": 0, "durationInFrames": 60,
              "style": { "fontFamily": "Arial", "fontSize": 48, "fontWeight": "bold", "color": "#FFF" } },
            { "id": "t2", "text": "World", "startInFrames": 60, "durationInFrames": 60,
              "style": { "fontFamily": "Arial", "fontSize": 48, "fontWeight": "bold", "color": "#FFF" } }
        ] }
    ]
}"##;

fn document() -> Timeline {
    Timeline::from_json_str(DOCUMENT).unwrap()
}

#[test]
fn split_remove_and_merge_scenarios() {
    let timeline = document();

    let split = timeline.split_at("v1", 90).unwrap();
    let video: Vec<(i64, i64)> = split.tracks[0]
        .clips
        .iter()
        .map(|c| (c.start_in_frames, c.duration_in_frames))
        .collect();
    assert_eq!(&video[..2], &[(0, 90), (90, 60)]);

    let removed = timeline.remove_segment("v3", 600, 750).unwrap();
    let video: Vec<(i64, i64)> = removed.tracks[0].clips.iter().map(|c| (c.start_in_frames, c.end())).collect();
    assert_eq!(video, vec![(0, 150), (150, 300), (300, 600), (750, 1200)]);

    let merged = timeline.merge_with_crossfade(&["v1", "v2"], 30).unwrap();
    let first = &merged.tracks[0].clips[0];
    assert_eq!((first.start_in_frames, first.end()), (0, 270));
    assert!(first.has_effect(&EffectKind::FadeIn));
    assert!(first.has_effect(&EffectKind::FadeOut));
    assert_eq!(merged.tracks[0].clips[1].id, "v3");
}

#[test]
fn join_text_and_write_back() {
    let joined = document().join(&["t1", "t2"]).unwrap();
    let text = &joined.tracks[1].clips[0];
    assert_eq!(text.text.as_deref(), Some("Hello World"));
    assert_eq!(text.kind, ClipKind::Text);

    let mut buffer = Vec::new();
    joined.write(&mut buffer).unwrap();
    let reread = Timeline::read(buffer.as_slice()).unwrap();
    assert_eq!(reread, joined);
}

#[test]
fn edit_errors_carry_categories() {
    let timeline = document();
    let not_found = timeline.split_at("missing", 10).unwrap_err();
    assert_eq!(not_found.category(), ErrorCategory::NotFound);

    let range = timeline.trim_end("v1", 0).unwrap_err();
    assert_eq!(range.category(), ErrorCategory::Range);

    let compat = timeline.join(&["v1", "t1"]).unwrap_err();
    assert!(matches!(compat, Error::ClipsOnDifferentTracks(_)));
    assert_eq!(compat.category(), ErrorCategory::Compatibility);
}

#[test]
fn untrusted_reply_goes_through_validator() {
    let reply = DOCUMENT.replace("\"assetUrl\": \"sunset.mp4\", ", "");
    let err = UntrustedTimeline::from_json_str(&reply).unwrap().commit().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);

    let committed = UntrustedTimeline::from_json_str(DOCUMENT).unwrap().commit().unwrap();
    assert!(committed.warnings().is_empty());
    let with_overlay = committed.add_text_overlay("Summer", OverlayPlacement::End);
    assert!(validate(&with_overlay).is_valid());
}

#[test]
fn health_and_frames() {
    let timeline = document().add_fade_in("v1", 30).unwrap();
    let report = health_check(&timeline);
    assert!(report.is_healthy);
    assert_eq!(report.stats.clip_count, 5);
    assert_eq!(report.stats.total_duration_frames, 1200);

    let layers = compose_frame(&timeline, 15);
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].clip_id, "v1");
    assert_eq!(layers[0].state.opacity, 0.5);
    assert_eq!(layers[1].clip_id, "t1");

    let moved = timeline.move_to("v2", 100, None).unwrap();
    assert!(validate(&moved).has_warning(IssueCode::OverlappingClips));
}

#[test]
fn sloppy_reply_is_reported_not_refused() {
    let reply = r#"{
        "project": { "width": 1920, "height": 1080, "fps": -30 },
        "timeline": [
            { "id": "track-1", "clips": [
                { "id": "v1", "assetUrl": "beach.mp4", "durationInFrames": 150 },
                { "id": "v2", "assetUrl": "sunset.mp4", "startInFrames": 150.5, "durationInFrames": 150 }
            ] }
        ]
    }"#;
    assert!(Timeline::from_json_str(reply).is_err());

    let untrusted = UntrustedTimeline::read(reply.as_bytes()).unwrap();
    let report = untrusted.check(&Default::default());
    let codes: Vec<IssueCode> = report.errors.iter().map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![
            IssueCode::InvalidFps,
            IssueCode::MissingTrackKind,
            IssueCode::InvalidStart,
            IssueCode::InvalidStart,
        ]
    );
    assert_eq!(report.errors[3].clip_id.as_deref(), Some("v2"));
    assert_eq!(untrusted.timeline().tracks[0].kind, ClipKind::Video);

    let err = untrusted.commit().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
}
