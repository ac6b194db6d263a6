//! Cutline CLI Tool
//!
//! Command-line interface for validating, inspecting and editing cutline
//! timeline documents.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cutline_core::{
    compose_frame, seconds_to_frames, validate_with, CheckConfig, Error as CoreError, OverlayPlacement, Timeline,
    UntrustedTimeline, ValidationReport,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cutline")]
#[command(about = "Cutline - frame-accurate timeline validation and editing")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a timeline document
    Validate {
        /// Timeline JSON file ("-" for stdin)
        input: PathBuf,

        /// Write the committed timeline in canonical form
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        check: CheckArgs,
    },

    /// Print stats, findings and recommendations
    Health {
        /// Timeline JSON file ("-" for stdin)
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        check: CheckArgs,
    },

    /// Apply one editing operation
    Edit {
        /// Timeline JSON file ("-" for stdin)
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the result even if it fails validation
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        check: CheckArgs,

        #[command(subcommand)]
        operation: EditOp,
    },

    /// Show the visible clips and their effect state at one frame
    Frame {
        /// Timeline JSON file ("-" for stdin)
        input: PathBuf,

        /// Global frame number
        #[arg(long, conflicts_with = "seconds", required_unless_present = "seconds")]
        frame: Option<i64>,

        /// Time in seconds, converted with the project frame rate
        #[arg(long)]
        seconds: Option<f64>,
    },

    /// Show a short summary of a timeline
    Info {
        /// Timeline JSON file ("-" for stdin)
        input: PathBuf,
    },
}

/// Validator thresholds
#[derive(Args)]
struct CheckArgs {
    /// Frame rates above this are reported
    #[arg(long, default_value = "120")]
    max_fps: u32,

    /// Longest gap between clips, in frames
    #[arg(long, default_value = "90")]
    max_gap: i64,

    /// Longest media clip, in frames
    #[arg(long, default_value = "54000")]
    max_media_clip: i64,

    /// Smallest font size not reported
    #[arg(long, default_value = "12")]
    min_font_size: f64,

    /// Mean clip duration below which longer clips are suggested
    #[arg(long, default_value = "60")]
    min_mean_clip: f64,
}

impl From<&CheckArgs> for CheckConfig {
    fn from(args: &CheckArgs) -> Self {
        CheckConfig {
            max_fps: args.max_fps,
            max_gap_frames: args.max_gap,
            max_media_clip_frames: args.max_media_clip,
            min_font_size: args.min_font_size,
            min_mean_clip_frames: args.min_mean_clip,
        }
    }
}

#[derive(Subcommand)]
enum EditOp {
    /// Cut a clip in two
    Split {
        #[arg(long)]
        clip: String,
        #[arg(long)]
        at: i64,
    },

    /// Move a clip's start, keeping its end
    TrimStart {
        #[arg(long)]
        clip: String,
        #[arg(long)]
        frame: i64,
    },

    /// Move a clip's end, keeping its start
    TrimEnd {
        #[arg(long)]
        clip: String,
        #[arg(long)]
        frame: i64,
    },

    /// Keep only a range of a clip
    Extract {
        #[arg(long)]
        clip: String,
        #[arg(long)]
        start: i64,
        #[arg(long)]
        end: i64,
    },

    /// Cut a range out of a clip
    RemoveSegment {
        #[arg(long)]
        clip: String,
        #[arg(long)]
        start: i64,
        #[arg(long)]
        end: i64,
    },

    /// Join clips on one track into one
    Join {
        #[arg(long, value_delimiter = ',', required = true)]
        clips: Vec<String>,
    },

    /// Merge video clips with fades
    Merge {
        #[arg(long, value_delimiter = ',', required = true)]
        clips: Vec<String>,
        #[arg(long, default_value = "30")]
        crossfade: i64,
    },

    /// Put clips back to back and combine them
    Concatenate {
        #[arg(long, value_delimiter = ',', required = true)]
        clips: Vec<String>,
    },

    /// Put clips back to back
    Pack {
        #[arg(long, value_delimiter = ',', required = true)]
        clips: Vec<String>,
    },

    /// Move a clip, optionally onto another track
    Move {
        #[arg(long)]
        clip: String,
        #[arg(long)]
        start: i64,
        #[arg(long)]
        track: Option<String>,
    },

    /// Copy a clip to another position
    Duplicate {
        #[arg(long)]
        clip: String,
        #[arg(long)]
        start: i64,
    },

    /// Remove a clip
    RemoveClip {
        #[arg(long)]
        clip: String,
    },

    /// Add a fade-in to a clip
    FadeIn {
        #[arg(long)]
        clip: String,
        #[arg(long, default_value = "30")]
        frames: i64,
    },

    /// Add a fade-out to a clip
    FadeOut {
        #[arg(long)]
        clip: String,
        #[arg(long, default_value = "30")]
        frames: i64,
    },

    /// Replace the text of matching text clips
    ChangeText {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Recolor all text clips
    TextColor {
        #[arg(long)]
        color: String,
    },

    /// Add a text overlay
    Overlay {
        #[arg(long)]
        text: String,
        #[arg(long, value_enum, default_value = "beginning")]
        at: Placement,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Placement {
    Beginning,
    Middle,
    End,
}

impl From<Placement> for OverlayPlacement {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Beginning => OverlayPlacement::Beginning,
            Placement::Middle => OverlayPlacement::Middle,
            Placement::End => OverlayPlacement::End,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate { input, output, check } => validate_file(&input, output.as_deref(), &check)?,
        Commands::Health { input, json, check } => health_file(&input, json, &check)?,
        Commands::Edit {
            input,
            output,
            force,
            check,
            operation,
        } => edit_file(&input, output.as_deref(), force, &check, operation)?,
        Commands::Frame { input, frame, seconds } => frame_info(&input, frame, seconds)?,
        Commands::Info { input } => print_info(&read_timeline(&input)?),
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn read_timeline(input: &Path) -> Result<Timeline> {
    let timeline = if input == Path::new("-") {
        Timeline::read(io::stdin().lock()).context("Failed to parse timeline from stdin")?
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        Timeline::read(BufReader::new(file))
            .with_context(|| format!("Failed to parse timeline {}", input.display()))?
    };
    log::debug!("read {} tracks from {}", timeline.tracks.len(), input.display());
    Ok(timeline)
}

/// Reads a document leniently; unreadable fields show up in the report
fn read_untrusted(input: &Path) -> Result<UntrustedTimeline> {
    let untrusted = if input == Path::new("-") {
        UntrustedTimeline::read(io::stdin().lock()).context("Failed to parse timeline from stdin")?
    } else {
        let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
        UntrustedTimeline::read(BufReader::new(file))
            .with_context(|| format!("Failed to parse timeline {}", input.display()))?
    };
    log::debug!("read {} tracks from {}", untrusted.timeline().tracks.len(), input.display());
    Ok(untrusted)
}

fn write_timeline(timeline: &Timeline, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            timeline.write(&mut writer).context("Failed to write timeline")?;
            writer.flush().context("Failed to write timeline")?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            timeline.write(stdout.lock()).context("Failed to write timeline")?;
        }
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        eprintln!("error: {}", error);
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    eprintln!("{} error(s), {} warning(s)", report.errors.len(), report.warnings.len());
}

fn validate_file(input: &Path, output: Option<&Path>, check: &CheckArgs) -> Result<()> {
    let untrusted = read_untrusted(input)?;

    match untrusted.commit_with(&CheckConfig::from(check)) {
        Ok(committed) => {
            print_report(&ValidationReport {
                errors: Vec::new(),
                warnings: committed.warnings().to_vec(),
            });
            println!("{}: valid", input.display());
            if let Some(output) = output {
                write_timeline(&committed, Some(output))?;
            }
            Ok(())
        }
        Err(CoreError::Rejected(report)) => {
            print_report(&report);
            bail!("{}: timeline has {} validation error(s)", input.display(), report.errors.len())
        }
        Err(err) => bail!("{}: {}", input.display(), err),
    }
}

fn health_file(input: &Path, json: bool, check: &CheckArgs) -> Result<()> {
    let report = read_untrusted(input)?.health(&CheckConfig::from(check));

    if json {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, &report).context("Failed to write report")?;
        writeln!(out)?;
        return Ok(());
    }

    println!("\n=== Timeline Health ===");
    println!("Healthy: {}", if report.is_healthy { "yes" } else { "no" });
    println!("Tracks: {}", report.stats.track_count);
    println!("Clips: {}", report.stats.clip_count);
    for (kind, count) in &report.stats.clips_by_kind {
        println!("  {}: {}", kind, count);
    }
    println!(
        "Duration: {} frames ({:.2} seconds)",
        report.stats.total_duration_frames, report.stats.total_duration_seconds
    );
    println!("Mean clip duration: {:.1} frames", report.stats.mean_clip_duration_frames);

    if !report.validation.errors.is_empty() {
        println!("\n=== Errors ===");
        for error in &report.validation.errors {
            println!("  {}", error);
        }
    }
    if !report.validation.warnings.is_empty() {
        println!("\n=== Warnings ===");
        for warning in &report.validation.warnings {
            println!("  {}", warning);
        }
    }
    if !report.recommendations.is_empty() {
        println!("\n=== Recommendations ===");
        for recommendation in &report.recommendations {
            println!("  - {}", recommendation);
        }
    }

    Ok(())
}

fn apply(timeline: &Timeline, operation: EditOp) -> cutline_core::Result<Timeline> {
    match operation {
        EditOp::Split { clip, at } => timeline.split_at(&clip, at),
        EditOp::TrimStart { clip, frame } => timeline.trim_start(&clip, frame),
        EditOp::TrimEnd { clip, frame } => timeline.trim_end(&clip, frame),
        EditOp::Extract { clip, start, end } => timeline.extract_range(&clip, start, end),
        EditOp::RemoveSegment { clip, start, end } => timeline.remove_segment(&clip, start, end),
        EditOp::Join { clips } => timeline.join(&clips),
        EditOp::Merge { clips, crossfade } => timeline.merge_with_crossfade(&clips, crossfade),
        EditOp::Concatenate { clips } => timeline.concatenate(&clips),
        EditOp::Pack { clips } => timeline.pack_sequential(&clips),
        EditOp::Move { clip, start, track } => timeline.move_to(&clip, start, track.as_deref()),
        EditOp::Duplicate { clip, start } => timeline.duplicate_at(&clip, start),
        EditOp::RemoveClip { clip } => timeline.remove_clip(&clip),
        EditOp::FadeIn { clip, frames } => timeline.add_fade_in(&clip, frames),
        EditOp::FadeOut { clip, frames } => timeline.add_fade_out(&clip, frames),
        EditOp::ChangeText { from, to } => Ok(timeline.change_text(&from, &to)),
        EditOp::TextColor { color } => Ok(timeline.change_text_color(&color)),
        EditOp::Overlay { text, at } => Ok(timeline.add_text_overlay(&text, at.into())),
    }
}

fn edit_file(
    input: &Path,
    output: Option<&Path>,
    force: bool,
    check: &CheckArgs,
    operation: EditOp,
) -> Result<()> {
    let timeline = read_timeline(input)?;
    let edited = apply(&timeline, operation).context("Edit failed")?;

    let report = validate_with(&edited, &CheckConfig::from(check));
    if !report.is_valid() {
        print_report(&report);
        if !force {
            bail!("Edited timeline has validation errors; use --force to write it anyway");
        }
        log::warn!("writing timeline with {} validation error(s)", report.errors.len());
    } else if !report.warnings.is_empty() {
        print_report(&report);
    }

    write_timeline(&edited, output)
}

fn frame_info(input: &Path, frame: Option<i64>, seconds: Option<f64>) -> Result<()> {
    let timeline = read_timeline(input)?;
    let frame = match (frame, seconds) {
        (Some(frame), _) => frame,
        (None, Some(seconds)) => seconds_to_frames(seconds, timeline.fps()),
        (None, None) => bail!("Either --frame or --seconds is required"),
    };

    let layers = compose_frame(&timeline, frame);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &layers).context("Failed to write frame state")?;
    writeln!(out)?;
    Ok(())
}

fn print_info(timeline: &Timeline) {
    let settings = timeline.settings();
    println!("\n=== Timeline Information ===");
    match timeline.project {
        Some(_) => println!("Resolution: {}x{}", settings.width, settings.height),
        None => println!("Resolution: {}x{} (project settings missing)", settings.width, settings.height),
    }
    println!("Frame rate: {} fps", settings.fps);
    println!(
        "Duration: {} frames ({:.2} seconds)",
        timeline.total_duration_frames(),
        timeline.total_duration_seconds()
    );
    println!("Tracks: {}", timeline.tracks.len());
    println!("Clips: {}", timeline.clip_count());

    println!("\n=== Tracks ===");
    for track in &timeline.tracks {
        println!("  {} ({}): {} clip(s), ends at frame {}", track.id, track.kind, track.clips.len(), track.end());
        for clip in track.clips_by_start().into_iter().take(10) {
            println!(
                "    {} {} [{}, {})",
                clip.id,
                clip.kind,
                clip.start_in_frames,
                clip.end()
            );
        }
        if track.clips.len() > 10 {
            println!("    ... and {} more clips", track.clips.len() - 10);
        }
    }
}
