use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::de::DeserializeOwned;
use timelane_core::{Timeline, TimelineConfig};
use timelane_protocol::{TimelineData, TrackId};

/// Lay out a timeline dataset for one viewport and print the frame as JSON.
#[derive(Parser, Debug)]
#[command(name = "timelane", version, about, long_about = None)]
struct Cli {
    /// Dataset JSON (casts, buffs, debuffs, damage, resources, phases)
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// Engine config JSON; missing fields take their defaults
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Visible window in seconds
    #[arg(long = "range", value_names = ["START", "END"], num_args = 2, allow_negative_numbers = true)]
    range: Option<Vec<f64>>,

    /// Show the whole dataset
    #[arg(long = "fit", conflicts_with = "range")]
    fit: bool,

    /// Zoom factor applied around the window center after the range
    #[arg(short = 'z', long = "zoom", value_name = "FACTOR")]
    zoom: Option<f64>,

    /// Container width in pixels
    #[arg(long = "width", default_value_t = 1000.0)]
    width: f64,

    /// Container height in pixels
    #[arg(long = "height", default_value_t = 600.0)]
    height: f64,

    /// Stretch the tracks to the container height
    #[arg(short = 'F', long = "fullscreen")]
    fullscreen: bool,

    /// Collapse a track (phases, casts, buffs, debuffs, damage, resources)
    #[arg(long = "collapse", value_name = "TRACK", value_parser = parse_track)]
    collapse: Vec<TrackId>,

    /// Pretty-print the JSON output
    #[arg(short = 'p', long = "pretty")]
    pretty: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_track(s: &str) -> Result<TrackId, String> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
        .map_err(|_| format!("unknown track `{s}`"))
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let data: TimelineData = load_json(&cli.data)?;
    let config: TimelineConfig = match &cli.config {
        Some(path) => load_json(path)?,
        None => TimelineConfig::default(),
    };

    let mut timeline = Timeline::new(data, config).context("invalid config")?;
    timeline.resize(cli.width, cli.height);
    timeline.set_fullscreen(cli.fullscreen);
    for &track in &cli.collapse {
        if timeline.toggle_track(track) {
            log::warn!("track {track:?} cannot be collapsed");
        }
    }

    if cli.fit {
        timeline.fit_all()?;
    }
    if let Some(range) = &cli.range {
        let [start, end] = range.as_slice() else {
            bail!("--range takes exactly two values");
        };
        timeline
            .zoom_to_range(*start, *end)
            .with_context(|| format!("cannot show [{start}, {end}]"))?;
    }
    if let Some(factor) = cli.zoom {
        timeline.zoom(factor, None)?;
    }

    let frame = timeline.frame();
    log::info!(
        "[{:.2}, {:.2}] {:?} bucket={} casts={} badges={} buffs={} debuffs={}",
        frame.viewport.start,
        frame.viewport.end,
        frame.zoom_level,
        frame.bucket_size,
        frame.casts.markers.len(),
        frame.casts.badges.len(),
        frame.buffs.bars.len(),
        frame.debuffs.bars.len(),
    );

    let mut out = std::io::stdout().lock();
    if cli.pretty {
        serde_json::to_writer_pretty(&mut out, &frame)?;
    } else {
        serde_json::to_writer(&mut out, &frame)?;
    }
    writeln!(out)?;
    Ok(())
}
