//! rid-feeder: Replays recorded 802.11 captures through the remote ID
//! decoders and reports the tracked aircraft.
//!
//! Supports:
//! - Decoding a whole capture file and printing the final table
//! - Replaying a capture with a producer thread and a periodic reporter

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, Table};
use serde::Serialize;

use rid_core::config::{self, Config, ReportFormat};
use rid_core::types::mac_to_string;
use rid_core::{DispatchStats, Dispatcher, RawFrame, TrackedEntry, Tracker};

mod capture;

use capture::{CapturedFrame, FrameReader};

#[derive(Parser)]
#[command(
    name = "rid-feeder",
    version,
    about = "WiFi drone remote ID decoding and tracking"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.rid-scan/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Regular tracking slots
    #[arg(long, global = true)]
    capacity: Option<usize>,

    /// Seconds of silence before an entry is evicted
    #[arg(long, global = true)]
    stale_timeout: Option<f64>,

    /// Drop every field of a French element whose version is not 1
    #[arg(long, global = true)]
    discard_mismatched: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a capture file and print the final tracking table
    Decode {
        /// Capture file, one `[timestamp] [rssi] HEX` frame per line
        file: PathBuf,

        /// Also print dispatch counters
        #[arg(short, long)]
        stats: bool,
    },
    /// Replay a capture, reporting updates as they happen
    Replay {
        /// Capture file, one `[timestamp] [rssi] HEX` frame per line
        file: PathBuf,

        /// Reporter period in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Overflow-slot heartbeat period in milliseconds (0 disables)
        #[arg(long)]
        heartbeat_ms: Option<u64>,

        /// Output format for updates
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Playback speed relative to capture time (unpaced if omitted)
        #[arg(long)]
        rate: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Table,
}

impl From<FormatArg> for ReportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Table => ReportFormat::Table,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    init_logging(&config, cli.verbose);

    if let Some(capacity) = cli.capacity {
        config.tracker.capacity = capacity;
    }
    if let Some(timeout) = cli.stale_timeout {
        config.tracker.stale_timeout_secs = timeout;
    }
    if cli.discard_mismatched {
        config.tracker.french_version_policy = rid_core::FrenchVersionPolicy::Discard;
    }

    match cli.command {
        Commands::Decode { file, stats } => cmd_decode(&config, file, stats),
        Commands::Replay {
            file,
            interval_ms,
            heartbeat_ms,
            format,
            rate,
        } => {
            if let Some(ms) = interval_ms {
                config.report.interval_ms = ms;
            }
            if let Some(ms) = heartbeat_ms {
                config.report.heartbeat_ms = ms;
            }
            if let Some(f) = format {
                config.report.format = f.into();
            }
            cmd_replay(&config, file, rate)
        }
    }
}

fn init_logging(config: &Config, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => config.log_level.parse().unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    builder.parse_env("RUST_LOG");
    builder.init();
}

fn read_frames(file: &Path) -> Vec<CapturedFrame> {
    match FrameReader::new(file).read_all() {
        Ok(frames) => frames,
        Err(e) => {
            eprintln!("Error reading {}: {e}", file.display());
            std::process::exit(1);
        }
    }
}

fn build_dispatcher(config: &Config) -> Dispatcher {
    let tracker = Arc::new(Tracker::new(
        config.tracker.capacity,
        config.tracker.stale_timeout_secs,
    ));
    Dispatcher::new(tracker).french_policy(config.tracker.french_version_policy)
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

fn cmd_decode(config: &Config, file: PathBuf, show_stats: bool) {
    let frames = read_frames(&file);
    eprintln!("Decoding: {} ({} frames)", file.display(), frames.len());

    let mut dispatcher = build_dispatcher(config);
    let mut now = 0.0f64;
    for f in &frames {
        dispatcher.dispatch(&RawFrame::new(&f.data, f.rssi, f.timestamp));
        now = now.max(f.timestamp);
    }

    let tracker = dispatcher.tracker();
    let evicted = tracker.sweep(now);
    if evicted > 0 {
        eprintln!("{evicted} stale entries evicted");
    }

    let mut entries = tracker.occupied();
    entries.sort_by(|a, b| b.last_seen.total_cmp(&a.last_seen));
    let sentinel = tracker.sentinel();

    if entries.is_empty() && sentinel.last_seen == 0.0 {
        println!("No remote ID transmitters found.");
    } else {
        println!("{}", render_table(&entries, Some(&sentinel)));
    }

    if show_stats {
        print_stats(&dispatcher.stats());
    }
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

/// One reported update.
#[derive(Serialize)]
struct Update<'a> {
    overflow: bool,
    #[serde(flatten)]
    entry: &'a TrackedEntry,
}

fn cmd_replay(config: &Config, file: PathBuf, rate: Option<f64>) {
    let frames = read_frames(&file);
    eprintln!("Replaying: {} ({} frames)", file.display(), frames.len());

    let mut dispatcher = build_dispatcher(config);
    let tracker = Arc::clone(dispatcher.tracker());
    // Capture time of the newest dispatched frame, as f64 bits.
    let clock = Arc::new(AtomicU64::new(0f64.to_bits()));
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let clock = Arc::clone(&clock);
        let done = Arc::clone(&done);
        let pace = rate.filter(|r| *r > 0.0);
        thread::spawn(move || {
            let mut prev: Option<f64> = None;
            for f in &frames {
                if let (Some(rate), Some(prev)) = (pace, prev) {
                    let gap = (f.timestamp - prev).max(0.0) / rate;
                    match Duration::try_from_secs_f64(gap) {
                        Ok(d) if !d.is_zero() => thread::sleep(d),
                        Ok(_) => {}
                        Err(e) => log::warn!("not pacing a {gap}s gap: {e}"),
                    }
                }
                prev = Some(f.timestamp);
                dispatcher.dispatch(&RawFrame::new(&f.data, f.rssi, f.timestamp));
                let latest = f64::from_bits(clock.load(Ordering::Relaxed)).max(f.timestamp);
                clock.store(latest.to_bits(), Ordering::Relaxed);
            }
            done.store(true, Ordering::Release);
            dispatcher.stats()
        })
    };

    let interval = Duration::from_millis(config.report.interval_ms.max(1));
    let mut heartbeat = Heartbeat::new(config.report.heartbeat_ms, config.report.interval_ms);
    loop {
        let finished = done.load(Ordering::Acquire);
        let now = f64::from_bits(clock.load(Ordering::Relaxed));
        if heartbeat.tick() {
            tracker.heartbeat(now);
        }
        report(&tracker, config.report.format, now);
        let evicted = tracker.sweep(now);
        if evicted > 0 {
            log::debug!("{evicted} stale entries evicted at t={now:.3}");
        }
        if finished {
            break;
        }
        thread::sleep(interval);
    }

    match producer.join() {
        Ok(stats) => print_stats(&stats),
        Err(_) => {
            eprintln!("Error: producer thread panicked");
            std::process::exit(1);
        }
    }
}

/// Counts reporter ticks between overflow-slot heartbeats.
struct Heartbeat {
    every: Option<u64>,
    ticks: u64,
}

impl Heartbeat {
    fn new(heartbeat_ms: u64, interval_ms: u64) -> Self {
        let every = (heartbeat_ms > 0).then(|| (heartbeat_ms / interval_ms.max(1)).max(1));
        Heartbeat { every, ticks: 0 }
    }

    /// True on the first tick of each period.
    fn tick(&mut self) -> bool {
        let Some(every) = self.every else {
            return false;
        };
        let due = self.ticks % every == 0;
        self.ticks += 1;
        due
    }
}

/// Drain dirty entries, then write them once the table lock is released.
fn report(tracker: &Tracker, format: ReportFormat, now: f64) {
    let mut updated = Vec::new();
    tracker.for_each_dirty(|entry| updated.push(*entry));
    if let Err(e) = write_updates(&mut io::stdout().lock(), &updated, format, now) {
        log::warn!("failed to write updates: {e}");
    }
}

fn write_updates<W: Write>(
    out: &mut W,
    updated: &[TrackedEntry],
    format: ReportFormat,
    now: f64,
) -> io::Result<()> {
    if updated.is_empty() {
        return Ok(());
    }
    match format {
        ReportFormat::Json => {
            for entry in updated {
                let update = Update {
                    overflow: entry.is_free(),
                    entry,
                };
                serde_json::to_writer(&mut *out, &update)?;
                writeln!(out)?;
            }
        }
        ReportFormat::Table => {
            writeln!(out, "t={now:.3}")?;
            writeln!(out, "{}", render_table(updated, None))?;
        }
    }
    out.flush()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_table(entries: &[TrackedEntry], sentinel: Option<&TrackedEntry>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Address", "Operator", "UAV", "Lat", "Lon", "Alt (m)", "Hgt (m)", "Speed", "Hdg",
        "Op Lat", "Op Lon", "RSSI", "Last Seen",
    ]);

    for entry in entries {
        table.add_row(entry_row(entry));
    }
    if let Some(s) = sentinel.filter(|s| s.last_seen > 0.0) {
        table.add_row(entry_row(s));
    }
    table
}

fn entry_row(entry: &TrackedEntry) -> Vec<Cell> {
    let address = if entry.is_free() {
        "(overflow)".to_string()
    } else {
        mac_to_string(&entry.address)
    };
    let id = |s: &rid_core::IdString| {
        if s.is_empty() {
            "-".to_string()
        } else {
            s.to_string()
        }
    };
    let pos = entry.position;
    let op = entry.operator_location;
    let fmt = |v: Option<f64>, prec: usize| {
        v.map(|x| format!("{x:.prec$}")).unwrap_or("-".into())
    };

    vec![
        Cell::new(address),
        Cell::new(id(&entry.operator_id)),
        Cell::new(id(&entry.uav_id)),
        Cell::new(fmt(pos.map(|p| p.lat), 5)),
        Cell::new(fmt(pos.map(|p| p.lon), 5)),
        Cell::new(fmt(pos.map(|p| p.altitude_msl_m), 1)),
        Cell::new(fmt(pos.map(|p| p.height_agl_m), 1)),
        Cell::new(fmt(pos.map(|p| p.speed_mps), 1)),
        Cell::new(fmt(pos.map(|p| p.heading_deg), 0)),
        Cell::new(fmt(op.map(|o| o.lat), 5)),
        Cell::new(fmt(op.map(|o| o.lon), 5)),
        Cell::new(entry.rssi),
        Cell::new(format!("{:.3}", entry.last_seen)),
    ]
}

fn print_stats(stats: &DispatchStats) {
    eprintln!(
        "{} frames: {} beacons, {} action, {} ignored",
        stats.frames, stats.beacons, stats.action_frames, stats.ignored
    );
    eprintln!(
        "French elements: {} ({} version mismatches); open-standard: {} decoded, {} failed",
        stats.french_elements,
        stats.french_version_mismatches,
        stats.odid_decodes,
        stats.odid_failures
    );
    if stats.overflow > 0 {
        eprintln!("{} frames attributed to the overflow slot", stats.overflow);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
