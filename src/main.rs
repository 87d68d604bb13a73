// src/main.rs

mod config;
mod dedup_cache;
mod geometry;
mod rules;
mod track_store;
mod types;
mod violation_engine;

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

use types::{Config, DetectionRecord, FrameBatch, Violation, ViolationKind};
use violation_engine::ViolationEngine;

/// Traffic violation detection over tracked detection streams.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Tracker detection dump to replay (JSONL, one frame batch per line)
    #[arg(long)]
    input: PathBuf,

    /// YAML configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for violation and detection-record output
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Seed for the helmet-fallback RNG, for reproducible replays
    #[arg(long)]
    seed: Option<u64>,

    /// Treat the whole stream as running under a red light phase
    #[arg(long)]
    red_light: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(&path.to_string_lossy())?,
        None => Config::default(),
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(format!("violation_detection={}", level))
        .init();

    info!("🚦 Traffic Violation Detection Starting");
    info!(
        "Thresholds: speed={:.0} km/h (x{:.1}), calibration={:.2} m/px, flow={}",
        config.detector.speed_threshold_kmh,
        config.detector.speed_multiplier,
        config.detector.meters_per_pixel,
        config.zones.expected_direction
    );

    let mut engine = match args.seed {
        Some(seed) => ViolationEngine::with_seeded_rng(config, seed)?,
        None => ViolationEngine::new(config)?,
    };
    engine.set_red_light(args.red_light);
    info!("✓ Violation engine ready");

    match process_stream(&args, &mut engine) {
        Ok(stats) => {
            print_final_report(&stats, &engine);
            Ok(())
        }
        Err(e) => {
            error!("Failed to process stream: {}", e);
            Err(e)
        }
    }
}

struct StreamStats {
    frames: u64,
    skipped_lines: u64,
    violations_by_kind: HashMap<ViolationKind, u64>,
}

fn process_stream(args: &Args, engine: &mut ViolationEngine) -> Result<StreamStats> {
    let reader = BufReader::new(
        File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?,
    );

    std::fs::create_dir_all(&args.output)?;
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "stream".to_string());
    let violations_path = args.output.join(format!("{}_violations.jsonl", stem));
    let records_path = args.output.join(format!("{}_detections.jsonl", stem));
    let mut violations_file = File::create(&violations_path)?;
    let mut records_file = File::create(&records_path)?;
    info!("💾 Violations will be written to: {}", violations_path.display());

    let mut stats = StreamStats {
        frames: 0,
        skipped_lines: 0,
        violations_by_kind: HashMap::new(),
    };

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let batch: FrameBatch = match serde_json::from_str(&line) {
            Ok(b) => b,
            Err(e) => {
                warn!("Skipping malformed batch on line {}: {}", line_no + 1, e);
                stats.skipped_lines += 1;
                continue;
            }
        };

        stats.frames += 1;

        // Replayed dumps carry no pixel data; the helmet heuristic runs on
        // its fallback path.
        let violations = engine.process_frame(None, &batch.detections, batch.timestamp);

        for violation in &violations {
            *stats
                .violations_by_kind
                .entry(violation.kind)
                .or_insert(0) += 1;
            save_violation(violation, &mut violations_file)?;
        }
        for record in engine.drain_new_records() {
            save_detection_record(&record, &mut records_file)?;
        }

        if stats.frames % 100 == 0 {
            info!(
                "Progress: {} frames | {} track(s) live | {} violation(s) total",
                stats.frames,
                engine.tracked_count(),
                engine.violations_emitted
            );
        }
    }

    Ok(stats)
}

fn save_violation(violation: &Violation, file: &mut File) -> Result<()> {
    let json_line = serde_json::to_string(violation)?;
    writeln!(file, "{}", json_line)?;
    file.flush()?;
    Ok(())
}

fn save_detection_record(record: &DetectionRecord, file: &mut File) -> Result<()> {
    let json_line = serde_json::to_string(record)?;
    writeln!(file, "{}", json_line)?;
    file.flush()?;
    Ok(())
}

fn print_final_report(stats: &StreamStats, engine: &ViolationEngine) {
    info!("\n📊 Final Report:");
    info!("  Frames processed: {}", stats.frames);
    if stats.skipped_lines > 0 {
        warn!("  Malformed batches skipped: {}", stats.skipped_lines);
    }

    info!("  Violations: {}", engine.violations_emitted);
    let mut kinds: Vec<_> = stats.violations_by_kind.iter().collect();
    kinds.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
    for (kind, count) in kinds {
        info!("    {}: {}", kind, count);
    }

    info!("  Objects seen:");
    let mut counts: Vec<_> = engine.class_counts().iter().collect();
    counts.sort_by_key(|(_, count)| std::cmp::Reverse(**count));
    for (class_name, count) in counts {
        info!("    {}: {}", class_name, count);
    }
}
