use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use vidcull::report::{self, FileRecord, JsonlReporter};
use vidcull::{Classifier, DuplicateIndex, FrameHasher, FrameSampler, ScanConfig};

#[derive(Parser, Debug)]
#[command(
    name = "vidcull",
    version,
    about = "Find duplicate videos by comparing sampled frames"
)]
struct Cli {
    /// Directory to scan for video files
    path: PathBuf,

    /// Frames to sample per video
    #[arg(short, long, default_value_t = 10)]
    frames: usize,

    /// Maximum Hamming distance for two frames to count as a match
    #[arg(short = 't', long, default_value_t = 16)]
    threshold: u32,

    /// Minimum fraction of a file's frames that must match a candidate
    #[arg(long, default_value_t = 0.6)]
    match_ratio: f64,

    /// Seconds to skip before sampling starts
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    skip: u64,

    /// Budget for one ffmpeg invocation, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    timeout: u64,

    /// Additional video extensions to scan (repeatable)
    #[arg(long, value_name = "EXT")]
    ext: Vec<String>,

    /// Append one JSON record per scanned file to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.frames > 0, "must sample at least one frame per video");

    let mut config = ScanConfig {
        frame_count: cli.frames,
        hamming_threshold: cli.threshold,
        match_ratio: cli.match_ratio,
        skip_seconds: cli.skip,
        ffmpeg_timeout: Duration::from_secs(cli.timeout),
        ..ScanConfig::default()
    };
    config.add_extensions(&cli.ext);

    run(&cli.path, &config, cli.report.as_deref())
}

fn run(root: &Path, config: &ScanConfig, report_path: Option<&Path>) -> Result<()> {
    println!("▶ Scanning for videos in: {}", root.display());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Discovering video files…");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let files = vidcull::list_video_files(root, &config.extensions)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    spinner.finish_with_message(format!("Found {} video file(s)", files.len()));

    if files.is_empty() {
        println!("No video files found.");
        return Ok(());
    }

    let mut reporter = match report_path {
        Some(path) => Some(
            JsonlReporter::create(path)
                .with_context(|| format!("Failed to open report file {path:?}"))?,
        ),
        None => None,
    };

    let sampler = FrameSampler::new(config.frame_count, config.skip_seconds, config.ffmpeg_timeout);
    let hasher = FrameHasher::new();
    let classifier = Classifier::new(config.hamming_threshold, config.match_ratio);
    let mut index = DuplicateIndex::new();

    let started = Instant::now();
    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{bar:40.green} {pos}/{len} {msg}",
    )?);

    let mut duplicate_files = 0;
    let mut verdict_count = 0;

    for file in &files {
        bar.set_message(
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );

        let sampled = match sampler.sample(file) {
            Ok(sampled) => sampled,
            Err(err) if err.is_fatal() => {
                return Err(err)
                    .with_context(|| format!("Frame sampling broke down at {}", file.display()));
            }
            Err(err) => {
                log::warn!("no usable frames from {}: {err}", file.display());
                Vec::new()
            }
        };

        let fingerprints = hasher.fingerprint_frames(file, &sampled);
        let verdicts = classifier.classify(file, &fingerprints, &mut index);

        let size_bytes = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
        bar.suspend(|| {
            report::print_file_line(file, size_bytes, fingerprints.len());
            for verdict in &verdicts {
                report::print_verdict(verdict);
            }
        });

        if !verdicts.is_empty() {
            duplicate_files += 1;
            verdict_count += verdicts.len();
        }
        if let Some(reporter) = reporter.as_mut() {
            let record = FileRecord::new(file.clone(), size_bytes, fingerprints.len(), verdicts);
            reporter
                .append(&record)
                .context("Failed to write report record")?;
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    report::print_summary(files.len(), duplicate_files, verdict_count, started.elapsed());
    Ok(())
}
