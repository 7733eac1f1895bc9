//! detect_animals - scan a video for wildlife and report snapshots as JSON
//!
//! Stdout carries exactly one JSON document on success. Logs, stage progress
//! and the failure document go to stderr.
//!
//! Exit codes: 0 on success, 1 on any failure (including a missing or
//! malformed argument).

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wildlife_watch::report::{failure_report, usage_report};
use wildlife_watch::run::{build_notifier, execute, load_detector, validate_inputs};
use wildlife_watch::{FileSource, RunResult, WatchConfig};

#[path = "../ui.rs"]
mod ui;

const PROGRAM: &str = "detect_animals";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the video file to scan.
    video: Option<PathBuf>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // The web backend parses stdout, so usage errors are reported there.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            log::error!("invalid arguments: {:?}", e.kind());
            println!("{}", usage_report(PROGRAM));
            return ExitCode::from(1);
        }
    };
    let Some(video_path) = args.video else {
        println!("{}", usage_report(PROGRAM));
        return ExitCode::from(1);
    };
    let ui = ui::Ui::from_flag(&args.ui, std::io::stderr().is_terminal());

    let outcome = run(&video_path, &ui).and_then(|result| {
        let json = serde_json::to_string_pretty(&result)?;
        Ok(json)
    });
    match outcome {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("run failed: {:#}", e);
            eprintln!("{}", failure_report(&e));
            ExitCode::from(1)
        }
    }
}

fn run(video_path: &Path, ui: &ui::Ui) -> Result<RunResult> {
    let stage = ui.stage("Load configuration");
    let cfg = WatchConfig::load()?;
    stage.done();

    let stage = ui.stage("Validate inputs");
    validate_inputs(video_path, &cfg.model_path)?;
    stage.done();

    let stage = ui.stage("Load model");
    let mut detector = load_detector(&cfg)?;
    stage.done();

    let stage = ui.stage("Open video");
    let mut source = FileSource::open(video_path)?;
    stage.done();

    let mut notifier = build_notifier(&cfg)?;

    let stage = ui.stage("Process video");
    let result = execute(
        &cfg,
        &video_path.display().to_string(),
        &mut source,
        detector.as_mut(),
        notifier.as_mut(),
    )?;
    stage.done();

    let stats = source.stats();
    log::info!(
        "{} snapshots from {} sampled frames ({} decoded from {})",
        result.total_detections,
        result.video.processed_frames,
        stats.frames_read,
        stats.path
    );
    Ok(result)
}
