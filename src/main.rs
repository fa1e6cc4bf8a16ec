use anyhow::{Context, Result};
use clap::Parser;
use mkvsub::config::{AudioFormat, Config, VideoFormat};
use mkvsub::interactive::{default_output_dir, run_interactive_wizard};
use mkvsub::media::Ffmpeg;
use mkvsub::pipeline::{
    print_summary, write_artifacts, Operations, Orchestrator, ProcessOptions, ProcessOutcome,
};
use mkvsub::tracks::MkvToolNix;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mkvsub")]
#[command(version, about = "Extract subtitles and audio from Matroska files")]
#[command(long_about = "Extract subtitle and audio tracks from MKV files with mkvtoolnix, convert ASS subtitles to SRT, translate them, and transcode audio or video with FFmpeg.")]
struct Cli {
    /// Input Matroska file (prompted for in interactive mode when omitted)
    input: Option<PathBuf>,

    /// Directory for the produced files (defaults to the input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Extract subtitle tracks (ASS tracks are also converted to SRT)
    #[arg(short, long)]
    subtitles: bool,

    /// Extract and transcode audio tracks
    #[arg(short, long)]
    audio: bool,

    /// Transcode the whole video
    #[arg(long)]
    video: bool,

    /// Translate extracted subtitles to this language (e.g. "Spanish")
    #[arg(short, long)]
    translate: Option<String>,

    /// Audio format: mp3, aac, flac, opus, wav
    #[arg(long)]
    audio_format: Option<String>,

    /// Video format: mp4, mkv, webm
    #[arg(long)]
    video_format: Option<String>,

    /// Video resolution: 480p, 720p, 1080p or original
    #[arg(short, long, default_value = "original")]
    resolution: String,

    /// Run the interactive wizard
    #[arg(short, long)]
    interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn operations(&self) -> Operations {
        Operations {
            extract_subtitles: self.subtitles,
            extract_audio: self.audio,
            convert_video: self.video,
        }
    }

    fn options(&self, config: &Config) -> Result<ProcessOptions> {
        let mut options = ProcessOptions::from_config(config);

        if let Some(format) = &self.audio_format {
            options.audio_format = format
                .parse::<AudioFormat>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        if let Some(format) = &self.video_format {
            options.video_format = format
                .parse::<VideoFormat>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        options.resolution = self.resolution.clone();
        options.translate_to = self.translate.clone();

        Ok(options)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn check_tools(config: &Config, operations: &Operations) -> Result<()> {
    if operations.extract_subtitles || operations.extract_audio {
        MkvToolNix::from_config(config)
            .check()
            .context("mkvtoolnix is required for track extraction")?;
    }
    if operations.extract_audio || operations.convert_video {
        Ffmpeg::from_config(config)
            .check()
            .context("FFmpeg is required for audio and video transcoding")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;

    let (input, output_dir, operations, options, config) =
        if cli.interactive || cli.operations().is_empty() {
            let result = run_interactive_wizard(config, cli.input.clone())?;
            let output_dir = cli.output_dir.clone().unwrap_or(result.output_dir);
            (
                result.input,
                output_dir,
                result.operations,
                result.options,
                result.config,
            )
        } else {
            let input = cli
                .input
                .clone()
                .context("An input file is required unless --interactive is used")?;
            let output_dir = cli
                .output_dir
                .clone()
                .unwrap_or_else(|| default_output_dir(&input));
            let options = cli.options(&config)?;
            (input, output_dir, cli.operations(), options, config)
        };

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    config
        .validate()
        .context("Configuration validation failed")?;
    check_tools(&config, &operations)?;

    if let Some(language) = &options.translate_to {
        if !config.languages.contains(language) {
            warn!(
                "Unknown language '{}', translating to English instead",
                language
            );
        }
    }

    info!("Input:      {}", input.display());
    info!("Output dir: {}", output_dir.display());

    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, stopping after the current step...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let orchestrator = Orchestrator::from_config(config)
        .with_progress(true)
        .with_cancel_flag(cancelled);

    let outcome = orchestrator
        .process(&input, operations, &options)
        .await
        .context("Processing failed")?;

    match outcome {
        ProcessOutcome::Artifacts {
            artifacts,
            failures,
        } => {
            let written = write_artifacts(&output_dir, &artifacts)
                .with_context(|| format!("Failed to write files to {}", output_dir.display()))?;
            print_summary(&written, &failures);
        }
        ProcessOutcome::Diagnostic(diagnostic) => {
            println!();
            print!("{}", diagnostic);
        }
    }

    Ok(())
}
