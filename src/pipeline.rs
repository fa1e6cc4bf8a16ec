use crate::config::{AudioFormat, Config, VideoFormat};
use crate::error::{MkvsubError, Result};
use crate::media::{raw_audio_extension, resolution_dimensions, Ffmpeg, TranscodeJob, Transcoder};
use crate::subtitle::convert_ass_to_srt;
use crate::tracks::{parse_report, MkvToolNix, TrackKind, TrackRecord, TrackTool};
use crate::translate::{translate_srt_with_progress, GoogleTranslator, Translator};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

const ASS_CODEC: &str = "S_TEXT/ASS";
const SSA_CODEC: &str = "S_TEXT/SSA";
const SRT_CODEC: &str = "S_TEXT/UTF8";

/// Which parts of the input to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operations {
    pub extract_subtitles: bool,
    pub extract_audio: bool,
    pub convert_video: bool,
}

impl Operations {
    pub fn is_empty(&self) -> bool {
        !(self.extract_subtitles || self.extract_audio || self.convert_video)
    }

    fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.extract_subtitles {
            names.push("subtitles");
        }
        if self.extract_audio {
            names.push("audio");
        }
        if self.convert_video {
            names.push("video");
        }
        names
    }
}

/// Parameters for one request.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Human-readable target language; `None` disables translation.
    pub translate_to: Option<String>,
    pub audio_format: AudioFormat,
    pub video_format: VideoFormat,
    /// `480p`, `720p`, `1080p`; anything else keeps the source size.
    pub resolution: String,
}

impl ProcessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            translate_to: None,
            audio_format: config.audio_format,
            video_format: config.video_format,
            resolution: "original".to_string(),
        }
    }
}

/// A produced file, ready to be handed to the delivery layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl OutputArtifact {
    fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Subtitles,
    Audio,
    Video,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Subtitles => write!(f, "subtitles"),
            Category::Audio => write!(f, "audio"),
            Category::Video => write!(f, "video"),
        }
    }
}

/// A failure that was contained to one category or one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub category: Category,
    pub message: String,
}

/// Explanation returned when a request produced no files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub requested: Operations,
    /// `None` when the category was not requested or its track list could not be read.
    pub subtitle_tracks: Option<usize>,
    pub audio_tracks: Option<usize>,
    pub failures: Vec<StepFailure>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No files were produced.")?;

        let requested = self.requested.names();
        if requested.is_empty() {
            writeln!(f, "  Requested:        nothing")?;
        } else {
            writeln!(f, "  Requested:        {}", requested.join(", "))?;
        }

        let count = |n: Option<usize>| n.map_or_else(|| "n/a".to_string(), |n| n.to_string());
        writeln!(f, "  Subtitle tracks:  {}", count(self.subtitle_tracks))?;
        writeln!(f, "  Audio tracks:     {}", count(self.audio_tracks))?;

        for failure in &self.failures {
            writeln!(f, "  Failed ({}): {}", failure.category, failure.message)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ProcessOutcome {
    Artifacts {
        artifacts: Vec<OutputArtifact>,
        failures: Vec<StepFailure>,
    },
    /// Nothing was produced. Not an error: inputs without subtitle tracks are common.
    Diagnostic(Diagnostic),
}

/// Artifacts and contained failures collected during one request.
#[derive(Default)]
struct Manifest {
    artifacts: Vec<OutputArtifact>,
    failures: Vec<StepFailure>,
    stems: HashSet<String>,
}

impl Manifest {
    fn push(&mut self, artifact: OutputArtifact) {
        debug!(
            "Produced {} ({} bytes)",
            artifact.file_name,
            artifact.content.len()
        );
        self.artifacts.push(artifact);
    }

    fn fail(&mut self, category: Category, error: &MkvsubError) {
        warn!("{} step failed: {}", category, error);
        self.failures.push(StepFailure {
            category,
            message: error.to_string(),
        });
    }

    /// File stem for a track, disambiguated when two tracks share name and language.
    fn stem_for(&mut self, track: &TrackRecord) -> String {
        let mut stem = sanitize_file_name(&track.file_stem());
        if !self.stems.insert(stem.clone()) {
            stem = format!("{}_{}", stem, track.id);
            self.stems.insert(stem.clone());
        }
        stem
    }
}

/// Scratch directory for one request, removed when dropped.
struct ScratchDir {
    dir: TempDir,
    cancelled: Arc<AtomicBool>,
}

impl ScratchDir {
    fn new(cancelled: Arc<AtomicBool>) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("mkvsub-").tempdir()?;
        debug!("Using temp directory: {:?}", dir.path());
        Ok(Self { dir, cancelled })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.cancelled.load(Ordering::Relaxed) {
            warn!("Processing cancelled, cleaning up temp files: {:?}", self.dir.path());
        } else {
            debug!("Cleaning up temp directory: {:?}", self.dir.path());
        }
    }
}

/// Runs extraction, conversion, translation and transcoding for one input file.
pub struct Orchestrator {
    config: Config,
    tracks: Box<dyn TrackTool>,
    transcoder: Box<dyn Transcoder>,
    translator: Box<dyn Translator>,
    cancelled: Arc<AtomicBool>,
    show_progress: bool,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        tracks: Box<dyn TrackTool>,
        transcoder: Box<dyn Transcoder>,
        translator: Box<dyn Translator>,
    ) -> Self {
        Self {
            config,
            tracks,
            transcoder,
            translator,
            cancelled: Arc::new(AtomicBool::new(false)),
            show_progress: false,
        }
    }

    /// Orchestrator wired to mkvtoolnix, FFmpeg and Google Translate.
    pub fn from_config(config: Config) -> Self {
        let tracks = Box::new(MkvToolNix::from_config(&config));
        let transcoder = Box::new(Ffmpeg::from_config(&config));
        let translator = Box::new(GoogleTranslator::new(config.translate_endpoint.clone()));
        Self::new(config, tracks, transcoder, translator)
    }

    /// Enable or disable progress display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Share a flag that stops processing between tracks when set.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Process one input file.
    ///
    /// Failures inside the subtitle and audio steps are recorded and do not
    /// stop the other steps. A video failure is recorded the same way unless
    /// `strict_video` is set, in which case it is returned as the error.
    pub async fn process(
        &self,
        input: &Path,
        operations: Operations,
        options: &ProcessOptions,
    ) -> Result<ProcessOutcome> {
        if !input.exists() {
            return Err(MkvsubError::FileNotFound(input.display().to_string()));
        }

        let scratch = ScratchDir::new(self.cancelled.clone())?;
        let mut manifest = Manifest::default();
        let mut subtitle_tracks = None;
        let mut audio_tracks = None;

        if operations.extract_subtitles {
            self.check_cancelled()?;
            info!("Extracting subtitle tracks from {:?}", input);
            let spinner = self.spinner("Extracting subtitles...");

            match self
                .extract_subtitles(input, scratch.path(), options, &mut manifest)
                .await
            {
                Ok(count) => subtitle_tracks = Some(count),
                Err(MkvsubError::Cancelled) => return Err(MkvsubError::Cancelled),
                Err(e) => manifest.fail(Category::Subtitles, &e),
            }

            if let Some(pb) = spinner {
                pb.finish_with_message(format!(
                    "✓ Subtitles: {} track(s)",
                    subtitle_tracks.unwrap_or(0)
                ));
            }
        }

        if operations.extract_audio {
            self.check_cancelled()?;
            info!("Extracting audio tracks from {:?}", input);
            let spinner = self.spinner("Extracting audio...");

            match self.extract_audio(input, scratch.path(), options, &mut manifest) {
                Ok(count) => audio_tracks = Some(count),
                Err(MkvsubError::Cancelled) => return Err(MkvsubError::Cancelled),
                Err(e) => manifest.fail(Category::Audio, &e),
            }

            if let Some(pb) = spinner {
                pb.finish_with_message(format!("✓ Audio: {} track(s)", audio_tracks.unwrap_or(0)));
            }
        }

        if operations.convert_video {
            self.check_cancelled()?;
            info!(
                "Converting video to {} ({})",
                options.video_format, options.resolution
            );
            let spinner = self.spinner("Converting video...");

            match self.convert_video(input, scratch.path(), options) {
                Ok(artifact) => manifest.push(artifact),
                Err(MkvsubError::Cancelled) => return Err(MkvsubError::Cancelled),
                Err(e) if self.config.strict_video => return Err(e),
                Err(e) => manifest.fail(Category::Video, &e),
            }

            if let Some(pb) = spinner {
                pb.finish_with_message("✓ Video step finished");
            }
        }

        let Manifest {
            artifacts,
            failures,
            ..
        } = manifest;

        if artifacts.is_empty() {
            let diagnostic = Diagnostic {
                requested: operations,
                subtitle_tracks,
                audio_tracks,
                failures,
            };
            info!("No artifacts produced");
            return Ok(ProcessOutcome::Diagnostic(diagnostic));
        }

        info!("Produced {} artifact(s)", artifacts.len());
        Ok(ProcessOutcome::Artifacts {
            artifacts,
            failures,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(MkvsubError::Cancelled);
        }
        Ok(())
    }

    fn load_tracks(&self, input: &Path, kind: TrackKind) -> Result<Vec<TrackRecord>> {
        match self.tracks.report(input)? {
            Some(report) => parse_report(&report, kind),
            None => {
                warn!("Track report unavailable for {:?}, assuming no tracks", input);
                Ok(Vec::new())
            }
        }
    }

    async fn extract_subtitles(
        &self,
        input: &Path,
        work_dir: &Path,
        options: &ProcessOptions,
        manifest: &mut Manifest,
    ) -> Result<usize> {
        let tracks = self.load_tracks(input, TrackKind::Subtitle)?;
        info!("Found {} subtitle track(s)", tracks.len());

        for track in &tracks {
            self.check_cancelled()?;

            let extension = match track.codec.as_str() {
                ASS_CODEC | SSA_CODEC => "ass",
                SRT_CODEC => "srt",
                other => {
                    info!(
                        "Skipping subtitle track {} with unsupported codec {}",
                        track.id, other
                    );
                    continue;
                }
            };

            let stem = manifest.stem_for(track);
            let raw_name = format!("{}.{}", stem, extension);
            let raw_path = work_dir.join(&raw_name);

            match self.tracks.extract(input, track.id, &raw_path) {
                Ok(()) => {}
                Err(e @ MkvsubError::ExtractionFailure(_)) => {
                    manifest.fail(Category::Subtitles, &e);
                    continue;
                }
                Err(e) => return Err(e),
            }

            let raw = fs::read(&raw_path)?;
            let text = String::from_utf8_lossy(&raw).into_owned();
            manifest.push(OutputArtifact::new(raw_name, raw));

            let srt = if extension == "ass" {
                let srt = convert_ass_to_srt(&text);
                manifest.push(OutputArtifact::new(
                    format!("{}.srt", stem),
                    srt.clone().into_bytes(),
                ));
                srt
            } else {
                text
            };

            if let Some(language) = &options.translate_to {
                let translated = self.translate(&srt, language).await;
                manifest.push(OutputArtifact::new(
                    sanitize_file_name(&format!("{}_{}.srt", stem, language.trim())),
                    translated.into_bytes(),
                ));
            }
        }

        Ok(tracks.len())
    }

    async fn translate(&self, srt: &str, language: &str) -> String {
        let code = self.config.languages.code_for(language);
        info!("Translating subtitles to {} ({})", language, code);

        let progress = self.line_progress();
        let translated = translate_srt_with_progress(srt, code, self.translator.as_ref(), |done, total| {
            if let Some(pb) = &progress {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            }
        })
        .await;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        translated
    }

    fn extract_audio(
        &self,
        input: &Path,
        work_dir: &Path,
        options: &ProcessOptions,
        manifest: &mut Manifest,
    ) -> Result<usize> {
        let tracks = self.load_tracks(input, TrackKind::Audio)?;
        info!("Found {} audio track(s)", tracks.len());

        for track in &tracks {
            self.check_cancelled()?;

            let stem = manifest.stem_for(track);
            let raw_path = work_dir.join(format!(
                "{}.source.{}",
                stem,
                raw_audio_extension(&track.codec)
            ));

            match self.tracks.extract(input, track.id, &raw_path) {
                Ok(()) => {}
                Err(e @ MkvsubError::ExtractionFailure(_)) => {
                    manifest.fail(Category::Audio, &e);
                    continue;
                }
                Err(e) => return Err(e),
            }

            let file_name = format!("{}.{}", stem, options.audio_format.extension());
            let output = work_dir.join(&file_name);

            match self.transcode_audio(&raw_path, &output, options.audio_format) {
                Ok(content) => manifest.push(OutputArtifact::new(file_name, content)),
                Err(e @ MkvsubError::TranscodeFailure(_)) => manifest.fail(Category::Audio, &e),
                Err(e) => return Err(e),
            }
        }

        Ok(tracks.len())
    }

    /// Transcode an extracted audio stream and return the encoded bytes.
    ///
    /// The extracted stream is removed whether or not the transcode succeeds.
    fn transcode_audio(&self, raw: &Path, output: &Path, format: AudioFormat) -> Result<Vec<u8>> {
        let job = TranscodeJob {
            input: raw,
            output,
            scale: None,
            codec_args: format.codec_args(),
        };
        let result = self.transcoder.transcode(&job);

        if let Err(e) = fs::remove_file(raw) {
            debug!("Could not remove intermediate {:?}: {}", raw, e);
        }

        result?;
        Ok(fs::read(output)?)
    }

    fn convert_video(
        &self,
        input: &Path,
        work_dir: &Path,
        options: &ProcessOptions,
    ) -> Result<OutputArtifact> {
        let scale = resolution_dimensions(&options.resolution);
        if scale.is_none() {
            debug!("Resolution '{}' keeps the source size", options.resolution);
        }

        let input_stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let file_name = sanitize_file_name(&format!(
            "{}_{}.{}",
            input_stem,
            options.resolution.trim(),
            options.video_format.extension()
        ));
        let output = work_dir.join(&file_name);

        self.transcoder.transcode(&TranscodeJob {
            input,
            output: &output,
            scale,
            codec_args: options.video_format.codec_args(),
        })?;

        Ok(OutputArtifact::new(file_name, fs::read(&output)?))
    }

    fn spinner(&self, message: &'static str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    fn line_progress(&self) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    }
}

/// Replace characters that are not allowed in file names on common platforms.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        "track".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write every artifact into `dir`, creating it if needed.
pub fn write_artifacts(dir: &Path, artifacts: &[OutputArtifact]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    artifacts
        .iter()
        .map(|artifact| {
            let path = dir.join(&artifact.file_name);
            fs::write(&path, &artifact.content)?;
            info!("Wrote {}", path.display());
            Ok(path)
        })
        .collect()
}

/// Print a summary of the written files and any contained failures.
pub fn print_summary(written: &[PathBuf], failures: &[StepFailure]) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Extraction Complete                       ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    for path in written {
        println!("  {}", path.display());
    }
    if !failures.is_empty() {
        println!();
        println!("  Skipped:");
        for failure in failures {
            println!("    {}: {}", failure.category, failure.message);
        }
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
