use crate::error::{MkvsubError, Result};
use crate::translate::LanguageTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Default endpoint of the public Google Translate API.
pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Aac,
    Flac,
    Opus,
    Wav,
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "aac" | "m4a" => Ok(AudioFormat::Aac),
            "flac" => Ok(AudioFormat::Flac),
            "opus" => Ok(AudioFormat::Opus),
            "wav" => Ok(AudioFormat::Wav),
            _ => Err(format!(
                "Unknown audio format: {}. Use 'mp3', 'aac', 'flac', 'opus' or 'wav'",
                s
            )),
        }
    }
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "m4a",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "opus",
            AudioFormat::Wav => "wav",
        }
    }

    /// Encoder arguments passed to ffmpeg for this format.
    pub fn codec_args(&self) -> &'static [&'static str] {
        match self {
            AudioFormat::Mp3 => &["-vn", "-c:a", "libmp3lame", "-q:a", "2"],
            AudioFormat::Aac => &["-vn", "-c:a", "aac", "-b:a", "192k"],
            AudioFormat::Flac => &["-vn", "-c:a", "flac"],
            AudioFormat::Opus => &["-vn", "-c:a", "libopus", "-b:a", "128k"],
            AudioFormat::Wav => &["-vn", "-c:a", "pcm_s16le"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Mkv,
    Webm,
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for VideoFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp4" => Ok(VideoFormat::Mp4),
            "mkv" => Ok(VideoFormat::Mkv),
            "webm" => Ok(VideoFormat::Webm),
            _ => Err(format!(
                "Unknown video format: {}. Use 'mp4', 'mkv' or 'webm'",
                s
            )),
        }
    }
}

impl VideoFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Mkv => "mkv",
            VideoFormat::Webm => "webm",
        }
    }

    pub fn codec_args(&self) -> &'static [&'static str] {
        match self {
            VideoFormat::Mp4 => &["-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac"],
            VideoFormat::Mkv => &["-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "copy"],
            VideoFormat::Webm => &["-c:v", "libvpx-vp9", "-crf", "32", "-b:v", "0", "-c:a", "libopus"],
        }
    }
}

/// Immutable settings handed to the orchestrator and the tool wrappers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `mkvinfo` and `mkvextract`. Resolved through `PATH` when unset.
    pub mkvtoolnix_dir: Option<PathBuf>,
    pub ffmpeg_path: PathBuf,
    pub translate_endpoint: String,
    pub audio_format: AudioFormat,
    pub video_format: VideoFormat,
    /// Abort the whole request when the video transcode fails.
    pub strict_video: bool,
    pub languages: LanguageTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mkvtoolnix_dir: None,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            audio_format: AudioFormat::default(),
            video_format: VideoFormat::default(),
            strict_video: false,
            languages: LanguageTable::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                match toml::from_str::<Config>(&contents) {
                    Ok(file_config) => config = file_config,
                    Err(e) => warn!("Ignoring invalid config file {:?}: {}", config_path, e),
                }
            }
        }

        config.apply_env();
        Ok(config)
    }

    /// Parse a config from TOML text without consulting the environment.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("MKVSUB_MKVTOOLNIX_DIR") {
            self.mkvtoolnix_dir = Some(PathBuf::from(dir));
        }
        if let Ok(ffmpeg) = std::env::var("MKVSUB_FFMPEG") {
            self.ffmpeg_path = PathBuf::from(ffmpeg);
        }
        if let Ok(endpoint) = std::env::var("MKVSUB_TRANSLATE_ENDPOINT") {
            self.translate_endpoint = endpoint;
        }
        if let Ok(format) = std::env::var("MKVSUB_AUDIO_FORMAT") {
            if let Ok(f) = format.parse() {
                self.audio_format = f;
            }
        }
        if let Ok(strict) = std::env::var("MKVSUB_STRICT_VIDEO") {
            self.strict_video = matches!(strict.to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(MkvsubError::Config("ffmpeg path must not be empty".to_string()));
        }

        if let Some(dir) = &self.mkvtoolnix_dir {
            if !dir.is_dir() {
                return Err(MkvsubError::Config(format!(
                    "mkvtoolnix directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        if !self.translate_endpoint.starts_with("http://")
            && !self.translate_endpoint.starts_with("https://")
        {
            return Err(MkvsubError::Config(format!(
                "Translation endpoint must be an http(s) URL, got '{}'",
                self.translate_endpoint
            )));
        }

        if self.languages.is_empty() {
            return Err(MkvsubError::Config(
                "Language table must contain at least one entry".to_string(),
            ));
        }

        Ok(())
    }

    pub fn mkvinfo_path(&self) -> PathBuf {
        self.mkvtoolnix_tool("mkvinfo")
    }

    pub fn mkvextract_path(&self) -> PathBuf {
        self.mkvtoolnix_tool("mkvextract")
    }

    fn mkvtoolnix_tool(&self, name: &str) -> PathBuf {
        let file = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
        match &self.mkvtoolnix_dir {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }

    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mkvsub").join("config.toml"))
    }
}
