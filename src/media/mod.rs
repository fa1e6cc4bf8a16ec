pub mod ffmpeg;

pub use ffmpeg::Ffmpeg;

use crate::error::Result;
use std::path::Path;

/// Target resolutions the video conversion knows how to scale to.
const RESOLUTIONS: &[(&str, (u32, u32))] = &[
    ("480p", (854, 480)),
    ("720p", (1280, 720)),
    ("1080p", (1920, 1080)),
];

/// Pixel dimensions for a resolution name. Any other name, `original`
/// included, means no scaling.
pub fn resolution_dimensions(name: &str) -> Option<(u32, u32)> {
    RESOLUTIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
        .map(|(_, dims)| *dims)
}

pub fn resolution_names() -> impl Iterator<Item = &'static str> {
    RESOLUTIONS.iter().map(|(name, _)| *name)
}

/// Extension for the raw stream `mkvextract` writes for an audio codec.
pub fn raw_audio_extension(codec: &str) -> &'static str {
    match codec {
        "A_AAC" => "aac",
        "A_AC3" => "ac3",
        "A_EAC3" => "eac3",
        "A_FLAC" => "flac",
        "A_OPUS" => "opus",
        "A_VORBIS" => "ogg",
        "A_MPEG/L3" => "mp3",
        "A_MPEG/L2" => "mp2",
        "A_TRUEHD" => "thd",
        c if c.starts_with("A_AAC/") => "aac",
        c if c.starts_with("A_DTS") => "dts",
        c if c.starts_with("A_PCM") => "wav",
        _ => "mka",
    }
}

/// One ffmpeg invocation: input, output, optional scaling and encoder arguments.
#[derive(Debug, Clone)]
pub struct TranscodeJob<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub scale: Option<(u32, u32)>,
    pub codec_args: &'a [&'a str],
}

pub trait Transcoder: Send + Sync {
    fn transcode(&self, job: &TranscodeJob<'_>) -> Result<()>;
}
