pub mod mkvtoolnix;
pub mod report;

pub use mkvtoolnix::MkvToolNix;
pub use report::parse_report;

use crate::error::Result;
use std::path::Path;

/// Category of a track as printed in the `Track type:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Subtitle,
    Audio,
    Other,
}

impl TrackKind {
    fn from_report(value: &str) -> Self {
        match value.trim() {
            "subtitles" => TrackKind::Subtitle,
            "audio" => TrackKind::Audio,
            _ => TrackKind::Other,
        }
    }

    fn synthetic_prefix(&self) -> &'static str {
        match self {
            TrackKind::Subtitle => "Track",
            TrackKind::Audio => "Audio",
            TrackKind::Other => "Other",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Subtitle => write!(f, "subtitle"),
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Other => write!(f, "other"),
        }
    }
}

/// One track described by an `mkvinfo` report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub number: u32,
    /// Identifier understood by `mkvextract`.
    pub id: u32,
    pub kind: TrackKind,
    pub codec: String,
    pub language: String,
    pub name: Option<String>,
}

impl TrackRecord {
    /// Name of the track, or `<Kind>_<id>` when the report carries none.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{}_{}", self.kind.synthetic_prefix(), self.id),
        }
    }

    /// Base name for artifacts produced from this track.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.display_name(), self.language)
    }
}

/// Access to the track metadata reporter and the track extractor.
pub trait TrackTool: Send + Sync {
    /// Return the textual track report, or `None` when the reporter exits unsuccessfully.
    fn report(&self, input: &Path) -> Result<Option<String>>;

    /// Write the raw bytes of track `track_id` to `output`.
    fn extract(&self, input: &Path, track_id: u32, output: &Path) -> Result<()>;
}
