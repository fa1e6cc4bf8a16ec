pub mod ass;
pub mod srt;

pub use ass::{ass_to_entries, convert_ass_to_srt, convert_timestamp, strip_tags, DialogueEvent};
pub use srt::{format_srt, format_timestamp, parse_srt};

use std::time::Duration;

/// One SRT cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}
