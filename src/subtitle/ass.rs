//! ASS/SSA to SRT conversion.
//!
//! Only `Dialogue:` events are carried over; script info, styles and
//! comments have no SRT equivalent and are dropped.

use super::srt::format_srt;
use super::SubtitleEntry;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

const DIALOGUE_PREFIX: &str = "Dialogue:";

/// Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text.
const DIALOGUE_FIELDS: usize = 10;

static OVERRIDE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("Invalid regex"));

/// One `Dialogue:` line of an ASS script, before tag stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueEvent<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub text: &'a str,
}

impl<'a> DialogueEvent<'a> {
    /// Split a dialogue line into its fields. The text field keeps any commas.
    ///
    /// Returns `None` for non-dialogue lines and for lines with fewer than ten fields.
    pub fn parse(line: &'a str) -> Option<Self> {
        if !line.starts_with(DIALOGUE_PREFIX) {
            return None;
        }

        let fields: Vec<&str> = line.splitn(DIALOGUE_FIELDS, ',').collect();
        if fields.len() < DIALOGUE_FIELDS {
            debug!("Skipping malformed dialogue line: {}", line);
            return None;
        }

        Some(Self {
            start: fields[1],
            end: fields[2],
            text: fields[9],
        })
    }
}

/// Remove every `{...}` override block.
pub fn strip_tags(text: &str) -> String {
    OVERRIDE_BLOCK.replace_all(text, "").into_owned()
}

/// Convert an ASS time (`H:MM:SS.cc`) to a duration.
///
/// Unparseable input yields zero; the caller renders it as `00:00:00,000`.
pub fn convert_timestamp(value: &str) -> Duration {
    parse_ass_time(value).unwrap_or_else(|| {
        debug!("Unparseable timestamp '{}', using zero", value);
        Duration::ZERO
    })
}

fn parse_ass_time(value: &str) -> Option<Duration> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let (seconds, fraction) = parts[2].split_once('.')?;
    if fraction.contains('.') {
        return None;
    }

    let hours = digits(parts[0])?;
    let minutes = digits(parts[1])?;
    let seconds = digits(seconds)?;

    let fraction = fraction.trim();
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis: u64 = format!("{:0<3}", fraction)[..3].parse().ok()?;

    clock_millis(hours, minutes, seconds, millis).map(Duration::from_millis)
}

/// Total milliseconds, or `None` when the fields overflow `u64`.
pub(crate) fn clock_millis(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)
}

fn digits(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Convert the dialogue events of an ASS script to numbered entries.
///
/// Indices are assigned after malformed lines are skipped, so they are
/// always contiguous from 1.
pub fn ass_to_entries(ass: &str) -> Vec<SubtitleEntry> {
    ass.lines()
        .filter_map(DialogueEvent::parse)
        .enumerate()
        .map(|(i, event)| SubtitleEntry {
            index: i + 1,
            start: convert_timestamp(event.start),
            end: convert_timestamp(event.end),
            text: strip_tags(event.text),
        })
        .collect()
}

/// Convert an ASS script to SRT text.
pub fn convert_ass_to_srt(ass: &str) -> String {
    format_srt(&ass_to_entries(ass))
}
