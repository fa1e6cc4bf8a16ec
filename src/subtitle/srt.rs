// SRT subtitle format
use super::ass::clock_millis;
use super::SubtitleEntry;
use crate::error::{MkvsubError, Result};
use std::time::Duration;

/// Serialize entries as SRT: index, time range, text, then a blank line.
pub fn format_srt(entries: &[SubtitleEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}\n{} --> {}\n{}\n",
                entry.index,
                format_timestamp(entry.start),
                format_timestamp(entry.end),
                entry.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_timestamp(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = d.subsec_millis();
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Read SRT content back into entries. Multi-line cue text is joined with `\n`.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>> {
    let mut entries = Vec::new();
    let mut lines = content.lines().map(|l| l.trim_end_matches('\r'));

    loop {
        let index_line = match lines.next() {
            Some(l) if !l.trim().is_empty() => l.trim(),
            Some(_) => continue,
            None => break,
        };

        let index: usize = index_line
            .parse()
            .map_err(|_| MkvsubError::Subtitle(format!("invalid cue index '{}'", index_line)))?;

        let time_line = lines
            .next()
            .ok_or_else(|| MkvsubError::Subtitle(format!("cue {} has no time range", index)))?;
        let (start, end) = time_line
            .split_once("-->")
            .ok_or_else(|| MkvsubError::Subtitle(format!("invalid time range '{}'", time_line)))?;

        let mut text = Vec::new();
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
            text.push(line);
        }

        entries.push(SubtitleEntry {
            index,
            start: parse_timestamp(start.trim())?,
            end: parse_timestamp(end.trim())?,
            text: text.join("\n"),
        });
    }

    Ok(entries)
}

/// Parse `HH:MM:SS,mmm`.
fn parse_timestamp(value: &str) -> Result<Duration> {
    let invalid = || MkvsubError::Subtitle(format!("invalid timestamp '{}'", value));

    let (clock, millis) = value.split_once(',').ok_or_else(invalid)?;
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
    let minutes: u64 = parts[1].parse().map_err(|_| invalid())?;
    let seconds: u64 = parts[2].parse().map_err(|_| invalid())?;
    let millis: u64 = millis.parse().map_err(|_| invalid())?;

    clock_millis(hours, minutes, seconds, millis)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}
