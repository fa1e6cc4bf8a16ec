//! Single-pass parser for the track section of an `mkvinfo` report.
//!
//! The report is line oriented and every field follows the header line of
//! the track it belongs to, so the parser keeps one open record and closes
//! it when the next track header (or the end of input) is reached.

use crate::error::{MkvsubError, Result};
use tracing::debug;

use super::{TrackKind, TrackRecord};

const TRACK_NUMBER_MARKER: &str = "|  + Track number:";
const TRACK_ID_MARKER: &str = "(track ID for mkvmerge & mkvextract:";
const TRACK_TYPE_MARKER: &str = "|  + Track type:";
const CODEC_MARKER: &str = "|  + Codec ID:";
const LANGUAGE_MARKER: &str = "|  + Language";
const NAME_MARKER: &str = "|  + Name:";

const UNDETERMINED_LANGUAGE: &str = "und";

#[derive(Debug)]
struct PendingTrack {
    number: u32,
    id: u32,
    kind: Option<TrackKind>,
    codec: Option<String>,
    language: Option<String>,
    name: Option<String>,
}

impl PendingTrack {
    fn start(line: &str, line_no: usize) -> Result<Self> {
        let malformed = |message: String| MkvsubError::MalformedReport {
            line: line_no,
            message,
        };

        let number_text = line
            .split_once("Track number:")
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .unwrap_or_default();
        let number = parse_digits(number_text)
            .ok_or_else(|| malformed(format!("invalid track number '{}'", number_text)))?;

        let id_text = line
            .split_once(TRACK_ID_MARKER)
            .map(|(_, rest)| rest.split(')').next().unwrap_or_default().trim())
            .ok_or_else(|| malformed("missing track ID".to_string()))?;
        let id = parse_digits(id_text)
            .ok_or_else(|| malformed(format!("invalid track ID '{}'", id_text)))?;

        Ok(Self {
            number,
            id,
            kind: None,
            codec: None,
            language: None,
            name: None,
        })
    }

    fn finish(self, wanted: TrackKind) -> Option<TrackRecord> {
        if self.kind != Some(wanted) {
            debug!(
                "Dropping track {} (id {}): kind {:?} does not match {}",
                self.number, self.id, self.kind, wanted
            );
            return None;
        }

        Some(TrackRecord {
            number: self.number,
            id: self.id,
            kind: wanted,
            codec: self.codec.unwrap_or_default(),
            language: self
                .language
                .unwrap_or_else(|| UNDETERMINED_LANGUAGE.to_string()),
            name: self.name,
        })
    }
}

/// Parse an `mkvinfo` report and keep the tracks of the requested kind.
///
/// A non-numeric track number or track ID fails the whole parse, since the
/// ID is needed for every later extraction.
pub fn parse_report(report: &str, kind: TrackKind) -> Result<Vec<TrackRecord>> {
    let mut tracks = Vec::new();
    let mut current: Option<PendingTrack> = None;

    for (index, line) in report.lines().enumerate() {
        if line.contains(TRACK_NUMBER_MARKER) {
            if let Some(track) = current.take().and_then(|t| t.finish(kind)) {
                tracks.push(track);
            }
            current = Some(PendingTrack::start(line, index + 1)?);
            continue;
        }

        let Some(track) = current.as_mut() else {
            continue;
        };

        if let Some(value) = value_after(line, TRACK_TYPE_MARKER) {
            track.kind = Some(TrackKind::from_report(value));
        } else if let Some(value) = value_after(line, CODEC_MARKER) {
            track.codec = Some(value.trim().to_string());
        } else if let Some(value) = value_after(line, LANGUAGE_MARKER) {
            track.language = Some(parse_language(value));
        } else if let Some(value) = value_after(line, NAME_MARKER) {
            track.name = Some(value.trim().to_string());
        }
    }

    if let Some(track) = current.and_then(|t| t.finish(kind)) {
        tracks.push(track);
    }

    debug!("Parsed {} {} track(s) from report", tracks.len(), kind);
    Ok(tracks)
}

fn value_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.split_once(marker).map(|(_, rest)| rest)
}

/// Handles both `Language: eng` and `Language (IETF BCP 47): en`.
fn parse_language(value: &str) -> String {
    value
        .trim()
        .split(':')
        .nth(1)
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(UNDETERMINED_LANGUAGE)
        .to_string()
}

fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
+ EBML head
|+ Document type: matroska
+ Segment: size 1048576
|+ Segment information
| + Title: Episode 01
|+ Tracks
| + Track
|  + Track number: 1 (track ID for mkvmerge & mkvextract: 0)
|  + Track UID: 1234
|  + Track type: video
|  + Codec ID: V_MPEG4/ISO/AVC
|  + Language: und
| + Track
|  + Track number: 2 (track ID for mkvmerge & mkvextract: 1)
|  + Track type: audio
|  + Codec ID: A_AAC
|  + Language: jpn
|  + Language (IETF BCP 47): ja
| + Track
|  + Track number: 3 (track ID for mkvmerge & mkvextract: 2)
|  + Track type: subtitles
|  + Codec ID: S_TEXT/ASS
|  + Language: eng
|  + Name: Full Subs
| + Track
|  + Track number: 4 (track ID for mkvmerge & mkvextract: 3)
|  + Track type: subtitles
|  + Codec ID: S_TEXT/UTF8
|+ Chapters
";

    #[test]
    fn test_parse_subtitle_tracks() {
        let tracks = parse_report(REPORT, TrackKind::Subtitle).unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].number, 3);
        assert_eq!(tracks[0].id, 2);
        assert_eq!(tracks[0].codec, "S_TEXT/ASS");
        assert_eq!(tracks[0].language, "eng");
        assert_eq!(tracks[0].name.as_deref(), Some("Full Subs"));

        assert_eq!(tracks[1].id, 3);
        assert_eq!(tracks[1].codec, "S_TEXT/UTF8");
        assert_eq!(tracks[1].language, "und");
        assert_eq!(tracks[1].name, None);
        assert_eq!(tracks[1].display_name(), "Track_3");
    }

    #[test]
    fn test_parse_audio_tracks_last_language_wins() {
        let tracks = parse_report(REPORT, TrackKind::Audio).unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[0].codec, "A_AAC");
        assert_eq!(tracks[0].language, "ja");
    }

    #[test]
    fn test_every_record_matches_requested_kind() {
        for kind in [TrackKind::Subtitle, TrackKind::Audio, TrackKind::Other] {
            let tracks = parse_report(REPORT, kind).unwrap();
            assert!(tracks.iter().all(|t| t.kind == kind));
        }
    }

    #[test]
    fn test_track_without_type_is_dropped() {
        let report = "\
|  + Track number: 1 (track ID for mkvmerge & mkvextract: 0)
|  + Codec ID: S_TEXT/ASS
";
        assert!(parse_report(report, TrackKind::Subtitle).unwrap().is_empty());
    }

    #[test]
    fn test_trailing_record_is_kept_when_kind_matches() {
        let report = "\
|  + Track number: 7 (track ID for mkvmerge & mkvextract: 6)
|  + Track type: subtitles
";
        let tracks = parse_report(report, TrackKind::Subtitle).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 6);
        assert_eq!(tracks[0].codec, "");
    }

    #[test]
    fn test_empty_report() {
        assert!(parse_report("", TrackKind::Subtitle).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_track_id_fails() {
        let report = "|  + Track number: 1 (track ID for mkvmerge & mkvextract: x)\n";
        match parse_report(report, TrackKind::Subtitle) {
            Err(MkvsubError::MalformedReport { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("track ID"));
            }
            other => panic!("Expected MalformedReport, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_track_number_fails() {
        let report = "\
|  + Track number: 1 (track ID for mkvmerge & mkvextract: 0)
|  + Track type: subtitles
|  + Track number: two (track ID for mkvmerge & mkvextract: 1)
";
        match parse_report(report, TrackKind::Subtitle) {
            Err(MkvsubError::MalformedReport { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected MalformedReport, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_track_id_fails() {
        let report = "|  + Track number: 1\n";
        assert!(matches!(
            parse_report(report, TrackKind::Subtitle),
            Err(MkvsubError::MalformedReport { .. })
        ));
    }

    #[test]
    fn test_parse_language_forms() {
        assert_eq!(parse_language(": eng"), "eng");
        assert_eq!(parse_language(" (IETF BCP 47): pt-BR"), "pt-BR");
        assert_eq!(parse_language(" eng"), "und");
        assert_eq!(parse_language(":  "), "und");
    }

    #[test]
    fn test_parse_digits_rejects_sign() {
        assert_eq!(parse_digits("12"), Some(12));
        assert_eq!(parse_digits("+1"), None);
        assert_eq!(parse_digits(""), None);
    }
}
