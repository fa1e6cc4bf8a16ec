//! Integration tests for mkvsub
//!
//! These tests drive the public API with in-process stand-ins for mkvtoolnix,
//! FFmpeg and the translation service, so no external tools are needed.

use async_trait::async_trait;
use mkvsub::config::{AudioFormat, Config, VideoFormat};
use mkvsub::error::{MkvsubError, Result};
use mkvsub::media::{TranscodeJob, Transcoder};
use mkvsub::pipeline::{
    write_artifacts, Category, Operations, Orchestrator, ProcessOptions, ProcessOutcome,
};
use mkvsub::subtitle::{convert_ass_to_srt, convert_timestamp, parse_srt, strip_tags};
use mkvsub::tracks::{parse_report, TrackKind, TrackTool};
use mkvsub::translate::{translate_srt, LineTranslation, Translator};

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

const REPORT: &str = "\
+ EBML head
|+ Segment information
|+ Tracks
| + Track
|  + Track number: 1 (track ID for mkvmerge & mkvextract: 0)
|  + Track type: video
|  + Codec ID: V_MPEGH/ISO/HEVC
| + Track
|  + Track number: 2 (track ID for mkvmerge & mkvextract: 1)
|  + Track type: audio
|  + Codec ID: A_OPUS
|  + Language: jpn
| + Track
|  + Track number: 3 (track ID for mkvmerge & mkvextract: 2)
|  + Track type: subtitles
|  + Codec ID: S_TEXT/ASS
|  + Language: eng
|  + Name: Dialogue
| + Track
|  + Track number: 4 (track ID for mkvmerge & mkvextract: 3)
|  + Track type: subtitles
|  + Codec ID: S_HDMV/PGS
|  + Language: eng
|+ Cluster
";

const ASS: &str = "\
[Script Info]
Title: Example

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:01.20,0:00:03.00,Default,,0,0,0,,{\\an8}Wait, what?
Comment: 0,0:00:02.00,0:00:03.00,Default,,0,0,0,,not shown
Dialogue: 0,0:01:00.5,0:01:02.75,Default,,0,0,0,,Fine.
";

// ============================================================================
// Config Integration Tests
// ============================================================================

mod config_tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();
        assert_eq!(config.audio_format, AudioFormat::Mp3);
        assert_eq!(config.video_format, VideoFormat::Mp4);
        assert!(!config.strict_video);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml(
            "audio_format = \"flac\"\nstrict_video = true\n\n[languages]\nKlingon = \"tlh\"\n",
        )
        .unwrap();

        assert_eq!(config.audio_format, AudioFormat::Flac);
        assert!(config.strict_video);
        assert_eq!(config.languages.code_for("Klingon"), "tlh");
        assert_eq!(config.languages.code_for("Spanish"), "en");
    }

    #[test]
    fn test_config_rejects_bad_endpoint() {
        let config = Config {
            translate_endpoint: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(MkvsubError::Config(_))));
    }
}

// ============================================================================
// Track Report Integration Tests
// ============================================================================

mod report_tests {
    use super::*;

    #[test]
    fn test_subtitle_tracks() {
        let tracks = parse_report(REPORT, TrackKind::Subtitle).unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 2);
        assert_eq!(tracks[0].codec, "S_TEXT/ASS");
        assert_eq!(tracks[0].file_stem(), "Dialogue_eng");
        assert_eq!(tracks[1].id, 3);
        assert_eq!(tracks[1].file_stem(), "Track_3_eng");
    }

    #[test]
    fn test_audio_tracks() {
        let tracks = parse_report(REPORT, TrackKind::Audio).unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].number, 2);
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[0].language, "jpn");
    }

    #[test]
    fn test_report_without_tracks() {
        assert!(parse_report("", TrackKind::Subtitle).unwrap().is_empty());
        assert!(parse_report("+ EBML head\n|+ Cluster\n", TrackKind::Audio)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_malformed_track_id() {
        let report = "|  + Track number: 1 (track ID for mkvmerge & mkvextract: one)\n";
        assert!(matches!(
            parse_report(report, TrackKind::Subtitle),
            Err(MkvsubError::MalformedReport { line: 1, .. })
        ));
    }
}

// ============================================================================
// ASS to SRT Integration Tests
// ============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_convert_script() {
        let srt = convert_ass_to_srt(ASS);
        assert_eq!(
            srt,
            "1\n00:00:01,200 --> 00:00:03,000\nWait, what?\n\n2\n00:01:00,500 --> 00:01:02,750\nFine.\n"
        );
    }

    #[test]
    fn test_converted_output_parses_as_srt() {
        let entries = parse_srt(&convert_ass_to_srt(ASS)).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start, Duration::from_millis(1_200));
        assert_eq!(entries[1].end, Duration::from_millis(62_750));
        assert_eq!(entries[1].text, "Fine.");
    }

    #[test]
    fn test_timestamps_and_tags() {
        assert_eq!(convert_timestamp("0:00:00.05"), Duration::from_millis(50));
        assert_eq!(convert_timestamp("garbage"), Duration::ZERO);
        assert_eq!(strip_tags("{\\b1}bold{\\b0} and {\\i1}italic"), "bold and italic");
    }

    #[test]
    fn test_script_without_dialogue() {
        assert_eq!(convert_ass_to_srt("[Script Info]\nTitle: Empty\n"), "");
    }
}

// ============================================================================
// Shared stand-ins
// ============================================================================

/// Echo translator: prefixes every line with the target code.
struct EchoTranslator;

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate_line(&self, text: &str, target_code: &str) -> Result<LineTranslation> {
        Ok(LineTranslation::Translated(format!("[{}] {}", target_code, text)))
    }

    fn name(&self) -> &'static str {
        "Echo"
    }
}

struct FakeMkvToolNix {
    report: String,
    tracks: HashMap<u32, Vec<u8>>,
}

impl TrackTool for FakeMkvToolNix {
    fn report(&self, _input: &Path) -> Result<Option<String>> {
        Ok(Some(self.report.clone()))
    }

    fn extract(&self, _input: &Path, track_id: u32, output: &Path) -> Result<()> {
        let content = self
            .tracks
            .get(&track_id)
            .ok_or_else(|| MkvsubError::ExtractionFailure(format!("no track {}", track_id)))?;
        fs::write(output, content)?;
        Ok(())
    }
}

/// Writes the input back with the codec arguments prepended.
struct FakeFfmpeg {
    fail: bool,
}

impl Transcoder for FakeFfmpeg {
    fn transcode(&self, job: &TranscodeJob<'_>) -> Result<()> {
        if self.fail {
            return Err(MkvsubError::TranscodeFailure("Conversion failed!".to_string()));
        }
        let mut content = job.codec_args.join(" ").into_bytes();
        content.push(b'|');
        content.extend(fs::read(job.input)?);
        fs::write(job.output, content)?;
        Ok(())
    }
}

fn orchestrator(config: Config, fail_transcode: bool) -> Orchestrator {
    let tracks = FakeMkvToolNix {
        report: REPORT.to_string(),
        tracks: HashMap::from([(1, b"opus".to_vec()), (2, ASS.as_bytes().to_vec())]),
    };
    Orchestrator::new(
        config,
        Box::new(tracks),
        Box::new(FakeFfmpeg {
            fail: fail_transcode,
        }),
        Box::new(EchoTranslator),
    )
}

// ============================================================================
// Translation Integration Tests
// ============================================================================

mod translation_tests {
    use super::*;

    #[tokio::test]
    async fn test_translate_converted_srt() {
        let srt = convert_ass_to_srt(ASS);
        let translated = translate_srt(&srt, "fr", &EchoTranslator).await;

        assert_eq!(
            translated,
            "1\n00:00:01,200 --> 00:00:03,000\n[fr] Wait, what?\n\n2\n00:01:00,500 --> 00:01:02,750\n[fr] Fine.\n"
        );
    }

    #[tokio::test]
    async fn test_translation_keeps_cue_count() {
        let srt = convert_ass_to_srt(ASS);
        let translated = translate_srt(&srt, "de", &EchoTranslator).await;

        let before = parse_srt(&srt).unwrap();
        let after = parse_srt(&translated).unwrap();
        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            assert_eq!((a.index, a.start, a.end), (b.index, b.start, b.end));
        }
    }
}

// ============================================================================
// Pipeline Integration Tests
// ============================================================================

mod pipeline_tests {
    use super::*;

    fn input() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("episode.mkv");
        fs::write(&path, b"matroska").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_full_request_writes_all_artifacts() {
        let (dir, input) = input();
        let orch = orchestrator(Config::default(), false);
        let operations = Operations {
            extract_subtitles: true,
            extract_audio: true,
            convert_video: true,
        };
        let options = ProcessOptions {
            translate_to: Some("German".to_string()),
            audio_format: AudioFormat::Flac,
            video_format: VideoFormat::Mkv,
            resolution: "480p".to_string(),
        };

        let outcome = orch.process(&input, operations, &options).await.unwrap();
        let ProcessOutcome::Artifacts {
            artifacts,
            failures,
        } = outcome
        else {
            panic!("Expected artifacts");
        };
        assert!(failures.is_empty());

        let out_dir = dir.path().join("out");
        let written = write_artifacts(&out_dir, &artifacts).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec![
                "Dialogue_eng.ass",
                "Dialogue_eng.srt",
                "Dialogue_eng_German.srt",
                "Audio_1_jpn.flac",
                "episode_480p.mkv",
            ]
        );

        let translated = fs::read_to_string(out_dir.join("Dialogue_eng_German.srt")).unwrap();
        assert!(translated.contains("[de] Wait, what?"));

        let audio = fs::read(out_dir.join("Audio_1_jpn.flac")).unwrap();
        assert_eq!(audio, b"-vn -c:a flac|opus");
    }

    #[tokio::test]
    async fn test_video_only_failure_yields_diagnostic() {
        let (_dir, input) = input();
        let orch = orchestrator(Config::default(), true);
        let operations = Operations {
            convert_video: true,
            ..Operations::default()
        };
        let options = ProcessOptions::from_config(&Config::default());

        let outcome = orch.process(&input, operations, &options).await.unwrap();
        let ProcessOutcome::Diagnostic(diagnostic) = outcome else {
            panic!("Expected diagnostic");
        };

        assert_eq!(diagnostic.failures.len(), 1);
        assert_eq!(diagnostic.failures[0].category, Category::Video);
        assert!(diagnostic.to_string().contains("Conversion failed!"));
    }

    #[tokio::test]
    async fn test_strict_video_failure_is_an_error() {
        let (_dir, input) = input();
        let config = Config {
            strict_video: true,
            ..Config::default()
        };
        let orch = orchestrator(config, true);
        let operations = Operations {
            convert_video: true,
            ..Operations::default()
        };
        let options = ProcessOptions::from_config(&Config::default());

        let result = orch.process(&input, operations, &options).await;
        assert!(matches!(result, Err(MkvsubError::TranscodeFailure(_))));
    }
}
