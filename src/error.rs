use thiserror::Error;

#[derive(Error, Debug)]
pub enum MkvsubError {
    #[error("Malformed track report at line {line}: {message}")]
    MalformedReport { line: usize, message: String },

    #[error("Track extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailure(String),

    #[error("Invalid subtitle: {0}")]
    Subtitle(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("External tool not available: {0}")]
    ToolNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Processing cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, MkvsubError>;

/// Keep only the lines of a tool's output that describe a problem.
///
/// mkvtoolnix prints its errors on stdout, ffmpeg on stderr.
pub(crate) fn tool_message(stdout: &[u8], stderr: &[u8]) -> String {
    let combined = format!(
        "{}\n{}",
        String::from_utf8_lossy(stdout),
        String::from_utf8_lossy(stderr)
    );

    let lines: Vec<&str> = combined
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| {
            let lower = l.to_lowercase();
            lower.contains("error") || lower.contains("invalid") || lower.contains("no such")
        })
        .collect();

    if lines.is_empty() {
        combined
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .unwrap_or("unknown error")
            .to_string()
    } else {
        lines.join("; ")
    }
}
