//! Line-oriented translation of SRT documents.
//!
//! The document is rewritten line by line rather than cue by cue, so index
//! lines, time ranges and blank separators come out byte for byte as they
//! went in.

pub mod google;
pub mod languages;

pub use google::GoogleTranslator;
pub use languages::LanguageTable;

use crate::error::{MkvsubError, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Leading byte order mark; kept out of line classification and restored on output.
const BYTE_ORDER_MARK: &str = "\u{feff}";

/// Outcome of translating one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTranslation {
    Translated(String),
    /// The text is already in the target language; keep it as is.
    AlreadyInTarget,
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_line(&self, text: &str, target_code: &str) -> Result<LineTranslation>;
    fn name(&self) -> &'static str;
}

/// Whether a line carries subtitle text (as opposed to an index, a time range or a separator).
pub fn is_translatable(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !trimmed.bytes().all(|b| b.is_ascii_digit())
        && !line.contains("-->")
}

/// Translate the text lines of an SRT document.
///
/// Failures stay local to their line: they are written inline as
/// `[Translation error: ...]` and the rest of the document is still produced.
pub async fn translate_srt(content: &str, target_code: &str, translator: &dyn Translator) -> String {
    translate_srt_with_progress(content, target_code, translator, |_, _| {}).await
}

/// Same as [`translate_srt`], reporting `(done, total)` text lines after each request.
pub async fn translate_srt_with_progress<F>(
    content: &str,
    target_code: &str,
    translator: &dyn Translator,
    mut progress_callback: F,
) -> String
where
    F: FnMut(usize, usize),
{
    let (bom, content) = match content.strip_prefix(BYTE_ORDER_MARK) {
        Some(rest) => (BYTE_ORDER_MARK, rest),
        None => ("", content),
    };

    let total = content
        .split('\n')
        .filter(|line| is_translatable(line))
        .count();
    debug!(
        "Translating {} line(s) to {} with {}",
        total,
        target_code,
        translator.name()
    );

    let mut done = 0;
    let mut output = Vec::new();

    for line in content.split('\n') {
        let (body, line_end) = match line.strip_suffix('\r') {
            Some(body) => (body, "\r"),
            None => (line, ""),
        };

        if !is_translatable(body) {
            output.push(line.to_string());
            continue;
        }

        let result = translator.translate_line(body, target_code).await;
        output.push(format!("{}{}", render_line(body, result), line_end));

        done += 1;
        progress_callback(done, total);
    }

    format!("{}{}", bom, output.join("\n"))
}

fn render_line(original: &str, result: Result<LineTranslation>) -> String {
    match result {
        Ok(LineTranslation::Translated(text)) => text,
        Ok(LineTranslation::AlreadyInTarget) => original.to_string(),
        Err(e) => {
            warn!("Translation of '{}' failed: {}", original, e);
            let reason = match e {
                MkvsubError::Translation(message) => message,
                other => other.to_string(),
            };
            format!("[Translation error: {}]", reason)
        }
    }
}
