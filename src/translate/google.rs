//! Translation through the public Google Translate `translate_a/single` endpoint.

use crate::config::DEFAULT_TRANSLATE_ENDPOINT;
use crate::error::{MkvsubError, Result};
use crate::translate::{LineTranslation, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Translator backed by Google Translate with automatic source detection.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSLATE_ENDPOINT)
    }
}

impl GoogleTranslator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

/// Pull the translated text and the detected source language out of a response.
///
/// The body is a positional JSON array: element 0 lists the translated
/// segments (`[translated, original, ...]`), element 2 is the source language.
fn parse_response(body: &str) -> Result<(String, Option<String>)> {
    let value: Value = serde_json::from_str(body)?;

    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| MkvsubError::Translation("response has no translation segments".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    let source = value.get(2).and_then(Value::as_str).map(str::to_string);

    Ok((text, source))
}

/// `zh-CN` and `zh-TW` differ, but `en` matches `en-US`.
fn same_language(detected: &str, target: &str) -> bool {
    if detected.eq_ignore_ascii_case(target) {
        return true;
    }
    if detected.contains('-') && target.contains('-') {
        return false;
    }
    let primary = |code: &str| code.split('-').next().unwrap_or_default().to_ascii_lowercase();
    primary(detected) == primary(target)
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_line(&self, text: &str, target_code: &str) -> Result<LineTranslation> {
        if text.trim().is_empty() {
            return Ok(LineTranslation::Translated(text.to_string()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_code),
                ("dt", "t"),
                ("q", text),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| MkvsubError::Translation(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MkvsubError::Translation(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(MkvsubError::Translation(format!(
                "translation API error ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let (translated, source) = parse_response(&body)
            .map_err(|e| MkvsubError::Translation(format!("unexpected response: {}", e)))?;

        if let Some(source) = source {
            if same_language(&source, target_code) {
                debug!("Source and target language are identical ({})", source);
                return Ok(LineTranslation::AlreadyInTarget);
            }
        }

        if translated.is_empty() {
            return Err(MkvsubError::Translation("empty translation".to_string()));
        }

        Ok(LineTranslation::Translated(translated))
    }

    fn name(&self) -> &'static str {
        "Google Translate"
    }
}
