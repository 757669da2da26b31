//! The AI curator: short archive copy about a piece, produced by the
//! hosted generative-language service.

use std::collections::VecDeque;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Local;
use log::{info, warn};
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::config::{self, RawlineConfig};
use crate::error::{RawlineError, Result};
use crate::models::AnalysisResult;

/// Prompt sent when the operator submits only an image.
pub const AUTOSCAN_PROMPT: &str = "AUTOSCAN:RECOGNITION";

const SYSTEM_INSTRUCTION: &str = "\
You are the curator for RAWLINE, a vintage fashion archive.
Your tone is street-aware, calm, and observational.
You are NOT poetic, corporate, or academic.
You use natural slang like \"been outside\", \"valid\", \"pressure\", \"motion\", but keep it subtle and grounded.

Example tone:
\"This piece been outside. The wear adds character, not damage. Fabric still holding shape, that's why it made the archive.\"

Analyze the artifact based on silhouette, wear, and history.
Format your response strictly as JSON.";

/// Image attached to an analysis request.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Raw bytes; encoded on the way out.
    Bytes { mime_type: String, data: Vec<u8> },
    /// Already base64, optionally as a `data:` URL.
    Base64 { mime_type: String, data: String },
}

impl ImageInput {
    pub fn jpeg(data: Vec<u8>) -> Self {
        ImageInput::Bytes {
            mime_type: "image/jpeg".to_string(),
            data,
        }
    }

    fn to_inline(&self) -> Value {
        let (mime_type, data) = match self {
            ImageInput::Bytes { mime_type, data } => (mime_type.as_str(), STANDARD.encode(data)),
            ImageInput::Base64 { mime_type, data } => {
                (mime_type.as_str(), strip_data_url(data).to_string())
            }
        };
        json!({ "inlineData": { "mimeType": mime_type, "data": data } })
    }
}

/// Drop a `data:<mime>;base64,` prefix if there is one.
pub fn strip_data_url(data: &str) -> &str {
    match data.split_once(',') {
        Some((head, body)) if head.starts_with("data:") => body,
        _ => data,
    }
}

pub trait Curator: Send {
    fn analyze(&self, prompt: &str, image: Option<&ImageInput>) -> Result<AnalysisResult>;
}

// ---------------------------------------------------------------------------
// GeminiCurator
// ---------------------------------------------------------------------------

pub struct GeminiCurator {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiCurator {
    pub fn new(config: &RawlineConfig, timeout: Option<Duration>) -> Result<Self> {
        let api_key = config.gemini_api_key.clone().ok_or_else(|| {
            RawlineError::InvalidArgument("No generative API key configured".into())
        })?;
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            api_key,
            model: config.gemini_model.clone(),
        })
    }
}

/// Body of a `generateContent` call with the fixed instruction and schema.
pub fn build_request(prompt: &str, image: Option<&ImageInput>) -> Value {
    let prompt = if prompt.trim().is_empty() {
        AUTOSCAN_PROMPT
    } else {
        prompt
    };
    let mut parts = vec![json!({ "text": prompt })];
    if let Some(image) = image {
        parts.push(image.to_inline());
    }

    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "era": {
                        "type": "STRING",
                        "description": "Historical period (e.g., 'Late 90s Archive')"
                    },
                    "styleNotes": {
                        "type": "STRING",
                        "description": "Observational analysis of the fit, wear, and vibe."
                    },
                    "reworkSuggestion": {
                        "type": "STRING",
                        "description": "Suggestion for styling or reworking."
                    },
                    "rawlineScore": {
                        "type": "NUMBER",
                        "description": "Archival suitability score (0-100)."
                    }
                },
                "required": ["era", "styleNotes", "reworkSuggestion", "rawlineScore"]
            }
        }
    })
}

/// Pull the JSON answer out of a `generateContent` response and parse it.
///
/// Empty text and schema-invalid JSON are both `AiResponse` errors; no
/// partial result is ever returned.
pub fn parse_response(body: &Value) -> Result<AnalysisResult> {
    let text: String = body
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(RawlineError::AiResponse("Empty response from AI".into()));
    }
    let result: AnalysisResult = serde_json::from_str(text.trim())
        .map_err(|e| RawlineError::AiResponse(format!("unparseable answer: {}", e)))?;
    result.validate()?;
    Ok(result)
}

/// Parse a raw `generateContent` response body. An empty or non-JSON
/// body is an `AiResponse` error like any other unusable answer.
pub fn parse_body(text: &str) -> Result<AnalysisResult> {
    if text.trim().is_empty() {
        return Err(RawlineError::AiResponse("Empty response from AI".into()));
    }
    let body: Value = serde_json::from_str(text)
        .map_err(|e| RawlineError::AiResponse(format!("unreadable response body: {}", e)))?;
    parse_response(&body)
}

impl Curator for GeminiCurator {
    fn analyze(&self, prompt: &str, image: Option<&ImageInput>) -> Result<AnalysisResult> {
        let url = format!(
            "{}/models/{}:generateContent",
            config::GEMINI_BASE,
            self.model
        );
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(prompt, image))
            .send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body: Value = resp.json().unwrap_or(Value::Null);
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("generation failed")
                .to_string();
            return Err(RawlineError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        parse_body(&resp.text()?)
    }
}

// ---------------------------------------------------------------------------
// CuratorPanel — UI-side request flow
// ---------------------------------------------------------------------------

const LOG_CAPACITY: usize = 11;

const SCAN_STEPS: [&str; 5] = [
    "DECRYPT_BYTE_STREAM",
    "MAPPING_INITIALIZED",
    "ISOLATING_VECTORS",
    "ARCHIVE_CROSSREF",
    "VIABILITY_CHECK",
];

#[derive(Debug, Clone, PartialEq)]
pub enum CuratorState {
    Idle,
    Analyzing,
    Complete(AnalysisResult),
    Failed(String),
}

/// One analysis surface: the pending input, the last outcome, and a short
/// activity log.
pub struct CuratorPanel<'a> {
    curator: &'a dyn Curator,
    state: CuratorState,
    image: Option<ImageInput>,
    log: VecDeque<String>,
}

impl<'a> CuratorPanel<'a> {
    pub fn new(curator: &'a dyn Curator) -> Self {
        Self {
            curator,
            state: CuratorState::Idle,
            image: None,
            log: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn state(&self) -> &CuratorState {
        &self.state
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            CuratorState::Complete(r) => Some(r),
            _ => None,
        }
    }

    pub fn log(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    pub fn attach_image(&mut self, name: &str, image: ImageInput) {
        self.push_log(format!("SIGNAL_IN: {}", name.to_uppercase()));
        self.image = Some(image);
        self.push_log("STREAM_READY".to_string());
    }

    /// Run one analysis. Does nothing when there is neither prompt nor
    /// image.
    pub fn analyze(&mut self, prompt: &str) -> &CuratorState {
        if prompt.trim().is_empty() && self.image.is_none() {
            return &self.state;
        }
        self.state = CuratorState::Analyzing;
        self.log.clear();
        self.push_log("INIT: CURATOR".to_string());
        for step in SCAN_STEPS {
            self.push_log(step.to_string());
        }

        match self.curator.analyze(prompt, self.image.as_ref()) {
            Ok(result) => {
                info!("Curator scored piece {}", result.rawline_score);
                self.push_log("COMPLETE: LOG_GEN".to_string());
                self.state = CuratorState::Complete(result);
            }
            Err(e) => {
                warn!("Curator analysis failed: {}", e);
                self.push_log("CRITICAL: PARSE_ERROR".to_string());
                self.state = CuratorState::Failed(e.to_string());
            }
        }
        &self.state
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log
            .push_back(format!("[{}] {}", Local::now().format("%H:%M:%S"), line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_prompt_and_strips_data_url() {
        let image = ImageInput::Base64 {
            mime_type: "image/jpeg".into(),
            data: "data:image/jpeg;base64,QUJD".into(),
        };
        let body = build_request("  ", Some(&image));
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], AUTOSCAN_PROMPT);
        assert_eq!(parts[1]["inlineData"]["data"], "QUJD");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"][3],
            "rawlineScore"
        );
    }

    #[test]
    fn raw_bytes_are_base64_encoded() {
        let body = build_request("jacket", Some(&ImageInput::jpeg(b"ABC".to_vec())));
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "QUJD");
    }

    #[test]
    fn parses_joined_text_parts() {
        let body = json!({
            "candidates": [{ "content": { "parts": [
                { "text": "{\"era\":\"Late 90s\",\"styleNotes\":\"been outside\"," },
                { "text": "\"reworkSuggestion\":\"crop it\",\"rawlineScore\":88}" }
            ]}}]
        });
        let result = parse_response(&body).unwrap();
        assert_eq!(result.era, "Late 90s");
        assert_eq!(result.rawline_score, 88.0);
    }

    #[test]
    fn empty_and_invalid_answers_are_errors() {
        let empty = json!({ "candidates": [{ "content": { "parts": [{ "text": "" }] } }] });
        assert!(matches!(parse_response(&empty), Err(RawlineError::AiResponse(_))));
        assert!(matches!(parse_response(&json!({})), Err(RawlineError::AiResponse(_))));

        let partial = json!({ "candidates": [{ "content": { "parts": [
            { "text": "{\"era\":\"90s\"}" }
        ]}}]});
        assert!(matches!(parse_response(&partial), Err(RawlineError::AiResponse(_))));

        let out_of_range = json!({ "candidates": [{ "content": { "parts": [
            { "text": "{\"era\":\"90s\",\"styleNotes\":\"a\",\"reworkSuggestion\":\"b\",\"rawlineScore\":140}" }
        ]}}]});
        assert!(matches!(parse_response(&out_of_range), Err(RawlineError::AiResponse(_))));
    }

    #[test]
    fn unusable_http_body_is_an_answer_error() {
        for body in ["", "   ", "<html>502</html>"] {
            let err = parse_body(body).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::AiResponse, "body {:?}", body);
        }
        let ok = r#"{"candidates":[{"content":{"parts":[{"text":"{\"era\":\"90s\",\"styleNotes\":\"a\",\"reworkSuggestion\":\"b\",\"rawlineScore\":70}"}]}}]}"#;
        assert_eq!(parse_body(ok).unwrap().rawline_score, 70.0);
    }
}
