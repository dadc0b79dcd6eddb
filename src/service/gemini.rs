//! Gemini `generateContent` transport.
//!
//! Images travel as inline base64 parts; the reply body handed back to the
//! invoker is the first candidate's concatenated text. Retry decisions stay
//! out of this file: non-2xx statuses are passed through in the response.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CallError, Payload, ServiceRequest, ServiceResponse, ServiceTransport};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("reqwest client build never fails with default TLS config");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

#[derive(Serialize)]
struct InlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

fn build_body(payload: &Payload) -> GenerateContentRequest<'_> {
    let parts = match payload {
        Payload::Text { prompt } => vec![Part { text: Some(prompt), inline_data: None }],
        Payload::Vision { prompt, images } => {
            let mut parts = vec![Part { text: Some(prompt), inline_data: None }];
            parts.extend(images.iter().map(|img| Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: &img.mime_type,
                    data: &img.data_b64,
                }),
            }));
            parts
        }
    };
    GenerateContentRequest { contents: vec![Content { parts }] }
}

/// Concatenate the first candidate's text parts.
fn extract_text(body: &str) -> Result<String, CallError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| CallError::Parse(e.to_string()))?;
    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CallError::Schema("response has no candidates".into()))?;
    let text = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    Ok(text)
}

#[async_trait]
impl ServiceTransport for GeminiClient {
    async fn send(&self, request: &ServiceRequest) -> Result<ServiceResponse, CallError> {
        let url = self.endpoint(&request.model);
        let body = build_body(&request.payload);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            // Let the invoker decide: 429 retries, everything else fails fast.
            return Ok(ServiceResponse { status, body: raw });
        }

        let text = extract_text(&raw)?;
        Ok(ServiceResponse { status, body: text })
    }
}
