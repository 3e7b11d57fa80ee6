//! Client for the hosted Gemini `generateContent` endpoint.

use crate::config::AppConfig;
use crate::error::{PredictionError, REQUEST_FALLBACK_MESSAGE};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One structured-output completion: prompt in, raw response text out.
pub trait CompletionService: Send + Sync {
    fn generate(&self, prompt: &str, schema: &Value) -> Result<String, PredictionError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<OutPart<'a>>,
}

#[derive(Serialize)]
struct OutPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
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
    parts: Vec<InPart>,
}

#[derive(Deserialize)]
struct InPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    /// The request runs until the service answers or the connection fails;
    /// reqwest's default 30s total timeout is switched off.
    pub fn new(config: &AppConfig) -> Result<Self, PredictionError> {
        let http = Client::builder().timeout(None).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl CompletionService for GeminiClient {
    fn generate(&self, prompt: &str, schema: &Value) -> Result<String, PredictionError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![OutPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "sending generateContent");

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }

        extract_text(&text)
    }
}

// Longest non-envelope error body shown to the user verbatim.
const MAX_PLAIN_ERROR_LEN: usize = 200;

fn api_error(status: u16, body: &str) -> PredictionError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return PredictionError::request(envelope.error.message);
    }

    tracing::warn!(status, body_len = body.len(), "service returned an unrecognised error body");
    let body = body.trim();
    let plain = !body.is_empty()
        && body.len() <= MAX_PLAIN_ERROR_LEN
        && !body.contains('<')
        && !body.contains('\n');
    if plain {
        PredictionError::request(body)
    } else {
        PredictionError::request(format!("{} (HTTP {status})", REQUEST_FALLBACK_MESSAGE))
    }
}

fn extract_text(body: &str) -> Result<String, PredictionError> {
    let parsed: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "could not decode generateContent envelope");
        PredictionError::MalformedResponse
    })?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        tracing::error!("generateContent returned no candidate text");
        return Err(PredictionError::MalformedResponse);
    }
    Ok(text)
}
