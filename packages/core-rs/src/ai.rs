use crate::error::ProspectError;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// One structured generation call: an instruction plus the JSON schema the
/// answer must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub schema: Value,
    pub grounded: bool,
}

/// Anything that can turn a [`GenerationRequest`] into raw response text.
pub trait GenerativeBackend {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ProspectError>;
}

impl<B: GenerativeBackend + ?Sized> GenerativeBackend for &B {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ProspectError> {
        (**self).generate(request)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    status: Option<String>,
}

fn extract_text(response: GeminiResponse) -> Option<String> {
    let parts = response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts?;
    let text: String = parts.into_iter().filter_map(|part| part.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Removes a surrounding markdown code fence, if the model added one.
pub fn strip_code_fence(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with("```") {
        let without_start = trimmed.trim_start_matches("```");
        let without_lang = without_start
            .strip_prefix("json")
            .or_else(|| without_start.strip_prefix("JSON"))
            .unwrap_or(without_start);
        return without_lang.trim().trim_end_matches("```").trim().to_string();
    }
    trimmed.to_string()
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GeminiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(code) => format!("{code}: {}", parsed.error.message),
            None => parsed.error.message,
        },
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => body.trim().to_string(),
    }
}

pub fn request_body(request: &GenerationRequest) -> Value {
    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{"text": request.prompt}]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema
        }
    });
    if request.grounded {
        body["tools"] = json!([{ "googleSearch": {} }]);
    }
    body
}

/// Google Gemini `generateContent` over blocking HTTP.
pub struct GeminiBackend {
    client: Client,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.unwrap_or_default(),
        }
    }
}

impl GenerativeBackend for GeminiBackend {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ProspectError> {
        let endpoint = format!("{GEMINI_ENDPOINT}/{}:generateContent", request.model);
        log::debug!(
            "generateContent model={} grounded={}",
            request.model,
            request.grounded
        );

        let response = self
            .client
            .post(endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(ProspectError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let parsed: GeminiResponse =
            serde_json::from_str(&body).map_err(|error| ProspectError::MalformedResponse {
                operation: "generateContent",
                detail: error.to_string(),
            })?;

        Ok(extract_text(parsed)
            .map(|text| strip_code_fence(&text))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": "[{\"name\""}, {"text": ":\"A\"}]"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(extract_text(response).as_deref(), Some("[{\"name\":\"A\"}]"));
    }

    #[test]
    fn missing_candidates_yield_no_text() {
        let response: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extract_text(response), None);
    }

    #[test]
    fn error_body_keeps_status_code_name() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            error_message(reqwest::StatusCode::TOO_MANY_REQUESTS, body),
            "RESOURCE_EXHAUSTED: Quota exceeded"
        );
    }

    #[test]
    fn grounded_requests_enable_search_tool() {
        let request = GenerationRequest {
            model: "m".to_string(),
            prompt: "find".to_string(),
            schema: json!({"type": "ARRAY"}),
            grounded: true,
        };
        let body = request_body(&request);
        assert_eq!(body["tools"][0], json!({"googleSearch": {}}));
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");

        let plain = request_body(&GenerationRequest {
            grounded: false,
            ..request
        });
        assert!(plain.get("tools").is_none());
    }
}
