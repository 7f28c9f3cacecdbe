//! Blessing generation against the Gemini text API.
//!
//! [`BlessingClient::request_blessing`] never fails: any error (missing key,
//! transport, HTTP status, empty or malformed body) is logged and replaced
//! by [`Blessing::fallback`]. The network sits behind [`BlessingTransport`]
//! so the flow can be driven by in-process fakes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::BlessingConfig;
use crate::error::BlessingError;

/// Name used when the caller does not supply one.
pub const DEFAULT_NAME: &str = "Guest";

/// Message returned whenever generation fails.
pub const FALLBACK_MESSAGE: &str =
    "May your holidays be as timeless as gold and as deep as the emerald night.";

/// Atmospheric mood of a blessing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Elegant,
    Joyful,
    Mysterious,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Elegant, Mood::Joyful, Mood::Mysterious];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Elegant => "elegant",
            Mood::Joyful => "joyful",
            Mood::Mysterious => "mysterious",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated blessing. Parsing is strict: exactly `message` and `mood`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blessing {
    pub message: String,
    pub mood: Mood,
}

impl Blessing {
    pub fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            mood: Mood::Elegant,
        }
    }
}

/// Prompt for `name`.
pub fn build_prompt(name: &str) -> String {
    format!(
        "Generate a sophisticated, high-fashion, luxury Christmas blessing for someone named {name}. \
         The tone should be like a high-end jewelry brand commercial or a cinematic fantasy. \
         Avoid cliché phrases. Focus on gold, light, eternity, and brilliance. Max 30 words."
    )
}

/// Structured response schema sent with every request.
pub fn response_schema() -> Value {
    let moods: Vec<&str> = Mood::ALL.iter().map(Mood::as_str).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "message": {
                "type": "STRING",
                "description": "A short, poetic, high-end luxury Christmas blessing."
            },
            "mood": {
                "type": "STRING",
                "enum": moods,
                "description": "The atmospheric mood of the message."
            }
        },
        "required": ["message", "mood"]
    })
}

/// Transport-independent description of one generation call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// Display name the prompt was built for.
    pub name: String,
    pub prompt: String,
    pub schema: Value,
    pub temperature: f32,
}

impl GenerationRequest {
    /// Blank names fall back to [`DEFAULT_NAME`].
    pub fn for_name(name: Option<&str>, temperature: f32) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NAME)
            .to_string();
        Self {
            prompt: build_prompt(&name),
            name,
            schema: response_schema(),
            temperature,
        }
    }
}

/// Strictly parse the service's response text.
pub fn parse_blessing(text: &str) -> Result<Blessing, BlessingError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BlessingError::EmptyResponse);
    }
    Ok(serde_json::from_str(text)?)
}

/// Something that can turn a [`GenerationRequest`] into response text.
#[allow(async_fn_in_trait)]
pub trait BlessingTransport {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BlessingError>;
}

// ============================================================================
// Gemini wire format
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
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
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

/// HTTPS transport to the Gemini `generateContent` endpoint.
///
/// A `reqwest::Client` is built for each call and dropped afterwards; no
/// connection outlives a request.
#[derive(Clone, Debug)]
pub struct GeminiTransport {
    config: BlessingConfig,
}

impl GeminiTransport {
    pub fn new(config: BlessingConfig) -> Self {
        Self { config }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl BlessingTransport for GeminiTransport {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BlessingError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(BlessingError::MissingApiKey)?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
                temperature: request.temperature,
            },
        };

        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .build()?;

        log::debug!("Requesting blessing from {}", self.config.model);
        let res = client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(BlessingError::Status(res.status().as_u16()));
        }

        let body: GenerateContentResponse = res.json().await?;
        body.text().ok_or(BlessingError::EmptyResponse)
    }
}

/// Blessing client with fallback recovery.
pub struct BlessingClient<T> {
    transport: T,
    temperature: f32,
}

impl BlessingClient<GeminiTransport> {
    /// Client for the live service. A missing key is reported once here;
    /// each request then falls back.
    pub fn gemini(config: BlessingConfig) -> Self {
        if !config.has_api_key() {
            log::warn!("No API key configured; blessings will use the fallback text");
        }
        let temperature = config.temperature;
        Self::new(GeminiTransport::new(config), temperature)
    }
}

impl<T: BlessingTransport> BlessingClient<T> {
    pub fn new(transport: T, temperature: f32) -> Self {
        Self {
            transport,
            temperature,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One generation attempt with errors surfaced.
    pub async fn try_request(&self, name: Option<&str>) -> Result<Blessing, BlessingError> {
        let request = GenerationRequest::for_name(name, self.temperature);
        let text = self.transport.generate(&request).await?;
        parse_blessing(&text)
    }

    /// One generation attempt; failures yield [`Blessing::fallback`].
    pub async fn request_blessing(&self, name: Option<&str>) -> Blessing {
        match self.try_request(name).await {
            Ok(blessing) => blessing,
            Err(e) => {
                log::error!("Blessing generation failed: {}", e);
                Blessing::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    impl BlessingTransport for Canned {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, BlessingError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_parse_valid_blessing() {
        let b = parse_blessing(r#"{"message":"Gold endures.","mood":"joyful"}"#).unwrap();
        assert_eq!(b.message, "Gold endures.");
        assert_eq!(b.mood, Mood::Joyful);
    }

    #[test]
    fn test_parse_rejects_schema_deviations() {
        for bad in [
            r#"{"message":"x","mood":"sad"}"#,
            r#"{"message":"x"}"#,
            r#"{"message":"x","mood":"elegant","extra":1}"#,
            r#""just a string""#,
            "not json",
        ] {
            assert!(
                matches!(parse_blessing(bad), Err(BlessingError::Malformed(_))),
                "accepted {bad}"
            );
        }
        assert!(matches!(parse_blessing("  "), Err(BlessingError::EmptyResponse)));
    }

    #[test]
    fn test_request_defaults_name() {
        let request = GenerationRequest::for_name(None, 0.8);
        assert_eq!(request.name, "Guest");
        assert!(request.prompt.contains("someone named Guest."));
        assert!(request.prompt.ends_with("Max 30 words."));

        let request = GenerationRequest::for_name(Some("  "), 0.8);
        assert_eq!(request.name, "Guest");
        let request = GenerationRequest::for_name(Some("Ada"), 0.8);
        assert!(request.prompt.contains("named Ada."));
    }

    #[test]
    fn test_schema_lists_exactly_three_moods() {
        let schema = response_schema();
        let moods = schema["properties"]["mood"]["enum"].as_array().unwrap();
        assert_eq!(moods.len(), 3);
        assert_eq!(moods[0], "elegant");
        assert_eq!(schema["required"], json!(["message", "mood"]));
    }

    #[test]
    fn test_wire_body_shape() {
        let request = GenerationRequest::for_name(Some("Ada"), 0.8);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.schema,
                temperature: request.temperature,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert!(value["generationConfig"]["responseSchema"]["properties"]["mood"].is_object());
        assert!(value["contents"][0]["parts"][0]["text"].is_string());
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"message\":"},{"text":"\"Hi\",\"mood\":\"elegant\"}"}]}}]}"#,
        )
        .unwrap();
        let text = body.text().unwrap();
        assert_eq!(parse_blessing(&text).unwrap().message, "Hi");

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_falls_back() {
        let client = BlessingClient::gemini(BlessingConfig::default());
        let err = client.try_request(None).await.unwrap_err();
        assert!(matches!(err, BlessingError::MissingApiKey));
        assert_eq!(client.request_blessing(None).await, Blessing::fallback());
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let client = BlessingClient::new(Canned(r#"{"message": 3}"#), 0.8);
        assert_eq!(client.request_blessing(Some("Ada")).await, Blessing::fallback());
    }
}
