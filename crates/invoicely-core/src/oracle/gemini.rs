//! Google Generative Language (Gemini) adapter.

use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::schema::{EXTRACTION_PROMPT, response_schema};
use super::{Credential, CredentialCheck, CredentialProblem, InvoiceOracle, MIN_CREDENTIAL_LEN};
use crate::error::{ExtractionError, InvoicelyError, Result};
use crate::models::config::OracleConfig;
use crate::models::document::RawDocument;
use crate::models::invoice::ExtractedFields;

const API_KEY_HEADER: &str = "x-goog-api-key";
const KEY_CHECK_PROMPT: &str = "Say \"OK\" in one word.";
const KEY_CHECK_MAX_TOKENS: u32 = 5;

/// Gemini client for invoice extraction and credential checks.
pub struct GeminiClient {
    http: Client,
    config: OracleConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: OracleConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("invoicely/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InvoicelyError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Request body asking for schema-constrained JSON at low temperature.
    pub fn extraction_request(&self, document: &RawDocument) -> Value {
        let data = base64::engine::general_purpose::STANDARD.encode(&document.bytes);

        json!({
            "contents": [{
                "parts": [
                    { "inline_data": { "mime_type": document.media_type, "data": data } },
                    { "text": EXTRACTION_PROMPT }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
                "temperature": self.config.temperature
            }
        })
    }

    async fn generate(
        &self,
        body: &Value,
        credential: &Credential,
    ) -> std::result::Result<String, ApiFailure> {
        let start = Instant::now();

        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, credential.expose())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, timeout = e.is_timeout(), "Oracle request failed");
                ApiFailure::Transport(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiFailure::Transport(format!("failed to read response body: {e}")))?;

        debug!(
            status = %status,
            latency_ms = start.elapsed().as_millis() as u64,
            "Received oracle response"
        );

        if !status.is_success() {
            return Err(ApiFailure::Status {
                status,
                error: serde_json::from_str::<ErrorEnvelope>(&text)
                    .map(|e| e.error)
                    .unwrap_or_default(),
                body: text,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl InvoiceOracle for GeminiClient {
    async fn extract(
        &self,
        document: &RawDocument,
        credential: &Credential,
    ) -> std::result::Result<ExtractedFields, ExtractionError> {
        if credential.is_missing() {
            return Err(ExtractionError::MissingCredential);
        }

        debug!(
            document = %document.filename,
            media_type = %document.media_type,
            bytes = document.bytes.len(),
            "Requesting extraction"
        );

        let body = self.extraction_request(document);
        let text = self
            .generate(&body, credential)
            .await
            .map_err(ApiFailure::into_extraction_error)?;

        parse_generate_response(&text)
    }

    async fn check_credential(&self, credential: &Credential) -> CredentialCheck {
        if credential.expose().chars().count() < MIN_CREDENTIAL_LEN {
            return CredentialCheck::rejected(CredentialProblem::TooShort);
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": KEY_CHECK_PROMPT }] }],
            "generationConfig": { "maxOutputTokens": KEY_CHECK_MAX_TOKENS }
        });

        match self.generate(&body, credential).await {
            Ok(_) => CredentialCheck::accepted(),
            Err(failure) => {
                warn!(error = %failure.message(), "API key validation failed");
                CredentialCheck::rejected(failure.into_credential_problem())
            }
        }
    }
}

/// Pull the JSON text out of a `generateContent` response and parse the fields.
pub(crate) fn parse_generate_response(
    body: &str,
) -> std::result::Result<ExtractedFields, ExtractionError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ExtractionError::Failed(format!("malformed oracle response: {e}")))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ExtractionError::Failed("No data returned from Gemini".to_string()));
    }

    serde_json::from_str(&text).map_err(|e| {
        ExtractionError::Failed(format!("response does not match the invoice schema: {e}"))
    })
}

/// Non-success outcome of a `generateContent` call.
#[derive(Debug)]
enum ApiFailure {
    Transport(String),
    Status {
        status: StatusCode,
        error: ApiError,
        body: String,
    },
}

impl ApiFailure {
    fn message(&self) -> String {
        match self {
            ApiFailure::Transport(msg) => msg.clone(),
            ApiFailure::Status { status, error, body } => match &error.message {
                Some(msg) => format!("{status}: {msg}"),
                None => format!("{status}: {body}"),
            },
        }
    }

    fn is_resource_exhausted(&self) -> bool {
        match self {
            ApiFailure::Transport(_) => false,
            ApiFailure::Status { status, error, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS
                    || error.status.as_deref() == Some("RESOURCE_EXHAUSTED")
            }
        }
    }

    fn into_extraction_error(self) -> ExtractionError {
        if self.is_resource_exhausted() {
            ExtractionError::RateLimited(self.message())
        } else {
            ExtractionError::Failed(self.message())
        }
    }

    fn into_credential_problem(self) -> CredentialProblem {
        if self.is_resource_exhausted() {
            return CredentialProblem::QuotaExhausted;
        }

        match &self {
            ApiFailure::Status { status, error, .. } => {
                let key_invalid = error.details.iter().any(|d| {
                    matches!(d.reason.as_deref(), Some("API_KEY_INVALID") | Some("API_KEY_EXPIRED"))
                });
                let message = error.message.as_deref().unwrap_or_default();

                if key_invalid
                    || message.contains("API key not valid")
                    || matches!(*status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
                {
                    CredentialProblem::Rejected
                } else if message.to_lowercase().contains("quota") {
                    CredentialProblem::QuotaExhausted
                } else {
                    CredentialProblem::Other(self.message())
                }
            }
            ApiFailure::Transport(msg) => CredentialProblem::Other(msg.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::Currency;
    use mockito::Matcher;

    const PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";
    const KEY: &str = "test-key-0123456789";

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(OracleConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn document() -> RawDocument {
        RawDocument::new("fatura.png", "image/png", b"fake-png".to_vec())
    }

    fn envelope(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
        })
        .to_string()
    }

    const FIELDS_JSON: &str = r#"{"vendor_name":"Migros","tax_id":"1234567890","invoice_date":"2024-02-10","invoice_number":"GIB2024","currency":"TRY","subtotal":100,"tax_rate":20,"tax_amount":20,"grand_total":120}"#;

    #[test]
    fn test_extraction_request_shape() {
        let body = client("http://localhost").extraction_request(&document());
        let parts = &body["contents"][0]["parts"];

        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[0]["inline_data"]["data"], "ZmFrZS1wbmc=");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["generationConfig"]["temperature"].as_f64().unwrap() < 0.2);
        assert!(body["generationConfig"]["responseSchema"]["required"].is_array());
    }

    #[test]
    fn test_parse_generate_response() {
        let fields = parse_generate_response(&envelope(FIELDS_JSON)).unwrap();
        assert_eq!(fields.vendor_name.as_deref(), Some("Migros"));
        assert_eq!(fields.currency, Currency::Try);
        assert_eq!(fields.grand_total, 120.0);
    }

    #[test]
    fn test_parse_empty_text_fails() {
        let err = parse_generate_response(&envelope("  ")).unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));

        let err = parse_generate_response(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));
    }

    #[test]
    fn test_parse_schema_violation_fails() {
        let err = parse_generate_response(&envelope(r#"{"vendor_name":"X","currency":"PLN","subtotal":1,"grand_total":1}"#))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));

        let err = parse_generate_response("not json").unwrap_err();
        assert!(matches!(err, ExtractionError::Failed(_)));
    }

    #[tokio::test]
    async fn test_extract_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_header(API_KEY_HEADER, KEY)
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(envelope(FIELDS_JSON))
            .create_async()
            .await;

        let fields = client(&server.url())
            .extract(&document(), &Credential::new(KEY))
            .await
            .unwrap();

        assert_eq!(fields.invoice_number.as_deref(), Some("GIB2024"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_extract_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(429)
            .with_body(r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .extract(&document(), &Credential::new(KEY))
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_extract_server_error_is_not_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(500)
            .with_body(r#"{"error":{"code":500,"message":"Internal error","status":"INTERNAL"}}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .extract(&document(), &Credential::new(KEY))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExtractionError::Failed("500 Internal Server Error: Internal error".to_string())
        );
    }

    #[tokio::test]
    async fn test_extract_without_credential_makes_no_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", PATH).expect(0).create_async().await;

        let err = client(&server.url())
            .extract(&document(), &Credential::new(""))
            .await
            .unwrap_err();

        assert_eq!(err, ExtractionError::MissingCredential);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_credential_too_short() {
        let check = client("http://127.0.0.1:9")
            .check_credential(&Credential::new("short"))
            .await;
        assert_eq!(check.problem, Some(CredentialProblem::TooShort));
    }

    #[tokio::test]
    async fn test_check_credential_outcomes() {
        let mut server = mockito::Server::new_async().await;

        let ok = server
            .mock("POST", PATH)
            .match_header(API_KEY_HEADER, "good-key-0123456789")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "maxOutputTokens": 5 }
            })))
            .with_status(200)
            .with_body(envelope("OK"))
            .create_async()
            .await;
        server
            .mock("POST", PATH)
            .match_header(API_KEY_HEADER, "bad-key-0123456789")
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#)
            .create_async()
            .await;
        server
            .mock("POST", PATH)
            .match_header(API_KEY_HEADER, "spent-key-0123456789")
            .with_status(429)
            .with_body(r#"{"error":{"code":429,"message":"You exceeded your current quota","status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let gemini = client(&server.url());

        assert!(gemini.check_credential(&Credential::new("good-key-0123456789")).await.valid);
        assert_eq!(
            gemini.check_credential(&Credential::new("bad-key-0123456789")).await.problem,
            Some(CredentialProblem::Rejected)
        );
        assert_eq!(
            gemini.check_credential(&Credential::new("spent-key-0123456789")).await.problem,
            Some(CredentialProblem::QuotaExhausted)
        );
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_credential_plain_bad_request_is_other() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"Invalid JSON payload received.","status":"INVALID_ARGUMENT"}}"#)
            .create_async()
            .await;

        let check = client(&server.url())
            .check_credential(&Credential::new("fine-key-0123456789"))
            .await;

        assert!(!check.valid);
        match check.problem {
            Some(CredentialProblem::Other(msg)) => assert!(msg.contains("Invalid JSON payload")),
            other => panic!("expected Other, got {other:?}"),
        }
    }
}
