use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{AspectRatio, ImageRef, Quality};

#[cfg(feature = "studio-http")]
use super::settings::{StudioSettings, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Message fragment the service returns when the selected key is not usable.
pub const CREDENTIAL_ERROR_SIGNATURE: &str = "Requested entity was not found";

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum GenerationError {
    #[error("image service rejected the credential: {0}")]
    CredentialRejected(String),
    #[error("image service request failed: {0}")]
    RequestFailed(String),
    #[error("invalid image service endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("invalid image service response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub quality: Quality,
}

/// Base64 image payload as the service returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn to_image_ref(&self) -> ImageRef {
        ImageRef::data_uri(&self.mime_type, &self.data)
    }
}

pub trait ImageGenerator: Send + Sync {
    /// `Ok(None)` means the service answered but produced no image.
    fn generate_image(
        &self,
        api_key: Option<&str>,
        request: &GenerationRequest,
    ) -> Result<Option<InlineImage>, GenerationError>;
}

/// Offline generator that renders a flat SVG placeholder in the requested
/// aspect ratio. Lets a shell be wired without network or credentials.
pub struct MockImageGenerator;

impl ImageGenerator for MockImageGenerator {
    fn generate_image(
        &self,
        _api_key: Option<&str>,
        request: &GenerationRequest,
    ) -> Result<Option<InlineImage>, GenerationError> {
        let (width, height) = match request.aspect_ratio {
            AspectRatio::Landscape => (1600, 900),
            AspectRatio::Portrait => (900, 1600),
            AspectRatio::Square => (1200, 1200),
            AspectRatio::Standard => (1200, 900),
        };
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\
<rect width=\"100%\" height=\"100%\" fill=\"#0f4c4c\"/>\
<text x=\"50%\" y=\"50%\" fill=\"#d4a373\" font-size=\"48\" text-anchor=\"middle\">Preview {q}</text></svg>",
            w = width,
            h = height,
            q = request.quality.as_str(),
        );
        Ok(Some(InlineImage {
            mime_type: "image/svg+xml".into(),
            data: BASE64_STANDARD.encode(svg.as_bytes()),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPart {
    inline_data: Option<InlineImage>,
}

fn first_inline_image(body: &str) -> Result<Option<InlineImage>, GenerationError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| GenerationError::InvalidResponse(err.to_string()))?;
    Ok(parsed
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data.filter(|img| !img.data.is_empty())))
}

#[derive(Debug, Deserialize)]
struct ServiceErrorEnvelope {
    error: Option<ServiceErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ServiceErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorDetail {
    reason: Option<String>,
}

fn parse_service_error(status: u16, text: &str) -> GenerationError {
    if let Ok(ServiceErrorEnvelope { error: Some(err) }) =
        serde_json::from_str::<ServiceErrorEnvelope>(text)
    {
        let message = err.message.unwrap_or_default();
        let status_text = err.status.unwrap_or_default();
        let key_invalid = err
            .details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"));
        if message.contains(CREDENTIAL_ERROR_SIGNATURE)
            || status_text == "UNAUTHENTICATED"
            || key_invalid
        {
            return GenerationError::CredentialRejected(message);
        }
        let mut parts: Vec<String> = Vec::new();
        if !status_text.trim().is_empty() {
            parts.push(status_text);
        }
        if !message.trim().is_empty() {
            parts.push(message);
        }
        if !parts.is_empty() {
            return GenerationError::RequestFailed(format!(
                "HTTP {}: {}",
                status,
                parts.join(" - ")
            ));
        }
    }
    let fallback = text.trim();
    if fallback.is_empty() {
        GenerationError::RequestFailed(format!("HTTP {}: (empty response)", status))
    } else {
        GenerationError::RequestFailed(format!("HTTP {}: {}", status, fallback))
    }
}

#[cfg(feature = "studio-http")]
pub struct HttpImageGenerator {
    endpoint: String,
    model: String,
    timeout: std::time::Duration,
}

#[cfg(feature = "studio-http")]
impl HttpImageGenerator {
    pub fn from_settings(settings: &StudioSettings) -> Self {
        // 0 means "not configured", never "fail immediately".
        let secs = match settings.request_timeout_secs {
            0 => DEFAULT_REQUEST_TIMEOUT_SECS,
            secs => secs,
        };
        Self {
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            timeout: std::time::Duration::from_secs(secs),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        self.timeout
    }

    fn build_endpoint(&self) -> Result<url::Url, GenerationError> {
        let base = self.endpoint.trim();
        if base.is_empty() {
            return Err(GenerationError::InvalidEndpoint("endpoint is empty".into()));
        }
        let mut url = url::Url::parse(base)
            .map_err(|err| GenerationError::InvalidEndpoint(err.to_string()))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|err| GenerationError::InvalidEndpoint(err.to_string()))
    }
}

#[cfg(feature = "studio-http")]
impl ImageGenerator for HttpImageGenerator {
    fn generate_image(
        &self,
        api_key: Option<&str>,
        request: &GenerationRequest,
    ) -> Result<Option<InlineImage>, GenerationError> {
        use serde_json::json;
        let url = self.build_endpoint()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| GenerationError::RequestFailed(describe_request_error(&err)))?;
        let payload = json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "imageConfig": {
                    "aspectRatio": request.aspect_ratio.as_str(),
                    "imageSize": request.quality.as_str(),
                }
            }
        });
        let mut req = client.post(url).json(&payload);
        if let Some(key) = api_key {
            req = req.header("x-goog-api-key", key);
        }
        let response = req
            .send()
            .map_err(|err| GenerationError::RequestFailed(describe_request_error(&err)))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| GenerationError::RequestFailed(describe_request_error(&err)))?;
        if !status.is_success() {
            return Err(parse_service_error(status.as_u16(), &text));
        }
        first_inline_image(&text)
    }
}

/// Flattens a reqwest error and its causes into one line, flagging timeouts.
#[cfg(feature = "studio-http")]
fn describe_request_error(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    };
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
