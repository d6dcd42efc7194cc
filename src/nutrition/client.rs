use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::analysis::{self, AnalysisReport, Rating};

#[derive(Debug, thiserror::Error)]
pub enum NutritionError {
    #[error("nutrition service unreachable")]
    Communication,
    #[error("nutrition service rejected the request (status {0})")]
    Request(u16),
    #[error("nutrition service failed (status {0})")]
    Server(u16),
    #[error("incorrect nutrition service response")]
    Response,
    #[error("could not set up HTTP client: {0}")]
    Setup(String),
}

type Result<T> = std::result::Result<T, NutritionError>;

/// What a capture produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    Barcode(String),
    Image(Vec<u8>),
}

impl ScanPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Barcode(_) => "barcode",
            Self::Image(_) => "image",
        }
    }

    /// JSON body: `{"input": code}` or `{"image": base64}`.
    pub fn to_request(&self) -> ScanRequest {
        match self {
            Self::Barcode(code) => ScanRequest {
                input: Some(code.trim().to_string()),
                image: None,
            },
            Self::Image(bytes) => ScanRequest {
                input: None,
                image: Some(STANDARD.encode(bytes)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Raw success body of the analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    #[serde(default, alias = "title")]
    pub product_title: Option<String>,
    #[serde(default)]
    pub nutrition_info: Option<String>,
    #[serde(default, alias = "gemini_output")]
    pub analysis: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
}

/// Response with the free-text fields parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub title: String,
    pub nutrition_info: Option<String>,
    pub report: AnalysisReport,
    pub rating: Option<Rating>,
}

impl From<ScanResponse> for ScanResult {
    fn from(response: ScanResponse) -> Self {
        Self {
            title: response
                .product_title
                .unwrap_or_else(|| "Unknown product".into()),
            nutrition_info: response.nutrition_info,
            report: response
                .analysis
                .as_deref()
                .map(analysis::parse_analysis)
                .unwrap_or_default(),
            rating: response.rating.as_deref().map(analysis::parse_rating),
        }
    }
}

#[mockall::automock]
#[async_trait]
pub trait NutritionService: Send + Sync {
    async fn analyze(&self, payload: &ScanPayload) -> Result<ScanResponse>;
}

pub struct HttpNutritionService {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpNutritionService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NutritionError::Setup(err.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify(status: StatusCode) -> Result<()> {
    if status.is_client_error() {
        Err(NutritionError::Request(status.as_u16()))
    } else if status.is_server_error() {
        Err(NutritionError::Server(status.as_u16()))
    } else if !status.is_success() {
        Err(NutritionError::Response)
    } else {
        Ok(())
    }
}

#[async_trait]
impl NutritionService for HttpNutritionService {
    async fn analyze(&self, payload: &ScanPayload) -> Result<ScanResponse> {
        tracing::info!(kind = payload.kind(), endpoint = %self.endpoint, "requesting nutrition analysis");
        self.client
            .post(&self.endpoint)
            .json(&payload.to_request())
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(%err, "nutrition request failed");
                NutritionError::Communication
            })
            .and_then(|resp| classify(resp.status()).map(|_| resp))?
            .json()
            .await
            .map_err(|err| {
                tracing::warn!(%err, "nutrition response could not be decoded");
                NutritionError::Response
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barcode_payload_uses_input_key() {
        let body = serde_json::to_value(ScanPayload::Barcode(" 016000141544 ".into()).to_request())
            .unwrap();
        assert_eq!(body, serde_json::json!({ "input": "016000141544" }));
    }

    #[test]
    fn image_payload_is_base64() {
        let body = serde_json::to_value(ScanPayload::Image(b"hello".to_vec()).to_request()).unwrap();
        assert_eq!(body, serde_json::json!({ "image": "aGVsbG8=" }));
    }

    #[test]
    fn response_accepts_either_analysis_key() {
        let legacy: ScanResponse = serde_json::from_str(
            r#"{"gemini_output": "**Pros**\n1. **A**: b\n**Cons**", "title": "Oats", "rating": "4 Good"}"#,
        )
        .unwrap();
        let result = ScanResult::from(legacy);
        assert_eq!(result.title, "Oats");
        assert_eq!(result.report.pros.len(), 1);
        assert_eq!(result.rating.and_then(|r| r.score), Some(4.0));

        let current: ScanResponse =
            serde_json::from_str(r#"{"product_title": "Milk", "analysis": null}"#).unwrap();
        assert_eq!(current.product_title.as_deref(), Some("Milk"));
        assert!(ScanResult::from(current).report.is_empty());
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(classify(StatusCode::OK).is_ok());
        assert!(matches!(
            classify(StatusCode::BAD_REQUEST),
            Err(NutritionError::Request(400))
        ));
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY),
            Err(NutritionError::Server(502))
        ));
        assert!(matches!(
            classify(StatusCode::MOVED_PERMANENTLY),
            Err(NutritionError::Response)
        ));
    }

    #[test]
    fn client_builds_with_timeout() {
        let service =
            HttpNutritionService::new("http://localhost:9/main", Duration::from_secs(1)).unwrap();
        assert_eq!(service.endpoint(), "http://localhost:9/main");
    }
}
