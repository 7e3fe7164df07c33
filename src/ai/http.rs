//! Blocking HTTP client for the remote assistant.

use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use super::types::{
    CategoryRequest, CategoryResponse, HealthResponse, InsightsRequest, InsightsResponse, ReceiptResponse,
    SpendingRequest, SpendingResponse,
};
use super::AiBackend;
use crate::error::AiError;

/// Talks to `{base_url}/suggest-category` and friends. `base_url` normally
/// ends in `/api`; the health check hits the root above it.
pub(crate) struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Result<Self, AiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(super) fn root_url(&self) -> &str {
        self.base_url.strip_suffix("/api").unwrap_or(&self.base_url)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<T, AiError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(url = %url, "AI request");
        let response = self.client.post(&url).json(body).send()?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AiError::Status(status.as_u16()));
    }
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|e| AiError::InvalidResponse(e.to_string()))
}

impl AiBackend for HttpBackend {
    fn suggest_category(&self, request: &CategoryRequest) -> Result<CategoryResponse, AiError> {
        self.post_json("suggest-category", request)
    }

    fn process_receipt(&self, path: &Path) -> Result<ReceiptResponse, AiError> {
        let form = multipart::Form::new().file("file", path)?;
        let url = format!("{}/process-receipt", self.base_url);
        tracing::debug!(url = %url, file = %path.display(), "AI receipt upload");
        let response = self.client.post(&url).multipart(form).send()?;
        decode(response)
    }

    fn predict_spending(&self, request: &SpendingRequest) -> Result<SpendingResponse, AiError> {
        self.post_json("predict-spending", request)
    }

    fn advanced_insights(&self, request: &InsightsRequest) -> Result<InsightsResponse, AiError> {
        self.post_json("advanced-insights", request)
    }

    fn health(&self) -> Result<HealthResponse, AiError> {
        let response = self.client.get(format!("{}/", self.root_url())).send()?;
        decode(response)
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}
