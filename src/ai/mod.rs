//! Optional remote assistant with local fallbacks.
//!
//! - `AiBackend`: the remote operations, one method per endpoint
//! - `HttpBackend`: blocking reqwest implementation
//! - `AiService`: wraps an optional backend and always produces a result,
//!   falling back to the local suggester, receipt parser and analytics
//! - `SuggestionTracker`: debounce and staleness control for live suggestions
//! - `AiWorker`: background thread that runs the service for the TUI

mod debounce;
mod http;
mod service;
mod types;
mod worker;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

pub(crate) use debounce::{SuggestionRequest, SuggestionTracker};
pub(crate) use http::HttpBackend;
pub(crate) use service::{AiService, Assisted, Source};
pub(crate) use worker::{AiWorker, WorkerReply, WorkerRequest};

use std::path::Path;

use crate::error::AiError;
use types::{
    CategoryRequest, CategoryResponse, HealthResponse, InsightsRequest, InsightsResponse, ReceiptResponse,
    SpendingRequest, SpendingResponse,
};

/// Remote assistant operations. Implementations block; callers that must
/// stay responsive run them on a worker thread.
pub(crate) trait AiBackend: Send + Sync {
    fn suggest_category(&self, request: &CategoryRequest) -> Result<CategoryResponse, AiError>;

    /// Upload an image for OCR and extraction.
    fn process_receipt(&self, path: &Path) -> Result<ReceiptResponse, AiError>;

    fn predict_spending(&self, request: &SpendingRequest) -> Result<SpendingResponse, AiError>;

    fn advanced_insights(&self, request: &InsightsRequest) -> Result<InsightsResponse, AiError>;

    fn health(&self) -> Result<HealthResponse, AiError>;

    /// Base URL, for status display and logs.
    fn endpoint(&self) -> &str;
}
