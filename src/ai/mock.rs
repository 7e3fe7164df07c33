//! Scripted backend for tests.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::types::{
    CategoryRequest, CategoryResponse, HealthResponse, InsightsRequest, InsightsResponse, ReceiptPayload,
    ReceiptResponse, RemoteInsight, SpendingRequest, SpendingResponse,
};
use super::AiBackend;
use crate::error::AiError;

/// Answers every call with a fixed payload, or fails with a 503 while
/// `healthy` is false. Clones share the switch and the call counter.
#[derive(Clone)]
pub(crate) struct MockBackend {
    pub(crate) healthy: Arc<AtomicBool>,
    pub(crate) calls: Arc<AtomicUsize>,
    pub(crate) category: String,
}

impl MockBackend {
    pub(crate) fn new(category: &str) -> Self {
        Self {
            healthy: Arc::new(AtomicBool::new(true)),
            calls: Arc::new(AtomicUsize::new(0)),
            category: category.to_string(),
        }
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AiError::Status(503))
        }
    }
}

impl AiBackend for MockBackend {
    fn suggest_category(&self, _request: &CategoryRequest) -> Result<CategoryResponse, AiError> {
        self.check()?;
        Ok(CategoryResponse {
            suggested_category: self.category.clone(),
            confidence: 0.9,
            reasoning: "Remote model".into(),
        })
    }

    fn process_receipt(&self, _path: &Path) -> Result<ReceiptResponse, AiError> {
        self.check()?;
        Ok(ReceiptResponse {
            success: true,
            message: "Receipt processed successfully".into(),
            data: Some(ReceiptPayload {
                vendor: Some("Kroger".into()),
                amount: Some(23.456),
                date: Some("2026-02-03".into()),
                suggested_category: Some("Grocery".into()),
                confidence: 1.0,
            }),
        })
    }

    fn predict_spending(&self, request: &SpendingRequest) -> Result<SpendingResponse, AiError> {
        self.check()?;
        Ok(SpendingResponse {
            predicted_amount: 10.0 * f64::from(request.days_ahead),
            confidence_interval: (5.0, 20.0),
            trend: "increasing".into(),
            factors: vec!["weekend spending".into()],
        })
    }

    fn advanced_insights(&self, _request: &InsightsRequest) -> Result<InsightsResponse, AiError> {
        self.check()?;
        Ok(InsightsResponse {
            insights: vec![RemoteInsight {
                kind: "warning".into(),
                title: "Dining Out Rising".into(),
                message: "Restaurant visits doubled.".into(),
                action: "Cook at home twice a week".into(),
                priority: "high".into(),
            }],
        })
    }

    fn health(&self) -> Result<HealthResponse, AiError> {
        self.check()?;
        Ok(HealthResponse {
            message: "Budget AI Backend is running!".into(),
            version: "1.0.0".into(),
            features: vec!["categorization".into(), "receipt_ocr".into()],
        })
    }

    fn endpoint(&self) -> &str {
        "mock://ai"
    }
}
