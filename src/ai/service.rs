use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::path::Path;

use super::types::{budget_payload, CategoryRequest, InsightsRequest, ReceiptPayload, SpendingRequest};
use super::{AiBackend, HttpBackend};
use crate::analytics::{Insight, InsightGenerator, Prediction};
use crate::categorize::{CategorySuggester, Suggestion};
use crate::config::AiConfig;
use crate::error::AiError;
use crate::models::{round_amount, Category, Transaction, TxnType};
use crate::receipt::{self, ReceiptData};
use crate::state::AppState;

pub(crate) const OFFLINE_NOTICE: &str = "AI features offline - using manual entry";
pub(crate) const ONLINE_NOTICE: &str = "AI features enabled!";

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

/// Ratio band inside which the daily pace counts as stable.
const STABLE_BAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    Remote,
    Local,
}

/// A value from the remote backend or its local fallback. `notice` is set
/// when the user should hear about a change in assistant availability.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Assisted<T> {
    pub(crate) value: T,
    pub(crate) source: Source,
    pub(crate) notice: Option<String>,
}

impl<T> Assisted<T> {
    fn local(value: T) -> Self {
        Self {
            value,
            source: Source::Local,
            notice: None,
        }
    }

    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Assisted<U> {
        Assisted {
            value: f(self.value),
            source: self.source,
            notice: self.notice,
        }
    }
}

/// Expected expense over the rest of the month.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Forecast {
    pub(crate) days_ahead: u32,
    pub(crate) amount: f64,
    pub(crate) low: f64,
    pub(crate) high: f64,
    pub(crate) trend: String,
    pub(crate) factors: Vec<String>,
}

impl Forecast {
    /// Bounds come from the month average and the recent pace.
    pub(crate) fn local(prediction: &Prediction) -> Self {
        let days = f64::from(prediction.days_remaining);
        let (slow, fast) = if prediction.avg_daily <= prediction.recent_daily {
            (prediction.avg_daily, prediction.recent_daily)
        } else {
            (prediction.recent_daily, prediction.avg_daily)
        };

        let trend = if prediction.avg_daily <= 0.0 {
            "stable"
        } else {
            let ratio = prediction.recent_daily / prediction.avg_daily;
            if ratio > 1.0 + STABLE_BAND {
                "increasing"
            } else if ratio < 1.0 - STABLE_BAND {
                "decreasing"
            } else {
                "stable"
            }
        };

        Self {
            days_ahead: prediction.days_remaining,
            amount: prediction.projected_remaining,
            low: slow * days,
            high: fast * days,
            trend: trend.into(),
            factors: vec![
                format!("Data quality: {}", prediction.data_quality),
                format!("Average daily spending ${:.2}", prediction.avg_daily),
                format!("Recent daily spending ${:.2}", prediction.recent_daily),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    Unknown,
    Online,
    Offline,
}

pub(crate) struct AiService {
    backend: Option<Box<dyn AiBackend>>,
    suggester: CategorySuggester,
    availability: Availability,
}

impl AiService {
    pub(crate) fn new(backend: Option<Box<dyn AiBackend>>, suggester: CategorySuggester) -> Self {
        Self {
            backend,
            suggester,
            availability: Availability::Unknown,
        }
    }

    /// Build from config. A client that cannot be constructed leaves the
    /// service offline rather than failing startup.
    pub(crate) fn from_config(config: &AiConfig, suggester: CategorySuggester) -> Self {
        let backend = config.base_url.as_deref().and_then(|url| {
            match HttpBackend::new(url, config.timeout()) {
                Ok(backend) => Some(Box::new(backend) as Box<dyn AiBackend>),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to build AI client, running offline");
                    None
                }
            }
        });
        Self::new(backend, suggester)
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub(crate) fn endpoint(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.endpoint())
    }

    pub(crate) fn learn(&mut self, item: &str, category: Category) {
        self.suggester.learn(item, category);
    }

    // ── Availability ──────────────────────────────────────────

    fn succeeded<T>(&mut self, value: T) -> Assisted<T> {
        self.availability = Availability::Online;
        Assisted {
            value,
            source: Source::Remote,
            notice: None,
        }
    }

    /// Local result after a remote failure; the notice fires once per outage.
    fn fell_back<T>(&mut self, operation: &str, error: &AiError, value: T) -> Assisted<T> {
        tracing::warn!(operation, error = %error, "AI request failed, using local fallback");
        let notice = (self.availability != Availability::Offline).then(|| OFFLINE_NOTICE.to_string());
        self.availability = Availability::Offline;
        Assisted {
            value,
            source: Source::Local,
            notice,
        }
    }

    /// Check the backend. Announces when it becomes reachable.
    pub(crate) fn health(&mut self) -> Assisted<bool> {
        let Some(backend) = self.backend.as_deref() else {
            return Assisted::local(false);
        };
        match backend.health() {
            Ok(info) => {
                tracing::info!(
                    message = %info.message,
                    version = %info.version,
                    features = ?info.features,
                    "AI backend reachable"
                );
                let announce = self.availability != Availability::Online;
                let mut result = self.succeeded(true);
                if announce {
                    result.notice = Some(ONLINE_NOTICE.to_string());
                }
                result
            }
            Err(e) => self.fell_back("health", &e, false),
        }
    }

    // ── Category suggestion ───────────────────────────────────

    /// Learned mappings win outright; otherwise the remote answer is used
    /// when it names a category valid for `kind`.
    pub(crate) fn suggest_category(
        &mut self,
        item: &str,
        kind: TxnType,
        amount: Option<Decimal>,
        date: NaiveDate,
    ) -> Assisted<Suggestion> {
        let local = self.suggester.suggest(item, kind, amount);
        let learned = self.suggester.learned(item).filter(|c| c.kind() == kind);
        let Some(backend) = self.backend.as_deref() else {
            return Assisted::local(local);
        };
        if learned.is_some() || item.trim().is_empty() {
            return Assisted::local(local);
        }

        let request = CategoryRequest::new(item, kind, amount, date);
        let remote = backend.suggest_category(&request).and_then(|response| {
            let category = Category::parse_for(kind, &response.suggested_category).ok_or_else(|| {
                AiError::InvalidResponse(format!(
                    "category {} is not valid for {kind}",
                    response.suggested_category
                ))
            })?;
            Ok(Suggestion {
                category,
                confidence: response.confidence.clamp(0.0, 1.0),
                reasoning: response.reasoning,
                matched: Vec::new(),
            })
        });

        match remote {
            Ok(suggestion) => self.succeeded(suggestion),
            Err(e) => self.fell_back("suggest_category", &e, local),
        }
    }

    // ── Receipts ──────────────────────────────────────────────

    /// Images go to remote OCR; text files are parsed locally. The value is
    /// an error only when nothing at all can be extracted. A failed upload
    /// still reports the outage like any other fallback.
    pub(crate) fn process_receipt(&mut self, path: &Path) -> Assisted<Result<ReceiptData, AiError>> {
        if !is_image(path) {
            let parsed = std::fs::read_to_string(path)
                .map(|text| receipt::parse_text(&text))
                .map_err(AiError::from);
            return Assisted::local(parsed);
        }

        let Some(backend) = self.backend.as_deref() else {
            return Assisted::local(Err(AiError::NotConfigured));
        };
        let remote = backend.process_receipt(path).and_then(|response| {
            if !response.success {
                return Err(AiError::InvalidResponse(response.message));
            }
            response
                .data
                .map(receipt_from_payload)
                .ok_or_else(|| AiError::InvalidResponse("missing receipt data".into()))
        });

        match remote {
            Ok(data) => self.succeeded(Ok(data)),
            Err(e) => {
                tracing::warn!(file = %path.display(), "Receipt upload failed");
                self.fell_back("process_receipt", &e, ()).map(|()| Err(e))
            }
        }
    }

    // ── Forecast and insights ─────────────────────────────────

    pub(crate) fn predict_spending(&mut self, transactions: &[Transaction], prediction: &Prediction) -> Assisted<Forecast> {
        let local = Forecast::local(prediction);
        let Some(backend) = self.backend.as_deref() else {
            return Assisted::local(local);
        };

        let request = SpendingRequest {
            transactions: transactions
                .iter()
                .filter(|t| t.is_expense() && t.month == prediction.month)
                .map(Into::into)
                .collect(),
            days_ahead: prediction.days_remaining,
        };
        let remote = backend.predict_spending(&request).and_then(|response| {
            let (low, high) = response.confidence_interval;
            if !response.predicted_amount.is_finite() || response.predicted_amount < 0.0 || low > high {
                return Err(AiError::InvalidResponse("inconsistent spending forecast".into()));
            }
            Ok(Forecast {
                days_ahead: prediction.days_remaining,
                amount: response.predicted_amount,
                low,
                high,
                trend: response.trend,
                factors: response.factors,
            })
        });

        match remote {
            Ok(forecast) => self.succeeded(forecast),
            Err(e) => self.fell_back("predict_spending", &e, local),
        }
    }

    /// Local insights, merged with remote ones under the same ranking and cap.
    pub(crate) fn advanced_insights(
        &mut self,
        state: &AppState,
        generator: &InsightGenerator,
        local: Vec<Insight>,
    ) -> Assisted<Vec<Insight>> {
        let Some(backend) = self.backend.as_deref() else {
            return Assisted::local(local);
        };

        let request = InsightsRequest {
            transactions: state.transactions.all().iter().map(Into::into).collect(),
            budgets: budget_payload(&state.budgets),
            current_month: state.selected_month.to_string(),
        };
        match backend.advanced_insights(&request) {
            Ok(response) => {
                let remote = response
                    .insights
                    .into_iter()
                    .map(|i| Insight::remote(&i.kind, i.title, i.message, i.action, &i.priority))
                    .collect();
                let merged = generator.merge(local, remote);
                self.succeeded(merged)
            }
            Err(e) => self.fell_back("advanced_insights", &e, local),
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn receipt_from_payload(payload: ReceiptPayload) -> ReceiptData {
    ReceiptData {
        vendor: payload.vendor.filter(|v| !v.trim().is_empty()),
        amount: payload
            .amount
            .and_then(Decimal::from_f64)
            .map(round_amount)
            .filter(|a| *a > Decimal::ZERO),
        date: payload.date.as_deref().and_then(receipt::parse_date),
        suggested_category: payload
            .suggested_category
            .as_deref()
            .and_then(|c| Category::parse_for(TxnType::Expense, c)),
        confidence: payload.confidence.clamp(0.0, 1.0),
    }
}
