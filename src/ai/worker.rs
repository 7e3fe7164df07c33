use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use super::{AiService, Assisted, SuggestionRequest};
use crate::analytics::{Insight, InsightGenerator};
use crate::categorize::Suggestion;
use crate::models::{Category, MonthKey};
use crate::receipt::ReceiptData;
use crate::state::AppState;

#[derive(Debug)]
pub(crate) enum WorkerRequest {
    Health,
    Suggest {
        request: SuggestionRequest,
        amount: Option<Decimal>,
        date: NaiveDate,
    },
    Learn {
        item: String,
        category: Category,
    },
    Receipt(PathBuf),
    Insights {
        generation: u64,
        state: Box<AppState>,
        local: Vec<Insight>,
    },
}

#[derive(Debug)]
pub(crate) enum WorkerReply {
    Health(Assisted<bool>),
    Suggestion {
        generation: u64,
        result: Assisted<Suggestion>,
    },
    Receipt {
        path: PathBuf,
        result: Assisted<Result<ReceiptData, String>>,
    },
    Insights {
        generation: u64,
        month: MonthKey,
        result: Assisted<Vec<Insight>>,
    },
}

/// One background thread that owns the [`AiService`] and runs its blocking
/// calls in request order. Dropping the worker closes the channel and lets
/// the thread finish its current call and exit.
pub(crate) struct AiWorker {
    requests: Option<Sender<WorkerRequest>>,
    replies: Receiver<WorkerReply>,
    handle: Option<JoinHandle<()>>,
}

impl AiWorker {
    pub(crate) fn spawn(mut service: AiService, generator: InsightGenerator) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<WorkerReply>();

        let handle = thread::Builder::new()
            .name("budgetrack-ai".into())
            .spawn(move || {
                for request in request_rx {
                    let reply = match handle_request(&mut service, &generator, request) {
                        Some(reply) => reply,
                        None => continue,
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                tracing::debug!("AI worker stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
        })
    }

    pub(crate) fn send(&self, request: WorkerRequest) {
        let sent = self.requests.as_ref().is_some_and(|tx| tx.send(request).is_ok());
        if !sent {
            tracing::warn!("AI worker is gone, request dropped");
        }
    }

    /// Next finished reply, if any, without blocking.
    pub(crate) fn try_recv(&self) -> Option<WorkerReply> {
        match self.replies.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for AiWorker {
    fn drop(&mut self) {
        self.requests.take();
        // In-flight HTTP calls are bounded by the client timeout
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_request(service: &mut AiService, generator: &InsightGenerator, request: WorkerRequest) -> Option<WorkerReply> {
    match request {
        WorkerRequest::Health => Some(WorkerReply::Health(service.health())),
        WorkerRequest::Suggest { request, amount, date } => Some(WorkerReply::Suggestion {
            generation: request.generation,
            result: service.suggest_category(&request.item, request.kind, amount, date),
        }),
        WorkerRequest::Learn { item, category } => {
            service.learn(&item, category);
            None
        }
        WorkerRequest::Receipt(path) => {
            let result = service.process_receipt(&path).map(|r| r.map_err(|e| e.to_string()));
            Some(WorkerReply::Receipt { path, result })
        }
        WorkerRequest::Insights {
            generation,
            state,
            local,
        } => Some(WorkerReply::Insights {
            generation,
            month: state.selected_month,
            result: service.advanced_insights(&state, generator, local),
        }),
    }
}
