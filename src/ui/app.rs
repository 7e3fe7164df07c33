use anyhow::Result;
use chrono::{Local, NaiveDate};
use std::time::{Duration, Instant};

use crate::ai::{Assisted, Source, SuggestionTracker, WorkerRequest};
use crate::analytics::{InsightGenerator, MonthReport, ReportCache};
use crate::categorize::CategorySuggester;
use crate::db::Database;
use crate::events::{AppEvent, EventBus, EventObserver};
use crate::models::{Category, Transaction, TxnType};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Transactions,
    Budgets,
    Insights,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Transactions, Self::Budgets, Self::Insights]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Transactions => write!(f, "Transactions"),
            Self::Budgets => write!(f, "Budgets"),
            Self::Insights => write!(f, "Insights"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone)]
pub(crate) enum PendingAction {
    DeleteTransaction { id: String, item: String },
}

/// Remote assistant status as shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AiStatus {
    Disabled,
    Checking,
    Online,
    Offline,
}

impl std::fmt::Display for AiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "AI off"),
            Self::Checking => write!(f, "AI …"),
            Self::Online => write!(f, "AI on"),
            Self::Offline => write!(f, "AI offline"),
        }
    }
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) today: NaiveDate,

    pub(crate) state: AppState,
    pub(crate) report: ReportCache,
    pub(crate) events: EventBus,

    // Category suggestions
    pub(crate) suggester: CategorySuggester,
    pub(crate) suggestions: SuggestionTracker,
    pub(crate) ai_status: AiStatus,
    pub(crate) insight_generation: u64,
    /// Requests for the background worker, drained by the event loop.
    pub(crate) outbox: Vec<WorkerRequest>,

    // Transactions
    pub(crate) transaction_index: usize,
    pub(crate) transaction_scroll: usize,

    // Budgets
    pub(crate) budget_index: usize,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(
        state: AppState,
        generator: InsightGenerator,
        suggester: CategorySuggester,
        debounce: Duration,
        ai_enabled: bool,
    ) -> Self {
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            today: Local::now().date_naive(),

            state,
            report: ReportCache::new(generator),
            events: EventBus::new(),

            suggester,
            suggestions: SuggestionTracker::new(debounce),
            ai_status: if ai_enabled { AiStatus::Checking } else { AiStatus::Disabled },
            insight_generation: 0,
            outbox: Vec::new(),

            transaction_index: 0,
            transaction_scroll: 0,

            budget_index: 0,

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    pub(crate) fn emit(&mut self, event: AppEvent) {
        self.events.emit(event);
    }

    pub(crate) fn switch_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.emit(AppEvent::ScreenChanged(screen));
        }
        self.set_status(format!("{screen}"));
    }

    /// Deliver queued events to the report cache and persist data changes.
    pub(crate) fn flush_events(&mut self, db: &mut Database) -> Result<()> {
        if self.events.is_empty() {
            return Ok(());
        }
        let report: &mut dyn EventObserver = &mut self.report;
        let delivered = self.events.dispatch(&mut [report]);
        if delivered.iter().any(AppEvent::mutates_data) {
            db.save_state(&self.state)?;
        }
        self.clamp_cursors();
        Ok(())
    }

    /// Rebuild the month report when it is stale. When it was
    /// rebuilt and the assistant is enabled, ask for remote insights.
    pub(crate) fn refresh_report(&mut self) {
        self.today = Local::now().date_naive();
        if !self.report.is_stale(&self.state, self.today) {
            return;
        }
        let local = self.report.get(&self.state, self.today).insights.clone();
        if self.ai_status != AiStatus::Disabled {
            self.insight_generation += 1;
            self.outbox.push(WorkerRequest::Insights {
                generation: self.insight_generation,
                state: Box::new(self.state.clone()),
                local,
            });
        }
    }

    pub(crate) fn month_report(&self) -> Option<&MonthReport> {
        self.report.current()
    }

    pub(crate) fn month_transactions(&self) -> Vec<&Transaction> {
        self.state.month_transactions()
    }

    pub(crate) fn selected_transaction(&self) -> Option<&Transaction> {
        self.month_transactions().get(self.transaction_index).copied()
    }

    /// Budget rows in display order: expense categories, then income.
    pub(crate) fn budget_rows(&self) -> Vec<Category> {
        TxnType::all()
            .iter()
            .rev()
            .flat_map(|kind| Category::all_for(*kind).iter().copied())
            .collect()
    }

    pub(crate) fn selected_budget(&self) -> Option<Category> {
        self.budget_rows().get(self.budget_index).copied()
    }

    /// Surface an availability notice and track assistant status.
    pub(crate) fn note_assisted<T>(&mut self, result: &Assisted<T>) {
        if self.ai_status == AiStatus::Disabled {
            return;
        }
        self.ai_status = match result.source {
            Source::Remote => AiStatus::Online,
            Source::Local if result.notice.is_some() => AiStatus::Offline,
            Source::Local => self.ai_status,
        };
        if let Some(notice) = &result.notice {
            self.set_status(notice.clone());
        }
    }

    /// Feed the command line to the suggestion tracker while typing `:add`.
    pub(crate) fn track_command_input(&mut self, now: Instant) {
        match super::commands::preview_add(&self.command_input) {
            Some(preview) => self.suggestions.input(&preview.item, preview.kind, now),
            None => self.suggestions.reset(),
        }
    }

    fn clamp_cursors(&mut self) {
        let len = self.month_transactions().len();
        if self.transaction_index >= len {
            self.transaction_index = len.saturating_sub(1);
        }
        if self.transaction_scroll > self.transaction_index {
            self.transaction_scroll = self.transaction_index;
        }
    }
}
