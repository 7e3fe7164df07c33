use std::collections::VecDeque;

use crate::models::{Category, MonthKey};
use crate::ui::Screen;

/// Something that happened to the application state. Mutators on
/// `AppState` return these; the UI queues them on the `EventBus`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AppEvent {
    TransactionAdded { id: String, month: MonthKey },
    TransactionDeleted { id: String, month: MonthKey },
    BudgetChanged { category: Category },
    MonthChanged(MonthKey),
    ScreenChanged(Screen),
    Imported { count: usize },
}

impl AppEvent {
    /// Whether the event changed data that must be written to disk.
    pub(crate) fn mutates_data(&self) -> bool {
        !matches!(self, Self::ScreenChanged(_))
    }

    /// Whether derived analytics are stale after this event.
    pub(crate) fn invalidates_analytics(&self) -> bool {
        !matches!(self, Self::ScreenChanged(_))
    }
}

pub(crate) trait EventObserver {
    fn on_event(&mut self, event: &AppEvent);
}

#[derive(Debug, Default)]
pub(crate) struct EventBus {
    queue: VecDeque<AppEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn emit(&mut self, event: AppEvent) {
        tracing::debug!(?event, "Event queued");
        self.queue.push_back(event);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Deliver every queued event, in order, to each observer. Returns the
    /// delivered events so the caller can act on them too.
    pub(crate) fn dispatch(&mut self, observers: &mut [&mut dyn EventObserver]) -> Vec<AppEvent> {
        let events: Vec<AppEvent> = self.queue.drain(..).collect();
        for event in &events {
            for observer in observers.iter_mut() {
                observer.on_event(event);
            }
        }
        events
    }
}
