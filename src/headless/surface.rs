//! Presentation surface that turns coordinator callbacks into events

use std::sync::Mutex;

use tracing::trace;

use locswitch_app::{ErrorIndicator, LocationObserver, SpooferSession, StatusSink};
use locswitch_core::{ConnectionStatus, Coordinate};

use super::{HeadlessEvent, OutputFormat};

/// Emits status, error badge and location events
///
/// Status events are only written when the status actually changes, since
/// the coordinator reasserts "connected" on every selection.
#[derive(Debug)]
pub struct EventSurface {
    format: OutputFormat,
    last_status: Mutex<Option<ConnectionStatus>>,
}

impl EventSurface {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            last_status: Mutex::new(None),
        }
    }

    pub fn emit(&self, event: HeadlessEvent) {
        event.emit(self.format);
    }
}

impl StatusSink for EventSurface {
    fn set_status(&self, status: ConnectionStatus) {
        let mut last = self.last_status.lock().unwrap_or_else(|e| e.into_inner());
        if *last == Some(status) {
            return;
        }
        *last = Some(status);
        self.emit(HeadlessEvent::status(status));
    }
}

impl ErrorIndicator for EventSurface {
    fn show(&self) {
        self.emit(HeadlessEvent::error_indicator(true));
    }

    fn hide(&self) {
        self.emit(HeadlessEvent::error_indicator(false));
    }
}

impl LocationObserver for EventSurface {
    fn will_change_location(&self, session: &SpooferSession, to: Option<Coordinate>) {
        trace!("[{}] location about to change to {:?}", session.device().id, to);
    }

    fn did_change_location(&self, session: &SpooferSession, to: Option<Coordinate>) {
        self.emit(HeadlessEvent::location(&session.device().id, to));
    }
}
