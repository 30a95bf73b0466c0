//! Classification of bus messages
//!
//! Runs only on the bus event loop thread. Anything that has to change
//! supervisor state or reach the operator is forwarded through the UI
//! bridge, tagged with the session it belongs to.

use crate::pipeline::SessionId;
use crate::pipeline::backend::BusMessage;
use crate::ui::{SessionEvent, UiNotifier};
use log::{debug, error, info, trace, warn};

/// Exit code used when the stream ends normally.
pub const END_OF_STREAM_EXIT_CODE: i32 = 0;

pub struct BusDispatcher {
    session: SessionId,
    ui: UiNotifier,
    errors: u64,
    warnings: u64,
}

impl BusDispatcher {
    pub fn new(session: SessionId, ui: UiNotifier) -> Self {
        Self {
            session,
            ui,
            errors: 0,
            warnings: 0,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Number of error messages handled so far
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Number of warning messages handled so far
    pub fn warnings(&self) -> u64 {
        self.warnings
    }

    /// Handle one bus message. Returns whether to keep watching the bus.
    pub fn on_message(&mut self, message: BusMessage) -> bool {
        match message {
            BusMessage::Error {
                source_name,
                text,
                debug,
            } => {
                self.errors += 1;
                error!("Error received from element {}: {}", source_name, text);
                if let Some(detail) = debug {
                    debug!("Error detail: {}", detail);
                }
                self.ui.notify(
                    "Error",
                    format!("The stream failed in {source_name}: {text}"),
                );
                self.ui.report(
                    self.session,
                    SessionEvent::Failed { source_name, text },
                );
            }
            BusMessage::Warning {
                source_name,
                text,
                debug,
            } => {
                self.warnings += 1;
                warn!("Warning from element {}: {}", source_name, text);
                if let Some(detail) = debug {
                    debug!("Warning detail: {}", detail);
                }
            }
            BusMessage::EndOfStream => {
                info!("End of stream reached, exiting program");
                self.ui.report(self.session, SessionEvent::EndOfStream);
                self.ui.request_exit(END_OF_STREAM_EXIT_CODE);
            }
            BusMessage::StateChanged {
                source_name,
                old,
                current,
            } => {
                trace!("{}: {} -> {}", source_name, old, current);
            }
            BusMessage::Other => {}
        }

        true
    }
}
