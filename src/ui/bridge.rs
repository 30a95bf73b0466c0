//! Cross-thread requests to the UI thread
//!
//! The bus event loop never touches the supervisor or any widget. It
//! enqueues [`UiRequest`]s on an unbounded channel and the UI shell drains
//! them from its own timer callback, applying each one in FIFO order.

use crate::pipeline::{PipelineSupervisor, SessionId};
use log::{debug, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::mpsc::error::TryRecvError;

/// Lifecycle events the pipeline reported for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Failed { source_name: String, text: String },
    EndOfStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    /// Show a message to the operator
    Notify { title: String, message: String },
    /// Apply a bus event to the supervisor
    Session { id: SessionId, event: SessionEvent },
    /// Tear down and leave the process with this code
    Exit(i32),
}

/// What the UI shell has to do after a request was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    None,
    Show { title: String, message: String },
    Exit(i32),
}

/// Sending side, cloneable and usable from any thread. Never blocks.
#[derive(Debug, Clone)]
pub struct UiNotifier {
    tx: UnboundedSender<UiRequest>,
}

impl UiNotifier {
    fn send(&self, request: UiRequest) -> bool {
        match self.tx.send(request) {
            Ok(()) => true,
            Err(e) => {
                warn!("UI is gone, dropping request {:?}", e.0);
                false
            }
        }
    }

    /// Ask the UI thread to display `title`/`message`.
    pub fn notify(&self, title: impl Into<String>, message: impl Into<String>) -> bool {
        self.send(UiRequest::Notify {
            title: title.into(),
            message: message.into(),
        })
    }

    pub fn report(&self, id: SessionId, event: SessionEvent) -> bool {
        self.send(UiRequest::Session { id, event })
    }

    pub fn request_exit(&self, code: i32) -> bool {
        self.send(UiRequest::Exit(code))
    }
}

/// Receiving side, owned by the UI thread.
#[derive(Debug)]
pub struct UiInbox {
    rx: UnboundedReceiver<UiRequest>,
}

impl UiInbox {
    /// Next pending request, without waiting.
    pub fn try_next(&mut self) -> Option<UiRequest> {
        match self.rx.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Every pending request, oldest first.
    pub fn drain(&mut self) -> Vec<UiRequest> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

pub fn channel() -> (UiNotifier, UiInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UiNotifier { tx }, UiInbox { rx })
}

/// Apply one request on the UI thread.
pub fn apply(supervisor: &mut PipelineSupervisor, request: UiRequest) -> UiAction {
    match request {
        UiRequest::Notify { title, message } => UiAction::Show { title, message },
        UiRequest::Session { id, event } => {
            supervisor.apply_event(id, event);
            UiAction::None
        }
        UiRequest::Exit(code) => {
            debug!("Exit requested with code {}", code);
            UiAction::Exit(code)
        }
    }
}

/// Message waiting to be shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// Result of applying every request pending in the inbox.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Pending {
    pub notices: Vec<Notice>,
    pub exit: Option<i32>,
}

/// Apply every pending request without waiting on anything. Notices are
/// collected for the shell to display; an exit request ends the batch.
pub fn apply_pending(supervisor: &mut PipelineSupervisor, inbox: &mut UiInbox) -> Pending {
    let mut pending = Pending::default();
    while let Some(request) = inbox.try_next() {
        match apply(supervisor, request) {
            UiAction::None => {}
            UiAction::Show { title, message } => pending.notices.push(Notice { title, message }),
            UiAction::Exit(code) => {
                pending.exit = Some(code);
                break;
            }
        }
    }
    pending
}
