//! Dedicated thread servicing the pipeline bus
//!
//! The thread runs its own single-threaded runtime, independent from the
//! UI loop, and waits on whichever comes first: the next bus message or
//! the shutdown token.

use crate::pipeline::SessionId;
use crate::pipeline::backend::BusMessage;
use crate::pipeline::dispatcher::BusDispatcher;
use log::{debug, error, info};
use std::thread::JoinHandle;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

const THREAD_NAME: &str = "bus-event-loop";

pub struct EventLoopThread;

impl EventLoopThread {
    /// Start servicing `bus` with `dispatcher` on a new OS thread.
    pub fn spawn(
        bus: UnboundedReceiver<BusMessage>,
        dispatcher: BusDispatcher,
    ) -> std::io::Result<EventLoopHandle> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build();
        Self::spawn_on(runtime, bus, dispatcher)
    }

    /// Run the loop on an already built runtime, failing before any thread
    /// exists when the runtime could not be built.
    fn spawn_on(
        runtime: std::io::Result<Runtime>,
        bus: UnboundedReceiver<BusMessage>,
        dispatcher: BusDispatcher,
    ) -> std::io::Result<EventLoopHandle> {
        let runtime = runtime.inspect_err(|e| {
            error!("Failed to build the bus event loop runtime: {}", e);
        })?;
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let session = dispatcher.session();

        let thread = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(runtime, bus, dispatcher, token))?;

        info!("Bus event loop started for session {}", session);
        Ok(EventLoopHandle {
            session,
            cancel,
            thread: Some(thread),
        })
    }
}

fn run(
    runtime: Runtime,
    mut bus: UnboundedReceiver<BusMessage>,
    mut dispatcher: BusDispatcher,
    cancel: CancellationToken,
) {
    runtime.block_on(async {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Bus event loop cancelled");
                    break;
                }
                message = bus.recv() => {
                    match message {
                        Some(message) => {
                            if !dispatcher.on_message(message) {
                                debug!("Dispatcher stopped watching the bus");
                                break;
                            }
                        }
                        None => {
                            // watch released
                            debug!("Bus closed");
                            break;
                        }
                    }
                }
            }
        }
    });

    info!(
        "Bus event loop for session {} finished ({} errors, {} warnings)",
        dispatcher.session(),
        dispatcher.errors(),
        dispatcher.warnings()
    );
}

/// Owner of the event loop thread; cancels and joins on shutdown or drop.
pub struct EventLoopHandle {
    session: SessionId,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl EventLoopHandle {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Whether the thread has returned.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Signal the loop to stop and wait for the thread to exit.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Bus event loop for session {} panicked", self.session);
            }
        }
    }
}

impl Drop for EventLoopHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::wait_until;
    use crate::ui::{self, UiRequest};
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;

    #[test]
    fn test_keeps_servicing_after_error() {
        let (notifier, mut inbox) = ui::channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut handle =
            EventLoopThread::spawn(rx, BusDispatcher::new(SessionId::next(), notifier)).unwrap();

        tx.send(BusMessage::Error {
            source_name: "rtspsrc0".into(),
            text: "Unhandled error".into(),
            debug: None,
        })
        .unwrap();
        tx.send(BusMessage::EndOfStream).unwrap();

        let mut seen = Vec::new();
        assert!(wait_until(Duration::from_secs(2), || {
            seen.extend(inbox.drain());
            seen.contains(&UiRequest::Exit(0))
        }));
        assert!(!handle.is_finished());

        handle.shutdown();
        assert!(handle.is_finished());
    }

    #[test]
    fn test_shutdown_joins_idle_loop() {
        let (notifier, _inbox) = ui::channel();
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut handle =
            EventLoopThread::spawn(rx, BusDispatcher::new(SessionId::next(), notifier)).unwrap();

        let started = Instant::now();
        handle.shutdown();
        assert!(handle.is_finished());
        assert!(started.elapsed() < Duration::from_secs(1));

        // second shutdown is a no-op
        handle.shutdown();
    }

    #[test]
    fn test_exits_when_bus_closes() {
        let (notifier, _inbox) = ui::channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle =
            EventLoopThread::spawn(rx, BusDispatcher::new(SessionId::next(), notifier)).unwrap();

        drop(tx);
        assert!(wait_until(Duration::from_secs(2), || handle.is_finished()));
    }

    #[test]
    fn test_runtime_failure_spawns_nothing() {
        let (notifier, _inbox) = ui::channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let runtime = Err(std::io::Error::other("no timer driver"));

        let result =
            EventLoopThread::spawn_on(runtime, rx, BusDispatcher::new(SessionId::next(), notifier));

        assert!(result.is_err());
        // nobody is left servicing the bus
        assert!(tx.is_closed());
    }
}
