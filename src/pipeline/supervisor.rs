//! Owner of the viewing pipeline
//!
//! `PipelineSupervisor` lives on the UI thread. It is the only place that
//! creates, drives and destroys the pipeline, and the only writer of
//! [`PipelineState`]. Bus events reach it as [`SessionEvent`]s applied by
//! the UI thread, never directly from the event loop thread.

use crate::pipeline::backend::{MediaBackend, RenderRect, RenderSurface, TargetState};
use crate::pipeline::description::{OVERLAY_STAGE, SourceLocator, StageDescription, StageOptions};
use crate::pipeline::dispatcher::BusDispatcher;
use crate::pipeline::error::SupervisorError;
use crate::pipeline::event_loop::{EventLoopHandle, EventLoopThread};
use crate::pipeline::handle::{PipelineHandle, WatchSubscription};
use crate::pipeline::state::PipelineState;
use crate::ui::{SessionEvent, UiNotifier};
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Identifies one connected pipeline, from `connect` to `teardown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        SessionId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reference time for the timestamp overlay, fixed at connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayEpoch(DateTime<Local>);

impl OverlayEpoch {
    pub fn now() -> Self {
        OverlayEpoch(Local::now())
    }

    pub fn time(&self) -> DateTime<Local> {
        self.0
    }
}

struct Session {
    id: SessionId,
    locator: SourceLocator,
    epoch: OverlayEpoch,
    // dropped in declaration order: callback first, pipeline last
    watch: WatchSubscription,
    event_loop: EventLoopHandle,
    pipeline: PipelineHandle,
}

pub struct PipelineSupervisor {
    backend: Box<dyn MediaBackend>,
    options: StageOptions,
    ui: UiNotifier,
    state: PipelineState,
    session: Option<Session>,
}

impl PipelineSupervisor {
    pub fn new(backend: Box<dyn MediaBackend>, options: StageOptions, ui: UiNotifier) -> Self {
        Self {
            backend,
            options,
            ui,
            state: PipelineState::Uninitialized,
            session: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.state.is_playing()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn overlay_epoch(&self) -> Option<OverlayEpoch> {
        self.session.as_ref().map(|s| s.epoch)
    }

    pub fn locator(&self) -> Option<&SourceLocator> {
        self.session.as_ref().map(|s| &s.locator)
    }

    /// Build the pipeline for `locator`, bind it to `surface` and start
    /// watching its bus.
    pub fn connect(
        &mut self,
        locator: &SourceLocator,
        surface: &dyn RenderSurface,
    ) -> Result<(), SupervisorError> {
        self.try_connect(locator, surface)
            .inspect_err(|e| warn!("Connect to {} failed: {}", locator, e))
    }

    fn try_connect(
        &mut self,
        locator: &SourceLocator,
        surface: &dyn RenderSurface,
    ) -> Result<(), SupervisorError> {
        if self.session.is_some() {
            return Err(SupervisorError::AlreadyConnected);
        }

        let description = StageDescription::new(locator.clone(), self.options.clone());
        debug!("Pipeline description: {}", description);
        let pipeline = PipelineHandle::new(
            self.backend
                .construct(&description)
                .map_err(SupervisorError::ConstructionError)?,
        );

        let handle = surface.window_handle();
        if handle.is_null() {
            return Err(SupervisorError::SurfaceError(String::from(
                "window handle is 0",
            )));
        }
        pipeline
            .bind_surface(handle, surface.render_rectangle())
            .map_err(|e| SupervisorError::SurfaceError(e.to_string()))?;

        let epoch = OverlayEpoch::now();
        if let Err(e) = pipeline.set_overlay_epoch(OVERLAY_STAGE, epoch.time()) {
            warn!("Timestamp overlay not configured: {}", e);
        }

        let id = SessionId::next();
        let (bus_tx, bus_rx) = mpsc::unbounded_channel();
        let watch = pipeline
            .watch(bus_tx)
            .map_err(SupervisorError::WatchRegistrationError)?;
        let event_loop = EventLoopThread::spawn(bus_rx, BusDispatcher::new(id, self.ui.clone()))?;

        // Every step succeeded: only now does the session exist.
        self.session = Some(Session {
            id,
            locator: locator.clone(),
            epoch,
            watch,
            event_loop,
            pipeline,
        });
        self.state = PipelineState::Connected;
        info!("Connected to {} (session {})", locator, id);
        Ok(())
    }

    /// Start or resume playback.
    pub fn start(&mut self) -> Result<(), SupervisorError> {
        self.try_start()
            .inspect_err(|e| warn!("Cannot start streaming: {}", e))
    }

    fn try_start(&mut self) -> Result<(), SupervisorError> {
        let Some(session) = self.session.as_mut() else {
            return Err(SupervisorError::NotConnected);
        };
        match self.state {
            PipelineState::Playing => return Err(SupervisorError::AlreadyStreaming),
            PipelineState::Error | PipelineState::EndOfStream => {
                return Err(SupervisorError::SessionTerminated(self.state));
            }
            _ => {}
        }

        session
            .pipeline
            .set_state(TargetState::Playing)
            .map_err(SupervisorError::StateChangeError)?;
        self.state = PipelineState::Playing;
        info!("Start playing streaming");
        Ok(())
    }

    /// Pause playback.
    pub fn stop(&mut self) -> Result<(), SupervisorError> {
        self.try_stop()
            .inspect_err(|e| warn!("Cannot stop streaming: {}", e))
    }

    fn try_stop(&mut self) -> Result<(), SupervisorError> {
        if self.state != PipelineState::Playing {
            return Err(SupervisorError::NotStreaming);
        }
        let Some(session) = self.session.as_mut() else {
            return Err(SupervisorError::NotStreaming);
        };

        session
            .pipeline
            .set_state(TargetState::Paused)
            .map_err(SupervisorError::StateChangeError)?;
        self.state = PipelineState::Paused;
        info!("Pause playing streaming");
        Ok(())
    }

    /// Stop the pipeline and release everything the session holds.
    /// Calling it without a session does nothing.
    pub fn teardown(&mut self) {
        let Some(mut session) = self.session.take() else {
            self.state = PipelineState::Uninitialized;
            return;
        };

        info!("Tearing down session {}", session.id);
        if let Err(e) = session.pipeline.set_state(TargetState::Null) {
            warn!("Failed to stop the pipeline: {}", e);
        }
        session.watch.release();
        session.event_loop.shutdown();
        session.pipeline.release();

        self.state = PipelineState::Uninitialized;
    }

    /// Apply an event the bus reported for session `id`.
    pub fn apply_event(&mut self, id: SessionId, event: SessionEvent) {
        if self.session_id() != Some(id) {
            debug!("Ignoring {:?} for stale session {}", event, id);
            return;
        }

        let target = match &event {
            SessionEvent::Failed { .. } => PipelineState::Error,
            SessionEvent::EndOfStream => PipelineState::EndOfStream,
        };
        if !self.state.can_transition_to(&target) {
            debug!("Ignoring {:?} in state {}", event, self.state);
            return;
        }

        match event {
            SessionEvent::Failed { source_name, text } => {
                warn!("Session {} failed in {}: {}", id, source_name, text)
            }
            SessionEvent::EndOfStream => info!("Session {} reached end of stream", id),
        }
        self.state = target;
    }

    /// Follow a resize of the render surface.
    pub fn resize_surface(&mut self, rect: RenderRect) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if rect.is_empty() {
            return;
        }
        if let Err(e) = session.pipeline.set_render_rectangle(rect) {
            warn!("Failed to resize the render area: {}", e);
        }
    }
}

impl Drop for PipelineSupervisor {
    fn drop(&mut self) {
        self.teardown();
    }
}
