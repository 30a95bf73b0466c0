//! Seam between the supervisor and the media library
//!
//! The supervisor never talks to GStreamer directly: it builds a
//! [`StageDescription`], asks a [`MediaBackend`] to construct it and drives
//! the returned [`MediaPipeline`]. Bus traffic arrives as [`BusMessage`]
//! values pushed into a [`BusSender`] by the watch the pipeline registers.

use crate::pipeline::description::StageDescription;
use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Sending half handed to a bus watch.
pub type BusSender = UnboundedSender<BusMessage>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to initialize the media library: {0}")]
    Init(String),
    #[error("failed to construct the pipeline: {0}")]
    Construction(String),
    #[error("the pipeline has no overlay-capable video sink")]
    NoOverlaySink,
    #[error("no stage named '{0}' in the pipeline")]
    StageNotFound(String),
    #[error("failed to get the pipeline bus")]
    NoBus,
    #[error("state change refused: {0}")]
    StateChange(String),
    #[error("failed to set property '{name}': {reason}")]
    Property { name: &'static str, reason: String },
}

/// Messages posted by the pipeline on its bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusMessage {
    /// Fatal error reported by an element
    Error {
        source_name: String,
        text: String,
        debug: Option<String>,
    },
    /// Non fatal problem reported by an element
    Warning {
        source_name: String,
        text: String,
        debug: Option<String>,
    },
    /// An element changed state
    StateChanged {
        source_name: String,
        old: String,
        current: String,
    },
    EndOfStream,
    Other,
}

/// States the supervisor asks the pipeline to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// Inactive, all resources released by the library
    Null,
    Paused,
    Playing,
}

/// Native window id of the render surface. Zero is the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub usize);

impl WindowHandle {
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl From<u64> for WindowHandle {
    fn from(raw: u64) -> Self {
        WindowHandle(raw as usize)
    }
}

/// Area of the window the sink draws into, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl RenderRect {
    /// Convert an area given in logical units, as reported by the window
    /// toolkit, to physical pixels for a display with `scale_factor`.
    pub fn from_logical(x: f32, y: f32, width: f32, height: f32, scale_factor: f32) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        let px = |v: f32| (v * scale).round() as i32;
        RenderRect {
            x: px(x),
            y: px(y),
            width: px(width),
            height: px(height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Something owned by the UI shell that video can be rendered onto.
pub trait RenderSurface {
    fn window_handle(&self) -> WindowHandle;

    /// Restrict rendering to part of the window, `None` uses all of it.
    fn render_rectangle(&self) -> Option<RenderRect> {
        None
    }
}

impl RenderSurface for WindowHandle {
    fn window_handle(&self) -> WindowHandle {
        *self
    }
}

/// Factory for pipelines, i.e. the media library itself.
pub trait MediaBackend {
    fn construct(
        &self,
        description: &StageDescription,
    ) -> Result<Box<dyn MediaPipeline>, BackendError>;
}

/// A constructed processing graph.
pub trait MediaPipeline {
    fn set_state(&self, state: TargetState) -> Result<(), BackendError>;

    /// Attach the overlay-capable sink to a native window.
    fn bind_surface(
        &self,
        handle: WindowHandle,
        rect: Option<RenderRect>,
    ) -> Result<(), BackendError>;

    fn set_render_rectangle(&self, rect: RenderRect) -> Result<(), BackendError>;

    /// Hand the reference time to the named timestamp overlay stage.
    fn set_overlay_epoch(&self, stage: &str, epoch: DateTime<Local>) -> Result<(), BackendError>;

    /// Register a callback forwarding every bus message into `sender`.
    fn watch(&self, sender: BusSender) -> Result<Box<dyn BusWatch>, BackendError>;
}

/// Registered bus callback.
pub trait BusWatch {
    /// Remove the callback. Called at most once by [`WatchSubscription`].
    ///
    /// [`WatchSubscription`]: crate::pipeline::handle::WatchSubscription
    fn unregister(&mut self);
}
