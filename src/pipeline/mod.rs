//! Lifecycle control for the video pipeline
//!
//! - `description`: what gets built from the source locator
//! - `backend`: the media library seam and its bus messages
//! - `handle`: scoped ownership of the pipeline and the bus watch
//! - `dispatcher` and `event_loop`: bus servicing off the UI thread
//! - `supervisor`: connect, start, stop and teardown

pub mod backend;
pub mod description;
pub mod dispatcher;
pub mod error;
pub mod event_loop;
#[cfg(feature = "gui")]
pub mod gst_backend;
pub mod handle;
pub mod state;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{
    BackendError, BusMessage, MediaBackend, MediaPipeline, RenderRect, RenderSurface,
    TargetState, WindowHandle,
};
pub use description::{LocatorError, OverlayStyle, SourceLocator, StageDescription, StageOptions};
pub use error::SupervisorError;
pub use state::PipelineState;
pub use supervisor::{OverlayEpoch, PipelineSupervisor, SessionId};
