use crate::pipeline::backend::BackendError;
use crate::pipeline::state::PipelineState;
use thiserror::Error;

/// Why a supervisor operation was rejected.
///
/// None of these are fatal: the operation is logged and the caller keeps
/// running with the supervisor state untouched.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("pipeline already exists")]
    AlreadyConnected,
    #[error("streaming is already in progress")]
    AlreadyStreaming,
    #[error("streaming is not in progress")]
    NotStreaming,
    #[error("server not connected")]
    NotConnected,
    #[error("session ended ({0}), reconnect to continue")]
    SessionTerminated(PipelineState),
    #[error("failed to create the pipeline: {0}")]
    ConstructionError(#[source] BackendError),
    #[error("render surface unavailable: {0}")]
    SurfaceError(String),
    #[error("failed to watch the pipeline bus: {0}")]
    WatchRegistrationError(#[source] BackendError),
    #[error("failed to spawn the bus event loop: {0}")]
    EventLoopError(#[from] std::io::Error),
    #[error("pipeline refused the state change: {0}")]
    StateChangeError(#[source] BackendError),
}
