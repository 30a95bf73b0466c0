//! Scoped owners for the resources a session acquires
//!
//! Both guards release on drop, so an early return anywhere in `connect`
//! cannot leak a half-built pipeline or an orphaned bus callback.

use crate::pipeline::backend::{
    BackendError, BusSender, BusWatch, MediaPipeline, RenderRect, TargetState, WindowHandle,
};
use chrono::{DateTime, Local};
use log::{debug, warn};

/// Exclusive owner of a constructed pipeline.
///
/// Releasing drives the pipeline to [`TargetState::Null`], unless it is
/// already there, before the library object is dropped.
pub struct PipelineHandle {
    pipeline: Option<Box<dyn MediaPipeline>>,
    applied: Option<TargetState>,
}

impl PipelineHandle {
    pub fn new(pipeline: Box<dyn MediaPipeline>) -> Self {
        Self {
            pipeline: Some(pipeline),
            applied: None,
        }
    }

    fn inner(&self) -> Result<&dyn MediaPipeline, BackendError> {
        self.pipeline
            .as_deref()
            .ok_or_else(|| BackendError::StateChange(String::from("pipeline already released")))
    }

    pub fn set_state(&mut self, state: TargetState) -> Result<(), BackendError> {
        self.inner()?.set_state(state)?;
        self.applied = Some(state);
        Ok(())
    }

    /// Last state the pipeline accepted.
    pub fn applied_state(&self) -> Option<TargetState> {
        self.applied
    }

    pub fn bind_surface(
        &self,
        handle: WindowHandle,
        rect: Option<RenderRect>,
    ) -> Result<(), BackendError> {
        self.inner()?.bind_surface(handle, rect)
    }

    pub fn set_render_rectangle(&self, rect: RenderRect) -> Result<(), BackendError> {
        self.inner()?.set_render_rectangle(rect)
    }

    pub fn set_overlay_epoch(
        &self,
        stage: &str,
        epoch: DateTime<Local>,
    ) -> Result<(), BackendError> {
        self.inner()?.set_overlay_epoch(stage, epoch)
    }

    pub fn watch(&self, sender: BusSender) -> Result<WatchSubscription, BackendError> {
        let watch = self.inner()?.watch(sender)?;
        Ok(WatchSubscription::new(watch))
    }

    pub fn is_released(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Stop the pipeline and drop the library object.
    pub fn release(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if self.applied != Some(TargetState::Null)
                && let Err(e) = pipeline.set_state(TargetState::Null)
            {
                warn!("Failed to set pipeline to null state: {}", e);
            }
            self.applied = None;
            drop(pipeline);
            debug!("Pipeline released");
        }
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Token for a registered bus callback; unregisters on release or drop.
pub struct WatchSubscription {
    watch: Option<Box<dyn BusWatch>>,
}

impl WatchSubscription {
    pub fn new(watch: Box<dyn BusWatch>) -> Self {
        Self { watch: Some(watch) }
    }

    pub fn is_active(&self) -> bool {
        self.watch.is_some()
    }

    pub fn release(&mut self) {
        if let Some(mut watch) = self.watch.take() {
            watch.unregister();
            debug!("Bus watch unregistered");
        }
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
