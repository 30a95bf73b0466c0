//! In-memory media backend for tests
//!
//! Records every call the supervisor makes and lets a test post bus
//! messages as if the pipeline produced them.

use crate::pipeline::backend::{
    BackendError, BusMessage, BusSender, BusWatch, MediaBackend, MediaPipeline, RenderRect,
    TargetState, WindowHandle,
};
use crate::pipeline::description::{OVERLAY_STAGE, StageDescription};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Constructed,
    SetState(TargetState),
    BoundSurface(WindowHandle),
    RenderRectangle(RenderRect),
    OverlayEpoch,
    Watched,
    Unwatched,
    Released,
}

#[derive(Debug, Default)]
struct Failures {
    construction: bool,
    overlay_sink: bool,
    overlay_stage: bool,
    watch: bool,
    refused: Option<TargetState>,
}

#[derive(Debug, Default)]
struct RecorderState {
    calls: Vec<Call>,
    launch: Option<String>,
    epoch: Option<DateTime<Local>>,
    bus: Option<BusSender>,
    // kept past unregister to observe the receiving end
    monitor: Option<BusSender>,
    failures: Failures,
}

/// Shared view of what the fake pipeline has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<RecorderState>>);

impl Recorder {
    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn launch(&self) -> Option<String> {
        self.lock().launch.clone()
    }

    pub fn epoch(&self) -> Option<DateTime<Local>> {
        self.lock().epoch
    }

    pub fn is_watched(&self) -> bool {
        self.lock().bus.is_some()
    }

    /// Whether the receiver of the last watched bus has been dropped,
    /// i.e. the event loop servicing it has returned.
    pub fn bus_receiver_dropped(&self) -> bool {
        self.lock().monitor.as_ref().is_some_and(|bus| bus.is_closed())
    }

    /// Post a message on the bus; false when nobody is watching.
    pub fn post(&self, message: BusMessage) -> bool {
        match &self.lock().bus {
            Some(bus) => bus.send(message).is_ok(),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    recorder: Recorder,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    pub fn failing_construction(self) -> Self {
        self.recorder.lock().failures.construction = true;
        self
    }

    pub fn without_overlay_sink(self) -> Self {
        self.recorder.lock().failures.overlay_sink = true;
        self
    }

    pub fn without_overlay_stage(self) -> Self {
        self.recorder.lock().failures.overlay_stage = true;
        self
    }

    pub fn failing_watch(self) -> Self {
        self.recorder.lock().failures.watch = true;
        self
    }

    pub fn refusing(self, state: TargetState) -> Self {
        self.recorder.lock().failures.refused = Some(state);
        self
    }
}

impl MediaBackend for FakeBackend {
    fn construct(
        &self,
        description: &StageDescription,
    ) -> Result<Box<dyn MediaPipeline>, BackendError> {
        let mut state = self.recorder.lock();
        if state.failures.construction {
            return Err(BackendError::Construction(String::from("no element \"rtspsrc\"")));
        }
        state.launch = Some(description.to_launch_string());
        state.calls.push(Call::Constructed);
        Ok(Box::new(FakePipeline {
            recorder: self.recorder.clone(),
        }))
    }
}

struct FakePipeline {
    recorder: Recorder,
}

impl MediaPipeline for FakePipeline {
    fn set_state(&self, state: TargetState) -> Result<(), BackendError> {
        if self.recorder.lock().failures.refused == Some(state) {
            return Err(BackendError::StateChange(format!("{state:?} refused")));
        }
        self.recorder.record(Call::SetState(state));
        Ok(())
    }

    fn bind_surface(
        &self,
        handle: WindowHandle,
        rect: Option<RenderRect>,
    ) -> Result<(), BackendError> {
        if self.recorder.lock().failures.overlay_sink {
            return Err(BackendError::NoOverlaySink);
        }
        self.recorder.record(Call::BoundSurface(handle));
        if let Some(rect) = rect {
            self.set_render_rectangle(rect)?;
        }
        Ok(())
    }

    fn set_render_rectangle(&self, rect: RenderRect) -> Result<(), BackendError> {
        self.recorder.record(Call::RenderRectangle(rect));
        Ok(())
    }

    fn set_overlay_epoch(&self, stage: &str, epoch: DateTime<Local>) -> Result<(), BackendError> {
        let mut state = self.recorder.lock();
        if state.failures.overlay_stage || stage != OVERLAY_STAGE {
            return Err(BackendError::StageNotFound(stage.to_string()));
        }
        state.epoch = Some(epoch);
        state.calls.push(Call::OverlayEpoch);
        Ok(())
    }

    fn watch(&self, sender: BusSender) -> Result<Box<dyn BusWatch>, BackendError> {
        let mut state = self.recorder.lock();
        if state.failures.watch {
            return Err(BackendError::NoBus);
        }
        state.monitor = Some(sender.clone());
        state.bus = Some(sender);
        state.calls.push(Call::Watched);
        Ok(Box::new(FakeWatch {
            recorder: self.recorder.clone(),
        }))
    }
}

impl Drop for FakePipeline {
    fn drop(&mut self) {
        self.recorder.record(Call::Released);
    }
}

struct FakeWatch {
    recorder: Recorder,
}

impl BusWatch for FakeWatch {
    fn unregister(&mut self) {
        let mut state = self.recorder.lock();
        // dropping the sender closes the event loop's bus channel
        state.bus = None;
        state.calls.push(Call::Unwatched);
    }
}
