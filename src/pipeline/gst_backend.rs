//! GStreamer implementation of the media backend

use crate::pipeline::backend::{
    BackendError, BusMessage, BusSender, BusWatch, MediaBackend, MediaPipeline, RenderRect,
    TargetState, WindowHandle,
};
use crate::pipeline::description::StageDescription;
use chrono::{DateTime, Datelike, Local, Timelike};
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_video as gst_video;
use gstreamer_video::prelude::*;
use log::{debug, info};

const EPOCH_PROPERTY: &str = "datetime-epoch";

#[derive(Debug, Clone, Copy)]
pub struct GstBackend;

impl GstBackend {
    /// Initialize the library. Must run once before any pipeline is built.
    pub fn init() -> Result<Self, BackendError> {
        gst::init().map_err(|e| BackendError::Init(e.to_string()))?;
        info!("GStreamer {} initialized", gst::version_string());
        Ok(GstBackend)
    }
}

impl MediaBackend for GstBackend {
    fn construct(
        &self,
        description: &StageDescription,
    ) -> Result<Box<dyn MediaPipeline>, BackendError> {
        let launch = description.to_launch_string();
        let pipeline = gst::parse::launch(&launch)
            .map_err(|e| BackendError::Construction(e.to_string()))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| BackendError::Construction(String::from("not a pipeline")))?;

        debug!("Constructed pipeline {}", pipeline.name());
        Ok(Box::new(GstPipeline { pipeline }))
    }
}

struct GstPipeline {
    pipeline: gst::Pipeline,
}

impl GstPipeline {
    fn overlay(&self) -> Result<gst_video::VideoOverlay, BackendError> {
        self.pipeline
            .by_interface(gst_video::VideoOverlay::static_type())
            .and_then(|elem| elem.dynamic_cast::<gst_video::VideoOverlay>().ok())
            .ok_or(BackendError::NoOverlaySink)
    }
}

impl MediaPipeline for GstPipeline {
    fn set_state(&self, state: TargetState) -> Result<(), BackendError> {
        let target = match state {
            TargetState::Null => gst::State::Null,
            TargetState::Paused => gst::State::Paused,
            TargetState::Playing => gst::State::Playing,
        };
        self.pipeline
            .set_state(target)
            .map(|_| ())
            .map_err(|e| BackendError::StateChange(format!("{target:?}: {e}")))
    }

    fn bind_surface(
        &self,
        handle: WindowHandle,
        rect: Option<RenderRect>,
    ) -> Result<(), BackendError> {
        let overlay = self.overlay()?;
        // SAFETY: the handle belongs to a window the UI keeps open for the
        // whole session, teardown runs before the window is destroyed.
        unsafe {
            overlay.set_window_handle(handle.get());
        }
        if let Some(rect) = rect {
            self.set_render_rectangle(rect)?;
        }
        Ok(())
    }

    fn set_render_rectangle(&self, rect: RenderRect) -> Result<(), BackendError> {
        self.overlay()?
            .set_render_rectangle(rect.x, rect.y, rect.width, rect.height)
            .map_err(|e| BackendError::Property {
                name: "render-rectangle",
                reason: e.to_string(),
            })
    }

    fn set_overlay_epoch(&self, stage: &str, epoch: DateTime<Local>) -> Result<(), BackendError> {
        let element = self
            .pipeline
            .by_name(stage)
            .ok_or_else(|| BackendError::StageNotFound(stage.to_string()))?;
        if element.find_property(EPOCH_PROPERTY).is_none() {
            return Err(BackendError::Property {
                name: EPOCH_PROPERTY,
                reason: format!("{stage} has no such property"),
            });
        }

        let seconds = epoch.second() as f64 + epoch.nanosecond() as f64 / 1e9;
        let datetime = gst::glib::DateTime::from_local(
            epoch.year(),
            epoch.month() as i32,
            epoch.day() as i32,
            epoch.hour() as i32,
            epoch.minute() as i32,
            seconds,
        )
        .map_err(|e| BackendError::Property {
            name: EPOCH_PROPERTY,
            reason: e.to_string(),
        })?;

        element.set_property_from_value(EPOCH_PROPERTY, &datetime.to_value());
        Ok(())
    }

    fn watch(&self, sender: BusSender) -> Result<Box<dyn BusWatch>, BackendError> {
        let bus = self.pipeline.bus().ok_or(BackendError::NoBus)?;

        // runs on the streaming threads: classify and hand off, nothing else
        bus.set_sync_handler(move |_, msg| {
            let _ = sender.send(classify(msg));
            gst::BusSyncReply::Drop
        });

        Ok(Box::new(GstWatch { bus: Some(bus) }))
    }
}

struct GstWatch {
    bus: Option<gst::Bus>,
}

impl BusWatch for GstWatch {
    fn unregister(&mut self) {
        if let Some(bus) = self.bus.take() {
            // drops the handler closure and with it the sender
            bus.unset_sync_handler();
        }
    }
}

fn source_name(msg: &gst::Message) -> String {
    msg.src()
        .map(|s| s.name().to_string())
        .unwrap_or_else(|| String::from("unknown"))
}

/// Translate a bus message into its library independent form.
fn classify(msg: &gst::Message) -> BusMessage {
    match msg.view() {
        gst::MessageView::Error(err) => BusMessage::Error {
            source_name: source_name(msg),
            text: err.error().to_string(),
            debug: err.debug().map(|d| d.to_string()),
        },
        gst::MessageView::Warning(warning) => BusMessage::Warning {
            source_name: source_name(msg),
            text: warning.error().to_string(),
            debug: warning.debug().map(|d| d.to_string()),
        },
        gst::MessageView::Eos(_) => BusMessage::EndOfStream,
        gst::MessageView::StateChanged(state) => BusMessage::StateChanged {
            source_name: source_name(msg),
            old: format!("{:?}", state.old()),
            current: format!("{:?}", state.current()),
        },
        _ => BusMessage::Other,
    }
}
