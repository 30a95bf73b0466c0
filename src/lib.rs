//! Network video stream viewer
//!
//! Connects to a camera stream, renders it into a native window with a
//! wall-clock overlay and lets the operator start and pause playback.

pub mod config;
#[cfg(feature = "gui")]
pub mod gui;
pub mod pipeline;
pub mod ui;
