//! Desktop shell: one window with the video area and its controls

mod app;
mod messages;
mod runner;

pub use runner::run;
