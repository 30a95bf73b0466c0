//! Stage description for the viewing pipeline
//!
//! Produces the launch string handed to the media library:
//! network source → depacketizer → parser → decoder → timestamp overlay →
//! colorspace conversion → render sink.

use std::fmt;
use thiserror::Error;

/// Name of the timestamp overlay stage, looked up after construction.
pub const OVERLAY_STAGE: &str = "timeoverlay";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("stream locator is empty")]
    Empty,
    #[error("stream locator '{0}' has no scheme (expected e.g. rtsp://host:port/path)")]
    MissingScheme(String),
    #[error("stream locator '{0}' contains whitespace or '!'")]
    IllegalCharacter(String),
}

/// Validated stream URL, safe to embed in a launch string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocator(String);

impl SourceLocator {
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LocatorError::Empty);
        }
        if raw.chars().any(|c| c.is_whitespace() || c == '!') {
            return Err(LocatorError::IllegalCharacter(raw.to_string()));
        }
        match raw.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => {
                Ok(SourceLocator(raw.to_string()))
            }
            _ => Err(LocatorError::MissingScheme(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SourceLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceLocator::parse(s)
    }
}

/// Look of the date/time rendered on every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayStyle {
    pub datetime_format: String,
    pub halignment: &'static str,
    pub valignment: &'static str,
    pub shaded_background: bool,
    pub font_desc: String,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle {
            datetime_format: String::from("%Y-%m-%d %H:%M:%S"),
            halignment: "right",
            valignment: "top",
            shaded_background: true,
            font_desc: String::from("Sans, 5"),
        }
    }
}

/// Tunables of the pipeline that do not depend on the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOptions {
    /// Jitter buffer of the network source, in milliseconds
    pub latency_ms: u32,
    pub overlay: OverlayStyle,
    /// Overlay-capable video sink element
    pub sink: String,
    /// Let the sink synchronise on the clock
    pub sync: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        StageOptions {
            latency_ms: 0,
            overlay: OverlayStyle::default(),
            sink: String::from("glimagesink"),
            sync: false,
        }
    }
}

/// Ordered list of processing stages for one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDescription {
    locator: SourceLocator,
    options: StageOptions,
}

impl StageDescription {
    pub fn new(locator: SourceLocator, options: StageOptions) -> Self {
        Self { locator, options }
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    /// Render the description in launch syntax.
    pub fn to_launch_string(&self) -> String {
        let overlay = &self.options.overlay;
        let stages = [
            format!(
                "rtspsrc location={} latency={}",
                self.locator, self.options.latency_ms
            ),
            String::from("rtph264depay"),
            String::from("h264parse"),
            String::from("avdec_h264"),
            format!(
                "timeoverlay name={} show-times-as-dates=true datetime-format=\"{}\" \
                 halignment={} valignment={} shaded-background={} font-desc=\"{}\"",
                OVERLAY_STAGE,
                escape_quoted(&overlay.datetime_format),
                overlay.halignment,
                overlay.valignment,
                overlay.shaded_background,
                escape_quoted(&overlay.font_desc),
            ),
            String::from("videoconvert"),
            format!("{} sync={}", self.options.sink, self.options.sync),
        ];
        stages.join(" ! ")
    }
}

impl fmt::Display for StageDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_launch_string())
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_validation() {
        assert!(SourceLocator::parse("rtsp://61.253.4.180:8888/cctv").is_ok());
        assert_eq!(
            SourceLocator::parse("  rtsp://cam/1 ").unwrap().as_str(),
            "rtsp://cam/1"
        );
        assert_eq!(SourceLocator::parse(""), Err(LocatorError::Empty));
        assert!(matches!(
            SourceLocator::parse("cam.local:554/stream"),
            Err(LocatorError::MissingScheme(_))
        ));
        assert!(matches!(
            SourceLocator::parse("rtsp://"),
            Err(LocatorError::MissingScheme(_))
        ));
        assert!(matches!(
            SourceLocator::parse("rtsp://cam/1 ! filesink location=/tmp/x"),
            Err(LocatorError::IllegalCharacter(_))
        ));
    }

    #[test]
    fn test_default_launch_string() {
        let locator = SourceLocator::parse("rtsp://61.253.4.180:8888/cctv").unwrap();
        let description = StageDescription::new(locator, StageOptions::default());

        assert_eq!(
            description.to_launch_string(),
            "rtspsrc location=rtsp://61.253.4.180:8888/cctv latency=0 ! rtph264depay ! \
             h264parse ! avdec_h264 ! timeoverlay name=timeoverlay show-times-as-dates=true \
             datetime-format=\"%Y-%m-%d %H:%M:%S\" halignment=right valignment=top \
             shaded-background=true font-desc=\"Sans, 5\" ! videoconvert ! \
             glimagesink sync=false"
        );
    }

    #[test]
    fn test_custom_options() {
        let locator = SourceLocator::parse("rtsp://cam/main").unwrap();
        let options = StageOptions {
            latency_ms: 200,
            sink: String::from("xvimagesink"),
            sync: true,
            overlay: OverlayStyle {
                font_desc: String::from("Mono \"Bold\", 9"),
                ..Default::default()
            },
        };
        let launch = StageDescription::new(locator, options).to_string();

        assert!(launch.starts_with("rtspsrc location=rtsp://cam/main latency=200 ! "));
        assert!(launch.ends_with("! xvimagesink sync=true"));
        assert!(launch.contains(&format!("name={OVERLAY_STAGE} ")));
        assert!(launch.contains("font-desc=\"Mono \\\"Bold\\\", 9\""));
    }
}
