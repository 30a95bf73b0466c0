use crate::pipeline::{LocatorError, SourceLocator, StageOptions};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidLocator(#[from] LocatorError),
    #[error("invalid video sink '{0}'")]
    InvalidSink(String),
    #[error(transparent)]
    Args(#[from] clap::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub locator: SourceLocator,
    pub stage: StageOptions,
    pub window_size: (u32, u32),
    pub verbose: bool,
}

impl Config {
    pub fn command() -> Command {
        Command::new(app_name())
            .version(version())
            .author(env!("CARGO_PKG_AUTHORS"))
            .about(env!("CARGO_PKG_DESCRIPTION"))
            .arg(
                Arg::new("url")
                    .short('u')
                    .long("url")
                    .value_name("URL")
                    .help("Stream to display, e.g. rtsp://host:port/path")
                    .required(true),
            )
            .arg(
                Arg::new("latency")
                    .short('l')
                    .long("latency")
                    .value_name("MS")
                    .help("Jitter buffer of the network source in milliseconds")
                    .value_parser(value_parser!(u32))
                    .default_value("0"),
            )
            .arg(
                Arg::new("sink")
                    .long("sink")
                    .value_name("ELEMENT")
                    .help("Overlay-capable video sink")
                    .default_value("glimagesink"),
            )
            .arg(
                Arg::new("sync")
                    .long("sync")
                    .help("Render frames on the pipeline clock")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("font")
                    .long("font")
                    .value_name("FONT")
                    .help("Font of the timestamp overlay")
                    .default_value("Sans, 5"),
            )
            .arg(
                Arg::new("datetime-format")
                    .long("datetime-format")
                    .value_name("FORMAT")
                    .help("strftime format of the timestamp overlay")
                    .default_value("%Y-%m-%d %H:%M:%S"),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Log debug messages")
                    .action(ArgAction::SetTrue),
            )
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let url = matches
            .get_one::<String>("url")
            .map(String::as_str)
            .unwrap_or_default();
        let locator = SourceLocator::parse(url)?;

        let mut stage = StageOptions::default();
        if let Some(latency) = matches.get_one::<u32>("latency") {
            stage.latency_ms = *latency;
        }
        if let Some(sink) = matches.get_one::<String>("sink") {
            if !is_element_name(sink) {
                return Err(ConfigError::InvalidSink(sink.clone()));
            }
            stage.sink = sink.clone();
        }
        stage.sync = matches.get_flag("sync");
        if let Some(font) = matches.get_one::<String>("font") {
            stage.overlay.font_desc = font.clone();
        }
        if let Some(format) = matches.get_one::<String>("datetime-format") {
            stage.overlay.datetime_format = format.clone();
        }

        Ok(Config {
            locator,
            stage,
            window_size: (680, 460),
            verbose: matches.get_flag("verbose"),
        })
    }

    /// Parse the process arguments, printing usage and exiting on bad input.
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::from_matches(&Self::command().get_matches())
    }

    pub fn try_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }
}

fn is_element_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}

pub fn app_id() -> &'static str {
    "org.cctv.viewer"
}
