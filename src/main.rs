use cctv_viewer::config::{Config, app_name, version};
use cctv_viewer::gui;
use std::{panic, process};
use tracing_subscriber::filter::LevelFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::from_args()?;

    let level = if config.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // kill the main thread as soon as a secondary thread panics
    let orig_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // invoke the default handler and exit the process
        orig_hook(panic_info);
        process::exit(105);
    }));

    log::info!("{} {} viewing {}", app_name(), version(), config.locator);
    gui::run(config)
}
