//! GUI application runner

use crate::config::{Config, app_id};
use crate::pipeline::gst_backend::GstBackend;
use anyhow::Context;
use native_dialog::{DialogBuilder, MessageLevel};

use super::app::App;

/// Runs the viewer until the process exits.
///
/// The media library is initialized first so that a missing GStreamer
/// installation is reported before any window shows up. If the GUI fails to
/// initialize, an error dialog is displayed before returning.
pub fn run(config: Config) -> anyhow::Result<()> {
    let backend = GstBackend::init().context("Failed to initialize GStreamer")?;

    let app = iced::daemon(
        move || App::new(config.clone(), backend),
        App::update,
        App::view,
    )
    .settings(iced::Settings {
        id: Some(app_id().to_string()),
        ..Default::default()
    })
    .title(App::title)
    .antialiasing(false)
    .subscription(App::subscription);

    if let Err(e) = app.run() {
        eprintln!("Failed to initialize GUI: {e:?}");

        if let Err(e) = DialogBuilder::message()
            .set_title("Gui error")
            .set_text(e.to_string().as_str())
            .set_level(MessageLevel::Warning)
            .alert()
            .show()
        {
            eprintln!("Failed to display error dialog: {e:?}");
        }
        return Err(e).context("GUI terminated with an error");
    }

    Ok(())
}
