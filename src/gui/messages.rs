use iced::window::Id;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Open Main Window
    OpenMainWindow,
    /// Native id of the main window, ready to receive video
    SurfaceReady(u64),
    /// Start or resume playback
    Start,
    /// Pause playback
    Stop,
    /// Tear the session down and connect again
    Reconnect,
    /// Poll the requests posted by the bus event loop
    Tick,
    /// The app window size has been changed
    WindowResized(Id, u32, u32),
    /// Display scale of the main window, physical pixels per logical unit
    ScaleFactorChanged(f32),
    /// Hide the notice shown in the toolbar
    DismissNotice,
    /// Close an app window
    CloseWindow(Id),
    /// Quit the app with the given exit code
    ExitApp(i32),
}
