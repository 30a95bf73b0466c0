#[cfg(target_os = "linux")]
use crate::config::app_id;
use crate::config::{Config, app_name};
use crate::gui::messages::AppEvent;
use crate::pipeline::gst_backend::GstBackend;
use crate::pipeline::{PipelineSupervisor, RenderRect, RenderSurface, WindowHandle};
use crate::ui::{self, Notice, UiInbox, UiNotifier};
use iced::widget::{button, column, container, row, text};
use iced::{
    Alignment, Element,
    Event::Window,
    Length, Size, Subscription, Task,
    window::{self, Id, Position},
};
use log::{debug, error, info};
use std::process::exit;
use std::time::Duration;

/// Height of the control strip above the video area.
const TOOLBAR_HEIGHT: u32 = 48;
const INBOX_POLL_INTERVAL: Duration = Duration::from_millis(100);
const SIGINT_EXIT_CODE: i32 = 130;

/// Part of the main window the sink renders into, in physical pixels.
fn video_area((width, height): (u32, u32), scale_factor: f32) -> RenderRect {
    let toolbar = TOOLBAR_HEIGHT as f32;
    RenderRect::from_logical(
        0.0,
        toolbar,
        width as f32,
        height as f32 - toolbar,
        scale_factor,
    )
}

struct VideoSurface {
    handle: WindowHandle,
    rect: RenderRect,
}

impl RenderSurface for VideoSurface {
    fn window_handle(&self) -> WindowHandle {
        self.handle
    }

    fn render_rectangle(&self) -> Option<RenderRect> {
        Some(self.rect).filter(|rect| !rect.is_empty())
    }
}

pub struct App {
    config: Config,
    supervisor: PipelineSupervisor,
    notifier: UiNotifier,
    inbox: UiInbox,
    main_window: Option<Id>,
    surface: Option<WindowHandle>,
    scale_factor: f32,
    status: String,
    notice: Option<Notice>,
}

impl App {
    pub fn new(config: Config, backend: GstBackend) -> (Self, Task<AppEvent>) {
        let (notifier, inbox) = ui::channel();

        // gracefully close the app when receiving SIGINT, SIGTERM, or SIGHUP
        let interrupt = notifier.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            interrupt.request_exit(SIGINT_EXIT_CODE);
        }) {
            error!("Error setting Ctrl-C handler: {}", e);
        }

        let supervisor =
            PipelineSupervisor::new(Box::new(backend), config.stage.clone(), notifier.clone());

        (
            Self {
                config,
                supervisor,
                notifier,
                inbox,
                main_window: None,
                surface: None,
                scale_factor: 1.0,
                status: String::new(),
                notice: None,
            },
            Task::done(AppEvent::OpenMainWindow),
        )
    }

    fn connect(&mut self) {
        let Some(handle) = self.surface else {
            debug!("No render surface yet");
            return;
        };
        let surface = VideoSurface {
            handle,
            rect: self.video_area(),
        };

        match self.supervisor.connect(&self.config.locator, &surface) {
            Ok(()) => self.status = self.supervisor.state().description().to_string(),
            Err(e) => {
                self.status = e.to_string();
                self.notifier.notify("Connection error", e.to_string());
            }
        }
    }

    fn video_area(&self) -> RenderRect {
        video_area(self.config.window_size, self.scale_factor)
    }

    /// Apply everything the bus event loop posted since the last tick.
    fn drain_inbox(&mut self) -> Task<AppEvent> {
        let pending = ui::apply_pending(&mut self.supervisor, &mut self.inbox);
        if let Some(notice) = pending.notices.into_iter().last() {
            // shown in the toolbar until dismissed
            self.notice = Some(notice);
        }
        match pending.exit {
            Some(code) => Task::done(AppEvent::ExitApp(code)),
            None => Task::none(),
        }
    }

    pub fn update(&mut self, message: AppEvent) -> Task<AppEvent> {
        match message {
            AppEvent::OpenMainWindow => {
                if let Some(id) = self.main_window {
                    return window::gain_focus(id);
                }
                let (width, height) = self.config.window_size;
                let (id, open_task) = window::open(window::Settings {
                    size: Size {
                        width: width as f32,
                        height: height as f32,
                    },
                    position: Position::Centered,
                    min_size: Some(Size {
                        width: 320f32,
                        height: 240f32,
                    }),
                    resizable: true,
                    decorations: true,
                    #[cfg(target_os = "linux")]
                    platform_specific: window::settings::PlatformSpecific {
                        application_id: String::from(app_id()),
                        override_redirect: false,
                    },
                    exit_on_close_request: false,
                    ..Default::default()
                });
                self.main_window = Some(id);
                open_task
                    .discard()
                    .chain(window::gain_focus(id))
                    .chain(window::scale_factor(id).map(AppEvent::ScaleFactorChanged))
                    .chain(window::raw_id::<AppEvent>(id).map(AppEvent::SurfaceReady))
            }
            AppEvent::SurfaceReady(raw_id) => {
                self.surface = Some(WindowHandle::from(raw_id));
                self.connect();
                Task::none()
            }
            AppEvent::Start => {
                self.status = match self.supervisor.start() {
                    Ok(()) => self.supervisor.state().description().to_string(),
                    Err(e) => e.to_string(),
                };
                Task::none()
            }
            AppEvent::Stop => {
                self.status = match self.supervisor.stop() {
                    Ok(()) => self.supervisor.state().description().to_string(),
                    Err(e) => e.to_string(),
                };
                Task::none()
            }
            AppEvent::Reconnect => {
                self.supervisor.teardown();
                self.connect();
                Task::none()
            }
            AppEvent::Tick => self.drain_inbox(),
            AppEvent::WindowResized(id, width, height) => {
                if self.main_window == Some(id) {
                    self.config.window_size = (width, height);
                    // the window may have moved to a display with another scale
                    window::scale_factor(id).map(AppEvent::ScaleFactorChanged)
                } else {
                    Task::none()
                }
            }
            AppEvent::ScaleFactorChanged(scale_factor) => {
                self.scale_factor = scale_factor;
                self.supervisor.resize_surface(self.video_area());
                Task::none()
            }
            AppEvent::DismissNotice => {
                self.notice = None;
                Task::none()
            }
            AppEvent::CloseWindow(id) => {
                if self.main_window == Some(id) {
                    Task::done(AppEvent::ExitApp(0))
                } else {
                    window::close(id)
                }
            }
            AppEvent::ExitApp(code) => {
                info!("Exiting with code {}", code);
                // the sink must let go of the window before it disappears
                self.supervisor.teardown();
                exit(code)
            }
        }
    }

    pub fn view(&self, _id: Id) -> Element<'_, AppEvent> {
        let state = self.supervisor.state();
        let mut controls = row![
            button(text("Start")).on_press(AppEvent::Start),
            button(text("Stop")).on_press(AppEvent::Stop),
            button(text("Reconnect")).on_press(AppEvent::Reconnect),
            text(state.description()).size(14),
        ]
        .spacing(10)
        .padding(8)
        .align_y(Alignment::Center);

        controls = match &self.notice {
            Some(notice) => controls
                .push(text(format!("{}: {}", notice.title, notice.message)).size(14))
                .push(button(text("Dismiss")).on_press(AppEvent::DismissNotice)),
            None => controls.push(text(self.status.as_str()).size(14)),
        };

        column![
            container(controls)
                .width(Length::Fill)
                .height(Length::Fixed(TOOLBAR_HEIGHT as f32)),
            // the sink draws here
            container(text("")).width(Length::Fill).height(Length::Fill),
        ]
        .into()
    }

    pub fn title(&self, _id: Id) -> String {
        format!("{} - {}", app_name(), self.config.locator)
    }

    pub fn subscription(&self) -> Subscription<AppEvent> {
        Subscription::batch([
            iced::time::every(INBOX_POLL_INTERVAL).map(|_| AppEvent::Tick),
            self.window_subscription(),
        ])
    }

    fn window_subscription(&self) -> Subscription<AppEvent> {
        iced::event::listen_with(|event, _status, id| match event {
            Window(window::Event::CloseRequested) => Some(AppEvent::CloseWindow(id)),
            Window(window::Event::Resized(size)) => Some(AppEvent::WindowResized(
                id,
                size.width as u32,
                size.height as u32,
            )),
            _ => None,
        })
    }
}
