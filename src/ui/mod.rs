//! Bridge between the bus event loop and the thread owning the UI

pub mod bridge;

pub use bridge::{
    Notice, Pending, SessionEvent, UiAction, UiInbox, UiNotifier, UiRequest, apply, apply_pending,
    channel,
};
