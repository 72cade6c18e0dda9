/*
 * The platform layer: the platform-agnostic event and command types exchanged with
 * the application logic, and a headless console implementation that hosts the
 * main window's state, reads user input from stdin, and runs the interaction-thread
 * event loop.
 */
pub mod app;
pub(crate) mod command_executor;
pub(crate) mod console_input;
pub mod error;
pub mod types;
pub(crate) mod window_common;


pub use app::PlatformInterface;
pub use error::{PlatformError, Result as PlatformResult};
pub use types::{
    ActionId, AppEvent, CursorKind, MessageSeverity, PageDescriptor, PlatformCommand,
    PlatformEventHandler, TimerId, UiThreadWaker, WindowConfig, WindowId,
};
