/*
 * This module defines the data types used for communication between the application
 * logic and the platform layer: identifiers for windows, actions and timers,
 * platform-agnostic events (`AppEvent`), commands for the platform layer
 * (`PlatformCommand`), and the `PlatformEventHandler` trait that the application
 * logic implements. It also defines `UiThreadWaker`, which lets code running on
 * other threads ask the platform loop to call back into the application logic.
 */

use std::path::PathBuf;
use std::time::Duration;

// An opaque identifier for a native window, managed by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub(crate) usize);

// Identifies a one-shot timer scheduled with `PlatformCommand::ScheduleTimer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/*
 * The user-triggerable actions of the main window. The platform layer maps them to
 * whatever native affordance it has (header bar buttons, menu entries, keyboard
 * shortcuts, console words) and reports activations as `AppEvent::ActionTriggered`.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    OpenDocument,
    SaveDocument,
    Undo,
    Redo,
    RemoveSelectedPages,
    RemovePreviousPages,
    RemoveNextPages,
    RotatePagesLeft,
    RotatePagesRight,
}

impl ActionId {
    pub const ALL: [ActionId; 9] = [
        ActionId::OpenDocument,
        ActionId::SaveDocument,
        ActionId::Undo,
        ActionId::Redo,
        ActionId::RemoveSelectedPages,
        ActionId::RemovePreviousPages,
        ActionId::RemoveNextPages,
        ActionId::RotatePagesLeft,
        ActionId::RotatePagesRight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionId::OpenDocument => "open-document",
            ActionId::SaveDocument => "save-document",
            ActionId::Undo => "undo",
            ActionId::Redo => "redo",
            ActionId::RemoveSelectedPages => "remove-selected",
            ActionId::RemovePreviousPages => "remove-previous",
            ActionId::RemoveNextPages => "remove-next",
            ActionId::RotatePagesLeft => "rotate-left",
            ActionId::RotatePagesRight => "rotate-right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Default,
    // Shown while a command runs in the background.
    Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MessageSeverity {
    Information,
    Warning,
    Error,
}

// Configuration for creating the main window.
#[derive(Debug, Clone)]
pub struct WindowConfig<'a> {
    pub title: &'a str,
    pub width: i32,
    pub height: i32,
    pub min_width: i32,
    pub min_height: i32,
}

// One page as shown by the page view; `position` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDescriptor {
    pub position: usize,
    pub source_index: usize,
    pub rotation_degrees: u32,
}

// --- Events from Platform to App Logic ---

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    // Signals that the main window exists and can receive commands.
    MainWindowUISetupComplete {
        window_id: WindowId,
    },
    WindowCloseRequestedByUser {
        window_id: WindowId,
    },
    // The `WindowId` should be considered invalid after this event.
    WindowDestroyed {
        window_id: WindowId,
    },
    ActionTriggered {
        window_id: WindowId,
        action: ActionId,
    },
    // The set of pages selected in the page view changed (zero-based positions).
    PageSelectionChanged {
        window_id: WindowId,
        selected_pages: Vec<usize>,
    },
    FileOpenDialogCompleted {
        window_id: WindowId,
        result: Option<PathBuf>,
    },
    FileSaveDialogCompleted {
        window_id: WindowId,
        result: Option<PathBuf>,
    },
    SavedNotificationCloseClicked {
        window_id: WindowId,
    },
    TimerElapsed {
        window_id: WindowId,
        timer_id: TimerId,
    },
    // Lifecycle notifications are waiting in the application logic's inbox.
    NotificationsPending,
}

// --- Commands from App Logic to Platform ---

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCommand {
    SetWindowTitle {
        window_id: WindowId,
        title: String,
    },
    ShowWindow {
        window_id: WindowId,
    },
    CloseWindow {
        window_id: WindowId,
    },
    QuitApplication,
    SetActionEnabled {
        window_id: WindowId,
        action: ActionId,
        enabled: bool,
    },
    SetCursor {
        window_id: WindowId,
        cursor: CursorKind,
    },
    ShowOpenFileDialog {
        window_id: WindowId,
        title: String,
        initial_dir: Option<PathBuf>,
    },
    ShowSaveFileDialog {
        window_id: WindowId,
        title: String,
        default_filename: String,
        initial_dir: Option<PathBuf>,
    },
    ShowMessageDialog {
        window_id: WindowId,
        message: String,
        severity: MessageSeverity,
    },
    // Replaces the content of the page view; also clears its selection.
    ShowPages {
        window_id: WindowId,
        pages: Vec<PageDescriptor>,
    },
    ShowSavedNotification {
        window_id: WindowId,
        text: String,
    },
    HideSavedNotification {
        window_id: WindowId,
    },
    // Requests a single `AppEvent::TimerElapsed` after `delay`.
    ScheduleTimer {
        window_id: WindowId,
        timer_id: TimerId,
        delay: Duration,
    },
}

// --- Traits ---

/*
 * Implemented by the application logic. The platform layer calls `handle_event` on
 * its interaction thread for every event, then drains the commands the handler
 * queued with `try_dequeue_command` and executes them in order.
 */
pub trait PlatformEventHandler: Send + 'static {
    fn handle_event(&mut self, event: AppEvent);

    // Called when the platform loop is about to exit.
    fn on_quit(&mut self) {}

    fn try_dequeue_command(&mut self) -> Option<PlatformCommand>;
}

/*
 * Asks the platform loop to deliver `AppEvent::NotificationsPending` on the
 * interaction thread. Safe to call from any thread, any number of times.
 */
pub trait UiThreadWaker: Send + Sync {
    fn wake(&self);
}
