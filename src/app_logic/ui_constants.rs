/*
 * Shared constants for the main window: the application name used for the
 * configuration directory, and the user-visible texts the presenter sends to the
 * platform layer.
 */

// Used to derive the per-user configuration directory.
pub const APP_NAME: &str = "PageSlicer";

pub const WINDOW_TITLE_BASE: &str = "Page Slicer";

pub const OPEN_DIALOG_TITLE: &str = "Open Document";
pub const SAVE_DIALOG_TITLE: &str = "Save Document";

pub const SAVED_NOTIFICATION_TEXT: &str = "Saved!";

pub const OPEN_FAILED_MESSAGE: &str = "The selected file could not be opened";
pub const SAVE_FAILED_MESSAGE: &str = "The current document could not be saved";
pub const COMMAND_FAILED_MESSAGE: &str = "The last operation could not be completed";
