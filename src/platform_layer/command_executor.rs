/*
 * This module is responsible for executing `PlatformCommand`s against the console
 * platform's window records. Each command updates the `NativeWindowData` of its
 * window and prints what a user would see change. Dialog commands are answered
 * from what the user typed and come back as `*DialogCompleted` events; timers are
 * one-shot threads that post `TimerElapsed`.
 */

use super::app::ConsoleInternalState;
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{
    ActionId, AppEvent, CursorKind, MessageSeverity, PageDescriptor, PlatformCommand, TimerId,
    WindowId,
};
use super::window_common;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub(crate) fn execute_command(
    internal_state: &Arc<ConsoleInternalState>,
    command: PlatformCommand,
) -> PlatformResult<()> {
    match command {
        PlatformCommand::SetWindowTitle { window_id, title } => {
            execute_set_window_title(internal_state, window_id, title)
        }
        PlatformCommand::ShowWindow { window_id } => execute_show_window(internal_state, window_id),
        PlatformCommand::CloseWindow { window_id } => {
            execute_close_window(internal_state, window_id)
        }
        PlatformCommand::QuitApplication => {
            internal_state.signal_quit_intent();
            Ok(())
        }
        PlatformCommand::SetActionEnabled {
            window_id,
            action,
            enabled,
        } => execute_set_action_enabled(internal_state, window_id, action, enabled),
        PlatformCommand::SetCursor { window_id, cursor } => {
            execute_set_cursor(internal_state, window_id, cursor)
        }
        PlatformCommand::ShowOpenFileDialog {
            window_id,
            title,
            initial_dir,
        } => execute_show_open_file_dialog(internal_state, window_id, &title, initial_dir),
        PlatformCommand::ShowSaveFileDialog {
            window_id,
            title,
            default_filename,
            initial_dir,
        } => execute_show_save_file_dialog(
            internal_state,
            window_id,
            &title,
            &default_filename,
            initial_dir,
        ),
        PlatformCommand::ShowMessageDialog {
            window_id,
            message,
            severity,
        } => execute_show_message_dialog(internal_state, window_id, &message, severity),
        PlatformCommand::ShowPages { window_id, pages } => {
            execute_show_pages(internal_state, window_id, pages)
        }
        PlatformCommand::ShowSavedNotification { window_id, text } => {
            execute_show_saved_notification(internal_state, window_id, text)
        }
        PlatformCommand::HideSavedNotification { window_id } => {
            execute_hide_saved_notification(internal_state, window_id)
        }
        PlatformCommand::ScheduleTimer {
            window_id,
            timer_id,
            delay,
        } => execute_schedule_timer(internal_state, window_id, timer_id, delay),
    }
}

pub(crate) fn execute_set_window_title(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    title: String,
) -> PlatformResult<()> {
    internal_state.with_window_mut(window_id, |w| w.title = title.clone())?;
    internal_state.print(&format!("== {title} =="));
    Ok(())
}

pub(crate) fn execute_show_window(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    let status = internal_state.with_window_mut(window_id, |w| {
        w.visible = true;
        window_common::render_status(w)
    })?;
    internal_state.print(&status);
    Ok(())
}

/*
 * Removes the window record and reports `WindowDestroyed`, as a native window
 * would after processing its close message.
 */
pub(crate) fn execute_close_window(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    let removed = internal_state
        .windows
        .write()
        .map_err(|_| PlatformError::OperationFailed("Failed to lock windows map for close".into()))?
        .remove(&window_id);
    if removed.is_none() {
        return Err(PlatformError::InvalidHandle(format!(
            "WindowId {window_id:?} not found for CloseWindow"
        )));
    }
    log::debug!("CommandExecutor: Closed window {window_id:?}");
    internal_state.post_event(AppEvent::WindowDestroyed { window_id })
}

pub(crate) fn execute_set_action_enabled(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    action: ActionId,
    enabled: bool,
) -> PlatformResult<()> {
    let changed = internal_state.with_window_mut(window_id, |w| {
        w.action_enabled.insert(action, enabled) != Some(enabled)
    })?;
    if changed {
        log::trace!(
            "CommandExecutor: '{}' is now {}",
            action.name(),
            if enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

pub(crate) fn execute_set_cursor(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    cursor: CursorKind,
) -> PlatformResult<()> {
    let (previous, status) = internal_state.with_window_mut(window_id, |w| {
        let previous = w.cursor;
        w.cursor = cursor;
        (previous, window_common::render_status(w))
    })?;
    // The status line is printed when work starts or ends, not for every toggle.
    if previous != cursor {
        internal_state.print(&status);
    }
    Ok(())
}

fn report_dialog(
    internal_state: &Arc<ConsoleInternalState>,
    title: &str,
    answer: Option<&PathBuf>,
) {
    match answer {
        Some(path) => log::debug!("CommandExecutor: '{title}' answered with {path:?}"),
        None => internal_state.print(&format!("{title}: cancelled")),
    }
}

// Answers the open dialog with the path typed together with the `open` command.
pub(crate) fn execute_show_open_file_dialog(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    title: &str,
    initial_dir: Option<PathBuf>,
) -> PlatformResult<()> {
    log::trace!("CommandExecutor: Open dialog starts in {initial_dir:?}");
    let result = internal_state
        .lock_answer(&internal_state.pending_open_answer)?
        .take();
    report_dialog(internal_state, title, result.as_ref());
    internal_state.post_event(AppEvent::FileOpenDialogCompleted { window_id, result })
}

/*
 * Answers the save dialog with the typed path. A bare `save` accepts the proposed
 * file name inside the dialog's initial directory.
 */
pub(crate) fn execute_show_save_file_dialog(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    title: &str,
    default_filename: &str,
    initial_dir: Option<PathBuf>,
) -> PlatformResult<()> {
    let typed = internal_state
        .lock_answer(&internal_state.pending_save_answer)?
        .take();
    let result = typed.map(|path| {
        if !path.as_os_str().is_empty() {
            path
        } else if let Some(dir) = &initial_dir {
            dir.join(default_filename)
        } else {
            PathBuf::from(default_filename)
        }
    });
    report_dialog(internal_state, title, result.as_ref());
    internal_state.post_event(AppEvent::FileSaveDialogCompleted { window_id, result })
}

pub(crate) fn execute_show_message_dialog(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    message: &str,
    severity: MessageSeverity,
) -> PlatformResult<()> {
    internal_state.with_window(window_id, |_| ())?;
    let prefix = match severity {
        MessageSeverity::Information => "Info",
        MessageSeverity::Warning => "Warning",
        MessageSeverity::Error => "Error",
    };
    internal_state.print(&format!("{prefix}: {message}"));
    Ok(())
}

// Replacing the pages also clears the selection, as a list view would.
pub(crate) fn execute_show_pages(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    pages: Vec<PageDescriptor>,
) -> PlatformResult<()> {
    let text = internal_state.with_window_mut(window_id, |w| {
        w.pages = pages;
        w.selected_pages.clear();
        window_common::render_pages(w)
    })?;
    internal_state.print(&text);
    Ok(())
}

pub(crate) fn execute_show_saved_notification(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    text: String,
) -> PlatformResult<()> {
    internal_state.with_window_mut(window_id, |w| w.saved_notification = Some(text.clone()))?;
    internal_state.print(&format!("({text})"));
    Ok(())
}

pub(crate) fn execute_hide_saved_notification(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
) -> PlatformResult<()> {
    internal_state.with_window_mut(window_id, |w| w.saved_notification = None)?;
    Ok(())
}

pub(crate) fn execute_schedule_timer(
    internal_state: &Arc<ConsoleInternalState>,
    window_id: WindowId,
    timer_id: TimerId,
    delay: Duration,
) -> PlatformResult<()> {
    let state = Arc::clone(internal_state);
    thread::Builder::new()
        .name(format!("timer-{}", timer_id.0))
        .spawn(move || {
            thread::sleep(delay);
            if state
                .post_event(AppEvent::TimerElapsed {
                    window_id,
                    timer_id,
                })
                .is_err()
            {
                log::trace!("CommandExecutor: Timer {timer_id:?} fired after shutdown.");
            }
        })?;
    Ok(())
}
