use super::main_window_ui_state::{BusyState, MainWindowUiState};
use super::ui_constants;
use crate::core::{
    AppConfig, CommandExecuted, CommandOutcome, CommandSlot, ConfigManagerOperations,
    ConnectionId, Document, DocumentError, DocumentStoreOperations, Page, QueueOutcome,
    RemovePagesCommand, RotatePagesCommand, RotationDirection, SharedDocument, lock_document,
    path_utils,
};
use crate::platform_layer::{
    ActionId, AppEvent, CursorKind, MessageSeverity, PageDescriptor, PlatformCommand,
    PlatformEventHandler, TimerId, UiThreadWaker, WindowId,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

// Lifecycle notifications forwarded from the command slot and the current document.
#[derive(Debug)]
pub(crate) enum LifecycleNotification {
    Queued,
    Executed(CommandExecuted),
}

/*
 * Manages the main window's presentation logic in a platform-agnostic manner. It
 * turns `AppEvent`s into `PlatformCommand`s, sends page edits and undo/redo through
 * the shared `CommandSlot`, and reflects the slot's lifecycle in the window: a
 * "queued" notification makes the window busy (undo/redo off, progress cursor), the
 * matching "executed" notification makes it idle again and shows the new pages.
 *
 * Notifications can be raised on any thread. Their callbacks only push into an
 * inbox and wake the platform loop; the inbox is drained on the interaction thread
 * at the end of every `handle_event`.
 */
pub struct SlicerAppLogic {
    pub(crate) ui_state: Option<MainWindowUiState>,
    pub(crate) document: Option<SharedDocument>,
    pub(crate) config: AppConfig,
    command_slot: CommandSlot,
    queued_connection: ConnectionId,
    /* The current document's "command executed" connection. */
    executed_connection: Option<ConnectionId>,
    notification_sender: Sender<LifecycleNotification>,
    notification_receiver: Receiver<LifecycleNotification>,
    waker: Arc<dyn UiThreadWaker>,
    document_store: Arc<dyn DocumentStoreOperations>,
    config_manager: Arc<dyn ConfigManagerOperations>,
    synchronous_command_queue: VecDeque<PlatformCommand>,
}

impl SlicerAppLogic {
    pub fn new(
        command_slot: CommandSlot,
        document_store: Arc<dyn DocumentStoreOperations>,
        config_manager: Arc<dyn ConfigManagerOperations>,
        config: AppConfig,
        waker: Arc<dyn UiThreadWaker>,
    ) -> Self {
        let (notification_sender, notification_receiver) = mpsc::channel();

        let queued_sender = notification_sender.clone();
        let queued_waker = Arc::clone(&waker);
        let queued_connection = command_slot.command_queued().connect(move |_| {
            if queued_sender.send(LifecycleNotification::Queued).is_ok() {
                queued_waker.wake();
            }
        });

        SlicerAppLogic {
            ui_state: None,
            document: None,
            config,
            command_slot,
            queued_connection,
            executed_connection: None,
            notification_sender,
            notification_receiver,
            waker,
            document_store,
            config_manager,
            synchronous_command_queue: VecDeque::new(),
        }
    }

    fn enqueue_command(&mut self, command: PlatformCommand) {
        self.synchronous_command_queue.push_back(command);
    }

    fn is_main_window(&self, window_id: WindowId) -> bool {
        self.ui_state
            .as_ref()
            .is_some_and(|s| s.window_id == window_id)
    }

    fn set_action_enabled(&mut self, window_id: WindowId, action: ActionId, enabled: bool) {
        self.enqueue_command(PlatformCommand::SetActionEnabled {
            window_id,
            action,
            enabled,
        });
    }

    fn page_descriptors(pages: &[Page]) -> Vec<PageDescriptor> {
        pages
            .iter()
            .enumerate()
            .map(|(position, page)| PageDescriptor {
                position,
                source_index: page.source_index,
                rotation_degrees: page.rotation.degrees(),
            })
            .collect()
    }

    fn push_history_enablement(&mut self) {
        let Some(ui_state) = &self.ui_state else {
            return;
        };
        let window_id = ui_state.window_id;
        let (undo, redo) = (ui_state.undo_enabled(), ui_state.redo_enabled());
        self.set_action_enabled(window_id, ActionId::Undo, undo);
        self.set_action_enabled(window_id, ActionId::Redo, redo);
    }

    fn push_page_action_enablement(&mut self) {
        let Some(ui_state) = &self.ui_state else {
            return;
        };
        let window_id = ui_state.window_id;
        for (action, enabled) in ui_state.page_action_states() {
            self.set_action_enabled(window_id, action, enabled);
        }
    }

    // Replaces the page view; the view's selection is cleared with it.
    fn show_pages(&mut self, pages: &[Page]) {
        let Some(ui_state) = self.ui_state.as_mut() else {
            return;
        };
        ui_state.pages = pages.to_vec();
        ui_state.set_selection(Vec::new());
        let window_id = ui_state.window_id;
        self.enqueue_command(PlatformCommand::ShowPages {
            window_id,
            pages: Self::page_descriptors(pages),
        });
        self.push_page_action_enablement();
    }

    fn show_error(&mut self, window_id: WindowId, message: String) {
        self.enqueue_command(PlatformCommand::ShowMessageDialog {
            window_id,
            message,
            severity: MessageSeverity::Error,
        });
    }

    /*
     * Hands a document operation to the command slot. The busy transition happens
     * through the slot's "queued" notification, not here; a rejected request changes
     * nothing in the window.
     */
    fn queue_document_command<F>(&mut self, description: &str, command: F)
    where
        F: FnOnce(&mut Document) -> Result<(), DocumentError> + Send + 'static,
    {
        let Some(document) = &self.document else {
            log::warn!("AppLogic: '{description}' requested without an open document.");
            return;
        };
        match self.command_slot.queue_command(document, command) {
            QueueOutcome::Accepted => log::debug!("AppLogic: Queued '{description}'."),
            QueueOutcome::RejectedBusy => {
                log::info!("AppLogic: '{description}' ignored, a command is still running.")
            }
        }
    }

    fn handle_action(&mut self, window_id: WindowId, action: ActionId) {
        log::debug!("AppLogic: Action triggered: {}", action.name());
        let Some(ui_state) = &self.ui_state else {
            return;
        };
        let selection = ui_state.selected_pages.clone();
        let single = ui_state.single_selected_page();

        match action {
            ActionId::OpenDocument => {
                let initial_dir = self.config.last_document_dir.clone();
                self.enqueue_command(PlatformCommand::ShowOpenFileDialog {
                    window_id,
                    title: ui_constants::OPEN_DIALOG_TITLE.to_string(),
                    initial_dir,
                });
            }
            ActionId::SaveDocument => {
                let Some(file_name) = ui_state.document_file_name.clone() else {
                    log::warn!("AppLogic: Save requested without an open document.");
                    return;
                };
                let initial_dir = self.config.last_document_dir.clone();
                self.enqueue_command(PlatformCommand::ShowSaveFileDialog {
                    window_id,
                    title: ui_constants::SAVE_DIALOG_TITLE.to_string(),
                    default_filename: file_name,
                    initial_dir,
                });
            }
            ActionId::Undo => self.queue_document_command("undo", |doc| doc.undo_command()),
            ActionId::Redo => self.queue_document_command("redo", |doc| doc.redo_command()),
            ActionId::RemoveSelectedPages => {
                if selection.is_empty() {
                    log::warn!("AppLogic: Remove requested with an empty selection.");
                    return;
                }
                self.queue_document_command("remove selected pages", move |doc| {
                    doc.execute_command(Box::new(RemovePagesCommand::selected(selection)))
                });
            }
            ActionId::RemovePreviousPages | ActionId::RemoveNextPages => {
                let Some(page) = single else {
                    log::warn!("AppLogic: {} needs exactly one selected page.", action.name());
                    return;
                };
                let command = if action == ActionId::RemovePreviousPages {
                    RemovePagesCommand::before(page)
                } else {
                    RemovePagesCommand::after(page)
                };
                self.queue_document_command(action.name(), move |doc| {
                    doc.execute_command(Box::new(command))
                });
            }
            ActionId::RotatePagesLeft | ActionId::RotatePagesRight => {
                if selection.is_empty() {
                    log::warn!("AppLogic: Rotate requested with an empty selection.");
                    return;
                }
                let direction = if action == ActionId::RotatePagesLeft {
                    RotationDirection::Left
                } else {
                    RotationDirection::Right
                };
                self.queue_document_command(action.name(), move |doc| {
                    doc.execute_command(Box::new(RotatePagesCommand::new(selection, direction)))
                });
            }
        }
    }

    fn handle_open_dialog_completed(&mut self, window_id: WindowId, path: &Path) {
        log::debug!("AppLogic: Opening document {path:?}");
        match self.document_store.open_document(path) {
            Ok(document) => self.install_document(window_id, document, path),
            Err(e) => {
                log::error!("AppLogic: Failed to open {path:?}: {e}");
                self.show_error(window_id, ui_constants::OPEN_FAILED_MESSAGE.to_string());
            }
        }
    }

    /*
     * Drops the current document. Its "command executed" connection is removed only
     * while the slot is idle: a command still queued or running on it must be able to
     * report completion (which ends the busy state), and no command holds its lock.
     * Otherwise the document stays connected until that command finishes and releases
     * the last reference; its notification is then recognised as stale by document id.
     */
    fn release_document(&mut self) {
        let connection = self.executed_connection.take();
        let Some(document) = self.document.take() else {
            return;
        };
        match connection {
            Some(id) if !self.command_slot.is_busy() => {
                lock_document(&document).command_executed().disconnect(id);
            }
            Some(_) => log::debug!(
                "AppLogic: Releasing a document with a command in flight, keeping its connection."
            ),
            None => {}
        }
    }

    fn install_document(&mut self, window_id: WindowId, document: Document, path: &Path) {
        let document = document.with_history_limit(self.config.history_limit);
        let document_id = document.id();
        let file_name = document.file_name().to_string();
        let pages = document.pages().to_vec();

        let executed_sender = self.notification_sender.clone();
        let executed_waker = Arc::clone(&self.waker);
        let connection =
            document
                .command_executed()
                .connect(move |notification: &CommandExecuted| {
                    if executed_sender
                        .send(LifecycleNotification::Executed(notification.clone()))
                        .is_ok()
                    {
                        executed_waker.wake();
                    }
                });

        self.release_document();
        self.document = Some(document.into_shared());
        self.executed_connection = Some(connection);
        if let Some(dir) = path_utils::containing_dir(path) {
            self.config.last_document_dir = Some(dir);
        }

        let Some(ui_state) = self.ui_state.as_mut() else {
            return;
        };
        ui_state.document_id = Some(document_id);
        ui_state.document_file_name = Some(file_name.clone());
        ui_state.can_undo = false;
        ui_state.can_redo = false;
        log::info!("AppLogic: Opened '{file_name}' with {} pages.", pages.len());

        self.enqueue_command(PlatformCommand::SetWindowTitle {
            window_id,
            title: MainWindowUiState::compose_window_title(Some(&file_name)),
        });
        self.set_action_enabled(window_id, ActionId::SaveDocument, true);
        self.show_pages(&pages);
    }

    /*
     * Writes the layout the window shows, which is the state after the last completed
     * command. A command still in flight is not waited for.
     */
    fn handle_save_dialog_completed(&mut self, window_id: WindowId, path: &Path) {
        let Some(ui_state) = self.ui_state.as_ref().filter(|s| s.document_id.is_some()) else {
            log::warn!("AppLogic: Save dialog completed without an open document.");
            return;
        };
        if ui_state.is_busy() {
            log::debug!("AppLogic: Saving while a command is in flight.");
        }
        let result = self.document_store.save_document(&ui_state.pages, path);
        match result {
            Ok(()) => {
                log::info!("AppLogic: Saved document to {path:?}");
                if let Some(dir) = path_utils::containing_dir(path) {
                    self.config.last_document_dir = Some(dir);
                }
                self.show_saved_notification(window_id);
            }
            Err(e) => {
                log::error!("AppLogic: Failed to save to {path:?}: {e}");
                self.show_error(window_id, ui_constants::SAVE_FAILED_MESSAGE.to_string());
            }
        }
    }

    // A newer notification supersedes the timer of an older one.
    fn show_saved_notification(&mut self, window_id: WindowId) {
        let delay = self.config.saved_notification_timeout();
        let Some(ui_state) = self.ui_state.as_mut() else {
            return;
        };
        let timer_id = ui_state.allocate_timer_id();
        ui_state.saved_notification_timer = Some(timer_id);
        self.enqueue_command(PlatformCommand::ShowSavedNotification {
            window_id,
            text: ui_constants::SAVED_NOTIFICATION_TEXT.to_string(),
        });
        self.enqueue_command(PlatformCommand::ScheduleTimer {
            window_id,
            timer_id,
            delay,
        });
    }

    fn hide_saved_notification(&mut self, window_id: WindowId) {
        if let Some(ui_state) = self.ui_state.as_mut() {
            ui_state.saved_notification_timer = None;
        }
        self.enqueue_command(PlatformCommand::HideSavedNotification { window_id });
    }

    fn handle_timer_elapsed(&mut self, window_id: WindowId, timer_id: TimerId) {
        let is_current = self
            .ui_state
            .as_ref()
            .is_some_and(|s| s.saved_notification_timer == Some(timer_id));
        if is_current {
            self.hide_saved_notification(window_id);
        } else {
            log::trace!("AppLogic: Ignoring stale timer {timer_id:?}");
        }
    }

    fn save_config(&self) {
        if let Err(e) = self
            .config_manager
            .save_config(ui_constants::APP_NAME, &self.config)
        {
            log::error!("AppLogic: Failed to save configuration: {e}");
        }
    }

    pub(crate) fn process_pending_notifications(&mut self) {
        while let Ok(notification) = self.notification_receiver.try_recv() {
            match notification {
                LifecycleNotification::Queued => self.on_command_queued(),
                LifecycleNotification::Executed(executed) => self.on_command_executed(executed),
            }
        }
    }

    fn on_command_queued(&mut self) {
        let Some(ui_state) = self.ui_state.as_mut() else {
            return;
        };
        log::debug!("AppLogic: Command queued, window is busy.");
        ui_state.busy_state = BusyState::Busy;
        let window_id = ui_state.window_id;
        self.push_history_enablement();
        self.enqueue_command(PlatformCommand::SetCursor {
            window_id,
            cursor: CursorKind::Progress,
        });
    }

    fn on_command_executed(&mut self, executed: CommandExecuted) {
        let Some(ui_state) = self.ui_state.as_mut() else {
            return;
        };
        let window_id = ui_state.window_id;
        let is_current = ui_state.document_id == Some(executed.document_id);
        if is_current {
            ui_state.can_undo = executed.snapshot.can_undo;
            ui_state.can_redo = executed.snapshot.can_redo;
        } else {
            log::debug!(
                "AppLogic: Command finished on a replaced document {:?}.",
                executed.document_id
            );
        }
        ui_state.busy_state = BusyState::Idle;
        log::debug!("AppLogic: Command executed ({:?}).", executed.outcome);

        self.push_history_enablement();
        self.enqueue_command(PlatformCommand::SetCursor {
            window_id,
            cursor: CursorKind::Default,
        });

        match executed.outcome {
            CommandOutcome::Applied(_) if is_current => self.show_pages(&executed.snapshot.pages),
            CommandOutcome::Failed(e) => {
                self.show_error(
                    window_id,
                    format!("{}: {e}", ui_constants::COMMAND_FAILED_MESSAGE),
                );
            }
            _ => {}
        }
    }

    pub fn ui_state(&self) -> Option<&MainWindowUiState> {
        self.ui_state.as_ref()
    }
}

impl PlatformEventHandler for SlicerAppLogic {
    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::MainWindowUISetupComplete { window_id } => {
                log::debug!("AppLogic: Main window {window_id:?} ready.");
                self.ui_state = Some(MainWindowUiState::new(window_id));
                self.enqueue_command(PlatformCommand::SetWindowTitle {
                    window_id,
                    title: MainWindowUiState::compose_window_title(None),
                });
                for action in ActionId::ALL {
                    self.set_action_enabled(window_id, action, action == ActionId::OpenDocument);
                }
                self.enqueue_command(PlatformCommand::SetCursor {
                    window_id,
                    cursor: CursorKind::Default,
                });
                self.enqueue_command(PlatformCommand::ShowWindow { window_id });
            }
            AppEvent::WindowCloseRequestedByUser { window_id } => {
                if self.is_main_window(window_id) {
                    self.save_config();
                }
                self.enqueue_command(PlatformCommand::CloseWindow { window_id });
            }
            AppEvent::WindowDestroyed { window_id } => {
                if self.is_main_window(window_id) {
                    log::debug!("AppLogic: Main window destroyed, quitting.");
                    self.release_document();
                    self.ui_state = None;
                    self.enqueue_command(PlatformCommand::QuitApplication);
                }
            }
            AppEvent::ActionTriggered { window_id, action } => {
                if self.is_main_window(window_id) {
                    self.handle_action(window_id, action);
                }
            }
            AppEvent::PageSelectionChanged {
                window_id,
                selected_pages,
            } => {
                if let Some(ui_state) = self.ui_state.as_mut().filter(|s| s.window_id == window_id)
                {
                    ui_state.set_selection(selected_pages);
                    self.push_page_action_enablement();
                }
            }
            AppEvent::FileOpenDialogCompleted { window_id, result } => {
                if self.is_main_window(window_id) {
                    match result {
                        Some(path) => self.handle_open_dialog_completed(window_id, &path),
                        None => log::debug!("AppLogic: Open dialog cancelled."),
                    }
                    self.push_history_enablement();
                }
            }
            AppEvent::FileSaveDialogCompleted { window_id, result } => {
                if self.is_main_window(window_id) {
                    match result {
                        Some(path) => self.handle_save_dialog_completed(window_id, &path),
                        None => log::debug!("AppLogic: Save dialog cancelled."),
                    }
                }
            }
            AppEvent::SavedNotificationCloseClicked { window_id } => {
                if self.is_main_window(window_id) {
                    self.hide_saved_notification(window_id);
                }
            }
            AppEvent::TimerElapsed {
                window_id,
                timer_id,
            } => {
                if self.is_main_window(window_id) {
                    self.handle_timer_elapsed(window_id, timer_id);
                }
            }
            AppEvent::NotificationsPending => {}
        }
        self.process_pending_notifications();
    }

    fn on_quit(&mut self) {
        log::debug!("AppLogic: on_quit called.");
    }

    fn try_dequeue_command(&mut self) -> Option<PlatformCommand> {
        self.synchronous_command_queue.pop_front()
    }
}

impl Drop for SlicerAppLogic {
    fn drop(&mut self) {
        self.release_document();
        self.command_slot
            .command_queued()
            .disconnect(self.queued_connection);
    }
}
