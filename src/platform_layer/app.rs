use super::command_executor;
use super::console_input::{self, ConsoleInput};
use super::error::{PlatformError, Result as PlatformResult};
use super::types::{
    ActionId, AppEvent, PlatformCommand, PlatformEventHandler, UiThreadWaker, WindowConfig,
    WindowId,
};
use super::window_common::{self, NativeWindowData};

use std::collections::HashMap;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;

/*
 * Internal state of the console platform layer. It holds the per-window records
 * that stand in for native windows, the sending side of the event queue that the
 * platform loop drains, and the answers typed for the next file dialogs. Shared
 * between the platform loop, the stdin reader thread, and timer threads.
 */
pub(crate) struct ConsoleInternalState {
    next_window_id_counter: AtomicUsize,
    pub(crate) windows: RwLock<HashMap<WindowId, NativeWindowData>>,
    event_sender: Sender<AppEvent>,
    pub(crate) pending_open_answer: Mutex<Option<PathBuf>>,
    pub(crate) pending_save_answer: Mutex<Option<PathBuf>>,
    is_quitting: AtomicBool,
    // Silences rendering, used by tests.
    quiet: bool,
}

impl ConsoleInternalState {
    pub(crate) fn new(event_sender: Sender<AppEvent>, quiet: bool) -> Arc<Self> {
        Arc::new(ConsoleInternalState {
            next_window_id_counter: AtomicUsize::new(1),
            windows: RwLock::new(HashMap::new()),
            event_sender,
            pending_open_answer: Mutex::new(None),
            pending_save_answer: Mutex::new(None),
            is_quitting: AtomicBool::new(false),
            quiet,
        })
    }

    pub(crate) fn generate_window_id(&self) -> WindowId {
        WindowId(self.next_window_id_counter.fetch_add(1, Ordering::Relaxed))
    }

    /*
     * Queues an event for the platform loop. Fails only once the loop has gone away,
     * which callers on other threads treat as shutdown.
     */
    pub(crate) fn post_event(&self, event: AppEvent) -> PlatformResult<()> {
        self.event_sender.send(event).map_err(|e| {
            PlatformError::OperationFailed(format!("Event loop is gone, dropped {:?}", e.0))
        })
    }

    pub(crate) fn signal_quit_intent(&self) {
        log::debug!("Platform: Quit requested.");
        self.is_quitting.store(true, Ordering::Release);
    }

    pub(crate) fn is_quitting(&self) -> bool {
        self.is_quitting.load(Ordering::Acquire)
    }

    pub(crate) fn print(&self, text: &str) {
        if !self.quiet {
            println!("{text}");
        }
    }

    pub(crate) fn with_window<R>(
        &self,
        window_id: WindowId,
        f: impl FnOnce(&NativeWindowData) -> R,
    ) -> PlatformResult<R> {
        let windows = self.windows.read().map_err(|_| {
            PlatformError::OperationFailed("Failed to lock windows map for reading".into())
        })?;
        windows
            .get(&window_id)
            .map(f)
            .ok_or_else(|| PlatformError::InvalidHandle(format!("WindowId {window_id:?} not found")))
    }

    pub(crate) fn with_window_mut<R>(
        &self,
        window_id: WindowId,
        f: impl FnOnce(&mut NativeWindowData) -> R,
    ) -> PlatformResult<R> {
        let mut windows = self.windows.write().map_err(|_| {
            PlatformError::OperationFailed("Failed to lock windows map for writing".into())
        })?;
        windows
            .get_mut(&window_id)
            .map(f)
            .ok_or_else(|| PlatformError::InvalidHandle(format!("WindowId {window_id:?} not found")))
    }

    // The console drives a single window; input is routed to the first one.
    pub(crate) fn main_window_id(&self) -> Option<WindowId> {
        let windows = self.windows.read().ok()?;
        windows.keys().min_by_key(|id| id.0).copied()
    }

    /*
     * Translates one typed line into platform events, the way a native window would
     * translate clicks. Disabled actions are refused here, before the application
     * logic sees them.
     */
    pub(crate) fn handle_console_input(&self, input: ConsoleInput) -> PlatformResult<()> {
        let Some(window_id) = self.main_window_id() else {
            log::warn!("Platform: Console input {input:?} without a window.");
            return Ok(());
        };
        match input {
            ConsoleInput::Open(path) => {
                *self.lock_answer(&self.pending_open_answer)? = Some(path);
                self.trigger_action(window_id, ActionId::OpenDocument)
            }
            ConsoleInput::Save(path) => {
                if self.trigger_allowed(window_id, ActionId::SaveDocument)? {
                    *self.lock_answer(&self.pending_save_answer)? = Some(path);
                    self.post_event(AppEvent::ActionTriggered {
                        window_id,
                        action: ActionId::SaveDocument,
                    })?;
                }
                Ok(())
            }
            ConsoleInput::Select(selected_pages) => {
                self.with_window_mut(window_id, |w| {
                    w.selected_pages = selected_pages
                        .iter()
                        .copied()
                        .filter(|p| *p < w.pages.len())
                        .collect();
                })?;
                let selected_pages = self.with_window(window_id, |w| w.selected_pages.clone())?;
                self.post_event(AppEvent::PageSelectionChanged {
                    window_id,
                    selected_pages,
                })
            }
            ConsoleInput::Action(action) => self.trigger_action(window_id, action),
            ConsoleInput::CloseNotification => {
                self.post_event(AppEvent::SavedNotificationCloseClicked { window_id })
            }
            ConsoleInput::Show => {
                let text = self.with_window(window_id, |w| {
                    format!(
                        "{}\n{}",
                        window_common::render_status(w),
                        window_common::render_pages(w)
                    )
                })?;
                self.print(&text);
                Ok(())
            }
            ConsoleInput::Help => {
                self.print(console_input::HELP_TEXT);
                Ok(())
            }
            ConsoleInput::Quit => {
                self.post_event(AppEvent::WindowCloseRequestedByUser { window_id })
            }
        }
    }

    fn trigger_allowed(&self, window_id: WindowId, action: ActionId) -> PlatformResult<bool> {
        let enabled = self.with_window(window_id, |w| w.is_action_enabled(action))?;
        if !enabled {
            self.print(&format!("'{}' is not available right now.", action.name()));
        }
        Ok(enabled)
    }

    fn trigger_action(&self, window_id: WindowId, action: ActionId) -> PlatformResult<()> {
        if self.trigger_allowed(window_id, action)? {
            self.post_event(AppEvent::ActionTriggered { window_id, action })?;
        }
        Ok(())
    }

    pub(crate) fn lock_answer<'a>(
        &self,
        answer: &'a Mutex<Option<PathBuf>>,
    ) -> PlatformResult<std::sync::MutexGuard<'a, Option<PathBuf>>> {
        answer.lock().map_err(|_| {
            PlatformError::OperationFailed("Failed to lock pending dialog answer".into())
        })
    }
}

// Delivers `AppEvent::NotificationsPending` into the console event queue.
struct ConsoleWaker {
    event_sender: Sender<AppEvent>,
}

impl UiThreadWaker for ConsoleWaker {
    fn wake(&self) {
        if self.event_sender.send(AppEvent::NotificationsPending).is_err() {
            log::trace!("Platform: Wake-up after the event loop exited.");
        }
    }
}

/// The primary interface to the console platform layer.
pub struct PlatformInterface {
    internal_state: Arc<ConsoleInternalState>,
    event_receiver: Mutex<Option<Receiver<AppEvent>>>,
    event_sender: Sender<AppEvent>,
}

impl PlatformInterface {
    pub fn new() -> PlatformResult<Self> {
        let (event_sender, event_receiver) = mpsc::channel();
        let internal_state = ConsoleInternalState::new(event_sender.clone(), false);
        log::debug!("Platform: Console platform initialized.");
        Ok(PlatformInterface {
            internal_state,
            event_receiver: Mutex::new(Some(event_receiver)),
            event_sender,
        })
    }

    // A waker that can be handed to code running on other threads.
    pub fn ui_thread_waker(&self) -> Arc<dyn UiThreadWaker> {
        Arc::new(ConsoleWaker {
            event_sender: self.event_sender.clone(),
        })
    }

    /*
     * Registers a console window and queues `MainWindowUISetupComplete` for it, so the
     * application logic configures it as soon as the loop runs.
     */
    pub fn create_window(&self, config: WindowConfig) -> PlatformResult<WindowId> {
        let window_id = self.internal_state.generate_window_id();
        log::debug!(
            "Platform: Creating window {window_id:?} '{}' ({}x{}, min {}x{})",
            config.title,
            config.width,
            config.height,
            config.min_width,
            config.min_height
        );
        self.internal_state
            .windows
            .write()
            .map_err(|_| {
                PlatformError::OperationFailed("Failed to lock windows map for insert".into())
            })?
            .insert(window_id, NativeWindowData::new(window_id, config.title));
        self.internal_state
            .post_event(AppEvent::MainWindowUISetupComplete { window_id })?;
        Ok(window_id)
    }

    pub fn execute_command(&self, command: PlatformCommand) -> PlatformResult<()> {
        command_executor::execute_command(&self.internal_state, command)
    }

    fn spawn_input_reader(&self) -> PlatformResult<()> {
        let state = Arc::clone(&self.internal_state);
        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::error!("Platform: Failed to read console input: {e}");
                            break;
                        }
                    };
                    let result = match console_input::parse_console_line(&line) {
                        Ok(Some(input)) => state.handle_console_input(input),
                        Ok(None) => Ok(()),
                        Err(message) => {
                            state.print(&message);
                            Ok(())
                        }
                    };
                    if let Err(e) = result {
                        log::debug!("Platform: Stopping console input: {e}");
                        return;
                    }
                    if state.is_quitting() {
                        return;
                    }
                }
                log::debug!("Platform: End of console input, requesting close.");
                if let Some(window_id) = state.main_window_id() {
                    let _ = state.post_event(AppEvent::WindowCloseRequestedByUser { window_id });
                }
            })
            .map_err(|e| PlatformError::InitializationFailed(format!("Console input: {e}")))?;
        Ok(())
    }

    /*
     * Runs the interaction-thread loop: every queued event goes to the handler, then
     * the commands the handler queued are executed in order. Returns once the
     * handler asked to quit.
     */
    pub fn run(&self, event_handler: Arc<Mutex<dyn PlatformEventHandler>>) -> PlatformResult<()> {
        let receiver = self
            .event_receiver
            .lock()
            .map_err(|_| PlatformError::OperationFailed("Event receiver lock poisoned".into()))?
            .take()
            .ok_or_else(|| PlatformError::OperationFailed("Event loop already ran".into()))?;
        self.internal_state.print(super::console_input::HELP_TEXT);
        self.spawn_input_reader()?;

        while !self.internal_state.is_quitting() {
            let Ok(event) = receiver.recv() else {
                log::debug!("Platform: All event senders gone, leaving loop.");
                break;
            };
            log::trace!("Platform: Dispatching {event:?}");
            let mut handler = event_handler.lock().map_err(|_| {
                PlatformError::OperationFailed("Event handler lock poisoned".into())
            })?;
            handler.handle_event(event);
            while let Some(command) = handler.try_dequeue_command() {
                if let Err(e) = self.execute_command(command) {
                    log::error!("Platform: Error executing command: {e}");
                }
            }
        }

        if let Ok(mut handler) = event_handler.lock() {
            handler.on_quit();
        }
        log::debug!("Platform: Event loop exited cleanly.");
        Ok(())
    }
}
