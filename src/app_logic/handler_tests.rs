use super::handler::*;
use super::main_window_ui_state::BusyState;
use crate::app_logic::ui_constants;

use crate::core::config::ConfigError;
use crate::core::document_store::StoreError;
use crate::core::{
    AppConfig, BackgroundThread, CommandSlot, ConfigManagerOperations, Document,
    DocumentStoreOperations, Page, lock_document,
};
use crate::platform_layer::{
    ActionId, AppEvent, CursorKind, MessageSeverity, PlatformCommand, PlatformEventHandler,
    TimerId, UiThreadWaker, WindowId,
};

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

/*
 * This module contains unit tests for `SlicerAppLogic` from the `super::handler`
 * module. The document store and configuration manager are mocked; commands run on a
 * real `BackgroundThread` so the busy/idle transitions are observed the way the
 * platform loop observes them: by draining the handler's inbox on the test thread.
 */

const WAIT: Duration = Duration::from_secs(5);

// --- Mock Structures (DocumentStore, ConfigManager, Waker) ---
struct MockDocumentStore {
    open_results: Mutex<HashMap<PathBuf, Result<Vec<Page>, StoreError>>>,
    save_calls: Mutex<Vec<(PathBuf, Vec<Page>)>>,
    fail_saves: Mutex<bool>,
}

impl MockDocumentStore {
    fn new() -> Self {
        MockDocumentStore {
            open_results: Mutex::new(HashMap::new()),
            save_calls: Mutex::new(Vec::new()),
            fail_saves: Mutex::new(false),
        }
    }
    fn set_open_result(&self, path: &Path, result: Result<Vec<Page>, StoreError>) {
        self.open_results
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), result);
    }
    fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap() = fail;
    }
    fn get_save_calls(&self) -> Vec<(PathBuf, Vec<Page>)> {
        self.save_calls.lock().unwrap().clone()
    }
}

impl DocumentStoreOperations for MockDocumentStore {
    fn open_document(&self, path: &Path) -> Result<Document, StoreError> {
        match self.open_results.lock().unwrap().get(path) {
            Some(Ok(pages)) => {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                Ok(Document::new(name, pages.clone()))
            }
            Some(Err(e)) => Err(StoreError::Io(io::Error::other(e.to_string()))),
            None => Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "mocked missing file",
            ))),
        }
    }
    fn save_document(&self, pages: &[Page], path: &Path) -> Result<(), StoreError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(StoreError::Io(io::Error::other("mocked save failure")));
        }
        self.save_calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), pages.to_vec()));
        Ok(())
    }
}
// --- End MockDocumentStore ---

struct MockConfigManager {
    saved_configs: Mutex<Vec<(String, AppConfig)>>,
}

impl MockConfigManager {
    fn new() -> Self {
        MockConfigManager {
            saved_configs: Mutex::new(Vec::new()),
        }
    }
    fn get_saved_configs(&self) -> Vec<(String, AppConfig)> {
        self.saved_configs.lock().unwrap().clone()
    }
}

impl ConfigManagerOperations for MockConfigManager {
    fn load_config(&self, _app_name: &str) -> Result<AppConfig, ConfigError> {
        Ok(AppConfig::default())
    }
    fn save_config(&self, app_name: &str, config: &AppConfig) -> Result<(), ConfigError> {
        self.saved_configs
            .lock()
            .unwrap()
            .push((app_name.to_string(), config.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct CountingWaker {
    wakes: AtomicUsize,
}

impl UiThreadWaker for CountingWaker {
    fn wake(&self) {
        self.wakes.fetch_add(1, Ordering::SeqCst);
    }
}
// --- End Mocks ---

struct Harness {
    logic: SlicerAppLogic,
    slot: CommandSlot,
    store: Arc<MockDocumentStore>,
    config_manager: Arc<MockConfigManager>,
    waker: Arc<CountingWaker>,
    _background: Arc<BackgroundThread>,
    window_id: WindowId,
}

fn setup_logic_with_mocks() -> Harness {
    crate::initialize_logging();
    let background = Arc::new(BackgroundThread::spawn("handler-test-worker").unwrap());
    let slot = CommandSlot::new(Arc::clone(&background));
    let store = Arc::new(MockDocumentStore::new());
    let config_manager = Arc::new(MockConfigManager::new());
    let waker = Arc::new(CountingWaker::default());

    let logic = SlicerAppLogic::new(
        slot.clone(),
        Arc::clone(&store) as Arc<dyn DocumentStoreOperations>,
        Arc::clone(&config_manager) as Arc<dyn ConfigManagerOperations>,
        AppConfig::default(),
        Arc::clone(&waker) as Arc<dyn UiThreadWaker>,
    );
    let mut harness = Harness {
        logic,
        slot,
        store,
        config_manager,
        waker,
        _background: background,
        window_id: WindowId(1),
    };
    harness.logic.handle_event(AppEvent::MainWindowUISetupComplete {
        window_id: harness.window_id,
    });
    drain(&mut harness.logic);
    harness
}

fn drain(logic: &mut SlicerAppLogic) -> Vec<PlatformCommand> {
    let mut commands = Vec::new();
    while let Some(command) = logic.try_dequeue_command() {
        commands.push(command);
    }
    commands
}

fn find_enabled(commands: &[PlatformCommand], action: ActionId) -> Option<bool> {
    commands.iter().rev().find_map(|c| match c {
        PlatformCommand::SetActionEnabled {
            action: a, enabled, ..
        } if *a == action => Some(*enabled),
        _ => None,
    })
}

fn find_cursor(commands: &[PlatformCommand]) -> Option<CursorKind> {
    commands.iter().rev().find_map(|c| match c {
        PlatformCommand::SetCursor { cursor, .. } => Some(*cursor),
        _ => None,
    })
}

fn shown_pages(commands: &[PlatformCommand]) -> Option<Vec<usize>> {
    commands.iter().rev().find_map(|c| match c {
        PlatformCommand::ShowPages { pages, .. } => {
            Some(pages.iter().map(|p| p.source_index).collect())
        }
        _ => None,
    })
}

/*
 * Waits until the slot is idle (its busy flag is released only after the "executed"
 * notification went out), then lets the handler drain its inbox.
 */
fn settle(harness: &mut Harness) -> Vec<PlatformCommand> {
    let deadline = Instant::now() + WAIT;
    while harness.slot.is_busy() {
        assert!(Instant::now() < deadline, "command did not finish in time");
        thread::sleep(Duration::from_millis(2));
    }
    harness.logic.handle_event(AppEvent::NotificationsPending);
    drain(&mut harness.logic)
}

fn open_document(harness: &mut Harness, file: &str, page_count: usize) -> Vec<PlatformCommand> {
    let path = PathBuf::from("/docs").join(file);
    harness
        .store
        .set_open_result(&path, Ok(Page::sequence(page_count)));
    harness.logic.handle_event(AppEvent::FileOpenDialogCompleted {
        window_id: harness.window_id,
        result: Some(path),
    });
    drain(&mut harness.logic)
}

fn select(harness: &mut Harness, pages: Vec<usize>) -> Vec<PlatformCommand> {
    harness.logic.handle_event(AppEvent::PageSelectionChanged {
        window_id: harness.window_id,
        selected_pages: pages,
    });
    drain(&mut harness.logic)
}

fn trigger(harness: &mut Harness, action: ActionId) -> Vec<PlatformCommand> {
    harness.logic.handle_event(AppEvent::ActionTriggered {
        window_id: harness.window_id,
        action,
    });
    drain(&mut harness.logic)
}

/*
 * Triggers an action and returns everything the window was told until the command
 * finished. The command may complete before `handle_event` returns, in which case
 * the idle transition already shows up in the trigger's own output.
 */
fn trigger_and_settle(harness: &mut Harness, action: ActionId) -> Vec<PlatformCommand> {
    let mut commands = trigger(harness, action);
    commands.extend(settle(harness));
    commands
}

#[test]
fn test_setup_complete_disables_everything_but_open() {
    crate::initialize_logging();
    let background = Arc::new(BackgroundThread::spawn("setup-test-worker").unwrap());
    let mut logic = SlicerAppLogic::new(
        CommandSlot::new(background),
        Arc::new(MockDocumentStore::new()),
        Arc::new(MockConfigManager::new()),
        AppConfig::default(),
        Arc::new(CountingWaker::default()),
    );
    let window_id = WindowId(7);

    logic.handle_event(AppEvent::MainWindowUISetupComplete { window_id });
    let commands = drain(&mut logic);

    assert!(commands.contains(&PlatformCommand::SetWindowTitle {
        window_id,
        title: "Page Slicer".to_string()
    }));
    for action in ActionId::ALL {
        assert_eq!(
            find_enabled(&commands, action),
            Some(action == ActionId::OpenDocument),
            "unexpected enablement for {action:?}"
        );
    }
    assert_eq!(
        commands.last(),
        Some(&PlatformCommand::ShowWindow { window_id })
    );
}

#[test]
fn test_open_document_shows_pages_and_enables_save() {
    let mut h = setup_logic_with_mocks();

    let commands = open_document(&mut h, "scan.pdf", 3);

    assert!(commands.contains(&PlatformCommand::SetWindowTitle {
        window_id: h.window_id,
        title: "Page Slicer - [scan.pdf]".to_string()
    }));
    assert_eq!(find_enabled(&commands, ActionId::SaveDocument), Some(true));
    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(false));
    assert_eq!(find_enabled(&commands, ActionId::Redo), Some(false));
    assert_eq!(shown_pages(&commands), Some(vec![0, 1, 2]));
    assert_eq!(
        h.logic.config.last_document_dir,
        Some(PathBuf::from("/docs"))
    );
}

#[test]
fn test_open_failure_shows_error_and_keeps_window_empty() {
    let mut h = setup_logic_with_mocks();

    h.logic.handle_event(AppEvent::FileOpenDialogCompleted {
        window_id: h.window_id,
        result: Some(PathBuf::from("/docs/missing.pdf")),
    });
    let commands = drain(&mut h.logic);

    assert!(commands.contains(&PlatformCommand::ShowMessageDialog {
        window_id: h.window_id,
        message: ui_constants::OPEN_FAILED_MESSAGE.to_string(),
        severity: MessageSeverity::Error,
    }));
    assert!(h.logic.document.is_none());
    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(false));
    assert_eq!(find_enabled(&commands, ActionId::Redo), Some(false));
}

#[test]
fn test_open_action_uses_last_document_dir() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "a.pdf", 1);

    let commands = trigger(&mut h, ActionId::OpenDocument);

    assert_eq!(
        commands,
        vec![PlatformCommand::ShowOpenFileDialog {
            window_id: h.window_id,
            title: ui_constants::OPEN_DIALOG_TITLE.to_string(),
            initial_dir: Some(PathBuf::from("/docs")),
        }]
    );
}

#[test]
fn test_selection_drives_page_action_enablement() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 3);

    let commands = select(&mut h, vec![0]);
    assert_eq!(find_enabled(&commands, ActionId::RemoveSelectedPages), Some(true));
    assert_eq!(find_enabled(&commands, ActionId::RemovePreviousPages), Some(false));
    assert_eq!(find_enabled(&commands, ActionId::RemoveNextPages), Some(true));

    let commands = select(&mut h, vec![]);
    assert_eq!(find_enabled(&commands, ActionId::RemoveSelectedPages), Some(false));
    assert_eq!(find_enabled(&commands, ActionId::RotatePagesLeft), Some(false));
}

#[test]
fn test_remove_pages_goes_busy_then_idle_with_undo_enabled() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 4);
    select(&mut h, vec![1, 2]);

    // Hold the document so the command cannot finish while we look at the busy state.
    let document = Arc::clone(h.logic.document.as_ref().unwrap());
    let guard = lock_document(&document);
    let commands = trigger(&mut h, ActionId::RemoveSelectedPages);

    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(false));
    assert_eq!(find_enabled(&commands, ActionId::Redo), Some(false));
    assert_eq!(find_cursor(&commands), Some(CursorKind::Progress));
    assert_eq!(h.logic.ui_state().unwrap().busy_state, BusyState::Busy);
    assert!(h.waker.wakes.load(Ordering::SeqCst) >= 1);
    drop(guard);

    let commands = settle(&mut h);

    assert_eq!(h.logic.ui_state().unwrap().busy_state, BusyState::Idle);
    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(true));
    assert_eq!(find_enabled(&commands, ActionId::Redo), Some(false));
    assert_eq!(find_cursor(&commands), Some(CursorKind::Default));
    assert_eq!(shown_pages(&commands), Some(vec![0, 3]));
    assert!(h.logic.ui_state().unwrap().selected_pages.is_empty());
}

#[test]
fn test_undo_then_redo_round_trip_through_the_window() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 3);
    select(&mut h, vec![0]);
    trigger_and_settle(&mut h, ActionId::RotatePagesRight);

    let commands = trigger_and_settle(&mut h, ActionId::Undo);
    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(false));
    assert_eq!(find_enabled(&commands, ActionId::Redo), Some(true));

    let commands = trigger_and_settle(&mut h, ActionId::Redo);
    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(true));
    assert_eq!(find_enabled(&commands, ActionId::Redo), Some(false));
    let document = h.logic.document.as_ref().unwrap();
    assert_eq!(lock_document(document).pages()[0].rotation.degrees(), 90);
}

#[test]
fn test_undo_on_fresh_document_returns_to_idle() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 2);

    let commands = trigger_and_settle(&mut h, ActionId::Undo);

    assert_eq!(h.logic.ui_state().unwrap().busy_state, BusyState::Idle);
    assert_eq!(find_cursor(&commands), Some(CursorKind::Default));
    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(false));
    assert!(shown_pages(&commands).is_none());
    assert!(
        !commands
            .iter()
            .any(|c| matches!(c, PlatformCommand::ShowMessageDialog { .. }))
    );
}

#[test]
fn test_action_while_busy_is_ignored() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 4);
    select(&mut h, vec![0]);

    let document = Arc::clone(h.logic.document.as_ref().unwrap());
    let guard = lock_document(&document);
    trigger(&mut h, ActionId::RotatePagesLeft);
    let commands = trigger(&mut h, ActionId::RemoveSelectedPages);
    assert!(commands.is_empty());
    drop(guard);

    settle(&mut h);
    let doc = lock_document(&document);
    assert_eq!(doc.page_count(), 4);
    assert_eq!(doc.undo_depth(), 1);
}

#[test]
fn test_failed_command_shows_error_and_leaves_pages() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 2);
    select(&mut h, vec![1]);
    // Shrink the document behind the window's back so the selection is out of range.
    // The window only learns about it after the rotation has been queued, and the
    // failed rotation shows nothing newer than that one-page layout.
    {
        let document = h.logic.document.as_ref().unwrap();
        let mut doc = lock_document(document);
        doc.execute_command(Box::new(crate::core::RemovePagesCommand::selected(vec![1])))
            .unwrap();
    }

    let commands = trigger_and_settle(&mut h, ActionId::RotatePagesLeft);

    assert!(commands.iter().any(|c| matches!(
        c,
        PlatformCommand::ShowMessageDialog {
            severity: MessageSeverity::Error,
            ..
        }
    )));
    assert_eq!(find_cursor(&commands), Some(CursorKind::Default));
    assert_eq!(shown_pages(&commands), Some(vec![0]));
}

#[test]
fn test_notification_from_replaced_document_ends_busy_without_refresh() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "first.pdf", 3);
    select(&mut h, vec![0]);

    let first = Arc::clone(h.logic.document.as_ref().unwrap());
    let guard = lock_document(&first);
    trigger(&mut h, ActionId::RemoveSelectedPages);
    let commands = open_document(&mut h, "second.pdf", 5);
    assert_eq!(shown_pages(&commands), Some(vec![0, 1, 2, 3, 4]));
    drop(guard);

    let commands = settle(&mut h);

    assert_eq!(h.logic.ui_state().unwrap().busy_state, BusyState::Idle);
    assert!(shown_pages(&commands).is_none());
    assert_eq!(find_enabled(&commands, ActionId::Undo), Some(false));
    assert_eq!(h.logic.ui_state().unwrap().page_count(), 5);
}

#[test]
fn test_save_shows_notification_and_schedules_timer() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 2);

    let commands = trigger(&mut h, ActionId::SaveDocument);
    assert!(matches!(
        commands.as_slice(),
        [PlatformCommand::ShowSaveFileDialog { default_filename, .. }] if default_filename == "scan.pdf"
    ));

    h.logic.handle_event(AppEvent::FileSaveDialogCompleted {
        window_id: h.window_id,
        result: Some(PathBuf::from("/out/copy.pdf")),
    });
    let commands = drain(&mut h.logic);

    assert_eq!(h.store.get_save_calls().len(), 1);
    assert!(commands.contains(&PlatformCommand::ShowSavedNotification {
        window_id: h.window_id,
        text: ui_constants::SAVED_NOTIFICATION_TEXT.to_string(),
    }));
    let timer_id = commands
        .iter()
        .find_map(|c| match c {
            PlatformCommand::ScheduleTimer {
                timer_id, delay, ..
            } => {
                assert_eq!(*delay, Duration::from_millis(5000));
                Some(*timer_id)
            }
            _ => None,
        })
        .expect("a timer should be scheduled");

    h.logic.handle_event(AppEvent::TimerElapsed {
        window_id: h.window_id,
        timer_id,
    });
    assert_eq!(
        drain(&mut h.logic),
        vec![PlatformCommand::HideSavedNotification {
            window_id: h.window_id
        }]
    );
}

#[test]
fn test_stale_timer_does_not_hide_newer_notification() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 2);
    for _ in 0..2 {
        h.logic.handle_event(AppEvent::FileSaveDialogCompleted {
            window_id: h.window_id,
            result: Some(PathBuf::from("/out/copy.pdf")),
        });
    }
    drain(&mut h.logic);
    let current = h.logic.ui_state().unwrap().saved_notification_timer.unwrap();
    let stale = TimerId(current.0 - 1);

    h.logic.handle_event(AppEvent::TimerElapsed {
        window_id: h.window_id,
        timer_id: stale,
    });
    assert!(drain(&mut h.logic).is_empty());

    h.logic.handle_event(AppEvent::SavedNotificationCloseClicked {
        window_id: h.window_id,
    });
    assert_eq!(drain(&mut h.logic).len(), 1);
    assert!(h.logic.ui_state().unwrap().saved_notification_timer.is_none());
}

#[test]
fn test_save_while_busy_writes_shown_pages_without_waiting() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 3);
    select(&mut h, vec![0]);

    // Keep the document locked from another thread, as a long-running command would.
    let document = Arc::clone(h.logic.document.as_ref().unwrap());
    let (locked_tx, locked_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let holder = thread::spawn(move || {
        let _guard = lock_document(&document);
        locked_tx.send(()).unwrap();
        let _ = release_rx.recv_timeout(WAIT);
    });
    locked_rx.recv().unwrap();
    trigger(&mut h, ActionId::RemoveSelectedPages);
    assert!(h.logic.ui_state().unwrap().is_busy());

    let started = Instant::now();
    h.logic.handle_event(AppEvent::FileSaveDialogCompleted {
        window_id: h.window_id,
        result: Some(PathBuf::from("/out/busy.json")),
    });
    let elapsed = started.elapsed();
    let _ = release_tx.send(());
    holder.join().unwrap();

    assert!(elapsed < Duration::from_secs(1), "save waited {elapsed:?}");
    let saves = h.store.get_save_calls();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].1, Page::sequence(3));

    // Once the command completed, a save writes the edited layout.
    settle(&mut h);
    h.logic.handle_event(AppEvent::FileSaveDialogCompleted {
        window_id: h.window_id,
        result: Some(PathBuf::from("/out/after.json")),
    });
    let saves = h.store.get_save_calls();
    assert_eq!(
        saves[1].1.iter().map(|p| p.source_index).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[test]
fn test_save_failure_shows_error() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 2);
    h.store.set_fail_saves(true);

    h.logic.handle_event(AppEvent::FileSaveDialogCompleted {
        window_id: h.window_id,
        result: Some(PathBuf::from("/out/copy.pdf")),
    });
    let commands = drain(&mut h.logic);

    assert_eq!(
        commands,
        vec![PlatformCommand::ShowMessageDialog {
            window_id: h.window_id,
            message: ui_constants::SAVE_FAILED_MESSAGE.to_string(),
            severity: MessageSeverity::Error,
        }]
    );
}

#[test]
fn test_close_saves_config_and_destroy_quits() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "scan.pdf", 1);

    h.logic.handle_event(AppEvent::WindowCloseRequestedByUser {
        window_id: h.window_id,
    });
    assert_eq!(
        drain(&mut h.logic),
        vec![PlatformCommand::CloseWindow {
            window_id: h.window_id
        }]
    );
    let saved = h.config_manager.get_saved_configs();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, ui_constants::APP_NAME);
    assert_eq!(saved[0].1.last_document_dir, Some(PathBuf::from("/docs")));

    h.logic.handle_event(AppEvent::WindowDestroyed {
        window_id: h.window_id,
    });
    assert_eq!(drain(&mut h.logic), vec![PlatformCommand::QuitApplication]);
    assert!(h.logic.document.is_none());
    assert!(h.logic.ui_state().is_none());
}

#[test]
fn test_dropping_logic_disconnects_from_slot() {
    let h = setup_logic_with_mocks();
    let slot = h.slot.clone();
    assert_eq!(slot.command_queued().observer_count(), 1);

    drop(h);

    assert_eq!(slot.command_queued().observer_count(), 0);
}

#[test]
fn test_replacing_idle_document_disconnects_the_old_one() {
    let mut h = setup_logic_with_mocks();
    open_document(&mut h, "first.pdf", 2);
    let first = Arc::clone(h.logic.document.as_ref().unwrap());
    assert_eq!(lock_document(&first).command_executed().observer_count(), 1);

    open_document(&mut h, "second.pdf", 2);
    let second = Arc::clone(h.logic.document.as_ref().unwrap());

    assert_eq!(lock_document(&first).command_executed().observer_count(), 0);
    assert_eq!(lock_document(&second).command_executed().observer_count(), 1);
    drop(h);
    assert_eq!(lock_document(&second).command_executed().observer_count(), 0);
}
