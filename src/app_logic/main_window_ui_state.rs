/*
 * This module defines the MainWindowUiState struct, which holds the presentation
 * state of the main window: whether a command is in flight (derived only from the
 * "queued"/"executed" notifications), the history availability reported by the last
 * notification of the current document, the pages on display (what a save writes),
 * the page selection, and the bookkeeping of the "Saved!" notification timer. It also derives which actions should be enabled.
 */
use super::ui_constants::WINDOW_TITLE_BASE;
use crate::core::{DocumentId, Page};
use crate::platform_layer::{ActionId, TimerId, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyState {
    Idle,
    // A command is in flight; undo and redo are forced off.
    Busy,
}

#[derive(Debug)]
pub struct MainWindowUiState {
    pub window_id: WindowId,
    pub busy_state: BusyState,
    /* The document currently shown; notifications from other documents are stale. */
    pub document_id: Option<DocumentId>,
    pub document_file_name: Option<String>,
    /* The page layout of the current document as last shown. */
    pub pages: Vec<Page>,
    /* History availability of the current document, as of its last notification. */
    pub can_undo: bool,
    pub can_redo: bool,
    /* Selected page positions, ascending and within the shown pages. */
    pub selected_pages: Vec<usize>,
    pub saved_notification_timer: Option<TimerId>,
    next_timer_id: u64,
}

impl MainWindowUiState {
    pub fn new(window_id: WindowId) -> Self {
        log::debug!("MainWindowUiState::new called for window_id: {window_id:?}");
        MainWindowUiState {
            window_id,
            busy_state: BusyState::Idle,
            document_id: None,
            document_file_name: None,
            pages: Vec::new(),
            can_undo: false,
            can_redo: false,
            selected_pages: Vec::new(),
            saved_notification_timer: None,
            next_timer_id: 1,
        }
    }

    pub fn compose_window_title(file_name: Option<&str>) -> String {
        match file_name {
            Some(name) => format!("{WINDOW_TITLE_BASE} - [{name}]"),
            None => WINDOW_TITLE_BASE.to_string(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_busy(&self) -> bool {
        self.busy_state == BusyState::Busy
    }

    pub fn undo_enabled(&self) -> bool {
        !self.is_busy() && self.can_undo
    }

    pub fn redo_enabled(&self) -> bool {
        !self.is_busy() && self.can_redo
    }

    // Stores a new selection, dropping positions that no longer exist.
    pub fn set_selection(&mut self, mut selected_pages: Vec<usize>) {
        selected_pages.retain(|&p| p < self.page_count());
        selected_pages.sort_unstable();
        selected_pages.dedup();
        self.selected_pages = selected_pages;
    }

    pub fn single_selected_page(&self) -> Option<usize> {
        match self.selected_pages.as_slice() {
            [page] => Some(*page),
            _ => None,
        }
    }

    /*
     * Enablement of the page-editing actions. Removing or rotating needs a selection;
     * removing previous/next pages needs exactly one selected page with pages on that
     * side of it.
     */
    pub fn page_action_states(&self) -> [(ActionId, bool); 5] {
        let has_document = self.document_id.is_some();
        let has_selection = has_document && !self.selected_pages.is_empty();
        let single = self.single_selected_page().filter(|_| has_document);
        [
            (ActionId::RemoveSelectedPages, has_selection),
            (ActionId::RotatePagesLeft, has_selection),
            (ActionId::RotatePagesRight, has_selection),
            (ActionId::RemovePreviousPages, single.is_some_and(|p| p > 0)),
            (
                ActionId::RemoveNextPages,
                single.is_some_and(|p| p + 1 < self.page_count()),
            ),
        ]
    }

    // Allocates a fresh timer id; ids of earlier timers become stale.
    pub fn allocate_timer_id(&mut self) -> TimerId {
        let id = TimerId(self.next_timer_id);
        self.next_timer_id += 1;
        id
    }
}
