/*
 * Window bookkeeping for the console platform. `NativeWindowData` is what the
 * console keeps per window in place of native handles: title, visibility, the
 * enabled state of every action, cursor, the shown pages with their selection, and
 * the "Saved!" notification. The `render_*` functions produce the text the console
 * prints when that state changes.
 */
use super::types::{ActionId, CursorKind, PageDescriptor, WindowId};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub(crate) struct NativeWindowData {
    pub(crate) id: WindowId,
    pub(crate) title: String,
    pub(crate) visible: bool,
    pub(crate) action_enabled: HashMap<ActionId, bool>,
    pub(crate) cursor: CursorKind,
    pub(crate) pages: Vec<PageDescriptor>,
    pub(crate) selected_pages: Vec<usize>,
    pub(crate) saved_notification: Option<String>,
}

impl NativeWindowData {
    // Every action starts disabled until the application logic says otherwise.
    pub(crate) fn new(id: WindowId, title: &str) -> Self {
        NativeWindowData {
            id,
            title: title.to_string(),
            visible: false,
            action_enabled: ActionId::ALL.iter().map(|a| (*a, false)).collect(),
            cursor: CursorKind::Default,
            pages: Vec::new(),
            selected_pages: Vec::new(),
            saved_notification: None,
        }
    }

    pub(crate) fn is_action_enabled(&self, action: ActionId) -> bool {
        self.action_enabled.get(&action).copied().unwrap_or(false)
    }
}

pub(crate) fn render_pages(window: &NativeWindowData) -> String {
    if window.pages.is_empty() {
        return "  (no pages)".to_string();
    }
    window
        .pages
        .iter()
        .map(|page| {
            let marker = if window.selected_pages.contains(&page.position) {
                '*'
            } else {
                ' '
            };
            let mut line = format!(
                " {marker}{:>4}: source page {}",
                page.position + 1,
                page.source_index + 1
            );
            if page.rotation_degrees != 0 {
                line.push_str(&format!(", rotated {}°", page.rotation_degrees));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// One-line summary of the window: title, busy cursor, enabled actions.
pub(crate) fn render_status(window: &NativeWindowData) -> String {
    let enabled: Vec<&str> = ActionId::ALL
        .iter()
        .filter(|a| window.is_action_enabled(**a))
        .map(|a| a.name())
        .collect();
    let busy = match window.cursor {
        CursorKind::Progress => " (working...)",
        CursorKind::Default => "",
    };
    format!("[{}]{busy} available: {}", window.title, enabled.join(", "))
}
