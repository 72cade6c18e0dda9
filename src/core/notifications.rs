/*
 * Payload types of the two lifecycle notifications of the editing core: "command
 * queued" (raised by `CommandSlot`, no payload) and "command executed" (raised by the
 * `Document`, carrying a `CommandExecuted`). A `CommandExecuted` includes a snapshot of
 * the history and pages taken at emission time, so observers on other threads can
 * react without locking the document again.
 */
use super::document::{DocumentError, DocumentId};
use super::models::Page;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Execute,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    // The command returned an error; the document was left untouched.
    Document(DocumentError),
    // The command panicked; the panic was contained at the execution boundary.
    Panicked(String),
    // The command could not be handed to the background thread.
    BackgroundUnavailable,
}

impl From<DocumentError> for CommandError {
    fn from(err: DocumentError) -> Self {
        CommandError::Document(err)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Document(e) => write!(f, "Command failed: {e}"),
            CommandError::Panicked(msg) => write!(f, "Command panicked: {msg}"),
            CommandError::BackgroundUnavailable => {
                write!(f, "Command could not be scheduled: background thread unavailable")
            }
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Document(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied(HistoryAction),
    // The command finished without changing the document (e.g. undo on empty history).
    Unchanged,
    Failed(CommandError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub can_undo: bool,
    pub can_redo: bool,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExecuted {
    pub document_id: DocumentId,
    pub outcome: CommandOutcome,
    pub snapshot: DocumentSnapshot,
}
