/*
 * The document model: the working list of pages plus a linear undo/redo history of
 * the reversible edits applied to it. Every successful execute, undo or redo raises
 * the "command executed" notification exactly once, synchronously, after the state
 * change is committed. Failed operations change nothing and notify nothing; turning
 * a failure into a completion notification is the job of `CommandSlot`.
 *
 * Edits are applied to a scratch copy of the page list and only committed when they
 * succeed, so a failing (or panicking) command can never leave a half-applied state
 * or a history entry for work that did not happen.
 */
use super::models::Page;
use super::notifications::{CommandExecuted, CommandOutcome, DocumentSnapshot, HistoryAction};
use super::signal::Signal;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    // Undo or redo was requested with nothing to undo or redo.
    EmptyHistory,
    // A page command resolved to an empty set of pages.
    NoPagesSelected,
    PageOutOfRange { index: usize, page_count: usize },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::EmptyHistory => write!(f, "Nothing to undo or redo"),
            DocumentError::NoPagesSelected => write!(f, "No pages selected"),
            DocumentError::PageOutOfRange { index, page_count } => write!(
                f,
                "Page index {index} is out of range for a document with {page_count} pages"
            ),
        }
    }
}

impl std::error::Error for DocumentError {}

pub type Result<T> = std::result::Result<T, DocumentError>;

/*
 * A reversible edit of the page list. `execute` is called once when the command is
 * first applied; afterwards the history alternates `undo` and `redo`. Implementations
 * may record whatever they need in `execute` to make `undo` exact.
 */
pub trait DocumentCommand: Send + fmt::Debug {
    fn execute(&mut self, pages: &mut Vec<Page>) -> Result<()>;
    fn undo(&mut self, pages: &mut Vec<Page>) -> Result<()>;
    fn redo(&mut self, pages: &mut Vec<Page>) -> Result<()> {
        self.execute(pages)
    }
    fn description(&self) -> String;
}

pub struct Document {
    id: DocumentId,
    file_name: String,
    pages: Vec<Page>,
    undo_stack: Vec<Box<dyn DocumentCommand>>,
    redo_stack: Vec<Box<dyn DocumentCommand>>,
    history_limit: Option<usize>,
    command_executed: Signal<CommandExecuted>,
    executed_notifications: u64,
}

pub type SharedDocument = Arc<Mutex<Document>>;

// Locks a shared document, recovering the guard if a previous holder panicked.
pub fn lock_document(document: &SharedDocument) -> MutexGuard<'_, Document> {
    document.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Document {
    pub fn new(file_name: impl Into<String>, pages: Vec<Page>) -> Self {
        let id = DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed));
        let file_name = file_name.into();
        log::debug!(
            "Document: Created {id:?} '{file_name}' with {} pages.",
            pages.len()
        );
        Document {
            id,
            file_name,
            pages,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            history_limit: None,
            command_executed: Signal::new(),
            executed_notifications: 0,
        }
    }

    /*
     * Caps the number of undo steps kept. When the cap is exceeded the oldest entries
     * are discarded. `None` keeps the whole history.
     */
    pub fn with_history_limit(mut self, history_limit: Option<usize>) -> Self {
        self.history_limit = history_limit;
        self.enforce_history_limit();
        self
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn command_executed(&self) -> &Signal<CommandExecuted> {
        &self.command_executed
    }

    // Number of "command executed" notifications raised so far.
    pub fn executed_notification_count(&self) -> u64 {
        self.executed_notifications
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            pages: self.pages.clone(),
        }
    }

    pub fn execute_command(&mut self, mut command: Box<dyn DocumentCommand>) -> Result<()> {
        let description = command.description();
        let mut scratch = self.pages.clone();
        command.execute(&mut scratch)?;

        self.pages = scratch;
        self.undo_stack.push(command);
        self.enforce_history_limit();
        if !self.redo_stack.is_empty() {
            log::debug!(
                "Document: Discarding {} redo entries after new command.",
                self.redo_stack.len()
            );
            self.redo_stack.clear();
        }
        log::debug!(
            "Document: Executed '{description}', undo depth {}.",
            self.undo_stack.len()
        );
        self.notify_command_executed(CommandOutcome::Applied(HistoryAction::Execute));
        Ok(())
    }

    pub fn undo_command(&mut self) -> Result<()> {
        let Some(mut command) = self.undo_stack.pop() else {
            log::debug!("Document: Undo requested with empty history.");
            return Err(DocumentError::EmptyHistory);
        };
        let mut scratch = self.pages.clone();
        if let Err(e) = command.undo(&mut scratch) {
            log::error!(
                "Document: Undo of '{}' failed: {e}",
                command.description()
            );
            self.undo_stack.push(command);
            return Err(e);
        }
        log::debug!("Document: Undid '{}'.", command.description());
        self.pages = scratch;
        self.redo_stack.push(command);
        self.notify_command_executed(CommandOutcome::Applied(HistoryAction::Undo));
        Ok(())
    }

    pub fn redo_command(&mut self) -> Result<()> {
        let Some(mut command) = self.redo_stack.pop() else {
            log::debug!("Document: Redo requested with empty history.");
            return Err(DocumentError::EmptyHistory);
        };
        let mut scratch = self.pages.clone();
        if let Err(e) = command.redo(&mut scratch) {
            log::error!(
                "Document: Redo of '{}' failed: {e}",
                command.description()
            );
            self.redo_stack.push(command);
            return Err(e);
        }
        log::debug!("Document: Redid '{}'.", command.description());
        self.pages = scratch;
        self.undo_stack.push(command);
        self.enforce_history_limit();
        self.notify_command_executed(CommandOutcome::Applied(HistoryAction::Redo));
        Ok(())
    }

    /*
     * Raises "command executed" with the current snapshot. Used by the document's own
     * operations and by `CommandSlot` to complete commands that did not change the
     * document.
     */
    pub(crate) fn notify_command_executed(&mut self, outcome: CommandOutcome) {
        self.executed_notifications += 1;
        let notification = CommandExecuted {
            document_id: self.id,
            outcome,
            snapshot: self.snapshot(),
        };
        log::trace!(
            "Document: Emitting command executed for {:?}: {:?}",
            self.id,
            notification.outcome
        );
        self.command_executed.emit(&notification);
    }

    fn enforce_history_limit(&mut self) {
        if let Some(limit) = self.history_limit {
            if self.undo_stack.len() > limit {
                let excess = self.undo_stack.len() - limit;
                self.undo_stack.drain(..excess);
                log::trace!("Document: Dropped {excess} oldest undo entries.");
            }
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("pages", &self.page_count())
            .field("undo_depth", &self.undo_depth())
            .field("redo_depth", &self.redo_depth())
            .finish()
    }
}
