/*
 * `CommandSlot` is the single entry point for document-mutating work. It admits at
 * most one command at a time: while a command is in flight further requests are
 * rejected (and logged), so two commands can never run against the same document
 * concurrently. An accepted command raises "command queued" synchronously on the
 * caller's thread, then runs on the `BackgroundThread`.
 *
 * Every accepted command is paired with exactly one "command executed" notification
 * from the document, whatever happens during execution:
 * - the document already notified (a successful execute/undo/redo): nothing more;
 * - success without a document change, or undo/redo on empty history: `Unchanged`;
 * - an error or a panic: `Failed`, with the document left as it was.
 * The slot is released only after that notification went out, so an observer never
 * receives the completion of one command after the "queued" of the next. The release
 * happens on drop of a guard, so a panicking observer cannot leave the slot busy.
 */
use super::background_thread::{BackgroundThread, panic_message};
use super::document::{Document, DocumentError, SharedDocument, lock_document};
use super::notifications::{CommandError, CommandOutcome};
use super::signal::Signal;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    Accepted,
    // Another command is still in flight; the request was dropped.
    RejectedBusy,
}

struct SlotInner {
    busy: AtomicBool,
    command_queued: Signal<()>,
    background: Arc<BackgroundThread>,
}

// Clears the busy flag when dropped, including during unwinding.
struct BusyRelease<'a>(&'a AtomicBool);

impl Drop for BusyRelease<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
        log::trace!("CommandSlot: Slot released.");
    }
}

// Cloning yields another handle to the same slot.
#[derive(Clone)]
pub struct CommandSlot {
    inner: Arc<SlotInner>,
}

impl CommandSlot {
    pub fn new(background: Arc<BackgroundThread>) -> Self {
        CommandSlot {
            inner: Arc::new(SlotInner {
                busy: AtomicBool::new(false),
                command_queued: Signal::new(),
                background,
            }),
        }
    }

    pub fn command_queued(&self) -> &Signal<()> {
        &self.inner.command_queued
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    pub fn queue_command<F>(&self, document: &SharedDocument, command: F) -> QueueOutcome
    where
        F: FnOnce(&mut Document) -> Result<(), DocumentError> + Send + 'static,
    {
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("CommandSlot: Command rejected, another command is still in flight.");
            return QueueOutcome::RejectedBusy;
        }

        log::debug!(
            "CommandSlot: Command accepted for '{}'.",
            self.inner.background.name()
        );
        self.inner.command_queued.emit(&());

        let inner = Arc::clone(&self.inner);
        let target = Arc::clone(document);
        let job = Box::new(move || inner.run_command(&target, command));
        if let Err(e) = self.inner.background.push_job(job) {
            log::error!("CommandSlot: Could not hand command to background thread: {e}");
            let _release = BusyRelease(&self.inner.busy);
            lock_document(document).notify_command_executed(CommandOutcome::Failed(
                CommandError::BackgroundUnavailable,
            ));
        }
        QueueOutcome::Accepted
    }
}

impl SlotInner {
    fn run_command<F>(&self, document: &SharedDocument, command: F)
    where
        F: FnOnce(&mut Document) -> Result<(), DocumentError>,
    {
        // Declared first so it is dropped after the document guard.
        let _release = BusyRelease(&self.busy);
        let mut guard = lock_document(document);
        let notified_before = guard.executed_notification_count();
        let result = panic::catch_unwind(AssertUnwindSafe(|| command(&mut *guard)));
        let already_notified = guard.executed_notification_count() != notified_before;

        match result {
            Ok(Ok(())) => {
                if !already_notified {
                    log::debug!("CommandSlot: Command finished without changing the document.");
                    guard.notify_command_executed(CommandOutcome::Unchanged);
                }
            }
            Ok(Err(DocumentError::EmptyHistory)) => {
                log::debug!("CommandSlot: Nothing to undo or redo.");
                if !already_notified {
                    guard.notify_command_executed(CommandOutcome::Unchanged);
                }
            }
            Ok(Err(e)) => {
                log::error!("CommandSlot: Command failed: {e}");
                if !already_notified {
                    guard.notify_command_executed(CommandOutcome::Failed(e.into()));
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("CommandSlot: Command panicked: {message}");
                if !already_notified {
                    guard.notify_command_executed(CommandOutcome::Failed(
                        CommandError::Panicked(message),
                    ));
                }
            }
        }
    }
}

impl fmt::Debug for CommandSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSlot")
            .field("busy", &self.is_busy())
            .field("background", &self.inner.background)
            .finish()
    }
}
