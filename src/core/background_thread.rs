/*
 * Defines `BackgroundThread`, the execution context that runs document commands away
 * from the interaction thread. It owns exactly one worker OS thread which receives
 * boxed jobs over an `mpsc` channel and runs them one after another in submission
 * order. A panicking job is contained at the job boundary so later jobs still run.
 *
 * The thread lives for the whole process in the application; it is created in `main`
 * and handed to its consumers (see `CommandSlot`) instead of being a global.
 */
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug)]
pub enum BackgroundError {
    // The worker has been shut down and no longer accepts jobs.
    ShutDown,
    // The worker OS thread could not be created.
    SpawnFailed(io::Error),
}

impl fmt::Display for BackgroundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundError::ShutDown => write!(f, "Background thread has been shut down"),
            BackgroundError::SpawnFailed(e) => write!(f, "Failed to spawn background thread: {e}"),
        }
    }
}

impl std::error::Error for BackgroundError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackgroundError::SpawnFailed(e) => Some(e),
            BackgroundError::ShutDown => None,
        }
    }
}

pub struct BackgroundThread {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundThread {
    /*
     * Spawns the worker thread under the given name. The worker exits once every
     * sender is gone, which happens in `shutdown` (or on drop).
     */
    pub fn spawn(name: &str) -> Result<Self, BackgroundError> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                log::debug!("BackgroundThread '{thread_name}': Worker started.");
                for job in receiver {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                        log::error!(
                            "BackgroundThread '{thread_name}': Job panicked: {}",
                            panic_message(payload.as_ref())
                        );
                    }
                }
                log::debug!("BackgroundThread '{thread_name}': Worker exiting.");
            })
            .map_err(BackgroundError::SpawnFailed)?;

        Ok(BackgroundThread {
            name: name.to_string(),
            sender: Mutex::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /*
     * Queues a job behind everything submitted before it. Jobs are never run on the
     * caller's thread. If the worker is gone the job is dropped and `ShutDown` is
     * returned.
     */
    pub fn push_job(&self, job: Job) -> Result<(), BackgroundError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(job).map_err(|_| {
                log::error!(
                    "BackgroundThread '{}': Worker disconnected, job dropped.",
                    self.name
                );
                BackgroundError::ShutDown
            }),
            None => {
                log::warn!(
                    "BackgroundThread '{}': Job submitted after shutdown.",
                    self.name
                );
                Err(BackgroundError::ShutDown)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /*
     * Stops accepting jobs, lets the worker finish everything already queued, and
     * joins it. Calling this more than once is harmless.
     */
    pub fn shutdown(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                log::warn!(
                    "BackgroundThread '{}': shutdown called from the worker itself; not joining.",
                    self.name
                );
                return;
            }
            if handle.join().is_err() {
                log::error!("BackgroundThread '{}': Worker panicked on exit.", self.name);
            } else {
                log::debug!("BackgroundThread '{}': Worker joined.", self.name);
            }
        }
    }
}

impl Drop for BackgroundThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for BackgroundThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundThread")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

// Best-effort text of a panic payload (`&str` or `String` payloads).
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
