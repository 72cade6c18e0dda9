/*
 * This module consolidates the core, platform-agnostic logic of the application:
 * the document model and its undo/redo history, the page edits, the command slot and
 * background thread that execute edits off the interaction thread, the lifecycle
 * notifications connecting them, and the configuration and document persistence
 * abstractions (`ConfigManagerOperations`, `DocumentStoreOperations`).
 */
pub mod background_thread;
pub mod command_slot;
pub mod config;
pub mod document;
pub mod document_store;
pub mod models;
pub mod notifications;
pub mod page_commands;
pub mod path_utils;
pub mod signal;

pub use background_thread::BackgroundThread;
pub use command_slot::{CommandSlot, QueueOutcome};

pub use config::{AppConfig, ConfigManagerOperations, CoreConfigManager};

pub use document::{Document, DocumentError, DocumentId, SharedDocument, lock_document};
pub use document_store::{CoreDocumentStore, DocumentStoreOperations};

pub use models::{Page, RotationDirection};
pub use notifications::{CommandExecuted, CommandOutcome};
pub use page_commands::{RemovePagesCommand, RotatePagesCommand};
pub use signal::ConnectionId;
