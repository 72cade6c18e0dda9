/*
 * Opening and saving documents. The page content itself (rendering, PDF parsing) is
 * handled outside this crate; what the slicer persists is the page layout: which
 * source pages are kept, in which order, and how each is rotated. The layout is
 * stored as JSON:
 *
 *   { "format_version": 1, "pages": [ { "source_index": 0, "rotation": "Deg90" } ] }
 *
 * A layout that lists no pages but names a `source_page_count` opens with all pages
 * of the source in order.
 *
 * `DocumentStoreOperations` is the seam the presenter uses; tests substitute a mock.
 * Saving takes a page layout rather than a `Document`, so a save never has to wait
 * for the document's lock.
 */
use super::document::Document;
use super::models::Page;
use super::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

const LAYOUT_FORMAT_VERSION: u32 = 1;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serde(serde_json::Error),
    UnsupportedVersion(u32),
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "Document I/O error: {e}"),
            StoreError::Serde(e) => write!(f, "Document layout format error: {e}"),
            StoreError::UnsupportedVersion(v) => {
                write!(f, "Unsupported document layout version {v}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            StoreError::Serde(e) => Some(e),
            StoreError::UnsupportedVersion(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

// `source_page_count` lets a new layout start from every page of its source.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentLayout {
    format_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_page_count: Option<usize>,
    #[serde(default)]
    pages: Vec<Page>,
}

pub trait DocumentStoreOperations: Send + Sync {
    fn open_document(&self, path: &Path) -> Result<Document>;
    fn save_document(&self, pages: &[Page], path: &Path) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct CoreDocumentStore {}

impl CoreDocumentStore {
    pub fn new() -> Self {
        CoreDocumentStore {}
    }
}

impl DocumentStoreOperations for CoreDocumentStore {
    fn open_document(&self, path: &Path) -> Result<Document> {
        log::debug!("CoreDocumentStore: Opening {path:?}");
        let reader = BufReader::new(File::open(path)?);
        let layout: DocumentLayout = serde_json::from_reader(reader)?;
        if layout.format_version != LAYOUT_FORMAT_VERSION {
            log::warn!(
                "CoreDocumentStore: {path:?} has layout version {}",
                layout.format_version
            );
            return Err(StoreError::UnsupportedVersion(layout.format_version));
        }
        let pages = match (layout.pages.is_empty(), layout.source_page_count) {
            (true, Some(count)) => Page::sequence(count),
            _ => layout.pages,
        };
        Ok(Document::new(path_utils::display_name(path), pages))
    }

    fn save_document(&self, pages: &[Page], path: &Path) -> Result<()> {
        let layout = DocumentLayout {
            format_version: LAYOUT_FORMAT_VERSION,
            source_page_count: None,
            pages: pages.to_vec(),
        };
        let json = serde_json::to_string_pretty(&layout)?;
        fs::write(path, json)?;
        log::debug!(
            "CoreDocumentStore: Saved {} pages to {path:?}",
            pages.len()
        );
        Ok(())
    }
}
