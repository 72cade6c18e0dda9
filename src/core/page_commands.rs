/*
 * The reversible page edits offered by the slicer: removing the selected pages,
 * removing every page before or after a given page, and rotating pages a quarter
 * turn. Each command resolves its target pages against the page list it is executed
 * on and records what it needs to restore that list exactly on undo.
 */
use super::document::{DocumentCommand, DocumentError, Result};
use super::models::{Page, RotationDirection};

#[derive(Debug, Clone, PartialEq, Eq)]
enum RemovalRange {
    Selected(Vec<usize>),
    Before(usize),
    After(usize),
}

#[derive(Debug)]
pub struct RemovePagesCommand {
    range: RemovalRange,
    // (index, page) pairs in ascending index order, filled on execute.
    removed: Vec<(usize, Page)>,
}

impl RemovePagesCommand {
    pub fn selected(indices: Vec<usize>) -> Self {
        Self::with_range(RemovalRange::Selected(indices))
    }

    pub fn before(index: usize) -> Self {
        Self::with_range(RemovalRange::Before(index))
    }

    pub fn after(index: usize) -> Self {
        Self::with_range(RemovalRange::After(index))
    }

    fn with_range(range: RemovalRange) -> Self {
        RemovePagesCommand {
            range,
            removed: Vec::new(),
        }
    }

    fn resolve_indices(&self, page_count: usize) -> Result<Vec<usize>> {
        let indices = match &self.range {
            RemovalRange::Selected(selected) => {
                let mut indices = selected.clone();
                indices.sort_unstable();
                indices.dedup();
                indices
            }
            RemovalRange::Before(index) => {
                check_index(*index, page_count)?;
                (0..*index).collect()
            }
            RemovalRange::After(index) => {
                check_index(*index, page_count)?;
                (index + 1..page_count).collect()
            }
        };
        if indices.is_empty() {
            return Err(DocumentError::NoPagesSelected);
        }
        if let Some(&last) = indices.last() {
            check_index(last, page_count)?;
        }
        Ok(indices)
    }
}

impl DocumentCommand for RemovePagesCommand {
    fn execute(&mut self, pages: &mut Vec<Page>) -> Result<()> {
        let indices = self.resolve_indices(pages.len())?;
        let mut removed = Vec::with_capacity(indices.len());
        for &index in indices.iter().rev() {
            removed.push((index, pages.remove(index)));
        }
        removed.reverse();
        self.removed = removed;
        Ok(())
    }

    fn undo(&mut self, pages: &mut Vec<Page>) -> Result<()> {
        for &(index, page) in &self.removed {
            if index > pages.len() {
                return Err(DocumentError::PageOutOfRange {
                    index,
                    page_count: pages.len(),
                });
            }
            pages.insert(index, page);
        }
        Ok(())
    }

    fn description(&self) -> String {
        match &self.range {
            RemovalRange::Selected(indices) => format!("remove {} selected pages", indices.len()),
            RemovalRange::Before(index) => format!("remove pages before page {}", index + 1),
            RemovalRange::After(index) => format!("remove pages after page {}", index + 1),
        }
    }
}

#[derive(Debug)]
pub struct RotatePagesCommand {
    indices: Vec<usize>,
    direction: RotationDirection,
}

impl RotatePagesCommand {
    pub fn new(mut indices: Vec<usize>, direction: RotationDirection) -> Self {
        indices.sort_unstable();
        indices.dedup();
        RotatePagesCommand { indices, direction }
    }

    fn rotate(&self, pages: &mut [Page], direction: RotationDirection) -> Result<()> {
        if self.indices.is_empty() {
            return Err(DocumentError::NoPagesSelected);
        }
        if let Some(&last) = self.indices.last() {
            check_index(last, pages.len())?;
        }
        for &index in &self.indices {
            pages[index].rotation = pages[index].rotation.rotated(direction);
        }
        Ok(())
    }
}

impl DocumentCommand for RotatePagesCommand {
    fn execute(&mut self, pages: &mut Vec<Page>) -> Result<()> {
        self.rotate(pages, self.direction)
    }

    fn undo(&mut self, pages: &mut Vec<Page>) -> Result<()> {
        self.rotate(pages, self.direction.opposite())
    }

    fn description(&self) -> String {
        let direction = match self.direction {
            RotationDirection::Left => "left",
            RotationDirection::Right => "right",
        };
        format!("rotate {} pages {direction}", self.indices.len())
    }
}

fn check_index(index: usize, page_count: usize) -> Result<()> {
    if index < page_count {
        Ok(())
    } else {
        Err(DocumentError::PageOutOfRange { index, page_count })
    }
}
