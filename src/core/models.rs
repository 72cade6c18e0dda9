use serde::{Deserialize, Serialize};

// Orientation of a page relative to its source page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationDirection {
    Left,
    Right,
}

impl RotationDirection {
    pub fn opposite(self) -> Self {
        match self {
            RotationDirection::Left => RotationDirection::Right,
            RotationDirection::Right => RotationDirection::Left,
        }
    }
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    // Quarter turn; Right is clockwise.
    pub fn rotated(self, direction: RotationDirection) -> Self {
        match (self, direction) {
            (Rotation::Deg0, RotationDirection::Right) => Rotation::Deg90,
            (Rotation::Deg90, RotationDirection::Right) => Rotation::Deg180,
            (Rotation::Deg180, RotationDirection::Right) => Rotation::Deg270,
            (Rotation::Deg270, RotationDirection::Right) => Rotation::Deg0,
            (Rotation::Deg0, RotationDirection::Left) => Rotation::Deg270,
            (Rotation::Deg90, RotationDirection::Left) => Rotation::Deg0,
            (Rotation::Deg180, RotationDirection::Left) => Rotation::Deg90,
            (Rotation::Deg270, RotationDirection::Left) => Rotation::Deg180,
        }
    }
}

/*
 * One page of the working document. `source_index` is the zero-based index of the
 * page in the file the document was opened from; it never changes when pages are
 * removed or rotated, so a saved layout can always be mapped back to the source.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub source_index: usize,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Page {
    pub fn new(source_index: usize) -> Self {
        Page {
            source_index,
            rotation: Rotation::Deg0,
        }
    }

    // A fresh page list for a source with `page_count` pages, in source order.
    pub fn sequence(page_count: usize) -> Vec<Page> {
        (0..page_count).map(Page::new).collect()
    }
}
