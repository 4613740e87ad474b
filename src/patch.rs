//! Deferred tree mutations.

use crate::rect::Rect;
use crate::view::{View, ViewId};
use thiserror::Error;

/// A structural change queued while the tree is being traversed.
#[derive(Debug)]
pub enum Patch {
    /// Inserts a new view under `parent`, at `index` or at the end.
    Insert {
        parent: ViewId,
        index: Option<usize>,
        id: ViewId,
        view: Box<dyn View>,
        z_order: i32,
    },
    /// Removes a view and its subviews.
    Remove(ViewId),
    /// Sets a view's bounds.
    SetBounds(ViewId, Rect),
    /// Sets a view's z-order.
    SetZOrder(ViewId, i32),
    /// Moves a view to the end of its superview's subviews.
    BringToFront(ViewId),
}

impl Patch {
    /// The view the patch operates on.
    pub fn target(&self) -> ViewId {
        match self {
            Patch::Insert { parent, .. } => *parent,
            Patch::Remove(id)
            | Patch::SetBounds(id, _)
            | Patch::SetZOrder(id, _)
            | Patch::BringToFront(id) => *id,
        }
    }
}

/// Errors from structural tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("no such view: {0:?}")]
    NoSuchView(ViewId),

    #[error("moving {0:?} would make it its own ancestor")]
    Cycle(ViewId),

    #[error("subview index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("the root view cannot be removed or moved")]
    RootView,

    #[error("a view with id {0:?} already exists")]
    DuplicateId(ViewId),
}
