//! # CRM Board
//!
//! Kanban board core for the CRM pipeline views: a lazily paginated column
//! store and a drag-and-drop engine that previews moves optimistically and
//! commits them through caller-supplied persistence calls.
//!
//! The crate has no UI dependency. Hosts feed it gesture events and scroll
//! positions, render the [`BoardView`] it produces, and provide the backend
//! through the [`PageSource`] and [`BoardMutations`] traits.

pub mod board;
pub mod domain;
pub mod drag;
pub mod error;
pub mod render;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use board::KanbanBoard;
pub use domain::{
    board::{BoardConfig, Column, ColumnMarker},
    column_state::{ColumnSet, ColumnState, Page, PageRequest, ScrollMetrics},
    item::{BoardItem, Deal, DealStage},
};
pub use drag::{Commit, DragEngine, DragOutcome, DragPhase, OverEvent, Point, Rect, Size};
pub use error::{BoardError, Result};
pub use render::{BoardView, CardRenderer};
pub use source::{BoardMutations, MemorySource, PageSource};
pub use store::ColumnStore;
