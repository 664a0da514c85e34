pub mod engine;
pub mod geometry;
pub mod preview;

pub use engine::{Commit, DragEngine, DragOutcome, DragPhase, DragSession, OverEvent};
pub use geometry::{card_drop_index, Point, Rect, Size};
