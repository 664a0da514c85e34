pub mod board;
pub mod column_state;
pub mod item;

pub use board::{BoardConfig, Column, ColumnMarker};
pub use column_state::{ColumnSet, ColumnState, Page, PageRequest, ScrollMetrics};
pub use item::{BoardItem, Deal, DealStage};
