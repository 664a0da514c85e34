use crate::{domain::Page, error::Result};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemorySource;

/// Paginated list fetch for board columns
#[async_trait]
pub trait PageSource<T: Send>: Send + Sync {
    /// Fetches one page of a column. The order of the returned items is the
    /// display order for that page.
    async fn fetch_page(&self, column_id: &str, page: u32, page_size: usize) -> Result<Page<T>>;
}

/// Persistence calls issued when a drag is committed
#[async_trait]
pub trait BoardMutations: Send + Sync {
    /// Persists moving an item into another column at `target_index`.
    /// An index past the end of the target column is an
    /// [`IndexOutOfRange`](crate::error::BoardError::IndexOutOfRange) error.
    async fn move_across_columns(
        &self,
        item_id: &str,
        from_column: &str,
        to_column: &str,
        target_index: usize,
    ) -> Result<()>;

    /// Persists a new ordering of one column. `ordered_ids` lists the loaded
    /// items; items never loaded keep their relative order after them.
    async fn reorder_within_column(&self, column_id: &str, ordered_ids: &[String]) -> Result<()>;
}
