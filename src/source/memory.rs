use crate::{
    domain::{BoardItem, Page},
    error::{BoardError, Result},
    source::{BoardMutations, PageSource},
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
    time::Duration,
};

/// In-memory board backend. Each column is a plain `Vec` in persisted order;
/// pages are 1-based slices of it.
pub struct MemorySource<T> {
    columns: Mutex<HashMap<String, Vec<T>>>,
    latency: Option<Duration>,
    fetch_calls: AtomicUsize,
    fail_next_fetch: AtomicBool,
    fail_next_mutation: AtomicBool,
}

impl<T: BoardItem + Send> MemorySource<T> {
    /// Creates a source with the given (initially empty) columns
    pub fn new<I, S>(column_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: Mutex::new(
                column_ids
                    .into_iter()
                    .map(|id| (id.into(), Vec::new()))
                    .collect(),
            ),
            latency: None,
            fetch_calls: AtomicUsize::new(0),
            fail_next_fetch: AtomicBool::new(false),
            fail_next_mutation: AtomicBool::new(false),
        }
    }

    /// Delays every fetch by `latency`, simulating a round trip
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<T>>>> {
        self.columns
            .lock()
            .map_err(|e| BoardError::SourceError(format!("column lock poisoned: {e}")))
    }

    /// Appends an item to the end of a column
    pub fn insert(&self, column_id: &str, item: T) -> Result<()> {
        let mut columns = self.lock()?;
        if columns.values().flatten().any(|existing| existing.id() == item.id()) {
            return Err(BoardError::Other(format!("duplicate item id '{}'", item.id())));
        }
        let column = columns
            .get_mut(column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;
        column.push(item);
        Ok(())
    }

    /// Removes an item wherever it lives
    pub fn remove(&self, item_id: &str) -> Result<T> {
        let mut columns = self.lock()?;
        for column in columns.values_mut() {
            if let Some(pos) = column.iter().position(|item| item.id() == item_id) {
                return Ok(column.remove(pos));
            }
        }
        Err(BoardError::ItemNotFound(item_id.to_string()))
    }

    /// Full persisted order of a column
    pub fn column_ids(&self, column_id: &str) -> Result<Vec<String>> {
        let columns = self.lock()?;
        let column = columns
            .get(column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;
        Ok(column.iter().map(|item| item.id().to_string()).collect())
    }

    /// Number of `fetch_page` calls served so far
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Makes the next fetch fail once
    pub fn fail_next_fetch(&self) {
        self.fail_next_fetch.store(true, Ordering::SeqCst);
    }

    /// Makes the next mutation fail once
    pub fn fail_next_mutation(&self) {
        self.fail_next_mutation.store(true, Ordering::SeqCst);
    }

    fn take_mutation_failure(&self) -> Result<()> {
        if self.fail_next_mutation.swap(false, Ordering::SeqCst) {
            return Err(BoardError::SourceError("mutation rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: BoardItem + Send + Sync> PageSource<T> for MemorySource<T> {
    async fn fetch_page(&self, column_id: &str, page: u32, page_size: usize) -> Result<Page<T>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.fail_next_fetch.swap(false, Ordering::SeqCst) {
            return Err(BoardError::SourceError(format!(
                "fetch of '{column_id}' page {page} failed"
            )));
        }

        let columns = self.lock()?;
        let column = columns
            .get(column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;

        let start = (page.saturating_sub(1) as usize).saturating_mul(page_size);
        let items: Vec<T> = column.iter().skip(start).take(page_size).cloned().collect();
        let has_next = start + items.len() < column.len();

        Ok(Page::new(items, has_next, column.len()))
    }
}

#[async_trait]
impl<T: BoardItem + Send + Sync> BoardMutations for MemorySource<T> {
    async fn move_across_columns(
        &self,
        item_id: &str,
        from_column: &str,
        to_column: &str,
        target_index: usize,
    ) -> Result<()> {
        self.take_mutation_failure()?;

        if from_column == to_column {
            return Err(BoardError::Other(format!(
                "move of '{item_id}' stays in '{to_column}'; reorder the column instead"
            )));
        }

        let mut columns = self.lock()?;
        let target_len = columns
            .get(to_column)
            .ok_or_else(|| BoardError::ColumnNotFound(to_column.to_string()))?
            .len();
        if target_index > target_len {
            return Err(BoardError::IndexOutOfRange {
                index: target_index,
                len: target_len,
            });
        }

        let source = columns
            .get_mut(from_column)
            .ok_or_else(|| BoardError::ColumnNotFound(from_column.to_string()))?;
        let pos = source
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or_else(|| BoardError::ItemNotFound(item_id.to_string()))?;
        let item = source.remove(pos);

        let target = columns
            .get_mut(to_column)
            .ok_or_else(|| BoardError::ColumnNotFound(to_column.to_string()))?;
        target.insert(target_index, item);

        tracing::debug!(item_id, from_column, to_column, target_index, "moved item");
        Ok(())
    }

    /// Listed ids take the front of the column in the given order; items the
    /// caller never loaded keep their relative order behind them.
    async fn reorder_within_column(&self, column_id: &str, ordered_ids: &[String]) -> Result<()> {
        self.take_mutation_failure()?;

        let mut columns = self.lock()?;
        let column = columns
            .get_mut(column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;

        let mut seen = HashSet::new();
        for id in ordered_ids {
            if !seen.insert(id.as_str()) {
                return Err(BoardError::Other(format!("duplicate id '{id}' in ordering")));
            }
            if !column.iter().any(|item| item.id() == id) {
                return Err(BoardError::ItemNotFound(id.clone()));
            }
        }

        let mut remaining = std::mem::take(column);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in ordered_ids {
            if let Some(pos) = remaining.iter().position(|item| item.id() == id) {
                reordered.push(remaining.remove(pos));
            }
        }
        reordered.append(&mut remaining);
        *column = reordered;

        tracing::debug!(column_id, count = ordered_ids.len(), "reordered column");
        Ok(())
    }
}
