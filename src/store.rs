//! Per-column paginated cache of board items.
//!
//! The store is single-threaded: state lives in a `RefCell` and no borrow is
//! ever held across an `.await`, so several load futures polled on one task
//! see each other's `loading` flag.

use crate::{
    domain::{
        BoardConfig, BoardItem, Column, ColumnSet, ColumnState, Page, PageRequest, ScrollMetrics,
    },
    error::{BoardError, Result},
    source::PageSource,
};
use futures::future::join_all;
use std::cell::RefCell;
use tracing::{debug, warn};

pub struct ColumnStore<T> {
    columns: Vec<Column>,
    states: RefCell<ColumnSet<T>>,
    page_size: usize,
    first_page: u32,
    prefetch_threshold: f64,
}

impl<T: BoardItem + Send> ColumnStore<T> {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            states: RefCell::new(ColumnSet::new(
                config.columns.iter().map(|col| col.id.clone()),
                config.first_page,
            )),
            page_size: config.page_size,
            first_page: config.first_page,
            prefetch_threshold: config.prefetch_threshold,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Copy of one column's state
    pub fn state(&self, column_id: &str) -> Option<ColumnState<T>> {
        self.states.borrow().get(column_id).cloned()
    }

    /// Copy of every column's state
    pub fn snapshot(&self) -> ColumnSet<T> {
        self.states.borrow().clone()
    }

    /// Runs `f` against the real state of a column. The state is mutably
    /// borrowed for the duration of `f`, so `f` must not call back into the
    /// store.
    fn update<R>(&self, column_id: &str, f: impl FnOnce(&mut ColumnState<T>) -> R) -> Result<R> {
        let mut states = self.states.borrow_mut();
        let state = states
            .get_mut(column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;
        Ok(f(state))
    }

    /// Marks a column as loading and returns the request to fetch, or `None`
    /// when there is nothing more to load or a fetch is already in flight.
    pub fn begin_load(&self, column_id: &str) -> Result<Option<PageRequest>> {
        self.update(column_id, |state| state.begin_load())
    }

    /// Applies the outcome of a fetch started with [`begin_load`](Self::begin_load).
    ///
    /// Results of a request superseded by a [`reload`](Self::reload) are
    /// dropped, whether they succeeded or not.
    pub fn finish_load(
        &self,
        column_id: &str,
        request: PageRequest,
        outcome: Result<Page<T>>,
    ) -> Result<()> {
        self.settle(column_id, request, outcome, |state, page| {
            state.append_page(page)
        })
    }

    fn settle(
        &self,
        column_id: &str,
        request: PageRequest,
        outcome: Result<Page<T>>,
        apply: impl FnOnce(&mut ColumnState<T>, Page<T>),
    ) -> Result<()> {
        if !self.update(column_id, |state| state.is_current(request))? {
            debug!(column = column_id, page = request.page, "discarding superseded page");
            return Ok(());
        }

        match outcome {
            Ok(page) => self.update(column_id, |state| {
                apply(state, page);
                debug!(
                    column = column_id,
                    loaded = state.len(),
                    total = state.total,
                    has_next = state.has_next,
                    "page loaded"
                );
            }),
            Err(err) => {
                warn!(column = column_id, page = request.page, error = %err, "page fetch failed");
                self.update(column_id, |state| state.fail_load())?;
                Err(err)
            }
        }
    }

    /// Fetches and appends the next page of a column.
    ///
    /// Returns `Ok(false)` without fetching when the column is exhausted or
    /// already loading.
    pub async fn load_next_page<S>(&self, column_id: &str, source: &S) -> Result<bool>
    where
        S: PageSource<T> + ?Sized,
    {
        let Some(request) = self.begin_load(column_id)? else {
            return Ok(false);
        };

        debug!(column = column_id, page = request.page, "loading page");
        let outcome = source
            .fetch_page(column_id, request.page, self.page_size)
            .await;
        self.finish_load(column_id, request, outcome)?;
        Ok(true)
    }

    /// Loads the first page of every column that has never loaded.
    ///
    /// Columns are fetched concurrently and independently; the first error is
    /// returned once every column has been attempted.
    pub async fn load_initial<S>(&self, source: &S) -> Result<()>
    where
        S: PageSource<T> + ?Sized,
    {
        let pending: Vec<String> = self
            .states
            .borrow()
            .iter()
            .filter(|(_, state)| state.initial_loading)
            .map(|(id, _)| id.to_string())
            .collect();

        let results = join_all(
            pending
                .iter()
                .map(|column_id| self.load_next_page(column_id, source)),
        )
        .await;

        match results.into_iter().find_map(|result| result.err()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Prefetches the next page when the viewport is close to the end
    pub async fn on_scroll<S>(
        &self,
        column_id: &str,
        metrics: ScrollMetrics,
        source: &S,
    ) -> Result<bool>
    where
        S: PageSource<T> + ?Sized,
    {
        if !metrics.should_prefetch(self.prefetch_threshold) {
            return Ok(false);
        }
        self.load_next_page(column_id, source).await
    }

    /// Flags columns as awaiting resynchronisation
    pub fn mark_refreshing(&self, column_ids: &[&str]) -> Result<()> {
        for column_id in column_ids {
            self.update(column_id, |state| state.refreshing = true)?;
        }
        Ok(())
    }

    /// Refetches a column from its first page, replacing what was loaded.
    ///
    /// A page fetch already in flight is superseded: its result is dropped
    /// and the column stays `loading` until this refetch settles.
    pub async fn reload<S>(&self, column_id: &str, source: &S) -> Result<()>
    where
        S: PageSource<T> + ?Sized,
    {
        let first_page = self.first_page;
        let request = self.update(column_id, |state| state.begin_reload(first_page))?;

        debug!(column = column_id, "reloading column");
        let outcome = source
            .fetch_page(column_id, request.page, self.page_size)
            .await;
        self.settle(column_id, request, outcome, |state, page| {
            state.replace_with(first_page, page)
        })
    }
}
