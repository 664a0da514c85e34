use crate::domain::item::BoardItem;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One page returned by a [`PageSource`](crate::source::PageSource)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, has_next: bool, total: usize) -> Self {
        Self {
            items,
            has_next,
            total,
        }
    }
}

/// A fetch handed out by [`ColumnState::begin_load`] or
/// [`ColumnState::begin_reload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub generation: u64,
}

/// Lazily paginated window over one column's items, in persisted order.
///
/// `items` never holds the same id twice and `total` never drops below
/// `items.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnState<T> {
    pub items: Vec<T>,
    /// Cursor of the next page to fetch
    pub page: u32,
    pub has_next: bool,
    pub loading: bool,
    pub initial_loading: bool,
    pub total: usize,
    /// Set while the column is being resynchronised after a commit
    pub refreshing: bool,
    /// Bumped by every reload; results of older requests are discarded
    pub generation: u64,
}

impl<T: BoardItem> ColumnState<T> {
    pub fn new(first_page: u32) -> Self {
        Self {
            items: Vec::new(),
            page: first_page,
            has_next: true,
            loading: false,
            initial_loading: true,
            total: 0,
            refreshing: false,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.id().to_string()).collect()
    }

    /// Whether a fetch may be started right now
    pub fn can_load(&self) -> bool {
        self.has_next && !self.loading
    }

    /// Claims the in-flight slot for the next page, if one may be fetched
    pub fn begin_load(&mut self) -> Option<PageRequest> {
        if !self.can_load() {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            page: self.page,
            generation: self.generation,
        })
    }

    /// Starts a refetch from `first_page`, superseding any request in flight
    pub fn begin_reload(&mut self, first_page: u32) -> PageRequest {
        self.generation = self.generation.wrapping_add(1);
        self.loading = true;
        self.refreshing = true;
        PageRequest {
            page: first_page,
            generation: self.generation,
        }
    }

    /// Whether `request` still belongs to the current window
    pub fn is_current(&self, request: PageRequest) -> bool {
        request.generation == self.generation
    }

    /// Appends a fetched page, skipping ids that are already present
    pub fn append_page(&mut self, page: Page<T>) {
        let mut seen: HashSet<String> = self.items.iter().map(|i| i.id().to_string()).collect();
        for item in page.items {
            if seen.insert(item.id().to_string()) {
                self.items.push(item);
            }
        }

        self.page += 1;
        self.has_next = page.has_next;
        self.total = page.total.max(self.items.len());
        self.loading = false;
        self.initial_loading = false;
    }

    /// Replaces the loaded window with a fresh first page
    pub fn replace_with(&mut self, first_page: u32, page: Page<T>) {
        self.items.clear();
        self.page = first_page;
        self.append_page(page);
        self.refreshing = false;
    }

    /// Clears the in-flight flag after a failed fetch so a later trigger retries
    pub fn fail_load(&mut self) {
        self.loading = false;
        self.refreshing = false;
    }
}

/// Column states of a whole board, kept in the board's column order
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet<T> {
    entries: Vec<(String, ColumnState<T>)>,
}

impl<T: BoardItem> ColumnSet<T> {
    pub fn new<I, S>(column_ids: I, first_page: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: column_ids
                .into_iter()
                .map(|id| (id.into(), ColumnState::new(first_page)))
                .collect(),
        }
    }

    pub fn get(&self, column_id: &str) -> Option<&ColumnState<T>> {
        self.entries
            .iter()
            .find(|(id, _)| id == column_id)
            .map(|(_, state)| state)
    }

    pub fn get_mut(&mut self, column_id: &str) -> Option<&mut ColumnState<T>> {
        self.entries
            .iter_mut()
            .find(|(id, _)| id == column_id)
            .map(|(_, state)| state)
    }

    pub fn contains_column(&self, column_id: &str) -> bool {
        self.get(column_id).is_some()
    }

    /// First column (in board order) whose items contain `item_id`
    pub fn column_of(&self, item_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, state)| state.contains(item_id))
            .map(|(id, _)| id.as_str())
    }

    pub fn item(&self, item_id: &str) -> Option<&T> {
        self.entries
            .iter()
            .flat_map(|(_, state)| state.items.iter())
            .find(|item| item.id() == item_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnState<T>)> {
        self.entries.iter().map(|(id, state)| (id.as_str(), state))
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }
}

impl<T> Default for ColumnSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// Scroll position of a column's viewport
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            client_height,
            scroll_height,
        }
    }

    /// Distance left to scroll before reaching the end
    pub fn remaining(&self) -> f64 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }

    pub fn should_prefetch(&self, threshold: f64) -> bool {
        self.remaining() < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::{Deal, DealStage};

    fn deal(id: &str) -> Deal {
        Deal::with_id(id, id, DealStage::Lead)
    }

    #[test]
    fn test_new_state_is_initial_loading() {
        let state: ColumnState<Deal> = ColumnState::new(1);

        assert!(state.initial_loading);
        assert!(state.has_next);
        assert!(!state.loading);
        assert!(state.can_load());
        assert_eq!(state.total, 0);
    }

    #[test]
    fn test_append_page_deduplicates() {
        let mut state = ColumnState::new(1);
        state.append_page(Page::new(vec![deal("a"), deal("b")], true, 4));
        state.append_page(Page::new(vec![deal("b"), deal("c"), deal("c")], false, 4));

        assert_eq!(state.ids(), vec!["a", "b", "c"]);
        assert_eq!(state.page, 3);
        assert!(!state.has_next);
        assert!(!state.initial_loading);
    }

    #[test]
    fn test_total_never_below_loaded_count() {
        let mut state = ColumnState::new(1);
        state.append_page(Page::new(vec![deal("a"), deal("b")], false, 1));

        assert_eq!(state.total, 2);
    }

    #[test]
    fn test_replace_with_resets_cursor() {
        let mut state = ColumnState::new(1);
        state.append_page(Page::new(vec![deal("a")], true, 3));
        state.append_page(Page::new(vec![deal("b")], true, 3));
        state.refreshing = true;

        state.replace_with(1, Page::new(vec![deal("b"), deal("a")], true, 3));

        assert_eq!(state.ids(), vec!["b", "a"]);
        assert_eq!(state.page, 2);
        assert!(!state.refreshing);
    }

    #[test]
    fn test_reload_supersedes_pending_request() {
        let mut state: ColumnState<Deal> = ColumnState::new(1);
        state.append_page(Page::new(vec![deal("a")], true, 2));

        let pending = state.begin_load().unwrap();
        assert_eq!(pending.page, 2);
        assert_eq!(state.begin_load(), None);

        let reload = state.begin_reload(1);
        assert_eq!(reload.page, 1);
        assert!(state.loading);
        assert!(state.refreshing);
        assert!(!state.is_current(pending));
        assert!(state.is_current(reload));
    }

    #[test]
    fn test_fail_load_allows_retry() {
        let mut state: ColumnState<Deal> = ColumnState::new(1);
        state.loading = true;
        assert!(!state.can_load());

        state.fail_load();
        assert!(state.can_load());
        assert!(state.initial_loading);
    }

    #[test]
    fn test_column_set_lookup_uses_board_order() {
        let mut set: ColumnSet<Deal> = ColumnSet::new(["todo", "done"], 1);
        set.get_mut("todo")
            .unwrap()
            .append_page(Page::new(vec![deal("a")], false, 1));
        set.get_mut("done")
            .unwrap()
            .append_page(Page::new(vec![deal("b")], false, 1));

        assert_eq!(set.column_of("a"), Some("todo"));
        assert_eq!(set.column_of("b"), Some("done"));
        assert_eq!(set.column_of("zzz"), None);
        assert_eq!(set.item("b").map(|d| d.id.as_str()), Some("b"));
        assert!(set.contains_column("done"));
        assert!(!set.contains_column("lost"));
        assert_eq!(set.column_ids().collect::<Vec<_>>(), vec!["todo", "done"]);
    }

    #[test]
    fn test_scroll_prefetch_threshold() {
        assert!(ScrollMetrics::new(430.0, 500.0, 1000.0).should_prefetch(80.0));
        // exactly at the threshold is not yet close enough
        assert!(!ScrollMetrics::new(420.0, 500.0, 1000.0).should_prefetch(80.0));
        assert!(!ScrollMetrics::new(0.0, 500.0, 1000.0).should_prefetch(80.0));
        assert_eq!(ScrollMetrics::new(900.0, 500.0, 1000.0).remaining(), 0.0);
    }
}
