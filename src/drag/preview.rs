//! Speculative column-state transforms applied while a drag is in progress.
//!
//! Every function takes the previous preview by value and returns the next
//! one; an event that cannot be resolved returns its input untouched.

use crate::{
    domain::{BoardItem, ColumnSet},
    drag::geometry::{card_drop_index, Point, Rect},
};
use tracing::trace;

/// Column an over-target refers to: the column itself when `over_id` names a
/// column, otherwise the column currently holding that item.
pub fn resolve_column<'a, T: BoardItem>(states: &'a ColumnSet<T>, over_id: &str) -> Option<&'a str> {
    if let Some(id) = states.column_ids().find(|id| *id == over_id) {
        return Some(id);
    }
    states.column_of(over_id)
}

/// Insertion index in `column_id` for the current over-target.
///
/// Hovering the column container appends; hovering a card applies the
/// midpoint rule against that card's bounds.
pub fn target_index<T: BoardItem>(
    states: &ColumnSet<T>,
    column_id: &str,
    over_id: &str,
    pointer: Option<Point>,
    over_rect: Option<Rect>,
) -> Option<usize> {
    let state = states.get(column_id)?;
    if over_id == column_id {
        return Some(state.len());
    }
    let card_index = state.index_of(over_id)?;
    Some(card_drop_index(card_index, pointer, over_rect))
}

/// Moves an item to `index` inside its own column. `index` is an insertion
/// point in the list as it was before the item was taken out.
pub fn reorder_within<T: BoardItem>(
    mut states: ColumnSet<T>,
    column_id: &str,
    item_id: &str,
    index: usize,
) -> ColumnSet<T> {
    let Some(state) = states.get_mut(column_id) else {
        return states;
    };
    let Some(from) = state.index_of(item_id) else {
        return states;
    };

    let to = (if index > from { index - 1 } else { index }).min(state.len() - 1);
    if to == from {
        return states;
    }

    let item = state.items.remove(from);
    state.items.insert(to, item);
    states
}

/// Moves an item from one column's preview into another at `index`
pub fn move_between<T: BoardItem>(
    mut states: ColumnSet<T>,
    item_id: &str,
    from_column: &str,
    to_column: &str,
    index: usize,
) -> ColumnSet<T> {
    if from_column == to_column || !states.contains_column(to_column) {
        return states;
    }

    let Some(source) = states.get_mut(from_column) else {
        return states;
    };
    let Some(pos) = source.index_of(item_id) else {
        return states;
    };
    let item = source.items.remove(pos);
    source.total = source.total.saturating_sub(1);

    if let Some(target) = states.get_mut(to_column) {
        let at = index.min(target.items.len());
        target.items.insert(at, item);
        target.total = (target.total + 1).max(target.items.len());
    }
    states
}

/// Applies one pointer-over event to the preview
pub fn apply_over<T: BoardItem>(
    states: ColumnSet<T>,
    active_id: &str,
    over_id: &str,
    pointer: Option<Point>,
    over_rect: Option<Rect>,
) -> ColumnSet<T> {
    if over_id == active_id {
        return states;
    }

    let (Some(active_column), Some(over_column)) = (
        states.column_of(active_id).map(str::to_string),
        resolve_column(&states, over_id).map(str::to_string),
    ) else {
        trace!(active_id, over_id, "ignoring unresolvable drag-over");
        return states;
    };

    let Some(index) = target_index(&states, &over_column, over_id, pointer, over_rect) else {
        return states;
    };

    if active_column == over_column {
        reorder_within(states, &active_column, active_id, index)
    } else {
        move_between(states, active_id, &active_column, &over_column, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Deal, DealStage, Page};

    fn board(columns: Vec<(&str, Vec<&str>)>) -> ColumnSet<Deal> {
        let mut set = ColumnSet::new(columns.iter().map(|(id, _)| *id), 1);
        for (column, ids) in &columns {
            let items: Vec<Deal> = ids
                .iter()
                .map(|id| Deal::with_id(*id, *id, DealStage::Lead))
                .collect();
            let total = items.len();
            set.get_mut(column)
                .unwrap()
                .append_page(Page::new(items, false, total));
        }
        set
    }

    fn ids(set: &ColumnSet<Deal>, column: &str) -> Vec<String> {
        set.get(column).unwrap().ids()
    }

    fn rect_at(y: f64) -> Option<Rect> {
        Some(Rect::new(0.0, y, 200.0, 40.0))
    }

    #[test]
    fn test_resolve_column_prefers_column_ids() {
        let set = board(vec![("todo", vec!["a"]), ("done", vec![])]);

        assert_eq!(resolve_column(&set, "done"), Some("done"));
        assert_eq!(resolve_column(&set, "a"), Some("todo"));
        assert_eq!(resolve_column(&set, "ghost"), None);
    }

    #[test]
    fn test_target_index_on_container_is_end() {
        let set = board(vec![("todo", vec!["a", "b"])]);
        assert_eq!(target_index(&set, "todo", "todo", None, None), Some(2));
    }

    #[test]
    fn test_reorder_down_and_up() {
        let set = board(vec![("todo", vec!["a", "b", "c"])]);

        // below c's midpoint: a goes last
        let set = apply_over(set, "a", "c", Some(Point::new(0.0, 105.0)), rect_at(80.0));
        assert_eq!(ids(&set, "todo"), vec!["b", "c", "a"]);

        // above b's midpoint: a goes first
        let set = apply_over(set, "a", "b", Some(Point::new(0.0, 1.0)), rect_at(0.0));
        assert_eq!(ids(&set, "todo"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reorder_to_own_slot_is_noop() {
        let set = board(vec![("todo", vec!["a", "b", "c"])]);

        // above b's midpoint while dragging a: a stays first
        let next = apply_over(set.clone(), "a", "b", Some(Point::new(0.0, 45.0)), rect_at(40.0));
        assert_eq!(next, set);

        // hovering the dragged card itself
        let next = apply_over(set.clone(), "b", "b", Some(Point::new(0.0, 70.0)), rect_at(40.0));
        assert_eq!(next, set);
    }

    #[test]
    fn test_reorder_onto_container_moves_to_end() {
        let set = board(vec![("todo", vec!["a", "b", "c"])]);
        let set = apply_over(set, "a", "todo", None, None);
        assert_eq!(ids(&set, "todo"), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_cross_column_above_midpoint() {
        let set = board(vec![("todo", vec!["x", "y"]), ("done", vec!["z"])]);

        let set = apply_over(set, "x", "z", Some(Point::new(0.0, 5.0)), rect_at(0.0));

        assert_eq!(ids(&set, "todo"), vec!["y"]);
        assert_eq!(ids(&set, "done"), vec!["x", "z"]);
        assert_eq!(set.get("todo").unwrap().total, 1);
        assert_eq!(set.get("done").unwrap().total, 2);
    }

    #[test]
    fn test_cross_column_keeps_item_content() {
        let set = board(vec![("todo", vec!["x"]), ("done", vec![])]);
        let before = set.item("x").cloned().unwrap();

        let set = apply_over(set, "x", "done", None, None);

        assert_eq!(set.item("x"), Some(&before));
        assert_eq!(set.column_of("x"), Some("done"));
    }

    #[test]
    fn test_total_floored_at_zero() {
        let mut set = board(vec![("todo", vec!["x"]), ("done", vec![])]);
        set.get_mut("todo").unwrap().total = 0;

        let set = apply_over(set, "x", "done", None, None);

        assert_eq!(set.get("todo").unwrap().total, 0);
        assert_eq!(set.get("done").unwrap().total, 1);
    }

    #[test]
    fn test_unresolvable_events_leave_preview_unchanged() {
        let set = board(vec![("todo", vec!["a"]), ("done", vec!["b"])]);

        assert_eq!(apply_over(set.clone(), "ghost", "done", None, None), set);
        assert_eq!(apply_over(set.clone(), "a", "ghost", None, None), set);
    }

    #[test]
    fn test_move_between_clamps_index() {
        let set = board(vec![("todo", vec!["a"]), ("done", vec!["b"])]);
        let set = move_between(set, "a", "todo", "done", 42);
        assert_eq!(ids(&set, "done"), vec!["b", "a"]);
    }
}
