//! Drag gesture state machine.
//!
//! `Idle -> Dragging -> (commit | cancel) -> Idle`. While dragging, pointer-over
//! events rewrite a private preview of the column states; the real states are
//! never touched. Ending the drag yields at most one [`Commit`] for the caller
//! to persist, and every exit path discards the session.

use crate::{
    domain::{BoardConfig, BoardItem, ColumnSet},
    drag::{
        geometry::{Point, Rect, Size},
        preview,
    },
    error::{BoardError, Result},
    source::BoardMutations,
};
use std::{collections::HashSet, time::Duration};
use tokio::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
}

/// State of an in-progress drag
#[derive(Debug, Clone)]
pub struct DragSession<T> {
    pub active_id: String,
    /// Column the item started in; never recomputed
    pub from_column: String,
    pub preview: ColumnSet<T>,
    pub hovered_column: Option<String>,
    pub overlay_size: Option<Size>,
    pub pointer: Option<Point>,
}

/// A pointer-over notification from the gesture layer
#[derive(Debug, Clone, PartialEq)]
pub struct OverEvent {
    /// Column id or item id under the pointer
    pub over_id: String,
    pub pointer: Option<Point>,
    /// Current on-screen bounds of the hovered card
    pub over_rect: Option<Rect>,
}

impl OverEvent {
    pub fn new(over_id: impl Into<String>) -> Self {
        Self {
            over_id: over_id.into(),
            pointer: None,
            over_rect: None,
        }
    }

    pub fn at(mut self, pointer: Point) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.over_rect = Some(rect);
        self
    }
}

/// Mutation to persist after a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    Move {
        item_id: String,
        from_column: String,
        to_column: String,
        target_index: usize,
    },
    Reorder {
        column_id: String,
        ordered_ids: Vec<String>,
    },
}

impl Commit {
    /// Columns whose persisted contents change
    pub fn affected_columns(&self) -> Vec<&str> {
        match self {
            Self::Move {
                from_column,
                to_column,
                ..
            } => vec![from_column.as_str(), to_column.as_str()],
            Self::Reorder { column_id, .. } => vec![column_id.as_str()],
        }
    }

    /// Issues the matching persistence call
    pub async fn apply<M>(&self, mutations: &M) -> Result<()>
    where
        M: BoardMutations + ?Sized,
    {
        match self {
            Self::Move {
                item_id,
                from_column,
                to_column,
                target_index,
            } => {
                mutations
                    .move_across_columns(item_id, from_column, to_column, *target_index)
                    .await
            }
            Self::Reorder {
                column_id,
                ordered_ids,
            } => mutations.reorder_within_column(column_id, ordered_ids).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Commit(Commit),
    /// Dropped back where it started
    Unchanged,
    Cancelled,
}

pub struct DragEngine<T> {
    session: Option<DragSession<T>>,
    last_ended: Option<Instant>,
    settle_window: Duration,
}

impl<T: BoardItem> DragEngine<T> {
    pub const DEFAULT_SETTLE: Duration = Duration::from_millis(200);

    pub fn new(settle_window: Duration) -> Self {
        Self {
            session: None,
            last_ended: None,
            settle_window,
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(Duration::from_millis(config.drag_settle_ms))
    }

    pub fn phase(&self) -> DragPhase {
        if self.session.is_some() {
            DragPhase::Dragging
        } else {
            DragPhase::Idle
        }
    }

    pub fn session(&self) -> Option<&DragSession<T>> {
        self.session.as_ref()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.active_id.as_str())
    }

    pub fn is_dragging(&self, item_id: &str) -> bool {
        self.active_id() == Some(item_id)
    }

    pub fn hovered_column(&self) -> Option<&str> {
        self.session.as_ref()?.hovered_column.as_deref()
    }

    pub fn preview(&self) -> Option<&ColumnSet<T>> {
        self.session.as_ref().map(|s| &s.preview)
    }

    /// Begins a drag of `item_id`, snapshotting the real column states
    pub fn start(&mut self, item_id: &str, real: &ColumnSet<T>, card_size: Option<Size>) -> Result<()> {
        if self.session.is_some() {
            return Err(BoardError::DragInProgress);
        }

        let from_column = real
            .column_of(item_id)
            .ok_or_else(|| BoardError::ItemNotFound(item_id.to_string()))?
            .to_string();

        debug!(item_id, from_column = %from_column, "drag started");
        self.session = Some(DragSession {
            active_id: item_id.to_string(),
            hovered_column: Some(from_column.clone()),
            from_column,
            preview: real.clone(),
            overlay_size: card_size,
            pointer: None,
        });
        Ok(())
    }

    /// Applies a pointer-over event to the preview. Ignored when idle.
    pub fn over(&mut self, event: &OverEvent) {
        let Some(session) = self.session.as_mut() else {
            trace!(over_id = %event.over_id, "drag-over while idle");
            return;
        };

        if event.pointer.is_some() {
            session.pointer = event.pointer;
        }

        let previous = std::mem::take(&mut session.preview);
        session.preview = preview::apply_over(
            previous,
            &session.active_id,
            &event.over_id,
            event.pointer,
            event.over_rect,
        );

        if let Some(column) = preview::resolve_column(&session.preview, &event.over_id) {
            if session.hovered_column.as_deref() != Some(column) {
                trace!(column, "hovered column changed");
                session.hovered_column = Some(column.to_string());
            }
        }
    }

    /// Tracks the pointer for the floating overlay
    pub fn pointer_moved(&mut self, pointer: Point) {
        if let Some(session) = self.session.as_mut() {
            session.pointer = Some(pointer);
        }
    }

    /// Finishes the drag over `over_id` (or over nothing).
    ///
    /// `real` is the non-preview state, used to decide whether a same-column
    /// drop actually changed the order.
    pub fn end(&mut self, over_id: Option<&str>, real: &ColumnSet<T>) -> Result<DragOutcome> {
        let session = self.finish()?;

        let Some(over_id) = over_id else {
            debug!(item_id = %session.active_id, "drag ended outside any drop target");
            return Ok(DragOutcome::Cancelled);
        };

        let final_states = &session.preview;
        let (Some(to_column), Some(_)) = (
            final_states.column_of(&session.active_id),
            preview::resolve_column(final_states, over_id),
        ) else {
            debug!(item_id = %session.active_id, over_id, "drop target could not be resolved");
            return Ok(DragOutcome::Cancelled);
        };

        if to_column != session.from_column {
            let target_index = final_states
                .get(to_column)
                .and_then(|state| state.index_of(&session.active_id))
                .unwrap_or(0);
            debug!(
                item_id = %session.active_id,
                from_column = %session.from_column,
                to_column,
                target_index,
                "drag committed as move"
            );
            return Ok(DragOutcome::Commit(Commit::Move {
                item_id: session.active_id.clone(),
                from_column: session.from_column.clone(),
                to_column: to_column.to_string(),
                target_index,
            }));
        }

        let before = real.get(to_column).map(|s| s.ids()).unwrap_or_default();
        let after = final_states.get(to_column).map(|s| s.ids()).unwrap_or_default();

        if is_rearrangement(&before, &after) {
            debug!(column = to_column, "drag committed as reorder");
            Ok(DragOutcome::Commit(Commit::Reorder {
                column_id: to_column.to_string(),
                ordered_ids: after,
            }))
        } else {
            debug!(column = to_column, "drag ended without changes");
            Ok(DragOutcome::Unchanged)
        }
    }

    /// Aborts the drag, discarding the preview. Returns whether a drag was active.
    pub fn cancel(&mut self) -> bool {
        match self.finish() {
            Ok(session) => {
                debug!(item_id = %session.active_id, "drag cancelled");
                true
            }
            Err(_) => false,
        }
    }

    /// True for a short window after any drag ends, so card click handlers can
    /// ignore the click that closes a drag gesture.
    pub fn was_recently_dragging(&self) -> bool {
        self.was_recently_dragging_at(Instant::now())
    }

    pub fn was_recently_dragging_at(&self, now: Instant) -> bool {
        if self.session.is_some() {
            return true;
        }
        self.last_ended
            .map(|ended| now.saturating_duration_since(ended) < self.settle_window)
            .unwrap_or(false)
    }

    fn finish(&mut self) -> Result<DragSession<T>> {
        let session = self.session.take().ok_or(BoardError::NoActiveDrag)?;
        self.last_ended = Some(Instant::now());
        Ok(session)
    }
}

/// Same ids, different order
fn is_rearrangement(before: &[String], after: &[String]) -> bool {
    if before.len() != after.len() || before == after {
        return false;
    }
    let before_set: HashSet<&String> = before.iter().collect();
    after.iter().all(|id| before_set.contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Deal, DealStage, Page};
    use async_trait::async_trait;
    use std::sync::Mutex;

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

    fn engine() -> DragEngine<Deal> {
        DragEngine::new(DragEngine::<Deal>::DEFAULT_SETTLE)
    }

    #[derive(Default)]
    struct RecordingMutations {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BoardMutations for RecordingMutations {
        async fn move_across_columns(
            &self,
            item_id: &str,
            from_column: &str,
            to_column: &str,
            target_index: usize,
        ) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("move {item_id} {from_column}->{to_column} @{target_index}"));
            Ok(())
        }

        async fn reorder_within_column(&self, column_id: &str, ordered_ids: &[String]) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("reorder {column_id} {}", ordered_ids.join(",")));
            Ok(())
        }
    }

    #[test]
    fn test_start_snapshots_source_column() {
        let real = board(vec![("todo", vec!["a"]), ("done", vec!["b"])]);
        let mut engine = engine();

        engine.start("b", &real, Some(Size::new(240.0, 80.0))).unwrap();

        let session = engine.session().unwrap();
        assert_eq!(engine.phase(), DragPhase::Dragging);
        assert_eq!(session.from_column, "done");
        assert_eq!(session.preview, real);
        assert_eq!(session.overlay_size, Some(Size::new(240.0, 80.0)));
        assert!(engine.is_dragging("b"));
        assert!(!engine.is_dragging("a"));
    }

    #[test]
    fn test_start_rejects_unknown_item_and_second_drag() {
        let real = board(vec![("todo", vec!["a"])]);
        let mut engine = engine();

        assert!(matches!(
            engine.start("ghost", &real, None),
            Err(BoardError::ItemNotFound(_))
        ));
        assert_eq!(engine.phase(), DragPhase::Idle);

        engine.start("a", &real, None).unwrap();
        assert!(matches!(
            engine.start("a", &real, None),
            Err(BoardError::DragInProgress)
        ));
    }

    #[tokio::test]
    async fn test_cross_column_commit_over_card() {
        let real = board(vec![("todo", vec!["X", "Y"]), ("done", vec!["Z"])]);
        let mut engine = engine();
        let mutations = RecordingMutations::default();

        engine.start("X", &real, None).unwrap();
        engine.over(
            &OverEvent::new("Z")
                .at(Point::new(10.0, 105.0))
                .with_rect(Rect::new(0.0, 100.0, 200.0, 40.0)),
        );

        let preview = engine.preview().unwrap();
        assert_eq!(preview.get("todo").unwrap().ids(), vec!["Y"]);
        assert_eq!(preview.get("done").unwrap().ids(), vec!["X", "Z"]);
        assert_eq!(engine.hovered_column(), Some("done"));

        let outcome = engine.end(Some("Z"), &real).unwrap();
        let DragOutcome::Commit(commit) = &outcome else {
            panic!("expected a commit, got {outcome:?}");
        };
        commit.apply(&mutations).await.unwrap();

        assert_eq!(
            *mutations.calls.lock().unwrap(),
            vec!["move X todo->done @0".to_string()]
        );
        assert_eq!(engine.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_drop_on_empty_column_container() {
        let real = board(vec![("todo", vec!["1", "2"]), ("done", vec![])]);
        let mut engine = engine();

        engine.start("1", &real, None).unwrap();
        engine.over(&OverEvent::new("done"));

        let preview = engine.preview().unwrap();
        assert_eq!(preview.get("todo").unwrap().ids(), vec!["2"]);
        assert_eq!(preview.get("done").unwrap().ids(), vec!["1"]);
        assert_eq!(preview.get("todo").unwrap().total, 1);
        assert_eq!(preview.get("done").unwrap().total, 1);

        assert_eq!(
            engine.end(Some("done"), &real).unwrap(),
            DragOutcome::Commit(Commit::Move {
                item_id: "1".to_string(),
                from_column: "todo".to_string(),
                to_column: "done".to_string(),
                target_index: 0,
            })
        );
    }

    #[test]
    fn test_same_column_reorder_commit() {
        let real = board(vec![("todo", vec!["a", "b", "c"])]);
        let mut engine = engine();

        engine.start("a", &real, None).unwrap();
        engine.over(&OverEvent::new("todo"));

        assert_eq!(
            engine.end(Some("todo"), &real).unwrap(),
            DragOutcome::Commit(Commit::Reorder {
                column_id: "todo".to_string(),
                ordered_ids: vec!["b".to_string(), "c".to_string(), "a".to_string()],
            })
        );
    }

    #[test]
    fn test_release_at_original_index_issues_no_reorder() {
        let real = board(vec![("todo", vec!["a", "b", "c"])]);
        let mut engine = engine();

        engine.start("b", &real, None).unwrap();
        // down to the end and back between a and c
        engine.over(&OverEvent::new("todo"));
        engine.over(
            &OverEvent::new("c")
                .at(Point::new(0.0, 41.0))
                .with_rect(Rect::new(0.0, 40.0, 200.0, 40.0)),
        );
        assert_eq!(engine.preview().unwrap().get("todo").unwrap().ids(), vec!["a", "b", "c"]);

        assert_eq!(engine.end(Some("b"), &real).unwrap(), DragOutcome::Unchanged);
    }

    #[test]
    fn test_drop_back_into_origin_after_visiting_other_column() {
        let real = board(vec![("todo", vec!["a", "b"]), ("done", vec!["c"])]);
        let mut engine = engine();

        engine.start("a", &real, None).unwrap();
        engine.over(&OverEvent::new("done"));
        engine.over(
            &OverEvent::new("b")
                .at(Point::new(0.0, 1.0))
                .with_rect(Rect::new(0.0, 0.0, 200.0, 40.0)),
        );

        assert_eq!(engine.end(Some("todo"), &real).unwrap(), DragOutcome::Unchanged);
    }

    #[test]
    fn test_cancel_is_total() {
        let real = board(vec![("todo", vec!["a", "b"]), ("done", vec!["c"])]);
        let pristine = real.clone();
        let mut engine = engine();

        engine.start("a", &real, Some(Size::new(100.0, 30.0))).unwrap();
        engine.over(&OverEvent::new("done"));
        engine.over(&OverEvent::new("c").at(Point::new(0.0, 0.0)));
        engine.over(&OverEvent::new("todo"));
        assert!(engine.cancel());

        assert_eq!(real, pristine);
        assert_eq!(engine.phase(), DragPhase::Idle);
        assert!(engine.session().is_none());
        assert!(engine.preview().is_none());
        assert_eq!(engine.hovered_column(), None);
        assert!(!engine.cancel());
    }

    #[test]
    fn test_end_without_target_is_cancel() {
        let real = board(vec![("todo", vec!["a"]), ("done", vec![])]);
        let mut engine = engine();

        engine.start("a", &real, None).unwrap();
        engine.over(&OverEvent::new("done"));

        assert_eq!(engine.end(None, &real).unwrap(), DragOutcome::Cancelled);
        assert_eq!(engine.phase(), DragPhase::Idle);
    }

    #[test]
    fn test_end_over_unknown_target_is_cancel() {
        let real = board(vec![("todo", vec!["a"]), ("done", vec![])]);
        let mut engine = engine();

        engine.start("a", &real, None).unwrap();
        engine.over(&OverEvent::new("done"));

        assert_eq!(engine.end(Some("ghost"), &real).unwrap(), DragOutcome::Cancelled);
    }

    #[test]
    fn test_end_while_idle_is_error() {
        let real = board(vec![("todo", vec!["a"])]);
        let mut engine = engine();

        assert!(matches!(engine.end(Some("todo"), &real), Err(BoardError::NoActiveDrag)));
    }

    #[test]
    fn test_inconsistent_over_events_are_ignored() {
        let real = board(vec![("todo", vec!["a"]), ("done", vec![])]);
        let mut engine = engine();

        engine.over(&OverEvent::new("done"));
        assert_eq!(engine.phase(), DragPhase::Idle);

        engine.start("a", &real, None).unwrap();
        engine.over(&OverEvent::new("nowhere"));
        assert_eq!(engine.preview().unwrap(), &real);
        assert_eq!(engine.hovered_column(), Some("todo"));
    }

    #[test]
    fn test_pointer_tracking() {
        let real = board(vec![("todo", vec!["a"])]);
        let mut engine = engine();

        engine.start("a", &real, None).unwrap();
        engine.pointer_moved(Point::new(3.0, 4.0));
        assert_eq!(engine.session().unwrap().pointer, Some(Point::new(3.0, 4.0)));

        engine.over(&OverEvent::new("todo").at(Point::new(5.0, 6.0)));
        assert_eq!(engine.session().unwrap().pointer, Some(Point::new(5.0, 6.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recently_dragging_window() {
        let real = board(vec![("todo", vec!["a"])]);
        let mut engine = engine();
        assert!(!engine.was_recently_dragging());

        engine.start("a", &real, None).unwrap();
        assert!(engine.was_recently_dragging());

        engine.end(Some("todo"), &real).unwrap();
        assert!(engine.was_recently_dragging());

        tokio::time::advance(Duration::from_millis(199)).await;
        assert!(engine.was_recently_dragging());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!engine.was_recently_dragging());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_also_opens_settle_window() {
        let real = board(vec![("todo", vec!["a"])]);
        let mut engine = engine();

        engine.start("a", &real, None).unwrap();
        engine.cancel();
        assert!(engine.was_recently_dragging());

        tokio::time::advance(Duration::from_millis(250)).await;
        assert!(!engine.was_recently_dragging());
    }

    #[test]
    fn test_rearrangement_detection() {
        fn ids(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| s.to_string()).collect()
        }

        assert!(is_rearrangement(&ids(&["a", "b"]), &ids(&["b", "a"])));
        assert!(!is_rearrangement(&ids(&["a", "b"]), &ids(&["a", "b"])));
        assert!(!is_rearrangement(&ids(&["a", "b"]), &ids(&["a"])));
        assert!(!is_rearrangement(&ids(&["a", "b"]), &ids(&["a", "c"])));
    }

    #[test]
    fn test_commit_affected_columns() {
        let mv = Commit::Move {
            item_id: "x".to_string(),
            from_column: "todo".to_string(),
            to_column: "done".to_string(),
            target_index: 0,
        };
        assert_eq!(mv.affected_columns(), vec!["todo", "done"]);

        let reorder = Commit::Reorder {
            column_id: "todo".to_string(),
            ordered_ids: vec![],
        };
        assert_eq!(reorder.affected_columns(), vec!["todo"]);
    }
}
