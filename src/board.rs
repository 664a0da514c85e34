use crate::{
    domain::{BoardConfig, BoardItem, ColumnState, ScrollMetrics},
    drag::{DragEngine, DragOutcome, DragPhase, OverEvent, Point, Size},
    error::Result,
    render::{render_board, BoardView, CardRenderer},
    source::{BoardMutations, PageSource},
    store::ColumnStore,
};
use tracing::{info, warn};

/// A kanban board: column store, drag engine and the backend they talk to
pub struct KanbanBoard<T, S> {
    config: BoardConfig,
    store: ColumnStore<T>,
    engine: DragEngine<T>,
    source: S,
}

impl<T, S> KanbanBoard<T, S>
where
    T: BoardItem + Send,
    S: PageSource<T> + BoardMutations,
{
    pub fn new(config: BoardConfig, source: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: ColumnStore::new(&config),
            engine: DragEngine::from_config(&config),
            config,
            source,
        })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn store(&self) -> &ColumnStore<T> {
        &self.store
    }

    pub fn engine(&self) -> &DragEngine<T> {
        &self.engine
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn column_state(&self, column_id: &str) -> Option<ColumnState<T>> {
        self.store.state(column_id)
    }

    pub async fn load_initial(&self) -> Result<()> {
        self.store.load_initial(&self.source).await
    }

    pub async fn load_next_page(&self, column_id: &str) -> Result<bool> {
        self.store.load_next_page(column_id, &self.source).await
    }

    pub async fn on_scroll(&self, column_id: &str, metrics: ScrollMetrics) -> Result<bool> {
        self.store.on_scroll(column_id, metrics, &self.source).await
    }

    pub fn phase(&self) -> DragPhase {
        self.engine.phase()
    }

    pub fn drag_start(&mut self, item_id: &str, card_size: Option<Size>) -> Result<()> {
        let real = self.store.snapshot();
        self.engine.start(item_id, &real, card_size)
    }

    pub fn drag_over(&mut self, event: &OverEvent) {
        self.engine.over(event);
    }

    pub fn pointer_moved(&mut self, pointer: Point) {
        self.engine.pointer_moved(pointer);
    }

    pub fn drag_cancel(&mut self) -> bool {
        self.engine.cancel()
    }

    /// Ends the drag and persists the result.
    ///
    /// Affected columns are flagged `refreshing` before the mutation is sent
    /// and refetched afterwards whether or not it succeeded. A mutation error
    /// is returned after that refetch.
    pub async fn drag_end(&mut self, over_id: Option<&str>) -> Result<DragOutcome> {
        let real = self.store.snapshot();
        let outcome = self.engine.end(over_id, &real)?;

        let commit = match outcome {
            DragOutcome::Commit(commit) => commit,
            other => return Ok(other),
        };

        let affected = commit.affected_columns();
        self.store.mark_refreshing(&affected)?;

        let persisted = commit.apply(&self.source).await;
        if let Err(err) = &persisted {
            warn!(error = %err, ?commit, "drag commit failed, resynchronising");
        } else {
            info!(?commit, "drag committed");
        }

        for column_id in &affected {
            if let Err(err) = self.store.reload(column_id, &self.source).await {
                warn!(column = column_id, error = %err, "resynchronisation failed");
            }
        }

        persisted?;
        Ok(DragOutcome::Commit(commit))
    }

    /// Whether a card click should be ignored because it closes a drag
    pub fn was_recently_dragging(&self) -> bool {
        self.engine.was_recently_dragging()
    }

    pub fn render<C>(&self, renderer: &C) -> BoardView<'_, C::Output>
    where
        C: CardRenderer<T> + ?Sized,
    {
        let real = self.store.snapshot();
        render_board(&self.config.columns, &real, &self.engine, renderer)
    }
}
