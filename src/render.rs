use crate::{
    domain::{BoardItem, Column, ColumnSet},
    drag::{DragEngine, Point, Size},
};

/// Caller-supplied card drawing
pub trait CardRenderer<T> {
    type Output;

    /// Draws a card in its column. `is_dragging` is true only for the in-list
    /// copy of the card currently being dragged, which should be dimmed.
    fn render_card(&self, item: &T, is_dragging: bool) -> Self::Output;

    /// Draws the floating copy that follows the pointer
    fn render_overlay_card(&self, item: &T) -> Self::Output {
        self.render_card(item, true)
    }
}

#[derive(Debug, Clone)]
pub struct ColumnView<'a, R> {
    pub column: &'a Column,
    pub cards: Vec<R>,
    pub total: usize,
    pub has_next: bool,
    pub loading: bool,
    pub initial_loading: bool,
    /// Waiting for a post-commit refetch; render disabled
    pub refreshing: bool,
    pub hovered: bool,
}

/// Detached copy of the dragged card, drawn above every column
#[derive(Debug, Clone)]
pub struct OverlayView<R> {
    pub card: R,
    pub size: Option<Size>,
    pub position: Option<Point>,
}

#[derive(Debug, Clone)]
pub struct BoardView<'a, R> {
    pub columns: Vec<ColumnView<'a, R>>,
    pub overlay: Option<OverlayView<R>>,
}

/// Builds the render model: the preview while dragging, the real states
/// otherwise.
pub fn render_board<'a, T, C>(
    columns: &'a [Column],
    real: &ColumnSet<T>,
    engine: &DragEngine<T>,
    renderer: &C,
) -> BoardView<'a, C::Output>
where
    T: BoardItem,
    C: CardRenderer<T> + ?Sized,
{
    let states = engine.preview().unwrap_or(real);
    let hovered = engine.hovered_column();

    let columns = columns
        .iter()
        .filter_map(|column| {
            let state = states.get(&column.id)?;
            Some(ColumnView {
                column,
                cards: state
                    .items
                    .iter()
                    .map(|item| renderer.render_card(item, engine.is_dragging(item.id())))
                    .collect(),
                total: state.total,
                has_next: state.has_next,
                loading: state.loading,
                initial_loading: state.initial_loading,
                refreshing: state.refreshing,
                hovered: hovered == Some(column.id.as_str()),
            })
        })
        .collect();

    let overlay = engine.session().and_then(|session| {
        let item = session.preview.item(&session.active_id)?;
        Some(OverlayView {
            card: renderer.render_overlay_card(item),
            size: session.overlay_size,
            position: session.pointer,
        })
    });

    BoardView { columns, overlay }
}
