//! Seeds an in-memory pipeline, drags a deal between stages and prints the
//! board before and after.
//!
//! Usage: `board-demo [config.json]`

use anyhow::{Context, Result};
use crm_board::{
    BoardConfig, CardRenderer, Deal, DealStage, KanbanBoard, MemorySource, OverEvent, Point, Rect,
    Size,
};
use tracing_subscriber::EnvFilter;

struct ConsoleCards;

impl CardRenderer<Deal> for ConsoleCards {
    type Output = String;

    fn render_card(&self, deal: &Deal, is_dragging: bool) -> String {
        let company = deal.company.as_deref().unwrap_or("-");
        let marker = if is_dragging { "~" } else { " " };
        format!("{marker} {} ({company}, {})", deal.title, deal.amount)
    }
}

fn print_board(board: &KanbanBoard<Deal, MemorySource<Deal>>) {
    for column in board.render(&ConsoleCards).columns {
        println!("[{}] {} of {}", column.column.label, column.cards.len(), column.total);
        for card in column.cards {
            println!("  {card}");
        }
    }
    println!();
}

fn seed(config: &BoardConfig) -> Result<MemorySource<Deal>> {
    let source = MemorySource::new(config.column_ids());
    let deals = [
        ("Acme renewal", "Acme", 12_000, DealStage::Lead),
        ("Globex pilot", "Globex", 4_500, DealStage::Lead),
        ("Initech upsell", "Initech", 8_000, DealStage::Qualified),
        ("Umbrella rollout", "Umbrella", 30_000, DealStage::Proposal),
    ];
    for (title, company, amount, stage) in deals {
        let deal = Deal::new(title, stage)
            .with_company(company)
            .with_amount(amount);
        source
            .insert(stage.column_id(), deal)
            .with_context(|| format!("seeding '{title}'"))?;
    }
    Ok(source)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => BoardConfig::load(&path)
            .await
            .with_context(|| format!("loading board config from {path}"))?,
        None => BoardConfig::default(),
    };

    let source = seed(&config)?;
    let mut board = KanbanBoard::new(config, source)?;
    board.load_initial().await?;
    print_board(&board);

    let lead = board
        .column_state(DealStage::Lead.column_id())
        .context("lead column missing from board")?;
    let Some(dragged) = lead.items.first().map(|deal| deal.id.clone()) else {
        println!("nothing to drag");
        return Ok(());
    };

    let target = board
        .column_state(DealStage::Qualified.column_id())
        .and_then(|state| state.items.first().map(|deal| deal.id.clone()))
        .unwrap_or_else(|| DealStage::Qualified.column_id().to_string());

    board.drag_start(&dragged, Some(Size::new(280.0, 72.0)))?;
    board.drag_over(
        &OverEvent::new(target.clone())
            .at(Point::new(420.0, 10.0))
            .with_rect(Rect::new(320.0, 0.0, 280.0, 72.0)),
    );
    let outcome = board.drag_end(Some(target.as_str())).await?;
    println!("outcome: {outcome:?}\n");
    print_board(&board);

    Ok(())
}
