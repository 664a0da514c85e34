use crate::{
    domain::item::DealStage,
    error::{BoardError, Result},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path};
use tokio::fs;

/// Visual marker drawn next to a column label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum ColumnMarker {
    Dot(String),
    Icon(String),
}

/// A board column. Fixed for the lifetime of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<ColumnMarker>,
}

impl Column {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            marker: None,
        }
    }

    pub fn with_dot(mut self, color: impl Into<String>) -> Self {
        self.marker = Some(ColumnMarker::Dot(color.into()));
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.marker = Some(ColumnMarker::Icon(icon.into()));
        self
    }
}

/// Board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub name: String,
    pub columns: Vec<Column>,
    /// Items requested per page fetch
    pub page_size: usize,
    /// Remaining scroll distance under which the next page is prefetched
    pub prefetch_threshold: f64,
    /// How long click suppression stays active after a drag ends
    pub drag_settle_ms: u64,
    /// Cursor of the first page
    pub first_page: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: "Sales Pipeline".to_string(),
            columns: vec![
                Column::new(DealStage::Lead.column_id(), "Lead").with_dot("#94a3b8"),
                Column::new(DealStage::Qualified.column_id(), "Qualified").with_dot("#38bdf8"),
                Column::new(DealStage::Proposal.column_id(), "Proposal").with_dot("#a78bfa"),
                Column::new(DealStage::Negotiation.column_id(), "Negotiation")
                    .with_dot("#f59e0b"),
                Column::new(DealStage::Won.column_id(), "Won").with_icon("trophy"),
                Column::new(DealStage::Lost.column_id(), "Lost").with_icon("x-circle"),
            ],
            page_size: 20,
            prefetch_threshold: 80.0,
            drag_settle_ms: 200,
            first_page: 1,
        }
    }
}

impl BoardConfig {
    /// Parses a JSON config; absent fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BoardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(BoardError::ConfigError(
                "board needs at least one column".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.id.trim().is_empty() {
                return Err(BoardError::ConfigError("column id is empty".to_string()));
            }
            if !seen.insert(column.id.as_str()) {
                return Err(BoardError::ConfigError(format!(
                    "duplicate column id '{}'",
                    column.id
                )));
            }
        }

        if self.page_size == 0 {
            return Err(BoardError::ConfigError(
                "page_size must be greater than zero".to_string(),
            ));
        }

        if !self.prefetch_threshold.is_finite() || self.prefetch_threshold < 0.0 {
            return Err(BoardError::ConfigError(format!(
                "invalid prefetch_threshold {}",
                self.prefetch_threshold
            )));
        }

        Ok(())
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.id == id)
    }

    pub fn column_ids(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|col| col.id.as_str())
    }
}
