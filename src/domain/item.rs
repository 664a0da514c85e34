use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Anything that can be placed on a board.
///
/// The board never looks at an item beyond its id; ids must be unique
/// across the whole board.
pub trait BoardItem: Clone {
    fn id(&self) -> &str;
}

/// Pipeline stage of a deal, one per default board column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStage {
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl DealStage {
    pub const ALL: [DealStage; 6] = [
        Self::Lead,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::Won,
        Self::Lost,
    ];

    /// Column id used for this stage on the default board
    pub fn column_id(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    /// Whether the deal has left the active pipeline
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for DealStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lead => write!(f, "Lead"),
            Self::Qualified => write!(f, "Qualified"),
            Self::Proposal => write!(f, "Proposal"),
            Self::Negotiation => write!(f, "Negotiation"),
            Self::Won => write!(f, "Won"),
            Self::Lost => write!(f, "Lost"),
        }
    }
}

impl FromStr for DealStage {
    type Err = crate::error::BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|stage| stage.column_id() == normalized)
            .ok_or_else(|| crate::error::BoardError::ColumnNotFound(s.to_string()))
    }
}

/// A sales deal card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Deal value in minor currency units
    pub amount: u64,
    pub stage: DealStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// Creates a new deal with a freshly generated id
    pub fn new(title: impl Into<String>, stage: DealStage) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, stage)
    }

    /// Creates a deal with a caller-chosen id
    pub fn with_id(id: impl Into<String>, title: impl Into<String>, stage: DealStage) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            company: None,
            amount: 0,
            stage,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Moves the deal to another stage
    pub fn set_stage(&mut self, stage: DealStage) {
        if self.stage != stage {
            self.stage = stage;
            self.updated_at = Utc::now();
        }
    }
}

impl BoardItem for Deal {
    fn id(&self) -> &str {
        &self.id
    }
}
