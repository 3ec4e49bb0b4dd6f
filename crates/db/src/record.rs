//! Production record model, status lifecycle and order lookup keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle label of a production record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductionStatus {
    Pending,
    New,
    Preparing,
    InProgress,
    Done,
    Error,
    Cancelled,
}

impl ProductionStatus {
    pub const ALL: [ProductionStatus; 7] = [
        ProductionStatus::Pending,
        ProductionStatus::New,
        ProductionStatus::Preparing,
        ProductionStatus::InProgress,
        ProductionStatus::Done,
        ProductionStatus::Error,
        ProductionStatus::Cancelled,
    ];

    /// Stored representation.
    pub const fn code(self) -> &'static str {
        match self {
            ProductionStatus::Pending => "PENDING",
            ProductionStatus::New => "NEW",
            ProductionStatus::Preparing => "PREPARING",
            ProductionStatus::InProgress => "IN_PROGRESS",
            ProductionStatus::Done => "DONE",
            ProductionStatus::Error => "ERROR",
            ProductionStatus::Cancelled => "CANCELLED",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ProductionStatus::Pending => "Awaiting processing",
            ProductionStatus::New => "Production created",
            ProductionStatus::Preparing => "Being prepared",
            ProductionStatus::InProgress => "In progress",
            ProductionStatus::Done => "Completed",
            ProductionStatus::Error => "Production failed",
            ProductionStatus::Cancelled => "Cancelled",
        }
    }

    /// Terminal states.
    pub const fn is_completed(self) -> bool {
        matches!(
            self,
            ProductionStatus::Done | ProductionStatus::Error | ProductionStatus::Cancelled
        )
    }

    pub fn can_transition_to(self, next: ProductionStatus) -> bool {
        use ProductionStatus::*;

        match self {
            Pending => matches!(next, New | Preparing | Cancelled),
            New => matches!(next, Preparing | Cancelled),
            Preparing => matches!(next, InProgress | Error | Cancelled),
            InProgress => matches!(next, Done | Error | Cancelled),
            Done | Error | Cancelled => false,
        }
    }
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid production status '{0}'")]
pub struct ParseStatusError(pub String);

impl FromStr for ProductionStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ProductionStatus::ALL
            .into_iter()
            .find(|status| status.code().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseStatusError(value.to_string()))
    }
}

/// A unit of work tracked by order identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    pub order_id: i64,
    pub product_ids: Vec<i64>,
    pub status: ProductionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lookup key for the `orderId` field.
///
/// Records always store the identifier as an integer, so a `Text` key never
/// matches one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderKey {
    Int(i64),
    Text(String),
}

impl OrderKey {
    pub fn matches(&self, order_id: i64) -> bool {
        match self {
            OrderKey::Int(key) => *key == order_id,
            OrderKey::Text(_) => false,
        }
    }
}

impl From<i64> for OrderKey {
    fn from(value: i64) -> Self {
        OrderKey::Int(value)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKey::Int(key) => write!(f, "{key}"),
            OrderKey::Text(key) => write!(f, "\"{key}\""),
        }
    }
}
