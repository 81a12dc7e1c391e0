//! Row composition and the fixed column schema.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::report::{MetricKey, PerformanceReport};
use crate::repo::RepositoryState;

/// Column keys, in the order every row is written.
pub const COLUMNS: [&str; 21] = [
    "project",
    "timestamp",
    "branch",
    "commit_message",
    "tags",
    "commit_id",
    "uncommitted_changes",
    "performance_score",
    "lcp_score",
    "cls_score",
    "tbt_score",
    "fcp_score",
    "si_score",
    "lcp_value",
    "cls_value",
    "tbt_value",
    "fcp_value",
    "fmp_value",
    "si_value",
    "ttfb_value",
    "tti_value",
];

/// `strftime` pattern for the timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCORED_METRICS: [MetricKey; 5] = [
    MetricKey::Lcp,
    MetricKey::Cls,
    MetricKey::Tbt,
    MetricKey::Fcp,
    MetricKey::Si,
];

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Literal text.
    Text(String),
    /// Numeric value.
    Number(f64),
}

impl Cell {
    /// Build a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            Cell::Number(_) => None,
        }
    }

    /// Numeric content, if this is a number cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(_) => None,
        }
    }

    /// True for empty text.
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(value) if value.is_empty())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(value) => write!(f, "{value}"),
            Cell::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Ordered cells appended to the sheet as one row.
pub type Row = Vec<Cell>;

/// Header row naming every column.
pub fn header_row() -> Row {
    COLUMNS.iter().map(|column| Cell::text(*column)).collect()
}

/// Compose the data row for one run.
pub fn compose(
    report: &PerformanceReport,
    repo: &RepositoryState,
    project: &str,
    timestamp: NaiveDateTime,
) -> Row {
    let mut row = Vec::with_capacity(COLUMNS.len());
    row.push(Cell::text(project));
    row.push(Cell::text(timestamp.format(TIMESTAMP_FORMAT).to_string()));
    row.push(Cell::text(repo.branch.as_str()));
    row.push(Cell::text(repo.message.as_str()));
    row.push(Cell::text(repo.tags.join(", ")));
    row.push(Cell::text(repo.commit_id.as_str()));
    row.push(Cell::text(if repo.has_uncommitted_changes {
        "Y"
    } else {
        "N"
    }));

    row.push(Cell::Number(report.overall_score() * 100.0));
    for key in SCORED_METRICS {
        row.push(Cell::Number(report.metric(key).score * 100.0));
    }
    for (_, sample) in report.metrics() {
        row.push(Cell::Number(sample.value));
    }
    row
}

/// Position of a column key in [`COLUMNS`].
pub fn column_index(column: &str) -> Option<usize> {
    COLUMNS.iter().position(|candidate| *candidate == column)
}
