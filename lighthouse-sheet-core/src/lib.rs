#![deny(missing_docs)]
//! Lighthouse sheet core library.
//!
//! This crate turns a Lighthouse report plus repository metadata into a
//! single spreadsheet row and appends it to an append-only sheet, writing the
//! header row the first time a sheet is used.

pub mod error;
pub mod pipeline;
pub mod report;
pub mod repo;
pub mod row;
pub mod sheet;

pub use error::{AppendError, AppendStage, ParseError, PublishError, RepoQueryError, SinkError};
pub use pipeline::{PublishOutcome, prepare_row, publish};
pub use report::{
    MetricKey, MetricSample, PerformanceReport, parse, parse_file, read_report,
};
pub use repo::{
    GitCommandReader, RepoQuery, RepositoryQueries, RepositoryState, read_repository_state,
};
pub use row::{COLUMNS, Cell, Row, TIMESTAMP_FORMAT, column_index, compose, header_row};
pub use sheet::{
    AppendOutcome, MemorySheet, PROBE_COLUMNS, SheetAppender, SheetClient, SheetTarget,
    column_letter, range_ref,
};
