//! Append-only sheet access and header bootstrap.

use std::collections::BTreeMap;
use std::sync::Mutex;

use log::info;

use crate::error::{AppendError, AppendStage, SinkError};
use crate::row::{Cell, Row};

/// Column span read to decide whether a sheet is empty.
pub const PROBE_COLUMNS: &str = "A:A";

/// Destination spreadsheet and sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetTarget {
    /// Opaque spreadsheet id.
    pub spreadsheet_id: String,
    /// Name of the sheet within the spreadsheet.
    pub sheet_name: String,
}

impl SheetTarget {
    /// Create a target.
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// A1 range covering `columns` (for example `A:A`) on this sheet.
    pub fn range(&self, columns: &str) -> String {
        range_ref(&self.sheet_name, columns)
    }
}

/// Build an A1 range reference, quoting the sheet name when required.
pub fn range_ref(sheet_name: &str, columns: &str) -> String {
    let plain = !sheet_name.is_empty()
        && sheet_name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if plain {
        format!("{sheet_name}!{columns}")
    } else {
        format!("'{}'!{columns}", sheet_name.replace('\'', "''"))
    }
}

/// Column letter for a zero-based column index (`0` is `A`, `26` is `AA`).
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from(b'A' + offset as u8));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Transport to a range-addressed, append-only table.
#[cfg_attr(test, mockall::automock)]
pub trait SheetClient {
    /// Read the rows of `range`. An empty range yields no rows.
    fn read_range(&self, target: &SheetTarget, range: &str) -> Result<Vec<Row>, SinkError>;
    /// Append `rows` after the table found in `range`, inserting new rows and
    /// storing values literally.
    fn append_rows(&self, target: &SheetTarget, range: &str, rows: &[Row])
    -> Result<(), SinkError>;
}

impl<T: SheetClient + ?Sized> SheetClient for &T {
    fn read_range(&self, target: &SheetTarget, range: &str) -> Result<Vec<Row>, SinkError> {
        (**self).read_range(target, range)
    }

    fn append_rows(
        &self,
        target: &SheetTarget,
        range: &str,
        rows: &[Row],
    ) -> Result<(), SinkError> {
        (**self).append_rows(target, range, rows)
    }
}

/// What an append wrote.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The sheet was empty; header and data row were written.
    HeaderAndRow,
    /// The sheet already had content; only the data row was written.
    RowOnly,
}

impl AppendOutcome {
    /// Whether the header row was written.
    pub fn header_written(&self) -> bool {
        matches!(self, AppendOutcome::HeaderAndRow)
    }
}

/// Appends rows to a sheet, writing the header first when the sheet is empty.
///
/// The emptiness check and the header write are separate calls, so two
/// concurrent appenders on an empty sheet can both write a header.
#[derive(Debug, Clone)]
pub struct SheetAppender<C> {
    client: C,
}

impl<C: SheetClient> SheetAppender<C> {
    /// Create an appender over a sheet client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Probe column A, write `header` if it is empty, then append `row`.
    ///
    /// A header written before a failed data append stays in place.
    pub fn append_row(
        &self,
        target: &SheetTarget,
        header: &Row,
        row: &Row,
    ) -> Result<AppendOutcome, AppendError> {
        let range = target.range(PROBE_COLUMNS);
        let existing = self
            .client
            .read_range(target, &range)
            .map_err(|err| AppendError::new(AppendStage::Probe, err))?;

        let outcome = if existing.is_empty() {
            info!("{range} is empty; writing header row");
            self.client
                .append_rows(target, &range, std::slice::from_ref(header))
                .map_err(|err| AppendError::new(AppendStage::Header, err))?;
            AppendOutcome::HeaderAndRow
        } else {
            AppendOutcome::RowOnly
        };

        self.client
            .append_rows(target, &range, std::slice::from_ref(row))
            .map_err(|err| AppendError::new(AppendStage::Data, err))?;
        Ok(outcome)
    }
}

/// In-memory sheet store, keyed by spreadsheet id and sheet name.
#[derive(Debug, Default)]
pub struct MemorySheet {
    tabs: Mutex<BTreeMap<(String, String), Vec<Row>>>,
}

impl MemorySheet {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row of a sheet, full width.
    pub fn rows(&self, target: &SheetTarget) -> Vec<Row> {
        self.tabs
            .lock()
            .map(|tabs| tabs.get(&tab_key(target)).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl SheetClient for MemorySheet {
    fn read_range(&self, target: &SheetTarget, range: &str) -> Result<Vec<Row>, SinkError> {
        let (start, end) = column_span(range);
        let tabs = self
            .tabs
            .lock()
            .map_err(|_| SinkError::new("memory sheet lock poisoned"))?;
        let Some(rows) = tabs.get(&tab_key(target)) else {
            return Ok(Vec::new());
        };

        let mut projected: Vec<Row> = rows
            .iter()
            .map(|row| {
                let mut cells: Row = row
                    .iter()
                    .skip(start)
                    .take(end + 1 - start)
                    .cloned()
                    .collect();
                while cells.last().is_some_and(Cell::is_blank) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while projected.last().is_some_and(|row| row.is_empty()) {
            projected.pop();
        }
        Ok(projected)
    }

    fn append_rows(
        &self,
        target: &SheetTarget,
        _range: &str,
        rows: &[Row],
    ) -> Result<(), SinkError> {
        let mut tabs = self
            .tabs
            .lock()
            .map_err(|_| SinkError::new("memory sheet lock poisoned"))?;
        tabs.entry(tab_key(target))
            .or_default()
            .extend(rows.iter().cloned());
        Ok(())
    }
}

fn tab_key(target: &SheetTarget) -> (String, String) {
    (target.spreadsheet_id.clone(), target.sheet_name.clone())
}

// Zero-based inclusive column span of an A1 range such as `Runs!B:D`.
fn column_span(range: &str) -> (usize, usize) {
    let columns = range.rsplit_once('!').map(|(_, cols)| cols).unwrap_or(range);
    let (start, end) = columns.split_once(':').unwrap_or((columns, columns));
    let start = column_number(start);
    (start, column_number(end).max(start))
}

fn column_number(reference: &str) -> usize {
    reference
        .chars()
        .take_while(|ch| ch.is_ascii_alphabetic())
        .fold(0usize, |acc, ch| {
            acc * 26 + usize::from(ch.to_ascii_uppercase() as u8 - b'A') + 1
        })
        .saturating_sub(1)
}
