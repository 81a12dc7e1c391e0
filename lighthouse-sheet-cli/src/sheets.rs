//! Google Sheets REST transport.

use lighthouse_sheet_core::{Cell, Row, SheetClient, SheetTarget, SinkError};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default Sheets API base URL.
pub(crate) const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

/// Sheet client backed by the Sheets v4 values API.
#[derive(Debug, Clone)]
pub(crate) struct SheetsApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SheetsApiClient {
    /// Build a client that authenticates with a bearer `token`.
    pub(crate) fn new(client: Client, base_url: &str, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn values_url(&self, target: &SheetTarget, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&target.spreadsheet_id),
            urlencoding::encode(range)
        )
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: &'a [Row],
}

impl SheetClient for SheetsApiClient {
    fn read_range(&self, target: &SheetTarget, range: &str) -> Result<Vec<Row>, SinkError> {
        let response = self
            .client
            .get(self.values_url(target, range))
            .query(&[("valueRenderOption", "UNFORMATTED_VALUE")])
            .bearer_auth(&self.token)
            .send()
            .map_err(|err| SinkError::new(format!("sheets request failed: {err}")))?;
        let body: ValueRange = check_status(response)?
            .json()
            .map_err(|err| SinkError::new(format!("sheets response decode failed: {err}")))?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_from_json).collect())
            .collect())
    }

    fn append_rows(
        &self,
        target: &SheetTarget,
        range: &str,
        rows: &[Row],
    ) -> Result<(), SinkError> {
        let response = self
            .client
            .post(format!("{}:append", self.values_url(target, range)))
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(&self.token)
            .json(&AppendBody { values: rows })
            .send()
            .map_err(|err| SinkError::new(format!("sheets request failed: {err}")))?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(SinkError::new(format!("sheets api error ({status}): {body}")))
}

fn cell_from_json(value: Value) -> Cell {
    match value {
        Value::String(text) => Cell::Text(text),
        Value::Number(number) => number
            .as_f64()
            .map(Cell::Number)
            .unwrap_or_else(|| Cell::Text(number.to_string())),
        Value::Bool(flag) => Cell::text(if flag { "TRUE" } else { "FALSE" }),
        Value::Null => Cell::text(""),
        other => Cell::Text(other.to_string()),
    }
}
