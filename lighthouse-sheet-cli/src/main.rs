#![deny(missing_docs)]
//! Lighthouse sheet command-line interface.
//!
//! Reads a Lighthouse report, collects the current commit metadata, and
//! appends one row to a Google Sheet, writing the header row first when the
//! sheet is empty.

mod auth;
mod config;
mod sheets;
#[cfg(test)]
mod test_support;

use auth::{ServiceAccount, fetch_access_token};
use chrono::{NaiveDateTime, Utc};
use config::{Mode, PublishSettings, Settings};
use lighthouse_sheet_core::{
    Cell, GitCommandReader, PROBE_COLUMNS, Row, header_row, prepare_row, publish, read_report,
};
use log::info;
use reqwest::blocking::Client;
use serde::Serialize;
use sheets::SheetsApiClient;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const USER_AGENT: &str = concat!("lighthouse-sheet/", env!("CARGO_PKG_VERSION"));

#[cfg(not(test))]
fn main() {
    use clap::Parser;

    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = config::Cli::parse();
    let result = config::resolve(cli)
        .and_then(|settings| run(&settings, chrono::Local::now().naive_local()));
    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
fn main() {}

#[derive(Debug, Serialize)]
struct PreviewCell<'a> {
    column: &'a str,
    value: &'a Cell,
}

fn run(settings: &Settings, timestamp: NaiveDateTime) -> CliResult<()> {
    info!("lighthouse-result: {}", settings.report_path.display());
    info!("project: {}", settings.project);
    let repo = GitCommandReader::new(&settings.repo_dir);

    match &settings.mode {
        Mode::DryRun => {
            let raw = read_report(&settings.report_path)?;
            let row = prepare_row(&raw, &repo, &settings.project, timestamp)?;
            println!("{}", render_preview(&header_row(), &row)?);
        }
        Mode::Publish(publish_settings) => {
            run_publish(settings, publish_settings, &repo, timestamp)?;
        }
    }
    Ok(())
}

fn run_publish(
    settings: &Settings,
    publish_settings: &PublishSettings,
    repo: &GitCommandReader,
    timestamp: NaiveDateTime,
) -> CliResult<()> {
    let target = &publish_settings.target;
    info!("spreadsheet-id: {}", target.spreadsheet_id);
    info!("sheet-name: {}", target.sheet_name);

    let http = Client::builder().user_agent(USER_AGENT).build()?;
    let account = ServiceAccount::load(&publish_settings.credentials)?;
    info!("authenticating as {}", account.client_email());
    let token = fetch_access_token(&http, &account, Utc::now().timestamp())?;
    let sheets = SheetsApiClient::new(http, &publish_settings.sheets_api_url, token);

    let raw = read_report(&settings.report_path)?;
    let outcome = publish(&raw, repo, &sheets, target, &settings.project, timestamp)?;
    let written = if outcome.append.header_written() { 2 } else { 1 };
    info!(
        "appended {written} row(s) for {} to {}",
        settings.project,
        target.range(PROBE_COLUMNS)
    );
    Ok(())
}

fn render_preview(header: &Row, row: &Row) -> serde_json::Result<String> {
    let cells: Vec<PreviewCell<'_>> = header
        .iter()
        .zip(row)
        .map(|(column, value)| PreviewCell {
            column: column.as_text().unwrap_or_default(),
            value,
        })
        .collect();
    serde_json::to_string_pretty(&cells)
}
