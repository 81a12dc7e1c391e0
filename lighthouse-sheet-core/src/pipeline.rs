//! One-shot reporting pipeline: parse, read repository state, compose, append.

use chrono::NaiveDateTime;

use crate::error::{ParseError, PublishError};
use crate::report::parse;
use crate::repo::{RepositoryQueries, read_repository_state};
use crate::row::{Row, compose, header_row};
use crate::sheet::{AppendOutcome, SheetAppender, SheetClient, SheetTarget};

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    /// The data row that was appended.
    pub row: Row,
    /// Whether the header was written as well.
    pub append: AppendOutcome,
}

/// Parse a report and compose its row without touching any sheet.
pub fn prepare_row<Q: RepositoryQueries + ?Sized>(
    raw_report: &[u8],
    queries: &Q,
    project: &str,
    timestamp: NaiveDateTime,
) -> Result<Row, ParseError> {
    let report = parse(raw_report)?;
    let repo = read_repository_state(queries);
    Ok(compose(&report, &repo, project, timestamp))
}

/// Run the full pipeline and append one row to `target`.
pub fn publish<Q, C>(
    raw_report: &[u8],
    queries: &Q,
    client: C,
    target: &SheetTarget,
    project: &str,
    timestamp: NaiveDateTime,
) -> Result<PublishOutcome, PublishError>
where
    Q: RepositoryQueries + ?Sized,
    C: SheetClient,
{
    let row = prepare_row(raw_report, queries, project, timestamp)?;
    let append = SheetAppender::new(client).append_row(target, &header_row(), &row)?;
    Ok(PublishOutcome { row, append })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppendStage, RepoQueryError, SinkError};
    use crate::repo::{MockRepositoryQueries, RepoQuery};
    use crate::row::Cell;
    use crate::sheet::{MemorySheet, MockSheetClient};
    use chrono::NaiveDate;

    fn report_bytes() -> Vec<u8> {
        let audit = |value: f64, score: f64| serde_json::json!({"numericValue": value, "score": score});
        serde_json::to_vec(&serde_json::json!({
            "categories": {"performance": {"score": 0.87}},
            "audits": {
                "largest-contentful-paint": audit(2400.0, 0.9),
                "cumulative-layout-shift": audit(0.01, 1.0),
                "total-blocking-time": audit(200.0, 0.9),
                "first-contentful-paint": audit(900.0, 0.99),
                "first-meaningful-paint": audit(950.0, 0.99),
                "speed-index": audit(1800.0, 0.95),
                "server-response-time": audit(90.0, 1.0),
                "interactive": audit(3100.0, 0.93)
            }
        }))
        .expect("encode report")
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(10, 0, 0))
            .expect("valid timestamp")
    }

    fn failing_queries() -> MockRepositoryQueries {
        let mut queries = MockRepositoryQueries::new();
        queries
            .expect_commit_id()
            .returning(|| Err(RepoQueryError::new(RepoQuery::CommitId, "not a repo")));
        queries
            .expect_last_commit_message()
            .returning(|| Err(RepoQueryError::new(RepoQuery::Message, "not a repo")));
        queries
            .expect_branch()
            .returning(|| Err(RepoQueryError::new(RepoQuery::Branch, "not a repo")));
        queries
            .expect_tags()
            .returning(|| Err(RepoQueryError::new(RepoQuery::Tags, "not a repo")));
        queries
            .expect_has_uncommitted_changes()
            .returning(|| Err(RepoQueryError::new(RepoQuery::UncommittedChanges, "not a repo")));
        queries
    }

    #[test]
    fn publish_survives_repository_failures() {
        let sheet = MemorySheet::new();
        let target = SheetTarget::new("sheet-123", "Runs");

        let outcome = publish(
            &report_bytes(),
            &failing_queries(),
            &sheet,
            &target,
            "demo",
            timestamp(),
        )
        .expect("publish");

        assert_eq!(outcome.append, AppendOutcome::HeaderAndRow);
        assert_eq!(outcome.row[2], Cell::text(""));
        assert_eq!(outcome.row[6], Cell::text("N"));
        assert_eq!(sheet.rows(&target), vec![header_row(), outcome.row]);
    }

    #[test]
    fn publish_stops_on_parse_failure() {
        let mut client = MockSheetClient::new();
        client.expect_read_range().times(0);
        client.expect_append_rows().times(0);

        let err = publish(
            b"not json",
            &failing_queries(),
            client,
            &SheetTarget::new("sheet-123", "Runs"),
            "demo",
            timestamp(),
        )
        .unwrap_err();
        assert!(matches!(err, PublishError::Parse(ParseError::Malformed(_))));
    }

    #[test]
    fn publish_surfaces_append_failure() {
        let mut client = MockSheetClient::new();
        client
            .expect_read_range()
            .returning(|_, _| Err(SinkError::new("sheets request failed: timed out")));

        let err = publish(
            &report_bytes(),
            &failing_queries(),
            client,
            &SheetTarget::new("sheet-123", "Runs"),
            "demo",
            timestamp(),
        )
        .unwrap_err();
        match err {
            PublishError::Append(inner) => assert_eq!(inner.stage(), AppendStage::Probe),
            PublishError::Parse(_) => panic!("expected Append variant"),
        }
    }

    #[test]
    fn prepare_row_composes_without_sheet() {
        let row = prepare_row(&report_bytes(), &failing_queries(), "demo", timestamp())
            .expect("prepare");
        assert_eq!(row[0], Cell::text("demo"));
        assert_eq!(row[7], Cell::Number(87.0));
    }
}
