//! Error types for the reporting pipeline.

use std::path::PathBuf;
use std::{error::Error, fmt, io};

use crate::repo::RepoQuery;

/// Failure to decode a Lighthouse report.
#[derive(Debug)]
pub enum ParseError {
    /// The report file could not be read.
    Io {
        /// Path of the report file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The document is not valid JSON.
    Malformed(serde_json::Error),
    /// A required field is absent or `null`.
    MissingField {
        /// Dotted path of the field.
        path: String,
    },
    /// A required field holds something other than a number.
    NotANumber {
        /// Dotted path of the field.
        path: String,
    },
    /// A score lies outside `[0, 1]`.
    ScoreOutOfRange {
        /// Dotted path of the field.
        path: String,
        /// Value found in the document.
        value: f64,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read report {}: {source}", path.display())
            }
            Self::Malformed(err) => write!(f, "report is not valid json: {err}"),
            Self::MissingField { path } => write!(f, "report field missing: {path}"),
            Self::NotANumber { path } => write!(f, "report field is not a number: {path}"),
            Self::ScoreOutOfRange { path, value } => {
                write!(f, "report score out of range [0, 1]: {path} = {value}")
            }
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

/// A single repository query that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoQueryError {
    query: RepoQuery,
    message: String,
}

impl RepoQueryError {
    /// Create an error for the given query.
    pub fn new(query: RepoQuery, message: impl Into<String>) -> Self {
        Self {
            query,
            message: message.into(),
        }
    }

    /// The query that failed.
    pub fn query(&self) -> RepoQuery {
        self.query
    }
}

impl fmt::Display for RepoQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to get {}: {}", self.query.as_str(), self.message)
    }
}

impl Error for RepoQueryError {}

/// Transport or authorization failure reported by a sheet client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Create a sink error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for SinkError {}

/// Step of the append sequence that failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppendStage {
    /// Reading column A to detect an empty sheet.
    Probe,
    /// Appending the header row.
    Header,
    /// Appending the data row.
    Data,
}

impl AppendStage {
    /// Human-readable stage label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppendStage::Probe => "sheet probe",
            AppendStage::Header => "header append",
            AppendStage::Data => "row append",
        }
    }
}

/// Failure while appending a row to a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendError {
    stage: AppendStage,
    source: SinkError,
}

impl AppendError {
    /// Wrap a sink error raised during `stage`.
    pub fn new(stage: AppendStage, source: SinkError) -> Self {
        Self { stage, source }
    }

    /// The step that failed.
    pub fn stage(&self) -> AppendStage {
        self.stage
    }
}

impl fmt::Display for AppendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage.as_str(), self.source)
    }
}

impl Error for AppendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Fatal failure of a pipeline run.
#[derive(Debug)]
pub enum PublishError {
    /// The report could not be parsed.
    Parse(ParseError),
    /// The row could not be appended.
    Append(AppendError),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Append(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PublishError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Append(err) => Some(err),
        }
    }
}

impl From<ParseError> for PublishError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<AppendError> for PublishError {
    fn from(value: AppendError) -> Self {
        Self::Append(value)
    }
}
