//! Lighthouse report decoding.

use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::error::ParseError;

/// Metrics extracted from every report, in sheet column order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKey {
    /// Largest Contentful Paint (ms).
    Lcp,
    /// Cumulative Layout Shift (unitless).
    Cls,
    /// Total Blocking Time (ms).
    Tbt,
    /// First Contentful Paint (ms).
    Fcp,
    /// First Meaningful Paint (ms).
    Fmp,
    /// Speed Index (ms).
    Si,
    /// Time To First Byte, reported as server response time (ms).
    Ttfb,
    /// Time To Interactive (ms).
    Tti,
}

impl MetricKey {
    /// Every metric key, in sheet column order.
    pub const ALL: [MetricKey; 8] = [
        MetricKey::Lcp,
        MetricKey::Cls,
        MetricKey::Tbt,
        MetricKey::Fcp,
        MetricKey::Fmp,
        MetricKey::Si,
        MetricKey::Ttfb,
        MetricKey::Tti,
    ];

    /// Lighthouse audit id that carries this metric.
    pub fn audit_id(&self) -> &'static str {
        match self {
            MetricKey::Lcp => "largest-contentful-paint",
            MetricKey::Cls => "cumulative-layout-shift",
            MetricKey::Tbt => "total-blocking-time",
            MetricKey::Fcp => "first-contentful-paint",
            MetricKey::Fmp => "first-meaningful-paint",
            MetricKey::Si => "speed-index",
            MetricKey::Ttfb => "server-response-time",
            MetricKey::Tti => "interactive",
        }
    }

    /// Lowercase short name used in column keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Lcp => "lcp",
            MetricKey::Cls => "cls",
            MetricKey::Tbt => "tbt",
            MetricKey::Fcp => "fcp",
            MetricKey::Fmp => "fmp",
            MetricKey::Si => "si",
            MetricKey::Ttfb => "ttfb",
            MetricKey::Tti => "tti",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Raw value and sub-score of a single metric.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MetricSample {
    /// Value in the metric's natural unit.
    pub value: f64,
    /// Normalized score in `[0, 1]`.
    pub score: f64,
}

/// Performance data decoded from one Lighthouse report.
///
/// Every [`MetricKey`] has a sample; a report missing any of them never
/// parses.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    overall_score: f64,
    samples: [MetricSample; 8],
}

impl PerformanceReport {
    /// Build a report from the overall score and one sample per metric, in
    /// [`MetricKey::ALL`] order.
    pub fn new(overall_score: f64, samples: [MetricSample; 8]) -> Self {
        Self {
            overall_score,
            samples,
        }
    }

    /// Return a copy with one metric replaced.
    pub fn with_metric(mut self, key: MetricKey, sample: MetricSample) -> Self {
        self.samples[key.index()] = sample;
        self
    }

    /// Performance category score in `[0, 1]`.
    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    /// Sample for a metric.
    pub fn metric(&self, key: MetricKey) -> MetricSample {
        self.samples[key.index()]
    }

    /// Iterate samples in column order.
    pub fn metrics(&self) -> impl Iterator<Item = (MetricKey, MetricSample)> + '_ {
        MetricKey::ALL
            .iter()
            .map(move |key| (*key, self.samples[key.index()]))
    }
}

/// Decode a Lighthouse JSON report.
pub fn parse(raw: &[u8]) -> Result<PerformanceReport, ParseError> {
    let document: Value = serde_json::from_slice(raw).map_err(ParseError::Malformed)?;
    let overall_score = read_score(&document, &["categories", "performance", "score"])?;

    let mut samples = [MetricSample::default(); 8];
    for key in MetricKey::ALL {
        let audit = key.audit_id();
        samples[key.index()] = MetricSample {
            value: read_number(&document, &["audits", audit, "numericValue"])?,
            score: read_score(&document, &["audits", audit, "score"])?,
        };
    }

    Ok(PerformanceReport::new(overall_score, samples))
}

/// Read a report file from disk.
pub fn read_report(path: &Path) -> Result<Vec<u8>, ParseError> {
    std::fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and decode a report file.
pub fn parse_file(path: &Path) -> Result<PerformanceReport, ParseError> {
    parse(&read_report(path)?)
}

fn read_number(document: &Value, path: &[&str]) -> Result<f64, ParseError> {
    let mut current = document;
    for segment in path {
        current = current
            .get(*segment)
            .ok_or_else(|| ParseError::MissingField {
                path: path.join("."),
            })?;
    }
    if current.is_null() {
        return Err(ParseError::MissingField {
            path: path.join("."),
        });
    }
    current.as_f64().ok_or_else(|| ParseError::NotANumber {
        path: path.join("."),
    })
}

fn read_score(document: &Value, path: &[&str]) -> Result<f64, ParseError> {
    let score = read_number(document, path)?;
    if !(0.0..=1.0).contains(&score) {
        return Err(ParseError::ScoreOutOfRange {
            path: path.join("."),
            value: score,
        });
    }
    Ok(score)
}
