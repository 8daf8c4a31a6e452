//! Data models for the report pipeline.
//!
//! This module contains the core data structures shared between the
//! aggregator, the formatter, and the delivery layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Canonical section names of the analysis bundle.
pub mod section {
    pub const SALES: &str = "sales";
    pub const INVENTORY: &str = "inventory";
    pub const NEW_REGISTRATIONS: &str = "new_registrations";
}

/// A calendar month bucket used by time-series metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthBucket {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl MonthBucket {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl From<chrono::NaiveDate> for MonthBucket {
    fn from(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// An ordered group-key -> value mapping, already sorted by the
/// aggregation policy (value-descending or key-descending).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedSeries {
    pub entries: Vec<(String, f64)>,
}

impl GroupedSeries {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The first `n` entries (the series is already sorted).
    pub fn top(&self, n: usize) -> &[(String, f64)] {
        &self.entries[..self.entries.len().min(n)]
    }
}

/// A chronologically ordered monthly series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub points: Vec<(MonthBucket, f64)>,
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A single named summary statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// A scalar value (sum or mean).
    Scalar(f64),
    /// A row or frequency count.
    Count(u64),
    /// A sorted group-by result.
    Grouped(GroupedSeries),
    /// A monthly time series.
    Series(TimeSeries),
    /// Sentinel: the metric could not be computed (distinct from zero).
    Unavailable,
}

impl Metric {
    /// True when the metric carries no renderable data points.
    pub fn is_empty(&self) -> bool {
        match self {
            Metric::Grouped(series) => series.is_empty(),
            Metric::Series(series) => series.is_empty(),
            Metric::Unavailable => true,
            _ => false,
        }
    }

    pub fn as_grouped(&self) -> Option<&GroupedSeries> {
        match self {
            Metric::Grouped(series) => Some(series),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&TimeSeries> {
        match self {
            Metric::Series(series) => Some(series),
            _ => None,
        }
    }
}

/// The named summary statistics of one record table, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateResult {
    pub metrics: Vec<(String, Metric)>,
}

impl AggregateResult {
    pub fn insert(&mut self, name: &str, metric: Metric) {
        self.metrics.push((name.to_string(), metric));
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics
            .iter()
            .find(|(metric_name, _)| metric_name == name)
            .map(|(_, metric)| metric)
    }

    /// Grouped series for `name`, or an empty series when the metric is
    /// missing or of another shape.
    pub fn grouped(&self, name: &str) -> GroupedSeries {
        self.get(name)
            .and_then(Metric::as_grouped)
            .cloned()
            .unwrap_or_default()
    }

    /// Time series for `name`, or an empty series.
    pub fn series(&self, name: &str) -> TimeSeries {
        self.get(name)
            .and_then(Metric::as_series)
            .cloned()
            .unwrap_or_default()
    }

    /// Scalar value for `name`, defaulting to zero.
    pub fn scalar(&self, name: &str) -> f64 {
        match self.get(name) {
            Some(Metric::Scalar(value)) => *value,
            Some(Metric::Count(value)) => *value as f64,
            _ => 0.0,
        }
    }

    /// Count value for `name`, defaulting to zero.
    pub fn count(&self, name: &str) -> u64 {
        match self.get(name) {
            Some(Metric::Count(value)) => *value,
            _ => 0,
        }
    }
}

/// The complete set of aggregate results for one run.
///
/// Built once by the aggregator and read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub sections: Vec<(String, AggregateResult)>,
}

impl AnalysisBundle {
    pub fn push(&mut self, name: &str, result: AggregateResult) {
        self.sections.push((name.to_string(), result));
    }

    pub fn section(&self, name: &str) -> Option<&AggregateResult> {
        self.sections
            .iter()
            .find(|(section_name, _)| section_name == name)
            .map(|(_, result)| result)
    }

    /// True when every section was omitted; the run aborts in this case.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Kind of chart to render for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Pie,
}

/// The data carried by one chart spec, already truncated to the
/// catalog's category cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChartData {
    Categories(Vec<(String, f64)>),
    Monthly(Vec<(MonthBucket, f64)>),
}

impl ChartData {
    pub fn len(&self) -> usize {
        match self {
            ChartData::Categories(entries) => entries.len(),
            ChartData::Monthly(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Description of one renderable chart image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Metric name this chart visualizes (used for file naming and captions).
    pub metric: String,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Category cap applied when the spec was built (None = unbounded).
    pub max_categories: Option<usize>,
    pub data: ChartData,
}

impl ChartSpec {
    /// Output file name for this chart, e.g. `report_chart_sales_by_channel.png`.
    pub fn file_name(&self, base_name: &str, extension: &str) -> String {
        format!("{}_{}{}", base_name, self.metric, extension)
    }
}

/// An artifact written to the output directory.
#[derive(Debug, Clone)]
pub enum ReportArtifact {
    /// The text report document.
    Text { path: PathBuf },
    /// A chart image, tagged with the metric it visualizes.
    Chart { metric: String, path: PathBuf },
}

impl ReportArtifact {
    pub fn path(&self) -> &Path {
        match self {
            ReportArtifact::Text { path } => path,
            ReportArtifact::Chart { path, .. } => path,
        }
    }

    /// The artifact's file name, used to build its public URL.
    pub fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Outcome of the best-effort delivery phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Number of sends attempted.
    pub attempted: usize,
    /// Number of sends confirmed by the channel.
    pub delivered: usize,
    /// Number of sends that failed.
    pub failed: usize,
}

impl DeliveryOutcome {
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.delivered += 1;
    }

    pub fn record_failure(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }

    /// Some sends succeeded and some failed.
    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.delivered > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bucket_format() {
        assert_eq!(MonthBucket::new(2024, 3).to_string(), "2024-03");
        assert_eq!(MonthBucket::new(2023, 12).to_string(), "2023-12");
    }

    #[test]
    fn test_month_bucket_ordering() {
        assert!(MonthBucket::new(2023, 12) < MonthBucket::new(2024, 1));
        assert!(MonthBucket::new(2024, 1) < MonthBucket::new(2024, 2));
    }

    #[test]
    fn test_grouped_series_top() {
        let series = GroupedSeries {
            entries: vec![
                ("a".to_string(), 3.0),
                ("b".to_string(), 2.0),
                ("c".to_string(), 1.0),
            ],
        };
        assert_eq!(series.top(2).len(), 2);
        assert_eq!(series.top(10).len(), 3);
    }

    #[test]
    fn test_metric_emptiness() {
        assert!(Metric::Unavailable.is_empty());
        assert!(Metric::Grouped(GroupedSeries::default()).is_empty());
        assert!(!Metric::Scalar(0.0).is_empty());
        assert!(!Metric::Count(0).is_empty());
    }

    #[test]
    fn test_aggregate_result_lookup() {
        let mut result = AggregateResult::default();
        result.insert("total", Metric::Scalar(12.5));
        result.insert("rows", Metric::Count(4));

        assert_eq!(result.scalar("total"), 12.5);
        assert_eq!(result.count("rows"), 4);
        assert_eq!(result.scalar("missing"), 0.0);
        assert!(result.get("missing").is_none());
    }

    #[test]
    fn test_chart_spec_file_name() {
        let spec = ChartSpec {
            metric: "sales_by_channel".to_string(),
            kind: ChartKind::Bar,
            title: "t".to_string(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            max_categories: Some(5),
            data: ChartData::Categories(Vec::new()),
        };
        assert_eq!(
            spec.file_name("report_chart", ".png"),
            "report_chart_sales_by_channel.png"
        );
    }

    #[test]
    fn test_delivery_outcome_partial() {
        let mut outcome = DeliveryOutcome::default();
        outcome.record_success();
        outcome.record_failure();
        assert_eq!(outcome.attempted, 2);
        assert!(outcome.is_partial());
    }
}
