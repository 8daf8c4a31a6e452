//! Report generation: the text document and the chart images.

pub mod charts;
pub mod render;
pub mod text;

pub use charts::chart_specs;
pub use text::render_text;

use crate::models::{AnalysisBundle, ChartSpec, ReportArtifact};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Write the rendered text document under `output_dir`, creating the
/// directory if needed.
pub fn write_text_report(
    content: &str,
    output_dir: &Path,
    file_name: &str,
) -> Result<ReportArtifact> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let path = output_dir.join(file_name);
    fs::write(&path, content)
        .with_context(|| format!("failed to write text report: {}", path.display()))?;

    info!(path = %path.display(), "text report written");
    Ok(ReportArtifact::Text { path })
}

/// Render every chart spec to a PNG under `output_dir`. A chart that fails
/// to render is logged and skipped; the rest still go out.
pub fn render_charts(
    specs: &[ChartSpec],
    output_dir: &Path,
    base_name: &str,
    extension: &str,
) -> Result<Vec<ReportArtifact>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;

    let mut artifacts = Vec::with_capacity(specs.len());
    for spec in specs {
        let path = output_dir.join(spec.file_name(base_name, extension));
        match render::render_chart(spec, &path) {
            Ok(()) => {
                info!(metric = %spec.metric, path = %path.display(), "chart rendered");
                artifacts.push(ReportArtifact::Chart {
                    metric: spec.metric.clone(),
                    path,
                });
            }
            Err(err) => {
                warn!(metric = %spec.metric, error = %err, "skipping chart that failed to render");
            }
        }
    }

    Ok(artifacts)
}

/// Dump the analysis bundle as pretty JSON, for inspection and scripting.
pub fn write_analysis_json(bundle: &AnalysisBundle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory: {}", parent.display())
            })?;
        }
    }

    let json = serde_json::to_string_pretty(bundle).context("failed to serialize analysis")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write analysis dump: {}", path.display()))?;

    info!(path = %path.display(), "analysis dump written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metric;
    use crate::models::{section, AggregateResult, Metric};
    use tempfile::tempdir;

    #[test]
    fn test_write_text_report_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("Reports");

        let artifact = write_text_report("hello\n", &nested, "Business_Report.txt").unwrap();
        assert_eq!(artifact.file_name(), "Business_Report.txt");
        let written = std::fs::read_to_string(artifact.path()).unwrap();
        assert_eq!(written, "hello\n");
    }

    #[test]
    fn test_write_analysis_json_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.json");

        let mut sales = AggregateResult::default();
        sales.insert(metric::TOTAL_SALES, Metric::Scalar(10.0));
        sales.insert(metric::TOTAL_PROFIT, Metric::Unavailable);
        let mut bundle = AnalysisBundle::default();
        bundle.push(section::SALES, sales);

        write_analysis_json(&bundle, &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed.to_string().contains("total_sales"));
    }

    #[test]
    fn test_render_charts_with_no_specs_is_empty() {
        let dir = tempdir().unwrap();
        let artifacts = render_charts(&[], dir.path(), "report_chart", ".png").unwrap();
        assert!(artifacts.is_empty());
    }
}
