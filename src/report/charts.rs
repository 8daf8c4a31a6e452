//! Chart catalog.
//!
//! A fixed table decides which metrics become charts, what kind they are,
//! and how many categories they may show. Metrics with no data produce no
//! spec at all (unlike the text report, which placeholders them).

use crate::analysis::metric;
use crate::models::{section, AnalysisBundle, ChartData, ChartKind, ChartSpec, Metric};

struct ChartDef {
    section: &'static str,
    metric: &'static str,
    kind: ChartKind,
    title: &'static str,
    x_label: &'static str,
    y_label: &'static str,
    /// None = unbounded (time series and pies).
    max_categories: Option<usize>,
}

const CHART_CATALOG: &[ChartDef] = &[
    ChartDef {
        section: section::SALES,
        metric: metric::SALES_BY_VEHICLE_ID,
        kind: ChartKind::Bar,
        title: "Top 10 Sales by Vehicle ID",
        x_label: "Vehicle ID",
        y_label: "Total Sales ($)",
        max_categories: Some(10),
    },
    ChartDef {
        section: section::SALES,
        metric: metric::SALES_BY_CHANNEL,
        kind: ChartKind::Bar,
        title: "Top 5 Sales by Channel",
        x_label: "Sales Channel",
        y_label: "Total Sales ($)",
        max_categories: Some(5),
    },
    ChartDef {
        section: section::SALES,
        metric: metric::SALES_OVER_TIME,
        kind: ChartKind::Line,
        title: "Monthly Sales Trend",
        x_label: "Month",
        y_label: "Total Sales ($)",
        max_categories: None,
    },
    ChartDef {
        section: section::SALES,
        metric: metric::NET_SALES_BY_LOCATION,
        kind: ChartKind::Bar,
        title: "Net Sales by Location (Sede)",
        x_label: "Location",
        y_label: "Net Sales ($)",
        max_categories: Some(5),
    },
    ChartDef {
        section: section::SALES,
        metric: metric::TOP_SELLING_MODELS,
        kind: ChartKind::HorizontalBar,
        title: "Top 5 Selling Models",
        x_label: "Sales Count",
        y_label: "Model",
        max_categories: Some(5),
    },
    ChartDef {
        section: section::SALES,
        metric: metric::SALES_COUNT_BY_CHANNEL,
        kind: ChartKind::Bar,
        title: "Top 5 Channels by Sales Count",
        x_label: "Sales Channel",
        y_label: "Sales Count",
        max_categories: Some(5),
    },
    ChartDef {
        section: section::SALES,
        metric: metric::CLIENT_SEGMENTS,
        kind: ChartKind::Pie,
        title: "Client Segments by Net Sales",
        x_label: "",
        y_label: "",
        max_categories: None,
    },
    ChartDef {
        section: section::INVENTORY,
        metric: metric::VEHICLES_BY_BRAND,
        kind: ChartKind::Bar,
        title: "Top 10 Vehicles by Brand",
        x_label: "Brand",
        y_label: "Number of Vehicles",
        max_categories: Some(10),
    },
    ChartDef {
        section: section::INVENTORY,
        metric: metric::VEHICLES_BY_TYPE,
        kind: ChartKind::Bar,
        title: "Top 5 Vehicles by Type",
        x_label: "Vehicle Type",
        y_label: "Number of Vehicles",
        max_categories: Some(5),
    },
    ChartDef {
        section: section::NEW_REGISTRATIONS,
        metric: metric::REGISTRATIONS_OVER_TIME,
        kind: ChartKind::Line,
        title: "New Registrations Over Time (Monthly)",
        x_label: "Month",
        y_label: "Registrations",
        max_categories: None,
    },
];

/// Build the ordered chart specs for a bundle. Deterministic: the same
/// bundle always yields the same specs in catalog order.
pub fn chart_specs(bundle: &AnalysisBundle) -> Vec<ChartSpec> {
    CHART_CATALOG
        .iter()
        .filter_map(|def| {
            let result = bundle.section(def.section)?;
            let data = match result.get(def.metric)? {
                Metric::Grouped(series) if !series.is_empty() => {
                    let cap = def.max_categories.unwrap_or(series.len());
                    ChartData::Categories(series.top(cap).to_vec())
                }
                Metric::Series(series) if !series.is_empty() => {
                    ChartData::Monthly(series.points.clone())
                }
                _ => return None,
            };
            Some(ChartSpec {
                metric: def.metric.to_string(),
                kind: def.kind,
                title: def.title.to_string(),
                x_label: def.x_label.to_string(),
                y_label: def.y_label.to_string(),
                max_categories: def.max_categories,
                data,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateResult, GroupedSeries, MonthBucket, TimeSeries};

    fn grouped(entries: &[(&str, f64)]) -> Metric {
        Metric::Grouped(GroupedSeries {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        })
    }

    fn test_bundle() -> AnalysisBundle {
        let mut sales = AggregateResult::default();
        sales.insert(metric::TOTAL_SALES, Metric::Scalar(100.0));
        sales.insert(
            metric::SALES_BY_VEHICLE_ID,
            grouped(&[
                ("V-01", 50.0),
                ("V-02", 40.0),
                ("V-03", 30.0),
                ("V-04", 20.0),
                ("V-05", 15.0),
                ("V-06", 14.0),
                ("V-07", 13.0),
                ("V-08", 12.0),
                ("V-09", 11.0),
                ("V-10", 10.0),
                ("V-11", 9.0),
            ]),
        );
        sales.insert(metric::SALES_BY_CHANNEL, grouped(&[("Web", 60.0)]));
        sales.insert(metric::SALES_BY_LOCATION, Metric::Grouped(GroupedSeries::default()));
        sales.insert(
            metric::SALES_OVER_TIME,
            Metric::Series(TimeSeries {
                points: vec![
                    (MonthBucket::new(2024, 1), 40.0),
                    (MonthBucket::new(2024, 2), 60.0),
                ],
            }),
        );

        let mut bundle = AnalysisBundle::default();
        bundle.push(section::SALES, sales);
        bundle
    }

    #[test]
    fn test_specs_follow_catalog_order_and_skip_empty() {
        let specs = chart_specs(&test_bundle());
        let metrics: Vec<&str> = specs.iter().map(|s| s.metric.as_str()).collect();

        // Empty location grouping and absent inventory produce no specs.
        assert_eq!(
            metrics,
            vec![
                metric::SALES_BY_VEHICLE_ID,
                metric::SALES_BY_CHANNEL,
                metric::SALES_OVER_TIME,
            ]
        );
    }

    #[test]
    fn test_category_cap_applied() {
        let specs = chart_specs(&test_bundle());
        let by_vehicle = &specs[0];
        assert_eq!(by_vehicle.kind, ChartKind::Bar);
        // 11 entries, capped at 10.
        assert_eq!(by_vehicle.data.len(), 10);

        let over_time = &specs[2];
        assert_eq!(over_time.kind, ChartKind::Line);
        assert_eq!(over_time.max_categories, None);
        assert_eq!(over_time.data.len(), 2);
    }

    #[test]
    fn test_chart_specs_idempotent() {
        let bundle = test_bundle();
        assert_eq!(chart_specs(&bundle), chart_specs(&bundle));
    }

    #[test]
    fn test_empty_bundle_produces_no_specs() {
        assert!(chart_specs(&AnalysisBundle::default()).is_empty());
    }
}
