//! Text report rendering.
//!
//! Builds the flat, multi-section business report. Every metric renders a
//! line even when it has no data, so the document structure is identical
//! run to run.

use crate::analysis::metric;
use crate::models::{section, AggregateResult, AnalysisBundle, GroupedSeries, Metric, TimeSeries};

/// Grouped metrics show at most this many entries in the text report.
const TEXT_TOP_N: usize = 5;

/// Render the full text document for the bundle.
pub fn render_text(bundle: &AnalysisBundle) -> String {
    let mut out = String::new();

    out.push_str("Comprehensive Business Analysis Report\n");
    out.push_str("=======================================\n\n");

    if let Some(sales) = bundle.section(section::SALES) {
        out.push_str(&sales_section(sales));
    }
    if let Some(inventory) = bundle.section(section::INVENTORY) {
        out.push_str(&inventory_section(inventory));
    }
    if let Some(registrations) = bundle.section(section::NEW_REGISTRATIONS) {
        out.push_str(&registrations_section(registrations));
    }

    out
}

fn currency(value: f64) -> String {
    format!("${:.2}", value)
}

fn sales_section(result: &AggregateResult) -> String {
    let mut out = String::new();

    out.push_str("--- Sales Overview (VENTAS) ---\n");
    out.push_str(&format!(
        "Total Sales: {}\n",
        currency(result.scalar(metric::TOTAL_SALES))
    ));
    out.push_str(&format!(
        "Average Sale per Transaction: {}\n",
        currency(result.scalar(metric::AVERAGE_SALE))
    ));
    out.push_str(&format!(
        "Total Number of Transactions: {}\n\n",
        result.count(metric::TOTAL_TRANSACTIONS)
    ));

    grouped_block(
        &mut out,
        "Top 5 Sales by Vehicle ID:",
        &result.grouped(metric::SALES_BY_VEHICLE_ID),
        "No sales by vehicle ID data available.",
        |key, value| format!("- Vehicle ID {}: {}", key, currency(value)),
    );
    grouped_block(
        &mut out,
        "Top 5 Sales by Channel:",
        &result.grouped(metric::SALES_BY_CHANNEL),
        "No sales by channel data available.",
        |key, value| format!("- {}: {}", key, currency(value)),
    );
    grouped_block(
        &mut out,
        "Top 5 Sales by Location (Sede):",
        &result.grouped(metric::SALES_BY_LOCATION),
        "No sales by location data available.",
        |key, value| format!("- {}: {}", key, currency(value)),
    );
    grouped_block(
        &mut out,
        "Top 5 Sales by Salesperson (Vendedor):",
        &result.grouped(metric::SALES_BY_SALESPERSON),
        "No sales by salesperson data available.",
        |key, value| format!("- {}: {}", key, currency(value)),
    );

    match result.get(metric::TOTAL_PROFIT) {
        Some(Metric::Scalar(profit)) => {
            out.push_str(&format!("Total Estimated Profit: {}\n\n", currency(*profit)));
        }
        _ => out.push_str("Total estimated profit not available.\n\n"),
    }

    series_block(
        &mut out,
        "Sales Over Time (Monthly):",
        &result.series(metric::SALES_OVER_TIME),
        "No sales over time data available.",
        |month, value| format!("- {}: {}", month, currency(value)),
    );

    out.push('\n');
    out
}

fn inventory_section(result: &AggregateResult) -> String {
    let mut out = String::new();

    out.push_str("--- Vehicle Inventory Overview (VEHICULOS) ---\n");
    out.push_str(&format!(
        "Total Vehicles in Inventory: {}\n\n",
        result.count(metric::TOTAL_VEHICLES)
    ));

    grouped_block(
        &mut out,
        "Top 5 Vehicles by Brand:",
        &result.grouped(metric::VEHICLES_BY_BRAND),
        "No vehicle by brand data available.",
        units_line,
    );
    grouped_block(
        &mut out,
        "Top 5 Vehicles by Model:",
        &result.grouped(metric::VEHICLES_BY_MODEL),
        "No vehicle by model data available.",
        units_line,
    );
    grouped_block(
        &mut out,
        "Vehicles by Type:",
        &result.grouped(metric::VEHICLES_BY_TYPE),
        "No vehicle by type data available.",
        units_line,
    );
    grouped_block(
        &mut out,
        "Vehicles by Year:",
        &result.grouped(metric::VEHICLES_BY_YEAR),
        "No vehicle by year data available.",
        units_line,
    );

    out.push('\n');
    out
}

fn registrations_section(result: &AggregateResult) -> String {
    let mut out = String::new();

    out.push_str("--- New Registrations Overview (NUEVOS REGISTROS) ---\n");
    out.push_str(&format!(
        "Total New Registrations: {}\n\n",
        result.count(metric::TOTAL_NEW_REGISTRATIONS)
    ));

    series_block(
        &mut out,
        "New Registrations Over Time (Monthly):",
        &result.series(metric::REGISTRATIONS_OVER_TIME),
        "No registrations over time data available.",
        |month, value| format!("- {}: {} registrations", month, value as u64),
    );

    out.push('\n');
    out
}

fn units_line(key: &str, value: f64) -> String {
    format!("- {}: {} units", key, value as u64)
}

/// One labeled block for a grouped metric; empty metrics get an explicit
/// "no data" line instead of being omitted.
fn grouped_block(
    out: &mut String,
    heading: &str,
    series: &GroupedSeries,
    empty_line: &str,
    format_entry: impl Fn(&str, f64) -> String,
) {
    if series.is_empty() {
        out.push_str(empty_line);
        out.push('\n');
    } else {
        out.push_str(heading);
        out.push('\n');
        for (key, value) in series.top(TEXT_TOP_N) {
            out.push_str(&format_entry(key, *value));
            out.push('\n');
        }
    }
    out.push('\n');
}

fn series_block(
    out: &mut String,
    heading: &str,
    series: &TimeSeries,
    empty_line: &str,
    format_entry: impl Fn(&crate::models::MonthBucket, f64) -> String,
) {
    if series.is_empty() {
        out.push_str(empty_line);
        out.push('\n');
    } else {
        out.push_str(heading);
        out.push('\n');
        for (month, value) in &series.points {
            out.push_str(&format_entry(month, *value));
            out.push('\n');
        }
    }
    out.push('\n');
}
