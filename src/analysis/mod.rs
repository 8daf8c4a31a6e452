//! The aggregator.
//!
//! Turns the loaded record tables into an [`AnalysisBundle`] of named
//! summary statistics. A missing table, a missing column, or an
//! unparseable row is never an error here: the affected section or metric
//! is omitted, zeroed, or marked unavailable per policy, with a warning.

pub mod coerce;

use crate::models::{
    section, AggregateResult, AnalysisBundle, GroupedSeries, Metric, MonthBucket, TimeSeries,
};
use crate::source::RecordTable;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Column names as they appear in the source workbook.
pub mod columns {
    pub const PRICE: &str = "Precio Venta Real";
    pub const COST: &str = "Costo Vehículo";
    pub const VEHICLE_ID: &str = "ID_Vehículo";
    pub const CHANNEL: &str = "Canal";
    pub const LOCATION: &str = "Sede";
    pub const SALESPERSON: &str = "Vendedor";
    pub const DATE: &str = "Fecha";
    pub const SOLD_MODEL: &str = "Modelo";
    pub const NET_PRICE: &str = "Venta sin IGV";
    pub const CLIENT_SEGMENT: &str = "Segmento Cliente";
    pub const BRAND: &str = "MARCA";
    pub const MODEL: &str = "MODELO";
    pub const VEHICLE_TYPE: &str = "TIPO VEHICULO";
    pub const YEAR: &str = "AÑO";
}

/// Metric names, shared with the formatter and the caption table.
pub mod metric {
    pub const TOTAL_SALES: &str = "total_sales";
    pub const AVERAGE_SALE: &str = "average_sale";
    pub const TOTAL_TRANSACTIONS: &str = "total_transactions";
    pub const TOTAL_PROFIT: &str = "total_profit";
    pub const SALES_BY_VEHICLE_ID: &str = "sales_by_vehicle_id";
    pub const SALES_BY_CHANNEL: &str = "sales_by_channel";
    pub const SALES_BY_LOCATION: &str = "sales_by_location";
    pub const SALES_BY_SALESPERSON: &str = "sales_by_salesperson";
    pub const NET_SALES_BY_LOCATION: &str = "net_sales_by_location";
    pub const SALES_COUNT_BY_CHANNEL: &str = "sales_count_by_channel";
    pub const TOP_SELLING_MODELS: &str = "top_selling_models";
    pub const CLIENT_SEGMENTS: &str = "client_segments";
    pub const SALES_OVER_TIME: &str = "sales_over_time";
    pub const TOTAL_VEHICLES: &str = "total_vehicles";
    pub const VEHICLES_BY_BRAND: &str = "vehicles_by_brand";
    pub const VEHICLES_BY_MODEL: &str = "vehicles_by_model";
    pub const VEHICLES_BY_TYPE: &str = "vehicles_by_type";
    pub const VEHICLES_BY_YEAR: &str = "vehicles_by_year";
    pub const TOTAL_NEW_REGISTRATIONS: &str = "total_new_registrations";
    pub const REGISTRATIONS_OVER_TIME: &str = "registrations_over_time";
}

/// How a grouped metric aggregates its rows.
#[derive(Debug, Clone, Copy)]
enum GroupAgg {
    /// Sum the named numeric column per group.
    SumColumn(&'static str),
    /// Count rows per group.
    CountRows,
}

/// Sort order of a grouped metric.
#[derive(Debug, Clone, Copy)]
enum GroupOrder {
    /// Descending by aggregate value; ties keep first-appearance order.
    ValueDescending,
    /// Descending by the group key itself (numeric when both keys parse).
    KeyDescending,
}

/// Declarative policy for one grouped metric: compute only when the
/// required columns exist, otherwise the result is empty.
struct GroupedMetricSpec {
    name: &'static str,
    group_column: &'static str,
    agg: GroupAgg,
    order: GroupOrder,
}

const SALES_GROUPED_METRICS: &[GroupedMetricSpec] = &[
    GroupedMetricSpec {
        name: metric::SALES_BY_VEHICLE_ID,
        group_column: columns::VEHICLE_ID,
        agg: GroupAgg::SumColumn(columns::PRICE),
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::SALES_BY_CHANNEL,
        group_column: columns::CHANNEL,
        agg: GroupAgg::SumColumn(columns::PRICE),
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::SALES_BY_LOCATION,
        group_column: columns::LOCATION,
        agg: GroupAgg::SumColumn(columns::PRICE),
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::SALES_BY_SALESPERSON,
        group_column: columns::SALESPERSON,
        agg: GroupAgg::SumColumn(columns::PRICE),
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::NET_SALES_BY_LOCATION,
        group_column: columns::LOCATION,
        agg: GroupAgg::SumColumn(columns::NET_PRICE),
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::SALES_COUNT_BY_CHANNEL,
        group_column: columns::CHANNEL,
        agg: GroupAgg::CountRows,
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::TOP_SELLING_MODELS,
        group_column: columns::SOLD_MODEL,
        agg: GroupAgg::CountRows,
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::CLIENT_SEGMENTS,
        group_column: columns::CLIENT_SEGMENT,
        agg: GroupAgg::SumColumn(columns::NET_PRICE),
        order: GroupOrder::ValueDescending,
    },
];

const INVENTORY_GROUPED_METRICS: &[GroupedMetricSpec] = &[
    GroupedMetricSpec {
        name: metric::VEHICLES_BY_BRAND,
        group_column: columns::BRAND,
        agg: GroupAgg::CountRows,
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::VEHICLES_BY_MODEL,
        group_column: columns::MODEL,
        agg: GroupAgg::CountRows,
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::VEHICLES_BY_TYPE,
        group_column: columns::VEHICLE_TYPE,
        agg: GroupAgg::CountRows,
        order: GroupOrder::ValueDescending,
    },
    GroupedMetricSpec {
        name: metric::VEHICLES_BY_YEAR,
        group_column: columns::YEAR,
        agg: GroupAgg::CountRows,
        // Most recent year first, not the biggest count.
        order: GroupOrder::KeyDescending,
    },
];

/// Compute the analysis bundle from the loaded tables.
///
/// A section is produced only for tables that are present and non-empty;
/// everything else is a warning and an omission.
pub fn compute(tables: &HashMap<String, RecordTable>) -> AnalysisBundle {
    let analyzers: [(&str, fn(&RecordTable) -> AggregateResult); 3] = [
        (section::SALES, analyze_sales),
        (section::INVENTORY, analyze_inventory),
        (section::NEW_REGISTRATIONS, analyze_registrations),
    ];

    let mut bundle = AnalysisBundle::default();
    for (name, analyze) in analyzers {
        match tables.get(name) {
            Some(table) if !table.is_empty() => {
                debug!("Analyzing '{}' ({} rows)", name, table.len());
                bundle.push(name, analyze(table));
            }
            _ => warn!("'{}' table missing or empty; skipping section", name),
        }
    }
    bundle
}

fn analyze_sales(table: &RecordTable) -> AggregateResult {
    let mut result = AggregateResult::default();

    // Basic scalars all hinge on the price column; without it they are
    // reported as zero, not as missing.
    match table.column_index(columns::PRICE) {
        Some(price_index) => {
            let mut total = 0.0;
            let mut numeric_rows = 0usize;
            for row in 0..table.len() {
                if let Some(price) = table.value(row, price_index).as_number() {
                    total += price;
                    numeric_rows += 1;
                }
            }
            let mean = if numeric_rows > 0 {
                total / numeric_rows as f64
            } else {
                0.0
            };
            result.insert(metric::TOTAL_SALES, Metric::Scalar(total));
            result.insert(metric::AVERAGE_SALE, Metric::Scalar(mean));
            result.insert(
                metric::TOTAL_TRANSACTIONS,
                Metric::Count(table.len() as u64),
            );
        }
        None => {
            warn!(
                "Column '{}' not found in sales table; basic sales metrics default to zero",
                columns::PRICE
            );
            result.insert(metric::TOTAL_SALES, Metric::Scalar(0.0));
            result.insert(metric::AVERAGE_SALE, Metric::Scalar(0.0));
            result.insert(metric::TOTAL_TRANSACTIONS, Metric::Count(0));
        }
    }

    for spec in SALES_GROUPED_METRICS {
        result.insert(spec.name, Metric::Grouped(grouped_metric(table, spec)));
    }

    result.insert(metric::TOTAL_PROFIT, profit_metric(table));

    result.insert(
        metric::SALES_OVER_TIME,
        Metric::Series(monthly_series(table, columns::DATE, Some(columns::PRICE))),
    );

    result
}

fn analyze_inventory(table: &RecordTable) -> AggregateResult {
    let mut result = AggregateResult::default();
    result.insert(metric::TOTAL_VEHICLES, Metric::Count(table.len() as u64));

    for spec in INVENTORY_GROUPED_METRICS {
        result.insert(spec.name, Metric::Grouped(grouped_metric(table, spec)));
    }

    result
}

fn analyze_registrations(table: &RecordTable) -> AggregateResult {
    let mut result = AggregateResult::default();
    result.insert(
        metric::TOTAL_NEW_REGISTRATIONS,
        Metric::Count(table.len() as u64),
    );
    result.insert(
        metric::REGISTRATIONS_OVER_TIME,
        Metric::Series(monthly_series(table, columns::DATE, None)),
    );
    result
}

/// Profit is price minus cost summed over rows, and `Unavailable` (never
/// zero) when either column is missing.
fn profit_metric(table: &RecordTable) -> Metric {
    let price_index = table.column_index(columns::PRICE);
    let cost_index = table.column_index(columns::COST);

    match (price_index, cost_index) {
        (Some(price_index), Some(cost_index)) => {
            let mut total = 0.0;
            for row in 0..table.len() {
                let price = table.value(row, price_index).as_number();
                let cost = table.value(row, cost_index).as_number();
                if let (Some(price), Some(cost)) = (price, cost) {
                    total += price - cost;
                }
            }
            Metric::Scalar(total)
        }
        _ => {
            warn!(
                "Columns '{}' and '{}' are both required for profit; reporting unavailable",
                columns::PRICE,
                columns::COST
            );
            Metric::Unavailable
        }
    }
}

/// Evaluate one declarative grouped-metric spec against a table.
fn grouped_metric(table: &RecordTable, spec: &GroupedMetricSpec) -> GroupedSeries {
    let Some(group_index) = table.column_index(spec.group_column) else {
        warn!(
            "Column '{}' not found in '{}' table; '{}' is empty",
            spec.group_column, table.name, spec.name
        );
        return GroupedSeries::default();
    };

    let value_index = match spec.agg {
        GroupAgg::SumColumn(column) => match table.column_index(column) {
            Some(index) => Some(index),
            None => {
                warn!(
                    "Column '{}' not found in '{}' table; '{}' is empty",
                    column, table.name, spec.name
                );
                return GroupedSeries::default();
            }
        },
        GroupAgg::CountRows => None,
    };

    // Accumulate in first-appearance order so the stable sort below keeps
    // tie order deterministic.
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<(String, f64)> = Vec::new();

    for row in 0..table.len() {
        let Some(key) = table.value(row, group_index).group_key() else {
            continue;
        };
        let amount = match value_index {
            Some(index) => match table.value(row, index).as_number() {
                Some(value) => value,
                None => continue,
            },
            None => 1.0,
        };
        match slots.get(&key) {
            Some(&slot) => entries[slot].1 += amount,
            None => {
                slots.insert(key.clone(), entries.len());
                entries.push((key, amount));
            }
        }
    }

    match spec.order {
        GroupOrder::ValueDescending => {
            // Vec::sort_by is stable.
            entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        }
        GroupOrder::KeyDescending => {
            entries.sort_by(|a, b| compare_keys_descending(&a.0, &b.0));
        }
    }

    GroupedSeries { entries }
}

fn compare_keys_descending(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        _ => b.cmp(a),
    }
}

/// Bucket a table by calendar month of `date_column`.
///
/// With a value column the bucket sums that column; without one it counts
/// rows. Rows whose date fails the permissive parse are dropped from the
/// series only.
fn monthly_series(
    table: &RecordTable,
    date_column: &str,
    value_column: Option<&str>,
) -> TimeSeries {
    let Some(coerced) = coerce::coerce_dates(table, date_column) else {
        warn!(
            "Column '{}' not found in '{}' table; skipping time series",
            date_column, table.name
        );
        return TimeSeries::default();
    };

    let value_index = match value_column {
        Some(column) => match table.column_index(column) {
            Some(index) => Some(index),
            None => {
                warn!(
                    "Column '{}' not found in '{}' table; skipping time series",
                    column, table.name
                );
                return TimeSeries::default();
            }
        },
        None => None,
    };

    if coerced.failed > 0 {
        warn!(
            "{} row(s) in '{}' had unparseable '{}' values and were dropped from the time series",
            coerced.failed, table.name, date_column
        );
    }
    if coerced.valid() == 0 {
        warn!(
            "No valid '{}' entries in '{}'; time series is empty",
            date_column, table.name
        );
        return TimeSeries::default();
    }

    let mut buckets: BTreeMap<MonthBucket, f64> = BTreeMap::new();
    for (row, date) in coerced.values.iter().enumerate() {
        let Some(date) = date else { continue };
        let amount = match value_index {
            Some(index) => match table.value(row, index).as_number() {
                Some(value) => value,
                None => continue,
            },
            None => 1.0,
        };
        *buckets.entry(MonthBucket::from(*date)).or_insert(0.0) += amount;
    }

    TimeSeries {
        points: buckets.into_iter().collect(),
    }
}
