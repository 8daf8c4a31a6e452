//! Chart image rendering.
//!
//! Draws one [`ChartSpec`] to a PNG file with plotters. The renderer is
//! intentionally dumb: all selection, ordering, and truncation decisions
//! were already made when the spec was built.

use crate::models::{ChartData, ChartKind, ChartSpec, MonthBucket};
use anyhow::{bail, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const CHART_WIDTH: u32 = 1000;
const CHART_HEIGHT: u32 = 620;

const BAR_COLOR: RGBColor = RGBColor(70, 130, 180);
const LINE_COLOR: RGBColor = RGBColor(21, 101, 192);

const PIE_PALETTE: &[RGBColor] = &[
    RGBColor(70, 130, 180),
    RGBColor(255, 160, 64),
    RGBColor(96, 170, 96),
    RGBColor(205, 92, 92),
    RGBColor(147, 112, 219),
    RGBColor(189, 154, 122),
    RGBColor(100, 181, 205),
    RGBColor(240, 200, 80),
];

/// Render one chart spec to `path`.
pub fn render_chart(spec: &ChartSpec, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    match (&spec.kind, &spec.data) {
        (ChartKind::Bar, ChartData::Categories(entries)) => draw_bars(&root, spec, entries)?,
        (ChartKind::HorizontalBar, ChartData::Categories(entries)) => {
            draw_horizontal_bars(&root, spec, entries)?
        }
        (ChartKind::Pie, ChartData::Categories(entries)) => draw_pie(&root, spec, entries)?,
        (ChartKind::Line, ChartData::Monthly(points)) => draw_line(&root, spec, points)?,
        _ => bail!(
            "chart data shape does not match kind for metric '{}'",
            spec.metric
        ),
    }

    root.present()
        .with_context(|| format!("failed to write chart image: {}", path.display()))?;
    Ok(())
}

/// Upper bound of the value axis with a little headroom.
fn value_axis_end(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn draw_bars(
    root: &DrawingArea<BitMapBackend, Shift>,
    spec: &ChartSpec,
    entries: &[(String, f64)],
) -> Result<()> {
    let count = entries.len() as i32;
    let y_end = value_axis_end(entries.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(0i32..count, 0f64..y_end)?;

    let label_for = |index: &i32| -> String {
        entries
            .get(*index as usize)
            .map(|(key, _)| key.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(entries.len())
        .x_label_formatter(&label_for)
        .draw()?;

    chart.draw_series(entries.iter().enumerate().map(|(index, (_, value))| {
        Rectangle::new(
            [(index as i32, 0.0), (index as i32 + 1, *value)],
            BAR_COLOR.filled(),
        )
    }))?;

    Ok(())
}

fn draw_horizontal_bars(
    root: &DrawingArea<BitMapBackend, Shift>,
    spec: &ChartSpec,
    entries: &[(String, f64)],
) -> Result<()> {
    let count = entries.len() as i32;
    let x_end = value_axis_end(entries.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(60)
        .y_label_area_size(150)
        .build_cartesian_2d(0f64..x_end, 0i32..count)?;

    let label_for = |index: &i32| -> String {
        entries
            .get(*index as usize)
            .map(|(key, _)| key.clone())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .y_labels(entries.len())
        .y_label_formatter(&label_for)
        .draw()?;

    chart.draw_series(entries.iter().enumerate().map(|(index, (_, value))| {
        Rectangle::new(
            [(0.0, index as i32), (*value, index as i32 + 1)],
            BAR_COLOR.filled(),
        )
    }))?;

    Ok(())
}

fn draw_line(
    root: &DrawingArea<BitMapBackend, Shift>,
    spec: &ChartSpec,
    points: &[(MonthBucket, f64)],
) -> Result<()> {
    let count = points.len() as i32;
    let y_end = value_axis_end(points.iter().map(|(_, v)| *v));

    let mut chart = ChartBuilder::on(root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(12)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(0i32..count.max(1), 0f64..y_end)?;

    let label_for = |index: &i32| -> String {
        points
            .get(*index as usize)
            .map(|(month, _)| month.to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .x_labels(points.len())
        .x_label_formatter(&label_for)
        .draw()?;

    let series: Vec<(i32, f64)> = points
        .iter()
        .enumerate()
        .map(|(index, (_, value))| (index as i32, *value))
        .collect();

    chart.draw_series(LineSeries::new(series.clone(), &LINE_COLOR))?;
    chart.draw_series(
        series
            .iter()
            .map(|point| Circle::new(*point, 4, LINE_COLOR.filled())),
    )?;

    Ok(())
}

fn draw_pie(
    root: &DrawingArea<BitMapBackend, Shift>,
    spec: &ChartSpec,
    entries: &[(String, f64)],
) -> Result<()> {
    let total: f64 = entries.iter().map(|(_, value)| value.max(0.0)).sum();
    if total <= 0.0 {
        bail!("pie chart for '{}' has no positive values", spec.metric);
    }

    let area = root.titled(&spec.title, ("sans-serif", 28))?;

    let sizes: Vec<f64> = entries.iter().map(|(_, value)| value.max(0.0)).collect();
    let labels: Vec<String> = entries
        .iter()
        .map(|(key, value)| format!("{} ({:.1}%)", key, 100.0 * value.max(0.0) / total))
        .collect();
    let colors: Vec<RGBColor> = (0..entries.len())
        .map(|index| PIE_PALETTE[index % PIE_PALETTE.len()])
        .collect();

    let center = (CHART_WIDTH as i32 / 2, CHART_HEIGHT as i32 / 2);
    let radius = f64::from(CHART_HEIGHT) * 0.33;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    area.draw(&pie)?;

    Ok(())
}
