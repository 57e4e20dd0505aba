//! SVG chart rendering.
//!
//! Every chart is drawn on a fixed 1200x800 canvas with [`plotters`]' SVG backend, which needs no
//! system fonts or native libraries and therefore works in headless CI. Categorical axes are
//! plain `f64` axes with category `i` centred on `i`; a label formatter maps integer ticks back to
//! category names.

use emr_pivot::{FiveNumberSummary, HistogramBin, PivotGrid};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 800;
const FONT: &str = "sans-serif";
const BAR_COLOR: RGBColor = RGBColor(68, 119, 170);
const BOX_COLOR: RGBColor = RGBColor(146, 197, 222);

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to draw chart: {0}")]
    Drawing(String),

    #[error("invalid chart data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, RenderError>;

fn draw_err<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError::Drawing(err.to_string())
}

#[derive(Clone, Debug, PartialEq)]
pub enum Chart {
    Bar(BarChart),
    GroupedBar(GroupedBarChart),
    Histogram(HistogramChart),
    BoxPlot(BoxPlotChart),
    Heatmap(HeatmapChart),
}

/// One bar per category. Horizontal charts list the first category at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    pub horizontal: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// One cluster of bars per group, one bar per series within the cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedBarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub groups: Vec<String>,
    pub series: Vec<Series>,
    pub horizontal: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistogramChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bins: Vec<HistogramBin>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxPlotChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub boxes: Vec<FiveNumberSummary>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeatPalette {
    Blues,
    Oranges,
    YellowOrangeRed,
}

impl HeatPalette {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            HeatPalette::Blues => &[(247, 251, 255), (107, 174, 214), (8, 48, 107)],
            HeatPalette::Oranges => &[(255, 245, 235), (253, 141, 60), (127, 39, 4)],
            HeatPalette::YellowOrangeRed => &[(255, 255, 204), (253, 141, 60), (128, 0, 38)],
        }
    }

    /// Color for `t` in `[0, 1]`, interpolated linearly between the palette stops.
    fn color(self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (stops.len() - 1) as f64;
        let idx = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - idx as f64;
        let (a, b) = (stops[idx], stops[idx + 1]);
        let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
    }
}

/// Annotated matrix; row 0 is drawn at the top.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub grid: PivotGrid<f64>,
    /// Decimals of the cell annotations.
    pub decimals: usize,
    pub palette: HeatPalette,
    /// Caption of the color scale; no scale is drawn when `None`.
    pub scale_label: Option<String>,
}

impl Chart {
    pub fn title(&self) -> &str {
        match self {
            Chart::Bar(c) => &c.title,
            Chart::GroupedBar(c) => &c.title,
            Chart::Histogram(c) => &c.title,
            Chart::BoxPlot(c) => &c.title,
            Chart::Heatmap(c) => &c.title,
        }
    }
}

/// Render `chart` into an SVG document.
pub fn render_svg(chart: &Chart) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        match chart {
            Chart::Bar(c) => draw_bar(&root, c)?,
            Chart::GroupedBar(c) => draw_grouped_bar(&root, c)?,
            Chart::Histogram(c) => draw_histogram(&root, c)?,
            Chart::BoxPlot(c) => draw_box_plot(&root, c)?,
            Chart::Heatmap(c) => draw_heatmap(&root, c)?,
        }
        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}

/// Label of the category centred on `v`, or an empty string between categories.
fn category_label(categories: &[String], v: f64, reversed: bool) -> String {
    let r = v.round();
    if (v - r).abs() > 1e-6 || r < 0.0 {
        return String::new();
    }
    let i = r as usize;
    let idx = if reversed {
        match categories.len().checked_sub(i + 1) {
            Some(idx) => idx,
            None => return String::new(),
        }
    } else {
        i
    };
    categories.get(idx).cloned().unwrap_or_default()
}

fn category_range(n: usize) -> std::ops::Range<f64> {
    -0.5..(n as f64 - 0.5)
}

/// Upper bound of a value axis: the maximum plus 10% headroom, never below 1.
fn value_axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
    (max * 1.1).max(1.0)
}

/// Width of a label area that fits the longest category name.
fn label_area_size(labels: &[String]) -> u32 {
    let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    (longest as u32 * 9 + 20).clamp(60, 320)
}

fn ensure_categories(kind: &str, n: usize) -> Result<()> {
    if n == 0 {
        return Err(RenderError::InvalidData(format!("{kind} has no categories")));
    }
    Ok(())
}

fn draw_bar(root: &Area<'_>, c: &BarChart) -> Result<()> {
    let n = c.categories.len();
    ensure_categories("bar chart", n)?;
    if c.values.len() != n {
        return Err(RenderError::InvalidData(format!(
            "{} categories but {} values",
            n,
            c.values.len()
        )));
    }
    let max = value_axis_max(c.values.iter().copied());

    if c.horizontal {
        let label = |v: &f64| category_label(&c.categories, *v, true);
        let mut chart = ChartBuilder::on(root)
            .caption(&c.title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(label_area_size(&c.categories))
            .build_cartesian_2d(0f64..max, category_range(n))
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n + 1)
            .y_label_formatter(&label)
            .x_desc(c.x_label.as_str())
            .y_desc(c.y_label.as_str())
            .draw()
            .map_err(draw_err)?;
        chart
            .draw_series(c.values.iter().enumerate().map(|(i, v)| {
                let y = (n - 1 - i) as f64;
                Rectangle::new([(0.0, y - 0.4), (*v, y + 0.4)], BAR_COLOR.filled())
            }))
            .map_err(draw_err)?;
    } else {
        let label = |v: &f64| category_label(&c.categories, *v, false);
        let mut chart = ChartBuilder::on(root)
            .caption(&c.title, (FONT, 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d(category_range(n), 0f64..max)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n + 1)
            .x_label_formatter(&label)
            .x_desc(c.x_label.as_str())
            .y_desc(c.y_label.as_str())
            .draw()
            .map_err(draw_err)?;
        chart
            .draw_series(c.values.iter().enumerate().map(|(i, v)| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], BAR_COLOR.filled())
            }))
            .map_err(draw_err)?;
    }
    Ok(())
}

fn draw_grouped_bar(root: &Area<'_>, c: &GroupedBarChart) -> Result<()> {
    let n = c.groups.len();
    ensure_categories("grouped bar chart", n)?;
    if c.series.is_empty() {
        return Err(RenderError::InvalidData("grouped bar chart has no series".into()));
    }
    if let Some(s) = c.series.iter().find(|s| s.values.len() != n) {
        return Err(RenderError::InvalidData(format!(
            "series {} has {} values for {} groups",
            s.name,
            s.values.len(),
            n
        )));
    }

    let max = value_axis_max(c.series.iter().flat_map(|s| s.values.iter().copied()));
    let k = c.series.len();
    let slot = 0.8 / k as f64;
    // Offset of series `j`'s bar within its cluster, relative to the cluster centre.
    let span = |j: usize| (-0.4 + slot * j as f64, -0.4 + slot * (j + 1) as f64);

    if c.horizontal {
        let label = |v: &f64| category_label(&c.groups, *v, true);
        let mut chart = ChartBuilder::on(root)
            .caption(&c.title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(label_area_size(&c.groups))
            .build_cartesian_2d(0f64..max, category_range(n))
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n + 1)
            .y_label_formatter(&label)
            .x_desc(c.x_label.as_str())
            .y_desc(c.y_label.as_str())
            .draw()
            .map_err(draw_err)?;

        for (j, series) in c.series.iter().enumerate() {
            let color = Palette99::pick(j).to_rgba();
            let (lo, hi) = span(j);
            chart
                .draw_series(series.values.iter().enumerate().map(|(i, v)| {
                    let y = (n - 1 - i) as f64;
                    // Mirror the slot so the first series sits on top of its cluster.
                    Rectangle::new([(0.0, y - hi), (*v, y - lo)], color.filled())
                }))
                .map_err(draw_err)?
                .label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;
    } else {
        let label = |v: &f64| category_label(&c.groups, *v, false);
        let mut chart = ChartBuilder::on(root)
            .caption(&c.title, (FONT, 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d(category_range(n), 0f64..max)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n + 1)
            .x_label_formatter(&label)
            .x_desc(c.x_label.as_str())
            .y_desc(c.y_label.as_str())
            .draw()
            .map_err(draw_err)?;

        for (j, series) in c.series.iter().enumerate() {
            let color = Palette99::pick(j).to_rgba();
            let (lo, hi) = span(j);
            chart
                .draw_series(series.values.iter().enumerate().map(|(i, v)| {
                    let x = i as f64;
                    Rectangle::new([(x + lo, 0.0), (x + hi, *v)], color.filled())
                }))
                .map_err(draw_err)?
                .label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;
    }
    Ok(())
}

fn draw_histogram(root: &Area<'_>, c: &HistogramChart) -> Result<()> {
    let (Some(first), Some(last)) = (c.bins.first(), c.bins.last()) else {
        return Err(RenderError::InvalidData("histogram has no bins".into()));
    };
    let max = value_axis_max(c.bins.iter().map(|b| b.count as f64));

    let mut chart = ChartBuilder::on(root)
        .caption(&c.title, (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(first.start..last.end, 0f64..max)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(c.x_label.as_str())
        .y_desc(c.y_label.as_str())
        .draw()
        .map_err(draw_err)?;
    chart
        .draw_series(c.bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BAR_COLOR.filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(c.bins.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], WHITE.stroke_width(1))
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_box_plot(root: &Area<'_>, c: &BoxPlotChart) -> Result<()> {
    let n = c.boxes.len();
    ensure_categories("box plot", n)?;
    let names: Vec<String> = c.boxes.iter().map(|b| b.group.clone()).collect();

    let lo = c
        .boxes
        .iter()
        .flat_map(|b| std::iter::once(b.whisker_low).chain(b.outliers.iter().copied()))
        .fold(f64::INFINITY, f64::min);
    let hi = c
        .boxes
        .iter()
        .flat_map(|b| std::iter::once(b.whisker_high).chain(b.outliers.iter().copied()))
        .fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.05).max(1.0);

    let label = |v: &f64| category_label(&names, *v, false);
    let mut chart = ChartBuilder::on(root)
        .caption(&c.title, (FONT, 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(category_range(n), (lo - pad)..(hi + pad))
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n + 1)
        .x_label_formatter(&label)
        .x_desc(c.x_label.as_str())
        .y_desc(c.y_label.as_str())
        .draw()
        .map_err(draw_err)?;

    chart
        .draw_series(c.boxes.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], BOX_COLOR.filled())
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(c.boxes.iter().enumerate().map(|(i, b)| {
            let x = i as f64;
            Rectangle::new([(x - 0.3, b.q1), (x + 0.3, b.q3)], BLACK.stroke_width(1))
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(c.boxes.iter().enumerate().flat_map(|(i, b)| {
            let x = i as f64;
            [
                // Median.
                PathElement::new(vec![(x - 0.3, b.median), (x + 0.3, b.median)], BLACK.stroke_width(2)),
                // Whiskers and caps.
                PathElement::new(vec![(x, b.q3), (x, b.whisker_high)], BLACK.stroke_width(1)),
                PathElement::new(vec![(x, b.q1), (x, b.whisker_low)], BLACK.stroke_width(1)),
                PathElement::new(
                    vec![(x - 0.15, b.whisker_high), (x + 0.15, b.whisker_high)],
                    BLACK.stroke_width(1),
                ),
                PathElement::new(
                    vec![(x - 0.15, b.whisker_low), (x + 0.15, b.whisker_low)],
                    BLACK.stroke_width(1),
                ),
            ]
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(c.boxes.iter().enumerate().flat_map(|(i, b)| {
            let x = i as f64;
            b.outliers
                .iter()
                .map(move |v| Circle::new((x, *v), 3, BLACK.stroke_width(1)))
        }))
        .map_err(draw_err)?;
    Ok(())
}

fn draw_heatmap(root: &Area<'_>, c: &HeatmapChart) -> Result<()> {
    let (rows, cols) = c.grid.shape();
    ensure_categories("heatmap rows", rows)?;
    ensure_categories("heatmap columns", cols)?;

    let row_names: Vec<String> = c.grid.row_labels().iter().map(|k| k.to_string()).collect();
    let col_names: Vec<String> = c.grid.col_labels().iter().map(|k| k.to_string()).collect();
    let max = c
        .grid
        .max_value()
        .filter(|m| m.is_finite() && *m > 0.0)
        .unwrap_or(1.0);

    let (main, scale) = if c.scale_label.is_some() {
        let (main, scale) = root.split_horizontally(WIDTH - 150);
        (main, Some(scale))
    } else {
        (root.clone(), None)
    };

    let x_label = |v: &f64| category_label(&col_names, *v, false);
    let y_label = |v: &f64| category_label(&row_names, *v, true);
    let mut chart = ChartBuilder::on(&main)
        .caption(&c.title, (FONT, 28))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(label_area_size(&row_names))
        .build_cartesian_2d(category_range(cols), category_range(rows))
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols + 1)
        .y_labels(rows + 1)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc(c.x_label.as_str())
        .y_desc(c.y_label.as_str())
        .draw()
        .map_err(draw_err)?;

    let mut cells = Vec::with_capacity(rows * cols);
    for (r, (_, values)) in c.grid.rows().enumerate() {
        let y = (rows - 1 - r) as f64;
        for (col, value) in values.iter().enumerate() {
            cells.push((col as f64, y, *value));
        }
    }

    chart
        .draw_series(cells.iter().map(|(x, y, v)| {
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                c.palette.color(v / max).filled(),
            )
        }))
        .map_err(draw_err)?;
    chart
        .draw_series(cells.iter().map(|(x, y, v)| {
            let text_color = if v / max > 0.6 { &WHITE } else { &BLACK };
            let style = TextStyle::from((FONT, 16).into_font())
                .pos(Pos::new(HPos::Center, VPos::Center))
                .color(text_color);
            Text::new(format!("{:.*}", c.decimals, v), (*x, *y), style)
        }))
        .map_err(draw_err)?;

    if let (Some(scale), Some(scale_label)) = (scale, c.scale_label.as_deref()) {
        draw_color_scale(&scale, c.palette, max, scale_label)?;
    }
    Ok(())
}

fn draw_color_scale(area: &Area<'_>, palette: HeatPalette, max: f64, label: &str) -> Result<()> {
    const STEPS: usize = 50;
    let mut chart = ChartBuilder::on(area)
        .margin_top(70)
        .margin_bottom(80)
        .margin_right(10)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..1f64, 0f64..max)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(label)
        .draw()
        .map_err(draw_err)?;
    let step = max / STEPS as f64;
    chart
        .draw_series((0..STEPS).map(|i| {
            let lo = step * i as f64;
            let t = (i as f64 + 0.5) / STEPS as f64;
            Rectangle::new([(0.0, lo), (1.0, lo + step)], palette.color(t).filled())
        }))
        .map_err(draw_err)?;
    Ok(())
}
