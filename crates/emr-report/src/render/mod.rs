//! Presentation layer: SVG charts via [`plotters`] and CSV tables via [`csv`].

mod chart;
mod table;

pub use chart::{
    render_svg, BarChart, BoxPlotChart, Chart, GroupedBarChart, HeatPalette, HeatmapChart,
    HistogramChart, RenderError, Series,
};
pub use table::{format_fixed, format_percent, to_csv_bytes};
