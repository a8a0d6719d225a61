//! Distribution charts over the reference table.
//!
//! `render` is a pure function: the same table, highlight and columns always
//! give the same `Figure`. Frontends draw the figure however they like (the
//! CLI prints text histograms, the TUI uses braille charts). `ChartMemo`
//! keeps the last figure so redraws do not recompute it.

use std::sync::Arc;

use serde::Serialize;

use crate::table::{IndexColumn, WoodTable};

/// Fixed subplot grid.
pub const GRID_ROWS: usize = 3;
pub const GRID_COLS: usize = 2;
pub const MAX_SUBPLOTS: usize = GRID_ROWS * GRID_COLS;

/// Histogram bin count per subplot.
pub const BIN_COUNT: usize = 10;

/// Number of points sampled along the density curve.
const DENSITY_SAMPLES: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

impl Bin {
    pub fn mid(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subplot {
    pub column: IndexColumn,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bins: Vec<Bin>,
    /// Kernel density estimate scaled to the frequency axis, `(x, y)` pairs.
    pub density: Vec<(f64, f64)>,
    /// Value of the highlighted row, if it exists and has a value.
    pub marker: Option<f64>,
}

impl Subplot {
    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    /// `[lo, hi]` covered by the bins.
    pub fn x_bounds(&self) -> Option<(f64, f64)> {
        Some((self.bins.first()?.lo, self.bins.last()?.hi))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub rows: usize,
    pub cols: usize,
    pub highlight: String,
    pub subplots: Vec<Subplot>,
}

impl Figure {
    /// Subplot at grid cell `(row, col)`, row-major like the layout.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Subplot> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.subplots.get(row * self.cols + col)
    }
}

/// Render one histogram-with-density subplot per column in a 3x2 grid.
///
/// A `highlight` that names no row simply produces no markers.
pub fn render(table: &WoodTable, highlight: &str, columns: &[IndexColumn]) -> Figure {
    if columns.len() > MAX_SUBPLOTS {
        log::warn!(
            "chart grid holds {} subplots, dropping {} column(s)",
            MAX_SUBPLOTS,
            columns.len() - MAX_SUBPLOTS
        );
    }
    let highlighted = table.find(highlight);

    let subplots = columns
        .iter()
        .take(MAX_SUBPLOTS)
        .map(|&column| {
            let values = table.column_values(column);
            let bins = histogram(&values, BIN_COUNT);
            let density = density_curve(&values, &bins);
            Subplot {
                column,
                title: column.header().to_string(),
                x_label: column.header().to_string(),
                y_label: "Frequency".to_string(),
                bins,
                density,
                marker: highlighted.and_then(|row| row.value(column)),
            }
        })
        .collect();

    Figure {
        rows: GRID_ROWS,
        cols: GRID_COLS,
        highlight: highlight.to_string(),
        subplots,
    }
}

/// Equal-width bins over the observed range. The last bin is closed on the
/// right so the maximum lands in it.
fn histogram(values: &[f64], bin_count: usize) -> Vec<Bin> {
    if values.is_empty() || bin_count == 0 {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi - lo <= f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bin_count as f64;

    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|i| Bin {
            lo: lo + width * i as f64,
            hi: if i + 1 == bin_count { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Gaussian KDE with Scott's rule bandwidth, scaled so the curve sits on
/// the count axis (density * n * bin width).
fn density_curve(values: &[f64], bins: &[Bin]) -> Vec<(f64, f64)> {
    let n = values.len();
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Vec::new();
    };
    if n < 2 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();
    if std_dev <= f64::EPSILON {
        return Vec::new();
    }
    let bandwidth = std_dev * (n as f64).powf(-0.2);
    let bin_width = first.hi - first.lo;
    let scale = n as f64 * bin_width;
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bandwidth * n as f64);

    let (lo, hi) = (first.lo, last.hi);
    let step = (hi - lo) / (DENSITY_SAMPLES - 1) as f64;
    (0..DENSITY_SAMPLES)
        .map(|i| {
            let x = lo + step * i as f64;
            let pdf: f64 = values
                .iter()
                .map(|v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            (x, pdf * scale)
        })
        .collect()
}

/// Keeps the most recently rendered figure.
///
/// Keyed by table identity (pointer, not contents), highlight and columns.
#[derive(Debug, Default)]
pub struct ChartMemo {
    entry: Option<MemoEntry>,
}

#[derive(Debug)]
struct MemoEntry {
    table: Arc<WoodTable>,
    highlight: String,
    columns: Vec<IndexColumn>,
    figure: Arc<Figure>,
}

impl ChartMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_render(
        &mut self,
        table: &Arc<WoodTable>,
        highlight: &str,
        columns: &[IndexColumn],
    ) -> Arc<Figure> {
        if let Some(entry) = &self.entry {
            if Arc::ptr_eq(&entry.table, table)
                && entry.highlight == highlight
                && entry.columns == columns
            {
                return Arc::clone(&entry.figure);
            }
        }
        let figure = Arc::new(render(table, highlight, columns));
        self.entry = Some(MemoEntry {
            table: Arc::clone(table),
            highlight: highlight.to_string(),
            columns: columns.to_vec(),
            figure: Arc::clone(&figure),
        });
        figure
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
