//! Plain-text rendering for one-shot commands (no raw mode, no colors).

use woodshu_engine::chart::{Figure, Subplot};
use woodshu_engine::table::{IndexColumn, ReferenceRow, NAME_COLUMN};

use crate::util;

/// Attribution shown wherever the reference data is displayed.
pub const DATA_CREDIT: &str =
    "All data credit belongs to wood-database.com. Please go support him - the resource is absolutely amazing!";

const NAME_WIDTH: usize = 20;
const VALUE_WIDTH: usize = 14;

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{:.0}", v),
        Some(v) => format!("{:.1}", v),
        None => "-".to_string(),
    }
}

/// Header, separator and one line per row.
pub fn reference_rows(rows: &[ReferenceRow]) -> Vec<String> {
    let mut header = util::pad_right(NAME_COLUMN, NAME_WIDTH);
    for column in IndexColumn::ALL {
        header.push(' ');
        header.push_str(&util::pad_right(column.header(), VALUE_WIDTH));
    }
    let mut lines = vec![
        header.trim_end().to_string(),
        "-".repeat(NAME_WIDTH + IndexColumn::ALL.len() * (VALUE_WIDTH + 1)),
    ];

    for row in rows {
        let mut line = util::pad_right(&row.common_name, NAME_WIDTH);
        for column in IndexColumn::ALL {
            line.push(' ');
            line.push_str(&util::pad_right(&format_value(row.value(column)), VALUE_WIDTH));
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}

/// Text histograms, one block per subplot in grid order. The bin holding
/// the highlighted value is flagged with `<`.
pub fn figure(figure: &Figure, bar_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, subplot) in figure.subplots.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(subplot_lines(subplot, bar_width));
    }
    lines
}

fn subplot_lines(subplot: &Subplot, bar_width: usize) -> Vec<String> {
    let title = match subplot.marker {
        Some(v) => format!("Distribution of {} (selected: {})", subplot.title, format_value(Some(v))),
        None => format!("Distribution of {}", subplot.title),
    };
    let mut lines = vec![title];
    if subplot.bins.is_empty() {
        lines.push("  (no values)".to_string());
        return lines;
    }

    let max = subplot.max_count().max(1);
    let last = subplot.bins.len() - 1;
    for (i, bin) in subplot.bins.iter().enumerate() {
        let range = format!("{:>8.1} - {:<8.1}", bin.lo, bin.hi);
        let filled = (bin.count * bar_width).div_ceil(max);
        let bar = "#".repeat(filled);
        let in_bin = subplot.marker.is_some_and(|m| {
            m >= bin.lo && (m < bin.hi || (i == last && m <= bin.hi))
        });
        let flag = if in_bin { " <" } else { "" };
        lines.push(format!(
            "  {} | {} {}{}",
            range,
            util::pad_right(&bar, bar_width),
            bin.count,
            flag
        ));
    }
    lines.push(format!("  {} / {}", subplot.x_label, subplot.y_label));
    lines
}
