use std::fmt::Write;

use storage::dto::recalculation::RecalculationReport;

const HEADERS: [&str; 5] = ["race", "type", "total", "written", "updated"];

/// Renders a report as an aligned `race | type | total | written | updated`
/// table followed by a totals line. `written` counts rows persisted by the
/// pass, `updated` the ones whose value changed.
pub fn render_summary(report: &RecalculationReport) -> String {
    let rows: Vec<[String; 5]> = report
        .races
        .iter()
        .map(|outcome| {
            [
                format!("{} ({})", outcome.race_name, outcome.race_id),
                outcome.kind.to_string(),
                outcome.total.to_string(),
                outcome.written.to_string(),
                outcome.updated.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &rows {
        write_row(&mut out, row, &widths);
    }

    let _ = writeln!(
        out,
        "{} scope(s), {} row(s) ranked, {} written, {} updated",
        report.races.len(),
        report.total,
        report.written,
        report.updated
    );

    out
}

fn write_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (cell, width))| {
            if index >= 2 {
                format!("{:>width$}", cell, width = *width)
            } else {
                format!("{:<width$}", cell, width = *width)
            }
        })
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}
