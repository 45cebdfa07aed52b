use crate::api::MapService;
use crate::session::UploadSession;
use crate::stats::ColumnSummary;
use crate::types::{ActiveTab, AnalysisResult, SampleRow, ServiceStatus, COLUMNS};
use std::fmt::Write;

const BAR_WIDTH: usize = 20;

/// First `n` rows as a fixed-width table.
pub fn preview(rows: &[SampleRow], n: usize) -> String {
    let shown: Vec<Vec<String>> = rows
        .iter()
        .take(n)
        .map(|r| {
            let mut cells = vec![
                r.region.clone(),
                format!("{:.4}", r.latitude),
                format!("{:.4}", r.longitude),
                r.measurement_date.format("%Y-%m-%d").to_string(),
            ];
            cells.extend(r.numeric_values()[2..].iter().map(|v| format!("{:.2}", v)));
            cells
        })
        .collect();

    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    table(&header, &shown)
}

/// Transposed summary: one row per statistic, one column per numeric field.
pub fn summary(columns: &[ColumnSummary]) -> String {
    let mut header = vec![String::new()];
    header.extend(columns.iter().map(|c| c.name.to_string()));

    let stats: [(&str, fn(&ColumnSummary) -> f64); 8] = [
        ("count", |c| c.count as f64),
        ("mean", |c| c.mean),
        ("std", |c| c.std),
        ("min", |c| c.min),
        ("25%", |c| c.q25),
        ("50%", |c| c.median),
        ("75%", |c| c.q75),
        ("max", |c| c.max),
    ];

    let body: Vec<Vec<String>> = stats
        .iter()
        .map(|(label, get)| {
            let mut cells = vec![label.to_string()];
            cells.extend(columns.iter().map(|c| format!("{:.4}", get(c))));
            cells
        })
        .collect();

    table(&header, &body)
}

fn table(header: &[String], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(header).chain(body.iter().map(Vec::as_slice)) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:>width$}", cell, width = *w))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

pub fn status_badge(status: ServiceStatus) -> &'static str {
    match status {
        ServiceStatus::Ready => "[OK] Service Ready",
        ServiceStatus::Checking => "[..] Checking Status...",
        ServiceStatus::Error => "[!!] Service Unavailable",
    }
}

fn bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn analysis_tab(out: &mut String, analysis: &AnalysisResult) {
    for metric in &analysis.metrics {
        let _ = writeln!(out, "{:<14} {:>3}% {}", metric.name, metric.value, bar(metric.value));
    }
    let _ = writeln!(out, "\nKey Findings");
    for (i, finding) in analysis.findings.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, finding);
    }
    let _ = writeln!(out, "\nRecommendations");
    for (i, rec) in analysis.recommendations.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, rec);
    }
}

/// Text rendition of the session: badge, file, error, then the active tab.
pub fn session_view<S: MapService>(session: &UploadSession<S>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Health Map Analyzer  {}", status_badge(session.status()));

    if let Some(file) = session.file() {
        let _ = writeln!(out, "File: {}", file.name);
    }
    if let Some(error) = session.error() {
        let _ = writeln!(out, "Error: {}", error);
    }
    if session.is_loading() {
        let _ = writeln!(out, "Processing... {}% Complete", session.progress());
    }

    if !session.has_results() {
        return out;
    }

    let (map_mark, analysis_mark) = match session.active_tab() {
        ActiveTab::Map => ("*", " "),
        ActiveTab::Analysis => (" ", "*"),
    };
    let _ = writeln!(out, "\n[{}] Health Map   [{}] Analysis\n", map_mark, analysis_mark);

    match (session.active_tab(), session.map_url(), session.analysis()) {
        (ActiveTab::Map, Some(url), _) => {
            let _ = writeln!(out, "Generated Health Map: {}", url);
        }
        (ActiveTab::Analysis, _, Some(analysis)) => analysis_tab(&mut out, analysis),
        _ => {}
    }
    out
}
