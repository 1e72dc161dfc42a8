use std::fmt::Write as _;

use painel_core::format::format_number;
use painel_core::render::ChartConfig;
use painel_core::sections::LoadOutcome;
use painel_core::tables::TableView;

use crate::headless::{Drawing, MapDrawing};

const TABLE_PREVIEW_ROWS: usize = 5;

pub fn outcome_label(outcome: &LoadOutcome) -> String {
    match outcome {
        LoadOutcome::Loaded => "loaded".to_string(),
        LoadOutcome::Skipped => "already loaded".to_string(),
        LoadOutcome::AlreadyLoading => "in flight".to_string(),
        LoadOutcome::Deferred => "deferred (no area)".to_string(),
        LoadOutcome::Failed(reason) => format!("failed: {reason}"),
        LoadOutcome::Unknown => "unknown section".to_string(),
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
}

fn chart_line(id: &str, chart: &ChartConfig) -> String {
    let title = chart
        .annotations
        .title
        .as_deref()
        .map_or_else(String::new, |title| format!(" \"{title}\""));
    let mut line = format!("- {id} [{}]{title}", serde_kind(chart));
    for dataset in &chart.datasets {
        let points: Vec<String> = chart
            .labels
            .iter()
            .zip(&dataset.data)
            .map(|(label, value)| format!("{label}={}", format_number(*value)))
            .collect();
        let label = dataset.label.as_deref().unwrap_or("série");
        let _ = write!(line, "\n    {label}: {}", points.join(", "));
    }
    line
}

fn serde_kind(chart: &ChartConfig) -> String {
    serde_json::to_value(chart.kind)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn table_lines(id: &str, table: &TableView) -> String {
    if let Some(message) = &table.message {
        return format!("- {id}: {message}");
    }
    let mut lines = format!("- {id} ({} rows)", table.rows.len());
    if !table.headers.is_empty() {
        let _ = write!(lines, "\n    {}", table.headers.join(" | "));
    }
    for row in table.rows.iter().take(TABLE_PREVIEW_ROWS) {
        let cells: Vec<&str> = row.cells.iter().map(|cell| cell.text.as_str()).collect();
        let _ = write!(lines, "\n    {}", cells.join(" | "));
    }
    if table.rows.len() > TABLE_PREVIEW_ROWS {
        let _ = write!(lines, "\n    …");
    }
    lines
}

fn map_line(id: &str, map: &MapDrawing) -> String {
    let highlighted: Vec<&str> = map
        .bubbles
        .iter()
        .filter(|(_, bubble)| bubble.circle.style.weight > 2)
        .map(|(key, _)| key.as_str())
        .collect();
    let mut line = format!("- {id}: {} bubbles", map.bubbles.len());
    if !highlighted.is_empty() {
        let _ = write!(line, ", selected {}", highlighted.join(", "));
    }
    if !map.labels.is_empty() {
        let names: Vec<&str> = map.labels.values().map(String::as_str).collect();
        let _ = write!(line, ", cities {}", names.join(", "));
    }
    line
}

/// Plain-text rendering of a headless run.
pub fn render_report(outcomes: &[(String, LoadOutcome)], drawing: &Drawing) -> String {
    let mut out = String::new();

    heading(&mut out, "Sections");
    for (section, outcome) in outcomes {
        let _ = writeln!(out, "- {section}: {}", outcome_label(outcome));
    }

    if !drawing.texts.is_empty() {
        heading(&mut out, "Indicators");
        for (id, text) in &drawing.texts {
            let _ = writeln!(out, "- {id}: {text}");
        }
    }

    if !drawing.tables.is_empty() {
        heading(&mut out, "Tables");
        for (id, table) in &drawing.tables {
            let _ = writeln!(out, "{}", table_lines(id, table));
        }
    }

    if !drawing.charts.is_empty() || !drawing.chart_errors.is_empty() {
        heading(&mut out, "Charts");
        for (id, chart) in &drawing.charts {
            let _ = writeln!(out, "{}", chart_line(id, chart));
        }
        for (id, message) in &drawing.chart_errors {
            let _ = writeln!(out, "- {id}: {message}");
        }
    }

    if !drawing.maps.is_empty() || !drawing.map_errors.is_empty() {
        heading(&mut out, "Maps");
        for (id, map) in &drawing.maps {
            let _ = writeln!(out, "{}", map_line(id, map));
        }
        for (id, message) in &drawing.map_errors {
            let _ = writeln!(out, "- {id}: {message}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use painel_core::render::{ChartKind, Dataset};
    use painel_core::tables::{Cell, TableRow};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn outcomes_read_plainly() {
        assert_eq!(outcome_label(&LoadOutcome::Loaded), "loaded");
        assert_eq!(
            outcome_label(&LoadOutcome::Failed("Erro: backend não respondeu".to_string())),
            "failed: Erro: backend não respondeu"
        );
    }

    #[test]
    fn failed_map_is_reported_with_its_message() {
        let mut drawing = Drawing::default();
        drawing.map_errors.insert(
            "map-brasil".to_string(),
            "Erro: backend não respondeu".to_string(),
        );

        let report = render_report(&[], &drawing);

        assert_eq!(
            report,
            "\nSections\n========\n\
             \nMaps\n====\n\
             - map-brasil: Erro: backend não respondeu\n"
        );
    }

    #[test]
    fn report_lists_sections_texts_tables_and_charts() {
        let mut drawing = Drawing::default();
        drawing
            .texts
            .insert("kpi-total-acoes".to_string(), "1.234".to_string());
        drawing.tables.insert(
            "table-saldo".to_string(),
            TableView {
                headers: vec!["Objeto".to_string(), "Saldo".to_string()],
                rows: vec![TableRow {
                    cells: vec![Cell::text("Cobrança"), Cell::text("6")],
                    ..TableRow::default()
                }],
                message: None,
            },
        );
        drawing.charts.insert(
            "chart-saldo".to_string(),
            ChartConfig::new(
                ChartKind::Bar,
                vec!["Entradas".to_string(), "Saldo".to_string()],
                vec![Dataset::solid("Total", vec![1234.0, 234.0], "#000", "#000")],
            ),
        );

        let report = render_report(
            &[("saldo-entradas-encerramentos".to_string(), LoadOutcome::Loaded)],
            &drawing,
        );

        assert_eq!(
            report,
            "\nSections\n========\n\
             - saldo-entradas-encerramentos: loaded\n\
             \nIndicators\n==========\n\
             - kpi-total-acoes: 1.234\n\
             \nTables\n======\n\
             - table-saldo (1 rows)\n    Objeto | Saldo\n    Cobrança | 6\n\
             \nCharts\n======\n\
             - chart-saldo [bar]\n    Total: Entradas=1.234, Saldo=234\n"
        );
    }
}
