use serde_json::json;

use crate::colors::{self, Palette};
use crate::domain::UfShare;
use crate::error::ViewModelError;
use crate::filters::FilterState;
use crate::format::{format_currency_mil, format_number};
use crate::render::{Annotations, ChartConfig, ChartKind, Dataset, SeriesPatch};

pub const DEFAULT_ALPHA: f64 = 0.85;
pub const SELECTED_ALPHA: f64 = 1.0;
pub const DIMMED_ALPHA: f64 = 0.3;
pub const CATEGORY_ALPHA: f64 = 0.8;

/// Non-finite values become zero.
pub fn sanitize(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    values
        .into_iter()
        .map(|value| if value.is_finite() { value } else { 0.0 })
        .collect()
}

pub fn validate(series: &str, labels: usize, values: usize) -> Result<(), ViewModelError> {
    if labels == 0 {
        return Err(ViewModelError::Empty(series.to_string()));
    }
    if labels != values {
        return Err(ViewModelError::LengthMismatch {
            series: series.to_string(),
            labels,
            values,
        });
    }
    Ok(())
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// One series of a bar or line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
    pub color: &'static str,
    pub fill: bool,
}

impl Series {
    pub fn new(label: &str, values: Vec<f64>, color: &'static str) -> Self {
        Self {
            label: label.to_string(),
            values,
            color,
            fill: false,
        }
    }

    #[must_use]
    pub const fn filled(mut self) -> Self {
        self.fill = true;
        self
    }
}

/// Bar or line chart with one color per series. Every series must have one
/// value per label.
pub fn series_chart(
    kind: ChartKind,
    title: &str,
    labels: Vec<String>,
    series: Vec<Series>,
) -> Result<ChartConfig, ViewModelError> {
    if series.is_empty() {
        return Err(ViewModelError::Empty(title.to_string()));
    }

    let mut datasets = Vec::with_capacity(series.len());
    for item in series {
        validate(&item.label, labels.len(), item.values.len())?;
        let alpha = if item.fill { 0.2 } else { CATEGORY_ALPHA };
        let background = colors::hex_to_rgba(item.color, alpha);
        let border = colors::hex_to_rgba(item.color, 1.0);
        let mut dataset = Dataset::solid(
            &item.label,
            sanitize(item.values),
            &background.to_string(),
            &border.to_string(),
        );
        dataset.fill = item.fill;
        datasets.push(dataset);
    }

    Ok(ChartConfig::new(kind, labels, datasets)
        .with_annotations(Annotations {
            title: Some(title.to_string()),
            ..Annotations::default()
        })
        .with_options(json!({ "responsive": true, "maintainAspectRatio": false })))
}

/// Single bar series colored per label from `palette`.
pub fn categorical_bars(
    title: &str,
    labels: Vec<String>,
    values: Vec<f64>,
    palette: Palette,
) -> Result<ChartConfig, ViewModelError> {
    validate(title, labels.len(), values.len())?;

    let background = labels
        .iter()
        .map(|label| colors::color_for(label, palette, CATEGORY_ALPHA).to_string())
        .collect();
    let border = labels
        .iter()
        .map(|label| colors::border_for(label, palette).to_string())
        .collect();
    let len = labels.len();

    let dataset = Dataset {
        label: Some(title.to_string()),
        data: sanitize(values),
        background_color: background,
        border_color: border,
        border_width: vec![2; len],
        fill: false,
    };

    Ok(ChartConfig::new(ChartKind::Bar, labels, vec![dataset]).with_annotations(Annotations {
        title: Some(title.to_string()),
        ..Annotations::default()
    }))
}

/// Single series with a fixed color per point, e.g. the saldo summary bars.
pub fn colored_series(
    kind: ChartKind,
    title: &str,
    labels: Vec<String>,
    values: Vec<f64>,
    colors: &[&str],
) -> Result<ChartConfig, ViewModelError> {
    validate(title, labels.len(), values.len())?;
    validate(title, labels.len(), colors.len())?;

    let dataset = Dataset {
        label: Some(title.to_string()),
        data: sanitize(values),
        background_color: colors
            .iter()
            .map(|hex| colors::hex_to_rgba(hex, CATEGORY_ALPHA).to_string())
            .collect(),
        border_color: colors
            .iter()
            .map(|hex| colors::hex_to_rgba(hex, 1.0).to_string())
            .collect(),
        border_width: vec![2; colors.len()],
        fill: false,
    };

    Ok(ChartConfig::new(kind, labels, vec![dataset]).with_annotations(Annotations {
        title: Some(title.to_string()),
        ..Annotations::default()
    }))
}

/// Per-UF share donut, highlighted for the active UF filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DonutView {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Share of cases per slice, rounded to one decimal.
    pub percentages: Vec<f64>,
    pub background: Vec<String>,
    pub border: Vec<String>,
    pub border_width: Vec<u32>,
    pub legend: Vec<String>,
    pub tooltips: Vec<Vec<String>>,
    pub center: Vec<String>,
    pub selected: Option<String>,
    pub total: f64,
}

impl DonutView {
    pub fn derive(shares: &[UfShare], filters: &FilterState) -> Result<Self, ViewModelError> {
        if shares.is_empty() {
            return Err(ViewModelError::Empty("distribuicao_uf".to_string()));
        }

        let labels: Vec<String> = shares
            .iter()
            .map(|share| share.uf.trim().to_uppercase())
            .collect();
        let values = sanitize(shares.iter().map(|share| share.quantidade));
        let total: f64 = values.iter().sum();
        let raw_percentages: Vec<f64> = values
            .iter()
            .map(|value| if total > 0.0 { value / total * 100.0 } else { 0.0 })
            .collect();

        let selected = filters
            .uf
            .as_deref()
            .map(|uf| uf.trim().to_uppercase())
            .filter(|uf| labels.contains(uf));

        let mut background = Vec::with_capacity(labels.len());
        let mut border = Vec::with_capacity(labels.len());
        let mut border_width = Vec::with_capacity(labels.len());
        for label in &labels {
            let (fill_alpha, border_alpha, width) = match selected.as_deref() {
                Some(uf) if uf == label => (SELECTED_ALPHA, 1.0, 4),
                Some(_) => (DIMMED_ALPHA, DIMMED_ALPHA, 1),
                None => (DEFAULT_ALPHA, 1.0, 2),
            };
            background.push(colors::color_for(label, Palette::Uf, fill_alpha).to_string());
            border.push(colors::color_for(label, Palette::Uf, border_alpha).to_string());
            border_width.push(width);
        }

        let footer = format!("Total: {} casos", format_number(total));
        let legend = labels
            .iter()
            .zip(&values)
            .zip(&raw_percentages)
            .map(|((label, value), percent)| {
                format!("{label}: {} casos ({percent:.1}%)", format_number(*value))
            })
            .collect();
        let tooltips = labels
            .iter()
            .zip(shares)
            .zip(values.iter().zip(&raw_percentages))
            .map(|((label, share), (value, percent))| {
                vec![
                    label.clone(),
                    format!("Quantidade: {} casos", format_number(*value)),
                    format!("Percentual: {percent:.2}%"),
                    format!(
                        "Erro Sistêmico: {}",
                        format_currency_mil(share.prejuizo_mil() * 1000.0)
                    ),
                    footer.clone(),
                ]
            })
            .collect();

        let center = match selected.as_deref() {
            Some(uf) => {
                let index = labels.iter().position(|label| label == uf).unwrap_or_default();
                vec![
                    uf.to_string(),
                    format!(
                        "{} casos",
                        format_number(values.get(index).copied().unwrap_or_default())
                    ),
                    format!("{:.1}%", raw_percentages.get(index).copied().unwrap_or_default()),
                ]
            }
            None => vec!["Total de Casos".to_string(), format_number(total)],
        };

        Ok(Self {
            percentages: raw_percentages.iter().copied().map(round1).collect(),
            labels,
            values,
            background,
            border,
            border_width,
            legend,
            tooltips,
            center,
            selected,
            total,
        })
    }

    fn dataset(&self) -> Dataset {
        Dataset {
            label: Some("Casos".to_string()),
            data: self.values.clone(),
            background_color: self.background.clone(),
            border_color: self.border.clone(),
            border_width: self.border_width.clone(),
            fill: false,
        }
    }

    fn annotations(&self) -> Annotations {
        Annotations {
            title: Some("Distribuição por UF".to_string()),
            legend: self.legend.clone(),
            tooltips: self.tooltips.clone(),
            center: self.center.clone(),
        }
    }

    pub fn to_config(&self) -> ChartConfig {
        ChartConfig::new(ChartKind::Doughnut, self.labels.clone(), vec![self.dataset()])
            .with_annotations(self.annotations())
            .with_options(json!({
                "cutout": "60%",
                "responsive": true,
                "maintainAspectRatio": false
            }))
    }

    pub fn to_patch(&self) -> SeriesPatch {
        SeriesPatch {
            labels: self.labels.clone(),
            dataset: self.dataset(),
            annotations: self.annotations(),
        }
    }

    pub fn percentage_of(&self, uf: &str) -> Option<f64> {
        let index = self.labels.iter().position(|label| label == uf)?;
        self.percentages.get(index).copied()
    }

    pub fn background_of(&self, uf: &str) -> Option<&str> {
        let index = self.labels.iter().position(|label| label == uf)?;
        self.background.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn shares() -> Vec<UfShare> {
        vec![
            UfShare {
                uf: "SP".to_string(),
                quantidade: 100.0,
                prejuizo_total_mil: Some(12.5),
                ..UfShare::default()
            },
            UfShare {
                uf: "RJ".to_string(),
                quantidade: 50.0,
                ..UfShare::default()
            },
        ]
    }

    #[test]
    fn percentages_follow_case_counts() {
        let view = DonutView::derive(&shares(), &FilterState::default()).unwrap();

        assert_eq!(view.percentages, vec![66.7, 33.3]);
        assert_eq!(view.border_width, vec![2, 2]);
        assert_eq!(view.center, vec!["Total de Casos", "150"]);
        assert_eq!(view.legend[0], "SP: 100 casos (66.7%)");
    }

    #[test]
    fn active_uf_is_highlighted_and_others_dimmed() {
        let filters = FilterState {
            uf: Some("sp".to_string()),
            objeto: None,
        };

        let view = DonutView::derive(&shares(), &filters).unwrap();

        assert_eq!(view.selected.as_deref(), Some("SP"));
        assert_eq!(view.background_of("SP"), Some("rgba(30, 64, 175, 1)"));
        assert_eq!(
            view.background_of("RJ"),
            Some(colors::color_for("RJ", Palette::Uf, 0.3).to_string().as_str())
        );
        assert_eq!(view.border_width, vec![4, 1]);
        assert_eq!(view.center, vec!["SP", "100 casos", "66.7%"]);
    }

    #[test]
    fn tooltips_carry_formatted_figures() {
        let view = DonutView::derive(&shares(), &FilterState::default()).unwrap();

        assert_eq!(
            view.tooltips[0],
            vec![
                "SP",
                "Quantidade: 100 casos",
                "Percentual: 66.67%",
                "Erro Sistêmico: R$ 12,5 Mil",
                "Total: 150 casos",
            ]
        );
    }

    #[test]
    fn selection_outside_the_data_changes_nothing() {
        let filters = FilterState {
            uf: Some("AM".to_string()),
            objeto: None,
        };
        let view = DonutView::derive(&shares(), &filters).unwrap();
        assert_eq!(view.selected, None);
        assert_eq!(view.border_width, vec![2, 2]);
    }

    #[test]
    fn empty_and_mismatched_series_are_rejected() {
        assert_eq!(
            DonutView::derive(&[], &FilterState::default()),
            Err(ViewModelError::Empty("distribuicao_uf".to_string()))
        );

        let error = series_chart(
            ChartKind::Line,
            "Evolução",
            vec!["2024-01".to_string(), "2024-02".to_string()],
            vec![Series::new("Entradas", vec![1.0], colors::SERIES_BLUE)],
        )
        .unwrap_err();
        assert_eq!(
            error,
            ViewModelError::LengthMismatch {
                series: "Entradas".to_string(),
                labels: 2,
                values: 1,
            }
        );
    }

    #[test]
    fn colored_series_needs_one_color_per_point() {
        let config = colored_series(
            ChartKind::Bar,
            "Saldo",
            vec!["Entradas".to_string(), "Encerrados".to_string()],
            vec![10.0, 4.0],
            &[colors::SERIES_BLUE, colors::POSITIVE],
        )
        .unwrap();
        assert_eq!(
            config.datasets[0].border_color,
            vec!["rgba(49, 130, 206, 1)", "rgba(72, 187, 120, 1)"]
        );

        let missing_color = colored_series(
            ChartKind::Bar,
            "Saldo",
            vec!["Entradas".to_string(), "Encerrados".to_string()],
            vec![10.0, 4.0],
            &[colors::SERIES_BLUE],
        );
        assert!(matches!(missing_color, Err(ViewModelError::LengthMismatch { .. })));
    }

    #[test]
    fn non_finite_values_become_zero() {
        assert_eq!(sanitize([1.0, f64::NAN, f64::INFINITY]), vec![1.0, 0.0, 0.0]);
    }
}
