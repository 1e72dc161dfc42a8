use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::WidgetCreationError;
use crate::visibility::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Doughnut,
    Scatter,
}

/// One data series. Colors and widths are per point so a single slice can be
/// highlighted without touching the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub background_color: Vec<String>,
    pub border_color: Vec<String>,
    pub border_width: Vec<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub fill: bool,
}

impl Dataset {
    /// Single-color series.
    pub fn solid(label: &str, data: Vec<f64>, background: &str, border: &str) -> Self {
        let len = data.len();
        Self {
            label: Some(label.to_string()),
            data,
            background_color: vec![background.to_string(); len],
            border_color: vec![border.to_string(); len],
            border_width: vec![2; len],
            fill: false,
        }
    }
}

/// Text the backend draws outside the data itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub title: Option<String>,
    pub legend: Vec<String>,
    pub tooltips: Vec<Vec<String>>,
    pub center: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl ChartConfig {
    pub fn new(kind: ChartKind, labels: Vec<String>, datasets: Vec<Dataset>) -> Self {
        Self {
            kind,
            labels,
            datasets,
            annotations: Annotations::default(),
            options: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// The bound data of the first series, as an in-place patch.
    pub fn to_patch(&self) -> SeriesPatch {
        let first = self.datasets.first().cloned().unwrap_or_default();
        SeriesPatch {
            labels: self.labels.clone(),
            dataset: first,
            annotations: self.annotations.clone(),
        }
    }
}

/// Replacement for a widget's bound series, applied without recreating it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesPatch {
    pub labels: Vec<String>,
    pub dataset: Dataset,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Redraw without animation.
    None,
    /// Animate towards the new state.
    Active,
}

impl UpdateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Active => "active",
        }
    }
}

pub trait WidgetHandle {
    fn destroy(&mut self) -> Result<(), WidgetCreationError>;

    fn update(&mut self, mode: UpdateMode);

    fn resize(&mut self);

    fn is_destroyed(&self) -> bool;

    /// Swap the bound series. Callers follow with [`WidgetHandle::update`].
    fn apply(&mut self, patch: &SeriesPatch);
}

pub type WidgetRef = Rc<RefCell<dyn WidgetHandle>>;

/// Live resize subscription on a widget container.
pub trait ResizeWatch {
    fn disconnect(&mut self);
}

pub trait RenderBackend {
    /// False when the charting library never loaded.
    fn is_available(&self) -> bool {
        true
    }

    fn create(
        &self,
        target: &str,
        config: &ChartConfig,
        size: Size,
    ) -> Result<WidgetRef, WidgetCreationError>;

    /// Calls `on_resize` whenever the container of `target` changes size.
    fn observe_resize(&self, target: &str, on_resize: Rc<dyn Fn()>) -> Option<Box<dyn ResizeWatch>>;

    /// Draws a short message where the widget would be.
    fn show_error(&self, target: &str, message: &str);
}
