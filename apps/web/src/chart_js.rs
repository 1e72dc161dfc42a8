use std::cell::RefCell;
use std::rc::Rc;

use painel_core::error::WidgetCreationError;
use painel_core::render::{
    ChartConfig, RenderBackend, ResizeWatch, SeriesPatch, UpdateMode, WidgetHandle, WidgetRef,
};
use painel_core::visibility::Size;
use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, ResizeObserver};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Chart)]
    type JsChart;

    #[wasm_bindgen(constructor, js_class = "Chart", catch)]
    fn new(canvas: &Element, config: &JsValue) -> Result<JsChart, JsValue>;

    #[wasm_bindgen(method, js_class = "Chart", catch)]
    fn destroy(this: &JsChart) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Chart")]
    fn update(this: &JsChart, mode: &str);

    #[wasm_bindgen(method, js_class = "Chart")]
    fn resize(this: &JsChart);

    #[wasm_bindgen(method, getter, js_class = "Chart")]
    fn data(this: &JsChart) -> JsValue;
}

/// Chart.js config object for `config`, minus the tooltip callback.
pub fn chart_js_config(config: &ChartConfig) -> Value {
    let mut options = json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": {
            "legend": {
                "display": config.datasets.len() > 1 || !config.annotations.legend.is_empty()
            },
        },
    });

    if let Some(title) = &config.annotations.title {
        options["plugins"]["title"] = json!({ "display": true, "text": title });
    }
    if !config.annotations.center.is_empty() {
        options["plugins"]["subtitle"] = json!({
            "display": true,
            "position": "bottom",
            "text": config.annotations.center,
        });
    }
    merge(&mut options, &config.options);

    json!({
        "type": config.kind,
        "data": {
            "labels": config.labels,
            "datasets": config.datasets,
        },
        "options": options,
    })
}

/// Deep merge of `overlay` into `base`; overlay wins on scalars.
fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base, overlay) if !overlay.is_null() => *base = overlay.clone(),
        _ => {}
    }
}

fn to_js(value: &impl Serialize) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}

fn set(target: &JsValue, key: &str, value: &impl Serialize) {
    match to_js(value) {
        Ok(value) => set_property(target, key, &value),
        Err(error) => tracing::debug!(key, %error, "value not representable in js"),
    }
}

fn set_property(target: &JsValue, key: &str, value: &JsValue) {
    if let Err(error) = js_sys::Reflect::set(target, &JsValue::from_str(key), value) {
        tracing::debug!(key, ?error, "could not set chart property");
    }
}

type TooltipLines = Rc<RefCell<Vec<Vec<String>>>>;
type TooltipCallback = Closure<dyn Fn(JsValue) -> JsValue>;

fn tooltip_callback(lines: &TooltipLines) -> TooltipCallback {
    let lines = Rc::clone(lines);
    Closure::new(move |context: JsValue| {
        let index = js_sys::Reflect::get(&context, &JsValue::from_str("dataIndex"))
            .ok()
            .and_then(|index| index.as_f64())
            .map_or(usize::MAX, |index| index as usize);
        lines
            .borrow()
            .get(index)
            .map_or(JsValue::UNDEFINED, |lines| {
                lines
                    .iter()
                    .map(|line| JsValue::from_str(line))
                    .collect::<js_sys::Array>()
                    .into()
            })
    })
}

struct ChartJsWidget {
    chart: JsChart,
    destroyed: bool,
    tooltips: TooltipLines,
    _tooltip: Option<TooltipCallback>,
}

impl WidgetHandle for ChartJsWidget {
    fn destroy(&mut self) -> Result<(), WidgetCreationError> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        self.chart.destroy().map_err(|error| WidgetCreationError::Backend {
            id: "chart".to_string(),
            message: format!("{error:?}"),
        })
    }

    fn update(&mut self, mode: UpdateMode) {
        if !self.destroyed {
            self.chart.update(mode.as_str());
        }
    }

    fn resize(&mut self) {
        if !self.destroyed {
            self.chart.resize();
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn apply(&mut self, patch: &SeriesPatch) {
        let data = self.chart.data();
        set(&data, "labels", &patch.labels);

        let datasets = js_sys::Reflect::get(&data, &JsValue::from_str("datasets"))
            .ok()
            .and_then(|datasets| datasets.dyn_into::<js_sys::Array>().ok());
        let first = datasets
            .map(|datasets| datasets.get(0))
            .filter(JsValue::is_object);
        if let Some(first) = first {
            set(&first, "data", &patch.dataset.data);
            set(&first, "backgroundColor", &patch.dataset.background_color);
            set(&first, "borderColor", &patch.dataset.border_color);
            set(&first, "borderWidth", &patch.dataset.border_width);
        }
        *self.tooltips.borrow_mut() = patch.annotations.tooltips.clone();
    }
}

struct ObservedResize {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, ResizeObserver)>,
}

impl ResizeWatch for ObservedResize {
    fn disconnect(&mut self) {
        self.observer.disconnect();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChartJsBackend;

fn document() -> Option<web_sys::Document> {
    web_sys::window().and_then(|window| window.document())
}

impl RenderBackend for ChartJsBackend {
    fn is_available(&self) -> bool {
        js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("Chart")).unwrap_or(false)
    }

    fn create(
        &self,
        target: &str,
        config: &ChartConfig,
        size: Size,
    ) -> Result<WidgetRef, WidgetCreationError> {
        let canvas = document()
            .and_then(|document| document.get_element_by_id(target))
            .ok_or_else(|| WidgetCreationError::TargetMissing(target.to_string()))?;
        let backend_error = |message: String| WidgetCreationError::Backend {
            id: target.to_string(),
            message,
        };
        for (attribute, pixels) in [("width", size.width), ("height", size.height)] {
            canvas
                .set_attribute(attribute, &pixels.round().to_string())
                .map_err(|error| backend_error(format!("{error:?}")))?;
        }
        let js_config =
            to_js(&chart_js_config(config)).map_err(|error| backend_error(error.to_string()))?;

        let tooltips: TooltipLines = Rc::new(RefCell::new(config.annotations.tooltips.clone()));
        let callback = (!config.annotations.tooltips.is_empty()).then(|| {
            let callback = tooltip_callback(&tooltips);
            let options = js_sys::Reflect::get(&js_config, &JsValue::from_str("options"))
                .unwrap_or(JsValue::UNDEFINED);
            let plugins = js_sys::Reflect::get(&options, &JsValue::from_str("plugins"))
                .unwrap_or(JsValue::UNDEFINED);
            let tooltip = js_sys::Object::new();
            let callbacks = js_sys::Object::new();
            set_property(&callbacks, "label", callback.as_ref());
            set_property(&tooltip, "callbacks", &callbacks);
            set_property(&plugins, "tooltip", &tooltip);
            callback
        });

        let chart = JsChart::new(&canvas, &js_config)
            .map_err(|error| backend_error(format!("{error:?}")))?;
        Ok(Rc::new(RefCell::new(ChartJsWidget {
            chart,
            destroyed: false,
            tooltips,
            _tooltip: callback,
        })))
    }

    fn observe_resize(
        &self,
        target: &str,
        on_resize: Rc<dyn Fn()>,
    ) -> Option<Box<dyn ResizeWatch>> {
        let container = document()?.get_element_by_id(target)?.parent_element()?;
        let callback = Closure::<dyn FnMut(js_sys::Array, ResizeObserver)>::new(
            move |_entries: js_sys::Array, _observer: ResizeObserver| on_resize(),
        );
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref()).ok()?;
        observer.observe(&container);
        Some(Box::new(ObservedResize {
            observer,
            _callback: callback,
        }))
    }

    fn show_error(&self, target: &str, message: &str) {
        let Some(document) = document() else {
            return;
        };
        let Some(container) = document
            .get_element_by_id(target)
            .and_then(|canvas| canvas.parent_element())
        else {
            return;
        };
        let notice = match container.query_selector(".chart-error").ok().flatten() {
            Some(notice) => notice,
            None => match document.create_element("div") {
                Ok(notice) => {
                    notice.set_class_name("chart-error");
                    if let Err(error) = container.append_child(&notice) {
                        tracing::debug!(target, ?error, "could not attach chart error");
                    }
                    notice
                }
                Err(_) => return,
            },
        };
        notice.set_text_content(Some(message));
    }
}

#[cfg(test)]
mod tests {
    use painel_core::render::{Annotations, ChartKind, Dataset};
    use pretty_assertions::assert_eq;

    use super::*;

    fn donut() -> ChartConfig {
        ChartConfig::new(
            ChartKind::Doughnut,
            vec!["SP".to_string(), "RJ".to_string()],
            vec![Dataset::solid("Casos", vec![2.0, 1.0], "#000", "#fff")],
        )
    }

    #[test]
    fn config_moves_series_under_data() {
        let value = chart_js_config(&donut());

        assert_eq!(value["type"], json!("doughnut"));
        assert_eq!(value["data"]["labels"], json!(["SP", "RJ"]));
        assert_eq!(value["data"]["datasets"][0]["data"], json!([2.0, 1.0]));
        assert_eq!(value["options"]["maintainAspectRatio"], json!(false));
        assert_eq!(value["options"]["plugins"]["legend"]["display"], json!(false));
    }

    #[test]
    fn annotations_become_title_and_subtitle() {
        let config = donut().with_annotations(Annotations {
            title: Some("Distribuição por UF".to_string()),
            center: vec!["150".to_string(), "casos".to_string()],
            ..Annotations::default()
        });

        let value = chart_js_config(&config);

        assert_eq!(value["options"]["plugins"]["title"]["text"], json!("Distribuição por UF"));
        assert_eq!(value["options"]["plugins"]["subtitle"]["text"], json!(["150", "casos"]));
    }

    #[test]
    fn explicit_options_override_defaults() {
        let config = donut().with_options(json!({
            "responsive": false,
            "plugins": { "legend": { "position": "right" } },
        }));

        let value = chart_js_config(&config);

        assert_eq!(value["options"]["responsive"], json!(false));
        assert_eq!(value["options"]["plugins"]["legend"]["position"], json!("right"));
        assert_eq!(value["options"]["plugins"]["legend"]["display"], json!(false));
    }
}
