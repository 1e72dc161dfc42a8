use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use painel_core::error::WidgetCreationError;
use painel_core::maps::{CircleSpec, LatLng, MapBackend, MapHandle, MapRef, MapView, ShapeStyle};
use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::dom::escape;

const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

#[wasm_bindgen]
extern "C" {
    type LeafletMap;
    type Layer;

    #[wasm_bindgen(js_namespace = L, js_name = map, catch)]
    fn leaflet_map(container: &str) -> Result<LeafletMap, JsValue>;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &LeafletMap, center: &JsValue, zoom: u8);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &LeafletMap, bounds: &JsValue, options: &JsValue);

    #[wasm_bindgen(method, js_name = remove)]
    fn remove_map(this: &LeafletMap);

    #[wasm_bindgen(js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url: &str, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = circleMarker)]
    fn circle_marker(at: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = marker)]
    fn marker(at: &JsValue, options: &JsValue) -> Layer;

    #[wasm_bindgen(js_namespace = L, js_name = divIcon)]
    fn div_icon(options: &JsValue) -> JsValue;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Layer, map: &LeafletMap);

    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &Layer, style: &JsValue);

    #[wasm_bindgen(method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str);

    #[wasm_bindgen(method)]
    fn on(this: &Layer, event: &str, handler: &js_sys::Function);

    #[wasm_bindgen(method, js_name = remove)]
    fn remove_layer(this: &Layer);
}

fn to_js(value: &impl Serialize) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::UNDEFINED)
}

fn lat_lng(point: LatLng) -> Value {
    json!([point.lat, point.lon])
}

/// `L.circleMarker` options for a bubble.
pub fn circle_options(circle: &CircleSpec) -> Value {
    let mut options = style_options(&circle.style);
    options["radius"] = json!(circle.radius);
    options
}

pub fn style_options(style: &ShapeStyle) -> Value {
    json!({
        "color": style.color,
        "fillColor": style.fill_color,
        "fillOpacity": style.fill_opacity,
        "weight": style.weight,
    })
}

/// `L.divIcon` options for a city name.
pub fn label_icon(text: &str) -> Value {
    json!({
        "className": "cidade-marker",
        "html": format!("<div class=\"cidade-label\">{}</div>", escape(text)),
        "iconSize": [100, 20],
    })
}

struct LeafletHandle {
    map: LeafletMap,
    shapes: HashMap<String, Layer>,
    clicks: HashMap<String, Closure<dyn FnMut()>>,
    removed: bool,
}

impl LeafletHandle {
    fn put(&mut self, key: &str, layer: Layer) {
        layer.add_to(&self.map);
        if let Some(previous) = self.shapes.insert(key.to_string(), layer) {
            previous.remove_layer();
        }
        self.clicks.remove(key);
    }
}

impl MapHandle for LeafletHandle {
    fn add_circle(&mut self, key: &str, circle: &CircleSpec) {
        let layer = circle_marker(&to_js(&lat_lng(circle.center)), &to_js(&circle_options(circle)));
        self.put(key, layer);
    }

    fn add_label(&mut self, key: &str, at: LatLng, text: &str) {
        let options = js_sys::Object::new();
        let icon = div_icon(&to_js(&label_icon(text)));
        if let Err(error) = js_sys::Reflect::set(&options, &JsValue::from_str("icon"), &icon) {
            tracing::debug!(key, ?error, "label icon not set");
        }
        let layer = marker(&to_js(&lat_lng(at)), &options);
        self.put(key, layer);
    }

    fn remove_shape(&mut self, key: &str) {
        if let Some(layer) = self.shapes.remove(key) {
            layer.remove_layer();
        }
        self.clicks.remove(key);
    }

    fn set_style(&mut self, key: &str, style: &ShapeStyle) {
        if let Some(layer) = self.shapes.get(key) {
            layer.set_style(&to_js(&style_options(style)));
        }
    }

    fn bind_popup(&mut self, key: &str, html: &str) {
        if let Some(layer) = self.shapes.get(key) {
            layer.bind_popup(html);
        }
    }

    fn on_click(&mut self, key: &str, on_click: Rc<dyn Fn()>) {
        let Some(layer) = self.shapes.get(key) else {
            return;
        };
        let callback = Closure::<dyn FnMut()>::new(move || on_click());
        layer.on("click", callback.as_ref().unchecked_ref());
        self.clicks.insert(key.to_string(), callback);
    }

    fn fit_bounds(&mut self, points: &[LatLng]) {
        if points.is_empty() {
            return;
        }
        let bounds: Vec<Value> = points.iter().copied().map(lat_lng).collect();
        self.map
            .fit_bounds(&to_js(&bounds), &to_js(&json!({ "padding": [20, 20] })));
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        self.shapes.clear();
        self.clicks.clear();
        self.map.remove_map();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LeafletBackend;

impl MapBackend for LeafletBackend {
    fn is_available(&self) -> bool {
        js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("L")).unwrap_or(false)
    }

    fn create(&self, container: &str, view: &MapView) -> Result<MapRef, WidgetCreationError> {
        if let Some(notice) = map_container(container)
            .and_then(|element| element.query_selector(".map-error").ok().flatten())
        {
            notice.remove();
        }
        let map = leaflet_map(container).map_err(|error| WidgetCreationError::Backend {
            id: container.to_string(),
            message: format!("{error:?}"),
        })?;
        map.set_view(&to_js(&lat_lng(view.center)), view.zoom);
        let tiles = json!({ "attribution": "© OSM", "maxZoom": 19 });
        tile_layer(TILE_URL, &to_js(&tiles)).add_to(&map);

        Ok(Rc::new(RefCell::new(LeafletHandle {
            map,
            shapes: HashMap::new(),
            clicks: HashMap::new(),
            removed: false,
        })))
    }

    fn show_error(&self, container: &str, message: &str) {
        let Some(element) = map_container(container) else {
            tracing::debug!(container, "map container not in document");
            return;
        };
        let notice = element
            .owner_document()
            .ok_or_else(|| JsValue::from_str("detached container"))
            .and_then(|document| document.create_element("div"));
        match notice {
            Ok(notice) => {
                notice.set_class_name("map-error");
                notice.set_text_content(Some(message));
                element.replace_children_with_node_1(&notice);
            }
            Err(error) => tracing::debug!(container, ?error, "could not draw map error"),
        }
    }
}

fn map_container(id: &str) -> Option<web_sys::Element> {
    web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(id))
}
