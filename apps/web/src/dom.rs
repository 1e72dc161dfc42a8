use std::fmt::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};

use painel_core::surface::{Animatable, Surface};
use painel_core::tables::TableView;
use painel_core::visibility::{Rect, Size, Viewport, ViewportProbe};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::animation::{parse_delay, ANIMATABLE_SELECTOR, CONTAINER_SELECTOR};

fn document() -> Option<Document> {
    web_sys::window().and_then(|window| window.document())
}

fn element(id: &str) -> Option<Element> {
    document().and_then(|document| document.get_element_by_id(id))
}

static GENERATED_IDS: AtomicU32 = AtomicU32::new(0);

fn generated_id(prefix: &str) -> String {
    let serial = GENERATED_IDS.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{serial}")
}

/// Every element matching `selector`. An element without an id is given a
/// generated one so it can be addressed by id afterwards.
fn identified(selector: &str, prefix: &str) -> Vec<Element> {
    let Some(nodes) = document().and_then(|document| document.query_selector_all(selector).ok())
    else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .inspect(|element| {
            if element.id().is_empty() {
                element.set_id(&generated_id(prefix));
            }
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DomProbe;

impl ViewportProbe for DomProbe {
    fn viewport(&self) -> Viewport {
        let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
            value.ok().and_then(|value| value.as_f64()).unwrap_or(0.0)
        };
        web_sys::window().map_or(
            Viewport {
                width: 0.0,
                height: 0.0,
            },
            |window| Viewport {
                width: dimension(window.inner_width()),
                height: dimension(window.inner_height()),
            },
        )
    }

    fn bounding_rect(&self, id: &str) -> Option<Rect> {
        let rect = element(id)?.get_bounding_client_rect();
        Some(Rect::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn container_size(&self, id: &str) -> Option<Size> {
        let parent = element(id)?.parent_element()?;
        Some(Size::new(
            f64::from(parent.client_width()),
            f64::from(parent.client_height()),
        ))
    }
}

pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Table body markup. Keyed rows carry `data-objeto` for click delegation.
pub fn table_html(table: &TableView) -> String {
    let mut html = String::new();
    if let Some(message) = &table.message {
        let _ = write!(
            html,
            "<tr><td colspan=\"{}\" class=\"table-message\">{}</td></tr>",
            table.column_count().max(1),
            escape(message)
        );
        return html;
    }

    for row in &table.rows {
        html.push_str("<tr");
        if let Some(class) = &row.class {
            let _ = write!(html, " class=\"{}\"", escape(class));
        }
        if let Some(key) = &row.key {
            let _ = write!(html, " data-objeto=\"{}\"", escape(key));
        }
        html.push('>');
        for cell in &row.cells {
            let mut classes: Vec<&str> = cell.class.iter().map(String::as_str).collect();
            if cell.clickable {
                classes.push("clickable");
            }
            if classes.is_empty() {
                let _ = write!(html, "<td>{}</td>", escape(&cell.text));
            } else {
                let _ = write!(
                    html,
                    "<td class=\"{}\">{}</td>",
                    escape(&classes.join(" ")),
                    escape(&cell.text)
                );
            }
        }
        html.push_str("</tr>");
    }
    html
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DomSurface;

impl Surface for DomSurface {
    fn exists(&self, id: &str) -> bool {
        element(id).is_some()
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(element) = element(id) {
            element.set_text_content(Some(text));
        }
    }

    fn render_table(&self, id: &str, table: &TableView) {
        match element(id) {
            Some(element) => element.set_inner_html(&table_html(table)),
            None => tracing::debug!(table = id, "table body not in document"),
        }
    }

    fn set_visible(&self, id: &str, visible: bool) {
        let Some(element) = element(id).and_then(|element| element.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let style = element.style();
        let (opacity, visibility) = if visible { ("1", "visible") } else { ("0", "hidden") };
        for (property, value) in [("opacity", opacity), ("visibility", visibility)] {
            if let Err(error) = style.set_property(property, value) {
                tracing::debug!(element = id, property, ?error, "style not applied");
            }
        }
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        element(id).is_some_and(|element| element.class_list().contains(class))
    }

    fn add_class(&self, id: &str, class: &str) {
        if let Some(element) = element(id) {
            if let Err(error) = element.class_list().add_1(class) {
                tracing::debug!(element = id, class, ?error, "class not added");
            }
        }
    }

    fn animatables(&self) -> Vec<Animatable> {
        identified(ANIMATABLE_SELECTOR, "painel-anim")
            .into_iter()
            .map(|element| {
                let delay = parse_delay(element.get_attribute("data-delay").as_deref());
                Animatable::new(&element.id(), delay)
            })
            .collect()
    }

    fn visualization_containers(&self) -> Vec<String> {
        identified(CONTAINER_SELECTOR, "painel-viz")
            .into_iter()
            .map(|element| element.id())
            .collect()
    }
}
