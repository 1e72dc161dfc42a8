use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use painel_core::error::WidgetCreationError;
use painel_core::maps::{CircleSpec, LatLng, MapBackend, MapHandle, MapRef, MapView, ShapeStyle};
use painel_core::render::{
    ChartConfig, RenderBackend, ResizeWatch, SeriesPatch, UpdateMode, WidgetHandle, WidgetRef,
};
use painel_core::surface::{Animatable, Surface};
use painel_core::tables::TableView;
use painel_core::visibility::{Rect, Size, Viewport, ViewportProbe};

pub const VIEWPORT: Viewport = Viewport {
    width: 1280.0,
    height: 800.0,
};
const ELEMENT: Rect = Rect::new(0.0, 0.0, 800.0, 400.0);

#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub circle: CircleSpec,
    pub popup: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDrawing {
    pub bubbles: BTreeMap<String, Bubble>,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct Drawing {
    pub charts: BTreeMap<String, ChartConfig>,
    pub chart_errors: BTreeMap<String, String>,
    pub texts: BTreeMap<String, String>,
    pub tables: BTreeMap<String, TableView>,
    pub maps: BTreeMap<String, MapDrawing>,
    pub map_errors: BTreeMap<String, String>,
    classes: BTreeSet<(String, String)>,
}

pub type SharedDrawing = Rc<RefCell<Drawing>>;

#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessProbe;

impl ViewportProbe for HeadlessProbe {
    fn viewport(&self) -> Viewport {
        VIEWPORT
    }

    fn bounding_rect(&self, _element: &str) -> Option<Rect> {
        Some(ELEMENT)
    }

    fn container_size(&self, _element: &str) -> Option<Size> {
        Some(Size::new(ELEMENT.width, ELEMENT.height))
    }
}

struct TextWidget {
    id: String,
    drawing: SharedDrawing,
    destroyed: bool,
}

impl WidgetHandle for TextWidget {
    fn destroy(&mut self) -> Result<(), WidgetCreationError> {
        if !self.destroyed {
            self.destroyed = true;
            self.drawing.borrow_mut().charts.remove(&self.id);
        }
        Ok(())
    }

    fn update(&mut self, _mode: UpdateMode) {}

    fn resize(&mut self) {}

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn apply(&mut self, patch: &SeriesPatch) {
        let mut drawing = self.drawing.borrow_mut();
        let Some(config) = drawing.charts.get_mut(&self.id) else {
            return;
        };
        config.labels.clone_from(&patch.labels);
        config.annotations = patch.annotations.clone();
        match config.datasets.first_mut() {
            Some(first) => *first = patch.dataset.clone(),
            None => config.datasets.push(patch.dataset.clone()),
        }
    }
}

pub struct TextBackend {
    drawing: SharedDrawing,
}

impl TextBackend {
    pub const fn new(drawing: SharedDrawing) -> Self {
        Self { drawing }
    }
}

impl RenderBackend for TextBackend {
    fn create(
        &self,
        target: &str,
        config: &ChartConfig,
        _size: Size,
    ) -> Result<WidgetRef, WidgetCreationError> {
        {
            let mut drawing = self.drawing.borrow_mut();
            drawing.chart_errors.remove(target);
            drawing.charts.insert(target.to_string(), config.clone());
        }
        Ok(Rc::new(RefCell::new(TextWidget {
            id: target.to_string(),
            drawing: Rc::clone(&self.drawing),
            destroyed: false,
        })))
    }

    fn observe_resize(
        &self,
        _target: &str,
        _on_resize: Rc<dyn Fn()>,
    ) -> Option<Box<dyn ResizeWatch>> {
        None
    }

    fn show_error(&self, target: &str, message: &str) {
        self.drawing
            .borrow_mut()
            .chart_errors
            .insert(target.to_string(), message.to_string());
    }
}

struct TextMap {
    container: String,
    drawing: SharedDrawing,
}

impl TextMap {
    fn with_map(&self, edit: impl FnOnce(&mut MapDrawing)) {
        let mut drawing = self.drawing.borrow_mut();
        if let Some(map) = drawing.maps.get_mut(&self.container) {
            edit(map);
        }
    }
}

impl MapHandle for TextMap {
    fn add_circle(&mut self, key: &str, circle: &CircleSpec) {
        self.with_map(|map| {
            map.bubbles.insert(
                key.to_string(),
                Bubble {
                    circle: circle.clone(),
                    popup: None,
                },
            );
        });
    }

    fn add_label(&mut self, key: &str, _at: LatLng, text: &str) {
        self.with_map(|map| {
            map.labels.insert(key.to_string(), text.to_string());
        });
    }

    fn remove_shape(&mut self, key: &str) {
        self.with_map(|map| {
            map.bubbles.remove(key);
            map.labels.remove(key);
        });
    }

    fn set_style(&mut self, key: &str, style: &ShapeStyle) {
        self.with_map(|map| {
            if let Some(bubble) = map.bubbles.get_mut(key) {
                bubble.circle.style = style.clone();
            }
        });
    }

    fn bind_popup(&mut self, key: &str, html: &str) {
        self.with_map(|map| {
            if let Some(bubble) = map.bubbles.get_mut(key) {
                bubble.popup = Some(html.to_string());
            }
        });
    }

    // Nothing to click in a terminal.
    fn on_click(&mut self, _key: &str, _on_click: Rc<dyn Fn()>) {}

    fn fit_bounds(&mut self, _points: &[LatLng]) {}

    fn remove(&mut self) {
        self.drawing.borrow_mut().maps.remove(&self.container);
    }
}

pub struct TextMaps {
    drawing: SharedDrawing,
}

impl TextMaps {
    pub const fn new(drawing: SharedDrawing) -> Self {
        Self { drawing }
    }
}

impl MapBackend for TextMaps {
    fn create(&self, container: &str, _view: &MapView) -> Result<MapRef, WidgetCreationError> {
        {
            let mut drawing = self.drawing.borrow_mut();
            drawing.map_errors.remove(container);
            drawing
                .maps
                .insert(container.to_string(), MapDrawing::default());
        }
        Ok(Rc::new(RefCell::new(TextMap {
            container: container.to_string(),
            drawing: Rc::clone(&self.drawing),
        })))
    }

    fn show_error(&self, container: &str, message: &str) {
        self.drawing
            .borrow_mut()
            .map_errors
            .insert(container.to_string(), message.to_string());
    }
}

pub struct TextSurface {
    drawing: SharedDrawing,
}

impl TextSurface {
    pub const fn new(drawing: SharedDrawing) -> Self {
        Self { drawing }
    }
}

impl Surface for TextSurface {
    fn exists(&self, _id: &str) -> bool {
        true
    }

    fn set_text(&self, id: &str, text: &str) {
        self.drawing
            .borrow_mut()
            .texts
            .insert(id.to_string(), text.to_string());
    }

    fn render_table(&self, id: &str, table: &TableView) {
        self.drawing
            .borrow_mut()
            .tables
            .insert(id.to_string(), table.clone());
    }

    fn set_visible(&self, _id: &str, _visible: bool) {}

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.drawing
            .borrow()
            .classes
            .contains(&(id.to_string(), class.to_string()))
    }

    fn add_class(&self, id: &str, class: &str) {
        self.drawing
            .borrow_mut()
            .classes
            .insert((id.to_string(), class.to_string()));
    }

    fn animatables(&self) -> Vec<Animatable> {
        Vec::new()
    }

    fn visualization_containers(&self) -> Vec<String> {
        Vec::new()
    }
}
