use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;

use crate::api::{ApiClient, HttpResponse, HttpTransport};
use crate::config::{ApiConfig, Timings};
use crate::context::Collaborators;
use crate::cross_filter::CrossFilterCoordinator;
use crate::error::{ApiError, WidgetCreationError};
use crate::filters::FilterStore;
use crate::handlers::SectionHandlers;
use crate::lifecycle::ChartLifecycleManager;
use crate::maps::{
    CircleSpec, LatLng, MapBackend, MapHandle, MapRef, MapView, MapsController, ShapeStyle,
};
use crate::render::{
    ChartConfig, RenderBackend, ResizeWatch, SeriesPatch, UpdateMode, WidgetHandle, WidgetRef,
};
use crate::scheduler::TokioScheduler;
use crate::sequence::SequenceGate;
use crate::surface::{Animatable, Surface};
use crate::tables::{TableView, TablesController};
use crate::visibility::{Rect, Size, Viewport, ViewportProbe};

pub const API_BASE: &str = "http://api.test/api";

/// Layout double. A scripted element answers its queued rects in order and
/// then keeps answering the last one.
pub struct ScriptedProbe {
    viewport: Cell<Viewport>,
    rects: RefCell<HashMap<String, VecDeque<Option<Rect>>>>,
    containers: RefCell<HashMap<String, Size>>,
    lookups: RefCell<HashMap<String, u32>>,
}

impl ScriptedProbe {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Cell::new(viewport),
            rects: RefCell::new(HashMap::new()),
            containers: RefCell::new(HashMap::new()),
            lookups: RefCell::new(HashMap::new()),
        }
    }

    pub fn set_rect(&self, element: &str, rect: Rect) {
        self.script_rects(element, vec![Some(rect)]);
    }

    pub fn script_rects(&self, element: &str, rects: Vec<Option<Rect>>) {
        self.rects
            .borrow_mut()
            .insert(element.to_string(), rects.into_iter().collect());
    }

    pub fn set_container(&self, element: &str, size: Size) {
        self.containers
            .borrow_mut()
            .insert(element.to_string(), size);
    }

    pub fn lookups(&self, element: &str) -> u32 {
        self.lookups.borrow().get(element).copied().unwrap_or(0)
    }
}

impl ViewportProbe for ScriptedProbe {
    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn bounding_rect(&self, element: &str) -> Option<Rect> {
        *self
            .lookups
            .borrow_mut()
            .entry(element.to_string())
            .or_default() += 1;

        let mut rects = self.rects.borrow_mut();
        let script = rects.get_mut(element)?;
        if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().copied().flatten()
        }
    }

    fn container_size(&self, element: &str) -> Option<Size> {
        self.containers.borrow().get(element).copied()
    }
}

/// What happened to one widget instance.
#[derive(Debug, Default)]
pub struct WidgetLog {
    pub resizes: u32,
    pub updates: Vec<UpdateMode>,
    pub patches: Vec<SeriesPatch>,
    pub destroyed: bool,
}

struct RecordedWidget {
    log: Rc<RefCell<WidgetLog>>,
}

impl WidgetHandle for RecordedWidget {
    fn destroy(&mut self) -> Result<(), WidgetCreationError> {
        self.log.borrow_mut().destroyed = true;
        Ok(())
    }

    fn update(&mut self, mode: UpdateMode) {
        self.log.borrow_mut().updates.push(mode);
    }

    fn resize(&mut self) {
        self.log.borrow_mut().resizes += 1;
    }

    fn is_destroyed(&self) -> bool {
        self.log.borrow().destroyed
    }

    fn apply(&mut self, patch: &SeriesPatch) {
        self.log.borrow_mut().patches.push(patch.clone());
    }
}

struct RecordedWatch {
    active: Rc<Cell<bool>>,
}

impl ResizeWatch for RecordedWatch {
    fn disconnect(&mut self) {
        self.active.set(false);
    }
}

struct Watch {
    active: Rc<Cell<bool>>,
    on_resize: Rc<dyn Fn()>,
}

struct Creation {
    target: String,
    config: ChartConfig,
    size: Size,
}

type CreateHook = Rc<dyn Fn(&str)>;

/// Chart backend double recording every instance it hands out.
#[derive(Default)]
pub struct RecordingBackend {
    creations: RefCell<Vec<Creation>>,
    widgets: RefCell<HashMap<String, Vec<Rc<RefCell<WidgetLog>>>>>,
    watches: RefCell<HashMap<String, Vec<Watch>>>,
    failures_left: Cell<u32>,
    on_create: RefCell<Option<CreateHook>>,
    errors: RefCell<Vec<(String, String)>>,
}

impl RecordingBackend {
    pub fn fail_next(&self, count: u32) {
        self.failures_left.set(count);
    }

    /// Runs `hook` at the start of every backend creation.
    pub fn on_create(&self, hook: impl Fn(&str) + 'static) {
        *self.on_create.borrow_mut() = Some(Rc::new(hook));
    }

    pub fn create_count(&self, target: &str) -> usize {
        self.creations
            .borrow()
            .iter()
            .filter(|creation| creation.target == target)
            .count()
    }

    pub fn live_count(&self, target: &str) -> usize {
        self.widgets.borrow().get(target).map_or(0, |logs| {
            logs.iter().filter(|log| !log.borrow().destroyed).count()
        })
    }

    pub fn active_watches(&self, target: &str) -> usize {
        self.watches.borrow().get(target).map_or(0, |watches| {
            watches.iter().filter(|watch| watch.active.get()).count()
        })
    }

    pub fn last_size(&self, target: &str) -> Option<Size> {
        self.creations
            .borrow()
            .iter()
            .rev()
            .find(|creation| creation.target == target)
            .map(|creation| creation.size)
    }

    pub fn last_config(&self, target: &str) -> Option<ChartConfig> {
        self.creations
            .borrow()
            .iter()
            .rev()
            .find(|creation| creation.target == target)
            .map(|creation| creation.config.clone())
    }

    /// Log of the most recent instance created for `target`.
    pub fn widget_log(&self, target: &str) -> Option<Rc<RefCell<WidgetLog>>> {
        self.widgets
            .borrow()
            .get(target)
            .and_then(|logs| logs.last().cloned())
    }

    pub fn resizes(&self, target: &str) -> u32 {
        self.widgets.borrow().get(target).map_or(0, |logs| {
            logs.iter().map(|log| log.borrow().resizes).sum()
        })
    }

    pub fn last_patch(&self, target: &str) -> Option<SeriesPatch> {
        self.widget_log(target)
            .and_then(|log| log.borrow().patches.last().cloned())
    }

    pub fn updates(&self, target: &str) -> Vec<UpdateMode> {
        self.widget_log(target)
            .map(|log| log.borrow().updates.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.borrow().clone()
    }

    /// Notifies every connected resize watch of `target`.
    pub fn trigger_resize(&self, target: &str) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .watches
            .borrow()
            .get(target)
            .map(|watches| {
                watches
                    .iter()
                    .filter(|watch| watch.active.get())
                    .map(|watch| Rc::clone(&watch.on_resize))
                    .collect()
            })
            .unwrap_or_default();
        for callback in callbacks {
            callback();
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn create(
        &self,
        target: &str,
        config: &ChartConfig,
        size: Size,
    ) -> Result<WidgetRef, WidgetCreationError> {
        let hook = self.on_create.borrow().clone();
        if let Some(hook) = hook {
            hook(target);
        }

        if self.failures_left.get() > 0 {
            self.failures_left.set(self.failures_left.get() - 1);
            return Err(WidgetCreationError::Backend {
                id: target.to_string(),
                message: "scripted failure".to_string(),
            });
        }

        self.creations.borrow_mut().push(Creation {
            target: target.to_string(),
            config: config.clone(),
            size,
        });
        let log = Rc::new(RefCell::new(WidgetLog::default()));
        self.widgets
            .borrow_mut()
            .entry(target.to_string())
            .or_default()
            .push(Rc::clone(&log));

        Ok(Rc::new(RefCell::new(RecordedWidget { log })))
    }

    fn observe_resize(
        &self,
        target: &str,
        on_resize: Rc<dyn Fn()>,
    ) -> Option<Box<dyn ResizeWatch>> {
        let active = Rc::new(Cell::new(true));
        self.watches
            .borrow_mut()
            .entry(target.to_string())
            .or_default()
            .push(Watch {
                active: Rc::clone(&active),
                on_resize,
            });
        Some(Box::new(RecordedWatch { active }))
    }

    fn show_error(&self, target: &str, message: &str) {
        self.errors
            .borrow_mut()
            .push((target.to_string(), message.to_string()));
    }
}

#[derive(Default)]
struct MapLog {
    circles: HashMap<String, CircleSpec>,
    styles: HashMap<String, ShapeStyle>,
    popups: HashMap<String, String>,
    clicks: HashMap<String, Rc<dyn Fn()>>,
    labels: Vec<(String, String)>,
    bounds: Vec<LatLng>,
    removed: bool,
}

struct RecordedMap {
    log: Rc<RefCell<MapLog>>,
}

impl MapHandle for RecordedMap {
    fn add_circle(&mut self, key: &str, circle: &CircleSpec) {
        let mut log = self.log.borrow_mut();
        log.circles.insert(key.to_string(), circle.clone());
        log.styles.insert(key.to_string(), circle.style.clone());
    }

    fn add_label(&mut self, key: &str, _at: LatLng, text: &str) {
        self.log
            .borrow_mut()
            .labels
            .push((key.to_string(), text.to_string()));
    }

    fn remove_shape(&mut self, key: &str) {
        let mut log = self.log.borrow_mut();
        log.circles.remove(key);
        log.styles.remove(key);
        log.popups.remove(key);
        log.labels.retain(|(label, _)| label != key);
    }

    fn set_style(&mut self, key: &str, style: &ShapeStyle) {
        self.log
            .borrow_mut()
            .styles
            .insert(key.to_string(), style.clone());
    }

    fn bind_popup(&mut self, key: &str, html: &str) {
        self.log
            .borrow_mut()
            .popups
            .insert(key.to_string(), html.to_string());
    }

    fn on_click(&mut self, key: &str, on_click: Rc<dyn Fn()>) {
        self.log
            .borrow_mut()
            .clicks
            .insert(key.to_string(), on_click);
    }

    fn fit_bounds(&mut self, points: &[LatLng]) {
        self.log.borrow_mut().bounds = points.to_vec();
    }

    fn remove(&mut self) {
        self.log.borrow_mut().removed = true;
    }
}

/// Map backend double; queries read the most recent map of a container.
#[derive(Default)]
pub struct RecordingMapBackend {
    maps: RefCell<HashMap<String, Vec<Rc<RefCell<MapLog>>>>>,
    errors: RefCell<Vec<(String, String)>>,
}

impl RecordingMapBackend {
    fn latest(&self, container: &str) -> Option<Rc<RefCell<MapLog>>> {
        self.maps
            .borrow()
            .get(container)
            .and_then(|maps| maps.last().cloned())
    }

    pub fn created(&self, container: &str) -> usize {
        self.maps.borrow().get(container).map_or(0, Vec::len)
    }

    pub fn removed(&self, container: &str) -> usize {
        self.maps.borrow().get(container).map_or(0, |maps| {
            maps.iter().filter(|map| map.borrow().removed).count()
        })
    }

    pub fn radius(&self, container: &str, key: &str) -> Option<f64> {
        self.latest(container)?
            .borrow()
            .circles
            .get(key)
            .map(|circle| circle.radius)
    }

    pub fn style(&self, container: &str, key: &str) -> Option<ShapeStyle> {
        self.latest(container)?.borrow().styles.get(key).cloned()
    }

    pub fn popup(&self, container: &str, key: &str) -> Option<String> {
        self.latest(container)?.borrow().popups.get(key).cloned()
    }

    pub fn labels(&self, container: &str) -> Vec<String> {
        self.latest(container).map_or_else(Vec::new, |map| {
            map.borrow()
                .labels
                .iter()
                .map(|(_, text)| text.clone())
                .collect()
        })
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.borrow().clone()
    }

    pub fn bounds(&self, container: &str) -> Vec<LatLng> {
        self.latest(container)
            .map_or_else(Vec::new, |map| map.borrow().bounds.clone())
    }

    /// Simulates a click on `key`; no borrow is held while the handler runs.
    pub fn click(&self, container: &str, key: &str) {
        let handler = self
            .latest(container)
            .and_then(|map| map.borrow().clicks.get(key).cloned());
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl MapBackend for RecordingMapBackend {
    fn create(&self, container: &str, _view: &MapView) -> Result<MapRef, WidgetCreationError> {
        let log = Rc::new(RefCell::new(MapLog::default()));
        self.maps
            .borrow_mut()
            .entry(container.to_string())
            .or_default()
            .push(Rc::clone(&log));
        Ok(Rc::new(RefCell::new(RecordedMap { log })))
    }

    fn show_error(&self, container: &str, message: &str) {
        self.errors
            .borrow_mut()
            .push((container.to_string(), message.to_string()));
    }
}

/// Document double.
#[derive(Default)]
pub struct RecordingSurface {
    texts: RefCell<HashMap<String, String>>,
    tables: RefCell<HashMap<String, TableView>>,
    visibility: RefCell<HashMap<String, bool>>,
    classes: RefCell<HashMap<String, HashSet<String>>>,
    animatables: RefCell<Vec<Animatable>>,
    containers: RefCell<Vec<String>>,
    dropped: RefCell<HashSet<String>>,
}

impl RecordingSurface {
    pub fn text(&self, id: &str) -> Option<String> {
        self.texts.borrow().get(id).cloned()
    }

    pub fn table(&self, id: &str) -> Option<TableView> {
        self.tables.borrow().get(id).cloned()
    }

    pub fn visible(&self, id: &str) -> Option<bool> {
        self.visibility.borrow().get(id).copied()
    }

    pub fn set_animatables(&self, animatables: Vec<Animatable>) {
        *self.animatables.borrow_mut() = animatables;
    }

    pub fn set_containers(&self, containers: Vec<String>) {
        *self.containers.borrow_mut() = containers;
    }

    /// The next `add_class` on `id` is lost, like an animation that never ran.
    pub fn drop_next_class(&self, id: &str) {
        self.dropped.borrow_mut().insert(id.to_string());
    }
}

impl Surface for RecordingSurface {
    fn exists(&self, _id: &str) -> bool {
        true
    }

    fn set_text(&self, id: &str, text: &str) {
        self.texts
            .borrow_mut()
            .insert(id.to_string(), text.to_string());
    }

    fn render_table(&self, id: &str, table: &TableView) {
        self.tables
            .borrow_mut()
            .insert(id.to_string(), table.clone());
    }

    fn set_visible(&self, id: &str, visible: bool) {
        self.visibility
            .borrow_mut()
            .insert(id.to_string(), visible);
    }

    fn has_class(&self, id: &str, class: &str) -> bool {
        self.classes
            .borrow()
            .get(id)
            .is_some_and(|classes| classes.contains(class))
    }

    fn add_class(&self, id: &str, class: &str) {
        if self.dropped.borrow_mut().remove(id) {
            return;
        }
        self.classes
            .borrow_mut()
            .entry(id.to_string())
            .or_default()
            .insert(class.to_string());
    }

    fn animatables(&self) -> Vec<Animatable> {
        self.animatables.borrow().clone()
    }

    fn visualization_containers(&self) -> Vec<String> {
        self.containers.borrow().clone()
    }
}

enum Route {
    Respond(HttpResponse),
    Fail,
}

/// Transport double. Routes match on the end of the URL path; unknown paths
/// answer 404.
#[derive(Default)]
pub struct CannedTransport {
    routes: RefCell<Vec<(String, Route)>>,
    requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
}

impl CannedTransport {
    pub fn respond(&self, path: &str, body: &str) {
        self.respond_status(path, 200, body);
    }

    pub fn respond_status(&self, path: &str, status: u16, body: &str) {
        self.routes.borrow_mut().push((
            path.to_string(),
            Route::Respond(HttpResponse {
                status,
                body: body.to_string(),
            }),
        ));
    }

    pub fn fail(&self, path: &str) {
        self.routes.borrow_mut().push((path.to_string(), Route::Fail));
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn last_headers(&self) -> Vec<(String, String)> {
        self.requests
            .borrow()
            .last()
            .map(|(_, headers)| headers.clone())
            .unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl HttpTransport for CannedTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, ApiError> {
        self.requests
            .borrow_mut()
            .push((url.to_string(), headers.to_vec()));

        let path = url::Url::parse(url)
            .map_or_else(|_| url.to_string(), |parsed| parsed.path().to_string());
        let routes = self.routes.borrow();
        match routes.iter().rev().find(|(route, _)| path.ends_with(route.as_str())) {
            Some((_, Route::Respond(response))) => Ok(response.clone()),
            Some((_, Route::Fail)) => Err(ApiError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
            None => Ok(HttpResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Every component wired over the doubles, without a `DashboardContext`, so
/// nothing needs a `LocalSet` unless a test spawns.
pub struct Harness {
    pub transport: Rc<CannedTransport>,
    pub probe: Rc<ScriptedProbe>,
    pub backend: Rc<RecordingBackend>,
    pub map_backend: Rc<RecordingMapBackend>,
    pub surface: Rc<RecordingSurface>,
    pub scheduler: Rc<TokioScheduler>,
    pub filters: Rc<FilterStore>,
    pub api: Rc<ApiClient>,
    pub charts: Rc<ChartLifecycleManager>,
    pub maps: Rc<MapsController>,
    pub tables: Rc<TablesController>,
    pub coordinator: Rc<CrossFilterCoordinator>,
    pub handlers: Rc<SectionHandlers>,
    pub sequence: SequenceGate,
    pub clicks: Rc<RefCell<Vec<String>>>,
}

pub fn viewport() -> Viewport {
    Viewport {
        width: 1280.0,
        height: 800.0,
    }
}

pub fn api_config() -> ApiConfig {
    ApiConfig {
        base_url: API_BASE.to_string(),
        api_key: None,
    }
}

impl Harness {
    pub fn new() -> Self {
        let transport = Rc::new(CannedTransport::default());
        let probe = Rc::new(ScriptedProbe::new(viewport()));
        let backend = Rc::new(RecordingBackend::default());
        let map_backend = Rc::new(RecordingMapBackend::default());
        let surface = Rc::new(RecordingSurface::default());
        let scheduler = Rc::new(TokioScheduler::default());
        let timings = Timings::default();

        let filters = FilterStore::new();
        let api = Rc::new(ApiClient::new(
            transport.clone(),
            api_config(),
            Rc::clone(&filters),
        ));
        let charts = Rc::new(ChartLifecycleManager::new(
            backend.clone(),
            probe.clone(),
            scheduler.clone(),
            timings,
        ));
        let maps = Rc::new(MapsController::new(map_backend.clone()));
        let tables = Rc::new(TablesController::new(surface.clone()));
        let coordinator = Rc::new(CrossFilterCoordinator::new(
            Rc::clone(&filters),
            Rc::clone(&api),
            Rc::clone(&charts),
            Rc::clone(&maps),
            Rc::clone(&tables),
        ));

        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        let handlers = Rc::new(SectionHandlers {
            api: Rc::clone(&api),
            filters: Rc::clone(&filters),
            charts: Rc::clone(&charts),
            maps: Rc::clone(&maps),
            tables: Rc::clone(&tables),
            surface: surface.clone(),
            cross_filter: Rc::clone(&coordinator),
            on_region_click: Rc::new(move |uf: &str| sink.borrow_mut().push(uf.to_string())),
        });
        let sequence = SequenceGate::new(
            Rc::clone(&api),
            surface.clone(),
            probe.clone(),
            scheduler.clone(),
            timings,
        );

        Self {
            transport,
            probe,
            backend,
            map_backend,
            surface,
            scheduler,
            filters,
            api,
            charts,
            maps,
            tables,
            coordinator,
            handlers,
            sequence,
            clicks,
        }
    }

    /// Fresh doubles shaped for `DashboardContext::new`.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            transport: self.transport.clone(),
            probe: self.probe.clone(),
            scheduler: self.scheduler.clone(),
            renderer: self.backend.clone(),
            maps: self.map_backend.clone(),
            surface: self.surface.clone(),
        }
    }
}
