//! Lazy section loading.
//!
//! Each section fetches and renders once, the first time it scrolls into
//! view. Sections with a zero-area box are re-checked a few times before
//! loading, and a failed load leaves the section eligible for the next
//! intersection.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::config::{ObserverOptions, Timings};
use crate::error::DashboardError;
use crate::scheduler::Scheduler;
use crate::visibility::{intersects, ViewportProbe};

/// Fetches and renders one section.
#[async_trait(?Send)]
pub trait SectionHandler {
    async fn load(&self) -> Result<(), DashboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// Already loaded and not reload-exempt.
    Skipped,
    AlreadyLoading,
    /// Still zero-area after every re-check.
    Deferred,
    Failed(String),
    Unknown,
}

struct Registration {
    id: String,
    handler: Rc<dyn SectionHandler>,
    reload_exempt: bool,
    eager: bool,
}

pub struct SectionLoader {
    probe: Rc<dyn ViewportProbe>,
    scheduler: Rc<dyn Scheduler>,
    timings: Timings,
    observer: ObserverOptions,
    sections: RefCell<Vec<Rc<Registration>>>,
    loaded: RefCell<HashSet<String>>,
    in_flight: RefCell<HashSet<String>>,
    /// In-flight sections asked to reload; they run once more when done.
    pending: RefCell<HashSet<String>>,
}

/// Clears the in-flight and pending marks when the load future completes or
/// is dropped.
struct InFlight<'a> {
    loader: &'a SectionLoader,
    section: &'a str,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.loader.in_flight.borrow_mut().remove(self.section);
        self.loader.pending.borrow_mut().remove(self.section);
    }
}

impl SectionLoader {
    pub fn new(
        probe: Rc<dyn ViewportProbe>,
        scheduler: Rc<dyn Scheduler>,
        timings: Timings,
        observer: ObserverOptions,
    ) -> Self {
        Self {
            probe,
            scheduler,
            timings,
            observer,
            sections: RefCell::new(Vec::new()),
            loaded: RefCell::new(HashSet::new()),
            in_flight: RefCell::new(HashSet::new()),
            pending: RefCell::new(HashSet::new()),
        }
    }

    /// Registers (or replaces) the handler for `section`.
    pub fn register(
        &self,
        section: &str,
        handler: Rc<dyn SectionHandler>,
        reload_exempt: bool,
        eager: bool,
    ) {
        let registration = Rc::new(Registration {
            id: section.to_string(),
            handler,
            reload_exempt,
            eager,
        });
        let mut sections = self.sections.borrow_mut();
        match sections.iter_mut().find(|existing| existing.id == section) {
            Some(existing) => *existing = registration,
            None => sections.push(registration),
        }
    }

    pub fn sections(&self) -> Vec<String> {
        self.sections
            .borrow()
            .iter()
            .map(|registration| registration.id.clone())
            .collect()
    }

    pub fn observer(&self) -> &ObserverOptions {
        &self.observer
    }

    pub fn is_loaded(&self, section: &str) -> bool {
        self.loaded.borrow().contains(section)
    }

    pub fn is_loading(&self, section: &str) -> bool {
        self.in_flight.borrow().contains(section)
    }

    /// Forgets every loaded section.
    pub fn reset(&self) {
        self.loaded.borrow_mut().clear();
    }

    /// Loads the above-the-fold sections without waiting for an intersection.
    pub async fn start(&self) -> Vec<(String, LoadOutcome)> {
        let eager: Vec<Rc<Registration>> = self
            .sections
            .borrow()
            .iter()
            .filter(|registration| registration.eager)
            .cloned()
            .collect();

        join_all(eager.iter().map(|registration| async move {
            let outcome = self.run(registration, false).await;
            (registration.id.clone(), outcome)
        }))
        .await
    }

    /// The section entered the pre-trigger area.
    pub async fn on_intersect(&self, section: &str) -> LoadOutcome {
        let Some(registration) = self.registration(section) else {
            tracing::warn!(section, "no handler registered for section");
            return LoadOutcome::Unknown;
        };
        self.run(&registration, true).await
    }

    /// Evaluates every section against the viewport and loads the ones in
    /// range concurrently.
    pub async fn scan(&self) -> Vec<(String, LoadOutcome)> {
        let viewport = self.probe.viewport();
        let in_range: Vec<String> = self
            .sections()
            .into_iter()
            .filter(|section| {
                self.probe.bounding_rect(section).is_some_and(|rect| {
                    if rect.has_area() {
                        intersects(&rect, &viewport, &self.observer)
                    } else {
                        rect.top < viewport.height + self.observer.root_margin_px
                            && rect.top > -self.observer.root_margin_px
                    }
                })
            })
            .collect();

        join_all(in_range.into_iter().map(|section| async move {
            let outcome = self.on_intersect(&section).await;
            (section, outcome)
        }))
        .await
    }

    /// Loads the given sections again if they were already loaded, e.g. after
    /// a filter change. A section still loading is queued to run once more
    /// when its current load ends. Sections never loaded wait for their
    /// intersection.
    pub async fn reload(&self, sections: &[&str]) -> Vec<(String, LoadOutcome)> {
        let mut due = Vec::new();
        let mut queued = Vec::new();
        for section in sections {
            if self.is_loading(section) {
                tracing::debug!(section, "reload queued behind in-flight load");
                self.pending.borrow_mut().insert((*section).to_string());
                queued.push(((*section).to_string(), LoadOutcome::AlreadyLoading));
            } else if self.loaded.borrow_mut().remove(*section) {
                due.push((*section).to_string());
            }
        }

        let mut outcomes = join_all(due.into_iter().map(|section| async move {
            let outcome = match self.registration(&section) {
                Some(registration) => self.run(&registration, false).await,
                None => LoadOutcome::Unknown,
            };
            (section, outcome)
        }))
        .await;
        outcomes.extend(queued);
        outcomes
    }

    fn registration(&self, section: &str) -> Option<Rc<Registration>> {
        self.sections
            .borrow()
            .iter()
            .find(|registration| registration.id == section)
            .cloned()
    }

    async fn run(&self, registration: &Registration, check_area: bool) -> LoadOutcome {
        let section = registration.id.as_str();

        if self.is_loading(section) {
            tracing::debug!(section, "load already in flight");
            return LoadOutcome::AlreadyLoading;
        }
        if self.is_loaded(section) && !registration.reload_exempt {
            return LoadOutcome::Skipped;
        }

        self.in_flight.borrow_mut().insert(section.to_string());
        let _in_flight = InFlight {
            loader: self,
            section,
        };

        if check_area && !self.wait_for_area(section).await {
            tracing::debug!(section, "section still has no area, deferring");
            return LoadOutcome::Deferred;
        }

        self.scheduler.next_frame().await;

        loop {
            let outcome = self.load_once(registration).await;
            if !self.pending.borrow_mut().remove(section) {
                return outcome;
            }
            tracing::debug!(section, "filters changed mid-load, loading again");
        }
    }

    async fn load_once(&self, registration: &Registration) -> LoadOutcome {
        let section = registration.id.as_str();
        let outcome = match registration.handler.load().await {
            Ok(()) => {
                self.loaded.borrow_mut().insert(section.to_string());
                tracing::debug!(section, "section loaded");
                LoadOutcome::Loaded
            }
            Err(error) => {
                tracing::error!(section, %error, "section failed to load");
                LoadOutcome::Failed(error.user_message())
            }
        };

        if registration.reload_exempt {
            self.scheduler.sleep(self.timings.reload_settle).await;
        }
        outcome
    }

    /// True once the section box has a non-zero area.
    async fn wait_for_area(&self, section: &str) -> bool {
        let has_area = || {
            self.probe
                .bounding_rect(section)
                .is_some_and(|rect| rect.has_area())
        };
        if has_area() {
            return true;
        }

        for attempt in 1..=self.timings.zero_area_max_rechecks {
            self.scheduler.sleep(self.timings.zero_area_recheck).await;
            if has_area() {
                tracing::debug!(section, attempt, "section gained area");
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ApiError;
    use crate::scheduler::TokioScheduler;
    use crate::test_support::ScriptedProbe;
    use crate::visibility::{Rect, Viewport};

    #[derive(Default)]
    struct CountingHandler {
        calls: Cell<u32>,
        failures_left: Cell<u32>,
        latency: Cell<Duration>,
    }

    #[async_trait(?Send)]
    impl SectionHandler for CountingHandler {
        async fn load(&self) -> Result<(), DashboardError> {
            self.calls.set(self.calls.get() + 1);
            tokio::time::sleep(self.latency.get()).await;
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(ApiError::Network {
                    url: "http://api.test/api/saldo/".to_string(),
                    message: "connection refused".to_string(),
                }
                .into());
            }
            Ok(())
        }
    }

    fn loader(probe: &Rc<ScriptedProbe>) -> SectionLoader {
        SectionLoader::new(
            probe.clone(),
            Rc::new(TokioScheduler::default()),
            Timings::default(),
            ObserverOptions::default(),
        )
    }

    fn probe() -> Rc<ScriptedProbe> {
        Rc::new(ScriptedProbe::new(Viewport {
            width: 1280.0,
            height: 800.0,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn section_loads_exactly_once() {
        let probe = probe();
        probe.set_rect("saldo", Rect::new(0.0, 100.0, 1280.0, 600.0));
        let handler = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("saldo", handler.clone(), false, false);

        assert_eq!(loader.on_intersect("saldo").await, LoadOutcome::Loaded);
        assert_eq!(loader.on_intersect("saldo").await, LoadOutcome::Skipped);
        assert_eq!(handler.calls.get(), 1);
        assert!(loader.is_loaded("saldo"));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_retried_on_next_intersection() {
        let probe = probe();
        probe.set_rect("saldo", Rect::new(0.0, 100.0, 1280.0, 600.0));
        let handler = Rc::new(CountingHandler::default());
        handler.failures_left.set(1);
        let loader = loader(&probe);
        loader.register("saldo", handler.clone(), false, false);

        let first = loader.on_intersect("saldo").await;
        assert!(matches!(first, LoadOutcome::Failed(_)));
        assert!(!loader.is_loaded("saldo"));

        assert_eq!(loader.on_intersect("saldo").await, LoadOutcome::Loaded);
        assert_eq!(handler.calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_area_section_is_deferred_then_loaded() {
        let probe = probe();
        probe.script_rects(
            "evolucao",
            vec![
                Some(Rect::new(0.0, 100.0, 0.0, 0.0)),
                Some(Rect::new(0.0, 100.0, 0.0, 0.0)),
                Some(Rect::new(0.0, 100.0, 1280.0, 400.0)),
            ],
        );
        let handler = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("evolucao", handler.clone(), false, false);

        let started = tokio::time::Instant::now();
        assert_eq!(loader.on_intersect("evolucao").await, LoadOutcome::Loaded);

        assert!(started.elapsed() >= Duration::from_millis(400));
        assert_eq!(handler.calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn section_without_area_is_never_loaded() {
        let probe = probe();
        probe.set_rect("evolucao", Rect::new(0.0, 100.0, 0.0, 0.0));
        let handler = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("evolucao", handler.clone(), false, false);

        assert_eq!(loader.on_intersect("evolucao").await, LoadOutcome::Deferred);
        assert_eq!(handler.calls.get(), 0);
        assert!(!loader.is_loaded("evolucao"));
        assert!(!loader.is_loading("evolucao"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_triggers_run_the_handler_once() {
        let probe = probe();
        probe.set_rect("saldo", Rect::new(0.0, 100.0, 1280.0, 600.0));
        let handler = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("saldo", handler.clone(), false, false);

        let (first, second) =
            futures::join!(loader.on_intersect("saldo"), loader.on_intersect("saldo"));

        assert_eq!(first, LoadOutcome::Loaded);
        assert_eq!(second, LoadOutcome::AlreadyLoading);
        assert_eq!(handler.calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_exempt_section_settles_before_loading_again() {
        let probe = probe();
        probe.set_rect("reiteracoes", Rect::new(0.0, 100.0, 1280.0, 600.0));
        let handler = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("reiteracoes", handler.clone(), true, false);

        let (first, during_settle) = futures::join!(loader.on_intersect("reiteracoes"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            loader.on_intersect("reiteracoes").await
        });
        assert_eq!(first, LoadOutcome::Loaded);
        assert_eq!(during_settle, LoadOutcome::AlreadyLoading);

        assert_eq!(loader.on_intersect("reiteracoes").await, LoadOutcome::Loaded);
        assert_eq!(handler.calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_loads_eager_sections_without_geometry() {
        let probe = probe();
        let eager = Rc::new(CountingHandler::default());
        let lazy = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("entradas-encerrados", eager.clone(), false, true);
        loader.register("saldo", lazy.clone(), false, false);

        let outcomes = loader.start().await;

        assert_eq!(
            outcomes,
            vec![("entradas-encerrados".to_string(), LoadOutcome::Loaded)]
        );
        assert_eq!(eager.calls.get(), 1);
        assert_eq!(lazy.calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_loads_only_sections_in_range() {
        let probe = probe();
        probe.set_rect("saldo", Rect::new(0.0, 100.0, 1280.0, 600.0));
        probe.set_rect("casos-criticos", Rect::new(0.0, 3000.0, 1280.0, 600.0));
        let near = Rc::new(CountingHandler::default());
        let far = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("saldo", near.clone(), false, false);
        loader.register("casos-criticos", far.clone(), false, false);

        let outcomes = loader.scan().await;

        assert_eq!(outcomes, vec![("saldo".to_string(), LoadOutcome::Loaded)]);
        assert_eq!(far.calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_only_touches_loaded_sections() {
        let probe = probe();
        probe.set_rect("saldo", Rect::new(0.0, 100.0, 1280.0, 600.0));
        let saldo = Rc::new(CountingHandler::default());
        let evolucao = Rc::new(CountingHandler::default());
        let loader = loader(&probe);
        loader.register("saldo", saldo.clone(), false, false);
        loader.register("evolucao", evolucao.clone(), false, false);
        loader.on_intersect("saldo").await;

        let outcomes = loader.reload(&["saldo", "evolucao"]).await;

        assert_eq!(outcomes, vec![("saldo".to_string(), LoadOutcome::Loaded)]);
        assert_eq!(saldo.calls.get(), 2);
        assert_eq!(evolucao.calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reload_during_a_load_runs_it_again_afterwards() {
        let probe = probe();
        probe.set_rect("saldo", Rect::new(0.0, 100.0, 1280.0, 600.0));
        let handler = Rc::new(CountingHandler::default());
        handler.latency.set(Duration::from_millis(100));
        let loader = loader(&probe);
        loader.register("saldo", handler.clone(), false, false);

        let (first, reloaded) = futures::join!(loader.on_intersect("saldo"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.reload(&["saldo"]).await
        });

        assert_eq!(first, LoadOutcome::Loaded);
        assert_eq!(
            reloaded,
            vec![("saldo".to_string(), LoadOutcome::AlreadyLoading)]
        );
        assert_eq!(handler.calls.get(), 2);
        assert!(loader.is_loaded("saldo"));
        assert!(!loader.is_loading("saldo"));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_section_is_reported() {
        let loader = loader(&probe());
        assert_eq!(loader.on_intersect("nada").await, LoadOutcome::Unknown);
    }
}
