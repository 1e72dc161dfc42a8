use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use futures::future::join_all;

use crate::api::ApiClient;
use crate::config::Timings;
use crate::error::DashboardError;
use crate::format::format_number;
use crate::scheduler::Scheduler;
use crate::surface::{Animatable, Surface};
use crate::visibility::{is_rect_visible, ViewportProbe};

pub const KPI_TOTAL_CASOS: &str = "kpi-total-casos";
pub const ANIMATE_CLASS: &str = "animate-in";

pub struct SequenceGate {
    api: Rc<ApiClient>,
    surface: Rc<dyn Surface>,
    probe: Rc<dyn ViewportProbe>,
    scheduler: Rc<dyn Scheduler>,
    timings: Timings,
    recorded: RefCell<HashSet<String>>,
}

impl SequenceGate {
    pub fn new(
        api: Rc<ApiClient>,
        surface: Rc<dyn Surface>,
        probe: Rc<dyn ViewportProbe>,
        scheduler: Rc<dyn Scheduler>,
        timings: Timings,
    ) -> Self {
        Self {
            api,
            surface,
            probe,
            scheduler,
            timings,
            recorded: RefCell::new(HashSet::new()),
        }
    }

    /// Runs the whole sequence; resolves once the fallback has fired.
    pub async fn start(&self) {
        let summary_then_visible = async {
            if let Err(error) = self.load_summary().await {
                tracing::warn!(%error, "cover summary unavailable");
            }
            self.activate_visible().await
        };
        let (activated, forced) = futures::join!(summary_then_visible, self.fallback());
        tracing::debug!(activated, forced, "entrance sequence finished");
    }

    pub async fn load_summary(&self) -> Result<(), DashboardError> {
        let kpis = self.api.kpis_finais().await?;
        self.surface
            .set_text(KPI_TOTAL_CASOS, &format_number(kpis.total_casos));
        Ok(())
    }

    /// Records `element` and adds the entrance class after its delay. An
    /// element is activated at most once this way.
    pub async fn activate(&self, element: &Animatable) {
        if !self.recorded.borrow_mut().insert(element.id.clone()) {
            return;
        }
        self.reveal(element).await;
    }

    /// An animatable element scrolled into view after startup. Returns
    /// whether it was activated by this call.
    pub async fn element_entered(&self, id: &str) -> bool {
        if self.is_recorded(id) {
            return false;
        }
        let Some(element) = self
            .surface
            .animatables()
            .into_iter()
            .find(|element| element.id == id)
        else {
            tracing::debug!(element = id, "not an animatable element");
            return false;
        };
        self.activate(&element).await;
        true
    }

    pub fn is_recorded(&self, element: &str) -> bool {
        self.recorded.borrow().contains(element)
    }

    /// Activates every element currently on screen. Returns how many.
    pub async fn activate_visible(&self) -> usize {
        let visible: Vec<Animatable> = self
            .surface
            .animatables()
            .into_iter()
            .filter(|element| !self.is_recorded(&element.id) && self.is_visible(&element.id))
            .collect();

        join_all(visible.iter().map(|element| self.activate(element))).await;
        visible.len()
    }

    /// After the fallback delay, forces the entrance class on visible
    /// elements nobody activated and on recorded elements that never got it,
    /// then shows every visualization container. Returns how many elements
    /// were forced.
    pub async fn fallback(&self) -> usize {
        self.scheduler.sleep(self.timings.sequence_fallback).await;

        let forced: Vec<Animatable> = self
            .surface
            .animatables()
            .into_iter()
            .filter(|element| {
                if self.is_recorded(&element.id) {
                    !self.surface.has_class(&element.id, ANIMATE_CLASS)
                } else {
                    self.is_visible(&element.id)
                }
            })
            .collect();

        for element in &forced {
            self.recorded.borrow_mut().insert(element.id.clone());
        }
        join_all(forced.iter().map(|element| self.reveal(element))).await;

        for container in self.surface.visualization_containers() {
            if !self.surface.has_class(&container, ANIMATE_CLASS) {
                self.surface.add_class(&container, ANIMATE_CLASS);
            }
            self.surface.set_visible(&container, true);
        }

        if !forced.is_empty() {
            tracing::debug!(count = forced.len(), "fallback forced entrance animations");
        }
        forced.len()
    }

    async fn reveal(&self, element: &Animatable) {
        if !element.delay.is_zero() {
            self.scheduler.sleep(element.delay).await;
        }
        self.surface.add_class(&element.id, ANIMATE_CLASS);
    }

    fn is_visible(&self, element: &str) -> bool {
        self.probe
            .bounding_rect(element)
            .is_some_and(|rect| is_rect_visible(&rect, &self.probe.viewport()))
    }
}
