use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ObserverOptions;
use crate::error::VisibilityTimeout;
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Layout source. The browser answers from the live DOM, tests from a script.
pub trait ViewportProbe {
    fn viewport(&self) -> Viewport;

    /// `None` when the element is not in the document.
    fn bounding_rect(&self, element: &str) -> Option<Rect>;

    /// Client size of the element's container, if it has one.
    fn container_size(&self, element: &str) -> Option<Size>;

    fn exists(&self, element: &str) -> bool {
        self.bounding_rect(element).is_some()
    }
}

/// Overlap on both axes with a non-zero box.
pub fn is_rect_visible(rect: &Rect, viewport: &Viewport) -> bool {
    rect.has_area()
        && rect.top < viewport.height
        && rect.bottom() > 0.0
        && rect.left < viewport.width
        && rect.right() > 0.0
}

/// IntersectionObserver semantics: the viewport grown by `root_margin_px` on
/// every side, and at least `threshold` of the element's area inside it.
pub fn intersects(rect: &Rect, viewport: &Viewport, options: &ObserverOptions) -> bool {
    if !rect.has_area() {
        return false;
    }

    let margin = options.root_margin_px;
    let overlap_w = (rect.right().min(viewport.width + margin) - rect.left.max(-margin)).max(0.0);
    let overlap_h = (rect.bottom().min(viewport.height + margin) - rect.top.max(-margin)).max(0.0);
    let visible = overlap_w * overlap_h;

    visible > 0.0 && visible / rect.area() >= options.threshold
}

pub struct VisibilityGate {
    probe: Rc<dyn ViewportProbe>,
    scheduler: Rc<dyn Scheduler>,
}

impl VisibilityGate {
    pub fn new(probe: Rc<dyn ViewportProbe>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self { probe, scheduler }
    }

    pub fn is_visible(&self, element: &str) -> bool {
        self.probe
            .bounding_rect(element)
            .is_some_and(|rect| is_rect_visible(&rect, &self.probe.viewport()))
    }

    /// Resolves with the element's box once it is visible, polling once per frame.
    pub async fn await_visible(
        &self,
        element: &str,
        timeout: Duration,
    ) -> Result<Rect, VisibilityTimeout> {
        let started = self.scheduler.now();

        loop {
            if let Some(rect) = self.visible_rect(element) {
                return Ok(rect);
            }

            let waited = self.scheduler.now().saturating_sub(started);
            if waited >= timeout {
                tracing::debug!(
                    element,
                    waited_ms = waited.as_millis(),
                    "visibility wait timed out"
                );
                return Err(VisibilityTimeout {
                    element: element.to_string(),
                    waited,
                });
            }

            self.scheduler.next_frame().await;
        }
    }

    fn visible_rect(&self, element: &str) -> Option<Rect> {
        let rect = self.probe.bounding_rect(element)?;
        is_rect_visible(&rect, &self.probe.viewport()).then_some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TokioScheduler;
    use crate::test_support::ScriptedProbe;

    fn viewport() -> Viewport {
        Viewport {
            width: 1280.0,
            height: 800.0,
        }
    }

    #[test]
    fn visibility_requires_overlap_and_size() {
        let vp = viewport();
        assert!(is_rect_visible(&Rect::new(0.0, 100.0, 300.0, 200.0), &vp));
        assert!(!is_rect_visible(&Rect::new(0.0, 900.0, 300.0, 200.0), &vp));
        assert!(!is_rect_visible(&Rect::new(0.0, -300.0, 300.0, 200.0), &vp));
        assert!(!is_rect_visible(&Rect::new(0.0, 100.0, 0.0, 200.0), &vp));
        assert!(!is_rect_visible(&Rect::new(1400.0, 100.0, 300.0, 200.0), &vp));
    }

    #[test]
    fn root_margin_pre_triggers_sections_below_the_fold() {
        let vp = viewport();
        let options = ObserverOptions::default();
        // 100px tall section starting 150px below the viewport: half of it inside the margin.
        assert!(intersects(&Rect::new(0.0, 950.0, 1280.0, 100.0), &vp, &options));
        // Too far below.
        assert!(!intersects(&Rect::new(0.0, 1100.0, 1280.0, 100.0), &vp, &options));
    }

    #[test]
    fn threshold_rejects_slivers() {
        let vp = viewport();
        let options = ObserverOptions::default();
        // 1000px tall section with only 100px inside viewport + margin: 10%.
        assert!(!intersects(&Rect::new(0.0, 900.0, 1280.0, 1000.0), &vp, &options));
        assert!(!intersects(&Rect::new(0.0, 0.0, 0.0, 0.0), &vp, &options));
    }

    #[tokio::test(start_paused = true)]
    async fn already_visible_resolves_without_waiting_a_frame() {
        let probe = Rc::new(ScriptedProbe::new(viewport()));
        probe.set_rect("chart-a", Rect::new(0.0, 0.0, 100.0, 100.0));
        let scheduler = Rc::new(TokioScheduler::default());
        let gate = VisibilityGate::new(probe.clone(), scheduler.clone());

        let before = scheduler.now();
        let rect = gate.await_visible("chart-a", Duration::from_secs(2)).await;

        assert!(rect.is_ok());
        assert_eq!(scheduler.now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn becomes_visible_after_a_few_frames() {
        let probe = Rc::new(ScriptedProbe::new(viewport()));
        probe.script_rects(
            "chart-a",
            vec![
                Some(Rect::new(0.0, 0.0, 0.0, 0.0)),
                Some(Rect::new(0.0, 0.0, 0.0, 0.0)),
                Some(Rect::new(0.0, 0.0, 400.0, 300.0)),
            ],
        );
        let gate = VisibilityGate::new(probe.clone(), Rc::new(TokioScheduler::default()));

        let rect = gate.await_visible("chart-a", Duration::from_secs(2)).await;

        assert_eq!(rect.map(|r| r.width), Ok(400.0));
        assert_eq!(probe.lookups("chart-a"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_never_visible() {
        let probe = Rc::new(ScriptedProbe::new(viewport()));
        probe.set_rect("chart-a", Rect::new(0.0, 2000.0, 100.0, 100.0));
        let gate = VisibilityGate::new(probe, Rc::new(TokioScheduler::default()));

        let error = gate
            .await_visible("chart-a", Duration::from_millis(100))
            .await
            .unwrap_err();

        assert_eq!(error.element, "chart-a");
        assert!(error.waited >= Duration::from_millis(100));
    }
}
