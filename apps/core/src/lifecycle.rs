//! Chart widget lifecycle: creation under a single-flight lock, retries,
//! debounced resize and teardown, keyed by a stable widget id.
//!
//! A widget moves `Idle -> Locked -> Created`, or `Idle -> Locked -> Idle`
//! when creation fails. At most one live instance exists per id.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;

use crate::config::Timings;
use crate::render::{ChartConfig, RenderBackend, ResizeWatch, WidgetRef};
use crate::scheduler::Scheduler;
use crate::visibility::{Size, ViewportProbe, VisibilityGate};

pub const DEFAULT_WIDGET_SIZE: Size = Size::new(800.0, 400.0);

/// Advisory creation guard. A lock at least `Timings::stale_lock` old is
/// always reclaimable. `owner` tells a reclaimed lock apart from its
/// successor so a late release cannot clear the new holder's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationLock {
    pub locked: bool,
    pub since: Duration,
    pub owner: u64,
}

/// Handed out with a lock; only the matching ticket releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a lock is only released with its ticket"]
pub struct LockTicket {
    owner: u64,
}

impl CreationLock {
    fn is_held(&self, now: Duration, stale_after: Duration) -> LockCheck {
        if !self.locked {
            LockCheck::Free
        } else if now.saturating_sub(self.since) >= stale_after {
            LockCheck::Stale
        } else {
            LockCheck::Held
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockCheck {
    Free,
    Held,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Idle,
    Locked,
    Created,
}

#[derive(Default)]
struct Slot {
    handle: Option<WidgetRef>,
    watch: Option<Box<dyn ResizeWatch>>,
    lock: Option<CreationLock>,
    resize_generation: Rc<Cell<u64>>,
}

impl Slot {
    fn is_empty(&self) -> bool {
        self.handle.is_none() && self.watch.is_none() && self.lock.is_none()
    }
}

pub struct ChartLifecycleManager {
    backend: Rc<dyn RenderBackend>,
    probe: Rc<dyn ViewportProbe>,
    scheduler: Rc<dyn Scheduler>,
    gate: VisibilityGate,
    timings: Timings,
    slots: RefCell<HashMap<String, Slot>>,
    next_owner: Cell<u64>,
}

/// Releases its own widget lock when dropped, including when the owning
/// future is dropped mid-retry.
struct LockGuard<'a> {
    manager: &'a ChartLifecycleManager,
    id: &'a str,
    ticket: LockTicket,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.manager.unlock(self.id, self.ticket);
    }
}

impl ChartLifecycleManager {
    pub fn new(
        backend: Rc<dyn RenderBackend>,
        probe: Rc<dyn ViewportProbe>,
        scheduler: Rc<dyn Scheduler>,
        timings: Timings,
    ) -> Self {
        let gate = VisibilityGate::new(Rc::clone(&probe), Rc::clone(&scheduler));
        Self {
            backend,
            probe,
            scheduler,
            gate,
            timings,
            slots: RefCell::new(HashMap::new()),
            next_owner: Cell::new(0),
        }
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub fn backend(&self) -> &Rc<dyn RenderBackend> {
        &self.backend
    }

    /// Creates (or replaces) the widget `id`. While another creation holds a
    /// fresh lock the current handle is returned instead, if any.
    pub fn create(&self, id: &str, config: &ChartConfig) -> Option<WidgetRef> {
        if let Some(existing) = self.check_in_flight(id) {
            tracing::debug!(widget = id, "creation already in flight");
            return existing;
        }

        let _guard = self.acquire(id);
        self.create_locked(id, config)
    }

    /// Waits for the target to exist and be visible before creating, with
    /// `retry_delay * attempt` backoff between attempts.
    pub async fn create_with_retry(
        &self,
        id: &str,
        config: &ChartConfig,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Option<WidgetRef> {
        if self.check_in_flight(id).is_some() {
            tracing::debug!(widget = id, "waiting for in-flight creation");
            for _ in 0..self.timings.in_flight_max_polls {
                if !self.is_locked(id) {
                    break;
                }
                self.scheduler.sleep(self.timings.in_flight_poll).await;
            }
            return self.handle(id);
        }

        let _guard = self.acquire(id);

        for attempt in 1..=max_attempts {
            if !self.probe.exists(id) {
                tracing::debug!(widget = id, attempt, "target not in document");
                if attempt < max_attempts {
                    self.scheduler.sleep(retry_delay).await;
                    continue;
                }
                break;
            }

            if let Err(error) = self
                .gate
                .await_visible(id, self.timings.visibility_timeout)
                .await
            {
                if attempt < max_attempts {
                    tracing::debug!(widget = id, attempt, %error, "target not visible yet");
                    self.scheduler.sleep(retry_delay * attempt).await;
                    continue;
                }
                tracing::warn!(widget = id, attempt, %error, "creating without visibility");
            }

            if let Some(handle) = self.create_locked(id, config) {
                return Some(handle);
            }

            if attempt < max_attempts {
                self.scheduler.sleep(retry_delay * attempt).await;
            }
        }

        tracing::warn!(widget = id, attempts = max_attempts, "widget creation gave up");
        None
    }

    /// Tears the widget down. Idempotent.
    pub fn destroy(&self, id: &str) {
        let slot = self.slots.borrow_mut().remove(id);
        if let Some(slot) = slot {
            Self::teardown(id, slot);
        }
    }

    pub fn destroy_all(&self) {
        for id in self.ids() {
            self.destroy(&id);
        }
    }

    /// Replaces the widget with a short message.
    pub fn show_error(&self, id: &str, message: &str) {
        self.destroy(id);
        self.backend.show_error(id, message);
    }

    pub fn handle(&self, id: &str) -> Option<WidgetRef> {
        self.slots
            .borrow()
            .get(id)
            .and_then(|slot| slot.handle.clone())
    }

    pub fn state(&self, id: &str) -> WidgetState {
        let now = self.scheduler.now();
        let slots = self.slots.borrow();
        let Some(slot) = slots.get(id) else {
            return WidgetState::Idle;
        };

        let locked = slot
            .lock
            .is_some_and(|lock| lock.is_held(now, self.timings.stale_lock) == LockCheck::Held);

        if locked {
            WidgetState::Locked
        } else if slot.handle.is_some() {
            WidgetState::Created
        } else {
            WidgetState::Idle
        }
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.slots.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Takes the lock for a caller that guards a whole fetch+render sequence.
    /// `None` while someone else holds a fresh lock on `id`.
    pub fn try_lock(&self, id: &str) -> Option<LockTicket> {
        if self.check_in_flight(id).is_some() {
            return None;
        }
        Some(self.set_lock(id))
    }

    /// Clears the lock on `id` if `ticket` still owns it. A lock that was
    /// reclaimed as stale and taken by another caller is left alone.
    pub fn unlock(&self, id: &str, ticket: LockTicket) {
        let mut slots = self.slots.borrow_mut();
        let Some(slot) = slots.get_mut(id) else {
            return;
        };
        match slot.lock {
            Some(lock) if lock.owner == ticket.owner => slot.lock = None,
            Some(_) => {
                tracing::debug!(widget = id, "lock changed hands, leaving it");
                return;
            }
            None => {}
        }
        if slot.is_empty() {
            slots.remove(id);
        }
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.state(id) == WidgetState::Locked
    }

    /// `Some(existing)` when a fresh lock is held; reclaims stale locks.
    fn check_in_flight(&self, id: &str) -> Option<Option<WidgetRef>> {
        let now = self.scheduler.now();
        let mut slots = self.slots.borrow_mut();
        let slot = slots.get_mut(id)?;
        let lock = slot.lock?;

        match lock.is_held(now, self.timings.stale_lock) {
            LockCheck::Free => None,
            LockCheck::Held => Some(slot.handle.clone()),
            LockCheck::Stale => {
                tracing::warn!(
                    widget = id,
                    age_ms = now.saturating_sub(lock.since).as_millis(),
                    "reclaiming stale creation lock"
                );
                slot.lock = None;
                None
            }
        }
    }

    fn set_lock(&self, id: &str) -> LockTicket {
        let owner = self.next_owner.get().wrapping_add(1);
        self.next_owner.set(owner);
        let since = self.scheduler.now();
        self.slots
            .borrow_mut()
            .entry(id.to_string())
            .or_default()
            .lock = Some(CreationLock {
            locked: true,
            since,
            owner,
        });
        LockTicket { owner }
    }

    fn acquire<'a>(&'a self, id: &'a str) -> LockGuard<'a> {
        let ticket = self.set_lock(id);
        LockGuard {
            manager: self,
            id,
            ticket,
        }
    }

    /// Replaces the widget; the caller holds the lock. No borrow of the slot
    /// map is held while the backend runs.
    fn create_locked(&self, id: &str, config: &ChartConfig) -> Option<WidgetRef> {
        let (previous, watch) = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots.entry(id.to_string()).or_default();
            (slot.handle.take(), slot.watch.take())
        };
        Self::release(id, previous, watch);

        if !self.backend.is_available() {
            tracing::error!(widget = id, "rendering backend unavailable");
            return None;
        }

        if !self.probe.exists(id) {
            tracing::warn!(widget = id, "target element not found");
            return None;
        }

        let size = self.resolve_size(id);
        let handle = match self.backend.create(id, config, size) {
            Ok(handle) => handle,
            Err(error) => {
                tracing::error!(widget = id, %error, "widget creation failed");
                return None;
            }
        };

        let generation = self
            .slots
            .borrow_mut()
            .entry(id.to_string())
            .or_default()
            .resize_generation
            .clone();
        let watch = self
            .backend
            .observe_resize(id, self.resize_callback(&handle, generation));

        {
            let mut slots = self.slots.borrow_mut();
            let slot = slots.entry(id.to_string()).or_default();
            slot.handle = Some(Rc::clone(&handle));
            slot.watch = watch;
        }

        tracing::debug!(
            widget = id,
            width = size.width,
            height = size.height,
            "widget created"
        );
        Some(handle)
    }

    /// Container size, then the element's own box, then a fixed default.
    fn resolve_size(&self, id: &str) -> Size {
        if let Some(size) = self.probe.container_size(id).filter(|size| !size.is_empty()) {
            return size;
        }

        self.probe.bounding_rect(id).map_or(DEFAULT_WIDGET_SIZE, |rect| {
            Size::new(
                if rect.width > 0.0 {
                    rect.width
                } else {
                    DEFAULT_WIDGET_SIZE.width
                },
                if rect.height > 0.0 {
                    rect.height
                } else {
                    DEFAULT_WIDGET_SIZE.height
                },
            )
        })
    }

    /// Debounced: only the last notification within the window resizes, and
    /// never a destroyed widget.
    fn resize_callback(&self, handle: &WidgetRef, generation: Rc<Cell<u64>>) -> Rc<dyn Fn()> {
        let weak = Rc::downgrade(handle);
        let scheduler = Rc::clone(&self.scheduler);
        let debounce = self.timings.resize_debounce;

        Rc::new(move || {
            let ticket = generation.get().wrapping_add(1);
            generation.set(ticket);

            let weak = weak.clone();
            let generation = Rc::clone(&generation);
            let delay = scheduler.sleep(debounce);
            scheduler.spawn(
                async move {
                    delay.await;
                    if generation.get() != ticket {
                        return;
                    }
                    let Some(handle) = weak.upgrade() else {
                        return;
                    };
                    let destroyed = handle.borrow().is_destroyed();
                    if !destroyed {
                        handle.borrow_mut().resize();
                    }
                }
                .boxed_local(),
            );
        })
    }

    fn teardown(id: &str, mut slot: Slot) {
        Self::release(id, slot.handle.take(), slot.watch.take());
    }

    fn release(id: &str, handle: Option<WidgetRef>, watch: Option<Box<dyn ResizeWatch>>) {
        if let Some(mut watch) = watch {
            watch.disconnect();
        }
        if let Some(handle) = handle {
            if let Err(error) = handle.borrow_mut().destroy() {
                tracing::debug!(widget = id, %error, "ignoring destroy failure");
            }
        }
    }
}
