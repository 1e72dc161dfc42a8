use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::ListenerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Uf,
    Objeto,
}

impl FilterKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uf => "uf",
            Self::Objeto => "objeto",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub uf: Option<String>,
    pub objeto: Option<String>,
}

impl FilterState {
    pub fn get(&self, kind: FilterKind) -> Option<&str> {
        match kind {
            FilterKind::Uf => self.uf.as_deref(),
            FilterKind::Objeto => self.objeto.as_deref(),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.uf.is_none() && self.objeto.is_none()
    }
}

pub type ListenerResult = Result<(), ListenerError>;
pub type Listener = Rc<dyn Fn(&FilterState) -> ListenerResult>;

/// Wraps a closure as a [`Listener`]. Keep the returned `Rc` to unsubscribe later.
pub fn listener<F>(callback: F) -> Listener
where
    F: Fn(&FilterState) -> ListenerResult + 'static,
{
    Rc::new(callback)
}

/// Every mutation notifies every listener synchronously, in subscription
/// order, with a full snapshot. No borrow is held while listeners run, so a
/// listener may read, mutate or unsubscribe re-entrantly.
#[derive(Default)]
pub struct FilterStore {
    state: RefCell<FilterState>,
    listeners: RefCell<Vec<Listener>>,
}

impl std::fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStore")
            .field("state", &self.state.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl FilterStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn set_filter(&self, kind: FilterKind, value: Option<String>) {
        {
            let mut state = self.state.borrow_mut();
            match kind {
                FilterKind::Uf => state.uf = value,
                FilterKind::Objeto => state.objeto = value,
            }
        }
        tracing::debug!(filter = kind.as_str(), "filter updated");
        self.notify();
    }

    /// Owned snapshot; mutating it never reaches the store.
    pub fn filters(&self) -> FilterState {
        self.state.borrow().clone()
    }

    pub fn get(&self, kind: FilterKind) -> Option<String> {
        self.state.borrow().get(kind).map(str::to_string)
    }

    pub fn clear_filters(&self) {
        *self.state.borrow_mut() = FilterState::default();
        self.notify();
    }

    pub fn subscribe(&self, listener: Listener) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Removes every registration of `listener`.
    pub fn unsubscribe(&self, listener: &Listener) {
        self.listeners
            .borrow_mut()
            .retain(|existing| !std::ptr::addr_eq(Rc::as_ptr(existing), Rc::as_ptr(listener)));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn notify(&self) {
        let snapshot = self.filters();
        let listeners = self.listeners.borrow().clone();

        for (index, listener) in listeners.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(&snapshot))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::error!(listener = index, %error, "filter listener failed");
                }
                Err(_) => {
                    tracing::error!(listener = index, "filter listener panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn counter(store: &FilterStore) -> Rc<Cell<usize>> {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        store.subscribe(listener(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        }));
        calls
    }

    #[test]
    fn last_value_wins_and_each_mutation_broadcasts_once() {
        let store = FilterStore::new();
        let calls = counter(&store);

        store.set_filter(FilterKind::Uf, Some("SP".to_string()));
        store.set_filter(FilterKind::Objeto, Some("Cobrança".to_string()));
        store.set_filter(FilterKind::Uf, Some("RJ".to_string()));
        store.clear_filters();
        store.set_filter(FilterKind::Uf, Some("PA".to_string()));
        store.set_filter(FilterKind::Uf, Some("PA".to_string()));

        assert_eq!(calls.get(), 6);
        assert_eq!(
            store.filters(),
            FilterState {
                uf: Some("PA".to_string()),
                objeto: None,
            }
        );
    }

    #[test]
    fn listeners_receive_full_snapshot() {
        let store = FilterStore::new();
        let last = Rc::new(RefCell::new(FilterState::default()));
        let sink = Rc::clone(&last);
        store.subscribe(listener(move |filters| {
            *sink.borrow_mut() = filters.clone();
            Ok(())
        }));

        store.set_filter(FilterKind::Uf, Some("SP".to_string()));
        store.set_filter(FilterKind::Objeto, Some("Danos".to_string()));

        assert_eq!(last.borrow().uf.as_deref(), Some("SP"));
        assert_eq!(last.borrow().objeto.as_deref(), Some("Danos"));
    }

    #[test]
    fn snapshot_copy_does_not_leak_back_into_store() {
        let store = FilterStore::new();
        store.set_filter(FilterKind::Uf, Some("SP".to_string()));

        let mut copy = store.filters();
        copy.uf = Some("RJ".to_string());

        assert_eq!(store.get(FilterKind::Uf).as_deref(), Some("SP"));
    }

    #[test]
    fn failing_and_panicking_listeners_do_not_block_later_ones() {
        let store = FilterStore::new();
        store.subscribe(listener(|_| Err(ListenerError("nope".to_string()))));
        store.subscribe(listener(|_| panic!("listener exploded")));
        let calls = counter(&store);

        store.set_filter(FilterKind::Uf, Some("SP".to_string()));
        store.clear_filters();

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn unsubscribe_removes_every_registration_of_the_callback() {
        let store = FilterStore::new();
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let cb = listener(move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        store.subscribe(Rc::clone(&cb));
        store.subscribe(Rc::clone(&cb));
        store.set_filter(FilterKind::Uf, None);
        assert_eq!(calls.get(), 2);

        store.unsubscribe(&cb);
        store.set_filter(FilterKind::Uf, None);
        assert_eq!(calls.get(), 2);
        assert_eq!(store.listener_count(), 0);

        store.unsubscribe(&cb);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn listener_may_reenter_the_store() {
        let store = FilterStore::new();
        let weak = Rc::downgrade(&store);
        store.subscribe(listener(move |filters| {
            if filters.uf.as_deref() == Some("SP") {
                if let Some(store) = weak.upgrade() {
                    store.set_filter(FilterKind::Objeto, Some("Danos".to_string()));
                }
            }
            Ok(())
        }));

        store.set_filter(FilterKind::Uf, Some("SP".to_string()));

        assert_eq!(store.get(FilterKind::Objeto).as_deref(), Some("Danos"));
    }
}
