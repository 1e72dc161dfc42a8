use std::rc::Rc;

use painel_core::config::ObserverOptions;
use painel_core::surface::Surface;
use painel_core::DashboardContext;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
};

use crate::animation::ANIMATION_THRESHOLD;
use crate::dom::DomSurface;

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// `rootMargin` string for the observer options.
pub fn root_margin(options: &ObserverOptions) -> String {
    format!("{}px", options.root_margin_px)
}

/// Feeds intersection events for every registered section to the loader.
/// The observer and its callback stay alive for the page's lifetime.
pub fn observe_sections(context: &Rc<DashboardContext>) -> Result<(), JsValue> {
    let document = document()?;

    let callback = {
        let context = Rc::clone(context);
        Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let section = entry.target().id();
                    let context = Rc::clone(&context);
                    wasm_bindgen_futures::spawn_local(async move {
                        let outcome = context.loader().on_intersect(&section).await;
                        tracing::debug!(section = %section, ?outcome, "section intersected");
                    });
                }
            },
        )
    };

    let options = context.loader().observer();
    let init = IntersectionObserverInit::new();
    init.set_root_margin(&root_margin(options));
    init.set_threshold(&JsValue::from_f64(options.threshold));

    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
    for section in context.loader().sections() {
        match document.get_element_by_id(&section) {
            Some(element) => observer.observe(&element),
            None => tracing::debug!(section = %section, "section not in document"),
        }
    }
    callback.forget();
    Ok(())
}

/// Starts the entrance animation of each animatable element the first time it
/// scrolls into view, then stops watching it.
pub fn observe_animatables(context: &Rc<DashboardContext>) -> Result<(), JsValue> {
    let document = document()?;

    let callback = {
        let context = Rc::clone(context);
        Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    observer.unobserve(&target);
                    let element = target.id();
                    let context = Rc::clone(&context);
                    wasm_bindgen_futures::spawn_local(async move {
                        let activated = context.sequence().element_entered(&element).await;
                        tracing::trace!(element = %element, activated, "element entered");
                    });
                }
            },
        )
    };

    let init = IntersectionObserverInit::new();
    init.set_threshold(&JsValue::from_f64(ANIMATION_THRESHOLD));
    let observer =
        IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
    for animatable in DomSurface.animatables() {
        if let Some(element) = document.get_element_by_id(&animatable.id) {
            observer.observe(&element);
        }
    }
    callback.forget();
    Ok(())
}
