mod animation;
mod chart_js;
mod dom;
mod fetch;
mod interactions;
mod leaflet;
mod logging;
mod observer;
mod scheduler;

use std::rc::Rc;

use painel_core::config::{ApiConfig, InjectedConfig};
use painel_core::context::Collaborators;
use painel_core::sections::LoadOutcome;
use painel_core::DashboardContext;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use crate::chart_js::ChartJsBackend;
use crate::dom::{DomProbe, DomSurface};
use crate::fetch::FetchTransport;
use crate::leaflet::LeafletBackend;
use crate::scheduler::BrowserScheduler;

fn window_global(name: &str) -> Option<JsValue> {
    let window = web_sys::window()?;
    js_sys::Reflect::get(&window, &JsValue::from_str(name))
        .ok()
        .filter(|value| !value.is_undefined() && !value.is_null())
}

/// `window.API_BASE_URL` and `window.API_KEY`, when the page sets them.
fn injected_config() -> InjectedConfig {
    InjectedConfig {
        base_url: window_global("API_BASE_URL").and_then(|value| value.as_string()),
        api_key: window_global("API_KEY").and_then(|value| value.as_string()),
    }
}

fn main() {
    logging::init(window_global("PAINEL_DEBUG").is_some_and(|value| value.is_truthy()));

    let config = ApiConfig::resolve(&injected_config());
    tracing::info!(base_url = %config.base_url, "starting dashboard");

    let context = DashboardContext::new(
        Collaborators {
            transport: Rc::new(FetchTransport),
            probe: Rc::new(DomProbe),
            scheduler: Rc::new(BrowserScheduler),
            renderer: Rc::new(ChartJsBackend),
            maps: Rc::new(LeafletBackend),
            surface: Rc::new(DomSurface),
        },
        config,
    );

    if let Err(error) = observer::observe_sections(&context) {
        tracing::error!(?error, "section observer unavailable");
    }
    if let Err(error) = interactions::bind(&context) {
        tracing::error!(?error, "table interactions unavailable");
    }

    spawn_local(async move {
        let mut outcomes = context.start().await;
        if let Err(error) = observer::observe_animatables(&context) {
            tracing::error!(?error, "animation observer unavailable");
        }
        outcomes.extend(context.loader().scan().await);
        for (section, outcome) in outcomes {
            if let LoadOutcome::Failed(reason) = outcome {
                tracing::warn!(section = %section, %reason, "section failed to load");
            }
        }
    });
}
