use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use painel_core::scheduler::Scheduler;
use wasm_bindgen_futures::JsFuture;

/// Timers through `gloo-timers`, frames through `requestAnimationFrame`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn now(&self) -> Duration {
        let millis = web_sys::window()
            .and_then(|window| window.performance())
            .map_or(0.0, |performance| performance.now());
        Duration::from_secs_f64(millis.max(0.0) / 1000.0)
    }

    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        gloo_timers::future::sleep(duration).boxed_local()
    }

    fn next_frame(&self) -> LocalBoxFuture<'static, ()> {
        let frame = js_sys::Promise::new(&mut |resolve, _reject| {
            let requested = web_sys::window()
                .map(|window| window.request_animation_frame(&resolve).is_ok())
                .unwrap_or(false);
            if !requested {
                // No frame source: settle right away.
                if let Err(error) = resolve.call0(&wasm_bindgen::JsValue::NULL) {
                    tracing::debug!(?error, "frame fallback did not settle");
                }
            }
        });
        async move {
            if let Err(error) = JsFuture::from(frame).await {
                tracing::debug!(?error, "animation frame rejected");
            }
        }
        .boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
