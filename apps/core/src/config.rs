use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8001/api";
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Backend location and optional static key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

/// Values injected by the host (a page global, a CLI flag).
#[derive(Debug, Clone, Default)]
pub struct InjectedConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl ApiConfig {
    /// Resolve in order: injected value, build-time `PAINEL_API_URL` / `PAINEL_API_KEY`,
    /// then the local default.
    pub fn resolve(injected: &InjectedConfig) -> Self {
        Self::resolve_with(
            injected,
            option_env!("PAINEL_API_URL"),
            option_env!("PAINEL_API_KEY"),
        )
    }

    pub fn resolve_with(
        injected: &InjectedConfig,
        build_url: Option<&str>,
        build_key: Option<&str>,
    ) -> Self {
        let base_url = first_non_empty([injected.base_url.as_deref(), build_url])
            .map_or_else(|| DEFAULT_API_BASE_URL.to_string(), normalize_base_url);
        let api_key = first_non_empty([injected.api_key.as_deref(), build_key]).map(str::to_string);

        Self { base_url, api_key }
    }
}

fn first_non_empty<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Intersection parameters for lazy sections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverOptions {
    /// Sections start loading this many pixels before they enter the viewport.
    pub root_margin_px: f64,
    /// Minimum visible fraction of the section.
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin_px: 200.0,
            threshold: 0.2,
        }
    }
}

/// Every timing knob of the coordination layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub stale_lock: Duration,
    pub resize_debounce: Duration,
    pub visibility_timeout: Duration,
    pub in_flight_poll: Duration,
    pub in_flight_max_polls: u32,
    pub zero_area_recheck: Duration,
    pub zero_area_max_rechecks: u32,
    pub reload_settle: Duration,
    pub sequence_fallback: Duration,
    pub frame: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            stale_lock: Duration::from_secs(10),
            resize_debounce: Duration::from_millis(150),
            visibility_timeout: Duration::from_millis(2000),
            in_flight_poll: Duration::from_millis(100),
            in_flight_max_polls: 50,
            zero_area_recheck: Duration::from_millis(200),
            zero_area_max_rechecks: 5,
            reload_settle: Duration::from_millis(500),
            sequence_fallback: Duration::from_secs(3),
            frame: Duration::from_millis(16),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(100),
        }
    }
}
