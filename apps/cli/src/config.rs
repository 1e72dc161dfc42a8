use std::env;

use dotenv::dotenv;
use painel_core::config::{ApiConfig, InjectedConfig};

use crate::cli::CliArgs;

pub const API_URL_VAR: &str = "PAINEL_API_URL";
pub const API_KEY_VAR: &str = "PAINEL_API_KEY";

/// Flags win over the runtime environment (`.env` included).
pub fn injected(args: &CliArgs, lookup: impl Fn(&str) -> Option<String>) -> InjectedConfig {
    InjectedConfig {
        base_url: args.api_url.clone().or_else(|| lookup(API_URL_VAR)),
        api_key: args.api_key.clone().or_else(|| lookup(API_KEY_VAR)),
    }
}

/// Loads `.env`, then resolves the backend location.
pub fn init_app_config(args: &CliArgs) -> ApiConfig {
    dotenv().ok();
    ApiConfig::resolve(&injected(args, |name| env::var(name).ok()))
}

/// `RUST_LOG` when set, otherwise `debug` or `warn` depending on `--debug`.
pub fn log_filter(debug: bool, rust_log: Option<String>) -> String {
    match rust_log.filter(|value| !value.trim().is_empty()) {
        Some(filter) if !debug => filter,
        _ if debug => "debug".to_string(),
        _ => "warn".to_string(),
    }
}
