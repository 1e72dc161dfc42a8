// Target-neutral coordination layer shared by the browser app and the CLI.
pub mod api;
pub mod colors;
pub mod config;
pub mod context;
pub mod cross_filter;
pub mod domain;
pub mod error;
pub mod filters;
pub mod format;
pub mod handlers;
pub mod lifecycle;
pub mod maps;
pub mod render;
pub mod scheduler;
pub mod sections;
pub mod sequence;
pub mod surface;
pub mod tables;
pub mod view_model;
pub mod visibility;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::DashboardContext;
pub use error::{ApiError, DashboardError};
pub use filters::{FilterKind, FilterState, FilterStore};
