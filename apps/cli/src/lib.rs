// Headless tooling around the dashboard core, shared by the binary and tests.
pub mod cli;
pub mod commands;
pub mod config;
pub mod headless;
pub mod report;
pub mod transport;
