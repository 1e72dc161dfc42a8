use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "painel", version, about = "Headless tools for the Painel dashboard")]
pub struct CliArgs {
    /// Backend base URL, e.g. http://localhost:8001/api
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Static API key sent as X-API-Key
    #[arg(long = "api-key", value_name = "KEY", global = true)]
    pub api_key: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the headline indicators and exit
    Summary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Request every endpoint and report status and latency
    Check,
    /// Load every section through the dashboard core and print what it drew
    Render {
        /// Select a UF before loading, as a map click would
        #[arg(long, value_name = "UF")]
        uf: Option<String>,

        /// Select an objeto before loading
        #[arg(long, value_name = "OBJETO")]
        objeto: Option<String>,
    },
}
