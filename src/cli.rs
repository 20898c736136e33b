use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "nimbus",
    version,
    about = "A read-only terminal browser for cloud resources."
)]
pub struct CliArgs {
    /// Region shown in the header and forwarded to providers
    #[arg(long)]
    pub region: Option<String>,

    /// Credentials profile shown in the header and forwarded to providers
    #[arg(long)]
    pub profile: Option<String>,

    /// Catalog file to browse instead of the built-in demo
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Open directly on a service screen (id or alias, for example: cfn)
    #[arg(short, long)]
    pub service: Option<String>,

    /// Seconds before a pending refresh gives up
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Artificial latency of every catalog call, in milliseconds
    #[arg(long)]
    pub latency_ms: Option<u64>,

    /// Page size of paginated secondary views
    #[arg(long)]
    pub page_size: Option<usize>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Configuration file; skips discovery
    #[arg(long)]
    pub config: Option<PathBuf>,
}
