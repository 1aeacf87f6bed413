use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "podglass",
    version,
    about = "Live, namespace-grouped view of cluster pods from a pod explorer API."
)]
pub struct CliArgs {
    /// Base url of the pod explorer API (default: http://localhost:8080)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Refresh interval in milliseconds, 0 disables periodic refresh
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// Start in a specific namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Start with all namespaces selected
    #[arg(short = 'A', long)]
    pub all_namespaces: bool,

    /// Config file to use instead of the discovered one
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Append logs to this file; logs are discarded otherwise
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
