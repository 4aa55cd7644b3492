use {
    std::{path::PathBuf, time::Duration},
    url::Url,
};

/// Requests demand from TrustX for wrapper slots and prints it as JSON.
#[derive(Debug, clap::Parser)]
pub struct Args {
    /// The log filter.
    #[clap(long, env, default_value = "warn,trustx=debug")]
    pub log: String,

    /// Path to the partner configuration. Files ending in `.toml` are read as
    /// TOML, everything else as JSON.
    #[clap(long, env)]
    pub config: PathBuf,

    /// The URL of the page the slots live on. Also decides whether the
    /// endpoint is contacted over `https`.
    #[clap(long, env)]
    pub page_url: Url,

    /// The wrapper wide timeout, e.g. `800ms`. The shorter of this and the
    /// configured timeout applies.
    #[clap(long, env, value_parser = humantime::parse_duration)]
    pub global_timeout: Option<Duration>,

    /// Identifies the call in the logs.
    #[clap(long, env, default_value = "cli")]
    pub correlator: String,

    /// Print the collected metrics after the demand.
    #[clap(long)]
    pub metrics: bool,

    /// The wrapper slots to request demand for.
    #[clap(required = true)]
    pub slots: Vec<String>,
}
