use {
    crate::{
        domain::{
            Size,
            demand::Architecture,
            placement::Inventory,
            price,
            targeting::{self, DealLayout},
        },
        infra::beacon,
    },
    std::{collections::HashMap, path::PathBuf, time::Duration},
    thiserror::Error,
    url::Url,
};

pub mod file;

/// The fully resolved partner configuration, every default applied.
#[derive(Clone, Debug)]
pub struct Config {
    pub inventory: Inventory,
    pub keys: targeting::Keys,
    pub deal_layout: DealLayout,
    pub price: price::Config,
    /// The adapter's own request timeout. The host's global timeout may
    /// shorten it further.
    pub timeout: Option<Duration>,
    pub architecture: Architecture,
    pub size_retargeting: HashMap<Size, Size>,
    /// The bid endpoint, derived from the page protocol if not set.
    pub endpoint: Option<Url>,
    /// The user sync pixel, derived from the page protocol if not set.
    pub sync_url: Option<Url>,
    /// Telemetry is off without it.
    pub telemetry: Option<beacon::Config>,
}

impl Config {
    /// Parses and validates a configuration supplied by the host as JSON.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        file::from_json(json)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error while reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("syntax error: {0}")]
    Syntax(String),
    /// Every problem found, so that they can be fixed in one go.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl Error {
    /// The individual problems.
    pub fn problems(&self) -> Vec<String> {
        match self {
            Self::Invalid(problems) => problems.clone(),
            other => vec![other.to_string()],
        }
    }
}
