//! Fire and forget side channels: the sampled telemetry beacon and the user
//! sync pixel. Neither ever affects the outcome of a demand request.

use {
    crate::{
        domain::{demand::Outcome, placement},
        infra::observe,
    },
    rand::Rng,
    std::time::Duration,
    trustx_dto::request::Telemetry,
    url::Url,
};

/// What the telemetry beacon reports about a completed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub outcome: Outcome,
    pub elapsed: Duration,
    pub placements: Vec<placement::Id>,
}

impl Report {
    fn to_dto(&self) -> Telemetry {
        Telemetry {
            to: u8::from(self.outcome == Outcome::Timeout),
            el: u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
            oc: self.outcome.code(),
            auids: self.placements.iter().map(|id| id.0).collect(),
        }
    }
}

pub trait Beacon: Send + Sync + 'static {
    /// Reports a completed request.
    fn report(&self, report: &Report);
    /// Fires the user sync pixel.
    fn sync(&self);
}

/// Where and how often telemetry gets sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub endpoint: Url,
    /// The share of requests that get reported, between 0 and 1.
    pub sample_rate: f64,
}

impl Config {
    pub const DEFAULT_SAMPLE_RATE: f64 = 0.1;
}

/// Sends beacons as HTTP GET requests in the background.
#[derive(Debug, Clone)]
pub struct Http {
    client: reqwest::Client,
    telemetry: Option<Config>,
    sync_url: Url,
}

impl Http {
    pub fn new(telemetry: Option<Config>, sync_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            telemetry,
            sync_url,
        }
    }

    fn fire(&self, req: reqwest::RequestBuilder, url: Url) {
        tokio::spawn(async move {
            if let Err(err) = req.send().await {
                observe::beacon_failed(&url, &err);
            }
        });
    }
}

impl Beacon for Http {
    fn report(&self, report: &Report) {
        let Some(telemetry) = &self.telemetry else {
            return;
        };
        if !rand::thread_rng().gen_bool(telemetry.sample_rate) {
            return;
        }
        let req = self
            .client
            .get(telemetry.endpoint.clone())
            .query(&report.to_dto());
        self.fire(req, telemetry.endpoint.clone());
    }

    fn sync(&self) {
        let req = self.client.get(self.sync_url.clone());
        self.fire(req, self.sync_url.clone());
    }
}
