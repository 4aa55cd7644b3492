//! Requesting demand for wrapper slots and correlating the asynchronous
//! responses with the calls that asked for them.
//!
//! Every request is registered under a fresh [`Token`] and then exchanged with
//! the endpoint on a task of its own. The caller races the answer against the
//! effective timeout. Whatever happens first decides the outcome of the call;
//! an answer arriving later is still decoded and its creatives are stored, but
//! it can no longer change the result.

use {
    crate::{
        domain::{
            Size,
            creative,
            placement::{self, HtSlot, Inventory, Resolution},
            price,
            profile::{self, Profile},
            render::{Document, Renderer},
            targeting::{self, DealLayout, Targeting},
        },
        infra::{
            self,
            beacon::{self, Beacon},
            endpoint::{self, envelope},
            observe,
            transport::{self, Transport},
        },
    },
    chrono::{DateTime, Utc},
    futures::future::join_all,
    indexmap::IndexMap,
    serde::{Deserialize, Serialize},
    std::{collections::HashMap, slice, sync::Arc, time::Duration},
    thiserror::Error,
    tokio::time::Instant,
    tracing::Instrument,
    trustx_dto::request::{PRICE_TYPE, Query},
    url::Url,
};

pub mod pending;
mod token;

pub use {pending::Pending, token::Token};

/// How long an exchange may outlive the caller's timeout. Responses arriving
/// within this window still get their creatives stored.
const LATE_RESPONSE_GRACE: Duration = Duration::from_secs(10);

/// The limit of an exchange when no timeout is configured at all.
const UNBOUNDED_EXCHANGE_LIMIT: Duration = Duration::from_secs(60);

/// The qualifying bids of a response by placement.
pub type Bids = HashMap<placement::Id, targeting::Bid>;

/// Whether the slots of a call share one request or each get their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// One request for all slots of a call.
    #[default]
    Sra,
    /// One request per slot, sent concurrently.
    Mra,
}

/// What the adapter needs to know about the page it runs on.
#[derive(Clone, Debug)]
pub struct Host {
    pub page_url: Url,
    /// The wrapper wide timeout, if any.
    pub global_timeout: Option<Duration>,
}

/// The demand of one call, in the shape the wrapper expects.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Demand {
    pub slot: IndexMap<HtSlot, SlotDemand>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlotDemand {
    pub demand: Targeting,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Trustx request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Unable to get demand from trustx, {0} received")]
    Transport(#[from] transport::Error),
    #[error("Unable to get demand from trustx, error {0} received")]
    Parse(String),
    #[error("Unable to get demand from trustx, wrong response was received")]
    WrongResponse,
}

impl From<envelope::Error> for Error {
    fn from(err: envelope::Error) -> Self {
        match err {
            envelope::Error::Json(err) => Self::Parse(err.to_string()),
            envelope::Error::Empty | envelope::Error::Callback | envelope::Error::Malformed => {
                Self::WrongResponse
            }
        }
    }
}

/// How a request ended, as reported by telemetry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Timeout,
    Transport,
    Parse,
}

impl Outcome {
    pub fn of<T>(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(Error::Timeout(_)) => Self::Timeout,
            Err(Error::Transport(_)) => Self::Transport,
            Err(Error::Parse(_) | Error::WrongResponse) => Self::Parse,
        }
    }

    /// The code on the telemetry wire.
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Timeout => 1,
            Self::Transport => 2,
            Self::Parse => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Parse => "parse",
        }
    }
}

/// Why a received bid was not used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dropped {
    /// No placement of the request has the bid's `auid`.
    Unrequested,
    NoCreative,
    /// An earlier bid of the response is for the same placement.
    Duplicate,
    BelowFloor,
    /// The price does not fit into the decimal range.
    OutOfRange,
}

impl Dropped {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unrequested => "unrequested",
            Self::NoCreative => "no_creative",
            Self::Duplicate => "duplicate",
            Self::BelowFloor => "below_floor",
            Self::OutOfRange => "out_of_range",
        }
    }
}

/// The TrustX adapter. Cheap to clone, all clones share the creative store and
/// the pending requests.
#[derive(Clone)]
pub struct Adapter(Arc<Inner>);

struct Inner {
    inventory: Inventory,
    keys: targeting::Keys,
    deal_layout: DealLayout,
    transformer: price::Transformer,
    architecture: Architecture,
    endpoint: Url,
    page_url: Url,
    /// The effective timeout of a request.
    timeout: Option<Duration>,
    store: Arc<creative::Store>,
    renderer: Renderer,
    pending: Pending,
    transport: Arc<dyn Transport>,
    beacon: Arc<dyn Beacon>,
}

impl Adapter {
    /// Creates an adapter talking HTTP to the configured endpoint.
    pub fn new(config: infra::Config, host: Host) -> Result<Self, url::ParseError> {
        let timeout = effective_timeout(config.timeout, host.global_timeout);
        let sync_url = match &config.sync_url {
            Some(url) => url.clone(),
            None => endpoint::for_page(endpoint::SYNC_PATH, &host.page_url)?,
        };
        let transport = transport::Http::new(exchange_limit(timeout));
        let beacon = beacon::Http::new(config.telemetry.clone(), sync_url);
        Self::with(config, host, Arc::new(transport), Arc::new(beacon))
    }

    /// Creates an adapter on top of the given transport and beacon.
    pub fn with(
        config: infra::Config,
        host: Host,
        transport: Arc<dyn Transport>,
        beacon: Arc<dyn Beacon>,
    ) -> Result<Self, url::ParseError> {
        let endpoint = match config.endpoint {
            Some(url) => url,
            None => endpoint::for_page(endpoint::BID_PATH, &host.page_url)?,
        };
        let store = Arc::new(creative::Store::default());
        Ok(Self(Arc::new(Inner {
            renderer: Renderer::new(store.clone(), config.keys.id.clone(), config.size_retargeting),
            inventory: config.inventory,
            keys: config.keys,
            deal_layout: config.deal_layout,
            transformer: price::Transformer::new(config.price),
            architecture: config.architecture,
            endpoint,
            page_url: host.page_url,
            timeout: effective_timeout(config.timeout, host.global_timeout),
            store,
            pending: Pending::default(),
            transport,
            beacon,
        })))
    }

    pub fn profile(&self) -> Profile {
        Profile::new(&self.0.keys, self.0.architecture)
    }

    /// Requests demand for the wrapper slots. Slots without any qualifying bid
    /// are left out of the result.
    pub async fn get_demand(&self, correlator: &str, slots: &[HtSlot]) -> Result<Demand, Error> {
        let span = tracing::info_span!("get_demand", correlator);
        async {
            match self.0.architecture {
                Architecture::Sra => {
                    let resolution = Arc::new(self.0.inventory.resolve(slots));
                    let bids = self.request(resolution.clone()).await?;
                    Ok(self.demand(&resolution, &bids))
                }
                Architecture::Mra => {
                    let resolutions = slots
                        .iter()
                        .map(|slot| self.0.inventory.resolve(slice::from_ref(slot)))
                        .filter(|resolution| !resolution.is_empty())
                        .map(Arc::new)
                        .collect::<Vec<_>>();
                    let requests = resolutions
                        .iter()
                        .map(|resolution| self.request(resolution.clone()));
                    let results = join_all(requests).await;
                    merge(
                        resolutions
                            .iter()
                            .zip(results)
                            .map(|(resolution, result)| Ok(self.demand(resolution, &result?))),
                    )
                }
            }
        }
        .instrument(span)
        .await
    }

    /// The handler for the response to the request registered under `token`.
    pub fn response_callback(&self, token: Token) -> ResponseCallback {
        ResponseCallback {
            adapter: self.clone(),
            token,
        }
    }

    /// Writes the creative the targeting points at into the document.
    pub fn render_ad(&self, doc: &mut dyn Document, targeting: &Targeting, size: Size) {
        self.0.renderer.render(doc, targeting, size);
    }

    /// The number of requests whose exchange has not finished yet.
    pub fn pending(&self) -> usize {
        self.0.pending.len()
    }

    pub fn creatives(&self) -> &creative::Store {
        &self.0.store
    }

    async fn request(&self, resolution: Arc<Resolution>) -> Result<Bids, Error> {
        if resolution.is_empty() {
            observe::nothing_to_request(resolution.slots());
            return Ok(Bids::new());
        }
        let (token, receiver) = self.0.pending.register(resolution.clone());
        let span = tracing::debug_span!("request", %token);
        async {
            observe::requesting(&token, &resolution);
            let request = transport::Request {
                url: self.0.endpoint.clone(),
                query: Query {
                    auids: resolution.placements().iter().map(|id| id.0).collect(),
                    u: self.0.page_url.to_string(),
                    pt: PRICE_TYPE,
                    cb: format!("{}(\"{token}\")", profile::CALLBACK_PATH),
                    rnd: Token::random().to_string(),
                },
            };
            let start = Instant::now();
            tokio::spawn(
                self.clone()
                    .exchange(token.clone(), request)
                    .in_current_span(),
            );

            let result = match self.0.timeout {
                Some(timeout) => tokio::time::timeout(timeout, receiver)
                    .await
                    .unwrap_or(Ok(Err(Error::Timeout(timeout)))),
                None => receiver.await,
            }
            // The exchange always answers before releasing its entry.
            .unwrap_or(Err(Error::WrongResponse));

            let elapsed = start.elapsed();
            observe::completed(&token, &result, elapsed);
            self.0.beacon.report(&beacon::Report {
                outcome: Outcome::of(&result),
                elapsed,
                placements: resolution.placements().to_vec(),
            });
            result
        }
        .instrument(span)
        .await
    }

    /// Exchanges the request with the endpoint and feeds the answer to the
    /// response callback. Runs detached from the caller so that late answers
    /// are still taken in.
    async fn exchange(self, token: Token, request: transport::Request) {
        let limit = exchange_limit(self.0.timeout);
        let answer = match tokio::time::timeout(limit, self.0.transport.send(&request)).await {
            Ok(answer) => answer,
            Err(_) => {
                observe::exchange_expired(&token, limit);
                self.complete(&token, Err(Error::Timeout(limit)));
                return;
            }
        };
        match answer {
            Ok(payload) => self.response_callback(token).call(&payload),
            Err(err) => self.complete(&token, Err(Error::Transport(err))),
        }
    }

    fn complete(&self, token: &Token, result: Result<Bids, Error>) {
        if let Some(entry) = self.0.pending.take(token) {
            entry.resolve(result);
        }
    }

    /// Decodes a response and matches its bids against the request. Stores
    /// the creatives of all qualifying bids.
    fn ingest(&self, token: &Token, resolution: &Resolution, payload: &str) -> Result<Bids, Error> {
        let envelope = envelope::decode(payload)?;
        if envelope
            .token
            .as_deref()
            .is_some_and(|echoed| echoed != token.as_str())
        {
            return Err(Error::WrongResponse);
        }

        let mut bids = Bids::new();
        for bid in envelope.response.bids() {
            let dropped = |reason| observe::dropped_bid(token, bid.auid, reason);
            let Some(id) = bid.auid.map(placement::Id) else {
                dropped(Dropped::Unrequested);
                continue;
            };
            if resolution.owner(id).is_none() {
                dropped(Dropped::Unrequested);
                continue;
            }
            let Some(markup) = bid.adm.as_ref().filter(|markup| !markup.is_empty()) else {
                dropped(Dropped::NoCreative);
                continue;
            };
            if bids.contains_key(&id) {
                dropped(Dropped::Duplicate);
                continue;
            }
            let price = match self.0.transformer.transform(bid.price) {
                Ok(price) => price,
                Err(price::Rejected::BelowFloor) => {
                    dropped(Dropped::BelowFloor);
                    continue;
                }
                Err(price::Rejected::OutOfRange) => {
                    dropped(Dropped::OutOfRange);
                    continue;
                }
            };

            let size = Size::new(bid.w, bid.h);
            self.0.store.put(id, size, markup.clone());
            observe::accepted_bid(token, id);
            bids.insert(
                id,
                targeting::Bid {
                    placement: id,
                    size,
                    price,
                    deal: bid.dealid.clone(),
                },
            );
        }
        Ok(bids)
    }

    /// Turns the bids into the demand of the requested slots, in the order
    /// they were requested. A bid for a placement serving several slots only
    /// counts for the slot whose xSlot asked for the placement first.
    fn demand(&self, resolution: &Resolution, bids: &Bids) -> Demand {
        let timestamp = Utc::now();
        let mut demand = Demand::default();
        for slot in resolution.slots() {
            if demand.slot.contains_key(slot) {
                continue;
            }
            let winners = self
                .0
                .inventory
                .xslots(slot)
                .filter(|(xslot, id)| resolution.owner(*id) == Some(*xslot))
                .filter_map(|(_, id)| bids.get(&id))
                .collect::<Vec<_>>();
            if let Some(targeting) = targeting::build(&self.0.keys, self.0.deal_layout, &winners) {
                demand.slot.insert(
                    slot.clone(),
                    SlotDemand {
                        demand: targeting,
                        timestamp,
                    },
                );
            }
        }
        demand
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("endpoint", &self.0.endpoint.as_str())
            .field("architecture", &self.0.architecture)
            .field("timeout", &self.0.timeout)
            .field("pending", &self.0.pending.len())
            .finish()
    }
}

/// Receives the raw response payload for one token.
#[derive(Debug, Clone)]
pub struct ResponseCallback {
    adapter: Adapter,
    token: Token,
}

impl ResponseCallback {
    /// Takes in a response. The first call for a token completes its request,
    /// further calls and calls for unknown tokens are ignored.
    pub fn call(&self, payload: &str) {
        let inner = &self.adapter.0;
        let Some(entry) = inner.pending.take(&self.token) else {
            observe::unknown_token(&self.token);
            return;
        };
        let result = self.adapter.ingest(&self.token, &entry.resolution, payload);
        if result.is_ok() {
            inner.beacon.sync();
        }
        if !entry.resolve(result) {
            observe::late_response(&self.token);
        }
    }
}

/// The adapter's timeout shortened by the host's, whichever is set otherwise.
fn effective_timeout(adapter: Option<Duration>, global: Option<Duration>) -> Option<Duration> {
    match (adapter, global) {
        (Some(adapter), Some(global)) => Some(adapter.min(global)),
        (adapter, global) => adapter.or(global),
    }
}

fn exchange_limit(timeout: Option<Duration>) -> Duration {
    timeout.map_or(UNBOUNDED_EXCHANGE_LIMIT, |timeout| timeout + LATE_RESPONSE_GRACE)
}

/// Merges the demand of independent requests. Fails only if all of them
/// failed, with the first error.
fn merge(results: impl IntoIterator<Item = Result<Demand, Error>>) -> Result<Demand, Error> {
    let mut merged = Demand::default();
    let mut first_err = None;
    let mut succeeded = false;
    for result in results {
        match result {
            Ok(demand) => {
                succeeded = true;
                merged.slot.extend(demand.slot);
            }
            Err(err) => {
                first_err.get_or_insert(err);
            }
        }
    }
    match first_err {
        Some(err) if !succeeded => Err(err),
        _ => Ok(merged),
    }
}
