//! Test harness: an adapter wired to a scripted in-memory transport and a
//! beacon that records what it is asked to send.

use {
    crate::{
        domain::{
            Adapter,
            Host,
            demand::{Demand, Error},
            placement::HtSlot,
        },
        infra::{
            Config,
            beacon::{Beacon, Report},
            transport::{self, Request, Transport},
        },
    },
    serde_json::json,
    std::{
        sync::{
            Arc,
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    },
    url::Url,
};


pub const PAGE_URL: &str = "https://publisher.example/article";

/// How the scripted transport answers a request.
#[derive(Debug, Clone)]
pub enum Answer {
    Body(String),
    Delayed(Duration, String),
    Status(reqwest::StatusCode),
}

type Script = dyn Fn(&Request) -> Answer + Send + Sync;

/// Answers requests according to a script and remembers them.
pub struct Scripted {
    script: Box<Script>,
    requests: Mutex<Vec<Request>>,
}

#[async_trait::async_trait]
impl Transport for Scripted {
    async fn send(&self, request: &Request) -> Result<String, transport::Error> {
        self.requests.lock().unwrap().push(request.clone());
        match (self.script)(request) {
            Answer::Body(body) => Ok(body),
            Answer::Delayed(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Answer::Status(status) => Err(transport::Error::Status(status)),
        }
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    reports: Mutex<Vec<Report>>,
    syncs: AtomicUsize,
}

impl Beacon for Recorder {
    fn report(&self, report: &Report) {
        self.reports.lock().unwrap().push(report.clone());
    }

    fn sync(&self) {
        self.syncs.fetch_add(1, Ordering::SeqCst);
    }
}

/// The JSONP answer the endpoint gives to a request.
pub fn jsonp(request: &Request, body: &serde_json::Value) -> String {
    format!("{}({body});", request.query.cb)
}

pub fn bid(auid: u64, price: f64) -> serde_json::Value {
    json!({
        "auid": auid,
        "adm": format!("<div>{auid}</div>"),
        "w": 300,
        "h": 250,
        "price": price,
    })
}

/// A response with one seat per bid, the way the endpoint sends it.
pub fn response(bids: impl IntoIterator<Item = serde_json::Value>) -> serde_json::Value {
    json!({
        "seatbid": bids
            .into_iter()
            .map(|bid| json!({ "bid": [bid] }))
            .collect::<Vec<_>>(),
    })
}

/// Two wrapper slots. Placement 111 serves both of them.
pub fn config() -> serde_json::Value {
    json!({
        "xSlots": {
            "x1": { "placement": 111 },
            "x2": { "placement": "222" },
            "x3": { "placement": 111 },
            "x4": { "placement": 444 },
        },
        "mapping": {
            "htSlotA": ["x1", "x2"],
            "htSlotB": ["x3", "x4"],
        },
    })
}

pub fn setup() -> Setup {
    Setup {
        config: config(),
        global_timeout: None,
        script: Box::new(|request| Answer::Body(jsonp(request, &response([])))),
    }
}

pub struct Setup {
    config: serde_json::Value,
    global_timeout: Option<Duration>,
    script: Box<Script>,
}

impl Setup {
    /// Sets a top level field of the partner configuration.
    pub fn config(mut self, key: &str, value: serde_json::Value) -> Self {
        self.config[key] = value;
        self
    }

    pub fn global_timeout(mut self, timeout: Duration) -> Self {
        self.global_timeout = Some(timeout);
        self
    }

    pub fn answer(mut self, script: impl Fn(&Request) -> Answer + Send + Sync + 'static) -> Self {
        self.script = Box::new(script);
        self
    }

    pub fn build(self) -> Test {
        observe::tracing::initialize_reentrant("trustx=trace");
        let config = Config::from_json(&self.config.to_string()).unwrap();
        let transport = Arc::new(Scripted {
            script: self.script,
            requests: Default::default(),
        });
        let beacon = Arc::new(Recorder::default());
        let adapter = Adapter::with(
            config,
            Host {
                page_url: Url::parse(PAGE_URL).unwrap(),
                global_timeout: self.global_timeout,
            },
            transport.clone(),
            beacon.clone(),
        )
        .unwrap();
        Test {
            adapter,
            transport,
            beacon,
        }
    }
}

pub struct Test {
    pub adapter: Adapter,
    transport: Arc<Scripted>,
    beacon: Arc<Recorder>,
}

impl Test {
    pub async fn demand(&self, slots: &[&str]) -> Result<Demand, Error> {
        let slots = slots.iter().copied().map(HtSlot::from).collect::<Vec<_>>();
        self.adapter.get_demand("test", &slots).await
    }

    /// The requests sent so far.
    pub fn requests(&self) -> Vec<Request> {
        self.transport.requests.lock().unwrap().clone()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.beacon.reports.lock().unwrap().clone()
    }

    pub fn syncs(&self) -> usize {
        self.beacon.syncs.load(Ordering::SeqCst)
    }
}

/// The token a request was registered under, taken from its callback.
pub fn token(request: &Request) -> String {
    let cb = &request.query.cb;
    let start = cb.rfind("(\"").unwrap() + 2;
    let end = cb.rfind("\")").unwrap();
    cb[start..end].to_owned()
}
