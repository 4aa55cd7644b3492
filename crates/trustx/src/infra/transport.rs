//! Delivery of bid requests to the endpoint.

use {
    crate::{infra::observe, util},
    std::time::Duration,
    trustx_dto::request::Query,
    url::Url,
};

pub use util::http::Error;

const RESPONSE_MAX_BYTES: usize = 1_000_000;

/// A bid request: the endpoint and the query parameters to send to it.
#[derive(Clone, Debug)]
pub struct Request {
    pub url: Url,
    pub query: Query,
}

/// Sends bid requests and returns the raw response body.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, request: &Request) -> Result<String, Error>;
}

/// Sends bid requests as HTTP GET requests.
#[derive(Debug, Clone)]
pub struct Http {
    client: reqwest::Client,
}

impl Http {
    /// The client gives up on a request after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for Http {
    async fn send(&self, request: &Request) -> Result<String, Error> {
        observe::sending(request);
        let req = self
            .client
            .get(request.url.clone())
            .query(&request.query);
        let res = util::http::send(RESPONSE_MAX_BYTES, req).await;
        observe::received(&request.url, res.as_deref());
        res
    }
}
