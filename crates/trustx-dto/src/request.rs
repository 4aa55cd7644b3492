use {
    serde::Serialize,
    serde_with::{StringWithSeparator, formats::CommaSeparator, serde_as},
};

/// The value of the `pt` parameter expected by the endpoint.
pub const PRICE_TYPE: &str = "net";

/// Query parameters of a bid request.
#[serde_as]
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Query {
    /// The requested placements.
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, u64>")]
    pub auids: Vec<u64>,
    /// The URL of the page the slots live on.
    pub u: String,
    pub pt: &'static str,
    /// The callback invocation the endpoint wraps its JSONP response in.
    pub cb: String,
    /// Cache buster.
    pub rnd: String,
}

/// Query parameters of a telemetry beacon.
#[serde_as]
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Telemetry {
    /// `1` when the request timed out.
    pub to: u8,
    /// Elapsed time in milliseconds.
    pub el: u64,
    /// Outcome code.
    pub oc: u8,
    #[serde_as(as = "StringWithSeparator::<CommaSeparator, u64>")]
    pub auids: Vec<u64>,
}
