//! How the adapter describes itself to the header bidding wrapper.

use {
    crate::domain::{demand::Architecture, targeting},
    serde::Serialize,
};

/// The partner id the wrapper registers the adapter under.
pub const PARTNER_ID: &str = "TRSTX";

/// The global path of the response callback. The endpoint wraps its answer in
/// a call of this function, see [`crate::infra::endpoint::envelope`].
pub const CALLBACK_PATH: &str = r#"window.headertag["TRSTX"].callback"#;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub partner_id: &'static str,
    pub stats_id: &'static str,
    pub version: &'static str,
    pub targeting_type: TargetingType,
    pub enabled_analytics: Analytics,
    pub targeting_keys: TargetingKeys,
    pub architecture: Architecture,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetingType {
    Slot,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Analytics {
    /// The time between the demand request and its answer.
    pub time: bool,
    /// The targeting returned.
    pub demand: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct TargetingKeys {
    pub om: String,
    pub pm: String,
    pub id: String,
    pub pmid: String,
}

impl Profile {
    pub fn new(keys: &targeting::Keys, architecture: Architecture) -> Self {
        Self {
            partner_id: PARTNER_ID,
            stats_id: PARTNER_ID,
            version: env!("CARGO_PKG_VERSION"),
            targeting_type: TargetingType::Slot,
            enabled_analytics: Analytics {
                time: true,
                demand: true,
            },
            targeting_keys: TargetingKeys {
                om: keys.om.clone(),
                pm: keys.pm.clone(),
                id: keys.id.clone(),
                pmid: keys.pmid.clone(),
            },
            architecture,
        }
    }
}
