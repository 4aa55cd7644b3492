use {
    crate::domain::{demand::Architecture, size::Dimensions, targeting::DealLayout},
    indexmap::IndexMap,
    rust_decimal::Decimal,
    serde::Deserialize,
    url::Url,
};

mod load;

pub use load::{from_json, from_toml, load};

/// The partner configuration as the host supplies it. Every field is optional
/// at this level so that validation can report all missing pieces at once.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Config {
    /// Must be `slot` if present, the adapter only targets slots.
    targeting_type: Option<String>,

    /// The partner's inventory units by name.
    x_slots: Option<IndexMap<String, XSlot>>,

    /// The xSlots serving each wrapper slot.
    mapping: Option<IndexMap<String, Vec<String>>>,

    /// Renames of the targeting keys.
    target_key_override: Option<TargetKeyOverride>,

    /// Price rounding. Fields that are left out keep their default.
    rounding_buckets: Option<RoundingBuckets>,

    /// The request timeout in milliseconds.
    timeout: Option<i64>,

    #[serde(default)]
    architecture: Architecture,

    #[serde(default)]
    deal_targeting: DealLayout,

    /// Sizes to render instead of the requested ones, `"WxH": [w, h]`.
    size_retargeting: Option<IndexMap<String, Dimensions>>,

    /// Overrides the bid endpoint.
    endpoint: Option<Url>,

    /// Overrides the user sync pixel.
    sync_url: Option<Url>,

    telemetry: Option<Telemetry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct XSlot {
    placement: Option<Placement>,
}

/// The endpoint's placement id, either a number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Placement {
    Number(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TargetKeyOverride {
    om_key: Option<String>,
    pm_key: Option<String>,
    id_key: Option<String>,
    pmid_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RoundingBuckets {
    /// In cents.
    floor: Option<Decimal>,
    input_cents_multiplier: Option<Decimal>,
    output_cents_divisor: Option<Decimal>,
    output_precision: Option<i64>,
    rounding_type: Option<RoundingType>,
    buckets: Option<Vec<Bucket>>,
}

/// Either the numeric code the host uses (0 none, 1 floor, 2 round, 3 ceil)
/// or the name of the rounding.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoundingType {
    Code(i64),
    Name(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Bucket {
    /// In cents.
    max: Option<Decimal>,
    /// In cents.
    step: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Telemetry {
    endpoint: Url,
    sample_rate: Option<f64>,
}
