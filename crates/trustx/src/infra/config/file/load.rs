use {
    crate::{
        domain::{
            Size,
            placement::{self, HtSlot, Inventory, XSlot},
            price,
            targeting,
        },
        infra::{
            beacon,
            config::{
                Error,
                file::{self, Placement, RoundingType},
            },
        },
    },
    rust_decimal::Decimal,
    std::{
        collections::{HashMap, HashSet},
        path::Path,
        time::Duration,
    },
    tokio::fs,
};

/// Load the partner configuration from a file. Files with a `.toml`
/// extension are read as TOML, all others as JSON.
pub async fn load(path: &Path) -> Result<crate::infra::Config, Error> {
    let data = fs::read_to_string(path).await.map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => from_toml(&data),
        _ => from_json(&data),
    }
}

pub fn from_json(data: &str) -> Result<crate::infra::Config, Error> {
    let config: file::Config =
        serde_json::from_str(data).map_err(|err| Error::Syntax(err.to_string()))?;
    resolve(config)
}

pub fn from_toml(data: &str) -> Result<crate::infra::Config, Error> {
    let config: file::Config =
        toml::de::from_str(data).map_err(|err| Error::Syntax(err.to_string()))?;
    resolve(config)
}

fn resolve(config: file::Config) -> Result<crate::infra::Config, Error> {
    let mut problems = Vec::new();

    if let Some(targeting_type) = &config.targeting_type {
        if targeting_type != "slot" {
            problems.push(format!("targetingType {targeting_type:?} is not supported"));
        }
    }
    let xslots = xslots(config.x_slots, &mut problems);
    let mapping = mapping(config.mapping, xslots.as_ref(), &mut problems);
    let keys = keys(config.target_key_override, &mut problems);
    let price = price(config.rounding_buckets, &mut problems);
    let timeout = match config.timeout {
        Some(timeout) => match u64::try_from(timeout) {
            Ok(millis) => Some(Duration::from_millis(millis)),
            Err(_) => {
                problems.push("timeout must be a non-negative number".to_owned());
                None
            }
        },
        None => None,
    };
    let size_retargeting = size_retargeting(config.size_retargeting, &mut problems);
    let telemetry = config.telemetry.and_then(|telemetry| {
        let sample_rate = telemetry
            .sample_rate
            .unwrap_or(beacon::Config::DEFAULT_SAMPLE_RATE);
        if !(0.0..=1.0).contains(&sample_rate) {
            problems.push("telemetry.sampleRate must be between 0 and 1".to_owned());
            return None;
        }
        Some(beacon::Config {
            endpoint: telemetry.endpoint,
            sample_rate,
        })
    });

    match (xslots, mapping) {
        (Some(xslots), Some(mapping)) if problems.is_empty() => Ok(crate::infra::Config {
            inventory: Inventory::new(xslots, mapping),
            keys,
            deal_layout: config.deal_targeting,
            price,
            timeout,
            architecture: config.architecture,
            size_retargeting,
            endpoint: config.endpoint,
            sync_url: config.sync_url,
            telemetry,
        }),
        _ => Err(Error::Invalid(problems)),
    }
}

fn xslots(
    config: Option<indexmap::IndexMap<String, file::XSlot>>,
    problems: &mut Vec<String>,
) -> Option<HashMap<XSlot, placement::Id>> {
    let config = match config {
        Some(config) if !config.is_empty() => config,
        _ => {
            problems.push("xSlots either not provided or invalid".to_owned());
            return None;
        }
    };
    let mut xslots = HashMap::new();
    for (name, xslot) in config {
        let id = match xslot.placement {
            Some(Placement::Number(number)) => u64::try_from(number).ok(),
            Some(Placement::Text(text)) => text.trim().parse::<u64>().ok(),
            None => None,
        };
        match id {
            Some(id) if id > 0 => {
                xslots.insert(XSlot(name), placement::Id(id));
            }
            _ => problems.push(format!(
                "xSlot {name}: placement must be defined and must be a positive number or a \
                 number like string"
            )),
        }
    }
    Some(xslots)
}

fn mapping(
    config: Option<indexmap::IndexMap<String, Vec<String>>>,
    xslots: Option<&HashMap<XSlot, placement::Id>>,
    problems: &mut Vec<String>,
) -> Option<indexmap::IndexMap<HtSlot, Vec<XSlot>>> {
    let Some(config) = config else {
        problems.push("mapping either not provided or invalid".to_owned());
        return None;
    };
    let mut seen = HashSet::new();
    let mut mapping = indexmap::IndexMap::new();
    for (slot, names) in config {
        if names.is_empty() || names.iter().any(|name| name.is_empty()) {
            problems.push(format!("slot mappings missing or invalid for htSlot {slot}"));
            continue;
        }
        for name in &names {
            let xslot = XSlot(name.clone());
            // Unknown xSlots can't be checked if the xSlots themselves are
            // broken, that problem is reported already.
            if xslots.is_some_and(|xslots| !xslots.contains_key(&xslot)) {
                problems.push(format!("invalid xSlot {name} in mapping for htSlot {slot}"));
            } else if !seen.insert(xslot) {
                problems.push(format!("xSlot {name} mapped multiple times"));
            }
        }
        mapping.insert(HtSlot(slot), names.into_iter().map(XSlot).collect());
    }
    Some(mapping)
}

fn keys(config: Option<file::TargetKeyOverride>, problems: &mut Vec<String>) -> targeting::Keys {
    let mut keys = targeting::Keys::default();
    let Some(config) = config else {
        return keys;
    };
    let overrides = [
        ("omKey", config.om_key, &mut keys.om),
        ("pmKey", config.pm_key, &mut keys.pm),
        ("idKey", config.id_key, &mut keys.id),
        ("pmidKey", config.pmid_key, &mut keys.pmid),
    ];
    if overrides.iter().all(|(_, value, _)| value.is_none()) {
        problems.push("targetKeyOverride must be a non-empty object".to_owned());
    }
    for (name, value, key) in overrides {
        match value {
            Some(value) if value.is_empty() => {
                problems.push(format!("targetKeyOverride.{name} must be a non-empty string"));
            }
            Some(value) => *key = value,
            None => (),
        }
    }
    keys
}

fn price(config: Option<file::RoundingBuckets>, problems: &mut Vec<String>) -> price::Config {
    let defaults = price::Config::default();
    let Some(config) = config else {
        return defaults;
    };
    let before = problems.len();

    let floor = config.floor.unwrap_or(defaults.floor);
    if floor.is_sign_negative() {
        problems.push("roundingBuckets.floor must be a non-negative number".to_owned());
    }
    let input_cents_multiplier = config
        .input_cents_multiplier
        .unwrap_or(defaults.input_cents_multiplier);
    if input_cents_multiplier <= Decimal::ZERO {
        problems.push("roundingBuckets.inputCentsMultiplier must be a positive number".to_owned());
    }
    let output_cents_divisor = config
        .output_cents_divisor
        .unwrap_or(defaults.output_cents_divisor);
    if output_cents_divisor <= Decimal::ZERO {
        problems.push("roundingBuckets.outputCentsDivisor must be a positive number".to_owned());
    }
    let output_precision = match config.output_precision {
        Some(precision) => u32::try_from(precision)
            .ok()
            .filter(|precision| *precision <= 28)
            .unwrap_or_else(|| {
                problems.push(
                    "roundingBuckets.outputPrecision must be an integer between 0 and 28"
                        .to_owned(),
                );
                defaults.output_precision
            }),
        None => defaults.output_precision,
    };
    let rounding = match config.rounding_type {
        Some(rounding_type) => rounding(&rounding_type).unwrap_or_else(|| {
            problems.push("roundingBuckets.roundingType must be a valid rounding type".to_owned());
            defaults.rounding
        }),
        None => defaults.rounding,
    };
    let buckets = match config.buckets {
        Some(buckets) if buckets.is_empty() => {
            problems.push("roundingBuckets.buckets must be a non-empty array".to_owned());
            Vec::new()
        }
        Some(buckets) => buckets
            .into_iter()
            .filter_map(|bucket| match (bucket.max, bucket.step) {
                (Some(max), Some(step)) if max > Decimal::ZERO && step > Decimal::ZERO => {
                    Some(price::Bucket { max, step })
                }
                _ => {
                    problems.push(
                        "roundingBuckets.buckets must contain a positive max and step".to_owned(),
                    );
                    None
                }
            })
            .collect(),
        None => defaults.buckets.clone(),
    };

    if problems.len() > before {
        return defaults;
    }
    price::Config {
        floor,
        input_cents_multiplier,
        output_cents_divisor,
        output_precision,
        rounding,
        buckets,
    }
}

fn rounding(rounding_type: &RoundingType) -> Option<price::Rounding> {
    match rounding_type {
        RoundingType::Code(0) => Some(price::Rounding::None),
        RoundingType::Code(1) => Some(price::Rounding::Floor),
        RoundingType::Code(2) => Some(price::Rounding::Round),
        RoundingType::Code(3) => Some(price::Rounding::Ceil),
        RoundingType::Code(_) => None,
        RoundingType::Name(name) => match name.as_str() {
            "none" => Some(price::Rounding::None),
            "floor" => Some(price::Rounding::Floor),
            "round" => Some(price::Rounding::Round),
            "ceil" => Some(price::Rounding::Ceil),
            _ => None,
        },
    }
}

fn size_retargeting(
    config: Option<indexmap::IndexMap<String, crate::domain::size::Dimensions>>,
    problems: &mut Vec<String>,
) -> HashMap<Size, Size> {
    config
        .into_iter()
        .flatten()
        .filter_map(|(from, to)| match from.parse::<Size>() {
            Ok(from) => Some((from, Size::from(to))),
            Err(err) => {
                problems.push(format!("sizeRetargeting: {err}"));
                None
            }
        })
        .collect()
}
