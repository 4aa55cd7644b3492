use {
    crate::domain::{Size, placement},
    indexmap::IndexMap,
    serde::{Deserialize, Serialize},
};

/// Targeting attached to a wrapper slot, keyed by targeting key name.
pub type Targeting = IndexMap<String, Value>;

/// A targeting value. A slot with a single winning placement gets scalar
/// values, a slot with several gets arrays in placement order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Single(String),
    Multiple(Vec<String>),
}

impl Value {
    /// Collapses a list of values into a scalar if it has exactly one
    /// element. Returns `None` for an empty list.
    pub fn collapse(mut values: Vec<String>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(Self::Single),
            _ => Some(Self::Multiple(values)),
        }
    }

    /// The scalar value or the first element of the array.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multiple(values) => values.first().map(String::as_str),
        }
    }
}

/// The names of the targeting keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keys {
    /// Open market price.
    pub om: String,
    /// Private market price.
    pub pm: String,
    /// Placement id, used to look the creative up at render time.
    pub id: String,
    /// Private market deal id.
    pub pmid: String,
}

impl Default for Keys {
    fn default() -> Self {
        Self {
            om: "ix_trstx_cpm".to_owned(),
            pm: "ix_trstx_cpm".to_owned(),
            id: "ix_trstx_id".to_owned(),
            pmid: "ix_trstx_dealid".to_owned(),
        }
    }
}

/// Where deal bids put their price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DealLayout {
    /// Every price goes under the open market key and, if any bid of the slot
    /// has a deal, the deals go under the deal id key aligned with the ids
    /// (empty for bids without one).
    #[default]
    Alongside,
    /// Deal bids put their price under the private market key and their deal
    /// under the deal id key, all other bids use the open market key.
    PrivateMarket,
}

/// A qualifying bid for one placement, already price transformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bid {
    pub placement: placement::Id,
    pub size: Size,
    /// The transformed price.
    pub price: String,
    pub deal: Option<String>,
}

impl Bid {
    fn price_value(&self) -> String {
        format!("{}_{}", self.size, self.price)
    }

    fn deal_value(&self) -> Option<String> {
        self.deal.as_ref().map(|deal| format!("{}_{deal}", self.size))
    }
}

/// Builds the targeting of a wrapper slot from its winning bids, in
/// placement order. Returns `None` if there are no bids.
pub fn build(keys: &Keys, layout: DealLayout, bids: &[&Bid]) -> Option<Targeting> {
    let ids = bids
        .iter()
        .map(|bid| bid.placement.to_string())
        .collect::<Vec<_>>();
    let mut targeting = Targeting::new();
    targeting.insert(keys.id.clone(), Value::collapse(ids)?);

    match layout {
        DealLayout::Alongside => {
            let prices = bids.iter().map(|bid| bid.price_value()).collect();
            insert(&mut targeting, &keys.om, prices);
            if bids.iter().any(|bid| bid.deal.is_some()) {
                let deals = bids
                    .iter()
                    .map(|bid| bid.deal_value().unwrap_or_default())
                    .collect();
                insert(&mut targeting, &keys.pmid, deals);
            }
        }
        DealLayout::PrivateMarket => {
            // The private and open market keys may share a name, in which
            // case their values end up in one list.
            let mut values = IndexMap::<&str, Vec<String>>::new();
            for bid in bids {
                let key = match bid.deal {
                    Some(_) => keys.pm.as_str(),
                    None => keys.om.as_str(),
                };
                values.entry(key).or_default().push(bid.price_value());
                if let Some(deal) = bid.deal_value() {
                    values.entry(keys.pmid.as_str()).or_default().push(deal);
                }
            }
            for (key, values) in values {
                insert(&mut targeting, key, values);
            }
        }
    }
    Some(targeting)
}

fn insert(targeting: &mut Targeting, key: &str, values: Vec<String>) {
    if let Some(value) = Value::collapse(values) {
        targeting.insert(key.to_owned(), value);
    }
}
