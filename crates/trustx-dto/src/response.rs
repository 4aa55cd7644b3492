use {
    rust_decimal::Decimal,
    serde::Deserialize,
    serde_with::{DisplayFromStr, PickFirst, serde_as},
};

/// The body of a bid response. A body without `seatbid` does not parse.
#[derive(Clone, Debug, Deserialize)]
pub struct Response {
    pub seatbid: Vec<SeatBid>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeatBid {
    #[serde(default)]
    pub bid: Vec<Bid>,
}

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Bid {
    /// The placement the bid is for. The endpoint sends it either as a number
    /// or as a numeric string.
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub auid: Option<u64>,
    /// The creative markup.
    #[serde(default)]
    pub adm: Option<String>,
    pub w: u32,
    pub h: u32,
    pub price: Decimal,
    #[serde(default)]
    pub dealid: Option<String>,
}

impl Response {
    /// All bids of all seats in the order they were sent.
    pub fn bids(&self) -> impl Iterator<Item = &Bid> {
        self.seatbid.iter().flat_map(|seat| seat.bid.iter())
    }
}
