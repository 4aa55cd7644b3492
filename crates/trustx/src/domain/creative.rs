use {
    crate::domain::{Size, placement},
    dashmap::DashMap,
    std::collections::HashMap,
};

/// Creative markup of every qualifying bid, by placement and size.
///
/// Shared by all calls of an adapter. Entries are overwritten by later bids
/// for the same placement and size and never evicted.
#[derive(Debug, Default)]
pub struct Store(DashMap<placement::Id, HashMap<Size, String>>);

impl Store {
    pub fn put(&self, placement: placement::Id, size: Size, markup: String) {
        self.0.entry(placement).or_default().insert(size, markup);
    }

    pub fn get(&self, placement: placement::Id, size: Size) -> Option<String> {
        self.0.get(&placement)?.get(&size).cloned()
    }
}
