//! Resolution of wrapper slots to the partner placements that get requested
//! for them.

use {
    indexmap::IndexMap,
    serde::Serialize,
    std::{collections::HashMap, fmt},
};

/// The partner-side placement id, `auid` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A slot defined by the header bidding wrapper.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct HtSlot(pub String);

impl From<&str> for HtSlot {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for HtSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inventory unit as the partner understands it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XSlot(pub String);

impl fmt::Display for XSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The partner's addressable inventory and which of it serves which wrapper
/// slot.
#[derive(Clone, Debug, Default)]
pub struct Inventory {
    xslots: HashMap<XSlot, Id>,
    mapping: IndexMap<HtSlot, Vec<XSlot>>,
}

impl Inventory {
    pub fn new(xslots: HashMap<XSlot, Id>, mapping: IndexMap<HtSlot, Vec<XSlot>>) -> Self {
        Self { xslots, mapping }
    }

    /// Resolves the wrapper slots into the deduplicated list of placements to
    /// request. Slots and xSlots that are not configured are skipped.
    pub fn resolve(&self, slots: &[HtSlot]) -> Resolution {
        let mut resolution = Resolution {
            slots: slots.to_vec(),
            placements: Vec::new(),
            owners: HashMap::new(),
        };
        for slot in slots {
            for (xslot, id) in self.xslots(slot) {
                if !resolution.owners.contains_key(&id) {
                    resolution.owners.insert(id, xslot.clone());
                    resolution.placements.push(id);
                }
            }
        }
        resolution
    }

    /// The configured xSlots of a wrapper slot with their placements, in
    /// mapping order.
    pub fn xslots<'a>(
        &'a self,
        slot: &HtSlot,
    ) -> impl Iterator<Item = (&'a XSlot, Id)> + use<'a> {
        self.mapping
            .get(slot)
            .into_iter()
            .flatten()
            .filter_map(|xslot| Some((xslot, *self.xslots.get(xslot)?)))
    }
}

/// The placements requested for a set of wrapper slots.
#[derive(Clone, Debug)]
pub struct Resolution {
    slots: Vec<HtSlot>,
    placements: Vec<Id>,
    /// Reverse index from placement to the first xSlot that asked for it.
    owners: HashMap<Id, XSlot>,
}

impl Resolution {
    /// The wrapper slots in the order they were requested.
    pub fn slots(&self) -> &[HtSlot] {
        &self.slots
    }

    /// The placements in the order they were first seen.
    pub fn placements(&self) -> &[Id] {
        &self.placements
    }

    /// The xSlot that a placement was requested for, or `None` if the
    /// placement was not requested.
    pub fn owner(&self, id: Id) -> Option<&XSlot> {
        self.owners.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}
