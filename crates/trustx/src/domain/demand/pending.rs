use {
    super::{Bids, Error, Token},
    crate::domain::placement::Resolution,
    dashmap::{DashMap, mapref::entry::Entry as MapEntry},
    std::sync::Arc,
    tokio::sync::oneshot,
};

/// The requests that are waiting for their response, by token.
///
/// An entry lives from the moment its request is issued until its exchange
/// finishes, which may be after the caller stopped waiting for it.
#[derive(Debug, Default)]
pub struct Pending(DashMap<Token, Entry>);

#[derive(Debug)]
pub struct Entry {
    pub resolution: Arc<Resolution>,
    sender: oneshot::Sender<Result<Bids, Error>>,
}

impl Entry {
    /// Hands the result to the waiting caller. Returns `false` if the caller
    /// gave up already.
    pub fn resolve(self, result: Result<Bids, Error>) -> bool {
        self.sender.send(result).is_ok()
    }
}

impl Pending {
    /// Registers a request under a fresh token.
    pub fn register(
        &self,
        resolution: Arc<Resolution>,
    ) -> (Token, oneshot::Receiver<Result<Bids, Error>>) {
        let (sender, receiver) = oneshot::channel();
        let entry = Entry { resolution, sender };
        loop {
            match self.0.entry(Token::random()) {
                MapEntry::Occupied(_) => continue,
                MapEntry::Vacant(vacant) => {
                    let token = vacant.key().clone();
                    vacant.insert(entry);
                    return (token, receiver);
                }
            }
        }
    }

    /// Removes the entry of a token. Every entry is taken at most once.
    pub fn take(&self, token: &Token) -> Option<Entry> {
        self.0.remove(token).map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
