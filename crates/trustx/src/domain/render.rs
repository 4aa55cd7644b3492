use {
    crate::domain::{Size, creative, placement, targeting},
    std::{collections::HashMap, sync::Arc},
    thiserror::Error,
};

/// The document an ad gets written into.
pub trait Document {
    fn write(&mut self, markup: &str);
    fn close(&mut self);
    /// The frame hosting the document, if it is reachable.
    fn frame(&mut self) -> Option<&mut dyn Frame>;
}

pub trait Frame {
    fn resize(&mut self, size: Size);
}

/// Writes stored creatives into documents.
#[derive(Debug)]
pub struct Renderer {
    store: Arc<creative::Store>,
    id_key: String,
    retargeting: HashMap<Size, Size>,
}

impl Renderer {
    pub fn new(
        store: Arc<creative::Store>,
        id_key: String,
        retargeting: HashMap<Size, Size>,
    ) -> Self {
        Self {
            store,
            id_key,
            retargeting,
        }
    }

    /// Renders the creative the targeting points at. Never fails, problems
    /// are logged and the document is left untouched.
    pub fn render(&self, doc: &mut dyn Document, targeting: &targeting::Targeting, size: Size) {
        if let Err(err) = self.try_render(doc, targeting, size) {
            tracing::warn!(?err, %size, "failed to render ad");
        }
    }

    fn try_render(
        &self,
        doc: &mut dyn Document,
        targeting: &targeting::Targeting,
        size: Size,
    ) -> Result<(), Error> {
        let id = targeting
            .get(&self.id_key)
            .and_then(targeting::Value::first)
            .ok_or(Error::MissingId)?;
        let id = placement::Id(id.parse().map_err(|_| Error::InvalidId(id.to_owned()))?);
        let size = self.retargeting.get(&size).copied().unwrap_or(size);
        let markup = self
            .store
            .get(id, size)
            .ok_or(Error::MissingCreative(id, size))?;

        doc.write(&markup);
        doc.close();
        if let Some(frame) = doc.frame() {
            frame.resize(size);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("targeting has no placement id")]
    MissingId,
    #[error("invalid placement id {0:?}")]
    InvalidId(String),
    #[error("no creative for placement {0} in size {1}")]
    MissingCreative(placement::Id, Size),
}
