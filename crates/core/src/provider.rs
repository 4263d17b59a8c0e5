//! Capability provider selection
//!
//! Environment detection happens here, at the outermost layer, never inside
//! the shim. A browser entry point without a client context builds
//! `FactorySource::Static(None)`; a native entry point always has a factory.

use std::sync::Arc;
use tracing::debug;

use crate::platform::PeerFactory;
use crate::{Error, Result};

/// Deferred factory lookup
pub type FactoryLookup = Arc<dyn Fn() -> Option<Arc<dyn PeerFactory>> + Send + Sync>;

/// Where the capability provider comes from
#[derive(Clone)]
pub enum FactorySource {
    /// Resolved once when the entry point was built
    Static(Option<Arc<dyn PeerFactory>>),
    /// Looked up each time a peer is constructed
    Deferred(FactoryLookup),
}

impl FactorySource {
    pub fn from_factory(factory: Arc<dyn PeerFactory>) -> Self {
        FactorySource::Static(Some(factory))
    }

    /// A source with no provider, e.g. a server-side render pass
    pub fn unavailable() -> Self {
        FactorySource::Static(None)
    }

    pub fn deferred<F>(lookup: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn PeerFactory>> + Send + Sync + 'static,
    {
        FactorySource::Deferred(Arc::new(lookup))
    }

    /// Resolve the provider or fail with `Unavailable`
    pub fn resolve(&self) -> Result<Arc<dyn PeerFactory>> {
        let factory = match self {
            FactorySource::Static(factory) => factory.clone(),
            FactorySource::Deferred(lookup) => lookup(),
        };

        match factory {
            Some(factory) => {
                debug!(factory = factory.name(), "Resolved peer factory");
                Ok(factory)
            }
            None => Err(Error::Unavailable(
                "peer factory is unavailable; a client context is required".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for FactorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactorySource::Static(Some(factory)) => {
                write!(f, "FactorySource::Static({})", factory.name())
            }
            FactorySource::Static(None) => f.write_str("FactorySource::Static(None)"),
            FactorySource::Deferred(_) => f.write_str("FactorySource::Deferred"),
        }
    }
}
