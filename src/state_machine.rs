//! Directed layer state machine (see spec §4.3).
//!
//! `btco` is terminal for layer migration; transfers remain permitted from
//! it (handled by [`crate::orchestrator`], not this module).

use crate::error::{LifecycleError, LifecycleResult};

/// The three identity layers an asset can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Layer {
    Peer,
    Webvh,
    Btco,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Peer => "peer",
            Layer::Webvh => "webvh",
            Layer::Btco => "btco",
        }
    }
}

/// Validates that `from -> to` is one of the three permitted edges (spec
/// §4.3): peer->webvh, peer->btco, webvh->btco. Any other pair, including
/// self-transitions and `btco -> *`, fails with
/// [`LifecycleError::InvalidTransition`].
pub fn validate_transition(from: Layer, to: Layer) -> LifecycleResult<()> {
    match (from, to) {
        (Layer::Peer, Layer::Webvh) | (Layer::Peer, Layer::Btco) | (Layer::Webvh, Layer::Btco) => {
            Ok(())
        }
        _ => Err(LifecycleError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }),
    }
}
