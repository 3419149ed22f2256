//! Lifecycle engine for layered, Bitcoin-anchored digital asset identity.
//!
//! An asset moves through three identity layers — `peer`, `webvh`, `btco` —
//! accumulating a provenance ledger, resources and credentials along the
//! way. [`orchestrator`] is the only module that mutates an asset's layer;
//! everything else here is either a pure model or an adapter boundary.

pub mod adapters;
pub mod asset;
pub mod batch;
pub mod config;
pub mod credential;
pub mod error;
pub mod events;
pub mod identifier;
pub mod inscription;
pub mod orchestrator;
pub mod provenance;
pub mod resource;
pub mod state_machine;
pub mod utxo;

/// Minimum value, in satoshis, for any non-dropped transaction output (spec
/// §6).
pub const DUST_LIMIT_SATS: u64 = 546;

pub use asset::Asset;
pub use config::{Config, ConfigBuilder, KeyType, Network};
pub use error::{LifecycleError, LifecycleResult};
pub use identifier::{AssetIdentifier, Bindings, LayerTag};
pub use orchestrator::Orchestrator;
pub use state_machine::Layer;
