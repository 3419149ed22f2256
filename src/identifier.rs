//! Layered asset identifiers and the bindings map (see spec §3, §6).
//!
//! An [`AssetIdentifier`] names exactly one of the three identity layers. The
//! current layer of an asset is *derived* from its primary identifier's
//! prefix; constructing an [`crate::asset::Asset`] from an identifier with an
//! unrecognized prefix fails (spec §4.3).

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{LifecycleError, LifecycleResult};
use crate::state_machine::Layer;

/// A layered identifier string, one of `did:peer:...`, `did:webvh:...` or
/// `did:btco:...` (optionally network-qualified, `did:btco:test:...` /
/// `did:btco:sig:...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AssetIdentifier(String);

impl AssetIdentifier {
    /// Builds a peer-layer identifier from base58-encoded public key
    /// material.
    pub fn new_peer(public_key_material: &[u8]) -> Self {
        AssetIdentifier(format!("did:peer:{}", bs58::encode(public_key_material).into_string()))
    }

    /// Builds a web-verifiable identifier bound to `domain` and `asset_slug`.
    pub fn new_webvh(domain: &str, asset_slug: &str) -> Self {
        AssetIdentifier(format!("did:webvh:{domain}:{asset_slug}"))
    }

    /// Builds a Bitcoin-inscribed identifier for `satoshi` on `network`.
    pub fn new_btco(satoshi: u64, network: bitcoin::Network) -> Self {
        let body = match network {
            bitcoin::Network::Testnet | bitcoin::Network::Signet => {
                format!("did:btco:test:{satoshi}")
            }
            bitcoin::Network::Regtest => format!("did:btco:test:{satoshi}"),
            _ => format!("did:btco:{satoshi}"),
        };
        AssetIdentifier(body)
    }

    /// Wraps an already-formatted identifier string, validating its prefix.
    pub fn parse(raw: impl Into<String>) -> LifecycleResult<Self> {
        let raw = raw.into();
        let id = AssetIdentifier(raw);
        id.layer()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity layer implied by this identifier's prefix (spec §4.3).
    pub fn layer(&self) -> LifecycleResult<Layer> {
        if self.0.starts_with("did:peer:") {
            Ok(Layer::Peer)
        } else if self.0.starts_with("did:webvh:") {
            Ok(Layer::Webvh)
        } else if self.0.starts_with("did:btco:") {
            Ok(Layer::Btco)
        } else {
            Err(LifecycleError::InvalidInput(format!(
                "unrecognized identifier prefix: {}",
                self.0
            )))
        }
    }

    /// Extracts the satoshi number from a `did:btco[:network]:<sat>`
    /// identifier.
    pub fn satoshi(&self) -> Option<u64> {
        self.0.rsplit(':').next()?.parse().ok()
    }
}

impl fmt::Display for AssetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag naming one of the three identity layers, used as a key into
/// [`Bindings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum LayerTag {
    DidPeer,
    DidWebvh,
    DidBtco,
}

impl LayerTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerTag::DidPeer => "did:peer",
            LayerTag::DidWebvh => "did:webvh",
            LayerTag::DidBtco => "did:btco",
        }
    }

    /// The tag a given [`Layer`] is bound under in [`Bindings`].
    pub fn for_layer(layer: Layer) -> Self {
        match layer {
            Layer::Peer => LayerTag::DidPeer,
            Layer::Webvh => LayerTag::DidWebvh,
            Layer::Btco => LayerTag::DidBtco,
        }
    }
}

/// Mapping from layer tag to the identifier issued for that layer.
/// Monotonically grows: [`Bindings::insert`] never removes an existing entry.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Bindings(BTreeMap<LayerTag, AssetIdentifier>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites the identifier bound to `tag`. Overwriting an
    /// existing binding is permitted (repeated publishes overwrite, per the
    /// source behavior recorded in SPEC_FULL.md §9).
    pub fn insert(&mut self, tag: LayerTag, identifier: AssetIdentifier) {
        self.0.insert(tag, identifier);
    }

    pub fn get(&self, tag: LayerTag) -> Option<&AssetIdentifier> {
        self.0.get(&tag)
    }

    pub fn contains(&self, tag: LayerTag) -> bool {
        self.0.contains_key(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerTag, &AssetIdentifier)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_identifier_round_trips_layer() {
        let id = AssetIdentifier::new_peer(b"some-public-key-bytes");
        assert_eq!(id.layer().unwrap(), Layer::Peer);
        assert!(id.as_str().starts_with("did:peer:"));
    }

    #[test]
    fn webvh_identifier_embeds_domain_and_slug() {
        let id = AssetIdentifier::new_webvh("example.com", "asset-1");
        assert_eq!(id.as_str(), "did:webvh:example.com:asset-1");
        assert_eq!(id.layer().unwrap(), Layer::Webvh);
    }

    #[test]
    fn btco_identifier_extracts_satoshi() {
        let id = AssetIdentifier::new_btco(123456789, bitcoin::Network::Bitcoin);
        assert_eq!(id.as_str(), "did:btco:123456789");
        assert_eq!(id.satoshi(), Some(123456789));
        assert_eq!(id.layer().unwrap(), Layer::Btco);
    }

    #[test]
    fn btco_identifier_is_network_qualified_on_testnet() {
        let id = AssetIdentifier::new_btco(42, bitcoin::Network::Testnet);
        assert_eq!(id.as_str(), "did:btco:test:42");
    }

    #[test]
    fn unrecognized_prefix_fails() {
        let err = AssetIdentifier::parse("did:unknown:abc").unwrap_err();
        assert_eq!(err.code(), "InvalidInput");
    }

    #[test]
    fn bindings_are_monotonic_and_last_write_wins_per_tag() {
        let mut bindings = Bindings::new();
        bindings.insert(LayerTag::DidWebvh, AssetIdentifier::new_webvh("a.com", "x"));
        bindings.insert(LayerTag::DidWebvh, AssetIdentifier::new_webvh("b.com", "x"));
        assert_eq!(
            bindings.get(LayerTag::DidWebvh).unwrap().as_str(),
            "did:webvh:b.com:x"
        );
        assert_eq!(bindings.iter().count(), 1);
    }
}
