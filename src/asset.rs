//! The asset aggregate (see spec §3, §4.8).
//!
//! An [`Asset`] owns its resources, bindings, provenance ledger and
//! credentials exclusively. The [`crate::orchestrator`] is the only code
//! that mutates an asset's layer; everything else in this module is either
//! a pure constructor or a read.

use crate::credential::Credential;
use crate::error::LifecycleResult;
use crate::identifier::{AssetIdentifier, Bindings, LayerTag};
use crate::provenance::ProvenanceLedger;
use crate::resource::Resource;
use crate::state_machine::Layer;

/// A digital asset: identifier, resources, bindings, provenance, credentials
/// and its current layer.
#[derive(Debug, Clone)]
pub struct Asset {
    primary_identifier: AssetIdentifier,
    current_layer: Layer,
    resources: Vec<Resource>,
    bindings: Bindings,
    ledger: ProvenanceLedger,
    credentials: Vec<Credential>,
}

impl Asset {
    /// Constructs an aggregate from a primary identifier already bound to a
    /// ledger and resource set. The current layer is *derived* from the
    /// identifier's prefix (spec §4.3); an unrecognized prefix fails here
    /// rather than silently defaulting.
    pub fn new(
        primary_identifier: AssetIdentifier,
        resources: Vec<Resource>,
        ledger: ProvenanceLedger,
    ) -> LifecycleResult<Self> {
        let current_layer = primary_identifier.layer()?;
        Ok(Self {
            primary_identifier,
            current_layer,
            resources,
            bindings: Bindings::new(),
            ledger,
            credentials: Vec::new(),
        })
    }

    pub fn primary_identifier(&self) -> &AssetIdentifier {
        &self.primary_identifier
    }

    pub fn current_layer(&self) -> Layer {
        self.current_layer
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut [Resource] {
        &mut self.resources
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }

    pub fn ledger(&self) -> &ProvenanceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ProvenanceLedger {
        &mut self.ledger
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn attach_credential(&mut self, credential: Credential) {
        self.credentials.push(credential);
    }

    /// Applies a validated layer transition without changing the primary
    /// identifier. Callers must have already checked
    /// [`crate::state_machine::validate_transition`]; exposed `pub(crate)`
    /// only so tests can deliberately desync the cached layer from the
    /// identifier's prefix. Migrations go through
    /// [`Asset::advance_primary_identifier`] instead, which keeps the two in
    /// lockstep.
    pub(crate) fn set_current_layer(&mut self, layer: Layer) {
        self.current_layer = layer;
    }

    /// Advances the primary identifier to `new_identifier` and derives the
    /// current layer from its prefix, keeping the two in lockstep (spec §8).
    /// The previous primary identifier is preserved in `bindings` under its
    /// own layer tag rather than discarded. Callers must have already
    /// checked [`crate::state_machine::validate_transition`] against the
    /// layer `new_identifier` implies.
    pub(crate) fn advance_primary_identifier(&mut self, new_identifier: AssetIdentifier) -> LifecycleResult<()> {
        let new_layer = new_identifier.layer()?;
        let previous_tag = LayerTag::for_layer(self.current_layer);
        let previous_identifier = std::mem::replace(&mut self.primary_identifier, new_identifier);
        self.bindings.insert(previous_tag, previous_identifier);
        self.current_layer = new_layer;
        Ok(())
    }

    /// Structural invariant: the current layer must match the primary
    /// identifier's prefix (spec §8). Re-derives the layer from the
    /// identifier and compares, rather than trusting the cached field.
    pub fn layer_matches_identifier(&self) -> bool {
        self.primary_identifier.layer().ok() == Some(self.current_layer)
    }
}
