//! Verifiable Credential envelopes attached to an asset (see spec §3).
//!
//! The proof suite itself (canonicalization, signature scheme) is out of
//! scope (spec §1); this module only models the shapes the engine attaches
//! to an asset and the structural checks `verify` (spec §4.8) performs on
//! them. Signing and verifying the proof goes through [`CredentialIssuer`]
//! and [`CredentialVerifier`] in [`crate::adapters`].

use chrono::{DateTime, Utc};

use crate::identifier::AssetIdentifier;
use crate::state_machine::Layer;

/// The kind of assertion a credential carries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum CredentialClaim {
    ResourceCreation,
    ResourceMigration {
        from_layer: Layer,
        to_layer: Layer,
        timestamp: DateTime<Utc>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transaction_id: Option<String>,
    },
    Transfer {
        from_address: String,
        to_address: String,
        timestamp: DateTime<Utc>,
    },
}

/// A signed assertion attached to an asset. Immutable once attached (spec
/// §3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Credential {
    /// The identifier of the subject asset this credential is about.
    pub subject: AssetIdentifier,
    /// The identifier of the issuer (normally the asset's current primary
    /// identifier at issuance time).
    pub issuer: AssetIdentifier,
    pub claim: CredentialClaim,
    /// Opaque cryptographic proof bytes produced by the configured
    /// [`crate::adapters::CredentialIssuer`].
    pub proof: Vec<u8>,
}

impl Credential {
    /// Structural validity: a non-empty proof and a subject/issuer that
    /// parse as valid layered identifiers. Does not check the cryptographic
    /// proof itself (spec §4.8 — that requires a verifier adapter).
    pub fn is_structurally_valid(&self) -> bool {
        !self.proof.is_empty() && self.subject.layer().is_ok() && self.issuer.layer().is_ok()
    }

    pub fn claim_type_name(&self) -> &'static str {
        match &self.claim {
            CredentialClaim::ResourceCreation => "resource-creation",
            CredentialClaim::ResourceMigration { .. } => "resource-migration",
            CredentialClaim::Transfer { .. } => "transfer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_identifier() -> AssetIdentifier {
        AssetIdentifier::new_peer(b"abc")
    }

    #[test]
    fn credential_with_empty_proof_is_structurally_invalid() {
        let cred = Credential {
            subject: sample_identifier(),
            issuer: sample_identifier(),
            claim: CredentialClaim::ResourceCreation,
            proof: vec![],
        };
        assert!(!cred.is_structurally_valid());
    }

    #[test]
    fn credential_with_proof_is_structurally_valid() {
        let cred = Credential {
            subject: sample_identifier(),
            issuer: sample_identifier(),
            claim: CredentialClaim::ResourceCreation,
            proof: vec![1, 2, 3],
        };
        assert!(cred.is_structurally_valid());
        assert_eq!(cred.claim_type_name(), "resource-creation");
    }
}
