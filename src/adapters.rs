//! External collaborator boundaries (spec §6).
//!
//! Every adapter is an `async_trait` over owned request/response types,
//! reached only through an `Arc<dyn Trait>` handle in [`crate::config::Config`]
//! — a plain-async generalization of the narrow virtual-boundary call shape
//! inter-canister calls use elsewhere in this problem domain. Implementations
//! are out of scope; this module only names the contracts and wraps their
//! errors.

use async_trait::async_trait;

use crate::config::KeyType;
use crate::error::LifecycleResult;

/// Object storage used by `publishToWeb` (spec §4.8) to persist resource
/// content under `<domain>/.well-known/webvh/<asset-slug>/<resource-id>`.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Stores `bytes` under `object_key`, returning the URL resources will
    /// be bound to.
    async fn put(&self, object_key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> LifecycleResult<String>;

    /// Fetches previously stored content, or `None` if `object_key` is
    /// unknown.
    async fn get(&self, object_key: &str) -> LifecycleResult<Option<StoredObject>>;

    /// Removes a stored object. Optional: the default returns `false`
    /// (nothing to delete) rather than `Unsupported`, since most storage
    /// backends the engine targets are append-mostly.
    async fn delete(&self, object_key: &str) -> LifecycleResult<bool> {
        let _ = object_key;
        Ok(false)
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Fee-rate oracle consulted first in the §4.9 precedence chain.
#[async_trait]
pub trait FeeOracleAdapter: Send + Sync {
    /// Estimated fee rate, in sat/vB, for confirmation within
    /// `target_blocks` blocks.
    async fn estimate_fee_rate(&self, target_blocks: u32) -> LifecycleResult<f64>;
}

#[derive(Debug, Clone, Default)]
pub struct CreateInscriptionRequest {
    pub data: Vec<u8>,
    pub content_type: String,
    pub fee_rate: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateInscriptionResponse {
    pub inscription_id: Option<String>,
    pub reveal_txid: Option<String>,
    pub commit_txid: Option<String>,
    pub satoshi: Option<u64>,
    pub txid: Option<String>,
    pub vout: Option<u32>,
    pub block_height: Option<u64>,
    pub fee_rate: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct InscriptionRecord {
    pub inscription_id: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub txid: String,
    pub vout: u32,
    pub satoshi: Option<u64>,
    pub block_height: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct InscriptionSummary {
    pub inscription_id: String,
}

#[derive(Debug, Clone)]
pub struct TransferInscriptionResponse {
    pub txid: String,
    pub vin: u32,
    pub vout: u32,
    pub fee: u64,
    pub block_height: Option<u64>,
    pub confirmations: Option<u32>,
    pub satoshi: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct TransactionStatus {
    pub confirmed: bool,
    pub block_height: Option<u64>,
    pub confirmations: Option<u32>,
}

/// The Ordinals-aware Bitcoin provider: creates and transfers inscriptions,
/// broadcasts transactions, and answers satoshi/inscription lookups (spec
/// §6).
#[async_trait]
pub trait OrdinalsProvider: Send + Sync {
    async fn create_inscription(&self, request: CreateInscriptionRequest) -> LifecycleResult<CreateInscriptionResponse>;
    async fn get_inscription_by_id(&self, id: &str) -> LifecycleResult<Option<InscriptionRecord>>;
    async fn get_inscriptions_by_satoshi(&self, satoshi: u64) -> LifecycleResult<Vec<InscriptionSummary>>;
    async fn transfer_inscription(
        &self,
        id: &str,
        to_address: &str,
        fee_rate: Option<f64>,
    ) -> LifecycleResult<TransferInscriptionResponse>;
    async fn broadcast_transaction(&self, tx: Vec<u8>) -> LifecycleResult<String>;
    async fn get_transaction_status(&self, txid: &str) -> LifecycleResult<TransactionStatus>;
    async fn estimate_fee(&self, blocks: u32) -> LifecycleResult<f64>;
}

#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub id: String,
    pub public_key: Vec<u8>,
    pub private_key: Vec<u8>,
}

/// Key material custody and signing (spec §6). The engine never holds
/// private key bytes itself outside of the ephemeral taproot reveal key
/// generated per inscription (see [`crate::inscription`]).
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn generate_key(&self, key_type: KeyType) -> LifecycleResult<GeneratedKey>;
    async fn sign(&self, key_id: &str, bytes: &[u8]) -> LifecycleResult<Vec<u8>>;
    async fn verify(&self, public_key: &[u8], bytes: &[u8], signature: &[u8]) -> LifecycleResult<bool>;
}

/// Issues a signed claim over a canonical JSON payload (spec §6, narrow
/// over [`KeyStore`]).
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, key_id: &str, payload: &[u8]) -> LifecycleResult<Vec<u8>>;
}

/// Verifies a credential's proof by resolving the issuer's identifier and
/// checking the proof against the claim payload.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, issuer_public_key: &[u8], payload: &[u8], proof: &[u8]) -> LifecycleResult<bool>;
}

/// In-memory adapter implementations used by this crate's own test suite.
/// Not part of the public contract for embedders.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sha2::{Digest, Sha256};

    use super::{CredentialIssuer, GeneratedKey, KeyStore, StorageAdapter, StoredObject};
    use crate::config::KeyType;
    use crate::error::LifecycleResult;

    #[derive(Default)]
    pub struct InMemoryStorage {
        objects: Mutex<HashMap<String, StoredObject>>,
    }

    #[async_trait]
    impl StorageAdapter for InMemoryStorage {
        async fn put(&self, object_key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> LifecycleResult<String> {
            let url = format!("https://storage.test/{object_key}");
            self.objects.lock().unwrap().insert(
                object_key.to_string(),
                StoredObject { bytes, content_type: content_type.map(String::from) },
            );
            Ok(url)
        }

        async fn get(&self, object_key: &str) -> LifecycleResult<Option<StoredObject>> {
            Ok(self.objects.lock().unwrap().get(object_key).cloned())
        }
    }

    /// Deterministic, non-cryptographic key custody stand-in. Signer
    /// implementations are explicitly out of scope (spec §1); this exists
    /// only so the crate's own tests have something to call through
    /// [`KeyStore`].
    #[derive(Default)]
    pub struct InMemoryKeyStore {
        keys: Mutex<HashMap<String, GeneratedKey>>,
        counter: AtomicU64,
    }

    #[async_trait]
    impl KeyStore for InMemoryKeyStore {
        async fn generate_key(&self, key_type: KeyType) -> LifecycleResult<GeneratedKey> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let id = format!("key-{key_type:?}-{n}");
            let private_key = Sha256::digest(format!("{id}-secret").as_bytes()).to_vec();
            let public_key = Sha256::digest(&private_key).to_vec();
            let key = GeneratedKey { id: id.clone(), public_key, private_key };
            self.keys.lock().unwrap().insert(id, key.clone());
            Ok(key)
        }

        async fn sign(&self, key_id: &str, bytes: &[u8]) -> LifecycleResult<Vec<u8>> {
            let keys = self.keys.lock().unwrap();
            let key = keys.get(key_id).ok_or_else(|| {
                crate::error::LifecycleError::InvalidInput(format!("unknown key id: {key_id}"))
            })?;
            let mut hasher = Sha256::new();
            hasher.update(&key.private_key);
            hasher.update(bytes);
            Ok(hasher.finalize().to_vec())
        }

        async fn verify(&self, public_key: &[u8], bytes: &[u8], signature: &[u8]) -> LifecycleResult<bool> {
            let keys = self.keys.lock().unwrap();
            let Some(key) = keys.values().find(|k| k.public_key == public_key) else {
                return Ok(false);
            };
            let mut hasher = Sha256::new();
            hasher.update(&key.private_key);
            hasher.update(bytes);
            Ok(hasher.finalize().to_vec() == signature)
        }
    }

    /// Issues a proof that is just a digest of the payload under the key id.
    /// Stands in for a real proof suite, which is out of scope (spec §1).
    #[derive(Default)]
    pub struct DigestCredentialIssuer;

    #[async_trait]
    impl CredentialIssuer for DigestCredentialIssuer {
        async fn issue(&self, key_id: &str, payload: &[u8]) -> LifecycleResult<Vec<u8>> {
            let mut hasher = Sha256::new();
            hasher.update(key_id.as_bytes());
            hasher.update(payload);
            Ok(hasher.finalize().to_vec())
        }
    }
}
