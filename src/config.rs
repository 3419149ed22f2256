//! Runtime configuration for the lifecycle engine (see spec §6).
//!
//! [`Config`] is assembled through [`ConfigBuilder`] and validated once, at
//! [`ConfigBuilder::build`] time: a missing or out-of-domain `network` or
//! `default_key_type` fails immediately rather than surfacing later as a
//! confusing orchestrator error.

use std::sync::Arc;

use crate::adapters::{CredentialIssuer, FeeOracleAdapter, KeyStore, OrdinalsProvider, StorageAdapter};
use crate::error::{LifecycleError, LifecycleResult};

/// Bitcoin network an engine instance is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl Network {
    /// Taproot address prefix for this network (see spec §4.5).
    pub fn taproot_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc1p",
            Network::Testnet | Network::Signet => "tb1p",
            Network::Regtest => "bcrt1p",
        }
    }

    /// Converts to the `bitcoin` crate's network enum.
    pub fn to_bitcoin(self) -> bitcoin::Network {
        match self {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
            Network::Signet => bitcoin::Network::Signet,
            Network::Regtest => bitcoin::Network::Regtest,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "mainnet" => Some(Network::Mainnet),
            "testnet" => Some(Network::Testnet),
            "regtest" => Some(Network::Regtest),
            "signet" => Some(Network::Signet),
            _ => None,
        }
    }
}

/// Key type used for newly-generated signing material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Es256k,
    Ed25519,
    Es256,
}

impl KeyType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ES256K" => Some(KeyType::Es256k),
            "Ed25519" => Some(KeyType::Ed25519),
            "ES256" => Some(KeyType::Es256),
            _ => None,
        }
    }
}

/// Optional sinks for telemetry (events, errors). Out of scope beyond the
/// trait boundary: the engine only ever calls these two hooks.
pub trait TelemetrySink: Send + Sync {
    fn on_event(&self, event_type: &str) {
        let _ = event_type;
    }
    fn on_error(&self, code: &str, message: &str) {
        let _ = (code, message);
    }
}

/// Runtime configuration shared across an engine instance.
#[derive(Clone)]
pub struct Config {
    pub network: Network,
    pub default_key_type: KeyType,
    pub storage_adapter: Arc<dyn StorageAdapter>,
    pub key_store: Arc<dyn KeyStore>,
    pub credential_issuer: Arc<dyn CredentialIssuer>,
    pub fee_oracle: Option<Arc<dyn FeeOracleAdapter>>,
    pub ordinals_provider: Option<Arc<dyn OrdinalsProvider>>,
    pub telemetry: Option<Arc<dyn TelemetrySink>>,
    pub enable_logging: bool,
}

/// Fluent builder for [`Config`]. Construction fails closed: [`build`] is the
/// only way to obtain a [`Config`], and it validates `network` and
/// `default_key_type` before returning one.
///
/// [`build`]: ConfigBuilder::build
pub struct ConfigBuilder {
    network: Option<String>,
    default_key_type: Option<String>,
    storage_adapter: Option<Arc<dyn StorageAdapter>>,
    key_store: Option<Arc<dyn KeyStore>>,
    credential_issuer: Option<Arc<dyn CredentialIssuer>>,
    fee_oracle: Option<Arc<dyn FeeOracleAdapter>>,
    ordinals_provider: Option<Arc<dyn OrdinalsProvider>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    enable_logging: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            network: None,
            default_key_type: None,
            storage_adapter: None,
            key_store: None,
            credential_issuer: None,
            fee_oracle: None,
            ordinals_provider: None,
            telemetry: None,
            enable_logging: false,
        }
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn default_key_type(mut self, key_type: impl Into<String>) -> Self {
        self.default_key_type = Some(key_type.into());
        self
    }

    pub fn storage_adapter(mut self, adapter: Arc<dyn StorageAdapter>) -> Self {
        self.storage_adapter = Some(adapter);
        self
    }

    pub fn key_store(mut self, key_store: Arc<dyn KeyStore>) -> Self {
        self.key_store = Some(key_store);
        self
    }

    pub fn credential_issuer(mut self, issuer: Arc<dyn CredentialIssuer>) -> Self {
        self.credential_issuer = Some(issuer);
        self
    }

    pub fn fee_oracle(mut self, adapter: Arc<dyn FeeOracleAdapter>) -> Self {
        self.fee_oracle = Some(adapter);
        self
    }

    pub fn ordinals_provider(mut self, provider: Arc<dyn OrdinalsProvider>) -> Self {
        self.ordinals_provider = Some(provider);
        self
    }

    pub fn telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Validates and finalizes the configuration.
    ///
    /// Fails with [`LifecycleError::InvalidInput`] when `network` or
    /// `default_key_type` is missing or names a value outside the enumerated
    /// domain in spec §6, or when no storage adapter was supplied.
    pub fn build(self) -> LifecycleResult<Config> {
        let network = self
            .network
            .as_deref()
            .and_then(Network::parse)
            .ok_or_else(|| {
                LifecycleError::InvalidInput(format!(
                    "network must be one of mainnet|testnet|regtest|signet, got {:?}",
                    self.network
                ))
            })?;

        let default_key_type = self
            .default_key_type
            .as_deref()
            .and_then(KeyType::parse)
            .ok_or_else(|| {
                LifecycleError::InvalidInput(format!(
                    "default_key_type must be one of ES256K|Ed25519|ES256, got {:?}",
                    self.default_key_type
                ))
            })?;

        let storage_adapter = self
            .storage_adapter
            .ok_or_else(|| LifecycleError::InvalidInput("storage_adapter is required".into()))?;
        let key_store = self
            .key_store
            .ok_or_else(|| LifecycleError::InvalidInput("key_store is required".into()))?;
        let credential_issuer = self
            .credential_issuer
            .ok_or_else(|| LifecycleError::InvalidInput("credential_issuer is required".into()))?;

        Ok(Config {
            network,
            default_key_type,
            storage_adapter,
            key_store,
            credential_issuer,
            fee_oracle: self.fee_oracle,
            ordinals_provider: self.ordinals_provider,
            telemetry: self.telemetry,
            enable_logging: self.enable_logging,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
