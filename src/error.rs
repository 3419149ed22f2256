//! Error taxonomy for the lifecycle engine (see spec §7).
//!
//! Every fallible operation in this crate returns [`LifecycleResult`]. Adapter
//! failures are wrapped rather than discarded so a caller can always see which
//! on-chain or off-chain side effect failed and why.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Stable error taxonomy. The variant name itself doubles as the stable
/// error code surfaced to callers via [`LifecycleError::code`].
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Malformed argument, non-positive fee rate, bad MIME type, bad address,
    /// null content, or any other locally-detectable bad input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Attempted a state-machine edge that is not permitted.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    /// A transfer was attempted on an asset that is not on the `btco` layer.
    #[error("asset is not anchored to bitcoin")]
    AssetNotOnBitcoin,

    /// The UTXO selector could not cover the requested target plus fee.
    #[error("insufficient funds: need {needed} sats, have {available} sats")]
    InsufficientFunds { needed: u64, available: u64 },

    /// The fee rate supplied to a selector or builder was not positive.
    #[error("fee rate must be positive, got {0}")]
    TooLowFee(i64),

    /// The requested target amount is below the dust limit.
    #[error("target amount {0} sats is below the dust limit")]
    DustOutput(u64),

    /// A selection would require both locked and unlocked inputs under a
    /// policy that forbids mixing, or locked inputs are unavoidable.
    #[error("selection requires locked utxos under a policy that forbids it")]
    ConflictingLocks,

    /// Every candidate UTXO carries an inscription and the policy forbids
    /// spending inscription-bearing inputs.
    #[error("all candidate utxos carry an inscription")]
    AllInputsCarryInscription,

    /// A selection would place an ordinal-bearing satoshi at risk.
    #[error("selection is not ordinal-safe: {0}")]
    SatSafety(String),

    /// An operation requires an ordinals provider but none was configured.
    #[error("operation requires an ordinals provider")]
    OrdProviderRequired,

    /// The configured ordinals provider does not support the requested
    /// operation.
    #[error("ordinals provider does not support this operation: {0}")]
    OrdProviderUnsupported(String),

    /// The ordinals provider responded, but the response was missing data
    /// the engine requires (no inscription id, no txid, ...).
    #[error("ordinals provider returned an invalid response: {0}")]
    OrdProviderInvalidResponse(String),

    /// An operation needed a satoshi number and none could be derived.
    #[error("operation requires a satoshi number, none available")]
    SatoshiRequired,

    /// A storage adapter call failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A network-facing adapter call failed (fee oracle, ordinals provider,
    /// signer).
    #[error("network error: {0}")]
    Network(String),
}

impl LifecycleError {
    /// Stable, machine-readable error code (matches the variant name).
    pub fn code(&self) -> &'static str {
        match self {
            LifecycleError::InvalidInput(_) => "InvalidInput",
            LifecycleError::InvalidTransition { .. } => "InvalidTransition",
            LifecycleError::AssetNotOnBitcoin => "AssetNotOnBitcoin",
            LifecycleError::InsufficientFunds { .. } => "InsufficientFunds",
            LifecycleError::TooLowFee(_) => "TooLowFee",
            LifecycleError::DustOutput(_) => "DustOutput",
            LifecycleError::ConflictingLocks => "ConflictingLocks",
            LifecycleError::AllInputsCarryInscription => "AllInputsCarryInscription",
            LifecycleError::SatSafety(_) => "SatSafety",
            LifecycleError::OrdProviderRequired => "OrdProviderRequired",
            LifecycleError::OrdProviderUnsupported(_) => "OrdProviderUnsupported",
            LifecycleError::OrdProviderInvalidResponse(_) => "OrdProviderInvalidResponse",
            LifecycleError::SatoshiRequired => "SatoshiRequired",
            LifecycleError::Storage(_) => "StorageError",
            LifecycleError::Network(_) => "NetworkError",
        }
    }

    /// Whether the batch executor (§4.6) should retry an operation that
    /// failed with this error. Validation failures are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, LifecycleError::Storage(_) | LifecycleError::Network(_))
    }
}
