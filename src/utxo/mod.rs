//! UTXO model and the ordinal-safe selector (see spec §3, §4.4).

mod selector;

pub use selector::{select, SelectionPolicy, SelectionResult, SelectionStrategy};

/// An unspent output the selector can choose from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value_sats: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Prevents this UTXO from being spent by the selector at all.
    pub locked: bool,
    /// Whether this UTXO carries one or more inscriptions.
    pub carries_inscription: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inscription_ids: Vec<String>,
}

impl Utxo {
    /// Stable `txid:vout` identifier used in selection policy avoid-lists.
    pub fn outpoint(&self) -> String {
        format!("{}:{}", self.txid, self.vout)
    }
}
