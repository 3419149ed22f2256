//! Commit/reveal transaction construction (spec §4.5).
//!
//! Mechanically grounded in the real `ord` wallet's
//! `Inscribe::create_inscription_transactions` / `build_reveal_transaction`
//! flow and in `via_btc_client`'s `inscriber` module: a freshly generated,
//! untweaked key pair produces a single-leaf taproot script (the reveal
//! envelope), whose output key addresses the commit transaction; the reveal
//! transaction spends that output by script path, its fee absorbed from the
//! commit output's excess over the recipient output value.

use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize;
use bitcoin::key::{Keypair, XOnlyPublicKey};
use bitcoin::psbt::Psbt;
use bitcoin::secp256k1::{rand, Message, Secp256k1, SecretKey};
use bitcoin::sighash::{Prevouts, SighashCache};
use bitcoin::taproot::{ControlBlock, LeafVersion, TaprootBuilder, TaprootSpendInfo};
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, Network, OutPoint, ScriptBuf, Sequence, TapLeafHash, TapSighashType};
use bitcoin::{Transaction, TxIn, TxOut, Txid, Witness};

use crate::error::{LifecycleError, LifecycleResult};
use crate::utxo::{select, SelectionPolicy, Utxo};
use crate::DUST_LIMIT_SATS;

use super::envelope::{build_reveal_script, InscriptionEnvelope};

/// Everything produced by [`build_commit`]: the commit address and unsigned
/// transaction/PSBT, plus the reveal-side material needed by
/// [`build_reveal`] later. The reveal secret key never leaves this struct's
/// `Debug` output.
pub struct CommitPlan {
    pub commit_address: Address,
    pub unsigned_commit_tx: Transaction,
    pub commit_psbt_bytes: Vec<u8>,
    pub selected_utxos: Vec<Utxo>,
    pub commit_output_value_sats: u64,
    pub commit_fee_sats: u64,
    pub change_sats: Option<u64>,
    reveal_script: ScriptBuf,
    control_block: ControlBlock,
    reveal_secret_key: SecretKey,
    reveal_internal_key: XOnlyPublicKey,
    network: Network,
}

impl std::fmt::Debug for CommitPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitPlan")
            .field("commit_address", &self.commit_address)
            .field("commit_output_value_sats", &self.commit_output_value_sats)
            .field("commit_fee_sats", &self.commit_fee_sats)
            .field("change_sats", &self.change_sats)
            .field("reveal_secret_key", &"<redacted>")
            .finish()
    }
}

/// The finished reveal transaction, ready for broadcast once the commit
/// transaction it spends has been signed and confirmed.
#[derive(Debug, Clone)]
pub struct RevealPlan {
    pub tx: Transaction,
    pub raw: Vec<u8>,
    pub txid: Txid,
    pub fee_sats: u64,
    pub output_value_sats: u64,
}

fn leaf_script_to_spend_info(
    secp: &Secp256k1<bitcoin::secp256k1::All>,
    reveal_script: &ScriptBuf,
    internal_key: XOnlyPublicKey,
) -> LifecycleResult<TaprootSpendInfo> {
    TaprootBuilder::new()
        .add_leaf(0, reveal_script.clone())
        .map_err(|e| LifecycleError::InvalidInput(format!("failed to add reveal leaf: {e:?}")))?
        .finalize(secp, internal_key)
        .map_err(|e| LifecycleError::InvalidInput(format!("failed to finalize taproot spend info: {e:?}")))
}

/// Builds the commit transaction for `envelope`, funding a freshly derived
/// taproot address whose script path reveals the inscription. `utxos` and
/// `policy` drive input selection (spec §4.4); `min_commit_value_sats`
/// overrides the default floor for the commit output, which is otherwise the
/// dust limit plus the reveal transaction's estimated fee at `policy`'s fee
/// rate — the commit output must cover the reveal fee in addition to the
/// recipient's dust-limit output, or [`build_reveal`] always underflows
/// (spec §4.5).
pub fn build_commit(
    envelope: &InscriptionEnvelope,
    utxos: &[Utxo],
    mut policy: SelectionPolicy,
    change_address: &Address,
    min_commit_value_sats: Option<u64>,
    network: Network,
) -> LifecycleResult<CommitPlan> {
    envelope.validate()?;

    if !change_address.is_valid_for_network(network) {
        return Err(LifecycleError::InvalidInput("change address network mismatch".into()));
    }

    let secp = Secp256k1::new();
    let keypair = Keypair::new(&secp, &mut rand::thread_rng());
    let internal_key = keypair.x_only_public_key().0;

    let reveal_script = build_reveal_script(envelope, internal_key);
    let spend_info = leaf_script_to_spend_info(&secp, &reveal_script, internal_key)?;

    let commit_address = Address::p2tr_tweaked(spend_info.output_key(), network);

    let control_block = spend_info
        .control_block(&(reveal_script.clone(), LeafVersion::TapScript))
        .ok_or_else(|| LifecycleError::InvalidInput("failed to compute reveal control block".into()))?;

    let estimated_reveal_fee = policy.fee_rate_sat_per_vb.max(0) as u64 * estimate_reveal_vsize(&reveal_script);
    let reveal_floor = DUST_LIMIT_SATS + estimated_reveal_fee;
    let commit_target = min_commit_value_sats.unwrap_or(reveal_floor).max(reveal_floor);
    policy.target_sats = commit_target;

    let selection = select(utxos, &policy)?;

    let mut inputs = Vec::with_capacity(selection.selected.len());
    for utxo in &selection.selected {
        let txid = Txid::from_str(&utxo.txid)
            .map_err(|e| LifecycleError::InvalidInput(format!("malformed utxo txid: {e}")))?;
        inputs.push(TxIn {
            previous_output: OutPoint { txid, vout: utxo.vout },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
            witness: Witness::new(),
        });
    }

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(commit_target),
        script_pubkey: commit_address.script_pubkey(),
    }];
    if let Some(change) = selection.change_sats {
        outputs.push(TxOut {
            value: Amount::from_sat(change),
            script_pubkey: change_address.script_pubkey(),
        });
    }

    let unsigned_commit_tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    let psbt = Psbt::from_unsigned_tx(unsigned_commit_tx.clone())
        .map_err(|e| LifecycleError::InvalidInput(format!("failed to build commit psbt: {e}")))?;

    Ok(CommitPlan {
        commit_address,
        unsigned_commit_tx,
        commit_psbt_bytes: psbt.serialize(),
        selected_utxos: selection.selected,
        commit_output_value_sats: commit_target,
        commit_fee_sats: selection.fee_sats,
        change_sats: selection.change_sats,
        reveal_script,
        control_block,
        reveal_secret_key: keypair.secret_key(),
        reveal_internal_key: internal_key,
        network,
    })
}

/// Estimated reveal transaction virtual size: a single taproot script-path
/// input (signature + script + control block in the witness) and a single
/// recipient output.
fn estimate_reveal_vsize(reveal_script: &ScriptBuf) -> u64 {
    let witness_weight = 64 /* schnorr sig */ + reveal_script.len() as u64 + 33 /* control block */;
    // Witness bytes count at 1/4 weight; base tx overhead plus one output.
    10 + 40 /* input skeleton */ + 34 /* output */ + witness_weight / 4
}

/// Builds and signs the reveal transaction spending `commit_plan`'s commit
/// output (always vout 0, per [`build_commit`]). `fee_rate_sat_per_vb` must
/// be positive; the recipient output absorbs the commit value minus the
/// estimated reveal fee.
pub fn build_reveal(
    commit_plan: &CommitPlan,
    commit_txid: Txid,
    recipient_address: &Address,
    fee_rate_sat_per_vb: i64,
) -> LifecycleResult<RevealPlan> {
    if fee_rate_sat_per_vb <= 0 {
        return Err(LifecycleError::TooLowFee(fee_rate_sat_per_vb));
    }
    if !recipient_address.is_valid_for_network(commit_plan.network) {
        return Err(LifecycleError::InvalidInput("recipient address network mismatch".into()));
    }

    let vsize = estimate_reveal_vsize(&commit_plan.reveal_script);
    let fee_sats = fee_rate_sat_per_vb as u64 * vsize;

    let output_value_sats = commit_plan
        .commit_output_value_sats
        .checked_sub(fee_sats)
        .ok_or(LifecycleError::InsufficientFunds {
            needed: fee_sats,
            available: commit_plan.commit_output_value_sats,
        })?;
    if output_value_sats < DUST_LIMIT_SATS {
        return Err(LifecycleError::DustOutput(output_value_sats));
    }

    let prev_txout = TxOut {
        value: Amount::from_sat(commit_plan.commit_output_value_sats),
        script_pubkey: commit_plan.commit_address.script_pubkey(),
    };

    let input = TxIn {
        previous_output: OutPoint { txid: commit_txid, vout: 0 },
        script_sig: ScriptBuf::new(),
        sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
        witness: Witness::new(),
    };

    let mut unsigned_reveal_tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: vec![input],
        output: vec![TxOut {
            value: Amount::from_sat(output_value_sats),
            script_pubkey: recipient_address.script_pubkey(),
        }],
    };

    let secp = Secp256k1::new();
    let keypair = Keypair::from_secret_key(&secp, &commit_plan.reveal_secret_key);
    let prevouts = [prev_txout];

    let mut sighasher = SighashCache::new(&mut unsigned_reveal_tx);
    let sighash = sighasher
        .taproot_script_spend_signature_hash(
            0,
            &Prevouts::All(&prevouts),
            TapLeafHash::from_script(&commit_plan.reveal_script, LeafVersion::TapScript),
            TapSighashType::Default,
        )
        .map_err(|e| LifecycleError::InvalidInput(format!("failed to compute reveal sighash: {e}")))?;

    let message = Message::from_digest(sighash.to_byte_array());
    let signature = secp.sign_schnorr(&message, &keypair);

    let mut witness = Witness::new();
    witness.push(signature.serialize());
    witness.push(commit_plan.reveal_script.to_bytes());
    witness.push(commit_plan.control_block.serialize());
    *sighasher.witness_mut(0).expect("reveal tx has exactly one input") = witness;

    let reveal_tx = sighasher.into_transaction().clone();
    let txid = reveal_tx.compute_txid();

    Ok(RevealPlan {
        raw: serialize(&reveal_tx),
        tx: reveal_tx,
        txid,
        fee_sats,
        output_value_sats,
    })
}
