//! Policy-driven coin selection with ordinal-safety guarantees (spec §4.4).

use std::collections::HashSet;

use crate::error::{LifecycleError, LifecycleResult};
use crate::DUST_LIMIT_SATS;

use super::Utxo;

/// Tie-break strategy for which candidates are chosen first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Candidates sorted by descending value; first sufficient prefix wins.
    MinimizeInputs,
    /// Candidates sorted by ascending value; accumulate until covered.
    MinimizeChange,
    /// Currently orders candidates identically to `MinimizeChange`
    /// (ascending by value). Spec §4.4 leaves the tie-break
    /// implementation-defined; this variant exists so callers can name the
    /// "optimize for tx size" intent distinctly from `MinimizeChange` even
    /// though the orderings coincide today.
    OptimizeSize,
}

/// Selection policy (spec §4.4).
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    pub target_sats: u64,
    pub fee_rate_sat_per_vb: i64,
    pub allow_locked: bool,
    pub forbid_inscription_bearing_inputs: bool,
    pub avoid: Vec<String>,
    pub strategy: SelectionStrategy,
    pub base_tx_bytes: u64,
    pub bytes_per_input: u64,
    pub bytes_per_output: u64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            target_sats: 0,
            fee_rate_sat_per_vb: 1,
            allow_locked: false,
            forbid_inscription_bearing_inputs: true,
            avoid: Vec::new(),
            strategy: SelectionStrategy::MinimizeInputs,
            base_tx_bytes: 10,
            bytes_per_input: 148,
            bytes_per_output: 34,
        }
    }
}

/// Result of a successful selection.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub selected: Vec<Utxo>,
    pub fee_sats: u64,
    /// `None` when the residual change fell below dust and was absorbed
    /// into the fee instead of emitted as a change output.
    pub change_sats: Option<u64>,
    pub total_value_sats: u64,
}

fn estimate_fee(policy: &SelectionPolicy, num_inputs: usize, num_outputs: usize) -> u64 {
    let vbytes = policy.base_tx_bytes
        + (num_inputs as u64) * policy.bytes_per_input
        + (num_outputs as u64) * policy.bytes_per_output;
    // fee_rate is validated positive by the caller; ceil(rate * vbytes).
    let rate = policy.fee_rate_sat_per_vb as u64;
    let raw = rate * vbytes;
    // ceil division guard for any future fractional-rate support; currently
    // rate and vbytes are both integral so this is exact.
    raw
}

fn candidates_after_filters<'a>(
    utxos: &'a [Utxo],
    policy: &SelectionPolicy,
) -> LifecycleResult<Vec<&'a Utxo>> {
    let avoid: HashSet<&str> = policy.avoid.iter().map(String::as_str).collect();

    let usable: Vec<&Utxo> = utxos
        .iter()
        .filter(|u| !avoid.contains(u.outpoint().as_str()))
        .collect();

    if policy.forbid_inscription_bearing_inputs {
        let any_clean = usable.iter().any(|u| !u.carries_inscription);
        if !any_clean && usable.iter().any(|u| u.carries_inscription) {
            return Err(LifecycleError::AllInputsCarryInscription);
        }
    }

    let mut filtered: Vec<&Utxo> = usable
        .into_iter()
        .filter(|u| {
            if policy.forbid_inscription_bearing_inputs && u.carries_inscription {
                return false;
            }
            if !policy.allow_locked && u.locked {
                return false;
            }
            true
        })
        .collect();

    filtered.sort_by(|a, b| a.outpoint().cmp(&b.outpoint()));
    Ok(filtered)
}

fn order_for_strategy<'a>(mut candidates: Vec<&'a Utxo>, strategy: SelectionStrategy) -> Vec<&'a Utxo> {
    match strategy {
        SelectionStrategy::MinimizeInputs => {
            candidates.sort_by(|a, b| b.value_sats.cmp(&a.value_sats));
            candidates
        }
        SelectionStrategy::MinimizeChange | SelectionStrategy::OptimizeSize => {
            candidates.sort_by(|a, b| a.value_sats.cmp(&b.value_sats));
            candidates
        }
    }
}

fn accumulate<'a>(ordered: &[&'a Utxo], target_plus_fee: impl Fn(usize) -> u64) -> Option<Vec<&'a Utxo>> {
    let mut chosen: Vec<&Utxo> = Vec::new();
    let mut total = 0u64;
    for u in ordered {
        chosen.push(u);
        total += u.value_sats;
        if total >= target_plus_fee(chosen.len()) {
            return Some(chosen);
        }
    }
    None
}

fn finish(chosen: Vec<&Utxo>, fee_sats: u64, change_sats: Option<u64>, total_value_sats: u64) -> SelectionResult {
    SelectionResult { selected: chosen.into_iter().cloned().collect(), fee_sats, change_sats, total_value_sats }
}

/// Selects UTXOs covering `policy.target_sats` plus the estimated fee,
/// honoring ordinal-safety and lock invariants (spec §4.4).
pub fn select(utxos: &[Utxo], policy: &SelectionPolicy) -> LifecycleResult<SelectionResult> {
    if policy.target_sats < DUST_LIMIT_SATS {
        return Err(LifecycleError::DustOutput(policy.target_sats));
    }
    if policy.fee_rate_sat_per_vb <= 0 {
        return Err(LifecycleError::TooLowFee(policy.fee_rate_sat_per_vb));
    }

    let candidates = candidates_after_filters(utxos, policy)?;

    if candidates.is_empty() {
        if !policy.allow_locked && utxos.iter().any(|u| u.locked) {
            return Err(LifecycleError::ConflictingLocks);
        }
        return Err(insufficient_funds(policy, 0));
    }

    let ordered = order_for_strategy(candidates.clone(), policy.strategy);

    // Two-output assumption first (recipient + change); used only when the
    // resulting change clears the dust limit (spec §4.4).
    let two_output_target = |n: usize| policy.target_sats + estimate_fee(policy, n, 2);
    if let Some(chosen) = accumulate(&ordered, two_output_target) {
        let fee = estimate_fee(policy, chosen.len(), 2);
        let total: u64 = chosen.iter().map(|u| u.value_sats).sum();
        let change = total - policy.target_sats - fee;
        if change >= DUST_LIMIT_SATS {
            return Ok(finish(chosen, fee, Some(change), total));
        }
    }

    // No non-dust two-output selection; an exact single-output fee may
    // still be achievable with a (possibly larger) selection.
    let one_output_target = |n: usize| policy.target_sats + estimate_fee(policy, n, 1);
    if let Some(chosen) = accumulate(&ordered, one_output_target) {
        let fee = estimate_fee(policy, chosen.len(), 1);
        let total: u64 = chosen.iter().map(|u| u.value_sats).sum();
        return Ok(finish(chosen, fee, None, total));
    }

    // Neither target-plus-fee accumulation reached its goal: the candidates
    // may still cover the target alone, just not also the rate-estimated
    // fee on top of it (e.g. a single UTXO barely above the recipient's
    // dust floor). Accumulate on the target alone and absorb whatever
    // residual remains into the fee instead of emitting a sub-dust change
    // output or erroring (spec §4.4 scenario 4).
    match accumulate(&ordered, |_| policy.target_sats) {
        Some(chosen) => {
            let total: u64 = chosen.iter().map(|u| u.value_sats).sum();
            let fee = total - policy.target_sats;
            Ok(finish(chosen, fee, None, total))
        }
        None => {
            if !policy.allow_locked && utxos.iter().any(|u| u.locked) {
                let available: u64 = ordered.iter().map(|u| u.value_sats).sum();
                let locked_only_could_cover = utxos.iter().map(|u| u.value_sats).sum::<u64>() >= policy.target_sats;
                if locked_only_could_cover && available < policy.target_sats {
                    return Err(LifecycleError::ConflictingLocks);
                }
            }
            Err(insufficient_funds(policy, ordered.iter().map(|u| u.value_sats).sum()))
        }
    }
}

fn insufficient_funds(policy: &SelectionPolicy, available: u64) -> LifecycleError {
    LifecycleError::InsufficientFunds {
        needed: policy.target_sats + estimate_fee(policy, 1, 1),
        available,
    }
}
