//! The scan pipeline: drives scanning, unlock classification, and balance aggregation
//! over an ordered batch of blocks.
//!
//! Blocks are expected to have already been decoded via [`crate::wire`], which runs
//! the numeric safety guard before anything else touches the data. The pipeline holds
//! no cross-block state beyond the running aggregation, so blocks can be scanned
//! sequentially ([`scan_blocks`]) or in parallel across the rayon threadpool
//! ([`scan_blocks_par`]); the parallel path aggregates per block and reduces the
//! partitions afterwards, so no lock is ever held across a provider call.

use std::collections::HashMap;

use mevacoin_protocol::consensus::Parameters;
use rayon::prelude::*;

use crate::balance::{Balance, BalanceAggregator, UnlockState};
use crate::crypto::CryptoProvider;
use crate::keys::{AccountKeys, PublicKey};
use crate::scanning::{check_height_order, scan_block, ScanError};
use crate::wallet::OwnedInput;
use crate::wire;

/// What the pipeline does when a transaction fails to scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanPolicy {
    /// Record the failure in the summary and keep scanning. The result is marked
    /// partial via [`ScanSummary::is_complete`].
    #[default]
    SkipFailedTransactions,

    /// Abort the batch on the first failing transaction.
    Abort,
}

/// The result of scanning a batch of blocks.
#[derive(Clone, Debug, Default)]
pub struct ScanSummary {
    balance: Balance,
    balances_by_key: HashMap<PublicKey, Balance>,
    received: Vec<(PublicKey, OwnedInput)>,
    errors: Vec<ScanError>,
}

impl ScanSummary {
    /// The merged unlocked/locked totals across all spend keys.
    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Totals partitioned by the spend key that owns them.
    pub fn balances_by_spend_key(&self) -> &HashMap<PublicKey, Balance> {
        &self.balances_by_key
    }

    /// The owned inputs found, tagged with their owning spend key, ordered by block and
    /// position within block.
    pub fn received(&self) -> &[(PublicKey, OwnedInput)] {
        &self.received
    }

    /// Consumes the summary, returning the owned inputs.
    pub fn into_received(self) -> Vec<(PublicKey, OwnedInput)> {
        self.received
    }

    /// The number of transactions that failed to scan and were skipped.
    pub fn skipped_transactions(&self) -> usize {
        self.errors.len()
    }

    /// The per-transaction failures behind [`Self::skipped_transactions`].
    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    /// Whether every transaction in the batch was scanned. Callers should present
    /// partial results differently from complete ones.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The contribution of one block to a summary.
struct BlockOutcome {
    aggregator: BalanceAggregator,
    received: Vec<(PublicKey, OwnedInput)>,
    errors: Vec<ScanError>,
}

fn scan_one_block<P: Parameters, C: CryptoProvider>(
    params: &P,
    provider: &C,
    account: &AccountKeys,
    block: &wire::Block,
    reference_time: u64,
    policy: ScanPolicy,
) -> Result<BlockOutcome, ScanError> {
    let (received, errors) = scan_block(provider, account, block).into_parts();

    if policy == ScanPolicy::Abort {
        if let Some(error) = errors.into_iter().next() {
            return Err(error);
        }
        return build_outcome(params, received, reference_time, vec![]);
    }

    build_outcome(params, received, reference_time, errors)
}

fn build_outcome<P: Parameters>(
    params: &P,
    received: Vec<(PublicKey, OwnedInput)>,
    reference_time: u64,
    errors: Vec<ScanError>,
) -> Result<BlockOutcome, ScanError> {
    let mut aggregator = BalanceAggregator::new();
    for (spend_key, input) in &received {
        // Classification is relative to the height at which the output was found, not
        // the chain tip.
        let state = if params.is_output_unlocked(
            input.unlock_time(),
            input.block_height(),
            reference_time,
        ) {
            UnlockState::Unlocked
        } else {
            UnlockState::Locked
        };
        aggregator.record(*spend_key, input.amount(), state)?;
    }

    Ok(BlockOutcome {
        aggregator,
        received,
        errors,
    })
}

fn summarize(outcomes: Vec<BlockOutcome>) -> Result<ScanSummary, ScanError> {
    let mut aggregator = BalanceAggregator::new();
    let mut received = vec![];
    let mut errors = vec![];

    for outcome in outcomes {
        aggregator = aggregator.merge(outcome.aggregator)?;
        received.extend(outcome.received);
        errors.extend(outcome.errors);
    }

    let (balance, balances_by_key) = aggregator.into_parts();
    Ok(ScanSummary {
        balance,
        balances_by_key,
        received,
        errors,
    })
}

/// Scans an ordered batch of blocks with the given account, sequentially.
///
/// `reference_time` is the UNIX timestamp against which timestamp-based unlock times
/// are classified; callers supply it explicitly rather than having the pipeline read
/// the system clock.
pub fn scan_blocks<P: Parameters, C: CryptoProvider>(
    params: &P,
    provider: &C,
    account: &AccountKeys,
    blocks: &[wire::Block],
    reference_time: u64,
    policy: ScanPolicy,
) -> Result<ScanSummary, ScanError> {
    if let Some(error) = check_height_order(blocks) {
        return Err(error);
    }

    let outcomes = blocks
        .iter()
        .map(|block| scan_one_block(params, provider, account, block, reference_time, policy))
        .collect::<Result<Vec<_>, _>>()?;

    summarize(outcomes)
}

/// Scans an ordered batch of blocks in parallel across the rayon threadpool.
///
/// Blocks are independent once fetched, so each is scanned and aggregated on its own,
/// and the per-block partitions are reduced in block order afterwards; the result is
/// identical to [`scan_blocks`].
pub fn scan_blocks_par<P, C>(
    params: &P,
    provider: &C,
    account: &AccountKeys,
    blocks: &[wire::Block],
    reference_time: u64,
    policy: ScanPolicy,
) -> Result<ScanSummary, ScanError>
where
    P: Parameters + Sync,
    C: CryptoProvider + Sync,
{
    if let Some(error) = check_height_order(blocks) {
        return Err(error);
    }

    let outcomes = blocks
        .par_iter()
        .map(|block| scan_one_block(params, provider, account, block, reference_time, policy))
        .collect::<Result<Vec<_>, _>>()?;

    summarize(outcomes)
}

/// Balance-only mode: scans the batch and returns the merged balance together with the
/// number of transactions that failed to scan.
pub fn scan_balance<P: Parameters, C: CryptoProvider>(
    params: &P,
    provider: &C,
    account: &AccountKeys,
    blocks: &[wire::Block],
    reference_time: u64,
) -> Result<(Balance, usize), ScanError> {
    let summary = scan_blocks(
        params,
        provider,
        account,
        blocks,
        reference_time,
        ScanPolicy::SkipFailedTransactions,
    )?;
    Ok((summary.balance(), summary.skipped_transactions()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mevacoin_protocol::consensus::MainNetwork;
    use mevacoin_protocol::value::Atoms;
    use serde_json::json;

    use super::{scan_balance, scan_blocks, scan_blocks_par, ScanPolicy};
    use crate::crypto::testing::{output_key_for, MockCryptoProvider};
    use crate::keys::{AccountKeys, PublicKey, SecretKey};
    use crate::scanning::ScanError;
    use crate::wire;

    fn view_secret() -> SecretKey {
        SecretKey::from_bytes([0x0b; 32])
    }

    fn spend_public(tag: u8) -> PublicKey {
        PublicKey::from_bytes([tag; 32])
    }

    fn account(spend_tags: &[u8]) -> AccountKeys {
        AccountKeys::view_only(
            view_secret(),
            spend_tags.iter().map(|t| spend_public(*t)).collect(),
        )
    }

    /// One block with one regular transaction holding one output per entry of
    /// `outputs`: (owning spend key, amount).
    fn fake_block(
        height: u64,
        tx_key_tag: u8,
        unlock_time: u64,
        outputs: &[(PublicKey, u64)],
    ) -> serde_json::Value {
        let tx_public_key = PublicKey::from_bytes([tx_key_tag; 32]);
        let outputs: Vec<_> = outputs
            .iter()
            .enumerate()
            .map(|(i, (spend, amount))| {
                let key = output_key_for(&tx_public_key, &view_secret(), i as u64, spend);
                json!({ "key": key.to_string(), "amount": amount })
            })
            .collect();

        json!({
            "blockHeight": height,
            "transactions": [{
                "hash": hex::encode([tx_key_tag; 32]),
                "txPublicKey": tx_public_key.to_string(),
                "unlockTime": unlock_time,
                "outputs": outputs,
            }],
        })
    }

    #[test]
    fn unlock_time_zero_is_unlocked() {
        let provider = MockCryptoProvider::new();
        let account = account(&[0x21]);
        let blocks = wire::decode_blocks(json!([fake_block(
            1000,
            0x77,
            0,
            &[(spend_public(0x21), 5000)]
        )]))
        .unwrap();

        let (balance, skipped) =
            scan_balance(&MainNetwork, &provider, &account, &blocks, 0).unwrap();
        assert_eq!(balance.unlocked(), Atoms::from_u64(5000));
        assert_eq!(balance.locked(), Atoms::ZERO);
        assert_eq!(skipped, 0);
    }

    #[test]
    fn far_future_unlock_time_is_locked() {
        let provider = MockCryptoProvider::new();
        let account = account(&[0x21]);
        let blocks = wire::decode_blocks(json!([fake_block(
            1000,
            0x77,
            99_999_999,
            &[(spend_public(0x21), 5000)]
        )]))
        .unwrap();

        let (balance, _) = scan_balance(&MainNetwork, &provider, &account, &blocks, 0).unwrap();
        assert_eq!(balance.unlocked(), Atoms::ZERO);
        assert_eq!(balance.locked(), Atoms::from_u64(5000));
    }

    #[test]
    fn conservation_across_mixed_outputs() {
        let provider = MockCryptoProvider::new();
        let account = account(&[0x21]);
        let blocks = wire::decode_blocks(json!([
            fake_block(10, 0x70, 0, &[(spend_public(0x21), 100), (spend_public(0x33), 9)]),
            fake_block(11, 0x71, 99_999_999, &[(spend_public(0x21), 40)]),
            fake_block(12, 0x72, 0, &[(spend_public(0x21), 7)]),
        ]))
        .unwrap();

        let summary = scan_blocks(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::default(),
        )
        .unwrap();

        // The foreign output (key 0x33) contributes nothing; every owned output lands
        // in exactly one bucket.
        let owned_sum: Option<Atoms> = summary
            .received()
            .iter()
            .map(|(_, input)| input.amount())
            .sum();
        assert_eq!(owned_sum, Some(summary.balance().total()));
        assert_eq!(summary.balance().unlocked(), Atoms::from_u64(107));
        assert_eq!(summary.balance().locked(), Atoms::from_u64(40));
        assert_eq!(summary.received().len(), 3);
    }

    #[test]
    fn scanning_twice_yields_identical_results() {
        let provider = MockCryptoProvider::new();
        let account = account(&[0x21]);
        let blocks = wire::decode_blocks(json!([
            fake_block(10, 0x70, 0, &[(spend_public(0x21), 100)]),
            fake_block(11, 0x71, 99_999_999, &[(spend_public(0x21), 40)]),
        ]))
        .unwrap();

        let first = scan_blocks(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::default(),
        )
        .unwrap();
        let second = scan_blocks(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::default(),
        )
        .unwrap();

        assert_eq!(first.balance(), second.balance());
        assert_eq!(first.received(), second.received());
    }

    #[test]
    fn per_key_partitions_sum_to_merged_totals() {
        let provider = MockCryptoProvider::new();
        let multi = account(&[0x21, 0x22]);
        let blocks = wire::decode_blocks(json!([
            fake_block(10, 0x70, 0, &[(spend_public(0x21), 100), (spend_public(0x22), 50)]),
            fake_block(11, 0x71, 99_999_999, &[(spend_public(0x22), 5)]),
        ]))
        .unwrap();

        let summary = scan_blocks(
            &MainNetwork,
            &provider,
            &multi,
            &blocks,
            0,
            ScanPolicy::default(),
        )
        .unwrap();

        let by_key = summary.balances_by_spend_key();
        assert_eq!(by_key.len(), 2);
        let partitioned: Option<Atoms> = by_key.values().map(|b| b.total()).sum();
        assert_eq!(partitioned, Some(summary.balance().total()));
        assert_eq!(by_key[&spend_public(0x21)].unlocked(), Atoms::from_u64(100));
        assert_eq!(by_key[&spend_public(0x22)].locked(), Atoms::from_u64(5));
    }

    #[test]
    fn skip_policy_reports_partial_results() {
        let mut provider = MockCryptoProvider::new();
        provider.poisoned_tx_key = Some(PublicKey::from_bytes([0x66; 32]));
        let account = account(&[0x21]);
        let blocks = wire::decode_blocks(json!([
            fake_block(10, 0x66, 0, &[(spend_public(0x21), 11)]),
            fake_block(11, 0x71, 0, &[(spend_public(0x21), 100)]),
        ]))
        .unwrap();

        let summary = scan_blocks(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::SkipFailedTransactions,
        )
        .unwrap();

        assert!(!summary.is_complete());
        assert_eq!(summary.skipped_transactions(), 1);
        // The failing transaction did not corrupt the rest of the batch.
        assert_eq!(summary.balance().unlocked(), Atoms::from_u64(100));
    }

    #[test]
    fn abort_policy_surfaces_the_first_error() {
        let mut provider = MockCryptoProvider::new();
        provider.poisoned_tx_key = Some(PublicKey::from_bytes([0x66; 32]));
        let account = account(&[0x21]);
        let blocks = wire::decode_blocks(json!([
            fake_block(10, 0x66, 0, &[(spend_public(0x21), 11)]),
        ]))
        .unwrap();

        let result = scan_blocks(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::Abort,
        );
        assert_matches!(result, Err(ScanError::Crypto { .. }));
    }

    #[test]
    fn height_regression_rejects_the_batch() {
        let provider = MockCryptoProvider::new();
        let account = account(&[0x21]);
        let blocks = wire::decode_blocks(json!([
            fake_block(11, 0x70, 0, &[]),
            fake_block(10, 0x71, 0, &[]),
        ]))
        .unwrap();

        let result = scan_blocks(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::default(),
        );
        assert_matches!(result, Err(ScanError::HeightRegression { .. }));
    }

    #[test]
    fn parallel_scan_matches_sequential_scan() {
        let provider = MockCryptoProvider::new();
        let account = account(&[0x21, 0x22]);
        let blocks = wire::decode_blocks(serde_json::Value::Array(
            (0..32u64)
                .map(|i| {
                    fake_block(
                        100 + i,
                        i as u8,
                        if i % 3 == 0 { 99_999_999 } else { 0 },
                        &[
                            (spend_public(0x21), 10 + i),
                            (spend_public(0x22), 3 * i),
                        ],
                    )
                })
                .collect(),
        ))
        .unwrap();

        let sequential = scan_blocks(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::default(),
        )
        .unwrap();
        let parallel = scan_blocks_par(
            &MainNetwork,
            &provider,
            &account,
            &blocks,
            0,
            ScanPolicy::default(),
        )
        .unwrap();

        assert_eq!(sequential.balance(), parallel.balance());
        assert_eq!(
            sequential.balances_by_spend_key(),
            parallel.balances_by_spend_key()
        );
        assert_eq!(sequential.received(), parallel.received());
    }
}
