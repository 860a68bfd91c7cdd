//! Tools for scanning daemon-reported blocks for outputs owned by a wallet.

use std::fmt;

use mevacoin_protocol::{
    consensus::BlockHeight,
    value::{Atoms, BalanceError},
    TxId,
};
use subtle::ConstantTimeEq;

use crate::crypto::{CryptoError, CryptoProvider};
use crate::keys::{AccountKeys, PublicKey};
use crate::wallet::{OutputMatch, OwnedInput};
use crate::wire;

/// Errors that may occur in chain scanning.
#[derive(Clone, Debug)]
pub enum ScanError {
    /// The cryptographic provider failed while processing the given transaction. The
    /// transaction's outputs were not scanned; previously aggregated results are
    /// unaffected.
    Crypto { txid: TxId, error: CryptoError },

    /// A block in the batch had a lower height than its predecessor. Heights must be
    /// non-decreasing within a scan batch.
    HeightRegression {
        prev_height: BlockHeight,
        new_height: BlockHeight,
    },

    /// Aggregating an owned output's amount would overflow the running totals. The
    /// offending amount was not added; totals accumulated so far remain valid.
    Balance(BalanceError),
}

impl ScanError {
    /// Returns the hash of the transaction that failed to scan, if this error is
    /// scoped to a single transaction.
    pub fn txid(&self) -> Option<&TxId> {
        match self {
            ScanError::Crypto { txid, .. } => Some(txid),
            ScanError::HeightRegression { .. } | ScanError::Balance(_) => None,
        }
    }
}

impl From<BalanceError> for ScanError {
    fn from(error: BalanceError) -> Self {
        ScanError::Balance(error)
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Crypto { txid, error } => {
                write!(f, "Failed to scan transaction {}: {}", txid, error)
            }
            ScanError::HeightRegression {
                prev_height,
                new_height,
            } => write!(
                f,
                "Block height regression in scan batch: height {} follows height {}",
                new_height, prev_height
            ),
            ScanError::Balance(error) => write!(f, "Failed to aggregate balance: {}", error),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Crypto { error, .. } => Some(error),
            ScanError::HeightRegression { .. } => None,
            ScanError::Balance(error) => Some(error),
        }
    }
}

/// Checks that block heights never decrease across a batch.
pub(crate) fn check_height_order(blocks: &[wire::Block]) -> Option<ScanError> {
    blocks.windows(2).find_map(|pair| {
        (pair[1].height() < pair[0].height()).then(|| ScanError::HeightRegression {
            prev_height: pair[0].height(),
            new_height: pair[1].height(),
        })
    })
}

/// Scans one transaction for outputs owned by the account.
///
/// The shared derivation is computed exactly once and reused for every output of the
/// transaction. Each output's recovered candidate key is compared against all of the
/// account's spend keys in constant time; the first matching key is recorded as the
/// owner. Transactions without a transaction public key contribute no derivation and
/// no matches; that is a benign skip, not an error.
pub fn scan_transaction<C: CryptoProvider>(
    provider: &C,
    account: &AccountKeys,
    tx: &wire::Transaction,
) -> Result<Vec<OutputMatch>, ScanError> {
    let Some(tx_public_key) = tx.tx_public_key else {
        tracing::debug!(txid = %tx.hash, "transaction has no public key; skipping");
        return Ok(vec![]);
    };

    let derivation = provider
        .derive_shared_secret(&tx_public_key, account.view_secret())
        .map_err(|error| ScanError::Crypto {
            txid: tx.hash,
            error,
        })?;

    let mut matches = vec![];
    for (index, output) in tx.outputs.iter().enumerate() {
        let output_index = index as u64;
        let candidate = provider
            .recover_candidate_spend_key(&derivation, output_index, &output.key)
            .map_err(|error| ScanError::Crypto {
                txid: tx.hash,
                error,
            })?;

        let owner = account
            .spend_keys()
            .iter()
            .find(|pair| bool::from(candidate.ct_eq(pair.public())));

        if let Some(pair) = owner {
            let key_image = if account.is_view_only() || pair.secret().is_none() {
                None
            } else {
                Some(
                    provider
                        .generate_key_image(&derivation, output_index, pair)
                        .map_err(|error| ScanError::Crypto {
                            txid: tx.hash,
                            error,
                        })?,
                )
            };

            matches.push(OutputMatch {
                spend_key: *pair.public(),
                key_image,
                amount: Atoms::from_u64(output.amount),
                output_index,
                global_index: output.global_index,
                key: output.key,
                parent_tx_hash: tx.hash,
            });
        }
    }

    Ok(matches)
}

/// The outcome of scanning a single block: the owned inputs found, tagged with the
/// spend key they belong to, plus any transactions that failed to scan.
#[derive(Debug)]
pub struct ScannedBlock {
    height: BlockHeight,
    received: Vec<(PublicKey, OwnedInput)>,
    failed: Vec<ScanError>,
}

impl ScannedBlock {
    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// The owned inputs found in this block, in block order.
    pub fn received(&self) -> &[(PublicKey, OwnedInput)] {
        &self.received
    }

    /// Per-transaction scan failures; the orchestrator decides whether these abort the
    /// batch or are skipped and reported.
    pub fn failed(&self) -> &[ScanError] {
        &self.failed
    }

    pub fn into_parts(self) -> (Vec<(PublicKey, OwnedInput)>, Vec<ScanError>) {
        (self.received, self.failed)
    }
}

/// Scans a block with the given account, coinbase transaction first.
///
/// Failures are collected per transaction rather than aborting the block, so that a
/// single malformed transaction cannot suppress matches elsewhere in the block.
#[tracing::instrument(skip_all, fields(height = block.block_height))]
pub fn scan_block<C: CryptoProvider>(
    provider: &C,
    account: &AccountKeys,
    block: &wire::Block,
) -> ScannedBlock {
    let mut received = vec![];
    let mut failed = vec![];

    for tx in block.transactions_in_scan_order() {
        match scan_transaction(provider, account, tx) {
            Ok(matches) => {
                for m in matches {
                    let spend_key = m.spend_key;
                    received.push((spend_key, OwnedInput::from_match(m, block)));
                }
            }
            Err(error) => {
                tracing::warn!(height = block.block_height, %error, "failed to scan transaction");
                failed.push(error);
            }
        }
    }

    ScannedBlock {
        height: block.height(),
        received,
        failed,
    }
}
