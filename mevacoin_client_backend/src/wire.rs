//! Data structures for the daemon's wallet-sync wire format.
//!
//! These mirror the JSON produced by a daemon's `/getwalletsyncdata` endpoint. The
//! payload is untrusted network input: decoding always passes the raw JSON through
//! [`crate::sanitize::clamp_unsafe_integers`] before deserializing, so oversized
//! numeric fields are capped before any other component can observe them.

use std::fmt;

use mevacoin_protocol::{consensus::BlockHeight, TxId};
use serde::{Deserialize, Deserializer};

use crate::keys::PublicKey;
use crate::sanitize;

/// An error produced while decoding a sync payload.
#[derive(Debug)]
pub enum WireError {
    /// The payload did not have the expected shape.
    Malformed(serde_json::Error),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Malformed(e) => write!(f, "Malformed wallet sync payload: {}", e),
        }
    }
}

impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WireError::Malformed(e) => Some(e),
        }
    }
}

/// A daemon-reported block.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_height: u64,

    /// The block's coinbase transaction, reported separately from the general
    /// transaction list.
    #[serde(default, rename = "coinbaseTX")]
    pub coinbase_tx: Option<Transaction>,

    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn height(&self) -> BlockHeight {
        BlockHeight::from_u64(self.block_height)
    }

    /// Returns the block's transactions in scan order: the coinbase transaction first,
    /// if present, then the regular transactions in their block order.
    pub fn transactions_in_scan_order(&self) -> impl Iterator<Item = &Transaction> {
        self.coinbase_tx.iter().chain(self.transactions.iter())
    }

    /// Locates the transaction with the given hash in the regular transaction list,
    /// falling back to the coinbase transaction when no hash matches.
    pub fn find_parent(&self, txid: &TxId) -> Option<&Transaction> {
        self.transactions
            .iter()
            .find(|tx| &tx.hash == txid)
            .or(self.coinbase_tx.as_ref())
    }
}

/// A transaction within a daemon-reported block.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(deserialize_with = "txid_from_hex")]
    pub hash: TxId,

    /// Absent for malformed transactions; such transactions are skipped by the scanner
    /// since no derivation can be computed for them.
    #[serde(default, deserialize_with = "optional_key_from_hex")]
    pub tx_public_key: Option<PublicKey>,

    #[serde(default)]
    pub unlock_time: u64,

    #[serde(default)]
    pub outputs: Vec<Output>,
}

/// The sentinel the wire format uses for a global output index the chain has not yet
/// assigned.
const GLOBAL_INDEX_UNASSIGNED: i64 = -1;

/// One output of a transaction. Outputs are indexed by their position within the
/// transaction; that position feeds the key derivation and must not be reordered.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    /// The one-time public key of this output.
    #[serde(deserialize_with = "key_from_hex")]
    pub key: PublicKey,

    /// The amount of this output, in atomic units.
    pub amount: u64,

    /// The output's position in the chain-wide output list, or `-1` if the chain has
    /// not yet assigned one.
    #[serde(default = "global_index_unassigned")]
    pub global_index: i64,
}

impl Output {
    /// The global output index, with the wire sentinel translated to `None`.
    ///
    /// An unassigned index must never be conflated with index 0.
    pub fn global_index(&self) -> Option<u64> {
        u64::try_from(self.global_index).ok()
    }
}

fn global_index_unassigned() -> i64 {
    GLOBAL_INDEX_UNASSIGNED
}

/// The envelope of a `/getwalletsyncdata` response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub items: Vec<Block>,

    /// Whether the daemon considers the requesting wallet caught up to its tip.
    #[serde(default)]
    pub synced: bool,
}

/// Decodes a full sync response, clamping unsafe integers first.
pub fn decode_sync_response(mut value: serde_json::Value) -> Result<SyncResponse, WireError> {
    sanitize::clamp_unsafe_integers(&mut value);
    serde_json::from_value(value).map_err(WireError::Malformed)
}

/// Decodes a raw JSON array of blocks, clamping unsafe integers first.
pub fn decode_blocks(mut value: serde_json::Value) -> Result<Vec<Block>, WireError> {
    sanitize::clamp_unsafe_integers(&mut value);
    serde_json::from_value(value).map_err(WireError::Malformed)
}

fn txid_from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TxId, D::Error> {
    let s = String::deserialize(deserializer)?;
    TxId::from_hex(&s).map_err(serde::de::Error::custom)
}

fn key_from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PublicKey, D::Error> {
    let s = String::deserialize(deserializer)?;
    PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
}

fn optional_key_from_hex<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<PublicKey>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => PublicKey::from_hex(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
