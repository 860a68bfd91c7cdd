//! Structs representing outputs scanned from the block chain as belonging to a wallet.

use mevacoin_protocol::{consensus::BlockHeight, value::Atoms, TxId};

use crate::keys::{KeyImage, PublicKey};
use crate::wire;

/// A raw ownership match produced by the scanner: one output whose recovered candidate
/// key equalled one of the wallet's spend keys, before its block context has been
/// resolved into an [`OwnedInput`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputMatch {
    /// The wallet spend key the output belongs to.
    pub spend_key: PublicKey,
    /// Absent for view-only wallets.
    pub key_image: Option<KeyImage>,
    pub amount: Atoms,
    /// The output's position within its transaction.
    pub output_index: u64,
    /// Raw wire value; `-1` means the chain has not yet assigned a global index.
    pub global_index: i64,
    /// The one-time output key.
    pub key: PublicKey,
    pub parent_tx_hash: TxId,
}

/// A spendable (or time-locked) input owned by the wallet, in canonical form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedInput {
    key_image: Option<KeyImage>,
    amount: Atoms,
    block_height: BlockHeight,
    tx_public_key: Option<PublicKey>,
    output_index: u64,
    global_index: Option<u64>,
    key: PublicKey,
    spend_height: BlockHeight,
    unlock_time: u64,
    parent_tx_hash: TxId,
}

impl OwnedInput {
    /// Builds the canonical owned-input record for a match found in `block`.
    ///
    /// The parent transaction is located in the block by hash, falling back to the
    /// block's coinbase transaction. If the block carries neither, the provenance
    /// fields degrade to a placeholder (no transaction public key, zero unlock time)
    /// rather than failing; a balance-relevant match is worth keeping even when its
    /// context is malformed.
    pub fn from_match(m: OutputMatch, block: &wire::Block) -> Self {
        let (tx_public_key, unlock_time) = match block.find_parent(&m.parent_tx_hash) {
            Some(tx) => (tx.tx_public_key, tx.unlock_time),
            None => (None, 0),
        };

        OwnedInput {
            key_image: m.key_image,
            amount: m.amount,
            block_height: block.height(),
            tx_public_key,
            output_index: m.output_index,
            global_index: u64::try_from(m.global_index).ok(),
            key: m.key,
            // Freshly scanned inputs are always unspent.
            spend_height: BlockHeight::from_u64(0),
            unlock_time,
            parent_tx_hash: m.parent_tx_hash,
        }
    }

    pub fn key_image(&self) -> Option<&KeyImage> {
        self.key_image.as_ref()
    }

    pub fn amount(&self) -> Atoms {
        self.amount
    }

    /// The height of the block in which this output was found.
    pub fn block_height(&self) -> BlockHeight {
        self.block_height
    }

    pub fn tx_public_key(&self) -> Option<&PublicKey> {
        self.tx_public_key.as_ref()
    }

    /// The output's position within its parent transaction.
    pub fn output_index(&self) -> u64 {
        self.output_index
    }

    /// The output's position in the chain-wide output list, or `None` if the chain has
    /// not yet assigned one.
    pub fn global_index(&self) -> Option<u64> {
        self.global_index
    }

    /// The one-time output key.
    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    /// The height at which this input was spent; height 0 means not yet spent.
    pub fn spend_height(&self) -> BlockHeight {
        self.spend_height
    }

    pub fn unlock_time(&self) -> u64 {
        self.unlock_time
    }

    pub fn parent_tx_hash(&self) -> &TxId {
        &self.parent_tx_hash
    }
}

#[cfg(test)]
mod tests {
    use mevacoin_protocol::{value::Atoms, TxId};
    use serde_json::json;

    use super::{OutputMatch, OwnedInput};
    use crate::keys::PublicKey;
    use crate::wire;

    fn match_for(parent_tx_hash: TxId, global_index: i64) -> OutputMatch {
        OutputMatch {
            spend_key: PublicKey::from_bytes([1; 32]),
            key_image: None,
            amount: Atoms::from_u64(5000),
            output_index: 0,
            global_index,
            key: PublicKey::from_bytes([2; 32]),
            parent_tx_hash,
        }
    }

    fn block_with_coinbase_only() -> wire::Block {
        wire::decode_blocks(json!([{
            "blockHeight": 1000,
            "coinbaseTX": {
                "hash": "11".repeat(32),
                "txPublicKey": "22".repeat(32),
                "unlockTime": 1040,
                "outputs": [],
            },
        }]))
        .unwrap()
        .remove(0)
    }

    #[test]
    fn coinbase_match_sources_provenance_from_coinbase() {
        let block = block_with_coinbase_only();
        let input = OwnedInput::from_match(
            match_for(TxId::from_hex(&"11".repeat(32)).unwrap(), -1),
            &block,
        );

        assert_eq!(input.tx_public_key(), Some(&PublicKey::from_bytes([0x22; 32])));
        assert_eq!(input.unlock_time(), 1040);
        assert_eq!(u64::from(input.block_height()), 1000);
        assert_eq!(u64::from(input.spend_height()), 0);
    }

    #[test]
    fn unassigned_global_index_is_absent_not_zero() {
        let block = block_with_coinbase_only();
        let hash = TxId::from_hex(&"11".repeat(32)).unwrap();

        let input = OwnedInput::from_match(match_for(hash, -1), &block);
        assert_eq!(input.global_index(), None);

        let input = OwnedInput::from_match(match_for(hash, 0), &block);
        assert_eq!(input.global_index(), Some(0));
    }

    #[test]
    fn missing_parent_degrades_to_placeholder() {
        let block = wire::decode_blocks(json!([{ "blockHeight": 12 }]))
            .unwrap()
            .remove(0);

        let input = OwnedInput::from_match(match_for(TxId::from_bytes([9; 32]), 3), &block);
        assert_eq!(input.tx_public_key(), None);
        assert_eq!(input.unlock_time(), 0);
        assert_eq!(input.amount(), Atoms::from_u64(5000));
    }
}
