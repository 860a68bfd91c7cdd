use std::fmt;

/// The identifier for a MevaCoin transaction: the Keccak hash of the serialized
/// transaction prefix, displayed in natural byte order as CryptoNote tooling does.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct TxId([u8; 32]);

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The hex string is more useful than the raw bytes, because we can look it up in
        // RPC methods and block explorers.
        f.debug_tuple("TxId").field(&self.to_string()).finish()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&hex::encode(self.0))
    }
}

impl AsRef<[u8; 32]> for TxId {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<TxId> for [u8; 32] {
    fn from(value: TxId) -> Self {
        value.0
    }
}

impl TxId {
    /// Wraps the given byte array as a TxId value.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        TxId(bytes)
    }

    /// Parses a TxId from its 64-character hex encoding.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut hash = [0u8; 32];
        hex::decode_to_slice(s, &mut hash)?;
        Ok(TxId(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::TxId;

    #[test]
    fn hex_round_trip() {
        let txid = TxId::from_bytes([0xab; 32]);
        assert_eq!(TxId::from_hex(&txid.to_string()), Ok(txid));
    }

    #[test]
    fn rejects_malformed_encodings() {
        assert!(TxId::from_hex("abcd").is_err());
        assert!(TxId::from_hex(&"zz".repeat(32)).is_err());
    }
}
