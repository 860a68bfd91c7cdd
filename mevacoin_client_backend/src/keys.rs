//! Key material used when scanning the chain for outputs owned by a wallet.

use std::fmt;

use subtle::{Choice, ConstantTimeEq};

/// An error indicating that a key could not be parsed from its hex encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyParseError(hex::FromHexError);

impl fmt::Display for KeyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a valid 64-character hex key encoding: {}", self.0)
    }
}

impl std::error::Error for KeyParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// A compressed Ed25519 point, as used for transaction public keys, one-time output
/// keys, and wallet spend keys.
///
/// Whether the encoding is a valid curve element is checked by the cryptographic
/// provider at use, not here.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Wraps the given byte array as a public key.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        PublicKey(bytes)
    }

    /// Parses a public key from its 64-character hex encoding.
    pub fn from_hex(s: &str) -> Result<Self, KeyParseError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(KeyParseError)?;
        Ok(PublicKey(bytes))
    }

    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8; 32]> for PublicKey {
    fn as_ref(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_string()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl ConstantTimeEq for PublicKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

/// An Ed25519 scalar held by the wallet: the private view key, or a private spend key.
///
/// The `Debug` impl redacts the key bytes so that secrets do not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Wraps the given byte array as a secret key.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        SecretKey(bytes)
    }

    /// Parses a secret key from its 64-character hex encoding.
    pub fn from_hex(s: &str) -> Result<Self, KeyParseError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(KeyParseError)?;
        Ok(SecretKey(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// The shared secret computed from a transaction public key and the wallet's private
/// view key. Its contents are meaningful only to the cryptographic provider that
/// produced it.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyDerivation([u8; 32]);

impl KeyDerivation {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        KeyDerivation(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for KeyDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyDerivation(..)")
    }
}

/// The key image of an owned output, used to detect spends of that output on chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyImage([u8; 32]);

impl KeyImage {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        KeyImage(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Debug for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyImage").field(&hex::encode(self.0)).finish()
    }
}

impl fmt::Display for KeyImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A wallet spend key: the public half is always present, the private half only for
/// wallets that can spend (and therefore derive key images).
#[derive(Clone, Debug)]
pub struct SpendKeyPair {
    public: PublicKey,
    secret: Option<SecretKey>,
}

impl SpendKeyPair {
    pub fn new(public: PublicKey, secret: Option<SecretKey>) -> Self {
        SpendKeyPair { public, secret }
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret(&self) -> Option<&SecretKey> {
        self.secret.as_ref()
    }
}

/// The scanning identity for a wallet: the private view key together with one or more
/// spend keys.
///
/// Accounts are always passed explicitly to the scanning APIs; nothing in this crate
/// reads key material from ambient state.
#[derive(Clone, Debug)]
pub struct AccountKeys {
    view_secret: SecretKey,
    spend_keys: Vec<SpendKeyPair>,
    view_only: bool,
}

impl AccountKeys {
    /// Constructs an account from a private view key and a set of spend keys.
    ///
    /// The account is marked view-only when none of the spend keys carries its private
    /// half; key images are never derived for view-only accounts.
    pub fn new(view_secret: SecretKey, spend_keys: Vec<SpendKeyPair>) -> Self {
        let view_only = spend_keys.iter().all(|k| k.secret().is_none());
        AccountKeys {
            view_secret,
            spend_keys,
            view_only,
        }
    }

    /// Constructs a view-only account from a private view key and public spend keys.
    pub fn view_only(view_secret: SecretKey, spend_publics: Vec<PublicKey>) -> Self {
        AccountKeys {
            view_secret,
            spend_keys: spend_publics
                .into_iter()
                .map(|public| SpendKeyPair::new(public, None))
                .collect(),
            view_only: true,
        }
    }

    pub fn view_secret(&self) -> &SecretKey {
        &self.view_secret
    }

    pub fn spend_keys(&self) -> &[SpendKeyPair] {
        &self.spend_keys
    }

    pub fn is_view_only(&self) -> bool {
        self.view_only
    }
}
