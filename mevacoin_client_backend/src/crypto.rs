//! The elliptic-curve provider interface consumed by the scanner.
//!
//! The curve arithmetic itself (X25519-style derivations, key-image generation, ring
//! signatures) lives behind this trait and is supplied by the embedding application,
//! typically as bindings to the chain's reference C implementation. The scanner only
//! requires the three operations below, and relies on the provider to fail loudly on
//! malformed input rather than return a plausible-looking wrong result.

use std::fmt;

use crate::keys::{KeyDerivation, KeyImage, PublicKey, SecretKey, SpendKeyPair};

/// Errors produced by a [`CryptoProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CryptoError {
    /// A supplied key encoding is not a valid curve element.
    InvalidPoint,

    /// Key-image generation was requested for a spend key whose private half is not
    /// available.
    MissingSpendSecret,

    /// The provider backend failed; the message is provider-defined.
    Backend(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidPoint => {
                write!(f, "A supplied key encoding is not a valid curve element.")
            }
            CryptoError::MissingSpendSecret => {
                write!(
                    f,
                    "Key-image generation requires the private spend key, which this wallet does not hold."
                )
            }
            CryptoError::Backend(msg) => write!(f, "Cryptographic provider failure: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

/// The key-derivation operations required to scan the chain for owned outputs.
pub trait CryptoProvider {
    /// Computes the shared secret for a transaction from its public key and the
    /// wallet's private view key.
    fn derive_shared_secret(
        &self,
        tx_public_key: &PublicKey,
        private_view_key: &SecretKey,
    ) -> Result<KeyDerivation, CryptoError>;

    /// Recovers the base public spend key that, combined with `derivation` at
    /// `output_index`, would have produced `output_key`.
    ///
    /// This is the modular inverse of the one-time-key derivation performed when an
    /// output is created; comparing the result against the wallet's spend keys tests
    /// ownership without requiring any private spend key.
    fn recover_candidate_spend_key(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        output_key: &PublicKey,
    ) -> Result<PublicKey, CryptoError>;

    /// Generates the key image for an owned output.
    ///
    /// Only invoked for spend keys whose private half is present; providers should
    /// return [`CryptoError::MissingSpendSecret`] otherwise.
    fn generate_key_image(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        spend_keys: &SpendKeyPair,
    ) -> Result<KeyImage, CryptoError>;
}

impl<C: CryptoProvider> CryptoProvider for &C {
    fn derive_shared_secret(
        &self,
        tx_public_key: &PublicKey,
        private_view_key: &SecretKey,
    ) -> Result<KeyDerivation, CryptoError> {
        (*self).derive_shared_secret(tx_public_key, private_view_key)
    }

    fn recover_candidate_spend_key(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        output_key: &PublicKey,
    ) -> Result<PublicKey, CryptoError> {
        (*self).recover_candidate_spend_key(derivation, output_index, output_key)
    }

    fn generate_key_image(
        &self,
        derivation: &KeyDerivation,
        output_index: u64,
        spend_keys: &SpendKeyPair,
    ) -> Result<KeyImage, CryptoError> {
        (*self).generate_key_image(derivation, output_index, spend_keys)
    }
}
