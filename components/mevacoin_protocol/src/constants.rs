//! Network-specific MevaCoin constants.

/// Constants for the MevaCoin production network.
pub mod mainnet {
    /// The base-58 prefix applied to standard addresses, from `CryptoNoteConfig.h`.
    pub const ADDRESS_PREFIX: u64 = 18511;

    /// The number of decimal places in one MEVA.
    pub const DECIMAL_PLACES: u32 = 5;

    /// The target interval between blocks, in seconds.
    pub const BLOCK_TARGET_TIME: u64 = 30;

    /// `CRYPTONOTE_MAX_BLOCK_NUMBER`: transaction unlock times below this value are
    /// block heights; values at or above it are UNIX timestamps.
    pub const UNLOCK_HEIGHT_THRESHOLD: u64 = 500_000_000;
}

/// Constants for the MevaCoin test network.
pub mod testnet {
    /// The base-58 prefix applied to standard addresses.
    pub const ADDRESS_PREFIX: u64 = 18511;

    /// The number of decimal places in one MEVA.
    pub const DECIMAL_PLACES: u32 = 5;

    /// The target interval between blocks, in seconds.
    pub const BLOCK_TARGET_TIME: u64 = 30;

    /// `CRYPTONOTE_MAX_BLOCK_NUMBER`: transaction unlock times below this value are
    /// block heights; values at or above it are UNIX timestamps.
    pub const UNLOCK_HEIGHT_THRESHOLD: u64 = 500_000_000;
}
