//! Consensus parameters.

use std::cmp::{Ord, Ordering};
use std::fmt;
use std::ops::{Add, Sub};

use crate::constants;

/// The height of a block on the MevaCoin chain.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockHeight(u64);

/// The height of the genesis block.
pub const H0: BlockHeight = BlockHeight(0);

impl BlockHeight {
    pub const fn from_u64(v: u64) -> BlockHeight {
        BlockHeight(v)
    }
}

impl fmt::Display for BlockHeight {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(formatter)
    }
}

impl Ord for BlockHeight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for BlockHeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u32> for BlockHeight {
    fn from(value: u32) -> Self {
        BlockHeight(value as u64)
    }
}

impl From<u64> for BlockHeight {
    fn from(value: u64) -> Self {
        BlockHeight(value)
    }
}

impl TryFrom<i64> for BlockHeight {
    type Error = std::num::TryFromIntError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value).map(BlockHeight)
    }
}

impl From<BlockHeight> for u64 {
    fn from(value: BlockHeight) -> u64 {
        value.0
    }
}

impl Add<u64> for BlockHeight {
    type Output = Self;

    fn add(self, other: u64) -> Self {
        BlockHeight(self.0 + other)
    }
}

impl Sub<u64> for BlockHeight {
    type Output = Self;

    fn sub(self, other: u64) -> Self {
        if other > self.0 {
            panic!("Subtraction resulted in negative block height.");
        }

        BlockHeight(self.0 - other)
    }
}

/// MevaCoin consensus parameters.
pub trait Parameters: Clone {
    /// Returns `CRYPTONOTE_MAX_BLOCK_NUMBER` for this network.
    ///
    /// A transaction unlock time below this value is interpreted as the block height at
    /// which the transaction's outputs become spendable; a value at or above it is
    /// interpreted as a UNIX timestamp.
    fn unlock_height_threshold(&self) -> u64;

    /// Returns the target interval between blocks, in seconds.
    fn block_target_time(&self) -> u64;

    /// Returns whether an output carrying the given unlock time is spendable, evaluated
    /// at the given reference height and UNIX timestamp.
    ///
    /// When classifying outputs discovered during a historical scan, the reference
    /// height must be the height at which the output was found, not the chain tip;
    /// likewise `reference_time` is supplied by the caller rather than inferred here.
    fn is_output_unlocked(
        &self,
        unlock_time: u64,
        reference_height: BlockHeight,
        reference_time: u64,
    ) -> bool {
        if unlock_time < self.unlock_height_threshold() {
            u64::from(reference_height) + 1 >= unlock_time
        } else {
            reference_time >= unlock_time
        }
    }
}

/// The enumeration of known MevaCoin networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    MainNetwork,
    TestNetwork,
}

pub use Network::{MainNetwork, TestNetwork};

impl Parameters for Network {
    fn unlock_height_threshold(&self) -> u64 {
        match self {
            Network::MainNetwork => constants::mainnet::UNLOCK_HEIGHT_THRESHOLD,
            Network::TestNetwork => constants::testnet::UNLOCK_HEIGHT_THRESHOLD,
        }
    }

    fn block_target_time(&self) -> u64 {
        match self {
            Network::MainNetwork => constants::mainnet::BLOCK_TARGET_TIME,
            Network::TestNetwork => constants::testnet::BLOCK_TARGET_TIME,
        }
    }
}
