//! Balance totals and their accumulation over a scan.

use std::collections::HashMap;

use mevacoin_protocol::value::{Atoms, BalanceError};

use crate::keys::PublicKey;

/// The unlock classification of a scanned output, decided by the consensus unlock
/// predicate at scan time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockState {
    Unlocked,
    Locked,
}

/// Unlocked and locked totals, in atomic units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    unlocked: Atoms,
    locked: Atoms,
}

impl Balance {
    /// The `Balance` with zero values for both its fields.
    pub const ZERO: Self = Balance {
        unlocked: Atoms::ZERO,
        locked: Atoms::ZERO,
    };

    /// The total value that may currently be spent.
    pub fn unlocked(&self) -> Atoms {
        self.unlocked
    }

    /// The total value still held by an unlock time.
    pub fn locked(&self) -> Atoms {
        self.locked
    }

    /// The sum of the unlocked and locked totals.
    pub fn total(&self) -> Atoms {
        (self.unlocked + self.locked).expect("overflow is checked on every addition")
    }

    fn check_total_adding(&self, value: Atoms) -> Result<Atoms, BalanceError> {
        (self.unlocked + self.locked + value).ok_or(BalanceError::Overflow)
    }

    /// Adds the given value to the bucket selected by `state`, checking that the
    /// combined total cannot overflow.
    pub fn add(&mut self, value: Atoms, state: UnlockState) -> Result<(), BalanceError> {
        self.check_total_adding(value)?;
        match state {
            UnlockState::Unlocked => {
                self.unlocked = (self.unlocked + value).expect("checked above");
            }
            UnlockState::Locked => {
                self.locked = (self.locked + value).expect("checked above");
            }
        }
        Ok(())
    }

    /// Combines two balances, checking for overflow of the combined total.
    pub fn combine(mut self, other: Balance) -> Result<Balance, BalanceError> {
        self.add(other.unlocked, UnlockState::Unlocked)?;
        self.add(other.locked, UnlockState::Locked)?;
        Ok(self)
    }
}

/// Folds the stream of classified owned outputs into running totals.
///
/// Every recorded output contributes to exactly one of the unlocked or locked totals,
/// both in the merged balance and in the per-spend-key partition. Aggregators from
/// independently scanned partitions can be combined with [`BalanceAggregator::merge`],
/// which is how the parallel pipeline serializes contributions without sharing a
/// mutable accumulator across threads.
#[derive(Clone, Debug, Default)]
pub struct BalanceAggregator {
    merged: Balance,
    by_spend_key: HashMap<PublicKey, Balance>,
}

impl BalanceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one classified output amount against the spend key that owns it.
    pub fn record(
        &mut self,
        spend_key: PublicKey,
        amount: Atoms,
        state: UnlockState,
    ) -> Result<(), BalanceError> {
        self.merged.add(amount, state)?;
        self.by_spend_key
            .entry(spend_key)
            .or_default()
            .add(amount, state)
    }

    /// Merges another aggregator into this one.
    pub fn merge(mut self, other: BalanceAggregator) -> Result<Self, BalanceError> {
        self.merged = self.merged.combine(other.merged)?;
        for (spend_key, balance) in other.by_spend_key {
            let entry = self.by_spend_key.entry(spend_key).or_default();
            *entry = entry.combine(balance)?;
        }
        Ok(self)
    }

    /// The totals across all spend keys.
    pub fn balance(&self) -> Balance {
        self.merged
    }

    /// The totals partitioned by owning spend key.
    pub fn by_spend_key(&self) -> &HashMap<PublicKey, Balance> {
        &self.by_spend_key
    }

    pub fn into_parts(self) -> (Balance, HashMap<PublicKey, Balance>) {
        (self.merged, self.by_spend_key)
    }
}
