use std::error;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

/// The number of atomic units in one MEVA.
pub const COIN: u64 = 100_000;

/// A type-safe representation of a nonnegative amount of MevaCoin, in atomic units.
///
/// Unlike chains with a bounded money supply, the full `u64` range is a valid atomic
/// amount, so construction is infallible; overflow is instead surfaced at each addition,
/// which returns `None` rather than wrapping. Amounts are always exact integers; the
/// atomic unit is indivisible and must never pass through floating point.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Atoms(u64);

impl Atoms {
    /// Returns the identity `Atoms`.
    pub const ZERO: Self = Atoms(0);

    /// Creates an `Atoms` from a number of atomic units.
    pub const fn from_u64(amount: u64) -> Self {
        Atoms(amount)
    }

    /// Returns this amount as a u64.
    pub const fn into_u64(self) -> u64 {
        self.0
    }

    /// Returns whether or not this `Atoms` is the zero value.
    pub fn is_zero(&self) -> bool {
        self == &Atoms::ZERO
    }

    /// Returns whether or not this `Atoms` is positive.
    pub fn is_positive(&self) -> bool {
        self > &Atoms::ZERO
    }
}

impl From<u64> for Atoms {
    fn from(value: u64) -> Self {
        Atoms(value)
    }
}

impl From<Atoms> for u64 {
    fn from(value: Atoms) -> u64 {
        value.0
    }
}

impl Add<Atoms> for Atoms {
    type Output = Option<Atoms>;

    fn add(self, rhs: Atoms) -> Option<Atoms> {
        self.0.checked_add(rhs.0).map(Atoms)
    }
}

impl Add<Atoms> for Option<Atoms> {
    type Output = Self;

    fn add(self, rhs: Atoms) -> Option<Atoms> {
        self.and_then(|lhs| lhs + rhs)
    }
}

impl Sum<Atoms> for Option<Atoms> {
    fn sum<I: Iterator<Item = Atoms>>(iter: I) -> Self {
        iter.fold(Some(Atoms::ZERO), |acc, a| acc? + a)
    }
}

impl<'a> Sum<&'a Atoms> for Option<Atoms> {
    fn sum<I: Iterator<Item = &'a Atoms>>(iter: I) -> Self {
        iter.fold(Some(Atoms::ZERO), |acc, a| acc? + *a)
    }
}

/// A type for balance violations in amount addition (overflow of the `u64` range).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BalanceError {
    Overflow,
}

impl error::Error for BalanceError {}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            BalanceError::Overflow => {
                write!(f, "Amount addition resulted in a value outside the valid range.")
            }
        }
    }
}
