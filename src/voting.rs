use std::fmt;

use crate::errors::SquadsError;

/// `tokens` is multiplied by this before dividing by supply: percent (x100)
/// with three fractional digits (x1000).
pub const VOTING_POWER_SCALE: u128 = 100_000;

/// A voting share with two-decimal precision, stored as hundredths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VotingPower(u128);

impl VotingPower {
    pub const ZERO: Self = Self(0);
    /// Sentinel carried by every member of a fixed-weight squad.
    pub const ONE: Self = Self(100);

    pub const fn from_hundredths(hundredths: u128) -> Self {
        Self(hundredths)
    }

    pub const fn hundredths(self) -> u128 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Strictly greater than `threshold` whole units.
    pub fn exceeds(self, threshold: u8) -> bool {
        self.0 > u128::from(threshold) * 100
    }
}

impl fmt::Display for VotingPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Share of `supply` held by `tokens`, as a percentage rounded half-up to two
/// decimals.
///
/// The multiply happens before the divide and everything stays in `u128`
/// until the final value is produced, so small holdings against a large
/// supply keep their precision.
pub fn voting_power(tokens: u64, supply: u64) -> Result<VotingPower, SquadsError> {
    if supply == 0 {
        return Err(SquadsError::DivisionByZero);
    }
    let thousandths = u128::from(tokens) * VOTING_POWER_SCALE / u128::from(supply);
    Ok(VotingPower((thousandths + 5) / 10))
}

pub fn is_core(power: VotingPower, core_threshold: u8) -> bool {
    power.exceeds(core_threshold)
}
