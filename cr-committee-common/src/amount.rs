//! Fixed-point amount type, matching the original chain's `common.Fixed64`:
//! an `i64` counted in the smallest on-chain unit (1 ELA = 10^8 units).

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Smallest units per whole coin, matching `common.Fixed64`'s `1e8` scale.
pub const UNITS_PER_COIN: i64 = 100_000_000;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fixed64(pub i64);

impl Fixed64 {
	pub const ZERO: Fixed64 = Fixed64(0);

	pub fn from_units(units: i64) -> Self {
		Fixed64(units)
	}

	pub fn units(self) -> i64 {
		self.0
	}

	/// Multiply by a ratio expressed as `numerator / denominator`, flooring
	/// like the original's `float64` based penalty/reward arithmetic but
	/// kept in integer math to stay deterministic across platforms.
	pub fn mul_ratio(self, numerator: u64, denominator: u64) -> Fixed64 {
		if denominator == 0 {
			return Fixed64::ZERO;
		}
		let scaled = (self.0 as i128 * numerator as i128) / denominator as i128;
		Fixed64(scaled as i64)
	}

	/// Clamp this amount into `[Fixed64::ZERO, max]`.
	pub fn clamp(self, max: Fixed64) -> Fixed64 {
		if self.0 < 0 {
			Fixed64::ZERO
		} else if self > max {
			max
		} else {
			self
		}
	}

	pub fn checked_sub(self, rhs: Fixed64) -> Option<Fixed64> {
		self.0.checked_sub(rhs.0).map(Fixed64)
	}

	pub fn checked_add(self, rhs: Fixed64) -> Option<Fixed64> {
		self.0.checked_add(rhs.0).map(Fixed64)
	}
}

impl Add for Fixed64 {
	type Output = Fixed64;
	fn add(self, rhs: Fixed64) -> Fixed64 {
		Fixed64(self.0 + rhs.0)
	}
}

impl AddAssign for Fixed64 {
	fn add_assign(&mut self, rhs: Fixed64) {
		self.0 += rhs.0;
	}
}

impl Sub for Fixed64 {
	type Output = Fixed64;
	fn sub(self, rhs: Fixed64) -> Fixed64 {
		Fixed64(self.0 - rhs.0)
	}
}

impl SubAssign for Fixed64 {
	fn sub_assign(&mut self, rhs: Fixed64) {
		self.0 -= rhs.0;
	}
}

impl Sum for Fixed64 {
	fn sum<I: Iterator<Item = Fixed64>>(iter: I) -> Fixed64 {
		iter.fold(Fixed64::ZERO, Add::add)
	}
}

impl fmt::Display for Fixed64 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let whole = self.0 / UNITS_PER_COIN;
		let frac = (self.0 % UNITS_PER_COIN).abs();
		write!(f, "{}.{:08}", whole, frac)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn mul_ratio_floors() {
		let amount = Fixed64::from_units(100);
		assert_eq!(amount.mul_ratio(1, 3).units(), 33);
	}

	#[test]
	fn clamp_bounds_into_range() {
		let max = Fixed64::from_units(10);
		assert_eq!(Fixed64::from_units(-5).clamp(max), Fixed64::ZERO);
		assert_eq!(Fixed64::from_units(15).clamp(max), max);
		assert_eq!(Fixed64::from_units(5).clamp(max), Fixed64::from_units(5));
	}

	#[test]
	fn display_renders_whole_and_fraction() {
		assert_eq!(Fixed64::from_units(UNITS_PER_COIN + 5).to_string(), "1.00000005");
	}
}
