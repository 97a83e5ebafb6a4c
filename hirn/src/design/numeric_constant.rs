use std::fmt;

use num_bigint::BigInt;
use serde::Serialize;

/// Represents a sized numeric constant value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NumericConstant {
	value: BigInt,
	width: u64,
}

impl NumericConstant {
	/// New constant of given width
	pub fn new(value: BigInt, width: u64) -> Self {
		Self { value, width }
	}

	/// New constant with bit width optimal to store the provided value
	pub fn new_unsigned(value: BigInt) -> Self {
		let width = value.bits().max(1);
		Self::new(value, width)
	}

	pub fn zero() -> NumericConstant {
		Self::new_unsigned(0.into())
	}

	pub fn one() -> NumericConstant {
		Self::new_unsigned(1.into())
	}

	pub fn width(&self) -> u64 {
		self.width
	}

	pub fn value(&self) -> &BigInt {
		&self.value
	}
}

impl fmt::Display for NumericConstant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "(const {}'d{})", self.width, self.value)
	}
}
