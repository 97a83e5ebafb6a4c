use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use super::Expression;

/// Next free signal ID. IDs are process-unique so that signals can be
/// created without access to any design.
static NEXT_SIGNAL_ID: AtomicUsize = AtomicUsize::new(1);

/// References a signal
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize)]
pub struct SignalId {
	id: usize,
}

impl SignalId {
	fn next() -> Self {
		Self {
			id: NEXT_SIGNAL_ID.fetch_add(1, Ordering::Relaxed),
		}
	}

	/// Checks if the reference is valid
	pub fn is_null(&self) -> bool {
		self.id == 0
	}
}

/// Physical signal representation
#[derive(Clone, Debug, Serialize)]
pub struct Signal {
	/// Self-reference
	id: SignalId,

	/// Name of the signal
	name: String,

	/// Bit width
	width: u32,
}

impl Signal {
	/// Creates a new 1-bit signal
	pub fn new(name: &str) -> Self {
		Self::with_width(name, 1)
	}

	/// Creates a new signal of given width
	pub fn with_width(name: &str, width: u32) -> Self {
		Self {
			id: SignalId::next(),
			name: name.into(),
			width,
		}
	}

	pub fn id(&self) -> SignalId {
		self.id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	/// Builds an expression referencing this signal
	pub fn expr(&self) -> Expression {
		Expression::Signal(self.clone())
	}
}

/// Signals are identified by their ID only
impl PartialEq for Signal {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for Signal {}

impl fmt::Display for Signal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "(sig {})", self.name)
	}
}
