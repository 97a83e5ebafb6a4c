use std::sync::atomic::{AtomicU64, Ordering};

use derive_more::{Display, From};

/// Counter for global keys, never reset
static NEXT_GLOBAL_KEY: AtomicU64 = AtomicU64::new(0);

/// Value wrapped by a key
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, From)]
pub enum KeyValue {
	#[display(fmt = "{}", _0)]
	Str(String),

	#[display(fmt = "{}", _0)]
	Int(i64),

	#[from(ignore)]
	#[display(fmt = "global#{}", _0)]
	Global(u64),
}

impl From<&str> for KeyValue {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}

/// Identifies an element in the element tree independently of its type and position
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display)]
#[display(fmt = "{}", _0)]
pub struct Key(KeyValue);

impl Key {
	/// Creates a key wrapping the given value.
	/// Two such keys are equal if their values are.
	pub fn new(value: impl Into<KeyValue>) -> Self {
		Self(value.into())
	}

	/// Creates a process-unique key
	pub fn global() -> Self {
		Self(KeyValue::Global(NEXT_GLOBAL_KEY.fetch_add(1, Ordering::Relaxed)))
	}

	pub fn value(&self) -> &KeyValue {
		&self.0
	}

	pub fn is_global(&self) -> bool {
		matches!(self.0, KeyValue::Global(_))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_value_equality() {
		assert_eq!(Key::new("ila"), Key::new("ila".to_string()));
		assert_eq!(Key::new(3i64), Key::new(3i64));
		assert_ne!(Key::new("ila"), Key::new("other"));
		assert_ne!(Key::new(3i64), Key::new("3"));
	}

	#[test]
	fn test_global_keys_unique() {
		let a = Key::global();
		let b = Key::global();
		assert_ne!(a, b);
		assert_eq!(a, a.clone());
		assert!(a.is_global());
		assert!(!Key::new(0i64).is_global());
	}
}
