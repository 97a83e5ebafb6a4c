use hirn::design::{Elaboratable, Fragment};
use log::debug;

use crate::element::{Elem, Element, ElementRef};
use crate::ElabError;

/// Child of an element
pub enum Submodule {
	/// Element elaborated recursively
	Element(ElementRef),

	/// Backend construct attached as is, after its domains are renamed
	Raw(Box<dyn Elaboratable>),
}

impl Submodule {
	pub fn raw(elaboratable: impl Elaboratable + 'static) -> Self {
		Self::Raw(Box::new(elaboratable))
	}

	/// Name used when no instance name was given
	fn default_name(&self) -> Option<String> {
		match self {
			Self::Element(elem) => elem.name(),
			Self::Raw(_) => None,
		}
	}

	fn type_name(&self) -> &'static str {
		match self {
			Self::Element(elem) => elem.type_name(),
			Self::Raw(raw) => raw.type_name(),
		}
	}
}

impl<T: Element> From<Elem<T>> for Submodule {
	fn from(elem: Elem<T>) -> Self {
		Self::Element(elem.into())
	}
}

impl<T: Element> From<&Elem<T>> for Submodule {
	fn from(elem: &Elem<T>) -> Self {
		Self::Element(elem.into())
	}
}

impl From<ElementRef> for Submodule {
	fn from(elem: ElementRef) -> Self {
		Self::Element(elem)
	}
}

impl From<Fragment> for Submodule {
	fn from(fragment: Fragment) -> Self {
		Self::raw(fragment)
	}
}

impl From<Box<dyn Elaboratable>> for Submodule {
	fn from(raw: Box<dyn Elaboratable>) -> Self {
		Self::Raw(raw)
	}
}

/// Ordered name -> child mapping of an element.
///
/// Names stay reserved for the whole lifetime of the element, even after
/// the children themselves are handed over to the elaborator.
#[derive(Default)]
pub struct Submodules {
	names: Vec<String>,
	pending: Vec<(String, Submodule)>,
}

impl Submodules {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reserves a name, failing if it is already taken
	pub fn reserve(&mut self, name: &str) -> Result<(), ElabError> {
		if self.contains(name) {
			return Err(ElabError::DuplicateSubmodule(name.into()));
		}
		self.names.push(name.into());
		Ok(())
	}

	/// First free `<base>#<n>` name
	pub fn auto_name(&self, base: &str) -> String {
		(0..)
			.map(|n| format!("{}#{}", base, n))
			.find(|name| !self.contains(name))
			.unwrap_or_else(|| base.into())
	}

	/// Adds a child under an explicit name.
	/// An element child takes that name unless it already has a different one.
	pub fn insert(&mut self, name: &str, child: impl Into<Submodule>) -> Result<(), ElabError> {
		let child = child.into();
		if let Submodule::Element(elem) = &child {
			match elem.name() {
				Some(own) if own != name => {
					return Err(ElabError::SubmoduleNameMismatch {
						slot: name.into(),
						element: own,
					})
				},
				_ => {},
			}
		}

		self.reserve(name)?;
		if let Submodule::Element(elem) = &child {
			elem.set_name_if_unset(name);
		}
		debug!("Added submodule '{}'", name);
		self.pending.push((name.into(), child));
		Ok(())
	}

	/// Adds a child under its own name, or an automatic one based on its type.
	/// Returns the name used.
	pub fn add(&mut self, child: impl Into<Submodule>) -> Result<String, ElabError> {
		let child = child.into();
		let name = child
			.default_name()
			.unwrap_or_else(|| self.auto_name(child.type_name()));
		self.insert(&name, child)?;
		Ok(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.iter().any(|n| n == name)
	}

	/// Reserved names in reservation order
	pub fn names(&self) -> &[String] {
		&self.names
	}

	/// Child not yet handed over to the elaborator
	pub fn get(&self, name: &str) -> Option<&Submodule> {
		self.pending.iter().find(|(n, _)| n == name).map(|(_, child)| child)
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	pub(crate) fn take_pending(&mut self) -> Vec<(String, Submodule)> {
		std::mem::take(&mut self.pending)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use rstest::rstest;

	struct Adder;
	impl Element for Adder {}

	#[test]
	fn test_auto_names() {
		let mut subs = Submodules::new();
		let first = Elem::new(|| Adder);
		let second = Elem::new(|| Adder);
		assert_eq!(subs.add(&first).unwrap(), "Adder#0");
		assert_eq!(subs.add(&second).unwrap(), "Adder#1");
		assert_eq!(first.name().as_deref(), Some("Adder#0"));
		assert_eq!(second.name().as_deref(), Some("Adder#1"));
	}

	#[test]
	fn test_auto_name_skips_taken() {
		let mut subs = Submodules::new();
		subs.reserve("Adder#0").unwrap();
		assert_eq!(subs.add(Elem::new(|| Adder)).unwrap(), "Adder#1");
		assert_eq!(subs.add(Fragment::new()).unwrap(), "Fragment#0");
	}

	#[test]
	fn test_own_name_used() {
		let mut subs = Submodules::new();
		let named = Elem::new(|| Adder).with_name("add");
		assert_eq!(subs.add(named).unwrap(), "add");
		assert!(subs.get("add").is_some());
	}

	#[rstest]
	#[case("x", "x", true)]
	#[case("x", "y", false)]
	fn test_insert_named(#[case] own: &str, #[case] slot: &str, #[case] ok: bool) {
		let mut subs = Submodules::new();
		let elem = Elem::new(|| Adder).with_name(own);
		let result = subs.insert(slot, &elem);
		assert_eq!(result.is_ok(), ok);
		if !ok {
			assert!(matches!(result, Err(ElabError::SubmoduleNameMismatch { .. })));
		}
	}

	#[test]
	fn test_duplicate() {
		let mut subs = Submodules::new();
		subs.insert("a", Fragment::new()).unwrap();
		assert!(matches!(
			subs.insert("a", Fragment::new()),
			Err(ElabError::DuplicateSubmodule(name)) if name == "a"
		));

		subs.take_pending();
		assert!(subs.is_empty());
		assert!(subs.reserve("a").is_err());
	}
}
