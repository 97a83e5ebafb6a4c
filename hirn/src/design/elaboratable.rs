use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::utils::short_type_name;
use super::{DesignError, Fragment};

/// Opaque value describing the target platform. Forwarded untouched.
pub type Platform = Rc<dyn Any>;

/// Something that can be turned into a backend fragment
pub trait Elaboratable {
	fn elaborate(&self, platform: Option<&Platform>) -> Result<Fragment, DesignError>;

	/// Name used when an instance name has to be generated
	fn type_name(&self) -> &'static str {
		short_type_name(std::any::type_name::<Self>())
	}
}

impl Elaboratable for Fragment {
	fn elaborate(&self, _platform: Option<&Platform>) -> Result<Fragment, DesignError> {
		Ok(self.clone())
	}
}

impl<E: Elaboratable + ?Sized> Elaboratable for Box<E> {
	fn elaborate(&self, platform: Option<&Platform>) -> Result<Fragment, DesignError> {
		(**self).elaborate(platform)
	}

	fn type_name(&self) -> &'static str {
		(**self).type_name()
	}
}

/// Renames domains referenced by the wrapped elaboratable
pub struct DomainRenamer<E: Elaboratable> {
	map: BTreeMap<String, String>,
	inner: E,
}

impl<E: Elaboratable> DomainRenamer<E> {
	pub fn new(map: BTreeMap<String, String>, inner: E) -> Self {
		Self { map, inner }
	}

	/// Renames only the `sync` domain
	pub fn sync(name: &str, inner: E) -> Self {
		Self::new(BTreeMap::from([("sync".to_string(), name.to_string())]), inner)
	}
}

impl<E: Elaboratable> Elaboratable for DomainRenamer<E> {
	fn elaborate(&self, platform: Option<&Platform>) -> Result<Fragment, DesignError> {
		let mut fragment = self.inner.elaborate(platform)?;
		fragment.rename_domains(&self.map);
		Ok(fragment)
	}

	fn type_name(&self) -> &'static str {
		self.inner.type_name()
	}
}
