use std::ops::{Deref, DerefMut};

use hirn::design::{ClockDomain, ModuleHandle};

use crate::domains;
use crate::submodules::{Submodule, Submodules};
use crate::{Context, ElabError};

/// Module handed to element phases.
///
/// Derefs to the backend module for statements and control flow, and adds
/// submodule bookkeeping and scoped domain declarations on top.
pub struct ElementModule {
	handle: ModuleHandle,
	submodules: Submodules,
	context: Context,

	/// Whether declared domains are driven from the domain of the same name outside
	bridge_domains: bool,
}

impl ElementModule {
	pub(crate) fn new(handle: ModuleHandle, context: Context, bridge_domains: bool) -> Self {
		Self {
			handle,
			submodules: Submodules::new(),
			context,
			bridge_domains,
		}
	}

	pub fn handle(&self) -> &ModuleHandle {
		&self.handle
	}

	pub fn context(&self) -> &Context {
		&self.context
	}

	pub fn submodules(&mut self) -> &mut Submodules {
		&mut self.submodules
	}

	/// Adds a child under its own or an automatic name
	pub fn add_submodule(&mut self, child: impl Into<Submodule>) -> Result<String, ElabError> {
		self.submodules.add(child)
	}

	/// Adds a child under the given name
	pub fn insert_submodule(&mut self, name: &str, child: impl Into<Submodule>) -> Result<(), ElabError> {
		self.submodules.insert(name, child)
	}

	/// Declares a domain private to this element and its children.
	/// Returns the physical domain it was renamed to.
	pub fn add_domain(&mut self, domain: ClockDomain) -> Result<ClockDomain, ElabError> {
		let name = domain.name().to_string();
		domains::declare_domain(&mut self.handle, &self.context, &name, domain, self.bridge_domains)
	}

	/// Same as [`add_domain`](Self::add_domain), checking that the domain is named `name`
	pub fn set_domain(&mut self, name: &str, domain: ClockDomain) -> Result<ClockDomain, ElabError> {
		if domain.name() != name {
			return Err(ElabError::DomainNameMismatch {
				expected: name.into(),
				actual: domain.name().into(),
			});
		}
		self.add_domain(domain)
	}

	pub(crate) fn take_pending(&mut self) -> Vec<(String, Submodule)> {
		self.submodules.take_pending()
	}

	pub(crate) fn into_handle(self) -> ModuleHandle {
		self.handle
	}
}

impl Deref for ElementModule {
	type Target = ModuleHandle;

	fn deref(&self) -> &ModuleHandle {
		&self.handle
	}
}

impl DerefMut for ElementModule {
	fn deref_mut(&mut self) -> &mut ModuleHandle {
		&mut self.handle
	}
}
