use std::collections::BTreeSet;
use std::fmt::{Debug, Error, Formatter};

use super::{
	ClockDomain, Design, DesignError, DesignHandle, Driver, Expression, Fragment, ModuleId, Signal, Statement,
};

/// Represents a hardware module node in the design hierarchy
pub struct Module {
	/// Self-reference
	pub(super) id: ModuleId,

	/// Name the module was created with
	pub name: String,

	/// Parent module, once attached
	pub(super) parent: Option<ModuleId>,

	/// Domains, statements and drivers of this module
	pub(super) body: Fragment,

	/// Attached child modules with their instance names
	pub(super) children: Vec<(String, ModuleId)>,
}

impl Module {
	/// Creates a new detached module
	pub(super) fn new(id: ModuleId, name: &str, body: Fragment) -> Self {
		Self {
			id,
			name: name.into(),
			parent: None,
			body,
			children: vec![],
		}
	}

	pub fn id(&self) -> ModuleId {
		self.id
	}

	pub fn body(&self) -> &Fragment {
		&self.body
	}
}

/// Helper macro to get a mutable reference to the current module
/// in the ModuleHandle
macro_rules! this_module {
	($self:ident) => {
		$self.design.borrow_mut().get_module_mut($self.id).unwrap()
	};
}

/// Helper macro to get a shared reference to the current module
/// in the ModuleHandle
macro_rules! this_module_ref {
	($self:ident) => {
		$self.design.borrow().get_module($self.id).unwrap()
	};
}

/// References a module in the design
#[derive(Clone)]
pub struct ModuleHandle {
	/// Handle to the design
	design: DesignHandle,

	/// ID of the module
	id: ModuleId,
}

impl Debug for ModuleHandle {
	fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
		let name = self
			.design
			.try_borrow()
			.ok()
			.and_then(|design| design.get_module(self.id).map(|module| module.name.clone()));
		match name {
			Some(name) => write!(fmt, "ModuleHandle({:?}, {:?})", self.id, name),
			None => write!(fmt, "ModuleHandle({:?})", self.id),
		}
	}
}

impl ModuleHandle {
	/// Creates a new module handle
	pub(super) fn new(design: DesignHandle, id: ModuleId) -> Self {
		Self { design, id }
	}

	pub fn id(&self) -> ModuleId {
		self.id
	}

	/// Design this module belongs to
	pub fn design(&self) -> Design {
		Design::from_handle(self.design.clone())
	}

	pub fn name(&self) -> String {
		this_module_ref!(self).name.clone()
	}

	pub fn parent(&self) -> Option<ModuleHandle> {
		let parent = this_module_ref!(self).parent?;
		Some(ModuleHandle::new(self.design.clone(), parent))
	}

	/// Declares a clock domain in this module
	pub fn add_domain(&mut self, domain: ClockDomain) -> Result<(), DesignError> {
		this_module!(self).body.add_domain(domain)
	}

	pub fn has_domain(&self, name: &str) -> bool {
		this_module_ref!(self).body.has_domain(name)
	}

	pub fn domain(&self, name: &str) -> Option<ClockDomain> {
		this_module_ref!(self).body.domain(name).cloned()
	}

	pub fn domains(&self) -> Vec<ClockDomain> {
		this_module_ref!(self).body.domains().to_vec()
	}

	/// Adds a combinational assignment
	pub fn comb(&mut self, lhs: &Signal, rhs: impl Into<Expression>) -> Result<(), DesignError> {
		this_module!(self).body.comb(lhs, rhs)
	}

	/// Adds an assignment in the `sync` domain
	pub fn sync(&mut self, lhs: &Signal, rhs: impl Into<Expression>) -> Result<(), DesignError> {
		this_module!(self).body.sync(lhs, rhs)
	}

	/// Adds an assignment in the given domain
	pub fn d(&mut self, domain: &str, lhs: &Signal, rhs: impl Into<Expression>) -> Result<(), DesignError> {
		this_module!(self).body.d(domain, lhs, rhs)
	}

	pub fn begin_if(&mut self, condition: impl Into<Expression>) -> Result<(), DesignError> {
		this_module!(self).body.begin_if(condition)
	}

	pub fn begin_elif(&mut self, condition: impl Into<Expression>) -> Result<(), DesignError> {
		this_module!(self).body.begin_elif(condition)
	}

	pub fn begin_else(&mut self) -> Result<(), DesignError> {
		this_module!(self).body.begin_else()
	}

	pub fn end_if(&mut self) -> Result<(), DesignError> {
		this_module!(self).body.end_if()
	}

	/// Number of control flow blocks left open
	pub fn depth(&self) -> usize {
		this_module_ref!(self).body.depth()
	}

	pub fn statements(&self) -> Vec<Statement> {
		this_module_ref!(self).body.statements().to_vec()
	}

	pub fn drivers(&self) -> Vec<Driver> {
		this_module_ref!(self).body.drivers().to_vec()
	}

	pub fn driver_domains(&self) -> BTreeSet<Option<String>> {
		this_module_ref!(self).body.driver_domains()
	}

	/// Signals driven by the given domain
	pub fn driven_by(&self, domain: Option<&str>) -> Vec<Signal> {
		this_module_ref!(self).body.driven_by(domain).into_iter().cloned().collect()
	}

	/// Rewrites every driver domain name through `f`
	pub fn map_driver_domains<E>(&mut self, f: impl FnMut(&Signal, &str) -> Result<String, E>) -> Result<(), E> {
		this_module!(self).body.map_driver_domains(f)
	}

	/// Attaches another module of the same design under the given instance name
	pub fn attach_module(&mut self, name: &str, child: &ModuleHandle) -> Result<(), DesignError> {
		if !std::rc::Rc::ptr_eq(&self.design, &child.design) {
			return Err(DesignError::NotInDesign);
		}
		self.design.borrow_mut().attach(self.id, name, child.id)
	}

	/// Converts a fragment tree into submodules attached under the given instance name
	pub fn attach_fragment(&mut self, name: &str, fragment: Fragment) -> Result<ModuleHandle, DesignError> {
		let id = self.design.borrow_mut().attach_fragment(self.id, name, fragment)?;
		Ok(ModuleHandle::new(self.design.clone(), id))
	}

	/// Attached submodules in attachment order
	pub fn submodules(&self) -> Vec<(String, ModuleHandle)> {
		this_module_ref!(self)
			.children
			.iter()
			.map(|(name, id)| (name.clone(), ModuleHandle::new(self.design.clone(), *id)))
			.collect()
	}

	/// Looks up a submodule by its instance name
	pub fn submodule(&self, name: &str) -> Option<ModuleHandle> {
		self.submodules().into_iter().find(|(n, _)| n == name).map(|(_, m)| m)
	}

	/// Extracts this module and everything below it as an owned fragment
	pub fn to_fragment(&self) -> Result<Fragment, DesignError> {
		self.design.borrow().extract_fragment(self.id)
	}
}
