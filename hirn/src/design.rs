pub mod design_error;
pub mod domain;
pub mod elaboratable;
pub mod expression;
pub mod expression_ops;
pub mod fragment;
pub mod module;
pub mod numeric_constant;
pub mod scope;
pub mod signal;
pub mod utils;

pub use design_error::DesignError;
pub use domain::{ClockDomain, ClockEdge};
pub use elaboratable::{DomainRenamer, Elaboratable, Platform};
pub use expression::{BinaryOp, Expression, UnaryOp};
pub use fragment::{Driver, Fragment};
pub use module::{Module, ModuleHandle};
pub use numeric_constant::NumericConstant;
pub use scope::{Assignment, ConditionalBranch, IfStatement, Statement};
pub use signal::{Signal, SignalId};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;
use serde::Serialize;

/// References a module in a design
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Serialize)]
pub struct ModuleId {
	id: usize,
}

impl ModuleId {
	/// Checks if the reference is valid
	pub fn is_null(&self) -> bool {
		self.id == 0
	}
}

/// Core part of the generic design representation
/// Refferred to via multiple handles with reference
/// counting.
pub struct DesignCore {
	weak: WeakDesignHandle,
	modules: Vec<Module>,
}

impl DesignCore {
	/// Creates a new empty design
	pub fn new() -> Self {
		Self {
			weak: WeakDesignHandle::new(),
			modules: Vec::new(),
		}
	}

	/// Adds a new detached module node with the given body
	fn add_module(&mut self, name: &str, body: Fragment) -> ModuleId {
		let id = ModuleId {
			id: self.modules.len() + 1,
		};
		self.modules.push(Module::new(id, name, body));
		id
	}

	/// Returns a mutable reference to the module with the given ID
	fn get_module_mut(&mut self, module: ModuleId) -> Option<&mut Module> {
		if module.is_null() {
			return None;
		}
		self.modules.get_mut(module.id - 1)
	}

	/// Returns a reference to the module with the given ID
	fn get_module(&self, module: ModuleId) -> Option<&Module> {
		if module.is_null() {
			return None;
		}
		self.modules.get(module.id - 1)
	}

	/// Returns a handle to the module with the given ID
	fn get_module_handle(&self, module: ModuleId) -> Option<ModuleHandle> {
		self.get_module(module)?;
		Some(ModuleHandle::new(self.weak.upgrade()?, module))
	}

	/// Creates a new module in the design
	pub fn new_module(&mut self, name: &str) -> Result<ModuleHandle, DesignError> {
		let id = self.add_module(name, Fragment::new());
		self.get_module_handle(id).ok_or(DesignError::NotInDesign)
	}

	/// Attaches a detached module as a named child of another
	fn attach(&mut self, parent: ModuleId, name: &str, child: ModuleId) -> Result<(), DesignError> {
		let child_module = self.get_module(child).ok_or(DesignError::InvalidModuleId(child))?;
		if child_module.parent.is_some() || child == parent {
			return Err(DesignError::ModuleAlreadyAttached(child));
		}

		let parent_module = self.get_module_mut(parent).ok_or(DesignError::InvalidModuleId(parent))?;
		if parent_module.children.iter().any(|(n, _)| n == name) {
			return Err(DesignError::SubmoduleNameConflict(name.into()));
		}
		parent_module.children.push((name.into(), child));

		debug!("Attached module {:?} as '{}' to {:?}", child, name, parent);
		self.get_module_mut(child).ok_or(DesignError::InvalidModuleId(child))?.parent = Some(parent);
		Ok(())
	}

	/// Turns a fragment tree into module nodes attached under `parent`
	fn attach_fragment(&mut self, parent: ModuleId, name: &str, mut fragment: Fragment) -> Result<ModuleId, DesignError> {
		let subfragments = fragment.take_subfragments();
		let id = self.add_module(name, fragment);
		self.attach(parent, name, id)?;

		for (sub_name, sub) in subfragments {
			self.attach_fragment(id, &sub_name, sub)?;
		}
		Ok(id)
	}

	/// Rebuilds an owned fragment tree from a module subtree
	fn extract_fragment(&self, module: ModuleId) -> Result<Fragment, DesignError> {
		let m = self.get_module(module).ok_or(DesignError::InvalidModuleId(module))?;
		let mut fragment = m.body.clone();
		for (name, child) in &m.children {
			fragment.add_subfragment(name, self.extract_fragment(*child)?)?;
		}
		Ok(fragment)
	}
}

/// Weak reference to a design
pub type WeakDesignHandle = Weak<RefCell<DesignCore>>;

/// Strong reference to a design
pub type DesignHandle = Rc<RefCell<DesignCore>>;

/// Represents a hardware design
#[derive(Clone)]
pub struct Design {
	handle: DesignHandle,
}

impl Design {
	/// Creates a new HIRN design
	pub fn new() -> Self {
		let d = Self {
			handle: Rc::new(RefCell::new(DesignCore::new())),
		};

		d.handle.borrow_mut().weak = Rc::downgrade(&d.handle);
		d
	}

	pub(crate) fn from_handle(handle: DesignHandle) -> Self {
		Self { handle }
	}

	pub fn handle(&self) -> DesignHandle {
		self.handle.clone()
	}

	/// Creates a new module with provided name and returns a handle to it
	pub fn new_module(&mut self, name: &str) -> Result<ModuleHandle, DesignError> {
		self.handle.borrow_mut().new_module(name)
	}

	pub fn get_module_handle(&self, module: ModuleId) -> Option<ModuleHandle> {
		self.handle.borrow().get_module_handle(module)
	}

	/// Total number of module nodes in the design
	pub fn module_count(&self) -> usize {
		self.handle.borrow().modules.len()
	}
}

impl Default for Design {
	fn default() -> Self {
		Self::new()
	}
}
