use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use hirn::design::utils::short_type_name;
use hirn::design::ModuleHandle;
use log::debug;

use crate::module::ElementModule;
use crate::tracker;
use crate::{Context, ElabError, Key};

/// Hook stored on a single element instance
pub type ContextHook = Box<dyn FnOnce(&Context) -> Result<(), ElabError>>;

/// Hook shared by every element of a type
pub type ClassContextHook = Rc<dyn Fn(&Context) -> Result<(), ElabError>>;

thread_local! {
	static CLASS_HOOKS: RefCell<HashMap<TypeId, Vec<ClassContextHook>>> = RefCell::new(HashMap::new());
}

/// Registers a hook run with the context of every element of type `T`,
/// right before that element's instance hooks and `create`.
pub fn add_class_context_hook<T: Element>(hook: impl Fn(&Context) -> Result<(), ElabError> + 'static) {
	CLASS_HOOKS.with(|hooks| {
		hooks
			.borrow_mut()
			.entry(TypeId::of::<T>())
			.or_default()
			.push(Rc::new(hook))
	});
}

fn class_hooks(type_id: TypeId) -> Vec<ClassContextHook> {
	CLASS_HOOKS.with(|hooks| hooks.borrow().get(&type_id).cloned().unwrap_or_default())
}

/// A node of the element tree
///
/// Both phases run once per element. Submodules added in `create` are
/// elaborated between the two phases, the ones added in `finalize`
/// after it, with this element hidden from their lookups.
pub trait Element: Any {
	/// Declares statements, domains and submodules of this level
	fn create(&mut self, _m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		Ok(())
	}

	/// Runs after all submodules added in `create` are elaborated
	fn finalize(&mut self, _m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		Ok(())
	}

	fn add_class_context_hook(hook: impl Fn(&Context) -> Result<(), ElabError> + 'static)
	where
		Self: Sized,
	{
		add_class_context_hook::<Self>(hook)
	}
}

/// Bookkeeping attached to every element by the engine
#[derive(Default)]
pub(crate) struct ElementBase {
	pub name: Option<String>,
	pub key: Option<Key>,

	/// Child domain name -> parent domain name
	pub domain_map: BTreeMap<String, String>,

	/// Hooks registered while the element was constructed
	pub hooks: Vec<ContextHook>,

	pub context: Option<Context>,
	pub module: Option<ModuleHandle>,

	/// Elaborated children, kept alive with the parent
	pub children: Vec<ElementRef>,
}

pub(crate) struct ElementNode {
	base: Rc<RefCell<ElementBase>>,
	element: Rc<RefCell<dyn Element>>,
	any: Rc<dyn Any>,
	type_id: TypeId,
	type_name: &'static str,
}

/// Type-erased shared handle to an element
#[derive(Clone)]
pub struct ElementRef {
	node: Rc<ElementNode>,
}

impl ElementRef {
	pub(crate) fn from_node(node: Rc<ElementNode>) -> Self {
		Self { node }
	}

	pub(crate) fn downgrade(&self) -> Weak<ElementNode> {
		Rc::downgrade(&self.node)
	}

	pub fn name(&self) -> Option<String> {
		self.node.base.borrow().name.clone()
	}

	pub fn key(&self) -> Option<Key> {
		self.node.base.borrow().key.clone()
	}

	/// Type name without module path
	pub fn type_name(&self) -> &'static str {
		self.node.type_name
	}

	pub(crate) fn type_id(&self) -> TypeId {
		self.node.type_id
	}

	/// Name, or type name for unnamed elements
	pub fn label(&self) -> String {
		self.name().unwrap_or_else(|| self.type_name().to_string())
	}

	pub fn is<T: Element>(&self) -> bool {
		self.node.type_id == TypeId::of::<T>()
	}

	pub fn downcast<T: Element>(&self) -> Option<Elem<T>> {
		let inner = self.node.any.clone().downcast::<RefCell<T>>().ok()?;
		Some(Elem {
			inner,
			node: self.clone(),
		})
	}

	/// Context of the element, available once it has been visited
	pub fn context(&self) -> Result<Context, ElabError> {
		self.node
			.base
			.borrow()
			.context
			.clone()
			.ok_or_else(|| ElabError::NotElaborated(self.label()))
	}

	/// Backend module of the element, available once it has been visited
	pub fn module(&self) -> Result<ModuleHandle, ElabError> {
		self.node
			.base
			.borrow()
			.module
			.clone()
			.ok_or_else(|| ElabError::NotElaborated(self.label()))
	}

	pub fn is_elaborated(&self) -> bool {
		self.node.base.borrow().module.is_some()
	}

	pub fn domain_map(&self) -> BTreeMap<String, String> {
		self.node.base.borrow().domain_map.clone()
	}

	/// Elaborated children in attachment order
	pub fn children(&self) -> Vec<ElementRef> {
		self.node.base.borrow().children.clone()
	}

	pub fn ptr_eq(&self, other: &ElementRef) -> bool {
		Rc::ptr_eq(&self.node, &other.node)
	}

	pub(crate) fn set_name_if_unset(&self, name: &str) {
		self.node.base.borrow_mut().name.get_or_insert_with(|| name.into());
	}

	pub(crate) fn set_name(&self, name: &str) {
		self.node.base.borrow_mut().name = Some(name.into());
	}

	pub(crate) fn set_key(&self, key: Key) {
		self.node.base.borrow_mut().key = Some(key);
	}

	pub(crate) fn update_domain_map(&self, map: &BTreeMap<String, String>) {
		self.node
			.base
			.borrow_mut()
			.domain_map
			.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
	}

	pub(crate) fn bind(&self, context: Context, module: ModuleHandle) {
		let mut base = self.node.base.borrow_mut();
		base.context = Some(context);
		base.module = Some(module);
	}

	pub(crate) fn add_child(&self, child: ElementRef) {
		self.node.base.borrow_mut().children.push(child);
	}

	/// Runs class hooks, instance hooks and `create`, in that order
	pub(crate) fn run_create(&self, m: &mut ElementModule, ctx: &Context) -> Result<(), ElabError> {
		let class = class_hooks(self.node.type_id);
		let instance = std::mem::take(&mut self.node.base.borrow_mut().hooks);
		debug!(
			"Running {} class and {} instance hook(s) of '{}'",
			class.len(),
			instance.len(),
			ctx.path_string()
		);

		for hook in class {
			hook(ctx)?;
		}

		for hook in instance {
			hook(ctx)?;
		}

		self.borrow_element()?.create(m, ctx)
	}

	pub(crate) fn run_finalize(&self, m: &mut ElementModule, ctx: &Context) -> Result<(), ElabError> {
		self.borrow_element()?.finalize(m, ctx)
	}

	fn borrow_element(&self) -> Result<RefMut<'_, dyn Element>, ElabError> {
		self.node
			.element
			.try_borrow_mut()
			.map_err(|_| ElabError::ElementBusy(self.label()))
	}
}

impl AsRef<ElementRef> for ElementRef {
	fn as_ref(&self) -> &ElementRef {
		self
	}
}

impl std::fmt::Debug for ElementRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ElementRef")
			.field("type", &self.type_name())
			.field("name", &self.name())
			.field("key", &self.key())
			.finish()
	}
}

/// Typed shared handle to an element
pub struct Elem<T: Element> {
	inner: Rc<RefCell<T>>,
	node: ElementRef,
}

impl<T: Element> Clone for Elem<T> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			node: self.node.clone(),
		}
	}
}

impl<T: Element> Elem<T> {
	/// Constructs an element. Context hooks registered with
	/// [`with_context`](crate::with_context) inside `ctor` are attached to it.
	pub fn new(ctor: impl FnOnce() -> T) -> Self {
		ElementBuilder::new().build(ctor)
	}

	/// Constructs an element with a fallible constructor
	pub fn try_new(ctor: impl FnOnce() -> Result<T, ElabError>) -> Result<Self, ElabError> {
		ElementBuilder::new().try_build(ctor)
	}

	pub fn builder() -> ElementBuilder<T> {
		ElementBuilder::new()
	}

	fn wrap(base: Rc<RefCell<ElementBase>>, value: T) -> Self {
		let inner = Rc::new(RefCell::new(value));
		let element: Rc<RefCell<dyn Element>> = inner.clone();
		let any: Rc<dyn Any> = inner.clone();
		let node = Rc::new(ElementNode {
			base,
			element,
			any,
			type_id: TypeId::of::<T>(),
			type_name: short_type_name(std::any::type_name::<T>()),
		});

		Self {
			inner,
			node: ElementRef { node },
		}
	}

	/// Panics if the element is in one of its phases
	pub fn borrow(&self) -> Ref<'_, T> {
		self.inner.borrow()
	}

	/// Panics if the element is in one of its phases
	pub fn borrow_mut(&self) -> RefMut<'_, T> {
		self.inner.borrow_mut()
	}

	pub fn try_borrow(&self) -> Result<Ref<'_, T>, ElabError> {
		self.inner
			.try_borrow()
			.map_err(|_| ElabError::ElementBusy(self.node.label()))
	}

	pub fn try_borrow_mut(&self) -> Result<RefMut<'_, T>, ElabError> {
		self.inner
			.try_borrow_mut()
			.map_err(|_| ElabError::ElementBusy(self.node.label()))
	}

	pub fn with_name(self, name: &str) -> Self {
		self.node.set_name(name);
		self
	}

	pub fn with_key(self, key: Key) -> Self {
		self.node.set_key(key);
		self
	}

	pub fn name(&self) -> Option<String> {
		self.node.name()
	}

	pub fn key(&self) -> Option<Key> {
		self.node.key()
	}

	pub fn context(&self) -> Result<Context, ElabError> {
		self.node.context()
	}

	pub fn module(&self) -> Result<ModuleHandle, ElabError> {
		self.node.module()
	}

	pub fn element_ref(&self) -> ElementRef {
		self.node.clone()
	}
}

impl<T: Element> AsRef<ElementRef> for Elem<T> {
	fn as_ref(&self) -> &ElementRef {
		&self.node
	}
}

impl<T: Element> From<Elem<T>> for ElementRef {
	fn from(elem: Elem<T>) -> Self {
		elem.node
	}
}

impl<T: Element> From<&Elem<T>> for ElementRef {
	fn from(elem: &Elem<T>) -> Self {
		elem.node.clone()
	}
}

/// Sets name and key of an element before its constructor runs
pub struct ElementBuilder<T: Element> {
	name: Option<String>,
	key: Option<Key>,
	element: PhantomData<fn() -> T>,
}

impl<T: Element> Default for ElementBuilder<T> {
	fn default() -> Self {
		Self {
			name: None,
			key: None,
			element: PhantomData,
		}
	}
}

impl<T: Element> ElementBuilder<T> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn name(mut self, name: &str) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn key(mut self, key: Key) -> Self {
		self.key = Some(key);
		self
	}

	fn into_base(self) -> Rc<RefCell<ElementBase>> {
		Rc::new(RefCell::new(ElementBase {
			name: self.name,
			key: self.key,
			..Default::default()
		}))
	}

	pub fn build(self, ctor: impl FnOnce() -> T) -> Elem<T> {
		let base = self.into_base();
		let value = {
			let _guard = tracker::enter_construction(base.clone());
			ctor()
		};
		Elem::wrap(base, value)
	}

	pub fn try_build(self, ctor: impl FnOnce() -> Result<T, ElabError>) -> Result<Elem<T>, ElabError> {
		let base = self.into_base();
		let value = {
			let _guard = tracker::enter_construction(base.clone());
			ctor()?
		};
		Ok(Elem::wrap(base, value))
	}
}
