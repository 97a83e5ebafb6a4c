use std::any::TypeId;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use hirn::design::{ClockDomain, Platform, Signal};
use itertools::Itertools;

use crate::element::{Elem, Element, ElementNode, ElementRef};
use crate::{ElabError, Key};

/// Maps logical domain names, as seen by an element, to physical domains
pub type DomainTable = BTreeMap<String, ClockDomain>;

struct ContextInner {
	/// Whether lookups from below may return this element
	visible: bool,

	parent: Option<Context>,

	/// Back-reference to the element. Parents keep their children alive,
	/// so this is only ever dead once the whole tree is gone.
	element: Weak<ElementNode>,

	name: String,
	key: Option<Key>,
	type_id: TypeId,

	/// Shared with the invisible copy of this context
	domains: Rc<RefCell<DomainTable>>,

	platform: Option<Platform>,
}

/// Lookup record of a single element in the element tree.
///
/// Contexts are linked to their parent's context and are immutable,
/// apart from the domain table which the element fills while it is created.
#[derive(Clone)]
pub struct Context {
	inner: Rc<ContextInner>,
}

impl Context {
	pub(crate) fn new(
		parent: Option<Context>,
		element: &ElementRef,
		domains: DomainTable,
		platform: Option<Platform>,
	) -> Self {
		Self {
			inner: Rc::new(ContextInner {
				visible: true,
				parent,
				element: element.downgrade(),
				name: element.label(),
				key: element.key(),
				type_id: element.type_id(),
				domains: Rc::new(RefCell::new(domains)),
				platform,
			}),
		}
	}

	/// Creates a copy of this context which lookups skip
	pub fn invisible(&self) -> Self {
		let inner = &self.inner;
		Self {
			inner: Rc::new(ContextInner {
				visible: false,
				parent: inner.parent.clone(),
				element: inner.element.clone(),
				name: inner.name.clone(),
				key: inner.key.clone(),
				type_id: inner.type_id,
				domains: inner.domains.clone(),
				platform: inner.platform.clone(),
			}),
		}
	}

	pub fn is_visible(&self) -> bool {
		self.inner.visible
	}

	pub fn parent(&self) -> Option<&Context> {
		self.inner.parent.as_ref()
	}

	/// Element this context belongs to
	pub fn element(&self) -> Option<ElementRef> {
		self.inner.element.upgrade().map(ElementRef::from_node)
	}

	/// Element this context belongs to, if it is a `T`
	pub fn element_as<T: Element>(&self) -> Option<Elem<T>> {
		self.element()?.downcast::<T>()
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	pub fn key(&self) -> Option<&Key> {
		self.inner.key.as_ref()
	}

	/// Contexts of all ancestors, nearest first
	pub fn ancestors(&self) -> impl Iterator<Item = &Context> {
		std::iter::successors(self.parent(), |ctx| ctx.parent())
	}

	fn visible_ancestors(&self) -> impl Iterator<Item = &Context> {
		self.ancestors().filter(|ctx| ctx.is_visible())
	}

	/// Finds the nearest visible ancestor of type `T`. Never returns self.
	/// Only the exact type matches; use [`find_where`](Self::find_where)
	/// to match on anything else, such as a trait the element implements.
	pub fn find<T: Element>(&self) -> Option<Elem<T>> {
		self.visible_ancestors()
			.find(|ctx| ctx.inner.type_id == TypeId::of::<T>())
			.and_then(|ctx| ctx.element_as::<T>())
	}

	/// Finds the nearest visible ancestor accepted by the predicate
	pub fn find_where(&self, mut pred: impl FnMut(&ElementRef) -> bool) -> Option<ElementRef> {
		self.visible_ancestors()
			.filter_map(|ctx| ctx.element())
			.find(|elem| pred(elem))
	}

	/// Finds the nearest visible ancestor tagged with `key`
	pub fn find_by_key(&self, key: &Key) -> Option<ElementRef> {
		self.visible_ancestors()
			.find(|ctx| ctx.key() == Some(key))
			.and_then(|ctx| ctx.element())
	}

	/// Names on the path to the root, this element first
	pub fn path(&self) -> impl Iterator<Item = &str> {
		std::iter::successors(Some(self), |ctx| ctx.parent()).map(|ctx| ctx.name())
	}

	/// Path from the root, separated with '/'
	pub fn path_string(&self) -> String {
		let names: Vec<_> = self.path().collect();
		names.iter().rev().join("/")
	}

	pub fn domain(&self, name: &str) -> Option<ClockDomain> {
		self.inner.domains.borrow().get(name).cloned()
	}

	/// Snapshot of the domain table
	pub fn domains(&self) -> DomainTable {
		self.inner.domains.borrow().clone()
	}

	pub(crate) fn declare_domain(&self, name: &str, domain: ClockDomain) {
		self.inner.domains.borrow_mut().insert(name.into(), domain);
	}

	pub fn platform(&self) -> Option<&Platform> {
		self.inner.platform.as_ref()
	}

	/// Platform downcast to a concrete type
	pub fn platform_as<T: 'static>(&self) -> Option<Rc<T>> {
		self.platform()?.clone().downcast::<T>().ok()
	}

	/// Clock signal of the domain known here under `name`
	pub fn clock_signal(&self, name: &str) -> Result<Signal, ElabError> {
		self.domain(name)
			.map(|domain| domain.clk().clone())
			.ok_or_else(|| ElabError::UnknownDomain(name.into()))
	}

	/// Reset signal of the domain known here under `name`
	pub fn reset_signal(&self, name: &str) -> Result<Signal, ElabError> {
		let domain = self.domain(name).ok_or_else(|| ElabError::UnknownDomain(name.into()))?;
		domain.rst().cloned().ok_or_else(|| ElabError::ResetlessDomain(name.into()))
	}
}

impl std::fmt::Debug for Context {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Context")
			.field("path", &self.path_string())
			.field("visible", &self.is_visible())
			.finish()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	struct Outer;
	impl Element for Outer {}

	struct Inner;
	impl Element for Inner {}

	fn chain() -> (Elem<Outer>, Elem<Inner>, Context, Context) {
		let outer = Elem::builder().name("top").key(Key::new("outer")).build(|| Outer);
		let inner = Elem::builder().name("inner").build(|| Inner);
		let outer_ctx = Context::new(None, outer.as_ref(), DomainTable::new(), None);
		let inner_ctx = Context::new(Some(outer_ctx.clone()), inner.as_ref(), DomainTable::new(), None);
		(outer, inner, outer_ctx, inner_ctx)
	}

	#[test]
	fn test_path() {
		let (_outer, _inner, _, ctx) = chain();
		assert_eq!(ctx.path().collect::<Vec<_>>(), vec!["inner", "top"]);
		assert_eq!(ctx.path_string(), "top/inner");
	}

	#[test]
	fn test_find_skips_self() {
		let (_outer, _inner, outer_ctx, ctx) = chain();
		assert!(ctx.find::<Outer>().is_some());
		assert!(ctx.find::<Inner>().is_none());
		assert!(outer_ctx.find::<Outer>().is_none());
		assert!(ctx.find_by_key(&Key::new("outer")).is_some());
		assert!(ctx.find_by_key(&Key::new("missing")).is_none());
	}

	#[test]
	fn test_find_matches_exact_type() {
		let (_outer, inner, outer_ctx, _) = chain();
		let leaf = Elem::new(|| Inner);
		let ctx = Context::new(Some(outer_ctx), leaf.as_ref(), DomainTable::new(), None);
		assert!(ctx.find::<Inner>().is_none());

		let either = |elem: &ElementRef| elem.is::<Inner>() || elem.is::<Outer>();
		let found = ctx.find_where(either).unwrap();
		assert_eq!(found.name().as_deref(), Some("top"));
		assert!(!found.ptr_eq(inner.as_ref()));
	}

	#[test]
	fn test_invisible_ancestor() {
		let (_outer, inner, outer_ctx, _) = chain();
		let hidden = Context::new(Some(outer_ctx.invisible()), inner.as_ref(), DomainTable::new(), None);
		assert!(hidden.find::<Outer>().is_none());
		assert!(hidden.find_by_key(&Key::new("outer")).is_none());
		assert_eq!(hidden.path_string(), "top/inner");
	}

	#[test]
	fn test_invisible_shares_domains() {
		let (_outer, _inner, ctx, _) = chain();
		let hidden = ctx.invisible();
		ctx.declare_domain("sync", ClockDomain::new("_internal_top_sync"));
		assert!(hidden.domain("sync").is_some());
		assert_eq!(hidden.clock_signal("sync").unwrap().name(), "_internal_top_sync_clk");
	}

	#[test]
	fn test_signal_errors() {
		let (_outer, _inner, ctx, _) = chain();
		ctx.declare_domain("fast", ClockDomain::new("fast").reset_less());
		assert!(matches!(ctx.clock_signal("slow"), Err(ElabError::UnknownDomain(_))));
		assert!(matches!(ctx.reset_signal("fast"), Err(ElabError::ResetlessDomain(_))));
	}

	#[test]
	fn test_platform_downcast() {
		let outer = Elem::new(|| Outer);
		let platform: Platform = Rc::new(42u32);
		let ctx = Context::new(None, outer.as_ref(), DomainTable::new(), Some(platform));
		assert_eq!(ctx.platform_as::<u32>().as_deref(), Some(&42));
		assert!(ctx.platform_as::<String>().is_none());
	}
}
