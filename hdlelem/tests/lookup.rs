use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use hdlelem::{elaborate, Context, Elem, ElabError, Element, ElementModule, Key};
use rstest::rstest;

/// Outcome of lookups made by a probe in each of its phases
#[derive(Debug, Default, PartialEq)]
struct Seen {
	create: Option<bool>,
	finalize: Option<bool>,
}

type Results = Rc<RefCell<BTreeMap<&'static str, Seen>>>;

struct Probe {
	label: &'static str,
	results: Results,
	lookup: fn(&Context) -> bool,
}

impl Probe {
	fn new(label: &'static str, results: &Results, lookup: fn(&Context) -> bool) -> Elem<Self> {
		let results = results.clone();
		Elem::new(move || Self { label, results, lookup })
	}
}

impl Element for Probe {
	fn create(&mut self, _m: &mut ElementModule, ctx: &Context) -> Result<(), ElabError> {
		let found = (self.lookup)(ctx);
		self.results.borrow_mut().entry(self.label).or_default().create = Some(found);
		Ok(())
	}

	fn finalize(&mut self, _m: &mut ElementModule, ctx: &Context) -> Result<(), ElabError> {
		let found = (self.lookup)(ctx);
		self.results.borrow_mut().entry(self.label).or_default().finalize = Some(found);
		Ok(())
	}
}

/// Adds one probe in `create` and another in `finalize`
struct Parent {
	early: Option<Elem<Probe>>,
	late: Option<Elem<Probe>>,
}

impl Element for Parent {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		if let Some(early) = self.early.take() {
			m.add_submodule(early)?;
		}
		Ok(())
	}

	fn finalize(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		if let Some(late) = self.late.take() {
			m.add_submodule(late)?;
		}
		Ok(())
	}
}

/// Wraps the parent so there is an ancestor above it
struct Grandparent {
	child: Option<Elem<Parent>>,
}

impl Element for Grandparent {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		if let Some(child) = self.child.take() {
			m.add_submodule(child)?;
		}
		Ok(())
	}
}

fn run(lookup: fn(&Context) -> bool) -> BTreeMap<&'static str, Seen> {
	let results = Results::default();
	let early = Probe::new("early", &results, lookup);
	let late = Probe::new("late", &results, lookup);
	let parent = Elem::builder().key(Key::new("parent")).build(|| Parent {
		early: Some(early),
		late: Some(late),
	});
	let top = Elem::builder()
		.key(Key::new("grandparent"))
		.build(|| Grandparent { child: Some(parent) });
	elaborate(&top).unwrap();
	results.take()
}

fn seen(create: bool, finalize: bool) -> Seen {
	Seen {
		create: Some(create),
		finalize: Some(finalize),
	}
}

#[rstest]
#[case::by_type(|ctx: &Context| ctx.find::<Parent>().is_some())]
#[case::by_key(|ctx: &Context| ctx.find_by_key(&Key::new("parent")).is_some())]
#[case::by_predicate(|ctx: &Context| ctx.find_where(|e| e.is::<Parent>()).is_some())]
fn test_parent_invisible_after_finalize(#[case] lookup: fn(&Context) -> bool) {
	let results = run(lookup);
	assert_eq!(results["early"], seen(true, true));
	assert_eq!(results["late"], seen(false, false));
}

#[rstest]
#[case::by_type(|ctx: &Context| ctx.find::<Grandparent>().is_some())]
#[case::by_key(|ctx: &Context| ctx.find_by_key(&Key::new("grandparent")).is_some())]
fn test_ancestors_above_stay_visible(#[case] lookup: fn(&Context) -> bool) {
	let results = run(lookup);
	assert_eq!(results["early"], seen(true, true));
	assert_eq!(results["late"], seen(true, true));
}

#[test]
fn test_missing_ancestor_is_not_an_error() {
	struct Unrelated;
	impl Element for Unrelated {}

	let results = run(|ctx| ctx.find::<Unrelated>().is_some() || ctx.find_by_key(&Key::new(1i64)).is_some());
	assert_eq!(results["early"], seen(false, false));
	assert_eq!(results["late"], seen(false, false));
}

#[test]
fn test_find_never_returns_self() {
	let results = run(|ctx| ctx.find::<Probe>().is_some());
	assert_eq!(results["early"], seen(false, false));
}

#[test]
fn test_global_keys_distinguish_instances() {
	struct Tagged {
		child: Option<Elem<Tagged>>,
		inner_key: Key,
		found: Rc<RefCell<Option<bool>>>,
	}

	impl Element for Tagged {
		fn create(&mut self, m: &mut ElementModule, ctx: &Context) -> Result<(), ElabError> {
			match self.child.take() {
				Some(child) => {
					m.add_submodule(child)?;
				},
				None => *self.found.borrow_mut() = Some(ctx.find_by_key(&self.inner_key).is_some()),
			}
			Ok(())
		}
	}

	let found = Rc::new(RefCell::new(None));
	let unrelated = Key::global();
	let outer_key = Key::global();
	let leaf = Elem::new(|| Tagged {
		child: None,
		inner_key: unrelated,
		found: found.clone(),
	});
	let top = Elem::builder().key(outer_key).build(|| Tagged {
		child: Some(leaf),
		inner_key: Key::new("unused"),
		found: Rc::new(RefCell::new(None)),
	});
	elaborate(&top).unwrap();
	assert_eq!(*found.borrow(), Some(false));
}
