use std::cell::RefCell;
use std::rc::Rc;

use hdlelem::{
	clock_signal, elaborate, reset_signal, Context, DomainMapper, Elem, ElabError, Element, ElementModule, Phase,
};
use hirn::design::{ClockDomain, Expression, ModuleHandle, Signal};
use rstest::rstest;

#[derive(Default)]
struct Probes {
	a: Option<Signal>,
	c: Option<Signal>,
	e: Option<Signal>,
	h: Option<Signal>,
	clk_a: Option<Signal>,
	clk_b: Option<Signal>,
	clk_sync: Option<Signal>,
}

type Shared = Rc<RefCell<Probes>>;

struct A {
	probes: Shared,
}

impl Element for A {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		m.add_domain(ClockDomain::new("a"))?;
		m.add_domain(ClockDomain::new("b"))?;

		let (a, b, c, d) = (Signal::new("a"), Signal::new("b"), Signal::new("c"), Signal::new("d"));
		m.d("a", &a, &b)?;
		m.d("b", &c, &d)?;
		{
			let mut probes = self.probes.borrow_mut();
			probes.a = Some(a);
			probes.c = Some(c);
		}

		let probes = self.probes.clone();
		m.add_submodule(DomainMapper::sync("a").apply(Elem::new(move || B { probes })))?;
		Ok(())
	}
}

struct B {
	probes: Shared,
}

impl Element for B {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		let (e, f) = (Signal::new("e"), Signal::new("f"));
		m.sync(&e, &f)?;
		self.probes.borrow_mut().e = Some(e);

		let probes = self.probes.clone();
		m.add_submodule(Elem::new(move || C { probes }))?;
		Ok(())
	}
}

struct C {
	probes: Shared,
}

impl Element for C {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		let (h, i) = (Signal::new("h"), Signal::new("i"));
		m.add_domain(ClockDomain::new("a"))?;
		m.sync(&h, &i)?;

		let mut probes = self.probes.borrow_mut();
		probes.h = Some(h);
		probes.clk_a = Some(clock_signal("a")?);
		probes.clk_b = Some(clock_signal("b")?);
		probes.clk_sync = Some(clock_signal("sync")?);
		Ok(())
	}
}

fn driven_by(m: &ModuleHandle, domain: &str) -> Vec<Signal> {
	m.driven_by(Some(domain))
}

#[test]
fn test_clock_domains() {
	let probes = Shared::default();
	let shared = probes.clone();
	let top = Elem::new(move || A { probes: shared });
	let module = elaborate(&top).unwrap();
	let probes = probes.borrow();

	assert!(module.has_domain("_internal_top_a"));
	assert!(module.has_domain("_internal_top_b"));
	assert!(!module.has_domain("_internal_top_sync"));
	assert!(driven_by(&module, "_internal_top_a").contains(probes.a.as_ref().unwrap()));
	assert!(driven_by(&module, "_internal_top_b").contains(probes.c.as_ref().unwrap()));

	let b = module.submodule("B#0").unwrap();
	assert!(driven_by(&b, "_internal_top_a").contains(probes.e.as_ref().unwrap()));

	let c = b.submodule("C#0").unwrap();
	assert!(driven_by(&c, "_internal_top_a").contains(probes.h.as_ref().unwrap()));

	let top_b = module.domain("_internal_top_b").unwrap();
	let top_a = module.domain("_internal_top_a").unwrap();
	let local_a = c.domain("_internal_top/B#0/C#0_a").unwrap();
	assert_eq!(probes.clk_b.as_ref(), Some(top_b.clk()));
	assert_eq!(probes.clk_sync.as_ref(), Some(top_a.clk()));
	assert_eq!(probes.clk_a.as_ref(), Some(local_a.clk()));
}

/// Declares domain `a` and nests `depth` more of itself
struct Nested {
	depth: usize,
}

impl Element for Nested {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		m.add_domain(ClockDomain::new("a"))?;
		for _ in 0..self.depth {
			let depth = self.depth - 1;
			m.add_submodule(Elem::new(move || Nested { depth }))?;
		}
		Ok(())
	}
}

#[test]
fn test_sibling_domains_unique() {
	let top = Elem::new(|| Nested { depth: 2 });
	let module = elaborate(&top).unwrap();

	let first = module.submodule("Nested#0").unwrap();
	let second = module.submodule("Nested#1").unwrap();
	let first_name = first.domains()[0].name().to_string();
	let second_name = second.domains()[0].name().to_string();
	assert_eq!(first_name, "_internal_top/Nested#0_a");
	assert_eq!(second_name, "_internal_top/Nested#1_a");

	let nested = second.submodule("Nested#0").unwrap();
	assert_eq!(nested.domains()[0].name(), "_internal_top/Nested#1/Nested#0_a");
}

#[test]
fn test_duplicate_domain() {
	struct Twice {
		emitted: Rc<RefCell<bool>>,
	}

	impl Element for Twice {
		fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			m.add_domain(ClockDomain::new("a"))?;
			m.add_domain(ClockDomain::new("a").reset_less())?;
			*self.emitted.borrow_mut() = true;
			m.comb(&Signal::new("x"), Expression::new_one())?;
			Ok(())
		}
	}

	let emitted = Rc::new(RefCell::new(false));
	let flag = emitted.clone();
	let top = Elem::new(move || Twice { emitted: flag });
	let err = elaborate(&top).unwrap_err();

	assert!(matches!(
		err.root_cause(),
		ElabError::DomainNameConflict { name, path } if name == "a" && path == "top"
	));
	assert!(!*emitted.borrow());
	assert!(top.module().unwrap().statements().is_empty());
}

#[test]
fn test_set_domain_name_mismatch() {
	struct Mismatch;

	impl Element for Mismatch {
		fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			m.set_domain("fast", ClockDomain::new("slow"))?;
			Ok(())
		}
	}

	let err = elaborate(Elem::new(|| Mismatch)).unwrap_err();
	assert!(matches!(err.root_cause(), ElabError::DomainNameMismatch { .. }));
}

#[test]
fn test_default_sync_domain() {
	struct Empty;
	impl Element for Empty {}

	let top = Elem::new(|| Empty);
	let module = elaborate(&top).unwrap();
	let names: Vec<_> = module.domains().iter().map(|d| d.name().to_string()).collect();
	assert_eq!(names, vec!["_internal_top_sync"]);
	assert_eq!(
		top.context().unwrap().clock_signal("sync").unwrap().name(),
		"_internal_top_sync_clk"
	);
}

#[test]
fn test_no_default_sync_below_top() {
	struct Leaf;
	impl Element for Leaf {}

	struct Root;
	impl Element for Root {
		fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			m.add_domain(ClockDomain::new("fast"))?;
			m.add_submodule(Elem::new(|| Leaf))?;
			Ok(())
		}
	}

	let module = elaborate(Elem::new(|| Root)).unwrap();
	assert_eq!(module.domains().len(), 1);
	assert!(module.submodule("Leaf#0").unwrap().domains().is_empty());
}

/// Maps its child's `sync` onto `target`
struct Mapper {
	target: &'static str,
	child: Option<Elem<Mapper>>,
	own: Option<&'static str>,
	seen: Rc<RefCell<Vec<String>>>,
}

impl Element for Mapper {
	fn create(&mut self, m: &mut ElementModule, ctx: &Context) -> Result<(), ElabError> {
		if let Some(own) = self.own {
			m.add_domain(ClockDomain::new(own))?;
		}
		if let Some(child) = self.child.take() {
			m.add_submodule(DomainMapper::sync(self.target).apply(child))?;
		}
		self.seen.borrow_mut().push(ctx.clock_signal("sync")?.name().to_string());
		Ok(())
	}
}

#[test]
fn test_domain_map_one_level() {
	let seen = Rc::new(RefCell::new(Vec::new()));
	let leaf = Elem::new({
		let seen = seen.clone();
		move || Mapper {
			target: "sync",
			child: None,
			own: None,
			seen,
		}
	});
	let middle = Elem::new({
		let seen = seen.clone();
		move || Mapper {
			target: "fast",
			child: Some(leaf),
			own: Some("fast"),
			seen,
		}
	});
	let top = Elem::new({
		let seen = seen.clone();
		move || Mapper {
			target: "sync",
			child: Some(middle),
			own: Some("sync"),
			seen,
		}
	});
	elaborate(&top).unwrap();

	assert_eq!(
		*seen.borrow(),
		vec![
			"_internal_top_sync_clk",
			"_internal_top_sync_clk",
			"_internal_top/Mapper#0_fast_clk",
		]
	);
}

#[rstest]
#[case::unknown(Signal::new("x"), "missing")]
#[case::mapped_away(Signal::new("y"), "a")]
fn test_unknown_driver_domain(#[case] signal: Signal, #[case] domain: &'static str) {
	struct Driver {
		signal: Signal,
		domain: &'static str,
	}

	impl Element for Driver {
		fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			m.d(self.domain, &self.signal, Expression::new_one())?;
			Ok(())
		}
	}

	struct Parent {
		child: Option<Elem<Driver>>,
	}

	impl Element for Parent {
		fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			m.add_domain(ClockDomain::new("a"))?;
			if let Some(child) = self.child.take() {
				m.insert_submodule("driver", DomainMapper::sync("a").apply(child))?;
			}
			Ok(())
		}
	}

	let child = Elem::new(move || Driver { signal, domain });
	let err = elaborate(Elem::new(|| Parent { child: Some(child) })).unwrap_err();
	assert_eq!(err.path(), Some("top/driver"));
	assert!(matches!(
		err.root_cause(),
		ElabError::UnknownDriverDomain { domain: d, path, .. } if d == domain && path == "top/driver"
	));
}

#[rstest]
#[case::create(Phase::Create)]
#[case::finalize(Phase::Finalize)]
fn test_unterminated_control_flow(#[case] phase: Phase) {
	struct Open {
		phase: Phase,
	}

	impl Open {
		fn open(m: &mut ElementModule) -> Result<(), ElabError> {
			m.begin_if(Signal::new("cond"))?;
			m.comb(&Signal::new("x"), Expression::new_one())?;
			Ok(())
		}
	}

	impl Element for Open {
		fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			match self.phase {
				Phase::Create => Self::open(m),
				Phase::Finalize => Ok(()),
			}
		}

		fn finalize(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			match self.phase {
				Phase::Create => Ok(()),
				Phase::Finalize => Self::open(m),
			}
		}
	}

	let err = elaborate(Elem::new(move || Open { phase })).unwrap_err();
	assert!(matches!(
		err.root_cause(),
		ElabError::UnterminatedControlFlow { depth: 1, phase: p, .. } if *p == phase
	));
}

#[test]
fn test_signals_during_construction() {
	struct Eager;
	impl Element for Eager {}

	let result = Elem::try_new(|| {
		clock_signal("sync")?;
		Ok(Eager)
	});
	assert!(matches!(result, Err(ElabError::SignalAccessDuringConstruction)));

	let result = Elem::try_new(|| {
		reset_signal("sync")?;
		Ok(Eager)
	});
	assert!(matches!(result, Err(ElabError::SignalAccessDuringConstruction)));
}

#[test]
fn test_resetless_domain() {
	struct Resetless;

	impl Element for Resetless {
		fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			m.add_domain(ClockDomain::new("fast").reset_less())?;
			clock_signal("fast")?;
			reset_signal("fast")?;
			Ok(())
		}
	}

	let err = elaborate(Elem::new(|| Resetless)).unwrap_err();
	assert!(matches!(err.root_cause(), ElabError::ResetlessDomain(name) if name == "fast"));
}
