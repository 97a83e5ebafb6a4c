//! Demonstration element trees selectable from the command line

use hdlelem::{
	clock_signal, Context, DomainMapper, Elem, ElabError, Element, ElementModule, ElementRef, Key, Submodule,
};
use hirn::design::{ClockDomain, Expression, Signal};
use log::debug;

/// Collects probe signals and records each of them in a shift register
pub struct Ila {
	child: Option<Submodule>,
	probes: Vec<Signal>,
}

impl Ila {
	pub fn new(child: impl Into<Submodule>) -> Self {
		Self {
			child: Some(child.into()),
			probes: vec![],
		}
	}

	pub fn add_probe(&mut self, signal: Signal) {
		debug!("Probing signal '{}'", signal.name());
		self.probes.push(signal);
	}

	/// Adds `signal` to the nearest `Ila` above the element being elaborated
	pub fn probe(signal: Signal) -> Result<(), ElabError> {
		hdlelem::with_context(move |ctx| {
			let ila = ctx
				.find::<Ila>()
				.ok_or_else(|| ElabError::Custom(format!("No Ila above '{}'", ctx.path_string())))?;
			ila.try_borrow_mut()?.add_probe(signal);
			Ok(())
		})
	}
}

impl Element for Ila {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		if let Some(child) = self.child.take() {
			m.add_submodule(child)?;
		}
		Ok(())
	}

	fn finalize(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		for probe in &self.probes {
			let storage = Signal::with_width(&format!("{}_storage", probe.name()), 10);
			m.sync(&storage, Expression::concat(vec![probe.expr(), storage.expr()]))?;
		}
		Ok(())
	}
}

/// Probes one signal through the nearest `Ila` and one through the `Ila` tagged with `ila_key`
pub struct Test {
	ila_key: Key,
}

impl Element for Test {
	fn create(&mut self, m: &mut ElementModule, ctx: &Context) -> Result<(), ElabError> {
		let a = Signal::new("a");
		let b = Signal::new("b");

		Ila::probe(a.clone())?;
		let outer = ctx
			.find_by_key(&self.ila_key)
			.and_then(|elem| elem.downcast::<Ila>())
			.ok_or_else(|| ElabError::Custom(format!("No Ila with key {}", self.ila_key)))?;
		outer.try_borrow_mut()?.add_probe(b.clone());

		m.sync(&a, &b)?;
		Ok(())
	}

	fn finalize(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		let c = Signal::with_width("c", 10);
		m.sync(&c, c.expr() + Expression::from(1u64))?;
		Ok(())
	}
}

/// Two nested probe collectors around a `Test`
pub fn ila() -> ElementRef {
	let ila_key = Key::global();
	let test = Elem::new({
		let ila_key = ila_key.clone();
		move || Test { ila_key }
	});
	let inner = Elem::new(|| Ila::new(test));
	Elem::builder().key(ila_key).build(|| Ila::new(inner)).into()
}

/// Declares domains `a` and `b` and maps its child's `sync` onto `a`
pub struct Domains;

impl Element for Domains {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		m.add_domain(ClockDomain::new("a"))?;
		m.add_domain(ClockDomain::new("b").reset_less())?;

		let (a, b, c, d) = (Signal::new("a"), Signal::new("b"), Signal::new("c"), Signal::new("d"));
		m.d("a", &a, &b)?;
		m.d("b", &c, &d)?;

		m.add_submodule(DomainMapper::sync("a").apply(Elem::new(|| Mapped)))?;
		Ok(())
	}
}

/// Runs in its parent's `a` domain under the name `sync`
pub struct Mapped;

impl Element for Mapped {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		let (e, f) = (Signal::new("e"), Signal::new("f"));
		m.sync(&e, &f)?;
		m.add_submodule(Elem::new(|| Local))?;
		Ok(())
	}
}

/// Declares its own `a` next to the inherited domains
pub struct Local;

impl Element for Local {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		m.add_domain(ClockDomain::new("a"))?;

		let (h, i) = (Signal::new("h"), Signal::new("i"));
		m.sync(&h, &i)?;

		let q = Signal::new("q");
		m.d("a", &q, &i)?;
		m.comb(&Signal::new("b_clk"), clock_signal("b")?)?;
		Ok(())
	}
}

pub fn domains() -> ElementRef {
	Elem::new(|| Domains).into()
}

/// Builds the demonstration design with the given name
pub fn build(name: &str) -> Option<ElementRef> {
	match name {
		"ila" => Some(ila()),
		"domains" => Some(domains()),
		_ => None,
	}
}
