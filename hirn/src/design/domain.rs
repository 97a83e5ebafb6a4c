use serde::Serialize;

use super::Signal;

/// Clock edge a domain is sensitive to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ClockEdge {
	Positive,
	Negative,
}

/// A named clock/reset scope
#[derive(Clone, Debug, Serialize)]
pub struct ClockDomain {
	name: String,
	clk: Signal,
	rst: Option<Signal>,
	clk_edge: ClockEdge,
	async_reset: bool,
	local: bool,
}

impl ClockDomain {
	/// Creates a new domain with a clock and a synchronous reset.
	/// The `sync` domain owns `clk`/`rst`, other domains prefix
	/// their signals with the domain name.
	pub fn new(name: &str) -> Self {
		let (clk_name, rst_name) = if name == "sync" {
			("clk".to_string(), "rst".to_string())
		} else {
			(format!("{}_clk", name), format!("{}_rst", name))
		};

		Self {
			name: name.into(),
			clk: Signal::new(&clk_name),
			rst: Some(Signal::new(&rst_name)),
			clk_edge: ClockEdge::Positive,
			async_reset: false,
			local: false,
		}
	}

	/// Removes the reset signal
	pub fn reset_less(mut self) -> Self {
		self.rst = None;
		self
	}

	pub fn async_reset(mut self) -> Self {
		self.async_reset = true;
		self
	}

	pub fn negedge(mut self) -> Self {
		self.clk_edge = ClockEdge::Negative;
		self
	}

	pub fn local(mut self) -> Self {
		self.local = true;
		self
	}

	/// Creates a domain under a new name with the same clocking properties
	/// and fresh signals
	pub fn derive(&self, name: &str) -> Self {
		let mut domain = Self::new(name);
		if self.rst.is_none() {
			domain = domain.reset_less();
		}
		domain.clk_edge = self.clk_edge;
		domain.async_reset = self.async_reset;
		domain
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn clk(&self) -> &Signal {
		&self.clk
	}

	pub fn rst(&self) -> Option<&Signal> {
		self.rst.as_ref()
	}

	pub fn clk_edge(&self) -> ClockEdge {
		self.clk_edge
	}

	pub fn is_async_reset(&self) -> bool {
		self.async_reset
	}

	pub fn is_reset_less(&self) -> bool {
		self.rst.is_none()
	}

	pub fn is_local(&self) -> bool {
		self.local
	}
}
