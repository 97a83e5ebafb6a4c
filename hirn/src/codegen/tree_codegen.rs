use std::fmt;

use super::{Codegen, CodegenError};
use crate::design::utils::escape_name;
use crate::design::{ClockEdge, ModuleHandle};
use crate::{Design, ModuleId};

/// Emits a module tree as indented text.
/// Output depends only on names and structure, never on signal IDs.
#[derive(Clone)]
pub struct TreeCodegen<'a> {
	design: &'a Design,
	indent: &'static str,
}

impl<'a> TreeCodegen<'a> {
	pub fn new(design: &'a Design) -> Self {
		Self { design, indent: "\t" }
	}

	fn emit_node(&self, w: &mut dyn fmt::Write, m: &ModuleHandle, instance: &str, level: usize) -> Result<(), CodegenError> {
		let pad = self.indent.repeat(level);
		let inner = self.indent.repeat(level + 1);

		writeln!(w, "{}module {} {{", pad, escape_name(instance))?;

		for domain in m.domains() {
			let edge = match domain.clk_edge() {
				ClockEdge::Positive => "posedge",
				ClockEdge::Negative => "negedge",
			};
			write!(w, "{}domain {} {} {}", inner, escape_name(domain.name()), edge, escape_name(domain.clk().name()))?;
			match domain.rst() {
				Some(rst) if domain.is_async_reset() => write!(w, " async_reset {}", escape_name(rst.name()))?,
				Some(rst) => write!(w, " reset {}", escape_name(rst.name()))?,
				None => write!(w, " reset_less")?,
			}
			writeln!(w)?;
		}

		for stmt in m.statements() {
			writeln!(w, "{}{}", inner, stmt)?;
		}

		for driver in m.drivers() {
			let domain = match &driver.domain {
				Some(name) => escape_name(name),
				None => "comb".into(),
			};
			writeln!(w, "{}drive {} from {}", inner, escape_name(driver.signal.name()), domain)?;
		}

		for (name, child) in m.submodules() {
			self.emit_node(w, &child, &name, level + 1)?;
		}

		writeln!(w, "{}}}", pad)?;
		Ok(())
	}
}

impl<'a> Codegen for TreeCodegen<'a> {
	fn emit_module(&mut self, w: &mut dyn fmt::Write, module: ModuleId) -> Result<(), CodegenError> {
		let m = self
			.design
			.get_module_handle(module)
			.ok_or(CodegenError::InvalidModuleId(module))?;
		self.emit_node(w, &m, &m.name(), 0)
	}
}
