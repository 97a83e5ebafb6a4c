use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::debug;
use serde::Serialize;

use super::design_error::DriverConflictError;
use super::scope::OpenBlocks;
use super::{ClockDomain, DesignError, Expression, Signal, Statement};

/// Records which domain drives a signal (`None` for combinational logic)
#[derive(Clone, Debug, Serialize)]
pub struct Driver {
	pub signal: Signal,
	pub domain: Option<String>,
}

/// Module body detached from any design.
///
/// Fragments are what backend-native constructs elaborate into. They can be
/// renamed and attached to a design module, which turns the whole fragment
/// tree into module nodes.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Fragment {
	domains: Vec<ClockDomain>,
	statements: Vec<Statement>,
	drivers: Vec<Driver>,
	subfragments: Vec<(String, Fragment)>,

	#[serde(skip)]
	blocks: OpenBlocks,
}

impl Fragment {
	pub fn new() -> Self {
		Self::default()
	}

	/// Declares a clock domain in this fragment
	pub fn add_domain(&mut self, domain: ClockDomain) -> Result<(), DesignError> {
		if self.has_domain(domain.name()) {
			return Err(DesignError::DomainNameConflict(domain.name().into()));
		}
		self.domains.push(domain);
		Ok(())
	}

	pub fn has_domain(&self, name: &str) -> bool {
		self.domain(name).is_some()
	}

	pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
		self.domains.iter().find(|d| d.name() == name)
	}

	pub fn domains(&self) -> &[ClockDomain] {
		&self.domains
	}

	pub fn statements(&self) -> &[Statement] {
		&self.statements
	}

	pub fn drivers(&self) -> &[Driver] {
		&self.drivers
	}

	/// Set of domains driving any signal in this fragment (without subfragments)
	pub fn driver_domains(&self) -> BTreeSet<Option<String>> {
		self.drivers.iter().map(|d| d.domain.clone()).collect()
	}

	/// Signals driven by the given domain
	pub fn driven_by(&self, domain: Option<&str>) -> Vec<&Signal> {
		self.drivers
			.iter()
			.filter(|d| d.domain.as_deref() == domain)
			.map(|d| &d.signal)
			.collect()
	}

	pub fn subfragments(&self) -> &[(String, Fragment)] {
		&self.subfragments
	}

	pub(crate) fn take_subfragments(&mut self) -> Vec<(String, Fragment)> {
		std::mem::take(&mut self.subfragments)
	}

	pub fn add_subfragment(&mut self, name: &str, fragment: Fragment) -> Result<(), DesignError> {
		if self.subfragments.iter().any(|(n, _)| n == name) {
			return Err(DesignError::SubmoduleNameConflict(name.into()));
		}
		self.subfragments.push((name.into(), fragment));
		Ok(())
	}

	/// Adds a combinational assignment
	pub fn comb(&mut self, lhs: &Signal, rhs: impl Into<Expression>) -> Result<(), DesignError> {
		self.assign(None, lhs, rhs.into())
	}

	/// Adds an assignment in the `sync` domain
	pub fn sync(&mut self, lhs: &Signal, rhs: impl Into<Expression>) -> Result<(), DesignError> {
		self.assign(Some("sync"), lhs, rhs.into())
	}

	/// Adds an assignment in the given domain
	pub fn d(&mut self, domain: &str, lhs: &Signal, rhs: impl Into<Expression>) -> Result<(), DesignError> {
		self.assign(Some(domain), lhs, rhs.into())
	}

	/// Adds an assignment and records its driver.
	/// A signal may only be driven from one domain.
	pub fn assign(&mut self, domain: Option<&str>, lhs: &Signal, rhs: Expression) -> Result<(), DesignError> {
		match self.drivers.iter().find(|d| d.signal.id() == lhs.id()) {
			Some(driver) if driver.domain.as_deref() != domain => {
				return Err(DriverConflictError {
					signal: lhs.id(),
					signal_name: lhs.name().into(),
					first: driver.domain.clone(),
					second: domain.map(String::from),
				}
				.into());
			},
			Some(_) => {},
			None => self.drivers.push(Driver {
				signal: lhs.clone(),
				domain: domain.map(String::from),
			}),
		}

		self.blocks.push(&mut self.statements, Statement::assign(lhs, rhs));
		Ok(())
	}

	pub fn begin_if(&mut self, condition: impl Into<Expression>) -> Result<(), DesignError> {
		self.blocks.begin_if(condition.into());
		Ok(())
	}

	pub fn begin_elif(&mut self, condition: impl Into<Expression>) -> Result<(), DesignError> {
		self.blocks.begin_elif(condition.into())
	}

	pub fn begin_else(&mut self) -> Result<(), DesignError> {
		self.blocks.begin_else()
	}

	pub fn end_if(&mut self) -> Result<(), DesignError> {
		self.blocks.end_if(&mut self.statements)
	}

	/// Number of control flow blocks left open
	pub fn depth(&self) -> usize {
		self.blocks.depth()
	}

	/// Rewrites every driver domain name through `f`
	pub fn map_driver_domains<E>(&mut self, mut f: impl FnMut(&Signal, &str) -> Result<String, E>) -> Result<(), E> {
		for driver in &mut self.drivers {
			if let Some(name) = &driver.domain {
				driver.domain = Some(f(&driver.signal, name)?);
			}
		}
		Ok(())
	}

	/// Renames domain references (drivers, clock and reset expressions)
	/// in this fragment and all subfragments. Domains declared by the
	/// fragment itself, or by any fragment enclosing a subfragment, are
	/// left untouched.
	pub fn rename_domains(&mut self, map: &BTreeMap<String, String>) {
		self.rename_domains_shadowed(map, &HashSet::new());
	}

	fn rename_domains_shadowed(&mut self, map: &BTreeMap<String, String>, shadowed: &HashSet<String>) {
		let mut shadowed = shadowed.clone();
		shadowed.extend(self.domains.iter().map(|d| d.name().to_string()));

		let rename = |name: &str| -> Option<String> {
			if shadowed.contains(name) {
				return None;
			}
			map.get(name).cloned()
		};

		for driver in &mut self.drivers {
			if let Some(new_name) = driver.domain.as_deref().and_then(&rename) {
				debug!("Renaming driver domain of '{}' to '{}'", driver.signal.name(), new_name);
				driver.domain = Some(new_name);
			}
		}

		for stmt in &mut self.statements {
			stmt.rename_domains(&rename);
		}

		for (_, sub) in &mut self.subfragments {
			sub.rename_domains_shadowed(map, &shadowed);
		}
	}
}
