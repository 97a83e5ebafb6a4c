use std::collections::BTreeMap;

use hirn::design::{ClockDomain, Expression, ModuleHandle, Signal};
use log::{debug, warn};

use crate::element::ElementRef;
use crate::tracker;
use crate::{Context, DomainTable, ElabError};

/// Name of a domain declared as `name` by the element at `path`
pub fn physical_name(path: &str, name: &str) -> String {
	format!("_internal_{}_{}", path, name)
}

/// Declares `domain` as `logical` in the element owning `context`.
///
/// The domain is recreated under its physical name. With `bridge` set, its
/// clock and reset are driven from the domain named `logical` of whatever
/// design the module ends up in.
pub(crate) fn declare_domain(
	module: &mut ModuleHandle,
	context: &Context,
	logical: &str,
	domain: ClockDomain,
	bridge: bool,
) -> Result<ClockDomain, ElabError> {
	let path = context.path_string();
	let physical = physical_name(&path, logical);

	if module.has_domain(&physical) {
		return Err(ElabError::DomainNameConflict {
			name: logical.into(),
			path,
		});
	}

	if domain.is_local() {
		warn!("Ignoring `local` flag of domain '{}' in '{}'", logical, path);
	}

	let scoped = domain.derive(&physical);
	module.add_domain(scoped.clone())?;
	debug!("Declared domain '{}' as '{}'", logical, physical);

	if bridge {
		module.comb(scoped.clk(), Expression::clock(logical))?;
		if let Some(rst) = scoped.rst() {
			module.comb(rst, Expression::reset(logical))?;
		}
	}

	context.declare_domain(logical, scoped.clone());
	Ok(scoped)
}

/// Domain table handed to a child with the given domain map.
///
/// Parent domains pass through under their own names, unless the child
/// redirects one of its names onto them.
pub(crate) fn domains_for_submodule(parent: &DomainTable, domain_map: &BTreeMap<String, String>) -> DomainTable {
	let mut table: DomainTable = parent
		.iter()
		.filter(|(name, _)| !domain_map.values().any(|target| target == *name))
		.map(|(name, domain)| (name.clone(), domain.clone()))
		.collect();

	for (child_name, parent_name) in domain_map {
		match parent.get(parent_name) {
			Some(domain) => {
				debug!("Mapping child domain '{}' onto '{}'", child_name, parent_name);
				table.insert(child_name.clone(), domain.clone());
			},
			None => warn!(
				"Domain map entry '{}' -> '{}' refers to an unknown domain",
				child_name, parent_name
			),
		}
	}

	table
}

/// Logical -> physical renames for raw backend children
pub(crate) fn physical_renames(table: &DomainTable) -> BTreeMap<String, String> {
	table
		.iter()
		.map(|(name, domain)| (name.clone(), domain.name().to_string()))
		.collect()
}

/// Redirects domains of an element onto domains of its parent
#[derive(Clone, Debug, Default)]
pub struct DomainMapper {
	map: BTreeMap<String, String>,
}

impl DomainMapper {
	/// Each entry maps a domain name used by the element to a parent domain
	pub fn new<K: Into<String>, V: Into<String>>(map: impl IntoIterator<Item = (K, V)>) -> Self {
		Self {
			map: map.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}

	/// Maps the element's `sync` domain onto `name`
	pub fn sync(name: &str) -> Self {
		Self::new([("sync", name)])
	}

	pub fn map(mut self, from: &str, to: &str) -> Self {
		self.map.insert(from.into(), to.into());
		self
	}

	/// Merges the mapping into the element's domain map
	pub fn apply<E: AsRef<ElementRef>>(&self, elem: E) -> E {
		elem.as_ref().update_domain_map(&self.map);
		elem
	}
}

impl From<&str> for DomainMapper {
	fn from(name: &str) -> Self {
		Self::sync(name)
	}
}

/// Clock signal of the domain `name` of the element being elaborated
pub fn clock_signal(name: &str) -> Result<Signal, ElabError> {
	active_context()?.clock_signal(name)
}

/// Reset signal of the domain `name` of the element being elaborated
pub fn reset_signal(name: &str) -> Result<Signal, ElabError> {
	active_context()?.reset_signal(name)
}

fn active_context() -> Result<Context, ElabError> {
	if tracker::is_constructing() {
		return Err(ElabError::SignalAccessDuringConstruction);
	}
	tracker::current_context().ok_or(ElabError::NoActiveContext)
}
