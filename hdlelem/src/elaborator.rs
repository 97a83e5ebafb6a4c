use hirn::design::{ClockDomain, Design, ModuleHandle, Platform};
use log::{debug, info};

use crate::context::{Context, DomainTable};
use crate::domains;
use crate::element::ElementRef;
use crate::module::ElementModule;
use crate::submodules::Submodule;
use crate::tracker;
use crate::{ElabError, Phase};

/// Turns an element tree into a backend module tree
pub struct TreeElaborator {
	platform: Option<Platform>,
	top_name: String,

	/// Drive domains declared by the top element from same-named outer domains
	bridge_top_domains: bool,
}

impl Default for TreeElaborator {
	fn default() -> Self {
		Self {
			platform: None,
			top_name: "top".into(),
			bridge_top_domains: false,
		}
	}
}

impl TreeElaborator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn platform(mut self, platform: Platform) -> Self {
		self.platform = Some(platform);
		self
	}

	/// Name given to the root element if it has none
	pub fn top_name(mut self, name: &str) -> Self {
		self.top_name = name.into();
		self
	}

	pub fn bridge_top_domains(mut self, bridge: bool) -> Self {
		self.bridge_top_domains = bridge;
		self
	}

	/// Elaborates the tree rooted at `root` into a new design.
	/// Returns the module of the root element.
	pub fn elaborate(&self, root: impl AsRef<ElementRef>) -> Result<ModuleHandle, ElabError> {
		let root = root.as_ref();
		if root.is_elaborated() {
			return Err(ElabError::ElementAlreadyElaborated(root.label()));
		}

		root.set_name_if_unset(&self.top_name);
		info!("Elaborating element tree '{}'", root.label());

		let mut design = Design::new();
		let module = self.walk(&mut design, root, true, DomainTable::new(), None)?;

		info!("Elaborated '{}' into {} module(s)", root.label(), design.module_count());
		Ok(module)
	}

	fn walk(
		&self,
		design: &mut Design,
		element: &ElementRef,
		top: bool,
		domains: DomainTable,
		parent: Option<&Context>,
	) -> Result<ModuleHandle, ElabError> {
		let context = Context::new(parent.cloned(), element, domains, self.platform.clone());
		let path = context.path_string();
		let _guard = tracker::enter_context(context.clone());

		self.visit(design, element, top, &context, &path)
			.map_err(|err| err.in_element(&path))
	}

	fn visit(
		&self,
		design: &mut Design,
		element: &ElementRef,
		top: bool,
		context: &Context,
		path: &str,
	) -> Result<ModuleHandle, ElabError> {
		debug!("Creating '{}'", path);
		let handle = design.new_module(&element.label())?;
		element.bind(context.clone(), handle.clone());

		let mut m = ElementModule::new(handle, context.clone(), top && self.bridge_top_domains);
		element.run_create(&mut m, context)?;
		check_control_flow(&m, path, Phase::Create)?;

		if top && context.domains().is_empty() {
			debug!("No domains declared, adding default 'sync'");
			m.add_domain(ClockDomain::new("sync"))?;
		}

		for (name, submodule) in m.take_pending() {
			self.attach(design, &mut m, element, &name, submodule, context)?;
		}

		debug!("Finalizing '{}'", path);
		element.run_finalize(&mut m, context)?;
		check_control_flow(&m, path, Phase::Finalize)?;

		let table = context.domains();
		m.map_driver_domains(|signal, domain| {
			table
				.get(domain)
				.map(|resolved| resolved.name().to_string())
				.ok_or_else(|| ElabError::UnknownDriverDomain {
					signal: signal.name().into(),
					domain: domain.into(),
					path: path.into(),
				})
		})?;

		let hidden = context.invisible();
		for (name, submodule) in m.take_pending() {
			self.attach(design, &mut m, element, &name, submodule, &hidden)?;
		}

		Ok(m.into_handle())
	}

	fn attach(
		&self,
		design: &mut Design,
		m: &mut ElementModule,
		parent: &ElementRef,
		name: &str,
		submodule: Submodule,
		context: &Context,
	) -> Result<(), ElabError> {
		match submodule {
			Submodule::Element(child) => {
				if child.is_elaborated() {
					return Err(ElabError::ElementAlreadyElaborated(child.label()));
				}

				child.set_name_if_unset(name);
				let domains = domains::domains_for_submodule(&context.domains(), &child.domain_map());
				let handle = self.walk(design, &child, false, domains, Some(context))?;
				m.attach_module(name, &handle)?;
				parent.add_child(child);
			},

			Submodule::Raw(raw) => {
				debug!("Attaching backend module '{}' to '{}'", name, context.path_string());
				let mut fragment = raw.elaborate(self.platform.as_ref())?;
				fragment.rename_domains(&domains::physical_renames(&context.domains()));
				m.attach_fragment(name, fragment)?;
			},
		}

		Ok(())
	}
}

fn check_control_flow(m: &ElementModule, path: &str, phase: Phase) -> Result<(), ElabError> {
	match m.depth() {
		0 => Ok(()),
		depth => Err(ElabError::UnterminatedControlFlow {
			path: path.into(),
			depth,
			phase,
		}),
	}
}

/// Elaborates the tree rooted at `root` with default settings
pub fn elaborate(root: impl AsRef<ElementRef>) -> Result<ModuleHandle, ElabError> {
	TreeElaborator::new().elaborate(root)
}
