use std::sync::Arc;

use hirn::design::{DesignError, Elaboratable, Fragment, Platform};
use log::warn;

use crate::element::ElementRef;
use crate::{ElabError, TreeElaborator};

/// Lets an element tree stand in for a backend module.
///
/// The tree is elaborated on its own with the element's type name as the top
/// name. Domains it declares at the top are driven from the domains of the
/// same name in the surrounding design.
pub struct ElementFragment {
	element: ElementRef,
}

impl ElementFragment {
	pub fn new(element: impl Into<ElementRef>) -> Self {
		Self {
			element: element.into(),
		}
	}

	fn elaborate_tree(&self, platform: Option<&Platform>) -> Result<Fragment, ElabError> {
		let mut elaborator = TreeElaborator::new()
			.top_name(self.element.type_name())
			.bridge_top_domains(true);
		if let Some(platform) = platform {
			elaborator = elaborator.platform(platform.clone());
		}

		let module = elaborator.elaborate(&self.element)?;
		Ok(module.to_fragment()?)
	}
}

impl Elaboratable for ElementFragment {
	fn elaborate(&self, platform: Option<&Platform>) -> Result<Fragment, DesignError> {
		warn!(
			"Implicitly converting element '{}' into a backend module",
			self.element.type_name()
		);

		self.elaborate_tree(platform)
			.map_err(|err| DesignError::ElaborationFailed {
				name: self.element.label(),
				source: Arc::new(err),
			})
	}

	fn type_name(&self) -> &'static str {
		self.element.type_name()
	}
}
