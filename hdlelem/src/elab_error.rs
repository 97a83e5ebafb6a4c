use derive_more::Display;
use hirn::DesignError;
use miette::Diagnostic;
use thiserror::Error;

/// Element lifecycle phase run by the elaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Phase {
	#[display(fmt = "create")]
	Create,

	#[display(fmt = "finalize")]
	Finalize,
}

/// Represents an error which aborts elaboration of the whole element tree
#[derive(Clone, Debug, Error, Diagnostic)]
pub enum ElabError {
	#[error(transparent)]
	#[diagnostic(code(hdlelem::design))]
	Design(#[from] DesignError),

	#[error("Duplicate submodule with name '{0}'")]
	#[diagnostic(code(hdlelem::duplicate_submodule), help("Each submodule of an element needs a unique name."))]
	DuplicateSubmodule(String),

	#[error("Submodule name '{slot}' and element name '{element}' have to agree")]
	#[diagnostic(
		code(hdlelem::submodule_name_mismatch),
		help("Either leave the element unnamed or add it under its own name.")
	)]
	SubmoduleNameMismatch { slot: String, element: String },

	#[error("Clock domain named '{name}' already exists in '{path}'")]
	#[diagnostic(code(hdlelem::domain_name_conflict))]
	DomainNameConflict { name: String, path: String },

	#[error("Clock domain name '{expected}' must match the name of the added domain '{actual}'")]
	#[diagnostic(code(hdlelem::domain_name_mismatch))]
	DomainNameMismatch { expected: String, actual: String },

	#[error("Signal '{signal}' driven by unknown domain '{domain}' in module '{path}'")]
	#[diagnostic(
		code(hdlelem::unknown_driver_domain),
		help("Declare the domain in this element or in one of its ancestors.")
	)]
	UnknownDriverDomain { signal: String, domain: String, path: String },

	#[error("Domain with name '{0}' not found")]
	#[diagnostic(code(hdlelem::unknown_domain))]
	UnknownDomain(String),

	#[error("Trying to get reset signal of resetless domain '{0}'")]
	#[diagnostic(code(hdlelem::resetless_domain))]
	ResetlessDomain(String),

	#[error("Element '{path}' left {depth} control flow block(s) open after {phase}")]
	#[diagnostic(code(hdlelem::unterminated_control_flow), help("Every `begin_if` needs a matching `end_if`."))]
	UnterminatedControlFlow { path: String, depth: usize, phase: Phase },

	#[error("Clock and reset signals cannot be used while an element is being constructed")]
	#[diagnostic(
		code(hdlelem::signal_during_construction),
		help("Move the signal access into `create` or register it with `with_context`.")
	)]
	SignalAccessDuringConstruction,

	#[error("No elaboration context is active")]
	#[diagnostic(code(hdlelem::no_active_context))]
	NoActiveContext,

	#[error("Element '{0}' has already been elaborated")]
	#[diagnostic(code(hdlelem::already_elaborated), help("An element can only be placed in one tree, once."))]
	ElementAlreadyElaborated(String),

	#[error("Element '{0}' has not been elaborated yet")]
	#[diagnostic(code(hdlelem::not_elaborated), help("Pass the root element to `elaborate` first."))]
	NotElaborated(String),

	#[error("Element '{0}' is already borrowed")]
	#[diagnostic(code(hdlelem::element_busy))]
	ElementBusy(String),

	#[error("{0}")]
	#[diagnostic(code(hdlelem::custom))]
	Custom(String),

	#[error("Elaboration of element '{path}' failed")]
	#[diagnostic(code(hdlelem::in_element))]
	InElement {
		path: String,
		#[source]
		source: Box<ElabError>,
	},
}

impl ElabError {
	/// Attaches the path of the element in which the error occurred.
	/// Errors which already carry a path are left as they are, so the
	/// innermost element is reported.
	pub fn in_element(self, path: &str) -> Self {
		match self {
			err @ ElabError::InElement { .. } => err,
			err => ElabError::InElement {
				path: path.into(),
				source: Box::new(err),
			},
		}
	}

	/// Strips the element path information
	pub fn root_cause(&self) -> &ElabError {
		match self {
			ElabError::InElement { source, .. } => source.root_cause(),
			err => err,
		}
	}

	/// Path of the element where the error occurred, if known
	pub fn path(&self) -> Option<&str> {
		match self {
			ElabError::InElement { path, .. } => Some(path),
			_ => None,
		}
	}
}
