use std::sync::Arc;

use thiserror::Error;

use super::{ModuleId, SignalId};

#[derive(Clone, Debug)]
pub struct DriverConflictError {
	pub signal: SignalId,
	pub signal_name: String,
	pub first: Option<String>,
	pub second: Option<String>,
}

impl From<DriverConflictError> for DesignError {
	fn from(err: DriverConflictError) -> Self {
		Self::DriverConflict(Box::new(err))
	}
}

/// Represents an error that can occur during design construction.
/// Elaboration errors are not accounted for here.
#[derive(Clone, Debug, Error)]
pub enum DesignError {
	#[error("This object is not part of any HIRN Design.")]
	NotInDesign,

	#[error("Invalid module ID")]
	InvalidModuleId(ModuleId),

	#[error("Submodule named '{0}' already exists")]
	SubmoduleNameConflict(String),

	#[error("Module is already attached to a parent")]
	ModuleAlreadyAttached(ModuleId),

	#[error("Clock domain named '{0}' already exists")]
	DomainNameConflict(String),

	#[error("Signal is driven from more than one domain")]
	DriverConflict(Box<DriverConflictError>),

	#[error("No open `if` block")]
	NoOpenIfBlock,

	#[error("`elif` cannot follow `else`")]
	ElifAfterElse,

	#[error("`else` already present in this `if` block")]
	ElseAfterElse,

	#[error("Elaboration of '{name}' failed")]
	ElaborationFailed {
		name: String,
		#[source]
		source: Arc<dyn std::error::Error + Send + Sync>,
	},
}
