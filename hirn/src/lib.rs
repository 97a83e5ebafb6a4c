pub mod codegen;
pub mod design;

pub use codegen::{Codegen, CodegenError, TreeCodegen};
pub use design::{
	ClockDomain, Design, DesignError, DomainRenamer, Elaboratable, Expression, Fragment, ModuleHandle, ModuleId,
	Platform, Signal, SignalId,
};
