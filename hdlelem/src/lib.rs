//! Elaboration of element trees into `hirn` designs.
//!
//! Elements are user-defined nodes with a `create` and a `finalize` phase.
//! The [`TreeElaborator`] walks the tree, gives every element a [`Context`]
//! for ancestor lookups and a private slice of the clock domain space, and
//! builds one backend module per element.

mod context;
mod domains;
mod elab_error;
mod elaborator;
mod element;
mod embed;
mod key;
mod module;
mod submodules;
mod tracker;

pub use context::{Context, DomainTable};
pub use domains::{clock_signal, physical_name, reset_signal, DomainMapper};
pub use elab_error::{ElabError, Phase};
pub use elaborator::{elaborate, TreeElaborator};
pub use element::{add_class_context_hook, ClassContextHook, ContextHook, Elem, Element, ElementBuilder, ElementRef};
pub use embed::ElementFragment;
pub use key::{Key, KeyValue};
pub use module::ElementModule;
pub use submodules::{Submodule, Submodules};
pub use tracker::{current_context, is_constructing, with_context};
