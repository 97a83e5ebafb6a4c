//! Thread-local record of what is currently being elaborated.
//!
//! `current_context` is the context of the element whose phase is running,
//! `current_element` is set only while an element constructor runs. Both are
//! managed with guards, so the previous value comes back on every exit path.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::context::Context;
use crate::element::ElementBase;
use crate::ElabError;

#[derive(Default)]
struct Tracker {
	current_context: Option<Context>,
	current_element: Option<Rc<RefCell<ElementBase>>>,
}

thread_local! {
	static TRACKER: RefCell<Tracker> = RefCell::new(Tracker::default());
}

/// Restores the previous context when dropped
pub(crate) struct ContextGuard {
	previous: Option<Context>,
}

impl Drop for ContextGuard {
	fn drop(&mut self) {
		let previous = self.previous.take();
		TRACKER.with(|t| t.borrow_mut().current_context = previous);
	}
}

/// Restores the previous element under construction when dropped
pub(crate) struct ConstructionGuard {
	previous: Option<Rc<RefCell<ElementBase>>>,
}

impl Drop for ConstructionGuard {
	fn drop(&mut self) {
		let previous = self.previous.take();
		TRACKER.with(|t| t.borrow_mut().current_element = previous);
	}
}

/// Makes `context` current until the guard is dropped
pub(crate) fn enter_context(context: Context) -> ContextGuard {
	let previous = TRACKER.with(|t| t.borrow_mut().current_context.replace(context));
	ContextGuard { previous }
}

/// Marks `base` as the element under construction until the guard is dropped
pub(crate) fn enter_construction(base: Rc<RefCell<ElementBase>>) -> ConstructionGuard {
	let previous = TRACKER.with(|t| t.borrow_mut().current_element.replace(base));
	ConstructionGuard { previous }
}

/// Context of the element whose phase is currently running
pub fn current_context() -> Option<Context> {
	TRACKER.with(|t| t.borrow().current_context.clone())
}

/// True while an element constructor is running
pub fn is_constructing() -> bool {
	TRACKER.with(|t| t.borrow().current_element.is_some())
}

/// Runs `f` with the context of the element being elaborated.
///
/// Inside an element constructor the position of the element is not yet
/// known, so `f` is stored and run right before that element's `create`.
/// Otherwise `f` runs immediately with the current context.
pub fn with_context<F>(f: F) -> Result<(), ElabError>
where
	F: FnOnce(&Context) -> Result<(), ElabError> + 'static,
{
	let (element, context) = TRACKER.with(|t| {
		let t = t.borrow();
		(t.current_element.clone(), t.current_context.clone())
	});

	match (element, context) {
		(Some(base), _) => {
			debug!("Deferring context hook until the element is placed");
			base.borrow_mut().hooks.push(Box::new(f));
			Ok(())
		},
		(None, Some(context)) => f(&context),
		(None, None) => Err(ElabError::NoActiveContext),
	}
}
