use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use hdlelem::{add_class_context_hook, elaborate, with_context, Context, Elem, ElabError, Element, ElementModule};

/// Records `path/method` of every `Handler` into the nearest collector
struct MethodCollector {
	count: usize,
	methods: BTreeMap<String, &'static str>,
}

impl Element for MethodCollector {
	fn create(&mut self, m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
		for _ in 0..self.count {
			m.add_submodule(Elem::new(|| Handler))?;
		}
		Ok(())
	}
}

struct Handler;
impl Element for Handler {}

fn register_method(method: &'static str) {
	Handler::add_class_context_hook(move |ctx| {
		let names: Vec<_> = ctx.path().collect();
		let path = format!("{}/{}", names.into_iter().rev().collect::<Vec<_>>().join("/"), method);
		let collector = ctx
			.find::<MethodCollector>()
			.ok_or_else(|| ElabError::Custom("no collector".into()))?;
		collector.borrow_mut().methods.insert(path, method);
		Ok(())
	});
}

#[test]
fn test_class_hooks() {
	register_method("test");
	register_method("test2");

	let top = Elem::new(|| MethodCollector {
		count: 2,
		methods: BTreeMap::new(),
	});
	elaborate(&top).unwrap();

	let collector = top.borrow();
	assert_eq!(collector.methods.len(), 4);
	assert_eq!(collector.methods["top/Handler#0/test"], "test");
	assert_eq!(collector.methods["top/Handler#0/test2"], "test2");
	assert_eq!(collector.methods["top/Handler#1/test"], "test");
	assert_eq!(collector.methods["top/Handler#1/test2"], "test2");
}

#[test]
fn test_class_hooks_before_instance_hooks() {
	struct Ordered;
	impl Element for Ordered {}

	let order = Rc::new(RefCell::new(Vec::new()));
	let class_order = order.clone();
	add_class_context_hook::<Ordered>(move |_| {
		class_order.borrow_mut().push("class");
		Ok(())
	});

	let instance_order = order.clone();
	let top = Elem::try_new(move || {
		with_context(move |_| {
			instance_order.borrow_mut().push("instance");
			Ok(())
		})?;
		Ok(Ordered)
	})
	.unwrap();
	elaborate(&top).unwrap();
	assert_eq!(*order.borrow(), vec!["class", "instance"]);
}

#[test]
fn test_failing_hook_aborts_before_create() {
	struct Guarded {
		created: Rc<RefCell<bool>>,
	}

	impl Element for Guarded {
		fn create(&mut self, _m: &mut ElementModule, _ctx: &Context) -> Result<(), ElabError> {
			*self.created.borrow_mut() = true;
			Ok(())
		}
	}

	let created = Rc::new(RefCell::new(false));
	let flag = created.clone();
	let top = Elem::try_new(move || {
		with_context(|ctx| Err(ElabError::Custom(format!("rejected {}", ctx.path_string()))))?;
		Ok(Guarded { created: flag })
	})
	.unwrap();

	let err = elaborate(&top).unwrap_err();
	assert!(matches!(err.root_cause(), ElabError::Custom(msg) if msg == "rejected top"));
	assert!(!*created.borrow());
}
