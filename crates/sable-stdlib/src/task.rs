//! The `task` builtin module.
//!
//! Exposes `spawn`, which takes a zero-argument function and enqueues it as
//! a new frame, returning a `Task` handle. The module's type descriptor
//! gives `spawn` the signature `(() => Any) => Task`.

use sable_analyzer::types::{FunctorType, SimpleType};
use sable_analyzer::{Builtins, TypeArena, TypeId, TypeKind};
use sable_runtime::{Module, RuntimeError, Scheduler, Value};

use crate::ModuleRegistration;

/// The `task` module's registration record.
#[must_use]
pub fn registration() -> ModuleRegistration {
    ModuleRegistration {
        make_module: make_task_module,
        make_type: make_task_module_type,
        path: "task",
        name: "Task",
        builtin: true,
    }
}

/// Builds the runtime module object.
#[must_use]
pub fn make_task_module() -> Module {
    let mut module = Module::new("Task", "task");
    module.define_function("spawn", spawn_native);

    module
}

/// `spawn(f)`: enqueue `f` as a new frame, returning its task handle.
///
/// ## Errors
///
/// Rejects a first argument that is not a function.
pub fn spawn_native(scheduler: &mut Scheduler, args: &[Value]) -> Result<Value, RuntimeError> {
    let Some(Value::Closure(closure)) = args.first() else {
        return Err(RuntimeError::ExpectedFunction(0));
    };

    let frame = scheduler.spawn(std::rc::Rc::clone(closure));

    Ok(Value::Task(frame))
}

/// Builds the module's type descriptor: a nominal type whose `spawn`
/// method is `(() => Any) => Task`.
pub fn make_task_module_type(arena: &mut TypeArena, builtins: &Builtins) -> TypeId {
    let callback = arena.alloc(TypeKind::Functor(FunctorType {
        params: Vec::new(),
        return_type: Some(builtins.any),
        generics: Vec::new(),
    }));
    let spawn = arena.alloc(TypeKind::Functor(FunctorType {
        params: vec![callback],
        return_type: Some(builtins.task_def),
        generics: Vec::new(),
    }));

    let mut module = SimpleType::named("Task");
    drop(module.methods.insert(String::from("spawn"), spawn));

    arena.alloc(TypeKind::Simple(module))
}
