//! Runtime values.
//!
//! The closed value set the in-scope runtime touches: primitives, lists and
//! maps, closures, tasks, native functions, and module objects. Aggregate
//! values are reference-counted; a frame is collected when it is `Done` and
//! the last `Task` handle to it drops.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::errors::RuntimeError;
use crate::frame::FrameRef;
use crate::scheduler::Scheduler;

/// What a coroutine produced when resumed.
#[derive(Debug)]
pub enum Step {
    /// The frame suspended, yielding a value to the scheduler
    Yield(Value),
    /// The frame finished with a result
    Done(Value),
}

/// A resumable frame body.
///
/// User-level coroutines are state machines behind this trait: `resume`
/// runs until the next `yield` or completion. The scheduler passes the
/// frame's `stored` value back in as `input` on wakeup.
pub trait Coroutine {
    /// Run until the next suspension point or completion.
    ///
    /// ## Errors
    ///
    /// Returns a [`RuntimeError`] when the frame faults; the scheduler then
    /// unwinds the frame.
    fn resume(&mut self, input: Value) -> Result<Step, RuntimeError>;
}

impl fmt::Debug for dyn Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "<coroutine>") }
}

/// A coroutine backed by a closure, for natives and tests.
struct FnCoroutine<F>
where F: FnMut(Value) -> Result<Step, RuntimeError>
{
    body: F,
}

impl<F> Coroutine for FnCoroutine<F>
where F: FnMut(Value) -> Result<Step, RuntimeError>
{
    fn resume(&mut self, input: Value) -> Result<Step, RuntimeError> { (self.body)(input) }
}

/// A callable value: a name plus a factory producing one fresh coroutine
/// per spawned frame.
pub struct Closure {
    /// The function's name, for display
    pub name: Rc<str>,
    factory: Rc<dyn Fn() -> Box<dyn Coroutine>>,
}

impl Closure {
    /// Creates a closure from a coroutine factory.
    #[must_use]
    pub fn new(name: &str, factory: Rc<dyn Fn() -> Box<dyn Coroutine>>) -> Self {
        Self { name: Rc::from(name), factory }
    }

    /// Creates a closure whose frames run `body` as their state machine.
    ///
    /// Each spawn calls `make_body` once, so every frame owns independent
    /// state.
    #[must_use]
    pub fn from_fn<F, B>(name: &str, make_body: B) -> Self
    where
        F: FnMut(Value) -> Result<Step, RuntimeError> + 'static,
        B: Fn() -> F + 'static,
    {
        Self {
            name: Rc::from(name),
            factory: Rc::new(move || Box::new(FnCoroutine { body: make_body() })),
        }
    }

    /// Instantiates a fresh coroutine for a new frame.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Coroutine> { (self.factory)() }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fun {}>", self.name)
    }
}

/// A native function: receives the scheduler and the argument slice.
pub type NativeFn = fn(&mut Scheduler, &[Value]) -> Result<Value, RuntimeError>;

/// A runtime module object: named native functions under a short name.
#[derive(Debug)]
pub struct Module {
    /// Display name (`Task`)
    pub name: String,
    /// Import path (`task`)
    pub path: String,
    /// Exported native functions
    pub functions: FxHashMap<String, NativeFn>,
}

impl Module {
    /// Creates an empty module.
    #[must_use]
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: String::from(name),
            path: String::from(path),
            functions: FxHashMap::default(),
        }
    }

    /// Registers a native function on the module.
    pub fn define_function(&mut self, name: &str, function: NativeFn) {
        drop(self.functions.insert(String::from(name), function));
    }
}

/// A value in the Sable runtime.
#[derive(Debug, Clone)]
pub enum Value {
    /// Numeric value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// The nil value
    Nil,
    /// An interned-style atom
    Atom(Rc<str>),
    /// A string
    Str(Rc<str>),
    /// A list
    List(Rc<RefCell<Vec<Value>>>),
    /// A callable closure
    Closure(Rc<Closure>),
    /// A handle to a spawned frame
    Task(FrameRef),
    /// A native function
    Native(NativeFn),
    /// A module object
    Module(Rc<Module>),
}

impl Value {
    /// Builds a list value from items.
    #[must_use]
    pub fn list(items: Vec<Self>) -> Self { Self::List(Rc::new(RefCell::new(items))) }

    /// Returns the number inside, if this is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true for `nil`.
    #[must_use]
    pub const fn is_nil(&self) -> bool { matches!(self, Self::Nil) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => write!(f, "nil"),
            Self::Atom(name) => write!(f, "#{name}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) => {
                let items = items.borrow();
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Closure(closure) => write!(f, "<fun {}>", closure.name),
            Self::Task(frame) => write!(f, "<task {}>", frame.borrow().index),
            Self::Native(_) => write!(f, "<native fun>"),
            Self::Module(module) => write!(f, "<module {}>", module.name),
        }
    }
}
