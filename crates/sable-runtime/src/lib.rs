//! Runtime support for the Sable programming language.
//!
//! Strictly single-threaded and cooperative: frames suspend only at `yield`
//! expressions, handing the scheduler a `[op, arg]` directive that moves
//! them between the ready queue and the waiter sets (sleep timers, read
//! fds, write fds). Readiness is multiplexed with a `select` poll capped at
//! 200 ms; nothing here touches host threads or host async.

pub mod errors;
pub mod frame;
pub mod scheduler;
pub mod value;

pub use errors::RuntimeError;
pub use frame::{CallFrame, FrameRef, FrameState};
pub use scheduler::{Scheduler, YieldOp};
pub use value::{Closure, Coroutine, Module, NativeFn, Step, Value};
