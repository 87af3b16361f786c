//! Tests for the cooperative scheduler: the yield protocol, timers, fd
//! readiness, fairness, and fault handling.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use sable_runtime::{Closure, FrameState, RuntimeError, Scheduler, Step, Value};

/// A closure whose frames yield each directive in order, then finish with
/// the last resume input as their result.
fn yielding_closure(name: &str, directives: Vec<Value>) -> Rc<Closure> {
    Rc::new(Closure::from_fn(name, move || {
        let mut remaining: Vec<Value> = directives.iter().rev().cloned().collect();
        move |input| match remaining.pop() {
            Some(directive) => Ok(Step::Yield(directive)),
            None => Ok(Step::Done(input)),
        }
    }))
}

fn sleep_directive(seconds: f64) -> Value {
    Value::list(vec![Value::Number(1.0), Value::Number(seconds)])
}

// ============================================================================
// Spawning
// ============================================================================

#[test]
fn spawn_assigns_monotonic_indices() {
    let mut scheduler = Scheduler::new();
    let first = scheduler.spawn(yielding_closure("a", vec![]));
    let second = scheduler.spawn(yielding_closure("b", vec![]));

    assert!(first.borrow().index < second.borrow().index);
    assert_eq!(scheduler.ready_len(), 2);
    assert_eq!(first.borrow().state, FrameState::Spawned);
}

#[test]
fn frame_stack_is_seeded_with_the_closure() {
    let mut scheduler = Scheduler::new();
    let frame = scheduler.spawn(yielding_closure("a", vec![]));

    assert_eq!(frame.borrow().stack.len(), 1);
    assert!(matches!(frame.borrow().stack[0], Value::Closure(_)));
}

#[test]
fn finished_frames_keep_their_result() {
    let mut scheduler = Scheduler::new();
    let frame = scheduler.spawn(Rc::new(Closure::from_fn("answer", || {
        |_input| Ok(Step::Done(Value::Number(42.0)))
    })));

    scheduler.run();

    assert!(frame.borrow().is_done());
    assert_eq!(frame.borrow().result.as_number(), Some(42.0));
    assert_eq!(scheduler.ready_len(), 0);
}

// ============================================================================
// Sleep timers
// ============================================================================

#[test]
fn sleeping_frame_wakes_after_its_deadline() {
    let mut scheduler = Scheduler::new();
    let frame = scheduler.spawn(yielding_closure("sleeper", vec![sleep_directive(0.02)]));

    let start = Instant::now();
    scheduler.run();
    let elapsed = start.elapsed();

    assert!(frame.borrow().is_done());
    assert!(elapsed >= Duration::from_millis(20), "woke after {elapsed:?}");
    // The wakeup handed `true` back through the stored slot.
    assert!(matches!(frame.borrow().result, Value::Bool(true)));
}

#[test]
fn sleeping_frame_leaves_the_ready_queue() {
    let mut scheduler = Scheduler::new();
    let frame = scheduler.spawn(yielding_closure("sleeper", vec![sleep_directive(5.0)]));

    // One step: the frame yields the sleep directive and parks.
    let _ = scheduler.run_once();

    assert_eq!(scheduler.ready_len(), 0);
    assert_eq!(scheduler.waiter_counts(), (1, 0, 0));
    assert_eq!(frame.borrow().state, FrameState::Waiting);
}

// ============================================================================
// Yield protocol errors
// ============================================================================

#[test]
fn unknown_yield_op_faults_the_frame() {
    let mut scheduler = Scheduler::new();
    let directive = Value::list(vec![Value::Number(99.0), Value::Number(0.0)]);
    let frame = scheduler.spawn(yielding_closure("bad", vec![directive]));

    scheduler.run();

    let frame = frame.borrow();
    assert_eq!(frame.state, FrameState::Done);
    assert_eq!(frame.fault, Some(RuntimeError::InvalidYieldOp(99)));
    assert_eq!(frame.fault.as_ref().map(ToString::to_string).as_deref(), Some("Invalid yield op 99"));
}

#[test]
fn non_numeric_directive_payload_faults_the_frame() {
    let mut scheduler = Scheduler::new();
    let directive = Value::list(vec![Value::Number(1.0), Value::Str(Rc::from("soon"))]);
    let frame = scheduler.spawn(yielding_closure("bad", vec![directive]));

    scheduler.run();

    assert_eq!(frame.borrow().fault, Some(RuntimeError::InvalidYieldValue));
}

#[test]
fn fault_does_not_stop_other_frames() {
    let mut scheduler = Scheduler::new();
    let directive = Value::list(vec![Value::Number(7.0), Value::Number(0.0)]);
    let bad = scheduler.spawn(yielding_closure("bad", vec![directive]));
    let good = scheduler.spawn(yielding_closure("good", vec![Value::Nil]));

    scheduler.run();

    assert!(bad.borrow().fault.is_some());
    assert!(good.borrow().is_done());
    assert!(good.borrow().fault.is_none());
}

// ============================================================================
// Fairness
// ============================================================================

#[test]
fn plain_yields_alternate_round_robin() {
    let trace: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let make = |name: &'static str, trace: Rc<RefCell<Vec<&'static str>>>| {
        Rc::new(Closure::from_fn(name, move || {
            let trace = Rc::clone(&trace);
            let mut turns = 0;
            move |_input| {
                trace.borrow_mut().push(name);
                turns += 1;
                if turns <= 2 { Ok(Step::Yield(Value::Nil)) } else { Ok(Step::Done(Value::Nil)) }
            }
        }))
    };

    let mut scheduler = Scheduler::new();
    let _ = scheduler.spawn(make("a", Rc::clone(&trace)));
    let _ = scheduler.spawn(make("b", Rc::clone(&trace)));
    scheduler.run();

    assert_eq!(*trace.borrow(), vec!["a", "b", "a", "b", "a", "b"]);
}

#[test]
fn woken_frames_join_at_the_tail() {
    // A short sleeper and a long-running yielder: the sleeper wakes into
    // the tail and cannot preempt the yielder mid-turn.
    let mut scheduler = Scheduler::new();
    let sleeper = scheduler.spawn(yielding_closure("sleeper", vec![sleep_directive(0.005)]));
    let spinner = scheduler.spawn(yielding_closure(
        "spinner",
        vec![Value::Nil, Value::Nil, Value::Nil],
    ));

    scheduler.run();

    assert!(sleeper.borrow().is_done());
    assert!(spinner.borrow().is_done());
}

// ============================================================================
// File-descriptor readiness
// ============================================================================

#[test]
fn read_waiter_parks_until_its_fd_is_readable() {
    let mut fds = [0i32; 2];
    // SAFETY: a two-slot array is exactly what pipe(2) writes into.
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(rc, 0, "pipe(2) failed");
    let (read_fd, write_fd) = (fds[0], fds[1]);

    let directive = Value::list(vec![Value::Number(2.0), Value::Number(f64::from(read_fd))]);
    let mut scheduler = Scheduler::new();
    let frame = scheduler.spawn(yielding_closure("reader", vec![directive]));

    // The frame parks on the read fd.
    let _ = scheduler.run_once();
    assert_eq!(scheduler.waiter_counts(), (0, 1, 0));

    // One pump with nothing written: the poll times out, the frame stays.
    let _ = scheduler.pump_waiters();
    assert_eq!(scheduler.waiter_counts(), (0, 1, 0));

    // SAFETY: write_fd came from pipe(2) above and the buffer is one byte.
    let written = unsafe { libc::write(write_fd, c"x".as_ptr().cast(), 1) };
    assert_eq!(written, 1);

    scheduler.run();

    assert!(frame.borrow().is_done());
    assert!(matches!(frame.borrow().result, Value::Bool(true)));

    // SAFETY: both fds came from pipe(2) and are closed exactly once.
    unsafe {
        let _ = libc::close(read_fd);
        let _ = libc::close(write_fd);
    }
}

#[test]
fn write_waiter_wakes_on_a_writable_fd() {
    let mut fds = [0i32; 2];
    // SAFETY: a two-slot array is exactly what pipe(2) writes into.
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
    assert_eq!(rc, 0, "pipe(2) failed");
    let (read_fd, write_fd) = (fds[0], fds[1]);

    // An empty pipe is immediately writable.
    let directive = Value::list(vec![Value::Number(4.0), Value::Number(f64::from(write_fd))]);
    let mut scheduler = Scheduler::new();
    let frame = scheduler.spawn(yielding_closure("writer", vec![directive]));

    scheduler.run();

    assert!(frame.borrow().is_done());

    // SAFETY: both fds came from pipe(2) and are closed exactly once.
    unsafe {
        let _ = libc::close(read_fd);
        let _ = libc::close(write_fd);
    }
}
