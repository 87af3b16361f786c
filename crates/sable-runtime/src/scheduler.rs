//! The cooperative task scheduler.
//!
//! A ready queue of frames, scheduled round-robin by insertion order, plus
//! a waiter set in three categories: sleepers (keyed by absolute wake
//! time), read waiters, and write waiters (keyed by file descriptor).
//! Yield directives `[op, arg]` with `op` in `{1, 2, 4}` move the current
//! frame into a waiter set; any other list shape is a runtime error, and a
//! non-list yield just hands the slice to the next ready frame.
//!
//! When the ready queue drains, `pump_waiters` moves expired sleepers back
//! and polls the waiter fds with `select`, capped at 200 ms. Woken frames
//! are appended to the tail: they cannot starve in-flight work and never
//! jump ahead.

use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::errors::RuntimeError;
use crate::frame::{CallFrame, FrameRef, FrameState};
use crate::value::{Closure, Step, Value};

/// Cap on one readiness poll.
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

/// The operations a yield directive may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldOp {
    /// `[1, seconds]`: park until the wall clock passes `now + seconds`
    Sleep = 1,
    /// `[2, fd]`: park until `fd` becomes readable
    WaitRead = 2,
    /// `[4, fd]`: park until `fd` becomes writable
    WaitWrite = 4,
}

impl YieldOp {
    /// Decodes a directive op number.
    #[must_use]
    pub const fn from_op(op: i32) -> Option<Self> {
        match op {
            1 => Some(Self::Sleep),
            2 => Some(Self::WaitRead),
            4 => Some(Self::WaitWrite),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Sleeper {
    frame: FrameRef,
    wake_at: Instant,
}

#[derive(Debug)]
struct IoWaiter {
    frame: FrameRef,
    fd: RawFd,
}

/// The single-threaded cooperative scheduler.
#[derive(Debug, Default)]
pub struct Scheduler {
    ready: Vec<FrameRef>,
    current: usize,
    sleepers: Vec<Sleeper>,
    readers: Vec<IoWaiter>,
    writers: Vec<IoWaiter>,
    next_index: u64,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Spawns a closure as a new frame at the tail of the ready queue.
    ///
    /// The frame starts `Spawned` with its value stack holding the closure;
    /// its index follows the spawning frame's, and indices only grow.
    pub fn spawn(&mut self, closure: Rc<Closure>) -> FrameRef {
        let current_index =
            self.ready.get(self.current).map_or(0, |frame| frame.borrow().index);
        let index = self.next_index.max(current_index + 1);
        self.next_index = index + 1;

        let frame = CallFrame::spawned(closure, index);
        self.ready.push(Rc::clone(&frame));
        log::debug!("spawned frame {index}");

        frame
    }

    /// Returns the number of frames in the ready queue.
    #[must_use]
    pub fn ready_len(&self) -> usize { self.ready.len() }

    /// Returns the sizes of the sleeper, reader, and writer sets.
    #[must_use]
    pub fn waiter_counts(&self) -> (usize, usize, usize) {
        (self.sleepers.len(), self.readers.len(), self.writers.len())
    }

    /// Returns true while any frame is ready or parked.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.ready.is_empty()
            || !self.sleepers.is_empty()
            || !self.readers.is_empty()
            || !self.writers.is_empty()
    }

    /// Every frame the scheduler currently references, for root marking.
    #[must_use]
    pub fn roots(&self) -> Vec<FrameRef> {
        let mut out: Vec<FrameRef> = self.ready.iter().map(Rc::clone).collect();
        out.extend(self.sleepers.iter().map(|sleeper| Rc::clone(&sleeper.frame)));
        out.extend(self.readers.iter().map(|waiter| Rc::clone(&waiter.frame)));
        out.extend(self.writers.iter().map(|waiter| Rc::clone(&waiter.frame)));
        out
    }

    /// Runs until every frame has finished.
    pub fn run(&mut self) {
        while self.run_once() {}
    }

    /// Advances the scheduler by one step: either resumes the current
    /// ready frame or, with an empty ready queue, pumps the waiter set.
    ///
    /// Returns true while work remains.
    pub fn run_once(&mut self) -> bool {
        if self.ready.is_empty() {
            if !self.has_work() {
                return false;
            }
            let _ = self.pump_waiters();
            return self.has_work();
        }

        self.step();

        self.has_work()
    }

    /// Resumes the frame at the scheduling cursor.
    fn step(&mut self) {
        if self.current >= self.ready.len() {
            self.current = 0;
        }

        let frame = Rc::clone(&self.ready[self.current]);
        let step = {
            let mut frame = frame.borrow_mut();
            frame.state = FrameState::Running;
            let input = std::mem::replace(&mut frame.stored, Value::Nil);
            frame.coroutine.resume(input)
        };

        match step {
            Ok(Step::Yield(value)) => {
                if let Err(error) = self.handle_yield(value) {
                    self.fault_current(&frame, error);
                }
            }
            Ok(Step::Done(value)) => {
                {
                    let mut frame = frame.borrow_mut();
                    frame.state = FrameState::Done;
                    frame.result = value;
                }
                drop(self.ready.remove(self.current));
            }
            Err(error) => self.fault_current(&frame, error),
        }
    }

    /// Unwinds the current frame with a fault.
    fn fault_current(&mut self, frame: &FrameRef, error: RuntimeError) {
        log::error!("{error}");
        drop(self.ready.remove(self.current));

        let mut frame = frame.borrow_mut();
        frame.state = FrameState::Done;
        frame.fault = Some(error);
    }

    /// Routes a yielded value.
    ///
    /// A `[op, arg]` list parks the current frame in the matching waiter
    /// set; any other list shape is an error. A non-list yield advances the
    /// round-robin cursor.
    ///
    /// ## Errors
    ///
    /// [`RuntimeError::InvalidYieldOp`] for an op outside `{1, 2, 4}`,
    /// [`RuntimeError::InvalidYieldValue`] when op or arg is not a number.
    pub fn handle_yield(&mut self, value: Value) -> Result<(), RuntimeError> {
        let Value::List(items) = value else {
            if !self.ready.is_empty() {
                self.current = (self.current + 1) % self.ready.len();
            }
            return Ok(());
        };

        let (op_value, arg_value) = {
            let items = items.borrow();
            (items.first().cloned().unwrap_or(Value::Nil), items.get(1).cloned())
        };

        let Some(op_number) = op_value.as_number() else {
            return Err(RuntimeError::InvalidYieldValue);
        };

        #[allow(clippy::cast_possible_truncation)]
        let op = op_number.trunc() as i32;
        let Some(op) = YieldOp::from_op(op) else {
            return Err(RuntimeError::InvalidYieldOp(op));
        };

        let Some(arg) = arg_value.as_ref().and_then(Value::as_number) else {
            return Err(RuntimeError::InvalidYieldValue);
        };

        match op {
            YieldOp::Sleep => {
                let wake_at = Instant::now() + Duration::from_secs_f64(arg.max(0.0));
                let frame = self.park_current();
                self.sleepers.push(Sleeper { frame, wake_at });
            }
            YieldOp::WaitRead => {
                #[allow(clippy::cast_possible_truncation)]
                let fd = arg.trunc() as RawFd;
                let frame = self.park_current();
                self.readers.push(IoWaiter { frame, fd });
            }
            YieldOp::WaitWrite => {
                #[allow(clippy::cast_possible_truncation)]
                let fd = arg.trunc() as RawFd;
                let frame = self.park_current();
                self.writers.push(IoWaiter { frame, fd });
            }
        }

        Ok(())
    }

    /// Removes the current frame from the ready queue ahead of parking it.
    fn park_current(&mut self) -> FrameRef {
        let frame = self.ready.remove(self.current);
        frame.borrow_mut().state = FrameState::Waiting;

        if !self.ready.is_empty() {
            self.current %= self.ready.len();
        }

        frame
    }

    /// Requeues a woken frame at the tail with `stored = true`.
    fn make_ready(&mut self, frame: FrameRef) {
        {
            let mut frame = frame.borrow_mut();
            frame.stored = Value::Bool(true);
            frame.state = FrameState::Spawned;
        }
        self.ready.push(frame);
    }

    /// Moves expired sleepers and ready fds back onto the ready queue.
    ///
    /// Invoked when the ready queue would otherwise be empty. Blocks at
    /// most [`POLL_TIMEOUT`] inside the readiness poll (or an equivalent
    /// sleep when no fds are parked).
    ///
    /// Returns true when any frame became ready.
    pub fn pump_waiters(&mut self) -> bool {
        let now = Instant::now();
        let mut found = false;

        let mut index = 0;
        while index < self.sleepers.len() {
            if self.sleepers[index].wake_at <= now {
                let sleeper = self.sleepers.remove(index);
                self.make_ready(sleeper.frame);
                found = true;
            } else {
                index += 1;
            }
        }

        if self.readers.is_empty() && self.writers.is_empty() {
            if !found
                && let Some(earliest) = self.sleepers.iter().map(|s| s.wake_at).min()
            {
                std::thread::sleep(earliest.saturating_duration_since(now).min(POLL_TIMEOUT));
            }
            return found;
        }

        self.poll_fds() || found
    }

    /// One `select` poll over the union of reader and writer fds.
    fn poll_fds(&mut self) -> bool {
        let mut max_fd: RawFd = -1;

        // SAFETY: an all-zero fd_set is the state FD_ZERO produces; FD_SET
        // is only called with fds the waiters registered.
        let (mut read_set, mut write_set) = unsafe {
            let mut read_set = std::mem::zeroed::<libc::fd_set>();
            let mut write_set = std::mem::zeroed::<libc::fd_set>();
            libc::FD_ZERO(&mut read_set);
            libc::FD_ZERO(&mut write_set);

            for waiter in &self.readers {
                libc::FD_SET(waiter.fd, &mut read_set);
                max_fd = max_fd.max(waiter.fd);
            }
            for waiter in &self.writers {
                libc::FD_SET(waiter.fd, &mut write_set);
                max_fd = max_fd.max(waiter.fd);
            }

            (read_set, write_set)
        };

        let mut timeout = libc::timeval {
            tv_sec: 0,
            tv_usec: libc::suseconds_t::try_from(POLL_TIMEOUT.as_micros()).unwrap_or(200_000),
        };

        // SAFETY: the sets were initialized above, nfds covers every
        // registered fd, and the timeout struct outlives the call.
        let status = unsafe {
            libc::select(
                max_fd + 1,
                &raw mut read_set,
                &raw mut write_set,
                std::ptr::null_mut(),
                &raw mut timeout,
            )
        };

        if status <= 0 {
            return false;
        }

        let mut found = false;

        let mut index = 0;
        while index < self.readers.len() {
            // SAFETY: read_set was populated by select for exactly these fds.
            if unsafe { libc::FD_ISSET(self.readers[index].fd, &read_set) } {
                let waiter = self.readers.remove(index);
                self.make_ready(waiter.frame);
                found = true;
            } else {
                index += 1;
            }
        }

        let mut index = 0;
        while index < self.writers.len() {
            // SAFETY: write_set was populated by select for exactly these fds.
            if unsafe { libc::FD_ISSET(self.writers[index].fd, &write_set) } {
                let waiter = self.writers.remove(index);
                self.make_ready(waiter.frame);
                found = true;
            } else {
                index += 1;
            }
        }

        found
    }
}
