//! Cross-thread stop requests and run-state tracking.
//!
//! A `StopHandle` is the only piece of a session that may be touched from another
//! thread while a run is in progress. It shares two atomics with the session: the
//! pending stop request, polled by the core before every instruction, and the
//! current [`RunState`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing::debug;

/// Lifecycle state of an emulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RunState {
    /// No run has started yet.
    Idle = 0,
    /// The core is executing.
    Running = 1,
    /// The last run reached its end address.
    Completed = 2,
    /// The last run ended on a stop request.
    Stopped = 3,
    /// The last run ended with a core error.
    Faulted = 4,
}

impl RunState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Stopped,
            4 => Self::Faulted,
            _ => Self::Idle,
        }
    }

    /// Returns `true` for the states a finished run can end in.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Faulted)
    }
}

#[derive(Debug)]
struct Shared {
    requested: AtomicBool,
    state: AtomicU8,
}

/// Cloneable, thread-safe handle for stopping a running session.
#[derive(Debug, Clone)]
pub struct StopHandle {
    inner: Arc<Shared>,
}

impl StopHandle {
    /// Creates a handle in the [`RunState::Idle`] state with no pending request.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Shared {
                requested: AtomicBool::new(false),
                state: AtomicU8::new(RunState::Idle as u8),
            }),
        }
    }

    /// Asks the core to halt before its next instruction.
    ///
    /// Only honoured while a run is in progress; returns `false` (and records
    /// nothing) otherwise, so a stale request cannot cut the next run short.
    pub fn stop(&self) -> bool {
        if self.state() != RunState::Running {
            debug!("Stop ignored, emulation is {:?}", self.state());
            return false;
        }
        self.inner.requested.store(true, Ordering::SeqCst);
        debug!("Stop requested");
        true
    }

    /// Returns `true` if a stop has been requested for the current run.
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Clears any pending request and enters [`RunState::Running`].
    pub(crate) fn begin_run(&self) {
        self.inner.requested.store(false, Ordering::SeqCst);
        self.set_state(RunState::Running);
    }

    /// Leaves the run in `state` and drops any pending request.
    pub(crate) fn finish_run(&self, state: RunState) {
        self.set_state(state);
        self.inner.requested.store(false, Ordering::SeqCst);
    }

    fn set_state(&self, state: RunState) {
        self.inner.state.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}
