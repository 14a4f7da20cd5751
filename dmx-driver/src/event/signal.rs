//! Transmit completion signal
//!
//! A single-slot handoff. Sending a frame arms it, the interrupt that sees
//! the last stop bit releases it once, and a writer waiting on it wakes.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use dmx_core::DmxError;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    /// Nothing in flight
    Idle,
    /// A frame is being sent
    Pending,
    /// The frame finished and nobody has observed it yet
    Done,
    /// Port was uninstalled
    Closed,
}

struct SignalState {
    phase: Phase,
    waker: WakerRegistration,
}

pub struct CompletionSignal<M: RawMutex> {
    state: Mutex<M, RefCell<SignalState>>,
}

impl<M: RawMutex> CompletionSignal<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(SignalState {
                phase: Phase::Closed,
                waker: WakerRegistration::new(),
            })),
        }
    }

    pub(crate) fn open(&self) {
        self.state.lock(|cell| cell.borrow_mut().phase = Phase::Idle);
    }

    /// Close the signal and wake any waiter with `Closed`
    pub(crate) fn close(&self) {
        self.state.lock(|cell| {
            let mut s = cell.borrow_mut();
            s.phase = Phase::Closed;
            s.waker.wake();
        });
    }

    /// Mark a frame as in flight
    pub(crate) fn arm(&self) -> Result<(), DmxError> {
        self.state.lock(|cell| {
            let mut s = cell.borrow_mut();
            match s.phase {
                Phase::Closed => Err(DmxError::Closed),
                Phase::Pending => Err(DmxError::Busy),
                Phase::Idle | Phase::Done => {
                    s.phase = Phase::Pending;
                    Ok(())
                }
            }
        })
    }

    /// Report that the frame in flight has finished
    ///
    /// Returns `false` for a release with nothing pending; such a release
    /// changes nothing.
    pub(crate) fn release(&self) -> bool {
        self.state.lock(|cell| {
            let mut s = cell.borrow_mut();
            if s.phase != Phase::Pending {
                return false;
            }
            s.phase = Phase::Done;
            s.waker.wake();
            true
        })
    }

    /// Check if a frame is in flight
    pub fn is_pending(&self) -> bool {
        self.state.lock(|cell| cell.borrow().phase == Phase::Pending)
    }

    fn poll_wait(&self, cx: &mut Context<'_>) -> Poll<Result<(), DmxError>> {
        self.state.lock(|cell| {
            let mut s = cell.borrow_mut();
            match s.phase {
                Phase::Closed => Poll::Ready(Err(DmxError::Closed)),
                Phase::Idle => Poll::Ready(Ok(())),
                Phase::Done => {
                    s.phase = Phase::Idle;
                    Poll::Ready(Ok(()))
                }
                Phase::Pending => {
                    s.waker.register(cx.waker());
                    Poll::Pending
                }
            }
        })
    }

    /// Wait until no frame is in flight
    pub async fn wait(&self) -> Result<(), DmxError> {
        poll_fn(|cx| self.poll_wait(cx)).await
    }
}

impl<M: RawMutex> Default for CompletionSignal<M> {
    fn default() -> Self {
        Self::new()
    }
}
