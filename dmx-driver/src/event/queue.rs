//! Bounded packet event queue
//!
//! The interrupt side pushes without blocking. When the queue is full the
//! new event is discarded and counted, so the consumer always sees the
//! oldest undelivered packets in order.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use dmx_core::config::MAX_QUEUE_CAPACITY;
use dmx_core::{DmxError, PacketEvent};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;
use embassy_time::{with_timeout, Duration};
use heapless::Deque;

struct QueueState {
    events: Deque<PacketEvent, MAX_QUEUE_CAPACITY>,
    /// Runtime bound, at most `MAX_QUEUE_CAPACITY`
    capacity: usize,
    open: bool,
    /// Bumped on every open so stale receivers see `Closed`
    generation: u32,
    dropped: u32,
    waker: WakerRegistration,
}

/// Per-port event queue shared between interrupt and consumer
pub struct EventQueue<M: RawMutex> {
    state: Mutex<M, RefCell<QueueState>>,
}

impl<M: RawMutex> EventQueue<M> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(QueueState {
                events: Deque::new(),
                capacity: 0,
                open: false,
                generation: 0,
                dropped: 0,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Open the queue with a runtime capacity and return its generation
    pub(crate) fn open(&self, capacity: usize) -> u32 {
        self.state.lock(|cell| {
            let mut q = cell.borrow_mut();
            q.events.clear();
            q.capacity = capacity.clamp(1, MAX_QUEUE_CAPACITY);
            q.open = true;
            q.generation = q.generation.wrapping_add(1);
            q.dropped = 0;
            q.generation
        })
    }

    /// Discard pending events and wake the receiver
    pub(crate) fn close(&self) {
        self.state.lock(|cell| {
            let mut q = cell.borrow_mut();
            q.open = false;
            q.events.clear();
            q.waker.wake();
        });
    }

    pub fn is_open(&self) -> bool {
        self.state.lock(|cell| cell.borrow().open)
    }

    /// Enqueue from interrupt context
    ///
    /// Returns `false` if the event was dropped.
    pub(crate) fn push(&self, event: PacketEvent) -> bool {
        self.state.lock(|cell| {
            let mut q = cell.borrow_mut();
            if !q.open {
                return false;
            }
            if q.events.len() >= q.capacity || q.events.push_back(event).is_err() {
                q.dropped = q.dropped.saturating_add(1);
                return false;
            }
            q.waker.wake();
            true
        })
    }

    fn try_pop(&self, generation: u32) -> Result<Option<PacketEvent>, DmxError> {
        self.state.lock(|cell| {
            let mut q = cell.borrow_mut();
            if !q.open || q.generation != generation {
                return Err(DmxError::Closed);
            }
            Ok(q.events.pop_front())
        })
    }

    fn poll_pop(&self, generation: u32, cx: &mut Context<'_>) -> Poll<Result<PacketEvent, DmxError>> {
        self.state.lock(|cell| {
            let mut q = cell.borrow_mut();
            if !q.open || q.generation != generation {
                return Poll::Ready(Err(DmxError::Closed));
            }
            match q.events.pop_front() {
                Some(event) => Poll::Ready(Ok(event)),
                None => {
                    q.waker.register(cx.waker());
                    Poll::Pending
                }
            }
        })
    }

    fn dropped(&self, generation: u32) -> u32 {
        self.state.lock(|cell| {
            let q = cell.borrow();
            if q.generation == generation {
                q.dropped
            } else {
                0
            }
        })
    }

    fn len(&self, generation: u32) -> usize {
        self.state.lock(|cell| {
            let q = cell.borrow();
            if q.open && q.generation == generation {
                q.events.len()
            } else {
                0
            }
        })
    }
}

impl<M: RawMutex> Default for EventQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer handle returned by `install`
///
/// Becomes permanently closed when the port is uninstalled, even if the
/// port is installed again later.
pub struct EventReceiver<'a, M: RawMutex> {
    queue: &'a EventQueue<M>,
    generation: u32,
}

impl<'a, M: RawMutex> EventReceiver<'a, M> {
    pub(crate) fn new(queue: &'a EventQueue<M>, generation: u32) -> Self {
        Self { queue, generation }
    }

    /// Take the oldest event without waiting
    pub fn try_receive(&self) -> Result<Option<PacketEvent>, DmxError> {
        self.queue.try_pop(self.generation)
    }

    /// Wait for the next event
    pub async fn receive(&self) -> Result<PacketEvent, DmxError> {
        poll_fn(|cx| self.queue.poll_pop(self.generation, cx)).await
    }

    /// Wait for the next event, giving up after `timeout`
    ///
    /// `Err(DmxError::Timeout)` here means no packet at all arrived in the
    /// window. It is the consumer's loss-of-signal indication, unrelated to
    /// a `Timeout` status carried inside an event.
    pub async fn receive_timeout(&self, timeout: Duration) -> Result<PacketEvent, DmxError> {
        match with_timeout(timeout, self.receive()).await {
            Ok(result) => result,
            Err(_) => Err(DmxError::Timeout),
        }
    }

    /// Events discarded because the queue was full
    pub fn dropped(&self) -> u32 {
        self.queue.dropped(self.generation)
    }

    /// Events waiting to be received
    pub fn pending(&self) -> usize {
        self.queue.len(self.generation)
    }
}
