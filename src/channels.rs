//! Inter-task communication primitives
//!
//! This module defines the bounded event queues between each debounce
//! producer and the scoreboard consumer, the start gate that holds every
//! steady-state task back until bring-up is done, and the bundle of shared
//! resources the supervisor hands out.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use defmt_or_log as log;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;
use embassy_sync::waitqueue::MultiWakerRegistration;
use embassy_time::{with_timeout, Duration};
use portable_atomic::{AtomicU32, Ordering};

use crate::arbiter::PressArbiter;
use crate::config::{QUEUE_CAPACITY, START_GATE_WAITERS};
use crate::types::{ButtonEvent, ChannelId};

// ===================================================================
// Event Queue
// ===================================================================

/// Bounded FIFO from one debounce producer to the scoreboard consumer.
///
/// Every operation carries a timeout. A send that cannot find room in time is
/// dropped and counted; the next heartbeat resynchronizes the consumer.
pub struct EventQueue<M: RawMutex> {
    channel: Channel<M, ButtonEvent, QUEUE_CAPACITY>,
    dropped: AtomicU32,
}

impl<M: RawMutex> EventQueue<M> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Returns `false` when the event was dropped
    pub async fn send(&self, event: ButtonEvent, timeout: Duration) -> bool {
        match with_timeout(timeout, self.channel.send(event)).await {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// `None` when nothing arrived in time
    pub async fn receive(&self, timeout: Duration) -> Option<ButtonEvent> {
        with_timeout(timeout, self.channel.receive()).await.ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Sends that timed out since start-up
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex> Default for EventQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Start Gate
// ===================================================================

struct GateState<const N: usize> {
    open: bool,
    waiters: MultiWakerRegistration<N>,
}

/// One-shot barrier: closed at boot, opened once by the supervisor, never
/// closed again.
pub struct StartGate<M: RawMutex, const N: usize> {
    state: BlockingMutex<M, RefCell<GateState<N>>>,
}

impl<M: RawMutex, const N: usize> StartGate<M, N> {
    pub const fn new() -> Self {
        Self {
            state: BlockingMutex::new(RefCell::new(GateState {
                open: false,
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    pub fn open(&self) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.open = true;
            s.waiters.wake();
        });
    }

    pub fn is_open(&self) -> bool {
        self.state.lock(|s| s.borrow().open)
    }

    pub async fn wait(&self) {
        poll_fn(|cx| {
            self.state.lock(|s| {
                let mut s = s.borrow_mut();
                if s.open {
                    Poll::Ready(())
                } else {
                    s.waiters.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }

    /// Wait for the gate in bounded slices, logging each slice that expires
    pub async fn wait_logged(&self, task: &str, poll: Duration) {
        while with_timeout(poll, self.wait()).await.is_err() {
            log::warn!("{} still waiting for bring-up", task);
        }
    }
}

impl<M: RawMutex, const N: usize> Default for StartGate<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Shared Resources
// ===================================================================

/// Everything the four tasks share. Built in a `static` before any task runs.
pub struct Resources<M: RawMutex> {
    pub queue_a: EventQueue<M>,
    pub queue_b: EventQueue<M>,
    pub arbiter: PressArbiter<M>,
    pub gate: StartGate<M, START_GATE_WAITERS>,
}

impl<M: RawMutex> Resources<M> {
    pub const fn new() -> Self {
        Self {
            queue_a: EventQueue::new(),
            queue_b: EventQueue::new(),
            arbiter: PressArbiter::new(),
            gate: StartGate::new(),
        }
    }

    pub fn queue(&self, channel: ChannelId) -> &EventQueue<M> {
        match channel {
            ChannelId::A => &self.queue_a,
            ChannelId::B => &self.queue_b,
        }
    }
}

impl<M: RawMutex> Default for Resources<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_time::Timer;

    const SHORT: Duration = Duration::from_millis(2);

    #[test]
    fn queue_is_fifo_per_channel() {
        let queue = EventQueue::<CriticalSectionRawMutex>::new();
        block_on(async {
            assert!(queue.send(ButtonEvent::Pressed, SHORT).await);
            assert!(queue.send(ButtonEvent::Released, SHORT).await);
            assert_eq!(queue.receive(SHORT).await, Some(ButtonEvent::Pressed));
            assert_eq!(queue.receive(SHORT).await, Some(ButtonEvent::Released));
            assert_eq!(queue.receive(SHORT).await, None);
        });
    }

    #[test]
    fn full_queue_drops_after_timeout() {
        let queue = EventQueue::<CriticalSectionRawMutex>::new();
        block_on(async {
            for _ in 0..QUEUE_CAPACITY {
                assert!(queue.send(ButtonEvent::Idle, SHORT).await);
            }
            assert!(!queue.send(ButtonEvent::Pressed, SHORT).await);
            assert_eq!(queue.len(), QUEUE_CAPACITY);
            assert_eq!(queue.dropped(), 1);
            // The dropped press never shows up
            for _ in 0..QUEUE_CAPACITY {
                assert_eq!(queue.receive(SHORT).await, Some(ButtonEvent::Idle));
            }
            assert!(queue.is_empty());
        });
    }

    #[test]
    fn blocked_send_completes_when_consumer_drains() {
        let queue = EventQueue::<CriticalSectionRawMutex>::new();
        block_on(async {
            for _ in 0..QUEUE_CAPACITY {
                queue.send(ButtonEvent::Idle, SHORT).await;
            }
            let producer = queue.send(ButtonEvent::Pressed, Duration::from_millis(200));
            let consumer = async {
                Timer::after_millis(5).await;
                queue.receive(SHORT).await
            };
            let (sent, first) = join(producer, consumer).await;
            assert!(sent);
            assert_eq!(first, Some(ButtonEvent::Idle));
            assert_eq!(queue.dropped(), 0);
        });
    }

    #[test]
    fn gate_releases_every_waiter() {
        let gate = StartGate::<CriticalSectionRawMutex, 3>::new();
        assert!(!gate.is_open());
        block_on(async {
            let opener = async {
                Timer::after_millis(5).await;
                gate.open();
            };
            let waiters = join(gate.wait(), join(gate.wait(), gate.wait()));
            join(opener, waiters).await;
        });
        assert!(gate.is_open());
        // Late arrivals pass straight through
        block_on(gate.wait());
    }

    #[test]
    fn resources_route_queues_by_channel() {
        let resources = Resources::<CriticalSectionRawMutex>::new();
        block_on(async {
            resources.queue(ChannelId::B).send(ButtonEvent::Pressed, SHORT).await;
        });
        assert!(resources.queue_a.is_empty());
        assert_eq!(resources.queue_b.len(), 1);
    }
}
