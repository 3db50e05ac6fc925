//! Press arbiter
//!
//! A single exclusive token shared by both debounce producers. Only the
//! channel holding it may report a confirmed press, so two simultaneous
//! presses resolve to one "first responder" at any instant.

use core::cell::Cell;

use defmt_or_log as log;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration, Timer};
use portable_atomic::{AtomicU32, Ordering};

use crate::types::ChannelId;

pub struct PressArbiter<M: RawMutex> {
    token: Mutex<M, ()>,
    holder: BlockingMutex<M, Cell<Option<ChannelId>>>,
    contended: AtomicU32,
}

impl<M: RawMutex> PressArbiter<M> {
    pub const fn new() -> Self {
        Self {
            token: Mutex::new(()),
            holder: BlockingMutex::new(Cell::new(None)),
            contended: AtomicU32::new(0),
        }
    }

    /// Wait at most `timeout` for the token.
    ///
    /// `None` means another channel (or an earlier acquisition by the same
    /// channel) still owns it; callers retry on their next cycle. The token is
    /// not reentrant.
    pub async fn try_acquire(&self, channel: ChannelId, timeout: Duration) -> Option<ArbiterToken<'_, M>> {
        // The mutex keeps a single waker slot. The holder must not queue on it
        // next to a contender, or the two tasks keep waking each other.
        if self.holder() == Some(channel) {
            Timer::after(timeout).await;
            self.contended.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        match with_timeout(timeout, self.token.lock()).await {
            Ok(guard) => {
                self.holder.lock(|h| h.set(Some(channel)));
                log::debug!("Arbiter taken by channel {}", channel.name());
                Some(ArbiterToken {
                    arbiter: self,
                    channel,
                    _guard: guard,
                })
            }
            Err(_) => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Channel currently holding the token
    pub fn holder(&self) -> Option<ChannelId> {
        self.holder.lock(|h| h.get())
    }

    /// Number of acquisitions that timed out
    pub fn contention_count(&self) -> u32 {
        self.contended.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex> Default for PressArbiter<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of ownership. Dropping it releases the arbiter.
pub struct ArbiterToken<'a, M: RawMutex> {
    arbiter: &'a PressArbiter<M>,
    channel: ChannelId,
    _guard: MutexGuard<'a, M, ()>,
}

impl<M: RawMutex> ArbiterToken<'_, M> {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn release(self) {
        drop(self);
    }
}

impl<M: RawMutex> Drop for ArbiterToken<'_, M> {
    fn drop(&mut self) {
        // Cleared before the guard field drops, so no instant shows two holders
        self.arbiter.holder.lock(|h| h.set(None));
        log::debug!("Arbiter released by channel {}", self.channel.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::future::Future;
    use core::pin::pin;
    use core::sync::atomic::AtomicBool;
    use core::task::{Context, Poll, Waker};
    use embassy_futures::block_on;
    use embassy_futures::join::join;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::sync::Arc;
    use std::task::Wake;
    use std::thread::{self, Thread};

    type Arbiter = PressArbiter<CriticalSectionRawMutex>;

    const SHORT: Duration = Duration::from_millis(5);

    struct TaskWaker {
        woken: AtomicBool,
        thread: Thread,
    }

    impl Wake for TaskWaker {
        fn wake(self: Arc<Self>) {
            self.wake_by_ref();
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.woken.store(true, Ordering::SeqCst);
            self.thread.unpark();
        }
    }

    /// Runs two futures as separate tasks with their own wakers, sleeping
    /// until one of them is woken. Returns each output with its poll count.
    fn run_as_two_tasks<T>(first: impl Future<Output = T>, second: impl Future<Output = T>) -> [(T, u32); 2] {
        let mut first = pin!(first);
        let mut second = pin!(second);
        let flags = [(); 2].map(|_| {
            Arc::new(TaskWaker {
                woken: AtomicBool::new(true),
                thread: thread::current(),
            })
        });
        let wakers = flags.clone().map(Waker::from);
        let mut outputs: [Option<T>; 2] = [None, None];
        let mut polls = [0u32; 2];

        while outputs.iter().any(Option::is_none) {
            for task in 0..2 {
                if outputs[task].is_some() || !flags[task].woken.swap(false, Ordering::SeqCst) {
                    continue;
                }
                polls[task] += 1;
                let mut cx = Context::from_waker(&wakers[task]);
                let poll = match task {
                    0 => first.as_mut().poll(&mut cx),
                    _ => second.as_mut().poll(&mut cx),
                };
                if let Poll::Ready(output) = poll {
                    outputs[task] = Some(output);
                }
            }
            if !flags.iter().any(|f| f.woken.load(Ordering::SeqCst)) {
                thread::park_timeout(std::time::Duration::from_millis(50));
            }
        }

        let [Some(a), Some(b)] = outputs else {
            unreachable!("loop exits once both tasks finished")
        };
        [(a, polls[0]), (b, polls[1])]
    }

    #[test]
    fn second_channel_times_out_while_first_holds() {
        let arbiter = Arbiter::new();
        block_on(async {
            let token = arbiter.try_acquire(ChannelId::A, SHORT).await;
            assert!(token.is_some());
            assert_eq!(arbiter.holder(), Some(ChannelId::A));

            assert!(arbiter.try_acquire(ChannelId::B, SHORT).await.is_none());
            assert_eq!(arbiter.holder(), Some(ChannelId::A));
            assert_eq!(arbiter.contention_count(), 1);

            drop(token);
            assert_eq!(arbiter.holder(), None);

            let token = arbiter.try_acquire(ChannelId::B, SHORT).await;
            assert_eq!(token.as_ref().map(|t| t.channel()), Some(ChannelId::B));
        });
    }

    #[test]
    fn holder_cannot_reacquire() {
        let arbiter = Arbiter::new();
        block_on(async {
            let first = arbiter.try_acquire(ChannelId::A, SHORT).await;
            assert!(first.is_some());
            assert!(arbiter.try_acquire(ChannelId::A, SHORT).await.is_none());
            assert_eq!(arbiter.holder(), Some(ChannelId::A));
        });
    }

    #[test]
    fn waiter_gets_token_once_released() {
        let arbiter = Arbiter::new();
        block_on(async {
            let token = arbiter.try_acquire(ChannelId::A, SHORT).await;
            let waiter = async {
                let got = arbiter.try_acquire(ChannelId::B, Duration::from_millis(200)).await;
                got.map(|t| t.channel())
            };
            let releaser = async {
                Timer::after_millis(10).await;
                assert_eq!(arbiter.holder(), Some(ChannelId::A));
                if let Some(token) = token {
                    token.release();
                }
            };
            let (got, ()) = join(waiter, releaser).await;
            assert_eq!(got, Some(ChannelId::B));
        });
    }

    #[test]
    fn holder_retry_and_contender_wait_do_not_wake_each_other() {
        let arbiter = Arbiter::new();
        let token = block_on(arbiter.try_acquire(ChannelId::A, SHORT));
        assert!(token.is_some());

        let window = Duration::from_millis(10);
        let [(a, a_polls), (b, b_polls)] = run_as_two_tasks(
            async { arbiter.try_acquire(ChannelId::A, window).await.map(|t| t.channel()) },
            async { arbiter.try_acquire(ChannelId::B, window).await.map(|t| t.channel()) },
        );

        assert_eq!((a, b), (None, None));
        // Each side sleeps until its own timeout: a few polls, not thousands
        assert!(a_polls <= 5 && b_polls <= 5, "polls A={} B={}", a_polls, b_polls);
        assert_eq!(arbiter.holder(), Some(ChannelId::A));
        assert_eq!(arbiter.contention_count(), 2);
    }
}
