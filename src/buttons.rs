//! Debounce producers
//!
//! One producer per channel samples its button on a fixed cadence, runs the
//! debounce state machine, and reports [`ButtonEvent`]s into the channel's
//! event queue. Entry into a confirmed press is gated behind the shared
//! [`PressArbiter`].

use defmt_or_log as log;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use embedded_hal::digital::InputPin;

use crate::arbiter::{ArbiterToken, PressArbiter};
use crate::channels::{EventQueue, Resources};
use crate::config::Timing;
use crate::types::{ButtonEvent, ButtonLevel, ChannelId};

// ===================================================================
// Hardware Sampler
// ===================================================================

/// Non-blocking read of one raw button level
pub trait ButtonSampler {
    fn read_level(&mut self) -> ButtonLevel;
}

/// Button wired to ground with a pull-up, so low means pressed
pub struct ActiveLowButton<P> {
    pin: P,
}

impl<P: InputPin> ActiveLowButton<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> ButtonSampler for ActiveLowButton<P> {
    fn read_level(&mut self) -> ButtonLevel {
        // A failed read counts as released; the next cycle samples again
        ButtonLevel::from(self.pin.is_low().unwrap_or(false))
    }
}

// ===================================================================
// Debounce State Machine
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceState {
    /// Waiting for a press
    Idle,
    /// Press seen; `baseline` is the level it must keep to stay confirmed
    Confirming { baseline: ButtonLevel },
    /// The physical press ended, the release is due
    Held,
    /// Arbiter given back, `Released` being reported
    Releasing,
}

/// What the producer has to do for the level it just sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Report `Idle`, then wait one cycle
    Heartbeat,
    /// Wait one debounce interval before trusting the press
    Settle,
    /// Try for the arbiter; on success report `Pressed` and wait one cycle
    Contend,
    /// Level left the baseline; wait one cycle before releasing
    PressEnded,
    /// Give the arbiter back, report `Released`, wait one cycle
    Release,
}

/// Time-free debounce logic for one channel. Only its producer mutates it.
#[derive(Debug, Clone)]
pub struct Debouncer {
    state: DebounceState,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            state: DebounceState::Idle,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn sample(&mut self, level: ButtonLevel) -> Command {
        match self.state {
            DebounceState::Idle if level.is_pressed() => {
                self.state = DebounceState::Confirming { baseline: level };
                Command::Settle
            }
            DebounceState::Idle => Command::Heartbeat,
            DebounceState::Confirming { baseline } if level == baseline => Command::Contend,
            DebounceState::Confirming { .. } => {
                self.state = DebounceState::Held;
                Command::PressEnded
            }
            DebounceState::Held => {
                self.state = DebounceState::Releasing;
                Command::Release
            }
            // `cycle` finishes the release in the same step, so only a caller
            // that skipped `finish_release` lands here; the release is still owed
            DebounceState::Releasing => Command::Release,
        }
    }

    /// Call once `Released` has been handed to the queue
    pub fn finish_release(&mut self) {
        if self.state == DebounceState::Releasing {
            self.state = DebounceState::Idle;
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

// ===================================================================
// Producer Task
// ===================================================================

pub struct DebounceProducer<'a, M: RawMutex, S: ButtonSampler> {
    channel: ChannelId,
    sampler: S,
    debouncer: Debouncer,
    resources: &'a Resources<M>,
    token: Option<ArbiterToken<'a, M>>,
    timing: Timing,
}

impl<'a, M: RawMutex, S: ButtonSampler> DebounceProducer<'a, M, S> {
    pub fn new(channel: ChannelId, sampler: S, resources: &'a Resources<M>, timing: Timing) -> Self {
        Self {
            channel,
            sampler,
            debouncer: Debouncer::new(),
            resources,
            token: None,
            timing,
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn state(&self) -> DebounceState {
        self.debouncer.state()
    }

    pub fn holds_arbiter(&self) -> bool {
        self.token.is_some()
    }

    fn arbiter(&self) -> &'a PressArbiter<M> {
        &self.resources.arbiter
    }

    fn queue(&self) -> &'a EventQueue<M> {
        self.resources.queue(self.channel)
    }

    fn start_delay(&self) -> Duration {
        match self.channel {
            ChannelId::A => self.timing.channel_a_start,
            ChannelId::B => self.timing.channel_b_start,
        }
    }

    /// Sample once and carry out the resulting command, including its wait
    pub async fn cycle(&mut self) -> Command {
        let level = self.sampler.read_level();
        let command = self.debouncer.sample(level);

        match command {
            Command::Heartbeat => {
                self.publish(ButtonEvent::Idle).await;
                Timer::after(self.timing.producer_cycle).await;
            }
            Command::Settle => {
                log::debug!("Channel {} confirming press", self.channel.name());
                Timer::after(self.timing.debounce).await;
            }
            Command::Contend => {
                // While this channel already holds the token its own attempt
                // times out, and that timeout is the loop's yield point.
                let arbiter = self.arbiter();
                if let Some(token) = arbiter.try_acquire(self.channel, self.timing.arbiter_timeout).await {
                    self.token = Some(token);
                    log::debug!("Channel {} pressed", self.channel.name());
                    self.publish(ButtonEvent::Pressed).await;
                    Timer::after(self.timing.producer_cycle).await;
                }
            }
            Command::PressEnded => {
                Timer::after(self.timing.producer_cycle).await;
            }
            Command::Release => {
                if let Some(token) = self.token.take() {
                    token.release();
                }
                self.publish(ButtonEvent::Released).await;
                self.debouncer.finish_release();
                log::debug!("Channel {} released", self.channel.name());
                Timer::after(self.timing.producer_cycle).await;
            }
        }

        command
    }

    async fn publish(&self, event: ButtonEvent) {
        if !self.queue().send(event, self.timing.send_timeout).await {
            match event {
                ButtonEvent::Idle => log::trace!("Channel {} heartbeat dropped", self.channel.name()),
                _ => log::warn!("Channel {} dropped {:?}", self.channel.name(), event),
            }
        }
    }

    /// Wait for bring-up, then sample forever
    pub async fn run(mut self) -> ! {
        self.resources
            .gate
            .wait_logged(self.channel.name(), self.timing.gate_poll)
            .await;
        Timer::after(self.start_delay()).await;
        log::info!("Debounce producer {} started", self.channel.name());

        loop {
            self.cycle().await;
        }
    }
}
