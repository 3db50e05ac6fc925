//! Duelboard - Two-player button duel scoreboard for RP2040
//!
//! Two buttons race to score points on a shared 16x2 character display.
//! Each button is debounced by its own producer task, a shared arbiter lets
//! only one press be live at a time, and a single consumer merges both event
//! streams into the score.
//!
//! ## Architecture
//! - **Producers**: one debounce task per button, highest priorities
//! - **Arbiter**: exclusive token deciding the first responder of a press
//! - **Queues**: bounded, time-boxed channels, one per button
//! - **Consumer**: owns the scoreboard and the display, lowest priority
//! - **Supervisor**: launches the tasks, brings hardware up, opens the start gate, retires
//!
//! Everything except [`hardware`] is hardware independent and runs on the host
//! for tests.

#![cfg_attr(not(test), no_std)]

pub mod arbiter;
pub mod buttons;
pub mod channels;
pub mod config;
pub mod display;
pub mod error;
pub mod scoreboard;
pub mod supervisor;
pub mod types;

#[cfg(feature = "rp2040")]
pub mod hardware;
