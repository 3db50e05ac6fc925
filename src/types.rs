//! Common types and data structures used across the Duelboard application
//!
//! This module contains the closed set of identities and events that flow
//! between the producer tasks, the arbiter and the scoreboard consumer.

use crate::config::{PLAYER_ONE_WIN_MESSAGE, PLAYER_TWO_WIN_MESSAGE};

/// One of the two input channels (a physical button plus its pipeline)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelId {
    A,
    B,
}

impl ChannelId {
    /// The player credited when this channel reports a press
    pub const fn player(self) -> Player {
        match self {
            ChannelId::A => Player::One,
            ChannelId::B => Player::Two,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ChannelId::A => "A",
            ChannelId::B => "B",
        }
    }
}

/// Raw, undebounced level reported by the hardware sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonLevel {
    Pressed,
    Released,
}

impl ButtonLevel {
    pub const fn is_pressed(self) -> bool {
        matches!(self, ButtonLevel::Pressed)
    }
}

impl From<bool> for ButtonLevel {
    fn from(pressed: bool) -> Self {
        if pressed {
            ButtonLevel::Pressed
        } else {
            ButtonLevel::Released
        }
    }
}

/// Message carried from a debounce producer to the scoreboard consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// A confirmed press while holding the arbiter
    Pressed,
    /// The physical press ended
    Released,
    /// Heartbeat, nothing happened this cycle
    Idle,
}

/// Scoreboard seat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub const fn win_message(self) -> &'static str {
        match self {
            Player::One => PLAYER_ONE_WIN_MESSAGE,
            Player::Two => PLAYER_TWO_WIN_MESSAGE,
        }
    }
}

/// Direction requested for a GPIO during bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Input,
    Output,
}

/// Long-lived tasks the supervisor starts, listed highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskRole {
    ChannelA,
    ChannelB,
    Consumer,
}

impl TaskRole {
    /// Launch order, which is also descending scheduling priority
    pub const LAUNCH_ORDER: [TaskRole; 3] = [TaskRole::ChannelA, TaskRole::ChannelB, TaskRole::Consumer];

    pub const fn channel(self) -> Option<ChannelId> {
        match self {
            TaskRole::ChannelA => Some(ChannelId::A),
            TaskRole::ChannelB => Some(ChannelId::B),
            TaskRole::Consumer => None,
        }
    }
}

/// Application version, taken from the package manifest
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_map_to_their_players() {
        assert_eq!(ChannelId::A.player(), Player::One);
        assert_eq!(ChannelId::B.player(), Player::Two);
        assert_eq!(Player::One.opponent(), Player::Two);
    }

    #[test]
    fn launch_order_puts_input_before_rendering() {
        assert_eq!(TaskRole::LAUNCH_ORDER[0].channel(), Some(ChannelId::A));
        assert_eq!(TaskRole::LAUNCH_ORDER[1].channel(), Some(ChannelId::B));
        assert_eq!(TaskRole::LAUNCH_ORDER[2].channel(), None);
    }

    #[test]
    fn version_comes_from_the_manifest() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(APP_VERSION.split('.').count(), 3);
    }

    #[test]
    fn level_from_bool() {
        assert_eq!(ButtonLevel::from(true), ButtonLevel::Pressed);
        assert!(!ButtonLevel::from(false).is_pressed());
    }
}
