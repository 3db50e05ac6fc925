//! Scoreboard consumer
//!
//! Merges the two event queues into one game state and renders it. The
//! [`Scoreboard`] is owned by the consumer task alone; producers only reach
//! it through their queues, so it needs no lock.

use defmt_or_log as log;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Timer;

use crate::channels::Resources;
use crate::config::{Timing, CONGRATS_MESSAGE, PLAYER_ONE_LABEL, PLAYER_TWO_LABEL, WIN_SCORE};
use crate::display::CharacterDisplay;
use crate::types::{ButtonEvent, ChannelId, Player};

// ===================================================================
// Game State
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scoreboard {
    player_one: u8,
    player_two: u8,
    round_flag: bool,
}

impl Scoreboard {
    pub const fn new() -> Self {
        Self {
            player_one: 0,
            player_two: 0,
            round_flag: false,
        }
    }

    pub fn score(&self, player: Player) -> u8 {
        match player {
            Player::One => self.player_one,
            Player::Two => self.player_two,
        }
    }

    pub fn scores(&self) -> (u8, u8) {
        (self.player_one, self.player_two)
    }

    /// Set after a win; the next press clears the display before drawing
    pub fn round_flag(&self) -> bool {
        self.round_flag
    }

    /// Leader once a score hits the win threshold, player one checked first
    pub fn winner(&self) -> Option<Player> {
        if self.player_one >= WIN_SCORE {
            Some(Player::One)
        } else if self.player_two >= WIN_SCORE {
            Some(Player::Two)
        } else {
            None
        }
    }

    /// Credit `player` and take a point from the opponent if they have one.
    ///
    /// Returns `true` when this is the first update of a new round.
    pub fn record_press(&mut self, player: Player) -> bool {
        let first_of_round = core::mem::take(&mut self.round_flag);
        let (own, other) = match player {
            Player::One => (&mut self.player_one, &mut self.player_two),
            Player::Two => (&mut self.player_two, &mut self.player_one),
        };
        *own = own.saturating_add(1).min(WIN_SCORE);
        *other = other.saturating_sub(1);
        first_of_round
    }

    pub fn start_new_round(&mut self) {
        self.player_one = 0;
        self.player_two = 0;
        self.round_flag = true;
    }
}

/// What one consumer cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// The win banner was shown and the round reset; queues were not read
    RoundWon(Player),
    /// At least one press changed the score
    Updated,
    /// Heartbeats, releases or nothing at all
    Unchanged,
}

// ===================================================================
// Consumer Task
// ===================================================================

pub struct ScoreboardConsumer<'a, M: RawMutex, D: CharacterDisplay> {
    board: Scoreboard,
    display: D,
    resources: &'a Resources<M>,
    timing: Timing,
}

impl<'a, M: RawMutex, D: CharacterDisplay> ScoreboardConsumer<'a, M, D> {
    pub fn new(display: D, resources: &'a Resources<M>, timing: Timing) -> Self {
        Self {
            board: Scoreboard::new(),
            display,
            resources,
            timing,
        }
    }

    pub fn board(&self) -> &Scoreboard {
        &self.board
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        if let Some(winner) = self.board.winner() {
            log::info!("Round won by {:?}", winner);
            self.render_banner(winner);
            Timer::after(self.timing.win_hold).await;
            self.board.start_new_round();
            self.display.clear();
            return CycleOutcome::RoundWon(winner);
        }

        let a = self.resources.queue_a.receive(self.timing.receive_timeout).await;
        let b = self.resources.queue_b.receive(self.timing.receive_timeout).await;

        // Channel A is always evaluated first
        let mut outcome = CycleOutcome::Unchanged;
        for (channel, event) in [(ChannelId::A, a), (ChannelId::B, b)] {
            if event != Some(ButtonEvent::Pressed) {
                continue;
            }
            if self.board.winner().is_some() {
                log::debug!("Round already decided, press on {} ignored", channel.name());
                continue;
            }
            self.score(channel.player());
            outcome = CycleOutcome::Updated;
        }

        Timer::after(self.timing.consumer_cycle).await;
        outcome
    }

    fn score(&mut self, player: Player) {
        if self.board.record_press(player) {
            self.display.clear();
        }
        let (one, two) = self.board.scores();
        log::debug!("Score {} : {}", one, two);
        self.render_scores();
    }

    fn render_scores(&mut self) {
        let (one, two) = self.board.scores();
        self.display.write_at(0, 0, PLAYER_ONE_LABEL);
        self.write_score(one);
        self.display.write_at(1, 0, PLAYER_TWO_LABEL);
        self.write_score(two);
    }

    fn write_score(&mut self, score: u8) {
        self.display.write_char(char::from(b'0' + score / 10 % 10));
        self.display.write_char(char::from(b'0' + score % 10));
    }

    fn render_banner(&mut self, winner: Player) {
        self.display.clear();
        self.display.write_text(CONGRATS_MESSAGE);
        self.display.write_at(1, 0, winner.win_message());
    }

    /// Wait for bring-up, then refresh forever
    pub async fn run(mut self) -> ! {
        self.resources.gate.wait_logged("Scoreboard", self.timing.gate_poll).await;
        Timer::after(self.timing.consumer_start).await;
        log::info!("Scoreboard consumer started");

        loop {
            self.cycle().await;
        }
    }
}
