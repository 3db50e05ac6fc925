//! Hardware and timing configuration for Duelboard
//! RP2040-based two-player button duel with a 16x2 character scoreboard

use embassy_time::Duration;

// ===================================================================
// Game Rules
// ===================================================================

pub const WIN_SCORE: u8 = 50; // First player to reach this wins the round
pub const PLAYER_ONE_LABEL: &str = "Player One ";
pub const PLAYER_TWO_LABEL: &str = "Player Two ";
pub const CONGRATS_MESSAGE: &str = "Congratulations";
pub const PLAYER_ONE_WIN_MESSAGE: &str = "Player 1 Won";
pub const PLAYER_TWO_WIN_MESSAGE: &str = "Player 2 Won";

// ===================================================================
// Event Pipeline
// ===================================================================

pub const QUEUE_CAPACITY: usize = 3; // Events buffered per channel
pub const START_GATE_WAITERS: usize = 3; // Producers A/B plus the consumer

// ===================================================================
// Task Timing (milliseconds)
// ===================================================================

pub const DEBOUNCE_MS: u64 = 10; // Raw level must hold this long to be trusted
pub const PRODUCER_CYCLE_MS: u64 = 20; // Producer sampling cadence
pub const ARBITER_TIMEOUT_MS: u64 = 10; // Bounded wait for the press arbiter
pub const SEND_TIMEOUT_MS: u64 = 100; // Bounded wait for queue space
pub const RECEIVE_TIMEOUT_MS: u64 = 10; // Bounded wait for a queued event
pub const CONSUMER_CYCLE_MS: u64 = 20; // Scoreboard refresh cadence
pub const WIN_HOLD_MS: u64 = 5000; // How long the win banner stays up
pub const GATE_POLL_MS: u64 = 500; // Re-check interval while waiting for bring-up

// Startup stagger after bring-up completes
pub const CHANNEL_A_START_DELAY_MS: u64 = 50;
pub const CHANNEL_B_START_DELAY_MS: u64 = 60;
pub const CONSUMER_START_DELAY_MS: u64 = 100;

// ===================================================================
// GPIO Pin Assignments - Raspberry Pi Pico
// ===================================================================

pub const BUTTON_A_PIN: u8 = 4; // Player one button, active low with pull-up
pub const BUTTON_B_PIN: u8 = 5; // Player two button, active low with pull-up
pub const STATUS_PIN: u8 = 13; // Configured as output during bring-up

// SPI Display Interface
pub const SPI_MOSI_PIN: u8 = 19;
pub const SPI_SCK_PIN: u8 = 18;
pub const SPI_BAUDRATE: u32 = 10_000_000; // 10MHz SPI clock
pub const DISPLAY_CS_PIN: u8 = 17;
pub const DISPLAY_DC_PIN: u8 = 14;
pub const DISPLAY_RST_PIN: u8 = 15;

// ===================================================================
// Display Geometry
// ===================================================================

pub const LCD_ROWS: usize = 2; // Character rows
pub const LCD_COLS: usize = 16; // Characters per row
pub const DISPLAY_WIDTH: u32 = 160; // ST7735 panel in landscape
pub const DISPLAY_HEIGHT: u32 = 128;
pub const GLYPH_WIDTH: u32 = 10; // FONT_10X20
pub const GLYPH_HEIGHT: u32 = 20;

/// Every fixed interval the tasks wait on.
///
/// The firmware always runs with [`Timing::DEFAULT`]; tests build shorter
/// variants so whole rounds finish in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub debounce: Duration,
    pub producer_cycle: Duration,
    pub arbiter_timeout: Duration,
    pub send_timeout: Duration,
    pub receive_timeout: Duration,
    pub consumer_cycle: Duration,
    pub win_hold: Duration,
    pub gate_poll: Duration,
    pub channel_a_start: Duration,
    pub channel_b_start: Duration,
    pub consumer_start: Duration,
}

impl Timing {
    pub const DEFAULT: Timing = Timing {
        debounce: Duration::from_millis(DEBOUNCE_MS),
        producer_cycle: Duration::from_millis(PRODUCER_CYCLE_MS),
        arbiter_timeout: Duration::from_millis(ARBITER_TIMEOUT_MS),
        send_timeout: Duration::from_millis(SEND_TIMEOUT_MS),
        receive_timeout: Duration::from_millis(RECEIVE_TIMEOUT_MS),
        consumer_cycle: Duration::from_millis(CONSUMER_CYCLE_MS),
        win_hold: Duration::from_millis(WIN_HOLD_MS),
        gate_poll: Duration::from_millis(GATE_POLL_MS),
        channel_a_start: Duration::from_millis(CHANNEL_A_START_DELAY_MS),
        channel_b_start: Duration::from_millis(CHANNEL_B_START_DELAY_MS),
        consumer_start: Duration::from_millis(CONSUMER_START_DELAY_MS),
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}
