//! Lifecycle supervisor
//!
//! Run once at boot: start the producers and the consumer in priority order,
//! bring the hardware up, open the start gate, and retire. The steady-state
//! tasks sit behind the gate until then, so none of them can observe a
//! half-initialized board.

use defmt_or_log as log;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use crate::channels::Resources;
use crate::config::{LCD_COLS, LCD_ROWS, QUEUE_CAPACITY, STATUS_PIN, WIN_SCORE};
use crate::error::Error;
use crate::types::{PinMode, TaskRole, APP_VERSION};

/// One-time hardware initialization performed by the supervisor
pub trait BringUp {
    fn initialize_input_hardware(&mut self) -> Result<(), Error>;
    fn initialize_display(&mut self) -> Result<(), Error>;
    fn configure_output_pin(&mut self, pin: u8, mode: PinMode) -> Result<(), Error>;
}

/// Starts one long-lived task on the executor matching its priority
pub trait TaskLauncher {
    fn launch(&mut self, role: TaskRole) -> Result<(), Error>;
}

/// What the supervisor did before retiring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BringUpReport {
    pub launched: Vec<TaskRole, 3>,
}

pub struct Supervisor<'a, M: RawMutex> {
    resources: &'a Resources<M>,
}

impl<'a, M: RawMutex> Supervisor<'a, M> {
    pub fn new(resources: &'a Resources<M>) -> Self {
        Self { resources }
    }

    /// Print application startup banner with game information
    pub fn print_startup_banner(&self) {
        log::info!("========================================");
        log::info!("Duelboard v{}", APP_VERSION);
        log::info!("Two-player button duel");
        log::info!("========================================");
        log::info!("Hardware: RP2040 (Raspberry Pi Pico)");
        log::info!("Display: {}x{} characters", LCD_COLS, LCD_ROWS);
        log::info!("Queue capacity: {} events per channel", QUEUE_CAPACITY);
        log::info!("Win score: {}", WIN_SCORE);
        log::info!("========================================");
    }

    /// Launch every task, bring the hardware up, and open the gate.
    ///
    /// Consumes the supervisor. On error the gate stays closed and the
    /// caller decides how to restart.
    pub fn run<L, B>(self, launcher: &mut L, hardware: &mut B) -> Result<BringUpReport, Error>
    where
        L: TaskLauncher,
        B: BringUp,
    {
        let mut launched = Vec::new();
        for role in TaskRole::LAUNCH_ORDER {
            launcher.launch(role)?;
            log::debug!("Launched {:?} task", role);
            // LAUNCH_ORDER has exactly as many entries as the vector holds
            let _ = launched.push(role);
        }

        log::info!("Initializing hardware...");
        hardware.initialize_input_hardware()?;
        hardware.initialize_display()?;
        hardware.configure_output_pin(STATUS_PIN, PinMode::Output)?;

        self.resources.gate.open();
        log::info!("Duelboard initialized successfully, supervisor retiring");

        Ok(BringUpReport { launched })
    }
}
