//! RP2040 board support
//!
//! This module binds the hardware-independent core to the Raspberry Pi Pico:
//! button sampling, the ST7735 panel behind the character display, one-time
//! bring-up, and the executor tasks the supervisor launches.

use core::cell::RefCell;

use defmt::*;
use embassy_executor::{SendSpawner, Spawner};
use embassy_rp::gpio::{Flex, Level, Output, Pull};
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Config as SpiConfig, Spi};
use embassy_rp::Peripherals;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use st7735_lcd::{Orientation, ST7735};

use crate::buttons::{ActiveLowButton, ButtonSampler, DebounceProducer};
use crate::channels::Resources;
use crate::config::{
    Timing, BUTTON_A_PIN, BUTTON_B_PIN, DISPLAY_CS_PIN, DISPLAY_DC_PIN, DISPLAY_HEIGHT, DISPLAY_RST_PIN, DISPLAY_WIDTH,
    SPI_BAUDRATE, SPI_MOSI_PIN, SPI_SCK_PIN, STATUS_PIN,
};
use crate::display::TextLcd;
use crate::error::Error;
use crate::scoreboard::ScoreboardConsumer;
use crate::supervisor::{BringUp, TaskLauncher};
use crate::types::{ButtonLevel, ChannelId, PinMode, TaskRole};

// ===================================================================
// Shared State
// ===================================================================

type DisplaySpi = ExclusiveDevice<Spi<'static, SPI0, Blocking>, Output<'static>, Delay>;

/// ST7735 panel on SPI0
pub type Panel = ST7735<DisplaySpi, Output<'static>, Output<'static>>;

/// Queues, arbiter and start gate shared by every task
pub static RESOURCES: Resources<CriticalSectionRawMutex> = Resources::new();

// Filled by bring-up; sampled from both producer priorities
static BUTTONS: BlockingMutex<CriticalSectionRawMutex, RefCell<Option<[ActiveLowButton<Flex<'static>>; 2]>>> =
    BlockingMutex::new(RefCell::new(None));

// Hands the initialized panel from bring-up to the consumer
static PANEL: Signal<CriticalSectionRawMutex, Panel> = Signal::new();

// ===================================================================
// Hardware Sampler
// ===================================================================

/// Reads one channel's button once bring-up has configured the inputs
pub struct BoardButton(pub ChannelId);

impl ButtonSampler for BoardButton {
    fn read_level(&mut self) -> ButtonLevel {
        let index = match self.0 {
            ChannelId::A => 0,
            ChannelId::B => 1,
        };
        BUTTONS.lock(|buttons| match buttons.borrow_mut().as_mut() {
            Some(buttons) => buttons[index].read_level(),
            None => ButtonLevel::Released,
        })
    }
}

// ===================================================================
// Bring-up
// ===================================================================

pub struct BoardBringUp {
    buttons: Option<[Flex<'static>; 2]>,
    status: Flex<'static>,
    panel: Option<Panel>,
}

impl BoardBringUp {
    /// Claim every pin the game uses. Nothing is configured yet.
    pub fn new(p: Peripherals) -> Self {
        let mut spi_config = SpiConfig::default();
        spi_config.frequency = SPI_BAUDRATE;
        let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config);
        let cs = Output::new(p.PIN_17, Level::High);
        let dc = Output::new(p.PIN_14, Level::Low);
        let rst = Output::new(p.PIN_15, Level::High);

        let panel = ExclusiveDevice::new(spi, cs, Delay)
            .ok()
            .map(|device| ST7735::new(device, dc, rst, true, false, DISPLAY_WIDTH, DISPLAY_HEIGHT));

        Self {
            buttons: Some([Flex::new(p.PIN_4), Flex::new(p.PIN_5)]),
            status: Flex::new(p.PIN_13),
            panel,
        }
    }
}

impl BringUp for BoardBringUp {
    fn initialize_input_hardware(&mut self) -> Result<(), Error> {
        let [mut a, mut b] = self.buttons.take().ok_or(Error::InputInit)?;
        for pin in [&mut a, &mut b] {
            pin.set_as_input();
            pin.set_pull(Pull::Up);
        }
        BUTTONS.lock(|buttons| buttons.replace(Some([ActiveLowButton::new(a), ActiveLowButton::new(b)])));
        info!("Button inputs ready on GPIO{} / GPIO{}", BUTTON_A_PIN, BUTTON_B_PIN);
        Ok(())
    }

    fn initialize_display(&mut self) -> Result<(), Error> {
        let mut panel = self.panel.take().ok_or(Error::DisplayInit)?;
        panel.init(&mut Delay).map_err(|_| Error::DisplayInit)?;
        panel
            .set_orientation(&Orientation::Landscape)
            .map_err(|_| Error::DisplayInit)?;
        PANEL.signal(panel);
        info!(
            "Display ready ({}x{}): SCK={} MOSI={} CS={} DC={} RST={}",
            DISPLAY_WIDTH, DISPLAY_HEIGHT, SPI_SCK_PIN, SPI_MOSI_PIN, DISPLAY_CS_PIN, DISPLAY_DC_PIN, DISPLAY_RST_PIN
        );
        Ok(())
    }

    fn configure_output_pin(&mut self, pin: u8, mode: PinMode) -> Result<(), Error> {
        if pin != STATUS_PIN {
            return Err(Error::PinConfig(pin));
        }
        match mode {
            PinMode::Output => {
                self.status.set_low();
                self.status.set_as_output();
            }
            PinMode::Input => self.status.set_as_input(),
        }
        Ok(())
    }
}

// ===================================================================
// Tasks
// ===================================================================

#[embassy_executor::task(pool_size = 2)]
async fn debounce_task(channel: ChannelId) {
    DebounceProducer::new(channel, BoardButton(channel), &RESOURCES, Timing::DEFAULT)
        .run()
        .await
}

#[embassy_executor::task]
async fn scoreboard_task() {
    RESOURCES.gate.wait_logged("Scoreboard", Timing::DEFAULT.gate_poll).await;
    let panel = match PANEL.try_take() {
        Some(panel) => panel,
        None => PANEL.wait().await,
    };
    ScoreboardConsumer::new(TextLcd::new(panel), &RESOURCES, Timing::DEFAULT)
        .run()
        .await
}

/// Channel A and B run on their own interrupt executors, above the consumer
pub struct BoardLauncher {
    channel_a: SendSpawner,
    channel_b: SendSpawner,
    consumer: Spawner,
}

impl BoardLauncher {
    pub fn new(channel_a: SendSpawner, channel_b: SendSpawner, consumer: Spawner) -> Self {
        Self {
            channel_a,
            channel_b,
            consumer,
        }
    }
}

impl TaskLauncher for BoardLauncher {
    fn launch(&mut self, role: TaskRole) -> Result<(), Error> {
        let spawned = match role {
            TaskRole::ChannelA => self.channel_a.spawn(debounce_task(ChannelId::A)),
            TaskRole::ChannelB => self.channel_b.spawn(debounce_task(ChannelId::B)),
            TaskRole::Consumer => self.consumer.spawn(scoreboard_task()),
        };
        spawned.map_err(|e| {
            error!("Failed to spawn {:?}: {:?}", role, e);
            Error::Spawn(role)
        })
    }
}
