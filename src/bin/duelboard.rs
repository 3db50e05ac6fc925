//! Duelboard - RP2040 firmware
//!
//! Priorities follow the input-before-rendering rule:
//! - Channel A producer: interrupt executor on SWI_IRQ_1 (P1)
//! - Channel B producer: interrupt executor on SWI_IRQ_0 (P2)
//! - Scoreboard consumer: thread-mode executor
//!
//! The supervisor runs once inside the thread executor's init closure and is
//! gone before the first scoreboard cycle.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use defmt::*;
use defmt_rtt as _;
use embassy_executor::{Executor, InterruptExecutor};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use panic_halt as _;
use static_cell::StaticCell;

use duelboard::hardware::{BoardBringUp, BoardLauncher, RESOURCES};
use duelboard::supervisor::Supervisor;

static EXECUTOR_A: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_B: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_LOW: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_A.on_interrupt()
}

#[interrupt]
unsafe fn SWI_IRQ_0() {
    EXECUTOR_B.on_interrupt()
}

#[entry]
fn main() -> ! {
    let p = embassy_rp::init(Default::default());

    let supervisor = Supervisor::new(&RESOURCES);
    supervisor.print_startup_banner();
    let mut bring_up = BoardBringUp::new(p);

    interrupt::SWI_IRQ_1.set_priority(Priority::P1);
    let channel_a = EXECUTOR_A.start(interrupt::SWI_IRQ_1);
    interrupt::SWI_IRQ_0.set_priority(Priority::P2);
    let channel_b = EXECUTOR_B.start(interrupt::SWI_IRQ_0);

    let executor = EXECUTOR_LOW.init(Executor::new());
    executor.run(move |consumer| {
        let mut launcher = BoardLauncher::new(channel_a, channel_b, consumer);
        match supervisor.run(&mut launcher, &mut bring_up) {
            Ok(report) => info!("Supervisor retired after launching {} tasks", report.launched.len()),
            Err(e) => {
                error!("Bring-up failed: {}", e);
                core::panic!("Bring-up failed");
            }
        }
    })
}
