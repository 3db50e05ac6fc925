//! Fatal start-up errors
//!
//! Timeouts on queues and on the arbiter are expected and are reported as
//! `bool`/`Option`. Only bring-up can fail hard, and only the supervisor sees it.

use core::fmt;

use crate::types::TaskRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Button inputs could not be configured
    InputInit,
    /// Display controller did not come up
    DisplayInit,
    /// A GPIO could not be switched to the requested mode
    PinConfig(u8),
    /// The executor refused to start a task
    Spawn(TaskRole),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputInit => f.write_str("button input initialization failed"),
            Error::DisplayInit => f.write_str("display initialization failed"),
            Error::PinConfig(pin) => write!(f, "could not configure GPIO {}", pin),
            Error::Spawn(role) => write!(f, "could not spawn {:?} task", role),
        }
    }
}

impl core::error::Error for Error {}
