use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The status byte returned by `READ_STATUS` and most other commands.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct ChipStatus: u8 {
        /// A chip erase is in progress.
        const CHIP_ERASE_BUSY = 0x80;
        /// The CPU is in idle mode.
        const PCON_IDLE = 0x40;
        /// The CPU is halted.
        const CPU_HALTED = 0x20;
        /// The power mode is 0.
        const PM_ACTIVE = 0x10;
        /// The CPU was halted by a breakpoint or a HALT command.
        const HALT_STATUS = 0x08;
        /// The debug lock bit is set.
        const DEBUG_LOCKED = 0x04;
        /// The oscillators are stable.
        const OSCILLATOR_STABLE = 0x02;
        /// The stack pointer overflowed.
        const STACK_OVERFLOW = 0x01;
    }
}

bitflags! {
    /// The debug configuration byte.
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct DebugConfig: u8 {
        /// Let the chip enter power modes while debugging.
        const SOFT_POWER_MODE = 0x20;
        /// Stop the timers while the CPU is halted.
        const TIMERS_OFF = 0x08;
        /// Pause DMA transfers while the CPU is halted.
        const DMA_PAUSE = 0x04;
        /// Suspend the timers while the CPU is halted.
        const TIMER_SUSPEND = 0x02;
    }
}

impl DebugConfig {
    /// The configuration used for flash programming. DMA must not be paused
    /// since the flash write is driven by DMA while the CPU is halted.
    pub const PROGRAMMING: DebugConfig =
        DebugConfig::SOFT_POWER_MODE.union(DebugConfig::TIMER_SUSPEND);
}

/// The answer to `GET_CHIP_ID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipId {
    /// The chip ID.
    pub id: u8,
    /// The silicon revision.
    pub revision: u8,
}

impl ChipId {
    /// A floating or shorted DD line reads as all zeros or all ones.
    pub fn is_readable(&self) -> bool {
        !matches!(self.id, 0x00 | 0xFF)
    }

    /// The chip family, if the ID is a known one.
    pub fn family(&self) -> Option<ChipFamily> {
        ChipFamily::from_id(self.id)
    }
}

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.family() {
            Some(family) => write!(
                f,
                "{} (ID {:#04x}, revision {:#04x})",
                family, self.id, self.revision
            ),
            None => write!(
                f,
                "unknown chip (ID {:#04x}, revision {:#04x})",
                self.id, self.revision
            ),
        }
    }
}

/// Chips using the same debug interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ChipFamily {
    CC2530,
    CC2531,
    CC2533,
    CC2540,
    CC2541,
    CC2510,
    CC2511,
    CC1110,
    CC2430,
    CC2431,
}

impl ChipFamily {
    /// Look up the family of a chip ID.
    pub fn from_id(id: u8) -> Option<Self> {
        let family = match id {
            0xA5 => ChipFamily::CC2530,
            0xB5 => ChipFamily::CC2531,
            0x95 => ChipFamily::CC2533,
            0x8D => ChipFamily::CC2540,
            0x41 => ChipFamily::CC2541,
            0x81 => ChipFamily::CC2510,
            0x91 => ChipFamily::CC2511,
            0x01 => ChipFamily::CC1110,
            0x85 => ChipFamily::CC2430,
            0x89 => ChipFamily::CC2431,
            _ => return None,
        };
        Some(family)
    }
}

impl fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;

    #[test]
    fn programming_config_is_0x22() {
        assert_eq!(DebugConfig::PROGRAMMING.bits(), 0x22);
        assert!(!DebugConfig::PROGRAMMING.contains(DebugConfig::DMA_PAUSE));
    }

    #[test_case(0x00, false)]
    #[test_case(0xFF, false)]
    #[test_case(0xA5, true)]
    #[test_case(0x42, true; "unknown but readable")]
    fn readable_ids(id: u8, readable: bool) {
        assert_eq!(ChipId { id, revision: 0 }.is_readable(), readable);
    }

    #[test]
    fn display_names_family() {
        let id = ChipId {
            id: 0xA5,
            revision: 0x21,
        };
        assert_eq!(id.to_string(), "CC2530 (ID 0xa5, revision 0x21)");
    }
}
