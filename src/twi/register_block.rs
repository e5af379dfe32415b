// Licensed under the Apache-2.0 license

//! Memory-mapped AVR TWI peripheral.
//!
//! Five consecutive byte registers starting at the base address:
//!
//! | offset | register | use                                      |
//! |--------|----------|------------------------------------------|
//! | 0      | `TWBR`   | bit rate                                 |
//! | 1      | `TWSR`   | status (bits 7..3), prescaler (bits 1..0) |
//! | 2      | `TWAR`   | own slave address, unused in master mode |
//! | 3      | `TWDR`   | data                                     |
//! | 4      | `TWCR`   | control                                  |

use core::ptr;

use crate::twi::common::{ConfigurationError, Prescaler, TwiConfig};
use crate::twi::status::STATUS_MASK;
use crate::twi::traits::{BusAction, TwiHardware};

/// Data-space address of the TWI block on the ATmega328P.
pub const ATMEGA328P_TWI_BASE: usize = 0xb8;

const TWBR: usize = 0;
const TWSR: usize = 1;
const TWDR: usize = 3;
const TWCR: usize = 4;

/// Control register bits.
pub mod twcr {
    pub const TWIE: u8 = 1 << 0;
    pub const TWEN: u8 = 1 << 2;
    pub const TWWC: u8 = 1 << 3;
    pub const TWSTO: u8 = 1 << 4;
    pub const TWSTA: u8 = 1 << 5;
    pub const TWEA: u8 = 1 << 6;
    pub const TWINT: u8 = 1 << 7;
}

impl BusAction {
    /// Control register value carrying out this action.
    #[must_use]
    pub const fn control_word(self) -> u8 {
        use twcr::{TWEA, TWEN, TWIE, TWINT, TWSTA, TWSTO};
        match self {
            BusAction::Start => TWINT | TWEA | TWSTA | TWEN | TWIE,
            BusAction::Stop => TWINT | TWEA | TWSTO | TWEN | TWIE,
            BusAction::Continue | BusAction::Ack => TWINT | TWEA | TWEN | TWIE,
            BusAction::Nack => TWINT | TWEN | TWIE,
            BusAction::Release => TWEA | TWEN,
        }
    }
}

pub struct TwiRegisterBlock {
    base: usize,
}

impl TwiRegisterBlock {
    /// # Safety
    ///
    /// `base` must be the address of a TWI register block (or of at least
    /// five writable bytes) valid for as long as this value is used, and no
    /// other code may drive the same peripheral.
    #[must_use]
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Program the bit rate and prescaler and enable the peripheral with its
    /// interrupt.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the requested speed is out of reach.
    pub fn init(&self, config: &TwiConfig) -> Result<(), ConfigurationError> {
        let twbr = config.bit_rate()?;
        let twsr = self.read(TWSR) & !Prescaler::MASK;
        self.write(TWSR, twsr | config.prescaler.bits());
        self.write(TWBR, twbr);
        self.write(TWCR, twcr::TWEN | twcr::TWIE | twcr::TWEA);
        Ok(())
    }

    fn read(&self, offset: usize) -> u8 {
        // SAFETY: `new` guarantees the block is valid.
        unsafe { ptr::read_volatile((self.base + offset) as *const u8) }
    }

    fn write(&self, offset: usize, value: u8) {
        // SAFETY: `new` guarantees the block is valid.
        unsafe { ptr::write_volatile((self.base + offset) as *mut u8, value) }
    }
}

impl TwiHardware for TwiRegisterBlock {
    fn status(&self) -> u8 {
        self.read(TWSR) & STATUS_MASK
    }

    fn read_data(&self) -> u8 {
        self.read(TWDR)
    }

    fn write_data(&self, byte: u8) {
        self.write(TWDR, byte);
    }

    fn request(&self, action: BusAction) {
        self.write(TWCR, action.control_word());
    }

    fn stop_pending(&self) -> bool {
        self.read(TWCR) & twcr::TWSTO != 0
    }
}
