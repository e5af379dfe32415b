// Licensed under the Apache-2.0 license

//! Common types and constants for the TWI driver modules.
//!
//! This module provides the bus configuration (speed, CPU clock, prescaler),
//! the bit-rate computation derived from it, and the address/direction
//! encoding shared by the transaction API and the interrupt handler.

use embedded_hal::i2c::SevenBitAddress;
use fugit::HertzU32;

/// Ring buffer capacity used when none is specified.
pub const RING_BUFFER_SIZE: usize = 16;

/// Data direction carried in the R/W bit of the address byte.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Build the SLA+R/W byte for a 7-bit slave address.
#[must_use]
pub const fn address_byte(address: SevenBitAddress, direction: Direction) -> u8 {
    ((address & 0x7f) << 1) | direction as u8
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 1_000_000,
}

impl I2cSpeed {
    #[must_use]
    pub const fn hertz(self) -> HertzU32 {
        HertzU32::from_raw(self as u32)
    }
}

/// TWI clock prescaler, encoded in the low two bits of the status register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Prescaler {
    Div1 = 0b00,
    Div4 = 0b01,
    Div16 = 0b10,
    Div64 = 0b11,
}

impl Prescaler {
    /// Mask of the prescaler bits in the status register.
    pub const MASK: u8 = 0b11;

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn factor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div4 => 4,
            Prescaler::Div16 => 16,
            Prescaler::Div64 => 64,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The CPU clock is too slow for the requested SCL frequency.
    SpeedTooHigh,
    /// The bit-rate register cannot divide the CPU clock down far enough.
    SpeedTooLow,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TwiConfig {
    pub speed: I2cSpeed,
    pub cpu_frequency: HertzU32,
    pub prescaler: Prescaler,
}

impl Default for TwiConfig {
    fn default() -> Self {
        TwiConfigBuilder::new().build()
    }
}

impl TwiConfig {
    /// Bit-rate register value for this configuration.
    ///
    /// `SCL = F_CPU / (16 + 2 * TWBR * prescale)`, solved for `TWBR`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] when the result does not fit the 8-bit
    /// bit-rate register.
    pub fn bit_rate(&self) -> Result<u8, ConfigurationError> {
        let divider = self.cpu_frequency.raw() / self.speed.hertz().raw();
        let stretch = divider
            .checked_sub(16)
            .ok_or(ConfigurationError::SpeedTooHigh)?;
        let twbr = stretch / (2 * self.prescaler.factor());
        u8::try_from(twbr).map_err(|_| ConfigurationError::SpeedTooLow)
    }

    /// SCL frequency actually produced by [`TwiConfig::bit_rate`].
    ///
    /// # Errors
    ///
    /// Propagates the error from [`TwiConfig::bit_rate`].
    pub fn scl_frequency(&self) -> Result<HertzU32, ConfigurationError> {
        let twbr = u32::from(self.bit_rate()?);
        let divider = 16 + 2 * twbr * self.prescaler.factor();
        Ok(HertzU32::from_raw(self.cpu_frequency.raw() / divider))
    }
}

pub struct TwiConfigBuilder {
    speed: I2cSpeed,
    cpu_frequency: HertzU32,
    prescaler: Prescaler,
}

impl Default for TwiConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TwiConfigBuilder {
    /// Standard mode on a 16 MHz part with the smallest prescaler, which
    /// gives the highest reachable SCL frequency.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            speed: I2cSpeed::Standard,
            cpu_frequency: HertzU32::from_raw(16_000_000),
            prescaler: Prescaler::Div1,
        }
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn cpu_frequency(mut self, frequency: HertzU32) -> Self {
        self.cpu_frequency = frequency;
        self
    }
    #[must_use]
    pub fn prescaler(mut self, prescaler: Prescaler) -> Self {
        self.prescaler = prescaler;
        self
    }
    #[must_use]
    pub fn build(self) -> TwiConfig {
        TwiConfig {
            speed: self.speed,
            cpu_frequency: self.cpu_frequency,
            prescaler: self.prescaler,
        }
    }
}
