// Licensed under the Apache-2.0 license

//! Interrupt-driven two-wire (TWI/I2C) master driver.
//!
//! The application side ([`TwoWire`]) queues address bytes, payload bytes and
//! receive counts in a [`TwiState`]; the interrupt side ([`BusController`])
//! advances the bus one event at a time from those queues. The two sides
//! share nothing but that state and the peripheral behind [`TwiHardware`].
//!
//! ```rust,no_run
//! use twowire_plus::common::NoOpLogger;
//! use twowire_plus::twi::{
//!     TwiConfig, TwiRegisterBlock, TwiState, TwoWire, ATMEGA328P_TWI_BASE,
//! };
//!
//! static STATE: TwiState = TwiState::new();
//! static TWI: TwiRegisterBlock = unsafe { TwiRegisterBlock::new(ATMEGA328P_TWI_BASE) };
//!
//! TWI.init(&TwiConfig::default()).ok();
//! let mut wire = TwoWire::new(&STATE, &TWI, NoOpLogger);
//! wire.begin_transmission(0x42);
//! wire.write(0x10);
//! let status = wire.end_transmission();
//! ```

pub mod common;
pub mod controller;
pub mod hal_impl;
pub mod register_block;
pub mod ring_buffer;
pub mod state;
pub mod status;
pub mod traits;
pub mod two_wire;

pub use common::{
    address_byte, ConfigurationError, Direction, I2cSpeed, Prescaler, TwiConfig,
    TwiConfigBuilder, RING_BUFFER_SIZE,
};
pub use controller::BusController;
pub use hal_impl::Error;
pub use register_block::{TwiRegisterBlock, ATMEGA328P_TWI_BASE};
pub use ring_buffer::{LastOperation, RingBuffer};
pub use state::TwiState;
pub use status::{classify, BusEvent};
pub use traits::{BusAction, TwiHardware};
pub use two_wire::TwoWire;
