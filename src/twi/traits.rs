// Licensed under the Apache-2.0 license

//! # TWI Hardware Abstraction
//!
//! The driver talks to the bus peripheral only through [`TwiHardware`]: a
//! register set that accepts one [`BusAction`] request at a time, a one-byte
//! data register, and a status code reported once per interrupt.
//!
//! Every method takes `&self`. The same peripheral is shared by the
//! transaction API (mainline) and the interrupt handler, so implementations
//! are expected to use interior mutability the way memory-mapped registers
//! already do (volatile single-byte accesses).
//!
//! ```text
//! TwoWire (mainline) ──┐                  ┌── BusController (ISR)
//!                      ├── &TwiHardware ──┤
//!                      └──── &TwiState ───┘
//! ```

use crate::twi::status::{self, BusEvent};

/// Low-level action requested from the bus peripheral.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusAction {
    /// Generate a START (or repeated START if the bus is still owned).
    Start,
    /// Generate a STOP and free the bus.
    Stop,
    /// Clear the interrupt flag and continue; the loaded data byte is sent,
    /// a received byte is acknowledged.
    Continue,
    /// Clear the interrupt flag and acknowledge the next received byte.
    Ack,
    /// Clear the interrupt flag and not-acknowledge the next received byte.
    Nack,
    /// Leave the interrupt flag set and hold the bus until the application
    /// queues more work.
    Release,
}

/// Register/action interface of a two-wire bus peripheral.
///
/// # Examples
///
/// ```rust,no_run
/// use twowire_plus::twi::{BusAction, TwiHardware};
///
/// fn kick<H: TwiHardware>(hw: &H, byte: u8) {
///     hw.write_data(byte);
///     hw.request(BusAction::Continue);
/// }
/// ```
pub trait TwiHardware {
    /// Raw status code of the most recent bus event.
    fn status(&self) -> u8;

    fn read_data(&self) -> u8;

    fn write_data(&self, byte: u8);

    /// Program the control register. Exactly one request is issued per
    /// interrupt invocation.
    fn request(&self, action: BusAction);

    /// True while a requested STOP has not yet appeared on the bus.
    fn stop_pending(&self) -> bool;

    /// Decode a status code into a protocol event. Backends with a different
    /// status encoding override this.
    fn classify(&self, status: u8) -> BusEvent {
        status::classify(status)
    }
}
