// Licensed under the Apache-2.0 license

//! Bus status codes and their classification into protocol events.
//!
//! The interrupt handler never matches on raw numbers. A peripheral backend
//! reports the raw status byte (kept verbatim for diagnostics) and
//! [`classify`] turns it into a [`BusEvent`]. The constants below are the
//! AVR TWI master-mode encodings, with the prescaler bits already masked off.

use crate::twi::common::Direction;

/// Mask selecting the status bits of the status register.
pub const STATUS_MASK: u8 = 0xf8;

/// Status value before any bus event has been reported.
pub const STATUS_INIT: u8 = 0xf8;

pub mod codes {
    /// Bus error due to an illegal START or STOP condition.
    pub const BUS_ERROR: u8 = 0x00;
    pub const START: u8 = 0x08;
    pub const REP_START: u8 = 0x10;

    pub const MT_SLA_ACK: u8 = 0x18;
    pub const MT_SLA_NACK: u8 = 0x20;
    pub const MT_DATA_ACK: u8 = 0x28;
    pub const MT_DATA_NACK: u8 = 0x30;
    /// Arbitration lost in SLA+R/W or data bytes.
    pub const ARB_LOST: u8 = 0x38;

    pub const MR_SLA_ACK: u8 = 0x40;
    pub const MR_SLA_NACK: u8 = 0x48;
    pub const MR_DATA_ACK: u8 = 0x50;
    pub const MR_DATA_NACK: u8 = 0x58;

    /// No relevant state information available.
    pub const NO_INFO: u8 = 0xf8;
}

/// Protocol event behind one interrupt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    Start,
    RepeatedStart,
    /// SLA+R/W sent and acknowledged by the slave.
    AddressAcked(Direction),
    /// SLA+R/W sent and not acknowledged.
    AddressNacked(Direction),
    /// Data byte sent in master-transmitter mode.
    DataSent { acked: bool },
    /// Data byte received in master-receiver mode, with the acknowledge the
    /// master returned for it.
    DataReceived { acked: bool },
    ArbitrationLost,
    BusError,
    Other(u8),
}

impl BusEvent {
    /// Whether this event ends or compromises the current transaction.
    #[must_use]
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            BusEvent::AddressNacked(_)
                | BusEvent::DataSent { acked: false }
                | BusEvent::ArbitrationLost
                | BusEvent::BusError
        )
    }
}

/// Classify a raw status byte.
#[must_use]
pub fn classify(status: u8) -> BusEvent {
    match status & STATUS_MASK {
        codes::START => BusEvent::Start,
        codes::REP_START => BusEvent::RepeatedStart,
        codes::MT_SLA_ACK => BusEvent::AddressAcked(Direction::Write),
        codes::MR_SLA_ACK => BusEvent::AddressAcked(Direction::Read),
        codes::MT_SLA_NACK => BusEvent::AddressNacked(Direction::Write),
        codes::MR_SLA_NACK => BusEvent::AddressNacked(Direction::Read),
        codes::MT_DATA_ACK => BusEvent::DataSent { acked: true },
        codes::MT_DATA_NACK => BusEvent::DataSent { acked: false },
        codes::MR_DATA_ACK => BusEvent::DataReceived { acked: true },
        codes::MR_DATA_NACK => BusEvent::DataReceived { acked: false },
        codes::ARB_LOST => BusEvent::ArbitrationLost,
        codes::BUS_ERROR => BusEvent::BusError,
        other => BusEvent::Other(other),
    }
}
