// Licensed under the Apache-2.0 license

//! `embedded-hal` 1.0 I2C implementation on top of [`TwoWire`].
//!
//! Contiguous operations of the same direction share one address phase; a
//! direction change issues a repeated START. Reads in one run are requested
//! together so the last byte of the run, and only that one, is
//! not-acknowledged. Faults are cleared once per transaction, not at each
//! repeated START, so a refusal in any phase survives to the final STOP, after
//! which it is reported as an [`Error`].

use embedded_hal::i2c::{
    ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress,
};

use crate::common::Logger;
use crate::twi::common::Direction;
use crate::twi::status::BusEvent;
use crate::twi::traits::TwiHardware;
use crate::twi::two_wire::TwoWire;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The slave did not acknowledge its address.
    AddressNack,
    /// The slave did not acknowledge a data byte.
    DataNack,
    ArbitrationLost,
    /// Misplaced START or STOP on the bus.
    Bus,
    /// A received byte was dropped.
    Overrun,
}

impl Error {
    /// Error reported for a faulting bus event, if any.
    #[must_use]
    pub fn from_event(event: BusEvent) -> Option<Self> {
        match event {
            BusEvent::AddressNacked(_) => Some(Error::AddressNack),
            BusEvent::DataSent { acked: false } => Some(Error::DataNack),
            BusEvent::ArbitrationLost => Some(Error::ArbitrationLost),
            BusEvent::BusError => Some(Error::Bus),
            _ => None,
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Error::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Error::Bus => ErrorKind::Bus,
            Error::Overrun => ErrorKind::Overrun,
        }
    }
}

impl<H: TwiHardware, L: Logger, const N: usize> TwoWire<'_, H, L, N> {
    /// Error for the transaction that just ended, if it faulted.
    #[must_use]
    pub fn take_error(&self) -> Option<Error> {
        if self.overrun() {
            return Some(Error::Overrun);
        }
        self.last_fault()
            .and_then(|status| Error::from_event(self.hw.classify(status)))
    }

    /// Read into `buffer` as bytes arrive. Stops early if the reception is
    /// abandoned.
    fn receive_into(&mut self, buffer: &mut [u8]) {
        let mut filled = 0;
        while let Some(slot) = buffer.get_mut(filled) {
            // Sample the count first: a byte can land between the two loads,
            // never vanish.
            let pending = self.bytes_to_receive();
            if self.available() > 0 {
                *slot = self.read();
                filled += 1;
            } else if pending == 0 {
                break;
            } else {
                core::hint::spin_loop();
            }
        }
    }
}

impl<H: TwiHardware, L: Logger, const N: usize> ErrorType for TwoWire<'_, H, L, N> {
    type Error = Error;
}

impl<H: TwiHardware, L: Logger, const N: usize> I2c<SevenBitAddress> for TwoWire<'_, H, L, N> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        let _ = nb::block!(self.poll_tx_drained());
        self.state.clear_faults();

        let mut phase = None;
        for index in 0..operations.len() {
            let direction = match operations.get(index) {
                Some(Operation::Write(_)) => Direction::Write,
                Some(Operation::Read(_)) => Direction::Read,
                None => break,
            };
            if phase != Some(direction) {
                match direction {
                    Direction::Write => self.start(address, Direction::Write),
                    Direction::Read => {
                        let total: usize = operations
                            .iter()
                            .skip(index)
                            .map_while(|op| match op {
                                Operation::Read(buffer) => Some(buffer.len()),
                                Operation::Write(_) => None,
                            })
                            .sum();
                        self.start(address, Direction::Read);
                        self.request_bytes(total);
                    }
                }
                phase = Some(direction);
            }
            match operations.get_mut(index) {
                Some(Operation::Write(bytes)) => {
                    self.write_all(bytes);
                }
                Some(Operation::Read(buffer)) => self.receive_into(buffer),
                None => break,
            }
        }

        let _ = nb::block!(self.poll_tx_drained());
        let _ = nb::block!(self.poll_reception_complete());
        self.stop();

        match self.take_error() {
            Some(error) => {
                self.logger.error_fmt(format_args!(
                    "twi: transaction with 0x{address:02x} failed: {error:?}"
                ));
                Err(error)
            }
            None => Ok(()),
        }
    }
}
