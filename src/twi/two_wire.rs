// Licensed under the Apache-2.0 license

//! Blocking transaction API.
//!
//! A transmission is `begin_transmission`, any number of `write`s and
//! `end_transmission`; a reception is `begin_reception`, `request_bytes`,
//! `read` while `available` and `end_reception`. The calls only queue bytes
//! and counts in the shared [`TwiState`]; the interrupt handler does the bus
//! work. Every wait is an `nb` poller driven by [`nb::block!`], so callers
//! that cannot afford to spin can poll the same conditions themselves.

use core::convert::Infallible;
use core::sync::atomic::Ordering;

use embedded_hal::i2c::SevenBitAddress;

use crate::common::{Logger, NoOpLogger};
use crate::twi::common::{address_byte, Direction, RING_BUFFER_SIZE};
use crate::twi::controller::next_action;
use crate::twi::state::TwiState;
use crate::twi::traits::{BusAction, TwiHardware};

pub struct TwoWire<'a, H: TwiHardware, L: Logger = NoOpLogger, const N: usize = RING_BUFFER_SIZE>
{
    pub(crate) state: &'a TwiState<N>,
    pub(crate) hw: &'a H,
    pub(crate) logger: L,
}

impl<'a, H: TwiHardware, L: Logger, const N: usize> TwoWire<'a, H, L, N> {
    pub fn new(state: &'a TwiState<N>, hw: &'a H, logger: L) -> Self {
        Self { state, hw, logger }
    }

    /// Open a master-transmitter transaction with `address`.
    ///
    /// Waits for any previously queued bytes to leave, then queues SLA+W and
    /// generates a START (a repeated START if the bus is still owned).
    pub fn begin_transmission(&mut self, address: SevenBitAddress) {
        self.logger
            .debug_fmt(format_args!("twi: begin transmission to 0x{address:02x}"));
        self.begin(address, Direction::Write);
    }

    /// Queue one data byte, waiting while the outbound buffer is full.
    pub fn write(&mut self, byte: u8) {
        let _ = nb::block!(self.poll_tx_space());
        self.state.tx.push_back(byte);
        self.resume();
    }

    /// Queue every byte of `bytes`. Returns the number queued.
    pub fn write_all(&mut self, bytes: &[u8]) -> usize {
        for &byte in bytes {
            self.write(byte);
        }
        bytes.len()
    }

    /// Wait until every queued byte is on the wire, generate a STOP and wait
    /// for it to complete. Returns the last bus status.
    ///
    /// A slave that refused its address or data does not make this fail; the
    /// refusal is visible in the returned status and in
    /// [`TwoWire::last_fault`].
    pub fn end_transmission(&mut self) -> u8 {
        let _ = nb::block!(self.poll_tx_drained());
        self.stop();
        let status = self.status();
        if let Some(fault) = self.last_fault() {
            self.logger
                .error_fmt(format_args!("twi: transmission fault, status 0x{fault:02x}"));
        }
        status
    }

    /// Open a master-receiver transaction with `address`.
    ///
    /// Nothing is clocked in until bytes are requested with
    /// [`TwoWire::request_bytes`].
    pub fn begin_reception(&mut self, address: SevenBitAddress) {
        self.logger
            .debug_fmt(format_args!("twi: begin reception from 0x{address:02x}"));
        self.begin(address, Direction::Read);
    }

    /// Ask for `count` more bytes in the open reception.
    pub fn request_bytes(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.state
            .bytes_to_receive
            .fetch_add(count, Ordering::AcqRel);
        if self.state.refused.load(Ordering::Acquire) {
            // The handler has parked the bus and will not touch the count.
            self.state.bytes_to_receive.store(0, Ordering::Release);
            return;
        }
        self.resume();
    }

    /// Run a whole reception: begin, request `count` bytes, end. Returns the
    /// number of bytes available to [`TwoWire::read`] afterwards, which is
    /// zero if the slave refused its address.
    ///
    /// Nothing drains the inbound buffer before the reception ends, so
    /// `count` is cut down to its free space and the cut is logged as an
    /// error.
    pub fn request_from(&mut self, address: SevenBitAddress, count: usize) -> usize {
        let free = N.saturating_sub(self.available());
        let count = if count > free {
            self.logger.error_fmt(format_args!(
                "twi: request of {count} bytes from 0x{address:02x} exceeds {free} free, truncated"
            ));
            free
        } else {
            count
        };
        self.begin_reception(address);
        self.request_bytes(count);
        self.end_reception();
        self.available()
    }

    /// Received bytes waiting to be read.
    #[must_use]
    pub fn available(&self) -> usize {
        self.state.rx.len()
    }

    /// Next received byte, or 0 if none is buffered.
    pub fn read(&mut self) -> u8 {
        if self.state.rx.is_empty() {
            return 0;
        }
        let byte = self.state.rx.pop_front();
        // A reception parked on a full buffer continues once there is room.
        if self.state.bytes_to_receive.load(Ordering::Acquire) > 0 {
            self.resume();
        }
        byte
    }

    /// Wait for every requested byte to arrive (or for the slave to refuse
    /// the read), then generate a STOP and wait for it to complete.
    ///
    /// Bytes still buffered stay readable.
    pub fn end_reception(&mut self) {
        let _ = nb::block!(self.poll_reception_complete());
        self.stop();
        if let Some(fault) = self.last_fault() {
            self.logger
                .error_fmt(format_args!("twi: reception fault, status 0x{fault:02x}"));
        }
    }

    /// Bytes requested but not yet received.
    #[must_use]
    pub fn bytes_to_receive(&self) -> usize {
        self.state.bytes_to_receive()
    }

    /// Raw status code of the most recent bus event.
    #[must_use]
    pub fn status(&self) -> u8 {
        self.state.status()
    }

    /// Status code of the first fault since the current transaction began.
    #[must_use]
    pub fn last_fault(&self) -> Option<u8> {
        self.state.last_fault()
    }

    /// Whether a received byte was dropped since the current transaction
    /// began.
    #[must_use]
    pub fn overrun(&self) -> bool {
        self.state.overrun()
    }

    /// Ready once the outbound buffer has room for another byte.
    ///
    /// # Errors
    ///
    /// `WouldBlock` while the buffer is full.
    pub fn poll_tx_space(&self) -> nb::Result<(), Infallible> {
        if self.state.tx.is_full() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Ready once every queued byte (address included) has been sent.
    ///
    /// # Errors
    ///
    /// `WouldBlock` while bytes are queued.
    pub fn poll_tx_drained(&self) -> nb::Result<(), Infallible> {
        if self.state.tx.is_empty() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Ready once no requested byte is outstanding.
    ///
    /// # Errors
    ///
    /// `WouldBlock` while bytes are still expected.
    pub fn poll_reception_complete(&self) -> nb::Result<(), Infallible> {
        if self.state.bytes_to_receive() == 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Ready once a requested STOP has been transmitted.
    ///
    /// # Errors
    ///
    /// `WouldBlock` while the peripheral still reports the STOP as pending.
    pub fn poll_stop_complete(&self) -> nb::Result<(), Infallible> {
        if self.hw.stop_pending() {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }

    /// Address phase of a new transaction: earlier faults are forgotten once
    /// the previous transaction has drained.
    fn begin(&mut self, address: SevenBitAddress, direction: Direction) {
        let _ = nb::block!(self.poll_tx_drained());
        self.state.clear_faults();
        self.start(address, direction);
    }

    /// Queue SLA+R/W and generate a (repeated) START. Latched faults are
    /// kept.
    pub(crate) fn start(&mut self, address: SevenBitAddress, direction: Direction) {
        let _ = nb::block!(self.poll_tx_drained());
        self.state.refused.store(false, Ordering::Release);
        self.state.tx.push_back(address_byte(address, direction));
        self.state.held.store(false, Ordering::Release);
        self.hw.request(BusAction::Start);
    }

    pub(crate) fn stop(&mut self) {
        self.state.held.store(false, Ordering::Release);
        self.hw.request(BusAction::Stop);
        let _ = nb::block!(self.poll_stop_complete());
    }

    /// Restart a bus the interrupt handler left waiting for the application.
    fn resume(&self) {
        if self.state.held.swap(false, Ordering::AcqRel) {
            next_action(self.state, self.hw);
        }
    }
}
