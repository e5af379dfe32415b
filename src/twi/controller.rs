// Licensed under the Apache-2.0 license

//! Interrupt side of the driver.
//!
//! [`BusController::on_interrupt`] runs once per bus event. It reads the
//! status code, moves at most one byte between the data register and a ring
//! buffer, and issues exactly one [`BusAction`] for the next bus step.
//!
//! | event                      | bookkeeping                         | then          |
//! |----------------------------|-------------------------------------|---------------|
//! | START, repeated START      | -                                   | next action   |
//! | address ACK/NACK (write)   | pop the sent address byte           | next action   |
//! | address ACK (read)         | pop the sent address byte           | next action   |
//! | address NACK (read)        | pop, zero the pending-receive count | next action   |
//! | data sent, ACK or NACK     | pop the sent byte                   | next action   |
//! | data received              | push it, decrement the count        | ACK/NACK/hold |
//! | anything else              | -                                   | continue      |
//!
//! "Next action" is shared with the mainline, which runs it when it queues
//! work while the bus is held (see [`next_action`]).
//!
//! The handler does not allocate, block or log, and reads each shared field
//! once per decision.

use core::sync::atomic::Ordering;

use crate::twi::common::{Direction, RING_BUFFER_SIZE};
use crate::twi::state::TwiState;
use crate::twi::status::BusEvent;
use crate::twi::traits::{BusAction, TwiHardware};

pub struct BusController<'a, H: TwiHardware, const N: usize = RING_BUFFER_SIZE> {
    state: &'a TwiState<N>,
    hw: &'a H,
}

impl<'a, H: TwiHardware, const N: usize> BusController<'a, H, N> {
    pub const fn new(state: &'a TwiState<N>, hw: &'a H) -> Self {
        Self { state, hw }
    }

    /// Handle one bus event. Call this from the peripheral's interrupt vector.
    pub fn on_interrupt(&self) {
        let status = self.hw.status();
        self.state.status.store(status, Ordering::Release);

        let event = self.hw.classify(status);
        if event.is_fault() {
            self.state.latch_fault(status);
        }

        match event {
            BusEvent::Start | BusEvent::RepeatedStart => next_action(self.state, self.hw),
            BusEvent::AddressNacked(Direction::Read) => {
                self.consume_sent();
                // The slave refused to be read; nothing will arrive.
                self.state.refused.store(true, Ordering::Release);
                self.state.bytes_to_receive.store(0, Ordering::Release);
                next_action(self.state, self.hw);
            }
            BusEvent::AddressAcked(_)
            | BusEvent::AddressNacked(Direction::Write)
            | BusEvent::DataSent { .. } => {
                self.consume_sent();
                next_action(self.state, self.hw);
            }
            BusEvent::DataReceived { .. } => self.receive(),
            BusEvent::ArbitrationLost | BusEvent::BusError | BusEvent::Other(_) => {
                self.hw.request(BusAction::Continue);
            }
        }
    }

    /// The front byte of the outbound buffer is on the wire; drop it.
    fn consume_sent(&self) {
        if !self.state.tx.is_empty() {
            self.state.tx.pop_front();
        }
    }

    fn receive(&self) {
        let pending = self.state.bytes_to_receive.load(Ordering::Acquire);
        let remaining = if pending > 0 {
            let byte = self.hw.read_data();
            if self.state.rx.is_full() {
                self.state.overrun.store(true, Ordering::Release);
            } else {
                self.state.rx.push_back(byte);
            }
            self.state
                .bytes_to_receive
                .fetch_sub(1, Ordering::AcqRel)
                .saturating_sub(1)
        } else {
            0
        };

        let action = match remaining {
            0 => BusAction::Release,
            _ if self.state.rx.is_full() => BusAction::Release,
            1 => BusAction::Nack,
            _ => BusAction::Ack,
        };
        if action == BusAction::Release {
            self.state.held.store(true, Ordering::Release);
        }
        self.hw.request(action);
    }
}

/// Decide and issue the next bus step after START, an address byte or a sent
/// data byte.
///
/// Queued outbound bytes go first. Otherwise, with bytes still to receive,
/// the next one is acknowledged unless it is the last. With nothing to do, or
/// with no room to store a received byte, the bus is held until the
/// application queues more work or drains the inbound buffer.
pub(crate) fn next_action<H: TwiHardware, const N: usize>(state: &TwiState<N>, hw: &H) {
    if !state.tx.is_empty() {
        hw.write_data(state.tx.peek_front());
        hw.request(BusAction::Continue);
        return;
    }

    let pending = state.bytes_to_receive.load(Ordering::Acquire);
    let action = match pending {
        0 => BusAction::Release,
        _ if state.rx.is_full() => BusAction::Release,
        1 => BusAction::Nack,
        _ => BusAction::Continue,
    };
    if action == BusAction::Release {
        state.held.store(true, Ordering::Release);
    }
    hw.request(action);
}
