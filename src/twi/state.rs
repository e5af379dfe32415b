// Licensed under the Apache-2.0 license

//! Driver state shared by the transaction API and the interrupt handler.
//!
//! All of it lives in one [`TwiState`] that both sides borrow; nothing is
//! duplicated and nothing is guarded by a lock. Every field is a single
//! atomic word so that the mainline can be interrupted between any two of
//! its accesses.
//!
//! Typical firmware keeps the state and the peripheral in statics:
//!
//! ```rust,ignore
//! static STATE: TwiState = TwiState::new();
//! static TWI: TwiRegisterBlock = unsafe { TwiRegisterBlock::new(ATMEGA328P_TWI_BASE) };
//!
//! #[interrupt]
//! fn TWI() {
//!     BusController::new(&STATE, &TWI).on_interrupt();
//! }
//!
//! let mut wire = TwoWire::new(&STATE, &TWI, NoOpLogger);
//! ```

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, AtomicUsize, Ordering};

use crate::common::Logger;
use crate::twi::common::RING_BUFFER_SIZE;
use crate::twi::controller::BusController;
use crate::twi::ring_buffer::RingBuffer;
use crate::twi::status::STATUS_INIT;
use crate::twi::traits::TwiHardware;
use crate::twi::two_wire::TwoWire;

const NO_FAULT: u16 = u16::MAX;

pub struct TwiState<const N: usize = RING_BUFFER_SIZE> {
    /// Address and payload bytes; produced by mainline, consumed by the ISR.
    pub(crate) tx: RingBuffer<N>,
    /// Received bytes; produced by the ISR, consumed by mainline.
    pub(crate) rx: RingBuffer<N>,
    /// Bytes still expected in the current reception. Zeroed by the ISR when
    /// the slave refuses to be read.
    pub(crate) bytes_to_receive: AtomicUsize,
    /// Most recent raw status code. Written by the ISR only.
    pub(crate) status: AtomicU8,
    /// First faulting status code of the current transaction, or `NO_FAULT`.
    pub(crate) fault: AtomicU16,
    pub(crate) overrun: AtomicBool,
    /// The slave refused SLA+R in the current address phase.
    pub(crate) refused: AtomicBool,
    /// The ISR released the bus and waits for mainline to queue more work.
    pub(crate) held: AtomicBool,
}

impl<const N: usize> Default for TwiState<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TwiState<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tx: RingBuffer::new(),
            rx: RingBuffer::new(),
            bytes_to_receive: AtomicUsize::new(0),
            status: AtomicU8::new(STATUS_INIT),
            fault: AtomicU16::new(NO_FAULT),
            overrun: AtomicBool::new(false),
            refused: AtomicBool::new(false),
            held: AtomicBool::new(false),
        }
    }

    /// Borrow the transaction API and the interrupt handler for one
    /// peripheral.
    pub fn split<'a, H: TwiHardware, L: Logger>(
        &'a self,
        hw: &'a H,
        logger: L,
    ) -> (TwoWire<'a, H, L, N>, BusController<'a, H, N>) {
        (TwoWire::new(self, hw, logger), BusController::new(self, hw))
    }

    /// Outbound buffer.
    #[must_use]
    pub fn tx(&self) -> &RingBuffer<N> {
        &self.tx
    }

    /// Inbound buffer.
    #[must_use]
    pub fn rx(&self) -> &RingBuffer<N> {
        &self.rx
    }

    #[must_use]
    pub fn bytes_to_receive(&self) -> usize {
        self.bytes_to_receive.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn status(&self) -> u8 {
        self.status.load(Ordering::Acquire)
    }

    /// Status code of the first fault since the last transaction began.
    #[must_use]
    pub fn last_fault(&self) -> Option<u8> {
        u8::try_from(self.fault.load(Ordering::Acquire)).ok()
    }

    /// Whether a received byte was dropped because the inbound buffer was
    /// full.
    #[must_use]
    pub fn overrun(&self) -> bool {
        self.overrun.load(Ordering::Acquire)
    }

    /// Whether the bus is held waiting for the application.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// ISR side: remember the first fault of a transaction.
    pub(crate) fn latch_fault(&self, status: u8) {
        if self.fault.load(Ordering::Acquire) == NO_FAULT {
            self.fault.store(u16::from(status), Ordering::Release);
        }
    }

    /// Mainline side: forget faults before a new transaction. Repeated
    /// STARTs inside one transaction keep them.
    pub(crate) fn clear_faults(&self) {
        self.fault.store(NO_FAULT, Ordering::Release);
        self.overrun.store(false, Ordering::Release);
    }
}
