// Licensed under the Apache-2.0 license

//! Host-side simulation of a TWI peripheral with one slave device attached.
//!
//! Bus steps complete instantly. Whenever a step leaves the interrupt flag
//! set, the attached handler runs before the request returns; requests made
//! by the handler itself are queued and run after it returns, so the handler
//! never nests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use twowire_plus::common::Logger;
use twowire_plus::twi::status::codes;
use twowire_plus::twi::{BusAction, TwiHardware};

/// Wire a driver to a simulated bus:
/// `rig!(state, bus, wire, Slave::new(0x42))` declares `state`, `bus` and
/// `wire` with the interrupt handler attached. An optional fifth argument
/// sets the ring buffer capacity.
macro_rules! rig {
    ($state:ident, $bus:ident, $wire:ident, $slave:expr) => {
        rig!($state, $bus, $wire, $slave, 16);
    };
    ($state:ident, $bus:ident, $wire:ident, $slave:expr, $capacity:literal) => {
        #[allow(unused_variables)]
        let $state = twowire_plus::twi::TwiState::<$capacity>::new();
        #[allow(unused_variables)]
        let $bus = $crate::common::SimBus::new($slave);
        let isr = twowire_plus::twi::BusController::new(&$state, &$bus);
        let handler = || isr.on_interrupt();
        $bus.attach(&handler);
        #[allow(unused_mut)]
        let mut $wire =
            twowire_plus::twi::TwoWire::new(&$state, &$bus, twowire_plus::common::NoOpLogger);
    };
}

/// Logger that keeps error lines for inspection; clones share the record.
#[derive(Clone, Debug, Default)]
pub struct RecordingLogger {
    pub errors: Rc<RefCell<Vec<String>>>,
}

impl Logger for RecordingLogger {
    fn debug(&mut self, _msg: &str) {}

    fn error(&mut self, msg: &str) {
        self.errors.borrow_mut().push(msg.to_owned());
    }
}

/// Polls of `stop_pending` that still report the STOP in progress.
pub const STOP_LATENCY: usize = 2;

/// Scripted slave device.
#[derive(Debug, Default)]
pub struct Slave {
    pub address: u8,
    /// Bytes the slave returns when read, in order. 0xff once exhausted.
    pub response: VecDeque<u8>,
    /// Bytes the slave accepted from the master.
    pub received: Vec<u8>,
    /// Acknowledge the master returned for each byte it read.
    pub master_acks: Vec<bool>,
    /// Refuse data bytes once this many have been accepted.
    pub accept_limit: Option<usize>,
}

impl Slave {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn responding(mut self, bytes: &[u8]) -> Self {
        self.response.extend(bytes.iter().copied());
        self
    }

    pub fn accepting(mut self, limit: usize) -> Self {
        self.accept_limit = Some(limit);
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Started,
    Transmit { addressed: bool },
    Receive { addressed: bool },
    /// Lost the bus; no further master events.
    Detached,
}

pub struct SimBus<'a> {
    status: Cell<u8>,
    data: Cell<u8>,
    phase: Cell<Phase>,
    interrupt: Cell<bool>,
    stop_polls: Cell<usize>,
    paused: Cell<bool>,
    in_isr: Cell<bool>,
    isr: RefCell<Option<&'a dyn Fn()>>,
    actions: RefCell<Vec<BusAction>>,
    statuses: RefCell<Vec<u8>>,
    pub slave: RefCell<Slave>,
}

impl<'a> SimBus<'a> {
    pub fn new(slave: Slave) -> Self {
        Self {
            status: Cell::new(codes::NO_INFO),
            data: Cell::new(0),
            phase: Cell::new(Phase::Idle),
            interrupt: Cell::new(false),
            stop_polls: Cell::new(0),
            paused: Cell::new(false),
            in_isr: Cell::new(false),
            isr: RefCell::new(None),
            actions: RefCell::new(Vec::new()),
            statuses: RefCell::new(Vec::new()),
            slave: RefCell::new(slave),
        }
    }

    /// Route the peripheral interrupt to `isr`.
    pub fn attach(&self, isr: &'a dyn Fn()) {
        *self.isr.borrow_mut() = Some(isr);
    }

    /// Keep pending interrupts from being serviced.
    pub fn pause(&self) {
        self.paused.set(true);
    }

    /// Service pending interrupts again.
    pub fn resume(&self) {
        self.paused.set(false);
        self.service();
    }

    /// Report `status` as if the peripheral had raised it.
    pub fn raise(&self, status: u8) {
        if status == codes::ARB_LOST {
            self.phase.set(Phase::Detached);
        }
        self.signal(status);
        self.service();
    }

    /// Every request issued to the peripheral, in order.
    pub fn actions(&self) -> Vec<BusAction> {
        self.actions.borrow().clone()
    }

    /// Every status the peripheral reported, in order.
    pub fn statuses(&self) -> Vec<u8> {
        self.statuses.borrow().clone()
    }

    pub fn received(&self) -> Vec<u8> {
        self.slave.borrow().received.clone()
    }

    pub fn master_acks(&self) -> Vec<bool> {
        self.slave.borrow().master_acks.clone()
    }

    pub fn interrupt_pending(&self) -> bool {
        self.interrupt.get()
    }

    fn signal(&self, status: u8) {
        self.status.set(status);
        self.statuses.borrow_mut().push(status);
        self.interrupt.set(true);
    }

    fn service(&self) {
        if self.in_isr.get() {
            return;
        }
        while self.interrupt.get() && !self.paused.get() {
            let Some(isr) = *self.isr.borrow() else {
                return;
            };
            self.interrupt.set(false);
            self.in_isr.set(true);
            isr();
            self.in_isr.set(false);
        }
    }

    fn step(&self, action: BusAction) {
        match action {
            BusAction::Start => {
                let status = match self.phase.get() {
                    Phase::Idle | Phase::Detached => codes::START,
                    _ => codes::REP_START,
                };
                self.phase.set(Phase::Started);
                self.signal(status);
            }
            BusAction::Stop => {
                self.phase.set(Phase::Idle);
                self.interrupt.set(false);
                self.status.set(codes::NO_INFO);
                self.stop_polls.set(STOP_LATENCY);
            }
            BusAction::Release => {}
            BusAction::Continue | BusAction::Ack | BusAction::Nack => {
                self.interrupt.set(false);
                self.advance(action);
            }
        }
    }

    fn advance(&self, action: BusAction) {
        match self.phase.get() {
            Phase::Started => {
                let sla = self.data.get();
                let addressed = sla >> 1 == self.slave.borrow().address;
                let read = sla & 1 == 1;
                let status = match (read, addressed) {
                    (false, true) => codes::MT_SLA_ACK,
                    (false, false) => codes::MT_SLA_NACK,
                    (true, true) => codes::MR_SLA_ACK,
                    (true, false) => codes::MR_SLA_NACK,
                };
                self.phase.set(if read {
                    Phase::Receive { addressed }
                } else {
                    Phase::Transmit { addressed }
                });
                self.signal(status);
            }
            Phase::Transmit { addressed } => {
                let acked = addressed && {
                    let mut slave = self.slave.borrow_mut();
                    let room = slave
                        .accept_limit
                        .map_or(true, |limit| slave.received.len() < limit);
                    if room {
                        let byte = self.data.get();
                        slave.received.push(byte);
                    }
                    room
                };
                self.signal(if acked {
                    codes::MT_DATA_ACK
                } else {
                    codes::MT_DATA_NACK
                });
            }
            Phase::Receive { addressed } => {
                let ack = action != BusAction::Nack;
                let byte = {
                    let mut slave = self.slave.borrow_mut();
                    slave.master_acks.push(ack);
                    if addressed {
                        slave.response.pop_front().unwrap_or(0xff)
                    } else {
                        0xff
                    }
                };
                self.data.set(byte);
                self.signal(if ack {
                    codes::MR_DATA_ACK
                } else {
                    codes::MR_DATA_NACK
                });
            }
            Phase::Idle | Phase::Detached => {}
        }
    }
}

impl TwiHardware for SimBus<'_> {
    fn status(&self) -> u8 {
        self.status.get()
    }

    fn read_data(&self) -> u8 {
        self.data.get()
    }

    fn write_data(&self, byte: u8) {
        self.data.set(byte);
    }

    fn request(&self, action: BusAction) {
        self.actions.borrow_mut().push(action);
        self.step(action);
        self.service();
    }

    fn stop_pending(&self) -> bool {
        let polls = self.stop_polls.get();
        if polls > 0 {
            self.stop_polls.set(polls - 1);
            true
        } else {
            false
        }
    }
}
