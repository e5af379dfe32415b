// Licensed under the Apache-2.0 license

#[macro_use]
mod common;

use common::{RecordingLogger, SimBus, Slave};
use hex_literal::hex;
use twowire_plus::twi::status::codes;
use twowire_plus::twi::{BusAction, BusController, LastOperation, TwiState, TwoWire};

#[test]
fn request_from_reads_and_nacks_only_the_last_byte() {
    rig!(state, bus, wire, Slave::new(0x42).responding(&hex!("a1 a2 a3 a4")));

    assert_eq!(wire.request_from(0x42, 4), 4);

    assert_eq!(bus.master_acks(), [true, true, true, false]);
    assert_eq!(wire.status(), codes::MR_DATA_NACK);
    assert_eq!(wire.bytes_to_receive(), 0);
    for (left, expected) in (1..=4).rev().zip(hex!("a1 a2 a3 a4")) {
        assert_eq!(wire.available(), left);
        assert_eq!(wire.read(), expected);
    }
    assert_eq!(wire.available(), 0);
    assert_eq!(bus.actions().last(), Some(&BusAction::Stop));
}

#[test]
fn address_phase_leaves_outbound_buffer_empty() {
    rig!(state, bus, wire, Slave::new(0x42).responding(&[7]));

    wire.begin_reception(0x42);
    assert_eq!(wire.status(), codes::MR_SLA_ACK);
    assert!(state.tx().is_empty());
    assert_eq!(state.tx().last_operation(), LastOperation::Read);

    wire.request_bytes(1);
    wire.end_reception();
    assert_eq!(bus.master_acks(), [false]);
    assert_eq!(wire.read(), 7);
}

#[test]
fn reading_with_nothing_buffered_returns_zero() {
    rig!(state, bus, wire, Slave::new(0x42));

    assert_eq!(wire.available(), 0);
    assert_eq!(wire.read(), 0);
    assert!(state.rx().is_empty());
}

#[test]
fn refused_read_ends_promptly() {
    rig!(state, bus, wire, Slave::new(0x42).responding(&[1, 2, 3]));

    assert_eq!(wire.request_from(0x24, 5), 0);

    assert_eq!(wire.bytes_to_receive(), 0);
    assert_eq!(wire.last_fault(), Some(codes::MR_SLA_NACK));
    assert!(bus.master_acks().is_empty());
    assert!(state.tx().is_empty());
}

#[test]
fn requests_accumulate() {
    rig!(state, bus, wire, Slave::new(0x42).responding(&hex!("01 02 03 04 05")));

    wire.begin_reception(0x42);
    wire.request_bytes(2);
    assert_eq!(wire.available(), 2);
    assert_eq!(wire.bytes_to_receive(), 0);
    wire.request_bytes(3);
    wire.end_reception();

    // Each request ends by not-acknowledging its own last byte.
    assert_eq!(bus.master_acks(), [true, false, true, true, false]);
    let bytes: Vec<u8> = (0..wire.available()).map(|_| wire.read()).collect();
    assert_eq!(bytes, hex!("01 02 03 04 05"));
}

#[test]
fn long_reception_is_paced_by_the_reader() {
    let payload: Vec<u8> = (0..40).collect();
    rig!(state, bus, wire, Slave::new(0x42).responding(&payload));

    wire.begin_reception(0x42);
    wire.request_bytes(payload.len());
    assert!(state.rx().is_full());
    assert!(state.is_held());
    assert_eq!(wire.bytes_to_receive(), 40 - 16);

    let mut received = Vec::new();
    while wire.bytes_to_receive() > 0 || wire.available() > 0 {
        received.push(wire.read());
    }
    wire.end_reception();

    assert_eq!(received, payload);
    assert!(!wire.overrun());
    let acks = bus.master_acks();
    assert_eq!(acks.len(), 40);
    assert!(acks[..39].iter().all(|&ack| ack));
    assert!(!acks[39]);
}

#[test]
fn end_reception_keeps_unread_bytes() {
    rig!(state, bus, wire, Slave::new(0x42).responding(&[9, 8]));

    wire.request_from(0x42, 2);
    assert!(wire.poll_reception_complete().is_ok());
    assert!(wire.poll_stop_complete().is_ok());
    assert_eq!(wire.available(), 2);

    wire.begin_reception(0x42);
    wire.end_reception();
    assert_eq!(wire.read(), 9);
    assert_eq!(wire.read(), 8);
}

#[test]
fn write_then_read_uses_repeated_start() {
    rig!(state, bus, wire, Slave::new(0x42).responding(&[0xc3]));

    bus.pause();
    wire.begin_transmission(0x42);
    wire.write(0x0f);
    bus.resume();
    wire.begin_reception(0x42);
    wire.request_bytes(1);
    wire.end_reception();

    assert_eq!(bus.received(), [0x0f]);
    assert!(bus.statuses().contains(&codes::REP_START));
    assert_eq!(wire.read(), 0xc3);
}

#[test]
fn request_from_is_cut_to_the_free_space() {
    let state = TwiState::<4>::new();
    let bus = SimBus::new(Slave::new(0x42).responding(&hex!("01 02 03 04 05 06")));
    let isr = BusController::new(&state, &bus);
    let handler = || isr.on_interrupt();
    bus.attach(&handler);
    let logger = RecordingLogger::default();
    let mut wire = TwoWire::new(&state, &bus, logger.clone());

    assert_eq!(wire.request_from(0x42, 6), 4);

    assert_eq!(bus.master_acks(), [true, true, true, false]);
    assert_eq!(wire.bytes_to_receive(), 0);
    assert!(!wire.overrun());
    assert_eq!(logger.errors.borrow().len(), 1);
    assert!(logger.errors.borrow()[0].contains("6 bytes"));

    assert_eq!(wire.read(), 0x01);
    assert_eq!(wire.request_from(0x42, 2), 4);
    assert_eq!(logger.errors.borrow().len(), 2);
    assert_eq!(wire.read(), 0x02);
}
