//! Test doubles for the transport, scheduler, and executor seams
//!
//! Unit tests drive the bridge and worker from one thread, so the
//! scheduler double's critical section is a plain call and its wake is a
//! counter. The transport double records arms and submissions instead of
//! touching hardware.

use core::cell::{Cell, RefCell};

use crate::command::Execute;
use crate::{Scheduler, Transport, DAP_PACKET_SIZE};

const CAPACITY: usize = 32;

pub(crate) struct Outbox {
    packets: [[u8; DAP_PACKET_SIZE]; CAPACITY],
    lens: [usize; CAPACITY],
    count: usize,
}

/// Records every `arm_receive` and `submit` call.
pub(crate) struct MockTransport {
    /// Total receive transfers armed.
    pub armed: Cell<usize>,
    outbox: RefCell<Outbox>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            armed: Cell::new(0),
            outbox: RefCell::new(Outbox {
                packets: [[0; DAP_PACKET_SIZE]; CAPACITY],
                lens: [0; CAPACITY],
                count: 0,
            }),
        }
    }

    /// Total response transfers submitted.
    pub fn submitted(&self) -> usize {
        self.outbox.borrow().count
    }

    /// Length of the `i`th submitted response.
    pub fn sent_len(&self, i: usize) -> usize {
        self.outbox.borrow().lens[i]
    }

    /// First byte of the `i`th submitted response.
    pub fn sent_opcode(&self, i: usize) -> u8 {
        self.outbox.borrow().packets[i][0]
    }
}

// Safety: records calls and never re-enters the bridge.
unsafe impl Transport for MockTransport {
    fn arm_receive(&self) {
        self.armed.set(self.armed.get() + 1);
    }

    fn submit(&self, packet: &[u8]) {
        let mut outbox = self.outbox.borrow_mut();
        let i = outbox.count;
        outbox.packets[i][..packet.len()].copy_from_slice(packet);
        outbox.lens[i] = packet.len();
        outbox.count += 1;
    }
}

/// Single-threaded stand-in for the RTOS primitives.
pub(crate) struct MockScheduler {
    pub wakes: Cell<usize>,
}

impl MockScheduler {
    pub fn new() -> Self {
        MockScheduler {
            wakes: Cell::new(0),
        }
    }
}

// Safety: tests run bridge and worker on one thread, so a plain call is
// a critical section.
unsafe impl Scheduler for MockScheduler {
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }

    fn wake(&self) {
        self.wakes.set(self.wakes.get() + 1);
    }

    fn wait(&self) {
        panic!("worker parked in a unit test");
    }
}

/// Records each request's opcode and first payload byte, and answers
/// with a fixed-length response echoing the opcode.
pub(crate) struct RecordingExecutor {
    pub opcodes: [u8; CAPACITY],
    pub payloads: [u8; CAPACITY],
    pub count: usize,
    response_len: usize,
}

impl RecordingExecutor {
    pub fn new(response_len: usize) -> Self {
        RecordingExecutor {
            opcodes: [0; CAPACITY],
            payloads: [0; CAPACITY],
            count: 0,
            response_len,
        }
    }
}

impl Execute for RecordingExecutor {
    fn execute(
        &mut self,
        request: &[u8; DAP_PACKET_SIZE],
        response: &mut [u8; DAP_PACKET_SIZE],
    ) -> usize {
        self.opcodes[self.count] = request[0];
        self.payloads[self.count] = request[1];
        self.count += 1;
        response[0] = request[0];
        response[1] = self.count as u8;
        self.response_len
    }
}
