//! The dispatch worker: drains requests, runs the executor, publishes
//! responses
//!
//! Exactly one `Dispatcher` exists per bridge, so the command executor is
//! never invoked concurrently with itself. The worker copies each request
//! into a staging buffer before executing, and stages the response before
//! publishing, so the executor never holds a reference into the rings.
//!
//! # Atomic command batches
//!
//! A `DAP_QueueCommands` packet marks the start of a batch that must be
//! buffered in full before any part of it executes. Before consuming a
//! packet, the worker scans forward from the read cursor and rewrites
//! each `DAP_QueueCommands` opcode *in place* to `DAP_ExecuteCommands`,
//! stopping at the first packet with any other opcode. If the scan hits
//! the write cursor first, the worker parks and resumes **from the saved
//! scan position** once a bridge wakes it; restarting at the read cursor
//! would misread the slots it already relabeled as batch terminators.
//! The saved position lives in the ring itself, next to the cursors it
//! indexes, so a lifecycle reset discards a parked scan along with the
//! half-buffered batch it was tracking.
//!
//! Rewriting unread slots is a deliberate contract with the executor,
//! kept for protocol compatibility: by the time a batch slot is consumed,
//! it already carries `DAP_ExecuteCommands`, which is what tells the
//! executor to run its queued commands. It also means any second observer
//! of the request ring would see relabeled opcodes; today there is none.

use crate::bridge::DapBridge;
use crate::command::{self, Execute};
use crate::{Scheduler, Transport, DAP_PACKET_COUNT, DAP_PACKET_SIZE};

/// Outcome of one [`Dispatcher::poll`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// One request was consumed, executed, and its response published.
    Processed,
    /// Parked mid-batch: the tail of a `DAP_QueueCommands` run has not
    /// arrived yet. Wait for a wake and poll again.
    Pending,
    /// The request ring is drained. Wait for a wake and poll again.
    Idle,
}

/// The single worker draining a [`DapBridge`].
///
/// Call [`run()`](Dispatcher::run) from a dedicated task, or drive
/// [`poll()`](Dispatcher::poll) from your own loop.
pub struct Dispatcher<'a, T, S, E, const SLOTS: usize = DAP_PACKET_COUNT> {
    bridge: &'a DapBridge<T, S, SLOTS>,
    executor: E,
    request: [u8; DAP_PACKET_SIZE],
    response: [u8; DAP_PACKET_SIZE],
}

enum Step {
    Execute,
    Wait,
    Drained,
}

impl<'a, T, S, E, const SLOTS: usize> Dispatcher<'a, T, S, E, SLOTS>
where
    T: Transport,
    S: Scheduler,
    E: Execute,
{
    pub fn new(bridge: &'a DapBridge<T, S, SLOTS>, executor: E) -> Self {
        Dispatcher {
            bridge,
            executor,
            request: [0; DAP_PACKET_SIZE],
            response: [0; DAP_PACKET_SIZE],
        }
    }

    /// Process at most one request packet.
    ///
    /// Non-blocking; callable only from the worker context.
    pub fn poll(&mut self) -> Poll {
        let Self {
            bridge,
            executor,
            request,
            response,
        } = self;

        let step = bridge.with_rings(|rings, transport| {
            let ring = &mut rings.request;
            if ring.is_empty() {
                return Step::Drained;
            }

            // Batch detection: relabel queued commands until a terminator
            // shows up, resuming a parked scan where it left off.
            let mut cursor = ring.scan.unwrap_or(ring.read_cursor());
            loop {
                if cursor == ring.write_cursor() {
                    ring.scan = Some(cursor);
                    debug!("DAP wait");
                    return Step::Wait;
                }
                let slot = ring.slot_at_mut(cursor);
                if slot.data[0] != command::QUEUE_COMMANDS {
                    break;
                }
                debug!("{} DAP queued cmd len {:#04x}", cursor, slot.data[1]);
                slot.data[0] = command::EXECUTE_COMMANDS;
                cursor += 1;
            }
            ring.scan = None;

            // Consume one packet into the staging buffer.
            request.copy_from_slice(&ring.read_slot().data);
            ring.release_read();

            // A receive stalled on a full ring can resume now that a
            // slot is free: commit the held packet and re-arm.
            if ring.was_full {
                ring.commit_write();
                transport.arm_receive();
                ring.was_full = false;
            }

            Step::Execute
        });

        match step {
            Step::Drained => Poll::Idle,
            Step::Wait => Poll::Pending,
            Step::Execute => {
                debug!(
                    "DAP cmd {} len {:#04x}",
                    command::name(request[0]),
                    request[1],
                );
                let len = executor.execute(request, response);
                debug_assert!(len <= DAP_PACKET_SIZE, "executor response length {}", len);
                debug!("DAP resp {}", command::name(response[0]));

                bridge.with_rings(|rings, transport| {
                    let ring = &mut rings.response;
                    let chain_idle = ring.is_empty();
                    ring.write_slot_mut().fill(&response[..len]);
                    ring.commit_write();
                    if chain_idle {
                        // No completion chain in flight: start it.
                        transport.submit(ring.read_slot().payload());
                    } else {
                        // The outbound completion chain picks this one up.
                        ring.was_empty = false;
                    }
                });

                Poll::Processed
            }
        }
    }

    /// Drain requests for the life of the task, parking on the scheduler
    /// whenever there is nothing to do.
    pub fn run(&mut self) -> ! {
        loop {
            match self.poll() {
                Poll::Processed => {}
                Poll::Pending | Poll::Idle => self.bridge.park_worker(),
            }
        }
    }
}
