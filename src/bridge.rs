//! The transport bridge: shared ring state and completion handlers
//!
//! `DapBridge` owns the request and response rings and reacts to transfer
//! completions reported by the USB stack. Completions run in callback
//! context; the dispatch worker drains the rings from its own task. The
//! two contexts coordinate through the cursors and two sticky flags:
//!
//! - The request ring's `was_full` flag records that a received packet is
//!   being held in the uncommitted write slot because the ring was at
//!   capacity. No new receive is armed, so the host stalls (NAK) until
//!   the worker frees a slot, commits the held packet, and re-arms.
//! - The response ring's `was_empty` flag records whether an outbound
//!   completion chain is in flight. The worker starts the chain when it
//!   publishes into an empty ring; after that, each completion arms the
//!   next queued response itself until the ring drains.
//!
//! Every cursor/flag access runs inside the scheduler-wide critical
//! section supplied by [`Scheduler::critical`]: a flag and its cursor
//! must change together, and the counterpart context may fire between
//! any two unguarded instructions.

use core::cell::UnsafeCell;

use crate::ring::PacketRing;
use crate::{Scheduler, Transport, DAP_PACKET_COUNT, DAP_PACKET_SIZE};

pub(crate) struct Rings<const SLOTS: usize> {
    pub request: PacketRing<SLOTS>,
    pub response: PacketRing<SLOTS>,
}

/// Bridge between the USB stack's completion callbacks and the dispatch
/// worker.
///
/// Allocate one as a `static` and share it between the stack's endpoint
/// handler and the worker task:
///
/// ```
/// use dap_bridge::{DapBridge, Scheduler, Transport};
/// # struct Pipes;
/// # unsafe impl Transport for Pipes {
/// #     fn arm_receive(&self) {}
/// #     fn submit(&self, _: &[u8]) {}
/// # }
/// # struct Rtos;
/// # unsafe impl Scheduler for Rtos {
/// #     fn critical<R>(&self, f: impl FnOnce() -> R) -> R { f() }
/// #     fn wake(&self) {}
/// #     fn wait(&self) {}
/// # }
///
/// static BRIDGE: DapBridge<Pipes, Rtos> = DapBridge::new(Pipes, Rtos);
/// ```
///
/// The ring depth `SLOTS` counts slots; one slot is reserved, so the
/// bridge buffers up to `SLOTS - 1` packets per direction.
pub struct DapBridge<T, S, const SLOTS: usize = DAP_PACKET_COUNT> {
    transport: T,
    scheduler: S,
    rings: UnsafeCell<Rings<SLOTS>>,
}

// Safety: the rings are only touched inside `Scheduler::critical`, whose
// implementations promise scheduler-wide mutual exclusion. See
// `with_rings` for the single access point.
unsafe impl<T: Sync, S: Sync, const SLOTS: usize> Sync for DapBridge<T, S, SLOTS> {}

impl<T, S, const SLOTS: usize> DapBridge<T, S, SLOTS> {
    /// Create a bridge around the stack's transfer primitive and the
    /// RTOS's scheduler primitives.
    ///
    /// Creation assigns memory and nothing else. Transfers begin once the
    /// driver lifecycle opens the interface.
    pub const fn new(transport: T, scheduler: S) -> Self {
        DapBridge {
            transport,
            scheduler,
            rings: UnsafeCell::new(Rings {
                request: PacketRing::new(),
                response: PacketRing::new(),
            }),
        }
    }

    /// Access the transfer primitive.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<T: Transport, S: Scheduler, const SLOTS: usize> DapBridge<T, S, SLOTS> {
    /// Run `f` with exclusive access to both rings.
    ///
    /// The transfer primitive is passed alongside so that arming decisions
    /// and the cursor/flag updates they depend on stay in one critical
    /// section.
    pub(crate) fn with_rings<R>(&self, f: impl FnOnce(&mut Rings<SLOTS>, &T) -> R) -> R {
        self.scheduler.critical(|| {
            // Safety: `critical` is scheduler-wide and non-reentrant, and
            // `Transport` implementations never call back into the bridge,
            // so this is the only live reference to the rings.
            let rings = unsafe { &mut *self.rings.get() };
            f(rings, &self.transport)
        })
    }

    pub(crate) fn wake_worker(&self) {
        self.scheduler.wake();
    }

    pub(crate) fn park_worker(&self) {
        self.scheduler.wait();
    }

    /// Re-initialize both rings and arm the first receive transfer.
    ///
    /// Called by the driver lifecycle at interface-open time, before any
    /// traffic. Cursors zero, flags cleared, one OUT transfer armed.
    pub fn open(&self) {
        self.with_rings(|rings, transport| {
            rings.request.reset();
            rings.response.reset();
            transport.arm_receive();
        });
    }

    /// Re-initialize both rings without arming anything.
    pub fn reset(&self) {
        self.with_rings(|rings, _| {
            rings.request.reset();
            rings.response.reset();
        });
    }

    /// Inbound completion: a request packet arrived from the host.
    ///
    /// If the request ring has room, the packet is committed and the next
    /// receive is armed. If not, the packet is held in the uncommitted
    /// write slot and `was_full` is raised; the worker commits it when it
    /// frees a slot. Either way the worker is woken.
    ///
    /// Returns `false`, without touching the rings, if `packet` exceeds
    /// [`DAP_PACKET_SIZE`](crate::DAP_PACKET_SIZE).
    pub fn request_complete(&self, packet: &[u8]) -> bool {
        if packet.len() > DAP_PACKET_SIZE {
            warn!("discarding {}-byte request transfer", packet.len());
            return false;
        }

        self.with_rings(|rings, transport| {
            let ring = &mut rings.request;
            ring.write_slot_mut().fill(packet);
            if !ring.is_full() {
                ring.commit_write();
                transport.arm_receive();
                ring.was_full = false;
            } else {
                // Hold the packet uncommitted and stop arming receives.
                // The link throttles the host until the worker catches up.
                ring.was_full = true;
            }
        });

        self.wake_worker();
        true
    }

    /// Outbound completion: a response packet finished sending.
    ///
    /// Frees the sent slot and, if more responses are queued, arms the
    /// next one using that slot's recorded length. `was_empty` becomes
    /// true only once the transfer armed here would drain the ring; when
    /// it already is true, the worker starts the next chain itself.
    ///
    /// Returns `false`, without touching the rings, if `bytes` exceeds
    /// [`DAP_PACKET_SIZE`](crate::DAP_PACKET_SIZE).
    pub fn response_complete(&self, bytes: usize) -> bool {
        if bytes > DAP_PACKET_SIZE {
            warn!("discarding {}-byte response completion", bytes);
            return false;
        }

        self.with_rings(|rings, transport| {
            let ring = &mut rings.response;
            ring.release_read();
            // The worker may queue responses faster than completions
            // retire them, so the read cursor can trail by more than one.
            if !ring.was_empty {
                transport.submit(ring.read_slot().payload());
                ring.was_empty = ring.read_cursor() + 1 == ring.write_cursor();
            }
        });

        self.wake_worker();
        true
    }
}
