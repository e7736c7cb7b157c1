//! A double-buffered USB transport bridge for CMSIS-DAP debug probes
//!
//! `dap-bridge` sits between a callback-driven USB device stack and the
//! single worker task that executes DAP commands. Completed bulk
//! transfers land in a fixed request ring; the worker drains them one
//! packet at a time, runs the command executor, and publishes responses
//! into a fixed response ring that feeds the IN endpoint. Backpressure
//! is by construction: when the request ring is at capacity no receive
//! transfer is armed, and the host stalls until the worker catches up.
//! Multi-packet `DAP_QueueCommands` batches are buffered in full before
//! any part of them executes.
//!
//! The crate is `no_std`, allocation-free, and hardware-agnostic. You
//! connect it to your platform through three seams:
//!
//! - [`Transport`]: arms receive transfers and submits responses
//!   (implemented on your USB stack's endpoint handles),
//! - [`Scheduler`]: critical section, worker wake, worker wait
//!   (implemented on your RTOS primitives; a Cortex-M implementation
//!   ships behind the `cortex-m` feature),
//! - [`Execute`]: the DAP command engine itself.
//!
//! # Example
//!
//! ```no_run
//! use dap_bridge::{DapBridge, Dispatcher, Execute, Scheduler, Transport, DAP_PACKET_SIZE};
//!
//! /// Your USB stack's endpoint handles.
//! struct Pipes;
//!
//! unsafe impl Transport for Pipes {
//!     fn arm_receive(&self) {
//!         // Tell the stack to accept the next OUT packet.
//!     }
//!     fn submit(&self, packet: &[u8]) {
//!         // Start an IN transfer carrying `packet`.
//!     }
//! }
//!
//! /// Your RTOS's primitives.
//! struct Rtos;
//!
//! unsafe impl Scheduler for Rtos {
//!     fn critical<R>(&self, f: impl FnOnce() -> R) -> R { f() }
//!     fn wake(&self) {}
//!     fn wait(&self) {}
//! }
//!
//! /// Your DAP command engine.
//! struct Dap;
//!
//! impl Execute for Dap {
//!     fn execute(
//!         &mut self,
//!         request: &[u8; DAP_PACKET_SIZE],
//!         response: &mut [u8; DAP_PACKET_SIZE],
//!     ) -> usize {
//!         response[0] = request[0];
//!         2
//!     }
//! }
//!
//! static BRIDGE: DapBridge<Pipes, Rtos> = DapBridge::new(Pipes, Rtos);
//!
//! // From the stack's endpoint callbacks (see `DapHandler` for the
//! // lifecycle glue):
//! //
//! //   BRIDGE.request_complete(received_packet);
//! //   BRIDGE.response_complete(sent_len);
//!
//! // From the dedicated worker task:
//! let mut worker = Dispatcher::new(&BRIDGE, Dap);
//! worker.run();
//! ```

#![no_std]

#[macro_use]
mod log;

mod bridge;
pub mod command;
mod dispatch;
mod driver;
mod ring;

#[cfg(feature = "cortex-m")]
mod cortex;

#[cfg(test)]
mod mock;

pub use bridge::DapBridge;
pub use command::Execute;
pub use dispatch::{Dispatcher, Poll};
pub use driver::{
    Completion, DapHandler, InterfaceDescriptor, TransferResult, DAP_INTERFACE_CLASS,
    DAP_INTERFACE_PROTOCOL, DAP_INTERFACE_SUBCLASS,
};

#[cfg(feature = "cortex-m")]
pub use cortex::CortexMScheduler;

/// Size in bytes of one protocol packet, request or response.
///
/// Fixed by the probe's advertised `DAP_Info` packet size; every bulk
/// transfer carries at most one packet.
pub const DAP_PACKET_SIZE: usize = 64;

/// Default ring depth, in slots, for each direction.
///
/// One slot per ring is reserved, so the default buffers
/// `DAP_PACKET_COUNT - 1` packets per direction. Rings accept any depth
/// of two or more through their const generic.
pub const DAP_PACKET_COUNT: usize = 8;

/// Transfer-arming primitive provided by the USB device stack.
///
/// Both operations are fire-and-forget: completion is reported later
/// through the stack's transfer callback, which flows back into the
/// bridge via [`DapHandler::transfer_complete`]. Both are called from
/// completion-callback context *and* from the worker task; the
/// implementation must accept either.
///
/// # Safety
///
/// Implementations must not call back into the bridge, handler, or
/// dispatcher from `arm_receive` or `submit` — both run inside the
/// bridge's critical section. Completions must be delivered
/// asynchronously, never from within these calls.
pub unsafe trait Transport {
    /// Allow the next host-to-device bulk transfer to proceed.
    fn arm_receive(&self);

    /// Start a device-to-host bulk transfer carrying `packet`.
    ///
    /// At most one response transfer is in flight at a time; the bridge
    /// never submits again before the previous completion arrives.
    fn submit(&self, packet: &[u8]);
}

/// Scheduler primitives provided by the RTOS (or bare-metal runtime).
///
/// # Safety
///
/// `critical` must provide scheduler-wide mutual exclusion: while `f`
/// runs, neither the completion callbacks nor the worker may execute
/// concurrently with it, and `f` must not be run reentrantly.
///
/// `wake` must be sticky with at-least-one-pending semantics: a wake
/// delivered while the worker is runnable makes the next `wait` return
/// immediately. Coalescing any number of wakes into one is fine, and
/// `wait` may return spuriously; the worker re-checks ring state on
/// every pass.
pub unsafe trait Scheduler {
    /// Run `f` with scheduler-wide mutual exclusion.
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R;

    /// Wake the worker task. Callable from callback context.
    fn wake(&self);

    /// Park the worker until the next wake. Called only by the worker.
    fn wait(&self);
}
