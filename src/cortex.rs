//! Cortex-M scheduler primitives
//!
//! A ready-made [`Scheduler`] for single-core Cortex-M firmware that
//! runs the worker as a thread-mode loop and the USB stack's callbacks
//! from interrupt context. The critical section masks interrupts, and
//! the event register provides the sticky wake: `sev()` latches an
//! event, and `wfe()` returns immediately when one is pending.
//!
//! `wfe()` also returns on any interrupt, so the worker sees spurious
//! wakes; that's fine, it re-checks the rings on every pass.
//!
//! Do not use this on multi-core parts where another core services USB
//! interrupts; masking interrupts on one core is not mutual exclusion
//! against the other.

use crate::Scheduler;

pub struct CortexMScheduler(());

impl CortexMScheduler {
    pub const fn new() -> Self {
        CortexMScheduler(())
    }
}

impl Default for CortexMScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// Safety: with interrupts masked on a single core, neither the USB ISR
// nor any preempting context can run, which is scheduler-wide mutual
// exclusion. The event register is set by `sev` from any context and
// consumed by the next `wfe`.
unsafe impl Scheduler for CortexMScheduler {
    fn critical<R>(&self, f: impl FnOnce() -> R) -> R {
        cortex_m::interrupt::free(|_| f())
    }

    fn wake(&self) {
        cortex_m::asm::sev();
    }

    fn wait(&self) {
        cortex_m::asm::wfe();
    }
}
