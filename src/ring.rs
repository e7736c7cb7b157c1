//! Fixed-capacity packet rings
//!
//! Each direction of the bulk pipe owns one `PacketRing`. A ring is a
//! circular array of packet slots with free-running cursors: the producer
//! commits slots by advancing the write cursor, the consumer releases them
//! by advancing the read cursor, and the active index is `cursor % SLOTS`.
//! One slot is permanently reserved so that a full ring never looks empty;
//! usable capacity is `SLOTS - 1`.
//!
//! Cursors are 64-bit and never wrap in practice, so the modular index
//! stays coherent for any `SLOTS >= 2`, and "empty" is plain cursor
//! equality.
//!
//! The ring performs no synchronization itself. Callers serialize access;
//! see the bridge module for the sharing rules.

use crate::DAP_PACKET_SIZE;

/// One packet slot: the packet bytes, plus the payload length recorded
/// when the slot was filled.
///
/// The transport layer treats the contents as opaque except for byte 0,
/// the command opcode.
pub(crate) struct Slot {
    pub data: [u8; DAP_PACKET_SIZE],
    len: u16,
}

impl Slot {
    const fn new() -> Self {
        Slot {
            data: [0; DAP_PACKET_SIZE],
            len: 0,
        }
    }

    /// Copy `packet` into the slot and record its length.
    ///
    /// Bytes beyond `packet.len()` keep whatever the slot held before;
    /// consumers that read the full buffer see stale tail bytes, exactly
    /// as they would with a hardware-filled buffer.
    pub fn fill(&mut self, packet: &[u8]) {
        debug_assert!(packet.len() <= DAP_PACKET_SIZE);
        self.data[..packet.len()].copy_from_slice(packet);
        self.len = packet.len() as u16;
    }

    /// The recorded payload, `len` bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }

    /// Recorded payload length.
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }
}

/// A circular FIFO of packet slots.
pub(crate) struct PacketRing<const SLOTS: usize> {
    slots: [Slot; SLOTS],
    wptr: u64,
    rptr: u64,
    /// Set when an inbound completion found the ring at capacity and the
    /// packet is being held in the uncommitted write slot.
    pub was_full: bool,
    /// Tracks whether the outbound side has a transfer chain in flight.
    /// True when the next completion drains the ring.
    pub was_empty: bool,
    /// Saved batch-scan cursor while the consumer is parked mid-batch.
    /// Lives with the cursors so `reset` invalidates all three together.
    pub scan: Option<u64>,
}

impl<const SLOTS: usize> PacketRing<SLOTS> {
    pub const fn new() -> Self {
        const SLOT: Slot = Slot::new();
        PacketRing {
            slots: [SLOT; SLOTS],
            wptr: 0,
            rptr: 0,
            was_full: false,
            was_empty: true,
            scan: None,
        }
    }

    /// Re-initialize cursors and flags. Called at interface open, before
    /// any transfer is armed.
    pub fn reset(&mut self) {
        self.wptr = 0;
        self.rptr = 0;
        self.was_full = false;
        self.was_empty = true;
        self.scan = None;
    }

    pub fn write_cursor(&self) -> u64 {
        self.wptr
    }

    pub fn read_cursor(&self) -> u64 {
        self.rptr
    }

    /// Committed, unconsumed slots.
    pub fn occupancy(&self) -> usize {
        (self.wptr - self.rptr) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.wptr == self.rptr
    }

    /// At capacity: committing one more slot would collide the cursors.
    pub fn is_full(&self) -> bool {
        self.occupancy() == SLOTS - 1
    }

    /// The slot the producer fills next. Not visible to the consumer
    /// until committed.
    pub fn write_slot_mut(&mut self) -> &mut Slot {
        &mut self.slots[self.wptr as usize % SLOTS]
    }

    /// The oldest committed slot.
    pub fn read_slot(&self) -> &Slot {
        &self.slots[self.rptr as usize % SLOTS]
    }

    /// Slot at an arbitrary cursor position. Used by the batch scan to
    /// inspect committed-but-unconsumed slots.
    pub fn slot_at_mut(&mut self, cursor: u64) -> &mut Slot {
        &mut self.slots[cursor as usize % SLOTS]
    }

    /// Publish the write slot to the consumer.
    pub fn commit_write(&mut self) {
        debug_assert!(!self.is_full());
        self.wptr += 1;
    }

    /// Return the read slot to the producer.
    pub fn release_read(&mut self) {
        debug_assert!(!self.is_empty());
        self.rptr += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::PacketRing;

    #[test]
    fn fresh_ring_is_empty() {
        let ring = PacketRing::<4>::new();
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.occupancy(), 0);
        assert!(!ring.was_full);
        assert!(ring.was_empty);
    }

    #[test]
    fn capacity_is_slots_minus_one() {
        let mut ring = PacketRing::<4>::new();
        for _ in 0..3 {
            assert!(!ring.is_full());
            ring.commit_write();
        }
        assert!(ring.is_full());
        assert_eq!(ring.occupancy(), 3);

        ring.release_read();
        assert!(!ring.is_full());
        assert_eq!(ring.occupancy(), 2);
    }

    #[test]
    fn fifo_across_index_wrap() {
        let mut ring = PacketRing::<4>::new();
        // Run the cursors a few times around the array and check that
        // payloads come out in commit order.
        for round in 0u8..10 {
            ring.write_slot_mut().fill(&[round, 0xa5]);
            ring.commit_write();
            assert_eq!(ring.read_slot().payload(), &[round, 0xa5]);
            ring.release_read();
            assert!(ring.is_empty());
        }
        assert_eq!(ring.write_cursor(), 10);
        assert_eq!(ring.read_cursor(), 10);
    }

    #[test]
    fn fill_records_length() {
        let mut ring = PacketRing::<2>::new();
        ring.write_slot_mut().fill(&[1, 2, 3]);
        assert_eq!(ring.write_slot_mut().len(), 3);
        ring.write_slot_mut().fill(&[]);
        assert_eq!(ring.write_slot_mut().len(), 0);
        assert!(ring.write_slot_mut().payload().is_empty());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut ring = PacketRing::<4>::new();
        ring.commit_write();
        ring.commit_write();
        ring.release_read();
        ring.was_full = true;
        ring.was_empty = false;
        ring.scan = Some(2);

        ring.reset();
        assert!(ring.is_empty());
        assert!(!ring.was_full);
        assert!(ring.was_empty);
        assert!(ring.scan.is_none());
        assert_eq!(ring.write_cursor(), 0);
        assert_eq!(ring.read_cursor(), 0);
    }
}
