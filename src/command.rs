//! Command opcodes and the executor seam
//!
//! The transport layer never interprets a packet beyond byte 0, the
//! command opcode. Opcodes matter here for exactly two reasons: batch
//! detection (`QUEUE_COMMANDS` / `EXECUTE_COMMANDS`) and diagnostics.
//! Everything else about a command is the executor's business.

use crate::DAP_PACKET_SIZE;

/// Marks a request as part of a deferred batch. The dispatcher relabels
/// these to [`EXECUTE_COMMANDS`] once the whole batch is buffered.
pub const QUEUE_COMMANDS: u8 = 0x7e;
/// Executes a previously queued batch entry.
pub const EXECUTE_COMMANDS: u8 = 0x7f;

pub const INFO: u8 = 0x00;
pub const HOST_STATUS: u8 = 0x01;
pub const CONNECT: u8 = 0x02;
pub const DISCONNECT: u8 = 0x03;
pub const TRANSFER_CONFIGURE: u8 = 0x04;
pub const TRANSFER: u8 = 0x05;
pub const TRANSFER_BLOCK: u8 = 0x06;
pub const TRANSFER_ABORT: u8 = 0x07;
pub const WRITE_ABORT: u8 = 0x08;
pub const DELAY: u8 = 0x09;
pub const RESET_TARGET: u8 = 0x0a;
pub const SWJ_PINS: u8 = 0x10;
pub const SWJ_CLOCK: u8 = 0x11;
pub const SWJ_SEQUENCE: u8 = 0x12;
pub const SWD_CONFIGURE: u8 = 0x13;
pub const JTAG_SEQUENCE: u8 = 0x14;
pub const JTAG_CONFIGURE: u8 = 0x15;
pub const JTAG_IDCODE: u8 = 0x16;
pub const SWO_TRANSPORT: u8 = 0x17;
pub const SWO_MODE: u8 = 0x18;
pub const SWO_BAUDRATE: u8 = 0x19;
pub const SWO_CONTROL: u8 = 0x1a;
pub const SWO_STATUS: u8 = 0x1b;
pub const SWO_DATA: u8 = 0x1c;
pub const SWD_SEQUENCE: u8 = 0x1d;
pub const SWO_EXTENDED_STATUS: u8 = 0x1e;

/// Human-readable command name for trace output.
pub fn name(opcode: u8) -> &'static str {
    match opcode {
        INFO => "DAP_Info",
        HOST_STATUS => "DAP_HostStatus",
        CONNECT => "DAP_Connect",
        DISCONNECT => "DAP_Disconnect",
        TRANSFER_CONFIGURE => "DAP_TransferConfigure",
        TRANSFER => "DAP_Transfer",
        TRANSFER_BLOCK => "DAP_TransferBlock",
        TRANSFER_ABORT => "DAP_TransferAbort",
        WRITE_ABORT => "DAP_WriteABORT",
        DELAY => "DAP_Delay",
        RESET_TARGET => "DAP_ResetTarget",
        SWJ_PINS => "DAP_SWJ_Pins",
        SWJ_CLOCK => "DAP_SWJ_Clock",
        SWJ_SEQUENCE => "DAP_SWJ_Sequence",
        SWD_CONFIGURE => "DAP_SWD_Configure",
        SWD_SEQUENCE => "DAP_SWD_Sequence",
        JTAG_SEQUENCE => "DAP_JTAG_Sequence",
        JTAG_CONFIGURE => "DAP_JTAG_Configure",
        JTAG_IDCODE => "DAP_JTAG_IDCODE",
        SWO_TRANSPORT => "DAP_SWO_Transport",
        SWO_MODE => "DAP_SWO_Mode",
        SWO_BAUDRATE => "DAP_SWO_Baudrate",
        SWO_CONTROL => "DAP_SWO_Control",
        SWO_STATUS => "DAP_SWO_Status",
        SWO_EXTENDED_STATUS => "DAP_SWO_ExtendedStatus",
        SWO_DATA => "DAP_SWO_Data",
        QUEUE_COMMANDS => "DAP_QueueCommands",
        EXECUTE_COMMANDS => "DAP_ExecuteCommands",
        _ => "DAP_Unknown",
    }
}

/// The command execution engine.
///
/// The dispatch worker is the only caller, so an implementation is never
/// invoked concurrently with itself and may keep protocol state in `&mut
/// self` without interior synchronization.
///
/// `execute` receives the full request buffer (trailing bytes past the
/// received length are stale), writes the response into `response`, and
/// returns the number of response bytes to transmit. The returned length
/// must not exceed [`DAP_PACKET_SIZE`](crate::DAP_PACKET_SIZE); a larger
/// value is a bug in the executor, not a runtime condition this layer
/// recovers from.
///
/// The opcode table must include [`QUEUE_COMMANDS`] and
/// [`EXECUTE_COMMANDS`] in addition to the application command set. An
/// opcode this layer doesn't recognize still reaches the executor
/// unchanged; the executor is the authority on opcode validity.
pub trait Execute {
    fn execute(
        &mut self,
        request: &[u8; DAP_PACKET_SIZE],
        response: &mut [u8; DAP_PACKET_SIZE],
    ) -> usize;
}

#[cfg(test)]
mod tests {
    use super::name;

    #[test]
    fn names_cover_the_batch_opcodes() {
        assert_eq!(name(super::QUEUE_COMMANDS), "DAP_QueueCommands");
        assert_eq!(name(super::EXECUTE_COMMANDS), "DAP_ExecuteCommands");
        assert_eq!(name(super::CONNECT), "DAP_Connect");
        assert_eq!(name(0xf3), "DAP_Unknown");
    }
}
