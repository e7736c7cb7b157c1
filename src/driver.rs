//! Driver lifecycle glue between the USB stack and the bridge
//!
//! The stack invokes `open`, `reset`, and the transfer callback from one
//! context (its own task), so the handler keeps its endpoint bookkeeping
//! in plain fields; only the bridge itself is shared with the worker.

use usb_device::endpoint::EndpointAddress;
use usb_device::UsbDirection;

use crate::bridge::DapBridge;
use crate::{Scheduler, Transport, DAP_PACKET_COUNT};

/// Vendor-specific interface class carried by the DAP interface.
pub const DAP_INTERFACE_CLASS: u8 = 0xff;
pub const DAP_INTERFACE_SUBCLASS: u8 = 0x00;
pub const DAP_INTERFACE_PROTOCOL: u8 = 0x00;

/// Size of an interface descriptor on the wire.
const INTERFACE_DESC_LEN: usize = 9;
/// Size of an endpoint descriptor on the wire.
const ENDPOINT_DESC_LEN: usize = 7;

/// The parts of an interface descriptor the handler inspects.
///
/// The stack parses the raw descriptor; this is the digested form it
/// hands to [`DapHandler::open`].
pub struct InterfaceDescriptor<'a> {
    pub interface_number: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    /// Bulk endpoints declared by the interface, in descriptor order.
    pub endpoints: &'a [EndpointAddress],
}

/// Result code reported with a transfer completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferResult {
    Success,
    Failed,
    Stalled,
    TimedOut,
}

/// Payload of a transfer completion.
pub enum Completion<'a> {
    /// An OUT (host to device) transfer finished; carries the received
    /// packet.
    Request(&'a [u8]),
    /// An IN (device to host) transfer finished; carries the transmitted
    /// byte count.
    Response(usize),
}

/// Endpoint lifecycle handler for the DAP interface.
pub struct DapHandler<'a, T, S, const SLOTS: usize = DAP_PACKET_COUNT> {
    bridge: &'a DapBridge<T, S, SLOTS>,
    interface_number: u8,
    out_ep: Option<EndpointAddress>,
    in_ep: Option<EndpointAddress>,
}

impl<'a, T, S, const SLOTS: usize> DapHandler<'a, T, S, SLOTS>
where
    T: Transport,
    S: Scheduler,
{
    pub fn new(bridge: &'a DapBridge<T, S, SLOTS>) -> Self {
        DapHandler {
            bridge,
            interface_number: 0,
            out_ep: None,
            in_ep: None,
        }
    }

    /// Claim the interface if it is ours.
    ///
    /// Checks the vendor class triple, discovers the OUT and IN bulk
    /// endpoints, re-initializes both rings, and arms the first receive.
    /// `max_len` is the number of descriptor bytes the stack has left in
    /// its window; an interface whose descriptors don't fit is declined.
    /// Returns the number of descriptor bytes consumed, or `None` to
    /// decline the interface.
    pub fn open(&mut self, descriptor: &InterfaceDescriptor, max_len: u16) -> Option<u16> {
        if descriptor.class != DAP_INTERFACE_CLASS
            || descriptor.subclass != DAP_INTERFACE_SUBCLASS
            || descriptor.protocol != DAP_INTERFACE_PROTOCOL
        {
            return None;
        }

        let consumed = INTERFACE_DESC_LEN + descriptor.endpoints.len() * ENDPOINT_DESC_LEN;
        if consumed > usize::from(max_len) {
            warn!(
                "declining DAP interface {}: {} descriptor bytes, {} available",
                descriptor.interface_number, consumed, max_len
            );
            return None;
        }

        let find = |direction: UsbDirection| {
            descriptor
                .endpoints
                .iter()
                .copied()
                .find(|ep| ep.direction() == direction)
        };
        let out_ep = find(UsbDirection::Out)?;
        let in_ep = find(UsbDirection::In)?;

        self.interface_number = descriptor.interface_number;
        self.out_ep = Some(out_ep);
        self.in_ep = Some(in_ep);

        // Rings must be clean before the first transfer is armed.
        self.bridge.open();
        debug!(
            "opened DAP interface {}: out=EP{} in=EP{}",
            descriptor.interface_number,
            out_ep.index(),
            in_ep.index()
        );

        Some(consumed as u16)
    }

    /// Bus reset: forget the endpoints and re-initialize the rings.
    pub fn reset(&mut self) {
        self.interface_number = 0;
        self.out_ep = None;
        self.in_ep = None;
        self.bridge.reset();
    }

    /// Control requests are not part of this protocol; always decline.
    pub fn control_transfer(&mut self, _request: &usb_device::control::Request) -> bool {
        false
    }

    /// Single transfer-completion entry point; routes by endpoint.
    ///
    /// Returns `true` when the completion was accepted by the bridge,
    /// `false` for foreign endpoints, failed results, or transport
    /// faults.
    pub fn transfer_complete(
        &mut self,
        ep_addr: EndpointAddress,
        result: TransferResult,
        completion: Completion,
    ) -> bool {
        if result != TransferResult::Success {
            warn!(
                "EP{} {:?} transfer completed with {:?}",
                ep_addr.index(),
                ep_addr.direction(),
                result
            );
            return false;
        }

        match completion {
            Completion::Request(packet) if Some(ep_addr) == self.out_ep => {
                self.bridge.request_complete(packet)
            }
            Completion::Response(bytes) if Some(ep_addr) == self.in_ep => {
                self.bridge.response_complete(bytes)
            }
            _ => false,
        }
    }
}
