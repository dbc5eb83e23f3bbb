//! Lower transport collaborator contract
//!
//! The engine never touches keys, nonces or segment headers. It hands an
//! [`OutboundRequest`] to the transport, gets back the network PDUs to send,
//! and later asks the transport to make sense of whatever the bearer delivered.

use bytes::Bytes;

use crate::protocol::{
    AccessMessage, Address, Error, KeyIndex, MAX_SEGMENTS, MicSize, ProvisionedNode, Result,
    UnicastAddress,
};

/// Key used to encrypt an access message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionKey {
    /// The node's device key (configuration messages)
    Device,
    /// An application key by index
    Application(KeyIndex),
}

/// Access message plus everything the lower transport needs to secure it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Source element of the client
    pub src: UnicastAddress,
    /// Destination address
    pub dst: Address,
    /// Encryption key selector
    pub key: EncryptionKey,
    /// TransMIC size
    pub mic: MicSize,
    /// Plaintext access message
    pub message: AccessMessage,
}

/// Network PDUs produced for one access message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    seq_zero: u16,
    segments: Vec<Bytes>,
}

impl OutboundMessage {
    /// Segmented message: one PDU per segment, in SegO order
    pub fn segmented(seq_zero: u16, segments: Vec<Bytes>) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::EmptyMessage);
        }
        if segments.len() > MAX_SEGMENTS {
            return Err(Error::TooManySegments {
                count: segments.len(),
                max: MAX_SEGMENTS,
            });
        }
        Ok(Self {
            seq_zero: seq_zero & 0x1FFF,
            segments,
        })
    }

    /// Single unsegmented PDU
    #[must_use]
    pub fn unsegmented(pdu: Bytes) -> Self {
        Self {
            seq_zero: 0,
            segments: vec![pdu],
        }
    }

    /// Low 13 bits of the first segment's sequence number
    #[must_use]
    pub const fn seq_zero(&self) -> u16 {
        self.seq_zero
    }

    /// Network PDUs in send order
    #[must_use]
    pub fn segments(&self) -> &[Bytes] {
        &self.segments
    }

    pub(crate) fn into_parts(self) -> (u16, Vec<Bytes>) {
        (self.seq_zero, self.segments)
    }
}

/// Decoded lower transport Segment Acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAck {
    /// SeqZero of the acknowledged transaction
    pub seq_zero: u16,
    /// Bit n set means segment n was received
    pub block_ack: u32,
}

/// What the transport made of an incoming PDU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Fully reassembled and decrypted access payload
    Access {
        /// Sending element
        src: UnicastAddress,
        /// Destination the message was addressed to
        dst: Address,
        /// Opcode and parameters
        payload: Bytes,
    },
    /// Segment acknowledgment for one of our segmented sends
    BlockAck(BlockAck),
}

/// Lower transport / bearer used by the exchange engine
pub trait MeshTransport {
    /// Encrypt and, when needed, segment a request into network PDUs.
    fn create_message(
        &mut self,
        node: &ProvisionedNode,
        request: &OutboundRequest,
    ) -> Result<OutboundMessage>;

    /// Decrypt a network PDU.
    ///
    /// Returns `None` for PDUs that are not for us, fail authentication, or are
    /// a segment of a message still being reassembled.
    fn parse_pdu(&mut self, node: &ProvisionedNode, pdu: &[u8]) -> Option<InboundMessage>;

    /// Hand a network PDU to the bearer. Completion is reported later through
    /// the coordinator's write-complete entry point.
    fn send_pdu(&mut self, node: &ProvisionedNode, pdu: &Bytes);
}
