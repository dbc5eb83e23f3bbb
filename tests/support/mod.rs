#![allow(dead_code)]

use bytes::{BufMut, Bytes, BytesMut};

use meshcfg::exchange::{
    BlockAck, ConfigurationStatusListener, InboundMessage, MeshManagerListener, MeshTransport,
    OutboundMessage, OutboundRequest, StateTag,
};
use meshcfg::protocol::{
    AppKeyStatus, BindingKind, CompositionDataStatus, GenericOnOffStatus, MeshModel,
    ModelAppStatus, ModelPublicationStatus, ModelSubscriptionStatus, SubscriptionAction,
};
use meshcfg::protocol::AccessMessage;
use meshcfg::{Address, AppKey, Error, ProvisionedNode, Result, UnicastAddress};

const TAG_ACCESS: u8 = 0x00;
const TAG_BLOCK_ACK: u8 = 0x01;
const TAG_SEGMENT: u8 = 0x02;

/// Bytes of access payload carried per segment.
pub const SEGMENT_PAYLOAD: usize = 12;

/// In-memory bearer. Outgoing access payloads longer than the unsegmented
/// limit are split into tagged segments when segmentation is enabled.
#[derive(Debug, Default)]
pub struct SimBearer {
    pub sent: Vec<Bytes>,
    pub requests: Vec<OutboundRequest>,
    pub segmentation: bool,
    pub refuse: bool,
    next_seq: u16,
}

impl SimBearer {
    pub fn segmenting() -> Self {
        Self {
            segmentation: true,
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn last_seq_zero(&self) -> u16 {
        self.next_seq.wrapping_sub(1) & 0x1FFF
    }
}

impl MeshTransport for SimBearer {
    fn create_message(
        &mut self,
        _node: &ProvisionedNode,
        request: &OutboundRequest,
    ) -> Result<OutboundMessage> {
        if self.refuse {
            return Err(Error::Transport("bearer down".into()));
        }
        self.requests.push(request.clone());
        let payload = request.message.encode();
        let seq_zero = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        if !self.segmentation || payload.len() <= meshcfg::protocol::MAX_UNSEGMENTED_ACCESS_PAYLOAD
        {
            return Ok(OutboundMessage::unsegmented(payload));
        }
        let segments = payload
            .chunks(SEGMENT_PAYLOAD)
            .enumerate()
            .map(|(seg_o, chunk)| {
                let mut pdu = BytesMut::with_capacity(chunk.len() + 2);
                pdu.put_u8(TAG_SEGMENT);
                pdu.put_u8(seg_o as u8);
                pdu.put_slice(chunk);
                pdu.freeze()
            })
            .collect();
        OutboundMessage::segmented(seq_zero, segments)
    }

    fn parse_pdu(&mut self, _node: &ProvisionedNode, pdu: &[u8]) -> Option<InboundMessage> {
        match pdu.first()? {
            &TAG_ACCESS if pdu.len() >= 5 => Some(InboundMessage::Access {
                src: UnicastAddress::new(u16::from_le_bytes([pdu[1], pdu[2]])).ok()?,
                dst: Address(u16::from_le_bytes([pdu[3], pdu[4]])),
                payload: Bytes::copy_from_slice(&pdu[5..]),
            }),
            &TAG_BLOCK_ACK if pdu.len() == 7 => Some(InboundMessage::BlockAck(BlockAck {
                seq_zero: u16::from_le_bytes([pdu[1], pdu[2]]),
                block_ack: u32::from_le_bytes([pdu[3], pdu[4], pdu[5], pdu[6]]),
            })),
            _ => None,
        }
    }

    fn send_pdu(&mut self, _node: &ProvisionedNode, pdu: &Bytes) {
        self.sent.push(pdu.clone());
    }
}

/// Notification carrying `message` from `src` to `dst`.
pub fn access_pdu(src: UnicastAddress, dst: UnicastAddress, message: &AccessMessage) -> Vec<u8> {
    let mut pdu = vec![TAG_ACCESS];
    pdu.extend_from_slice(&src.value().to_le_bytes());
    pdu.extend_from_slice(&dst.value().to_le_bytes());
    pdu.extend_from_slice(&message.encode());
    pdu
}

/// Notification carrying a segment acknowledgment.
pub fn block_ack_pdu(seq_zero: u16, block_ack: u32) -> Vec<u8> {
    let mut pdu = vec![TAG_BLOCK_ACK];
    pdu.extend_from_slice(&seq_zero.to_le_bytes());
    pdu.extend_from_slice(&block_ack.to_le_bytes());
    pdu
}

/// SegO of a PDU produced by [`SimBearer`], if it is a segment.
pub fn seg_o(pdu: &[u8]) -> Option<u8> {
    (pdu.first() == Some(&TAG_SEGMENT)).then(|| pdu[1])
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Sent(&'static str),
    CompositionData(CompositionDataStatus),
    AppKey(AppKeyStatus, AppKey),
    Binding(BindingKind, ModelAppStatus),
    Publication(ModelPublicationStatus),
    Subscription(SubscriptionAction, ModelSubscriptionStatus),
    NodeReset,
    OnOff(MeshModel, GenericOnOffStatus),
    BlockAck(BlockAck),
    Failed(StateTag),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    /// Events other than "sent" and block ack notices.
    pub fn received(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| !matches!(event, Event::Sent(_) | Event::BlockAck(_)))
            .collect()
    }
}

impl ConfigurationStatusListener for Recorder {
    fn on_composition_data_get_sent(&mut self, _node: &ProvisionedNode) {
        self.events.push(Event::Sent("composition data get"));
    }

    fn on_composition_data_status_received(
        &mut self,
        _node: &ProvisionedNode,
        status: &CompositionDataStatus,
    ) {
        self.events.push(Event::CompositionData(status.clone()));
    }

    fn on_app_key_add_sent(&mut self, _node: &ProvisionedNode) {
        self.events.push(Event::Sent("app key add"));
    }

    fn on_app_key_status_received(
        &mut self,
        _node: &ProvisionedNode,
        status: &AppKeyStatus,
        app_key: &AppKey,
    ) {
        self.events.push(Event::AppKey(*status, *app_key));
    }

    fn on_app_key_binding_sent(&mut self, _node: &ProvisionedNode, kind: BindingKind) {
        self.events.push(Event::Sent(match kind {
            BindingKind::Bind => "bind",
            BindingKind::Unbind => "unbind",
        }));
    }

    fn on_app_key_binding_status_received(
        &mut self,
        _node: &ProvisionedNode,
        kind: BindingKind,
        status: &ModelAppStatus,
    ) {
        self.events.push(Event::Binding(kind, *status));
    }

    fn on_publication_set_sent(&mut self, _node: &ProvisionedNode) {
        self.events.push(Event::Sent("publication set"));
    }

    fn on_publication_status_received(
        &mut self,
        _node: &ProvisionedNode,
        status: &ModelPublicationStatus,
    ) {
        self.events.push(Event::Publication(*status));
    }

    fn on_subscription_sent(&mut self, _node: &ProvisionedNode, action: SubscriptionAction) {
        self.events.push(Event::Sent(match action {
            SubscriptionAction::Add => "subscription add",
            SubscriptionAction::Delete => "subscription delete",
        }));
    }

    fn on_subscription_status_received(
        &mut self,
        _node: &ProvisionedNode,
        action: SubscriptionAction,
        status: &ModelSubscriptionStatus,
    ) {
        self.events.push(Event::Subscription(action, *status));
    }

    fn on_node_reset_sent(&mut self, _node: &ProvisionedNode) {
        self.events.push(Event::Sent("node reset"));
    }

    fn on_node_reset_status_received(&mut self, _node: &ProvisionedNode) {
        self.events.push(Event::NodeReset);
    }

    fn on_generic_on_off_get_sent(&mut self, _node: &ProvisionedNode, _model: &MeshModel) {
        self.events.push(Event::Sent("onoff get"));
    }

    fn on_generic_on_off_set_sent(&mut self, _node: &ProvisionedNode, _model: &MeshModel) {
        self.events.push(Event::Sent("onoff set"));
    }

    fn on_generic_on_off_set_unacknowledged_sent(
        &mut self,
        _node: &ProvisionedNode,
        _model: &MeshModel,
    ) {
        self.events.push(Event::Sent("onoff set unacknowledged"));
    }

    fn on_generic_on_off_status_received(
        &mut self,
        _node: &ProvisionedNode,
        model: &MeshModel,
        status: &GenericOnOffStatus,
    ) {
        self.events.push(Event::OnOff(model.clone(), *status));
    }

    fn on_block_acknowledgement_received(&mut self, _node: &ProvisionedNode, ack: &BlockAck) {
        self.events.push(Event::BlockAck(*ack));
    }

    fn on_transaction_failed(&mut self, _node: &ProvisionedNode, state: StateTag) {
        self.events.push(Event::Failed(state));
    }
}

#[derive(Debug, Default)]
pub struct AddressBook {
    pub changes: Vec<UnicastAddress>,
}

impl MeshManagerListener for AddressBook {
    fn on_unicast_address_changed(&mut self, next: UnicastAddress) {
        self.changes.push(next);
    }
}

pub fn unicast(address: u16) -> UnicastAddress {
    UnicastAddress::new(address).unwrap()
}

pub fn node(name: &str, address: u16) -> ProvisionedNode {
    ProvisionedNode::new(name, unicast(address), unicast(0x0001))
}
