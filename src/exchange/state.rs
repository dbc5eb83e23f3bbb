//! Message states: one variant per request or status the client can be in.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::protocol::{
    AccessMessage, Address, AppKey, AppKeyStatus, BindingKind, CompositionDataStatus, GenericOnOffStatus,
    MeshModel, ModelAppStatus, ModelPublicationStatus, ModelSubscriptionStatus, Opcode,
    ProvisionedNode, Result, SubscriptionAction, UnicastAddress,
};

use super::listener::{ConfigurationStatusListener, MeshManagerListener};
use super::segmentation::SegmentedTransfer;
use super::transport::{InboundMessage, MeshTransport, OutboundRequest};

/// Correlates a request with its status across both event sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    /// Generate a random id
    #[must_use]
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        let bytes = uuid.as_bytes();
        Self(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Raw value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Stable identifier of a message state, used for dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateTag {
    /// Idle, no exchange open
    NoOperation,
    /// Composition Data Get sent
    CompositionDataGet,
    /// Awaiting Composition Data Status
    CompositionDataStatus,
    /// AppKey Add sent
    AppKeyAdd,
    /// Awaiting AppKey Status
    AppKeyStatus,
    /// Model App Bind sent
    ModelAppBind,
    /// Model App Unbind sent
    ModelAppUnbind,
    /// Awaiting Model App Status
    ModelAppStatus,
    /// Model Publication Set sent
    ModelPublicationSet,
    /// Awaiting Model Publication Status
    ModelPublicationStatus,
    /// Model Subscription Add sent
    ModelSubscriptionAdd,
    /// Model Subscription Delete sent
    ModelSubscriptionDelete,
    /// Awaiting Model Subscription Status
    ModelSubscriptionStatus,
    /// Node Reset sent
    NodeReset,
    /// Awaiting Node Reset Status
    NodeResetStatus,
    /// Generic OnOff Get sent
    GenericOnOffGet,
    /// Generic OnOff Set sent
    GenericOnOffSet,
    /// Generic OnOff Set Unacknowledged sent
    GenericOnOffSetUnacknowledged,
    /// Awaiting Generic OnOff Status
    GenericOnOffStatus,
}

/// Broad class of a state, selecting how notifications are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateCategory {
    /// No exchange open
    Idle,
    /// Request sent, status variant not yet installed
    Request,
    /// Awaiting a status message
    Status,
}

impl StateTag {
    /// Category of this state
    #[must_use]
    pub const fn category(self) -> StateCategory {
        match self {
            Self::NoOperation => StateCategory::Idle,
            Self::CompositionDataGet
            | Self::AppKeyAdd
            | Self::ModelAppBind
            | Self::ModelAppUnbind
            | Self::ModelPublicationSet
            | Self::ModelSubscriptionAdd
            | Self::ModelSubscriptionDelete
            | Self::NodeReset
            | Self::GenericOnOffGet
            | Self::GenericOnOffSet
            | Self::GenericOnOffSetUnacknowledged => StateCategory::Request,
            Self::CompositionDataStatus
            | Self::AppKeyStatus
            | Self::ModelAppStatus
            | Self::ModelPublicationStatus
            | Self::ModelSubscriptionStatus
            | Self::NodeResetStatus
            | Self::GenericOnOffStatus => StateCategory::Status,
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoOperation => "NoOperation",
            Self::CompositionDataGet => "CompositionDataGet",
            Self::CompositionDataStatus => "CompositionDataStatus",
            Self::AppKeyAdd => "AppKeyAdd",
            Self::AppKeyStatus => "AppKeyStatus",
            Self::ModelAppBind => "ModelAppBind",
            Self::ModelAppUnbind => "ModelAppUnbind",
            Self::ModelAppStatus => "ModelAppStatus",
            Self::ModelPublicationSet => "ModelPublicationSet",
            Self::ModelPublicationStatus => "ModelPublicationStatus",
            Self::ModelSubscriptionAdd => "ModelSubscriptionAdd",
            Self::ModelSubscriptionDelete => "ModelSubscriptionDelete",
            Self::ModelSubscriptionStatus => "ModelSubscriptionStatus",
            Self::NodeReset => "NodeReset",
            Self::NodeResetStatus => "NodeResetStatus",
            Self::GenericOnOffGet => "GenericOnOffGet",
            Self::GenericOnOffSet => "GenericOnOffSet",
            Self::GenericOnOffSetUnacknowledged => "GenericOnOffSetUnacknowledged",
            Self::GenericOnOffStatus => "GenericOnOffStatus",
        };
        write!(f, "{name}")
    }
}

/// Collaborators a state needs while sending or parsing
pub struct ExchangeContext<'a> {
    pub(crate) transport: &'a mut dyn MeshTransport,
    pub(crate) status: &'a mut dyn ConfigurationStatusListener,
    pub(crate) manager: &'a mut dyn MeshManagerListener,
}

impl<'a> ExchangeContext<'a> {
    /// Bundle the collaborators for one state operation
    pub fn new(
        transport: &'a mut dyn MeshTransport,
        status: &'a mut dyn ConfigurationStatusListener,
        manager: &'a mut dyn MeshManagerListener,
    ) -> Self {
        Self {
            transport,
            status,
            manager,
        }
    }
}

impl fmt::Debug for ExchangeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeContext").finish_non_exhaustive()
    }
}

/// Request half of an exchange
#[derive(Debug, Clone)]
pub struct Outgoing {
    exchange: ExchangeId,
    node: Arc<ProvisionedNode>,
    request: OutboundRequest,
    transfer: Option<SegmentedTransfer>,
}

impl Outgoing {
    /// New request for `node`, not yet sent
    #[must_use]
    pub fn new(exchange: ExchangeId, node: Arc<ProvisionedNode>, request: OutboundRequest) -> Self {
        Self {
            exchange,
            node,
            request,
            transfer: None,
        }
    }

    /// Exchange this request opened
    #[must_use]
    pub const fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    /// Target node
    #[must_use]
    pub fn node(&self) -> &Arc<ProvisionedNode> {
        &self.node
    }

    /// Request handed to the transport
    #[must_use]
    pub const fn request(&self) -> &OutboundRequest {
        &self.request
    }

    /// Segment bookkeeping, once sent
    #[must_use]
    pub const fn transfer(&self) -> Option<&SegmentedTransfer> {
        self.transfer.as_ref()
    }

    fn is_segmented(&self) -> bool {
        self.transfer
            .as_ref()
            .is_some_and(SegmentedTransfer::is_segmented)
    }

    fn send(&mut self, ctx: &mut ExchangeContext<'_>) -> Result<()> {
        let message = ctx.transport.create_message(&self.node, &self.request)?;
        let transfer = SegmentedTransfer::new(message);
        for pdu in transfer.segments() {
            ctx.transport.send_pdu(&self.node, pdu);
        }
        debug!(
            exchange = %self.exchange,
            opcode = %self.request.message.opcode(),
            segments = transfer.segments().len(),
            "request handed to transport"
        );
        self.transfer = Some(transfer);
        Ok(())
    }

    fn retransmission_required(&mut self, ctx: &mut ExchangeContext<'_>, pdu: &[u8]) -> bool {
        let Some(transfer) = self.transfer.as_mut() else {
            return false;
        };
        match ctx.transport.parse_pdu(&self.node, pdu) {
            Some(InboundMessage::BlockAck(ack)) => {
                ctx.status.on_block_acknowledgement_received(&self.node, &ack);
                transfer.apply_block_ack(&ack)
            }
            _ => false,
        }
    }

    fn resend(&mut self, ctx: &mut ExchangeContext<'_>) {
        let Some(transfer) = self.transfer.as_mut() else {
            return;
        };
        let mut resent = 0usize;
        for (_, pdu) in transfer.missing() {
            ctx.transport.send_pdu(&self.node, pdu);
            resent += 1;
        }
        transfer.mark_resent();
        debug!(
            exchange = %self.exchange,
            seq_zero = transfer.seq_zero(),
            resent,
            round = transfer.resends(),
            "resent unacknowledged segments"
        );
    }
}

/// Status half of an exchange
#[derive(Debug, Clone)]
pub struct Awaiting {
    exchange: ExchangeId,
    node: Arc<ProvisionedNode>,
    src: UnicastAddress,
    expected: Opcode,
}

impl Awaiting {
    /// Await `expected` addressed to `src` from `node`
    #[must_use]
    pub fn new(
        exchange: ExchangeId,
        node: Arc<ProvisionedNode>,
        src: UnicastAddress,
        expected: Opcode,
    ) -> Self {
        Self {
            exchange,
            node,
            src,
            expected,
        }
    }

    /// Exchange this status closes
    #[must_use]
    pub const fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    /// Target node
    #[must_use]
    pub fn node(&self) -> &Arc<ProvisionedNode> {
        &self.node
    }

    /// Client address the status must be sent to
    #[must_use]
    pub const fn src(&self) -> UnicastAddress {
        self.src
    }

    /// Awaited status opcode
    #[must_use]
    pub const fn expected(&self) -> Opcode {
        self.expected
    }

    /// Parameters of the awaited status, or `None` for anything else.
    fn receive(&self, ctx: &mut ExchangeContext<'_>, pdu: &[u8]) -> Option<Bytes> {
        let Some(InboundMessage::Access { src, dst, payload }) =
            ctx.transport.parse_pdu(&self.node, pdu)
        else {
            trace!(exchange = %self.exchange, "pdu carried no access payload");
            return None;
        };
        if dst != Address::from(self.src) {
            trace!(exchange = %self.exchange, %dst, "status addressed elsewhere");
            return None;
        }
        match AccessMessage::decode_expecting(&payload, self.expected) {
            Ok(message) => {
                trace!(exchange = %self.exchange, %src, opcode = %self.expected, "status received");
                Some(message.parameters().clone())
            }
            Err(err) => {
                trace!(exchange = %self.exchange, error = %err, "ignoring access payload");
                None
            }
        }
    }

    /// Decode parameters with `decode`, logging malformed statuses.
    fn decode<T>(&self, params: &[u8], decode: fn(&[u8]) -> Result<T>) -> Option<T> {
        match decode(params) {
            Ok(status) => Some(status),
            Err(err) => {
                debug!(
                    exchange = %self.exchange,
                    opcode = %self.expected,
                    error = %err,
                    "malformed status ignored"
                );
                None
            }
        }
    }
}

/// Idle state; keeps the last node so stray PDUs can still be decoded
#[derive(Debug, Clone, Default)]
pub struct NoOperation {
    node: Option<Arc<ProvisionedNode>>,
}

impl NoOperation {
    /// Idle after an exchange with `node`
    #[must_use]
    pub fn after(node: Arc<ProvisionedNode>) -> Self {
        Self { node: Some(node) }
    }

    /// Last node, if any exchange ran
    #[must_use]
    pub fn node(&self) -> Option<&Arc<ProvisionedNode>> {
        self.node.as_ref()
    }
}

/// Every state the coordinator can hold
#[derive(Debug, Clone)]
pub enum MessageState {
    /// Idle
    NoOperation(NoOperation),
    /// Composition Data Get sent
    CompositionDataGet(Outgoing),
    /// Awaiting Composition Data Status
    CompositionDataStatus(Awaiting),
    /// AppKey Add sent
    AppKeyAdd {
        /// Request
        outgoing: Outgoing,
        /// Key being added
        app_key: AppKey,
    },
    /// Awaiting AppKey Status
    AppKeyStatus {
        /// Status expectation
        awaiting: Awaiting,
        /// Key that was added
        app_key: AppKey,
    },
    /// Model App Bind sent
    ModelAppBind(Outgoing),
    /// Model App Unbind sent
    ModelAppUnbind(Outgoing),
    /// Awaiting Model App Status
    ModelAppStatus {
        /// Status expectation
        awaiting: Awaiting,
        /// Whether the request bound or unbound
        kind: BindingKind,
    },
    /// Model Publication Set sent
    ModelPublicationSet(Outgoing),
    /// Awaiting Model Publication Status
    ModelPublicationStatus(Awaiting),
    /// Model Subscription Add sent
    ModelSubscriptionAdd(Outgoing),
    /// Model Subscription Delete sent
    ModelSubscriptionDelete(Outgoing),
    /// Awaiting Model Subscription Status
    ModelSubscriptionStatus {
        /// Status expectation
        awaiting: Awaiting,
        /// Whether the request added or deleted
        action: SubscriptionAction,
    },
    /// Node Reset sent
    NodeReset(Outgoing),
    /// Awaiting Node Reset Status
    NodeResetStatus(Awaiting),
    /// Generic OnOff Get sent
    GenericOnOffGet {
        /// Request
        outgoing: Outgoing,
        /// Controlled model
        model: MeshModel,
    },
    /// Generic OnOff Set sent
    GenericOnOffSet {
        /// Request
        outgoing: Outgoing,
        /// Controlled model
        model: MeshModel,
    },
    /// Generic OnOff Set Unacknowledged sent
    GenericOnOffSetUnacknowledged {
        /// Request
        outgoing: Outgoing,
        /// Controlled model
        model: MeshModel,
    },
    /// Awaiting Generic OnOff Status
    GenericOnOffStatus {
        /// Status expectation
        awaiting: Awaiting,
        /// Controlled model
        model: MeshModel,
    },
}

impl Default for MessageState {
    fn default() -> Self {
        Self::NoOperation(NoOperation::default())
    }
}

/// Operations every message state supports
pub trait MeshMessageState {
    /// Identifier used for dispatch.
    fn state(&self) -> StateTag;

    /// Whether the outbound message needed lower transport segmentation.
    fn is_segmented(&self) -> bool;

    /// Inspect a block ack; true when any sent segment is still missing.
    fn is_retransmission_required(&mut self, ctx: &mut ExchangeContext<'_>, pdu: &[u8]) -> bool;

    /// Resend unacknowledged segments without changing state.
    fn execute_resend(&mut self, ctx: &mut ExchangeContext<'_>);

    /// Encode, encrypt and hand the request to the transport.
    fn execute_send(&mut self, ctx: &mut ExchangeContext<'_>) -> Result<()>;

    /// Try to read `pdu` as the awaited status; true once the exchange is resolved.
    fn parse_message(&mut self, ctx: &mut ExchangeContext<'_>, pdu: &[u8]) -> bool;
}

impl MessageState {
    /// Request half, for request states
    #[must_use]
    pub const fn outgoing(&self) -> Option<&Outgoing> {
        match self {
            Self::CompositionDataGet(outgoing)
            | Self::AppKeyAdd { outgoing, .. }
            | Self::ModelAppBind(outgoing)
            | Self::ModelAppUnbind(outgoing)
            | Self::ModelPublicationSet(outgoing)
            | Self::ModelSubscriptionAdd(outgoing)
            | Self::ModelSubscriptionDelete(outgoing)
            | Self::NodeReset(outgoing)
            | Self::GenericOnOffGet { outgoing, .. }
            | Self::GenericOnOffSet { outgoing, .. }
            | Self::GenericOnOffSetUnacknowledged { outgoing, .. } => Some(outgoing),
            _ => None,
        }
    }

    fn outgoing_mut(&mut self) -> Option<&mut Outgoing> {
        match self {
            Self::CompositionDataGet(outgoing)
            | Self::AppKeyAdd { outgoing, .. }
            | Self::ModelAppBind(outgoing)
            | Self::ModelAppUnbind(outgoing)
            | Self::ModelPublicationSet(outgoing)
            | Self::ModelSubscriptionAdd(outgoing)
            | Self::ModelSubscriptionDelete(outgoing)
            | Self::NodeReset(outgoing)
            | Self::GenericOnOffGet { outgoing, .. }
            | Self::GenericOnOffSet { outgoing, .. }
            | Self::GenericOnOffSetUnacknowledged { outgoing, .. } => Some(outgoing),
            _ => None,
        }
    }

    /// Status half, for status states
    #[must_use]
    pub const fn awaiting(&self) -> Option<&Awaiting> {
        match self {
            Self::CompositionDataStatus(awaiting)
            | Self::AppKeyStatus { awaiting, .. }
            | Self::ModelAppStatus { awaiting, .. }
            | Self::ModelPublicationStatus(awaiting)
            | Self::ModelSubscriptionStatus { awaiting, .. }
            | Self::NodeResetStatus(awaiting)
            | Self::GenericOnOffStatus { awaiting, .. } => Some(awaiting),
            _ => None,
        }
    }

    /// Node the current exchange targets
    #[must_use]
    pub fn node(&self) -> Option<&Arc<ProvisionedNode>> {
        match self {
            Self::NoOperation(idle) => idle.node(),
            other => other
                .outgoing()
                .map(Outgoing::node)
                .or_else(|| other.awaiting().map(Awaiting::node)),
        }
    }

    /// Exchange id, `None` while idle
    #[must_use]
    pub fn exchange(&self) -> Option<ExchangeId> {
        self.outgoing()
            .map(Outgoing::exchange)
            .or_else(|| self.awaiting().map(Awaiting::exchange))
    }

    /// Bind/unbind sub-state of model app states
    #[must_use]
    pub const fn binding_kind(&self) -> Option<BindingKind> {
        match self {
            Self::ModelAppBind(_) => Some(BindingKind::Bind),
            Self::ModelAppUnbind(_) => Some(BindingKind::Unbind),
            Self::ModelAppStatus { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Add/delete sub-state of subscription states
    #[must_use]
    pub const fn subscription_action(&self) -> Option<SubscriptionAction> {
        match self {
            Self::ModelSubscriptionAdd(_) => Some(SubscriptionAction::Add),
            Self::ModelSubscriptionDelete(_) => Some(SubscriptionAction::Delete),
            Self::ModelSubscriptionStatus { action, .. } => Some(*action),
            _ => None,
        }
    }

    /// Resend rounds performed for the current request
    #[must_use]
    pub fn resends(&self) -> u32 {
        self.outgoing()
            .and_then(Outgoing::transfer)
            .map_or(0, SegmentedTransfer::resends)
    }

    /// Whether every segment of the current request has been acknowledged
    #[must_use]
    pub fn is_transfer_complete(&self) -> bool {
        self.outgoing()
            .and_then(Outgoing::transfer)
            .is_some_and(SegmentedTransfer::is_complete)
    }

    fn notify_sent(&self, ctx: &mut ExchangeContext<'_>, node: &ProvisionedNode) {
        match self {
            Self::CompositionDataGet(_) => ctx.status.on_composition_data_get_sent(node),
            Self::AppKeyAdd { .. } => ctx.status.on_app_key_add_sent(node),
            Self::ModelAppBind(_) => ctx.status.on_app_key_binding_sent(node, BindingKind::Bind),
            Self::ModelAppUnbind(_) => {
                ctx.status.on_app_key_binding_sent(node, BindingKind::Unbind);
            }
            Self::ModelPublicationSet(_) => ctx.status.on_publication_set_sent(node),
            Self::ModelSubscriptionAdd(_) => {
                ctx.status.on_subscription_sent(node, SubscriptionAction::Add);
            }
            Self::ModelSubscriptionDelete(_) => {
                ctx.status.on_subscription_sent(node, SubscriptionAction::Delete);
            }
            Self::NodeReset(_) => ctx.status.on_node_reset_sent(node),
            Self::GenericOnOffGet { model, .. } => ctx.status.on_generic_on_off_get_sent(node, model),
            Self::GenericOnOffSet { model, .. } => ctx.status.on_generic_on_off_set_sent(node, model),
            Self::GenericOnOffSetUnacknowledged { model, .. } => {
                ctx.status
                    .on_generic_on_off_set_unacknowledged_sent(node, model);
            }
            _ => {}
        }
    }

    fn parse_status(&self, ctx: &mut ExchangeContext<'_>, pdu: &[u8]) -> bool {
        let Some(awaiting) = self.awaiting() else {
            return false;
        };
        let Some(params) = awaiting.receive(ctx, pdu) else {
            return false;
        };
        let node: &ProvisionedNode = awaiting.node();
        match self {
            Self::CompositionDataStatus(_) => {
                let Some(status) = awaiting.decode(&params, CompositionDataStatus::decode) else {
                    return false;
                };
                ctx.status.on_composition_data_status_received(node, &status);
                // only page 0 carries the element list
                let Some(elements) = status.element_count() else {
                    debug!(page = status.page, "composition page without elements");
                    return true;
                };
                match node.unicast_address.offset(elements) {
                    Some(next) => ctx.manager.on_unicast_address_changed(next),
                    None => warn!(
                        exchange = %awaiting.exchange(),
                        elements,
                        "element range runs past the unicast space"
                    ),
                }
            }
            Self::AppKeyStatus { app_key, .. } => {
                let Some(status) = awaiting.decode(&params, AppKeyStatus::decode) else {
                    return false;
                };
                ctx.status.on_app_key_status_received(node, &status, app_key);
            }
            Self::ModelAppStatus { kind, .. } => {
                let Some(status) = awaiting.decode(&params, ModelAppStatus::decode) else {
                    return false;
                };
                ctx.status
                    .on_app_key_binding_status_received(node, *kind, &status);
            }
            Self::ModelPublicationStatus(_) => {
                let Some(status) = awaiting.decode(&params, ModelPublicationStatus::decode) else {
                    return false;
                };
                ctx.status.on_publication_status_received(node, &status);
            }
            Self::ModelSubscriptionStatus { action, .. } => {
                let Some(status) = awaiting.decode(&params, ModelSubscriptionStatus::decode)
                else {
                    return false;
                };
                ctx.status
                    .on_subscription_status_received(node, *action, &status);
            }
            Self::NodeResetStatus(_) => ctx.status.on_node_reset_status_received(node),
            Self::GenericOnOffStatus { model, .. } => {
                let Some(status) = awaiting.decode(&params, GenericOnOffStatus::decode) else {
                    return false;
                };
                ctx.status
                    .on_generic_on_off_status_received(node, model, &status);
            }
            _ => return false,
        }
        true
    }
}

impl MeshMessageState for MessageState {
    fn state(&self) -> StateTag {
        match self {
            Self::NoOperation(_) => StateTag::NoOperation,
            Self::CompositionDataGet(_) => StateTag::CompositionDataGet,
            Self::CompositionDataStatus(_) => StateTag::CompositionDataStatus,
            Self::AppKeyAdd { .. } => StateTag::AppKeyAdd,
            Self::AppKeyStatus { .. } => StateTag::AppKeyStatus,
            Self::ModelAppBind(_) => StateTag::ModelAppBind,
            Self::ModelAppUnbind(_) => StateTag::ModelAppUnbind,
            Self::ModelAppStatus { .. } => StateTag::ModelAppStatus,
            Self::ModelPublicationSet(_) => StateTag::ModelPublicationSet,
            Self::ModelPublicationStatus(_) => StateTag::ModelPublicationStatus,
            Self::ModelSubscriptionAdd(_) => StateTag::ModelSubscriptionAdd,
            Self::ModelSubscriptionDelete(_) => StateTag::ModelSubscriptionDelete,
            Self::ModelSubscriptionStatus { .. } => StateTag::ModelSubscriptionStatus,
            Self::NodeReset(_) => StateTag::NodeReset,
            Self::NodeResetStatus(_) => StateTag::NodeResetStatus,
            Self::GenericOnOffGet { .. } => StateTag::GenericOnOffGet,
            Self::GenericOnOffSet { .. } => StateTag::GenericOnOffSet,
            Self::GenericOnOffSetUnacknowledged { .. } => StateTag::GenericOnOffSetUnacknowledged,
            Self::GenericOnOffStatus { .. } => StateTag::GenericOnOffStatus,
        }
    }

    fn is_segmented(&self) -> bool {
        self.outgoing().is_some_and(Outgoing::is_segmented)
    }

    fn is_retransmission_required(&mut self, ctx: &mut ExchangeContext<'_>, pdu: &[u8]) -> bool {
        self.outgoing_mut()
            .is_some_and(|outgoing| outgoing.retransmission_required(ctx, pdu))
    }

    fn execute_resend(&mut self, ctx: &mut ExchangeContext<'_>) {
        if let Some(outgoing) = self.outgoing_mut() {
            outgoing.resend(ctx);
        }
    }

    fn execute_send(&mut self, ctx: &mut ExchangeContext<'_>) -> Result<()> {
        let Some(outgoing) = self.outgoing_mut() else {
            return Ok(());
        };
        outgoing.send(ctx)?;
        let node = Arc::clone(outgoing.node());
        self.notify_sent(ctx, &node);
        Ok(())
    }

    fn parse_message(&mut self, ctx: &mut ExchangeContext<'_>, pdu: &[u8]) -> bool {
        if let Self::NoOperation(idle) = self {
            if let Some(node) = idle.node() {
                let parsed = ctx.transport.parse_pdu(node, pdu);
                trace!(?parsed, "notification while idle discarded");
            }
            return false;
        }
        self.parse_status(ctx, pdu)
    }
}
