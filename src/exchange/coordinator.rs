//! Single-slot exchange coordinator.
//!
//! Owns the current [`MessageState`] and the collaborators, and drives the
//! state machine from two event sources: the bearer reporting that a write
//! finished, and the bearer delivering a notification.

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use crate::protocol::{
    AccessMessage, Address, AppKey, AppKeyAdd, BindingKind, CompositionDataGet, Error, KeyIndex,
    MeshModel, MicSize, ModelAppBinding, ModelId, ModelSubscription, OnOffSet, PublicationParams,
    ProvisionedNode, Result, SubscriptionAction, UnicastAddress, node_reset, on_off_get,
};

use super::listener::{ConfigurationStatusListener, MeshManagerListener, NoopListener};
use super::registry;
use super::state::{
    ExchangeContext, ExchangeId, MeshMessageState, MessageState, NoOperation, Outgoing,
    StateCategory, StateTag,
};
use super::transport::{EncryptionKey, MeshTransport, OutboundRequest};

/// Tunables for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExchangeConfig {
    /// Resend rounds allowed for one segmented request before it is abandoned.
    pub max_segment_resends: u32,
    /// First transaction identifier used for Generic OnOff sets.
    pub initial_tid: u8,
    /// Composition data page requested by Composition Data Get.
    pub composition_page: u8,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            max_segment_resends: 3,
            initial_tid: 0,
            composition_page: 0,
        }
    }
}

/// Counters kept per coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExchangeStats {
    /// Requests handed to the transport
    pub requests_sent: u64,
    /// Exchanges that reached their final state
    pub completed: u64,
    /// Segment resend rounds
    pub resends: u64,
    /// Exchanges superseded by a new request or given up after resends
    pub abandoned: u64,
    /// Notifications that did not advance the state machine
    pub ignored_notifications: u64,
}

/// What an entry point did to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// A new state was installed.
    Switched {
        /// State before the event
        from: StateTag,
        /// State after the event
        to: StateTag,
    },
    /// Nothing changed.
    Unchanged,
    /// Missing segments went out again; the state was kept.
    Resent {
        /// Resend rounds performed so far for this request
        round: u32,
    },
    /// The request ran out of resends and the coordinator went idle.
    Abandoned {
        /// State that was given up
        state: StateTag,
    },
}

/// Where a Generic OnOff message goes and how it is secured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnOffTarget {
    /// Controlled model
    pub model: MeshModel,
    /// Destination, usually the element hosting the model or a group
    pub address: Address,
    /// App key the model is bound to
    pub app_key_index: KeyIndex,
    /// Use the 64-bit TransMIC
    pub aszmic: bool,
}

/// Drives one request/status exchange at a time for a mesh node.
#[derive(Debug)]
pub struct ExchangeCoordinator<T, S = NoopListener, M = NoopListener> {
    config: ExchangeConfig,
    transport: T,
    status: S,
    manager: M,
    state: MessageState,
    next_tid: u8,
    stats: ExchangeStats,
}

impl<T, S, M> ExchangeCoordinator<T, S, M>
where
    T: MeshTransport,
    S: ConfigurationStatusListener,
    M: MeshManagerListener,
{
    /// Create an idle coordinator with default settings.
    pub fn new(transport: T, status: S, manager: M) -> Self {
        Self::with_config(ExchangeConfig::default(), transport, status, manager)
    }

    /// Create an idle coordinator.
    pub fn with_config(config: ExchangeConfig, transport: T, status: S, manager: M) -> Self {
        Self {
            next_tid: config.initial_tid,
            config,
            transport,
            status,
            manager,
            state: MessageState::default(),
            stats: ExchangeStats::default(),
        }
    }

    /// Identifier of the current state.
    #[must_use]
    pub fn current_state(&self) -> StateTag {
        self.state.state()
    }

    /// Current state with its parameters.
    #[must_use]
    pub const fn state(&self) -> &MessageState {
        &self.state
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Counters since construction.
    #[must_use]
    pub const fn stats(&self) -> ExchangeStats {
        self.stats
    }

    /// Transport collaborator.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable transport collaborator.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Status listener.
    #[must_use]
    pub const fn status_listener(&self) -> &S {
        &self.status
    }

    /// Manager listener.
    #[must_use]
    pub const fn manager_listener(&self) -> &M {
        &self.manager
    }

    /// Take the collaborators back.
    pub fn into_parts(self) -> (T, S, M) {
        (self.transport, self.status, self.manager)
    }

    fn parts(&mut self) -> (&mut MessageState, ExchangeContext<'_>) {
        (
            &mut self.state,
            ExchangeContext::new(&mut self.transport, &mut self.status, &mut self.manager),
        )
    }

    fn switch_state(&mut self, next: MessageState) -> TransitionOutcome {
        let from = self.state.state();
        let to = next.state();
        debug!(%from, %to, exchange = ?next.exchange(), "switching state");
        self.state = next;
        TransitionOutcome::Switched { from, to }
    }

    fn go_idle(&mut self) {
        let idle = self
            .state
            .node()
            .map(|node| NoOperation::after(Arc::clone(node)))
            .unwrap_or_default();
        self.state = MessageState::NoOperation(idle);
    }

    fn is_foreign(&self, node: &ProvisionedNode) -> bool {
        self.state
            .node()
            .is_some_and(|current| current.unicast_address != node.unicast_address)
    }

    /// The bearer finished writing a PDU.
    ///
    /// An unsegmented request advances to its status state. A segmented one
    /// stays put until its segments are acknowledged.
    #[instrument(level = "trace", skip(self, node, pdu), fields(node = %node.unicast_address, len = pdu.len()))]
    pub fn on_write_complete(&mut self, node: &ProvisionedNode, pdu: &[u8]) -> TransitionOutcome {
        let current = self.state.state();
        if current.category() != StateCategory::Request {
            trace!(%current, "write complete outside a request");
            return TransitionOutcome::Unchanged;
        }
        if self.is_foreign(node) {
            trace!(%current, "write complete for another node");
            return TransitionOutcome::Unchanged;
        }
        if current != StateTag::GenericOnOffSetUnacknowledged && self.state.is_segmented() {
            trace!(%current, "segmented request awaiting block ack");
            return TransitionOutcome::Unchanged;
        }
        let next = registry::next_state(&self.state);
        if next.state() == StateTag::NoOperation {
            self.stats.completed += 1;
        }
        self.switch_state(next)
    }

    /// The bearer delivered a notification.
    #[instrument(level = "trace", skip(self, node, pdu), fields(node = %node.unicast_address, len = pdu.len()))]
    pub fn on_notification(&mut self, node: &ProvisionedNode, pdu: &[u8]) -> TransitionOutcome {
        let current = self.state.state();
        if self.is_foreign(node) {
            trace!(%current, "notification for another node");
            self.stats.ignored_notifications += 1;
            return TransitionOutcome::Unchanged;
        }
        match current.category() {
            StateCategory::Request => self.handle_request_notification(current, pdu),
            StateCategory::Status => {
                let (state, mut ctx) = self.parts();
                if state.parse_message(&mut ctx, pdu) {
                    self.stats.completed += 1;
                    let next = registry::next_state(&self.state);
                    self.switch_state(next)
                } else {
                    self.stats.ignored_notifications += 1;
                    TransitionOutcome::Unchanged
                }
            }
            StateCategory::Idle => {
                let (state, mut ctx) = self.parts();
                state.parse_message(&mut ctx, pdu);
                self.stats.ignored_notifications += 1;
                TransitionOutcome::Unchanged
            }
        }
    }

    fn handle_request_notification(&mut self, current: StateTag, pdu: &[u8]) -> TransitionOutcome {
        let max_resends = self.config.max_segment_resends;
        let (state, mut ctx) = self.parts();
        let segmented = state.is_segmented();
        if segmented && state.is_retransmission_required(&mut ctx, pdu) {
            if state.resends() >= max_resends {
                if let Some(node) = state.node().cloned() {
                    ctx.status.on_transaction_failed(&node, current);
                }
                warn!(
                    %current,
                    exchange = ?state.exchange(),
                    resends = max_resends,
                    "segmented request abandoned"
                );
                self.stats.abandoned += 1;
                self.go_idle();
                return TransitionOutcome::Abandoned { state: current };
            }
            state.execute_resend(&mut ctx);
            let round = state.resends();
            self.stats.resends += 1;
            return TransitionOutcome::Resent { round };
        }
        if segmented && !state.is_transfer_complete() {
            trace!(%current, exchange = ?state.exchange(), "segments still outstanding");
            self.stats.ignored_notifications += 1;
            return TransitionOutcome::Unchanged;
        }
        let next = registry::next_state(&self.state);
        if next.state() == StateTag::NoOperation {
            self.stats.completed += 1;
        }
        self.switch_state(next)
    }

    /// Install `state`, then send its request. On failure the coordinator goes
    /// back to idle and the error is returned.
    fn issue(&mut self, state: MessageState) -> Result<()> {
        let current = self.state.state();
        if current != StateTag::NoOperation {
            debug!(%current, next = %state.state(), "superseding open exchange");
            self.stats.abandoned += 1;
        }
        self.state = state;
        self.send_current()
    }

    fn send_current(&mut self) -> Result<()> {
        let (state, mut ctx) = self.parts();
        match state.execute_send(&mut ctx) {
            Ok(()) => {
                self.stats.requests_sent += 1;
                info!(state = %self.state.state(), exchange = ?self.state.exchange(), "request sent");
                Ok(())
            }
            Err(err) => {
                warn!(state = %self.state.state(), error = %err, "request could not be sent");
                self.go_idle();
                Err(err)
            }
        }
    }

    fn config_request(
        node: &ProvisionedNode,
        aszmic: bool,
        message: AccessMessage,
    ) -> OutboundRequest {
        OutboundRequest {
            src: node.configuration_src,
            dst: Address::from(node.unicast_address),
            key: EncryptionKey::Device,
            mic: MicSize::from_aszmic(aszmic),
            message,
        }
    }

    fn outgoing(node: Arc<ProvisionedNode>, aszmic: bool, message: AccessMessage) -> Outgoing {
        let request = Self::config_request(&node, aszmic, message);
        Outgoing::new(ExchangeId::generate(), node, request)
    }

    fn on_off_outgoing(
        node: Arc<ProvisionedNode>,
        target: &OnOffTarget,
        message: AccessMessage,
    ) -> Outgoing {
        let request = OutboundRequest {
            src: node.configuration_src,
            dst: target.address,
            key: EncryptionKey::Application(target.app_key_index),
            mic: MicSize::from_aszmic(target.aszmic),
            message,
        };
        Outgoing::new(ExchangeId::generate(), node, request)
    }

    fn take_tid(&mut self) -> u8 {
        let tid = self.next_tid;
        self.next_tid = self.next_tid.wrapping_add(1);
        tid
    }

    /// Request composition data page 0 (or the configured page).
    ///
    /// The status state is installed before the get goes out, so the reply is
    /// matched even if it arrives ahead of the write completion.
    pub fn send_composition_data_get(
        &mut self,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
    ) -> Result<()> {
        let message = CompositionDataGet {
            page: self.config.composition_page,
        }
        .access_message();
        let mut get = MessageState::CompositionDataGet(Self::outgoing(node, aszmic, message));
        let status = registry::next_state(&get);
        let current = self.state.state();
        if current != StateTag::NoOperation {
            debug!(%current, "superseding open exchange");
            self.stats.abandoned += 1;
        }
        self.state = status;
        let (_, mut ctx) = self.parts();
        match get.execute_send(&mut ctx) {
            Ok(()) => {
                self.stats.requests_sent += 1;
                info!(exchange = ?get.exchange(), "composition data get sent");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "composition data get could not be sent");
                self.go_idle();
                Err(err)
            }
        }
    }

    /// Add an application key, given as 32 hex digits, under `app_key_index`.
    pub fn send_app_key_add(
        &mut self,
        node: Arc<ProvisionedNode>,
        app_key_index: u16,
        app_key: &str,
        aszmic: bool,
    ) -> Result<()> {
        let app_key_index = KeyIndex::new(app_key_index)?;
        let app_key = AppKey::from_hex(app_key)?;
        let message = AppKeyAdd {
            net_key_index: node.net_key_index,
            app_key_index,
            app_key,
        }
        .access_message();
        let outgoing = Self::outgoing(node, aszmic, message);
        self.issue(MessageState::AppKeyAdd { outgoing, app_key })
    }

    fn binding(
        &mut self,
        kind: BindingKind,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
        element_address: UnicastAddress,
        model_id: ModelId,
        app_key_index: u16,
    ) -> Result<()> {
        let message = ModelAppBinding {
            kind,
            element_address,
            app_key_index: KeyIndex::new(app_key_index)?,
            model_id,
        }
        .access_message();
        let outgoing = Self::outgoing(node, aszmic, message);
        self.issue(match kind {
            BindingKind::Bind => MessageState::ModelAppBind(outgoing),
            BindingKind::Unbind => MessageState::ModelAppUnbind(outgoing),
        })
    }

    /// Bind an application key to a model.
    pub fn bind_app_key(
        &mut self,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
        element_address: UnicastAddress,
        model_id: ModelId,
        app_key_index: u16,
    ) -> Result<()> {
        self.binding(
            BindingKind::Bind,
            node,
            aszmic,
            element_address,
            model_id,
            app_key_index,
        )
    }

    /// Unbind an application key from a model.
    pub fn unbind_app_key(
        &mut self,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
        element_address: UnicastAddress,
        model_id: ModelId,
        app_key_index: u16,
    ) -> Result<()> {
        self.binding(
            BindingKind::Unbind,
            node,
            aszmic,
            element_address,
            model_id,
            app_key_index,
        )
    }

    /// Set a model's publication parameters.
    pub fn set_config_model_publish_address(
        &mut self,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
        params: PublicationParams,
    ) -> Result<()> {
        let outgoing = Self::outgoing(node, aszmic, params.access_message());
        self.issue(MessageState::ModelPublicationSet(outgoing))
    }

    fn subscription(
        &mut self,
        action: SubscriptionAction,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
        element_address: UnicastAddress,
        address: Address,
        model_id: ModelId,
    ) -> Result<()> {
        if address == Address::UNASSIGNED || address.is_unicast() {
            return Err(Error::InvalidSubscriptionAddress {
                address: address.0,
            });
        }
        let message = ModelSubscription {
            action,
            element_address,
            address,
            model_id,
        }
        .access_message();
        let outgoing = Self::outgoing(node, aszmic, message);
        self.issue(match action {
            SubscriptionAction::Add => MessageState::ModelSubscriptionAdd(outgoing),
            SubscriptionAction::Delete => MessageState::ModelSubscriptionDelete(outgoing),
        })
    }

    /// Subscribe a model to a group or virtual address.
    pub fn add_subscription_address(
        &mut self,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
        element_address: UnicastAddress,
        subscription_address: Address,
        model_id: ModelId,
    ) -> Result<()> {
        self.subscription(
            SubscriptionAction::Add,
            node,
            aszmic,
            element_address,
            subscription_address,
            model_id,
        )
    }

    /// Remove a model's subscription.
    pub fn delete_subscription_address(
        &mut self,
        node: Arc<ProvisionedNode>,
        aszmic: bool,
        element_address: UnicastAddress,
        subscription_address: Address,
        model_id: ModelId,
    ) -> Result<()> {
        self.subscription(
            SubscriptionAction::Delete,
            node,
            aszmic,
            element_address,
            subscription_address,
            model_id,
        )
    }

    /// Read a Generic OnOff server.
    pub fn get_generic_on_off(
        &mut self,
        node: Arc<ProvisionedNode>,
        target: OnOffTarget,
    ) -> Result<()> {
        let outgoing = Self::on_off_outgoing(node, &target, on_off_get());
        self.issue(MessageState::GenericOnOffGet {
            outgoing,
            model: target.model,
        })
    }

    /// Set a Generic OnOff server and await its status.
    pub fn set_generic_on_off(
        &mut self,
        node: Arc<ProvisionedNode>,
        target: OnOffTarget,
        set: OnOffSet,
    ) -> Result<()> {
        let tid = self.take_tid();
        let outgoing = Self::on_off_outgoing(node, &target, set.access_message(tid, true));
        self.issue(MessageState::GenericOnOffSet {
            outgoing,
            model: target.model,
        })
    }

    /// Set a Generic OnOff server without a status.
    pub fn set_generic_on_off_unacknowledged(
        &mut self,
        node: Arc<ProvisionedNode>,
        target: OnOffTarget,
        set: OnOffSet,
    ) -> Result<()> {
        let tid = self.take_tid();
        let outgoing = Self::on_off_outgoing(node, &target, set.access_message(tid, false));
        self.issue(MessageState::GenericOnOffSetUnacknowledged {
            outgoing,
            model: target.model,
        })
    }

    /// Remove the node from the network.
    pub fn reset_mesh_node(&mut self, node: Arc<ProvisionedNode>) -> Result<()> {
        let outgoing = Self::outgoing(node, false, node_reset());
        self.issue(MessageState::NodeReset(outgoing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::transport::{InboundMessage, OutboundMessage};
    use bytes::Bytes;

    #[derive(Debug, Default)]
    struct LoopbackTransport {
        sent: Vec<Bytes>,
        fail_create: bool,
    }

    impl MeshTransport for LoopbackTransport {
        fn create_message(
            &mut self,
            _node: &ProvisionedNode,
            request: &OutboundRequest,
        ) -> Result<OutboundMessage> {
            if self.fail_create {
                return Err(Error::Transport("no bearer".into()));
            }
            Ok(OutboundMessage::unsegmented(request.message.encode()))
        }

        fn parse_pdu(&mut self, node: &ProvisionedNode, pdu: &[u8]) -> Option<InboundMessage> {
            Some(InboundMessage::Access {
                src: node.unicast_address,
                dst: Address::from(node.configuration_src),
                payload: Bytes::copy_from_slice(pdu),
            })
        }

        fn send_pdu(&mut self, _node: &ProvisionedNode, pdu: &Bytes) {
            self.sent.push(pdu.clone());
        }
    }

    fn node() -> Arc<ProvisionedNode> {
        Arc::new(ProvisionedNode::new(
            "plug",
            UnicastAddress::new(0x0002).unwrap(),
            UnicastAddress::new(0x0001).unwrap(),
        ))
    }

    fn coordinator() -> ExchangeCoordinator<LoopbackTransport> {
        ExchangeCoordinator::new(LoopbackTransport::default(), NoopListener, NoopListener)
    }

    #[test]
    fn test_starts_idle() {
        let coordinator = coordinator();
        assert_eq!(coordinator.current_state(), StateTag::NoOperation);
        assert_eq!(coordinator.stats(), ExchangeStats::default());
        assert_eq!(coordinator.config().max_segment_resends, 3);
    }

    #[test]
    fn test_node_reset_round_trip() {
        let mut coordinator = coordinator();
        let node = node();
        coordinator.reset_mesh_node(Arc::clone(&node)).unwrap();
        assert_eq!(coordinator.current_state(), StateTag::NodeReset);
        assert_eq!(coordinator.transport().sent.len(), 1);

        let outcome = coordinator.on_write_complete(&node, &[]);
        assert_eq!(
            outcome,
            TransitionOutcome::Switched {
                from: StateTag::NodeReset,
                to: StateTag::NodeResetStatus,
            }
        );

        let status = AccessMessage::empty(crate::protocol::Opcode::CONFIG_NODE_RESET_STATUS);
        coordinator.on_notification(&node, &status.encode());
        assert_eq!(coordinator.current_state(), StateTag::NoOperation);
        assert_eq!(coordinator.stats().completed, 1);
    }

    #[test]
    fn test_failed_send_returns_to_idle() {
        let mut coordinator = coordinator();
        coordinator.transport_mut().fail_create = true;
        let err = coordinator.reset_mesh_node(node()).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(coordinator.current_state(), StateTag::NoOperation);
        assert_eq!(coordinator.stats().requests_sent, 0);
    }

    #[test]
    fn test_invalid_parameters_leave_state_untouched() {
        let mut coordinator = coordinator();
        assert!(matches!(
            coordinator.send_app_key_add(node(), 0x1000, "00", false),
            Err(Error::InvalidKeyIndex { .. })
        ));
        assert!(coordinator.send_app_key_add(node(), 0, "zz", false).is_err());
        assert!(matches!(
            coordinator.add_subscription_address(
                node(),
                false,
                UnicastAddress::new(0x0002).unwrap(),
                Address(0x0005),
                ModelId::GENERIC_ON_OFF_SERVER,
            ),
            Err(Error::InvalidSubscriptionAddress { address: 0x0005 })
        ));
        assert_eq!(coordinator.current_state(), StateTag::NoOperation);
        assert!(coordinator.transport().sent.is_empty());
    }

    #[test]
    fn test_tid_increments_per_set() {
        let mut coordinator = ExchangeCoordinator::with_config(
            ExchangeConfig {
                initial_tid: 0xFF,
                ..ExchangeConfig::default()
            },
            LoopbackTransport::default(),
            NoopListener,
            NoopListener,
        );
        let target = OnOffTarget {
            model: MeshModel::new(ModelId::GENERIC_ON_OFF_SERVER),
            address: Address(0xC000),
            app_key_index: KeyIndex::default(),
            aszmic: false,
        };
        coordinator
            .set_generic_on_off_unacknowledged(node(), target.clone(), OnOffSet::immediate(true))
            .unwrap();
        coordinator
            .set_generic_on_off_unacknowledged(node(), target, OnOffSet::immediate(false))
            .unwrap();
        let sent = &coordinator.transport().sent;
        // opcode is two octets, then state and tid
        assert_eq!(sent[0][3], 0xFF);
        assert_eq!(sent[1][3], 0x00);
        assert_eq!(coordinator.stats().abandoned, 1);
    }

    #[test]
    fn test_write_complete_when_idle_is_ignored() {
        let mut coordinator = coordinator();
        assert_eq!(
            coordinator.on_write_complete(&node(), &[1, 2]),
            TransitionOutcome::Unchanged
        );
    }
}
