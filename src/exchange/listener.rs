//! Callbacks the exchange engine reports to.
//!
//! Every method has an empty default so callers implement only what they use.

use crate::protocol::{
    AppKey, AppKeyStatus, BindingKind, CompositionDataStatus, GenericOnOffStatus, MeshModel,
    ModelAppStatus, ModelPublicationStatus, ModelSubscriptionStatus, ProvisionedNode,
    SubscriptionAction, UnicastAddress,
};

use super::{BlockAck, StateTag};

/// Receives "request sent" and "status received" notifications.
#[allow(unused_variables)]
pub trait ConfigurationStatusListener {
    /// Composition Data Get handed to the transport.
    fn on_composition_data_get_sent(&mut self, node: &ProvisionedNode) {}

    /// Composition Data Status parsed.
    fn on_composition_data_status_received(
        &mut self,
        node: &ProvisionedNode,
        status: &CompositionDataStatus,
    ) {
    }

    /// AppKey Add handed to the transport.
    fn on_app_key_add_sent(&mut self, node: &ProvisionedNode) {}

    /// AppKey Status parsed. `app_key` is the key that was sent, so the caller
    /// can store it when the status reports success.
    fn on_app_key_status_received(
        &mut self,
        node: &ProvisionedNode,
        status: &AppKeyStatus,
        app_key: &AppKey,
    ) {
    }

    /// Model App Bind or Unbind handed to the transport.
    fn on_app_key_binding_sent(&mut self, node: &ProvisionedNode, kind: BindingKind) {}

    /// Model App Status parsed.
    fn on_app_key_binding_status_received(
        &mut self,
        node: &ProvisionedNode,
        kind: BindingKind,
        status: &ModelAppStatus,
    ) {
    }

    /// Model Publication Set handed to the transport.
    fn on_publication_set_sent(&mut self, node: &ProvisionedNode) {}

    /// Model Publication Status parsed.
    fn on_publication_status_received(
        &mut self,
        node: &ProvisionedNode,
        status: &ModelPublicationStatus,
    ) {
    }

    /// Subscription Add or Delete handed to the transport.
    fn on_subscription_sent(&mut self, node: &ProvisionedNode, action: SubscriptionAction) {}

    /// Model Subscription Status parsed.
    fn on_subscription_status_received(
        &mut self,
        node: &ProvisionedNode,
        action: SubscriptionAction,
        status: &ModelSubscriptionStatus,
    ) {
    }

    /// Node Reset handed to the transport.
    fn on_node_reset_sent(&mut self, node: &ProvisionedNode) {}

    /// Node Reset Status parsed; the node has left the network.
    fn on_node_reset_status_received(&mut self, node: &ProvisionedNode) {}

    /// Generic OnOff Get handed to the transport.
    fn on_generic_on_off_get_sent(&mut self, node: &ProvisionedNode, model: &MeshModel) {}

    /// Generic OnOff Set handed to the transport.
    fn on_generic_on_off_set_sent(&mut self, node: &ProvisionedNode, model: &MeshModel) {}

    /// Generic OnOff Set Unacknowledged handed to the transport.
    fn on_generic_on_off_set_unacknowledged_sent(
        &mut self,
        node: &ProvisionedNode,
        model: &MeshModel,
    ) {
    }

    /// Generic OnOff Status parsed.
    fn on_generic_on_off_status_received(
        &mut self,
        node: &ProvisionedNode,
        model: &MeshModel,
        status: &GenericOnOffStatus,
    ) {
    }

    /// A block ack for one of our segmented sends arrived.
    fn on_block_acknowledgement_received(&mut self, node: &ProvisionedNode, ack: &BlockAck) {}

    /// A segmented request was given up after exhausting its resends.
    fn on_transaction_failed(&mut self, node: &ProvisionedNode, state: StateTag) {}
}

/// Callbacks into the caller's node registry.
pub trait MeshManagerListener {
    /// Composition data showed how many elements the node has; `next` is the
    /// first unicast address after its last element.
    fn on_unicast_address_changed(&mut self, next: UnicastAddress);
}

/// Listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ConfigurationStatusListener for NoopListener {}

impl MeshManagerListener for NoopListener {
    fn on_unicast_address_changed(&mut self, _next: UnicastAddress) {}
}
