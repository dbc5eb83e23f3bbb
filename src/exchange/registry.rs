//! Request to status mapping
//!
//! Pure functions; nothing here touches the transport or the listeners.

use std::sync::Arc;

use crate::protocol::{BindingKind, Opcode, SubscriptionAction};

use super::state::{Awaiting, MessageState, NoOperation, Outgoing, StateTag};

/// Status opcode answering the request identified by `tag`.
///
/// `None` for status states, the idle state and unacknowledged requests.
#[must_use]
pub const fn status_opcode(tag: StateTag) -> Option<Opcode> {
    match tag {
        StateTag::CompositionDataGet => Some(Opcode::CONFIG_COMPOSITION_DATA_STATUS),
        StateTag::AppKeyAdd => Some(Opcode::CONFIG_APPKEY_STATUS),
        StateTag::ModelAppBind | StateTag::ModelAppUnbind => Some(Opcode::CONFIG_MODEL_APP_STATUS),
        StateTag::ModelPublicationSet => Some(Opcode::CONFIG_MODEL_PUBLICATION_STATUS),
        StateTag::ModelSubscriptionAdd | StateTag::ModelSubscriptionDelete => {
            Some(Opcode::CONFIG_MODEL_SUBSCRIPTION_STATUS)
        }
        StateTag::NodeReset => Some(Opcode::CONFIG_NODE_RESET_STATUS),
        StateTag::GenericOnOffGet | StateTag::GenericOnOffSet => {
            Some(Opcode::GENERIC_ON_OFF_STATUS)
        }
        StateTag::NoOperation
        | StateTag::GenericOnOffSetUnacknowledged
        | StateTag::CompositionDataStatus
        | StateTag::AppKeyStatus
        | StateTag::ModelAppStatus
        | StateTag::ModelPublicationStatus
        | StateTag::ModelSubscriptionStatus
        | StateTag::NodeResetStatus
        | StateTag::GenericOnOffStatus => None,
    }
}

/// Tag of the state installed after `tag` completes.
#[must_use]
pub const fn next_tag(tag: StateTag) -> StateTag {
    match tag {
        StateTag::CompositionDataGet => StateTag::CompositionDataStatus,
        StateTag::AppKeyAdd => StateTag::AppKeyStatus,
        StateTag::ModelAppBind | StateTag::ModelAppUnbind => StateTag::ModelAppStatus,
        StateTag::ModelPublicationSet => StateTag::ModelPublicationStatus,
        StateTag::ModelSubscriptionAdd | StateTag::ModelSubscriptionDelete => {
            StateTag::ModelSubscriptionStatus
        }
        StateTag::NodeReset => StateTag::NodeResetStatus,
        StateTag::GenericOnOffGet | StateTag::GenericOnOffSet => StateTag::GenericOnOffStatus,
        StateTag::NoOperation
        | StateTag::GenericOnOffSetUnacknowledged
        | StateTag::CompositionDataStatus
        | StateTag::AppKeyStatus
        | StateTag::ModelAppStatus
        | StateTag::ModelPublicationStatus
        | StateTag::ModelSubscriptionStatus
        | StateTag::NodeResetStatus
        | StateTag::GenericOnOffStatus => StateTag::NoOperation,
    }
}

fn awaiting(outgoing: &Outgoing, expected: Opcode) -> Awaiting {
    Awaiting::new(
        outgoing.exchange(),
        Arc::clone(outgoing.node()),
        outgoing.request().src,
        expected,
    )
}

fn idle(current: &MessageState) -> MessageState {
    MessageState::NoOperation(
        current
            .node()
            .map(|node| NoOperation::after(Arc::clone(node)))
            .unwrap_or_default(),
    )
}

/// Build the state that follows `current`.
///
/// A request yields its status state, inheriting node, exchange id and the
/// sub-state (bind/unbind, add/delete, model, app key). Everything else,
/// including an unacknowledged set, yields [`MessageState::NoOperation`].
#[must_use]
pub fn next_state(current: &MessageState) -> MessageState {
    use crate::exchange::state::MeshMessageState;

    let Some(expected) = status_opcode(current.state()) else {
        return idle(current);
    };
    match current {
        MessageState::CompositionDataGet(outgoing) => {
            MessageState::CompositionDataStatus(awaiting(outgoing, expected))
        }
        MessageState::AppKeyAdd { outgoing, app_key } => MessageState::AppKeyStatus {
            awaiting: awaiting(outgoing, expected),
            app_key: *app_key,
        },
        MessageState::ModelAppBind(outgoing) => MessageState::ModelAppStatus {
            awaiting: awaiting(outgoing, expected),
            kind: BindingKind::Bind,
        },
        MessageState::ModelAppUnbind(outgoing) => MessageState::ModelAppStatus {
            awaiting: awaiting(outgoing, expected),
            kind: BindingKind::Unbind,
        },
        MessageState::ModelPublicationSet(outgoing) => {
            MessageState::ModelPublicationStatus(awaiting(outgoing, expected))
        }
        MessageState::ModelSubscriptionAdd(outgoing) => MessageState::ModelSubscriptionStatus {
            awaiting: awaiting(outgoing, expected),
            action: SubscriptionAction::Add,
        },
        MessageState::ModelSubscriptionDelete(outgoing) => {
            MessageState::ModelSubscriptionStatus {
                awaiting: awaiting(outgoing, expected),
                action: SubscriptionAction::Delete,
            }
        }
        MessageState::NodeReset(outgoing) => {
            MessageState::NodeResetStatus(awaiting(outgoing, expected))
        }
        MessageState::GenericOnOffGet { outgoing, model }
        | MessageState::GenericOnOffSet { outgoing, model } => MessageState::GenericOnOffStatus {
            awaiting: awaiting(outgoing, expected),
            model: model.clone(),
        },
        _ => idle(current),
    }
}
