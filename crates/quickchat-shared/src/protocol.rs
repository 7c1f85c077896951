use serde::{Deserialize, Serialize};

use crate::constants::{REDUCER_SEND_MESSAGE, REDUCER_SET_NAME};
use crate::error::SharedError;
use crate::identity::Identity;
use crate::types::{Message, User};

/// Reducer invocations this client can issue, with their arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReducerCall {
    SetName { name: String },
    SendMessage { text: String },
}

impl ReducerCall {
    /// Name of the reducer as registered by the remote module
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetName { .. } => REDUCER_SET_NAME,
            Self::SendMessage { .. } => REDUCER_SEND_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReducerStatus {
    Committed,
    Failed,
}

/// Completion notice for one reducer invocation.
///
/// Broadcast to every subscribed client, so `caller_identity` must be
/// checked before acting on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducerEvent {
    pub caller_identity: Identity,
    pub status: ReducerStatus,
    /// Human-readable reason, present on failure
    pub message: Option<String>,
}

/// Whether a row insert belongs to the initial subscription snapshot or
/// arrived live afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowOrigin {
    Snapshot,
    Live,
}

/// Events pushed from the remote service to the client, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    UserInserted {
        row: User,
        origin: RowOrigin,
    },
    UserUpdated {
        old: User,
        new: User,
    },
    UserDeleted {
        row: User,
    },
    MessageInserted {
        row: Message,
        origin: RowOrigin,
    },
    MessageDeleted {
        row: Message,
    },
    /// Every snapshot row for the subscribed relations has been delivered
    SubscriptionApplied,
    ReducerResult {
        call: ReducerCall,
        event: ReducerEvent,
    },
    Disconnected {
        reason: String,
    },
}

impl ClientEvent {
    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Short variant name for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserInserted { .. } => "user_inserted",
            Self::UserUpdated { .. } => "user_updated",
            Self::UserDeleted { .. } => "user_deleted",
            Self::MessageInserted { .. } => "message_inserted",
            Self::MessageDeleted { .. } => "message_deleted",
            Self::SubscriptionApplied => "subscription_applied",
            Self::ReducerResult { .. } => "reducer_result",
            Self::Disconnected { .. } => "disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    #[test]
    fn test_reducer_names() {
        assert_eq!(ReducerCall::SetName { name: "a".into() }.name(), "SetName");
        assert_eq!(
            ReducerCall::SendMessage { text: "hi".into() }.name(),
            "SendMessage"
        );
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = ClientEvent::MessageInserted {
            row: Message {
                sender: Identity::from_bytes([7u8; 32]),
                sent: Timestamp::from_micros(42),
                text: "hello".into(),
            },
            origin: RowOrigin::Snapshot,
        };

        let json = event.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "message_inserted");
        assert_eq!(value["origin"], "snapshot");

        let restored = ClientEvent::from_json(&json).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn test_reducer_status_lowercase() {
        let json = serde_json::to_string(&ReducerStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }
}
