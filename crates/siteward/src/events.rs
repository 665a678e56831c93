//! # Worker Events
//!
//! The hosting environment drives the engine through a single sum-typed
//! event stream; each event resolves to one [`EventOutcome`].

use serde::{Deserialize, Serialize};

use crate::http::{InterceptedRequest, StoredResponse};

/// Message sent by a controlling page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    /// Request immediate activation, bypassing the wait-for-clients rule
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
}

/// An event dispatched to the engine by its host
#[derive(Debug)]
pub enum WorkerEvent {
    /// The worker version is being installed
    Install,
    /// The worker version is taking over
    Activate,
    /// A page posted a message
    Message(WorkerMessage),
    /// A network request was intercepted
    Fetch(InterceptedRequest),
}

/// What handling an event produced
#[derive(Debug)]
pub enum EventOutcome {
    /// Install finished; `precached` resources were fetched
    Installed { precached: usize },
    /// Activation finished; `purged_generations` stale generations removed
    Activated { purged_generations: usize },
    /// A message was handled
    Acknowledged,
    /// The engine answers the request with this response
    Respond(StoredResponse),
    /// The request is deliberately left to the network, unmodified
    Passthrough,
}

impl EventOutcome {
    /// The response, if this outcome carries one
    pub fn into_response(self) -> Option<StoredResponse> {
        match self {
            EventOutcome::Respond(response) => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format() {
        let message: WorkerMessage = serde_json::from_str(r#"{"type": "SKIP_WAITING"}"#).unwrap();
        assert_eq!(message, WorkerMessage::SkipWaiting);

        assert!(serde_json::from_str::<WorkerMessage>(r#"{"type": "UNKNOWN"}"#).is_err());
    }
}
