use thiserror::Error;

use crate::bridge::BridgeStage;
use crate::payload::DecodeError;

/// Errors that end a fetch-and-forward cycle.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The storage API answered with a non-success status or could not be reached.
    #[error("upstream fetch failed: {reason}")]
    UpstreamFetch { status: Option<u16>, reason: String },

    /// The latest uplink could not be decoded into a reading.
    #[error("payload decode failed: {0}")]
    PayloadDecode(#[from] DecodeError),

    /// The broker is unavailable or rejected the publish.
    #[error("publish failed: {0}")]
    Publish(String),

    /// The reading could not be serialized for publishing.
    ///
    /// Target of `?` on `serde_json::to_vec`; a decoded reading holds only
    /// strings, finite floats and an integer, so this does not occur for it.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Stage of the cycle in which the error was raised.
    pub fn stage(&self) -> BridgeStage {
        match self {
            BridgeError::UpstreamFetch { .. } => BridgeStage::Fetching,
            BridgeError::PayloadDecode(_) => BridgeStage::Decoding,
            BridgeError::Publish(_) | BridgeError::Serialization(_) => BridgeStage::Publishing,
        }
    }

    /// HTTP status reported to the caller of the trigger endpoint.
    ///
    /// Fetch errors pass the upstream status through when there is one.
    pub fn http_status(&self) -> u16 {
        match self {
            BridgeError::UpstreamFetch { status: Some(status), .. } => *status,
            BridgeError::UpstreamFetch { status: None, .. } => 502,
            BridgeError::PayloadDecode(_) => 502,
            BridgeError::Publish(_) => 503,
            BridgeError::Serialization(_) => 500,
        }
    }
}

impl From<paho_mqtt::Error> for BridgeError {
    fn from(e: paho_mqtt::Error) -> Self {
        BridgeError::Publish(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
