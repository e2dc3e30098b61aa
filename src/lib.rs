//! Bridge from a The Things Network storage integration to an MQTT broker.
//!
//! On every trigger the latest stored uplink is fetched, its decoded payload
//! text is parsed into a [`record::SensorReading`] and the reading is published
//! as JSON.
pub mod bridge;
pub mod config;
pub mod error;
pub mod mqtt;
pub mod payload;
pub mod record;
pub mod server;
pub mod ttn;
pub mod uplink;

pub use bridge::{Bridge, BridgeStage};
pub use error::{BridgeError, Result};
pub use record::SensorReading;
