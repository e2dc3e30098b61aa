//! One fetch, decode and publish cycle per trigger.
use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeError, Result};
use crate::mqtt::ReadingPublisher;
use crate::payload::PayloadDecoder;
use crate::record::SensorReading;
use crate::ttn::UplinkSource;
use crate::uplink;

/// Stages a cycle moves through.
///
/// `Idle → Fetching → Extracting → Decoding → Publishing → Done`. A failure in
/// any stage ends the cycle; [`BridgeError::stage`] names where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStage {
    Idle,
    Fetching,
    Extracting,
    Decoding,
    Publishing,
    Done,
}

impl fmt::Display for BridgeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeStage::Idle => "idle",
            BridgeStage::Fetching => "fetching",
            BridgeStage::Extracting => "extracting",
            BridgeStage::Decoding => "decoding",
            BridgeStage::Publishing => "publishing",
            BridgeStage::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(stage: BridgeStage) {
    log::trace!(target: "uplinkd::bridge", "Entering stage \'{}\'", stage);
}

/// Forwards the latest uplink of a source to a publisher.
///
/// Holds no state between cycles. The publisher owns the broker connection
/// that lives for the whole process.
pub struct Bridge {
    source: Arc<dyn UplinkSource>,
    publisher: Arc<dyn ReadingPublisher>,
    decoder: PayloadDecoder,
}

impl Bridge {
    pub fn new(source: Arc<dyn UplinkSource>, publisher: Arc<dyn ReadingPublisher>, decoder: PayloadDecoder) -> Self {
        Bridge { source, publisher, decoder }
    }

    /// Runs one cycle and returns the published reading.
    ///
    /// A fetch error skips decoding and publishing; a decode error skips
    /// publishing. Nothing is retried.
    pub async fn fetch_and_forward(&self) -> Result<SensorReading> {
        enter(BridgeStage::Idle);
        let result = self.run().await;
        match &result {
            Ok(reading) => {
                enter(BridgeStage::Done);
                log::info!(target: "uplinkd::bridge", "Forwarded reading of station \'{}\' from {}", reading.station_id, reading.last_update);
            }
            Err(err @ BridgeError::PayloadDecode(_)) => {
                log::warn!(target: "uplinkd::bridge", "Cycle failed while {}: \'{}\'", err.stage(), err);
            }
            Err(err) => {
                log::error!(target: "uplinkd::bridge", "Cycle failed while {}: \'{}\'", err.stage(), err);
            }
        }
        result
    }

    async fn run(&self) -> Result<SensorReading> {
        enter(BridgeStage::Fetching);
        let batch = self.source.fetch().await?;

        enter(BridgeStage::Extracting);
        let payload = uplink::latest_payload(&batch);

        enter(BridgeStage::Decoding);
        let reading = self.decoder.decode(&payload)?;

        enter(BridgeStage::Publishing);
        self.publisher.publish(&reading).await?;

        Ok(reading)
    }
}
