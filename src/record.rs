//! Module that contains the normalized reading published by this application.
use serde::{Deserialize, Serialize};

/// Station id used when the configuration does not name one.
pub const DEFAULT_STATION_ID: &str = "Wifi-MQTT";

/// Value of a numeric field the sensor did not report.
pub const MISSING_NUMERIC: f64 = -1.0;

/// Value of a categorical field the sensor did not report.
pub const MISSING_CATEGORY: &str = "N/A";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Normalized weather reading decoded from the latest uplink of a station.
///
/// All fields are always present. Fields the uplink did not carry hold
/// [`MISSING_NUMERIC`] or [`MISSING_CATEGORY`].
pub struct SensorReading
{
    /// Id of the bridge instance that produced the reading.
    pub station_id: String,
    /// Temperature value in celsius.
    pub temperature: f64,
    /// Relative humidity value.
    pub humidity: f64,
    /// Light category as reported by the station, e.g. `Cloudy`.
    pub light: String,
    /// Rain category as reported by the station.
    pub rain: String,
    /// Unix timestamp (seconds) of the moment the reading was decoded.
    pub last_update: i64,
}

impl SensorReading {
    /// Reading with every measurement set to its sentinel.
    pub fn empty(station_id: &str, last_update: i64) -> Self {
        SensorReading {
            station_id: station_id.to_string(),
            temperature: MISSING_NUMERIC,
            humidity: MISSING_NUMERIC,
            light: MISSING_CATEGORY.to_string(),
            rain: MISSING_CATEGORY.to_string(),
            last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reading_uses_sentinels() {
        let reading = SensorReading::empty(DEFAULT_STATION_ID, 1_700_000_000);
        assert_eq!(reading.station_id, "Wifi-MQTT");
        assert_eq!(reading.temperature, -1.0);
        assert_eq!(reading.humidity, -1.0);
        assert_eq!(reading.light, "N/A");
        assert_eq!(reading.rain, "N/A");
        assert_eq!(reading.last_update, 1_700_000_000);
    }

    #[test]
    fn test_serialized_field_order() {
        let reading = SensorReading::empty("station-7", 42);
        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(
            json,
            r#"{"station_id":"station-7","temperature":-1.0,"humidity":-1.0,"light":"N/A","rain":"N/A","last_update":42}"#
        );
    }
}
