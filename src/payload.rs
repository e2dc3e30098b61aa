//! Decoder for the `Key: Value` text the network server's payload formatter
//! produces for the weather station, e.g.
//! `Tmp: 27.30 Hum: 42 Light: Cloudy Rain: No Rain`.
//!
//! Values are single tokens. A multi-word value such as `No Rain` keeps only
//! its first word when it is the last value of the payload; the leftover word
//! is dropped as a trailing orphan. Anywhere else the leftover word shifts the
//! following pairs so a label lands in value position, which is rejected as
//! [`DecodeError::Misaligned`].
use thiserror::Error;

use crate::record::{SensorReading, DEFAULT_STATION_ID};

/// Errors that make a payload unreadable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// The payload ends with a label that has no value.
    #[error("label '{label}' has no value")]
    MissingValue { label: String },

    /// A numeric label carries something that is not a finite number.
    #[error("value '{value}' of label '{label}' is not a number")]
    InvalidNumber { label: String, value: String },

    /// Two consecutive separators produced an empty token.
    #[error("empty token at position {position}")]
    MalformedSpacing { position: usize },

    /// A label sits where a value is expected, so every later pair is shifted.
    /// Happens when a multi-word value is not the last one in the payload.
    #[error("label '{token}' at position {position} follows label '{label}' instead of a value")]
    Misaligned { label: String, token: String, position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Temperature,
    Humidity,
    Light,
    Rain,
}

static LABELS: &[(&str, Field)] = &[
    ("Tmp", Field::Temperature),
    ("Hum", Field::Humidity),
    ("Light", Field::Light),
    ("Rain", Field::Rain),
];

fn lookup(label: &str) -> Option<Field> {
    LABELS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, field)| *field)
}

fn parse_number(label: &str, value: &str) -> Result<f64, DecodeError> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(DecodeError::InvalidNumber {
            label: label.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Splits the payload on single spaces, rejecting empty tokens.
fn tokenize(text: &str) -> Result<Vec<&str>, DecodeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split(' ')
        .enumerate()
        .map(|(position, token)| {
            if token.is_empty() {
                Err(DecodeError::MalformedSpacing { position })
            } else {
                Ok(token)
            }
        })
        .collect()
}

/// Turns decoded payload text into a [`SensorReading`].
#[derive(Debug, Clone)]
pub struct PayloadDecoder {
    station_id: String,
}

impl Default for PayloadDecoder {
    fn default() -> Self {
        PayloadDecoder::new(DEFAULT_STATION_ID)
    }
}

impl PayloadDecoder {
    pub fn new(station_id: &str) -> Self {
        PayloadDecoder {
            station_id: station_id.to_string(),
        }
    }

    /// Decodes `text`, stamping the reading with the current time.
    pub fn decode(&self, text: &str) -> Result<SensorReading, DecodeError> {
        self.decode_at(text, chrono::Utc::now().timestamp())
    }

    /// Decodes `text`, stamping the reading with `last_update`.
    ///
    /// # Errors
    ///
    /// * [`DecodeError::MalformedSpacing`] if the text contains an empty token.
    ///
    /// * [`DecodeError::MissingValue`] if the last token is a label (ends with `:`)
    ///     without a value after it.
    ///
    /// * [`DecodeError::Misaligned`] if a label appears in value position.
    ///
    /// * [`DecodeError::InvalidNumber`] if `Tmp` or `Hum` is not a finite number.
    ///
    pub fn decode_at(&self, text: &str, last_update: i64) -> Result<SensorReading, DecodeError> {
        let tokens = tokenize(text)?;
        let mut reading = SensorReading::empty(&self.station_id, last_update);

        for (index, pair) in tokens.chunks(2).enumerate() {
            let (raw_label, value) = match pair {
                [label, value] if value.ends_with(':') => {
                    return Err(DecodeError::Misaligned {
                        label: label.trim_matches(':').to_string(),
                        token: value.to_string(),
                        position: 2 * index + 1,
                    });
                }
                [label, value] => (*label, *value),
                [orphan] if orphan.ends_with(':') => {
                    return Err(DecodeError::MissingValue {
                        label: orphan.trim_matches(':').to_string(),
                    });
                }
                [orphan] => {
                    log::debug!(target: "uplinkd::payload", "Ignoring trailing token without label: \'{}\'", orphan);
                    continue;
                }
                _ => continue,
            };

            let label = raw_label.trim_matches(':');
            match lookup(label) {
                Some(Field::Temperature) => reading.temperature = parse_number(label, value)?,
                Some(Field::Humidity) => reading.humidity = parse_number(label, value)?,
                Some(Field::Light) => reading.light = value.to_string(),
                Some(Field::Rain) => reading.rain = value.to_string(),
                None => {
                    log::trace!(target: "uplinkd::payload", "Skipping unknown label \'{}\'", label);
                }
            }
        }

        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MISSING_CATEGORY, MISSING_NUMERIC};

    const NOW: i64 = 1_718_000_000;

    #[test]
    fn test_station_payload_keeps_first_word_of_rain() {
        let decoder = PayloadDecoder::default();
        let reading = decoder
            .decode_at("Tmp: 27.30 Hum: 42 Light: Cloudy Rain: No Rain", NOW)
            .unwrap();

        assert_eq!(
            reading,
            SensorReading {
                station_id: "Wifi-MQTT".to_string(),
                temperature: 27.30,
                humidity: 42.0,
                light: "Cloudy".to_string(),
                rain: "No".to_string(),
                last_update: NOW,
            }
        );
    }

    #[test]
    fn test_labels_in_any_order() {
        let decoder = PayloadDecoder::default();
        let reading = decoder
            .decode_at("Rain: Heavy Light: Dark Hum: 88.5 Tmp: -3.25", NOW)
            .unwrap();

        assert_eq!(reading.temperature, -3.25);
        assert_eq!(reading.humidity, 88.5);
        assert_eq!(reading.light, "Dark");
        assert_eq!(reading.rain, "Heavy");
    }

    #[test]
    fn test_missing_labels_take_sentinels() {
        let decoder = PayloadDecoder::default();
        let reading = decoder.decode_at("Hum: 55 Light: Sunny", NOW).unwrap();

        assert_eq!(reading.temperature, MISSING_NUMERIC);
        assert_eq!(reading.humidity, 55.0);
        assert_eq!(reading.light, "Sunny");
        assert_eq!(reading.rain, MISSING_CATEGORY);
    }

    #[test]
    fn test_empty_payload_is_all_sentinels() {
        let decoder = PayloadDecoder::default();
        let reading = decoder.decode_at("", NOW).unwrap();
        assert_eq!(reading, SensorReading::empty("Wifi-MQTT", NOW));

        let reading = decoder.decode_at("   \n", NOW).unwrap();
        assert_eq!(reading, SensorReading::empty("Wifi-MQTT", NOW));
    }

    #[test]
    fn test_non_numeric_temperature_is_error() {
        let decoder = PayloadDecoder::default();
        let err = decoder.decode_at("Tmp: abc Hum: 42", NOW).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidNumber {
                label: "Tmp".to_string(),
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_non_finite_humidity_is_error() {
        let decoder = PayloadDecoder::default();
        let err = decoder.decode_at("Hum: NaN", NOW).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidNumber { .. }));
    }

    #[test]
    fn test_dangling_label_is_error() {
        let decoder = PayloadDecoder::default();
        let err = decoder.decode_at("Tmp: 21.0 Hum:", NOW).unwrap_err();
        assert_eq!(err, DecodeError::MissingValue { label: "Hum".to_string() });
    }

    #[test]
    fn test_double_space_is_error() {
        let decoder = PayloadDecoder::default();
        let err = decoder.decode_at("Tmp:  21.0", NOW).unwrap_err();
        assert_eq!(err, DecodeError::MalformedSpacing { position: 1 });
    }

    #[test]
    fn test_unknown_labels_are_ignored() {
        let decoder = PayloadDecoder::default();
        let reading = decoder.decode_at("Bat: 3.7 Tmp: 19 Wind: 12", NOW).unwrap();
        assert_eq!(reading.temperature, 19.0);
        assert_eq!(reading.humidity, MISSING_NUMERIC);
    }

    #[test]
    fn test_repeated_label_keeps_last_value() {
        let decoder = PayloadDecoder::default();
        let reading = decoder.decode_at("Tmp: 10 Tmp: 11.5", NOW).unwrap();
        assert_eq!(reading.temperature, 11.5);
    }

    #[test]
    fn test_multi_word_value_first_is_error() {
        let decoder = PayloadDecoder::default();
        let err = decoder
            .decode_at("Rain: No Rain Tmp: 20 Hum: 42 Light: Cloudy", NOW)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::Misaligned {
                label: "Rain".to_string(),
                token: "Tmp:".to_string(),
                position: 3,
            }
        );
    }

    #[test]
    fn test_multi_word_value_in_middle_is_error() {
        let decoder = PayloadDecoder::default();
        let err = decoder.decode_at("Light: Partly Cloudy Rain: No", NOW).unwrap_err();
        assert!(matches!(err, DecodeError::Misaligned { ref token, .. } if token == "Rain:"));

        let err = decoder
            .decode_at("Tmp: 20 Light: Partly Cloudy Rain: No", NOW)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Misaligned { position: 5, .. }));
    }

    #[test]
    fn test_configured_station_id() {
        let decoder = PayloadDecoder::new("roof-station");
        let reading = decoder.decode_at("Tmp: 1", NOW).unwrap();
        assert_eq!(reading.station_id, "roof-station");
    }

    #[test]
    fn test_decode_stamps_current_time() {
        let decoder = PayloadDecoder::default();
        let before = chrono::Utc::now().timestamp();
        let reading = decoder.decode("Tmp: 20").unwrap();
        let after = chrono::Utc::now().timestamp();
        assert!(reading.last_update >= before && reading.last_update <= after);
    }
}
