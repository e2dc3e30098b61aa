//! Selection of the latest uplink from a storage integration batch.
//!
//! The storage API answers with
//! `{"result": [ {"uplink_message": {"decoded_payload": "..."}}, ... ]}`
//! and lists the newest message first. No timestamps are compared: the record
//! at index 0 is the latest one by contract.
use serde_json::Value;
use thiserror::Error;

/// Shapes of a batch that carry no usable payload.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedBatch {
    #[error("batch has no 'result' array")]
    MissingResult,
    #[error("latest record has no 'uplink_message'")]
    MissingUplinkMessage,
    #[error("latest uplink has no 'decoded_payload'")]
    MissingDecodedPayload,
    #[error("decoded payload is not text but {0}")]
    NotText(&'static str),
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Returns the decoded payload of the latest record.
///
/// `Ok(None)` means the batch is well formed but holds no records.
pub fn try_latest_payload(batch: &Value) -> Result<Option<&str>, MalformedBatch> {
    let records = batch
        .get("result")
        .and_then(Value::as_array)
        .ok_or(MalformedBatch::MissingResult)?;

    let latest = match records.first() {
        Some(record) => record,
        None => return Ok(None),
    };

    let payload = latest
        .get("uplink_message")
        .ok_or(MalformedBatch::MissingUplinkMessage)?
        .get("decoded_payload")
        .ok_or(MalformedBatch::MissingDecodedPayload)?;

    match payload.as_str() {
        Some(text) => Ok(Some(text)),
        None => Err(MalformedBatch::NotText(kind_of(payload))),
    }
}

/// Returns the decoded payload of the latest record, or an empty string when
/// the batch is empty or malformed. Never fails.
pub fn latest_payload(batch: &Value) -> String {
    match try_latest_payload(batch) {
        Ok(Some(text)) => text.to_string(),
        Ok(None) => {
            log::debug!(target: "uplinkd::uplink", "Storage batch contains no uplinks");
            String::new()
        }
        Err(err) => {
            log::warn!(target: "uplinkd::uplink", "Treating malformed storage batch as empty: \'{}\'", err);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_result_is_empty_payload() {
        let batch = json!({"result": []});
        assert_eq!(try_latest_payload(&batch), Ok(None));
        assert_eq!(latest_payload(&batch), "");
    }

    #[test]
    fn test_first_record_is_latest() {
        let batch = json!({"result": [
            {"uplink_message": {"decoded_payload": "Tmp: 30"}},
            {"uplink_message": {"decoded_payload": "Tmp: 20"}},
            {"uplink_message": {"decoded_payload": "Tmp: 10"}},
        ]});
        assert_eq!(latest_payload(&batch), "Tmp: 30");
    }

    #[test]
    fn test_single_record() {
        let batch = json!({"result": [
            {"uplink_message": {"decoded_payload": "Tmp: 27.30 Hum: 42", "f_port": 1}},
        ]});
        assert_eq!(latest_payload(&batch), "Tmp: 27.30 Hum: 42");
    }

    #[test]
    fn test_missing_result() {
        let batch = json!({"error": "nope"});
        assert_eq!(try_latest_payload(&batch), Err(MalformedBatch::MissingResult));
        assert_eq!(latest_payload(&batch), "");

        let batch = json!({"result": {"uplink_message": {}}});
        assert_eq!(try_latest_payload(&batch), Err(MalformedBatch::MissingResult));
    }

    #[test]
    fn test_missing_uplink_message() {
        let batch = json!({"result": [{"join_accept": {}}]});
        assert_eq!(try_latest_payload(&batch), Err(MalformedBatch::MissingUplinkMessage));
        assert_eq!(latest_payload(&batch), "");
    }

    #[test]
    fn test_missing_decoded_payload() {
        let batch = json!({"result": [{"uplink_message": {"frm_payload": "AQI="}}]});
        assert_eq!(try_latest_payload(&batch), Err(MalformedBatch::MissingDecodedPayload));
        assert_eq!(latest_payload(&batch), "");
    }

    #[test]
    fn test_structured_decoded_payload_is_not_text() {
        let batch = json!({"result": [{"uplink_message": {"decoded_payload": {"temperature": 20}}}]});
        assert_eq!(try_latest_payload(&batch), Err(MalformedBatch::NotText("an object")));
        assert_eq!(latest_payload(&batch), "");
    }
}
