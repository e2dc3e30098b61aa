//! HTTP trigger for the bridge.
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::bridge::Bridge;
use crate::error::BridgeError;

pub const FORWARDED_MESSAGE: &str = "Data fetched from TTN and published to MQTT";

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

#[derive(Serialize, Deserialize, Debug, Clone)]
/// Parameters for the trigger endpoint.
pub struct ServerParameters {
    /// The ip address the server should listen on.
    #[serde(default = "default_address")]
    pub address: String,
    /// The port the server should listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerParameters {
    fn default() -> Self {
        ServerParameters {
            address: default_address(),
            port: default_port(),
        }
    }
}

impl ServerParameters {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Message shown to the caller for a failed cycle.
fn error_message(err: &BridgeError) -> String {
    match err {
        BridgeError::UpstreamFetch { .. } => "Failed to fetch data from TTN".to_string(),
        BridgeError::PayloadDecode(detail) => format!("Failed to decode payload: {}", detail),
        BridgeError::Publish(detail) => format!("Failed to publish to MQTT: {}", detail),
        BridgeError::Serialization(detail) => format!("Failed to serialize reading: {}", detail),
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
        (status, Json(json!({ "error": error_message(&self) }))).into_response()
    }
}

async fn fetch_and_forward(State(bridge): State<Arc<Bridge>>) -> Result<Response, BridgeError> {
    log::debug!(target: "uplinkd::server", "Trigger received");
    let reading = bridge.fetch_and_forward().await?;
    Ok((StatusCode::OK, Json(json!({ "message": FORWARDED_MESSAGE, "data": reading }))).into_response())
}

pub fn routes(bridge: Arc<Bridge>) -> Router {
    Router::new()
        .route("/fetch_and_forward", get(fetch_and_forward))
        .with_state(bridge)
}
