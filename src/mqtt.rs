//! Module for publishing readings to the MQTT broker.
extern crate paho_mqtt as mqtt;

use std::time;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::record::SensorReading;

/// Readings are published fire and forget.
pub const PUBLISH_QOS: i32 = mqtt::QOS_0;

fn default_keep_alive_secs() -> u64 {
    60
}

#[derive(Serialize, Deserialize, Debug, Clone)]
/// Parameters for the mqtt connection.
pub struct MqttParams
{
    /// The address of the broker.
    pub address: String,
    /// The port of the broker.
    pub port: u32,
    /// Client id used for the connection.
    pub client_id: String,
    /// Topic readings are published on.
    pub topic: String,
    /// Keep alive interval in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Enable tls encryption.
    pub tls_enable: bool,
    /// Optional TLS parameters for the mqtt connection.
    pub tls_params: Option<MqttTlsParams>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
/// TLS parametes required for MQTT with TLS.
pub struct MqttTlsParams {
    /// The path to the CA certificate for TLS encryption.
    pub ca_path: String,
    /// The path to the certificate to use for TLS encryption.
    pub cert_path: String,
    /// The path to the key to use for TLS encryption.
    pub key_path: String,
    /// The password for the ssl private key.
    pub key_pass: Option<String>,
}

impl MqttParams {
    /// Broker uri in the form paho expects, `ssl://` when tls is enabled.
    pub fn server_uri(&self) -> String {
        match self.tls_enable {
            true => format!("ssl://{}:{}", self.address, self.port),
            false => format!("tcp://{}:{}", self.address, self.port),
        }
    }
}

/// Errors while setting up the broker connection.
#[derive(Debug, Error)]
pub enum MqttSetupError {
    #[error("TLS enabled but no TLS parameters specified")]
    MissingTlsParameters,
    #[error("mqtt client error: {0}")]
    Client(#[from] mqtt::Error),
}

/// Sink for decoded readings.
#[async_trait]
pub trait ReadingPublisher: Send + Sync {
    /// Publish one reading.
    async fn publish(&self, reading: &SensorReading) -> Result<()>;
}

/// [`ReadingPublisher`] on a long lived paho connection.
///
/// `paho_mqtt::AsyncClient` may be shared between tasks; concurrent publishes
/// need no extra locking.
pub struct PahoPublisher {
    client: mqtt::AsyncClient,
    topic: String,
}

fn ssl_options(tls_params: &MqttTlsParams) -> mqtt::Result<mqtt::SslOptions> {
    let mut builder = mqtt::SslOptionsBuilder::new();
    builder
        .trust_store(&tls_params.ca_path)?
        .key_store(&tls_params.cert_path)?
        .private_key(&tls_params.key_path)?;
    if let Some(key_pass) = &tls_params.key_pass {
        builder.private_key_password(key_pass.as_str());
    }
    Ok(builder.finalize())
}

impl PahoPublisher {
    /// Connects to the broker described by `params`.
    ///
    /// # Errors
    ///
    /// * TLS is enabled without TLS parameters or the key material cannot be loaded.
    ///
    /// * The client cannot be created or the broker refuses the connection.
    ///
    pub async fn connect(params: &MqttParams) -> std::result::Result<Self, MqttSetupError> {
        let create_opts = mqtt::CreateOptionsBuilder::new()
            .server_uri(params.server_uri())
            .client_id(params.client_id.as_str())
            .finalize();

        let client = mqtt::AsyncClient::new(create_opts)?;

        let mut connect_builder = mqtt::ConnectOptionsBuilder::new();
        connect_builder
            .keep_alive_interval(time::Duration::from_secs(params.keep_alive_secs))
            .connect_timeout(time::Duration::from_millis(4000))
            .clean_session(true);

        if params.tls_enable {
            let tls_params = match &params.tls_params {
                Some(tls_params) => tls_params,
                None => {
                    log::error!(target: "uplinkd::mqtt", "TLS enabled but no TLS parameters specified!");
                    return Err(MqttSetupError::MissingTlsParameters);
                }
            };
            connect_builder.ssl_options(ssl_options(tls_params)?);
            log::debug!(target: "uplinkd::mqtt", "Set tls parameters for connection!");
        }

        client.connect(connect_builder.finalize()).await?;
        log::info!(target: "uplinkd::mqtt", "Mqtt client connected to \'{}\'!", params.server_uri());

        Ok(PahoPublisher {
            client,
            topic: params.topic.clone(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Disconnects from the broker.
    pub async fn disconnect(&self) {
        match self.client.disconnect(None).await {
            Ok(_) => log::info!(target: "uplinkd::mqtt", "Disconnected from mqtt client!"),
            Err(err) => log::error!(target: "uplinkd::mqtt", "Could not disconnect from mqtt client: {}", err),
        }
    }
}

/// Serializes `reading` into the message published on `topic`.
pub fn reading_message(topic: &str, reading: &SensorReading) -> Result<mqtt::Message> {
    let payload = serde_json::to_vec(reading)?;
    Ok(mqtt::Message::new(topic, payload, PUBLISH_QOS))
}

#[async_trait]
impl ReadingPublisher for PahoPublisher {
    async fn publish(&self, reading: &SensorReading) -> Result<()> {
        let message = reading_message(&self.topic, reading)?;
        match self.client.publish(message).await {
            Ok(_) => {
                log::debug!(target: "uplinkd::mqtt", "Published reading on \'{}\'", self.topic);
                Ok(())
            }
            Err(err) => {
                log::error!(target: "uplinkd::mqtt", "Could not publish reading on \'{}\': \'{}\'", self.topic, err);
                Err(err.into())
            }
        }
    }
}
