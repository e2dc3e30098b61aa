//! Daemon configuration read from a YAML file.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mqtt::MqttParams;
use crate::record::DEFAULT_STATION_ID;
use crate::server::ServerParameters;
use crate::ttn::TtnParameters;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read the configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot deserialize the configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_station_id() -> String {
    DEFAULT_STATION_ID.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Configuration {
    /// Id stamped on every reading.
    #[serde(default = "default_station_id")]
    pub station_id: String,
    #[serde(default)]
    pub server_parameters: ServerParameters,
    pub ttn_connection_parameters: TtnParameters,
    pub mqtt_connection_parameters: MqttParams,
}

impl Configuration {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let configuration = serde_yaml::from_str::<Configuration>(yaml)?;
        configuration.validate()?;
        Ok(configuration)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut configuration_file = File::open(path)?;
        let mut configuration_string = String::new();
        configuration_file.read_to_string(&mut configuration_string)?;
        Configuration::from_yaml(&configuration_string)
    }

    /// Rejects values that would only fail once the daemon is running.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("station_id", &self.station_id),
            ("ttn_connection_parameters.url", &self.ttn_connection_parameters.url),
            ("ttn_connection_parameters.api_key", &self.ttn_connection_parameters.api_key),
            ("mqtt_connection_parameters.address", &self.mqtt_connection_parameters.address),
            ("mqtt_connection_parameters.client_id", &self.mqtt_connection_parameters.client_id),
            ("mqtt_connection_parameters.topic", &self.mqtt_connection_parameters.topic),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("'{}' must not be empty", name)));
        }

        let mqtt = &self.mqtt_connection_parameters;
        if mqtt.tls_enable && mqtt.tls_params.is_none() {
            return Err(ConfigError::Invalid(
                "'mqtt_connection_parameters.tls_params' required when tls is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
