extern crate clap;
extern crate ctrlc;
extern crate log;
extern crate log4rs;

use std::process::exit;
use std::sync::Arc;

use clap::App;
use tokio::sync::Notify;

use uplinkd::bridge::Bridge;
use uplinkd::config::Configuration;
use uplinkd::mqtt::PahoPublisher;
use uplinkd::payload::PayloadDecoder;
use uplinkd::server;
use uplinkd::ttn::TtnStorageClient;

async fn serve(configuration: Configuration, shutdown: Arc<Notify>) -> i32 {
    let publisher = match PahoPublisher::connect(&configuration.mqtt_connection_parameters).await {
        Ok(publisher) => Arc::new(publisher),
        Err(err) => {
            log::error!(target: "uplinkd", "Cannot connect to the mqtt broker: \'{}\'", err);
            return 201;
        }
    };

    let source = Arc::new(TtnStorageClient::new(&configuration.ttn_connection_parameters));
    let decoder = PayloadDecoder::new(&configuration.station_id);
    let bridge = Arc::new(Bridge::new(source, publisher.clone(), decoder));

    let bind_address = configuration.server_parameters.bind_address();
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(err) => {
            log::error!(target: "uplinkd", "Cannot listen on \'{}\': \'{}\'", bind_address, err);
            publisher.disconnect().await;
            return 202;
        }
    };
    log::info!(target: "uplinkd", "Listening on \'{}\', publishing on \'{}\'", bind_address, publisher.topic());

    let served = axum::serve(listener, server::routes(bridge))
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await;

    let code = match served {
        Ok(_) => 0,
        Err(err) => {
            log::error!(target: "uplinkd", "Server stopped with error: \'{}\'", err);
            301
        }
    };

    publisher.disconnect().await;
    code
}

fn main() {
    let cli_yaml = clap::load_yaml!("cli.yml");
    let matches = App::from(cli_yaml).get_matches();
    // Both flags carry a default_value in cli.yml.
    let config_path = matches.value_of("config").unwrap_or_default();
    let log_config_path = matches.value_of("log-config").unwrap_or_default();

    match log4rs::init_file(log_config_path, Default::default()) {
        Ok(_) => {},
        Err(err) => {
            eprintln!("Could not create logger from yaml configuration: {}", err);
            exit(-100);
        }
    };

    let configuration = match Configuration::from_file(config_path) {
        Ok(configuration) => configuration,
        Err(err) => {
            log::error!(target: "uplinkd", "Cannot load the configuration \'{}\': \'{}\'", config_path, err);
            exit(101);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!(target: "uplinkd", "Cannot start the async runtime: \'{}\'", err);
            exit(102);
        }
    };

    let shutdown = Arc::new(Notify::new());
    let shutdown_signal = Arc::clone(&shutdown);
    match ctrlc::set_handler(move || {
        log::info!(target: "uplinkd", "Termination signal received!");
        shutdown_signal.notify_one();
    }) {
        Ok(_) => {},
        Err(err) => {
            log::error!(target: "uplinkd", "Cannot set the termination handler: \'{}\'", err);
            exit(103);
        }
    };

    let code = runtime.block_on(serve(configuration, shutdown));

    log::info!(target: "uplinkd", "Exiting");
    exit(code);
}
