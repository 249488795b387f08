use crate::error::GeocoderError;
use crate::logger::initialize as LoggerInitialize;
use crate::supervisor::{fail, supervise};

use geocoder_core::config::{AdapterConfig, LoggingSettings, load_dotenv};
use geocoder_core::dispatcher::GeocodingDispatcher;
use geocoder_core::host_channel::HostChannel;

use common::ErrorLocation;

use std::path::Path;
use std::panic::Location;
use std::sync::Arc;

use log::info;
use tokio::io::{AsyncRead, AsyncWrite};

/// Boots the adapter on the given host streams and serves it to completion.
///
/// The channel exists before configuration is read so that a startup failure
/// still reaches the host as an error envelope.
pub async fn run<R, W>(input: R, output: W, config_dir: &Path) -> i32
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let channel = HostChannel::new(input, output);
    let sender = channel.sender();

    let config = match AdapterConfig::load(config_dir) {
        Ok(config) => config,
        Err(e) => {
            // No usable logging settings; stderr at the default level still shows the failure.
            if let Err(logger_error) = LoggerInitialize(&LoggingSettings::default()) {
                eprintln!("{logger_error}");
            }
            return fail(&sender, startup_error(e.to_string())).await;
        }
    };

    if let Err(e) = LoggerInitialize(&config.logging) {
        return fail(&sender, e).await;
    }

    info!("Geocoder adapter starting");
    info!("Config directory: {}", config_dir.display());
    info!("Default geocoding type: {}", config.geocoding.default_type);

    let dispatcher = match GeocodingDispatcher::new(sender.clone(), &config.geocoding) {
        Ok(dispatcher) => Arc::new(dispatcher),
        Err(e) => return fail(&sender, startup_error(e.to_string())).await,
    };

    supervise(channel, dispatcher).await
}

/// Entry point used by the binary: reads `.env`, resolves the config
/// directory and serves stdin/stdout.
pub async fn run_stdio() -> i32 {
    let _ = load_dotenv();
    let config_dir = AdapterConfig::config_dir();

    run(tokio::io::stdin(), tokio::io::stdout(), &config_dir).await
}

#[track_caller]
fn startup_error(message: String) -> GeocoderError {
    GeocoderError::Startup {
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}
