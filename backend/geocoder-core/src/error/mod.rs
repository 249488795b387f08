pub mod channel;
pub mod config;
pub mod geocode;
pub mod report;

pub use channel::{ChannelError, HostChannelError};
pub use config::ConfigError;
pub use geocode::GeocodeError;
pub use report::{ErrorReport, Reportable};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Geocode(#[from] geocode::GeocodeError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
