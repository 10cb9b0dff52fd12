// Errors that end the runtime
//
// Everything protocol-, sensor- or write-related is recovered in place; only
// start-up failures (bad config, a serial port that will not open) surface here.

use crate::config::ConfigError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum RoverError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, RoverError>;
