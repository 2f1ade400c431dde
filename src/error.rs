// Errors for the ALP core.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidParams(String),
    #[error("port is not open")]
    PortClosed,
}

pub type AlpResult<T> = std::result::Result<T, Error>;
