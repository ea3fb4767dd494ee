use std::io;
use std::sync::Arc;

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("io error: {0}")]
    IO(Arc<io::Error>),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("invalid key range: {0}")]
    InvalidRange(String),
    #[error("iteration cancelled")]
    Cancelled,
    #[error("config error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::IO(Arc::new(value))
    }
}

impl Error {
    pub fn new_io_err(e: io::Error) -> Self {
        Self::IO(Arc::new(e))
    }

    /// Cancellation is reported separately from engine failures so callers
    /// can tell a stopped scan from a broken one.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! map_io_res {
    ($result:expr) => {
        match $result {
            Ok(v) => Ok(v),
            Err(e) => Err(Error::IO(std::sync::Arc::new(e))),
        }
    };
}
