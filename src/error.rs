use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// program bytes could not be fetched; the load is abandoned, not retried
    #[error("could not fetch program `{locator}`: {reason}")]
    Transport { locator: String, reason: String },

    /// the VM handed over a pixel buffer of the wrong size
    #[error("malformed buffer length: expected {expected}, got {actual}")]
    MalformedBuffer { expected: usize, actual: usize },

    #[error("no program at catalog index {0}")]
    NoSuchProgram(usize),

    #[error("virtual key line out of range: {0} (must be 0-15)")]
    KeyLine(u8),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("vm fault: {0}")]
    Vm(String),

    #[error("sound device: {0}")]
    Sound(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn transport(locator: &str, reason: impl ToString) -> Self {
        Error::Transport {
            locator: locator.to_string(),
            reason: reason.to_string(),
        }
    }
}
