use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("interface definition #{index}: {reason}")]
    PortSpec { index: usize, reason: String },

    #[error("port {0} does not exist")]
    UnknownPort(u16),

    #[error("interface `{name}' unknown")]
    InterfaceNotFound { name: String },

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
