use thiserror::Error;

/// Setup-fatal errors. Per-packet decode errors are never represented here —
/// the decoder swallows those and logs a line (see [`crate::decode`]).
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("capture error: {0}")]
    Capture(#[from] pcap::Error),

    #[error("datalink type '{0:?}' is not supported (need EN10MB or LINUX_SLL)")]
    UnsupportedLinkType(pcap::Linktype),
}

pub type Result<T> = std::result::Result<T, SensorError>;
