use thiserror::Error;

#[derive(Debug, Error)]
pub enum BitTorrentError {
    #[error("Protocol Error: {0}")]
    ProtocolError(&'static str),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("could not parse uri: {0}")]
    UriSyntaxError(#[from] url::ParseError),

    #[error("unexpected url scheme: {0}")]
    SchemeError(String),

    #[error("magnet link is missing the '{0}' parameter")]
    MissingParameter(&'static str),

    #[error("malformed '{0}' parameter")]
    MalformedParameter(&'static str),

    #[error("unsupported encoding of 'exact topic' ({0} characters)")]
    UnsupportedEncoding(usize),

    #[error("error decoding '{0}' parameter")]
    DecodeError(&'static str),

    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Hex Error: {0}")]
    HexError(#[from] hex::FromHexError),

    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),
}
