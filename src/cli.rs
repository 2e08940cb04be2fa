use crate::{Result, cmd};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Inspect BitTorrent handshakes and magnet links")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse a magnet link
    MagnetParse {
        uri: String,

        /// Print the parsed link as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serialize a handshake
    HandshakeEncode {
        /// Info hash as 40 hex characters
        #[arg(long)]
        info_hash: String,

        /// Peer id as 40 hex characters
        #[arg(long)]
        peer_id: Option<String>,

        /// Advertise the extension protocol
        #[arg(long)]
        extension: bool,

        /// Write raw bytes to stdout instead of hex
        #[arg(long)]
        raw: bool,
    },
    /// Parse a handshake from a hex string, or raw bytes on stdin
    HandshakeDecode { hex: Option<String> },
}

impl Command {
    pub async fn run(self) -> Result<()> {
        match self {
            Command::MagnetParse { uri, json } => cmd::magnet_parse::run(uri, json),
            Command::HandshakeEncode {
                info_hash,
                peer_id,
                extension,
                raw,
            } => cmd::handshake::encode(info_hash, peer_id, extension, raw).await,
            Command::HandshakeDecode { hex } => cmd::handshake::decode(hex).await,
        }
    }
}
