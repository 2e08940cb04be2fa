use crate::{
    Result,
    net::{Handshake, Reserved},
    util::Bytes20,
};

use std::str::FromStr;
use tracing::warn;

const DEFAULT_PEER_ID: &[u8; 20] = b"-CT0001-012345678901";

pub(crate) async fn encode(
    info_hash: String,
    peer_id: Option<String>,
    extension: bool,
    raw: bool,
) -> Result<()> {
    let info_hash = Bytes20::from_str(&info_hash)?;
    let peer_id = peer_id
        .as_deref()
        .map(Bytes20::from_str)
        .transpose()?
        .unwrap_or(Bytes20::new(*DEFAULT_PEER_ID));

    let mut handshake = Handshake::new(info_hash, peer_id);
    if extension {
        handshake = handshake.with_reserved(Reserved::default().with_extension_protocol());
    }

    if raw {
        handshake.write_to_async(&mut tokio::io::stdout()).await?;
    } else {
        println!("{}", hex::encode(handshake.as_bytes()));
    }

    Ok(())
}

pub(crate) async fn decode(hex: Option<String>) -> Result<()> {
    let handshake = match hex {
        Some(hex) => {
            let bytes = hex::decode(hex.trim())?;
            let mut reader = bytes.as_slice();
            let handshake = Handshake::read_from(&mut reader)?;
            if !reader.is_empty() {
                warn!("Ignoring {} bytes after the handshake", reader.len());
            }
            handshake
        }
        None => Handshake::read_from_async(&mut tokio::io::stdin()).await?,
    };

    println!("Protocol: {}", String::from_utf8_lossy(handshake.protocol()));
    println!("Reserved: {}", handshake.reserved());
    println!(
        "Extension Protocol: {}",
        if handshake.supports_extension_protocol() {
            "yes"
        } else {
            "no"
        }
    );
    println!("Info Hash: {}", handshake.info_hash());
    println!("Peer ID: {}", handshake.peer_id());

    Ok(())
}
