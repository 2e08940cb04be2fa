mod handshake;
mod reserved;

pub use handshake::{Handshake, HandshakeCodec, PROTOCOL};
pub use reserved::{RESERVED_SIZE, Reserved, supports_extension_protocol};
