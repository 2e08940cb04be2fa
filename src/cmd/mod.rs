pub(crate) mod handshake;
pub(crate) mod magnet_parse;
