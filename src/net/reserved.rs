use std::fmt;
use std::ops::Deref;

pub const RESERVED_SIZE: usize = 8;

// BEP10: 20th bit from the right, i.e. 0x10 in the sixth byte.
const EXTENSION_PROTOCOL_BYTE: usize = 5;
const EXTENSION_PROTOCOL_BIT: u8 = 0x10;

/// Whether the reserved bytes of a handshake advertise the extension protocol.
pub fn supports_extension_protocol(flags: &[u8; RESERVED_SIZE]) -> bool {
    flags[EXTENSION_PROTOCOL_BYTE] & EXTENSION_PROTOCOL_BIT == EXTENSION_PROTOCOL_BIT
}

/// The 8 capability bytes of a handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reserved([u8; RESERVED_SIZE]);

impl Reserved {
    pub fn new(bytes: [u8; RESERVED_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn supports_extension_protocol(&self) -> bool {
        supports_extension_protocol(&self.0)
    }

    pub fn with_extension_protocol(self) -> Self {
        let mut bytes = self.0;
        bytes[EXTENSION_PROTOCOL_BYTE] |= EXTENSION_PROTOCOL_BIT;
        Self(bytes)
    }
}

impl AsRef<[u8]> for Reserved {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Reserved {
    type Target = [u8; RESERVED_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Reserved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
