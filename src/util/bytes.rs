use crate::BitTorrentError;

use serde::ser;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

pub const HASH_SIZE: usize = 20;

/// A fixed 20 byte value. Info hashes and peer ids both use it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bytes20([u8; HASH_SIZE]);

impl From<[u8; HASH_SIZE]> for Bytes20 {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Bytes20(bytes)
    }
}

impl TryFrom<&[u8]> for Bytes20 {
    type Error = BitTorrentError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; HASH_SIZE] =
            slice
                .try_into()
                .map_err(|_| BitTorrentError::InvalidLength {
                    expected: HASH_SIZE,
                    actual: slice.len(),
                })?;
        Ok(Bytes20(array))
    }
}

impl TryFrom<Vec<u8>> for Bytes20 {
    type Error = BitTorrentError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::try_from(value.as_slice())
    }
}

impl FromStr for Bytes20 {
    type Err = BitTorrentError;

    /// Parses a 40 character hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes)
    }
}

impl Bytes20 {
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Bytes20(bytes)
    }

    pub fn hex_encoded(&self) -> String {
        hex::encode(self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Bytes20 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Bytes20 {
    type Target = [u8; HASH_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Bytes20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex_encoded())
    }
}

impl ser::Serialize for Bytes20 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.hex_encoded())
    }
}
