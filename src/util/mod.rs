mod bytes;

pub use bytes::{Bytes20, HASH_SIZE};
