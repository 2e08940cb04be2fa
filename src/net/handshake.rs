macro_rules! bail {
    ($msg:expr) => {
        return Err(BitTorrentError::ProtocolError($msg))
    };
}

use crate::{
    BitTorrentError, Result,
    util::{Bytes20, HASH_SIZE},
};

use super::reserved::{RESERVED_SIZE, Reserved};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::{self, Read, Write};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, trace};

pub const PROTOCOL: &[u8] = b"BitTorrent protocol";

// 8 reserved, 20 info hash, 20 peer id
const TRAILER_SIZE: usize = RESERVED_SIZE + HASH_SIZE + HASH_SIZE;
const MAX_PROTOCOL_SIZE: usize = u8::MAX as usize;

/// The first message on every peer connection.
///
/// Layout on the wire:
///
/// ```text
/// pstrlen (1) | protocol (pstrlen) | reserved (8) | info hash (20) | peer id (20)
/// ```
///
/// The protocol identifier is kept as raw bytes so that handshakes from
/// clients using a non standard identifier survive a round trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    protocol: Bytes,
    reserved: Reserved,
    info_hash: Bytes20,
    peer_id: Bytes20,
}

impl Handshake {
    pub fn new(info_hash: Bytes20, peer_id: Bytes20) -> Self {
        Self {
            protocol: Bytes::from_static(PROTOCOL),
            reserved: Reserved::default(),
            info_hash,
            peer_id,
        }
    }

    pub fn with_protocol(
        protocol: impl Into<Bytes>,
        reserved: Reserved,
        info_hash: Bytes20,
        peer_id: Bytes20,
    ) -> Result<Self> {
        let protocol = protocol.into();

        if protocol.is_empty() {
            bail!("protocol identifier cannot be empty");
        }

        if protocol.len() > MAX_PROTOCOL_SIZE {
            bail!("protocol identifier cannot be longer than 255 bytes");
        }

        Ok(Self {
            protocol,
            reserved,
            info_hash,
            peer_id,
        })
    }

    pub fn with_reserved(self, reserved: Reserved) -> Self {
        Self { reserved, ..self }
    }

    pub fn protocol(&self) -> &[u8] {
        &self.protocol
    }

    pub fn reserved(&self) -> Reserved {
        self.reserved
    }

    pub fn info_hash(&self) -> Bytes20 {
        self.info_hash
    }

    pub fn peer_id(&self) -> Bytes20 {
        self.peer_id
    }

    pub fn supports_extension_protocol(&self) -> bool {
        self.reserved.supports_extension_protocol()
    }

    /// Number of bytes the handshake occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        1 + self.protocol.len() + TRAILER_SIZE
    }

    pub fn as_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.put(&mut buf);
        buf.freeze()
    }

    /// Reads one handshake, consuming exactly its bytes from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut pstrlen = [0u8; 1];
        reader.read_exact(&mut pstrlen)?;
        let pstrlen = protocol_len(pstrlen[0])?;

        let mut payload = vec![0u8; pstrlen + TRAILER_SIZE];
        reader.read_exact(&mut payload)?;

        Self::from_payload(pstrlen, Bytes::from(payload))
    }

    pub async fn read_from_async<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        let pstrlen = protocol_len(reader.read_u8().await?)?;

        let mut payload = vec![0u8; pstrlen + TRAILER_SIZE];
        reader.read_exact(&mut payload).await?;

        Self::from_payload(pstrlen, Bytes::from(payload))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.as_bytes())?;
        trace!("Wrote handshake for {}", self.info_hash);
        Ok(())
    }

    pub async fn write_to_async<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.as_bytes()).await?;
        writer.flush().await?;
        trace!("Wrote handshake for {}", self.info_hash);
        Ok(())
    }

    fn put(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_u8(self.protocol.len() as u8);
        dst.put_slice(&self.protocol);
        dst.put_slice(self.reserved.as_ref());
        dst.put_slice(self.info_hash.as_ref());
        dst.put_slice(self.peer_id.as_ref());
    }

    // `payload` is everything after the length byte.
    fn from_payload(pstrlen: usize, mut payload: Bytes) -> Result<Self> {
        debug_assert_eq!(payload.len(), pstrlen + TRAILER_SIZE);

        let protocol = payload.split_to(pstrlen);

        let mut reserved = [0u8; RESERVED_SIZE];
        payload.copy_to_slice(&mut reserved);

        let info_hash = Bytes20::try_from(&payload[..HASH_SIZE])?;
        let peer_id = Bytes20::try_from(&payload[HASH_SIZE..])?;

        debug!(
            "Read handshake: protocol {:?}, reserved {}, info hash {info_hash}",
            String::from_utf8_lossy(&protocol),
            hex::encode(reserved),
        );

        Ok(Self {
            protocol,
            reserved: Reserved::new(reserved),
            info_hash,
            peer_id,
        })
    }
}

fn protocol_len(pstrlen: u8) -> Result<usize> {
    if pstrlen == 0 {
        bail!("pstrlen cannot be 0");
    }
    Ok(pstrlen as usize)
}

/// Frames handshakes on a tokio stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandshakeCodec;

impl Decoder for HandshakeCodec {
    type Item = Handshake;
    type Error = BitTorrentError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(&first) = src.first() else {
            return Ok(None);
        };

        let pstrlen = match protocol_len(first) {
            Ok(pstrlen) => pstrlen,
            Err(err) => {
                src.advance(1);
                return Err(err);
            }
        };

        let frame_size = 1 + pstrlen + TRAILER_SIZE;
        if src.len() < frame_size {
            src.reserve(frame_size - src.len());
            return Ok(None);
        }

        src.advance(1);
        let payload = src.split_to(pstrlen + TRAILER_SIZE).freeze();

        Handshake::from_payload(pstrlen, payload).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(handshake) => Ok(Some(handshake)),
            None if src.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream closed with {} bytes of a partial handshake", src.len()),
            )
            .into()),
        }
    }
}

impl Encoder<Handshake> for HandshakeCodec {
    type Error = BitTorrentError;

    fn encode(&mut self, item: Handshake, dst: &mut BytesMut) -> Result<()> {
        item.put(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio_stream::StreamExt;
    use tokio_util::codec::FramedRead;

    fn info_hash() -> Bytes20 {
        Bytes20::new(*b"abcdefghijklmnopqrst")
    }

    fn peer_id() -> Bytes20 {
        Bytes20::new(*b"-CT0001-012345678901")
    }

    fn assert_io_error(err: BitTorrentError) {
        match err {
            BitTorrentError::IoError(err) => {
                assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("expected an IO error, got {other:?}"),
        }
    }

    #[test]
    fn test_serialize_layout() {
        let bytes = Handshake::new(info_hash(), peer_id()).as_bytes();

        assert_eq!(bytes.len(), 68);
        assert_eq!(bytes[0], 19);
        assert_eq!(&bytes[1..20], b"BitTorrent protocol");
        assert_eq!(&bytes[20..28], &[0u8; 8]);
        assert_eq!(&bytes[28..48], b"abcdefghijklmnopqrst");
        assert_eq!(&bytes[48..68], b"-CT0001-012345678901");
    }

    #[test]
    fn test_round_trip() {
        let handshake = Handshake::new(info_hash(), peer_id());
        let mut cursor = Cursor::new(handshake.as_bytes().to_vec());

        let parsed = Handshake::read_from(&mut cursor).unwrap();

        assert_eq!(parsed, handshake);
        assert_eq!(parsed.protocol(), PROTOCOL);
        assert!(!parsed.supports_extension_protocol());
    }

    #[test]
    fn test_round_trip_custom_protocol() {
        let reserved = Reserved::default().with_extension_protocol();

        for protocol in [vec![0xffu8], vec![b'x'; 255], b"\xde\xad\xbe\xef".to_vec()] {
            let handshake =
                Handshake::with_protocol(protocol.clone(), reserved, info_hash(), peer_id())
                    .unwrap();
            let bytes = handshake.as_bytes();
            assert_eq!(bytes.len(), 49 + protocol.len());
            assert_eq!(handshake.encoded_len(), bytes.len());

            let parsed = Handshake::read_from(&mut &bytes[..]).unwrap();
            assert_eq!(parsed, handshake);
            assert_eq!(parsed.protocol(), protocol.as_slice());
            assert!(parsed.supports_extension_protocol());
        }
    }

    #[test]
    fn test_with_protocol_rejects_bad_lengths() {
        let empty = Handshake::with_protocol(
            Bytes::new(),
            Reserved::default(),
            info_hash(),
            peer_id(),
        );
        assert!(matches!(empty, Err(BitTorrentError::ProtocolError(_))));

        let too_long = Handshake::with_protocol(
            vec![b'x'; 256],
            Reserved::default(),
            info_hash(),
            peer_id(),
        );
        assert!(matches!(too_long, Err(BitTorrentError::ProtocolError(_))));
    }

    #[test]
    fn test_zero_pstrlen_consumes_one_byte() {
        let mut data = vec![0u8];
        data.extend_from_slice(&Handshake::new(info_hash(), peer_id()).as_bytes());
        let mut cursor = Cursor::new(data);

        let err = Handshake::read_from(&mut cursor).unwrap_err();

        assert!(matches!(err, BitTorrentError::ProtocolError(_)));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_truncated_stream() {
        let bytes = Handshake::new(info_hash(), peer_id()).as_bytes();

        let err = Handshake::read_from(&mut &bytes[..67]).unwrap_err();
        assert_io_error(err);

        let err = Handshake::read_from(&mut &bytes[..1]).unwrap_err();
        assert_io_error(err);

        let err = Handshake::read_from(&mut io::empty()).unwrap_err();
        assert_io_error(err);
    }

    #[test]
    fn test_leaves_trailing_bytes() {
        let mut data = Handshake::new(info_hash(), peer_id()).as_bytes().to_vec();
        data.extend_from_slice(b"\x00\x00\x00\x01\x02");
        let mut cursor = Cursor::new(data);

        Handshake::read_from(&mut cursor).unwrap();

        assert_eq!(cursor.position(), 68);
    }

    #[test]
    fn test_write_to() {
        let handshake = Handshake::new(info_hash(), peer_id())
            .with_reserved(Reserved::default().with_extension_protocol());
        let mut buf = Vec::new();

        handshake.write_to(&mut buf).unwrap();

        assert_eq!(buf, handshake.as_bytes().to_vec());
        assert_eq!(buf[25], 0x10);
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(16);
        let handshake = Handshake::new(info_hash(), peer_id());
        let sent = handshake.clone();

        let writer = tokio::spawn(async move { sent.write_to_async(&mut client).await });

        let parsed = Handshake::read_from_async(&mut server).await.unwrap();
        writer.await.unwrap().unwrap();

        assert_eq!(parsed, handshake);
    }

    #[tokio::test]
    async fn test_async_truncated_stream() {
        let (mut client, mut server) = tokio::io::duplex(128);
        let bytes = Handshake::new(info_hash(), peer_id()).as_bytes();

        client.write_all(&bytes[..40]).await.unwrap();
        drop(client);

        let err = Handshake::read_from_async(&mut server).await.unwrap_err();
        assert_io_error(err);
    }

    #[tokio::test]
    async fn test_async_zero_pstrlen() {
        let mut reader: &[u8] = &[0u8, 19, 1, 2, 3];

        let err = Handshake::read_from_async(&mut reader).await.unwrap_err();

        assert!(matches!(err, BitTorrentError::ProtocolError(_)));
        assert_eq!(reader, &[19, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_codec_framed_read() {
        let first = Handshake::new(info_hash(), peer_id());
        let second = Handshake::with_protocol(
            Bytes::from_static(b"custom"),
            Reserved::default().with_extension_protocol(),
            peer_id(),
            info_hash(),
        )
        .unwrap();

        let mut data = first.as_bytes().to_vec();
        data.extend_from_slice(&second.as_bytes());

        let mut reader = FramedRead::new(data.as_slice(), HandshakeCodec);

        assert_eq!(reader.next().await.unwrap().unwrap(), first);
        assert_eq!(reader.next().await.unwrap().unwrap(), second);
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn test_codec_truncated_stream() {
        let bytes = Handshake::new(info_hash(), peer_id()).as_bytes();
        let mut reader = FramedRead::new(&bytes[..50], HandshakeCodec);

        let err = reader.next().await.unwrap().unwrap_err();
        assert_io_error(err);
    }

    #[test]
    fn test_codec_waits_for_full_frame() {
        let handshake = Handshake::new(info_hash(), peer_id());
        let mut codec = HandshakeCodec;
        let mut buf = BytesMut::new();

        codec.encode(handshake.clone(), &mut buf).unwrap();
        let mut partial = buf.split_to(30);

        assert!(codec.decode(&mut partial).unwrap().is_none());
        assert_eq!(partial.len(), 30);

        partial.unsplit(buf);
        assert_eq!(codec.decode(&mut partial).unwrap(), Some(handshake));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_codec_zero_pstrlen() {
        let mut buf = BytesMut::from(&b"\x00rest"[..]);

        let err = HandshakeCodec.decode(&mut buf).unwrap_err();

        assert!(matches!(err, BitTorrentError::ProtocolError(_)));
        assert_eq!(&buf[..], b"rest");
    }
}
