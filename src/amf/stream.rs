//! Reading packets from async transports
//!
//! The transport owns framing and knows how long a packet body is (an HTTP
//! `Content-Length`, a length-prefixed frame, ...). The body is buffered in
//! full and then decoded synchronously.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::packet::{Packet, PacketDecoder};
use crate::error::{Amf0Error, Result};

/// Cap on up-front allocation for the packet body
const MAX_PREALLOC: usize = 64 * 1024;

/// Read exactly `len` bytes from `reader` and decode them as one packet
pub async fn read_packet<R>(reader: &mut R, len: usize, decoder: &PacketDecoder) -> Result<Packet>
where
    R: AsyncRead + Unpin,
{
    tracing::debug!(len, "reading AMF0 packet body");

    let mut body = Vec::with_capacity(len.min(MAX_PREALLOC));
    let read = reader.take(len as u64).read_to_end(&mut body).await?;
    if read < len {
        return Err(Amf0Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("packet body needs {} bytes, transport had {}", len, read),
        )));
    }

    decoder.decode(&body[..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::value::Amf0Value;

    static PACKET: [u8; 7] = [0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0xEE];

    #[test]
    fn test_read_packet_from_chunks() {
        let mut mock = tokio_test::io::Builder::new()
            .read(&PACKET[..3])
            .read(&PACKET[3..6])
            .build();

        let packet = tokio_test::block_on(read_packet(&mut mock, 6, &PacketDecoder::new())).unwrap();
        assert_eq!(packet.messages, vec![Amf0Value::Boolean(true)]);
    }

    #[test]
    fn test_read_packet_leaves_following_bytes() {
        let mut source = &PACKET[..];

        let packet = tokio_test::block_on(read_packet(&mut source, 6, &PacketDecoder::new())).unwrap();
        assert_eq!(packet.messages.len(), 1);
        assert_eq!(source, &[0xEE_u8][..]);
    }

    #[test]
    fn test_read_packet_short_body() {
        let mut source = &PACKET[..4];

        let err = tokio_test::block_on(read_packet(&mut source, 6, &PacketDecoder::new())).unwrap_err();
        assert!(err.is_unexpected_eof());
    }
}
