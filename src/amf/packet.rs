//! AMF0 packets
//!
//! ```text
//! packet  = [version u16] header-count u16 *header message-count u16 *value
//! header  = name (u16 + UTF-8) must-understand u8 length u32 value
//! ```
//!
//! A header length of `0xFFFFFFFE` means the value is read straight from the
//! stream; any other length bounds the value to exactly that many bytes.

use std::io::Read;

use bytes::Bytes;

use super::amf0::{Amf0Decoder, Amf0Encoder};
use super::reader::Amf0Reader;
use super::value::Amf0Value;
use crate::config::DecoderConfig;
use crate::error::{Amf0Error, Result};

/// Header length meaning "determined by the value's own encoding"
pub const UNKNOWN_HEADER_LENGTH: u32 = 0xFFFF_FFFE;

/// Cap on up-front allocation for header/message lists
const MAX_PREALLOC_ITEMS: usize = 64;

/// Packet header
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    /// Receiver must reject the packet if it does not understand this header
    pub must_understand: bool,
    pub value: Amf0Value,
}

/// Decoded AMF0 packet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Packet {
    /// Opaque version bytes, empty unless the decoder expects a version word
    pub version: Bytes,
    pub headers: Vec<Header>,
    pub messages: Vec<Amf0Value>,
}

/// Packet decoder
///
/// Only holds configuration. Each [`decode`](Self::decode) call gets its own
/// reference table, so one instance can serve any number of connections.
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder {
    config: DecoderConfig,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one packet from a byte source
    ///
    /// Any failure aborts the whole packet; nothing partial is returned.
    pub fn decode<R: Read>(&self, source: R) -> Result<Packet> {
        let mut reader = Amf0Reader::new(source);
        let mut decoder = Amf0Decoder::with_config(self.config.clone());

        let version = if self.config.version_prefix {
            Bytes::copy_from_slice(&reader.read_u16()?.to_be_bytes())
        } else {
            Bytes::new()
        };

        let header_count = reader.read_u16()? as usize;
        tracing::debug!(header_count, "decoding AMF0 packet headers");

        let mut headers = Vec::with_capacity(header_count.min(MAX_PREALLOC_ITEMS));
        for _ in 0..header_count {
            headers.push(self.decode_header(&mut decoder, &mut reader)?);
        }

        let message_count = reader.read_u16()? as usize;
        tracing::debug!(message_count, "decoding AMF0 packet messages");

        let mut messages = Vec::with_capacity(message_count.min(MAX_PREALLOC_ITEMS));
        for _ in 0..message_count {
            messages.push(decoder.decode(&mut reader)?);
        }

        tracing::debug!(
            headers = headers.len(),
            messages = messages.len(),
            references = decoder.references().len(),
            "AMF0 packet decoded"
        );

        Ok(Packet {
            version,
            headers,
            messages,
        })
    }

    fn decode_header<R: Read>(
        &self,
        decoder: &mut Amf0Decoder,
        reader: &mut Amf0Reader<R>,
    ) -> Result<Header> {
        let name = reader.read_string_short()?;
        let name = decoder.text(name)?;
        let must_understand = reader.read_u8()? != 0;
        let length = reader.read_u32()?;

        let value = if length == UNKNOWN_HEADER_LENGTH {
            tracing::trace!(header = %name, "header value has unknown length");
            decoder.decode(reader)?
        } else {
            let mut view = reader.bounded(u64::from(length));
            let value = decoder.decode(&mut view)?;
            let skipped = view.drain()?;
            if skipped > 0 {
                tracing::debug!(header = %name, length, skipped, "skipped trailing header bytes");
            }
            value
        };

        Ok(Header {
            name,
            must_understand,
            value,
        })
    }
}

/// Convenience function to decode a packet with default settings
pub fn decode_packet(data: &[u8]) -> Result<Packet> {
    PacketDecoder::new().decode(data)
}

/// Encode a packet
///
/// `version` is written verbatim. Every header is written with the exact
/// byte length of its encoded value.
pub fn encode_packet(packet: &Packet) -> Result<Bytes> {
    let mut encoder = Amf0Encoder::new();
    encoder.put_slice(&packet.version);

    let header_count = u16::try_from(packet.headers.len())
        .map_err(|_| Amf0Error::TooManyElements(packet.headers.len()))?;
    encoder.put_u16(header_count);

    for header in &packet.headers {
        encoder.write_utf8(&header.name)?;
        encoder.put_u8(u8::from(header.must_understand));

        let value = super::amf0::encode(&header.value)?;
        match u32::try_from(value.len()) {
            Ok(len) if len < UNKNOWN_HEADER_LENGTH => encoder.put_u32(len),
            // Too long to frame; let the value delimit itself
            _ => encoder.put_u32(UNKNOWN_HEADER_LENGTH),
        }
        encoder.put_slice(&value);
    }

    let message_count = u16::try_from(packet.messages.len())
        .map_err(|_| Amf0Error::TooManyElements(packet.messages.len()))?;
    encoder.put_u16(message_count);
    encoder.encode_all(&packet.messages)?;

    Ok(encoder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::value::Properties;

    #[test]
    fn test_empty_packet() {
        let packet = decode_packet(&[0x00, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(packet, Packet::default());
    }

    #[test]
    fn test_header_with_length_and_padding() {
        let data = [
            0x00, 0x01, // 1 header
            0x00, 0x01, b'h', 0x01, // "h", must understand
            0x00, 0x00, 0x00, 0x04, // 4 byte span
            0x05, 0xAA, 0xBB, 0xCC, // null + 3 trailing bytes
            0x00, 0x01, // 1 message
            0x01, 0x01, // true
        ];
        let packet = decode_packet(&data).unwrap();

        assert_eq!(
            packet.headers,
            vec![Header {
                name: "h".into(),
                must_understand: true,
                value: Amf0Value::Null,
            }]
        );
        assert_eq!(packet.messages, vec![Amf0Value::Boolean(true)]);
    }

    #[test]
    fn test_header_with_unknown_length() {
        let data = [
            0x00, 0x01, //
            0x00, 0x02, b'i', b'd', 0x00, //
            0xFF, 0xFF, 0xFF, 0xFE, // sentinel
            0x02, 0x00, 0x01, b'x', //
            0x00, 0x00,
        ];
        let packet = decode_packet(&data).unwrap();

        assert_eq!(packet.headers.len(), 1);
        assert!(!packet.headers[0].must_understand);
        assert_eq!(packet.headers[0].value, Amf0Value::String("x".into()));
        assert!(packet.messages.is_empty());
    }

    #[test]
    fn test_header_value_cannot_read_past_span() {
        // Number needs 8 payload bytes but the span only allows 2 in total;
        // the bytes that follow must not be borrowed
        let data = [
            0x00, 0x01, //
            0x00, 0x01, b'n', 0x00, //
            0x00, 0x00, 0x00, 0x02, //
            0x00, 0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x00, 0x00,
        ];
        assert!(decode_packet(&data).unwrap_err().is_unexpected_eof());
    }

    #[test]
    fn test_version_prefix() {
        let data = [0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x05];
        let decoder = PacketDecoder::with_config(DecoderConfig::default().version_prefix(true));
        let packet = decoder.decode(&data[..]).unwrap();

        assert_eq!(&packet.version[..], &[0x00, 0x03]);
        assert_eq!(packet.messages, vec![Amf0Value::Null]);
        assert_eq!(&encode_packet(&packet).unwrap()[..], &data[..]);
    }

    #[test]
    fn test_references_span_headers_and_messages() {
        let data = [
            0x00, 0x01, //
            0x00, 0x01, b'o', 0x00, //
            0xFF, 0xFF, 0xFF, 0xFE, //
            0x03, 0x00, 0x01, b'k', 0x05, 0x00, 0x00, 0x09, // {k: null}, index 0
            0x00, 0x01, //
            0x07, 0x00, 0x00, // ref 0
        ];
        let packet = decode_packet(&data).unwrap();

        let mut expected = Properties::new();
        expected.insert("k".into(), Amf0Value::Null);
        assert_eq!(packet.messages, vec![Amf0Value::Object(expected)]);
    }

    #[test]
    fn test_references_do_not_leak_between_packets() {
        let decoder = PacketDecoder::new();
        let first = [0x00, 0x00, 0x00, 0x01, 0x0A, 0x00, 0x00, 0x00, 0x00];
        let second = [0x00, 0x00, 0x00, 0x01, 0x07, 0x00, 0x00];

        assert!(decoder.decode(&first[..]).is_ok());
        assert!(matches!(
            decoder.decode(&second[..]),
            Err(Amf0Error::ReferenceOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_nested_failure_aborts_packet() {
        let data = [
            0x00, 0x00, //
            0x00, 0x02, //
            0x05, // fine
            0x0A, 0x00, 0x00, 0x00, 0x01, 0x42, // array holding an unknown marker
        ];
        assert!(matches!(
            decode_packet(&data),
            Err(Amf0Error::UnknownMarker(0x42))
        ));
    }

    #[test]
    fn test_reference_expansion_aborts_packet() {
        // [null], then 22 arrays each holding two references to the previous one
        let mut data = vec![0x00, 0x00, 0x00, 23, 0x0A, 0x00, 0x00, 0x00, 0x01, 0x05];
        for k in 1..=22u16 {
            data.extend_from_slice(&[0x0A, 0x00, 0x00, 0x00, 0x02]);
            data.push(0x07);
            data.extend_from_slice(&(k - 1).to_be_bytes());
            data.push(0x07);
            data.extend_from_slice(&(k - 1).to_be_bytes());
        }

        let decoder = PacketDecoder::with_config(DecoderConfig::default().max_nodes(50_000));
        assert!(matches!(
            decoder.decode(&data[..]),
            Err(Amf0Error::TooManyNodes(50_000))
        ));
    }

    #[test]
    fn test_packet_roundtrip() {
        let data = [
            0x00, 0x02, //
            0x00, 0x01, b'a', 0x01, 0x00, 0x00, 0x00, 0x02, 0x01, 0x00, //
            0x00, 0x01, b'b', 0x00, 0x00, 0x00, 0x00, 0x01, 0x06, //
            0x00, 0x02, //
            0x02, 0x00, 0x02, b'o', b'k', //
            0x0A, 0x00, 0x00, 0x00, 0x01, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let packet = decode_packet(&data).unwrap();
        assert_eq!(&encode_packet(&packet).unwrap()[..], &data[..]);
    }

    #[test]
    fn test_truncated_packet() {
        let packet = Packet {
            version: Bytes::new(),
            headers: vec![Header {
                name: "auth".into(),
                must_understand: true,
                value: Amf0Value::String("token".into()),
            }],
            messages: vec![Amf0Value::Number(3.0), Amf0Value::StrictArray(vec![])],
        };
        let encoded = encode_packet(&packet).unwrap();
        assert_eq!(decode_packet(&encoded).unwrap(), packet);

        for cut in 0..encoded.len() {
            let err = decode_packet(&encoded[..cut]).unwrap_err();
            assert!(err.is_unexpected_eof(), "cut at {}: {:?}", cut, err);
        }
    }

    #[test]
    fn test_shared_decoder_across_threads() {
        let decoder = PacketDecoder::new();
        let data = [0x00, 0x00, 0x00, 0x01, 0x03, 0x00, 0x01, b'a', 0x05, 0x00, 0x00, 0x09];

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let packet = decoder.decode(&data[..]).unwrap();
                    assert_eq!(packet.messages.len(), 1);
                });
            }
        });
    }
}
