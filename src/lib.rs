//! amf0-rs: AMF0 decoder and encoder
//!
//! Decodes AMF0 values and packets (headers + messages) from any
//! [`std::io::Read`] into a closed [`Amf0Value`] tree, including the
//! back-reference table the format uses to share complex values. A
//! symmetric encoder writes values and packets back out.
//!
//! - Strict by default: unknown markers, bad object terminators, duplicate
//!   properties and out-of-range references are errors, never panics
//! - Nesting depth is capped to keep hostile input off the stack
//!
//! # Example
//!
//! ```
//! use amf0_rs::{decode_packet, Amf0Value};
//!
//! // no headers, one message: {"a": true}
//! let data = [
//!     0x00, 0x00, 0x00, 0x01,
//!     0x03, 0x00, 0x01, b'a', 0x01, 0x01, 0x00, 0x00, 0x09,
//! ];
//! let packet = decode_packet(&data)?;
//! assert_eq!(packet.messages[0].get("a"), Some(&Amf0Value::Boolean(true)));
//! # Ok::<(), amf0_rs::Amf0Error>(())
//! ```

pub mod amf;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use amf::amf0::{decode, decode_all, encode, encode_all};
pub use amf::packet::{decode_packet, encode_packet};
pub use amf::stream::read_packet;
pub use amf::{Amf0Decoder, Amf0Encoder, Amf0Reader, Amf0Value, Header, Packet, PacketDecoder, Properties};
pub use config::{DecoderConfig, Utf8Policy};
pub use error::{Amf0Error, Result};
