//! AMF0 (Action Message Format) implementation
//!
//! AMF0 is Adobe's binary serialization format used in RTMP and Flash
//! Remoting for encoding command parameters and metadata.
//!
//! Layering, leaves first: [`reader`] (big-endian primitives), [`value`] and
//! [`marker`] (the value model), [`references`] (back-reference table),
//! [`amf0`] (value decoder/encoder), [`packet`] (headers + messages).

pub mod amf0;
pub mod marker;
pub mod packet;
pub mod reader;
pub mod references;
pub mod stream;
pub mod value;

pub use amf0::{Amf0Decoder, Amf0Encoder};
pub use marker::Marker;
pub use packet::{Header, Packet, PacketDecoder};
pub use reader::Amf0Reader;
pub use references::ReferenceTable;
pub use value::{Amf0Value, Properties};
