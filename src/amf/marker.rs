//! AMF0 type markers
//!
//! ```text
//! 0x00 - Number (IEEE 754 double)
//! 0x01 - Boolean
//! 0x02 - String (UTF-8, 16-bit length prefix)
//! 0x03 - Object (key-value pairs until 0x000009)
//! 0x04 - MovieClip (reserved, not supported)
//! 0x05 - Null
//! 0x06 - Undefined
//! 0x07 - Reference (16-bit index)
//! 0x08 - ECMA Array (associative array)
//! 0x09 - Object End (0x000009 sequence)
//! 0x0A - Strict Array (dense array)
//! 0x0B - Date (double + timezone)
//! 0x0C - Long String (UTF-8, 32-bit length prefix)
//! 0x0D - Unsupported
//! 0x0E - RecordSet (reserved, not supported)
//! 0x0F - XML Document
//! 0x10 - Typed Object (class name + properties)
//! ```

use crate::error::Amf0Error;

/// AMF0 marker byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    Number = 0x00,
    Boolean = 0x01,
    String = 0x02,
    Object = 0x03,
    Movieclip = 0x04,
    Null = 0x05,
    Undefined = 0x06,
    Reference = 0x07,
    EcmaArray = 0x08,
    ObjectEnd = 0x09,
    StrictArray = 0x0A,
    Date = 0x0B,
    LongString = 0x0C,
    Unsupported = 0x0D,
    Recordset = 0x0E,
    XmlDocument = 0x0F,
    TypedObject = 0x10,
}

impl TryFrom<u8> for Marker {
    type Error = Amf0Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let marker = match byte {
            0x00 => Marker::Number,
            0x01 => Marker::Boolean,
            0x02 => Marker::String,
            0x03 => Marker::Object,
            0x04 => Marker::Movieclip,
            0x05 => Marker::Null,
            0x06 => Marker::Undefined,
            0x07 => Marker::Reference,
            0x08 => Marker::EcmaArray,
            0x09 => Marker::ObjectEnd,
            0x0A => Marker::StrictArray,
            0x0B => Marker::Date,
            0x0C => Marker::LongString,
            0x0D => Marker::Unsupported,
            0x0E => Marker::Recordset,
            0x0F => Marker::XmlDocument,
            0x10 => Marker::TypedObject,
            other => return Err(Amf0Error::UnknownMarker(other)),
        };
        Ok(marker)
    }
}

impl From<Marker> for u8 {
    fn from(marker: Marker) -> Self {
        marker as u8
    }
}
