//! Error types for amf0-rs

use std::io;

use crate::amf::marker::Marker;

/// Result type alias using the library's error type
pub type Result<T> = std::result::Result<T, Amf0Error>;

/// AMF0 encoding/decoding errors
///
/// Every variant is a value-level failure: malformed input is reported here,
/// never by panicking.
#[derive(thiserror::Error, Debug)]
pub enum Amf0Error {
    /// The byte source failed or ended before a value was complete
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// String payload is not valid UTF-8 (strict mode only)
    #[error("Invalid UTF-8 in AMF string")]
    MalformedString,

    /// Marker byte outside the AMF0 marker table
    #[error("Unknown AMF0 marker: 0x{0:02x}")]
    UnknownMarker(u8),

    /// Marker is part of AMF0 but cannot be decoded (Movieclip, Recordset)
    #[error("Unsupported AMF0 type: {0:?}")]
    UnsupportedFormat(Marker),

    /// Reference index points past the reference table
    #[error("AMF0 reference {index} out of range (table has {len} entries)")]
    ReferenceOutOfRange { index: u16, len: usize },

    /// ECMA array declared a different number of entries than it carried
    #[error("ECMA array count mismatch: declared {declared}, found {actual}")]
    CountMismatch { declared: u32, actual: usize },

    /// Same property name appeared twice in one object body
    #[error("Duplicate object property: {0:?}")]
    DuplicateProperty(String),

    /// Empty property name followed by something other than the end marker
    #[error("Invalid object end marker: 0x{0:02x}")]
    InvalidObjectTermination(u8),

    /// Input nests objects/arrays deeper than the configured limit
    #[error("AMF0 nesting too deep (limit {0})")]
    NestingTooDeep(usize),

    /// Decoding would materialize more values than the configured budget
    #[error("AMF0 input expands past {0} values")]
    TooManyNodes(usize),

    /// Empty property name, which would encode as the object terminator
    #[error("Empty property name cannot be encoded")]
    EmptyPropertyName,

    /// String does not fit its length prefix
    #[error("String too long for its AMF0 length prefix: {0} bytes")]
    StringTooLong(usize),

    /// Array or packet section does not fit its count field
    #[error("Too many elements: {0}")]
    TooManyElements(usize),
}

impl Amf0Error {
    /// True when the input ended in the middle of a value
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Amf0Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eof_detection() {
        let err = Amf0Error::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(err.is_unexpected_eof());

        let err = Amf0Error::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(!err.is_unexpected_eof());

        assert!(!Amf0Error::MalformedString.is_unexpected_eof());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Amf0Error::UnknownMarker(0x11).to_string(),
            "Unknown AMF0 marker: 0x11"
        );
        assert_eq!(
            Amf0Error::CountMismatch {
                declared: 3,
                actual: 2
            }
            .to_string(),
            "ECMA array count mismatch: declared 3, found 2"
        );
        assert_eq!(
            Amf0Error::UnsupportedFormat(Marker::Recordset).to_string(),
            "Unsupported AMF0 type: Recordset"
        );
    }
}
