//! AMF0 encoder and decoder
//!
//! AMF0 is the original Action Message Format used in Flash/RTMP.
//! Reference: AMF0 File Format Specification (amf0-file-format-specification.pdf)
//!
//! The decoder is recursive descent over an [`Amf0Reader`]. Complex values
//! claim a slot in the [`ReferenceTable`] before their body is read, which
//! matches the numbering Flash Player uses when writing back-references.

use std::io::Read;

use bytes::{BufMut, Bytes, BytesMut};

use super::marker::Marker;
use super::reader::Amf0Reader;
use super::references::ReferenceTable;
use super::value::{Amf0Value, Properties};
use crate::config::{DecoderConfig, Utf8Policy};
use crate::error::{Amf0Error, Result};

/// Object end sequence: empty name followed by the ObjectEnd marker
const OBJECT_END: [u8; 3] = [0x00, 0x00, Marker::ObjectEnd as u8];

/// AMF0 value decoder
///
/// Holds the reference table for one session. Reuse across independent
/// messages only after [`reset`](Self::reset).
#[derive(Debug)]
pub struct Amf0Decoder {
    /// Reference table for object references
    references: ReferenceTable,
    config: DecoderConfig,
    /// Current nesting depth
    depth: usize,
    /// Values materialized this session, reference table copies included
    nodes: usize,
}

impl Amf0Decoder {
    /// Create a new decoder with default settings
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create decoder with explicit configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            references: ReferenceTable::new(),
            config,
            depth: 0,
            nodes: 0,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Complex values seen so far in this session
    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Reset decoder state (call between messages)
    pub fn reset(&mut self) {
        self.references.clear();
        self.depth = 0;
        self.nodes = 0;
    }

    /// Decode a single AMF0 value
    ///
    /// On failure the reference table is left as it was before the call.
    pub fn decode<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        let marker = reader.read_u8()?;
        self.decode_marked(marker, reader)
    }

    /// Decode values until the source ends cleanly between two values
    pub fn decode_all<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Vec<Amf0Value>> {
        let mut values = Vec::new();
        while let Some(marker) = reader.try_read_marker()? {
            values.push(self.decode_marked(marker, reader)?);
        }
        Ok(values)
    }

    fn decode_marked<R: Read>(&mut self, marker: u8, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        if self.depth >= self.config.max_depth {
            return Err(Amf0Error::NestingTooDeep(self.config.max_depth));
        }

        let (slots, nodes) = (self.references.len(), self.nodes);

        self.depth += 1;
        let result = self.charge(1).and_then(|_| self.decode_value(marker, reader));
        self.depth -= 1;

        if result.is_err() {
            // Slots claimed by the failed value must not resolve later
            self.references.truncate(slots);
            self.nodes = nodes;
        }
        result
    }

    fn charge(&mut self, nodes: usize) -> Result<()> {
        self.nodes = self.nodes.saturating_add(nodes);
        if self.nodes > self.config.max_nodes {
            return Err(Amf0Error::TooManyNodes(self.config.max_nodes));
        }
        Ok(())
    }

    fn decode_value<R: Read>(&mut self, marker: u8, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        match Marker::try_from(marker)? {
            Marker::Number => Ok(Amf0Value::Number(reader.read_f64()?)),
            Marker::Boolean => Ok(Amf0Value::Boolean(reader.read_u8()? != 0)),
            Marker::String => {
                let bytes = reader.read_string_short()?;
                Ok(Amf0Value::String(self.text(bytes)?))
            }
            Marker::Object => self.decode_object(reader),
            Marker::Null => Ok(Amf0Value::Null),
            Marker::Undefined => Ok(Amf0Value::Undefined),
            Marker::Reference => self.decode_reference(reader),
            Marker::EcmaArray => self.decode_ecma_array(reader),
            Marker::StrictArray => self.decode_strict_array(reader),
            Marker::Date => self.decode_date(reader),
            Marker::LongString => {
                let bytes = reader.read_string_long()?;
                Ok(Amf0Value::LongString(self.text(bytes)?))
            }
            Marker::Unsupported => Ok(Amf0Value::Unsupported),
            Marker::XmlDocument => {
                let bytes = reader.read_string_long()?;
                Ok(Amf0Value::XmlDocument(self.text(bytes)?))
            }
            Marker::TypedObject => self.decode_typed_object(reader),
            marker @ (Marker::Movieclip | Marker::Recordset) => {
                Err(Amf0Error::UnsupportedFormat(marker))
            }
            // Only valid inside an object body, never as a value
            Marker::ObjectEnd => Err(Amf0Error::UnknownMarker(marker)),
        }
    }

    fn decode_object<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        let index = self.references.reserve();
        let properties = self.read_object_body(reader)?;
        self.complete(index, Amf0Value::Object(properties))
    }

    fn decode_ecma_array<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        let declared = reader.read_u32()?;

        let index = self.references.reserve();
        let properties = self.read_object_body(reader)?;

        if properties.len() != declared as usize {
            return Err(Amf0Error::CountMismatch {
                declared,
                actual: properties.len(),
            });
        }

        self.complete(index, Amf0Value::EcmaArray(properties))
    }

    fn decode_strict_array<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        let count = reader.read_u32()? as usize;

        let index = self.references.reserve();

        let mut elements = Vec::with_capacity(count.min(1024)); // Cap initial allocation
        for _ in 0..count {
            elements.push(self.decode(reader)?);
        }

        self.complete(index, Amf0Value::StrictArray(elements))
    }

    fn decode_typed_object<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        let class_name = reader.read_string_short()?;
        let class_name = self.text(class_name)?;

        let index = self.references.reserve();
        let properties = self.read_object_body(reader)?;

        self.complete(
            index,
            Amf0Value::TypedObject {
                class_name,
                properties,
            },
        )
    }

    fn decode_date<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        let millis = reader.read_f64()?;
        let timezone_minutes = reader.read_i16()?;
        if timezone_minutes != 0 {
            tracing::warn!(timezone_minutes, "AMF0 date carries a nonzero timezone offset");
        }

        Ok(Amf0Value::Date {
            millis,
            timezone_minutes,
        })
    }

    fn decode_reference<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Amf0Value> {
        let index = reader.read_u16()?;

        let (nodes, height) = match self.references.resolve(index)? {
            Some(value) if self.config.resolve_references => (value.node_count(), value.height()),
            Some(_) => return Ok(Amf0Value::Reference(index)),
            None => {
                // Target is an enclosing value that is still being decoded
                tracing::trace!(index, "cyclic AMF0 reference left unresolved");
                return Ok(Amf0Value::Reference(index));
            }
        };

        // The inlined copy takes the reference's place in the tree, so it
        // nests and counts like the value it repeats
        if self.depth - 1 + height > self.config.max_depth {
            return Err(Amf0Error::NestingTooDeep(self.config.max_depth));
        }
        self.charge(nodes - 1)?;

        tracing::trace!(index, nodes, "resolved AMF0 reference");
        let value = self.references.resolve(index)?.cloned();
        Ok(value.unwrap_or(Amf0Value::Reference(index)))
    }

    /// Read `(name, value)*` up to the `00 00 09` terminator
    fn read_object_body<R: Read>(&mut self, reader: &mut Amf0Reader<R>) -> Result<Properties> {
        let mut properties = Properties::new();

        loop {
            let name = reader.read_string_short()?;

            // An empty name is only legal as the first half of the end sequence
            if name.is_empty() {
                let end_marker = reader.read_u8()?;
                if end_marker == Marker::ObjectEnd as u8 {
                    return Ok(properties);
                }
                return Err(Amf0Error::InvalidObjectTermination(end_marker));
            }

            let name = self.text(name)?;
            if properties.contains_key(&name) {
                return Err(Amf0Error::DuplicateProperty(name));
            }

            let value = self.decode(reader)?;
            properties.insert(name, value);
        }
    }

    fn complete(&mut self, index: usize, value: Amf0Value) -> Result<Amf0Value> {
        // The table holds its own copy
        self.charge(value.node_count())?;

        tracing::trace!(index, marker = ?value.marker(), "registered AMF0 reference");
        self.references.complete(index, value.clone());
        Ok(value)
    }

    pub(crate) fn text(&self, bytes: Bytes) -> Result<String> {
        match self.config.utf8 {
            Utf8Policy::Strict => {
                String::from_utf8(Vec::from(bytes)).map_err(|_| Amf0Error::MalformedString)
            }
            Utf8Policy::Lossy => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

impl Default for Amf0Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// AMF0 encoder
///
/// Mirror of [`Amf0Decoder`]: every variant is written with its own marker.
/// If an `encode` call fails, the bytes written so far are left in the buffer.
pub struct Amf0Encoder {
    buf: BytesMut,
}

impl Amf0Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Create encoder with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the encoded bytes and reset encoder
    pub fn finish(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    /// Get current encoded length
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if encoder is empty
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Encode a single AMF0 value
    pub fn encode(&mut self, value: &Amf0Value) -> Result<()> {
        match value {
            Amf0Value::Number(n) => {
                self.buf.put_u8(Marker::Number as u8);
                self.buf.put_f64(*n);
            }
            Amf0Value::Boolean(b) => {
                self.buf.put_u8(Marker::Boolean as u8);
                self.buf.put_u8(u8::from(*b));
            }
            Amf0Value::String(s) => {
                if s.len() > u16::MAX as usize {
                    self.buf.put_u8(Marker::LongString as u8);
                    self.write_utf8_long(s)?;
                } else {
                    self.buf.put_u8(Marker::String as u8);
                    self.write_utf8(s)?;
                }
            }
            Amf0Value::Object(props) => {
                self.buf.put_u8(Marker::Object as u8);
                self.write_properties(props)?;
            }
            Amf0Value::Null => self.buf.put_u8(Marker::Null as u8),
            Amf0Value::Undefined => self.buf.put_u8(Marker::Undefined as u8),
            Amf0Value::Reference(index) => {
                self.buf.put_u8(Marker::Reference as u8);
                self.buf.put_u16(*index);
            }
            Amf0Value::EcmaArray(props) => {
                let count =
                    u32::try_from(props.len()).map_err(|_| Amf0Error::TooManyElements(props.len()))?;
                self.buf.put_u8(Marker::EcmaArray as u8);
                self.buf.put_u32(count);
                self.write_properties(props)?;
            }
            Amf0Value::StrictArray(elements) => {
                let count = u32::try_from(elements.len())
                    .map_err(|_| Amf0Error::TooManyElements(elements.len()))?;
                self.buf.put_u8(Marker::StrictArray as u8);
                self.buf.put_u32(count);
                for elem in elements {
                    self.encode(elem)?;
                }
            }
            Amf0Value::Date {
                millis,
                timezone_minutes,
            } => {
                self.buf.put_u8(Marker::Date as u8);
                self.buf.put_f64(*millis);
                self.buf.put_i16(*timezone_minutes);
            }
            Amf0Value::LongString(s) => {
                self.buf.put_u8(Marker::LongString as u8);
                self.write_utf8_long(s)?;
            }
            Amf0Value::Unsupported => self.buf.put_u8(Marker::Unsupported as u8),
            Amf0Value::XmlDocument(s) => {
                self.buf.put_u8(Marker::XmlDocument as u8);
                self.write_utf8_long(s)?;
            }
            Amf0Value::TypedObject {
                class_name,
                properties,
            } => {
                self.buf.put_u8(Marker::TypedObject as u8);
                self.write_utf8(class_name)?;
                self.write_properties(properties)?;
            }
        }
        Ok(())
    }

    /// Encode multiple values
    pub fn encode_all(&mut self, values: &[Amf0Value]) -> Result<()> {
        for value in values {
            self.encode(value)?;
        }
        Ok(())
    }

    pub(crate) fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub(crate) fn put_u8(&mut self, n: u8) {
        self.buf.put_u8(n);
    }

    pub(crate) fn put_u16(&mut self, n: u16) {
        self.buf.put_u16(n);
    }

    pub(crate) fn put_u32(&mut self, n: u32) {
        self.buf.put_u32(n);
    }

    /// Write UTF-8 string with 16-bit length prefix (no type marker)
    pub(crate) fn write_utf8(&mut self, s: &str) -> Result<()> {
        let len = u16::try_from(s.len()).map_err(|_| Amf0Error::StringTooLong(s.len()))?;
        self.buf.put_u16(len);
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    /// Write UTF-8 string with 32-bit length prefix (no type marker)
    fn write_utf8_long(&mut self, s: &str) -> Result<()> {
        let len = u32::try_from(s.len()).map_err(|_| Amf0Error::StringTooLong(s.len()))?;
        self.buf.put_u32(len);
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    fn write_properties(&mut self, props: &Properties) -> Result<()> {
        for (key, val) in props {
            // An empty name would read back as the end of the object
            if key.is_empty() {
                return Err(Amf0Error::EmptyPropertyName);
            }
            self.write_utf8(key)?;
            self.encode(val)?;
        }
        self.buf.put_slice(&OBJECT_END);
        Ok(())
    }
}

impl Default for Amf0Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to encode a single value
pub fn encode(value: &Amf0Value) -> Result<Bytes> {
    let mut encoder = Amf0Encoder::new();
    encoder.encode(value)?;
    Ok(encoder.finish())
}

/// Convenience function to encode multiple values
pub fn encode_all(values: &[Amf0Value]) -> Result<Bytes> {
    let mut encoder = Amf0Encoder::new();
    encoder.encode_all(values)?;
    Ok(encoder.finish())
}

/// Convenience function to decode a single value
pub fn decode(data: &[u8]) -> Result<Amf0Value> {
    let mut decoder = Amf0Decoder::new();
    decoder.decode(&mut Amf0Reader::new(data))
}

/// Convenience function to decode all values
pub fn decode_all(data: &[u8]) -> Result<Vec<Amf0Value>> {
    let mut decoder = Amf0Decoder::new();
    decoder.decode_all(&mut Amf0Reader::new(data))
}
