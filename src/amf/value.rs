//! AMF0 value types
//!
//! One variant per AMF0 marker. Consumers have to match every type the
//! format can carry; there is no catch-all "any" representation.

use indexmap::IndexMap;

use super::marker::Marker;

/// Object properties in wire order
///
/// Equality ignores order, iteration follows the order the properties were
/// decoded (or inserted) in.
pub type Properties = IndexMap<String, Amf0Value>;

/// AMF0 value
#[derive(Debug, Clone, PartialEq)]
pub enum Amf0Value {
    /// IEEE 754 double-precision floating point (0x00)
    Number(f64),

    /// Boolean value (0x01)
    Boolean(bool),

    /// UTF-8 string with 16-bit length (0x02)
    String(String),

    /// Anonymous key-value object (0x03)
    Object(Properties),

    /// Null value (0x05)
    Null,

    /// Undefined value (0x06)
    Undefined,

    /// Back-reference into the session's reference table (0x07)
    ///
    /// Produced when references are not inlined, or when the target is still
    /// being constructed (a cycle).
    Reference(u16),

    /// Associative array (0x08)
    EcmaArray(Properties),

    /// Dense array (0x0A)
    StrictArray(Vec<Amf0Value>),

    /// Milliseconds since Unix epoch plus timezone offset in minutes (0x0B)
    Date { millis: f64, timezone_minutes: i16 },

    /// UTF-8 string with 32-bit length (0x0C)
    LongString(String),

    /// Unsupported marker value (0x0D)
    Unsupported,

    /// XML document text (0x0F)
    XmlDocument(String),

    /// Object with a registered class name (0x10)
    TypedObject {
        class_name: String,
        properties: Properties,
    },
}

impl Amf0Value {
    /// Marker byte this value is encoded with
    ///
    /// `String` values too long for a 16-bit length are written as
    /// `LongString` by the encoder regardless of this.
    pub fn marker(&self) -> Marker {
        match self {
            Amf0Value::Number(_) => Marker::Number,
            Amf0Value::Boolean(_) => Marker::Boolean,
            Amf0Value::String(_) => Marker::String,
            Amf0Value::Object(_) => Marker::Object,
            Amf0Value::Null => Marker::Null,
            Amf0Value::Undefined => Marker::Undefined,
            Amf0Value::Reference(_) => Marker::Reference,
            Amf0Value::EcmaArray(_) => Marker::EcmaArray,
            Amf0Value::StrictArray(_) => Marker::StrictArray,
            Amf0Value::Date { .. } => Marker::Date,
            Amf0Value::LongString(_) => Marker::LongString,
            Amf0Value::Unsupported => Marker::Unsupported,
            Amf0Value::XmlDocument(_) => Marker::XmlDocument,
            Amf0Value::TypedObject { .. } => Marker::TypedObject,
        }
    }

    /// Whether this value occupies a slot in the reference table
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Amf0Value::Object(_)
                | Amf0Value::EcmaArray(_)
                | Amf0Value::StrictArray(_)
                | Amf0Value::TypedObject { .. }
        )
    }

    /// Number of values in this tree, this one included
    pub fn node_count(&self) -> usize {
        match self {
            Amf0Value::Object(p)
            | Amf0Value::EcmaArray(p)
            | Amf0Value::TypedObject { properties: p, .. } => {
                1 + p.values().map(Amf0Value::node_count).sum::<usize>()
            }
            Amf0Value::StrictArray(a) => 1 + a.iter().map(Amf0Value::node_count).sum::<usize>(),
            _ => 1,
        }
    }

    /// Nesting levels in this tree; a scalar is 1
    pub fn height(&self) -> usize {
        let children = match self {
            Amf0Value::Object(p)
            | Amf0Value::EcmaArray(p)
            | Amf0Value::TypedObject { properties: p, .. } => {
                p.values().map(Amf0Value::height).max()
            }
            Amf0Value::StrictArray(a) => a.iter().map(Amf0Value::height).max(),
            _ => None,
        };
        1 + children.unwrap_or(0)
    }

    /// Try to get this value as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Value::String(s) | Amf0Value::LongString(s) | Amf0Value::XmlDocument(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the properties of an object-like value
    pub fn as_object(&self) -> Option<&Properties> {
        match self {
            Amf0Value::Object(m) => Some(m),
            Amf0Value::EcmaArray(m) => Some(m),
            Amf0Value::TypedObject { properties, .. } => Some(properties),
            _ => None,
        }
    }

    /// Try to get this value as an array reference
    pub fn as_array(&self) -> Option<&[Amf0Value]> {
        match self {
            Amf0Value::StrictArray(a) => Some(a.as_slice()),
            _ => None,
        }
    }

    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, Amf0Value::Null | Amf0Value::Undefined)
    }

    /// Get a property from an object value
    pub fn get(&self, key: &str) -> Option<&Amf0Value> {
        self.as_object()?.get(key)
    }

    /// Get a string property from an object value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Get a number property from an object value
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_number()
    }
}

impl Default for Amf0Value {
    fn default() -> Self {
        Amf0Value::Null
    }
}

impl From<bool> for Amf0Value {
    fn from(v: bool) -> Self {
        Amf0Value::Boolean(v)
    }
}

impl From<f64> for Amf0Value {
    fn from(v: f64) -> Self {
        Amf0Value::Number(v)
    }
}

impl From<i32> for Amf0Value {
    fn from(v: i32) -> Self {
        Amf0Value::Number(v as f64)
    }
}

impl From<u32> for Amf0Value {
    fn from(v: u32) -> Self {
        Amf0Value::Number(v as f64)
    }
}

impl From<String> for Amf0Value {
    fn from(v: String) -> Self {
        Amf0Value::String(v)
    }
}

impl From<&str> for Amf0Value {
    fn from(v: &str) -> Self {
        Amf0Value::String(v.to_string())
    }
}

impl<V: Into<Amf0Value>> From<Vec<V>> for Amf0Value {
    fn from(v: Vec<V>) -> Self {
        Amf0Value::StrictArray(v.into_iter().map(Into::into).collect())
    }
}

impl From<Properties> for Amf0Value {
    fn from(v: Properties) -> Self {
        Amf0Value::Object(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        let s = Amf0Value::String("test".into());
        assert_eq!(s.as_str(), Some("test"));
        assert_eq!(s.as_number(), None);

        let n = Amf0Value::Number(42.0);
        assert_eq!(n.as_number(), Some(42.0));
        assert_eq!(n.as_str(), None);

        let mut obj = Properties::new();
        obj.insert("key".to_string(), Amf0Value::String("value".into()));
        let o = Amf0Value::Object(obj);
        assert_eq!(o.get_string("key"), Some("value"));
    }

    #[test]
    fn test_text_variants_as_str() {
        assert_eq!(Amf0Value::LongString("long".into()).as_str(), Some("long"));
        assert_eq!(Amf0Value::XmlDocument("<a/>".into()).as_str(), Some("<a/>"));
    }

    #[test]
    fn test_as_object_variants() {
        let mut props = Properties::new();
        props.insert("x".to_string(), Amf0Value::Number(10.0));

        let typed = Amf0Value::TypedObject {
            class_name: "Point".to_string(),
            properties: props.clone(),
        };
        assert_eq!(typed.get_number("x"), Some(10.0));

        let ecma = Amf0Value::EcmaArray(props);
        assert_eq!(ecma.get_number("x"), Some(10.0));

        assert!(Amf0Value::Null.get("x").is_none());
        assert!(Amf0Value::StrictArray(vec![]).get("0").is_none());
    }

    #[test]
    fn test_property_order_preserved() {
        let mut props = Properties::new();
        props.insert("zeta".to_string(), Amf0Value::Null);
        props.insert("alpha".to_string(), Amf0Value::Null);
        props.insert("mid".to_string(), Amf0Value::Null);

        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_object_equality_ignores_order() {
        let mut a = Properties::new();
        a.insert("x".to_string(), Amf0Value::Number(1.0));
        a.insert("y".to_string(), Amf0Value::Number(2.0));

        let mut b = Properties::new();
        b.insert("y".to_string(), Amf0Value::Number(2.0));
        b.insert("x".to_string(), Amf0Value::Number(1.0));

        assert_eq!(Amf0Value::Object(a), Amf0Value::Object(b));
    }

    #[test]
    fn test_marker_mapping() {
        assert_eq!(Amf0Value::Number(0.0).marker(), Marker::Number);
        assert_eq!(Amf0Value::Reference(3).marker(), Marker::Reference);
        assert_eq!(
            Amf0Value::Date {
                millis: 0.0,
                timezone_minutes: 0
            }
            .marker(),
            Marker::Date
        );
        assert_eq!(Amf0Value::Unsupported.marker(), Marker::Unsupported);
    }

    #[test]
    fn test_is_complex() {
        assert!(Amf0Value::Object(Properties::new()).is_complex());
        assert!(Amf0Value::EcmaArray(Properties::new()).is_complex());
        assert!(Amf0Value::StrictArray(vec![]).is_complex());
        assert!(Amf0Value::TypedObject {
            class_name: "A".into(),
            properties: Properties::new()
        }
        .is_complex());
        assert!(!Amf0Value::String("x".into()).is_complex());
        assert!(!Amf0Value::Reference(0).is_complex());
    }

    #[test]
    fn test_node_count_and_height() {
        assert_eq!(Amf0Value::Null.node_count(), 1);
        assert_eq!(Amf0Value::Null.height(), 1);
        assert_eq!(Amf0Value::StrictArray(vec![]).height(), 1);

        let mut inner = Properties::new();
        inner.insert("a".to_string(), Amf0Value::Number(1.0));
        inner.insert("b".to_string(), Amf0Value::StrictArray(vec![Amf0Value::Null]));
        let value = Amf0Value::StrictArray(vec![Amf0Value::Object(inner), Amf0Value::Null]);

        // array, object, a, b, b[0], null
        assert_eq!(value.node_count(), 6);
        assert_eq!(value.height(), 4);
    }

    #[test]
    fn test_is_null_or_undefined() {
        assert!(Amf0Value::Null.is_null_or_undefined());
        assert!(Amf0Value::Undefined.is_null_or_undefined());
        assert!(!Amf0Value::Unsupported.is_null_or_undefined());
        assert!(!Amf0Value::Boolean(false).is_null_or_undefined());
        assert!(!Amf0Value::String(String::new()).is_null_or_undefined());
    }

    #[test]
    fn test_from_conversions() {
        let v: Amf0Value = "test".into();
        assert!(matches!(v, Amf0Value::String(_)));

        let v: Amf0Value = 42i32.into();
        assert_eq!(v, Amf0Value::Number(42.0));

        let v: Amf0Value = 1000u32.into();
        assert_eq!(v, Amf0Value::Number(1000.0));

        let v: Amf0Value = true.into();
        assert_eq!(v.as_bool(), Some(true));

        let v: Amf0Value = vec![1.0_f64, 2.0, 3.0].into();
        assert_eq!(v.as_array().map(|a| a.len()), Some(3));

        let v: Amf0Value = Properties::new().into();
        assert!(matches!(v, Amf0Value::Object(_)));
    }

    #[test]
    fn test_default_value() {
        assert_eq!(Amf0Value::default(), Amf0Value::Null);
    }
}
