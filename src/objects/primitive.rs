//! The PDF value lattice: [`Name`], [`PdfString`], [`Value`], and [`ObjectId`].

use crate::objects::Dictionary;
use std::fmt;

/// A PDF name, e.g. `/Type`. Equality and hashing are on the textual body,
/// including the leading slash, so `Name` is the sole key type usable in a
/// [`Dictionary`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    /// Builds a name from its body, adding the leading slash if missing.
    pub fn new(body: impl Into<String>) -> Self {
        let mut s = body.into();
        if !s.starts_with('/') {
            s.insert(0, '/');
        }
        Name(s)
    }

    /// The name including its leading slash, e.g. `"/Type"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name body without the leading slash, e.g. `"Type"`.
    pub fn body(&self) -> &str {
        &self.0[1..]
    }

    /// The body's on-wire byte encoding. The lexer decodes a name one input
    /// byte at a time — raw pass-through or a `#hh` escape — mapping each to
    /// the `char` of the same code point, so every `body()` char is <= 0xFF
    /// and this is the exact inverse of that mapping.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body().chars().map(|c| c as u32 as u8).collect()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::new(s)
    }
}

/// A PDF object id: `(number, generation)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    objid: u32,
    gennum: u16,
}

impl ObjectId {
    pub fn new(objid: u32, gennum: u16) -> Self {
        Self { objid, gennum }
    }

    pub fn objid(&self) -> u32 {
        self.objid
    }

    pub fn gennum(&self) -> u16 {
        self.gennum
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.objid, self.gennum)
    }
}

/// A PDF string, carrying both its logical text and the wire encoding it was
/// read as (or will be serialized as). Equality is on `text` alone, matching
/// `llpdf.types.PDFString`: ASCII-encodable text round-trips as plain bytes;
/// anything else round-trips as UTF-16BE with a leading `FE FF` BOM.
#[derive(Debug, Clone)]
pub struct PdfString {
    text: String,
}

impl PdfString {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_ascii_encodable(&self) -> bool {
        self.text.is_ascii()
    }

    /// The on-wire byte encoding: latin-1-ish ASCII passthrough, or UTF-16BE
    /// with a `FE FF` BOM prefix for any text containing non-ASCII code
    /// points.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.is_ascii_encodable() {
            self.text.as_bytes().to_vec()
        } else {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in self.text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            bytes
        }
    }

    /// Decodes raw string bytes per §4.B: a `FE FF` prefix means UTF-16BE;
    /// otherwise each byte is treated as a latin-1 code point.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let units: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            let text = String::from_utf16_lossy(&units);
            PdfString { text }
        } else {
            let text: String = bytes.iter().map(|&b| b as char).collect();
            PdfString { text }
        }
    }
}

impl PartialEq for PdfString {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

/// The PDF value lattice (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(Name),
    String(PdfString),
    Array(Vec<Value>),
    Dictionary(Dictionary),
    Reference(ObjectId),
}

impl Value {
    pub fn name(body: impl Into<String>) -> Self {
        Value::Name(Name::new(body))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(PdfString::new(text))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Value::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Value::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// The `/Filter` entry normalized to a list of names, empty if absent.
    pub fn filter_names(&self) -> Vec<Name> {
        match self.as_dict().and_then(|d| d.get("Filter")) {
            Some(Value::Name(n)) => vec![n.clone()],
            Some(Value::Array(arr)) => arr.iter().filter_map(|v| v.as_name().cloned()).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<Name> for Value {
    fn from(n: Name) -> Self {
        Value::Name(n)
    }
}

impl From<Dictionary> for Value {
    fn from(d: Dictionary) -> Self {
        Value::Dictionary(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Reference(id)
    }
}
