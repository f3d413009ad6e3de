//! [`IndirectObject`]: a value bound to an `(objid, gennum)` pair, plus its
//! optional raw stream payload.

use crate::objects::{Name, ObjectId, Value};

/// Records which filters a stream's raw bytes are currently encoded with,
/// so the writer knows whether it may re-encode or must pass bytes through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedSpec {
    pub filters: Vec<Name>,
}

impl EncodedSpec {
    pub fn none() -> Self {
        Self { filters: Vec::new() }
    }

    pub fn single(filter: impl Into<String>) -> Self {
        Self {
            filters: vec![Name::new(filter)],
        }
    }

    pub fn is_encoded(&self) -> bool {
        !self.filters.is_empty()
    }
}

/// An owned PDF indirect object: `objid gennum obj ... endobj`, with an
/// optional raw (still-encoded) stream payload.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    pub objid: u32,
    pub gennum: u16,
    pub content: Value,
    pub raw_stream: Option<Vec<u8>>,
    pub stream_encoding: EncodedSpec,
}

impl IndirectObject {
    pub fn new(objid: u32, gennum: u16, content: Value) -> Self {
        debug_assert!(objid >= 1, "objid must be >= 1");
        Self {
            objid,
            gennum,
            content,
            raw_stream: None,
            stream_encoding: EncodedSpec::none(),
        }
    }

    pub fn with_stream(mut self, raw_stream: Vec<u8>, encoding: EncodedSpec) -> Self {
        self.raw_stream = Some(raw_stream);
        self.stream_encoding = encoding;
        self
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::new(self.objid, self.gennum)
    }

    pub fn has_stream(&self) -> bool {
        self.raw_stream.is_some()
    }

    /// Whether this object can be packed into an object stream: it must
    /// carry no raw stream payload of its own (§4.F, §4.H).
    pub fn is_compressible(&self) -> bool {
        !self.has_stream()
    }

    pub fn content_dict(&self) -> Option<&crate::objects::Dictionary> {
        self.content.as_dict()
    }
}
