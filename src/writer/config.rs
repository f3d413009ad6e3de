//! Writer configuration (§4.H): the sole surface controlling output shape.

/// Options controlling how a [`super::write`] call serializes a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Emit dictionaries/arrays with indentation and newlines. Cosmetic only.
    pub pretty: bool,
    /// Pack non-stream objects into `/Type /ObjStm` containers. Implies
    /// `use_xref_stream`.
    pub use_object_streams: bool,
    /// Emit the cross-reference table as a compressed stream object rather
    /// than a classical section.
    pub use_xref_stream: bool,
    /// Maximum members per object-stream container.
    pub compress_object_count: usize,
    /// Cap on summed decoded size per container, in bytes.
    pub max_container_content_size_bytes: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            use_object_streams: false,
            use_xref_stream: false,
            compress_object_count: 100,
            max_container_content_size_bytes: 1024 * 1024,
        }
    }
}

impl WriterConfig {
    /// Whether the cross-reference table must be emitted as a stream:
    /// object streams can only be located through one.
    pub fn effective_use_xref_stream(&self) -> bool {
        self.use_xref_stream || self.use_object_streams
    }
}
