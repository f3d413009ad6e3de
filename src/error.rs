//! Error taxonomy for the PDF object-graph core.

use thiserror::Error;

/// Errors raised while parsing, resolving, or writing a PDF object graph.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("syntax error at offset {position}: {message}")]
    SyntaxError { position: u64, message: String },

    #[error("unknown trailer token '{token}' at offset {position}")]
    UnknownTrailerToken { token: String, position: u64 },

    #[error("malformed xref table at offset {position}")]
    MalformedXRef { position: u64 },

    #[error("dangling reference {objid} {gennum} R")]
    DanglingReference { objid: u32, gennum: u16 },

    #[error("malformed page tree: node {0} has neither /Type /Page nor /Type /Pages")]
    MalformedPageTree(String),

    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("encrypted PDFs are not supported")]
    EncryptionUnsupported,

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result type used throughout the core.
pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_reference_display() {
        let err = PdfError::DanglingReference {
            objid: 7,
            gennum: 0,
        };
        assert_eq!(err.to_string(), "dangling reference 7 0 R");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: PdfError = io_err.into();
        assert!(matches!(err, PdfError::Io(_)));
    }
}
