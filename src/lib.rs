//! # oxidize-pdf
//!
//! A low-level PDF object-graph parser and writer: a byte cursor, a
//! recursive-descent grammar over the PDF value lattice, a cross-reference
//! table covering both classical sections and compressed xref streams, a
//! stream codec (Flate/PNG-predictor, ASCII85, RunLength, opaque DCT), and
//! a `Document` tying it all together.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use oxidize_pdf::{parser, writer, writer::WriterConfig};
//!
//! # fn main() -> oxidize_pdf::Result<()> {
//! let bytes = std::fs::read("input.pdf")?;
//! let mut document = parser::read(&bytes)?;
//!
//! for page in document.pages()? {
//!     println!("page object {}", page.id());
//! }
//!
//! document.fix_object_sizes();
//!
//! let mut out = Vec::new();
//! writer::write(&document, WriterConfig::default(), &mut out)?;
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod document;
pub mod error;
pub mod objects;
pub mod parser;
pub mod writer;

pub use document::Document;
pub use error::{PdfError, Result};
pub use objects::{Dictionary, IndirectObject, Name, ObjectId, PdfString, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::WriterConfig;

    #[test]
    fn round_trips_a_minimal_document() {
        let mut doc = Document::new();
        let page = doc.new_object(Value::Dictionary({
            let mut d = Dictionary::new();
            d.set("Type", Value::name("Page"));
            d
        }));
        let mut kids = Dictionary::new();
        kids.set("Type", Value::name("Pages"));
        kids.set("Kids", Value::Array(vec![Value::Reference(page.id())]));
        let pages = doc.new_object(Value::Dictionary(kids));
        let mut catalog = Dictionary::new();
        catalog.set("Type", Value::name("Catalog"));
        catalog.set("Pages", Value::Reference(pages.id()));
        let root = doc.new_object(Value::Dictionary(catalog));
        doc.trailer.set("Root", Value::Reference(root.id()));

        let mut bytes = Vec::new();
        writer::write(&doc, WriterConfig::default(), &mut bytes).unwrap();

        let reread = parser::read(&bytes).unwrap();
        assert_eq!(reread.pages().unwrap().len(), 1);
    }
}
