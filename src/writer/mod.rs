//! Serialization of a [`crate::document::Document`] back to PDF bytes (§4.H).

mod config;
mod container;
mod pdf_writer;
mod serializer;

pub use config::WriterConfig;
pub use pdf_writer::write;
