//! Top-level write procedure (§4.H): header, the uncompressed and
//! compressed object passes, and xref/tail emission.

use crate::document::Document;
use crate::error::Result;
use crate::objects::{Dictionary, IndirectObject, Name, Value};
use crate::parser::filters;
use crate::parser::xref::{format_classical, XRefEntry, XRefTable};
use crate::writer::container::ObjStmBuilder;
use crate::writer::serializer::serialize_value;
use crate::writer::WriterConfig;
use std::io::{self, Write};

/// Wraps a sink so the current absolute byte offset is always known,
/// mirroring how the reader tracks position through a [`crate::cursor::Cursor`].
struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    fn position(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Serializes `document` to `sink` per `config`. Always produces a
/// complete, non-incremental file.
pub fn write<W: Write>(document: &Document, config: WriterConfig, sink: W) -> Result<()> {
    let mut out = CountingWriter::new(sink);
    let mut xref = XRefTable::new();

    let version_line: &[u8] = if config.effective_use_xref_stream() {
        b"%PDF-1.5\n"
    } else {
        b"%PDF-1.4\n"
    };
    out.write_all(version_line)?;
    out.write_all(b"%\xB5\xED\xAE\xFB\n")?;

    let objects: Vec<&IndirectObject> = document.objects().collect();

    for obj in &objects {
        let compressible = !obj.has_stream() && config.use_object_streams;
        if compressible {
            continue;
        }
        let offset = out.position();
        write_object(&mut out, obj, config.pretty)?;
        xref.add_entry(obj.objid, XRefEntry::Uncompressed { offset });
    }

    if config.use_object_streams {
        for obj in &objects {
            if !obj.has_stream() {
                xref.add_entry(obj.objid, XRefEntry::Reserved);
            }
        }

        let mut builder = ObjStmBuilder::new();
        for obj in &objects {
            if obj.has_stream() {
                continue;
            }
            let serialized = serialize_value(&obj.content, config.pretty);
            if !builder.is_empty()
                && builder.is_full(config.compress_object_count, config.max_container_content_size_bytes)
            {
                flush_container(&mut out, &mut xref, &builder)?;
                builder = ObjStmBuilder::new();
            }
            builder.push(obj.objid, serialized);
        }
        if !builder.is_empty() {
            flush_container(&mut out, &mut xref, &builder)?;
        }
    }

    let max_objid = objects.iter().map(|o| o.objid).max().unwrap_or(0);
    let mut trailer = document.trailer.clone();

    if config.effective_use_xref_stream() {
        write_xref_stream(&mut out, &mut xref, &trailer, max_objid)?;
    } else {
        trailer.set("Size", (max_objid + 1) as i64);
        let xref_offset = out.position();
        out.write_all(&format_classical(&xref))?;
        out.write_all(b"trailer\n")?;
        out.write_all(&serialize_value(&Value::Dictionary(trailer), config.pretty))?;
        out.write_all(b"\n")?;
        write!(out, "startxref\n{}\n%%EOF\n", xref_offset)?;
    }

    Ok(())
}

fn write_object<W: Write>(out: &mut CountingWriter<W>, obj: &IndirectObject, pretty: bool) -> Result<()> {
    write!(out, "{} {} obj\n", obj.objid, obj.gennum)?;
    if let Some(raw) = &obj.raw_stream {
        let mut dict = obj.content_dict().cloned().unwrap_or_default();
        dict.set("Length", raw.len() as i64);
        out.write_all(&serialize_value(&Value::Dictionary(dict), pretty))?;
        out.write_all(b"\nstream\n")?;
        out.write_all(raw)?;
        out.write_all(b"\nendstream\nendobj\n")?;
    } else {
        out.write_all(&serialize_value(&obj.content, pretty))?;
        out.write_all(b"\nendobj\n")?;
    }
    Ok(())
}

fn flush_container<W: Write>(
    out: &mut CountingWriter<W>,
    xref: &mut XRefTable,
    builder: &ObjStmBuilder,
) -> Result<()> {
    let container_objid = xref.reserve_free_objid();
    let (header, payload) = builder.build_payload();
    let mut decoded = header.into_bytes();
    decoded.extend_from_slice(&payload);
    let encoded = filters::encode_stream(&decoded, &[Name::new("FlateDecode")])?;

    let mut dict = Dictionary::new();
    dict.set("Type", Value::name("ObjStm"));
    dict.set("N", builder.members.len() as i64);
    dict.set("First", (decoded.len() - payload.len()) as i64);
    dict.set("Filter", Value::name("FlateDecode"));
    dict.set("Length", encoded.len() as i64);

    let offset = out.position();
    write!(out, "{} 0 obj\n", container_objid)?;
    out.write_all(&serialize_value(&Value::Dictionary(dict), false))?;
    out.write_all(b"\nstream\n")?;
    out.write_all(&encoded)?;
    out.write_all(b"\nendstream\nendobj\n")?;

    xref.add_entry(container_objid, XRefEntry::Uncompressed { offset });
    for (index, (member_objid, _)) in builder.members.iter().enumerate() {
        xref.add_entry(
            *member_objid,
            XRefEntry::Compressed {
                container_objid,
                index_in_container: index as u32,
            },
        );
    }
    Ok(())
}

fn write_xref_stream<W: Write>(
    out: &mut CountingWriter<W>,
    xref: &mut XRefTable,
    trailer: &Dictionary,
    max_objid: u32,
) -> Result<()> {
    let offset = out.position();
    let xref_objid = xref.reserve_free_objid();
    xref.add_entry(xref_objid, XRefEntry::Uncompressed { offset });
    let max_objid = max_objid.max(xref_objid);

    let widths = xref.required_widths();
    let row_bytes: usize = widths.iter().sum();
    let rows = xref.encode_stream_rows(widths);
    let predicted = apply_up_predictor(&rows, row_bytes);
    let encoded = filters::encode_stream(&predicted, &[Name::new("FlateDecode")])?;

    let mut dict = Dictionary::new();
    dict.set("Type", Value::name("XRef"));
    dict.set("Size", (max_objid + 1) as i64);
    dict.set(
        "W",
        Value::Array(vec![
            Value::Integer(widths[0] as i64),
            Value::Integer(widths[1] as i64),
            Value::Integer(widths[2] as i64),
        ]),
    );
    dict.set(
        "Index",
        Value::Array(vec![Value::Integer(0), Value::Integer((max_objid + 1) as i64)]),
    );
    if let Some(root) = trailer.get("Root") {
        dict.set("Root", root.clone());
    }
    if let Some(info) = trailer.get("Info") {
        dict.set("Info", info.clone());
    }
    if let Some(id) = trailer.get("ID") {
        dict.set("ID", id.clone());
    }
    let mut parms = Dictionary::new();
    parms.set("Predictor", 12i64);
    parms.set("Columns", row_bytes as i64);
    parms.set("Colors", 1i64);
    parms.set("BitsPerComponent", 8i64);
    dict.set("DecodeParms", Value::Dictionary(parms));
    dict.set("Filter", Value::name("FlateDecode"));
    dict.set("Length", encoded.len() as i64);

    write!(out, "{} 0 obj\n", xref_objid)?;
    out.write_all(&serialize_value(&Value::Dictionary(dict), false))?;
    out.write_all(b"\nstream\n")?;
    out.write_all(&encoded)?;
    out.write_all(b"\nendstream\nendobj\n")?;

    write!(out, "startxref\n{}\n%%EOF\n", offset)?;
    Ok(())
}

/// PNG "Up" row encoding, the inverse of `filters::apply_predictor`'s tag-2
/// branch; used only for xref-stream emission (§4.E, §4.H).
fn apply_up_predictor(rows: &[u8], row_bytes: usize) -> Vec<u8> {
    if row_bytes == 0 {
        return rows.to_vec();
    }
    let mut out = Vec::with_capacity(rows.len() + rows.len() / row_bytes + 1);
    let mut prev = vec![0u8; row_bytes];
    for chunk in rows.chunks(row_bytes) {
        out.push(2u8);
        for (i, &b) in chunk.iter().enumerate() {
            out.push(b.wrapping_sub(prev[i]));
        }
        prev[..chunk.len()].copy_from_slice(chunk);
    }
    out
}
