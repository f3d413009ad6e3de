//! Cross-reference table (§4.E): classical `xref` sections and compressed
//! xref-stream objects, both parse paths and both emit paths.

use crate::cursor::Cursor;
use crate::error::{PdfError, Result};
use crate::objects::Dictionary;
use std::collections::BTreeMap;

/// One entry of the xref table, keyed externally by `(objid, gennum)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    Uncompressed { offset: u64 },
    Compressed { container_objid: u32, index_in_container: u32 },
    Free { next_free_objid: u32, gennum: u16 },
    /// Internal-only: an objid reserved during the write pass so container
    /// allocation cannot collide with it. Never emitted.
    Reserved,
}

/// The cross-reference table: `objid -> entry`, plus the offset of the
/// most recently written/parsed xref section itself.
#[derive(Debug, Clone, Default)]
pub struct XRefTable {
    entries: BTreeMap<u32, XRefEntry>,
    pub xref_offset: u64,
}

impl XRefTable {
    pub fn new() -> Self {
        let mut table = Self::default();
        table
            .entries
            .insert(0, XRefEntry::Free { next_free_objid: 0, gennum: 65535 });
        table
    }

    pub fn add_entry(&mut self, objid: u32, entry: XRefEntry) {
        self.entries.insert(objid, entry);
    }

    /// Records a placeholder entry only if `objid` has none yet. Used when
    /// an object is stored before its real location is known (or already
    /// known by some other path), so it never clobbers an entry a parser
    /// has already resolved.
    pub fn ensure_entry(&mut self, objid: u32, default: XRefEntry) {
        self.entries.entry(objid).or_insert(default);
    }

    pub fn get(&self, objid: u32) -> Option<&XRefEntry> {
        self.entries.get(&objid)
    }

    /// Merges a newly parsed section into this table, overwriting any
    /// entry already present for the same objid. The reader calls this as
    /// it walks forward through a (possibly incrementally updated) file,
    /// so a later section's entry for an objid — the more recent update —
    /// must win over both an earlier section's entry and any placeholder
    /// recorded while the body was scanned.
    pub fn merge(&mut self, other: XRefTable) {
        for (objid, entry) in other.entries {
            self.entries.insert(objid, entry);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &XRefEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn max_objid(&self) -> u32 {
        self.entries.keys().copied().max().unwrap_or(0)
    }

    /// Lowest objid that is neither live nor reserved; used to allocate
    /// fresh object-stream container ids without collision (§4.E).
    pub fn reserve_free_objid(&mut self) -> u32 {
        let mut candidate = self.max_objid() + 1;
        while self.entries.contains_key(&candidate) {
            candidate += 1;
        }
        self.entries.insert(candidate, XRefEntry::Reserved);
        candidate
    }

    /// Parses a classical `xref` section: repeated
    /// `<first> <count>` subsection headers followed by 20-byte rows.
    pub fn parse_classical(cursor: &mut Cursor) -> Result<XRefTable> {
        let mut table = XRefTable::default();
        loop {
            let save = cursor.tell();
            let header = match cursor.readline_nonempty() {
                Ok(line) => line,
                Err(_) => break,
            };
            let header_text = String::from_utf8_lossy(&header);
            let parts: Vec<&str> = header_text.split_whitespace().collect();
            let (Some(first), Some(count)) = (
                parts.first().and_then(|s| s.parse::<u32>().ok()),
                parts.get(1).and_then(|s| s.parse::<u32>().ok()),
            ) else {
                cursor.seek(save);
                break;
            };
            if parts.len() != 2 {
                cursor.seek(save);
                break;
            }
            for i in 0..count {
                let line = cursor.readline_nonempty()?;
                let entry = parse_classical_row(&line, cursor.tell())?;
                table.add_entry(first + i, entry);
            }
        }
        Ok(table)
    }

    /// Parses an xref-stream's decoded payload into entries, per `/W` field
    /// widths and `/Index` ranges (default `[0, Size]`).
    pub fn parse_stream(decoded: &[u8], trailer: &Dictionary) -> Result<XRefTable> {
        let widths: Vec<usize> = trailer
            .get_array("W")
            .ok_or(PdfError::MalformedXRef { position: 0 })?
            .iter()
            .map(|v| v.as_i64().unwrap_or(0) as usize)
            .collect();
        if widths.len() != 3 {
            return Err(PdfError::MalformedXRef { position: 0 });
        }
        let size = trailer.get_i64("Size").unwrap_or(0);
        let index: Vec<i64> = match trailer.get_array("Index") {
            Some(arr) => arr.iter().filter_map(|v| v.as_i64()).collect(),
            None => vec![0, size],
        };

        let row_len = widths.iter().sum::<usize>();
        let mut table = XRefTable::default();
        let mut pos = 0usize;
        let mut ranges = index.chunks_exact(2);
        for range in &mut ranges {
            let (start, count) = (range[0] as u32, range[1] as u32);
            for i in 0..count {
                if pos + row_len > decoded.len() {
                    return Err(PdfError::MalformedXRef { position: pos as u64 });
                }
                let row = &decoded[pos..pos + row_len];
                pos += row_len;
                let entry = decode_stream_row(row, &widths)?;
                table.add_entry(start + i, entry);
            }
        }
        Ok(table)
    }

    /// Serializes entries for an xref stream: three big-endian columns per
    /// row, sized to the widths actually needed (§4.H).
    pub fn encode_stream_rows(&self, widths: [usize; 3]) -> Vec<u8> {
        let mut out = Vec::new();
        for (_, entry) in self.iter() {
            let (w0, f1, f2) = match entry {
                XRefEntry::Free { next_free_objid, gennum } => (0u64, *next_free_objid as u64, *gennum as u64),
                XRefEntry::Uncompressed { offset } => (1u64, *offset, 0u64),
                XRefEntry::Compressed { container_objid, index_in_container } => {
                    (2u64, *container_objid as u64, *index_in_container as u64)
                }
                XRefEntry::Reserved => continue,
            };
            push_be(&mut out, w0, widths[0]);
            push_be(&mut out, f1, widths[1]);
            push_be(&mut out, f2, widths[2]);
        }
        out
    }

    /// Minimal field widths able to represent every live entry.
    pub fn required_widths(&self) -> [usize; 3] {
        let mut max_type = 0u64;
        let mut max_f1 = 0u64;
        let mut max_f2 = 0u64;
        for (_, entry) in self.iter() {
            let (t, f1, f2) = match entry {
                XRefEntry::Free { next_free_objid, gennum } => (0u64, *next_free_objid as u64, *gennum as u64),
                XRefEntry::Uncompressed { offset } => (1u64, *offset, 0u64),
                XRefEntry::Compressed { container_objid, index_in_container } => {
                    (2u64, *container_objid as u64, *index_in_container as u64)
                }
                XRefEntry::Reserved => continue,
            };
            max_type = max_type.max(t);
            max_f1 = max_f1.max(f1);
            max_f2 = max_f2.max(f2);
        }
        [width_for(max_type), width_for(max_f1).max(1), width_for(max_f2).max(1)]
    }
}

fn width_for(value: u64) -> usize {
    let mut w = 1;
    let mut v = value >> 8;
    while v > 0 {
        w += 1;
        v >>= 8;
    }
    w
}

fn push_be(out: &mut Vec<u8>, value: u64, width: usize) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

fn read_be(bytes: &[u8]) -> u64 {
    let mut v = 0u64;
    for &b in bytes {
        v = (v << 8) | b as u64;
    }
    v
}

fn decode_stream_row(row: &[u8], widths: &[usize]) -> Result<XRefEntry> {
    let mut pos = 0;
    let field_type = if widths[0] == 0 {
        1 // default type per spec is uncompressed (ISO 32000 §7.5.8.2)
    } else {
        let v = read_be(&row[pos..pos + widths[0]]);
        pos += widths[0];
        v
    };
    let f1 = read_be(&row[pos..pos + widths[1]]);
    pos += widths[1];
    let f2 = read_be(&row[pos..pos + widths[2]]);

    Ok(match field_type {
        0 => XRefEntry::Free {
            next_free_objid: f1 as u32,
            gennum: f2 as u16,
        },
        1 => XRefEntry::Uncompressed { offset: f1 },
        2 => XRefEntry::Compressed {
            container_objid: f1 as u32,
            index_in_container: f2 as u32,
        },
        _ => return Err(PdfError::MalformedXRef { position: 0 }),
    })
}

fn parse_classical_row(line: &[u8], position: u64) -> Result<XRefEntry> {
    let text = String::from_utf8_lossy(line);
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(PdfError::MalformedXRef { position });
    }
    let field1: u64 = parts[0].parse().map_err(|_| PdfError::MalformedXRef { position })?;
    let field2: u64 = parts[1].parse().map_err(|_| PdfError::MalformedXRef { position })?;
    match parts[2] {
        "n" => Ok(XRefEntry::Uncompressed { offset: field1 }),
        "f" => Ok(XRefEntry::Free {
            next_free_objid: field1 as u32,
            gennum: field2 as u16,
        }),
        _ => Err(PdfError::MalformedXRef { position }),
    }
}

/// Formats a classical xref section's subsection(s) for contiguous objid
/// runs, 20 bytes per entry (§4.E).
pub fn format_classical(table: &XRefTable) -> Vec<u8> {
    let mut objids: Vec<u32> = table.entries.keys().copied().collect();
    objids.sort_unstable();

    let mut out = Vec::new();
    out.extend_from_slice(b"xref\n");

    let mut i = 0;
    while i < objids.len() {
        let mut j = i;
        while j + 1 < objids.len() && objids[j + 1] == objids[j] + 1 {
            j += 1;
        }
        let first = objids[i];
        let count = (j - i + 1) as u32;
        out.extend_from_slice(format!("{} {}\n", first, count).as_bytes());
        for objid in &objids[i..=j] {
            let entry = table.entries.get(objid).unwrap();
            let (offset, gen, kind) = match entry {
                XRefEntry::Uncompressed { offset } => (*offset, 0u16, b'n'),
                XRefEntry::Free { next_free_objid, gennum } => (*next_free_objid as u64, *gennum, b'f'),
                XRefEntry::Compressed { .. } | XRefEntry::Reserved => (0, 0, b'f'),
            };
            out.extend_from_slice(
                format!("{:010} {:05} {} \n", offset, gen, kind as char).as_bytes(),
            );
        }
        i = j + 1;
    }
    out
}
