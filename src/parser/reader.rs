//! Top-level read procedure (§4.G): header, the generation loop, and
//! end-of-file dispatch, assembled into a [`Document`].

use crate::cursor::Cursor;
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::parser::grammar;
use crate::parser::header;
use crate::parser::xref::XRefTable;

/// Reads a complete PDF object graph out of `bytes`.
pub fn read(bytes: &[u8]) -> Result<Document> {
    let mut cursor = Cursor::new(bytes);
    let mut document = Document::new();

    let header_info = header::parse_header(&mut cursor);
    if let Some(warning) = &header_info.warning {
        log::warn!("{}", warning);
    }

    loop {
        let mut read_any = false;
        while let Some(obj) = grammar::parse_indirect_object(&mut cursor)? {
            document.replace_object(obj);
            read_any = true;
        }
        if !read_any {
            break;
        }
        read_end_of_file_region(&mut cursor, &mut document)?;
    }

    if let Some(encrypt) = document.trailer.get("Encrypt") {
        if !encrypt.is_null() {
            return Err(PdfError::EncryptionUnsupported);
        }
    }

    document.unpack_objstrms()?;
    document.fix_object_sizes();

    Ok(document)
}

fn read_end_of_file_region(cursor: &mut Cursor, document: &mut Document) -> Result<()> {
    let mut trailer_seen = false;
    loop {
        if cursor.at_eof() {
            return Ok(());
        }
        let save = cursor.tell();
        let line = cursor.readline();
        let text = String::from_utf8_lossy(&line);
        let token = text.trim();

        match token {
            "" => continue,
            "xref" => {
                let table = XRefTable::parse_classical(cursor)?;
                document.xref.merge(table);
            }
            "trailer" => {
                let bytes_to_startxref = cursor.read_until_token(b"startxref", true)?;
                let mut tcursor = Cursor::new(&bytes_to_startxref);
                let trailer_value = grammar::parse_value(&mut tcursor)?;
                if let Some(dict) = trailer_value.as_dict() {
                    for (k, v) in dict.iter() {
                        document.trailer.set(k.clone(), v.clone());
                    }
                }
                trailer_seen = true;
            }
            "startxref" => {
                let offset_line = cursor.readline_nonempty()?;
                let offset_text = String::from_utf8_lossy(&offset_line);
                let offset: u64 = offset_text
                    .trim()
                    .parse()
                    .map_err(|_| PdfError::MalformedXRef { position: cursor.tell() })?;
                document.xref.xref_offset = offset;

                if !trailer_seen {
                    let mut scope = cursor.tempseek(offset);
                    let xref_obj = grammar::parse_indirect_object(scope.cursor())?
                        .ok_or(PdfError::MalformedXRef { position: offset })?;
                    let dict = xref_obj
                        .content_dict()
                        .ok_or(PdfError::MalformedXRef { position: offset })?;
                    if dict.get_name("Type").map(|n| n.body()) != Some("XRef") {
                        return Err(PdfError::MalformedXRef { position: offset });
                    }
                    let raw = xref_obj
                        .raw_stream
                        .as_deref()
                        .ok_or(PdfError::MalformedXRef { position: offset })?;
                    let decoded = crate::parser::filters::decode_stream(raw, dict)?;
                    let table = XRefTable::parse_stream(&decoded, dict)?;
                    document.xref.merge(table);
                    for (k, v) in dict.iter() {
                        document.trailer.set(k.clone(), v.clone());
                    }
                    trailer_seen = true;
                }
            }
            "%%EOF" => return Ok(()),
            other => {
                return Err(PdfError::UnknownTrailerToken {
                    token: other.to_string(),
                    position: save,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        let obj1_offset = buf.len();
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2_offset = buf.len();
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
        let obj3_offset = buf.len();
        buf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n");
        let xref_offset = buf.len();
        buf.extend_from_slice(b"xref\n0 4\n");
        buf.extend_from_slice(b"0000000000 65535 f \n");
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj1_offset).as_bytes());
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj2_offset).as_bytes());
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj3_offset).as_bytes());
        buf.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{}\n", xref_offset).as_bytes());
        buf.extend_from_slice(b"%%EOF\n");
        buf
    }

    #[test]
    fn reads_minimal_document_and_resolves_pages() {
        let bytes = minimal_pdf();
        let document = read(&bytes).unwrap();
        let pages = document.pages().unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn rejects_encrypted_trailer() {
        let mut bytes = minimal_pdf();
        let marker = b"/Root 1 0 R >>";
        let pos = bytes.windows(marker.len()).position(|w| w == marker).unwrap();
        let replacement = b"/Root 1 0 R /Encrypt 9 0 R >>";
        bytes.splice(pos..pos + marker.len(), replacement.iter().copied());
        let err = read(&bytes).unwrap_err();
        assert!(matches!(err, PdfError::EncryptionUnsupported));
    }

    #[test]
    fn unknown_trailer_token_is_an_error() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        bytes.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
        bytes.extend_from_slice(b"bogus\n");
        let err = read(&bytes).unwrap_err();
        assert!(matches!(err, PdfError::UnknownTrailerToken { .. }));
    }
}
