//! [`Document`] (§4.F): the in-memory object graph a [`crate::parser::reader`]
//! builds and a [`crate::writer`] serializes.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, IndirectObject, ObjectId, Value};
use crate::parser::filters;
use crate::parser::grammar;
use crate::parser::lexer::{self, Token};
use crate::cursor::Cursor;
use crate::parser::xref::{XRefEntry, XRefTable};
use std::collections::BTreeMap;

/// The full object graph of one PDF: every live indirect object, the
/// trailer dictionary, and the cross-reference table.
#[derive(Debug, Clone, Default)]
pub struct Document {
    objects: BTreeMap<(u32, u16), IndirectObject>,
    pub trailer: Dictionary,
    pub xref: XRefTable,
}

impl Document {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            trailer: Dictionary::new(),
            xref: XRefTable::new(),
        }
    }

    /// Assigns a fresh objid (generation 0, stream absent) and inserts the
    /// object.
    pub fn new_object(&mut self, content: Value) -> IndirectObject {
        let objid = self.xref.reserve_free_objid();
        let obj = IndirectObject::new(objid, 0, content);
        self.xref.add_entry(objid, XRefEntry::Uncompressed { offset: 0 });
        self.objects.insert((objid, 0), obj.clone());
        obj
    }

    /// Overwrites any existing entry with the same `(objid, gennum)`. Does
    /// not touch an xref entry already present for `objid` — a reader calls
    /// this once per parsed object, before it has merged in the real xref
    /// section (or, for object-stream members, after it already has), so a
    /// blind overwrite here would erase the true offset or container
    /// location with a meaningless placeholder.
    pub fn replace_object(&mut self, obj: IndirectObject) {
        let key = (obj.objid, obj.gennum);
        self.xref.ensure_entry(obj.objid, XRefEntry::Uncompressed { offset: 0 });
        self.objects.insert(key, obj);
    }

    pub fn delete_object(&mut self, objid: u32, gennum: u16) {
        self.objects.remove(&(objid, gennum));
        self.xref.add_entry(objid, XRefEntry::Free { next_free_objid: 0, gennum: gennum + 1 });
    }

    /// Resolves a reference; fails with `DanglingReference` rather than
    /// panicking.
    pub fn lookup(&self, id: ObjectId) -> Result<&IndirectObject> {
        self.objects
            .get(&(id.objid(), id.gennum()))
            .ok_or(PdfError::DanglingReference { objid: id.objid(), gennum: id.gennum() })
    }

    pub fn objects(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.values()
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Traverses `/Root -> /Pages`, recursively expanding `/Kids`, and
    /// returns every node whose `/Type` is `/Page`.
    pub fn pages(&self) -> Result<Vec<&IndirectObject>> {
        let root_ref = self
            .trailer
            .get("Root")
            .and_then(Value::as_reference)
            .ok_or_else(|| PdfError::MalformedPageTree("trailer has no /Root entry".to_string()))?;
        let root = self.lookup(root_ref)?;
        let pages_ref = root
            .content_dict()
            .and_then(|d| d.get("Pages"))
            .and_then(Value::as_reference)
            .ok_or_else(|| PdfError::MalformedPageTree("catalog has no /Pages entry".to_string()))?;

        let mut out = Vec::new();
        self.collect_pages(pages_ref, &mut out)?;
        Ok(out)
    }

    fn collect_pages<'a>(&'a self, node_ref: ObjectId, out: &mut Vec<&'a IndirectObject>) -> Result<()> {
        let node = self.lookup(node_ref)?;
        let dict = node.content_dict().ok_or_else(|| {
            PdfError::MalformedPageTree(format!("{} is not a dictionary", node_ref))
        })?;
        match dict.get_name("Type").map(|n| n.body()) {
            Some("Page") => out.push(node),
            Some("Pages") => {
                let kids = dict
                    .get_array("Kids")
                    .ok_or_else(|| PdfError::MalformedPageTree(format!("{} has no /Kids", node_ref)))?;
                let kid_refs: Vec<ObjectId> = kids
                    .iter()
                    .map(|v| {
                        v.as_reference().ok_or_else(|| {
                            PdfError::MalformedPageTree(format!("{} has a non-reference kid", node_ref))
                        })
                    })
                    .collect::<Result<_>>()?;
                for kid_ref in kid_refs {
                    self.collect_pages(kid_ref, out)?;
                }
            }
            _ => {
                return Err(PdfError::MalformedPageTree(format!(
                    "{} has neither /Type /Page nor /Type /Pages",
                    node_ref
                )))
            }
        }
        Ok(())
    }

    /// Unpacks every `/Type /ObjStm` container: parses its `<objid>
    /// <sub_offset>` header, materializes each member as a standalone
    /// generation-0 object, then deletes the container (§4.F).
    pub fn unpack_objstrms(&mut self) -> Result<()> {
        let container_keys: Vec<(u32, u16)> = self
            .objects
            .iter()
            .filter(|(_, obj)| obj.content_dict().map(|d| d.is_type("ObjStm")).unwrap_or(false))
            .map(|(k, _)| *k)
            .collect();

        for key in container_keys {
            let container = self.objects.get(&key).unwrap().clone();
            let dict = container
                .content_dict()
                .ok_or_else(|| PdfError::InvariantViolation("ObjStm without a dictionary".to_string()))?;
            let raw = container
                .raw_stream
                .as_deref()
                .ok_or_else(|| PdfError::InvariantViolation("ObjStm without a stream".to_string()))?;
            let decoded = filters::decode_stream(raw, dict)?;

            let n = dict
                .get_i64("N")
                .ok_or_else(|| PdfError::InvariantViolation("ObjStm missing /N".to_string()))?
                as usize;
            let first = dict
                .get_i64("First")
                .ok_or_else(|| PdfError::InvariantViolation("ObjStm missing /First".to_string()))?
                as usize;

            let header_end = first.min(decoded.len());
            let mut header_cursor = Cursor::new(&decoded[..header_end]);
            let mut pairs = Vec::with_capacity(n);
            for _ in 0..n {
                let objid_tok = lexer::next_token(&mut header_cursor)?;
                let off_tok = lexer::next_token(&mut header_cursor)?;
                let (Token::Integer(oid), Token::Integer(off)) = (objid_tok, off_tok) else {
                    return Err(PdfError::InvariantViolation(
                        "malformed ObjStm header: expected <objid> <offset> pairs".to_string(),
                    ));
                };
                pairs.push((oid as u32, off as usize));
            }

            for i in 0..n {
                let start = first + pairs[i].1;
                let end = if i + 1 < n { first + pairs[i + 1].1 } else { decoded.len() };
                if start > end || end > decoded.len() {
                    return Err(PdfError::InvariantViolation(
                        "ObjStm member offsets out of range".to_string(),
                    ));
                }
                let mut member_cursor = Cursor::new(&decoded[start..end]);
                let content = grammar::parse_value(&mut member_cursor)?;
                self.replace_object(IndirectObject::new(pairs[i].0, 0, content));
            }

            self.objects.remove(&key);
        }
        Ok(())
    }

    /// For every stream object whose `/Length` is an indirect reference,
    /// truncates the raw stream to the referent's integer value if they
    /// disagree; logs and skips when the referent is not an integer.
    pub fn fix_object_sizes(&mut self) {
        let candidates: Vec<(u32, u16, ObjectId)> = self
            .objects
            .iter()
            .filter(|(_, obj)| obj.has_stream())
            .filter_map(|(&(objid, gennum), obj)| {
                obj.content_dict()
                    .and_then(|d| d.get("Length"))
                    .and_then(Value::as_reference)
                    .map(|length_ref| (objid, gennum, length_ref))
            })
            .collect();

        for (objid, gennum, length_ref) in candidates {
            let resolved = self
                .objects
                .get(&(length_ref.objid(), length_ref.gennum()))
                .and_then(|o| o.content.as_i64());
            match resolved {
                Some(len) => {
                    if let Some(obj) = self.objects.get_mut(&(objid, gennum)) {
                        if let Some(raw) = obj.raw_stream.as_mut() {
                            let len = len.max(0) as usize;
                            if raw.len() != len && len <= raw.len() {
                                raw.truncate(len);
                            }
                        }
                    }
                }
                None => {
                    log::warn!(
                        "/Length {} for object {} {} R does not resolve to an integer",
                        length_ref,
                        objid,
                        gennum
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_tree_document() -> Document {
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
        doc
    }

    #[test]
    fn pages_traverses_nested_kids() {
        let doc = page_tree_document();
        let pages = doc.pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].content_dict().unwrap().is_type("Page"));
    }

    #[test]
    fn lookup_missing_object_is_dangling_reference() {
        let doc = Document::new();
        let err = doc.lookup(ObjectId::new(99, 0)).unwrap_err();
        assert!(matches!(err, PdfError::DanglingReference { objid: 99, gennum: 0 }));
    }

    #[test]
    fn page_node_with_unknown_type_fails() {
        let mut doc = Document::new();
        let bogus = doc.new_object(Value::Dictionary({
            let mut d = Dictionary::new();
            d.set("Type", Value::name("Weird"));
            d
        }));
        doc.trailer.set("Root", Value::Reference(bogus.id()));
        let err = doc.pages().unwrap_err();
        assert!(matches!(err, PdfError::MalformedPageTree(_)));
    }

    #[test]
    fn unpack_objstrms_materializes_members_and_drops_container() {
        let mut doc = Document::new();
        // header: "1 0 " (objid 1 at sub-offset 0), payload is a literal string.
        let header = b"1 0 ";
        let mut decoded = header.to_vec();
        decoded.extend_from_slice(b"(A)");

        let mut dict = Dictionary::new();
        dict.set("Type", Value::name("ObjStm"));
        dict.set("N", 1i64);
        dict.set("First", header.len() as i64);
        let container = IndirectObject::new(5, 0, Value::Dictionary(dict)).with_stream(decoded, Default::default());
        doc.replace_object(container);

        doc.unpack_objstrms().unwrap();

        assert!(doc.lookup(ObjectId::new(5, 0)).is_err());
        let member = doc.lookup(ObjectId::new(1, 0)).unwrap();
        assert_eq!(member.content, Value::string("A"));
    }

    #[test]
    fn fix_object_sizes_truncates_to_indirect_length() {
        let mut doc = Document::new();
        let length_obj = doc.new_object(Value::Integer(3));
        let mut dict = Dictionary::new();
        dict.set("Length", Value::Reference(length_obj.id()));
        let stream_obj = IndirectObject::new(10, 0, Value::Dictionary(dict))
            .with_stream(vec![1, 2, 3, 4, 5], Default::default());
        doc.replace_object(stream_obj);

        doc.fix_object_sizes();

        let fixed = doc.lookup(ObjectId::new(10, 0)).unwrap();
        assert_eq!(fixed.raw_stream.as_deref(), Some([1, 2, 3].as_slice()));
    }
}
