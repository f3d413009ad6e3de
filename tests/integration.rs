//! End-to-end scenarios against the public `parser`/`writer`/`Document` API.

use oxidize_pdf::objects::{Dictionary, Value};
use oxidize_pdf::writer::WriterConfig;
use oxidize_pdf::{parser, writer, Document, ObjectId};

fn minimal_pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n%\xB5\xED\xAE\xFB\n\
1 0 obj\n<< /Hello (World) >>\nendobj\n\
xref\n0 2\n0000000000 65535 f \n0000000018 00000 n \n\
trailer\n<< /Size 2 >>\nstartxref\n63\n%%EOF\n"
        .to_vec()
}

#[test]
fn s1_parses_a_minimal_classical_document() {
    let bytes = minimal_pdf_bytes();
    let doc = parser::read(&bytes).unwrap();
    let obj = doc.lookup(ObjectId::new(1, 0)).unwrap();
    let dict = obj.content_dict().unwrap();
    assert_eq!(dict.get("Hello"), Some(&Value::string("World")));
}

#[test]
fn s5_page_tree_traversal_yields_leaves_in_order() {
    let mut doc = Document::new();
    let page_a = doc.new_object(Value::Dictionary({
        let mut d = Dictionary::new();
        d.set("Type", Value::name("Page"));
        d
    }));
    let page_b = doc.new_object(Value::Dictionary({
        let mut d = Dictionary::new();
        d.set("Type", Value::name("Page"));
        d
    }));
    let kids = doc.new_object(Value::Dictionary({
        let mut d = Dictionary::new();
        d.set("Type", Value::name("Pages"));
        d.set(
            "Kids",
            Value::Array(vec![Value::Reference(page_a.id()), Value::Reference(page_b.id())]),
        );
        d
    }));
    let root = doc.new_object(Value::Dictionary({
        let mut d = Dictionary::new();
        d.set("Type", Value::name("Catalog"));
        d.set("Pages", Value::Reference(kids.id()));
        d
    }));
    doc.trailer.set("Root", Value::Reference(root.id()));

    let pages = doc.pages().unwrap();
    let ids: Vec<ObjectId> = pages.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec![page_a.id(), page_b.id()]);
}

#[test]
fn s6_missing_binary_marker_still_parses() {
    let bytes = b"%PDF-1.4\nplain text, no binary marker\n\
1 0 obj\n<< /A 1 >>\nendobj\n\
xref\n0 2\n0000000000 65535 f \n0000000048 00000 n \n\
trailer\n<< /Size 2 >>\nstartxref\n84\n%%EOF\n";
    let doc = parser::read(bytes).unwrap();
    assert!(doc.lookup(ObjectId::new(1, 0)).is_ok());
}

fn sample_document() -> Document {
    let mut doc = Document::new();
    let page = doc.new_object(Value::Dictionary({
        let mut d = Dictionary::new();
        d.set("Type", Value::name("Page"));
        d
    }));
    let mut kids = Dictionary::new();
    kids.set("Type", Value::name("Pages"));
    kids.set("Kids", Value::Array(vec![Value::Reference(page.id())]));
    kids.set("Count", 1i64);
    let pages = doc.new_object(Value::Dictionary(kids));
    let mut catalog = Dictionary::new();
    catalog.set("Type", Value::name("Catalog"));
    catalog.set("Pages", Value::Reference(pages.id()));
    let root = doc.new_object(Value::Dictionary(catalog));
    doc.trailer.set("Root", Value::Reference(root.id()));
    doc
}

#[test]
fn xref_offsets_point_at_the_objects_they_name() {
    let doc = sample_document();
    let mut bytes = Vec::new();
    writer::write(&doc, WriterConfig::default(), &mut bytes).unwrap();

    let reread = parser::read(&bytes).unwrap();
    for (objid, entry) in reread.xref.iter() {
        if let oxidize_pdf::parser::xref::XRefEntry::Uncompressed { offset } = entry {
            let at = &bytes[*offset as usize..];
            let header = format!("{} ", objid);
            assert!(
                at.starts_with(header.as_bytes()),
                "offset {} for object {} does not point at its header",
                offset,
                objid
            );
        }
    }
}

#[test]
fn compressed_xref_stream_is_type_xref_with_three_widths() {
    let doc = sample_document();
    let config = WriterConfig {
        use_xref_stream: true,
        ..Default::default()
    };
    let mut bytes = Vec::new();
    writer::write(&doc, config, &mut bytes).unwrap();

    let reread = parser::read(&bytes).unwrap();
    assert_eq!(reread.pages().unwrap().len(), 1);

    let xref_obj = reread
        .objects()
        .find(|o| o.content_dict().map(|d| d.is_type("XRef")).unwrap_or(false))
        .expect("a materialized XRef object should remain after read");
    let dict = xref_obj.content_dict().unwrap();
    let widths = dict.get_array("W").unwrap();
    assert_eq!(widths.len(), 3);
}

#[test]
fn object_stream_unpack_removes_the_container() {
    let doc = sample_document();
    let config = WriterConfig {
        use_object_streams: true,
        ..Default::default()
    };
    let mut bytes = Vec::new();
    writer::write(&doc, config, &mut bytes).unwrap();

    let reread = parser::read(&bytes).unwrap();
    assert!(!reread.objects().any(|o| o.content_dict().map(|d| d.is_type("ObjStm")).unwrap_or(false)));
    assert_eq!(reread.pages().unwrap().len(), 1);
}

#[test]
fn writing_twice_with_identical_options_is_deterministic() {
    let doc = sample_document();
    let mut first = Vec::new();
    let mut second = Vec::new();
    writer::write(&doc, WriterConfig::default(), &mut first).unwrap();
    writer::write(&doc, WriterConfig::default(), &mut second).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_array_and_dictionary_round_trip() {
    let mut doc = Document::new();
    let mut dict = Dictionary::new();
    dict.set("Empty", Value::Dictionary(Dictionary::new()));
    dict.set("List", Value::Array(Vec::new()));
    let obj = doc.new_object(Value::Dictionary(dict));
    doc.trailer.set("Root", Value::Reference(obj.id()));

    let mut bytes = Vec::new();
    writer::write(&doc, WriterConfig::default(), &mut bytes).unwrap();
    let reread = parser::read(&bytes).unwrap();

    let reread_dict = reread.lookup(obj.id()).unwrap().content_dict().unwrap();
    assert_eq!(reread_dict.get_dict("Empty").unwrap().len(), 0);
    assert_eq!(reread_dict.get_array("List").unwrap().len(), 0);
}
