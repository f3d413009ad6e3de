//! Value -> bytes serialization, the syntactic inverse of [`crate::parser::grammar`]
//! (§4.H serializer rules).

use crate::objects::{Dictionary, Name, PdfString, Value};

/// Serializes one value. `pretty` controls whether arrays/dictionaries are
/// laid out with indentation and newlines.
pub fn serialize_value(value: &Value, pretty: bool) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value, pretty, 0);
    out
}

fn write_value(out: &mut Vec<u8>, value: &Value, pretty: bool, depth: usize) {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Boolean(true) => out.extend_from_slice(b"true"),
        Value::Boolean(false) => out.extend_from_slice(b"false"),
        Value::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Value::Real(r) => out.extend_from_slice(format_real(*r).as_bytes()),
        Value::Name(n) => out.extend_from_slice(&serialize_name(n)),
        Value::String(s) => out.extend_from_slice(&serialize_string(s)),
        Value::Array(items) => write_array(out, items, pretty, depth),
        Value::Dictionary(dict) => write_dictionary(out, dict, pretty, depth),
        Value::Reference(id) => {
            out.extend_from_slice(format!("{} {} R", id.objid(), id.gennum()).as_bytes())
        }
    }
}

fn write_array(out: &mut Vec<u8>, items: &[Value], pretty: bool, depth: usize) {
    out.push(b'[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        write_value(out, item, pretty, depth);
    }
    out.push(b']');
}

fn write_dictionary(out: &mut Vec<u8>, dict: &Dictionary, pretty: bool, depth: usize) {
    out.extend_from_slice(b"<<");
    if pretty {
        out.push(b'\n');
    }
    for (key, value) in dict.iter() {
        if pretty {
            out.extend(std::iter::repeat(b' ').take((depth + 1) * 2));
        } else {
            out.push(b' ');
        }
        out.extend_from_slice(&serialize_name(key));
        out.push(b' ');
        write_value(out, value, pretty, depth + 1);
        if pretty {
            out.push(b'\n');
        }
    }
    if pretty {
        out.extend(std::iter::repeat(b' ').take(depth * 2));
    } else {
        out.push(b' ');
    }
    out.extend_from_slice(b">>");
}

/// Shortest plain decimal with at least one fractional digit; `f64`'s
/// `Display` never emits an exponent, so only the missing-dot case needs
/// correcting.
fn format_real(r: f64) -> String {
    let mut s = format!("{}", r);
    if !s.contains('.') {
        s.push_str(".0");
    }
    s
}

fn serialize_name(name: &Name) -> Vec<u8> {
    let mut out = vec![b'/'];
    for b in name.body_bytes() {
        let safe = (0x21..=0x7E).contains(&b)
            && !matches!(
                b,
                b'#' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
            );
        if safe {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{:02X}", b).as_bytes());
        }
    }
    out
}

fn is_literal_safe(b: u8) -> bool {
    matches!(b, 0x20..=0x7E | b'\n' | b'\r' | b'\t' | 0x08 | 0x0C)
}

fn serialize_string(s: &PdfString) -> Vec<u8> {
    let bytes = s.to_bytes();
    if bytes.iter().all(|&b| is_literal_safe(b)) {
        serialize_literal_string(&bytes)
    } else {
        serialize_hex_string(&bytes)
    }
}

fn serialize_literal_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![b'('];
    for &b in bytes {
        match b {
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            other => out.push(other),
        }
    }
    out.push(b')');
    out
}

fn serialize_hex_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = vec![b'<'];
    for &b in bytes {
        out.extend_from_slice(format!("{:02X}", b).as_bytes());
    }
    out.push(b'>');
    out
}
