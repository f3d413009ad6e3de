//! Grammar parser (§4.B): builds [`Value`]s and [`IndirectObject`]s out of
//! the token stream produced by [`super::lexer`].

use super::lexer::{next_token, Token};
use crate::cursor::Cursor;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, EncodedSpec, IndirectObject, Name, ObjectId, PdfString, Value};

/// Parses one PDF value starting at the cursor's current position.
pub fn parse_value(cursor: &mut Cursor) -> Result<Value> {
    let token = next_token(cursor)?;
    parse_value_from_token(cursor, token)
}

fn parse_value_from_token(cursor: &mut Cursor, token: Token) -> Result<Value> {
    match token {
        Token::Keyword(k) if k == "true" => Ok(Value::Boolean(true)),
        Token::Keyword(k) if k == "false" => Ok(Value::Boolean(false)),
        Token::Keyword(k) if k == "null" => Ok(Value::Null),
        Token::Integer(n) => parse_integer_or_reference(cursor, n),
        Token::Real(r) => Ok(Value::Real(r)),
        Token::Name(n) => Ok(Value::Name(Name::new(n))),
        Token::LiteralString(bytes) | Token::HexString(bytes) => {
            Ok(Value::String(PdfString::from_bytes(&bytes)))
        }
        Token::ArrayStart => parse_array(cursor),
        Token::DictStart => Ok(Value::Dictionary(parse_dict_body(cursor)?)),
        Token::Eof => Err(PdfError::UnexpectedEof),
        other => Err(PdfError::SyntaxError {
            position: cursor.tell(),
            message: format!("unexpected token {:?} where a value was expected", other),
        }),
    }
}

/// `integer integer 'R'` is a reference; a bare integer otherwise. Two
/// tokens of lookahead, rewound on mismatch.
fn parse_integer_or_reference(cursor: &mut Cursor, first: i64) -> Result<Value> {
    let after_first = cursor.tell();
    let second = next_token(cursor)?;
    let Token::Integer(gen) = second else {
        cursor.seek(after_first);
        return Ok(Value::Integer(first));
    };
    let third = next_token(cursor)?;
    match third {
        Token::Keyword(k) if k == "R" => {
            Ok(Value::Reference(ObjectId::new(first as u32, gen as u16)))
        }
        _ => {
            cursor.seek(after_first);
            Ok(Value::Integer(first))
        }
    }
}

fn parse_array(cursor: &mut Cursor) -> Result<Value> {
    let mut items = Vec::new();
    loop {
        let token = next_token(cursor)?;
        if token == Token::ArrayEnd {
            break;
        }
        if token == Token::Eof {
            return Err(PdfError::UnexpectedEof);
        }
        items.push(parse_value_from_token(cursor, token)?);
    }
    Ok(Value::Array(items))
}

fn parse_dict_body(cursor: &mut Cursor) -> Result<Dictionary> {
    let mut dict = Dictionary::new();
    loop {
        let token = next_token(cursor)?;
        match token {
            Token::DictEnd => break,
            Token::Eof => return Err(PdfError::UnexpectedEof),
            Token::Name(key) => {
                let value = parse_value(cursor)?;
                dict.set(key, value);
            }
            other => {
                return Err(PdfError::SyntaxError {
                    position: cursor.tell(),
                    message: format!("expected a /Name key in dictionary, found {:?}", other),
                })
            }
        }
    }
    Ok(dict)
}

/// Parses one `<objid> <gennum> obj ... endobj` indirect object, including
/// an optional `stream ... endstream` payload. Returns `None` at EOF or
/// when the next token is not an object header, leaving the cursor at its
/// original position so the caller can dispatch on whatever follows
/// (§4.B, §4.G).
pub fn parse_indirect_object(cursor: &mut Cursor) -> Result<Option<IndirectObject>> {
    let start = cursor.tell();

    let t1 = next_token(cursor)?;
    let Token::Integer(objid) = t1 else {
        cursor.seek(start);
        return Ok(None);
    };
    let t2 = next_token(cursor)?;
    let Token::Integer(gennum) = t2 else {
        cursor.seek(start);
        return Ok(None);
    };
    let t3 = next_token(cursor)?;
    let Token::Keyword(k) = t3 else {
        cursor.seek(start);
        return Ok(None);
    };
    if k != "obj" {
        cursor.seek(start);
        return Ok(None);
    }

    let content = parse_value(cursor)?;
    let mut obj = IndirectObject::new(objid as u32, gennum as u16, content);

    let after_value = cursor.tell();
    let t4 = next_token(cursor)?;
    match t4 {
        Token::Keyword(k) if k == "endobj" => {}
        Token::Keyword(k) if k == "stream" => {
            let (raw, encoding) = read_stream_body(cursor, &obj)?;
            obj.raw_stream = Some(raw);
            obj.stream_encoding = encoding;
            expect_keyword(cursor, "endobj")?;
        }
        other => {
            return Err(PdfError::SyntaxError {
                position: after_value,
                message: format!("expected 'endobj' or 'stream', found {:?}", other),
            })
        }
    }

    Ok(Some(obj))
}

fn expect_keyword(cursor: &mut Cursor, expected: &str) -> Result<()> {
    match next_token(cursor)? {
        Token::Keyword(k) if k == expected => Ok(()),
        other => Err(PdfError::SyntaxError {
            position: cursor.tell(),
            message: format!("expected keyword '{}', found {:?}", expected, other),
        }),
    }
}

/// Reads the raw bytes between `stream` and `endstream`. A direct integer
/// `/Length` is trusted even if it disagrees with the observed byte count
/// (§9 open question, resolved); an indirectly-referenced `/Length` is
/// handled conservatively here (scan to `endstream`) and reconciled later
/// by `Document::fix_object_sizes`.
fn read_stream_body(cursor: &mut Cursor, obj: &IndirectObject) -> Result<(Vec<u8>, EncodedSpec)> {
    skip_single_eol(cursor);

    let length = obj
        .content
        .as_dict()
        .and_then(|d| d.get("Length"))
        .and_then(Value::as_i64);

    let raw = if let Some(len) = length {
        let len = len.max(0) as usize;
        let start = cursor.tell();
        let end = (start + len as u64).min(cursor.len());
        let bytes = cursor.remaining()[..(end - start) as usize].to_vec();
        cursor.seek(end);
        bytes
    } else {
        cursor.read_until_token(b"endstream", true)?
    };

    skip_whitespace_before_endstream(cursor);
    expect_keyword(cursor, "endstream")?;

    let encoding = EncodedSpec {
        filters: obj.content.filter_names(),
    };
    Ok((raw, encoding))
}

fn skip_single_eol(cursor: &mut Cursor) {
    match cursor.peek_byte() {
        Some(b'\r') => {
            cursor.next_byte();
            if cursor.peek_byte() == Some(b'\n') {
                cursor.next_byte();
            }
        }
        Some(b'\n') => {
            cursor.next_byte();
        }
        _ => {}
    }
}

fn skip_whitespace_before_endstream(cursor: &mut Cursor) {
    while matches!(cursor.peek_byte(), Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')) {
        cursor.next_byte();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        let mut c = Cursor::new(b"null true false 42 -3.5 /Foo");
        assert_eq!(parse_value(&mut c).unwrap(), Value::Null);
        assert_eq!(parse_value(&mut c).unwrap(), Value::Boolean(true));
        assert_eq!(parse_value(&mut c).unwrap(), Value::Boolean(false));
        assert_eq!(parse_value(&mut c).unwrap(), Value::Integer(42));
        assert_eq!(parse_value(&mut c).unwrap(), Value::Real(-3.5));
        assert_eq!(parse_value(&mut c).unwrap(), Value::name("Foo"));
    }

    #[test]
    fn parses_reference_vs_plain_integers() {
        let mut c = Cursor::new(b"12 0 R");
        assert_eq!(
            parse_value(&mut c).unwrap(),
            Value::Reference(ObjectId::new(12, 0))
        );

        let mut c2 = Cursor::new(b"12 0 13");
        assert_eq!(parse_value(&mut c2).unwrap(), Value::Integer(12));
        assert_eq!(parse_value(&mut c2).unwrap(), Value::Integer(0));
        assert_eq!(parse_value(&mut c2).unwrap(), Value::Integer(13));
    }

    #[test]
    fn parses_array_and_dict() {
        let mut c = Cursor::new(b"[1 2 (hi)]");
        let v = parse_value(&mut c).unwrap();
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::string("hi")
            ])
        );

        let mut c2 = Cursor::new(b"<< /Hello (World) >>");
        let v2 = parse_value(&mut c2).unwrap();
        let dict = v2.as_dict().unwrap();
        assert_eq!(dict.get("Hello").unwrap(), &Value::string("World"));
    }

    #[test]
    fn duplicate_dict_keys_last_wins() {
        let mut c = Cursor::new(b"<< /A 1 /A 2 >>");
        let v = parse_value(&mut c).unwrap();
        let dict = v.as_dict().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get_i64("A"), Some(2));
    }

    #[test]
    fn parses_indirect_object_without_stream() {
        let mut c = Cursor::new(b"1 0 obj\n<< /Hello (World) >>\nendobj\n");
        let obj = parse_indirect_object(&mut c).unwrap().unwrap();
        assert_eq!(obj.objid, 1);
        assert_eq!(obj.gennum, 0);
        assert!(!obj.has_stream());
    }

    #[test]
    fn parses_indirect_object_with_stream_and_direct_length() {
        let mut c = Cursor::new(b"2 0 obj\n<< /Length 2 >>\nstream\nhi\nendstream\nendobj\n");
        let obj = parse_indirect_object(&mut c).unwrap().unwrap();
        assert_eq!(obj.raw_stream.as_deref(), Some(b"hi".as_slice()));
    }

    #[test]
    fn returns_none_at_eof_or_non_header() {
        let mut c = Cursor::new(b"");
        assert_eq!(parse_indirect_object(&mut c).unwrap(), None);

        let mut c2 = Cursor::new(b"xref\n0 1\n");
        assert_eq!(parse_indirect_object(&mut c2).unwrap(), None);
        assert_eq!(c2.tell(), 0, "cursor must not advance on a non-header");
    }
}
