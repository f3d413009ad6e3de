//! PDF token scanner (§4.B), operating over a [`Cursor`] so it can be used
//! both on the whole-file buffer (objects) and on a standalone fragment
//! (trailers, dictionary bodies parsed out of a stream).

use crate::cursor::Cursor;
use crate::error::{PdfError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f64),
    Name(String),
    LiteralString(Vec<u8>),
    HexString(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    Keyword(String),
    Eof,
}

fn is_pdf_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Scans a single token starting at the cursor's current position,
/// stripping leading whitespace and `%`-comments.
pub fn next_token(cursor: &mut Cursor) -> Result<Token> {
    skip_whitespace_and_comments(cursor);
    let Some(b) = cursor.peek_byte() else {
        return Ok(Token::Eof);
    };
    match b {
        b'/' => read_name(cursor),
        b'(' => read_literal_string(cursor),
        b'<' => read_angle(cursor),
        b'[' => {
            cursor.next_byte();
            Ok(Token::ArrayStart)
        }
        b']' => {
            cursor.next_byte();
            Ok(Token::ArrayEnd)
        }
        b'>' => {
            cursor.next_byte();
            if cursor.peek_byte() == Some(b'>') {
                cursor.next_byte();
                Ok(Token::DictEnd)
            } else {
                Err(PdfError::SyntaxError {
                    position: cursor.tell(),
                    message: "stray '>'".to_string(),
                })
            }
        }
        b'+' | b'-' | b'.' | b'0'..=b'9' => read_number(cursor),
        _ if b.is_ascii_alphabetic() => read_keyword(cursor),
        _ => Err(PdfError::SyntaxError {
            position: cursor.tell(),
            message: format!("unexpected byte 0x{:02x}", b),
        }),
    }
}

fn skip_whitespace_and_comments(cursor: &mut Cursor) {
    loop {
        match cursor.peek_byte() {
            Some(b) if is_pdf_whitespace(b) => {
                cursor.next_byte();
            }
            Some(b'%') => {
                while let Some(b) = cursor.peek_byte() {
                    cursor.next_byte();
                    if b == b'\n' {
                        break;
                    }
                }
            }
            _ => break,
        }
    }
}

fn read_name(cursor: &mut Cursor) -> Result<Token> {
    cursor.next_byte(); // '/'
    let mut out = String::new();
    loop {
        match cursor.peek_byte() {
            Some(b'#') => {
                cursor.next_byte();
                let hi = cursor.next_byte().ok_or(PdfError::UnexpectedEof)?;
                let lo = cursor.next_byte().ok_or(PdfError::UnexpectedEof)?;
                let byte = hex_pair(hi, lo)?;
                out.push(byte as char);
            }
            Some(b) if !is_pdf_whitespace(b) && !is_delimiter(b) => {
                cursor.next_byte();
                out.push(b as char);
            }
            _ => break,
        }
    }
    Ok(Token::Name(out))
}

fn hex_digit(b: u8) -> Result<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(PdfError::SyntaxError {
            position: 0,
            message: format!("invalid hex digit '{}'", b as char),
        }),
    }
}

fn hex_pair(hi: u8, lo: u8) -> Result<u8> {
    Ok((hex_digit(hi)? << 4) | hex_digit(lo)?)
}

fn read_literal_string(cursor: &mut Cursor) -> Result<Token> {
    cursor.next_byte(); // '('
    let mut out = Vec::new();
    let mut depth = 1u32;
    loop {
        let b = cursor.next_byte().ok_or(PdfError::UnexpectedEof)?;
        match b {
            b'(' => {
                depth += 1;
                out.push(b);
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                out.push(b);
            }
            b'\\' => {
                let esc = cursor.next_byte().ok_or(PdfError::UnexpectedEof)?;
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'(' => out.push(b'('),
                    b')' => out.push(b')'),
                    b'\\' => out.push(b'\\'),
                    b'\r' => {
                        // \<CRLF> or \<CR> line continuation
                        if cursor.peek_byte() == Some(b'\n') {
                            cursor.next_byte();
                        }
                    }
                    b'\n' => {}
                    b'0'..=b'7' => {
                        let mut val = (esc - b'0') as u32;
                        for _ in 0..2 {
                            match cursor.peek_byte() {
                                Some(d @ b'0'..=b'7') => {
                                    val = val * 8 + (d - b'0') as u32;
                                    cursor.next_byte();
                                }
                                _ => break,
                            }
                        }
                        out.push((val & 0xFF) as u8);
                    }
                    other => out.push(other),
                }
            }
            other => out.push(other),
        }
    }
    Ok(Token::LiteralString(out))
}

fn read_angle(cursor: &mut Cursor) -> Result<Token> {
    cursor.next_byte(); // first '<'
    if cursor.peek_byte() == Some(b'<') {
        cursor.next_byte();
        return Ok(Token::DictStart);
    }
    let mut digits = Vec::new();
    loop {
        match cursor.peek_byte() {
            Some(b'>') => {
                cursor.next_byte();
                break;
            }
            Some(b) if is_pdf_whitespace(b) => {
                cursor.next_byte();
            }
            Some(b) => {
                cursor.next_byte();
                digits.push(b);
            }
            None => return Err(PdfError::UnexpectedEof),
        }
    }
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    let mut bytes = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        bytes.push(hex_pair(pair[0], pair[1])?);
    }
    Ok(Token::HexString(bytes))
}

fn read_number(cursor: &mut Cursor) -> Result<Token> {
    let mut s = String::new();
    if matches!(cursor.peek_byte(), Some(b'+') | Some(b'-')) {
        s.push(cursor.next_byte().unwrap() as char);
    }
    let mut is_real = false;
    loop {
        match cursor.peek_byte() {
            Some(b @ b'0'..=b'9') => {
                s.push(b as char);
                cursor.next_byte();
            }
            Some(b'.') => {
                is_real = true;
                s.push('.');
                cursor.next_byte();
            }
            Some(b'e') | Some(b'E') => {
                // scientific notation: not produced by PDF, accepted permissively
                is_real = true;
                s.push(cursor.next_byte().unwrap() as char);
                if matches!(cursor.peek_byte(), Some(b'+') | Some(b'-')) {
                    s.push(cursor.next_byte().unwrap() as char);
                }
            }
            _ => break,
        }
    }
    if is_real {
        let value: f64 = s.parse().map_err(|_| PdfError::SyntaxError {
            position: cursor.tell(),
            message: format!("invalid real literal '{}'", s),
        })?;
        Ok(Token::Real(value))
    } else {
        let value: i64 = s.parse().map_err(|_| PdfError::SyntaxError {
            position: cursor.tell(),
            message: format!("invalid integer literal '{}'", s),
        })?;
        Ok(Token::Integer(value))
    }
}

fn read_keyword(cursor: &mut Cursor) -> Result<Token> {
    let mut s = String::new();
    while let Some(b) = cursor.peek_byte() {
        if b.is_ascii_alphabetic() {
            s.push(b as char);
            cursor.next_byte();
        } else {
            break;
        }
    }
    Ok(Token::Keyword(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &[u8]) -> Vec<Token> {
        let mut c = Cursor::new(src);
        let mut out = Vec::new();
        loop {
            let t = next_token(&mut c).unwrap();
            if t == Token::Eof {
                break;
            }
            out.push(t);
        }
        out
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens(b"42 -7 3.14 -0.5"),
            vec![
                Token::Integer(42),
                Token::Integer(-7),
                Token::Real(3.14),
                Token::Real(-0.5),
            ]
        );
    }

    #[test]
    fn name_with_hash_escape() {
        assert_eq!(
            tokens(b"/Name#20With#20Space"),
            vec![Token::Name("Name With Space".to_string())]
        );
    }

    #[test]
    fn literal_string_escapes_and_octal() {
        assert_eq!(
            tokens(b"(a\\n\\t\\101)"),
            vec![Token::LiteralString(vec![b'a', b'\n', b'\t', b'A'])]
        );
    }

    #[test]
    fn hex_string_odd_digit_padded() {
        assert_eq!(tokens(b"<4F3>"), vec![Token::HexString(vec![0x4F, 0x30])]);
    }

    #[test]
    fn dict_and_array_delimiters() {
        assert_eq!(
            tokens(b"<< /A [1 2] >>"),
            vec![
                Token::DictStart,
                Token::Name("A".to_string()),
                Token::ArrayStart,
                Token::Integer(1),
                Token::Integer(2),
                Token::ArrayEnd,
                Token::DictEnd,
            ]
        );
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(
            tokens(b"1 % a comment\n2"),
            vec![Token::Integer(1), Token::Integer(2)]
        );
    }
}
