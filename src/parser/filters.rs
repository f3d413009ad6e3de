//! Stream codec (§4.D): encode/decode a stream payload per its `/Filter`
//! chain.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Name, Value};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Applies the inverse of every filter named in `dict`'s `/Filter` entry,
/// right to left, to recover the decoded stream bytes.
pub fn decode_stream(raw: &[u8], dict: &Dictionary) -> Result<Vec<u8>> {
    let filters = Value::Dictionary(dict.clone()).filter_names();
    let parms = decode_parms_list(dict, filters.len());

    let mut data = raw.to_vec();
    for (filter, parm) in filters.iter().zip(parms.iter()).rev() {
        data = decode_one(filter, &data, parm.as_ref())?;
    }
    Ok(data)
}

/// Applies filters forwards, encoding bytes for `/Filter` order as given.
pub fn encode_stream(decoded: &[u8], filters: &[Name]) -> Result<Vec<u8>> {
    let mut data = decoded.to_vec();
    for filter in filters {
        data = encode_one(filter, &data)?;
    }
    Ok(data)
}

fn decode_parms_list(dict: &Dictionary, count: usize) -> Vec<Option<Dictionary>> {
    match dict.get("DecodeParms") {
        Some(Value::Dictionary(d)) => {
            let mut v = vec![None; count];
            if count > 0 {
                v[0] = Some(d.clone());
            }
            v
        }
        Some(Value::Array(arr)) => (0..count)
            .map(|i| arr.get(i).and_then(Value::as_dict).cloned())
            .collect(),
        _ => vec![None; count],
    }
}

fn decode_one(filter: &Name, data: &[u8], parms: Option<&Dictionary>) -> Result<Vec<u8>> {
    match filter.body() {
        "FlateDecode" => {
            let inflated = inflate(data)?;
            apply_predictor(inflated, parms)
        }
        "DCTDecode" => Ok(data.to_vec()),
        "ASCII85Decode" => ascii85_decode(data),
        "RunLengthDecode" => run_length_decode(data),
        other => Err(PdfError::UnsupportedFilter(other.to_string())),
    }
}

fn encode_one(filter: &Name, data: &[u8]) -> Result<Vec<u8>> {
    match filter.body() {
        "FlateDecode" => deflate(data),
        "DCTDecode" => Err(PdfError::UnsupportedFilter(
            "DCTDecode re-encoding is not supported".to_string(),
        )),
        "ASCII85Decode" => Ok(ascii85_encode(data)),
        "RunLengthDecode" => Ok(run_length_encode(data)),
        other => Err(PdfError::UnsupportedFilter(other.to_string())),
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// PNG predictor row reversal (§4.D): predictor >= 10 selects the PNG
/// family, one predictor-tag byte per row.
fn apply_predictor(data: Vec<u8>, parms: Option<&Dictionary>) -> Result<Vec<u8>> {
    let Some(parms) = parms else { return Ok(data) };
    let predictor = parms.get_i64("Predictor").unwrap_or(1);
    if predictor < 10 {
        return Ok(data);
    }
    let colors = parms.get_i64("Colors").unwrap_or(1).max(1) as usize;
    let bpc = parms.get_i64("BitsPerComponent").unwrap_or(8).max(1) as usize;
    let columns = parms.get_i64("Columns").unwrap_or(1).max(1) as usize;
    let row_bytes = (colors * bpc * columns).div_ceil(8);

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];
    let mut pos = 0usize;
    while pos + 1 + row_bytes <= data.len() {
        let tag = data[pos];
        let row = &data[pos + 1..pos + 1 + row_bytes];
        let mut cur_row = vec![0u8; row_bytes];
        for i in 0..row_bytes {
            let a = if i == 0 { 0 } else { cur_row[i - 1] };
            let b = prev_row[i];
            let c = if i == 0 { 0 } else { prev_row[i - 1] };
            let x = row[i];
            cur_row[i] = match tag {
                0 => x,
                1 => x.wrapping_add(a),
                2 => x.wrapping_add(b),
                3 => x.wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => x.wrapping_add(paeth(a, b, c)),
                other => {
                    return Err(PdfError::SyntaxError {
                        position: pos as u64,
                        message: format!("unknown PNG predictor tag {}", other),
                    })
                }
            };
        }
        out.extend_from_slice(&cur_row);
        prev_row = cur_row;
        pos += 1 + row_bytes;
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut group = [0u8; 5];
    let mut group_len = 0usize;
    let mut i = 0usize;
    while i < data.len() {
        let b = data[i];
        i += 1;
        if b.is_ascii_whitespace() {
            continue;
        }
        if b == b'~' {
            break;
        }
        if b == b'z' && group_len == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        group[group_len] = b;
        group_len += 1;
        if group_len == 5 {
            out.extend_from_slice(&decode_ascii85_group(&group, 5));
            group_len = 0;
        }
    }
    if group_len > 0 {
        for g in group.iter_mut().skip(group_len) {
            *g = b'u';
        }
        let decoded = decode_ascii85_group(&group, group_len);
        out.extend_from_slice(&decoded[..group_len - 1]);
    }
    Ok(out)
}

fn decode_ascii85_group(group: &[u8; 5], len: usize) -> [u8; 4] {
    let mut value: u32 = 0;
    for &g in group.iter() {
        value = value.wrapping_mul(85).wrapping_add((g - b'!') as u32);
    }
    let bytes = value.to_be_bytes();
    let _ = len;
    bytes
}

fn ascii85_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(4) {
        let mut buf = [0u8; 4];
        buf[..chunk.len()].copy_from_slice(chunk);
        let value = u32::from_be_bytes(buf);
        if chunk.len() == 4 && value == 0 {
            out.push(b'z');
            continue;
        }
        let mut digits = [0u8; 5];
        let mut v = value;
        for d in digits.iter_mut().rev() {
            *d = (v % 85) as u8 + b'!';
            v /= 85;
        }
        out.extend_from_slice(&digits[..chunk.len() + 1]);
    }
    out.push(b'~');
    out.push(b'>');
    out
}

fn run_length_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < data.len() {
        let len = data[i];
        i += 1;
        if len == 128 {
            break;
        } else if len < 128 {
            let n = len as usize + 1;
            if i + n > data.len() {
                return Err(PdfError::UnexpectedEof);
            }
            out.extend_from_slice(&data[i..i + n]);
            i += n;
        } else {
            if i >= data.len() {
                return Err(PdfError::UnexpectedEof);
            }
            let repeat = 257 - len as usize;
            out.extend(std::iter::repeat(data[i]).take(repeat));
            i += 1;
        }
    }
    Ok(out)
}

fn run_length_encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && data[i + run] == data[i] && run < 128 {
            run += 1;
        }
        if run >= 2 {
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
        } else {
            let start = i;
            let mut len = 1;
            i += 1;
            while i < data.len() && len < 128 {
                let mut next_run = 1;
                while i + next_run < data.len() && data[i + next_run] == data[i] && next_run < 128 {
                    next_run += 1;
                }
                if next_run >= 2 {
                    break;
                }
                len += 1;
                i += 1;
            }
            out.push((len - 1) as u8);
            out.extend_from_slice(&data[start..start + len]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flate_round_trips() {
        let original = b"hello world hello world hello world";
        let encoded = deflate(original).unwrap();
        let decoded = inflate(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_stream_applies_flate_then_predictor() {
        let raw_rows: Vec<u8> = vec![0, 1, 2, 3, 0, 4, 4, 4];
        let compressed = deflate(&raw_rows).unwrap();
        let mut dict = Dictionary::new();
        dict.set("Filter", Value::name("FlateDecode"));
        let mut parms = Dictionary::new();
        parms.set("Predictor", 12i64);
        parms.set("Columns", 3i64);
        parms.set("Colors", 1i64);
        parms.set("BitsPerComponent", 8i64);
        dict.set("DecodeParms", Value::Dictionary(parms));

        let decoded = decode_stream(&compressed, &dict).unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 4, 4, 4]);
    }

    #[test]
    fn ascii85_round_trips() {
        let original = b"Man is distinguished";
        let encoded = ascii85_encode(original);
        let decoded = ascii85_decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn run_length_round_trips() {
        let original = b"aaaaaabcdefg";
        let encoded = run_length_encode(original);
        let decoded = run_length_decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn dct_decode_is_identity_and_rejects_reencode() {
        let data = vec![0xFF, 0xD8, 0xFF, 0xD9];
        let name = Name::new("DCTDecode");
        assert_eq!(decode_one(&name, &data, None).unwrap(), data);
        assert!(encode_one(&name, &data).is_err());
    }

    #[test]
    fn unknown_filter_is_unsupported() {
        let name = Name::new("JPXDecode");
        assert!(matches!(
            decode_one(&name, b"x", None),
            Err(PdfError::UnsupportedFilter(_))
        ));
    }
}
