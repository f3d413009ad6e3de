//! File header parsing (§4.G step 1): version comment plus the optional
//! binary marker line.

use crate::cursor::Cursor;

/// The parsed `%PDF-x.y` version comment, plus whether it was recognized.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfVersion {
    pub major: u32,
    pub minor: u32,
}

impl PdfVersion {
    pub fn is_known(&self) -> bool {
        self.major == 1 && (3..=7).contains(&self.minor)
    }
}

/// Reads `%PDF-<major>.<minor>` from the start of the buffer and, if
/// present, consumes the following binary-marker comment line. Warns
/// (returns `warning: Some(..)`) rather than failing on an unrecognized
/// version or a missing/weak binary marker, since both are cosmetic.
pub struct HeaderInfo {
    pub version: PdfVersion,
    pub warning: Option<String>,
}

pub fn parse_header(cursor: &mut Cursor) -> HeaderInfo {
    let start = cursor.tell();
    let line = cursor.readline();
    let text = String::from_utf8_lossy(&line);

    let version = text
        .strip_prefix("%PDF-")
        .and_then(|rest| {
            let mut parts = rest.splitn(2, '.');
            let major: u32 = parts.next()?.parse().ok()?;
            let minor: u32 = parts.next()?.parse().ok()?;
            Some(PdfVersion { major, minor })
        });

    let Some(version) = version else {
        cursor.seek(start);
        return HeaderInfo {
            version: PdfVersion { major: 1, minor: 7 },
            warning: Some("missing or unparsable %PDF-x.y header, assuming 1.7".to_string()),
        };
    };

    let mut warning = if !version.is_known() {
        Some(format!("unrecognized PDF version {}.{}", version.major, version.minor))
    } else {
        None
    };

    let after_version = cursor.tell();
    let marker_line = cursor.readline();
    let high_bit_count = marker_line.iter().filter(|&&b| b >= 0x80).count();
    if !marker_line.starts_with(b"%") || high_bit_count < 4 {
        cursor.seek(after_version);
        warning.get_or_insert_with(|| {
            "missing or weak binary marker comment after header".to_string()
        });
    }

    HeaderInfo { version, warning }
}
