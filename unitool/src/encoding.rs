//! BOM-aware reading and writing of resource text.
//!
//! `.uni` files are UTF-8 unless they start with a UTF-16 byte order mark. Whatever a file
//! was read as is what it gets written back as, BOM and byte order included.

use std::{
    fs::{self, OpenOptions},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::Error;

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];

/// On-disk text encoding of a resource file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    /// Plain UTF-8 without a byte order mark.
    #[default]
    Utf8,
    /// UTF-8 preceded by `EF BB BF`.
    Utf8Bom,
    /// UTF-16 little endian preceded by `FF FE`.
    Utf16Le,
    /// UTF-16 big endian preceded by `FE FF`.
    Utf16Be,
}

impl TextEncoding {
    pub fn is_utf16(self) -> bool {
        matches!(self, TextEncoding::Utf16Le | TextEncoding::Utf16Be)
    }

    fn bom(self) -> &'static [u8] {
        match self {
            TextEncoding::Utf8 => &[],
            TextEncoding::Utf8Bom => BOM_UTF8,
            TextEncoding::Utf16Le => BOM_UTF16_LE,
            TextEncoding::Utf16Be => BOM_UTF16_BE,
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Utf8Bom => write!(f, "utf-8 (bom)"),
            TextEncoding::Utf16Le => write!(f, "utf-16le"),
            TextEncoding::Utf16Be => write!(f, "utf-16be"),
        }
    }
}

/// Sniffs the byte order mark at the start of `bytes`.
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    match encoding_rs::Encoding::for_bom(bytes) {
        Some((enc, _)) if enc == encoding_rs::UTF_16LE => TextEncoding::Utf16Le,
        Some((enc, _)) if enc == encoding_rs::UTF_16BE => TextEncoding::Utf16Be,
        Some(_) => TextEncoding::Utf8Bom,
        None => TextEncoding::Utf8,
    }
}

/// Decoded file content together with the encoding it must be written back in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

impl EncodedText {
    pub fn new(text: impl Into<String>, encoding: TextEncoding) -> Self {
        Self {
            text: text.into(),
            encoding,
        }
    }
}

/// Decodes raw bytes, stripping the byte order mark if one is present.
///
/// Input without a BOM must be valid UTF-8.
pub fn decode(bytes: &[u8]) -> std::io::Result<EncodedText> {
    let encoding = detect_encoding(bytes);
    let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .bom_override(true)
        .strip_bom(true)
        .build(bytes);

    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(EncodedText { text, encoding })
}

/// Encodes text, re-emitting the byte order mark and byte order of `encoding`.
pub fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2 + 2);
    out.extend_from_slice(encoding.bom());
    match encoding {
        TextEncoding::Utf8 | TextEncoding::Utf8Bom => out.extend_from_slice(text.as_bytes()),
        TextEncoding::Utf16Le => text
            .encode_utf16()
            .for_each(|unit| out.extend_from_slice(&unit.to_le_bytes())),
        TextEncoding::Utf16Be => text
            .encode_utf16()
            .for_each(|unit| out.extend_from_slice(&unit.to_be_bytes())),
    }
    out
}

/// Reads and decodes a resource file.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<EncodedText, Error> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    decode(&bytes).map_err(|e| Error::io(path, e))
}

/// Encodes and writes a resource file in one piece.
///
/// The content goes to a temporary file next to `path` which is then renamed over it, so an
/// interrupted run leaves either the old or the new file behind.
pub fn write_text<P: AsRef<Path>>(path: P, content: &EncodedText) -> Result<(), Error> {
    let path = path.as_ref();
    let bytes = encode(&content.text, content.encoding);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let result = write_and_rename(&temp_path, path, &bytes);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

fn write_and_rename(temp_path: &Path, path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file
        .write_all(bytes)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    drop(temp_file);

    fs::rename(temp_path, path).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_encoding_from_bom() {
        assert_eq!(detect_encoding(b"#string"), TextEncoding::Utf8);
        assert_eq!(detect_encoding(b""), TextEncoding::Utf8);
        assert_eq!(
            detect_encoding(&[0xEF, 0xBB, 0xBF, b'#']),
            TextEncoding::Utf8Bom
        );
        assert_eq!(detect_encoding(&[0xFF, 0xFE, b'#', 0]), TextEncoding::Utf16Le);
        assert_eq!(detect_encoding(&[0xFE, 0xFF, 0, b'#']), TextEncoding::Utf16Be);
    }

    #[test]
    fn test_decode_utf16le_strips_bom() {
        let bytes = encode("#string STR_A", TextEncoding::Utf16Le);
        assert_eq!(&bytes[..2], BOM_UTF16_LE);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.text, "#string STR_A");
        assert_eq!(decoded.encoding, TextEncoding::Utf16Le);
    }

    #[test]
    fn test_decode_utf16be_strips_bom() {
        let bytes = encode("#langdef en-US \"English\"", TextEncoding::Utf16Be);
        assert_eq!(&bytes[..2], BOM_UTF16_BE);
        assert_eq!(bytes[3], b'#');
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.text, "#langdef en-US \"English\"");
        assert_eq!(decoded.encoding, TextEncoding::Utf16Be);
    }

    #[test]
    fn test_decode_utf8_bom_is_not_part_of_text() {
        let decoded = decode(&[0xEF, 0xBB, 0xBF, b'a', b'b']).unwrap();
        assert_eq!(decoded.text, "ab");
        assert_eq!(decoded.encoding, TextEncoding::Utf8Bom);
        assert_eq!(encode("ab", TextEncoding::Utf8Bom), vec![0xEF, 0xBB, 0xBF, b'a', b'b']);
    }

    #[test]
    fn test_decode_non_ascii_utf16() {
        let text = "#string STR_X #language fr-FR \"Défaut\"";
        let decoded = decode(&encode(text, TextEncoding::Utf16Le)).unwrap();
        assert_eq!(decoded.text, text);
    }

    #[test]
    fn test_write_text_preserves_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("UqiList.uni");
        let content = EncodedText::new("#string STR_A #language uqi \"x0001\"\r\n", TextEncoding::Utf16Le);

        write_text(&path, &content).unwrap();

        let raw = fs::read(&path).unwrap();
        assert_eq!(&raw[..2], BOM_UTF16_LE);
        assert_eq!(read_text(&path).unwrap(), content);
    }

    #[test]
    fn test_write_text_replaces_existing_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strings.uni");
        fs::write(&path, "old").unwrap();

        write_text(&path, &EncodedText::new("new", TextEncoding::Utf8)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_read_text_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_text(dir.path().join("absent.uni")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
