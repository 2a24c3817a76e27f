//! BIOS identifier generation.
//!
//! A BIOS ID is built from a small INI config:
//!
//! ```text
//! [config]
//! BOARD_ID = KBLRVP1
//! BOARD_REV = 1
//! BOARD_EXT = 000
//! BUILD_TYPE = D
//! VERSION_MAJOR = 0001
//! VERSION_MINOR = 01
//! ```
//!
//! and rendered as `KBLRVP11.000.0001.D01.1907081530` (the last group is the UTC build
//! time, `YYMMDDHHMM`). The binary form is the `$IBIOSI$` signature followed by the ID as
//! NUL-terminated UTF-16LE.

use std::{fs, path::Path};

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Signature that precedes the ID string in the binary blob.
pub const BIOS_ID_SIGNATURE: &[u8; 8] = b"$IBIOSI$";

const CONFIG_SECTION: &str = "config";

struct ItemSpec {
    name: &'static str,
    length: usize,
    default: Option<&'static str>,
}

const ITEMS: &[ItemSpec] = &[
    ItemSpec { name: "BOARD_ID", length: 7, default: None },
    ItemSpec { name: "BOARD_REV", length: 1, default: None },
    ItemSpec { name: "BOARD_EXT", length: 3, default: None },
    ItemSpec { name: "BUILD_TYPE", length: 1, default: None },
    ItemSpec { name: "VERSION_MAJOR", length: 4, default: Some("0000") },
    ItemSpec { name: "VERSION_MINOR", length: 2, default: Some("00") },
];

/// Validated contents of the `[config]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiosIdConfig {
    pub board_id: String,
    pub board_rev: String,
    pub board_ext: String,
    pub build_type: String,
    pub version_major: String,
    pub version_minor: String,
}

impl BiosIdConfig {
    /// Parses and validates a config file's text.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let section = parse_section(text, CONFIG_SECTION)?.ok_or_else(|| {
            Error::bios_config("Not support the config file format, need config section")
        })?;

        let mut values: Vec<Option<String>> = ITEMS
            .iter()
            .map(|item| item.default.map(str::to_string))
            .collect();

        for (key, value) in section {
            let Some(index) = ITEMS.iter().position(|item| item.name == key) else {
                return Err(Error::bios_config(format!("Item {key} is invalid")));
            };
            if value.chars().count() != ITEMS[index].length {
                return Err(Error::bios_config(format!(
                    "Config item {key} length is invalid"
                )));
            }
            values[index] = Some(value);
        }

        let mut resolved = Vec::with_capacity(ITEMS.len());
        for (item, value) in ITEMS.iter().zip(values) {
            match value {
                Some(v) if !v.is_empty() => resolved.push(v),
                _ => return Err(Error::bios_config(format!("Item {} is missing", item.name))),
            }
        }

        let mut it = resolved.into_iter();
        let mut next = || it.next().unwrap_or_default();
        Ok(Self {
            board_id: next(),
            board_rev: next(),
            board_ext: next(),
            build_type: next(),
            version_major: next(),
            version_minor: next(),
        })
    }

    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::bios_config(format!(
                "Input file not found: {}",
                path.display()
            )));
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
    }

    /// Renders the ID string stamped with `built_at`.
    pub fn id_string(&self, built_at: DateTime<Utc>) -> String {
        format!(
            "{}{}.{}.{}.{}{}.{}",
            self.board_id,
            self.board_rev,
            self.board_ext,
            self.version_major,
            self.build_type,
            self.version_minor,
            built_at.format("%y%m%d%H%M")
        )
    }
}

/// Collects `key = value` pairs of `wanted` from INI text.
///
/// Returns `Ok(None)` if the section is absent. Keys are case sensitive; `=` and `:` both
/// separate keys from values; lines starting with `#` or `;` are comments; indented lines
/// continue the previous value.
fn parse_section(text: &str, wanted: &str) -> Result<Option<Vec<(String, String)>>, Error> {
    let mut current: Option<String> = None;
    let mut found = false;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            found |= name == wanted;
            current = Some(name);
            continue;
        }
        let Some(section) = current.as_deref() else {
            return Err(Error::bios_config(format!(
                "line {}: entry before any section header",
                number + 1
            )));
        };
        if section != wanted {
            continue;
        }

        if raw.starts_with([' ', '\t']) {
            if let Some((_, value)) = pairs.last_mut() {
                value.push('\n');
                value.push_str(line);
                continue;
            }
        }

        let Some(split) = line.find(['=', ':']) else {
            return Err(Error::bios_config(format!(
                "line {}: expected `key = value`",
                number + 1
            )));
        };
        let key = line[..split].trim().to_string();
        let value = line[split + 1..].trim().to_string();
        if pairs.iter().any(|(k, _)| *k == key) {
            return Err(Error::bios_config(format!("Item {key} is duplicated")));
        }
        pairs.push((key, value));
    }

    Ok(found.then_some(pairs))
}

/// Encodes an ID string as the signature followed by NUL-terminated UTF-16LE.
pub fn encode_bios_id(id: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(BIOS_ID_SIGNATURE.len() + (id.len() + 1) * 2);
    out.extend_from_slice(BIOS_ID_SIGNATURE);
    for unit in id.encode_utf16().chain(std::iter::once(0)) {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Shell line exporting the ID as `BIOS_ID` for the host platform.
pub fn batch_line(id: &str) -> String {
    if cfg!(windows) {
        format!("SET BIOS_ID={id}")
    } else {
        format!("export BIOS_ID={id}")
    }
}

/// Reads `config`, writes the ID blob to `output` and optionally the batch file.
///
/// Returns the generated ID string.
pub fn generate(
    config: &Path,
    output: &Path,
    batch: Option<&Path>,
    built_at: DateTime<Utc>,
) -> Result<String, Error> {
    let config = BiosIdConfig::read_from(config)?;
    let id = config.id_string(built_at);
    tracing::debug!(%id, output = %output.display(), "writing BIOS ID");

    fs::write(output, encode_bios_id(&id)).map_err(|e| Error::io(output, e))?;
    if let Some(batch) = batch {
        fs::write(batch, batch_line(&id)).map_err(|e| Error::io(batch, e))?;
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use indoc::indoc;

    const CONFIG: &str = indoc! {"
        # Board identity
        [config]
        BOARD_ID = KBLRVP1
        BOARD_REV = 1
        BOARD_EXT : 000
        BUILD_TYPE = D
        VERSION_MAJOR = 0001
        VERSION_MINOR = 01
    "};

    fn built_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 7, 8, 15, 30, 12).unwrap()
    }

    #[test]
    fn test_parse_full_config() {
        let config = BiosIdConfig::parse(CONFIG).unwrap();
        assert_eq!(config.board_id, "KBLRVP1");
        assert_eq!(config.board_ext, "000");
        assert_eq!(
            config.id_string(built_at()),
            "KBLRVP11.000.0001.D01.1907081530"
        );
    }

    #[test]
    fn test_version_items_have_defaults() {
        let text = indoc! {"
            [config]
            BOARD_ID=ABCDEFG
            BOARD_REV=2
            BOARD_EXT=X64
            BUILD_TYPE=R
        "};
        let config = BiosIdConfig::parse(text).unwrap();
        assert_eq!(config.version_major, "0000");
        assert_eq!(config.version_minor, "00");
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let err = BiosIdConfig::parse("[other]\nBOARD_ID = KBLRVP1\n").unwrap_err();
        assert!(err.to_string().contains("need config section"));
    }

    #[test]
    fn test_unknown_item_is_rejected() {
        let err = BiosIdConfig::parse("[config]\nBOARD_NAME = x\n").unwrap_err();
        assert!(err.to_string().contains("Item BOARD_NAME is invalid"));
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let err = BiosIdConfig::parse("[config]\nBOARD_ID = SHORT\n").unwrap_err();
        assert!(err.to_string().contains("Config item BOARD_ID length is invalid"));
    }

    #[test]
    fn test_missing_item_is_rejected() {
        let err = BiosIdConfig::parse("[config]\nBOARD_ID = KBLRVP1\n").unwrap_err();
        assert!(err.to_string().contains("Item BOARD_REV is missing"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let err = BiosIdConfig::parse("[config]\nboard_id = KBLRVP1\n").unwrap_err();
        assert!(err.to_string().contains("Item board_id is invalid"));
    }

    #[test]
    fn test_entry_before_section_is_rejected() {
        assert!(BiosIdConfig::parse("BOARD_ID = KBLRVP1\n[config]\n").is_err());
    }

    #[test]
    fn test_encode_bios_id_layout() {
        let blob = encode_bios_id("AB");
        assert_eq!(&blob[..8], b"$IBIOSI$");
        assert_eq!(&blob[8..], &[b'A', 0, b'B', 0, 0, 0]);
    }

    #[test]
    fn test_batch_line() {
        let line = batch_line("KBLRVP11.000.0001.D01.1907081530");
        if cfg!(windows) {
            assert_eq!(line, "SET BIOS_ID=KBLRVP11.000.0001.D01.1907081530");
        } else {
            assert_eq!(line, "export BIOS_ID=KBLRVP11.000.0001.D01.1907081530");
        }
    }

    #[test]
    fn test_generate_writes_blob_and_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("BiosId.env");
        let output = dir.path().join("BiosId.bin");
        let batch = dir.path().join("SetBiosId.sh");
        fs::write(&config, CONFIG).unwrap();

        let id = generate(&config, &output, Some(&batch), built_at()).unwrap();

        assert_eq!(fs::read(&output).unwrap(), encode_bios_id(&id));
        assert!(fs::read_to_string(&batch).unwrap().ends_with(&id));
    }

    #[test]
    fn test_generate_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate(
            &dir.path().join("absent.env"),
            &dir.path().join("out.bin"),
            None,
            built_at(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }
}
