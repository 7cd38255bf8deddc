//! On-disk layout of a vault directory and the JSON encoding helpers.
//!
//! ```text
//! <vault_dir>/
//!   config.json      master identity (public key, sealed private key, salts, HMACs)
//!   sites.json       ordered array of entries
//!   files/<token>    sealed blobs of file entries
//!   TRIPWIRE         present only after an integrity violation
//! ```
//!
//! Both records are pretty-printed JSON so they stay readable in a diff.
//! Byte strings are base64 inside the JSON.  Every write goes to a temp
//! file in the same directory first and is then renamed over the target,
//! so a reader never sees a half-written record.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{PassVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current record format version.
pub const CURRENT_VERSION: u8 = 1;

/// Master identity record.
pub const CONFIG_FILE: &str = "config.json";

/// Vault record.
pub const SITES_FILE: &str = "sites.json";

/// Directory holding sealed file-entry blobs.
pub const FILES_DIR: &str = "files";

/// Tripwire marker.
pub const TRIPWIRE_FILE: &str = "TRIPWIRE";

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

pub fn sites_path(dir: &Path) -> PathBuf {
    dir.join(SITES_FILE)
}

pub fn files_dir(dir: &Path) -> PathBuf {
    dir.join(FILES_DIR)
}

pub fn tripwire_path(dir: &Path) -> PathBuf {
    dir.join(TRIPWIRE_FILE)
}

// ---------------------------------------------------------------------------
// Record I/O
// ---------------------------------------------------------------------------

/// Serialize `value` the way every record is stored on disk.
pub fn to_record_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| PassVaultError::SerializationError(e.to_string()))
}

/// Parse record bytes, reporting failures as a format error.
pub fn from_record_bytes<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| PassVaultError::InvalidVaultFormat(format!("{what}: {e}")))
}

/// Read a whole record file, mapping a missing file to `VaultNotFound`.
pub fn read_record(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PassVaultError::VaultNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Write `bytes` to `path` **atomically**.
///
/// 1. Write to a temp file in the same directory.
/// 2. Rename the temp file over the target path.
///
/// The temp file is in the same directory so the rename stays on one
/// filesystem and is atomic.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    if let Err(e) = write_private(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Create or truncate a file readable by the owner only.
pub fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    #[cfg(not(unix))]
    fs::write(path, bytes)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded byte fields
// ---------------------------------------------------------------------------

/// `#[serde(with = "b64")]` for `Vec<u8>`.
pub(crate) mod b64 {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "b64_key")]` for fixed 32-byte keys.
pub(crate) mod b64_key {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        super::b64::serialize(data, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let bytes = super::b64::deserialize(deserializer)?;
        <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
            serde::de::Error::custom(format!("expected 32 bytes, got {}", bytes.len()))
        })
    }
}

/// `#[serde(with = "b64_opt")]` for `Option<Vec<u8>>`.
pub(crate) mod b64_opt {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        data: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_some(&BASE64.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| BASE64.decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// `#[serde(with = "b64_list")]` for `Vec<Vec<u8>>`.
pub(crate) mod b64_list {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(data.iter().map(|b| BASE64.encode(b)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| BASE64.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "b64")]
        blob: Vec<u8>,
        #[serde(with = "b64_key")]
        key: [u8; 32],
        #[serde(default, with = "b64_opt", skip_serializing_if = "Option::is_none")]
        maybe: Option<Vec<u8>>,
        #[serde(default, with = "b64_list", skip_serializing_if = "Vec::is_empty")]
        many: Vec<Vec<u8>>,
    }

    #[test]
    fn byte_fields_are_base64_strings() {
        let sample = Sample {
            blob: vec![0xde, 0xad],
            key: [1u8; 32],
            maybe: Some(vec![0xbe, 0xef]),
            many: vec![vec![1], vec![2, 3]],
        };
        let json = String::from_utf8(to_record_bytes(&sample).unwrap()).unwrap();
        assert!(json.contains("\"3q0=\""));
        assert!(json.contains("\"vu8=\""));

        let back: Sample = from_record_bytes(json.as_bytes(), "sample").unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn optional_fields_can_be_absent() {
        let json = format!(
            "{{\"blob\":\"\",\"key\":\"{}\"}}",
            "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE="
        );
        let parsed: Sample = from_record_bytes(json.as_bytes(), "sample").unwrap();
        assert!(parsed.maybe.is_none());
        assert!(parsed.many.is_empty());
    }

    #[test]
    fn short_key_is_a_format_error() {
        let json = "{\"blob\":\"\",\"key\":\"AQID\"}";
        let result: Result<Sample> = from_record_bytes(json.as_bytes(), "sample");
        assert!(matches!(result, Err(PassVaultError::InvalidVaultFormat(_))));
    }

    #[test]
    fn write_atomic_replaces_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("record.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join(".record.json.tmp").exists());
    }

    #[test]
    fn read_record_maps_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_record(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(PassVaultError::VaultNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn records_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        write_atomic(&path, b"{}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
