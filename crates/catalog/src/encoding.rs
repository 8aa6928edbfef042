//! Paths are stored as raw OS bytes, so names that are not valid UTF-8
//! round-trip through the catalog unchanged.

use std::path::{Path, PathBuf};

use crate::error::CatalogError;

#[cfg(unix)]
pub(crate) fn path_to_bytes(path: &Path) -> Result<&[u8], CatalogError> {
    use std::os::unix::ffi::OsStrExt;
    Ok(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
pub(crate) fn path_to_bytes(path: &Path) -> Result<&[u8], CatalogError> {
    path.to_str()
        .map(str::as_bytes)
        .ok_or_else(|| CatalogError::NonUtf8Path(path.to_path_buf()))
}

#[cfg(unix)]
pub(crate) fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
pub(crate) fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(bytes).ok().map(PathBuf::from)
}

/// Serde adapter for path fields: a JSON string when the path is UTF-8, an
/// array of bytes otherwise.
pub(crate) mod serde_path {
    use std::path::{Path, PathBuf};

    use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};

    use super::{path_from_bytes, path_to_bytes};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Text(String),
        Raw(Vec<u8>),
    }

    pub(crate) fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        match path.to_str() {
            Some(text) => serializer.serialize_str(text),
            None => path_to_bytes(path)
                .map_err(<S::Error as ser::Error>::custom)?
                .serialize(serializer),
        }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
        match Stored::deserialize(deserializer)? {
            Stored::Text(text) => Ok(PathBuf::from(text)),
            Stored::Raw(bytes) => path_from_bytes(&bytes)
                .ok_or_else(|| de::Error::custom("stored path is not representable on this platform")),
        }
    }
}
