use std::fmt;

use bytes::Bytes;
use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};

const FALLBACK_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 16;

/// An uploaded file held in memory until the lifecycle writes it to storage.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    pub data: Bytes,
    /// File name as sent by the client. Only used to derive an extension.
    pub original_name: String,
    /// Extension declared by the upload transport, without the dot.
    pub extension: Option<String>,
}

impl Payload {
    pub fn new(data: impl Into<Bytes>, original_name: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            original_name: original_name.into(),
            extension: None,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extension used for the stored key.
    ///
    /// Prefers the declared extension, then the suffix of the original file
    /// name. The result is lowercase ASCII alphanumerics, at most 16
    /// characters, and `bin` when nothing usable remains.
    pub fn resolved_extension(&self) -> String {
        let from_name = self
            .original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext);
        let candidates = [self.extension.as_deref(), from_name];
        candidates
            .into_iter()
            .flatten()
            .map(sanitize_extension)
            .find(|ext| !ext.is_empty())
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
    }
}

fn sanitize_extension(raw: &str) -> String {
    raw.trim_start_matches('.')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_EXTENSION_LEN)
        .collect()
}

// Payload bytes can be large; keep them out of debug output.
impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("original_name", &self.original_name)
            .field("extension", &self.extension)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Read view of a stored file, produced when a record is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedFile {
    pub key: String,
    /// Filesystem path or URI of the object in its store.
    pub location: String,
    pub size_bytes: Option<u64>,
}

/// The attachment field of a record.
///
/// Only `Empty` and `Stored` are ever persisted. `Pending` exists between an
/// upload and the insert/update hook that stores it; `Loaded` exists between
/// a read and the end of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileRef {
    #[default]
    Empty,
    Stored(String),
    Pending(Payload),
    Loaded(LoadedFile),
}

impl FileRef {
    pub fn stored(key: impl Into<String>) -> Self {
        FileRef::Stored(key.into())
    }

    pub fn pending(payload: Payload) -> Self {
        FileRef::Pending(payload)
    }

    /// Persisted key, if the field references a stored file.
    pub fn key(&self) -> Option<&str> {
        match self {
            FileRef::Stored(key) => Some(key.as_str()),
            FileRef::Loaded(file) => Some(file.key.as_str()),
            FileRef::Empty | FileRef::Pending(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FileRef::Empty)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, FileRef::Pending(_))
    }
}

impl From<Option<String>> for FileRef {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(key) if !key.is_empty() => FileRef::Stored(key),
            _ => FileRef::Empty,
        }
    }
}

impl Serialize for FileRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FileRef::Empty => serializer.serialize_none(),
            FileRef::Stored(key) => serializer.serialize_some(key),
            FileRef::Loaded(file) => serializer.serialize_some(&file.key),
            FileRef::Pending(payload) => Err(S::Error::custom(format!(
                "pending upload '{}' must be stored before the record is persisted",
                payload.original_name
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for FileRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<String>::deserialize(deserializer).map(FileRef::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_extension_prefers_declared() {
        let payload = Payload::new("abc", "logo.jpeg").with_extension("PNG");
        assert_eq!(payload.resolved_extension(), "png");
    }

    #[test]
    fn resolved_extension_falls_back_to_name_then_bin() {
        assert_eq!(Payload::new("abc", "Logo.JPG").resolved_extension(), "jpg");
        assert_eq!(
            Payload::new("abc", "archive.tar.gz").resolved_extension(),
            "gz"
        );
        assert_eq!(Payload::new("abc", "README").resolved_extension(), "bin");
        assert_eq!(
            Payload::new("abc", "x").with_extension("../").resolved_extension(),
            "bin"
        );
    }

    #[test]
    fn resolved_extension_strips_unsafe_characters() {
        let payload = Payload::new("abc", "x").with_extension(".p/n\\g");
        assert_eq!(payload.resolved_extension(), "png");
        let long = Payload::new("abc", "x").with_extension("a".repeat(40));
        assert_eq!(long.resolved_extension().len(), 16);
    }

    #[test]
    fn payload_length() {
        let payload = Payload::new("abc", "a.png");
        assert_eq!(payload.len(), 3);
        assert!(!payload.is_empty());
        assert!(Payload::new(Vec::<u8>::new(), "blank.png").is_empty());
    }

    #[test]
    fn key_of_each_state() {
        assert_eq!(FileRef::Empty.key(), None);
        assert_eq!(FileRef::stored("a.png").key(), Some("a.png"));
        assert_eq!(FileRef::pending(Payload::new("abc", "a.png")).key(), None);
        let loaded = FileRef::Loaded(LoadedFile {
            key: "a.png".into(),
            location: "/srv/clients/a.png".into(),
            size_bytes: Some(3),
        });
        assert_eq!(loaded.key(), Some("a.png"));
    }

    #[test]
    fn serializes_as_persisted_column() {
        assert_eq!(serde_json::to_string(&FileRef::Empty).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&FileRef::stored("ab.png")).unwrap(),
            "\"ab.png\""
        );
        let loaded = FileRef::Loaded(LoadedFile {
            key: "ab.png".into(),
            location: "/srv/clients/ab.png".into(),
            size_bytes: None,
        });
        assert_eq!(serde_json::to_string(&loaded).unwrap(), "\"ab.png\"");
    }

    #[test]
    fn pending_payload_cannot_be_serialized() {
        let pending = FileRef::pending(Payload::new("abc", "logo.png"));
        let err = serde_json::to_string(&pending).unwrap_err();
        assert!(err.to_string().contains("logo.png"));
    }

    #[test]
    fn deserializes_null_empty_and_key() {
        let empty: FileRef = serde_json::from_str("null").unwrap();
        assert_eq!(empty, FileRef::Empty);
        let blank: FileRef = serde_json::from_str("\"\"").unwrap();
        assert_eq!(blank, FileRef::Empty);
        let stored: FileRef = serde_json::from_str("\"ab.png\"").unwrap();
        assert_eq!(stored, FileRef::stored("ab.png"));
    }

    #[test]
    fn debug_output_omits_payload_bytes() {
        let payload = Payload::new(vec![0u8; 2048], "big.png");
        let debug = format!("{payload:?}");
        assert!(debug.contains("len: 2048"));
        assert!(!debug.contains("[0, 0"));
    }
}
