//! JSON helpers with deterministic output.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};
use warden_application::StorageError;

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<SerializationError> for StorageError {
    fn from(e: SerializationError) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Serializes a value to JSON with 2-space indentation and a trailing newline.
///
/// Keys come out sorted when the source type uses `BTreeMap`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json)
}

/// Deserializes JSON from a string.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, SerializationError> {
    serde_json::from_str(json).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_stable_serialization_shape() {
        let mut map = BTreeMap::new();
        map.insert("refresh_token", "r");
        map.insert("access_token", "a");

        let json = to_json_stable(&map).expect("serialization should work");

        assert_eq!(json, "{\n  \"access_token\": \"a\",\n  \"refresh_token\": \"r\"\n}\n");
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        let result: Result<BTreeMap<String, String>, _> = from_json("[1, 2]");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }

    #[test]
    fn test_storage_error_conversion() {
        let err = from_json::<BTreeMap<String, String>>("{").unwrap_err();
        let storage: StorageError = err.into();
        assert!(matches!(storage, StorageError::Serialization(_)));
    }
}
