// Record codec - postcard encoding of stored records

use crate::storage::store::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a record to compact binary bytes
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

/// Decode a record from binary bytes
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))
}
