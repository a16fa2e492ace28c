//! Codec Module
//!
//! Bidirectional mapping between application values and the opaque byte
//! sequences stored in both cache tiers. A codec is chosen when a
//! [`crate::cache::TypedCache`] is built, never per call.

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

// == Codec Trait ==
/// Encodes values to bytes and back.
///
/// Implementations must satisfy `decode(encode(v)) == v` for every value
/// they accept.
pub trait Codec: Send + Sync {
    /// The application value type handled by this codec.
    type Value;

    /// Fails with [`CacheError::Encode`] on values the codec cannot represent.
    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>>;

    /// Fails with [`CacheError::Decode`] on malformed input.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value>;
}

// == Raw Codec ==
/// Identity codec over byte vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec for RawCodec {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

// == UTF-8 Codec ==
/// Stores strings as their UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl Codec for Utf8Codec {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CacheError::Decode(e.to_string()))
    }
}

// == JSON Codec ==
/// Stores any serde-compatible value as JSON.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Codec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Decode(e.to_string()))
    }
}
