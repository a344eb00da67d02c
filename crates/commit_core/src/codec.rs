//! Canonical structured encoding for hash preimages and wire forms
//!
//! Every preimage this library hashes, and every binary wire form it
//! emits, is a CBOR data item built from definite-length arrays, byte
//! strings, text strings and null. The helpers here keep construction
//! and shape-checked decoding in one place so the encoding stays
//! injective and stable across the codebase.

use crate::errors::CodecError;
pub use serde_cbor::Value;

/// Encode a value into canonical bytes
pub fn encode(value: &Value) -> Vec<u8> {
    // Arrays, byte strings, text and null cannot fail to serialize
    serde_cbor::to_vec(value).expect("canonical value failed to encode")
}

/// Decode bytes into a structured value
pub fn decode(bytes: &[u8]) -> Result<Value, CodecError> {
    serde_cbor::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
}

pub fn byte_string(data: &[u8]) -> Value {
    Value::Bytes(data.to_vec())
}

pub fn text_string(data: &str) -> Value {
    Value::Text(data.to_string())
}

pub fn array(items: Vec<Value>) -> Value {
    Value::Array(items)
}

pub fn null() -> Value {
    Value::Null
}

/// Wrap an optional encoder so `None` becomes null
pub fn optional<T>(value: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    match value {
        Some(v) => f(v),
        None => Value::Null,
    }
}

/// Expect an array of exactly `arity` items
pub fn expect_array(value: &Value, arity: usize) -> Result<&[Value], CodecError> {
    match value {
        Value::Array(items) if items.len() == arity => Ok(items),
        Value::Array(items) => Err(CodecError::WrongArity {
            expected: arity,
            found: items.len(),
        }),
        _ => Err(CodecError::UnexpectedItem { expected: "array" }),
    }
}

/// Expect an array of any length
pub fn expect_seq(value: &Value) -> Result<&[Value], CodecError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(CodecError::UnexpectedItem { expected: "array" }),
    }
}

pub fn expect_bytes(value: &Value) -> Result<&[u8], CodecError> {
    match value {
        Value::Bytes(data) => Ok(data),
        _ => Err(CodecError::UnexpectedItem {
            expected: "byte string",
        }),
    }
}

pub fn expect_text(value: &Value) -> Result<&str, CodecError> {
    match value {
        Value::Text(data) => Ok(data),
        _ => Err(CodecError::UnexpectedItem {
            expected: "text string",
        }),
    }
}

/// Null maps to `None`, anything else runs through the decoder
pub fn expect_optional<'a, T>(
    value: &'a Value,
    f: impl FnOnce(&'a Value) -> Result<T, CodecError>,
) -> Result<Option<T>, CodecError> {
    match value {
        Value::Null => Ok(None),
        other => f(other).map(Some),
    }
}
