//! Key validation and wire encoding for odmeta.
//!
//! - [`KeyValue`]: a typed key value, one variant per [`PropertyType`](odmeta_model::PropertyType)
//! - [`TypeCodec`]: per-type coerce / encode / decode rules, selected by [`codec_for`]
//! - [`validate_key`]: checks a caller's key mapping against an entity schema,
//!   reporting every problem at once
//! - [`serialize_key`] / [`serialize_value`]: render validated keys and typed
//!   values as protocol literals
//!
//! # Example
//!
//! ```
//! use odmeta_codec::{serialize_value, KeyValue};
//! use odmeta_model::PropertyType;
//!
//! let literal = serialize_value(&PropertyType::String, &KeyValue::from("Hello World")).unwrap();
//! assert_eq!(literal, "'Hello%20World'");
//! ```

mod codec;
mod error;
mod serializer;
mod validator;
mod value;

pub use codec::{codec_for, TypeCodec};
pub use error::{SerializationError, SerializationResult, ValidationError, Violation};
pub use serializer::{
    key_segment, parse_literal, serialize_json, serialize_key, serialize_value, KeyFormat,
};
pub use validator::{validate_key, KeyPart, ValidatedKey};
pub use value::KeyValue;
