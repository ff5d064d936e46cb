//! Entity schema model for odmeta.
//!
//! Defines the immutable descriptors the rest of the workspace depends on:
//! - [`PropertyType`]: the closed set of primitive types a key or property can carry
//! - [`KeyField`]: one field of an entity's (possibly composite) primary key
//! - [`EntitySchema`]: canonical name, aliases, ordered key fields, property map
//! - [`SchemaDocument`]: the JSON shape the remote service hands back
//! - [`AliasTable`]: maps every accepted spelling of an entity to its canonical name
//!
//! Schemas are built once from a document and never mutated afterwards;
//! a newer document produces a new [`EntitySchema`].

mod alias;
mod document;
mod error;
mod property;
mod schema;

pub use alias::{normalize_name, AliasKind, AliasMatch, AliasTable};
pub use document::{KeyFieldDoc, PropertyDoc, SchemaDocument};
pub use error::{SchemaError, SchemaResult};
pub use property::{PropertyKind, PropertyType};
pub use schema::{EntitySchema, KeyField};
