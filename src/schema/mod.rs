//! # Schema Module
//!
//! Turns Rust types into normalized OpenAPI schema nodes.
//!
//! ## Overview
//!
//! Types describe themselves through the [`Reflect`] visitor trait, normally via
//! `#[derive(Reflect)]`. A [`SchemaCompiler`] drives one compilation pass over a
//! value and returns a [`CompiledSchema`]: the root [`Schema`] plus the named
//! component schemas it references.
//!
//! ## Mapping
//!
//! | Rust | Schema |
//! |------|--------|
//! | `bool` | `boolean` |
//! | integers, `Duration` | `integer` |
//! | `f32` / `f64` | `number` / `float`, `double` |
//! | `String`, `str`, `char` | `string` |
//! | `Vec<u8>`, `[u8; N]` | `string` / `byte` |
//! | `Vec<T>`, `[T; N]` | `array` of `T` |
//! | `Option<T>` | `T`, `nullable` unless `T` compiled to a reference |
//! | `Box<T>`, `Arc<T>`, `&T` | `T` |
//! | `HashMap<String, V>`, `BTreeMap<String, V>` | `object`, one property per entry present |
//! | [`FileUpload`] | `string` / `binary` |
//! | [`Timestamp`], `SystemTime` | `string` / `date-time` |
//! | `serde_json::Value` | derived from content, `null` when empty |
//! | derived structs | `object`, or `$ref` when already expanded in the pass |
//! | derived unit enums | `string` with `enum` values |
//!
//! ## Naming and cycles
//!
//! Composite types get a component name from [`TypeNames`]: the bare type name
//! for the first type that asks, `Name-1`, `Name-2`, ... for later distinct types
//! with the same bare name. Inside one pass, a composite is reserved before its
//! fields are visited, so a self-referential type terminates at a `$ref` to
//! itself:
//!
//! ```rust
//! use gantry::schema::{Reflect, SchemaCompiler, TypeNames};
//! use std::sync::Arc;
//!
//! #[derive(Default, Reflect)]
//! struct Node {
//!     #[reflect(json = "next")]
//!     next: Option<Box<Node>>,
//! }
//!
//! let compiler = SchemaCompiler::new(Arc::new(TypeNames::new()));
//! let compiled = compiler.compile(&Node::default(), "json");
//! let next = &compiled.schema.properties["next"];
//! assert_eq!(next.reference.as_deref(), Some("#/components/schemas/Node"));
//! assert!(compiled.definitions.contains_key("Node"));
//! ```
//!
//! ## Field namespaces
//!
//! The same type can expose different property names per transport. A field
//! declares `json`, `form` (also used for query strings), `header`, `path` or `xml` names; the pass's
//! namespace picks one, falling back to `rename` and then to the Rust field name.
//! A name of `-` (or `skip`) hides the field.

mod builder;
mod names;
mod node;
mod reflect;

pub use builder::{CompiledSchema, FieldMeta, ObjectBuilder, SchemaBuilder, SchemaCompiler};
pub use gantry_macros::Reflect;
pub use names::TypeNames;
pub use node::{Schema, SchemaKind, MODEL_PATH};
pub use reflect::{FileUpload, Reflect, Timestamp};
