use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Location of reusable schemas inside the contract document.
pub const MODEL_PATH: &str = "#/components/schemas/";

/// Primitive kind of a [`Schema`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

/// Normalized description of a value's shape.
///
/// A node is either a reference (`$ref` set, everything else usually empty) or an
/// inline description with a `type`. Object nodes carry `properties` and the
/// `required` subset of their names; array nodes carry `items`.
///
/// The serialized form follows the OpenAPI 3.0 schema object, so the whole
/// contract document can be emitted with `serde_json` directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaKind>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Schema {
    /// Inline node of the given kind.
    #[must_use]
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Inline node of the given kind with a format hint.
    #[must_use]
    pub fn with_format(kind: SchemaKind, format: &str) -> Self {
        Self {
            kind: Some(kind),
            format: Some(format.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self::of(SchemaKind::Null)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    #[must_use]
    pub fn object() -> Self {
        Self::of(SchemaKind::Object)
    }

    /// `string`/`binary`, used for raw uploads and octet streams.
    #[must_use]
    pub fn binary() -> Self {
        Self::with_format(SchemaKind::String, "binary")
    }

    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self {
            kind: Some(SchemaKind::Array),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Bare reference to a named schema in the component pool.
    #[must_use]
    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(format!("{MODEL_PATH}{name}")),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Name of the referenced component, if this node is a reference.
    #[must_use]
    pub fn reference_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.strip_prefix(MODEL_PATH).unwrap_or(r))
    }

    #[must_use]
    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }

    /// Add or remove `property` from the required set.
    ///
    /// Required-ness is driven only by field metadata, so a later declaration of
    /// the same property can also withdraw it.
    pub fn set_required(&mut self, property: &str, required: bool) {
        let position = self.required.iter().position(|r| r == property);
        match (required, position) {
            (true, None) => self.required.push(property.to_string()),
            (false, Some(i)) => {
                self.required.remove(i);
            }
            _ => {}
        }
    }

    /// True when this node or anything below it is a `binary` string.
    ///
    /// Only inline structure is inspected; references are not followed.
    #[must_use]
    pub fn has_binary(&self) -> bool {
        match self.kind {
            Some(SchemaKind::Object) => self.properties.values().any(Schema::has_binary),
            Some(SchemaKind::Array) => self.items.as_deref().is_some_and(Schema::has_binary),
            _ => self.format.as_deref() == Some("binary"),
        }
    }
}
