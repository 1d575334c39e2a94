use super::names::TypeNames;
use super::node::Schema;
use super::reflect::Reflect;
use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::trace;

/// Per-field metadata for composite types.
///
/// This is what `#[derive(Reflect)]` emits for every field; hand-written
/// [`Reflect`] impls build it directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMeta {
    /// Rust field name, used when no namespace or rename supplies one.
    pub ident: &'static str,
    /// Name used in every namespace without its own entry in `names`.
    pub rename: Option<&'static str>,
    /// `(namespace, name)` pairs, e.g. `("json", "user_id")`. A name of `-` hides the
    /// field in that namespace.
    pub names: &'static [(&'static str, &'static str)],
    pub skip: bool,
    pub description: Option<&'static str>,
    pub required: bool,
    pub email: bool,
    pub format: Option<&'static str>,
}

impl FieldMeta {
    /// Property name of this field under `namespace`, or `None` when excluded.
    #[must_use]
    pub fn name_for(&self, namespace: &str) -> Option<&'static str> {
        if self.skip {
            return None;
        }
        let declared = self
            .names
            .iter()
            .find(|(ns, _)| *ns == namespace)
            .map(|(_, name)| *name)
            .or(self.rename)
            .unwrap_or("");
        if declared == "-" {
            return None;
        }
        match declared.split(',').next().unwrap_or("") {
            "" => Some(self.ident),
            name => Some(name),
        }
    }
}

/// Visitor state for one compilation pass.
///
/// Within a pass each composite type is expanded once; any further encounter
/// (including a recursive one while the type is still being expanded) becomes a
/// `$ref` to its reserved name.
pub struct SchemaBuilder<'a> {
    names: &'a TypeNames,
    namespace: &'a str,
    scope: Option<&'a str>,
    depth: usize,
    // set by `ObjectBuilder::flatten` for the composite it is about to embed
    inline_next: bool,
    reserved: HashMap<TypeId, String>,
    finished: HashMap<String, Schema>,
    referenced: BTreeSet<String>,
}

impl<'a> SchemaBuilder<'a> {
    pub(crate) fn new(names: &'a TypeNames, namespace: &'a str, scope: Option<&'a str>) -> Self {
        Self {
            names,
            namespace,
            scope,
            depth: 0,
            inline_next: false,
            reserved: HashMap::new(),
            finished: HashMap::new(),
            referenced: BTreeSet::new(),
        }
    }

    /// Field naming namespace of this pass (`json`, `form`, `header`, ...).
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.namespace
    }

    /// Compile any reflectable value within this pass.
    pub fn compile<T: Reflect + ?Sized>(&mut self, value: &T) -> Schema {
        value.reflect(self)
    }

    /// Wrap the shape of `value` as nullable.
    ///
    /// A reference cannot carry `nullable` next to `$ref` in OpenAPI 3.0, so a
    /// nullable reference stays a plain reference.
    pub fn nullable<T: Reflect + ?Sized>(&mut self, value: &T) -> Schema {
        let mut schema = value.reflect(self);
        if !schema.is_reference() {
            schema.nullable = true;
        }
        schema
    }

    /// Array whose element shape is taken from `element`.
    pub fn array<T: Reflect + ?Sized>(&mut self, element: &T) -> Schema {
        let items = element.reflect(self);
        Schema::array(items)
    }

    /// Compile a composite type with named fields.
    ///
    /// `type_name` is the bare name of `T`; the unique component name comes from
    /// the shared [`TypeNames`] table. Outside the `json` namespace the name is
    /// prefixed with the namespace (`form.Tree`). If `T` was already reserved in this pass a
    /// reference is returned without calling `fields`, which is what terminates
    /// self-referential types.
    pub fn object<T, F>(&mut self, type_name: &str, fields: F) -> Schema
    where
        T: 'static + ?Sized,
        F: FnOnce(&mut ObjectBuilder<'_, 'a>),
    {
        let id = TypeId::of::<T>();
        let inline = std::mem::take(&mut self.inline_next);
        if let Some(name) = self.reserved.get(&id) {
            let name = name.clone();
            if inline {
                // embedded fields are merged, so a reference would carry none of them
                trace!(schema = %name, "Composite type already reserved, inlining for flatten");
                return self.finished.get(&name).cloned().unwrap_or_else(Schema::object);
            }
            trace!(schema = %name, "Composite type already reserved, emitting reference");
            let reference = Schema::reference_to(&name);
            self.referenced.insert(name);
            return reference;
        }

        // route scope only names the outermost composite of the pass
        let scope = if self.depth == 0 { self.scope } else { None };
        // property names differ per namespace, so only json shapes share the bare name
        let qualified;
        let scope = match (scope, self.namespace) {
            (scope, "json") => scope,
            (Some(scope), namespace) => {
                qualified = format!("{scope}.{namespace}");
                Some(qualified.as_str())
            }
            (None, namespace) => Some(namespace),
        };
        let name = self.names.resolve(id, type_name, scope);
        self.reserved.insert(id, name.clone());

        self.depth += 1;
        let mut object = ObjectBuilder {
            builder: self,
            schema: Schema::object(),
        };
        fields(&mut object);
        let schema = object.schema;
        self.depth -= 1;

        self.finished.insert(name, schema.clone());
        schema
    }

    /// Named schemas referenced at least once during the pass.
    pub(crate) fn into_definitions(self) -> BTreeMap<String, Schema> {
        let mut finished = self.finished;
        self.referenced
            .into_iter()
            .filter_map(|name| finished.remove(&name).map(|schema| (name, schema)))
            .collect()
    }
}

/// Accumulates the properties of one composite type.
pub struct ObjectBuilder<'b, 'a> {
    builder: &'b mut SchemaBuilder<'a>,
    schema: Schema,
}

impl<'b, 'a> ObjectBuilder<'b, 'a> {
    /// Add a named field.
    ///
    /// The field's required flag is applied as-is, so it can also remove a name a
    /// flattened field contributed earlier.
    pub fn field<T: Reflect + ?Sized>(&mut self, value: &T, meta: &FieldMeta) {
        let Some(name) = meta.name_for(self.builder.namespace) else {
            return;
        };
        let mut schema = value.reflect(self.builder);
        if let Some(description) = meta.description {
            schema.description = Some(description.to_string());
        }
        if meta.email {
            schema.format = Some("email".to_string());
        }
        if let Some(format) = meta.format {
            schema.format = Some(format.to_string());
        }
        self.schema.properties.insert(name.to_string(), schema);
        self.schema.set_required(name, meta.required);
    }

    /// Merge the properties of an embedded composite into this one.
    ///
    /// Properties already present win; merged properties keep the embedded
    /// type's required flag.
    ///
    /// The embedded type is always expanded in place, even when the pass has
    /// already seen it, and is never recorded as referenced.
    pub fn flatten<T: Reflect + ?Sized>(&mut self, value: &T) {
        self.builder.inline_next = true;
        let embedded = value.reflect(self.builder);
        self.builder.inline_next = false;
        for (name, schema) in embedded.properties {
            if self.schema.properties.contains_key(&name) {
                continue;
            }
            let required = embedded.required.iter().any(|r| *r == name);
            self.schema.set_required(&name, required);
            self.schema.properties.insert(name, schema);
        }
    }

    /// Escape hatch for hand-written impls that need the raw node.
    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }
}

/// Result of one compilation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledSchema {
    pub schema: Schema,
    /// Component schemas referenced by `schema`, keyed by unique name.
    pub definitions: BTreeMap<String, Schema>,
}

/// Entry point of the schema compiler.
///
/// Cheap to clone; all clones share the same name table.
#[derive(Clone)]
pub struct SchemaCompiler {
    names: Arc<TypeNames>,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::global()
    }
}

impl SchemaCompiler {
    #[must_use]
    pub fn new(names: Arc<TypeNames>) -> Self {
        Self { names }
    }

    /// Compiler over the process-wide name table.
    #[must_use]
    pub fn global() -> Self {
        Self::new(TypeNames::global())
    }

    #[must_use]
    pub fn names(&self) -> &Arc<TypeNames> {
        &self.names
    }

    /// Compile `value` reading field names from `namespace`.
    pub fn compile<T: Reflect + ?Sized>(&self, value: &T, namespace: &str) -> CompiledSchema {
        self.run(value, namespace, None)
    }

    /// Like [`compile`](Self::compile), but the outermost composite type is named
    /// inside `scope`.
    pub fn compile_scoped<T: Reflect + ?Sized>(
        &self,
        value: &T,
        namespace: &str,
        scope: &str,
    ) -> CompiledSchema {
        self.run(value, namespace, Some(scope))
    }

    fn run<T: Reflect + ?Sized>(
        &self,
        value: &T,
        namespace: &str,
        scope: Option<&str>,
    ) -> CompiledSchema {
        let mut builder = SchemaBuilder::new(&self.names, namespace, scope);
        let schema = value.reflect(&mut builder);
        let definitions = builder.into_definitions();
        CompiledSchema {
            schema,
            definitions,
        }
    }
}
