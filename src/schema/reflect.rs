use super::builder::SchemaBuilder;
use super::node::{Schema, SchemaKind};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Types whose shape can be described as a [`Schema`].
///
/// Implementations describe the declared shape of the type; the value itself is
/// only consulted where the shape depends on it (string-keyed maps and
/// [`serde_json::Value`]). Containers that need an element without having one
/// (an empty `Vec`, a `None`) use `Default::default()` instead, so elements of
/// `Vec` and `Option` must be `Default`.
///
/// Composite types are usually derived:
///
/// ```rust
/// use gantry::schema::{Reflect, SchemaCompiler};
///
/// #[derive(Default, Reflect)]
/// struct Login {
///     #[reflect(json = "username", form = "username", required, description = "The username")]
///     username: String,
///     #[reflect(json = "password", form = "password", required)]
///     password: String,
/// }
///
/// let compiled = SchemaCompiler::global().compile(&Login::default(), "form");
/// assert_eq!(compiled.schema.required, vec!["username", "password"]);
/// ```
pub trait Reflect {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema;

    /// Whether sequences of this type are byte strings.
    #[doc(hidden)]
    fn is_byte() -> bool
    where
        Self: Sized,
    {
        false
    }
}

macro_rules! reflect_fixed {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                fn reflect(&self, _builder: &mut SchemaBuilder<'_>) -> Schema {
                    Schema::of($kind)
                }
            }
        )+
    };
}

reflect_fixed!(SchemaKind::Integer => i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize, Duration);
reflect_fixed!(SchemaKind::String => String, str, char);
reflect_fixed!(SchemaKind::Boolean => bool);
reflect_fixed!(SchemaKind::Null => ());

impl Reflect for u8 {
    fn reflect(&self, _builder: &mut SchemaBuilder<'_>) -> Schema {
        Schema::of(SchemaKind::Integer)
    }

    fn is_byte() -> bool {
        true
    }
}

impl Reflect for f32 {
    fn reflect(&self, _builder: &mut SchemaBuilder<'_>) -> Schema {
        Schema::with_format(SchemaKind::Number, "float")
    }
}

impl Reflect for f64 {
    fn reflect(&self, _builder: &mut SchemaBuilder<'_>) -> Schema {
        Schema::with_format(SchemaKind::Number, "double")
    }
}

impl Reflect for SystemTime {
    fn reflect(&self, _builder: &mut SchemaBuilder<'_>) -> Schema {
        Schema::with_format(SchemaKind::String, "date-time")
    }
}

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        if T::is_byte() {
            return Schema::with_format(SchemaKind::String, "byte");
        }
        builder.array(&T::default())
    }
}

impl<T: Reflect + Default, const N: usize> Reflect for [T; N] {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        if T::is_byte() {
            return Schema::with_format(SchemaKind::String, "byte");
        }
        builder.array(&T::default())
    }
}

impl<T: Reflect + Default> Reflect for Option<T> {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        match self {
            Some(inner) => builder.nullable(inner),
            None => builder.nullable(&T::default()),
        }
    }
}

impl<T: Reflect + ?Sized> Reflect for Box<T> {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        (**self).reflect(builder)
    }
}

impl<T: Reflect + ?Sized> Reflect for Arc<T> {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        (**self).reflect(builder)
    }
}

impl<T: Reflect + ?Sized> Reflect for &T {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        (**self).reflect(builder)
    }
}

// Map schemas are built from the entries present at compile time, not from the
// value type alone.
fn map_schema<'v, V: Reflect + 'v>(
    entries: impl Iterator<Item = (&'v String, &'v V)>,
    builder: &mut SchemaBuilder<'_>,
) -> Schema {
    let mut schema = Schema::object();
    for (key, value) in entries {
        let property = value.reflect(builder);
        schema.properties.insert(key.clone(), property);
    }
    schema
}

impl<V: Reflect, S> Reflect for HashMap<String, V, S> {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        map_schema(self.iter(), builder)
    }
}

impl<V: Reflect> Reflect for BTreeMap<String, V> {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        map_schema(self.iter(), builder)
    }
}

impl Reflect for Value {
    fn reflect(&self, builder: &mut SchemaBuilder<'_>) -> Schema {
        match self {
            Value::Null => Schema::null(),
            Value::Bool(_) => Schema::of(SchemaKind::Boolean),
            Value::Number(n) if n.is_f64() => Schema::with_format(SchemaKind::Number, "double"),
            Value::Number(_) => Schema::of(SchemaKind::Integer),
            Value::String(_) => Schema::string(),
            Value::Array(items) => match items.first() {
                Some(first) => builder.array(first),
                None => Schema::array(Schema::null()),
            },
            Value::Object(map) => {
                let mut schema = Schema::object();
                for (key, value) in map {
                    let property = value.reflect(builder);
                    schema.properties.insert(key.clone(), property);
                }
                schema
            }
        }
    }
}

/// Uploaded file in a form body. Always described as `string`/`binary`, which
/// switches form bodies to `multipart/form-data`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Reflect for FileUpload {
    fn reflect(&self, _builder: &mut SchemaBuilder<'_>) -> Schema {
        Schema::binary()
    }
}

/// Point in time, described as `string`/`date-time`.
///
/// Unlike [`SystemTime`] this is `Default` (the Unix epoch), so it can sit
/// inside `Option` and `Vec` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub SystemTime);

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp(SystemTime::UNIX_EPOCH)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(t: SystemTime) -> Self {
        Timestamp(t)
    }
}

impl Reflect for Timestamp {
    fn reflect(&self, _builder: &mut SchemaBuilder<'_>) -> Schema {
        Schema::with_format(SchemaKind::String, "date-time")
    }
}
