//! Media type names and ready-made raw content maps.
//!
//! The raw maps are meant for `RequestSpec::contents` / `ResponseSpec::contents`
//! when a body is not described by a reflected type (HTML pages, downloads,
//! images).

use super::types::{Content, MediaType};
use crate::schema::{Schema, SchemaKind};

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART_FORM: &str = "multipart/form-data";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_HTML: &str = "text/html";
pub const TEXT_PLAIN: &str = "text/plain";
pub const IMAGES: &str = "image/*";

fn single(content_type: &str, schema: Schema) -> Content {
    let mut content = Content::new();
    content.insert(content_type.to_string(), MediaType::with_schema(schema));
    content
}

/// `text/html`, string body.
#[must_use]
pub fn text_html() -> Content {
    single(TEXT_HTML, Schema::string())
}

/// `application/octet-stream`, binary body.
#[must_use]
pub fn octet_stream() -> Content {
    single(OCTET_STREAM, Schema::binary())
}

/// `application/json`, free-form object.
#[must_use]
pub fn json() -> Content {
    single(APPLICATION_JSON, Schema::of(SchemaKind::Object))
}

/// `application/xml`, free-form object.
#[must_use]
pub fn xml() -> Content {
    single(APPLICATION_XML, Schema::of(SchemaKind::Object))
}

/// `text/plain`, string body.
#[must_use]
pub fn text_plain() -> Content {
    single(TEXT_PLAIN, Schema::string())
}

/// `image/*`, binary body.
#[must_use]
pub fn images() -> Content {
    single(IMAGES, Schema::binary())
}
