//! Parameters and body content of one route.

use super::service::{RequestSpec, ResponseSpec, Shape};
use crate::contract::contents::{
    APPLICATION_JSON, APPLICATION_XML, FORM_URLENCODED, MULTIPART_FORM,
};
use crate::contract::{Content, MediaType, Parameter, ParameterLocation};
use crate::schema::{Schema, SchemaCompiler};
use std::collections::BTreeMap;
use tracing::warn;

/// Component schemas collected while extracting a route.
pub(crate) type Definitions = BTreeMap<String, Schema>;

/// Compiles the shapes of one route, always within the route's scope.
pub(crate) struct Extractor<'c> {
    compiler: &'c SchemaCompiler,
    scope: &'c str,
    definitions: Definitions,
}

impl<'c> Extractor<'c> {
    pub(crate) fn new(compiler: &'c SchemaCompiler, scope: &'c str) -> Self {
        Self {
            compiler,
            scope,
            definitions: Definitions::new(),
        }
    }

    fn compile(&mut self, shape: &Shape, namespace: &str) -> Schema {
        let compiled = self
            .compiler
            .compile_scoped(&**shape, namespace, self.scope);
        self.definitions.extend(compiled.definitions);
        compiled.schema
    }

    /// Header, query, then path parameters.
    ///
    /// Path parameters come from the `:name` / `*name` segments of
    /// `full_path`, typed as required strings unless the request's `path` shape
    /// describes them further.
    pub(crate) fn parameters(&mut self, request: &RequestSpec, full_path: &str) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        if let Some(header) = &request.header {
            let schema = self.compile(header, "header");
            parameters.extend(flatten(schema, ParameterLocation::Header));
        }
        if let Some(query) = &request.query {
            let schema = self.compile(query, "form");
            parameters.extend(flatten(schema, ParameterLocation::Query));
        }

        let mut path_params: Vec<Parameter> = template_params(full_path)
            .into_iter()
            .map(|name| Parameter {
                name: name.to_string(),
                location: ParameterLocation::Path,
                schema: Schema::string(),
                description: String::new(),
                required: true,
                deprecated: false,
                allow_empty_value: false,
            })
            .collect();
        if let Some(path) = &request.path {
            let schema = self.compile(path, "path");
            for described in flatten(schema, ParameterLocation::Path) {
                match path_params.iter_mut().find(|p| p.name == described.name) {
                    Some(param) => {
                        param.schema = described.schema;
                        param.description = described.description;
                    }
                    None => warn!(
                        path = %full_path,
                        param = %described.name,
                        "Path parameter is not part of the route template, ignoring"
                    ),
                }
            }
        }
        parameters.extend(path_params);
        parameters
    }

    /// Request body content keyed by media type.
    pub(crate) fn request_content(&mut self, request: &RequestSpec) -> Content {
        let mut content = Content::new();
        if let Some(json) = &request.json {
            let schema = self.compile(json, "json");
            content.insert(APPLICATION_JSON.to_string(), MediaType::with_schema(schema));
        } else if let Some(form) = &request.form {
            let schema = self.compile(form, "form");
            let media = if schema.has_binary() {
                MULTIPART_FORM
            } else {
                FORM_URLENCODED
            };
            content.insert(media.to_string(), MediaType::with_schema(schema));
        } else if let Some(xml) = &request.xml {
            let schema = self.compile(xml, "xml");
            content.insert(APPLICATION_XML.to_string(), MediaType::with_schema(schema));
        }
        content.extend(request.contents.clone());
        content
    }

    /// Response content keyed by media type.
    pub(crate) fn response_content(&mut self, response: &ResponseSpec) -> Content {
        let mut content = Content::new();
        if let Some(json) = &response.json {
            let schema = self.compile(json, "json");
            content.insert(APPLICATION_JSON.to_string(), MediaType::with_schema(schema));
        } else if let Some(xml) = &response.xml {
            let schema = self.compile(xml, "xml");
            content.insert(APPLICATION_XML.to_string(), MediaType::with_schema(schema));
        }
        content.extend(response.contents.clone());
        content
    }

    pub(crate) fn into_definitions(self) -> Definitions {
        self.definitions
    }
}

/// One parameter per top-level property of `schema`.
fn flatten(schema: Schema, location: ParameterLocation) -> Vec<Parameter> {
    let required = schema.required;
    schema
        .properties
        .into_iter()
        .map(|(name, property)| Parameter {
            required: required.contains(&name),
            description: property.description.clone().unwrap_or_default(),
            schema: property,
            name,
            location,
            deprecated: false,
            allow_empty_value: false,
        })
        .collect()
}

/// Names of the `:name` and `*name` segments of a route template.
#[must_use]
pub fn template_params(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|segment| {
            segment
                .strip_prefix(':')
                .or_else(|| segment.strip_prefix('*'))
        })
        .filter(|name| !name.is_empty())
        .collect()
}
