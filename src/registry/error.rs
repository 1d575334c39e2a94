use crate::router::RouterError;
use std::fmt;

/// Fatal configuration error raised while registering services.
///
/// Every variant names the service tag and the route as declared, so the
/// offending registration can be found in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The resolved path already has an operation for this method.
    DuplicateRoute {
        service: String,
        path: String,
        method: String,
    },
    /// More than one of json, form and xml bodies declared.
    MultipleBodies {
        service: String,
        path: String,
        method: String,
    },
    /// A request body declared on GET or HEAD.
    BodyOnReadOnlyMethod {
        service: String,
        path: String,
        method: String,
    },
    /// A security scheme name is already defined with a different definition.
    ConflictingSecurityScheme { service: String, name: String },
    /// The same handler instance is bound to a second secured route.
    HandlerReused {
        service: String,
        path: String,
        method: String,
        /// Permission code of the route that owns the handler.
        owner: String,
    },
    /// Method is not a valid HTTP token.
    InvalidMethod { service: String, method: String },
    /// The live router rejected the registration.
    Router { service: String, source: RouterError },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateRoute {
                service,
                path,
                method,
            } => write!(
                f,
                "service {service} route {path}: method {method} already registered"
            ),
            RegistryError::MultipleBodies {
                service,
                path,
                method,
            } => write!(
                f,
                "service {service} route {path} {method}: only one of json, form or xml body may be declared"
            ),
            RegistryError::BodyOnReadOnlyMethod {
                service,
                path,
                method,
            } => write!(
                f,
                "service {service} route {path}: method {method} cannot declare a request body"
            ),
            RegistryError::ConflictingSecurityScheme { service, name } => write!(
                f,
                "service {service}: security scheme '{name}' conflicts with an existing definition"
            ),
            RegistryError::HandlerReused {
                service,
                path,
                method,
                owner,
            } => write!(
                f,
                "service {service} route {path} {method}: handler already bound to permission {owner}"
            ),
            RegistryError::InvalidMethod { service, method } => {
                write!(f, "service {service}: invalid HTTP method '{method}'")
            }
            RegistryError::Router { service, source } => {
                write!(f, "service {service}: {source}")
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Router { source, .. } => Some(source),
            _ => None,
        }
    }
}
