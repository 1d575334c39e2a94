use http::Method;
use std::fmt;

/// Route table construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// The method is already registered on this path.
    Conflict { method: Method, path: String },
    /// The path template is malformed.
    InvalidPath { path: String, reason: &'static str },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::Conflict { method, path } => {
                write!(f, "route conflict: {method} {path} is already registered")
            }
            RouterError::InvalidPath { path, reason } => {
                write!(f, "invalid route path '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for RouterError {}
