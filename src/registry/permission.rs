use serde::Serialize;
use sha2::{Digest, Sha256};

/// Authorization handle of one secured operation.
///
/// `code` is derived from the method and contract path only, so it survives
/// restarts and can be stored in role tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Permission {
    pub tag: String,
    /// Lowercase method, as in the contract.
    pub method: String,
    /// Contract path, e.g. `/users/{id}`.
    pub path: String,
    pub code: String,
}

impl Permission {
    #[must_use]
    pub fn new(tag: &str, method: &str, path: &str) -> Self {
        Self {
            tag: tag.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            code: permission_code(method, path),
        }
    }
}

/// First 8 hex digits of `sha256(method + path)`.
#[must_use]
pub fn permission_code(method: &str, path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(path.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_hash_prefix() {
        let code = permission_code("get", "/users");
        assert_eq!(code, "05d335c2");
        assert_eq!(permission_code("get", "/users/{id}"), "8e328d6c");
        assert_ne!(code, permission_code("post", "/users"));
    }

    #[test]
    fn test_new_fills_code() {
        let p = Permission::new("Users", "delete", "/users/{id}");
        assert_eq!(p.code, permission_code("delete", "/users/{id}"));
        assert_eq!(p.tag, "Users");
    }
}
