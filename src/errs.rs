//! Application error codes and the JSON response envelope.
//!
//! Handlers that follow the envelope convention always answer with
//! `{"success", "error", "code", "data"}`. A non-zero `code` identifies what
//! went wrong independently of the HTTP status, and every such code is listed
//! in an [`ErrorCodes`] table that the docs service publishes as
//! `error_codes.json`.
//!
//! The table starts with the built-in codes. Applications add their own at
//! startup; claiming a code that is already taken is refused with
//! [`DuplicateCode`], so two modules can never silently share one.
//!
//! ```rust
//! use gantry::errs::{Code, ErrorCodes};
//!
//! let codes = ErrorCodes::new();
//! codes.register([(Code(5001), "Invalid credentials")])?;
//! assert!(codes.register([(Code(5001), "Token expired")]).is_err());
//! # Ok::<(), gantry::errs::DuplicateCode>(())
//! ```

use crate::server::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Numeric application error code. `0` means success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(pub u32);

impl Code {
    pub const OK: Code = Code(0);
    pub const BAD_REQUEST: Code = Code(4000);
    pub const UNAUTHORIZED: Code = Code(4001);
    pub const INTERNAL_SERVER_ERROR: Code = Code(4002);
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const BUILTIN: [(Code, &str); 3] = [
    (Code::BAD_REQUEST, "Bad Request"),
    (Code::UNAUTHORIZED, "Unauthorized"),
    (Code::INTERNAL_SERVER_ERROR, "Internal Server Error"),
];

/// A code was registered twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCode {
    pub code: Code,
    /// Message the code already carries.
    pub existing: String,
}

impl fmt::Display for DuplicateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error code {} already registered as {:?}",
            self.code, self.existing
        )
    }
}

impl std::error::Error for DuplicateCode {}

/// Table of error codes and their messages.
pub struct ErrorCodes {
    inner: RwLock<BTreeMap<Code, String>>,
}

impl Default for ErrorCodes {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCodes {
    /// Table holding only the built-in codes.
    #[must_use]
    pub fn new() -> Self {
        let table = BUILTIN
            .iter()
            .map(|(code, message)| (*code, (*message).to_string()))
            .collect();
        Self {
            inner: RwLock::new(table),
        }
    }

    /// Add application codes, all or none.
    ///
    /// # Errors
    ///
    /// [`DuplicateCode`] for the first code that is already in the table or
    /// appears twice in `codes`, or for [`Code::OK`]. Nothing is added then.
    pub fn register<I, S>(&self, codes: I) -> Result<(), DuplicateCode>
    where
        I: IntoIterator<Item = (Code, S)>,
        S: Into<String>,
    {
        let mut table = self.inner.write();
        let mut batch: BTreeMap<Code, String> = BTreeMap::new();
        for (code, message) in codes {
            let existing = if code == Code::OK {
                Some("OK")
            } else {
                table.get(&code).or_else(|| batch.get(&code)).map(String::as_str)
            };
            if let Some(existing) = existing {
                return Err(DuplicateCode {
                    code,
                    existing: existing.to_string(),
                });
            }
            batch.insert(code, message.into());
        }
        debug!(added = batch.len(), "Error codes registered");
        table.extend(batch);
        Ok(())
    }

    #[must_use]
    pub fn message(&self, code: Code) -> Option<String> {
        self.inner.read().get(&code).cloned()
    }

    /// Copy of the whole table, ordered by code.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Code, String> {
        self.inner.read().clone()
    }

    /// The table as a JSON object keyed by the decimal code.
    ///
    /// # Errors
    ///
    /// Serialization failures from `serde_json`.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let table: BTreeMap<String, String> = self
            .inner
            .read()
            .iter()
            .map(|(code, message)| (code.to_string(), message.clone()))
            .collect();
        serde_json::to_vec(&table)
    }

    /// Failure envelope for `code` carrying its registered message.
    #[must_use]
    pub fn failure<T>(&self, code: Code) -> Envelope<T> {
        Envelope::failure(code, self.message(code).unwrap_or_default())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uniform JSON body: `data` on success, `error` and `code` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub error: String,
    pub code: Code,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            error: String::new(),
            code: Code::OK,
            data: Some(data),
        }
    }

    #[must_use]
    pub fn failure(code: Code, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
            data: None,
        }
    }
}

/// Answer `200` with a success envelope around `data`.
pub fn send_success<T: Serialize>(ctx: &mut Context, data: T) {
    ctx.json(200, &Envelope::success(data));
}

/// Answer `200` with a failure envelope and stop the chain.
///
/// The message is `err` when given, otherwise the message registered for
/// `code` in `codes`.
pub fn send_error(ctx: &mut Context, codes: &ErrorCodes, code: Code, err: Option<&dyn fmt::Display>) {
    let envelope: Envelope<()> = match err {
        Some(err) => Envelope::failure(code, err.to_string()),
        None => codes.failure(code),
    };
    ctx.abort_with_json(200, &envelope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{ParamVec, Request};
    use http::Method;
    use serde_json::{json, Value};

    fn context() -> Context {
        Context::new(Request::new(Method::GET, "/"), ParamVec::new())
    }

    #[test]
    fn test_builtin_codes() {
        let codes = ErrorCodes::new();
        assert_eq!(codes.len(), 3);
        assert_eq!(codes.message(Code::UNAUTHORIZED).as_deref(), Some("Unauthorized"));
        assert_eq!(codes.message(Code(9999)), None);
    }

    #[test]
    fn test_duplicate_code_is_refused_atomically() {
        let codes = ErrorCodes::new();
        codes.register([(Code(5001), "Invalid credentials")]).unwrap();

        let err = codes
            .register([(Code(5002), "Token expired"), (Code(5001), "Other")])
            .unwrap_err();
        assert_eq!(
            err,
            DuplicateCode {
                code: Code(5001),
                existing: "Invalid credentials".into(),
            }
        );
        assert_eq!(err.to_string(), r#"error code 5001 already registered as "Invalid credentials""#);
        // the batch left nothing behind
        assert_eq!(codes.message(Code(5002)), None);

        let err = codes.register([(Code(6000), "a"), (Code(6000), "b")]).unwrap_err();
        assert_eq!(err.existing, "a");
        assert!(codes.register([(Code::BAD_REQUEST, "again")]).is_err());
        assert!(codes.register([(Code::OK, "fine")]).is_err());
        assert_eq!(codes.len(), 4);
    }

    #[test]
    fn test_json_is_keyed_by_code() {
        let codes = ErrorCodes::new();
        codes.register([(Code(5001), "Invalid credentials")]).unwrap();
        let value: Value = serde_json::from_slice(&codes.to_json().unwrap()).unwrap();
        assert_eq!(value["4000"], "Bad Request");
        assert_eq!(value["5001"], "Invalid credentials");
        assert_eq!(value.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_envelopes_on_context() {
        let codes = ErrorCodes::new();

        let mut ctx = context();
        send_success(&mut ctx, json!({"id": 1}));
        let body: Value = serde_json::from_slice(&ctx.response().body).unwrap();
        assert_eq!(body, json!({"success": true, "error": "", "code": 0, "data": {"id": 1}}));

        let mut ctx = context();
        send_error(&mut ctx, &codes, Code::UNAUTHORIZED, None);
        assert!(ctx.is_aborted());
        assert_eq!(ctx.response().status, 200);
        let body: Envelope<Value> = serde_json::from_slice(&ctx.response().body).unwrap();
        assert_eq!(body, Envelope::failure(Code::UNAUTHORIZED, "Unauthorized"));

        let mut ctx = context();
        let cause = "token signature mismatch";
        send_error(&mut ctx, &codes, Code::UNAUTHORIZED, Some(&cause));
        let body: Value = serde_json::from_slice(&ctx.response().body).unwrap();
        assert_eq!(body["error"], cause);
        assert_eq!(body["data"], Value::Null);
    }
}
