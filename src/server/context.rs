use super::request::{ParamVec, Request};
use super::response::Response;
use crate::registry::Permission;
use serde::Serialize;
use std::any::Any;
use ulid::Ulid;

/// Per-request state threaded through a handler chain.
///
/// Handlers run in registration order until one of them calls
/// [`abort`](Self::abort) (or an `abort_with_*` helper).
pub struct Context {
    request: Request,
    params: ParamVec,
    response: Response,
    aborted: bool,
    claims: Option<Box<dyn Any + Send + Sync>>,
    permission: Option<Permission>,
    request_id: Ulid,
}

impl Context {
    #[must_use]
    pub fn new(request: Request, params: ParamVec) -> Self {
        Self {
            request,
            params,
            response: Response::default(),
            aborted: false,
            claims: None,
            permission: None,
            request_id: Ulid::new(),
        }
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Path parameter captured by a `:name` or `*name` segment.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query_param(name)
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Deserialize the request body as JSON.
    ///
    /// # Errors
    ///
    /// When the body is not valid JSON for `T`.
    pub fn bind_json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.request.body)
    }

    #[must_use]
    pub fn request_id(&self) -> Ulid {
        self.request_id
    }

    pub fn json<T: Serialize + ?Sized>(&mut self, status: u16, body: &T) {
        self.response = Response::json(status, body);
    }

    pub fn text(&mut self, status: u16, body: &str) {
        self.response = Response::text(status, body);
    }

    pub fn bytes(&mut self, status: u16, content_type: &str, body: Vec<u8>) {
        let mut res = Response::new(status);
        res.set_body(content_type, body);
        self.response = res;
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.response.set_header(name, value);
    }

    /// Stop the chain after the current handler.
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn abort_with_json<T: Serialize + ?Sized>(&mut self, status: u16, body: &T) {
        self.json(status, body);
        self.abort();
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Store the authenticated principal.
    pub fn set_claims<T: Any + Send + Sync>(&mut self, claims: T) {
        self.claims = Some(Box::new(claims));
    }

    /// Authenticated principal, if one of type `T` was stored.
    #[must_use]
    pub fn claims<T: Any>(&self) -> Option<&T> {
        self.claims.as_deref().and_then(|c| c.downcast_ref::<T>())
    }

    pub fn set_permission(&mut self, permission: Permission) {
        self.permission = Some(permission);
    }

    /// Permission of the matched route, present on secured routes only.
    #[must_use]
    pub fn permission(&self) -> Option<&Permission> {
        self.permission.as_ref()
    }

    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use smallvec::smallvec;

    #[derive(Debug, PartialEq)]
    struct User {
        id: u32,
    }

    #[test]
    fn test_params_and_claims() {
        let params: ParamVec = smallvec![("id".to_string(), "42".to_string())];
        let mut ctx = Context::new(Request::new(Method::GET, "/users/42?x=1"), params);
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.query("x"), Some("1"));
        assert!(ctx.claims::<User>().is_none());

        ctx.set_claims(User { id: 7 });
        assert_eq!(ctx.claims::<User>(), Some(&User { id: 7 }));
        assert!(ctx.claims::<String>().is_none());
    }

    #[test]
    fn test_abort_with_json() {
        let mut ctx = Context::new(Request::new(Method::GET, "/"), ParamVec::new());
        assert!(!ctx.is_aborted());
        ctx.abort_with_json(401, &serde_json::json!({"error": "nope"}));
        assert!(ctx.is_aborted());
        let res = ctx.into_response();
        assert_eq!(res.status, 401);
        assert_eq!(res.body, br#"{"error":"nope"}"#);
    }

    #[test]
    fn test_bind_json() {
        let req = Request::new(Method::POST, "/").with_body(r#"{"a": 1}"#);
        let ctx = Context::new(req, ParamVec::new());
        let v: serde_json::Value = ctx.bind_json().unwrap();
        assert_eq!(v["a"], 1);
    }
}
